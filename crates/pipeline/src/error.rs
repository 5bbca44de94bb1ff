use tsu_core::error::CoreError;
use tsu_core::store::StoreError;

use crate::source::SourceError;

/// Fatal import errors. Record-level problems never surface here; they are
/// folded into the run statistics instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

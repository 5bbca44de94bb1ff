#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown write policy: {0} (expected `incremental` or `truncate`)")]
    UnknownWritePolicy(String),

    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Credential error: {0}")]
    Credential(#[from] jsonwebtoken::errors::Error),
}

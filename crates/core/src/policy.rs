//! Write policy of an import step.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// How an import step treats rows already in the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Create new entities and update existing ones by natural key; nothing
    /// absent from the input is deleted. Each record commits on its own.
    #[default]
    Incremental,
    /// Empty the target tables first, then insert, all in one transaction.
    Truncate,
}

impl WritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Truncate => "truncate",
        }
    }
}

impl FromStr for WritePolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(Self::Incremental),
            "truncate" => Ok(Self::Truncate),
            other => Err(CoreError::UnknownWritePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

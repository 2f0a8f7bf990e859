use alloc::string::String;

use thiserror::Error;

// Contract violations panic instead
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsError {
    #[error("unknown content store policy: {0:?}")]
    UnknownPolicy(String),

    #[error("invalid name: {0:?}")]
    InvalidName(String),
}

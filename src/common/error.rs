//! Error types for quorumkv

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Replication Spec Errors ===
    #[error("Invalid replication spec (n={n}, r={r}, w={w}): {reason}")]
    InvalidReplicationSpec { n: u8, r: u8, w: u8, reason: String },

    // === Placement Errors ===
    #[error("No healthy replicas available")]
    NoHealthyReplicas,

    #[error("Insufficient replicas: need {needed}, have {available}")]
    InsufficientReplicas { needed: usize, available: usize },

    // === Quorum Errors ===
    #[error("Quorum unreachable: have {have} acks, need {need}")]
    QuorumUnreachable { have: usize, need: usize },

    // === Request Errors ===
    #[error("Key must not be empty")]
    EmptyKey,

    #[error("Compare-and-set conflict: expected version {expected}, found {actual}")]
    CasConflict { expected: u64, actual: u64 },

    // === Codec Errors ===
    #[error("Unknown message discriminant: {0:#04x}")]
    UnknownDiscriminant(u8),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    ///
    /// `InvalidReplicationSpec` and `EmptyKey` are deliberately excluded:
    /// they are caller errors and must never be retried automatically.
    /// `CasConflict` callers re-read before retrying, so it is not
    /// retryable as-is either.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::QuorumUnreachable { .. } | Error::NoHealthyReplicas
        )
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

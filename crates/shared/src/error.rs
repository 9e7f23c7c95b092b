use std::fmt;

use thiserror::Error;

/// Classified result of one remote fetch, one instance per resource per
/// trigger.
pub type FetchOutcome<T> = Result<T, FetchError>;

/// The failure half of the fetch taxonomy.
///
/// `SchemaMismatch` means the response parsed as data but was not the
/// expected resource shape; it is presented as "invalid handle". Everything
/// else (connect failure, timeout, non-JSON error page) is a transport
/// failure carrying a displayable cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("response parsed as data but did not match the expected resource shape")]
    SchemaMismatch,
    #[error("transport failure: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn transport(cause: impl fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }
}

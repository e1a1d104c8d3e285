//! Authorization error taxonomy.

use thiserror::Error;

/// Error raised by the authorization engine.
///
/// Every variant carries a human-readable message and maps to exactly one
/// HTTP status class; the conversion to a response happens once, at the
/// API boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Malformed request input (missing tenant id, bad scope id, unknown
    /// scope kind).
    #[error("{0}")]
    BadRequest(String),

    /// The caller is authenticated but not permitted.
    #[error("{0}")]
    Forbidden(String),
}

impl AuthzError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// HTTP status class the error belongs to.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Forbidden(_) => 403,
        }
    }
}

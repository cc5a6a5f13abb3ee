//! Service error types.

use thiserror::Error;

/// Errors produced by services in this crate.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The listen address could not be parsed or bound.
    #[error("invalid listen address {addr}: {reason}")]
    InvalidAddress {
        /// The address that was tried.
        addr: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ServiceError::InvalidAddress {
            addr: "nowhere:99999".into(),
            reason: "invalid port".into(),
        };
        assert_eq!(err.to_string(), "invalid listen address nowhere:99999: invalid port");

        let err = ServiceError::from(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "io error: disk full");
    }
}

//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, missing execution capabilities, codec range violations,
//! empty site sets, and driver misuse.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("execution capability unavailable: {0}")]
    Capability(String),

    #[error("cannot assign ownership: the site set is empty")]
    EmptySiteSet,

    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid engine state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Returns `true` for errors that are raised before any iteration runs.
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_) | Error::Capability(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_are_classified() {
        assert!(Error::InvalidConfig("samples".into()).is_setup_error());
        assert!(Error::Capability("pool".into()).is_setup_error());
        assert!(!Error::EmptySiteSet.is_setup_error());
        assert!(!Error::Codec("range".into()).is_setup_error());
    }

    #[test]
    fn display_includes_context() {
        let err = Error::Capability("no threads".into());
        assert_eq!(err.to_string(), "execution capability unavailable: no threads");
    }
}

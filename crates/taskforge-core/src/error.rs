//! The error type returned across the core's public API.
//!
//! [`ForgeError`] is either a broken model rule ([`DomainError`]) or a failed
//! lookup, parse or write while orchestrating ([`ApplicationError`]). Both
//! carry hints for the user and a category front-ends map to exit codes.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

pub use crate::domain::ErrorCategory;

#[derive(Debug, Error, Clone)]
pub enum ForgeError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Application(#[from] ApplicationError),
}

impl ForgeError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category(),
            Self::Application(e) => e.category(),
        }
    }

    /// A type miss can be resolved by importing the typekit that defines it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_type_miss())
    }
}

pub type ForgeResult<T> = Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_type_misses_are_retryable() {
        let miss: ForgeError = DomainError::TypeNotFound {
            name: "/base/Time".into(),
        }
        .into();
        assert!(miss.is_retryable());
        assert_eq!(miss.category(), ErrorCategory::NotFound);

        let dup: ForgeError = DomainError::DuplicateTask { name: "x".into() }.into();
        assert!(!dup.is_retryable());
        assert_eq!(dup.category(), ErrorCategory::Validation);
    }

    #[test]
    fn application_errors_keep_their_category() {
        let err: ForgeError = ApplicationError::ImportCycle {
            chain: "a -> b -> a".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.to_string().contains("a -> b -> a"));
    }
}

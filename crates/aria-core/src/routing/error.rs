//! Error types for keyword routing.

use super::router::UNHANDLED;

/// Errors produced while registering handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("handler identifier must not be empty")]
    EmptyIdentifier,

    #[error("handler identifier {0:?} is reserved for unmatched messages")]
    ReservedIdentifier(String),
}

impl RoutingError {
    pub(crate) fn check_identifier(identifier: &str) -> RoutingResult<()> {
        if identifier.trim().is_empty() {
            return Err(RoutingError::EmptyIdentifier);
        }
        if identifier == UNHANDLED {
            return Err(RoutingError::ReservedIdentifier(identifier.to_string()));
        }
        Ok(())
    }
}

/// Result type for routing operations.
pub type RoutingResult<T> = std::result::Result<T, RoutingError>;

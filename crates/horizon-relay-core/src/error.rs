//! Error types for Horizon Relay.
//!
//! Only [`RegistryError`] is ever surfaced by the controller's public
//! operations. Dispatch and view failures are produced at the edges
//! (setter tables, view sinks) and absorbed by the controller according to
//! its fire-and-forget contract.

/// Errors raised by the weak observer registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An index was outside the current bounds of the registry.
    #[error("index {index} out of range for registry of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The registry length at the time of the access.
        len: usize,
    },
}

/// Errors produced while locating or invoking a named setter on a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The model exposes no operation with this name.
    #[error("no operation named '{operation}'")]
    NoSuchOperation {
        /// The full operation name that was looked up.
        operation: String,
    },

    /// The operation exists but none of its overloads accepts the value's type.
    #[error("operation '{operation}' does not accept a value of type {got}")]
    TypeMismatch {
        /// The full operation name that was looked up.
        operation: String,
        /// The runtime type name of the rejected value.
        got: &'static str,
    },
}

impl DispatchError {
    /// Create a lookup failure for an unknown operation.
    pub fn no_such_operation(operation: impl Into<String>) -> Self {
        Self::NoSuchOperation {
            operation: operation.into(),
        }
    }

    /// Create a lookup failure for a value of the wrong type.
    pub fn type_mismatch(operation: impl Into<String>, got: &'static str) -> Self {
        Self::TypeMismatch {
            operation: operation.into(),
            got,
        }
    }
}

/// Failure reported by a view while handling a change event.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SinkError {
    /// Create a view failure with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a view failure wrapping an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The main error type for Horizon Relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Registry access error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Setter dispatch error.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// View failure.
    #[error("View error: {0}")]
    Sink(#[from] SinkError),
}

/// A specialized Result type for Horizon Relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Result type for setter dispatch.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Result type returned by view sinks.
pub type SinkResult = std::result::Result<(), SinkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_index_out_of_range_message() {
        let err = RegistryError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "index 4 out of range for registry of length 2");
    }

    #[test]
    fn test_sink_error_source_chain() {
        let io = std::io::Error::other("disk gone");
        let err = SinkError::with_source("repaint failed", io);
        assert_eq!(err.message(), "repaint failed");
        assert!(err.source().is_some());
        assert!(SinkError::new("plain").source().is_none());
    }

    #[test]
    fn test_relay_error_conversions() {
        let err: RelayError = DispatchError::no_such_operation("setWeight").into();
        assert!(matches!(err, RelayError::Dispatch(DispatchError::NoSuchOperation { .. })));
        assert_eq!(err.to_string(), "Dispatch error: no operation named 'setWeight'");

        let err: RelayError = RegistryError::IndexOutOfRange { index: 0, len: 0 }.into();
        assert!(err.source().is_some());
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Error types for dispatch and metadata operations

use thiserror::Error;

/// Errors that can occur while registering, dispatching or stamping requests
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No resolved handler instance had a registration for the request's exact type
    #[error("Unable to retrieve an {handler} for the specified {request}: {full_type_name}.")]
    OrphanedHandler {
        /// Name of the offending parameter
        param: &'static str,
        /// Short name of the abstract handler contract
        handler: String,
        /// Short name of the request type
        request: String,
        /// Fully qualified name of the request type
        full_type_name: String,
    },

    /// A reserved metadata key was written through the restricted path
    #[error("The specified key is a reserved keyword: {key}")]
    ReservedKeyword {
        /// The rejected key
        key: String,
    },

    /// A metadata key was added twice through the restricted path
    #[error("An item with the same key has already been added: {key}")]
    DuplicateKey {
        /// The duplicated key
        key: String,
    },

    /// A reply was requested as a different type than the handler produces
    #[error("Handler for {request} produces {registered}, but {expected} was requested")]
    ResultTypeMismatch {
        /// Request type the handler is registered for
        request: String,
        /// Result type the caller asked for
        expected: &'static str,
        /// Result type the handler was registered with
        registered: &'static str,
    },

    /// The operation observed its cancellation token
    #[error("Operation was cancelled")]
    Cancelled,

    /// Error raised from inside a handler body
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    /// Create an orphaned handler error for a contract and request type name
    pub fn orphaned_handler(param: &'static str, handler: &str, request: &str) -> Self {
        DispatchError::OrphanedHandler {
            param,
            handler: short_type_name(handler).to_string(),
            request: short_type_name(request).to_string(),
            full_type_name: request.to_string(),
        }
    }

    /// Create a reserved keyword error
    pub fn reserved_keyword(key: impl Into<String>) -> Self {
        DispatchError::ReservedKeyword { key: key.into() }
    }

    /// Check if no handler matched the request
    pub fn is_orphaned_handler(&self) -> bool {
        matches!(self, DispatchError::OrphanedHandler { .. })
    }

    /// Check if this is a metadata validation error
    pub fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            DispatchError::ReservedKeyword { .. } | DispatchError::DuplicateKey { .. }
        )
    }

    /// Check if the operation was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchError::Cancelled)
    }
}

/// Reduces a fully qualified type name to its last path segment.
///
/// Generic arguments and a leading `dyn ` are dropped, so
/// `dyn cim_mediator::commands::CommandHandler` becomes `CommandHandler`
/// and `my_app::Wrapper<my_app::Inner>` becomes `Wrapper`.
pub fn short_type_name(full: &str) -> &str {
    let full = full.strip_prefix("dyn ").unwrap_or(full);
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

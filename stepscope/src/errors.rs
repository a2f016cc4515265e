//! Error types for step execution.
//!
//! Resource failures are deterministic for a given path and workspace state,
//! so none of them are retried here. Every message carries [`ERROR_TAG`] so
//! operators can tell these failures apart from unrelated I/O errors.

use std::collections::HashMap;
use thiserror::Error;

/// Stable prefix on every resource failure message.
pub const ERROR_TAG: &str = "JTE";

/// Classification of a [`ResourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceErrorKind {
    /// The path was absolute or resolved outside the sandbox root.
    SecurityViolation,
    /// Nothing exists at the resolved location.
    NotFound,
    /// The resolved location is not a regular file.
    InvalidResourceType,
    /// No sandbox root was bound before the resource was requested.
    Precondition,
    /// The file passed every check but could not be read.
    Unreadable,
}

impl ResourceErrorKind {
    /// Returns the stable code for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SecurityViolation => "RESOURCE-SECURITY",
            Self::NotFound => "RESOURCE-NOT-FOUND",
            Self::InvalidResourceType => "RESOURCE-INVALID-TYPE",
            Self::Precondition => "RESOURCE-PRECONDITION",
            Self::Unreadable => "RESOURCE-UNREADABLE",
        }
    }
}

/// Failure of a library step's resource request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// The requested path escapes the sandbox root.
    #[error("JTE: library step requested a resource '{path}' that {reason}")]
    SecurityViolation {
        /// The requested path.
        path: String,
        /// Which rule was broken.
        reason: String,
    },

    /// The requested resource does not exist.
    #[error("JTE: library step requested a resource '{path}' that does not exist")]
    NotFound {
        /// The requested path.
        path: String,
    },

    /// The requested resource is a directory or other non-file entry.
    #[error("JTE: library step requested a resource '{path}' that is not a file")]
    InvalidResourceType {
        /// The requested path.
        path: String,
    },

    /// The resource accessor ran before a sandbox root was bound.
    #[error("JTE: resource '{path}' requested before a resource root was bound to the step")]
    PreconditionError {
        /// The requested path.
        path: String,
    },

    /// The resource could not be read.
    #[error("JTE: library step requested a resource '{path}' that could not be read: {reason}")]
    Unreadable {
        /// The requested path.
        path: String,
        /// The underlying failure.
        reason: String,
    },
}

impl ResourceError {
    /// Creates a security violation for an absolute path.
    #[must_use]
    pub fn absolute_path(path: impl Into<String>) -> Self {
        Self::SecurityViolation {
            path: path.into(),
            reason: "is not a relative path".to_string(),
        }
    }

    /// Creates a security violation for a path leaving the sandbox root.
    #[must_use]
    pub fn outside_root(path: impl Into<String>) -> Self {
        Self::SecurityViolation {
            path: path.into(),
            reason: "resolves outside of the resources directory".to_string(),
        }
    }

    /// Creates a security violation for a symlinked resource when links are disallowed.
    #[must_use]
    pub fn symlinked(path: impl Into<String>) -> Self {
        Self::SecurityViolation {
            path: path.into(),
            reason: "is reached through a symbolic link".to_string(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an invalid-resource-type error.
    #[must_use]
    pub fn invalid_type(path: impl Into<String>) -> Self {
        Self::InvalidResourceType { path: path.into() }
    }

    /// Creates a missing-root precondition error.
    #[must_use]
    pub fn root_not_bound(path: impl Into<String>) -> Self {
        Self::PreconditionError { path: path.into() }
    }

    /// Creates an unreadable-resource error.
    #[must_use]
    pub fn unreadable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ResourceErrorKind {
        match self {
            Self::SecurityViolation { .. } => ResourceErrorKind::SecurityViolation,
            Self::NotFound { .. } => ResourceErrorKind::NotFound,
            Self::InvalidResourceType { .. } => ResourceErrorKind::InvalidResourceType,
            Self::PreconditionError { .. } => ResourceErrorKind::Precondition,
            Self::Unreadable { .. } => ResourceErrorKind::Unreadable,
        }
    }

    /// Returns the path the step asked for.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::SecurityViolation { path, .. }
            | Self::NotFound { path }
            | Self::InvalidResourceType { path }
            | Self::PreconditionError { path }
            | Self::Unreadable { path, .. } => path,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.kind().code()));
        map.insert("path".to_string(), serde_json::json!(self.path()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::SecurityViolation { reason, .. } | Self::Unreadable { reason, .. } => {
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            _ => {}
        }

        map
    }
}

/// Failure of a single step invocation.
#[derive(Debug, Error)]
pub enum StepError {
    /// A resource request failed.
    #[error("{0}")]
    Resource(#[from] ResourceError),

    /// The step's configuration was unusable.
    #[error("JTE: invalid step configuration: {0}")]
    Configuration(String),

    /// The step body reported a failure.
    #[error("JTE: step execution failed: {0}")]
    Execution(String),

    /// Serialization/deserialization error.
    #[error("JTE: serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blocking resource read panicked or was cancelled.
    #[error("JTE: resource read did not complete: {0}")]
    Join(String),
}

impl StepError {
    /// Creates an execution error.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns the resource error, if this failure came from one.
    #[must_use]
    pub const fn as_resource(&self) -> Option<&ResourceError> {
        match self {
            Self::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for StepError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

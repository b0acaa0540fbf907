//! Error types and result aliases for medallion.
//!
//! Platform failures keep the native error code and message reported by the
//! SQL engine. They are classified but never rewritten.

use std::fmt;

/// The result type used throughout medallion.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A catalog or schema name failed validation.
    InvalidName,
    /// A namespace layout is malformed.
    InvalidLayout,
    /// The session lacks a privilege required by the statement.
    PermissionDenied,
    /// The platform could not be reached.
    Connectivity,
    /// The name is already taken by an incompatible object.
    NamingConflict,
    /// A referenced namespace does not exist.
    NotFound,
    /// Any other failure reported by the platform.
    Platform,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidName => "invalid_name",
            Self::InvalidLayout => "invalid_layout",
            Self::PermissionDenied => "permission_denied",
            Self::Connectivity => "connectivity",
            Self::NamingConflict => "naming_conflict",
            Self::NotFound => "not_found",
            Self::Platform => "platform",
        };
        write!(f, "{s}")
    }
}

/// Errors that can occur while provisioning namespaces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid catalog or schema name was provided.
    #[error("invalid name: {message}")]
    InvalidName {
        /// Description of what made the name invalid.
        message: String,
    },

    /// A namespace layout could not be built or parsed.
    #[error("invalid layout: {message}")]
    InvalidLayout {
        /// Description of the layout problem.
        message: String,
    },

    /// The platform rejected the statement for lack of privilege.
    #[error("permission denied [{code}]: {message}")]
    PermissionDenied {
        /// Native error code reported by the platform.
        code: String,
        /// Native error message reported by the platform.
        message: String,
    },

    /// The platform is unreachable or the request did not complete.
    #[error("connectivity failure: {message}")]
    Connectivity {
        /// Description of the transport failure.
        message: String,
        /// Native error code, when the platform reported one.
        code: Option<String>,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The name is already used by an object of another type.
    #[error("naming conflict [{code}]: {message}")]
    NamingConflict {
        /// Native error code reported by the platform.
        code: String,
        /// Native error message reported by the platform.
        message: String,
    },

    /// A referenced catalog or schema does not exist.
    #[error("not found [{code}]: {message}")]
    NotFound {
        /// Native error code reported by the platform.
        code: String,
        /// Native error message reported by the platform.
        message: String,
    },

    /// Any other platform failure.
    #[error("platform error [{code}]: {message}")]
    Platform {
        /// Native error code reported by the platform.
        code: String,
        /// Native error message reported by the platform.
        message: String,
    },
}

impl Error {
    /// Creates a connectivity error without an underlying cause.
    #[must_use]
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            code: None,
            source: None,
        }
    }

    /// Creates a connectivity error that carries the platform's native code.
    ///
    /// The code is kept in the message as `[CODE]` and returned by
    /// [`Error::platform_code`].
    #[must_use]
    pub fn connectivity_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        Self::Connectivity {
            message: format!("[{code}] {}", message.into()),
            code: Some(code),
            source: None,
        }
    }

    /// Creates a connectivity error with a source cause.
    #[must_use]
    pub fn connectivity_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connectivity {
            message: message.into(),
            code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Builds a platform error from a native error code, classifying it by code.
    ///
    /// Unknown codes become [`Error::Platform`]; the code and message are kept as-is.
    #[must_use]
    pub fn from_platform(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        match code.as_str() {
            "PERMISSION_DENIED" | "UNAUTHENTICATED" | "INSUFFICIENT_PERMISSIONS" => {
                Self::PermissionDenied { code, message }
            }
            "RESOURCE_ALREADY_EXISTS"
            | "SCHEMA_ALREADY_EXISTS"
            | "CATALOG_ALREADY_EXISTS"
            | "TABLE_OR_VIEW_ALREADY_EXISTS" => Self::NamingConflict { code, message },
            "NOT_FOUND"
            | "RESOURCE_DOES_NOT_EXIST"
            | "NO_SUCH_CATALOG_EXCEPTION"
            | "SCHEMA_NOT_FOUND" => Self::NotFound { code, message },
            "TEMPORARILY_UNAVAILABLE" | "SERVICE_UNAVAILABLE" => {
                Self::connectivity_with_code(code, message)
            }
            _ => Self::Platform { code, message },
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName { .. } => ErrorKind::InvalidName,
            Self::InvalidLayout { .. } => ErrorKind::InvalidLayout,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::NamingConflict { .. } => ErrorKind::NamingConflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Platform { .. } => ErrorKind::Platform,
        }
    }

    /// Returns the native platform error code, if the platform reported one.
    #[must_use]
    pub fn platform_code(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { code, .. }
            | Self::NamingConflict { code, .. }
            | Self::NotFound { code, .. }
            | Self::Platform { code, .. } => Some(code),
            Self::Connectivity { code, .. } => code.as_deref(),
            Self::InvalidName { .. } | Self::InvalidLayout { .. } => None,
        }
    }
}

//! # Error Types
//!
//! The closed Web eID error taxonomy. Every failure surfaced to a caller is a
//! `WebEidError`, whose `ErrorKind` maps one-to-one onto an `ErrorCode`.

use crate::entities::{RequiresUpdate, Versions};
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use thiserror::Error;

/// Stable error codes that cross the page/extension boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Timeout errors
    #[serde(rename = "ERR_WEBEID_ACTION_TIMEOUT")]
    ActionTimeout,
    #[serde(rename = "ERR_WEBEID_USER_TIMEOUT")]
    UserTimeout,

    // Health errors
    #[serde(rename = "ERR_WEBEID_VERSION_MISMATCH")]
    VersionMismatch,
    #[serde(rename = "ERR_WEBEID_VERSION_INVALID")]
    VersionInvalid,
    #[serde(rename = "ERR_WEBEID_EXTENSION_UNAVAILABLE")]
    ExtensionUnavailable,
    #[serde(rename = "ERR_WEBEID_NATIVE_UNAVAILABLE")]
    NativeUnavailable,
    #[serde(rename = "ERR_WEBEID_UNKNOWN_ERROR")]
    UnknownError,

    // Security errors
    #[serde(rename = "ERR_WEBEID_CONTEXT_INSECURE")]
    ContextInsecure,

    // Third party errors
    #[serde(rename = "ERR_WEBEID_USER_CANCELLED")]
    UserCancelled,
    #[serde(rename = "ERR_WEBEID_NATIVE_INVALID_ARGUMENT")]
    NativeInvalidArgument,
    #[serde(rename = "ERR_WEBEID_NATIVE_FATAL")]
    NativeFatal,

    // Developer mistakes
    #[serde(rename = "ERR_WEBEID_ACTION_PENDING")]
    ActionPending,
    #[serde(rename = "ERR_WEBEID_MISSING_PARAMETER")]
    MissingParameter,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 13] = [
        ErrorCode::ActionTimeout,
        ErrorCode::UserTimeout,
        ErrorCode::VersionMismatch,
        ErrorCode::VersionInvalid,
        ErrorCode::ExtensionUnavailable,
        ErrorCode::NativeUnavailable,
        ErrorCode::UnknownError,
        ErrorCode::ContextInsecure,
        ErrorCode::UserCancelled,
        ErrorCode::NativeInvalidArgument,
        ErrorCode::NativeFatal,
        ErrorCode::ActionPending,
        ErrorCode::MissingParameter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ActionTimeout => "ERR_WEBEID_ACTION_TIMEOUT",
            ErrorCode::UserTimeout => "ERR_WEBEID_USER_TIMEOUT",
            ErrorCode::VersionMismatch => "ERR_WEBEID_VERSION_MISMATCH",
            ErrorCode::VersionInvalid => "ERR_WEBEID_VERSION_INVALID",
            ErrorCode::ExtensionUnavailable => "ERR_WEBEID_EXTENSION_UNAVAILABLE",
            ErrorCode::NativeUnavailable => "ERR_WEBEID_NATIVE_UNAVAILABLE",
            ErrorCode::UnknownError => "ERR_WEBEID_UNKNOWN_ERROR",
            ErrorCode::ContextInsecure => "ERR_WEBEID_CONTEXT_INSECURE",
            ErrorCode::UserCancelled => "ERR_WEBEID_USER_CANCELLED",
            ErrorCode::NativeInvalidArgument => "ERR_WEBEID_NATIVE_INVALID_ARGUMENT",
            ErrorCode::NativeFatal => "ERR_WEBEID_NATIVE_FATAL",
            ErrorCode::ActionPending => "ERR_WEBEID_ACTION_PENDING",
            ErrorCode::MissingParameter => "ERR_WEBEID_MISSING_PARAMETER",
        }
    }

    /// Look up a wire code. Unknown strings yield `None`.
    pub fn from_code(code: &str) -> Option<ErrorCode> {
        ErrorCode::ALL.into_iter().find(|c| c.as_str() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One variant per `ErrorCode`.
///
/// Only `VersionMismatch` carries extra payload; the library version lives
/// on `WebEidError` itself because any status failure may be stamped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    ActionPending,
    ActionTimeout,
    ContextInsecure,
    ExtensionUnavailable,
    MissingParameter,
    NativeInvalidArgument,
    NativeFatal,
    NativeUnavailable,
    UserCancelled,
    UserTimeout,
    VersionInvalid,
    VersionMismatch {
        requires_update: RequiresUpdate,
        extension: Option<String>,
        native_app: Option<String>,
    },
    Unknown,
}

impl ErrorKind {
    /// Construct the kind for a code, with an empty payload where one exists.
    pub fn from_code(code: ErrorCode) -> ErrorKind {
        match code {
            ErrorCode::ActionPending => ErrorKind::ActionPending,
            ErrorCode::ActionTimeout => ErrorKind::ActionTimeout,
            ErrorCode::ContextInsecure => ErrorKind::ContextInsecure,
            ErrorCode::ExtensionUnavailable => ErrorKind::ExtensionUnavailable,
            ErrorCode::MissingParameter => ErrorKind::MissingParameter,
            ErrorCode::NativeInvalidArgument => ErrorKind::NativeInvalidArgument,
            ErrorCode::NativeFatal => ErrorKind::NativeFatal,
            ErrorCode::NativeUnavailable => ErrorKind::NativeUnavailable,
            ErrorCode::UserCancelled => ErrorKind::UserCancelled,
            ErrorCode::UserTimeout => ErrorKind::UserTimeout,
            ErrorCode::VersionInvalid => ErrorKind::VersionInvalid,
            ErrorCode::VersionMismatch => ErrorKind::VersionMismatch {
                requires_update: RequiresUpdate::default(),
                extension: None,
                native_app: None,
            },
            ErrorCode::UnknownError => ErrorKind::Unknown,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ErrorKind::ActionPending => ErrorCode::ActionPending,
            ErrorKind::ActionTimeout => ErrorCode::ActionTimeout,
            ErrorKind::ContextInsecure => ErrorCode::ContextInsecure,
            ErrorKind::ExtensionUnavailable => ErrorCode::ExtensionUnavailable,
            ErrorKind::MissingParameter => ErrorCode::MissingParameter,
            ErrorKind::NativeInvalidArgument => ErrorCode::NativeInvalidArgument,
            ErrorKind::NativeFatal => ErrorCode::NativeFatal,
            ErrorKind::NativeUnavailable => ErrorCode::NativeUnavailable,
            ErrorKind::UserCancelled => ErrorCode::UserCancelled,
            ErrorKind::UserTimeout => ErrorCode::UserTimeout,
            ErrorKind::VersionInvalid => ErrorCode::VersionInvalid,
            ErrorKind::VersionMismatch { .. } => ErrorCode::VersionMismatch,
            ErrorKind::Unknown => ErrorCode::UnknownError,
        }
    }

    /// Error class name as it appears in a serialized error.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::ActionPending => "ActionPendingError",
            ErrorKind::ActionTimeout => "ActionTimeoutError",
            ErrorKind::ContextInsecure => "ContextInsecureError",
            ErrorKind::ExtensionUnavailable => "ExtensionUnavailableError",
            ErrorKind::MissingParameter => "MissingParameterError",
            ErrorKind::NativeInvalidArgument => "NativeInvalidArgumentError",
            ErrorKind::NativeFatal => "NativeFatalError",
            ErrorKind::NativeUnavailable => "NativeUnavailableError",
            ErrorKind::UserCancelled => "UserCancelledError",
            ErrorKind::UserTimeout => "UserTimeoutError",
            ErrorKind::VersionInvalid => "VersionInvalidError",
            ErrorKind::VersionMismatch { .. } => "VersionMismatchError",
            ErrorKind::Unknown => "UnknownError",
        }
    }

    /// Message used when the error is raised without one.
    pub fn default_message(&self) -> String {
        match self {
            ErrorKind::ActionPending => {
                "same action for Web-eID browser extension is already pending".into()
            }
            ErrorKind::ActionTimeout => "extension message timeout".into(),
            ErrorKind::ContextInsecure => {
                "Secure context required, see https://developer.mozilla.org/en-US/docs/Web/Security/Secure_Contexts".into()
            }
            ErrorKind::ExtensionUnavailable => "Web-eID extension is not available".into(),
            ErrorKind::MissingParameter => "a required parameter is missing".into(),
            ErrorKind::NativeInvalidArgument => {
                "native application received an invalid argument".into()
            }
            ErrorKind::NativeFatal => "native application terminated with a fatal error".into(),
            ErrorKind::NativeUnavailable => "Web-eID native application is not available".into(),
            ErrorKind::UserCancelled => "request was cancelled by the user".into(),
            ErrorKind::UserTimeout => "user failed to respond in time".into(),
            ErrorKind::VersionInvalid => "invalid version string".into(),
            ErrorKind::VersionMismatch {
                requires_update, ..
            } => version_mismatch_message(requires_update),
            ErrorKind::Unknown => "an unknown error occurred".into(),
        }
    }
}

fn version_mismatch_message(requires_update: &RequiresUpdate) -> String {
    let component = match (requires_update.extension, requires_update.native_app) {
        (true, true) => "extension and native app",
        (true, false) => "extension",
        (false, true) => "native app",
        (false, false) => return "requiresUpdate not provided".into(),
    };
    format!("Update required for Web-eID {component}")
}

/// A typed Web eID error.
///
/// `code()` and `name()` are derived from the kind; `message` and `stack`
/// travel across the bus unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WebEidError {
    kind: ErrorKind,
    message: String,
    stack: String,
    library: Option<String>,
}

impl WebEidError {
    /// Create an error with the kind's default message.
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.default_message();
        Self::with_message(kind, message)
    }

    /// Create an error with a custom message.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let stack = capture_stack(kind.name(), &message);
        Self {
            kind,
            message,
            stack,
            library: None,
        }
    }

    /// Reassemble an error from its transported parts.
    pub fn from_parts(
        kind: ErrorKind,
        message: String,
        stack: Option<String>,
        library: Option<String>,
    ) -> Self {
        let stack = stack.unwrap_or_else(|| capture_stack(kind.name(), &message));
        Self {
            kind,
            message,
            stack,
            library,
        }
    }

    pub fn action_pending() -> Self {
        Self::new(ErrorKind::ActionPending)
    }

    pub fn action_timeout() -> Self {
        Self::new(ErrorKind::ActionTimeout)
    }

    pub fn context_insecure() -> Self {
        Self::new(ErrorKind::ContextInsecure)
    }

    pub fn extension_unavailable() -> Self {
        Self::new(ErrorKind::ExtensionUnavailable)
    }

    pub fn missing_parameter(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::MissingParameter, message)
    }

    pub fn version_invalid(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::VersionInvalid, message)
    }

    /// Version mismatch carrying the computed flags and, when known, all
    /// three versions.
    pub fn version_mismatch(versions: Option<&Versions>, requires_update: RequiresUpdate) -> Self {
        let kind = ErrorKind::VersionMismatch {
            requires_update,
            extension: versions.map(|v| v.extension.clone()),
            native_app: versions.map(|v| v.native_app.clone()),
        };
        let mut error = Self::new(kind);
        error.library = versions.map(|v| v.library.clone());
        error
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Unknown, message)
    }

    /// Stamp the library version onto the error.
    #[must_use]
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    /// Update flags, present only on `VersionMismatch`.
    pub fn requires_update(&self) -> Option<RequiresUpdate> {
        match &self.kind {
            ErrorKind::VersionMismatch {
                requires_update, ..
            } => Some(*requires_update),
            _ => None,
        }
    }
}

/// Result type for Web eID operations.
pub type WebEidResult<T> = Result<T, WebEidError>;

/// Transport-safe form of a `WebEidError`.
///
/// `code` is kept as a plain string so that codes from a newer extension
/// survive until the receiver decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedError {
    pub code: String,
    pub name: String,
    pub message: String,
    pub stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_update: Option<RequiresUpdate>,
}

fn capture_stack(name: &str, message: &str) -> String {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => format!("{name}: {message}\n{backtrace}"),
        _ => format!("{name}: {message}"),
    }
}

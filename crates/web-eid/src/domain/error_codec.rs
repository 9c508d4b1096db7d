//! Error Codec - typed errors to and from their transport form.
//!
//! Decoding never fails: anything that does not look like a serialized Web eID
//! error becomes `ErrorKind::Unknown` with whatever message and stack could
//! be salvaged.

use serde_json::Value;
use webeid_types::{ErrorCode, ErrorKind, RequiresUpdate, SerializedError, WebEidError};

/// Serialize a Web eID error, carrying its per-kind payload.
pub fn serialize_error(error: &WebEidError) -> SerializedError {
    let (extension, native_app, requires_update) = match error.kind() {
        ErrorKind::VersionMismatch {
            requires_update,
            extension,
            native_app,
        } => (extension.clone(), native_app.clone(), Some(*requires_update)),
        _ => (None, None, None),
    };

    SerializedError {
        code: error.code().as_str().to_owned(),
        name: error.name().to_owned(),
        message: error.message().to_owned(),
        stack: error.stack().to_owned(),
        library: error.library().map(str::to_owned),
        extension,
        native_app,
        requires_update,
    }
}

/// Serialize an error that is not a Web eID error. The code is forced to
/// `ERR_WEBEID_UNKNOWN_ERROR`; the source chain ends up in the stack.
pub fn serialize_foreign_error(error: &(dyn std::error::Error + 'static)) -> SerializedError {
    let name = ErrorKind::Unknown.name();
    let message = error.to_string();

    let mut stack = format!("{name}: {message}");
    let mut source = error.source();
    while let Some(cause) = source {
        stack.push_str("\nCaused by: ");
        stack.push_str(&cause.to_string());
        source = cause.source();
    }

    SerializedError {
        code: ErrorCode::UnknownError.as_str().to_owned(),
        name: name.to_owned(),
        message,
        stack,
        library: None,
        extension: None,
        native_app: None,
        requires_update: None,
    }
}

/// Rebuild a typed error from an untrusted JSON value.
pub fn deserialize_error(value: &Value) -> WebEidError {
    let stack = str_field(value, "stack").map(str::to_owned);

    let known = str_field(value, "code")
        .and_then(ErrorCode::from_code)
        .zip(str_field(value, "message"));

    let Some((code, message)) = known else {
        let message = str_field(value, "message")
            .map(str::to_owned)
            .unwrap_or_else(|| ErrorKind::Unknown.default_message());
        return WebEidError::from_parts(ErrorKind::Unknown, message, stack, None);
    };

    let kind = match ErrorKind::from_code(code) {
        ErrorKind::VersionMismatch { .. } => ErrorKind::VersionMismatch {
            requires_update: value
                .get("requiresUpdate")
                .and_then(|flags| serde_json::from_value::<RequiresUpdate>(flags.clone()).ok())
                .unwrap_or_default(),
            extension: str_field(value, "extension").map(str::to_owned),
            native_app: str_field(value, "nativeApp").map(str::to_owned),
        },
        other => other,
    };

    let library = str_field(value, "library").map(str::to_owned);
    WebEidError::from_parts(kind, message.to_owned(), stack, library)
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

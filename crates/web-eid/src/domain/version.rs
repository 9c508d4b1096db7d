//! Compatibility between the library, the extension and the native app.

use crate::domain::semver::{compare_semver, parse_semver, IdentifierDiff};
use serde_json::Value;
use webeid_types::{RequiresUpdate, Versions, WebEidResult};

/// Decide which components are a major version behind the library.
///
/// Only the major field matters. The native app is compared against the
/// library, never against the extension.
pub fn check_compatibility(versions: &Versions) -> WebEidResult<RequiresUpdate> {
    let library = parse_semver(&versions.library)?;
    let extension = parse_semver(&versions.extension)?;
    let native_app = parse_semver(&versions.native_app)?;

    Ok(RequiresUpdate {
        extension: compare_semver(&extension, &library).major == IdentifierDiff::Older,
        native_app: compare_semver(&native_app, &library).major == IdentifierDiff::Older,
    })
}

/// Whether `value` is an object carrying any of `library`, `extension` or
/// `nativeApp`. Values are not checked for validity.
pub fn has_version_properties(value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        ["library", "extension", "nativeApp"]
            .iter()
            .any(|key| object.contains_key(*key))
    })
}

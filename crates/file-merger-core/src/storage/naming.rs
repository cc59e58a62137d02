//! File name rules for saved documents.

use crate::error::{Error, Result};
use crate::util::unix_millis;

const PDF_SUFFIX: &str = ".pdf";

/// Base name used when the caller does not supply one.
pub fn default_base_name() -> String {
    format!("merged-document-{}", unix_millis())
}

/// Turn an optional caller-supplied name into a base name.
///
/// Blank names fall back to a timestamped default, and a trailing ".pdf" is
/// removed since it is added back when the name is uniquified.
pub fn normalize_base_name(requested: Option<&str>) -> String {
    let name = requested.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return default_base_name();
    }

    let stripped = name.strip_suffix(PDF_SUFFIX).unwrap_or(name);
    if stripped.is_empty() {
        default_base_name()
    } else {
        stripped.to_string()
    }
}

/// The `attempt`-th candidate file name for a base name.
///
/// Attempt 0 is `base.pdf`, attempt n is `base_n.pdf`.
pub fn candidate_name(base: &str, attempt: u64) -> String {
    if attempt == 0 {
        format!("{base}{PDF_SUFFIX}")
    } else {
        format!("{base}_{attempt}{PDF_SUFFIX}")
    }
}

/// Accept only a single, plain path component.
///
/// Rejects empty names, `.` and `..`, and anything containing a path
/// separator or a control character, so a name can never address a file
/// outside the storage directory and is always a valid header value.
pub fn validate_file_name(name: &str) -> Result<&str> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);

    if invalid {
        Err(Error::InvalidFileName(name.to_string()))
    } else {
        Ok(name)
    }
}

use std::path::{Component, Path};

use crate::error::Corruption;

/// Validates a file name recovered from (or destined for) a header record.
///
/// The name is later joined onto an output directory, so it must be a single
/// plain path component. Rejects:
/// - Empty names
/// - Path separators (`/` or `\`)
/// - `.` and `..`
/// - NUL bytes
/// - Windows prefixes (`C:`)
pub fn validate_file_name(name: &str) -> Result<(), Corruption> {
    if name.is_empty() {
        return Err(Corruption::InvalidFileName("empty name".into()));
    }

    if name.contains(['/', '\\']) {
        return Err(Corruption::InvalidFileName(format!(
            "path separator not allowed: {name}"
        )));
    }

    if name.contains('\0') {
        return Err(Corruption::InvalidFileName(format!(
            "NUL byte not allowed: {name:?}"
        )));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Corruption::InvalidFileName(format!(
            "not a plain file name: {name}"
        ))),
    }
}

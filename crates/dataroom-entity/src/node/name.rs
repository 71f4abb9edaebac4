//! Collision-free naming within a sibling group.
//!
//! This is the single authority for resolving duplicate names: folder
//! creation, file upload and rename all go through [`ensure_unique_name`].

use std::collections::HashSet;

/// Insert a counter suffix before the extension.
///
/// The name is split at its last dot; the extension keeps the dot and is
/// empty when there is none.
///
/// ```
/// use dataroom_entity::node::with_suffix;
///
/// assert_eq!(with_suffix("Report.pdf", 2), "Report (2).pdf");
/// assert_eq!(with_suffix("Notes", 1), "Notes (1)");
/// ```
pub fn with_suffix(name: &str, n: u64) -> String {
    let (base, ext) = match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    };
    format!("{base} ({n}){ext}")
}

/// Return `desired` unchanged if its lowercase form is free, otherwise the
/// first `with_suffix(desired, n)` (n = 1, 2, ...) whose lowercase form is.
///
/// `existing_lower` holds the lowercased names already in the target
/// sibling group.
pub fn ensure_unique_name(desired: &str, existing_lower: &HashSet<String>) -> String {
    if !existing_lower.contains(&desired.to_lowercase()) {
        return desired.to_string();
    }

    let mut n = 1;
    loop {
        let candidate = with_suffix(desired, n);
        if !existing_lower.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

//! Managed segment inside a user-editable launch-options string
//!
//! The engine owns exactly one delimiter-bounded substring of a game's
//! launch options; everything outside the markers belongs to the user and is
//! never touched beyond whitespace normalization. Merging is idempotent:
//! applying the same segment twice yields the same string.

const BEGIN_MARKER: &str = "__BOTTLERACK_PROFILE_BEGIN__";
const END_MARKER: &str = "__BOTTLERACK_PROFILE_END__";

/// The managed segment a profile currently wants, or `None` for "no managed
/// content" (which also means: strip any previously written segment).
pub fn managed_segment(force_windowed: bool) -> Option<String> {
    if !force_windowed {
        return None;
    }
    Some(format!("{BEGIN_MARKER} -windowed {END_MARKER}"))
}

/// Replace any existing managed segment in `existing` with `segment`.
///
/// The previous segment is stripped first (see [`strip_managed_segment`]),
/// then the new one is appended after a single space. Whitespace runs are
/// collapsed and the result trimmed.
pub fn merge(existing: &str, segment: Option<&str>) -> String {
    let base = strip_managed_segment(existing);
    let Some(segment) = segment.filter(|s| !s.is_empty()) else {
        return base;
    };

    if base.is_empty() {
        return segment.to_string();
    }
    normalize_whitespace(&format!("{base} {segment}"))
}

/// Remove every managed segment from `value` and normalize whitespace.
///
/// A malformed segment missing its end marker is removed through end of
/// string: a truncated managed region cannot be trusted.
pub fn strip_managed_segment(value: &str) -> String {
    let mut text = value.to_string();

    while let Some(start) = text.find(BEGIN_MARKER) {
        if let Some(end_offset) = text[start + BEGIN_MARKER.len()..].find(END_MARKER) {
            let end = start + BEGIN_MARKER.len() + end_offset + END_MARKER.len();
            text.replace_range(start..end, "");
        } else {
            text.truncate(start);
        }
    }

    normalize_whitespace(&text)
}

/// Collapse whitespace runs to single spaces and trim the ends.
fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

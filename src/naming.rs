//! Distribution name handling: canonical forms, build-label sanitization,
//! and wheel filename-segment escaping.
//!
//! Three different spellings of the same package name circulate in a build:
//! the index-facing canonical form (`friendly-bard`), the label-safe form
//! used for generated targets (`pypi__friendly_bard`), and the escaped form
//! embedded in wheel filenames (`friendly_bard`). Each conversion lives here
//! so the rest of the crate never re-implements the rules.

use regex::Regex;

/// Default prefix for generated dependency labels.
pub const DEFAULT_LABEL_PREFIX: &str = "pypi__";

/// Canonicalizes a distribution name for comparison and lookups.
///
/// Runs of `-`, `_` and `.` collapse to a single `-` and the result is
/// lowercased, so `Friendly._.Bard` and `friendly-bard` compare equal.
pub fn canonicalize(name: &str) -> String {
    let sep_re = Regex::new(r"[-_.]+").expect("valid regex");
    sep_re.replace_all(name, "-").to_lowercase()
}

/// Sanitizes a distribution name into a label-safe identifier.
///
/// `-` and `.` become `_`, the result is lowercased, and `prefix` is
/// prepended verbatim.
pub fn sanitize(name: &str, prefix: &str) -> String {
    format!("{}{}", prefix, name.replace(['-', '.'], "_").to_lowercase())
}

/// Escapes one wheel filename segment (name, version or build tag).
///
/// Every run of characters outside `[A-Za-z0-9._]` becomes a single `_`,
/// so `file~~name-escaping` turns into `file_name_escaping`. Escaping is
/// lossy and applied only when formatting filenames, never when parsing.
pub fn escape_filename_segment(segment: &str) -> String {
    let unsafe_re = Regex::new(r"[^\w\d.]+").expect("valid regex");
    unsafe_re.replace_all(segment, "_").to_string()
}

/// Label of the installed-library target for a dependency.
pub fn library_target(name: &str, prefix: &str) -> String {
    sanitize(name, prefix)
}

/// Label of the original-archive target for a dependency.
pub fn archive_target(name: &str, prefix: &str) -> String {
    format!("{}__whl", sanitize(name, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_lowercases() {
        assert_eq!(canonicalize("Django"), "django");
    }

    #[test]
    fn test_canonicalize_collapses_separator_runs() {
        assert_eq!(canonicalize("Foo..Bar--baz"), "foo-bar-baz");
        assert_eq!(canonicalize("friendly._.bard"), "friendly-bard");
        assert_eq!(canonicalize("zope_interface"), "zope-interface");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let once = canonicalize("My._-Package");
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn test_sanitize_with_default_prefix() {
        assert_eq!(
            sanitize("requests", DEFAULT_LABEL_PREFIX),
            "pypi__requests"
        );
        assert_eq!(
            sanitize("zope.interface", DEFAULT_LABEL_PREFIX),
            "pypi__zope_interface"
        );
        assert_eq!(
            sanitize("python-dateutil", DEFAULT_LABEL_PREFIX),
            "pypi__python_dateutil"
        );
    }

    #[test]
    fn test_sanitize_lowercases() {
        assert_eq!(sanitize("PyYAML", "deps_"), "deps_pyyaml");
    }

    #[test]
    fn test_sanitize_equal_for_equal_canonical_names() {
        let a = sanitize(&canonicalize("Zope.Interface"), DEFAULT_LABEL_PREFIX);
        let b = sanitize(&canonicalize("zope-interface"), DEFAULT_LABEL_PREFIX);
        assert_eq!(a, b);
    }

    #[test]
    fn test_escape_keeps_word_chars_and_dots() {
        assert_eq!(escape_filename_segment("simple"), "simple");
        assert_eq!(escape_filename_segment("0.0.1"), "0.0.1");
        assert_eq!(escape_filename_segment("under_score"), "under_score");
    }

    #[test]
    fn test_escape_collapses_runs_to_single_underscore() {
        assert_eq!(
            escape_filename_segment("file~~name-escaping"),
            "file_name_escaping"
        );
        assert_eq!(escape_filename_segment("0.0.1-r7"), "0.0.1_r7");
        assert_eq!(escape_filename_segment("a--~~--b"), "a_b");
    }

    #[test]
    fn test_escape_empty_input() {
        assert_eq!(escape_filename_segment(""), "");
    }

    #[test]
    fn test_target_labels() {
        assert_eq!(
            library_target("boto3", DEFAULT_LABEL_PREFIX),
            "pypi__boto3"
        );
        assert_eq!(
            archive_target("boto3", DEFAULT_LABEL_PREFIX),
            "pypi__boto3__whl"
        );
    }
}

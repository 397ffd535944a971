//! Wheel compatibility tags and the platform-tag to target-triple mapping.

use std::fmt;

/// Platform tags with a published Rust target triple. Windows wheels exist
/// upstream but have no supported triple here.
const PLATFORM_TRIPLES: &[(&str, &str)] = &[
    ("manylinux2014_x86_64", "x86_64-unknown-linux-gnu"),
    ("manylinux2014_aarch64", "aarch64-unknown-linux-gnu"),
    ("macosx_11_0_arm64", "aarch64-apple-darwin"),
    ("macosx_10_9_x86_64", "x86_64-apple-darwin"),
];

/// One concrete interpreter/ABI/platform compatibility tag.
///
/// Wheel filenames carry *compressed* tag sets (`py2.py3-none-any`); this
/// type always represents a single expanded combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompatTag {
    pub python: String,
    pub abi: String,
    pub platform: String,
}

impl CompatTag {
    pub fn new(python: &str, abi: &str, platform: &str) -> Self {
        Self {
            python: python.to_string(),
            abi: abi.to_string(),
            platform: platform.to_string(),
        }
    }
}

impl fmt::Display for CompatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.python, self.abi, self.platform)
    }
}

/// Expands a compressed tag triple into every concrete combination.
///
/// Each component may hold dot-separated alternatives; the result is the
/// cross product in component order, so `py2.py3 / none / any` yields
/// `py2-none-any` then `py3-none-any`.
pub fn expand_tag_triple(python: &str, abi: &str, platform: &str) -> Vec<CompatTag> {
    let mut tags = Vec::new();
    for py in python.split('.') {
        for ab in abi.split('.') {
            for plat in platform.split('.') {
                tags.push(CompatTag::new(py, ab, plat));
            }
        }
    }
    tags
}

/// Maps a wheel platform tag to its Rust target triple, if one is supported.
pub fn rust_triple_for(platform_tag: &str) -> Option<&'static str> {
    PLATFORM_TRIPLES
        .iter()
        .find(|(tag, _)| *tag == platform_tag)
        .map(|(_, triple)| *triple)
}

/// Suggests the closest supported platform tag for an unknown one.
///
/// Returns `None` when nothing is similar enough to be a plausible typo or
/// near-variant (e.g. a different manylinux generation).
pub fn suggest_platform(platform_tag: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, f64)> = None;

    for (known, _) in PLATFORM_TRIPLES {
        let score = strsim::jaro_winkler(platform_tag, known);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((known, score));
        }
    }

    best.filter(|(_, score)| *score >= 0.85).map(|(tag, _)| tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_single_tag() {
        let tags = expand_tag_triple("py3", "none", "any");
        assert_eq!(tags, vec![CompatTag::new("py3", "none", "any")]);
    }

    #[test]
    fn test_expand_compressed_python_tags() {
        let tags = expand_tag_triple("py2.py3", "none", "any");
        assert_eq!(
            tags,
            vec![
                CompatTag::new("py2", "none", "any"),
                CompatTag::new("py3", "none", "any"),
            ]
        );
    }

    #[test]
    fn test_expand_compressed_platform_tags() {
        let tags = expand_tag_triple(
            "cp310",
            "cp310",
            "manylinux_2_17_x86_64.manylinux2014_x86_64",
        );
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].platform, "manylinux_2_17_x86_64");
        assert_eq!(tags[1].platform, "manylinux2014_x86_64");
    }

    #[test]
    fn test_tag_display() {
        let tag = CompatTag::new("cp39", "abi3", "manylinux2014_x86_64");
        assert_eq!(tag.to_string(), "cp39-abi3-manylinux2014_x86_64");
    }

    #[test]
    fn test_rust_triple_for_known_tags() {
        assert_eq!(
            rust_triple_for("manylinux2014_x86_64"),
            Some("x86_64-unknown-linux-gnu")
        );
        assert_eq!(
            rust_triple_for("manylinux2014_aarch64"),
            Some("aarch64-unknown-linux-gnu")
        );
        assert_eq!(
            rust_triple_for("macosx_11_0_arm64"),
            Some("aarch64-apple-darwin")
        );
        assert_eq!(
            rust_triple_for("macosx_10_9_x86_64"),
            Some("x86_64-apple-darwin")
        );
    }

    #[test]
    fn test_rust_triple_for_unsupported_tags() {
        assert_eq!(rust_triple_for("win_amd64"), None);
        assert_eq!(rust_triple_for("any"), None);
    }

    #[test]
    fn test_suggest_platform_close_match() {
        assert_eq!(
            suggest_platform("manylinux2010_x86_64"),
            Some("manylinux2014_x86_64")
        );
        assert_eq!(
            suggest_platform("macosx_12_0_arm64"),
            Some("macosx_11_0_arm64")
        );
    }

    #[test]
    fn test_suggest_platform_no_match_for_unrelated() {
        assert_eq!(suggest_platform("any"), None);
    }
}

//! Dist-tag version resolver
//!
//! Extracts the version registered under a tag from the text listing
//! printed by `npm dist-tags <package>`:
//!
//! ```text
//! beta: 2.4.0-rc1
//! latest: 2.3.1
//! ```

use regex::Regex;

/// Tag every dependency resolves against unless overridden
pub const LATEST_TAG: &str = "latest";

/// Find the version registered under `tag` in a dist-tags listing.
///
/// Only the first line starting with `<tag>:` is considered. The value is
/// trimmed of surrounding whitespace. Returns `None` when no such line exists
/// or the value is empty.
pub fn find_version(text: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?m)^{}:[ \t]+(\S.*?)\s*$", regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Like [`find_version`], but falls back to the tag itself when not found.
///
/// Callers using this form can only detect a failed lookup by comparing the
/// result against the tag they passed in.
pub fn find_version_or_tag(text: &str, tag: &str) -> String {
    find_version(text, tag).unwrap_or_else(|| tag.to_string())
}

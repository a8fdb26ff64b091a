//! Node name derivation
//!
//! `<kind_tag><id>_<process name, whitespace runs -> '_'>`, capped at 45 chars.
//! Names that overflow keep a 36 char prefix plus `_` and an 8 hex digit
//! xxh3 digest of the full string, so two long names never truncate to the
//! same identifier.

use once_cell::sync::Lazy;
use regex::Regex;
use xxhash_rust::xxh3::xxh3_64;

/// Longest name accepted as a task id by the target engine
pub const MAX_NAME_LEN: usize = 45;

const DIGEST_LEN: usize = 8;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Untruncated name
pub fn raw_name(kind_tag: &str, id: u32, process_name: &str) -> String {
    format!(
        "{}{}_{}",
        kind_tag,
        id,
        WHITESPACE_RUN.replace_all(process_name, "_")
    )
}

/// Derived name, at most [`MAX_NAME_LEN`] characters
pub fn derive_name(kind_tag: &str, id: u32, process_name: &str) -> String {
    let raw = raw_name(kind_tag, id, process_name);
    if raw.chars().count() <= MAX_NAME_LEN {
        return raw;
    }

    let keep = MAX_NAME_LEN - DIGEST_LEN - 1;
    let mut name: String = raw.chars().take(keep).collect();
    name.push('_');
    // low 32 bits of the digest, as 8 hex digits
    let digest = xxh3_64(raw.as_bytes()) & 0xffff_ffff;
    name.push_str(&format!("{:08x}", digest));
    name
}

/// Identifier form of a derived name: anything outside `[A-Za-z0-9_]` becomes `_`
///
/// Maps char for char, so the length cap still holds.
pub fn identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

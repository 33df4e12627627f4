//! Path canonicalization for import deduplication.
//!
//! Cameras split a logical folder into letter-suffixed siblings once it
//! fills up (`202301`, `202301_a`, ...). Every `_<lowercase letter><sep>`
//! is rewritten to `__<sep>` so the split folders share one key.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static LETTER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_[a-z]([\\/])").expect("letter suffix pattern is valid"));

/// Canonical form of a relative path, used for ledger membership.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapse letter-suffixed folder names into their canonical form.
///
/// Total and idempotent: `canonicalize(canonicalize(p)) == canonicalize(p)`.
pub fn canonicalize(relative_path: &str) -> DedupKey {
    DedupKey(
        LETTER_SUFFIX
            .replace_all(relative_path, "__${1}")
            .into_owned(),
    )
}

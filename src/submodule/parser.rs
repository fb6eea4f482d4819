//! Extraction of submodule pointer moves from `git diff --submodule=log` output.
//!
//! Only header lines of the form
//!
//! ```text
//! Submodule libs/foo 1a2b3c4..5d6e7f8:
//! Submodule libs/bar 9f8e7d6..1a2b3c4 (rewind):
//! Submodule libs/baz 1a2b3c4...5d6e7f8:
//! ```
//!
//! A `(rewind)` move uses `..`; `...` marks histories that diverged.
//!
//! are extracted. Commit continuation lines (`  > subject`), "contains modified
//! content" notices and ordinary patch lines are ignored. Lines whose hashes do
//! not look like revision ids are skipped rather than reported.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Shortest abbreviated hash git will print.
const MIN_REVISION_LEN: usize = 4;

/// Full SHA-256 object id length.
const MAX_REVISION_LEN: usize = 64;

static POINTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Submodule\s+(\S+)\s+([^\s.]*)\.\.\.?([^\s.:]*)(?::|\s|$)")
        .expect("submodule pointer pattern is valid")
});

/// A submodule whose recorded commit moved from one revision to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmodulePointerChange {
    pub path: String,
    pub old_revision: String,
    pub new_revision: String,
}

impl SubmodulePointerChange {
    /// True when the pointer did not actually move.
    pub fn is_noop(&self) -> bool {
        self.old_revision == self.new_revision
    }
}

/// Parse every pointer-move line in `text`, in order of appearance.
///
/// Never fails: malformed lines are dropped. Repeated entries for the same
/// path are all kept.
pub fn parse_pointer_changes(text: &str) -> Vec<SubmodulePointerChange> {
    text.lines().filter_map(parse_pointer_line).collect()
}

/// Parse a single line, returning `None` unless it is a well-formed pointer move.
pub fn parse_pointer_line(line: &str) -> Option<SubmodulePointerChange> {
    let caps = POINTER_LINE.captures(line)?;

    let path = caps.get(1)?.as_str();
    let old_revision = caps.get(2)?.as_str();
    let new_revision = caps.get(3)?.as_str();

    if !is_revision(old_revision)
        || !is_revision(new_revision)
        || old_revision.len() != new_revision.len()
    {
        return None;
    }

    Some(SubmodulePointerChange {
        path: path.to_string(),
        old_revision: old_revision.to_string(),
        new_revision: new_revision.to_string(),
    })
}

/// Lowercase hexadecimal of a plausible object-id length.
fn is_revision(candidate: &str) -> bool {
    (MIN_REVISION_LEN..=MAX_REVISION_LEN).contains(&candidate.len())
        && candidate
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

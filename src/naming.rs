//! Filename parsing for the `ID-TAG-...-TAG-TITLE` convention.
//!
//! Gallery folders are named `ID-TITLE`, item files `ID-TAG-...-TAG-TITLE.ext`.
//! Segments are separated by single hyphens; a literal hyphen inside a segment
//! is written as a doubled hyphen (`--`).
//!
//! ```text
//! 12-Summer                          → id "12", title "Summer", tags []
//! 007-family-beach-Day--one          → id "007", title "Day-one", tags ["family", "beach"]
//! 07-sunset--view-beach-on--the--lake → id "07", title "on-the-lake", tags ["sunset-view", "beach"]
//! ```
//!
//! ## Escapes
//!
//! Names are split in a single left-to-right pass: `--` emits a literal
//! hyphen into the current segment, a lone `-` ends it. No character of the
//! name is rewritten, so en dashes and other punctuation survive as written.
//!
//! ## Output-side ids
//!
//! Generated artifacts are named `<id>.<suffix>` (`12.thumbnail.jpg`,
//! `12.mp4`), so [`output_item_id`] uses a different rule: everything before
//! the first dot. Both rules must land in the same id space for the diff to
//! line up.

/// Result of parsing a gallery or item name like `012-tag-Title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Leading digit run, `None` if the name is not `DIGITS-...`.
    pub id: Option<String>,
    /// Segment after the last unescaped hyphen.
    pub title: String,
    /// Segments between the id and the title.
    pub tags: Vec<String>,
}

/// Parse all three parts of a name at once.
pub fn parse_entry_name(name: &str) -> ParsedName {
    ParsedName {
        id: parse_id(name),
        title: parse_title(name),
        tags: parse_tags(name),
    }
}

/// Split at unescaped hyphens, decoding `--` inside segments. Never empty.
fn split_segments(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '-' {
            current.push(c);
        } else if chars.next_if_eq(&'-').is_some() {
            current.push('-');
        } else {
            segments.push(std::mem::take(&mut current));
        }
    }
    segments.push(current);
    segments
}

fn is_id(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Leading decimal digits of a name, if followed by a hyphen.
///
/// - `"12-Foo"` → `Some("12")`
/// - `"12"` → `None` (no hyphen)
/// - `"Foo-12"` → `None`
pub fn parse_id(name: &str) -> Option<String> {
    let mut segments = split_segments(name);
    if segments.len() >= 2 && is_id(&segments[0]) {
        Some(segments.swap_remove(0))
    } else {
        None
    }
}

/// Substring after the last unescaped hyphen, or the whole name if there is none.
pub fn parse_title(name: &str) -> String {
    split_segments(name).pop().unwrap_or_default()
}

/// Segments strictly between the `DIGITS-` prefix and the final hyphen.
///
/// Gallery names (`ID-TITLE`) never have tags.
pub fn parse_tags(name: &str) -> Vec<String> {
    let mut segments = split_segments(name);
    if segments.len() < 3 || !is_id(&segments[0]) {
        return Vec::new();
    }
    segments.pop();
    segments.remove(0);
    segments
}

/// Item id of a generated artifact: the file name up to its first dot.
///
/// - `"12.thumbnail.jpg"` → `"12"`
/// - `"12.mp4"` → `"12"`
pub fn output_item_id(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

//! Title line parsing and tag extraction.
//!
//! # Responsibility
//! - Turn the first line of a page into a display title and tag tokens.
//!
//! # Invariants
//! - A tag is one whitespace-free token that starts and ends with `*`.
//! - Tags keep source order; duplicates are not removed here.
//! - Every returned tag is usable as a single path component.

/// Delimiter wrapping a tag token, markdown italics.
pub const TAG_DELIMITER: char = '*';

/// Parsed title line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    /// Heading text with leading `#` and every delimiter removed.
    pub title: String,
    /// Tags in source order, delimiters removed.
    pub tags: Vec<String>,
    /// Tag-shaped tokens refused because they cannot name a directory entry.
    pub rejected: Vec<String>,
}

/// Parses one title line.
///
/// `*Favorite* Food` yields title `Favorite Food` and tag `Favorite`, while
/// `*Favorite Stuff*` yields no tag since neither token both starts and ends
/// with the delimiter.
pub fn parse_title_line(line: &str) -> ParsedTitle {
    let heading = line.trim_start_matches('\u{feff}').trim();
    let heading = heading.trim_start_matches('#').trim();

    let mut parsed = ParsedTitle {
        title: strip_delimiters(heading).trim().to_string(),
        ..ParsedTitle::default()
    };

    for token in heading.split_whitespace() {
        if !(token.starts_with(TAG_DELIMITER) && token.ends_with(TAG_DELIMITER)) {
            continue;
        }
        let tag = strip_delimiters(token);
        if tag.is_empty() {
            continue;
        }
        if is_path_safe(&tag) {
            parsed.tags.push(tag);
        } else {
            parsed.rejected.push(tag);
        }
    }

    parsed
}

/// Returns whether a tag can be used verbatim as a file or directory name.
pub fn is_path_safe(tag: &str) -> bool {
    !tag.is_empty() && tag != "." && tag != ".." && !tag.contains(['/', '\\', '\0'])
}

fn strip_delimiters(value: &str) -> String {
    value.replace(TAG_DELIMITER, "")
}

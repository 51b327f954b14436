//! Section tree builder.
//!
//! Turns a flat stream of lines into document-ordered [`Section`]s with
//! parent back-references. Total over arbitrary input: odd markdown yields
//! fewer or oddly shaped sections, never an error.

use crate::types::Section;
use ahash::AHashSet;

/// Maximum number of `#` markers that still form a heading.
const MAX_HEADING_LEVEL: usize = 6;

/// A heading line split into its parts.
#[derive(Debug, PartialEq, Eq)]
struct Heading {
    level: u8,
    title: String,
    anchor: Option<String>,
}

/// Section whose heading has been seen but whose end is not yet known.
struct OpenSection {
    id: String,
    title: String,
    level: u8,
    start_line: usize,
    parent_id: Option<String>,
    lines: Vec<String>,
}

impl OpenSection {
    fn close(self, end_line: usize) -> Section {
        Section {
            id: self.id,
            title: self.title,
            level: self.level,
            content: self.lines.join("\n").trim().to_string(),
            start_line: self.start_line,
            end_line,
            parent_id: self.parent_id,
        }
    }
}

/// Parses documentation text into sections in document order.
#[must_use]
pub fn parse_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<OpenSection> = None;
    // Chain of open ancestors as (id, level)
    let mut stack: Vec<(String, u8)> = Vec::new();
    let mut used_ids = AHashSet::new();
    let mut last_line = 0;

    for (line_no, line) in text.lines().enumerate() {
        last_line = line_no;

        let Some(heading) = parse_heading(line) else {
            // Text before the first heading has no section to live in
            if let Some(open) = current.as_mut() {
                open.lines.push(line.to_string());
            }
            continue;
        };

        if let Some(open) = current.take() {
            sections.push(open.close(line_no.saturating_sub(1)));
        }

        while stack.last().is_some_and(|(_, level)| *level >= heading.level) {
            stack.pop();
        }
        let parent_id = stack.last().map(|(id, _)| id.clone());

        let id = match heading.anchor {
            Some(anchor) => anchor,
            None => unique_slug(&slugify(&heading.title), &used_ids),
        };
        used_ids.insert(id.clone());
        stack.push((id.clone(), heading.level));

        current = Some(OpenSection {
            id,
            title: heading.title,
            level: heading.level,
            start_line: line_no,
            parent_id,
            lines: Vec::new(),
        });
    }

    if let Some(open) = current {
        sections.push(open.close(last_line));
    }

    sections
}

/// Recognizes an ATX heading with a non-empty title.
///
/// Returns `None` for lines that are not headings, including heading-like
/// lines whose only text was an anchor marker.
fn parse_heading(line: &str) -> Option<Heading> {
    let trimmed = line.trim();
    let markers = trimmed.bytes().take_while(|&b| b == b'#').count();
    if markers == 0 || markers > MAX_HEADING_LEVEL {
        return None;
    }

    let rest = trimmed[markers..].trim();
    let (title, anchor) = match split_anchor(rest) {
        Some((title, anchor)) => (title, Some(anchor)),
        None => (rest.to_string(), None),
    };

    if title.is_empty() {
        return None;
    }

    Some(Heading {
        level: markers as u8,
        title,
        anchor,
    })
}

/// Splits a `{#token}` marker out of heading text.
///
/// Returns the remaining title (marker and its surrounding whitespace
/// removed) and the token.
fn split_anchor(text: &str) -> Option<(String, String)> {
    let open = text.find("{#")?;
    let close = open + text[open..].find('}')?;
    let token = &text[open + 2..close];
    if token.is_empty() {
        return None;
    }

    let before = text[..open].trim_end();
    let after = text[close + 1..].trim_start();
    let title = match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{before} {after}"),
        _ => format!("{before}{after}"),
    };
    Some((title, token.to_string()))
}

/// Generates a URL-safe id from a title.
#[must_use]
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Appends `-1`, `-2`, ... until the slug no longer collides.
fn unique_slug(slug: &str, used: &AHashSet<String>) -> String {
    if !used.contains(slug) {
        return slug.to_string();
    }
    (1..)
        .map(|n| format!("{slug}-{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_hierarchy() {
        let sections = parse_sections("# A\ntext a\n## B\ntext b\n# C\ntext c");
        assert_eq!(sections.len(), 3);

        assert_eq!(sections[0].id, "a");
        assert_eq!(sections[0].level, 1);
        assert_eq!(sections[0].parent_id, None);
        assert_eq!(sections[0].content, "text a");

        assert_eq!(sections[1].id, "b");
        assert_eq!(sections[1].level, 2);
        assert_eq!(sections[1].parent_id.as_deref(), Some("a"));
        assert_eq!(sections[1].content, "text b");

        assert_eq!(sections[2].id, "c");
        assert_eq!(sections[2].parent_id, None);
        assert_eq!(sections[2].content, "text c");
    }

    #[test]
    fn test_line_spans() {
        let sections = parse_sections("# A\ntext a\n## B\ntext b\n# C\ntext c");
        assert_eq!((sections[0].start_line, sections[0].end_line), (0, 1));
        assert_eq!((sections[1].start_line, sections[1].end_line), (2, 3));
        assert_eq!((sections[2].start_line, sections[2].end_line), (4, 5));
    }

    #[test]
    fn test_explicit_anchor() {
        let sections = parse_sections("## Window Functions {#window-fns}\nbody");
        assert_eq!(sections[0].id, "window-fns");
        assert_eq!(sections[0].title, "Window Functions");
    }

    #[test]
    fn test_anchor_only_heading_is_content() {
        let text = "# Top\nintro\n## {#custom}\nmore";
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "intro\n## {#custom}\nmore");
        assert_eq!(sections[0].end_line, 3);
    }

    #[test]
    fn test_anchor_token_may_contain_spaces() {
        let sections = parse_sections("# Top\nintro\n## {#my anchor}\n## Named {#two words}\nbody");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "intro\n## {#my anchor}");
        assert_eq!(sections[1].id, "two words");
        assert_eq!(sections[1].title, "Named");
    }

    #[test]
    fn test_seven_markers_is_not_heading() {
        let sections = parse_sections("# Top\n####### deep\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "####### deep");
    }

    #[test]
    fn test_bare_marker_is_content() {
        let sections = parse_sections("# Top\n#\n###   \n");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.contains('#'));
    }

    #[test]
    fn test_preamble_is_discarded() {
        let sections = parse_sections("preamble\nmore\n# First\nbody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "body");
        assert_eq!(sections[0].start_line, 2);
    }

    #[test]
    fn test_parent_skips_levels() {
        let sections = parse_sections("# A\n### Deep\n## Mid\n#### Deeper");
        assert_eq!(sections[1].parent_id.as_deref(), Some("a"));
        assert_eq!(sections[2].parent_id.as_deref(), Some("a"));
        assert_eq!(sections[3].parent_id.as_deref(), Some("mid"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("read_csv Function"), "read-csv-function");
        assert_eq!(slugify("SELECT Statement!"), "select-statement");
        assert_eq!(slugify("C++ & Rust"), "c--rust");
    }

    #[test]
    fn test_duplicate_slugs_are_suffixed() {
        let sections = parse_sections("# Examples\n# Examples\n# Examples");
        let ids: Vec<_> = sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["examples", "examples-1", "examples-2"]);
    }

    #[test]
    fn test_duplicate_explicit_anchor_kept() {
        let sections = parse_sections("# One {#x}\n# Two {#x}");
        assert_eq!(sections[0].id, "x");
        assert_eq!(sections[1].id, "x");
    }

    #[test]
    fn test_indented_heading_and_unicode_title() {
        let sections = parse_sections("   ## Überblick  \ncontent");
        assert_eq!(sections[0].title, "Überblick");
        assert_eq!(sections[0].level, 2);
        assert_eq!(sections[0].id, "berblick");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_sections("").is_empty());
        assert!(parse_sections("no headings here").is_empty());
    }

    #[test]
    fn test_document_order_and_parent_invariants() {
        let text = "# A\n## B\n### C\n## D\n# E\n###### F\n## G";
        let sections = parse_sections(text);
        for window in sections.windows(2) {
            assert!(window[0].start_line < window[1].start_line);
        }
        for (idx, section) in sections.iter().enumerate() {
            assert!((1..=6).contains(&section.level));
            if let Some(parent) = &section.parent_id {
                let (pidx, p) = sections[..idx]
                    .iter()
                    .enumerate()
                    .rev()
                    .find(|(_, s)| s.level < section.level)
                    .unwrap();
                assert_eq!(&p.id, parent);
                assert!(pidx < idx);
            }
        }
    }
}

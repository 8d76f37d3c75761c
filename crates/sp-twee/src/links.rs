//! Outgoing links: extraction, caching, markup stripping and sanitising.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::lexer::scan;
use crate::text::{collapse_whitespace_runs, dedupe_in_order};

/// Characters that must not occur in a link target.
///
/// Parentheses are included, which also rules out `previous()` links.
pub const INVALID_LINK_CHARACTERS: &str = ".|[]()<>,*/\\\"'";

/// Extract outgoing link targets from passage text.
///
/// Bracket links come first, then choice-macro targets, each in source
/// order. Duplicates keep their first occurrence and empty targets are
/// dropped.
pub fn get_links(text: &str) -> Vec<String> {
    let markup = scan(text);
    let bracket = markup.links.iter().map(|l| l.target(text));
    let choice = markup.choices.iter().map(|c| &text[c.target.clone()]);

    let targets = bracket
        .chain(choice)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string);
    dedupe_in_order(targets, &HashSet::new())
}

/// Memoised [`get_links`], keyed by the exact passage text.
///
/// The tree builder and the authoring session ask for the links of the same
/// passage many times while growing a tree.
#[derive(Debug, Clone, Default)]
pub struct LinkCache {
    entries: HashMap<String, Vec<String>>,
}

impl LinkCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links of `text`, computed once per distinct text.
    pub fn links(&mut self, text: &str) -> &[String] {
        self.entries
            .entry(text.to_string())
            .or_insert_with(|| get_links(text))
    }

    /// Number of distinct texts cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reduce a passage body to the prose handed to the narrative extractor.
///
/// Links keep only their label (the text before the first `|`), choice
/// macros disappear along with one following space, and runs of the same
/// whitespace character collapse.
pub fn strip_markup(body: &str) -> String {
    let markup = scan(body);
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for link in &markup.links {
        edits.push((link.outer.clone(), link.label(body).to_string()));
    }
    for choice in &markup.choices {
        let mut outer = choice.outer.clone();
        if body[outer.end..].starts_with(' ') {
            outer.end += 1;
        }
        edits.push((outer, String::new()));
    }

    collapse_whitespace_runs(&apply_edits(body, edits))
}

/// Rewrite every bracket link so its target is lower case.
///
/// Display text before the last `|` is kept verbatim.
pub fn lower_case_links(text: &str) -> String {
    let edits = scan(text)
        .links
        .iter()
        .map(|link| {
            let target = link.target_range(text);
            (target.clone(), text[target].to_lowercase())
        })
        .collect();
    apply_edits(text, edits)
}

/// Strip invalid characters from a link target.
///
/// Returns `None` when the link is already valid.
pub fn validate_link_text(link: &str) -> Option<String> {
    if !link.chars().any(|c| INVALID_LINK_CHARACTERS.contains(c)) {
        return None;
    }
    Some(
        link.chars()
            .filter(|c| !INVALID_LINK_CHARACTERS.contains(*c))
            .collect(),
    )
}

/// Remove the `@` character, which is not allowed anywhere in a passage.
pub fn remove_invalid_passage_chars(text: &str) -> String {
    text.replace('@', "")
}

/// Sanitise every link in `text` whose target contains invalid characters.
///
/// Only link markup is rewritten. A piped link gets a new target; an unpiped
/// link keeps its original wording as display text
/// (`[["Hi?"]]` becomes `[["Hi?"|Hi?]]`); a choice macro gets a new quoted
/// target. The returned list substitutes sanitised values in place and is
/// deduped.
pub fn clean_link_text(text: &str, links: &[String]) -> (String, Vec<String>) {
    let fixes: HashMap<&str, String> = links
        .iter()
        .filter_map(|l| validate_link_text(l).map(|v| (l.as_str(), v)))
        .collect();
    if fixes.is_empty() {
        return (text.to_string(), links.to_vec());
    }

    let markup = scan(text);
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for link in &markup.links {
        let Some(fixed) = fixes.get(link.target(text)) else {
            continue;
        };
        if link.has_display(text) {
            edits.push((link.target_range(text), fixed.clone()));
        } else {
            let original = link.inner(text);
            edits.push((link.inner.clone(), format!("{original}|{fixed}")));
        }
    }
    for choice in &markup.choices {
        if let Some(fixed) = fixes.get(&text[choice.target.clone()]) {
            edits.push((choice.target.clone(), fixed.clone()));
        }
    }

    let cleaned_links = links
        .iter()
        .map(|l| fixes.get(l.as_str()).cloned().unwrap_or_else(|| l.clone()));
    (
        apply_edits(text, edits),
        dedupe_in_order(cleaned_links, &HashSet::new()),
    )
}

/// Apply non-overlapping replacements to `text`.
fn apply_edits(text: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        if range.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

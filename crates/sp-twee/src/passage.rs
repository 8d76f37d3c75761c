//! A single titled passage of Twee text.

use serde::{Deserialize, Serialize};

use crate::lexer::{Imbalance, check_balance};
use crate::text::squash_spaces;

/// The token that opens every passage title line.
pub const DELIMITER: &str = "::";

/// Story metadata passages, compared case-folded.
///
/// See <https://dan-q.github.io/twee2/documentation.html>.
pub const SPECIAL_PASSAGES: [&str; 8] = [
    "storytitle",
    "storysubtitle",
    "storyauthor",
    "storymenu",
    "storysettings",
    "storyincludes",
    "annotations",
    "audio sources",
];

/// Title-line tags that mark a passage as code rather than story.
const RESERVED_TAGS: [&str; 3] = ["[stylesheet]", "[script]", "[twee2]"];

/// One titled unit of story text.
///
/// `raw_text` always holds the title line followed by the body. Passages
/// produced by [`crate::document::split`] also remember where they start in
/// the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    raw_text: String,
    #[serde(skip)]
    origin: Option<Origin>,
}

/// Where a split passage came from in its source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Origin {
    /// Byte offset of the `::` delimiter in the source.
    pub(crate) offset: usize,
    /// Whitespace dropped between the delimiter and the title.
    pub(crate) skipped: usize,
}

/// Structural validity of a passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validity {
    /// The first line starts with the `::` delimiter.
    pub valid_prefix: bool,
    /// The first bracket imbalance, if any.
    pub imbalance: Option<Imbalance>,
}

impl Validity {
    /// Whether brackets balance.
    pub fn balanced(&self) -> bool {
        self.imbalance.is_none()
    }

    /// Whether both checks passed.
    pub fn is_valid(&self) -> bool {
        self.valid_prefix && self.balanced()
    }

    /// Why the passage is invalid; `None` when it is valid.
    pub fn reason(&self) -> Option<String> {
        if !self.valid_prefix {
            return Some("title line does not start with `::`".to_string());
        }
        self.imbalance.as_ref().map(ToString::to_string)
    }
}

impl Passage {
    /// Create a passage from text whose first line is the title line.
    ///
    /// Surrounding whitespace is trimmed.
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            raw_text: text.as_ref().trim().to_string(),
            origin: None,
        }
    }

    /// Create a passage from a title name and a body.
    pub fn from_parts(title: &str, body: &str) -> Self {
        Self::new(format!("{}\n{}", make_title(title, false), body))
    }

    pub(crate) fn with_origin(mut self, offset: usize, skipped: usize) -> Self {
        self.origin = Some(Origin { offset, skipped });
        self
    }

    /// The full passage text, title line included.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// The first line, trimmed.
    pub fn title_line(&self) -> &str {
        self.raw_text.lines().next().unwrap_or("").trim()
    }

    /// The lines after the title line.
    pub fn body_lines(&self) -> Vec<&str> {
        self.raw_text.split('\n').skip(1).collect()
    }

    /// The body joined back into one string.
    pub fn body(&self) -> String {
        self.body_lines().join("\n")
    }

    /// The title with the delimiter and any tag removed, case preserved.
    pub fn name(&self) -> String {
        normalized_title(self.title_line(), true)
    }

    /// The lookup key for this passage: [`Passage::name`], case-folded.
    pub fn key(&self) -> String {
        title_key(self.title_line())
    }

    /// Whether this is the story's start passage.
    pub fn is_start(&self) -> bool {
        self.key() == "start"
    }

    /// Whether this is a story metadata passage.
    pub fn is_special(&self) -> bool {
        let key = self.key();
        SPECIAL_PASSAGES.iter().any(|s| *s == key)
    }

    /// Whether the passage carries no story: blank, an untitled placeholder,
    /// or code tagged as a stylesheet or script.
    pub fn is_empty(&self) -> bool {
        if self.raw_text.is_empty() || self.raw_text == "::untitled passage" {
            return true;
        }
        let top = self.title_line();
        RESERVED_TAGS.iter().any(|tag| top.contains(tag))
    }

    /// Run the prefix and bracket-balance checks.
    pub fn validity(&self) -> Validity {
        Validity {
            valid_prefix: self.title_line().starts_with(DELIMITER),
            imbalance: check_balance(&self.raw_text).err(),
        }
    }

    /// Whether the passage passes both structural checks.
    pub fn is_valid(&self) -> bool {
        self.validity().is_valid()
    }

    /// Map a byte offset in [`Passage::raw_text`] back to the source document.
    pub fn source_offset(&self, index: usize) -> Option<usize> {
        let origin = self.origin?;
        if index < DELIMITER.len() {
            Some(origin.offset + index)
        } else {
            Some(origin.offset + origin.skipped + index)
        }
    }
}

/// Build a title line from a passage name.
pub fn make_title(name: &str, lowercase: bool) -> String {
    if lowercase {
        format!("{DELIMITER} {}", name.to_lowercase())
    } else {
        format!("{DELIMITER} {name}")
    }
}

/// Strip the delimiter and, with `strip_tag`, a trailing `[tag]` from a title
/// line. Internal whitespace is collapsed; case is preserved.
pub fn normalized_title(title: &str, strip_tag: bool) -> String {
    let title = title.trim();
    let text = title.strip_prefix(DELIMITER).unwrap_or(title);
    let text = if strip_tag { strip_tag_suffix(text) } else { text };
    squash_spaces(text)
}

/// The case-folded lookup key for a title line or link target.
pub fn title_key(title: &str) -> String {
    normalized_title(title, true).to_lowercase()
}

/// Cut the text at the first `[` that has a `]` somewhere after it.
fn strip_tag_suffix(text: &str) -> &str {
    match text.find('[') {
        Some(open) if text[open..].contains(']') => &text[..open],
        _ => text,
    }
}

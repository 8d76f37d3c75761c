//! Whole Twee documents: splitting, start lookup, and the title map.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{TweeError, TweeResult};
use crate::passage::{DELIMITER, Passage, make_title};

/// Split raw Twee text into passages.
///
/// A passage starts at every `::` that begins a line. Text before the first
/// delimiter is discarded; each fragment is trimmed and re-prefixed with the
/// delimiter, so `:: Start` becomes `::Start`.
pub fn split(raw: &str) -> Vec<Passage> {
    let starts = delimiter_offsets(raw);
    let mut passages = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(raw.len());
        let fragment = &raw[start + DELIMITER.len()..end];
        let skipped = fragment.len() - fragment.trim_start().len();
        let text = format!("{DELIMITER}{}", fragment.trim());
        passages.push(Passage::new(text).with_origin(start, skipped));
    }

    passages
}

fn delimiter_offsets(raw: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut line_start = 0;
    for line in raw.split_inclusive('\n') {
        if line.starts_with(DELIMITER) {
            offsets.push(line_start);
        }
        line_start += line.len();
    }
    offsets
}

/// Join passages back into one document, separated by blank lines.
pub fn unsplit(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(Passage::raw_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The metadata passages that open a new story.
pub fn init_twee(story_title: &str, author: &str) -> String {
    format!(
        "{}\n{story_title}\n\n{}\n{author}\n\n",
        make_title("StoryTitle", false),
        make_title("StoryAuthor", false)
    )
}

/// Document-level validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentValidity {
    /// Every passage passes the prefix and balance checks.
    pub all_valid_passages: bool,
    /// At least one passage is a start passage.
    pub has_start: bool,
}

impl DocumentValidity {
    /// Whether the document could compile.
    pub fn is_valid(&self) -> bool {
        self.all_valid_passages && self.has_start
    }
}

/// An ordered collection of passages parsed from one source text.
#[derive(Debug, Clone, Default)]
pub struct TweeDocument {
    source: String,
    passages: Vec<Passage>,
}

impl TweeDocument {
    /// Parse a document from raw Twee text.
    pub fn parse(raw: impl Into<String>) -> Self {
        let source = raw.into();
        let passages = split(&source);
        Self { source, passages }
    }

    /// Build a document from already-split passages.
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        let source = unsplit(&passages);
        Self { source, passages }
    }

    /// The text this document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All passages in source order.
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Number of passages.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the document has no passages.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// The single start passage.
    ///
    /// Fails when there is none or more than one.
    pub fn start(&self) -> TweeResult<&Passage> {
        let mut starts = self.passages.iter().filter(|p| p.is_start());
        let first = starts.next().ok_or(TweeError::NoStart)?;
        let extra = starts.count();
        if extra > 0 {
            return Err(TweeError::MultipleStarts { count: extra + 1 });
        }
        Ok(first)
    }

    /// Map every non-start passage by its case-folded title.
    ///
    /// When two passages share a title the first one wins.
    pub fn title_map(&self) -> HashMap<String, &Passage> {
        let mut map = HashMap::new();
        for passage in self.passages.iter().filter(|p| !p.is_start()) {
            let key = passage.key();
            if map.contains_key(&key) {
                warn!(title = %key, "duplicate passage title, keeping the first");
                continue;
            }
            map.insert(key, passage);
        }
        map
    }

    /// Look up a passage by title or link text.
    pub fn find(&self, title: &str) -> Option<&Passage> {
        let key = crate::passage::title_key(title);
        self.passages.iter().find(|p| p.key() == key)
    }

    /// Passages that carry story: neither metadata nor empty.
    pub fn story_passages(&self) -> impl Iterator<Item = &Passage> {
        self.passages
            .iter()
            .filter(|p| !p.is_special() && !p.is_empty())
    }

    /// Check every passage and the presence of a start passage.
    pub fn validity(&self) -> DocumentValidity {
        DocumentValidity {
            all_valid_passages: self.passages.iter().all(Passage::is_valid),
            has_start: self.passages.iter().any(Passage::is_start),
        }
    }

    /// Whether [`TweeDocument::validity`] passes.
    pub fn is_valid(&self) -> bool {
        self.validity().is_valid()
    }

    /// Render the passages back to Twee text.
    pub fn to_twee(&self) -> String {
        unsplit(&self.passages)
    }
}

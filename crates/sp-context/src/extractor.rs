//! The narrative extractor collaborator and its model-output cleanup.
//!
//! Models run outside this crate. An [`Extractor`] is constructed once and
//! handed to a [`crate::ContextPolicy`] by reference.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sp_twee::text::dedupe_in_order;
use tracing::warn;

use crate::elements::{EntityType, EventTriple};
use crate::error::ContextResult;

/// Pronouns too vague to be worth stating in context.
pub const PRONOUN_STOPLIST: [&str; 6] = ["what", "there", "anything", "nothing", "it", "something"];

/// One token tagged by a named-entity model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerToken {
    /// `B-TYPE` for the first token of an entity, `I-TYPE` for the rest.
    #[serde(alias = "entity")]
    pub tag: String,
    /// Token text; `##` marks a continuation subword.
    pub word: String,
}

impl NerToken {
    /// Create a tagged token.
    pub fn new(tag: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            word: word.into(),
        }
    }
}

/// Source of raw narrative signals for a passage's cleaned text.
pub trait Extractor {
    /// Entity-tagged tokens, in text order.
    fn entities(&self, text: &str) -> Vec<NerToken>;

    /// Pronoun tokens as they appear in the text.
    fn pronouns(&self, text: &str) -> Vec<String>;

    /// Subject-verb-object triples, in text order.
    fn events(&self, text: &str) -> Vec<EventTriple>;
}

/// An extractor that finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExtractor;

impl Extractor for NullExtractor {
    fn entities(&self, _text: &str) -> Vec<NerToken> {
        Vec::new()
    }

    fn pronouns(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }

    fn events(&self, _text: &str) -> Vec<EventTriple> {
        Vec::new()
    }
}

/// Model output for one text, as stored in a recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Entity-tagged tokens.
    #[serde(default)]
    pub entities: Vec<NerToken>,
    /// Pronoun tokens.
    #[serde(default)]
    pub pronouns: Vec<String>,
    /// Event triples.
    #[serde(default)]
    pub events: Vec<EventTriple>,
}

/// Replays model output recorded ahead of time.
///
/// Recordings are keyed by cleaned passage text, compared after trimming.
/// Text with no recording yields nothing.
#[derive(Debug, Clone, Default)]
pub struct RecordedExtractor {
    recordings: HashMap<String, Recording>,
}

impl RecordedExtractor {
    /// Create an extractor with no recordings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load recordings from a JSON object mapping text to [`Recording`].
    pub fn from_json(json: &str) -> ContextResult<Self> {
        let raw: HashMap<String, Recording> = serde_json::from_str(json)?;
        Ok(raw
            .into_iter()
            .fold(Self::new(), |acc, (text, rec)| acc.with_recording(&text, rec)))
    }

    /// Add the recording for one text.
    pub fn with_recording(mut self, text: &str, recording: Recording) -> Self {
        self.recordings.insert(text.trim().to_string(), recording);
        self
    }

    /// Number of recorded texts.
    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    /// Whether there are no recordings.
    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    fn get(&self, text: &str) -> Option<&Recording> {
        self.recordings.get(text.trim())
    }
}

impl Extractor for RecordedExtractor {
    fn entities(&self, text: &str) -> Vec<NerToken> {
        self.get(text).map(|r| r.entities.clone()).unwrap_or_default()
    }

    fn pronouns(&self, text: &str) -> Vec<String> {
        self.get(text).map(|r| r.pronouns.clone()).unwrap_or_default()
    }

    fn events(&self, text: &str) -> Vec<EventTriple> {
        self.get(text).map(|r| r.events.clone()).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Cleanup of raw model output
// ---------------------------------------------------------------------------

struct Span<'a> {
    kind: &'a str,
    text: String,
}

/// Merge subword and multi-word entity tokens into whole entities, grouped
/// by simplified type in mention order.
///
/// `B-` opens an entity. `I-` extends the open entity when its type matches,
/// gluing `##` pieces and space-joining whole words; otherwise it opens a new
/// entity. Tags with neither prefix are skipped.
pub fn merge_entity_spans(tokens: &[NerToken]) -> BTreeMap<EntityType, Vec<String>> {
    let mut spans: Vec<Span<'_>> = Vec::new();
    let mut open = false;

    for token in tokens {
        let Some((prefix, kind)) = token.tag.split_once('-') else {
            warn!(tag = %token.tag, word = %token.word, "skipping entity token without B-/I- prefix");
            open = false;
            continue;
        };
        let piece = token.word.strip_prefix("##");

        match prefix {
            "B" => {
                spans.push(Span {
                    kind,
                    text: piece.unwrap_or(&token.word).to_string(),
                });
                open = true;
            }
            "I" => {
                let extends = open && spans.last().is_some_and(|last| last.kind == kind);
                if !extends {
                    warn!(tag = %token.tag, word = %token.word, "inside-entity token with no open entity");
                    spans.push(Span {
                        kind,
                        text: piece.unwrap_or(&token.word).to_string(),
                    });
                    open = true;
                } else if let Some(last) = spans.last_mut() {
                    match piece {
                        Some(rest) => last.text.push_str(rest),
                        None => {
                            last.text.push(' ');
                            last.text.push_str(&token.word);
                        }
                    }
                }
            }
            _ => {
                warn!(tag = %token.tag, word = %token.word, "skipping entity token without B-/I- prefix");
                open = false;
            }
        }
    }

    let mut grouped: BTreeMap<EntityType, Vec<String>> = BTreeMap::new();
    for span in spans {
        grouped
            .entry(EntityType::from_tag(span.kind))
            .or_default()
            .push(span.text);
    }
    grouped
}

/// Lower-case pronouns and dedupe them in first-seen order, dropping the
/// [`PRONOUN_STOPLIST`].
pub fn clean_pronouns(pronouns: &[String]) -> Vec<String> {
    let stoplist: HashSet<String> = PRONOUN_STOPLIST.iter().map(|p| p.to_string()).collect();
    dedupe_in_order(pronouns.iter().map(|p| p.to_lowercase()), &stoplist)
}

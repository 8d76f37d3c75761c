//! Narrative elements extracted from one passage.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Simplified named-entity types.
///
/// Variant order is the order entity sentences are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// People (`PER`).
    #[serde(rename = "PER")]
    Person,
    /// Locations (`LOC`, and `GPE` folded in).
    #[serde(rename = "LOC")]
    Location,
    /// Organizations (`ORG`).
    #[serde(rename = "ORG")]
    Organization,
    /// Miscellaneous entities (`MISC`).
    #[serde(rename = "MISC")]
    Misc,
    /// Numerals (`CARDINAL`).
    #[serde(rename = "CARDINAL")]
    Cardinal,
    /// Dates (`DATE`).
    #[serde(rename = "DATE")]
    Date,
    /// Named events (`EVENT`).
    #[serde(rename = "EVENT")]
    Event,
    /// Facilities (`FAC`).
    #[serde(rename = "FAC")]
    Facility,
    /// Languages (`LANGUAGE`).
    #[serde(rename = "LANGUAGE")]
    Language,
    /// Documents (`LAW`).
    #[serde(rename = "LAW")]
    Law,
    /// Monetary values (`MONEY`).
    #[serde(rename = "MONEY")]
    Money,
    /// Nationalities (`NORP`).
    #[serde(rename = "NORP")]
    Nationality,
    /// Ordinals (`ORDINAL`).
    #[serde(rename = "ORDINAL")]
    Ordinal,
    /// Percentages (`PERCENT`).
    #[serde(rename = "PERCENT")]
    Percent,
    /// Products (`PRODUCT`).
    #[serde(rename = "PRODUCT")]
    Product,
    /// Measurements (`QUANTITY`).
    #[serde(rename = "QUANTITY")]
    Quantity,
    /// Times (`TIME`).
    #[serde(rename = "TIME")]
    Time,
    /// Artworks (`WORK_OF_ART`).
    #[serde(rename = "WORK_OF_ART")]
    WorkOfArt,
    /// Any tag not listed above.
    #[serde(rename = "OTHER")]
    Other,
}

/// Types stated in every rendered context, even with no mentions.
pub const ALWAYS_INCLUDED: [EntityType; 2] = [EntityType::Person, EntityType::Location];

impl EntityType {
    /// Map a model tag (without its `B-`/`I-` prefix) to a type.
    ///
    /// `GPE` folds into [`EntityType::Location`]; unknown tags become
    /// [`EntityType::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "PER" => EntityType::Person,
            "LOC" | "GPE" => EntityType::Location,
            "ORG" => EntityType::Organization,
            "MISC" => EntityType::Misc,
            "CARDINAL" => EntityType::Cardinal,
            "DATE" => EntityType::Date,
            "EVENT" => EntityType::Event,
            "FAC" => EntityType::Facility,
            "LANGUAGE" => EntityType::Language,
            "LAW" => EntityType::Law,
            "MONEY" => EntityType::Money,
            "NORP" => EntityType::Nationality,
            "ORDINAL" => EntityType::Ordinal,
            "PERCENT" => EntityType::Percent,
            "PRODUCT" => EntityType::Product,
            "QUANTITY" => EntityType::Quantity,
            "TIME" => EntityType::Time,
            "WORK_OF_ART" => EntityType::WorkOfArt,
            other => {
                warn!(tag = other, "unknown entity type");
                EntityType::Other
            }
        }
    }

    /// The title-cased plural used in rendered context.
    pub fn plural(self) -> &'static str {
        match self {
            EntityType::Person => "People",
            EntityType::Location => "Locations",
            EntityType::Organization => "Organizations",
            EntityType::Misc => "Other Entities",
            EntityType::Cardinal => "Numerals",
            EntityType::Date => "Dates",
            EntityType::Event => "Named Events",
            EntityType::Facility => "Facilities",
            EntityType::Language => "Languages",
            EntityType::Law => "Documents",
            EntityType::Money => "Monetary Values",
            EntityType::Nationality => "Nationalities",
            EntityType::Ordinal => "Ordinals",
            EntityType::Percent => "Percentages",
            EntityType::Product => "Products",
            EntityType::Quantity => "Measurements",
            EntityType::Time => "Times",
            EntityType::WorkOfArt => "Artworks",
            EntityType::Other => "Other",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plural())
    }
}

/// One token of an event phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventToken {
    /// Surface text.
    pub text: String,
    /// Dictionary form.
    pub lemma: String,
}

impl EventToken {
    /// Create a token.
    pub fn new(text: impl Into<String>, lemma: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
        }
    }
}

/// A subject-verb-object triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTriple {
    /// Who acts.
    pub subject: Vec<EventToken>,
    /// The action.
    pub verb: Vec<EventToken>,
    /// What is acted on.
    pub object: Vec<EventToken>,
}

impl EventTriple {
    /// Create a triple from its three phrases.
    pub fn new(subject: Vec<EventToken>, verb: Vec<EventToken>, object: Vec<EventToken>) -> Self {
        Self {
            subject,
            verb,
            object,
        }
    }

    /// Lemmatized, lower-cased `subject verb object`.
    pub fn summary(&self) -> String {
        [&self.subject, &self.verb, &self.object]
            .iter()
            .flat_map(|phrase| phrase.iter())
            .map(|token| token.lemma.to_lowercase())
            .filter(|lemma| !lemma.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything the extractor found in one passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeElements {
    /// Entity surface strings grouped by type, in mention order.
    #[serde(default)]
    pub entities: BTreeMap<EntityType, Vec<String>>,
    /// Pronouns, lower-cased and deduped.
    #[serde(default)]
    pub pronouns: Vec<String>,
    /// Event triples; present only under the events policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventTriple>>,
}

impl NarrativeElements {
    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.entities.values().all(Vec::is_empty)
            && self.pronouns.is_empty()
            && self.events.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Ranked context accumulated over a node's ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedContext {
    /// Most frequent entities per type.
    pub entities: BTreeMap<EntityType, Vec<String>>,
    /// Most frequent pronouns.
    pub pronouns: Vec<String>,
    /// Concatenated events after halving, when the policy tracks them.
    pub events: Option<Vec<EventTriple>>,
}

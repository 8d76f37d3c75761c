//! Versioned context strategies: extraction, aggregation, and rendering.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use sp_twee::text::comma_join;
use tracing::debug;

use crate::config::{ContextConfig, PolicyVersion};
use crate::elements::{ALWAYS_INCLUDED, AggregatedContext, EventTriple, NarrativeElements};
use crate::extractor::{Extractor, NullExtractor, clean_pronouns, merge_entity_spans};

static NULL_EXTRACTOR: NullExtractor = NullExtractor;

/// One context strategy bound to an extractor.
///
/// The policy is chosen once, when a tree or session is configured, and
/// applies to every node.
#[derive(Clone)]
pub struct ContextPolicy<'a> {
    extractor: &'a dyn Extractor,
    config: ContextConfig,
}

impl<'a> ContextPolicy<'a> {
    /// Bind a configuration to an extractor.
    pub fn new(extractor: &'a dyn Extractor, config: ContextConfig) -> Self {
        Self { extractor, config }
    }

    /// The policy that extracts and renders nothing.
    pub fn naive() -> ContextPolicy<'static> {
        ContextPolicy {
            extractor: &NULL_EXTRACTOR,
            config: ContextConfig::default().with_policy(PolicyVersion::Naive),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The active strategy.
    pub fn version(&self) -> PolicyVersion {
        self.config.policy
    }

    /// Extract narrative elements from one passage's cleaned text.
    pub fn extract(&self, text: &str) -> NarrativeElements {
        let version = self.version();
        if !version.uses_entities() {
            return NarrativeElements::default();
        }

        let entities = merge_entity_spans(&self.extractor.entities(text));
        let pronouns = clean_pronouns(&self.extractor.pronouns(text));
        let events = version
            .uses_events()
            .then(|| self.extractor.events(text));

        NarrativeElements {
            entities,
            pronouns,
            events,
        }
    }

    /// Rank the elements of a node's ancestors.
    ///
    /// Entities and pronouns keep the `top_k` most frequent values, ties in
    /// first-seen order. Events are concatenated and halved until they fit
    /// `max_events`.
    pub fn aggregate<'e, I>(&self, ancestors: I) -> AggregatedContext
    where
        I: IntoIterator<Item = &'e NarrativeElements>,
    {
        let version = self.version();
        if !version.uses_entities() {
            return AggregatedContext::default();
        }

        let mut entities: HashMap<_, Vec<String>> = HashMap::new();
        let mut pronouns = Vec::new();
        let mut events = Vec::new();
        for elements in ancestors {
            for (kind, values) in &elements.entities {
                entities.entry(*kind).or_default().extend(values.iter().cloned());
            }
            pronouns.extend(elements.pronouns.iter().cloned());
            if let Some(found) = &elements.events {
                events.extend(found.iter().cloned());
            }
        }

        let top_k = self.config.top_k;
        AggregatedContext {
            entities: entities
                .into_iter()
                .map(|(kind, values)| (kind, most_frequent(values, top_k)))
                .collect(),
            pronouns: most_frequent(pronouns, top_k),
            events: version
                .uses_events()
                .then(|| halve_to(events, self.config.max_events)),
        }
    }

    /// Render the context text for a node from its ancestors' elements,
    /// root first.
    ///
    /// A node without ancestors has no context.
    pub fn render<'e, I>(&self, ancestors: I) -> String
    where
        I: IntoIterator<Item = &'e NarrativeElements>,
    {
        let ancestors: Vec<&NarrativeElements> = ancestors.into_iter().collect();
        if ancestors.is_empty() {
            return String::new();
        }
        let text = self.write(&self.aggregate(ancestors));
        debug!(policy = %self.version(), len = text.len(), "rendered context");
        text
    }

    /// Write an aggregate as sentences.
    pub fn write(&self, context: &AggregatedContext) -> String {
        if !self.version().uses_entities() {
            return String::new();
        }

        let mut kinds: BTreeSet<_> = context.entities.keys().copied().collect();
        kinds.extend(ALWAYS_INCLUDED);

        let mut sentences: Vec<String> = kinds
            .into_iter()
            .map(|kind| {
                let values = context.entities.get(&kind).map(Vec::as_slice).unwrap_or_default();
                format!("Mentioned {}: {}.", kind.plural(), list_or_none(values))
            })
            .collect();
        sentences.push(format!(
            "Pronouns referenced: {}.",
            list_or_none(&context.pronouns)
        ));

        let mut text = sentences.join(" ");
        if let Some(events) = &context.events {
            text.push('\n');
            text.push_str(&write_events(events));
        }
        text
    }
}

fn list_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        comma_join(values)
    }
}

fn write_events(events: &[EventTriple]) -> String {
    if events.is_empty() {
        return "Preceding Events: None".to_string();
    }
    let mut block = "Preceding Events:".to_string();
    for event in events {
        block.push_str("\n- ");
        block.push_str(&event.summary());
    }
    block
}

/// The `k` most frequent values, most frequent first; ties keep first-seen
/// order.
pub fn most_frequent(values: Vec<String>, k: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for value in values {
        let count = counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }
    order.sort_by_key(|value| Reverse(counts.get(value).copied().unwrap_or(0)));
    order.truncate(k);
    order
}

/// Keep every other element until at most `max` remain.
///
/// Halving keeps a spread over the whole ancestor chain instead of only its
/// start or end.
pub fn halve_to<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    if max == 0 {
        return Vec::new();
    }
    while items.len() > max {
        items = items.into_iter().step_by(2).collect();
    }
    items
}

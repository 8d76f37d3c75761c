//! Narrative context for Spindle passage trees.
//!
//! Each node of a passage tree carries the narrative elements of its own
//! text. A [`ContextPolicy`] extracts those elements through an
//! [`Extractor`], ranks them across a node's ancestors, and writes the
//! context sentence handed to the completion service.

/// Policy configuration.
pub mod config;
/// Narrative element types.
pub mod elements;
/// Error types for context extraction.
pub mod error;
/// The extractor collaborator.
pub mod extractor;
/// Versioned context strategies.
pub mod policy;

pub use config::{ContextConfig, PolicyVersion};
pub use elements::{AggregatedContext, EntityType, EventToken, EventTriple, NarrativeElements};
pub use error::{ContextError, ContextResult};
pub use extractor::{Extractor, NerToken, NullExtractor, RecordedExtractor, Recording};
pub use policy::ContextPolicy;

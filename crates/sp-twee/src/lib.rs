//! Twee story text for Spindle.
//!
//! Splits Twee documents into passages, extracts and sanitises links, checks
//! bracket balance with source-mapped diagnostics, cleans decompiled stories,
//! and encodes passages into the prompt/completion format used for
//! generation.

/// Decompiled-story cleanup filters.
pub mod clean;
/// Prompt and completion encoding.
pub mod codec;
/// Source-mapped diagnostics rendered with ariadne.
pub mod diagnostics;
/// Documents made of passages.
pub mod document;
/// Error types for Twee documents.
pub mod error;
/// Markup tokens, link spans, and bracket balance.
pub mod lexer;
/// Link extraction and sanitising.
pub mod links;
/// Single passages and title handling.
pub mod passage;
/// Small text utilities shared across the workspace.
pub mod text;

pub use diagnostics::{Diagnostic, Severity, check_document, render_diagnostics};
pub use document::{DocumentValidity, TweeDocument, init_twee, split, unsplit};
pub use error::{TweeError, TweeResult};
pub use links::{LinkCache, get_links};
pub use passage::{Passage, Validity, make_title, title_key};

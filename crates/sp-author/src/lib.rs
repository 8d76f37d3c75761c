//! Story authoring for Spindle.
//!
//! Drives the write/generate/finish loop over a to-do list of passage
//! titles, validating every candidate before it joins the story and the
//! passage tree.

/// The completion service collaborator.
pub mod completer;
/// Session configuration.
pub mod config;
/// Error types for authoring sessions.
pub mod error;
/// Authoring session management.
pub mod session;

pub use completer::{CannedCompleter, Completer};
pub use config::SessionConfig;
pub use error::{CompletionError, SessionError, SessionResult};
pub use session::{AuthoringSession, BulkReport, Outcome, Pending};

pub mod check;
pub mod dataset;
pub mod decode;
pub mod finish;
pub mod generate;
pub mod links;
pub mod prompt;
pub mod tree;

use std::path::Path;

use sp_context::{ContextConfig, ContextPolicy, PolicyVersion, RecordedExtractor};
use sp_tree::PassageTree;
use sp_twee::{Diagnostic, Severity, TweeDocument, render_diagnostics};
use tracing::debug;

/// Read and split a Twee file.
pub fn read_document(path: &Path) -> Result<TweeDocument, String> {
    let source =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let document = TweeDocument::parse(source);
    debug!(path = %path.display(), passages = document.len(), "read document");
    Ok(document)
}

/// Load recorded extractor output, or an empty recording when no file is given.
pub fn load_extractor(path: Option<&Path>) -> Result<RecordedExtractor, String> {
    let Some(path) = path else {
        return Ok(RecordedExtractor::new());
    };
    let json =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    RecordedExtractor::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))
}

/// Parse a `--policy` value into a context configuration.
pub fn context_config(policy: &str) -> Result<ContextConfig, String> {
    let version: PolicyVersion = policy.parse().map_err(|e: sp_context::ContextError| e.to_string())?;
    Ok(ContextConfig::default().with_policy(version))
}

/// Build the passage tree of `document` under `policy`.
pub fn build_tree(document: &TweeDocument, policy: &ContextPolicy<'_>) -> Result<PassageTree, String> {
    PassageTree::create(document, policy).map_err(|e| e.to_string())
}

/// Body of a metadata passage such as `StoryTitle`, if present and non-empty.
pub fn metadata(document: &TweeDocument, name: &str) -> Option<String> {
    document
        .find(name)
        .map(|p| p.body().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Write `content` to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<(), String> {
    match output {
        Some(path) => std::fs::write(path, content)
            .map_err(|e| format!("cannot write to {}: {e}", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

/// Print rendered diagnostics to stderr with a summary line.
pub fn print_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    eprint!("{}", render_diagnostics(source, filename, diagnostics));

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;
    eprintln!("{errors} error(s), {warnings} warning(s)");
}

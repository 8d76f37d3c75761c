use std::path::Path;

use sp_author::{AuthoringSession, CannedCompleter, SessionConfig};
use sp_context::ContextPolicy;

use super::dataset::Example;

/// Arguments of the `generate` command.
pub struct Options<'a> {
    pub file: &'a Path,
    pub completions: &'a Path,
    pub max: usize,
    pub policy: &'a str,
    pub extractions: Option<&'a Path>,
    pub title: Option<&'a str>,
    pub author: Option<&'a str>,
    pub output: Option<&'a Path>,
}

pub fn run(options: Options<'_>) -> Result<(), String> {
    let document = super::read_document(options.file)?;
    let extractor = super::load_extractor(options.extractions)?;
    let policy = ContextPolicy::new(&extractor, super::context_config(options.policy)?);
    let mut completer = CannedCompleter::new(load_completions(options.completions)?);

    let config = SessionConfig::default().with_max_generations(options.max);
    let mut session = AuthoringSession::new(policy, config);
    let resumed = session.resume(&document).map_err(|e| e.to_string())?;
    let report = session
        .generate_remaining(&mut completer)
        .map_err(|e| e.to_string())?;

    let story_title = options
        .title
        .map(str::to_string)
        .or_else(|| super::metadata(&document, "StoryTitle"))
        .unwrap_or_else(|| "Untitled".to_string());
    let story_author = options
        .author
        .map(str::to_string)
        .or_else(|| super::metadata(&document, "StoryAuthor"))
        .unwrap_or_else(|| "anonymous".to_string());

    super::write_output(options.output, &session.to_twee(&story_title, &story_author))?;

    eprintln!(
        "  Kept {resumed} passages, generated {} ({} accepted, {} rejected)",
        report.generated, report.accepted, report.rejected
    );
    if report.capped {
        eprintln!(
            "  Stopped after {} generations; still to write: {}",
            session.config().max_generations,
            session.todo().join(", ")
        );
    }
    if let Some(path) = options.output {
        eprintln!("  Wrote story to {}", path.display());
    }
    Ok(())
}

/// Read completions from a JSON array of strings or from dataset JSON lines.
fn load_completions(path: &Path) -> Result<Vec<String>, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;

    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()));
    }

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str::<Example>(line)
                .map(|example| example.completion)
                .map_err(|e| format!("{} line {}: {e}", path.display(), i + 1))
        })
        .collect()
}

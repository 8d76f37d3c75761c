use std::path::Path;

use sp_author::{AuthoringSession, SessionConfig};
use sp_context::ContextPolicy;

pub fn run(
    file: &Path,
    placeholder: Option<&str>,
    title: Option<&str>,
    author: Option<&str>,
    output: Option<&Path>,
) -> Result<(), String> {
    let document = super::read_document(file)?;

    let mut config = SessionConfig::default();
    if let Some(placeholder) = placeholder {
        config = config.with_placeholder(placeholder);
    }
    let mut session = AuthoringSession::new(ContextPolicy::naive(), config);
    let resumed = session.resume(&document).map_err(|e| e.to_string())?;
    let written = session.finish().map_err(|e| e.to_string())?;

    let story_title = title
        .map(str::to_string)
        .or_else(|| super::metadata(&document, "StoryTitle"))
        .unwrap_or_else(|| "Untitled".to_string());
    let story_author = author
        .map(str::to_string)
        .or_else(|| super::metadata(&document, "StoryAuthor"))
        .unwrap_or_else(|| "anonymous".to_string());

    super::write_output(output, &session.to_twee(&story_title, &story_author))?;

    eprintln!("  Kept {resumed} passages, wrote {written} placeholder(s)");
    let left = session.todo();
    if !left.is_empty() {
        eprintln!("  Could not write: {}", left.join(", "));
    }
    if let Some(path) = output {
        eprintln!("  Wrote story to {}", path.display());
    }
    Ok(())
}

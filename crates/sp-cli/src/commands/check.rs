use std::path::Path;

use colored::Colorize;
use sp_twee::{check_document, diagnostics::has_errors};

pub fn run(file: &Path) -> Result<(), String> {
    let document = super::read_document(file)?;
    let diagnostics = check_document(&document);
    super::print_diagnostics(document.source(), &file.display().to_string(), &diagnostics);

    if has_errors(&diagnostics) {
        return Err(format!("{} has errors", file.display()));
    }

    let name = super::metadata(&document, "StoryTitle")
        .unwrap_or_else(|| file.display().to_string());
    println!("  {} All checks passed for '{}'.", "ok".green().bold(), name.bold());
    println!(
        "  {}",
        format!(
            "{} passages, {} warning(s)",
            document.story_passages().count(),
            diagnostics.len()
        )
        .dimmed()
    );
    Ok(())
}

use std::path::Path;

use colored::Colorize;
use sp_context::ContextPolicy;
use sp_tree::{render_ascii, to_dot};

pub fn run(file: &Path, policy: &str, extractions: Option<&Path>, format: &str) -> Result<(), String> {
    let document = super::read_document(file)?;
    let extractor = super::load_extractor(extractions)?;
    let policy = ContextPolicy::new(&extractor, super::context_config(policy)?);
    let tree = super::build_tree(&document, &policy)?;

    match format {
        "ascii" => {
            print!("{}", render_ascii(&tree));
            println!(
                "  {}",
                format!(
                    "{} passages, {} unresolved link(s)",
                    tree.len(),
                    tree.unresolved().len()
                )
                .dimmed()
            );
        }
        "dot" => print!("{}", to_dot(&tree)),
        "json" => {
            let json = serde_json::to_string_pretty(&tree).map_err(|e| format!("serialization failed: {e}"))?;
            println!("{json}");
        }
        other => return Err(format!("unsupported format: {other} (expected ascii, dot, or json)")),
    }
    Ok(())
}

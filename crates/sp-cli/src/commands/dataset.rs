use std::path::Path;

use serde::{Deserialize, Serialize};
use sp_context::ContextPolicy;
use sp_twee::codec::encode_passage;
use sp_twee::make_title;

/// One line of a fine-tuning dataset.
#[derive(Debug, Serialize, Deserialize)]
pub struct Example {
    pub prompt: String,
    pub completion: String,
}

pub fn run(
    file: &Path,
    policy: &str,
    extractions: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), String> {
    let document = super::read_document(file)?;
    let extractor = super::load_extractor(extractions)?;
    let policy = ContextPolicy::new(&extractor, super::context_config(policy)?);
    let tree = super::build_tree(&document, &policy)?;

    let mut content = String::new();
    for node in tree.iter() {
        let twee = format!("{}\n{}", make_title(&node.title, true), node.passage.body());
        let (prompt, completion) = encode_passage(&twee, &node.context_text);
        let line = serde_json::to_string(&Example { prompt, completion })
            .map_err(|e| format!("serialization failed: {e}"))?;
        content.push_str(&line);
        content.push('\n');
    }

    super::write_output(output, &content)?;
    if let Some(path) = output {
        println!("  Wrote {} examples to {}", tree.len(), path.display());
    }
    Ok(())
}

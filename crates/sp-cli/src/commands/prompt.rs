use std::path::Path;

use sp_context::ContextPolicy;
use sp_twee::codec::encode_passage;
use sp_twee::make_title;

pub fn run(
    file: &Path,
    title: &str,
    policy: &str,
    extractions: Option<&Path>,
    completion: bool,
) -> Result<(), String> {
    let document = super::read_document(file)?;
    let extractor = super::load_extractor(extractions)?;
    let policy = ContextPolicy::new(&extractor, super::context_config(policy)?);
    let tree = super::build_tree(&document, &policy)?;

    let node = tree
        .find(title)
        .ok_or_else(|| format!("passage \"{title}\" is not reachable from the start passage"))?;

    let twee = format!("{}\n{}", make_title(&node.title, true), node.passage.body());
    let (prompt, expected) = encode_passage(&twee, &node.context_text);
    println!("{prompt}");
    if completion {
        println!("{expected}");
    }
    Ok(())
}

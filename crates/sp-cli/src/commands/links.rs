use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use sp_twee::LinkCache;

pub fn run(file: &Path) -> Result<(), String> {
    let document = super::read_document(file)?;
    let mut cache = LinkCache::new();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Passage", "Links"]);

    let mut unresolved: Vec<(String, String)> = Vec::new();
    let mut count = 0;
    for passage in document.story_passages() {
        let links = cache.links(passage.raw_text()).to_vec();
        for link in &links {
            if document.find(link).is_none() {
                unresolved.push((passage.name(), link.clone()));
            }
        }
        let shown = if links.is_empty() {
            "-".to_string()
        } else {
            links.join(", ")
        };
        table.add_row(vec![passage.name(), shown]);
        count += 1;
    }

    println!("{table}");
    println!("  {}", format!("{count} passages").dimmed());

    if !unresolved.is_empty() {
        println!();
        println!("  {}", "Unresolved links:".bold());
        for (from, link) in &unresolved {
            println!("    {from} -> {link}");
        }
    }
    Ok(())
}

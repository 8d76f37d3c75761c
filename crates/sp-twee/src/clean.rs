//! Filters that turn decompiled Twee into training-ready text.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{split, unsplit};
use crate::lexer::scan;
use crate::passage::Passage;
use crate::text::collapse_newlines;

static DATA_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:image/.*\n").expect("valid regex"));
static IMG_MACRO_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[img\[.*\]\].*\n").expect("valid regex"));
static TWINE_IMAGE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*\[Twine\.image\]\n").expect("valid regex"));
static INLINE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[>img\[.*?\]\]").expect("valid regex"));
static HTML_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<html>.*</html>").expect("valid regex"));

/// Remove embedded images and image markup.
pub fn clean_images(twee: &str) -> String {
    let twee = DATA_IMAGE.replace_all(twee, "\n");
    let twee = IMG_MACRO_LINE.replace_all(&twee, "\n");
    let twee = TWINE_IMAGE_LINE.replace_all(&twee, "\n");
    INLINE_IMAGE.replace_all(&twee, "").into_owned()
}

/// Remove single-line `<html>...</html>` blocks.
pub fn remove_html(twee: &str) -> String {
    HTML_BLOCK.replace_all(twee, "").into_owned()
}

/// The bodies of every `<<...>>` macro, in order.
pub fn macros(twee: &str) -> Vec<String> {
    scan(twee)
        .macros
        .iter()
        .map(|m| twee[m.body.clone()].to_string())
        .collect()
}

/// Remove every macro along with one following space.
pub fn remove_macros(twee: &str) -> String {
    let mut out = String::with_capacity(twee.len());
    let mut cursor = 0;
    for m in scan(twee).macros {
        out.push_str(&twee[cursor..m.outer.start]);
        cursor = m.outer.end;
        if twee[cursor..].starts_with(' ') {
            cursor += 1;
        }
    }
    out.push_str(&twee[cursor..]);
    out
}

/// Clean a whole decompiled document: drop images, empty and code passages,
/// HTML blocks, and repeated newlines.
pub fn clean_twee(twee: &str) -> String {
    let twee = clean_images(twee);
    let passages: Vec<Passage> = split(&twee)
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| Passage::new(remove_html(p.raw_text())))
        .collect();
    collapse_newlines(&unsplit(&passages))
}

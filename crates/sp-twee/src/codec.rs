//! Wire format shared with the completion service.
//!
//! A request is `BEGIN [context END_CONTEXT] title END_PROMPT`; a response is
//! a single space, the passage body with newlines replaced by `NL`, and `END`.

use crate::text::collapse_newlines;

/// Opens every prompt.
pub const BEGIN: &str = "<|begin|>";
/// Separates the context summary from the title line.
pub const END_CONTEXT: &str = "<|title|>";
/// Closes the prompt.
pub const END_PROMPT: &str = "<|start|>";
/// Closes the completion.
pub const END: &str = "<|end|>";
/// Stands in for a newline inside a completion.
pub const NL: &str = "<newline>";

const SENTINELS: [&str; 4] = [BEGIN, END_CONTEXT, END_PROMPT, END];

/// Build a completion request for a title line with optional context.
pub fn encode_prompt(title_line: &str, context_text: &str) -> String {
    let context = context_text.trim();
    if context.is_empty() {
        format!("{BEGIN}{title_line}{END_PROMPT}")
    } else {
        format!("{BEGIN}{context}{END_CONTEXT}{title_line}{END_PROMPT}")
    }
}

/// Build the expected completion for a passage body.
///
/// The leading space is part of the contract with the service's tokenizer
/// and is emitted even for an empty body.
pub fn encode_completion(body_without_title: &str) -> String {
    format!(" {}{END}", body_without_title.replace('\n', NL).trim())
}

/// Split a whole passage into its `(prompt, completion)` pair.
///
/// Repeated blank lines in the body are collapsed first.
pub fn encode_passage(twee: &str, context_text: &str) -> (String, String) {
    let (title, body) = twee.split_once('\n').unwrap_or((twee, ""));
    (
        encode_prompt(title, context_text),
        encode_completion(&collapse_newlines(body)),
    )
}

/// Turn a prompt and its completion back into Twee text.
///
/// Any context before `END_CONTEXT` is dropped, every sentinel is removed,
/// `NL` becomes a newline again and the completion's leading space is
/// removed. The two halves are joined by a newline when both are non-empty.
pub fn decode(prompt: &str, completion: &str) -> String {
    let prompt = match prompt.find(END_CONTEXT) {
        Some(at) => &prompt[at + END_CONTEXT.len()..],
        None => prompt,
    };
    let prompt = strip_sentinels(prompt);
    let completion = strip_sentinels(completion);
    let completion = completion.strip_prefix(' ').unwrap_or(&completion);

    match (prompt.is_empty(), completion.is_empty()) {
        (false, false) => format!("{prompt}\n{completion}"),
        (false, true) => prompt,
        _ => completion.to_string(),
    }
}

fn strip_sentinels(text: &str) -> String {
    let mut out = text.to_string();
    for sentinel in SENTINELS {
        out = out.replace(sentinel, "");
    }
    out.replace(NL, "\n")
}

//! Small text primitives shared by every Spindle crate.

use std::collections::HashSet;
use std::hash::Hash;

/// Deduplicate `items`, keeping the first occurrence of each value in order.
///
/// Values contained in `stoplist` are dropped as if they had already been seen.
pub fn dedupe_in_order<T, I>(items: I, stoplist: &HashSet<T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen: HashSet<T> = stoplist.clone();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Join items into an English list: `A`, `A and B`, `A, B, and C`.
pub fn comma_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [a, b] => format!("{} and {}", a.as_ref(), b.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Collapse every run of one repeated whitespace character into a single copy.
///
/// Mixed runs such as `" \n"` are left alone; only identical neighbours merge.
pub fn collapse_whitespace_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c.is_whitespace() && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Collapse any run of newlines into one newline.
pub fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_newline = false;
    for c in text.chars() {
        if c == '\n' {
            if last_newline {
                continue;
            }
            last_newline = true;
        } else {
            last_newline = false;
        }
        out.push(c);
    }
    out
}

/// Collapse internal whitespace to single spaces and trim both ends.
pub fn squash_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

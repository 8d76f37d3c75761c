//! Near-miss title suggestions for unresolved links.

use strsim::jaro_winkler;

/// Minimum similarity for a title to be suggested (0.0-1.0).
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// The candidate title most similar to `target`, if any is close enough.
///
/// Comparison is case-insensitive; the candidate is returned as given.
/// Equally close candidates resolve to the earliest one.
pub fn closest_title<'a, I>(target: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = target.to_lowercase();
    candidates
        .into_iter()
        .map(|name| (name, jaro_winkler(&target, &name.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .fold(None, |best: Option<(&str, f64)>, (name, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((name, score)),
        })
        .map(|(name, _)| name.to_string())
}

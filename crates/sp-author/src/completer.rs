//! The completion service collaborator.

use crate::error::CompletionError;

/// Turns a wire-format prompt into a wire-format completion.
pub trait Completer {
    /// Complete one prompt.
    fn complete(&mut self, prompt: &str) -> Result<String, CompletionError>;
}

/// Replays recorded completions in order, starting over when it runs out.
#[derive(Debug, Clone, Default)]
pub struct CannedCompleter {
    completions: Vec<String>,
    next: usize,
    prompts: Vec<String>,
}

impl CannedCompleter {
    /// Create a completer that replays `completions`.
    pub fn new<I, S>(completions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            completions: completions.into_iter().map(Into::into).collect(),
            next: 0,
            prompts: Vec::new(),
        }
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Completer for CannedCompleter {
    fn complete(&mut self, prompt: &str) -> Result<String, CompletionError> {
        if self.completions.is_empty() {
            return Err(CompletionError::Exhausted);
        }
        let completion = self.completions[self.next % self.completions.len()].clone();
        self.next += 1;
        self.prompts.push(prompt.to_string());
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_in_order_and_cycles() {
        let mut completer = CannedCompleter::new([" a<|end|>", " b<|end|>"]);
        assert_eq!(completer.complete("p1").unwrap(), " a<|end|>");
        assert_eq!(completer.complete("p2").unwrap(), " b<|end|>");
        assert_eq!(completer.complete("p3").unwrap(), " a<|end|>");
        assert_eq!(completer.prompts(), ["p1", "p2", "p3"]);
    }

    #[test]
    fn empty_completer_is_exhausted() {
        let mut completer = CannedCompleter::default();
        assert_eq!(completer.complete("p"), Err(CompletionError::Exhausted));
    }
}

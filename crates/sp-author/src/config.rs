//! Configuration for an authoring session.

/// Configuration for an authoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Most passages generated by one bulk run (at least 1).
    pub max_generations: usize,
    /// Body written for every passage left when the story is finished.
    pub placeholder: String,
    /// Title of the first passage to write; it is assembled as `:: Start`.
    pub start_title: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_generations: 16,
            placeholder: "To be continued.".to_string(),
            start_title: "Start".to_string(),
        }
    }
}

impl SessionConfig {
    /// Set the bulk generation cap (clamped to at least 1).
    pub fn with_max_generations(mut self, max: usize) -> Self {
        self.max_generations = max.max(1);
        self
    }

    /// Set the placeholder body.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the start passage title.
    pub fn with_start_title(mut self, title: impl Into<String>) -> Self {
        self.start_title = title.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.max_generations, 16);
        assert_eq!(cfg.placeholder, "To be continued.");
        assert_eq!(cfg.start_title, "Start");
    }

    #[test]
    fn builder_methods() {
        let cfg = SessionConfig::default()
            .with_max_generations(4)
            .with_placeholder("TODO")
            .with_start_title("Begin");
        assert_eq!(cfg.max_generations, 4);
        assert_eq!(cfg.placeholder, "TODO");
        assert_eq!(cfg.start_title, "Begin");
    }

    #[test]
    fn max_generations_clamped() {
        assert_eq!(SessionConfig::default().with_max_generations(0).max_generations, 1);
    }
}

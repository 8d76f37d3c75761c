//! Authoring sessions.
//!
//! An `AuthoringSession` keeps a to-do list of passage titles, starting with
//! the start passage. Each passage, whether written by hand, generated, or
//! read from an existing story, goes through the same retrospective: invalid
//! passages are sent back to the list, valid ones are stored, attached to
//! the passage tree, and their new links are queued.

use std::collections::{HashSet, VecDeque};

use sp_context::ContextPolicy;
use sp_tree::{NodeId, PassageTree};
use sp_twee::codec::{decode, encode_prompt};
use sp_twee::links::{LinkCache, lower_case_links};
use sp_twee::{Passage, TweeDocument, init_twee, make_title, title_key};
use tracing::{debug, info, warn};

use crate::completer::Completer;
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// A title waiting to be written, with the node whose passage linked to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    /// The title as first linked.
    pub title: String,
    /// The linking node; `None` for the start passage.
    pub parent: Option<NodeId>,
}

/// What happened to one candidate passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The passage was stored and attached to the tree.
    Accepted {
        /// The title that was written.
        title: String,
        /// The tree node now holding it.
        node: NodeId,
        /// Outgoing links, lower-cased.
        links: Vec<String>,
    },
    /// The passage failed validation; its title is back on the list.
    Rejected {
        /// The title that was attempted.
        title: String,
        /// Why the passage was rejected.
        reason: String,
    },
}

impl Outcome {
    /// Whether the passage was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }
}

/// Summary of a bulk generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// Completions requested.
    pub generated: usize,
    /// Passages accepted.
    pub accepted: usize,
    /// Passages rejected and re-queued.
    pub rejected: usize,
    /// The run stopped at the generation cap with titles still queued.
    pub capped: bool,
}

/// An interactive or scripted story-writing session.
pub struct AuthoringSession<'a> {
    config: SessionConfig,
    policy: ContextPolicy<'a>,
    todo: VecDeque<Pending>,
    done: HashSet<String>,
    passages: Vec<Passage>,
    tree: Option<PassageTree>,
    links: LinkCache,
}

impl<'a> AuthoringSession<'a> {
    /// Create a session whose to-do list holds only the start title.
    pub fn new(policy: ContextPolicy<'a>, config: SessionConfig) -> Self {
        let start = Pending {
            title: config.start_title.clone(),
            parent: None,
        };
        Self {
            config,
            policy,
            todo: VecDeque::from([start]),
            done: HashSet::new(),
            passages: Vec::new(),
            tree: None,
            links: LinkCache::new(),
        }
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Titles still to write, in queue order.
    pub fn todo(&self) -> Vec<&str> {
        self.todo.iter().map(|p| p.title.as_str()).collect()
    }

    /// Whether every queued passage has been written.
    pub fn is_complete(&self) -> bool {
        self.todo.is_empty()
    }

    /// Accepted passages, in the order they were accepted.
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// The tree grown so far; `None` until the start passage is accepted.
    pub fn tree(&self) -> Option<&PassageTree> {
        self.tree.as_ref()
    }

    /// Write a passage by hand.
    pub fn write(&mut self, title: &str, body: &str) -> SessionResult<Outcome> {
        let pending = self.take(title)?;
        let passage = Passage::from_parts(&pending.title, body);
        self.retrospective(pending, passage)
    }

    /// The wire prompt for a queued title.
    ///
    /// The context covers the node that first linked to the title and all
    /// of its ancestors.
    pub fn prompt_for(&self, title: &str) -> SessionResult<String> {
        let pending = self.pending(title)?;
        let context = match (&self.tree, pending.parent) {
            (Some(tree), Some(parent)) => tree.context_below(parent, &self.policy),
            _ => String::new(),
        };
        Ok(encode_prompt(&make_title(&pending.title, true), &context))
    }

    /// Generate a queued passage with `completer`.
    ///
    /// A completer failure leaves the title on the list.
    pub fn generate(&mut self, title: &str, completer: &mut dyn Completer) -> SessionResult<Outcome> {
        let prompt = self.prompt_for(title)?;
        debug!(title, prompt = %prompt, "requesting completion");
        let completion = completer.complete(&prompt)?;

        let pending = self.take(title)?;
        let body = decode("", &completion);
        let passage = Passage::new(format!("{}\n{body}", make_title(&pending.title, false)));
        self.retrospective(pending, passage)
    }

    /// Generate queued passages front to back until the list is empty or
    /// `max_generations` completions have been requested.
    ///
    /// Reaching the cap is not an error; remaining titles stay queued.
    pub fn generate_remaining(&mut self, completer: &mut dyn Completer) -> SessionResult<BulkReport> {
        let mut report = BulkReport::default();

        while report.generated < self.config.max_generations {
            let Some(title) = self.todo.front().map(|p| p.title.clone()) else {
                break;
            };
            let outcome = self.generate(&title, completer)?;
            report.generated += 1;
            if outcome.is_accepted() {
                report.accepted += 1;
            } else {
                report.rejected += 1;
            }
        }

        report.capped = !self.todo.is_empty();
        if report.capped {
            info!(
                max = self.config.max_generations,
                remaining = self.todo.len(),
                "generated max number of passages"
            );
        }
        Ok(report)
    }

    /// Write the placeholder body for every title left on the list.
    ///
    /// Titles whose title line cannot be made valid stay queued. Returns how
    /// many passages were written.
    pub fn finish(&mut self) -> SessionResult<usize> {
        let placeholder = self.config.placeholder.clone();
        if !Passage::from_parts("placeholder", &placeholder).is_valid() {
            return Err(SessionError::InvalidPlaceholder(placeholder));
        }

        let mut written = 0;
        loop {
            let batch: Vec<Pending> = self.todo.drain(..).collect();
            let mut progressed = false;
            for pending in batch {
                let passage = Passage::from_parts(&pending.title, &placeholder);
                if self.retrospective(pending, passage)?.is_accepted() {
                    written += 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        info!(written, "finished remaining passages");
        Ok(written)
    }

    /// Feed an existing story through the session, start passage first and
    /// then in link order, so a partly written story can be continued.
    ///
    /// Queued titles with no passage in the document stay queued. Returns how
    /// many passages were accepted.
    pub fn resume(&mut self, document: &TweeDocument) -> SessionResult<usize> {
        document.start()?;

        let mut tried: HashSet<String> = HashSet::new();
        let mut accepted = 0;
        loop {
            let next = self.todo.iter().position(|p| {
                let key = title_key(&p.title);
                !tried.contains(&key) && document.find(&p.title).is_some()
            });
            let Some(index) = next else { break };
            let Some(pending) = self.todo.remove(index) else { break };
            tried.insert(title_key(&pending.title));

            let Some(passage) = document.find(&pending.title).cloned() else {
                continue;
            };
            if self.retrospective(pending, passage)?.is_accepted() {
                accepted += 1;
            }
        }
        info!(accepted, remaining = self.todo.len(), "resumed story");
        Ok(accepted)
    }

    /// Assemble the story: metadata passages, then every accepted passage.
    ///
    /// The first accepted passage is the tree root and is always titled
    /// `:: Start`, whatever `start_title` was configured.
    pub fn to_twee(&self, story_title: &str, author: &str) -> String {
        let mut twee = init_twee(story_title, author);
        for (i, passage) in self.passages.iter().enumerate() {
            if i == 0 {
                twee.push_str(Passage::from_parts("Start", &passage.body()).raw_text());
            } else {
                twee.push_str(passage.raw_text());
            }
            twee.push_str("\n\n");
        }
        twee
    }

    fn pending(&self, title: &str) -> SessionResult<&Pending> {
        let key = title_key(title);
        self.todo
            .iter()
            .find(|p| title_key(&p.title) == key)
            .ok_or_else(|| SessionError::NotQueued(title.to_string()))
    }

    fn take(&mut self, title: &str) -> SessionResult<Pending> {
        let key = title_key(title);
        self.todo
            .iter()
            .position(|p| title_key(&p.title) == key)
            .and_then(|i| self.todo.remove(i))
            .ok_or_else(|| SessionError::NotQueued(title.to_string()))
    }

    /// Validate a candidate and either store it or send its title back.
    fn retrospective(&mut self, pending: Pending, passage: Passage) -> SessionResult<Outcome> {
        if let Some(reason) = passage.validity().reason() {
            warn!(title = %pending.title, %reason, "invalid passage, must try again");
            let title = pending.title.clone();
            self.todo.push_back(pending);
            return Ok(Outcome::Rejected { title, reason });
        }

        let passage = Passage::new(lower_case_links(passage.raw_text()));
        let links = self.links.links(passage.raw_text()).to_vec();

        let node = if let Some(tree) = self.tree.as_mut() {
            let parent = pending.parent.unwrap_or_else(|| tree.root());
            tree.attach(parent, passage.clone(), &self.policy)?
        } else {
            let tree = PassageTree::with_root(passage.clone(), &self.policy);
            let root = tree.root();
            self.tree = Some(tree);
            root
        };

        self.done.insert(title_key(&pending.title));
        self.passages.push(passage);
        for link in &links {
            let key = title_key(link);
            if self.done.contains(&key) || self.todo.iter().any(|p| title_key(&p.title) == key) {
                continue;
            }
            self.todo.push_back(Pending {
                title: link.clone(),
                parent: Some(node),
            });
        }

        info!(title = %pending.title, links = links.len(), "accepted passage");
        Ok(Outcome::Accepted {
            title: pending.title,
            node,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completer::CannedCompleter;
    use crate::error::CompletionError;
    use sp_context::{ContextConfig, NullExtractor};

    fn session() -> AuthoringSession<'static> {
        AuthoringSession::new(ContextPolicy::naive(), SessionConfig::default())
    }

    #[test]
    fn starts_with_the_start_title() {
        let s = session();
        assert_eq!(s.todo(), vec!["Start"]);
        assert!(s.tree().is_none());
        assert!(!s.is_complete());
    }

    #[test]
    fn written_passage_queues_its_links() {
        let mut s = session();
        let outcome = s.write("Start", "You wake. [[Look|The Garden]] or [[sleep]]").unwrap();
        assert_eq!(
            outcome,
            Outcome::Accepted {
                title: "Start".into(),
                node: NodeId(0),
                links: vec!["the garden".into(), "sleep".into()],
            }
        );
        assert_eq!(s.todo(), vec!["the garden", "sleep"]);
        assert_eq!(s.passages()[0].raw_text(), ":: Start\nYou wake. [[Look|the garden]] or [[sleep]]");
    }

    #[test]
    fn invalid_passage_is_requeued() {
        let mut s = session();
        let outcome = s.write("Start", "Broken [[link").unwrap();
        assert!(!outcome.is_accepted());
        assert_eq!(s.todo(), vec!["Start"]);
        assert!(s.passages().is_empty());
    }

    #[test]
    fn done_and_queued_titles_are_not_requeued() {
        let mut s = session();
        s.write("Start", "[[a]] [[b]]").unwrap();
        s.write("a", "[[b]] [[Start]] [[c]]").unwrap();
        assert_eq!(s.todo(), vec!["b", "c"]);
    }

    #[test]
    fn unknown_title_is_an_error() {
        let mut s = session();
        assert!(matches!(s.write("nowhere", "x"), Err(SessionError::NotQueued(_))));
    }

    #[test]
    fn prompt_carries_context_of_the_linking_node() {
        let extractor = NullExtractor;
        let policy = ContextPolicy::new(&extractor, ContextConfig::default());
        let mut s = AuthoringSession::new(policy, SessionConfig::default());

        assert_eq!(s.prompt_for("Start").unwrap(), "<|begin|>:: start<|start|>");
        s.write("Start", "[[The Docks]]").unwrap();
        assert_eq!(
            s.prompt_for("the docks").unwrap(),
            "<|begin|>Mentioned People: None. Mentioned Locations: None. Pronouns referenced: None.\
             <|title|>:: the docks<|start|>"
        );
    }

    #[test]
    fn generate_decodes_the_completion() {
        let mut s = session();
        let mut completer = CannedCompleter::new([" The sun rises.<newline>[[Walk|road]]<|end|>"]);
        let outcome = s.generate("Start", &mut completer).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(s.passages()[0].raw_text(), ":: Start\nThe sun rises.\n[[Walk|road]]");
        assert_eq!(completer.prompts(), ["<|begin|>:: start<|start|>"]);
        assert_eq!(s.todo(), vec!["road"]);
    }

    #[test]
    fn completer_failure_keeps_the_title() {
        let mut s = session();
        let mut completer = CannedCompleter::default();
        let err = s.generate("Start", &mut completer).unwrap_err();
        assert!(matches!(err, SessionError::Completion(CompletionError::Exhausted)));
        assert_eq!(s.todo(), vec!["Start"]);
    }

    #[test]
    fn bulk_generation_stops_at_the_cap() {
        let mut s = AuthoringSession::new(
            ContextPolicy::naive(),
            SessionConfig::default().with_max_generations(3),
        );
        let mut completer = CannedCompleter::new([
            " Go on. [[next one]] [[other one]]<|end|>",
            " Oops [[broken<|end|>",
        ]);
        let report = s.generate_remaining(&mut completer).unwrap();
        assert_eq!(report.generated, 3);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 1);
        assert!(report.capped);
        assert_eq!(s.passages().len(), 2);
        assert_eq!(s.passages()[1].title_line(), ":: other one");
        assert_eq!(s.todo(), vec!["next one"]);
    }

    #[test]
    fn bulk_generation_uses_the_popped_title() {
        let mut s = session();
        s.write("Start", "[[a]] [[b]]").unwrap();
        let mut completer = CannedCompleter::new([" End.<|end|>"]);
        let report = s.generate_remaining(&mut completer).unwrap();
        assert_eq!(report.generated, 2);
        assert!(!report.capped);
        let titles: Vec<String> = s.passages().iter().map(Passage::name).collect();
        assert_eq!(titles, vec!["Start", "a", "b"]);
        assert!(s.is_complete());
    }

    #[test]
    fn finish_fills_placeholders() {
        let mut s = AuthoringSession::new(
            ContextPolicy::naive(),
            SessionConfig::default().with_placeholder("Coming soon."),
        );
        s.write("Start", "[[a]] [[b]]").unwrap();
        assert_eq!(s.finish().unwrap(), 2);
        assert!(s.is_complete());
        assert_eq!(s.passages()[2].raw_text(), ":: b\nComing soon.");
        let tree = s.tree().unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children(tree.root()).len(), 2);
    }

    #[test]
    fn finish_rejects_unbalanced_placeholder() {
        let mut s = AuthoringSession::new(
            ContextPolicy::naive(),
            SessionConfig::default().with_placeholder("<<oops"),
        );
        assert!(matches!(s.finish(), Err(SessionError::InvalidPlaceholder(_))));
    }

    #[test]
    fn resume_walks_existing_passages_in_link_order() {
        let doc = TweeDocument::parse(
            ":: StoryTitle\nOld\n\n::b\nBee.\n\n::Start\n[[a]] [[b]] [[c]]\n\n::a\nAy. [[d]]\n\n::bad\n[[x",
        );
        let mut s = session();
        assert_eq!(s.resume(&doc).unwrap(), 3);
        let titles: Vec<String> = s.passages().iter().map(Passage::name).collect();
        assert_eq!(titles, vec!["Start", "a", "b"]);
        assert_eq!(s.todo(), vec!["c", "d"]);
    }

    #[test]
    fn resume_requires_a_start_passage() {
        let mut s = session();
        let doc = TweeDocument::parse(":: a\nx");
        assert!(matches!(s.resume(&doc), Err(SessionError::Document(_))));
    }

    #[test]
    fn custom_start_title_is_written_as_start() {
        let mut s = AuthoringSession::new(
            ContextPolicy::naive(),
            SessionConfig::default().with_start_title("Begin"),
        );
        assert_eq!(s.todo(), vec!["Begin"]);
        s.write("Begin", "Hello [[a]]").unwrap();
        s.write("a", "Bye.").unwrap();

        let twee = s.to_twee("Tale", "sam");
        assert!(twee.contains(":: Start\nHello [[a]]\n\n:: a\nBye."));
        let doc = TweeDocument::parse(twee);
        assert_eq!(doc.start().map(Passage::body).ok().as_deref(), Some("Hello [[a]]"));
    }

    #[test]
    fn to_twee_assembles_story() {
        let mut s = session();
        s.resume(&TweeDocument::parse("::start\nHello [[End]]\n::end\nBye.")).unwrap();
        assert_eq!(
            s.to_twee("Tale", "sam"),
            ":: StoryTitle\nTale\n\n:: StoryAuthor\nsam\n\n:: Start\nHello [[end]]\n\n::end\nBye.\n\n"
        );
    }
}

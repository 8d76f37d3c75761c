//! Integration tests for the sp-cli binary commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STORY: &str = r#":: StoryTitle
The Lighthouse

:: StoryAuthor
sam

:: Start
You wake on the shore. [[Climb the stairs|Tower]] or [[walk the beach|Beach]].

:: Tower
The lamp is dark. [[Beach]]

:: Beach
Waves break on the rocks. [[Cave]]
"#;

/// Create a temp directory holding `story.tw`.
fn story(source: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("story.tw"), source).unwrap();
    dir
}

fn spindle() -> Command {
    Command::cargo_bin("spindle").unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_story() {
    let dir = story(STORY);
    spindle()
        .args(["check", "story.tw"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"))
        .stderr(predicate::str::contains("passage Cave does not exist"));
}

#[test]
fn check_reports_unbalanced_brackets() {
    let dir = story(":: Start\nBroken [[link\n");
    spindle()
        .args(["check", "story.tw"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unbalanced brackets"))
        .stderr(predicate::str::contains("1 error(s)"));
}

#[test]
fn check_reports_missing_start() {
    let dir = story(":: cave\nDark.\n");
    spindle()
        .args(["check", "story.tw"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no start passage found"));
}

#[test]
fn check_missing_file() {
    spindle()
        .args(["check", "/nonexistent/story.tw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// links
// ---------------------------------------------------------------------------

#[test]
fn links_lists_passages_and_unresolved() {
    let dir = story(STORY);
    spindle()
        .args(["links", "story.tw"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Tower, Beach"))
        .stdout(predicate::str::contains("3 passages"))
        .stdout(predicate::str::contains("Beach -> Cave"));
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

#[test]
fn tree_ascii() {
    let dir = story(STORY);
    spindle()
        .args(["tree", "story.tw"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Start\n"))
        .stdout(predicate::str::contains("Tower"))
        .stdout(predicate::str::contains("3 passages, 1 unresolved link(s)"));
}

#[test]
fn tree_dot() {
    let dir = story(STORY);
    spindle()
        .args(["tree", "story.tw", "--format", "dot"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph passages {"))
        .stdout(predicate::str::contains("[label=\"Cave\", style=dashed]"));
}

#[test]
fn tree_json() {
    let dir = story(STORY);
    let output = spindle()
        .args(["tree", "story.tw", "-f", "json", "--policy", "naive"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(json["unresolved"][0]["link"], "Cave");
}

#[test]
fn tree_unknown_format() {
    let dir = story(STORY);
    spindle()
        .args(["tree", "story.tw", "--format", "svg"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format: svg"));
}

#[test]
fn tree_unknown_policy() {
    let dir = story(STORY);
    spindle()
        .args(["tree", "story.tw", "--policy", "v9"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown context policy: v9"));
}

#[test]
fn tree_without_start_fails() {
    let dir = story(":: cave\nDark.\n");
    spindle()
        .args(["tree", "story.tw"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no start passage found"));
}

// ---------------------------------------------------------------------------
// prompt / dataset / decode
// ---------------------------------------------------------------------------

#[test]
fn prompt_for_start_has_no_context() {
    let dir = story(STORY);
    spindle()
        .args(["prompt", "story.tw", "--title", "Start", "--completion"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("<|begin|>:: start<|start|>"))
        .stdout(predicate::str::contains(
            " You wake on the shore. [[Climb the stairs|Tower]] or [[walk the beach|Beach]].<|end|>",
        ));
}

#[test]
fn prompt_carries_entity_context() {
    let dir = story(STORY);
    spindle()
        .args(["prompt", "story.tw", "-t", "tower", "-p", "entities"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<|begin|>Mentioned People: None. Mentioned Locations: None. \
             Pronouns referenced: None.<|title|>:: tower<|start|>",
        ));
}

#[test]
fn prompt_uses_recorded_extractions() {
    let dir = story(STORY);
    fs::write(
        dir.path().join("ner.json"),
        r#"{
  "You wake on the shore. Climb the stairs or walk the beach.": {
    "entities": [{"entity": "B-LOC", "word": "shore"}],
    "pronouns": ["You"]
  }
}"#,
    )
    .unwrap();
    spindle()
        .args(["prompt", "story.tw", "-t", "Tower", "-e", "ner.json"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Mentioned Locations: shore."))
        .stdout(predicate::str::contains("Pronouns referenced: you."));
}

#[test]
fn prompt_for_unreachable_passage() {
    let dir = story(STORY);
    spindle()
        .args(["prompt", "story.tw", "--title", "Cave"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not reachable"));
}

#[test]
fn dataset_to_file() {
    let dir = story(STORY);
    let out = dir.path().join("train.jsonl");
    spindle()
        .args(["dataset", "story.tw", "-p", "naive", "-o", out.to_str().unwrap()])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 examples"));

    let content = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["prompt"], "<|begin|>:: start<|start|>");
}

#[test]
fn decode_prompt_and_completion() {
    spindle()
        .args([
            "decode",
            "--prompt",
            "<|begin|>Mentioned People: None.<|title|>:: cave<|start|>",
            "--completion",
            " Dark.<newline>[[Start]]<|end|>",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff(":: cave\nDark.\n[[Start]]\n"));
}

// ---------------------------------------------------------------------------
// finish / generate
// ---------------------------------------------------------------------------

#[test]
fn finish_fills_missing_passages() {
    let dir = story(STORY);
    spindle()
        .args(["finish", "story.tw"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            ":: StoryTitle\nThe Lighthouse\n\n:: StoryAuthor\nsam\n\n:: Start\n",
        ))
        .stdout(predicate::str::contains(":: cave\nTo be continued."))
        .stderr(predicate::str::contains("Kept 3 passages, wrote 1 placeholder(s)"));
}

#[test]
fn finish_to_file_with_custom_placeholder() {
    let dir = story(STORY);
    let out = dir.path().join("done.tw");
    spindle()
        .args([
            "finish",
            "story.tw",
            "--placeholder",
            "Coming soon.",
            "--author",
            "kim",
            "-o",
            out.to_str().unwrap(),
        ])
        .current_dir(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote story to"));

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.contains(":: StoryAuthor\nkim"));
    assert!(content.contains(":: cave\nComing soon."));
}

#[test]
fn finish_rejects_unbalanced_placeholder() {
    let dir = story(STORY);
    spindle()
        .args(["finish", "story.tw", "--placeholder", "<<oops"])
        .current_dir(dir.path())
        .assert()
        .failure();
}

#[test]
fn generate_from_recorded_completions() {
    let dir = story(STORY);
    fs::write(
        dir.path().join("completions.json"),
        r#"[" The cave is cold.<newline>[[Start]]<|end|>"]"#,
    )
    .unwrap();
    spindle()
        .args(["generate", "story.tw", "-c", "completions.json"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(":: cave\nThe cave is cold.\n[[start]]"))
        .stderr(predicate::str::contains("generated 1 (1 accepted, 0 rejected)"));
}

#[test]
fn generate_stops_at_the_cap() {
    let dir = story(":: Start\n[[a]] [[b]] [[c]]\n");
    fs::write(
        dir.path().join("completions.jsonl"),
        "{\"prompt\": \"\", \"completion\": \" Filler.<|end|>\"}\n",
    )
    .unwrap();
    spindle()
        .args(["generate", "story.tw", "-c", "completions.jsonl", "--max", "2"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(":: a\nFiller."))
        .stdout(predicate::str::contains(":: b\nFiller."))
        .stderr(predicate::str::contains("still to write: c"));
}

#[test]
fn generate_without_completions_fails() {
    let dir = story(STORY);
    fs::write(dir.path().join("empty.json"), "[]").unwrap();
    spindle()
        .args(["generate", "story.tw", "-c", "empty.json"])
        .current_dir(dir.path())
        .assert()
        .failure();
}

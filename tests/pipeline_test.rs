//! Integration tests for the response-to-files pipeline
//!
//! These drive the public library API with a scripted generator and round
//! control, so no network access or API key is needed.

use std::collections::VecDeque;
use std::fs;

use accrete::contexts::{
    GenerationSession, Materializer, ResponseReport, RoundControl, RoundDecision, StopReason,
    apply_response,
};
use accrete::data::{ConversationTurn, GenerationConfig, GenerationError, Generator, Role};
use accrete::extract::{extract_code_blocks, extract_directories};

const SCENARIO: &str = "\
Here is the plan.

Project structure:
src/
src/app.py

src/app.py
```python
import sys
def main():
    print(sys.argv)
```
";

struct ScriptedGenerator {
    replies: VecDeque<Result<String, GenerationError>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: replies.into(),
        }
    }
}

impl Generator for ScriptedGenerator {
    fn generate(
        &mut self,
        _transcript: &[ConversationTurn],
        _config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Api("no more replies".to_string())))
    }
}

/// Continues a fixed number of times, then stops
struct ContinueTimes {
    remaining: usize,
    prompts: Vec<String>,
    reports: Vec<ResponseReport>,
}

impl ContinueTimes {
    fn new(remaining: usize) -> Self {
        Self {
            remaining,
            prompts: Vec::new(),
            reports: Vec::new(),
        }
    }
}

impl RoundControl for ContinueTimes {
    fn next_round(&mut self, _round: usize, proposed_prompt: &str) -> RoundDecision {
        self.prompts.push(proposed_prompt.to_string());
        if self.remaining == 0 {
            return RoundDecision::Stop;
        }
        self.remaining -= 1;
        RoundDecision::Continue
    }

    fn retry(&mut self, _round: usize, _error: &GenerationError, _attempt: usize) -> bool {
        false
    }

    fn round_finished(&mut self, _round: usize, report: &ResponseReport) {
        self.reports.push(report.clone());
    }
}

#[test]
fn structure_and_code_block_are_materialized() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("project");
    let mut materializer = Materializer::new(&root);
    materializer.prepare().unwrap();

    let report = apply_response(&mut materializer, SCENARIO);

    assert!(root.join("src").is_dir());
    assert_eq!(
        fs::read_to_string(root.join("src/app.py")).unwrap(),
        "import sys\ndef main():\n    print(sys.argv)\n"
    );
    assert_eq!(materializer.registry().len(), 1);
    assert!(materializer.registry().contains("src/app.py"));
    assert_eq!(report.files_written, 1);
    assert_eq!(report.messages.first().unwrap(), "Created directory: src/");
}

#[test]
fn reapplying_the_same_response_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut materializer = Materializer::new(dir.path());

    let first = apply_response(&mut materializer, SCENARIO);
    let second = apply_response(&mut materializer, SCENARIO);

    assert_eq!(first.files_written, 1);
    assert_eq!(second.files_written, 0);
    assert_eq!(second.files_unchanged, 1);
    assert!(
        second
            .messages
            .contains(&"File src/app.py already exists with same content, skipping.".to_string())
    );
}

#[test]
fn structure_candidates_never_name_bare_files() {
    let text = "File structure:\nREADME.md\nsrc/\n  main.rs\ndocs\n\nDone.";
    for candidate in extract_directories(text) {
        let bare_file = !candidate.contains('/') && candidate.contains('.');
        assert!(!bare_file, "unexpected candidate {}", candidate);
    }
}

#[test]
fn blocks_keep_source_order_and_default_names() {
    let text = "\
```python
print(1)
```
```javascript
console.log(2)
```
```rust
fn main() {}
```
";
    let paths: Vec<String> = extract_code_blocks(text)
        .into_iter()
        .map(|block| block.file_path)
        .collect();
    assert_eq!(paths, vec!["default.py", "default.js", "default.rust"]);
}

#[test]
fn absolute_paths_collapse_inside_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut materializer = Materializer::new(dir.path());

    let text = "File: /etc/passwd\n```\nroot:x:0:0\n```\n";
    apply_response(&mut materializer, text);

    assert!(dir.path().join("passwd").is_file());
    assert!(materializer.registry().contains("passwd"));
}

#[test]
fn session_grows_project_across_rounds() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("project");
    let generator = ScriptedGenerator::new(vec![
        Ok(SCENARIO.to_string()),
        Ok("tests/test_app.py\n```python\nassert True\n```\n".to_string()),
    ]);
    let mut session = GenerationSession::new(generator, GenerationConfig::default(), &root);
    session.materializer().prepare().unwrap();
    let mut control = ContinueTimes::new(1);

    let summary = session.run("Build a Python CLI", &mut control);

    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.files, 2);
    assert_eq!(summary.stop_reason, StopReason::Stopped);
    assert!(root.join("tests/test_app.py").is_file());

    // The second prompt describes what round one produced.
    assert!(control.prompts[0].contains("src/app.py: File created:"));
    assert_eq!(control.reports.len(), 2);

    let roles: Vec<Role> = session.transcript().iter().map(|turn| turn.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[test]
fn failed_round_ends_session_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::new(vec![
        Ok(SCENARIO.to_string()),
        Err(GenerationError::Authentication("bad key".to_string())),
    ]);
    let mut session = GenerationSession::new(generator, GenerationConfig::default(), dir.path());
    let mut control = ContinueTimes::new(5);

    let summary = session.run("Build a Python CLI", &mut control);

    assert_eq!(summary.rounds, 1);
    assert_eq!(summary.files, 1);
    assert!(matches!(
        summary.stop_reason,
        StopReason::GenerationFailed(GenerationError::Authentication(_))
    ));
    assert_eq!(session.transcript().len(), 2);
    assert!(dir.path().join("src/app.py").is_file());
}

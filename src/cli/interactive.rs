use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use accrete::contexts::{ResponseReport, RoundControl, RoundDecision};
use accrete::data::GenerationError;

use super::progress::ProgressIndicator;

const END_MARKER: &str = "END";

/// Round control driven by answers typed on a terminal.
///
/// With `auto_continue` every round continues with the proposed prompt and
/// failed rounds are never retried.
pub struct TerminalControl<R: BufRead> {
    input: R,
    auto_continue: bool,
    progress: ProgressIndicator,
}

impl TerminalControl<io::StdinLock<'static>> {
    pub fn stdin(auto_continue: bool) -> Self {
        Self::new(io::stdin().lock(), auto_continue)
    }
}

impl<R: BufRead> TerminalControl<R> {
    pub fn new(input: R, auto_continue: bool) -> Self {
        Self {
            input,
            auto_continue,
            progress: ProgressIndicator::new(),
        }
    }

    pub fn progress(&self) -> &ProgressIndicator {
        &self.progress
    }

    /// Returns `None` once the input is exhausted.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        print!("{}", question);
        io::stdout().flush()?;
        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim().to_string()))
    }
}

impl<R: BufRead> RoundControl for TerminalControl<R> {
    fn next_round(&mut self, round: usize, proposed_prompt: &str) -> RoundDecision {
        if self.auto_continue {
            self.progress.start_round(round);
            return RoundDecision::Continue;
        }

        println!("\nProposed prompt for round {}:\n{}", round, proposed_prompt);
        let answer = match self.ask("\nContinue with this prompt? (yes/no/modify): ") {
            Ok(Some(answer)) => answer.to_lowercase(),
            Ok(None) => return RoundDecision::Stop,
            Err(e) => {
                tracing::warn!("Failed to read answer, stopping: {}", e);
                return RoundDecision::Stop;
            }
        };

        let decision = match answer.as_str() {
            "no" => return RoundDecision::Stop,
            "modify" => match self.ask("\nEnter custom prompt: ") {
                Ok(Some(custom)) => RoundDecision::Replace(custom),
                Ok(None) => return RoundDecision::Stop,
                Err(e) => {
                    tracing::warn!("Failed to read custom prompt, stopping: {}", e);
                    return RoundDecision::Stop;
                }
            },
            _ => RoundDecision::Continue,
        };

        self.progress.start_round(round);
        decision
    }

    fn retry(&mut self, round: usize, error: &GenerationError, _attempt: usize) -> bool {
        eprintln!("\nError in generation round {}: {}", round, error);
        if self.auto_continue {
            return false;
        }
        matches!(
            self.ask("\nRetry this round? (yes/no): "),
            Ok(Some(answer)) if answer.eq_ignore_ascii_case("yes")
        )
    }

    fn round_finished(&mut self, round: usize, report: &ResponseReport) {
        self.progress.complete_round(round, report);
    }
}

/// Reads the initial prompt from `prompt_file`, or from stdin until a line
/// reading `END`.
pub fn read_initial_prompt(prompt_file: Option<&Path>) -> Result<String> {
    if let Some(path) = prompt_file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()));
    }

    println!("\nPlease enter your initial prompt describing the code project:");
    println!("(Type '{}' on a new line when finished)", END_MARKER);
    read_until_end(io::stdin().lock()).context("Failed to read initial prompt")
}

fn read_until_end(input: impl BufRead) -> io::Result<String> {
    let mut prompt = String::new();
    for line in input.lines() {
        let line = line?;
        if line.trim() == END_MARKER {
            break;
        }
        prompt.push_str(&line);
        prompt.push('\n');
    }
    Ok(prompt)
}

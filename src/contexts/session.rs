use std::path::PathBuf;

use super::continuation::ContinuationTemplate;
use super::materializer::Materializer;
use crate::data::{ConversationTurn, FileRegistry, GenerationConfig, GenerationError, Generator};
use crate::extract::{CodeBlockExtractor, extract_directories};

pub const DEFAULT_MAX_RETRIES: usize = 3;

/// What the caller wants to happen before the next round starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundDecision {
    /// Send the proposed continuation prompt
    Continue,
    /// Send this prompt instead
    Replace(String),
    Stop,
}

/// Caller-side decisions taken between and within rounds.
///
/// The session never retries or continues on its own; every step past the
/// first round goes through this trait.
pub trait RoundControl {
    /// Called before every round after the first with the prompt the session would send.
    fn next_round(&mut self, round: usize, proposed_prompt: &str) -> RoundDecision;

    /// Called after a failed generation attempt. `attempt` is the retry about to be made.
    fn retry(&mut self, round: usize, error: &GenerationError, attempt: usize) -> bool;

    /// Called once a round's response has been materialized.
    fn round_finished(&mut self, _round: usize, _report: &ResponseReport) {}
}

/// What happened while materializing one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseReport {
    /// One human-readable line per directory or file operation, in order
    pub messages: Vec<String>,
    pub files_written: usize,
    pub files_unchanged: usize,
    pub files_failed: usize,
}

/// Why the session stopped
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The caller declined to start another round
    Stopped,
    /// The configured maximum number of rounds was reached
    RoundLimit,
    /// Generation kept failing and retries were declined or exhausted
    GenerationFailed(GenerationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub rounds: usize,
    pub files: usize,
    pub stop_reason: StopReason,
}

/// Materializes one response: the structure section's directories first,
/// then every code block in source order.
pub fn apply_response(materializer: &mut Materializer, response: &str) -> ResponseReport {
    let mut report = ResponseReport::default();

    let directories = extract_directories(response);
    if !directories.is_empty() {
        report
            .messages
            .extend(materializer.create_directories(&directories));
    }

    for block in CodeBlockExtractor::new(response) {
        match materializer.write_file(&block.file_path, &block.content) {
            Ok(outcome) => {
                if outcome.is_written() {
                    report.files_written += 1;
                } else {
                    report.files_unchanged += 1;
                }
                report.messages.push(outcome.to_string());
            }
            Err(e) => {
                tracing::warn!("{}", e);
                report.files_failed += 1;
                report.messages.push(e.to_string());
            }
        }
    }

    report
}

/// Generation session context: owns the transcript, the materializer and its
/// file registry for one run, and sequences rounds against a generator.
///
/// Rounds run strictly one after another; a round's files are all written
/// before the next prompt is built.
pub struct GenerationSession<G: Generator> {
    generator: G,
    config: GenerationConfig,
    materializer: Materializer,
    transcript: Vec<ConversationTurn>,
    template: ContinuationTemplate,
    /// Completed rounds
    rounds: usize,
    max_retries: usize,
    max_rounds: Option<usize>,
}

impl<G: Generator> GenerationSession<G> {
    pub fn new(generator: G, config: GenerationConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            config,
            materializer: Materializer::new(output_dir),
            transcript: Vec::new(),
            template: ContinuationTemplate::default(),
            rounds: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            max_rounds: None,
        }
    }

    pub fn with_template(mut self, template: ContinuationTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    pub fn registry(&self) -> &FileRegistry {
        self.materializer.registry()
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    /// Number of completed rounds
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Creates directories from the structure section, then writes every code
    /// block in source order.
    pub fn process_response(&mut self, response: &str) -> ResponseReport {
        apply_response(&mut self.materializer, response)
    }

    /// The prompt proposed for the next round, built from the registry.
    pub fn next_prompt(&self) -> String {
        self.template
            .render(self.materializer.registry(), self.rounds + 1)
    }

    /// Runs one round with `prompt`, retrying failed generation while the
    /// control agrees and retries remain.
    ///
    /// The user turn is only added to the transcript together with the reply.
    pub fn run_round(
        &mut self,
        prompt: String,
        control: &mut impl RoundControl,
    ) -> Result<ResponseReport, GenerationError> {
        let round = self.rounds + 1;
        let mut request = self.transcript.clone();
        request.push(ConversationTurn::user(prompt));

        tracing::info!("Starting generation round {}", round);
        let mut attempt = 1;
        let response = loop {
            match self.generator.generate(&request, &self.config) {
                Ok(text) => break text,
                Err(e) => {
                    tracing::warn!("Generation failed in round {} ({}): {}", round, attempt, e);
                    if attempt > self.max_retries || !control.retry(round, &e, attempt) {
                        return Err(e);
                    }
                    attempt += 1;
                }
            }
        };

        let report = self.process_response(&response);

        self.transcript.extend(request.pop());
        self.transcript.push(ConversationTurn::assistant(response));
        self.rounds = round;

        control.round_finished(round, &report);
        Ok(report)
    }

    /// Runs rounds until the control stops, the round limit is hit, or
    /// generation fails for good. The first round always runs.
    pub fn run(&mut self, initial_prompt: &str, control: &mut impl RoundControl) -> SessionSummary {
        let mut prompt = initial_prompt.to_string();

        let stop_reason = loop {
            if let Err(e) = self.run_round(prompt, control) {
                break StopReason::GenerationFailed(e);
            }

            if self.max_rounds.is_some_and(|max| self.rounds >= max) {
                break StopReason::RoundLimit;
            }

            let proposed = self.next_prompt();
            prompt = match control.next_round(self.rounds + 1, &proposed) {
                RoundDecision::Continue => proposed,
                RoundDecision::Replace(custom) => custom,
                RoundDecision::Stop => break StopReason::Stopped,
            };
        };

        tracing::info!("Session ended after {} round(s): {:?}", self.rounds, stop_reason);
        SessionSummary {
            rounds: self.rounds,
            files: self.materializer.registry().len(),
            stop_reason,
        }
    }
}

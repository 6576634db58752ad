use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

mod interactive;
mod progress;

use accrete::contexts::{
    ContinuationTemplate, DEFAULT_MAX_RETRIES, GenerationSession, Materializer, PromptRegistry,
    apply_response,
};
use accrete::data::{ConversationTurn, GenerationConfig, Generator};
use accrete::generators::{AnthropicGenerator, CachedGenerator};
use accrete::registries::FilePromptRegistry;
use interactive::{TerminalControl, read_initial_prompt};

pub const DEFAULT_OUTPUT_DIR: &str = "generated_project";
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

#[derive(Clone, Copy)]
pub struct Config {
    pub verbose: bool,
}

/// Everything `generate` takes from the command line
pub struct GenerateOptions {
    pub api_key: Option<String>,
    pub generation: GenerationConfig,
    pub output_dir: PathBuf,
    pub prompt_file: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub max_retries: Option<usize>,
    pub max_rounds: Option<usize>,
    pub auto_continue: bool,
    pub cache: bool,
    pub transcript: Option<PathBuf>,
}

pub fn generate(options: GenerateOptions, config: &Config) -> Result<()> {
    let api_key = resolve_api_key(options.api_key.clone())?;

    let template = match &options.template {
        Some(path) => FilePromptRegistry::new(path)
            .continuation_template()
            .with_context(|| format!("Failed to load template {}", path.display()))?,
        None => ContinuationTemplate::default(),
    };

    let initial_prompt = read_initial_prompt(options.prompt_file.as_deref())?;
    if initial_prompt.trim().is_empty() {
        bail!("Initial prompt is empty");
    }

    if config.verbose {
        println!(
            "Using model {} (max_tokens={}, temperature={})",
            options.generation.model, options.generation.max_tokens, options.generation.temperature
        );
    }

    let generator = AnthropicGenerator::new(api_key)?;
    let mut control = TerminalControl::stdin(options.auto_continue);

    if options.cache {
        let generator = CachedGenerator::new(generator, None);
        run_session(generator, template, &options, &initial_prompt, &mut control)
    } else {
        run_session(generator, template, &options, &initial_prompt, &mut control)
    }
}

fn run_session<G: Generator, R: std::io::BufRead>(
    generator: G,
    template: ContinuationTemplate,
    options: &GenerateOptions,
    initial_prompt: &str,
    control: &mut TerminalControl<R>,
) -> Result<()> {
    let mut session = GenerationSession::new(
        generator,
        options.generation.clone(),
        &options.output_dir,
    )
    .with_template(template)
    .with_max_retries(options.max_retries.unwrap_or(DEFAULT_MAX_RETRIES))
    .with_max_rounds(options.max_rounds);

    prepare_output_dir(session.materializer())?;

    control.progress().start_round(1);
    let summary = session.run(initial_prompt, control);
    control.progress().finish(&summary, &options.output_dir);

    if let Some(path) = &options.transcript {
        write_transcript(path, session.transcript())?;
        println!("Transcript saved to: {}", path.display());
    }

    Ok(())
}

/// Materializes a saved response under `output_dir` without calling the API.
pub fn apply(response_file: &Path, output_dir: &Path, config: &Config) -> Result<()> {
    let response = fs::read_to_string(response_file)
        .with_context(|| format!("Failed to read response file: {}", response_file.display()))?;

    let mut materializer = Materializer::new(output_dir);
    prepare_output_dir(&materializer)?;

    let report = apply_response(&mut materializer, &response);
    for message in &report.messages {
        println!("  {}", message);
    }

    println!(
        "\nWrote {} file(s), {} unchanged, {} failed.",
        report.files_written, report.files_unchanged, report.files_failed
    );
    if !materializer.registry().is_empty() {
        println!("\nFile registry:\n{}", materializer.registry().render());
    }
    if config.verbose {
        println!("Files are available in: {}", output_dir.display());
    }

    if report.files_failed > 0 {
        bail!("{} file(s) could not be written", report.files_failed);
    }
    Ok(())
}

fn resolve_api_key(flag: Option<String>) -> Result<String> {
    if let Some(key) = flag.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }
    match env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!(
            "No API key given. Pass --api-key or set {} in the environment or a .env file",
            API_KEY_VAR
        ),
    }
}

fn prepare_output_dir(materializer: &Materializer) -> Result<()> {
    let root = materializer.root();
    let created = materializer
        .prepare()
        .with_context(|| format!("Failed to create output directory {}", root.display()))?;
    if created {
        println!("Created output directory: {}", root.display());
    } else {
        println!("Using existing output directory: {}", root.display());
    }
    Ok(())
}

fn write_transcript(path: &Path, transcript: &[ConversationTurn]) -> Result<()> {
    let json = serde_json::to_string_pretty(transcript).context("Failed to serialize transcript")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write transcript {}", path.display()))
}

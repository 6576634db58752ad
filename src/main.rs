use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use accrete::data::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationConfig};

mod cli;

#[derive(Parser)]
#[command(name = "accrete")]
#[command(about = "Grows a code project round by round from model responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run an interactive generation session against the API")]
    Generate {
        #[arg(long, help = "API key (defaults to ANTHROPIC_API_KEY)")]
        api_key: Option<String>,

        #[arg(long, default_value = DEFAULT_MODEL, help = "Model to request")]
        model: String,

        #[arg(long, default_value = cli::DEFAULT_OUTPUT_DIR, help = "Directory to write files into")]
        output_dir: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS, help = "Maximum tokens per response")]
        max_tokens: u32,

        #[arg(long, default_value_t = DEFAULT_TEMPERATURE, help = "Sampling temperature")]
        temperature: f32,

        #[arg(long, help = "Read the initial prompt from this file instead of stdin")]
        prompt_file: Option<PathBuf>,

        #[arg(long, help = "YAML file with a continuation_prompt template")]
        template: Option<PathBuf>,

        #[arg(long, help = "Maximum retries per round after a failed request")]
        max_retries: Option<usize>,

        #[arg(long, help = "Stop after this many rounds")]
        max_rounds: Option<usize>,

        #[arg(long, short = 'y', help = "Continue every round without asking")]
        yes: bool,

        #[arg(long, help = "Replay identical requests from the on-disk response cache")]
        cache: bool,

        #[arg(long, help = "Write the conversation transcript as JSON to this path")]
        transcript: Option<PathBuf>,
    },

    #[command(about = "Materialize a saved response without calling the API")]
    Apply {
        #[arg(help = "File containing a model response")]
        response_file: PathBuf,

        #[arg(long, default_value = cli::DEFAULT_OUTPUT_DIR, help = "Directory to write files into")]
        output_dir: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "accrete=debug" } else { "accrete=warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli::Config {
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Generate {
            api_key,
            model,
            output_dir,
            max_tokens,
            temperature,
            prompt_file,
            template,
            max_retries,
            max_rounds,
            yes,
            cache,
            transcript,
        } => {
            let options = cli::GenerateOptions {
                api_key,
                generation: GenerationConfig {
                    model,
                    max_tokens,
                    temperature,
                },
                output_dir,
                prompt_file,
                template,
                max_retries,
                max_rounds,
                auto_continue: yes,
                cache,
                transcript,
            };
            cli::generate(options, &config)?;
        }
        Commands::Apply {
            response_file,
            output_dir,
        } => {
            cli::apply(&response_file, &output_dir, &config)?;
        }
    }

    Ok(())
}

//! The `attractor` binary: runs a two-model conversation and reports on it.

use attractor_agent::{ConversationConfig, ConversationDriver, LlmClient, ModelConfig};
use attractor_analysis::{analyze, ThemeCatalog};
use attractor_session::{
    read_transcript, FileTranscriptStore, Transcript, TranscriptStore, TurnRecord,
};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const RULE_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "attractor", about = "Attractor: two-model conversation experiment")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "attractor.toml")]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a conversation and save its transcript
    Run {
        /// Turn budget, opener included (overrides config)
        #[arg(long)]
        max_turns: Option<u32>,
        /// Model identifier (overrides config)
        #[arg(long)]
        model: Option<String>,
        /// API key (overrides the environment)
        #[arg(long)]
        api_key: Option<String>,
        /// Transcript path (defaults to a timestamped file in output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip the thematic analysis after the run
        #[arg(long)]
        no_analysis: bool,
    },
    /// Analyze a saved transcript
    Analyze {
        /// Transcript JSON file
        transcript: PathBuf,
    },
}

#[derive(Deserialize)]
struct AttractorConfig {
    model: ModelConfig,
    conversation: ConversationConfig,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default)]
    analysis: AnalysisConfig,
}

/// The part of the config file `analyze` needs; other tables are ignored.
#[derive(Deserialize, Default)]
struct AnalyzeConfig {
    #[serde(default)]
    analysis: AnalysisConfig,
}

#[derive(Deserialize, Default)]
struct AnalysisConfig {
    #[serde(default)]
    categories: ThemeCatalog,
}

fn default_api_key_env() -> String {
    "XAI_API_KEY".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Command-line key first, then the environment, then the config file.
fn resolve_api_key(
    from_cli: Option<String>,
    from_env: Option<String>,
    from_file: &str,
) -> Option<String> {
    let present = |k: &String| !k.trim().is_empty();
    from_cli
        .filter(present)
        .or_else(|| from_env.filter(present))
        .or_else(|| Some(from_file.to_string()).filter(present))
}

fn print_turn(record: &TurnRecord) {
    println!("\n[Instance {} - Turn {}]", record.speaker, record.turn_index);
    println!("{}", record.text);
    println!("{}", "-".repeat(RULE_WIDTH));
}

fn print_analysis(transcript: &Transcript, catalog: &ThemeCatalog) {
    println!("\n{}", "=".repeat(RULE_WIDTH));
    println!("CONVERSATION ANALYSIS");
    println!("{}", "=".repeat(RULE_WIDTH));
    print!("{}", analyze(transcript, catalog));
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn load_config<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let config_str = tokio::fs::read_to_string(path).await.map_err(|e| {
        anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
    })?;
    Ok(toml::from_str(&config_str)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the key may already be in the environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Run {
            max_turns,
            model,
            api_key,
            output,
            no_analysis,
        } => {
            let AttractorConfig {
                model: mut model_config,
                conversation: mut conversation_config,
                api_key_env,
                output_dir,
                analysis,
            } = load_config(&cli.config).await?;

            model_config.api_key = resolve_api_key(
                api_key,
                std::env::var(&api_key_env).ok(),
                &model_config.api_key,
            )
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{api_key_env} not found. Set it in the environment, in a .env file, \
                     or pass --api-key"
                )
            })?;
            if let Some(model) = model {
                model_config.model_id = model;
            }
            if let Some(max_turns) = max_turns {
                conversation_config.max_turns = max_turns;
            }

            let mut store = FileTranscriptStore::new(output_dir.clone()).await?;
            if let Some(output) = output {
                store = store.with_output_path(output);
            }

            println!("Starting conversation experiment...");
            println!("Model: {}", model_config.model_id);
            println!("Max turns: {}", conversation_config.max_turns);
            println!("Output directory: {}", output_dir.display());
            println!("{}", "=".repeat(RULE_WIDTH));

            let client = LlmClient::new(model_config)?;
            let mut driver = ConversationDriver::initialize(client, conversation_config)?
                .on_turn(Box::new(print_turn));

            let transcript = match driver.run().await {
                Ok(transcript) => transcript,
                Err(e) => {
                    println!("\nError at turn {}: {e}", driver.transcript().next_index());
                    let mut partial = driver.into_transcript();
                    partial.mark_failed(&e);
                    match store.finalize(&partial).await {
                        Ok(path) => warn!(path = %path.display(), "Partial transcript saved"),
                        Err(pe) => error!(error = %pe, "Partial transcript could not be saved"),
                    }
                    let phase = e.phase();
                    return Err(anyhow::Error::new(e).context(format!("run failed during {phase}")));
                }
            };

            let path = match store.finalize(&transcript).await {
                Ok(path) => path,
                Err(e) => {
                    // Keep the conversation: dump it where the operator can see it.
                    error!(error = %e, "Transcript could not be saved, writing it to stdout");
                    println!("{}", serde_json::to_string_pretty(&transcript)?);
                    return Err(anyhow::Error::new(e).context("run failed during persistence"));
                }
            };

            println!("{}", "=".repeat(RULE_WIDTH));
            println!("\nExperiment complete!");
            println!("Total turns: {}", transcript.len());
            println!("Conversation saved to: {}", path.display());
            info!(run_id = %transcript.metadata.run_id, "Run complete");

            if !no_analysis {
                print_analysis(&transcript, &analysis.categories);
            }
        }
        Commands::Analyze { transcript } => {
            let config: AnalyzeConfig = if cli.config.exists() {
                load_config(&cli.config).await?
            } else {
                warn!(path = %cli.config.display(), "No config file, analyzing without categories");
                AnalyzeConfig::default()
            };
            let loaded = read_transcript(&transcript).await?;
            print_analysis(&loaded, &config.analysis.categories);
        }
    }

    Ok(())
}

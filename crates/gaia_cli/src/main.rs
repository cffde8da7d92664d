use std::path::PathBuf;

use clap::Parser;
use gaia_core::Settings;
use gaia_inference::models::AVAILABLE_BACKENDS;
use gaia_inference::{create_backend, GenerationClient};
use gaia_pipeline::{handle_command, init_logging, PipelineCommands, PipelineContext};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Batch article generator for an affiliate blog", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "gemini", help = "Generation backend. Available backends: gemini (default), dummy")]
    model: String,
    /// Directory the site is published to (overrides GAIA_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Topic pool file, one topic per line
    #[arg(long, global = true, default_value = "config/topics.txt")]
    topics: PathBuf,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: PipelineCommands,
}

fn build_context(cli: &Cli, mut settings: Settings) -> anyhow::Result<PipelineContext> {
    if let Some(dir) = &cli.output_dir {
        settings.site.output_dir = dir.clone();
    }

    // Index maintenance works offline, so it never needs credentials.
    let model = if cli.command.needs_backend() { cli.model.as_str() } else { "dummy" };
    let backend = create_backend(model, &settings.generation)?;
    info!(
        "🧠 Generation backend initialized (using {}, available: {})",
        backend.name(),
        AVAILABLE_BACKENDS.join(", ")
    );

    Ok(PipelineContext {
        client: GenerationClient::new(backend, &settings.generation),
        settings,
        topics_file: cli.topics.clone(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::from_env()?;
    let ctx = build_context(&cli, settings)?;
    info!("📂 Publishing to {}", ctx.settings.site.output_dir.display());

    handle_command(cli.command, &ctx).await?;
    Ok(())
}

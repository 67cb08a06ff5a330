use anyhow::Context;
use bp_core::PostStorage;
use bp_inference::{ModelConfig, PostGenerator, Provider};
use bp_scrapers::{handle_command, init_logging, HttpFetcher, JobRunner, Pipeline, PipelineArgs, ScraperCommands};
use bp_storage::StorageKind;
use bp_web::{create_app, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn new blog articles into short LinkedIn-style posts", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, default_value = "sqlite", help = "Storage backend: memory or sqlite")]
    storage: StorageKind,
    #[arg(long, global = true, env = "BP_DATABASE", default_value = "posts.db")]
    database: PathBuf,
    #[arg(long, global = true, default_value = "gemini", help = "Model provider: gemini (default), openai, ollama, dummy")]
    model: Provider,
    #[arg(long, global = true, help = "Override the provider's default model")]
    model_name: Option<String>,
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true, help = "Base URL of the model API")]
    model_url: Option<String>,
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,
    #[command(flatten)]
    pipeline: PipelineArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Scrape(ScraperCommands),
    /// Serve the JSON API
    Serve {
        #[arg(long, env = "BP_ADDR", default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

impl Cli {
    fn model_config(&self) -> ModelConfig {
        ModelConfig {
            provider: self.model,
            model_name: self.model_name.clone(),
            api_key: self
                .api_key
                .clone()
                .or_else(|| std::env::var("LLM_API_KEY").ok()),
            base_url: self.model_url.clone(),
        }
    }
}

impl Commands {
    fn needs_pipeline(&self) -> bool {
        match self {
            Commands::Scrape(command) => command.needs_pipeline(),
            Commands::Serve { .. } => true,
        }
    }
}

/// Model, fetcher and pipeline are only set up for commands that scrape.
async fn build_jobs(cli: &Cli, storage: &Arc<dyn PostStorage>) -> anyhow::Result<JobRunner> {
    let model = bp_inference::create_model(&cli.model_config())
        .await
        .context("initializing language model")?;
    info!("🧠 Language model initialized (using {})", model.name());

    let pipeline = Pipeline::new(
        Arc::new(HttpFetcher::new()?),
        PostGenerator::new(model),
        storage.clone(),
        cli.pipeline.clone().into(),
    )?;
    Ok(JobRunner::new(Arc::new(pipeline)))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let storage: Arc<dyn PostStorage> = bp_storage::create_storage(cli.storage, &cli.database)
        .await
        .with_context(|| format!("opening {} storage", cli.storage))?;
    info!("💾 Storage initialized (using {})", cli.storage);

    let jobs = if cli.command.needs_pipeline() {
        Some(build_jobs(&cli, &storage).await?)
    } else {
        None
    };

    match cli.command {
        Commands::Scrape(command) => handle_command(command, &storage, jobs.as_ref()).await?,
        Commands::Serve { addr } => {
            let jobs = jobs.context("serve needs a configured pipeline")?;
            let app = create_app(AppState::new(storage, jobs, HttpFetcher::new()?));
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;
            info!("🌐 Listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    run(cli).await
}

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use bp_core::{Error, Post, PostStorage, Result};
use clap::{Args, Subcommand};
use tracing::info;
use crate::extractor::DEFAULT_LIMIT;
use crate::jobs::JobRunner;
use crate::pipeline::{GenerationFailurePolicy, PipelineConfig, SOURCE_URL};

/// A duration written like `90`, `30m`, `1h15m30s` or `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let too_large = || "Duration too large".to_string();
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = current_number.parse::<u64>().map_err(|_| too_large())?;
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(too_large)?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing bare number counts as seconds
        if !current_number.is_empty() {
            let num = current_number.parse::<u64>().map_err(|_| too_large())?;
            total_seconds = total_seconds.checked_add(num).ok_or_else(too_large)?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be greater than zero".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Listing page to scrape
    #[arg(long, global = true, env = "BP_SOURCE_URL", default_value = SOURCE_URL)]
    pub source_url: String,
    /// Maximum number of articles taken from the listing per run
    #[arg(long, global = true, default_value_t = DEFAULT_LIMIT, value_parser = parse_limit)]
    pub limit: usize,
    /// What to do when the model fails on one article: abort the run or skip the article
    #[arg(long, global = true, default_value = "abort", value_parser = parse_policy)]
    pub on_generation_error: GenerationFailurePolicy,
}

fn parse_limit(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(limit) => Ok(limit),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_policy(s: &str) -> std::result::Result<GenerationFailurePolicy, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

impl From<PipelineArgs> for PipelineConfig {
    fn from(args: PipelineArgs) -> Self {
        Self {
            source_url: args.source_url,
            limit: args.limit,
            on_generation_error: args.on_generation_error,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Scrape the listing and generate posts for new articles
    Fetch {
        /// Keep running, one scrape per interval (e.g. 1h, 30m, 1h15m30s)
        #[arg(long)]
        every: Option<HumanDuration>,
    },
    /// List stored posts, most recent first
    List,
    /// Print a single stored post
    Show {
        id: i64,
    },
}

impl ScraperCommands {
    /// Only `fetch` talks to the listing page and the model; the rest read storage.
    pub fn needs_pipeline(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// `runner` may be `None` for commands where [`ScraperCommands::needs_pipeline`] is false.
pub async fn handle_command(
    command: ScraperCommands,
    storage: &Arc<dyn PostStorage>,
    runner: Option<&JobRunner>,
) -> Result<()> {
    let require_runner = || {
        runner.ok_or_else(|| Error::Config("fetch needs a configured model and source".to_string()))
    };

    match command {
        ScraperCommands::Fetch { every: None } => {
            let report = require_runner()?.run_now().await?;
            println!(
                "Created {} posts ({} already stored, {} failed)",
                report.created.len(),
                report.skipped.len(),
                report.failed.len()
            );
            for post in &report.created {
                println!("{}", summary_line(post));
            }
        }
        ScraperCommands::Fetch { every: Some(interval) } => {
            let runner = require_runner()?;
            info!("Running in periodic mode with {}s interval", interval.0.as_secs());
            loop {
                if let Err(e) = runner.run_now().await {
                    eprintln!("Error during scrape: {}", e);
                }
                info!("Waiting {}s before next scrape", interval.0.as_secs());
                tokio::time::sleep(interval.0).await;
            }
        }
        ScraperCommands::List => {
            let posts = storage.latest().await?;
            if posts.is_empty() {
                println!("No posts yet. Run `fetch` first.");
            }
            for post in &posts {
                println!("{}", summary_line(post));
            }
        }
        ScraperCommands::Show { id } => {
            let post = storage
                .get(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("post {}", id)))?;
            println!("{}", render_post(&post));
        }
    }
    Ok(())
}

pub fn summary_line(post: &Post) -> String {
    format!(
        "#{:<4} {}  {}  {}",
        post.id,
        post.created_at.format("%Y-%m-%d %H:%M"),
        post.title.as_deref().unwrap_or("(untitled)"),
        post.url
    )
}

pub fn render_post(post: &Post) -> String {
    let mut out = String::new();
    out.push_str(post.title.as_deref().unwrap_or("(untitled)"));
    out.push('\n');
    out.push_str(&post.url);
    out.push('\n');
    if let Some(image) = &post.image {
        out.push_str(&format!("Image: {}\n", image));
    }
    out.push('\n');
    out.push_str(&post.content);
    out
}

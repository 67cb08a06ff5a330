//! One scrape run: fetch the listing, pick out the newest articles, and turn
//! every article not seen before into a stored post.
//!
//! A run is strictly sequential. Candidates are processed in page order and
//! each one is checked against storage before the model is called, so a
//! stored url never costs a generation request.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use bp_core::{Error, NewPost, Post, PostStorage, Result};
use bp_inference::PostGenerator;
use serde::Serialize;
use tracing::{error, info, warn};
use crate::extractor::{ListingExtractor, DEFAULT_LIMIT};
use crate::fetcher::PageFetcher;

pub const SOURCE_URL: &str = "https://laravel-news.com/blog";

/// What to do with the rest of a run when the model fails on one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailurePolicy {
    /// Stop and return the error. Posts stored earlier in the run are kept.
    #[default]
    Abort,
    /// Log, leave the article unstored, and move on to the next one.
    Skip,
}

impl FromStr for GenerationFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(Error::Config(format!(
                "Unknown generation failure policy '{}'. Available: abort, skip",
                other
            ))),
        }
    }
}

impl fmt::Display for GenerationFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_url: String,
    pub limit: usize,
    pub on_generation_error: GenerationFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: SOURCE_URL.to_string(),
            limit: DEFAULT_LIMIT,
            on_generation_error: GenerationFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Qualifying articles found on the listing page
    pub candidates: usize,
    pub created: Vec<Post>,
    /// Urls that were already stored
    pub skipped: Vec<String>,
    /// Urls the model failed on (only with `GenerationFailurePolicy::Skip`)
    pub failed: Vec<String>,
}

pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    extractor: ListingExtractor,
    generator: PostGenerator,
    storage: Arc<dyn PostStorage>,
    config: PipelineConfig,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        generator: PostGenerator,
        storage: Arc<dyn PostStorage>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let extractor = ListingExtractor::new(&config.source_url, config.limit)?;
        Ok(Self {
            fetcher,
            extractor,
            generator,
            storage,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn PostStorage> {
        &self.storage
    }

    /// True when no stored post has this url.
    pub async fn is_new(&self, url: &str) -> Result<bool> {
        Ok(!self.storage.exists(url).await?)
    }

    pub async fn run(&self) -> Result<RunReport> {
        let source = &self.config.source_url;
        info!("🦗 Fetching listing from {}", source);

        let page = match self.fetcher.fetch(source).await {
            Ok(page) => page,
            Err(e) => {
                warn!("⚠️ Could not fetch listing {}: {}", source, e);
                return Err(e);
            }
        };

        let candidates = self.extractor.extract(&page.body);
        let mut report = RunReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            warn!("⚠️ No article rows found on {}; the page layout may have changed", source);
            return Ok(report);
        }
        info!("📰 Found {} candidate articles", candidates.len());

        for candidate in candidates {
            let url = candidate.url.clone();

            if !self.is_new(&url).await? {
                info!("⏭️ Already stored: {}", url);
                report.skipped.push(url);
                continue;
            }

            info!("🤖 Generating post for {} with {}", url, self.generator.model_name());
            let content = match self.generator.generate(&url).await {
                Ok(content) => content,
                Err(e) => match self.config.on_generation_error {
                    GenerationFailurePolicy::Abort => {
                        error!("❌ Generation failed for {}, aborting run: {}", url, e);
                        return Err(e);
                    }
                    GenerationFailurePolicy::Skip => {
                        error!("❌ Generation failed for {}, skipping: {}", url, e);
                        report.failed.push(url);
                        continue;
                    }
                },
            };

            match self.storage.create(NewPost::from_candidate(candidate, content)).await {
                Ok(post) => {
                    info!("💾 Stored post #{} for {}", post.id, post.url);
                    report.created.push(post);
                }
                Err(Error::DuplicateKey(url)) => {
                    warn!("⚠️ {} was stored by another run in the meantime; skipping", url);
                    report.skipped.push(url);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "✨ Run finished: {} created, {} already stored, {} failed",
            report.created.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

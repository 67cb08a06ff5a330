pub mod cli;
pub mod extractor;
pub mod fetcher;
pub mod jobs;
pub mod logging;
pub mod pipeline;

pub use cli::{handle_command, HumanDuration, PipelineArgs, ScraperCommands};
pub use extractor::ListingExtractor;
pub use fetcher::{FetchedAsset, FetchedPage, HttpFetcher, PageFetcher};
pub use jobs::{Dispatch, JobRunner, RunOutcome, RunStatus};
pub use logging::{init_logging, Logger};
pub use pipeline::{GenerationFailurePolicy, Pipeline, PipelineConfig, RunReport, SOURCE_URL};

pub mod prelude {
    pub use super::fetcher::PageFetcher;
    pub use super::jobs::JobRunner;
    pub use super::pipeline::{Pipeline, PipelineConfig};
    pub use bp_core::{Candidate, Error, Post, Result};
}

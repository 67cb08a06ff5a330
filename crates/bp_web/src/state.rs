use std::sync::Arc;
use bp_core::PostStorage;
use bp_scrapers::{HttpFetcher, JobRunner};

pub struct AppState {
    pub storage: Arc<dyn PostStorage>,
    pub jobs: JobRunner,
    /// Used by the image proxy; the pipeline has its own fetcher.
    pub fetcher: HttpFetcher,
}

impl AppState {
    pub fn new(storage: Arc<dyn PostStorage>, jobs: JobRunner, fetcher: HttpFetcher) -> Self {
        Self {
            storage,
            jobs,
            fetcher,
        }
    }
}

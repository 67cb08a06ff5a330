use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use bp_core::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use crate::logging::Logger;
use crate::pipeline::{Pipeline, RunReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        candidates: usize,
        created: usize,
        skipped: usize,
        failed: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub run: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
}

#[derive(Debug)]
pub enum Dispatch {
    Queued { run: u64, handle: JoinHandle<()> },
    AlreadyRunning,
}

/// Runs the pipeline in the background, one run at a time.
///
/// Triggers never wait for the run; its result is only visible through the
/// logs and [`JobRunner::last_status`].
#[derive(Clone)]
pub struct JobRunner {
    pipeline: Arc<Pipeline>,
    active: Arc<Mutex<()>>,
    last: Arc<RwLock<Option<RunStatus>>>,
    runs: Arc<AtomicU64>,
}

impl JobRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            active: Arc::new(Mutex::new(())),
            last: Arc::new(RwLock::new(None)),
            runs: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Start a run on the tokio runtime unless one is already in progress.
    pub fn dispatch(&self) -> Dispatch {
        let guard = match self.active.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!("⏳ A scrape run is already in progress; ignoring trigger");
                return Dispatch::AlreadyRunning;
            }
        };

        let run = self.next_run();
        let runner = self.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            // The outcome is recorded by execute; nobody awaits the result here.
            let _ = runner.execute(run).await;
        });

        Dispatch::Queued { run, handle }
    }

    /// Run in the foreground, waiting for any background run to finish first.
    pub async fn run_now(&self) -> Result<RunReport> {
        let _guard = self.active.lock().await;
        let run = self.next_run();
        self.execute(run).await
    }

    pub async fn last_status(&self) -> Option<RunStatus> {
        self.last.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.active.try_lock().is_err()
    }

    fn next_run(&self) -> u64 {
        self.runs.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn execute(&self, run: u64) -> Result<RunReport> {
        let logger = Logger::new().with_prefix(format!("[run #{}]", run));
        logger.info("🚀 Starting scrape run");
        let started_at = Utc::now();

        let result = self.pipeline.run().await;

        let outcome = match &result {
            Ok(report) => {
                logger.info(&format!(
                    "✅ Completed: {} new posts from {} candidates",
                    report.created.len(),
                    report.candidates
                ));
                RunOutcome::Completed {
                    candidates: report.candidates,
                    created: report.created.len(),
                    skipped: report.skipped.len(),
                    failed: report.failed.len(),
                }
            }
            Err(e) => {
                logger.error(&format!("❌ Failed: {}", e));
                RunOutcome::Failed { error: e.to_string() }
            }
        };

        *self.last.write().await = Some(RunStatus {
            run,
            started_at,
            finished_at: Utc::now(),
            outcome,
        });

        result
    }
}

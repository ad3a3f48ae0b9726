//! Concurrent fan-out over every configured source.
//!
//! Each source runs fetch, decode and projection in its own task. A failure
//! at any stage becomes that source's error entry; results are reported in
//! registry order once every task has finished.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::SourceError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::parse_feed;
use crate::records::{NormalizedRecord, project_feed};
use crate::registry::{Source, SourceRegistry};

/// Outcome for one source, serialized as `{"line", "data"}` or `{"line", "error"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    pub line: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOutcome {
    Data(Vec<NormalizedRecord>),
    Error(String),
}

impl SourceResult {
    pub fn data(line: &str, records: Vec<NormalizedRecord>) -> Self {
        Self {
            line: line.to_string(),
            outcome: SourceOutcome::Data(records),
        }
    }

    /// Error entry with the message clients see, whatever the failure class.
    pub fn failed(line: &str) -> Self {
        Self {
            line: line.to_string(),
            outcome: SourceOutcome::Error(format!("Failed to fetch data for {line}")),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Error(_))
    }

    pub fn records(&self) -> Option<&[NormalizedRecord]> {
        match &self.outcome {
            SourceOutcome::Data(records) => Some(records.as_slice()),
            SourceOutcome::Error(_) => None,
        }
    }
}

/// One result per configured source, in registry order.
pub type AggregateResponse = Vec<SourceResult>;

/// Runs the fetch, decode, project pipeline for one source.
pub async fn fetch_source<C: HttpClient + ?Sized>(
    client: &C,
    source: &Source,
) -> Result<Vec<NormalizedRecord>, SourceError> {
    info!("Fetching feed");
    debug!(url = %source.url, "Feed endpoint");

    let bytes = fetch_bytes(client, &source.url).await?;
    let feed = parse_feed(&bytes)?;
    debug!(entity_count = feed.entity.len(), "Feed parsed successfully");

    Ok(project_feed(&feed))
}

fn log_failure(err: &SourceError) {
    match err {
        SourceError::Protocol { status, body } => {
            error!(kind = err.kind(), status, body = %body, "Feed fetch failed");
        }
        SourceError::Network(e) => {
            error!(kind = err.kind(), error = %e, "Feed fetch failed, no response received");
        }
        _ => {
            error!(kind = err.kind(), error = %err, "Feed fetch failed");
        }
    }
}

/// Fans out over a [`SourceRegistry`] with a shared client.
#[derive(Clone)]
pub struct Aggregator {
    client: Arc<dyn HttpClient>,
    registry: Arc<SourceRegistry>,
    concurrency: usize,
}

impl Aggregator {
    /// Every source gets its own permit by default, i.e. full fan-out.
    pub fn new(client: Arc<dyn HttpClient>, registry: SourceRegistry) -> Self {
        let concurrency = registry.len().min(Semaphore::MAX_PERMITS);
        Self {
            client,
            registry: Arc::new(registry),
            concurrency,
        }
    }

    /// Caps the number of in-flight fetches. `0` keeps full fan-out.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        if concurrency > 0 {
            self.concurrency = concurrency.min(Semaphore::MAX_PERMITS);
        }
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Runs one aggregate cycle and waits for every source to finish.
    pub async fn run(&self) -> AggregateResponse {
        info!(sources = self.registry.len(), "Starting aggregate cycle");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(self.registry.len());

        for source in self.registry.iter() {
            let client = self.client.clone();
            let sem = semaphore.clone();
            let task_source = source.clone();

            let span = tracing::info_span!("fetch_source", line = %source.name);

            let task = tokio::spawn(
                async move {
                    let _permit = sem.acquire().await;

                    let result = fetch_source(client.as_ref(), &task_source).await;
                    match &result {
                        Ok(records) => {
                            info!(records = records.len(), "Feed decoded successfully");
                        }
                        Err(e) => log_failure(e),
                    }
                    result
                }
                .instrument(span),
            );

            tasks.push((source.name.clone(), task));
        }

        // Joined in spawn order, so output order is registry order
        let mut results = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            let result = match task.await {
                Ok(Ok(records)) => SourceResult::data(&name, records),
                Ok(Err(_)) => SourceResult::failed(&name),
                Err(e) => {
                    let err = SourceError::Task(e.to_string());
                    error!(line = %name, kind = err.kind(), error = %err, "Feed task aborted");
                    SourceResult::failed(&name)
                }
            };
            results.push(result);
        }

        let failed = results.iter().filter(|r| r.is_error()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "Aggregate cycle finished with failures");
        } else {
            info!(total = results.len(), "Aggregate cycle finished");
        }

        results
    }
}

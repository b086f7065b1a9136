use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::watch;

use crate::pkg::{
    client::JobSource,
    internal::adaptors::jobs::spec::{JobEntry, JobFilters, JobType},
};

/// A result set together with the filter change that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSnapshot {
    pub generation: u64,
    pub filters: JobFilters,
    pub jobs: Vec<JobEntry>,
}

/// Holds the three filter fields and turns each change into a listing query.
///
/// Every change takes a new generation. A dispatch is dropped if a newer
/// change arrives before its debounce elapses, and its result is discarded if
/// a newer change arrives while it is in flight, so the published snapshot
/// always belongs to the most recently issued change.
pub struct FilterDispatcher<S: JobSource> {
    source: Arc<S>,
    debounce: Duration,
    filters: JobFilters,
    generation: Arc<AtomicU64>,
    results: Arc<watch::Sender<FilterSnapshot>>,
}

impl<S: JobSource> FilterDispatcher<S> {
    pub fn new(source: Arc<S>, debounce: Duration) -> Self {
        let (results, _) = watch::channel(FilterSnapshot::default());
        FilterDispatcher {
            source,
            debounce,
            filters: JobFilters::default(),
            generation: Arc::new(AtomicU64::new(0)),
            results: Arc::new(results),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.results.subscribe()
    }

    pub fn filters(&self) -> &JobFilters {
        &self.filters
    }

    pub fn set_location(&mut self, value: &str) -> u64 {
        self.filters.location = Some(value.to_string()).filter(|v| !v.is_empty());
        self.dispatch(self.debounce)
    }

    pub fn set_search(&mut self, value: &str) -> u64 {
        self.filters.search = Some(value.to_string()).filter(|v| !v.is_empty());
        self.dispatch(self.debounce)
    }

    pub fn set_type(&mut self, job_type: Option<JobType>) -> u64 {
        self.filters.job_type = job_type;
        self.dispatch(Duration::ZERO)
    }

    pub fn clear(&mut self) -> u64 {
        self.filters = JobFilters::default();
        self.dispatch(Duration::ZERO)
    }

    /// Re-issues the current filters without waiting.
    pub fn refresh(&mut self) -> u64 {
        self.dispatch(Duration::ZERO)
    }

    fn dispatch(&self, delay: Duration) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = self.generation.clone();
        let source = self.source.clone();
        let results = self.results.clone();
        let filters = self.filters.clone().normalized();

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!("filter change {} superseded before dispatch", generation);
                return;
            }
            let jobs = match source.fetch(filters.clone()).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::warn!("filter change {} failed: {}", generation, e);
                    return;
                }
            };
            let published = results.send_if_modified(|current| {
                if latest.load(Ordering::SeqCst) != generation || current.generation >= generation {
                    return false;
                }
                *current = FilterSnapshot {
                    generation,
                    filters,
                    jobs,
                };
                true
            });
            if !published {
                tracing::debug!("discarded stale result for filter change {}", generation);
            }
        });
        generation
    }
}

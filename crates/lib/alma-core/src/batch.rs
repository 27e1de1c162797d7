//! Batch execution over many source names.
//!
//! Each name runs in isolation; a failure becomes that entry's result and
//! never aborts the batch. Entries come back in input order, duplicates
//! included, even when names run concurrently.

use std::future::Future;

use alma_store::BatchItemResult;
use alma_store::schema::BATCH_MAX_NAMES;
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};

/// Names accepted for a batch and how many were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub names: Vec<String>,
    pub dropped: usize,
}

impl BatchPlan {
    /// Keeps the first [`BATCH_MAX_NAMES`] names.
    #[must_use]
    pub fn new(names: &[String]) -> Self {
        let kept = names.len().min(BATCH_MAX_NAMES);
        Self {
            names: names[..kept].to_vec(),
            dropped: names.len() - kept,
        }
    }
}

/// One source and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchEntry {
    pub source: String,
    #[serde(flatten)]
    pub result: BatchItemResult,
}

/// Aggregate over a finished batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub total_sources_queried: usize,
    pub names_dropped: usize,
    pub sources_with_alma_data: usize,
    pub total_observations: usize,
    pub results_by_source: Vec<BatchEntry>,
    pub summary: String,
}

impl BatchReport {
    #[must_use]
    pub fn new(entries: Vec<BatchEntry>, names_dropped: usize) -> Self {
        let total_sources_queried = entries.len();
        let sources_with_alma_data = entries.iter().filter(|entry| entry.result.has_data()).count();
        let total_observations = entries
            .iter()
            .filter(|entry| entry.result.has_data())
            .map(|entry| entry.result.count())
            .sum();
        Self {
            total_sources_queried,
            names_dropped,
            sources_with_alma_data,
            total_observations,
            results_by_source: entries,
            summary: format!(
                "{sources_with_alma_data} of {total_sources_queried} sources have ALMA observations"
            ),
        }
    }
}

/// Runs `run` for every planned name with at most `concurrency` in flight.
pub async fn run_batch<F, Fut>(plan: BatchPlan, concurrency: usize, run: F) -> BatchReport
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = BatchItemResult> + Send,
{
    let BatchPlan { names, dropped } = plan;
    let entries = stream::iter(names.into_iter().map(|source| {
        let pending = run(source.clone());
        async move {
            BatchEntry {
                source,
                result: pending.await,
            }
        }
    }))
    .buffered(concurrency.max(1))
    .collect::<Vec<_>>()
    .await;
    BatchReport::new(entries, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use alma_store::{ResolutionReason, SkyPosition};

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("source-{index}")).collect()
    }

    #[test]
    fn plan_keeps_first_twenty() {
        let plan = BatchPlan::new(&names(25));
        assert_eq!(plan.names.len(), 20);
        assert_eq!(plan.dropped, 5);
        assert_eq!(plan.names[19], "source-19");
        assert_eq!(BatchPlan::new(&names(3)).dropped, 0);
    }

    #[tokio::test]
    async fn order_is_preserved_under_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let plan = BatchPlan::new(&names(8));
        let report = run_batch(plan, 3, |source: String| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                let index: u64 = source.trim_start_matches("source-").parse().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(20 - index * 2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                BatchItemResult::NoData {
                    count: 0,
                    coordinates: SkyPosition { ra: 0.0, dec: 0.0 },
                    message: source,
                }
            }
        })
        .await;

        let order: Vec<&str> = report
            .results_by_source
            .iter()
            .map(|entry| entry.source.as_str())
            .collect();
        assert_eq!(order, names(8));
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(report.sources_with_alma_data, 0);
    }

    #[tokio::test]
    async fn unresolvable_batch_reports_no_data() {
        let mut input = names(25);
        input[1] = input[0].clone();
        let report = run_batch(BatchPlan::new(&input), 4, |source: String| async move {
            BatchItemResult::NotResolved {
                count: 0,
                reason: ResolutionReason::NotFound,
                message: format!("Could not resolve '{source}' - not found by the Sesame name resolver"),
            }
        })
        .await;

        assert_eq!(report.total_sources_queried, 20);
        assert_eq!(report.names_dropped, 5);
        assert_eq!(report.sources_with_alma_data, 0);
        assert_eq!(report.total_observations, 0);
        assert_eq!(report.results_by_source[0].source, report.results_by_source[1].source);
        assert!(report
            .results_by_source
            .iter()
            .all(|entry| matches!(entry.result, BatchItemResult::NotResolved { .. })));

        let json = serde_json::to_value(&report.results_by_source[0]).expect("serialize");
        assert_eq!(json["status"], "not_resolved");
        assert_eq!(json["source"], "source-0");
        assert_eq!(report.summary, "0 of 20 sources have ALMA observations");
    }
}

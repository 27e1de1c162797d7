use std::sync::Arc;

use alma_store::RawTable;
use tracing::{debug, warn};

use super::{ArchiveBackend, BackendError, BackendOutcome};
use crate::query::QuerySpec;

/// Progress of one query through the selector.
enum Attempt {
    TryPreferred,
    TryFallback { last: Option<BackendError> },
    Done(RawTable),
    Failed(BackendError),
}

/// Picks the backend for a query and falls back once on failure.
///
/// Position and line-coverage queries go to the cone-search backend first and
/// fall back to the declarative backend if it fails. Every other family runs
/// on the declarative backend only. An empty result is final.
#[derive(Clone, Default)]
pub struct BackendSelector {
    declarative: Option<Arc<dyn ArchiveBackend>>,
    cone: Option<Arc<dyn ArchiveBackend>>,
}

impl BackendSelector {
    #[must_use]
    pub const fn new(
        declarative: Option<Arc<dyn ArchiveBackend>>,
        cone: Option<Arc<dyn ArchiveBackend>>,
    ) -> Self {
        Self { declarative, cone }
    }

    #[must_use]
    pub const fn has_declarative(&self) -> bool {
        self.declarative.is_some()
    }

    #[must_use]
    pub const fn has_cone_search(&self) -> bool {
        self.cone.is_some()
    }

    /// Runs the query and reports the outcome; never returns an error.
    pub async fn execute(&self, spec: &QuerySpec) -> BackendOutcome {
        let mut attempt = match &self.cone {
            Some(_) if spec.family.prefers_cone_search() => Attempt::TryPreferred,
            _ => Attempt::TryFallback { last: None },
        };

        loop {
            attempt = match attempt {
                Attempt::TryPreferred => self.try_cone(spec).await,
                Attempt::TryFallback { last } => self.try_declarative(spec, last).await,
                Attempt::Done(table) => return BackendOutcome::from_table(table),
                Attempt::Failed(err) => return BackendOutcome::from_error(&err),
            };
        }
    }

    async fn try_cone(&self, spec: &QuerySpec) -> Attempt {
        let Some(backend) = self.cone.as_ref() else {
            return Attempt::TryFallback { last: None };
        };
        debug!(family = %spec.family, backend = %backend.kind(), "trying preferred backend");
        match backend.execute(spec).await {
            Ok(table) => Attempt::Done(table),
            Err(err) => {
                warn!(family = %spec.family, error = %err, "cone search failed; falling back to TAP");
                Attempt::TryFallback { last: Some(err) }
            }
        }
    }

    async fn try_declarative(&self, spec: &QuerySpec, last: Option<BackendError>) -> Attempt {
        let Some(backend) = self.declarative.as_ref() else {
            return Attempt::Failed(last.unwrap_or_else(|| {
                BackendError::Unavailable("no archive query service is configured".to_string())
            }));
        };
        debug!(family = %spec.family, backend = %backend.kind(), "trying declarative backend");
        match backend.execute(spec).await {
            Ok(table) => Attempt::Done(table),
            Err(err) => Attempt::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alma_store::{RawColumn, RawValue};

    use crate::backend::{BackendFuture, BackendKind, FailureKind};
    use crate::query::{ConeSearch, ProposalSearch, QueryBuilder, QueryFamily, RowCap};

    struct ScriptedBackend {
        kind: BackendKind,
        calls: AtomicUsize,
        reply: Mutex<Result<RawTable, BackendError>>,
    }

    impl ScriptedBackend {
        fn new(kind: BackendKind, reply: Result<RawTable, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
                reply: Mutex::new(reply),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ArchiveBackend for ScriptedBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn execute<'a>(&'a self, _spec: &'a QuerySpec) -> BackendFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.lock().expect("reply lock").clone();
            Box::pin(async move { reply })
        }
    }

    fn dyn_backend(backend: &Arc<ScriptedBackend>) -> Option<Arc<dyn ArchiveBackend>> {
        let backend: Arc<dyn ArchiveBackend> = backend.clone();
        Some(backend)
    }

    fn one_row() -> RawTable {
        RawTable {
            columns: vec![RawColumn::new("target_name")],
            rows: vec![vec![RawValue::Text("M87".to_string())]],
        }
    }

    fn cone_spec() -> QuerySpec {
        QueryBuilder::cone(QueryFamily::Position, &ConeSearch {
            ra_degrees: 187.7059,
            dec_degrees: 12.3911,
            radius_deg: 1.0 / 60.0,
            public_only: true,
            row_cap: RowCap::default(),
        })
        .expect("valid cone")
    }

    fn proposal_spec() -> QuerySpec {
        QueryBuilder::proposal(&ProposalSearch {
            proposal_id: Some("2019.1".to_string()),
            ..ProposalSearch::default()
        })
        .expect("valid proposal search")
    }

    #[tokio::test]
    async fn metadata_queries_never_touch_the_cone_backend() {
        let cone = ScriptedBackend::new(BackendKind::ConeSearch, Ok(one_row()));
        let tap = ScriptedBackend::new(BackendKind::Declarative, Ok(one_row()));
        let selector = BackendSelector::new(dyn_backend(&tap), dyn_backend(&cone));

        let outcome = selector.execute(&proposal_spec()).await;
        assert_eq!(outcome.total(), 1);
        assert_eq!(cone.calls(), 0);
        assert_eq!(tap.calls(), 1);
    }

    #[tokio::test]
    async fn cone_failure_falls_back_once() {
        let cone = ScriptedBackend::new(
            BackendKind::ConeSearch,
            Err(BackendError::Unavailable("timeout".to_string())),
        );
        let tap = ScriptedBackend::new(BackendKind::Declarative, Ok(one_row()));
        let selector = BackendSelector::new(dyn_backend(&tap), dyn_backend(&cone));

        let outcome = selector.execute(&cone_spec()).await;
        assert_eq!(outcome.total(), 1);
        assert_eq!(cone.calls(), 1);
        assert_eq!(tap.calls(), 1);
    }

    #[tokio::test]
    async fn empty_cone_result_is_final() {
        let cone = ScriptedBackend::new(
            BackendKind::ConeSearch,
            Ok(RawTable::new(vec![RawColumn::new("target_name")])),
        );
        let tap = ScriptedBackend::new(BackendKind::Declarative, Ok(one_row()));
        let selector = BackendSelector::new(dyn_backend(&tap), dyn_backend(&cone));

        let outcome = selector.execute(&cone_spec()).await;
        assert!(matches!(outcome, BackendOutcome::Empty { .. }));
        assert_eq!(tap.calls(), 0);
    }

    #[tokio::test]
    async fn both_failing_reports_the_last_error() {
        let cone = ScriptedBackend::new(
            BackendKind::ConeSearch,
            Err(BackendError::Unavailable("timeout".to_string())),
        );
        let tap = ScriptedBackend::new(
            BackendKind::Declarative,
            Err(BackendError::Execution("syntax error".to_string())),
        );
        let selector = BackendSelector::new(dyn_backend(&tap), dyn_backend(&cone));

        assert_eq!(
            selector.execute(&cone_spec()).await,
            BackendOutcome::Failed {
                kind: FailureKind::ExecutionError,
                message: "syntax error".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn missing_declarative_backend_keeps_cone_error() {
        let cone = ScriptedBackend::new(
            BackendKind::ConeSearch,
            Err(BackendError::Unavailable("timeout".to_string())),
        );
        let selector = BackendSelector::new(None, dyn_backend(&cone));
        assert!(matches!(
            selector.execute(&cone_spec()).await,
            BackendOutcome::Failed {
                kind: FailureKind::Unavailable,
                ..
            }
        ));
        let outcome = BackendSelector::default().execute(&proposal_spec()).await;
        assert!(matches!(outcome, BackendOutcome::Failed { .. }));
    }
}

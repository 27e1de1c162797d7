use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alma_core::backend::{ArchiveBackend, BackendError, BackendFuture, BackendKind};
use alma_core::control::{
    AlmaControlPlane,
    BatchSearchRequest,
    ControlError,
    LineCoverageRequest,
    PositionSearchRequest,
    RAW_QUERY_HINT,
    RawQueryRequest,
    TargetSearchRequest,
};
use alma_core::query::{MemberOusSearch, ProposalSearch, QueryFamily, QuerySpec};
use alma_core::resolver::{NameResolver, ResolutionFailure, ResolveFuture};
use alma_core::services::ArchiveServices;
use alma_store::{BatchItemResult, RawColumn, RawTable, RawValue, ResolvedCoordinate};

struct RecordingBackend {
    kind: BackendKind,
    reply: Result<RawTable, BackendError>,
    specs: Mutex<Vec<QuerySpec>>,
}

impl RecordingBackend {
    fn new(kind: BackendKind, reply: Result<RawTable, BackendError>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply,
            specs: Mutex::new(Vec::new()),
        })
    }

    fn specs(&self) -> Vec<QuerySpec> {
        self.specs.lock().expect("specs lock").clone()
    }
}

impl ArchiveBackend for RecordingBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn execute<'a>(&'a self, spec: &'a QuerySpec) -> BackendFuture<'a> {
        self.specs.lock().expect("specs lock").push(spec.clone());
        let reply = self.reply.clone();
        Box::pin(async move { reply })
    }
}

struct FixedResolver {
    known: HashMap<String, ResolvedCoordinate>,
}

impl FixedResolver {
    fn new(entries: &[(&str, f64, f64)]) -> Arc<Self> {
        let known = entries
            .iter()
            .map(|(name, ra, dec)| {
                (
                    (*name).to_string(),
                    ResolvedCoordinate {
                        ra_degrees: *ra,
                        dec_degrees: *dec,
                    },
                )
            })
            .collect();
        Arc::new(Self { known })
    }
}

impl NameResolver for FixedResolver {
    fn resolve<'a>(&'a self, name: &'a str) -> ResolveFuture<'a> {
        let result = self
            .known
            .get(name)
            .copied()
            .ok_or_else(|| ResolutionFailure::NotFound {
                name: name.to_string(),
            });
        Box::pin(async move { result })
    }
}

fn backend(backend: &Arc<RecordingBackend>) -> Option<Arc<dyn ArchiveBackend>> {
    let backend: Arc<dyn ArchiveBackend> = backend.clone();
    Some(backend)
}

fn resolver(resolver: &Arc<FixedResolver>) -> Option<Arc<dyn NameResolver>> {
    let resolver: Arc<dyn NameResolver> = resolver.clone();
    Some(resolver)
}

fn empty_table() -> RawTable {
    RawTable::new(vec![RawColumn::new("target_name")])
}

fn target_rows(count: usize) -> RawTable {
    let mut table = RawTable::new(vec![
        RawColumn::new("target_name"),
        RawColumn::new("band_list"),
    ]);
    for index in 0..count {
        table.rows.push(vec![
            RawValue::Text(format!("target-{index}")),
            RawValue::Text("6".to_string()),
        ]);
    }
    table
}

#[tokio::test]
async fn empty_position_search_reports_rounded_position() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(empty_table()));
    let cone = RecordingBackend::new(BackendKind::ConeSearch, Ok(empty_table()));
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), backend(&cone), None));

    let response = plane
        .search_by_position(PositionSearchRequest::new(187.7059, 12.3911))
        .await
        .expect("position search");

    assert_eq!(response.count, 0);
    assert_eq!(response.showing, 0);
    assert!(response.observations.is_empty());
    assert_eq!(response.position.ra, 187.7059);
    assert_eq!(response.position.dec, 12.3911);
    assert_eq!(response.summary, "No ALMA observations at RA=187.7059, Dec=12.3911");

    let specs = cone.specs();
    assert_eq!(specs.len(), 1);
    let radius = specs[0].cone().expect("cone").radius_deg;
    assert!((radius - 1.0 / 60.0).abs() < 1e-12);
    assert!(tap.specs().is_empty(), "empty result is not retried");
}

#[tokio::test]
async fn cone_outage_falls_back_to_tap() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(target_rows(3)));
    let cone = RecordingBackend::new(
        BackendKind::ConeSearch,
        Err(BackendError::Unavailable("connection refused".to_string())),
    );
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), backend(&cone), None));

    let response = plane
        .search_by_position(PositionSearchRequest::new(83.8221, -5.3911))
        .await
        .expect("position search");

    assert_eq!(response.count, 3);
    assert_eq!(cone.specs().len(), 1);
    assert_eq!(tap.specs().len(), 1);
}

#[tokio::test]
async fn metadata_searches_never_use_cone_search() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(target_rows(2)));
    let cone = RecordingBackend::new(BackendKind::ConeSearch, Ok(target_rows(2)));
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), backend(&cone), None));

    let response = plane
        .search_by_proposal(&ProposalSearch {
            pi_name: Some("Smith".to_string()),
            ..ProposalSearch::default()
        })
        .await
        .expect("proposal search");

    assert_eq!(response.page.count, 2);
    assert!(cone.specs().is_empty());
    let specs = tap.specs();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].family, QueryFamily::Proposal);
}

#[tokio::test]
async fn member_ous_lists_every_product() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(target_rows(35)));
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, None));

    let response = plane
        .search_by_member_ous(&MemberOusSearch {
            member_ous_id: "uid___A001_X123_X456".to_string(),
        })
        .await
        .expect("member ous search");

    assert_eq!(response.member_ous_id, "uid://A001/X123/X456");
    assert_eq!(response.count, 35);
    assert_eq!(response.observations.len(), response.count);
}

#[tokio::test]
async fn unresolvable_batch_isolates_every_name() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(target_rows(1)));
    let names = FixedResolver::new(&[]);
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, resolver(&names)));

    let source_names: Vec<String> = (0..25).map(|index| format!("nowhere-{index}")).collect();
    let report = plane
        .query_multiple_sources(BatchSearchRequest {
            source_names,
            radius_arcmin: 1.0,
        })
        .await
        .expect("batch");

    assert_eq!(report.total_sources_queried, 20);
    assert_eq!(report.names_dropped, 5);
    assert_eq!(report.sources_with_alma_data, 0);
    assert!(report
        .results_by_source
        .iter()
        .all(|entry| matches!(entry.result, BatchItemResult::NotResolved { .. })));
    assert!(tap.specs().is_empty());
}

#[tokio::test]
async fn batch_reports_found_sources_with_bands() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(target_rows(4)));
    let names = FixedResolver::new(&[("M87", 187.705_93, 12.391_12)]);
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, resolver(&names)));

    let report = plane
        .query_multiple_sources(BatchSearchRequest {
            source_names: vec!["M87".to_string(), "nowhere".to_string(), "M87".to_string()],
            radius_arcmin: 1.0,
        })
        .await
        .expect("batch");

    assert_eq!(report.total_sources_queried, 3);
    assert_eq!(report.sources_with_alma_data, 2);
    assert_eq!(report.total_observations, 8);
    match &report.results_by_source[0].result {
        BatchItemResult::Found {
            count,
            bands_observed,
            coordinates,
            ..
        } => {
            assert_eq!(*count, 4);
            assert_eq!(bands_observed, &vec!["6".to_string()]);
            assert_eq!(coordinates.ra, 187.7059);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    for spec in tap.specs() {
        assert_eq!(spec.row_cap.get(), 50);
    }
}

#[tokio::test]
async fn line_coverage_keeps_only_covering_rows() {
    let mut table = RawTable::new(vec![
        RawColumn::new("target_name"),
        RawColumn::new("frequency_support"),
    ]);
    table.rows.push(vec![
        RawValue::Text("covering".to_string()),
        RawValue::Text("[114.00..116.00GHz,31250.00kHz,XX YY] U [100.00..102.00GHz,XX YY]".to_string()),
    ]);
    table.rows.push(vec![
        RawValue::Text("elsewhere".to_string()),
        RawValue::Text("[229.00..231.00GHz,31250.00kHz,XX YY]".to_string()),
    ]);
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(table));
    let names = FixedResolver::new(&[("NGC 1068", 40.669_63, -0.013_28)]);
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, resolver(&names)));

    let response = plane
        .check_line_coverage(LineCoverageRequest {
            target_name: "NGC 1068".to_string(),
            line_frequency_ghz: 230.538,
            redshift: 1.0,
        })
        .await
        .expect("line coverage");

    assert_eq!(response.observed_frequency_ghz, 115.269);
    assert_eq!(response.total_observations, 2);
    assert_eq!(response.covering_line, 1);
    assert_eq!(response.covering_observations[0].target, "covering");
    assert_eq!(response.summary, "1 of 2 observations cover the line");
    assert_eq!(tap.specs()[0].family, QueryFamily::LineCoverage);
}

#[tokio::test]
async fn target_search_requires_a_resolver() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(empty_table()));
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, None));

    let err = plane
        .search_by_target(TargetSearchRequest::new("M87"))
        .await
        .expect_err("no resolver");

    assert!(matches!(err, ControlError::Unavailable(_)));
    assert!(tap.specs().is_empty());
}

#[tokio::test]
async fn unknown_target_is_a_resolution_failure() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(empty_table()));
    let names = FixedResolver::new(&[]);
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, resolver(&names)));

    let err = plane
        .search_by_target(TargetSearchRequest::new("Planet X"))
        .await
        .expect_err("unknown name");

    assert_eq!(
        err.to_response().error,
        "Could not resolve 'Planet X' - not found by the Sesame name resolver"
    );
    assert!(tap.specs().is_empty());
}

#[tokio::test]
async fn raw_query_failures_carry_the_hint() {
    let tap = RecordingBackend::new(
        BackendKind::Declarative,
        Err(BackendError::Execution("column foo does not exist".to_string())),
    );
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, None));

    let rejected = plane
        .run_raw_query(&RawQueryRequest {
            sql_query: "DROP TABLE ivoa.obscore".to_string(),
            max_rows: None,
        })
        .await
        .expect_err("not a select");
    assert_eq!(rejected.hint(), Some(RAW_QUERY_HINT));
    assert!(tap.specs().is_empty());

    let failed = plane
        .run_raw_query(&RawQueryRequest {
            sql_query: "SELECT foo FROM ivoa.obscore".to_string(),
            max_rows: Some(10),
        })
        .await
        .expect_err("execution error");
    let response = failed.to_response();
    assert_eq!(response.error, "TAP query failed: column foo does not exist");
    assert_eq!(response.hint.as_deref(), Some(RAW_QUERY_HINT));
}

#[tokio::test]
async fn raw_query_returns_rows_verbatim() {
    let tap = RecordingBackend::new(BackendKind::Declarative, Ok(target_rows(3)));
    let plane = AlmaControlPlane::new(ArchiveServices::new(backend(&tap), None, None));

    let response = plane
        .run_raw_query(&RawQueryRequest {
            sql_query: "SELECT target_name, band_list FROM ivoa.obscore".to_string(),
            max_rows: None,
        })
        .await
        .expect("raw query");

    assert_eq!(response.count, 3);
    assert_eq!(response.columns, vec!["target_name", "band_list"]);
    assert_eq!(response.rows[0]["target_name"], "target-0");
    assert_eq!(response.summary, "Query returned 3 rows");
    assert_eq!(
        tap.specs()[0].raw_text.as_deref(),
        Some("SELECT TOP 100 target_name, band_list FROM ivoa.obscore")
    );
}

use alma_store::RawTable;
use alma_store::schema::MAX_ROW_CAP;
use tracing::debug;

use super::{ArchiveBackend, BackendError, BackendFuture, BackendKind, table_from_response};
use crate::query::{Predicate, QuerySpec};

/// SIA v2 cone-search endpoint.
///
/// The service only understands the positional cone. Every other predicate is
/// evaluated here against the returned rows; a predicate whose column the
/// service did not return fails the query so the selector can fall back.
#[derive(Clone)]
pub struct SiaConeBackend {
    client: reqwest::Client,
    query_url: String,
}

impl SiaConeBackend {
    /// Creates a backend for an SIA base URL such as `https://host/sia2`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            query_url: format!("{}/query", base_url.trim_end_matches('/')),
        }
    }

    async fn run(&self, spec: &QuerySpec) -> Result<RawTable, BackendError> {
        let cone = spec.cone().ok_or_else(|| {
            BackendError::Execution(format!("{} queries have no cone to search", spec.family))
        })?;
        let filters: Vec<&Predicate> = spec
            .predicates
            .iter()
            .filter(|predicate| !matches!(predicate, Predicate::Cone(_)))
            .collect();
        // Client-side filters thin the page, so ask for the widest one.
        let max_rec = if filters.is_empty() {
            spec.row_cap.get()
        } else {
            MAX_ROW_CAP
        };
        let position = format!("CIRCLE {} {} {}", cone.ra_deg, cone.dec_deg, cone.radius_deg);
        let max_rec_text = max_rec.to_string();
        debug!(family = %spec.family, %position, max_rec, "running cone search");

        let response = self
            .client
            .get(&self.query_url)
            .query(&[("POS", position.as_str()), ("MAXREC", max_rec_text.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let mut table = table_from_response(status, &body)?;

        if !table.is_empty() {
            for predicate in &filters {
                if let Some(column) = missing_column(predicate, &table) {
                    return Err(BackendError::Execution(format!(
                        "cone-search results lack column '{column}'"
                    )));
                }
            }
        }
        table.retain_rows(|row| filters.iter().all(|predicate| predicate.matches(row)));
        table.rows.truncate(spec.row_cap.get() as usize);
        Ok(table)
    }
}

fn missing_column(predicate: &Predicate, table: &RawTable) -> Option<String> {
    let present = |column: &str| table.column_index(column).is_some();
    match predicate {
        Predicate::Equals { column, .. }
        | Predicate::Range { column, .. }
        | Predicate::Contains { column, .. }
        | Predicate::HasToken { column, .. } => (!present(column)).then(|| (*column).to_string()),
        Predicate::ContainsAny { columns, .. } => {
            (!columns.iter().any(|column| present(column))).then(|| columns.join("|"))
        }
        Predicate::Cone(_) => None,
    }
}

impl ArchiveBackend for SiaConeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ConeSearch
    }

    fn execute<'a>(&'a self, spec: &'a QuerySpec) -> BackendFuture<'a> {
        Box::pin(self.run(spec))
    }
}

use alma_store::RawTable;
use tracing::debug;

use super::{ArchiveBackend, BackendError, BackendFuture, BackendKind, table_from_response};
use crate::query::QuerySpec;

/// TAP synchronous endpoint running rendered ADQL.
#[derive(Clone)]
pub struct TapBackend {
    client: reqwest::Client,
    sync_url: String,
}

impl TapBackend {
    /// Creates a backend for a TAP service base URL such as `https://host/tap`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            sync_url: format!("{}/sync", base_url.trim_end_matches('/')),
        }
    }

    #[must_use]
    pub fn sync_url(&self) -> &str {
        &self.sync_url
    }

    async fn run(&self, spec: &QuerySpec) -> Result<RawTable, BackendError> {
        let query = spec.to_adql();
        let max_rec = spec.row_cap.get().to_string();
        debug!(family = %spec.family, %query, "running TAP query");

        let response = self
            .client
            .post(&self.sync_url)
            .form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "votable"),
                ("MAXREC", max_rec.as_str()),
                ("QUERY", query.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let mut table = table_from_response(status, &body)?;
        table.rows.truncate(spec.row_cap.get() as usize);
        Ok(table)
    }
}

impl ArchiveBackend for TapBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Declarative
    }

    fn execute<'a>(&'a self, spec: &'a QuerySpec) -> BackendFuture<'a> {
        Box::pin(self.run(spec))
    }
}

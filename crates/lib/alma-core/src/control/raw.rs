use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::raw::build_raw;

use super::{AlmaControlPlane, ControlError};

/// Usage hint attached to every raw query failure.
pub const RAW_QUERY_HINT: &str =
    "Check your ADQL syntax. Query the 'ivoa.obscore' table. Use single quotes for string values.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQueryRequest {
    pub sql_query: String,
    pub max_rows: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawQueryResponse {
    pub count: usize,
    pub showing: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub summary: String,
}

impl AlmaControlPlane {
    /// Runs caller-supplied ADQL against the declarative backend.
    ///
    /// Rows are returned as-is, without normalization.
    ///
    /// # Errors
    /// Returns `ControlError` carrying [`RAW_QUERY_HINT`] when the text is
    /// rejected or the archive reports an error.
    pub async fn run_raw_query(
        &self,
        request: &RawQueryRequest,
    ) -> Result<RawQueryResponse, ControlError> {
        self.require_declarative()?;
        let spec = build_raw(&request.sql_query, request.max_rows, self.services().allow_list())
            .map_err(|err| ControlError::from(err).with_hint(RAW_QUERY_HINT))?;
        let table = self
            .fetch(&spec, "TAP query")
            .await
            .map_err(|err| err.with_hint(RAW_QUERY_HINT))?;

        let row_cap = usize::try_from(spec.row_cap.get()).unwrap_or(usize::MAX);
        let rows: Vec<Map<String, Value>> = table
            .rows()
            .take(row_cap)
            .map(|row| row.to_json_map())
            .collect();
        let count = table.len();
        let summary = if count == 0 {
            "Query returned no results".to_string()
        } else {
            format!("Query returned {count} rows")
        };
        Ok(RawQueryResponse {
            count,
            showing: rows.len(),
            columns: table.column_names(),
            rows,
            summary,
        })
    }
}

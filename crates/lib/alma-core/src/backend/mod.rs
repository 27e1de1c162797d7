//! Archive backends.
//!
//! Two services can answer archive queries: the generic TAP endpoint, which
//! runs rendered ADQL, and the SIA cone-search endpoint, which only answers
//! positional queries. Both implement [`ArchiveBackend`]; the
//! [`BackendSelector`] decides which one runs a given [`QuerySpec`].

pub mod selector;
pub mod sia;
pub mod tap;

use std::{error::Error, fmt, future::Future, pin::Pin};

use alma_store::RawTable;
use serde::{Deserialize, Serialize};

use crate::parsers::VotableError;
use crate::query::QuerySpec;

pub use selector::BackendSelector;
pub use sia::SiaConeBackend;
pub use tap::TapBackend;

pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<RawTable, BackendError>> + Send + 'a>>;

/// Opaque executor of archive queries.
pub trait ArchiveBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Runs the query and returns the rows it produced, up to the query's row cap.
    fn execute<'a>(&'a self, spec: &'a QuerySpec) -> BackendFuture<'a>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Declarative,
    ConeSearch,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Declarative => "tap",
            Self::ConeSearch => "cone_search",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Transport failure, timeout or a service-side outage.
    Unavailable(String),
    /// The service ran the query and rejected it.
    Execution(String),
}

impl BackendError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable(_) => FailureKind::Unavailable,
            Self::Execution(_) => FailureKind::ExecutionError,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unavailable(message) | Self::Execution(message) => message,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "archive service unavailable: {message}"),
            Self::Execution(message) => write!(f, "query execution failed: {message}"),
        }
    }
}

impl Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Execution(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

impl From<VotableError> for BackendError {
    fn from(err: VotableError) -> Self {
        Self::Execution(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unavailable,
    ExecutionError,
}

/// Result of running one query through the selector.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// At least one row. `total` is the matched count, bounded by the cap.
    Rows { table: RawTable, total: usize },
    /// The query ran and matched nothing.
    Empty { columns: Vec<String> },
    Failed { kind: FailureKind, message: String },
}

impl BackendOutcome {
    #[must_use]
    pub fn from_table(table: RawTable) -> Self {
        if table.is_empty() {
            Self::Empty {
                columns: table.column_names(),
            }
        } else {
            let total = table.len();
            Self::Rows { table, total }
        }
    }

    #[must_use]
    pub fn from_error(err: &BackendError) -> Self {
        Self::Failed {
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        match self {
            Self::Rows { total, .. } => *total,
            Self::Empty { .. } | Self::Failed { .. } => 0,
        }
    }
}

/// Maps an HTTP response to a table.
///
/// TAP services often report query errors as a `VOTable` with a non-2xx status,
/// so the body is parsed before the status is considered.
pub(crate) fn table_from_response(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<RawTable, BackendError> {
    match crate::parsers::VotableParser::parse(body) {
        Ok(table) if status.is_success() => Ok(table),
        Err(VotableError::Query(message)) => Err(BackendError::Execution(message)),
        Err(err) if status.is_success() => Err(err.into()),
        Ok(_) | Err(VotableError::Malformed(_)) if status.is_server_error() => {
            Err(BackendError::Unavailable(format!("HTTP {status}")))
        }
        Ok(_) | Err(VotableError::Malformed(_)) => {
            Err(BackendError::Execution(format!("HTTP {status}")))
        }
    }
}

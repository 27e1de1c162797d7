use std::{error::Error, fmt};

use alma_store::schema::{DISPLAY_CAP, UNIQUE_LIST_CAP};
use alma_store::{ObservationRecord, RawColumn, RawTable, ResolvedCoordinate, SkyPosition};
use serde::{Deserialize, Serialize};

use crate::backend::{BackendOutcome, FailureKind};
use crate::normalize::normalize_table;
use crate::query::{QuerySpec, ValidationError};
use crate::resolver::ResolutionFailure;
use crate::services::{ArchiveServices, Capabilities};
use crate::units::round_to;

pub mod catalog;
pub mod info;
pub mod raw;
pub mod search;

pub use info::{AlmaInfo, BandInfo, LineInfo, ServiceStatus};
pub use raw::{RAW_QUERY_HINT, RawQueryRequest, RawQueryResponse};
pub use search::{
    BatchSearchRequest,
    LineCoverageRequest,
    LineCoverageResponse,
    PositionSearchRequest,
    PositionSearchResponse,
    TargetSearchRequest,
    TargetSearchResponse,
};

#[derive(Debug)]
pub enum ControlError {
    /// A collaborator is not configured or could not be reached.
    Unavailable(String),
    Resolution(ResolutionFailure),
    Validation(ValidationError),
    /// The archive ran the query and reported an error.
    Execution { context: &'static str, message: String },
    /// Another error plus a usage hint for the caller.
    Hinted {
        source: Box<ControlError>,
        hint: &'static str,
    },
}

impl ControlError {
    #[must_use]
    pub fn with_hint(self, hint: &'static str) -> Self {
        Self::Hinted {
            source: Box::new(self),
            hint,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Hinted { hint, .. } => Some(*hint),
            _ => None,
        }
    }

    /// Builds the JSON mapping returned to callers.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            hint: self.hint().map(str::to_string),
        }
    }

    fn from_failure(context: &'static str, kind: FailureKind, message: String) -> Self {
        match kind {
            FailureKind::Unavailable => {
                Self::Unavailable(format!("{context} failed: archive service unavailable ({message})"))
            }
            FailureKind::ExecutionError => Self::Execution { context, message },
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(message) => f.write_str(message),
            Self::Resolution(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Execution { context, message } => write!(f, "{context} failed: {message}"),
            Self::Hinted { source, .. } => write!(f, "{source}"),
        }
    }
}

impl Error for ControlError {}

impl From<ValidationError> for ControlError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<ResolutionFailure> for ControlError {
    fn from(err: ResolutionFailure) -> Self {
        Self::Resolution(err)
    }
}

/// Failure mapping returned to callers in place of a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Row counts plus the normalized observations shown to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationPage {
    pub count: usize,
    pub showing: usize,
    pub observations: Vec<ObservationRecord>,
}

impl ObservationPage {
    /// Normalizes a table, keeping the first [`DISPLAY_CAP`] rows.
    #[must_use]
    pub fn capped(table: &RawTable) -> Self {
        let mut observations = normalize_table(table);
        let count = observations.len();
        observations.truncate(DISPLAY_CAP);
        Self {
            count,
            showing: observations.len(),
            observations,
        }
    }

    /// Normalizes every row of a table.
    #[must_use]
    pub fn uncapped(table: &RawTable) -> Self {
        let observations = normalize_table(table);
        Self {
            count: observations.len(),
            showing: observations.len(),
            observations,
        }
    }
}

/// Generic list response used by the metadata searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationListResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub summary: String,
}

/// Query orchestration entry point; one method per archive operation.
#[derive(Clone)]
pub struct AlmaControlPlane {
    services: ArchiveServices,
}

impl AlmaControlPlane {
    #[must_use]
    pub const fn new(services: ArchiveServices) -> Self {
        Self { services }
    }

    #[must_use]
    pub const fn services(&self) -> &ArchiveServices {
        &self.services
    }

    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.services.capabilities()
    }

    fn require_declarative(&self) -> Result<(), ControlError> {
        if self.capabilities().declarative {
            Ok(())
        } else {
            Err(ControlError::Unavailable(
                "ALMA TAP query service is not available".to_string(),
            ))
        }
    }

    fn require_positional(&self) -> Result<(), ControlError> {
        if self.capabilities().positional() {
            Ok(())
        } else {
            Err(ControlError::Unavailable(
                "no ALMA archive search service is available".to_string(),
            ))
        }
    }

    fn require_resolver(&self) -> Result<(), ControlError> {
        if self.capabilities().name_resolver {
            Ok(())
        } else {
            Err(ControlError::Unavailable(
                "name resolver is not available - cannot resolve target names".to_string(),
            ))
        }
    }

    async fn resolve(&self, name: &str) -> Result<ResolvedCoordinate, ResolutionFailure> {
        match self.services.resolver() {
            Some(resolver) => resolver.resolve(name).await,
            None => Err(ResolutionFailure::ServiceUnavailable {
                message: "name resolver is not configured".to_string(),
            }),
        }
    }

    /// Runs a spec through the selector, returning the rows (possibly none).
    async fn fetch(&self, spec: &QuerySpec, context: &'static str) -> Result<RawTable, ControlError> {
        match self.services.selector().execute(spec).await {
            BackendOutcome::Rows { table, .. } => Ok(table),
            BackendOutcome::Empty { columns } => {
                Ok(RawTable::new(columns.into_iter().map(RawColumn::new).collect()))
            }
            BackendOutcome::Failed { kind, message } => {
                Err(ControlError::from_failure(context, kind, message))
            }
        }
    }
}

pub(crate) fn sky_position(coordinate: ResolvedCoordinate) -> SkyPosition {
    SkyPosition {
        ra: round_to(coordinate.ra_degrees, 4),
        dec: round_to(coordinate.dec_degrees, 4),
    }
}

/// First distinct non-empty values of a column, in row order.
pub(crate) fn unique_values(table: &RawTable, column: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for row in table.rows() {
        let Some(value) = row.get(column).and_then(|cell| cell.value.as_text()) else {
            continue;
        };
        if !values.contains(&value) {
            values.push(value);
            if values.len() == UNIQUE_LIST_CAP {
                break;
            }
        }
    }
    values
}

use alma_store::schema::{BATCH_ROW_CAP, DISPLAY_CAP};
use alma_store::{BatchItemResult, ObservationRecord, SkyPosition};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::batch::{BatchPlan, BatchReport, run_batch};
use crate::normalize::{normalize_row, normalize_table, spectral_windows};
use crate::query::{ConeSearch, QueryBuilder, QueryFamily, RowCap, ValidationError};
use crate::units::{arcmin_to_degrees, observed_frequency, round_to};

use super::{AlmaControlPlane, ControlError, ObservationPage, sky_position};

pub const DEFAULT_RADIUS_ARCMIN: f64 = 1.0;
/// Cone radius used to gather candidates for line coverage, in degrees.
pub const LINE_COVERAGE_RADIUS_DEG: f64 = 0.016;

/// Input for a name-based cone search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSearchRequest {
    pub target_name: String,
    pub radius_arcmin: f64,
    pub public_only: bool,
}

impl TargetSearchRequest {
    #[must_use]
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            radius_arcmin: DEFAULT_RADIUS_ARCMIN,
            public_only: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetSearchResponse {
    pub count: usize,
    pub showing: usize,
    pub target_resolved_to: SkyPosition,
    pub observations: Vec<ObservationRecord>,
    pub summary: String,
}

/// Input for a coordinate cone search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSearchRequest {
    pub ra_degrees: f64,
    pub dec_degrees: f64,
    pub radius_arcmin: f64,
    pub public_only: bool,
}

impl PositionSearchRequest {
    #[must_use]
    pub const fn new(ra_degrees: f64, dec_degrees: f64) -> Self {
        Self {
            ra_degrees,
            dec_degrees,
            radius_arcmin: DEFAULT_RADIUS_ARCMIN,
            public_only: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionSearchResponse {
    pub count: usize,
    pub showing: usize,
    pub position: SkyPosition,
    pub observations: Vec<ObservationRecord>,
    pub summary: String,
}

/// Input for checking whether archived observations cover a spectral line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineCoverageRequest {
    pub target_name: String,
    pub line_frequency_ghz: f64,
    pub redshift: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineCoverageResponse {
    pub target_resolved_to: Option<SkyPosition>,
    pub total_observations: usize,
    pub covering_line: usize,
    pub line_frequency_ghz: f64,
    pub redshift: f64,
    pub observed_frequency_ghz: f64,
    pub covering_observations: Vec<ObservationRecord>,
    pub summary: String,
}

/// Input for a batch of name searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSearchRequest {
    pub source_names: Vec<String>,
    pub radius_arcmin: f64,
}

impl AlmaControlPlane {
    /// Resolves a target name and searches around it.
    ///
    /// # Errors
    /// Returns `ControlError` when the name cannot be resolved, the parameters
    /// are invalid, or the archive query fails.
    pub async fn search_by_target(
        &self,
        request: TargetSearchRequest,
    ) -> Result<TargetSearchResponse, ControlError> {
        self.require_resolver()?;
        self.require_positional()?;
        let target_name = request.target_name.trim();
        if target_name.is_empty() {
            return Err(ValidationError::new("target_name is required").into());
        }
        validate_radius(request.radius_arcmin)?;

        let coordinate = self.resolve(target_name).await?;
        let spec = QueryBuilder::cone(QueryFamily::Position, &ConeSearch {
            ra_degrees: coordinate.ra_degrees,
            dec_degrees: coordinate.dec_degrees,
            radius_deg: arcmin_to_degrees(request.radius_arcmin),
            public_only: request.public_only,
            row_cap: RowCap::default(),
        })?;
        let table = self.fetch(&spec, "ALMA search").await?;
        let page = ObservationPage::capped(&table);
        let summary = if page.count == 0 {
            format!("No ALMA observations found for {target_name}")
        } else {
            format!("Found {} ALMA observations for {target_name}", page.count)
        };
        Ok(TargetSearchResponse {
            count: page.count,
            showing: page.showing,
            target_resolved_to: sky_position(coordinate),
            observations: page.observations,
            summary,
        })
    }

    /// Searches around explicit ICRS coordinates.
    ///
    /// # Errors
    /// Returns `ControlError` for out-of-range coordinates or a failed query.
    pub async fn search_by_position(
        &self,
        request: PositionSearchRequest,
    ) -> Result<PositionSearchResponse, ControlError> {
        self.require_positional()?;
        validate_radius(request.radius_arcmin)?;
        let spec = QueryBuilder::cone(QueryFamily::Position, &ConeSearch {
            ra_degrees: request.ra_degrees,
            dec_degrees: request.dec_degrees,
            radius_deg: arcmin_to_degrees(request.radius_arcmin),
            public_only: request.public_only,
            row_cap: RowCap::default(),
        })?;
        let table = self.fetch(&spec, "Position search").await?;
        let page = ObservationPage::capped(&table);
        let (ra, dec) = (request.ra_degrees, request.dec_degrees);
        let summary = if page.count == 0 {
            format!("No ALMA observations at RA={ra:.4}, Dec={dec:.4}")
        } else {
            format!(
                "Found {} ALMA observations near RA={ra:.4}, Dec={dec:.4}",
                page.count
            )
        };
        Ok(PositionSearchResponse {
            count: page.count,
            showing: page.showing,
            position: SkyPosition {
                ra: round_to(ra, 4),
                dec: round_to(dec, 4),
            },
            observations: page.observations,
            summary,
        })
    }

    /// Checks which observations of a target cover a (redshifted) line.
    ///
    /// # Errors
    /// Returns `ControlError` for invalid frequency or redshift, an
    /// unresolvable target, or a failed query.
    pub async fn check_line_coverage(
        &self,
        request: LineCoverageRequest,
    ) -> Result<LineCoverageResponse, ControlError> {
        self.require_resolver()?;
        self.require_positional()?;
        let LineCoverageRequest {
            target_name,
            line_frequency_ghz,
            redshift,
        } = request;
        let target_name = target_name.trim().to_string();
        if target_name.is_empty() {
            return Err(ValidationError::new("target_name is required").into());
        }
        if !(line_frequency_ghz.is_finite() && line_frequency_ghz > 0.0) {
            return Err(ValidationError::new("line_frequency_ghz must be positive").into());
        }
        if !(redshift.is_finite() && redshift > -1.0) {
            return Err(ValidationError::new("redshift must be greater than -1").into());
        }

        let coordinate = self.resolve(&target_name).await?;
        let spec = QueryBuilder::cone(QueryFamily::LineCoverage, &ConeSearch {
            ra_degrees: coordinate.ra_degrees,
            dec_degrees: coordinate.dec_degrees,
            radius_deg: LINE_COVERAGE_RADIUS_DEG,
            public_only: false,
            row_cap: RowCap::default(),
        })?;
        let table = self.fetch(&spec, "Line coverage check").await?;
        let observed = observed_frequency(line_frequency_ghz, redshift);

        let covering: Vec<ObservationRecord> = table
            .rows()
            .filter(|row| spectral_windows(row).iter().any(|window| window.contains(observed)))
            .map(|row| normalize_row(&row))
            .collect();
        let total = table.len();
        let covering_line = covering.len();
        let summary = if total == 0 {
            format!("No ALMA observations found for {target_name}")
        } else if covering_line == 0 {
            format!("None of the {total} observations cover {line_frequency_ghz} GHz at z={redshift}")
        } else {
            format!("{covering_line} of {total} observations cover the line")
        };
        Ok(LineCoverageResponse {
            target_resolved_to: Some(sky_position(coordinate)),
            total_observations: total,
            covering_line,
            line_frequency_ghz,
            redshift,
            observed_frequency_ghz: round_to(observed, 4),
            covering_observations: covering.into_iter().take(DISPLAY_CAP).collect(),
            summary,
        })
    }

    /// Resolves and searches up to twenty names; per-name failures are isolated.
    ///
    /// # Errors
    /// Returns `ControlError` only when a required collaborator is missing or
    /// the request itself is invalid.
    pub async fn query_multiple_sources(
        &self,
        request: BatchSearchRequest,
    ) -> Result<BatchReport, ControlError> {
        self.require_resolver()?;
        self.require_positional()?;
        if request.source_names.is_empty() {
            return Err(ValidationError::new("source_names must contain at least one name").into());
        }
        validate_radius(request.radius_arcmin)?;

        let plan = BatchPlan::new(&request.source_names);
        let radius_deg = arcmin_to_degrees(request.radius_arcmin);
        let concurrency = self.services().batch_concurrency();
        Ok(run_batch(plan, concurrency, |source| self.batch_item(source, radius_deg)).await)
    }

    async fn batch_item(&self, source: String, radius_deg: f64) -> BatchItemResult {
        let coordinate = match self.resolve(&source).await {
            Ok(coordinate) => coordinate,
            Err(failure) => {
                warn!(source = %source, error = %failure, "batch source not resolved");
                return BatchItemResult::NotResolved {
                    count: 0,
                    reason: failure.reason(),
                    message: failure.to_string(),
                };
            }
        };
        let coordinates = sky_position(coordinate);
        let spec = QueryBuilder::cone(QueryFamily::Position, &ConeSearch {
            ra_degrees: coordinate.ra_degrees,
            dec_degrees: coordinate.dec_degrees,
            radius_deg,
            public_only: false,
            row_cap: RowCap::fixed(BATCH_ROW_CAP),
        });
        let table = match spec {
            Ok(spec) => self.fetch(&spec, "ALMA search").await,
            Err(err) => Err(err.into()),
        };
        match table {
            Ok(table) if table.is_empty() => BatchItemResult::NoData {
                count: 0,
                coordinates,
                message: "No ALMA observations found".to_string(),
            },
            Ok(table) => {
                let mut bands_observed: Vec<String> = Vec::new();
                for record in normalize_table(&table) {
                    if !bands_observed.contains(&record.band) {
                        bands_observed.push(record.band);
                    }
                }
                BatchItemResult::Found {
                    count: table.len(),
                    coordinates,
                    bands_observed,
                    message: format!("Found {} ALMA observations", table.len()),
                }
            }
            Err(err) => {
                warn!(source = %source, error = %err, "batch source search failed");
                BatchItemResult::Error {
                    count: 0,
                    message: err.to_string(),
                }
            }
        }
    }
}

fn validate_radius(radius_arcmin: f64) -> Result<(), ValidationError> {
    if radius_arcmin.is_finite() && radius_arcmin > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("radius_arcmin must be a positive number"))
    }
}

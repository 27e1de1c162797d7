use alma_core::control::search::DEFAULT_RADIUS_ARCMIN;
use alma_core::control::{
    BatchSearchRequest,
    LineCoverageRequest,
    PositionSearchRequest,
    TargetSearchRequest,
};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{AlmaMcp, helpers};

/// Parameters for a name-based cone search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchByTargetParams {
    /// Object name understood by the SIMBAD, NED or `VizieR` resolvers, e.g. `M87`.
    pub target_name: String,
    /// Search radius in arcminutes (default 1.0).
    pub radius_arcmin: Option<f64>,
    /// Only return observations whose proprietary period has ended (default true).
    pub public_only: Option<bool>,
}

/// Parameters for a coordinate cone search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchByPositionParams {
    /// ICRS right ascension in degrees, 0 to 360.
    pub ra_degrees: f64,
    /// ICRS declination in degrees, -90 to 90.
    pub dec_degrees: f64,
    pub radius_arcmin: Option<f64>,
    pub public_only: Option<bool>,
}

/// Parameters for a spectral line coverage check.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LineCoverageParams {
    pub target_name: String,
    /// Rest frequency of the line in gigahertz, e.g. 230.538 for CO(2-1).
    pub line_frequency_ghz: f64,
    /// Source redshift (default 0.0).
    pub redshift: Option<f64>,
}

/// Parameters for searching many names at once.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MultipleSourcesParams {
    /// Object names; only the first 20 are searched.
    pub source_names: Vec<String>,
    pub radius_arcmin: Option<f64>,
}

#[tool_router(router = tool_router_search, vis = "pub")]
impl AlmaMcp {
    #[tool(description = "Resolve an object name and search the ALMA archive around it.")]
    async fn search_alma_by_target(
        &self,
        Parameters(params): Parameters<SearchByTargetParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let mut request = TargetSearchRequest::new(params.target_name);
        request.radius_arcmin = params.radius_arcmin.unwrap_or(DEFAULT_RADIUS_ARCMIN);
        request.public_only = params.public_only.unwrap_or(true);
        helpers::tool_result(self.control().search_by_target(request).await)
    }

    #[tool(description = "Search the ALMA archive around ICRS coordinates in degrees.")]
    async fn search_alma_by_position(
        &self,
        Parameters(params): Parameters<SearchByPositionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let mut request = PositionSearchRequest::new(params.ra_degrees, params.dec_degrees);
        request.radius_arcmin = params.radius_arcmin.unwrap_or(DEFAULT_RADIUS_ARCMIN);
        request.public_only = params.public_only.unwrap_or(true);
        helpers::tool_result(self.control().search_by_position(request).await)
    }

    #[tool(description = "Check which ALMA observations of a target cover a spectral line at a given redshift.")]
    async fn check_alma_line_coverage(
        &self,
        Parameters(params): Parameters<LineCoverageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = LineCoverageRequest {
            target_name: params.target_name,
            line_frequency_ghz: params.line_frequency_ghz,
            redshift: params.redshift.unwrap_or(0.0),
        };
        helpers::tool_result(self.control().check_line_coverage(request).await)
    }

    #[tool(description = "Search the ALMA archive for up to 20 object names in one call.")]
    async fn query_alma_multiple_sources(
        &self,
        Parameters(params): Parameters<MultipleSourcesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = BatchSearchRequest {
            source_names: params.source_names,
            radius_arcmin: params.radius_arcmin.unwrap_or(DEFAULT_RADIUS_ARCMIN),
        };
        helpers::tool_result(self.control().query_multiple_sources(request).await)
    }

    #[tool(description = "ALMA bands, common spectral lines, science categories, and archive service availability.")]
    async fn get_alma_info(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(self.control().get_alma_info())?]))
    }
}

use alma_core::control::RawQueryRequest;
use alma_core::query::{
    AbstractSearch,
    BibliographySearch,
    DataTypeSearch,
    FrequencySearch,
    MemberOusSearch,
    ProposalSearch,
    ResolutionSearch,
    ScienceKeywordSearch,
    SensitivitySearch,
    SensitivityType,
    SourceNameSearch,
};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{AlmaMcp, helpers};

/// Parameters for searching by proposal metadata. At least one is required.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProposalParams {
    /// Project code fragment, e.g. `2019.1.00001.S`.
    pub proposal_id: Option<String>,
    pub pi_name: Option<String>,
    pub science_category: Option<String>,
}

/// Parameters for searching by observed frequency.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FrequencyParams {
    pub min_freq_ghz: f64,
    pub max_freq_ghz: f64,
    pub target_name: Option<String>,
}

/// Parameters for searching by angular resolution.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResolutionParams {
    pub max_resolution_arcsec: f64,
    /// Lower bound in arcsec (default 0.0).
    pub min_resolution_arcsec: Option<f64>,
    pub target_name: Option<String>,
}

/// Parameters for searching archive target names as recorded.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SourceNameParams {
    pub source_name: String,
    /// Match the whole name instead of a substring (default false).
    pub exact_match: Option<bool>,
}

/// Parameters for searching by publication. At least one is required.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BibliographyParams {
    pub bibcode: Option<String>,
    pub journal_name: Option<String>,
    pub first_author: Option<String>,
    pub publication_year: Option<i64>,
}

/// Parameters for listing a member observing unit set.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MemberOusParams {
    /// Either `uid://A001/X123/X456` or `uid___A001_X123_X456`.
    pub member_ous_id: String,
}

/// Parameters for searching by data product type.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DataTypeParams {
    /// `cube` or `image`.
    pub data_type: String,
    pub target_name: Option<String>,
    pub science_keyword: Option<String>,
    /// ALMA receiver band, 1 to 10.
    pub band: Option<i64>,
}

/// Parameters for searching by science keyword.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScienceKeywordParams {
    pub science_keyword: String,
    pub data_type: Option<String>,
    pub band: Option<i64>,
    /// Skip calibrator data (default true).
    pub science_observation_only: Option<bool>,
}

/// Parameters for searching proposal abstracts.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AbstractParams {
    pub search_terms: String,
    /// Also search publication abstracts (default false).
    pub search_pub_abstract: Option<bool>,
}

/// Parameters for searching by sensitivity.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SensitivityParams {
    /// Upper limit in `mJy/beam`.
    pub max_sensitivity_mjy: f64,
    /// `continuum` (default) or `line`.
    pub sensitivity_type: Option<String>,
    pub target_name: Option<String>,
    pub band: Option<i64>,
}

/// Parameters for a custom ADQL query.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TapQueryParams {
    /// A single ADQL `SELECT` over `ivoa.obscore`.
    pub sql_query: String,
    /// Row limit (default 100, at most 1000).
    pub max_rows: Option<i64>,
}

#[tool_router(router = tool_router_catalog, vis = "pub")]
impl AlmaMcp {
    #[tool(description = "Search ALMA observations by proposal id, PI name, or science category.")]
    async fn search_alma_by_proposal(
        &self,
        Parameters(params): Parameters<ProposalParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = ProposalSearch {
            proposal_id: params.proposal_id,
            pi_name: params.pi_name,
            science_category: params.science_category,
        };
        helpers::tool_result(self.control().search_by_proposal(&search).await)
    }

    #[tool(description = "Search ALMA observations whose frequency lies in a GHz range.")]
    async fn search_alma_by_frequency(
        &self,
        Parameters(params): Parameters<FrequencyParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = FrequencySearch {
            min_freq_ghz: params.min_freq_ghz,
            max_freq_ghz: params.max_freq_ghz,
            target_name: params.target_name,
        };
        helpers::tool_result(self.control().search_by_frequency(&search).await)
    }

    #[tool(description = "Search ALMA observations by angular resolution in arcsec.")]
    async fn search_alma_by_resolution(
        &self,
        Parameters(params): Parameters<ResolutionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = ResolutionSearch {
            max_resolution_arcsec: params.max_resolution_arcsec,
            min_resolution_arcsec: params.min_resolution_arcsec.unwrap_or(0.0),
            target_name: params.target_name,
        };
        helpers::tool_result(self.control().search_by_resolution(&search).await)
    }

    #[tool(description = "Search ALMA target names as recorded in the archive, without name resolution.")]
    async fn search_alma_by_source_name(
        &self,
        Parameters(params): Parameters<SourceNameParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = SourceNameSearch {
            source_name: params.source_name,
            exact_match: params.exact_match.unwrap_or(false),
        };
        helpers::tool_result(self.control().search_by_source_name(&search).await)
    }

    #[tool(description = "Search ALMA observations by bibcode, journal, first author, or publication year.")]
    async fn search_alma_by_bibliography(
        &self,
        Parameters(params): Parameters<BibliographyParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = BibliographySearch {
            bibcode: params.bibcode,
            journal_name: params.journal_name,
            first_author: params.first_author,
            publication_year: params.publication_year,
        };
        helpers::tool_result(self.control().search_by_bibliography(&search).await)
    }

    #[tool(description = "List every data product of a member observing unit set (Member OUS id).")]
    async fn search_alma_by_member_ous(
        &self,
        Parameters(params): Parameters<MemberOusParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = MemberOusSearch {
            member_ous_id: params.member_ous_id,
        };
        helpers::tool_result(self.control().search_by_member_ous(&search).await)
    }

    #[tool(description = "Search ALMA data products by type (cube or image).")]
    async fn search_alma_by_data_type(
        &self,
        Parameters(params): Parameters<DataTypeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = DataTypeSearch {
            data_type: params.data_type,
            target_name: params.target_name,
            science_keyword: params.science_keyword,
            band: params.band,
        };
        helpers::tool_result(self.control().search_by_data_type(&search).await)
    }

    #[tool(description = "Search ALMA observations by science keyword.")]
    async fn search_alma_by_science_keyword(
        &self,
        Parameters(params): Parameters<ScienceKeywordParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = ScienceKeywordSearch {
            science_keyword: params.science_keyword,
            data_type: params.data_type,
            band: params.band,
            science_observation_only: params.science_observation_only.unwrap_or(true),
        };
        helpers::tool_result(self.control().search_by_science_keyword(&search).await)
    }

    #[tool(description = "Search ALMA proposal abstracts, and optionally publication abstracts, for terms.")]
    async fn search_alma_by_abstract(
        &self,
        Parameters(params): Parameters<AbstractParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = AbstractSearch {
            search_terms: params.search_terms,
            search_pub_abstract: params.search_pub_abstract.unwrap_or(false),
        };
        helpers::tool_result(self.control().search_by_abstract(&search).await)
    }

    #[tool(description = "Search ALMA observations at or below a continuum or line sensitivity in mJy/beam.")]
    async fn search_alma_by_sensitivity(
        &self,
        Parameters(params): Parameters<SensitivityParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let search = SensitivitySearch {
            max_sensitivity_mjy: params.max_sensitivity_mjy,
            sensitivity_type: SensitivityType::parse(params.sensitivity_type.as_deref()),
            target_name: params.target_name,
            band: params.band,
        };
        helpers::tool_result(self.control().search_by_sensitivity(&search).await)
    }

    #[tool(description = "Run a single ADQL SELECT against the ALMA TAP service (table ivoa.obscore).")]
    async fn run_alma_tap_query(
        &self,
        Parameters(params): Parameters<TapQueryParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = RawQueryRequest {
            sql_query: params.sql_query,
            max_rows: params.max_rows,
        };
        helpers::tool_result(self.control().run_raw_query(&request).await)
    }
}

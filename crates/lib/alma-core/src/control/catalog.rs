use alma_store::ObservationRecord;
use alma_store::schema::{COL_PROPOSAL_ID, COL_TARGET_NAME};
use alma_store::DataProductType;
use serde::{Deserialize, Serialize};

use crate::query::{
    AbstractSearch,
    BibliographySearch,
    DataTypeSearch,
    FrequencySearch,
    MemberOusSearch,
    ProposalSearch,
    QueryBuilder,
    ResolutionSearch,
    ScienceKeywordSearch,
    SensitivitySearch,
    SourceNameSearch,
    normalize_uid,
};

use super::{
    AlmaControlPlane,
    ControlError,
    ObservationListResponse,
    ObservationPage,
    unique_values,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrequencySearchResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub frequency_range_ghz: [f64; 2],
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionSearchResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub resolution_range_arcsec: [f64; 2],
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceNameSearchResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub unique_targets_found: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberOusResponse {
    pub count: usize,
    pub member_ous_id: String,
    pub observations: Vec<ObservationRecord>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataTypeSearchResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub data_type: DataProductType,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScienceKeywordSearchResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub science_keyword: String,
    pub unique_targets: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbstractSearchResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub search_terms: String,
    pub unique_proposals: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensitivitySearchResponse {
    #[serde(flatten)]
    pub page: ObservationPage,
    pub max_sensitivity_mjy: f64,
    pub sensitivity_type: String,
    pub summary: String,
}

impl AlmaControlPlane {
    /// Searches by proposal id, PI name or science category.
    ///
    /// # Errors
    /// Returns `ControlError` if no filter is given or the query fails.
    pub async fn search_by_proposal(
        &self,
        search: &ProposalSearch,
    ) -> Result<ObservationListResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::proposal(search)?;
        let table = self.fetch(&spec, "Proposal search").await?;
        let page = ObservationPage::capped(&table);
        let summary = if page.count == 0 {
            "No matching observations found".to_string()
        } else {
            format!("Found {} observations matching criteria", page.count)
        };
        Ok(ObservationListResponse { page, summary })
    }

    /// Searches by observed frequency range in gigahertz.
    ///
    /// # Errors
    /// Returns `ControlError` for invalid bounds or a failed query.
    pub async fn search_by_frequency(
        &self,
        search: &FrequencySearch,
    ) -> Result<FrequencySearchResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::frequency(search)?;
        let table = self.fetch(&spec, "Frequency search").await?;
        let page = ObservationPage::capped(&table);
        let (min, max) = (search.min_freq_ghz, search.max_freq_ghz);
        let summary = if page.count == 0 {
            format!("No observations found in {min}-{max} GHz range")
        } else {
            format!("Found {} observations in {min}-{max} GHz range", page.count)
        };
        Ok(FrequencySearchResponse {
            page,
            frequency_range_ghz: [min, max],
            summary,
        })
    }

    /// Searches by angular resolution range in arcsec.
    ///
    /// # Errors
    /// Returns `ControlError` for invalid bounds or a failed query.
    pub async fn search_by_resolution(
        &self,
        search: &ResolutionSearch,
    ) -> Result<ResolutionSearchResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::resolution(search)?;
        let table = self.fetch(&spec, "Resolution search").await?;
        let page = ObservationPage::capped(&table);
        let (min, max) = (search.min_resolution_arcsec, search.max_resolution_arcsec);
        let summary = if page.count == 0 {
            format!("No observations found with resolution {min}-{max} arcsec")
        } else {
            format!("Found {} observations with resolution < {max} arcsec", page.count)
        };
        Ok(ResolutionSearchResponse {
            page,
            resolution_range_arcsec: [min, max],
            summary,
        })
    }

    /// Searches archive target names directly, without resolving them.
    ///
    /// # Errors
    /// Returns `ControlError` for a blank name or a failed query.
    pub async fn search_by_source_name(
        &self,
        search: &SourceNameSearch,
    ) -> Result<SourceNameSearchResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::source_name(search)?;
        let table = self.fetch(&spec, "Source name search").await?;
        let unique_targets_found = unique_values(&table, COL_TARGET_NAME);
        let page = ObservationPage::capped(&table);
        let name = search.source_name.trim();
        let summary = if page.count == 0 {
            format!("No ALMA observations found with source name '{name}'")
        } else {
            format!("Found {} observations matching source name '{name}'", page.count)
        };
        Ok(SourceNameSearchResponse {
            page,
            unique_targets_found,
            summary,
        })
    }

    /// Searches by publication metadata.
    ///
    /// # Errors
    /// Returns `ControlError` if no filter is given or the query fails.
    pub async fn search_by_bibliography(
        &self,
        search: &BibliographySearch,
    ) -> Result<ObservationListResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::bibliography(search)?;
        let table = self.fetch(&spec, "Bibliography search").await?;
        let page = ObservationPage::capped(&table);
        let summary = if page.count == 0 {
            "No ALMA observations found with matching bibliography".to_string()
        } else {
            format!("Found {} observations with matching publications", page.count)
        };
        Ok(ObservationListResponse { page, summary })
    }

    /// Lists every data product of one member observing unit set.
    ///
    /// # Errors
    /// Returns `ControlError` for a blank identifier or a failed query.
    pub async fn search_by_member_ous(
        &self,
        search: &MemberOusSearch,
    ) -> Result<MemberOusResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::member_ous(search)?;
        let member_ous_id = normalize_uid(&search.member_ous_id);
        let table = self.fetch(&spec, "Member OUS search").await?;
        let page = ObservationPage::uncapped(&table);
        let summary = if page.count == 0 {
            format!("No ALMA data found for Member OUS ID '{member_ous_id}'")
        } else {
            format!("Found {} data products for Member OUS ID", page.count)
        };
        Ok(MemberOusResponse {
            count: page.count,
            member_ous_id,
            observations: page.observations,
            summary,
        })
    }

    /// Searches by data product type (`cube` or `image`).
    ///
    /// # Errors
    /// Returns `ControlError` for an unknown type or band, or a failed query.
    pub async fn search_by_data_type(
        &self,
        search: &DataTypeSearch,
    ) -> Result<DataTypeSearchResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::data_type(search)?;
        let data_type = DataProductType::parse(&search.data_type);
        let table = self.fetch(&spec, "Data type search").await?;
        let page = ObservationPage::capped(&table);
        let summary = if page.count == 0 {
            format!("No {data_type} observations found matching criteria")
        } else {
            format!("Found {} {data_type} observations", page.count)
        };
        Ok(DataTypeSearchResponse {
            page,
            data_type,
            summary,
        })
    }

    /// Searches by science keyword.
    ///
    /// # Errors
    /// Returns `ControlError` for invalid filters or a failed query.
    pub async fn search_by_science_keyword(
        &self,
        search: &ScienceKeywordSearch,
    ) -> Result<ScienceKeywordSearchResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::science_keyword(search)?;
        let table = self.fetch(&spec, "Science keyword search").await?;
        let unique_targets = unique_values(&table, COL_TARGET_NAME);
        let page = ObservationPage::capped(&table);
        let keyword = search.science_keyword.trim().to_string();
        let summary = if page.count == 0 {
            format!("No observations found with science keyword '{keyword}'")
        } else {
            format!("Found {} observations with science keyword '{keyword}'", page.count)
        };
        Ok(ScienceKeywordSearchResponse {
            page,
            science_keyword: keyword,
            unique_targets,
            summary,
        })
    }

    /// Full-text search over proposal (and optionally publication) abstracts.
    ///
    /// # Errors
    /// Returns `ControlError` for blank terms or a failed query.
    pub async fn search_by_abstract(
        &self,
        search: &AbstractSearch,
    ) -> Result<AbstractSearchResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::abstract_terms(search)?;
        let table = self.fetch(&spec, "Abstract search").await?;
        let unique_proposals = unique_values(&table, COL_PROPOSAL_ID);
        let page = ObservationPage::capped(&table);
        let terms = search.search_terms.trim().to_string();
        let summary = if page.count == 0 {
            format!("No proposals found with abstract containing '{terms}'")
        } else {
            format!(
                "Found {} observations from proposals mentioning '{terms}'",
                page.count
            )
        };
        Ok(AbstractSearchResponse {
            page,
            search_terms: terms,
            unique_proposals,
            summary,
        })
    }

    /// Searches by continuum or line sensitivity in `mJy/beam`.
    ///
    /// # Errors
    /// Returns `ControlError` for an invalid limit or band, or a failed query.
    pub async fn search_by_sensitivity(
        &self,
        search: &SensitivitySearch,
    ) -> Result<SensitivitySearchResponse, ControlError> {
        self.require_declarative()?;
        let spec = QueryBuilder::sensitivity(search)?;
        let table = self.fetch(&spec, "Sensitivity search").await?;
        let page = ObservationPage::capped(&table);
        let kind = search.sensitivity_type.as_str();
        let max = search.max_sensitivity_mjy;
        let summary = if page.count == 0 {
            format!("No observations found with {kind} sensitivity <= {max} mJy/beam")
        } else {
            format!(
                "Found {} observations with {kind} sensitivity <= {max} mJy/beam",
                page.count
            )
        };
        Ok(SensitivitySearchResponse {
            page,
            max_sensitivity_mjy: max,
            sensitivity_type: kind.to_string(),
            summary,
        })
    }
}

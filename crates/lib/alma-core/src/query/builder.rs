use alma_store::DataProductType;
use alma_store::schema::{
    ALIAS_SENSITIVITY,
    COL_ACCESS_URL,
    COL_BAND_LIST,
    COL_BANDWIDTH,
    COL_BIB_REFERENCE,
    COL_CONT_SENSITIVITY,
    COL_DATA_RIGHTS,
    COL_DATAPRODUCT_TYPE,
    COL_DEC,
    COL_EM_MAX,
    COL_EM_MIN,
    COL_EXPOSURE_TIME,
    COL_FIRST_AUTHOR,
    COL_FREQUENCY,
    COL_FREQUENCY_SUPPORT,
    COL_LINE_SENSITIVITY,
    COL_MEMBER_OUS_UID,
    COL_PI_NAME,
    COL_PROPOSAL_ABSTRACT,
    COL_PROPOSAL_ID,
    COL_PUB_ABSTRACT,
    COL_PUB_TITLE,
    COL_PUBLICATION_YEAR,
    COL_RA,
    COL_RESOLUTION,
    COL_SCIENCE_KEYWORD,
    COL_SCIENCE_OBSERVATION,
    COL_SCIENTIFIC_CATEGORY,
    COL_TARGET_NAME,
    DATA_RIGHTS_PUBLIC,
    MAX_ROW_CAP,
    SCIENCE_OBSERVATION_TRUE,
};

use super::{Bound, Cone, Literal, Predicate, QueryFamily, QuerySpec, RowCap, Selection, ValidationError};

const POSITION_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_FREQUENCY,
    COL_BANDWIDTH,
    COL_EXPOSURE_TIME,
    COL_RESOLUTION,
    COL_DATAPRODUCT_TYPE,
];

const LINE_COVERAGE_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_FREQUENCY,
    COL_BANDWIDTH,
    COL_FREQUENCY_SUPPORT,
    COL_EM_MIN,
    COL_EM_MAX,
    COL_DATAPRODUCT_TYPE,
];

const PROPOSAL_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_PI_NAME,
    COL_SCIENTIFIC_CATEGORY,
    COL_EXPOSURE_TIME,
];

const SPECTRAL_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_FREQUENCY,
    COL_BANDWIDTH,
    COL_EXPOSURE_TIME,
    COL_RESOLUTION,
];

const SOURCE_NAME_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_FREQUENCY,
    COL_EXPOSURE_TIME,
    COL_RESOLUTION,
    COL_DATAPRODUCT_TYPE,
];

const BIBLIOGRAPHY_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_BIB_REFERENCE,
    COL_FIRST_AUTHOR,
    COL_PUBLICATION_YEAR,
    COL_PUB_TITLE,
];

const PRODUCT_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_FREQUENCY,
    COL_EXPOSURE_TIME,
    COL_RESOLUTION,
    COL_SCIENCE_KEYWORD,
    COL_DATAPRODUCT_TYPE,
    COL_ACCESS_URL,
];

const ABSTRACT_COLUMNS: &[&str] = &[
    COL_TARGET_NAME,
    COL_RA,
    COL_DEC,
    COL_BAND_LIST,
    COL_PROPOSAL_ID,
    COL_PI_NAME,
    COL_SCIENCE_KEYWORD,
    COL_EXPOSURE_TIME,
];

const MIN_BAND: i64 = 1;
const MAX_BAND: i64 = 10;

/// Positional cone search.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeSearch {
    pub ra_degrees: f64,
    pub dec_degrees: f64,
    pub radius_deg: f64,
    pub public_only: bool,
    pub row_cap: RowCap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalSearch {
    pub proposal_id: Option<String>,
    pub pi_name: Option<String>,
    pub science_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySearch {
    pub min_freq_ghz: f64,
    pub max_freq_ghz: f64,
    pub target_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionSearch {
    pub max_resolution_arcsec: f64,
    pub min_resolution_arcsec: f64,
    pub target_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNameSearch {
    pub source_name: String,
    pub exact_match: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibliographySearch {
    pub bibcode: Option<String>,
    pub journal_name: Option<String>,
    pub first_author: Option<String>,
    pub publication_year: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOusSearch {
    pub member_ous_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeSearch {
    pub data_type: String,
    pub target_name: Option<String>,
    pub science_keyword: Option<String>,
    pub band: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScienceKeywordSearch {
    pub science_keyword: String,
    pub data_type: Option<String>,
    pub band: Option<i64>,
    pub science_observation_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractSearch {
    pub search_terms: String,
    pub search_pub_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivitySearch {
    pub max_sensitivity_mjy: f64,
    pub sensitivity_type: SensitivityType,
    pub target_name: Option<String>,
    pub band: Option<i64>,
}

/// Which sensitivity measurement a search filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensitivityType {
    #[default]
    Continuum,
    Line,
}

impl SensitivityType {
    /// Parses the discriminator; anything but `line` means continuum.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|value| value.trim().to_ascii_lowercase()) {
            Some(value) if value == "line" => Self::Line,
            _ => Self::Continuum,
        }
    }

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Continuum => COL_CONT_SENSITIVITY,
            Self::Line => COL_LINE_SENSITIVITY,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuum => "continuum",
            Self::Line => "line",
        }
    }
}

/// Rewrites `uid___A001_X123_X456` style identifiers into `uid://A001/X123/X456`.
///
/// Input already in URI form is returned trimmed and otherwise untouched.
#[must_use]
pub fn normalize_uid(value: &str) -> String {
    let value = value.trim();
    if value.contains("://") || !value.contains('_') {
        return value.to_string();
    }

    let mut normalized = String::with_capacity(value.len() + 2);
    let mut seen_separator = false;
    let mut in_separator = false;
    for ch in value.chars() {
        if ch == '_' {
            in_separator = true;
            continue;
        }
        if in_separator {
            normalized.push_str(if seen_separator { "/" } else { "://" });
            seen_separator = true;
            in_separator = false;
        }
        normalized.push(ch);
    }
    normalized
}

/// Builds [`QuerySpec`]s for each query family, validating parameters first.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Builds a cone query for position or line-coverage searches.
    ///
    /// # Errors
    /// Returns `ValidationError` when coordinates or radius are out of range.
    pub fn cone(family: QueryFamily, search: &ConeSearch) -> Result<QuerySpec, ValidationError> {
        validate_position(search.ra_degrees, search.dec_degrees)?;
        if !(search.radius_deg.is_finite() && search.radius_deg > 0.0) {
            return Err(ValidationError::new("radius must be a positive number"));
        }

        let columns = if family == QueryFamily::LineCoverage {
            LINE_COVERAGE_COLUMNS
        } else {
            POSITION_COLUMNS
        };
        let mut spec = QuerySpec::new(family, Selection::columns(columns.iter().copied()))
            .with_row_cap(search.row_cap)
            .with_predicate(Predicate::Cone(Cone {
                ra_deg: search.ra_degrees,
                dec_deg: search.dec_degrees,
                radius_deg: search.radius_deg,
            }));
        if search.public_only {
            spec = spec.with_predicate(equals_text(COL_DATA_RIGHTS, DATA_RIGHTS_PUBLIC));
        }
        Ok(spec)
    }

    /// # Errors
    /// Returns `ValidationError` when no proposal filter is supplied.
    pub fn proposal(search: &ProposalSearch) -> Result<QuerySpec, ValidationError> {
        let mut spec = QuerySpec::new(
            QueryFamily::Proposal,
            Selection::columns(PROPOSAL_COLUMNS.iter().copied()),
        );
        if let Some(proposal_id) = non_empty(search.proposal_id.as_deref()) {
            spec = spec.with_predicate(contains(COL_PROPOSAL_ID, proposal_id));
        }
        if let Some(pi_name) = non_empty(search.pi_name.as_deref()) {
            spec = spec.with_predicate(contains(COL_PI_NAME, pi_name));
        }
        if let Some(category) = non_empty(search.science_category.as_deref()) {
            spec = spec.with_predicate(contains(COL_SCIENTIFIC_CATEGORY, category));
        }
        if spec.predicates.is_empty() {
            return Err(ValidationError::new(
                "Must provide at least one search parameter (proposal_id, pi_name, or science_category)",
            ));
        }
        Ok(spec)
    }

    /// # Errors
    /// Returns `ValidationError` for non-positive or inverted bounds.
    pub fn frequency(search: &FrequencySearch) -> Result<QuerySpec, ValidationError> {
        let FrequencySearch {
            min_freq_ghz,
            max_freq_ghz,
            ..
        } = *search;
        if !(min_freq_ghz.is_finite() && max_freq_ghz.is_finite())
            || min_freq_ghz <= 0.0
            || max_freq_ghz <= 0.0
        {
            return Err(ValidationError::new("frequencies must be positive numbers in GHz"));
        }
        if min_freq_ghz > max_freq_ghz {
            return Err(ValidationError::new(
                "min_freq_ghz must not be greater than max_freq_ghz",
            ));
        }

        // The obscore frequency column is expressed in GHz.
        let mut spec = QuerySpec::new(
            QueryFamily::Frequency,
            Selection::columns(SPECTRAL_COLUMNS.iter().copied()),
        )
        .with_predicate(Predicate::Range {
            column: COL_FREQUENCY,
            lower: Bound::Inclusive(min_freq_ghz),
            upper: Bound::Inclusive(max_freq_ghz),
        })
        .with_order_by(COL_FREQUENCY);
        if let Some(target) = non_empty(search.target_name.as_deref()) {
            spec = spec.with_predicate(contains(COL_TARGET_NAME, target));
        }
        Ok(spec)
    }

    /// # Errors
    /// Returns `ValidationError` for negative or inverted bounds.
    pub fn resolution(search: &ResolutionSearch) -> Result<QuerySpec, ValidationError> {
        let ResolutionSearch {
            max_resolution_arcsec,
            min_resolution_arcsec,
            ..
        } = *search;
        if !(max_resolution_arcsec.is_finite() && max_resolution_arcsec > 0.0) {
            return Err(ValidationError::new(
                "max_resolution_arcsec must be a positive number",
            ));
        }
        if !(min_resolution_arcsec.is_finite() && min_resolution_arcsec >= 0.0) {
            return Err(ValidationError::new(
                "min_resolution_arcsec must not be negative",
            ));
        }
        if min_resolution_arcsec > max_resolution_arcsec {
            return Err(ValidationError::new(
                "min_resolution_arcsec must not be greater than max_resolution_arcsec",
            ));
        }

        // The obscore s_resolution column is expressed in arcsec.
        let mut spec = QuerySpec::new(
            QueryFamily::Resolution,
            Selection::columns(SPECTRAL_COLUMNS.iter().copied()),
        )
        .with_predicate(Predicate::Range {
            column: COL_RESOLUTION,
            lower: Bound::Inclusive(min_resolution_arcsec),
            upper: Bound::Inclusive(max_resolution_arcsec),
        })
        .with_order_by(COL_RESOLUTION);
        if let Some(target) = non_empty(search.target_name.as_deref()) {
            spec = spec.with_predicate(contains(COL_TARGET_NAME, target));
        }
        Ok(spec)
    }

    /// # Errors
    /// Returns `ValidationError` when the source name is blank.
    pub fn source_name(search: &SourceNameSearch) -> Result<QuerySpec, ValidationError> {
        let source_name = required(Some(search.source_name.as_str()), "source_name")?;
        let predicate = if search.exact_match {
            equals_text(COL_TARGET_NAME, source_name)
        } else {
            contains(COL_TARGET_NAME, source_name)
        };
        Ok(QuerySpec::new(
            QueryFamily::SourceName,
            Selection::columns(SOURCE_NAME_COLUMNS.iter().copied()),
        )
        .with_predicate(predicate))
    }

    /// # Errors
    /// Returns `ValidationError` when no bibliographic filter is supplied.
    pub fn bibliography(search: &BibliographySearch) -> Result<QuerySpec, ValidationError> {
        let mut spec = QuerySpec::new(
            QueryFamily::Bibliography,
            Selection::columns(BIBLIOGRAPHY_COLUMNS.iter().copied()),
        );
        if let Some(bibcode) = non_empty(search.bibcode.as_deref()) {
            spec = spec.with_predicate(contains(COL_BIB_REFERENCE, bibcode));
        }
        if let Some(journal) = non_empty(search.journal_name.as_deref()) {
            spec = spec.with_predicate(contains(COL_BIB_REFERENCE, journal));
        }
        if let Some(author) = non_empty(search.first_author.as_deref()) {
            spec = spec.with_predicate(contains(COL_FIRST_AUTHOR, author));
        }
        if let Some(year) = search.publication_year {
            spec = spec.with_predicate(Predicate::Equals {
                column: COL_PUBLICATION_YEAR,
                value: Literal::Integer(year),
            });
        }
        if spec.predicates.is_empty() {
            return Err(ValidationError::new(
                "Must provide at least one search parameter (bibcode, journal_name, first_author, or publication_year)",
            ));
        }
        Ok(spec)
    }

    /// Builds an exact lookup by member OUS id; all columns, all rows.
    ///
    /// # Errors
    /// Returns `ValidationError` when the identifier is blank.
    pub fn member_ous(search: &MemberOusSearch) -> Result<QuerySpec, ValidationError> {
        let id = required(Some(search.member_ous_id.as_str()), "member_ous_id")?;
        let normalized = normalize_uid(id);
        Ok(QuerySpec::new(QueryFamily::MemberOus, Selection::All)
            .with_row_cap(RowCap::fixed(MAX_ROW_CAP))
            .with_predicate(equals_text(COL_MEMBER_OUS_UID, &normalized)))
    }

    /// # Errors
    /// Returns `ValidationError` for an unknown data type or band.
    pub fn data_type(search: &DataTypeSearch) -> Result<QuerySpec, ValidationError> {
        let data_type = parse_data_type(&search.data_type)?;
        let mut spec = QuerySpec::new(
            QueryFamily::DataType,
            Selection::columns(PRODUCT_COLUMNS.iter().copied()),
        )
        .with_predicate(equals_text(COL_DATAPRODUCT_TYPE, data_type.as_str()))
        .with_predicate(equals_text(COL_SCIENCE_OBSERVATION, SCIENCE_OBSERVATION_TRUE));
        if let Some(target) = non_empty(search.target_name.as_deref()) {
            spec = spec.with_predicate(contains(COL_TARGET_NAME, target));
        }
        if let Some(keyword) = non_empty(search.science_keyword.as_deref()) {
            spec = spec.with_predicate(contains(COL_SCIENCE_KEYWORD, keyword));
        }
        if let Some(band) = search.band {
            spec = spec.with_predicate(band_predicate(band)?);
        }
        Ok(spec)
    }

    /// # Errors
    /// Returns `ValidationError` for a blank keyword, unknown data type or band.
    pub fn science_keyword(search: &ScienceKeywordSearch) -> Result<QuerySpec, ValidationError> {
        let keyword = required(Some(search.science_keyword.as_str()), "science_keyword")?;
        let mut spec = QuerySpec::new(
            QueryFamily::ScienceKeyword,
            Selection::columns(PRODUCT_COLUMNS.iter().copied()),
        )
        .with_predicate(contains(COL_SCIENCE_KEYWORD, keyword));
        if search.science_observation_only {
            spec = spec.with_predicate(equals_text(COL_SCIENCE_OBSERVATION, SCIENCE_OBSERVATION_TRUE));
        }
        if let Some(data_type) = non_empty(search.data_type.as_deref()) {
            let data_type = parse_data_type(data_type)?;
            spec = spec.with_predicate(equals_text(COL_DATAPRODUCT_TYPE, data_type.as_str()));
        }
        if let Some(band) = search.band {
            spec = spec.with_predicate(band_predicate(band)?);
        }
        Ok(spec)
    }

    /// # Errors
    /// Returns `ValidationError` when no search terms are supplied.
    pub fn abstract_terms(search: &AbstractSearch) -> Result<QuerySpec, ValidationError> {
        let terms = required(Some(search.search_terms.as_str()), "search_terms")?;
        let abstract_predicate = if search.search_pub_abstract {
            Predicate::ContainsAny {
                columns: vec![COL_PROPOSAL_ABSTRACT, COL_PUB_ABSTRACT],
                needle: terms.to_string(),
            }
        } else {
            contains(COL_PROPOSAL_ABSTRACT, terms)
        };
        Ok(QuerySpec::new(
            QueryFamily::Abstract,
            Selection::columns(ABSTRACT_COLUMNS.iter().copied()),
        )
        .with_distinct(true)
        .with_predicate(abstract_predicate)
        .with_predicate(equals_text(COL_SCIENCE_OBSERVATION, SCIENCE_OBSERVATION_TRUE)))
    }

    /// # Errors
    /// Returns `ValidationError` for a non-positive limit or unknown band.
    pub fn sensitivity(search: &SensitivitySearch) -> Result<QuerySpec, ValidationError> {
        if !(search.max_sensitivity_mjy.is_finite() && search.max_sensitivity_mjy > 0.0) {
            return Err(ValidationError::new(
                "max_sensitivity_mjy must be a positive number",
            ));
        }
        let column = search.sensitivity_type.column();
        let mut spec = QuerySpec::new(
            QueryFamily::Sensitivity,
            Selection::columns([
                COL_TARGET_NAME.to_string(),
                COL_RA.to_string(),
                COL_DEC.to_string(),
                COL_BAND_LIST.to_string(),
                COL_PROPOSAL_ID.to_string(),
                format!("{column} AS {ALIAS_SENSITIVITY}"),
                COL_RESOLUTION.to_string(),
                COL_FREQUENCY.to_string(),
            ]),
        )
        .with_predicate(Predicate::Range {
            column,
            lower: Bound::Exclusive(0.0),
            upper: Bound::Inclusive(search.max_sensitivity_mjy),
        })
        .with_predicate(equals_text(COL_SCIENCE_OBSERVATION, SCIENCE_OBSERVATION_TRUE))
        .with_order_by(column);
        if let Some(target) = non_empty(search.target_name.as_deref()) {
            spec = spec.with_predicate(contains(COL_TARGET_NAME, target));
        }
        if let Some(band) = search.band {
            spec = spec.with_predicate(band_predicate(band)?);
        }
        Ok(spec)
    }
}

pub(crate) fn validate_position(ra: f64, dec: f64) -> Result<(), ValidationError> {
    if !(ra.is_finite() && (0.0..=360.0).contains(&ra)) {
        return Err(ValidationError::new("ra_degrees must be between 0 and 360"));
    }
    if !(dec.is_finite() && (-90.0..=90.0).contains(&dec)) {
        return Err(ValidationError::new("dec_degrees must be between -90 and 90"));
    }
    Ok(())
}

fn parse_data_type(value: &str) -> Result<DataProductType, ValidationError> {
    match DataProductType::parse(value) {
        DataProductType::Unknown => Err(ValidationError::new("data_type must be 'cube' or 'image'")),
        known => Ok(known),
    }
}

fn band_predicate(band: i64) -> Result<Predicate, ValidationError> {
    if !(MIN_BAND..=MAX_BAND).contains(&band) {
        return Err(ValidationError::new(format!(
            "band must be between {MIN_BAND} and {MAX_BAND}"
        )));
    }
    Ok(Predicate::HasToken {
        column: COL_BAND_LIST,
        token: band.to_string(),
    })
}

fn equals_text(column: &'static str, value: &str) -> Predicate {
    Predicate::Equals {
        column,
        value: Literal::Text(value.to_string()),
    }
}

fn contains(column: &'static str, needle: &str) -> Predicate {
    Predicate::Contains {
        column,
        needle: needle.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ValidationError> {
    non_empty(value).ok_or_else(|| ValidationError::new(format!("{name} is required")))
}

pub const TABLE_OBSCORE: &str = "ivoa.obscore";
pub const TABLE_TAP_SCHEMA_PREFIX: &str = "tap_schema.";

pub const COL_TARGET_NAME: &str = "target_name";
pub const COL_RA: &str = "s_ra";
pub const COL_DEC: &str = "s_dec";
pub const COL_BAND_LIST: &str = "band_list";
pub const COL_PROPOSAL_ID: &str = "proposal_id";
pub const COL_PI_NAME: &str = "obs_creator_name";
pub const COL_SCIENTIFIC_CATEGORY: &str = "scientific_category";
pub const COL_EXPOSURE_TIME: &str = "t_exptime";
pub const COL_FREQUENCY: &str = "frequency";
pub const COL_BANDWIDTH: &str = "bandwidth";
pub const COL_FREQUENCY_SUPPORT: &str = "frequency_support";
pub const COL_EM_MIN: &str = "em_min";
pub const COL_EM_MAX: &str = "em_max";
pub const COL_RESOLUTION: &str = "s_resolution";
pub const COL_DATAPRODUCT_TYPE: &str = "dataproduct_type";
pub const COL_SCIENCE_OBSERVATION: &str = "science_observation";
pub const COL_SCIENCE_KEYWORD: &str = "science_keyword";
pub const COL_DATA_RIGHTS: &str = "data_rights";
pub const COL_MEMBER_OUS_UID: &str = "member_ous_uid";
pub const COL_ACCESS_URL: &str = "access_url";
pub const COL_BIB_REFERENCE: &str = "bib_reference";
pub const COL_FIRST_AUTHOR: &str = "first_author";
pub const COL_PUBLICATION_YEAR: &str = "publication_year";
pub const COL_PUB_TITLE: &str = "pub_title";
pub const COL_PROPOSAL_ABSTRACT: &str = "proposal_abstract";
pub const COL_PUB_ABSTRACT: &str = "pub_abstract";
pub const COL_CONT_SENSITIVITY: &str = "cont_sensitivity_bandwidth";
pub const COL_LINE_SENSITIVITY: &str = "sensitivity_10kms";

/// Alias used when a sensitivity column is projected under a neutral name.
pub const ALIAS_SENSITIVITY: &str = "sensitivity";

pub const DATA_RIGHTS_PUBLIC: &str = "Public";
pub const SCIENCE_OBSERVATION_TRUE: &str = "T";

// Field synonyms, declarative (obscore) name first, cone-search variants after.
pub const TARGET_FIELDS: &[&str] = &[COL_TARGET_NAME, "target"];
pub const RA_FIELDS: &[&str] = &[COL_RA, "ra"];
pub const DEC_FIELDS: &[&str] = &[COL_DEC, "dec"];
pub const BAND_FIELDS: &[&str] = &[COL_BAND_LIST, "band"];
pub const PROPOSAL_FIELDS: &[&str] = &[COL_PROPOSAL_ID, "project_code"];
pub const PI_FIELDS: &[&str] = &[COL_PI_NAME, "pi_name"];
pub const INTEGRATION_FIELDS: &[&str] = &[COL_EXPOSURE_TIME, "integration_time"];
pub const FREQUENCY_FIELDS: &[&str] = &[COL_FREQUENCY, "freq"];
pub const BANDWIDTH_FIELDS: &[&str] = &[COL_BANDWIDTH, "bw"];
pub const RESOLUTION_FIELDS: &[&str] = &[COL_RESOLUTION, "spatial_resolution"];
pub const SENSITIVITY_FIELDS: &[&str] = &[
    ALIAS_SENSITIVITY,
    COL_CONT_SENSITIVITY,
    COL_LINE_SENSITIVITY,
];
pub const DATA_TYPE_FIELDS: &[&str] = &[COL_DATAPRODUCT_TYPE, "data_type"];
pub const SCIENCE_KEYWORD_FIELDS: &[&str] = &[COL_SCIENCE_KEYWORD];
pub const ACCESS_URL_FIELDS: &[&str] = &[COL_ACCESS_URL];
pub const BIBCODE_FIELDS: &[&str] = &[COL_BIB_REFERENCE, "bibcode"];
pub const FIRST_AUTHOR_FIELDS: &[&str] = &[COL_FIRST_AUTHOR];
pub const PUB_YEAR_FIELDS: &[&str] = &[COL_PUBLICATION_YEAR, "pub_year"];
pub const PUB_TITLE_FIELDS: &[&str] = &[COL_PUB_TITLE];

pub const DEFAULT_ROW_CAP: u32 = 100;
pub const MAX_ROW_CAP: u32 = 1000;
pub const DISPLAY_CAP: usize = 20;
pub const UNIQUE_LIST_CAP: usize = 10;
pub const BATCH_MAX_NAMES: usize = 20;
pub const BATCH_ROW_CAP: u32 = 50;
pub const TITLE_MAX_CHARS: usize = 100;

pub const UNKNOWN: &str = "Unknown";

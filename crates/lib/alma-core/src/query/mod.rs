//! Query specifications and builders.
//!
//! A [`QuerySpec`] is the backend-neutral description of one archive query:
//! the family it belongs to, the projected columns, the filter predicates and
//! the row cap. The declarative backend renders it to ADQL; the cone backend
//! reads the cone and evaluates the remaining predicates itself.

pub mod adql;
pub mod builder;
pub mod raw;

use std::{error::Error, fmt};

use alma_store::schema::{DEFAULT_ROW_CAP, MAX_ROW_CAP};
use alma_store::{RawValue, RowView};

pub use builder::{
    AbstractSearch,
    BibliographySearch,
    ConeSearch,
    DataTypeSearch,
    FrequencySearch,
    MemberOusSearch,
    ProposalSearch,
    QueryBuilder,
    ResolutionSearch,
    ScienceKeywordSearch,
    SensitivitySearch,
    SensitivityType,
    SourceNameSearch,
    normalize_uid,
};
pub use raw::TableAllowList;

/// Query families the builder knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Position,
    LineCoverage,
    Proposal,
    Frequency,
    Resolution,
    SourceName,
    Bibliography,
    ScienceKeyword,
    Sensitivity,
    MemberOus,
    DataType,
    Abstract,
    Raw,
}

impl QueryFamily {
    /// Families the specialized cone-search backend can answer.
    #[must_use]
    pub const fn prefers_cone_search(self) -> bool {
        matches!(self, Self::Position | Self::LineCoverage)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::LineCoverage => "line_coverage",
            Self::Proposal => "proposal",
            Self::Frequency => "frequency",
            Self::Resolution => "resolution",
            Self::SourceName => "source_name",
            Self::Bibliography => "bibliography",
            Self::ScienceKeyword => "science_keyword",
            Self::Sensitivity => "sensitivity",
            Self::MemberOus => "member_ous",
            Self::DataType => "data_type",
            Self::Abstract => "abstract",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for QueryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal compared for equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Integer(i64),
}

/// One side of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Unbounded,
    Inclusive(f64),
    Exclusive(f64),
}

impl Bound {
    const fn admits_above(self, value: f64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Inclusive(limit) => value >= limit,
            Self::Exclusive(limit) => value > limit,
        }
    }

    const fn admits_below(self, value: f64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Inclusive(limit) => value <= limit,
            Self::Exclusive(limit) => value < limit,
        }
    }
}

/// Spatial cone in ICRS degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub radius_deg: f64,
}

/// Filter predicate over archive columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-sensitive equality.
    Equals { column: &'static str, value: Literal },
    Range {
        column: &'static str,
        lower: Bound,
        upper: Bound,
    },
    /// Case-insensitive substring match.
    Contains { column: &'static str, needle: String },
    /// Case-insensitive substring match against any of the columns.
    ContainsAny {
        columns: Vec<&'static str>,
        needle: String,
    },
    /// Whole-token match against a space-separated list column.
    HasToken { column: &'static str, token: String },
    Cone(Cone),
}

impl Predicate {
    /// Evaluates the predicate against a fetched row.
    ///
    /// Cones always pass; they are applied by whichever service ran the
    /// positional search. Missing columns fail the predicate.
    #[must_use]
    pub fn matches(&self, row: &RowView<'_>) -> bool {
        match self {
            Self::Equals { column, value } => row.get(column).is_some_and(|cell| match value {
                Literal::Text(expected) => cell.value.as_text().as_deref() == Some(expected.as_str()),
                Literal::Integer(expected) => cell.value.as_i64() == Some(*expected),
            }),
            Self::Range {
                column,
                lower,
                upper,
            } => row
                .get(column)
                .and_then(|cell| cell.value.as_f64())
                .is_some_and(|value| lower.admits_above(value) && upper.admits_below(value)),
            Self::Contains { column, needle } => contains_ci(row, column, needle),
            Self::ContainsAny { columns, needle } => {
                columns.iter().any(|column| contains_ci(row, column, needle))
            }
            Self::HasToken { column, token } => row
                .get(column)
                .and_then(|cell| cell.value.as_text())
                .is_some_and(|text| text.split_whitespace().any(|part| part == token)),
            Self::Cone(_) => true,
        }
    }
}

fn contains_ci(row: &RowView<'_>, column: &str, needle: &str) -> bool {
    row.get(column)
        .and_then(|cell| match cell.value {
            RawValue::Text(text) => Some(text.to_lowercase()),
            other => other.as_text(),
        })
        .is_some_and(|text| text.contains(&needle.to_lowercase()))
}

/// Projection of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Columns(Vec<String>),
}

impl Selection {
    #[must_use]
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Columns(columns.into_iter().map(Into::into).collect())
    }
}

/// Maximum rows requested from a backend, always within `1..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCap(u32);

impl RowCap {
    /// Clamps a requested cap, defaulting when absent.
    #[must_use]
    pub fn from_requested(requested: Option<i64>) -> Self {
        let value = requested.map_or(DEFAULT_ROW_CAP, |requested| {
            u32::try_from(requested.clamp(1, i64::from(MAX_ROW_CAP))).unwrap_or(DEFAULT_ROW_CAP)
        });
        Self(value)
    }

    #[must_use]
    pub const fn fixed(value: u32) -> Self {
        if value == 0 {
            Self(1)
        } else if value > MAX_ROW_CAP {
            Self(MAX_ROW_CAP)
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for RowCap {
    fn default() -> Self {
        Self(DEFAULT_ROW_CAP)
    }
}

/// Backend-neutral description of one archive query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub family: QueryFamily,
    pub selection: Selection,
    pub predicates: Vec<Predicate>,
    pub row_cap: RowCap,
    pub order_by: Option<String>,
    pub distinct: bool,
    /// Caller-supplied query text, only set for [`QueryFamily::Raw`].
    pub raw_text: Option<String>,
}

impl QuerySpec {
    #[must_use]
    pub const fn new(family: QueryFamily, selection: Selection) -> Self {
        Self {
            family,
            selection,
            predicates: Vec::new(),
            row_cap: RowCap(DEFAULT_ROW_CAP),
            order_by: None,
            distinct: false,
            raw_text: None,
        }
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    #[must_use]
    pub const fn with_row_cap(mut self, row_cap: RowCap) -> Self {
        self.row_cap = row_cap;
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    #[must_use]
    pub const fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Returns the spatial cone, if the query has one.
    #[must_use]
    pub fn cone(&self) -> Option<Cone> {
        self.predicates.iter().find_map(|predicate| match predicate {
            Predicate::Cone(cone) => Some(*cone),
            _ => None,
        })
    }

    /// Renders the query as ADQL.
    #[must_use]
    pub fn to_adql(&self) -> String {
        adql::render(self)
    }
}

/// Parameters were missing, malformed or out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alma_store::{RawColumn, RawTable};

    #[test]
    fn row_cap_is_clamped_and_defaulted() {
        assert_eq!(RowCap::from_requested(None).get(), 100);
        assert_eq!(RowCap::from_requested(Some(5000)).get(), 1000);
        assert_eq!(RowCap::from_requested(Some(0)).get(), 1);
        assert_eq!(RowCap::from_requested(Some(-3)).get(), 1);
        assert_eq!(RowCap::from_requested(Some(250)).get(), 250);
        assert_eq!(RowCap::fixed(0).get(), 1);
    }

    #[test]
    fn predicates_evaluate_against_rows() {
        let table = RawTable {
            columns: vec![
                RawColumn::new("data_rights"),
                RawColumn::new("target_name"),
                RawColumn::new("frequency"),
            ],
            rows: vec![vec![
                RawValue::Text("Public".to_string()),
                RawValue::Text("NGC 1068".to_string()),
                RawValue::Float(230.5),
            ]],
        };
        let row = table.rows().next().expect("one row");

        let public = Predicate::Equals {
            column: "data_rights",
            value: Literal::Text("Public".to_string()),
        };
        let wrong_case = Predicate::Equals {
            column: "data_rights",
            value: Literal::Text("public".to_string()),
        };
        let substring = Predicate::Contains {
            column: "target_name",
            needle: "ngc".to_string(),
        };
        let range = Predicate::Range {
            column: "frequency",
            lower: Bound::Exclusive(230.5),
            upper: Bound::Unbounded,
        };

        assert!(public.matches(&row));
        assert!(!wrong_case.matches(&row));
        assert!(substring.matches(&row));
        assert!(!range.matches(&row));
    }

    #[test]
    fn band_tokens_match_whole_designators() {
        let table = RawTable {
            columns: vec![RawColumn::new("band_list")],
            rows: vec![
                vec![RawValue::Text("10".to_string())],
                vec![RawValue::Text("3 10".to_string())],
                vec![RawValue::Text("1".to_string())],
            ],
        };
        let band_one = Predicate::HasToken {
            column: "band_list",
            token: "1".to_string(),
        };
        let band_ten = Predicate::HasToken {
            column: "band_list",
            token: "10".to_string(),
        };

        let ones: Vec<bool> = table.rows().map(|row| band_one.matches(&row)).collect();
        let tens: Vec<bool> = table.rows().map(|row| band_ten.matches(&row)).collect();
        assert_eq!(ones, vec![false, false, true]);
        assert_eq!(tens, vec![true, true, false]);
    }
}

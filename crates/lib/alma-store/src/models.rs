use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Single cell value as decoded from a backend table.
///
/// Backends hand back typed cells; this wrapper never reaches the output
/// contract directly. It serializes to plain JSON scalars, and non-finite
/// floats collapse to `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a finite float, parsing text when needed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Int(value) => *value as f64,
            Self::Float(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Null | Self::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.is_finite() && value.fract() == 0.0 => Some(*value as i64),
            Self::Text(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Renders the value as display text; blank text counts as absent.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(value.to_string()),
            Self::Int(value) => Some(value.to_string()),
            Self::Float(value) if value.is_finite() => Some(value.to_string()),
            Self::Float(_) => None,
            Self::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }

    /// Converts to a plain JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::from(*value),
            Self::Float(value) => serde_json::Number::from_f64(*value).map_or(Value::Null, Value::Number),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::Float(value) if value.is_finite() => serializer.serialize_f64(*value),
            Self::Float(_) => serializer.serialize_none(),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Column descriptor carried alongside raw rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub unit: Option<String>,
    pub datatype: Option<String>,
}

impl RawColumn {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            datatype: None,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }
}

/// Tabular result returned by an archive backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    #[must_use]
    pub const fn new(columns: Vec<RawColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// Finds a column index by name, ignoring ASCII case.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |values| RowView {
            table: self,
            values,
        })
    }

    /// Keeps only rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&RowView<'_>) -> bool) {
        let columns = std::mem::take(&mut self.columns);
        let header = Self {
            columns,
            rows: Vec::new(),
        };
        self.rows.retain(|values| {
            keep(&RowView {
                table: &header,
                values,
            })
        });
        self.columns = header.columns;
    }
}

/// One cell plus the unit its column declared.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub value: &'a RawValue,
    pub unit: Option<&'a str>,
}

/// Borrowed view over one row of a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a RawTable,
    values: &'a [RawValue],
}

impl<'a> RowView<'a> {
    /// Returns the cell for `name` when the column exists and is non-null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Cell<'a>> {
        let index = self.table.column_index(name)?;
        let value = self.values.get(index)?;
        if value.is_null() {
            return None;
        }
        Some(Cell {
            value,
            unit: self.table.columns[index].unit.as_deref(),
        })
    }

    /// Returns the first non-null cell among synonymous names, in order.
    #[must_use]
    pub fn first_of(&self, names: &[&str]) -> Option<Cell<'a>> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Pairs every column name with its plain JSON value.
    #[must_use]
    pub fn to_json_map(&self) -> serde_json::Map<String, Value> {
        self.table
            .columns
            .iter()
            .zip(self.values)
            .map(|(column, value)| (column.name.clone(), value.to_json()))
            .collect()
    }
}

/// Data product classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataProductType {
    Cube,
    Image,
    #[default]
    Unknown,
}

impl DataProductType {
    /// Parses a backend or user supplied value, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cube" => Self::Cube,
            "image" => Self::Image,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Image => "image",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DataProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical normalized observation emitted by every search tool.
///
/// Every key is always serialized. Optional measurements serialize as `null`
/// rather than being skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationRecord {
    pub target: String,
    pub ra: f64,
    pub dec: f64,
    pub band: String,
    pub proposal_id: String,
    pub pi: String,
    pub integration_time_sec: f64,
    pub frequency_ghz: Option<f64>,
    pub bandwidth_ghz: Option<f64>,
    pub resolution_arcsec: Option<f64>,
    pub sensitivity_mjy: Option<f64>,
    pub data_type: DataProductType,
    pub science_keyword: String,
    pub access_url: Option<String>,
    pub bibcode: Option<String>,
    pub first_author: Option<String>,
    pub pub_year: Option<i64>,
    pub pub_title: Option<String>,
}

/// Coordinates produced by the name resolver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolvedCoordinate {
    pub ra_degrees: f64,
    pub dec_degrees: f64,
}

/// Sky position as echoed back in responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SkyPosition {
    pub ra: f64,
    pub dec: f64,
}

/// Why a name could not be turned into coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionReason {
    NotFound,
    ServiceUnavailable,
}

/// Outcome for one entry of a batch query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItemResult {
    Found {
        count: usize,
        coordinates: SkyPosition,
        bands_observed: Vec<String>,
        message: String,
    },
    NoData {
        count: usize,
        coordinates: SkyPosition,
        message: String,
    },
    NotResolved {
        count: usize,
        reason: ResolutionReason,
        message: String,
    },
    Error {
        count: usize,
        message: String,
    },
}

impl BatchItemResult {
    #[must_use]
    pub const fn count(&self) -> usize {
        match self {
            Self::Found { count, .. }
            | Self::NoData { count, .. }
            | Self::NotResolved { count, .. }
            | Self::Error { count, .. } => *count,
        }
    }

    #[must_use]
    pub const fn has_data(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Found { message, .. }
            | Self::NoData { message, .. }
            | Self::NotResolved { message, .. }
            | Self::Error { message, .. } => message,
        }
    }
}

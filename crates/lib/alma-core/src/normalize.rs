//! Column normalization.
//!
//! Rows arrive with whatever column names and units the answering backend
//! chose. Each canonical field is looked up by its obscore name first, then by
//! its synonyms, and falls back to a typed default. Values are converted to
//! the canonical unit using the column's declared unit.

use alma_store::schema::{
    ACCESS_URL_FIELDS,
    BAND_FIELDS,
    BANDWIDTH_FIELDS,
    BIBCODE_FIELDS,
    COL_EM_MAX,
    COL_EM_MIN,
    COL_FREQUENCY_SUPPORT,
    DATA_TYPE_FIELDS,
    DEC_FIELDS,
    FIRST_AUTHOR_FIELDS,
    FREQUENCY_FIELDS,
    INTEGRATION_FIELDS,
    PI_FIELDS,
    PROPOSAL_FIELDS,
    PUB_TITLE_FIELDS,
    PUB_YEAR_FIELDS,
    RA_FIELDS,
    RESOLUTION_FIELDS,
    SCIENCE_KEYWORD_FIELDS,
    SENSITIVITY_FIELDS,
    TARGET_FIELDS,
    TITLE_MAX_CHARS,
    UNKNOWN,
};
use alma_store::{Cell, DataProductType, ObservationRecord, RawTable, RowView};

use crate::units::{
    ARCMIN_PER_DEGREE,
    ARCSEC_PER_DEGREE,
    MJY_PER_JY,
    hz_to_ghz,
    round_to,
    wavelength_m_to_ghz,
};

const COORDINATE_DECIMALS: i32 = 4;
const FREQUENCY_DECIMALS: i32 = 2;
const RESOLUTION_DECIMALS: i32 = 3;
const SENSITIVITY_DECIMALS: i32 = 4;

/// Unitless frequencies above this are taken to be Hz.
const HZ_THRESHOLD: f64 = 1e6;

/// Normalizes every row of a table.
#[must_use]
pub fn normalize_table(table: &RawTable) -> Vec<ObservationRecord> {
    table.rows().map(|row| normalize_row(&row)).collect()
}

/// Maps one backend row onto the canonical observation record.
#[must_use]
pub fn normalize_row(row: &RowView<'_>) -> ObservationRecord {
    ObservationRecord {
        target: text_or_unknown(row, TARGET_FIELDS),
        ra: number(row, RA_FIELDS, to_degrees).map_or(0.0, |ra| round_to(ra, COORDINATE_DECIMALS)),
        dec: number(row, DEC_FIELDS, to_degrees)
            .map_or(0.0, |dec| round_to(dec, COORDINATE_DECIMALS)),
        band: text_or_unknown(row, BAND_FIELDS),
        proposal_id: text_or_unknown(row, PROPOSAL_FIELDS),
        pi: text_or_unknown(row, PI_FIELDS),
        integration_time_sec: number(row, INTEGRATION_FIELDS, to_seconds).unwrap_or(0.0),
        frequency_ghz: number(row, FREQUENCY_FIELDS, to_ghz)
            .map(|value| round_to(value, FREQUENCY_DECIMALS)),
        bandwidth_ghz: number(row, BANDWIDTH_FIELDS, to_ghz)
            .map(|value| round_to(value, FREQUENCY_DECIMALS)),
        resolution_arcsec: number(row, RESOLUTION_FIELDS, to_arcsec)
            .map(|value| round_to(value, RESOLUTION_DECIMALS)),
        sensitivity_mjy: number(row, SENSITIVITY_FIELDS, to_mjy)
            .map(|value| round_to(value, SENSITIVITY_DECIMALS)),
        data_type: row
            .first_of(DATA_TYPE_FIELDS)
            .and_then(|cell| cell.value.as_text())
            .map_or(DataProductType::Unknown, |text| DataProductType::parse(&text)),
        science_keyword: text_or_unknown(row, SCIENCE_KEYWORD_FIELDS),
        access_url: text(row, ACCESS_URL_FIELDS),
        bibcode: text(row, BIBCODE_FIELDS),
        first_author: text(row, FIRST_AUTHOR_FIELDS),
        pub_year: row.first_of(PUB_YEAR_FIELDS).and_then(|cell| cell.value.as_i64()),
        pub_title: text(row, PUB_TITLE_FIELDS).map(|title| truncate_chars(&title, TITLE_MAX_CHARS)),
    }
}

fn text(row: &RowView<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| row.get(name))
        .find_map(|cell| cell.value.as_text())
}

fn text_or_unknown(row: &RowView<'_>, names: &[&str]) -> String {
    text(row, names).unwrap_or_else(|| UNKNOWN.to_string())
}

/// First finite value among `names`, converted with the column's unit.
fn number(row: &RowView<'_>, names: &[&str], convert: fn(f64, Option<&str>) -> f64) -> Option<f64> {
    names
        .iter()
        .filter_map(|name| row.get(name))
        .find_map(|cell: Cell<'_>| {
            let value = cell.value.as_f64()?;
            let converted = convert(value, cell.unit);
            converted.is_finite().then_some(converted)
        })
}

fn unit_key(unit: Option<&str>) -> Option<String> {
    let unit = unit?.trim();
    if unit.is_empty() {
        return None;
    }
    // Per-beam suffixes do not change the scale.
    let base = unit.split('/').next().unwrap_or(unit);
    Some(base.trim().replace('µ', "u").to_ascii_lowercase())
}

fn to_degrees(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("arcmin") => value / ARCMIN_PER_DEGREE,
        Some("arcsec") => value / ARCSEC_PER_DEGREE,
        Some("rad") => value.to_degrees(),
        _ => value,
    }
}

fn to_seconds(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("min") => value * 60.0,
        Some("h") => value * 3600.0,
        _ => value,
    }
}

fn to_ghz(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("hz") => hz_to_ghz(value),
        Some("khz") => value / 1e6,
        Some("mhz") => value / 1e3,
        Some("ghz") => value,
        _ if value > HZ_THRESHOLD => hz_to_ghz(value),
        _ => value,
    }
}

fn to_arcsec(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("deg") => value * ARCSEC_PER_DEGREE,
        Some("arcmin") => value * ARCMIN_PER_DEGREE,
        Some("mas") => value / 1000.0,
        _ => value,
    }
}

fn to_mjy(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("jy") => value * MJY_PER_JY,
        Some("ujy") => value / 1000.0,
        _ => value,
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Frequency interval covered by one spectral window, in gigahertz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralWindow {
    pub low_ghz: f64,
    pub high_ghz: f64,
}

impl SpectralWindow {
    const fn new(a: f64, b: f64) -> Option<Self> {
        if !(a.is_finite() && b.is_finite()) {
            return None;
        }
        Some(Self {
            low_ghz: a.min(b),
            high_ghz: a.max(b),
        })
    }

    #[must_use]
    pub fn contains(&self, frequency_ghz: f64) -> bool {
        (self.low_ghz..=self.high_ghz).contains(&frequency_ghz)
    }
}

/// Parses `frequency_support` text such as `[84.0..86.0GHz,...] U [96.0..98.0GHz,...]`.
#[must_use]
pub fn parse_frequency_support(text: &str) -> Vec<SpectralWindow> {
    text.split('[')
        .skip(1)
        .filter_map(|segment| {
            let inner = segment.split(']').next()?;
            let range = inner.split(',').next()?.trim();
            let (low, high) = range.split_once("..")?;
            let (high, unit) = split_unit(high.trim());
            let (low, _) = split_unit(low.trim());
            let scale = match unit.to_ascii_lowercase().as_str() {
                "hz" => 1e-9,
                "khz" => 1e-6,
                "mhz" => 1e-3,
                _ => 1.0,
            };
            let low = low.parse::<f64>().ok()? * scale;
            let high = high.parse::<f64>().ok()? * scale;
            SpectralWindow::new(low, high)
        })
        .collect()
}

fn split_unit(value: &str) -> (&str, &str) {
    let index = value
        .rfind(|ch: char| ch.is_ascii_digit() || ch == '.')
        .map_or(0, |index| index + 1);
    (&value[..index], &value[index..])
}

/// Spectral coverage of a row.
///
/// Uses the windows listed in `frequency_support`, or the `em_min`/`em_max`
/// wavelength bounds when that column is absent or unreadable.
#[must_use]
pub fn spectral_windows(row: &RowView<'_>) -> Vec<SpectralWindow> {
    let windows = row
        .get(COL_FREQUENCY_SUPPORT)
        .and_then(|cell| cell.value.as_text())
        .map(|text| parse_frequency_support(&text))
        .unwrap_or_default();
    if !windows.is_empty() {
        return windows;
    }

    let wavelength = |name: &str| {
        row.get(name)
            .and_then(|cell| cell.value.as_f64())
            .filter(|value| *value > 0.0)
    };
    match (wavelength(COL_EM_MIN), wavelength(COL_EM_MAX)) {
        (Some(em_min), Some(em_max)) => {
            SpectralWindow::new(wavelength_m_to_ghz(em_max), wavelength_m_to_ghz(em_min))
                .into_iter()
                .collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alma_store::{RawColumn, RawValue};

    fn single_row(columns: Vec<RawColumn>, values: Vec<RawValue>) -> RawTable {
        RawTable {
            columns,
            rows: vec![values],
        }
    }

    #[test]
    fn obscore_row_maps_to_canonical_record() {
        let table = single_row(
            vec![
                RawColumn::new("target_name"),
                RawColumn::new("s_ra").with_unit("deg"),
                RawColumn::new("s_dec").with_unit("deg"),
                RawColumn::new("band_list"),
                RawColumn::new("proposal_id"),
                RawColumn::new("frequency").with_unit("GHz"),
                RawColumn::new("bandwidth").with_unit("Hz"),
                RawColumn::new("s_resolution").with_unit("arcsec"),
                RawColumn::new("dataproduct_type"),
                RawColumn::new("t_exptime").with_unit("s"),
            ],
            vec![
                RawValue::Text("M87".to_string()),
                RawValue::Float(187.705_930_76),
                RawValue::Float(12.391_123_29),
                RawValue::Text("6".to_string()),
                RawValue::Text("2019.1.00807.S".to_string()),
                RawValue::Float(230.538_123),
                RawValue::Float(1_875_000_000.0),
                RawValue::Float(0.123_456),
                RawValue::Text("CUBE".to_string()),
                RawValue::Float(1209.6),
            ],
        );
        let records = normalize_table(&table);
        let record = &records[0];
        assert_eq!(record.target, "M87");
        assert!((record.ra - 187.7059).abs() < 1e-9);
        assert!((record.dec - 12.3911).abs() < 1e-9);
        assert_eq!(record.band, "6");
        assert_eq!(record.frequency_ghz, Some(230.54));
        assert_eq!(record.bandwidth_ghz, Some(1.88));
        assert_eq!(record.resolution_arcsec, Some(0.123));
        assert_eq!(record.data_type, DataProductType::Cube);
        assert!((record.integration_time_sec - 1209.6).abs() < 1e-9);
        assert_eq!(record.pi, "Unknown");
        assert_eq!(record.sensitivity_mjy, None);
    }

    #[test]
    fn synonyms_and_defaults_fill_missing_fields() {
        let table = single_row(
            vec![
                RawColumn::new("target"),
                RawColumn::new("ra"),
                RawColumn::new("freq"),
                RawColumn::new("integration_time"),
            ],
            vec![
                RawValue::Text("Orion KL".to_string()),
                RawValue::Text("83.8221".to_string()),
                RawValue::Float(115_271_202_000.0),
                RawValue::Null,
            ],
        );
        let record = normalize_table(&table).remove(0);
        assert_eq!(record.target, "Orion KL");
        assert!((record.ra - 83.8221).abs() < 1e-9);
        assert!(record.dec.abs() < f64::EPSILON);
        assert!(record.integration_time_sec.abs() < f64::EPSILON);
        assert_eq!(record.frequency_ghz, Some(115.27));
        assert_eq!(record.data_type, DataProductType::Unknown);
        assert_eq!(record.science_keyword, "Unknown");
    }

    #[test]
    fn every_key_is_serialized_with_nulls() {
        let record = normalize_table(&single_row(Vec::new(), Vec::new())).remove(0);
        let json = serde_json::to_value(&record).expect("serialize");
        let object = json.as_object().expect("object");
        assert_eq!(object.len(), 18);
        assert_eq!(json["frequency_ghz"], serde_json::Value::Null);
        assert_eq!(json["ra"], 0.0);
        assert_eq!(json["data_type"], "unknown");
    }

    #[test]
    fn sensitivity_units_and_title_truncation() {
        let title = "A".repeat(150);
        let table = single_row(
            vec![
                RawColumn::new("sensitivity").with_unit("Jy/beam"),
                RawColumn::new("pub_title"),
                RawColumn::new("publication_year"),
            ],
            vec![
                RawValue::Float(0.000_123_46),
                RawValue::Text(title),
                RawValue::Int(2021),
            ],
        );
        let record = normalize_table(&table).remove(0);
        assert_eq!(record.sensitivity_mjy, Some(0.1235));
        assert_eq!(record.pub_title.as_deref().map(str::len), Some(100));
        assert_eq!(record.pub_year, Some(2021));
    }

    #[test]
    fn frequency_support_windows_are_parsed() {
        let windows = parse_frequency_support(
            "[229.50..231.50GHz,31250.00kHz,1.2mJy/beam@10km/s,0.1mJy/beam@native, XX YY] U \
             [215000.00..217000.00MHz,15625.00kHz,XX YY]",
        );
        assert_eq!(windows.len(), 2);
        assert!(windows[0].contains(230.538));
        assert!(!windows[0].contains(232.0));
        assert!(windows[1].contains(216.0));
        assert!(parse_frequency_support("garbage").is_empty());
    }

    #[test]
    fn wavelength_bounds_back_up_missing_windows() {
        let table = single_row(
            vec![
                RawColumn::new("em_min").with_unit("m"),
                RawColumn::new("em_max").with_unit("m"),
            ],
            vec![RawValue::Float(0.0026), RawValue::Float(0.0027)],
        );
        let row = table.rows().next().expect("row");
        let windows = spectral_windows(&row);
        assert_eq!(windows.len(), 1);
        assert!(windows[0].contains(112.0));
        assert!(!windows[0].contains(116.0));
    }
}

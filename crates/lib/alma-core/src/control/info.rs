use serde::{Deserialize, Serialize};

use crate::services::Capabilities;

use super::AlmaControlPlane;

const BANDS: &[(u8, &str, &str)] = &[
    (3, "84-116", "2.6-3.6"),
    (4, "125-163", "1.8-2.4"),
    (5, "163-211", "1.4-1.8"),
    (6, "211-275", "1.1-1.4"),
    (7, "275-373", "0.8-1.1"),
    (8, "385-500", "0.6-0.8"),
    (9, "602-720", "0.4-0.5"),
    (10, "787-950", "0.3-0.4"),
];

const COMMON_LINES: &[(&str, f64)] = &[
    ("CO(1-0)", 115.271),
    ("CO(2-1)", 230.538),
    ("CO(3-2)", 345.796),
    ("13CO(1-0)", 110.201),
    ("13CO(2-1)", 220.399),
    ("HCN(1-0)", 88.632),
    ("HCO+(1-0)", 89.189),
    ("CS(2-1)", 97.981),
    ("SiO(2-1)", 86.847),
    ("N2H+(1-0)", 93.174),
];

const SCIENCE_CATEGORIES: &[&str] = &[
    "Cosmology",
    "Galaxy evolution",
    "ISM and star formation",
    "Disks and planet formation",
    "Stars and stellar evolution",
    "Solar system",
    "Sun",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BandInfo {
    pub band: String,
    pub frequency_ghz: String,
    pub wavelength_mm: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineInfo {
    pub name: String,
    pub rest_frequency_ghz: f64,
}

/// Availability of each collaborator, as detected at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceStatus {
    pub tap_query: bool,
    pub cone_search: bool,
    pub name_resolver: bool,
}

impl From<Capabilities> for ServiceStatus {
    fn from(capabilities: Capabilities) -> Self {
        Self {
            tap_query: capabilities.declarative,
            cone_search: capabilities.cone_search,
            name_resolver: capabilities.name_resolver,
        }
    }
}

/// Static facts about the observatory plus live service availability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlmaInfo {
    pub telescope: String,
    pub location: String,
    pub operator: String,
    pub antennas: String,
    pub bands: Vec<BandInfo>,
    pub common_lines: Vec<LineInfo>,
    pub science_categories: Vec<String>,
    pub services: ServiceStatus,
}

impl AlmaControlPlane {
    /// Describes the observatory; never touches the network.
    #[must_use]
    pub fn get_alma_info(&self) -> AlmaInfo {
        AlmaInfo {
            telescope: "Atacama Large Millimeter/submillimeter Array".to_string(),
            location: "Atacama Desert, Chile (5000m altitude)".to_string(),
            operator: "NRAO, ESO, NAOJ".to_string(),
            antennas: "66 high-precision antennas (54 x 12m + 12 x 7m)".to_string(),
            bands: BANDS
                .iter()
                .map(|(band, frequency, wavelength)| BandInfo {
                    band: format!("Band {band}"),
                    frequency_ghz: (*frequency).to_string(),
                    wavelength_mm: (*wavelength).to_string(),
                })
                .collect(),
            common_lines: COMMON_LINES
                .iter()
                .map(|(name, frequency)| LineInfo {
                    name: (*name).to_string(),
                    rest_frequency_ghz: *frequency,
                })
                .collect(),
            science_categories: SCIENCE_CATEGORIES.iter().map(|category| (*category).to_string()).collect(),
            services: self.capabilities().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ArchiveServices;

    #[test]
    fn info_lists_bands_and_reports_missing_services() {
        let plane = AlmaControlPlane::new(ArchiveServices::new(None, None, None));
        let info = plane.get_alma_info();
        assert_eq!(info.bands.len(), 8);
        assert_eq!(info.bands[0].band, "Band 3");
        assert_eq!(info.common_lines.len(), 10);
        assert!(info.common_lines.iter().any(|line| line.name == "CO(2-1)"));
        assert_eq!(info.science_categories.len(), 7);
        assert!(!info.services.tap_query);
        assert!(!info.services.name_resolver);
    }
}

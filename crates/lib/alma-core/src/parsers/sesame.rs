use std::{error::Error, fmt};

use alma_store::ResolvedCoordinate;
use roxmltree::Document;

/// Error type for unreadable Sesame responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SesameParseError {
    message: String,
}

impl fmt::Display for SesameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sesame parse error: {}", self.message)
    }
}

impl Error for SesameParseError {}

impl From<roxmltree::Error> for SesameParseError {
    fn from(err: roxmltree::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Parser for the CDS Sesame XML name-resolver output.
pub struct SesameParser;

impl SesameParser {
    /// Returns the J2000 position from the first resolver that found the name.
    ///
    /// `Ok(None)` means every resolver answered without a match.
    ///
    /// # Errors
    /// Returns `SesameParseError` if the payload is not XML.
    pub fn parse(xml: &str) -> Result<Option<ResolvedCoordinate>, SesameParseError> {
        let doc = Document::parse(xml)?;
        let position = doc
            .descendants()
            .filter(|node| node.has_tag_name("Resolver"))
            .find_map(|resolver| {
                let value = |tag: &str| {
                    resolver
                        .children()
                        .find(|child| child.has_tag_name(tag))
                        .and_then(|child| child.text())
                        .and_then(|text| text.trim().parse::<f64>().ok())
                        .filter(|value| value.is_finite())
                };
                Some(ResolvedCoordinate {
                    ra_degrees: value("jradeg")?,
                    dec_degrees: value("jdedeg")?,
                })
            });
        Ok(position)
    }
}

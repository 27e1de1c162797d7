use std::{error::Error, fmt};

use alma_store::{RawColumn, RawTable, RawValue};
use roxmltree::{Document, Node};

/// Error type for `VOTable` responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VotableError {
    /// The service reported `QUERY_STATUS=ERROR`.
    Query(String),
    /// The payload is not a readable `VOTable`.
    Malformed(String),
}

impl fmt::Display for VotableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(message) => f.write_str(message),
            Self::Malformed(message) => write!(f, "VOTable parse error: {message}"),
        }
    }
}

impl Error for VotableError {}

impl From<roxmltree::Error> for VotableError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Parser for `VOTable` documents returned by TAP and SIA services.
pub struct VotableParser;

impl VotableParser {
    /// Parses the first result table of a `VOTable` document.
    ///
    /// Only the `TABLEDATA` serialization is decoded.
    ///
    /// # Errors
    /// Returns `VotableError::Query` when the service flagged the query as
    /// failed, and `VotableError::Malformed` for unreadable payloads.
    pub fn parse(xml: &str) -> Result<RawTable, VotableError> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if !root.has_tag_name("VOTABLE") {
            return Err(VotableError::Malformed(format!(
                "unexpected root element <{}>",
                root.tag_name().name()
            )));
        }

        if let Some(message) = query_error(&doc) {
            return Err(VotableError::Query(message));
        }

        let Some(table) = doc.descendants().find(|node| node.has_tag_name("TABLE")) else {
            return Ok(RawTable::default());
        };

        let columns: Vec<RawColumn> = table
            .children()
            .filter(|node| node.has_tag_name("FIELD"))
            .map(|field| column_from_field(&field))
            .collect();
        let kinds: Vec<CellKind> = columns.iter().map(CellKind::from_column).collect();
        let mut result = RawTable::new(columns);

        let Some(data) = table.children().find(|node| node.has_tag_name("DATA")) else {
            return Ok(result);
        };
        if let Some(other) = data
            .children()
            .find(|node| node.is_element() && !node.has_tag_name("TABLEDATA"))
        {
            return Err(VotableError::Malformed(format!(
                "unsupported serialization <{}>",
                other.tag_name().name()
            )));
        }
        let Some(tabledata) = data.children().find(|node| node.has_tag_name("TABLEDATA")) else {
            return Ok(result);
        };

        for tr in tabledata.children().filter(|node| node.has_tag_name("TR")) {
            let mut values: Vec<RawValue> = tr
                .children()
                .filter(|node| node.has_tag_name("TD"))
                .zip(kinds.iter())
                .map(|(td, kind)| kind.decode(&cell_text(&td)))
                .collect();
            values.resize(kinds.len(), RawValue::Null);
            result.rows.push(values);
        }
        Ok(result)
    }
}

fn query_error(doc: &Document<'_>) -> Option<String> {
    let info = doc.descendants().find(|node| {
        node.has_tag_name("INFO")
            && node.attribute("name") == Some("QUERY_STATUS")
            && node.attribute("value") == Some("ERROR")
    })?;
    let text = cell_text(&info);
    if text.is_empty() {
        Some("query failed".to_string())
    } else {
        Some(text)
    }
}

fn column_from_field(field: &Node<'_, '_>) -> RawColumn {
    let name = field
        .attribute("name")
        .or_else(|| field.attribute("ID"))
        .unwrap_or_default();
    let mut column = RawColumn::new(name);
    if let Some(unit) = field.attribute("unit").filter(|unit| !unit.trim().is_empty()) {
        column = column.with_unit(unit.trim());
    }
    if let Some(datatype) = field.attribute("datatype") {
        let arraysize = field.attribute("arraysize").unwrap_or("1");
        let datatype = if arraysize == "1" || datatype == "char" || datatype == "unicodeChar" {
            datatype.to_string()
        } else {
            format!("{datatype}[{arraysize}]")
        };
        column = column.with_datatype(datatype);
    }
    column
}

fn cell_text(node: &Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|text| text.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// How a column's cells are decoded.
#[derive(Debug, Clone, Copy)]
enum CellKind {
    Float,
    Integer,
    Boolean,
    Text,
}

impl CellKind {
    fn from_column(column: &RawColumn) -> Self {
        match column.datatype.as_deref() {
            Some("double" | "float") => Self::Float,
            Some("int" | "short" | "long" | "unsignedByte") => Self::Integer,
            Some("boolean") => Self::Boolean,
            _ => Self::Text,
        }
    }

    fn decode(self, text: &str) -> RawValue {
        if text.is_empty() {
            return RawValue::Null;
        }
        match self {
            Self::Float => text
                .parse::<f64>()
                .map_or_else(|_| RawValue::Text(text.to_string()), RawValue::Float),
            Self::Integer => text.parse::<i64>().map_or_else(
                |_| {
                    text.parse::<f64>()
                        .map_or_else(|_| RawValue::Text(text.to_string()), RawValue::Float)
                },
                RawValue::Int,
            ),
            Self::Boolean => match text.to_ascii_lowercase().as_str() {
                "t" | "true" | "1" => RawValue::Bool(true),
                "f" | "false" | "0" => RawValue::Bool(false),
                _ => RawValue::Null,
            },
            Self::Text => RawValue::Text(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<VOTABLE xmlns="http://www.ivoa.net/xml/VOTable/v1.3" version="1.3">
  <RESOURCE type="results">
    <INFO name="QUERY_STATUS" value="OK"/>
    <TABLE>
      <FIELD name="target_name" datatype="char" arraysize="*"/>
      <FIELD name="s_ra" datatype="double" unit="deg"/>
      <FIELD name="t_exptime" datatype="double" unit="s"/>
      <FIELD name="publication_year" datatype="int"/>
      <FIELD name="science_observation" datatype="boolean"/>
      <DATA>
        <TABLEDATA>
          <TR><TD>M87</TD><TD>187.7059</TD><TD>1209.6</TD><TD>2019</TD><TD>T</TD></TR>
          <TR><TD>Orion KL</TD><TD></TD><TD>NaN</TD><TD/><TD>F</TD></TR>
        </TABLEDATA>
      </DATA>
    </TABLE>
  </RESOURCE>
</VOTABLE>"#;

    #[test]
    fn parses_fields_units_and_typed_cells() {
        let table = VotableParser::parse(RESULT).expect("valid votable");
        assert_eq!(table.column_names(), vec![
            "target_name",
            "s_ra",
            "t_exptime",
            "publication_year",
            "science_observation",
        ]);
        assert_eq!(table.columns[1].unit.as_deref(), Some("deg"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], RawValue::Text("M87".to_string()));
        assert_eq!(table.rows[0][1], RawValue::Float(187.7059));
        assert_eq!(table.rows[0][3], RawValue::Int(2019));
        assert_eq!(table.rows[0][4], RawValue::Bool(true));
        assert_eq!(table.rows[1][1], RawValue::Null);
        assert_eq!(table.rows[1][3], RawValue::Null);
        assert!(table.rows[1][2].as_f64().is_none());
    }

    #[test]
    fn query_status_error_is_reported() {
        let xml = r#"<VOTABLE><RESOURCE type="results">
            <INFO name="QUERY_STATUS" value="ERROR">Column "nope" not found</INFO>
        </RESOURCE></VOTABLE>"#;
        let err = VotableParser::parse(xml).expect_err("error status");
        assert_eq!(err, VotableError::Query("Column \"nope\" not found".to_string()));
    }

    #[test]
    fn empty_results_keep_columns() {
        let xml = r#"<VOTABLE><RESOURCE><TABLE>
            <FIELD name="target_name" datatype="char" arraysize="*"/>
            <DATA><TABLEDATA/></DATA>
        </TABLE></RESOURCE></VOTABLE>"#;
        let table = VotableParser::parse(xml).expect("valid votable");
        assert!(table.is_empty());
        assert_eq!(table.column_names(), vec!["target_name"]);
    }

    #[test]
    fn binary_serialization_and_garbage_are_rejected() {
        let binary = r#"<VOTABLE><RESOURCE><TABLE><FIELD name="a" datatype="int"/>
            <DATA><BINARY2><STREAM encoding="base64">AAAA</STREAM></BINARY2></DATA>
        </TABLE></RESOURCE></VOTABLE>"#;
        assert!(matches!(
            VotableParser::parse(binary),
            Err(VotableError::Malformed(_))
        ));
        assert!(matches!(
            VotableParser::parse("<html>oops</html>"),
            Err(VotableError::Malformed(_))
        ));
        assert!(VotableParser::parse("not xml").is_err());
    }
}

//! ADQL rendering.
//!
//! Every user-supplied value reaches query text through [`quote_literal`].
//! Column names only ever come from the schema constants.

use alma_store::schema::{COL_DEC, COL_RA, TABLE_OBSCORE};

use super::{Bound, Literal, Predicate, QuerySpec, Selection};

/// Quotes a value as an ADQL string literal, doubling embedded quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let cleaned: String = value.chars().filter(|ch| !ch.is_control()).collect();
    format!("'{}'", cleaned.replace('\'', "''"))
}

/// Builds a lower-cased `%needle%` pattern literal.
#[must_use]
pub fn contains_pattern(needle: &str) -> String {
    quote_literal(&format!("%{}%", needle.to_lowercase()))
}

/// Renders a spec to ADQL. Raw specs return their text unchanged.
#[must_use]
pub fn render(spec: &QuerySpec) -> String {
    if let Some(raw) = spec.raw_text.as_ref() {
        return raw.clone();
    }

    let mut query = String::from("SELECT ");
    if spec.distinct {
        query.push_str("DISTINCT ");
    }
    query.push_str(&format!("TOP {} ", spec.row_cap.get()));
    match &spec.selection {
        Selection::All => query.push('*'),
        Selection::Columns(columns) => query.push_str(&columns.join(", ")),
    }
    query.push_str(&format!(" FROM {TABLE_OBSCORE}"));

    let conditions: Vec<String> = spec.predicates.iter().map(render_predicate).collect();
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    if let Some(order_by) = spec.order_by.as_ref() {
        query.push_str(&format!(" ORDER BY {order_by}"));
    }
    query
}

fn render_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Equals { column, value } => match value {
            Literal::Text(text) => format!("{column} = {}", quote_literal(text)),
            Literal::Integer(number) => format!("{column} = {number}"),
        },
        Predicate::Range {
            column,
            lower,
            upper,
        } => {
            let mut parts = Vec::with_capacity(2);
            match lower {
                Bound::Unbounded => {}
                Bound::Inclusive(value) => parts.push(format!("{column} >= {value}")),
                Bound::Exclusive(value) => parts.push(format!("{column} > {value}")),
            }
            match upper {
                Bound::Unbounded => {}
                Bound::Inclusive(value) => parts.push(format!("{column} <= {value}")),
                Bound::Exclusive(value) => parts.push(format!("{column} < {value}")),
            }
            if parts.is_empty() {
                "1=1".to_string()
            } else {
                parts.join(" AND ")
            }
        }
        Predicate::Contains { column, needle } => {
            format!("LOWER({column}) LIKE {}", contains_pattern(needle))
        }
        Predicate::ContainsAny { columns, needle } => {
            let pattern = contains_pattern(needle);
            let alternatives: Vec<String> = columns
                .iter()
                .map(|column| format!("LOWER({column}) LIKE {pattern}"))
                .collect();
            format!("({})", alternatives.join(" OR "))
        }
        Predicate::HasToken { column, token } => {
            let token = token.replace(['%', '_'], "");
            format!(
                "({column} = {} OR {column} LIKE {} OR {column} LIKE {} OR {column} LIKE {})",
                quote_literal(&token),
                quote_literal(&format!("{token} %")),
                quote_literal(&format!("% {token}")),
                quote_literal(&format!("% {token} %")),
            )
        }
        Predicate::Cone(cone) => format!(
            "CONTAINS(POINT('ICRS', {COL_RA}, {COL_DEC}), CIRCLE('ICRS', {}, {}, {})) = 1",
            cone.ra_deg, cone.dec_deg, cone.radius_deg
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Cone, QueryFamily, RowCap};

    #[test]
    fn quotes_are_doubled_and_controls_dropped() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal("a\nb"), "'ab'");
        assert_eq!(quote_literal("'; DROP"), "'''; DROP'");
    }

    #[test]
    fn renders_filters_cap_and_order() {
        let spec = QuerySpec::new(
            QueryFamily::Frequency,
            Selection::columns(["target_name", "frequency"]),
        )
        .with_predicate(Predicate::Range {
            column: "frequency",
            lower: Bound::Inclusive(84.0),
            upper: Bound::Inclusive(116.0),
        })
        .with_predicate(Predicate::Contains {
            column: "target_name",
            needle: "Orion".to_string(),
        })
        .with_row_cap(RowCap::fixed(100))
        .with_order_by("frequency");

        assert_eq!(
            spec.to_adql(),
            "SELECT TOP 100 target_name, frequency FROM ivoa.obscore \
             WHERE frequency >= 84 AND frequency <= 116 \
             AND LOWER(target_name) LIKE '%orion%' ORDER BY frequency"
        );
    }

    #[test]
    fn band_tokens_render_as_delimited_matches() {
        let spec = QuerySpec::new(QueryFamily::DataType, Selection::All).with_predicate(
            Predicate::HasToken {
                column: "band_list",
                token: "1".to_string(),
            },
        );
        let adql = spec.to_adql();

        assert!(adql.ends_with(
            "WHERE (band_list = '1' OR band_list LIKE '1 %' \
             OR band_list LIKE '% 1' OR band_list LIKE '% 1 %')"
        ));
        assert!(!adql.contains("'%1%'"));
    }

    #[test]
    fn renders_cone_and_distinct() {
        let spec = QuerySpec::new(QueryFamily::Abstract, Selection::All)
            .with_distinct(true)
            .with_predicate(Predicate::Cone(Cone {
                ra_deg: 10.5,
                dec_deg: -5.25,
                radius_deg: 0.5,
            }));
        assert_eq!(
            spec.to_adql(),
            "SELECT DISTINCT TOP 100 * FROM ivoa.obscore WHERE \
             CONTAINS(POINT('ICRS', s_ra, s_dec), CIRCLE('ICRS', 10.5, -5.25, 0.5)) = 1"
        );
    }
}

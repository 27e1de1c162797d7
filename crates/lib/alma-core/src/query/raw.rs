//! Caller-supplied ADQL.
//!
//! Raw queries are accepted only as a single `SELECT` statement over allowed
//! tables. A `TOP` clause is injected when the caller did not give one.

use alma_store::schema::{TABLE_OBSCORE, TABLE_TAP_SCHEMA_PREFIX};

use super::{QueryFamily, QuerySpec, RowCap, Selection, ValidationError};

/// Keywords that end a table list after `FROM`.
const CLAUSE_KEYWORDS: &[&str] = &[
    "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "NATURAL", "CROSS", "ON",
    "USING", "GROUP", "ORDER", "HAVING", "UNION", "INTERSECT", "EXCEPT", "OFFSET",
];

/// Tables raw queries may read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAllowList {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl Default for TableAllowList {
    fn default() -> Self {
        Self {
            exact: vec![TABLE_OBSCORE.to_string()],
            prefixes: vec![TABLE_TAP_SCHEMA_PREFIX.to_string()],
        }
    }
}

impl TableAllowList {
    /// Adds tables; entries ending in `.*` allow a whole schema.
    #[must_use]
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for table in tables {
            let table = table.as_ref().trim().to_ascii_lowercase();
            if table.is_empty() {
                continue;
            }
            if let Some(schema) = table.strip_suffix('*') {
                self.prefixes.push(schema.to_string());
            } else {
                self.exact.push(table);
            }
        }
        self
    }

    #[must_use]
    pub fn allows(&self, table: &str) -> bool {
        let table = table.to_ascii_lowercase();
        self.exact.iter().any(|allowed| *allowed == table)
            || self.prefixes.iter().any(|prefix| table.starts_with(prefix.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word,
    Symbol(char),
    Text,
}

#[derive(Debug, Clone)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    end: usize,
}

impl Token<'_> {
    fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}

fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        if byte.is_ascii_whitespace() {
            index += 1;
        } else if byte == b'-' && bytes.get(index + 1) == Some(&b'-') {
            while index < bytes.len() && bytes[index] != b'\n' {
                index += 1;
            }
        } else if byte == b'\'' {
            let start = index;
            index += 1;
            while index < bytes.len() {
                if bytes[index] == b'\'' {
                    if bytes.get(index + 1) == Some(&b'\'') {
                        index += 2;
                        continue;
                    }
                    index += 1;
                    break;
                }
                index += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Text,
                text: &sql[start..index],
                end: index,
            });
        } else if is_word_byte(byte) {
            let start = index;
            let mut quoted = false;
            while index < bytes.len() && (is_word_byte(bytes[index]) || quoted) {
                if bytes[index] == b'"' {
                    quoted = !quoted;
                }
                index += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Word,
                text: &sql[start..index],
                end: index,
            });
        } else {
            let ch = sql[index..].chars().next().unwrap_or(' ');
            let width = ch.len_utf8();
            tokens.push(Token {
                kind: TokenKind::Symbol(ch),
                text: &sql[index..index + width],
                end: index + width,
            });
            index += width;
        }
    }
    tokens
}

const fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'"' | b'*') || byte >= 0x80
}

fn is_clause_keyword(token: &Token<'_>) -> bool {
    CLAUSE_KEYWORDS.iter().any(|keyword| token.is_keyword(keyword))
}

/// Collects table names that follow `FROM` and `JOIN`.
fn referenced_tables(tokens: &[Token<'_>]) -> Vec<String> {
    let mut tables = Vec::new();
    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        index += 1;
        if token.is_keyword("JOIN") {
            if let Some(table) = tokens.get(index).filter(|next| next.kind == TokenKind::Word) {
                tables.push(table.text.replace('"', ""));
                index += 1;
            }
            continue;
        }
        if !token.is_keyword("FROM") {
            continue;
        }
        loop {
            let Some(table) = tokens.get(index) else {
                break;
            };
            if table.kind != TokenKind::Word || is_clause_keyword(table) {
                break;
            }
            tables.push(table.text.replace('"', ""));
            index += 1;
            if tokens.get(index).is_some_and(|next| next.is_keyword("AS")) {
                index += 1;
            }
            if tokens
                .get(index)
                .is_some_and(|next| next.kind == TokenKind::Word && !is_clause_keyword(next))
            {
                index += 1;
            }
            if tokens.get(index).is_some_and(|next| next.kind == TokenKind::Symbol(',')) {
                index += 1;
                continue;
            }
            break;
        }
    }
    tables
}

/// Inserts `TOP n` after `SELECT` (and `DISTINCT`/`ALL`) when missing.
fn inject_row_cap(sql: &str, tokens: &[Token<'_>], row_cap: RowCap) -> String {
    let has_top = tokens.iter().any(|token| token.is_keyword("TOP"));
    let is_count = tokens.iter().any(|token| token.is_keyword("COUNT"));
    if has_top || is_count {
        return sql.to_string();
    }
    let Some(select) = tokens.first().filter(|token| token.is_keyword("SELECT")) else {
        return sql.to_string();
    };
    let insert_at = tokens
        .get(1)
        .filter(|token| token.is_keyword("DISTINCT") || token.is_keyword("ALL"))
        .map_or(select.end, |modifier| modifier.end);
    format!(
        "{} TOP {}{}",
        &sql[..insert_at],
        row_cap.get(),
        &sql[insert_at..]
    )
}

/// Validates raw ADQL and returns a spec carrying the capped text.
///
/// # Errors
/// Returns `ValidationError` for empty, multi-statement or non-`SELECT`
/// text, and for tables outside the allow-list.
pub fn build_raw(
    sql: &str,
    max_rows: Option<i64>,
    allow_list: &TableAllowList,
) -> Result<QuerySpec, ValidationError> {
    let sql = sql.trim().trim_end_matches(';').trim_end();
    if sql.is_empty() {
        return Err(ValidationError::new("sql_query is required"));
    }

    let tokens = tokenize(sql);
    if tokens.iter().any(|token| token.kind == TokenKind::Symbol(';')) {
        return Err(ValidationError::new("only a single SELECT statement is allowed"));
    }
    if !tokens.first().is_some_and(|token| token.is_keyword("SELECT")) {
        return Err(ValidationError::new("only SELECT queries are allowed"));
    }

    let tables = referenced_tables(&tokens);
    if tables.is_empty() {
        return Err(ValidationError::new("query must select FROM a table"));
    }
    if let Some(table) = tables.iter().find(|table| !allow_list.allows(table)) {
        return Err(ValidationError::new(format!(
            "table '{table}' is not available; query the '{TABLE_OBSCORE}' table"
        )));
    }

    let row_cap = RowCap::from_requested(max_rows);
    let mut spec = QuerySpec::new(QueryFamily::Raw, Selection::All).with_row_cap(row_cap);
    spec.raw_text = Some(inject_row_cap(sql, &tokens, row_cap));
    Ok(spec)
}

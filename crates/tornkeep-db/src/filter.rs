//! Single-predicate filters and orderings for the Query Gateway.
//!
//! Front ends send short text like `level > 50` or `name LIKE 'Du%'`. The
//! text is parsed into a [`Filter`] whose column is a catalog entry and
//! whose literal is already typed for that column, so only bound values
//! ever reach the engine.
//!
//! Grammar:
//!
//! ```text
//! filter   := column op literal | column IS [NOT] NULL
//! op       := = | != | <> | < | <= | > | >= | LIKE
//! literal  := integer | 'text' | "text" | bare-word | YYYY-MM-DD[ HH:MM:SS]
//! order_by := column [ASC | DESC]
//! ```

use chrono::{NaiveDate, NaiveDateTime};

use crate::catalog::{ColumnSpec, ColumnType, TableSpec};
use crate::error::QueryError;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `=`
    Eq,
    /// `!=` or `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`, text columns only.
    Like,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
}

impl FilterOp {
    /// SQL spelling.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

/// Binary operators in match order: two-character spellings first.
const OPERATORS: [(&str, FilterOp); 7] = [
    ("<=", FilterOp::LtEq),
    (">=", FilterOp::GtEq),
    ("<>", FilterOp::NotEq),
    ("!=", FilterOp::NotEq),
    ("=", FilterOp::Eq),
    ("<", FilterOp::Lt),
    (">", FilterOp::Gt),
];

/// A literal already coerced to its column's storage class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Integer, or unix seconds for timestamp columns.
    Integer(i64),
    /// Text.
    Text(String),
}

/// A validated `column op literal` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Target column.
    pub column: &'static ColumnSpec,
    /// Operator.
    pub op: FilterOp,
    /// `None` exactly for `IS NULL` / `IS NOT NULL`.
    pub value: Option<Literal>,
}

/// A validated ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    /// Sort column.
    pub column: &'static ColumnSpec,
    /// `true` for `DESC`.
    pub descending: bool,
}

impl OrderBy {
    /// SQL direction keyword.
    pub const fn direction(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }
}

fn malformed(what: &'static str, reason: impl Into<String>) -> QueryError {
    QueryError::Malformed {
        what,
        reason: reason.into(),
    }
}

fn mismatch(column: &ColumnSpec, reason: impl Into<String>) -> QueryError {
    QueryError::TypeMismatch {
        column: column.name,
        reason: reason.into(),
    }
}

/// Split a leading identifier off `text`.
fn split_identifier(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    text.split_at(end)
}

fn lookup_column(table: &'static TableSpec, name: &str) -> Result<&'static ColumnSpec, QueryError> {
    table
        .column(name)
        .ok_or_else(|| QueryError::UnknownColumn {
            table: table.name,
            column: name.to_owned(),
        })
}

/// Strip a case-insensitive keyword prefix followed by whitespace or end.
fn strip_keyword<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = text.get(keyword.len()..)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Parse `column op literal` against `table`.
///
/// # Errors
///
/// - [`QueryError::Malformed`] if the text does not follow the grammar
/// - [`QueryError::UnknownColumn`] if the column is not in `table`
/// - [`QueryError::TypeMismatch`] if the literal does not fit the column,
///   or `LIKE` targets a non-text column
pub fn parse_filter(table: &'static TableSpec, text: &str) -> Result<Filter, QueryError> {
    let text = text.trim();
    let (name, rest) = split_identifier(text);
    if name.is_empty() {
        return Err(malformed("filter", "expected a column name"));
    }
    let column = lookup_column(table, name)?;
    let rest = rest.trim_start();

    if let Some(after_is) = strip_keyword(rest, "IS") {
        let (op, tail) = match strip_keyword(after_is, "NOT") {
            Some(after_not) => (FilterOp::IsNotNull, after_not),
            None => (FilterOp::IsNull, after_is),
        };
        return match strip_keyword(tail, "NULL") {
            Some("") => Ok(Filter {
                column,
                op,
                value: None,
            }),
            _ => Err(malformed("filter", "expected IS NULL or IS NOT NULL")),
        };
    }

    let (op, literal) = if let Some(after) = strip_keyword(rest, "LIKE") {
        (FilterOp::Like, after)
    } else {
        OPERATORS
            .iter()
            .find_map(|&(spelling, op)| rest.strip_prefix(spelling).map(|after| (op, after)))
            .ok_or_else(|| malformed("filter", format!("unknown operator in `{rest}`")))?
    };

    let literal = literal.trim();
    if literal.is_empty() {
        return Err(malformed("filter", "missing value"));
    }
    if op == FilterOp::Like && column.ty != ColumnType::Text {
        return Err(mismatch(column, "LIKE applies to text columns only"));
    }

    let value = match column.ty {
        ColumnType::Integer => Literal::Integer(parse_integer(column, literal)?),
        ColumnType::Timestamp => Literal::Integer(parse_timestamp(column, literal)?),
        ColumnType::Text => Literal::Text(parse_text(literal)?),
    };
    Ok(Filter {
        column,
        op,
        value: Some(value),
    })
}

fn parse_integer(column: &ColumnSpec, literal: &str) -> Result<i64, QueryError> {
    literal
        .parse()
        .map_err(|e| mismatch(column, format!("`{literal}` is not an integer: {e}")))
}

fn parse_timestamp(column: &ColumnSpec, literal: &str) -> Result<i64, QueryError> {
    let literal = unquote(literal).unwrap_or(literal);
    if let Ok(secs) = literal.parse::<i64>() {
        return Ok(secs);
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(literal, "%Y-%m-%d %H:%M:%S") {
        return Ok(at.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(literal, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc().timestamp())
        .ok_or_else(|| {
            mismatch(
                column,
                format!("`{literal}` is not unix seconds or YYYY-MM-DD[ HH:MM:SS]"),
            )
        })
}

fn unquote(literal: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        literal
            .strip_prefix(quote)
            .and_then(|inner| inner.strip_suffix(quote))
    })
}

fn parse_text(literal: &str) -> Result<String, QueryError> {
    if let Some(inner) = unquote(literal) {
        return Ok(inner.to_owned());
    }
    if literal.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        return Err(malformed(
            "filter",
            "text values with spaces or quotes must be quoted",
        ));
    }
    Ok(literal.to_owned())
}

/// Parse `column [ASC|DESC]` against `table`.
///
/// # Errors
///
/// Returns [`QueryError::UnknownColumn`] for a column outside `table` and
/// [`QueryError::Malformed`] for anything else after it.
pub fn parse_order_by(table: &'static TableSpec, text: &str) -> Result<OrderBy, QueryError> {
    let text = text.trim();
    let (name, rest) = split_identifier(text);
    if name.is_empty() {
        return Err(malformed("order_by", "expected a column name"));
    }
    let column = lookup_column(table, name)?;
    let rest = rest.trim();
    let descending = if rest.is_empty() || rest.eq_ignore_ascii_case("ASC") {
        false
    } else if rest.eq_ignore_ascii_case("DESC") {
        true
    } else {
        return Err(malformed("order_by", format!("unexpected `{rest}`")));
    };
    Ok(OrderBy { column, descending })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PLAYERS, PLAYER_STATS_HISTORY};

    #[test]
    fn parses_integer_comparison() {
        let filter = parse_filter(&PLAYERS, "level > 50");
        assert!(matches!(
            filter,
            Ok(Filter {
                op: FilterOp::Gt,
                value: Some(Literal::Integer(50)),
                ..
            })
        ));
    }

    #[test]
    fn operators_without_spaces() {
        let filter = parse_filter(&PLAYERS, "player_id<=7");
        assert_eq!(filter.ok().map(|f| f.op), Some(FilterOp::LtEq));
        let filter = parse_filter(&PLAYERS, "level<>3");
        assert_eq!(filter.ok().map(|f| f.op), Some(FilterOp::NotEq));
    }

    #[test]
    fn quoted_text_and_like() {
        let filter = parse_filter(&PLAYERS, "name like 'Du%'");
        assert!(matches!(
            filter,
            Ok(Filter { op: FilterOp::Like, value: Some(Literal::Text(ref t)), .. }) if t == "Du%"
        ));
        let filter = parse_filter(&PLAYERS, r#"name = "Duke the Great""#);
        assert!(matches!(
            filter,
            Ok(Filter { value: Some(Literal::Text(ref t)), .. }) if t == "Duke the Great"
        ));
    }

    #[test]
    fn like_on_integer_is_a_type_mismatch() {
        assert!(matches!(
            parse_filter(&PLAYERS, "level LIKE 5%"),
            Err(QueryError::TypeMismatch { column: "level", .. })
        ));
    }

    #[test]
    fn text_literal_for_integer_column_is_rejected() {
        assert!(matches!(
            parse_filter(&PLAYERS, "level > fifty"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn null_checks() {
        let filter = parse_filter(&PLAYERS, "faction_id IS NULL");
        assert_eq!(filter.ok().map(|f| (f.op, f.value)), Some((FilterOp::IsNull, None)));
        let filter = parse_filter(&PLAYERS, "faction_id is not null");
        assert_eq!(filter.ok().map(|f| f.op), Some(FilterOp::IsNotNull));
        assert!(matches!(
            parse_filter(&PLAYERS, "faction_id IS 3"),
            Err(QueryError::Malformed { .. })
        ));
    }

    #[test]
    fn timestamp_accepts_dates() {
        let filter = parse_filter(&PLAYER_STATS_HISTORY, "recorded_at >= 2025-03-01");
        assert_eq!(
            filter.ok().and_then(|f| f.value),
            Some(Literal::Integer(1_740_787_200))
        );
        let filter = parse_filter(&PLAYER_STATS_HISTORY, "recorded_at < '2025-03-01 12:00:00'");
        assert_eq!(
            filter.ok().and_then(|f| f.value),
            Some(Literal::Integer(1_740_830_400))
        );
    }

    #[test]
    fn injection_attempts_are_rejected() {
        assert!(matches!(
            parse_filter(&PLAYERS, "level = 1; DROP TABLE players"),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            parse_filter(&PLAYERS, "name = x OR 1=1"),
            Err(QueryError::Malformed { .. })
        ));
        assert!(matches!(
            parse_filter(&PLAYERS, "secret = 1"),
            Err(QueryError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn order_by_direction() {
        let order = parse_order_by(&PLAYERS, "level DESC");
        assert_eq!(order.ok().map(|o| o.direction()), Some("DESC"));
        let order = parse_order_by(&PLAYERS, "name");
        assert_eq!(order.ok().map(|o| o.descending), Some(false));
        assert!(matches!(
            parse_order_by(&PLAYERS, "name; DELETE"),
            Err(QueryError::Malformed { .. })
        ));
        assert!(matches!(
            parse_order_by(&PLAYERS, "karma"),
            Err(QueryError::UnknownColumn { .. })
        ));
    }
}

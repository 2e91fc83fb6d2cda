//! Display shaping for Query Gateway cells.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Rendering of a SQL `NULL`. Distinct from an empty string.
pub const NULL_MARKER: &str = "NULL";

/// Appended to text cut at the display length.
pub const TRUNCATION_MARKER: char = '…';

/// Timestamp display format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// SQL `NULL`. Serializes as JSON `null`, displays as [`NULL_MARKER`].
    Null,
    /// Integer value.
    Integer(i64),
    /// Text, already truncated for display.
    Text(String),
    /// A timestamp column.
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(NULL_MARKER),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Timestamp(at) => write!(f, "{}", at.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Timestamp(_) => serializer.collect_str(self),
        }
    }
}

/// Cut `text` to `max_chars` characters, marking the cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut.saturating_add(TRUNCATION_MARKER.len_utf8()));
            out.push_str(text.get(..cut).unwrap_or(text));
            out.push(TRUNCATION_MARKER);
            out
        }
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate("Duke", 50), "Duke");
        assert_eq!(truncate("", 50), "");
    }

    #[test]
    fn long_text_is_cut_on_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc…");
        assert_eq!(truncate("ééééé", 2), "éé…");
    }

    #[test]
    fn null_is_distinct_from_empty() {
        assert_eq!(Cell::Null.to_string(), "NULL");
        assert_eq!(Cell::Text(String::new()).to_string(), "");
        assert_eq!(serde_json::to_string(&Cell::Null).ok().as_deref(), Some("null"));
    }

    #[test]
    fn timestamps_render_as_utc() {
        let at = DateTime::from_timestamp(1_740_830_400, 0).unwrap_or_default();
        let cell = Cell::Timestamp(at);
        assert_eq!(cell.to_string(), "2025-03-01 12:00:00 UTC");
        assert_eq!(
            serde_json::to_string(&cell).ok().as_deref(),
            Some("\"2025-03-01 12:00:00 UTC\"")
        );
    }
}

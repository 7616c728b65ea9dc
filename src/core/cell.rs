//! Purpose: Typed cell values with best-effort coercion and a missing sentinel.
//! Exports: `Cell`.
//! Role: Every table slot holds a `Cell`; coercion runs at insert and at load.
//! Invariants: Date and numeric columns are never left as unparsed text.
//! Invariants: The JSON mapping round-trips: `from_json(to_json(c), kind) == c`.
use serde_json::Value;
use time::Date;
use time::format_description::well_known::Rfc3339;

use crate::core::schema::ColumnKind;

const DATE_FORMAT: &str = "[year]-[month]-[day]";

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Number(f64),
    Date(Date),
    Missing,
}

impl Cell {
    /// Best-effort parse of a raw string into the declared column kind.
    /// `Id`, `Decimal`, and `Date` fall back to `Missing`; `Text` passes through.
    pub fn coerce(raw: &str, kind: ColumnKind) -> Cell {
        match kind {
            ColumnKind::Text => Cell::Text(raw.to_string()),
            ColumnKind::Id => raw
                .trim()
                .parse::<i64>()
                .map(Cell::Int)
                .unwrap_or(Cell::Missing),
            ColumnKind::Decimal => parse_decimal(raw).map(Cell::Number).unwrap_or(Cell::Missing),
            ColumnKind::Date => parse_date(raw).map(Cell::Date).unwrap_or(Cell::Missing),
        }
    }

    /// Rebuild a cell from its storage representation, re-coercing to the
    /// column kind so a hand-edited file cannot smuggle unparsed text into a
    /// typed column.
    pub fn from_json(value: &Value, kind: ColumnKind) -> Cell {
        match (kind, value) {
            (_, Value::Null) => Cell::Missing,
            (ColumnKind::Text, Value::String(text)) => Cell::Text(text.clone()),
            (ColumnKind::Text, other) => Cell::Text(other.to_string()),
            (ColumnKind::Id, Value::Number(num)) => {
                num.as_i64().map(Cell::Int).unwrap_or(Cell::Missing)
            }
            (ColumnKind::Id, Value::String(text)) => Cell::coerce(text, ColumnKind::Id),
            (ColumnKind::Decimal, Value::Number(num)) => {
                num.as_f64().map(Cell::Number).unwrap_or(Cell::Missing)
            }
            (ColumnKind::Decimal, Value::String(text)) => Cell::coerce(text, ColumnKind::Decimal),
            (ColumnKind::Date, Value::String(text)) => Cell::coerce(text, ColumnKind::Date),
            _ => Cell::Missing,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(text) => Value::String(text.clone()),
            Cell::Int(value) => Value::from(*value),
            Cell::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Date(date) => Value::String(format_date(*date)),
            Cell::Missing => Value::Null,
        }
    }

    /// Display form for the table renderer and prompts.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Int(value) => value.to_string(),
            Cell::Number(value) => value.to_string(),
            Cell::Date(date) => format_date(*date),
            Cell::Missing => "-".to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_id(&self) -> Option<i64> {
        match self {
            Cell::Int(value) => Some(*value),
            _ => None,
        }
    }
}

fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() { Some(value) } else { None }
}

fn parse_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let format = time::format_description::parse(DATE_FORMAT).ok()?;
    if let Ok(date) = Date::parse(trimmed, &format) {
        return Some(date);
    }
    time::OffsetDateTime::parse(trimmed, &Rfc3339)
        .ok()
        .map(|ts| ts.date())
}

fn format_date(date: Date) -> String {
    time::format_description::parse(DATE_FORMAT)
        .ok()
        .and_then(|format| date.format(&format).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::Cell;
    use crate::core::schema::ColumnKind;
    use serde_json::json;

    #[test]
    fn coerce_decimal() {
        assert_eq!(Cell::coerce("9.99", ColumnKind::Decimal), Cell::Number(9.99));
        assert_eq!(Cell::coerce(" 15 ", ColumnKind::Decimal), Cell::Number(15.0));
        assert_eq!(Cell::coerce("cheap", ColumnKind::Decimal), Cell::Missing);
        assert_eq!(Cell::coerce("", ColumnKind::Decimal), Cell::Missing);
        assert_eq!(Cell::coerce("inf", ColumnKind::Decimal), Cell::Missing);
    }

    #[test]
    fn coerce_date_plain_and_rfc3339() {
        let plain = Cell::coerce("2025-01-01", ColumnKind::Date);
        let Cell::Date(date) = plain else {
            panic!("expected date cell");
        };
        assert_eq!(date.to_string(), "2025-01-01");

        let stamped = Cell::coerce("2025-01-01T12:30:00Z", ColumnKind::Date);
        assert_eq!(stamped, Cell::coerce("2025-01-01", ColumnKind::Date));

        assert_eq!(Cell::coerce("someday", ColumnKind::Date), Cell::Missing);
        assert_eq!(Cell::coerce("2025-13-40", ColumnKind::Date), Cell::Missing);
    }

    #[test]
    fn coerce_text_passes_through() {
        assert_eq!(
            Cell::coerce("12%", ColumnKind::Text),
            Cell::Text("12%".to_string())
        );
    }

    #[test]
    fn json_round_trip_preserves_typed_cells() {
        let cells = [
            (Cell::Text("Acme".to_string()), ColumnKind::Text),
            (Cell::Int(3), ColumnKind::Id),
            (Cell::Number(9.99), ColumnKind::Decimal),
            (Cell::coerce("2025-01-05", ColumnKind::Date), ColumnKind::Date),
            (Cell::Missing, ColumnKind::Decimal),
        ];
        for (cell, kind) in cells {
            let back = Cell::from_json(&cell.to_json(), kind);
            assert_eq!(back, cell);
        }
    }

    #[test]
    fn load_re_coerces_stray_text() {
        // A hand-edited file with text in a typed column loads as Missing.
        assert_eq!(
            Cell::from_json(&json!("not a price"), ColumnKind::Decimal),
            Cell::Missing
        );
        assert_eq!(
            Cell::from_json(&json!("not a date"), ColumnKind::Date),
            Cell::Missing
        );
        // Numbers in a text column are kept, rendered as text.
        assert_eq!(
            Cell::from_json(&json!(10), ColumnKind::Text),
            Cell::Text("10".to_string())
        );
    }

    #[test]
    fn missing_renders_as_dash() {
        assert_eq!(Cell::Missing.render(), "-");
        assert!(Cell::Missing.is_missing());
    }
}

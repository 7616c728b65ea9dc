//! Purpose: Encode and decode the tabular storage file.
//! Exports: `encode_to`, `decode_from`.
//! Role: Line-oriented format: header array first, then one record per line.
//! Invariants: The header must match the schema exactly; mismatch is Corrupt.
//! Invariants: No positional-index artifact is ever written.
//! Invariants: Decoding re-coerces every cell to its column kind.
use std::io::{BufRead, Write};

use serde_json::Value;

use crate::core::cell::Cell;
use crate::core::error::{Error, ErrorKind};
use crate::core::schema::Schema;
use crate::core::table::{RecordTable, Row};

pub fn encode_to(writer: &mut impl Write, table: &RecordTable) -> Result<(), Error> {
    let header: Vec<Value> = table
        .schema()
        .names()
        .into_iter()
        .map(Value::from)
        .collect();
    write_line(writer, &Value::Array(header))?;

    for row in table.rows() {
        let cells: Vec<Value> = row.cells().iter().map(Cell::to_json).collect();
        write_line(writer, &Value::Array(cells))?;
    }
    Ok(())
}

pub fn decode_from(reader: impl BufRead, schema: &Schema) -> Result<RecordTable, Error> {
    let mut lines = reader.lines();

    let header_line = match lines.next() {
        Some(line) => line.map_err(read_error)?,
        None => {
            return Err(Error::new(ErrorKind::Corrupt).with_message("storage file has no header"));
        }
    };
    check_header(&header_line, schema)?;

    let mut table = RecordTable::new(schema.clone());
    for (line_no, line) in lines.enumerate() {
        let line = line.map_err(read_error)?;
        if line.trim().is_empty() {
            continue;
        }
        let values = parse_row_line(&line, line_no + 2)?;
        if values.len() != schema.len() {
            return Err(Error::new(ErrorKind::Corrupt).with_message(format!(
                "record on line {} has {} cells, schema has {}",
                line_no + 2,
                values.len(),
                schema.len()
            )));
        }
        let cells = schema
            .columns()
            .iter()
            .zip(values.iter())
            .map(|(column, value)| Cell::from_json(value, column.kind()))
            .collect();
        table.push(Row::new(cells));
    }
    Ok(table)
}

fn check_header(line: &str, schema: &Schema) -> Result<(), Error> {
    let value: Value = serde_json::from_str(line).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message("header line is not valid JSON")
            .with_source(err)
    })?;
    let names = value
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_str().unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if names != schema.names() {
        return Err(Error::new(ErrorKind::Corrupt)
            .with_message("header does not match the expected column layout"));
    }
    Ok(())
}

fn parse_row_line(line: &str, line_no: usize) -> Result<Vec<Value>, Error> {
    let value: Value = serde_json::from_str(line).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message(format!("record on line {line_no} is not valid JSON"))
            .with_source(err)
    })?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(Error::new(ErrorKind::Corrupt)
            .with_message(format!("record on line {line_no} is not an array"))),
    }
}

fn write_line(writer: &mut impl Write, value: &Value) -> Result<(), Error> {
    let encoded = serde_json::to_string(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("record encode failed")
            .with_source(err)
    })?;
    writeln!(writer, "{encoded}").map_err(write_error)
}

fn read_error(err: std::io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to read storage file")
        .with_source(err)
}

fn write_error(err: std::io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write storage file")
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{decode_from, encode_to};
    use crate::core::cell::Cell;
    use crate::core::error::ErrorKind;
    use crate::core::schema::{ColumnKind, Schema};
    use crate::core::table::{RecordTable, Row};

    fn sample_table() -> RecordTable {
        let schema = Schema::product_orders();
        let mut table = RecordTable::new(schema.clone());
        let raw = [
            "Ann",
            "1 Main St",
            "Widget",
            "A widget",
            "Acme",
            "10",
            "9.99",
            "0%",
            "2025-01-01",
            "2025-01-05",
        ];
        let mut cells = vec![Cell::Int(1)];
        for (column, value) in schema.data_columns().zip(raw.iter()) {
            cells.push(Cell::coerce(value, column.kind()));
        }
        table.push(Row::new(cells));
        table
    }

    #[test]
    fn encode_decode_round_trip() {
        let table = sample_table();
        let mut buf = Vec::new();
        encode_to(&mut buf, &table).expect("encode");

        let decoded = decode_from(buf.as_slice(), table.schema()).expect("decode");
        assert_eq!(decoded, table);
    }

    #[test]
    fn header_is_first_line_with_no_index_column() {
        let table = sample_table();
        let mut buf = Vec::new();
        encode_to(&mut buf, &table).expect("encode");
        let text = String::from_utf8(buf).expect("utf8");
        let first = text.lines().next().expect("header line");
        assert!(first.starts_with("[\"id\",\"customer_name\""));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn mismatched_header_is_corrupt() {
        let text = "[\"id\",\"surprise\"]\n";
        let result = decode_from(text.as_bytes(), &Schema::product_orders());
        match result {
            Ok(_) => panic!("expected corrupt header error"),
            Err(err) => assert_eq!(err.kind(), ErrorKind::Corrupt),
        }
    }

    #[test]
    fn empty_file_is_corrupt() {
        let result = decode_from("".as_bytes(), &Schema::product_orders());
        match result {
            Ok(_) => panic!("expected corrupt error"),
            Err(err) => assert_eq!(err.kind(), ErrorKind::Corrupt),
        }
    }

    #[test]
    fn short_record_is_corrupt() {
        let table = sample_table();
        let mut buf = Vec::new();
        encode_to(&mut buf, &table).expect("encode");
        let mut text = String::from_utf8(buf).expect("utf8");
        text.push_str("[1,\"only\"]\n");
        let result = decode_from(text.as_bytes(), table.schema());
        match result {
            Ok(_) => panic!("expected corrupt error"),
            Err(err) => assert_eq!(err.kind(), ErrorKind::Corrupt),
        }
    }

    #[test]
    fn decode_re_coerces_typed_columns() {
        let schema = Schema::product_orders();
        let header = serde_json::to_string(&schema.names()).expect("header");
        let row = "[1,\"Ann\",\"1 Main St\",\"Widget\",\"A widget\",\"Acme\",\"10\",\"not a price\",\"0%\",\"someday\",\"2025-01-05\"]";
        let text = format!("{header}\n{row}\n");

        let table = decode_from(text.as_bytes(), &schema).expect("decode");
        let row = &table.rows()[0];
        let price_idx = schema.index_of("price").expect("price");
        let order_idx = schema.index_of("order_date").expect("order_date");
        let delivery_idx = schema.index_of("delivery_date").expect("delivery_date");
        assert!(row.cell(price_idx).is_missing());
        assert!(row.cell(order_idx).is_missing());
        assert_eq!(
            *row.cell(delivery_idx),
            Cell::coerce("2025-01-05", ColumnKind::Date)
        );
    }
}

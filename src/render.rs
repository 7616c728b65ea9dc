//! Purpose: Render the record table as aligned plain text for `show`.
//! Exports: `render_table`.
//! Role: Small, pure formatter used by CLI emission paths and the menu.
//! Invariants: Output is deterministic for a given table; no ANSI escapes.
use orderlite::core::table::RecordTable;

const COLUMN_GAP: &str = "  ";

pub(crate) fn render_table(table: &RecordTable) -> String {
    let names = table.schema().names();
    let mut widths: Vec<usize> = names.iter().map(|name| name.len()).collect();

    let rendered_rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.cells().iter().map(|cell| cell.render()).collect())
        .collect();
    for row in &rendered_rows {
        for (idx, cell) in row.iter().enumerate() {
            if cell.len() > widths[idx] {
                widths[idx] = cell.len();
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, &names, &widths);
    if rendered_rows.is_empty() {
        out.push_str("(no entries)\n");
        return out;
    }
    for row in &rendered_rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&mut out, &cells, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            out.push_str(COLUMN_GAP);
        }
        if idx + 1 == cells.len() {
            out.push_str(cell);
        } else {
            out.push_str(&format!("{cell:<width$}", width = widths[idx]));
        }
    }
    out.push('\n');
}

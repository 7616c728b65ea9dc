// Library-level persistence properties: round trips and on-disk shape.
use orderlite::core::cell::Cell;
use orderlite::core::schema::ColumnKind;
use orderlite::core::store::RecordStore;

fn entry(name: &str, price: &str, order_date: &str) -> Vec<String> {
    [
        name,
        "1 Main St",
        "Widget",
        "A widget",
        "Acme",
        "10",
        price,
        "0%",
        order_date,
        "2025-01-05",
    ]
    .iter()
    .map(|value| value.to_string())
    .collect()
}

#[test]
fn reload_yields_the_same_rows_in_the_same_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.orderlite");

    let mut store = RecordStore::open(&path).expect("open");
    store.add_entry(&entry("Ann", "9.99", "2025-01-01")).expect("add 1");
    store.add_entry(&entry("Bob", "15", "2025-02-01")).expect("add 2");

    let reopened = RecordStore::open(&path).expect("reopen");
    assert_eq!(reopened.table(), store.table());
    assert_eq!(reopened.table().position_of_id(1), Some(0));
    assert_eq!(reopened.table().position_of_id(2), Some(1));
}

#[test]
fn typed_cells_survive_reload_as_typed_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.orderlite");

    let mut store = RecordStore::open(&path).expect("open");
    store
        .add_entry(&entry("Ann", "9.99", "2025-01-01"))
        .expect("add");
    // An unparseable price and date are stored as missing, not as text.
    store
        .add_entry(&entry("Bob", "cheap", "someday"))
        .expect("add");

    let reopened = RecordStore::open(&path).expect("reopen");
    let schema = reopened.table().schema();
    let price_idx = schema.index_of("price").expect("price");
    let date_idx = schema.index_of("order_date").expect("order_date");

    let rows = reopened.table().rows();
    assert_eq!(*rows[0].cell(price_idx), Cell::Number(9.99));
    assert_eq!(
        *rows[0].cell(date_idx),
        Cell::coerce("2025-01-01", ColumnKind::Date)
    );
    assert!(rows[1].cell(price_idx).is_missing());
    assert!(rows[1].cell(date_idx).is_missing());
}

#[test]
fn file_starts_with_the_header_and_carries_no_index_column() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.orderlite");

    let mut store = RecordStore::open(&path).expect("open");
    store
        .add_entry(&entry("Ann", "9.99", "2025-01-01"))
        .expect("add");

    let text = std::fs::read_to_string(&path).expect("read");
    let mut lines = text.lines();
    let header = lines.next().expect("header");
    assert!(header.starts_with("[\"id\",\"customer_name\""));
    let record = lines.next().expect("record");
    let row: serde_json::Value = serde_json::from_str(record).expect("row json");
    let row = row.as_array().expect("array row");
    assert_eq!(row.len(), 11);
    assert_eq!(row[0], 1);
    assert!(lines.next().is_none());
}

#[test]
fn fresh_store_scenario_single_entry_gets_id_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.orderlite");

    let mut store = RecordStore::open(&path).expect("open");
    assert!(store.created());
    let id = store
        .add_entry(&entry("Ann", "9.99", "2025-01-01"))
        .expect("add");
    assert_eq!(id, 1);

    let table = store.table();
    assert_eq!(table.len(), 1);
    let row = &table.rows()[0];
    let schema = table.schema();
    assert_eq!(*row.cell(schema.index_of("id").unwrap()), Cell::Int(1));
    assert_eq!(
        *row.cell(schema.index_of("customer_name").unwrap()),
        Cell::Text("Ann".to_string())
    );
    assert_eq!(
        *row.cell(schema.index_of("stock_quantity").unwrap()),
        Cell::Text("10".to_string())
    );
    assert_eq!(
        *row.cell(schema.index_of("discount").unwrap()),
        Cell::Text("0%".to_string())
    );
}

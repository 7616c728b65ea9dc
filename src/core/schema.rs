//! Purpose: Define the fixed, ordered column layout shared by every record.
//! Exports: `ColumnKind`, `Column`, `Schema`.
//! Role: Single source of truth for column names, order, and cell typing.
//! Invariants: Column order never changes at runtime; lookups are by name.
//! Invariants: At most one column has kind `Id`; it is always the first.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    /// Generated integer identity, unique among live rows.
    Id,
    /// Raw text, stored as given.
    Text,
    /// Decimal number, coerced best-effort, `Missing` on parse failure.
    Decimal,
    /// Calendar date, coerced best-effort, `Missing` on parse failure.
    Date,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns
                .iter()
                .filter(|column| column.kind == ColumnKind::Id)
                .count()
                <= 1
        );
        Self { columns }
    }

    /// The canonical product-order layout: one generated id column followed
    /// by the ten data columns callers supply on insert.
    pub fn product_orders() -> Self {
        Self::new(vec![
            Column::new("id", ColumnKind::Id),
            Column::new("customer_name", ColumnKind::Text),
            Column::new("customer_address", ColumnKind::Text),
            Column::new("product_name", ColumnKind::Text),
            Column::new("description", ColumnKind::Text),
            Column::new("brand", ColumnKind::Text),
            Column::new("stock_quantity", ColumnKind::Text),
            Column::new("price", ColumnKind::Decimal),
            Column::new("discount", ColumnKind::Text),
            Column::new("order_date", ColumnKind::Date),
            Column::new("delivery_date", ColumnKind::Date),
        ])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Columns whose values the caller supplies; excludes the generated id.
    pub fn data_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|column| column.kind != ColumnKind::Id)
    }

    pub fn data_column_count(&self) -> usize {
        self.data_columns().count()
    }

    pub fn id_index(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.kind == ColumnKind::Id)
    }
}

use tabled::builder::Builder;
use tabled::settings::Style;
use crate::error::{DqError, Result};
use super::schema::{ColumnType, Field, Schema};
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_null())
    }
}

/// Column-major in-memory table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);

        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(DqError::Dataset(format!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.len(),
                row_count
            )));
        }

        let schema = Schema::from_fields(
            columns
                .iter()
                .map(|c| Field::new(c.name.clone(), c.column_type))
                .collect(),
        );

        Ok(Self {
            schema,
            columns,
            row_count,
        })
    }

    pub fn empty() -> Self {
        Self {
            schema: Schema::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.field_names()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn head(&self, n: usize) -> DataFrame {
        let take = n.min(self.row_count);
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.column_type, c.values[..take].to_vec()))
            .collect();

        DataFrame {
            schema: self.schema.clone(),
            columns,
            row_count: take,
        }
    }

    /// Text table of the first `n` rows with a `name: type` header.
    pub fn render_table(&self, n: usize) -> String {
        let mut builder = Builder::default();
        builder.push_record(
            self.columns
                .iter()
                .map(|c| format!("{}: {}", c.name, c.column_type)),
        );

        for i in 0..n.min(self.row_count) {
            builder.push_record(self.columns.iter().map(|c| c.values[i].to_string()));
        }

        let mut table = builder.build();
        table.with(Style::markdown());
        table.to_string()
    }
}

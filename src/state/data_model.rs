use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Row = BTreeMap<String, Value>;
pub type TableData = Vec<Row>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub num_header_rows: usize,
    pub num_data_rows: usize,
    pub num_data_columns: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Bool,
    List,
    Object,
    Empty,
}

impl DataType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Bool,
            Value::Array(_) => Self::List,
            Value::Object(_) => Self::Object,
            Value::Null => Self::Empty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    /// Upper header level for multi-level headers.
    pub group: Option<String>,
    pub data_type: DataType,
    pub is_index: bool,
}

/// Read-only columnar dataset the grid renders from.
pub trait Quiver {
    fn dimensions(&self) -> Dimensions;

    fn schema(&self) -> &[ColumnSchema];

    /// Cell at `(row, column)` in source coordinates, `None` when out of bounds.
    fn cell(&self, row: usize, column: usize) -> Option<&Value>;
}

/// In-memory columnar table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    schema: Vec<ColumnSchema>,
    values: Vec<Vec<Value>>,
    num_rows: usize,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frame from row objects; columns are the sorted union of keys.
    pub fn from_rows(data: &TableData) -> Self {
        let columns = derive_columns(data);
        let values = columns
            .iter()
            .map(|column| {
                data.iter()
                    .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect::<Vec<Vec<Value>>>();
        Self::assemble(columns.into_iter().zip(values).collect())
    }

    /// Builds a frame from named columns, keeping their order.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Value>)>) -> Self {
        Self::assemble(
            columns
                .into_iter()
                .map(|(name, values)| (name.into(), values))
                .collect(),
        )
    }

    /// Marks `name` as the index column and moves it to the front.
    pub fn with_index(mut self, name: &str) -> Self {
        if let Some(pos) = self.schema.iter().position(|c| c.name == name) {
            let mut schema = self.schema.remove(pos);
            schema.is_index = true;
            let values = self.values.remove(pos);
            self.schema.insert(0, schema);
            self.values.insert(0, values);
        }
        self
    }

    pub fn with_group(mut self, name: &str, group: &str) -> Self {
        if let Some(schema) = self.schema.iter_mut().find(|c| c.name == name) {
            schema.group = Some(group.to_string());
        }
        self
    }

    fn assemble(columns: Vec<(String, Vec<Value>)>) -> Self {
        let num_rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut schema = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (name, mut column) in columns {
            column.resize(num_rows, Value::Null);
            let data_type = column
                .iter()
                .find(|v| !v.is_null())
                .map(DataType::of)
                .unwrap_or(DataType::Empty);
            schema.push(ColumnSchema {
                name,
                group: None,
                data_type,
                is_index: false,
            });
            values.push(column);
        }
        Self {
            schema,
            values,
            num_rows,
        }
    }
}

impl Quiver for Frame {
    fn dimensions(&self) -> Dimensions {
        let has_groups = self.schema.iter().any(|c| c.group.is_some());
        Dimensions {
            num_header_rows: if has_groups { 2 } else { 1 },
            num_data_rows: self.num_rows,
            num_data_columns: self.schema.len(),
        }
    }

    fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.values.get(column)?.get(row)
    }
}

/// Returns the sorted union of all keys across all rows.
pub fn derive_columns(data: &TableData) -> Vec<String> {
    let mut cols = BTreeSet::new();
    for row in data {
        for key in row.keys() {
            cols.insert(key.clone());
        }
    }
    cols.into_iter().collect()
}

/// Formats a JSON value for display in a table cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

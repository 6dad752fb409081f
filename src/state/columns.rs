use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::state::column_config::{ColumnConfig, ColumnConfigOverrides, ColumnWidth};
use crate::state::column_kind::{CellError, ColumnKind, TypeConfig};
use crate::state::data_model::ColumnSchema;
use crate::state::element::DataFrameElement;

/// Column id reserved for the dataset's index column.
pub const INDEX_COLUMN_ID: &str = "_index";

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub id: String,
    pub label: String,
    pub group: Option<String>,
    pub help: Option<String>,
    /// Position among visible columns, `None` when hidden.
    pub index: Option<usize>,
    /// Position in the source dataset.
    pub original_index: usize,
    pub is_index: bool,
    pub is_pinned: bool,
    pub is_hidden: bool,
    pub is_editable: bool,
    pub is_required: bool,
    pub sortable: bool,
    pub width: ColumnWidth,
    pub kind: ColumnKind,
    pub type_config: TypeConfig,
}

impl Column {
    pub fn validate(&self, value: &Value) -> Result<Value, CellError> {
        let value = self.kind.validate(value, &self.type_config)?;
        if self.is_required && is_empty_value(&value) {
            return Err(CellError::Required);
        }
        Ok(value)
    }

    pub fn parse_input(&self, input: &str) -> Result<Value, CellError> {
        let value = self.kind.parse_input(input, &self.type_config)?;
        if self.is_required && is_empty_value(&value) {
            return Err(CellError::Required);
        }
        Ok(value)
    }

    pub fn format(&self, value: &Value) -> String {
        self.kind.format(value, &self.type_config)
    }

    /// Value used for cells of freshly appended rows.
    pub fn default_value(&self) -> Value {
        match self.kind {
            ColumnKind::Checkbox => Value::Bool(false),
            _ => Value::Null,
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Visible columns in display order plus every column for visibility menus.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnModel {
    pub columns: Vec<Column>,
    pub all_columns: Vec<Column>,
}

impl ColumnModel {
    pub fn column(&self, display_index: usize) -> Option<&Column> {
        self.columns.get(display_index)
    }

    pub fn find(&self, id: &str) -> Option<&Column> {
        self.all_columns.iter().find(|c| c.id == id)
    }

    pub fn display_index_of(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.all_columns.iter().map(|c| c.id.clone()).collect()
    }
}

pub struct ColumnLoadRequest<'a> {
    pub schema: &'a [ColumnSchema],
    pub element: &'a DataFrameElement,
    /// Current runtime order; may reference columns that no longer exist.
    pub column_order: &'a [String],
    pub overrides: &'a ColumnConfigOverrides,
    pub sortable: bool,
}

pub fn column_id(schema: &ColumnSchema) -> String {
    if schema.is_index {
        INDEX_COLUMN_ID.to_string()
    } else {
        schema.name.clone()
    }
}

pub fn load_columns(request: &ColumnLoadRequest<'_>) -> ColumnModel {
    let by_id: BTreeMap<String, (usize, &ColumnSchema)> = request
        .schema
        .iter()
        .enumerate()
        .map(|(pos, schema)| (column_id(schema), (pos, schema)))
        .collect();

    let mut seen = BTreeSet::new();
    let mut ordered: Vec<String> = request
        .column_order
        .iter()
        .filter(|id| by_id.contains_key(id.as_str()))
        .filter(|id| seen.insert(id.to_string()))
        .cloned()
        .collect();
    for schema in request.schema {
        let id = column_id(schema);
        if seen.insert(id.clone()) {
            ordered.push(id);
        }
    }

    let mut all_columns: Vec<Column> = ordered
        .iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .map(|(pos, schema)| {
            let id = column_id(schema);
            let config = request
                .overrides
                .effective(&id, &request.element.column_config);
            build_column(request, id, *pos, schema, &config)
        })
        .collect();

    // Pinned columns first, stable within each group.
    all_columns.sort_by_key(|c| !c.is_pinned);

    let mut columns = Vec::with_capacity(all_columns.len());
    for column in all_columns.iter_mut() {
        if !column.is_hidden {
            column.index = Some(columns.len());
            columns.push(column.clone());
        }
    }

    ColumnModel {
        columns,
        all_columns,
    }
}

fn build_column(
    request: &ColumnLoadRequest<'_>,
    id: String,
    original_index: usize,
    schema: &ColumnSchema,
    config: &ColumnConfig,
) -> Column {
    let type_patch = config.type_config.clone().unwrap_or_default();
    let kind = type_patch
        .kind
        .unwrap_or_else(|| ColumnKind::from_data_type(schema.data_type));
    let width = config
        .width
        .or(request.element.column_width)
        .unwrap_or_else(|| kind.default_width().into());
    let hidden = config
        .hidden
        .unwrap_or(schema.is_index && request.element.hide_index == Some(true));
    let is_editable = request.element.is_editable()
        && !config.disabled.unwrap_or(false)
        && kind.is_editable()
        && !schema.is_index;

    Column {
        id,
        label: config.label.clone().unwrap_or_else(|| schema.name.clone()),
        group: schema.group.clone(),
        help: config.help.clone(),
        index: None,
        original_index,
        is_index: schema.is_index,
        is_pinned: config.pinned.unwrap_or(schema.is_index),
        is_hidden: hidden,
        is_editable,
        is_required: config.required.unwrap_or(false),
        sortable: request.sortable,
        width,
        kind,
        type_config: type_patch.resolve(&TypeConfig::default()),
    }
}

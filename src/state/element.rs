use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::column_config::{ColumnConfig, ColumnWidth};
use crate::state::column_kind::WidthPreset;
use crate::state::selection::SelectionMode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingMode {
    #[default]
    ReadOnly,
    Fixed,
    Dynamic,
}

/// Declarative description of a data grid as sent by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrameElement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_id: Option<String>,
    #[serde(default)]
    pub column_order: Vec<String>,
    #[serde(default)]
    pub column_config: BTreeMap<String, ColumnConfig>,
    #[serde(default)]
    pub editing_mode: EditingMode,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub selection_mode: Vec<SelectionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_width: Option<ColumnWidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_height: Option<u32>,
}

impl DataFrameElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn is_editable(&self) -> bool {
        !self.disabled && self.editing_mode != EditingMode::ReadOnly
    }

    pub fn is_dynamic(&self) -> bool {
        self.editing_mode == EditingMode::Dynamic
    }
}

/// Grid tunables.
#[derive(Clone, Debug, PartialEq)]
pub struct GridOptions {
    pub debounce: Duration,
    /// Sorting is disabled above this many rows.
    pub large_table_rows: usize,
    pub min_column_width: u32,
    pub max_column_width: u32,
    pub small_width: u32,
    pub medium_width: u32,
    pub large_width: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            large_table_rows: 150_000,
            min_column_width: 50,
            max_column_width: 1000,
            small_width: 75,
            medium_width: 200,
            large_width: 400,
        }
    }
}

impl GridOptions {
    pub fn width_px(&self, width: ColumnWidth) -> u32 {
        match width {
            ColumnWidth::Preset(WidthPreset::Small) => self.small_width,
            ColumnWidth::Preset(WidthPreset::Medium) => self.medium_width,
            ColumnWidth::Preset(WidthPreset::Large) => self.large_width,
            ColumnWidth::Pixels(px) => px.clamp(self.min_column_width, self.max_column_width),
        }
    }
}

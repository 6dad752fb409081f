use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::column_kind::{ColumnKind, TypeConfig, WidthPreset};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnWidth {
    Preset(WidthPreset),
    Pixels(u32),
}

impl From<WidthPreset> for ColumnWidth {
    fn from(preset: WidthPreset) -> Self {
        Self::Preset(preset)
    }
}

/// Partial `type_config` as sent by the backend or set at runtime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl TypeConfigPatch {
    pub fn merge(&mut self, patch: &TypeConfigPatch) {
        merge_field(&mut self.kind, &patch.kind);
        merge_field(&mut self.format, &patch.format);
        merge_field(&mut self.min, &patch.min);
        merge_field(&mut self.max, &patch.max);
        merge_field(&mut self.step, &patch.step);
        merge_field(&mut self.max_chars, &patch.max_chars);
        // An empty list is indistinguishable from an absent one.
        if let Some(options) = patch.options.as_ref().filter(|o| !o.is_empty()) {
            self.options = Some(options.clone());
        }
    }

    /// Layers this patch over `defaults`.
    pub fn resolve(&self, defaults: &TypeConfig) -> TypeConfig {
        TypeConfig {
            format: self.format.clone().or_else(|| defaults.format.clone()),
            min: self.min.or(defaults.min),
            max: self.max.or(defaults.max),
            step: self.step.or(defaults.step),
            max_chars: self.max_chars.or(defaults.max_chars),
            options: match self.options.as_ref() {
                Some(options) if !options.is_empty() => options.clone(),
                _ => defaults.options.clone(),
            },
        }
    }
}

/// Partial per-column configuration. `None` fields leave the current value in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<ColumnWidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_config: Option<TypeConfigPatch>,
}

impl ColumnConfig {
    /// Shallow merge, except `type_config` which merges one level deep.
    pub fn merge(&mut self, patch: &ColumnConfig) {
        merge_field(&mut self.label, &patch.label);
        merge_field(&mut self.help, &patch.help);
        merge_field(&mut self.width, &patch.width);
        merge_field(&mut self.hidden, &patch.hidden);
        merge_field(&mut self.pinned, &patch.pinned);
        merge_field(&mut self.disabled, &patch.disabled);
        merge_field(&mut self.required, &patch.required);
        if let Some(type_patch) = patch.type_config.as_ref() {
            self.type_config
                .get_or_insert_with(TypeConfigPatch::default)
                .merge(type_patch);
        }
    }

    pub fn merged(&self, patch: &ColumnConfig) -> ColumnConfig {
        let mut out = self.clone();
        out.merge(patch);
        out
    }
}

fn merge_field<T: Clone>(target: &mut Option<T>, patch: &Option<T>) {
    if let Some(value) = patch {
        *target = Some(value.clone());
    }
}

/// Runtime column changes made by the user, keyed by column id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnConfigOverrides(BTreeMap<String, ColumnConfig>);

impl ColumnConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, column_id: &str, patch: &ColumnConfig) {
        self.0
            .entry(column_id.to_string())
            .or_default()
            .merge(patch);
    }

    pub fn get(&self, column_id: &str) -> Option<&ColumnConfig> {
        self.0.get(column_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Element config for `column_id` with runtime overrides layered on top.
    pub fn effective(
        &self,
        column_id: &str,
        element_config: &BTreeMap<String, ColumnConfig>,
    ) -> ColumnConfig {
        let mut config = element_config.get(column_id).cloned().unwrap_or_default();
        if let Some(overrides) = self.get(column_id) {
            config.merge(overrides);
        }
        config
    }
}

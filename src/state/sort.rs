use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::state::data_model;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    /// Cycles asc, desc, unsorted on repeated requests for the same column.
    Auto,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    /// Always `Asc` or `Desc`.
    pub direction: SortDirection,
}

/// Sort state plus the permutation from display rows to logical rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnSort {
    spec: Option<SortSpec>,
    permutation: Vec<usize>,
    inverse: Vec<usize>,
}

impl ColumnSort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spec(&self) -> Option<&SortSpec> {
        self.spec.as_ref()
    }

    pub fn is_sorted(&self) -> bool {
        self.spec.is_some()
    }

    /// Sort spec that results from requesting `direction` on `column`.
    pub fn next_spec(
        &self,
        column: &str,
        direction: SortDirection,
        reset_direction_cycle: bool,
    ) -> Option<SortSpec> {
        let direction = match direction {
            SortDirection::Auto => match self.spec.as_ref() {
                Some(spec) if spec.column == column => match spec.direction {
                    SortDirection::Asc => SortDirection::Desc,
                    _ if reset_direction_cycle => return None,
                    _ => SortDirection::Asc,
                },
                _ => SortDirection::Asc,
            },
            explicit => explicit,
        };
        Some(SortSpec {
            column: column.to_string(),
            direction,
        })
    }

    /// Recomputes the permutation for `spec` over `keys`, one per logical row.
    pub fn apply(&mut self, spec: Option<SortSpec>, keys: Vec<Value>) {
        self.spec = spec;
        self.resort(keys);
    }

    /// Recomputes the permutation for the current spec, e.g. after an edit
    /// changed a value in the sorted column.
    pub fn resort(&mut self, keys: Vec<Value>) {
        let Some(spec) = self.spec.as_ref() else {
            self.permutation.clear();
            self.inverse.clear();
            return;
        };

        let mut order: Vec<usize> = (0..keys.len()).collect();
        match spec.direction {
            SortDirection::Desc => order.sort_by(|a, b| compare_values(&keys[*b], &keys[*a])),
            _ => order.sort_by(|a, b| compare_values(&keys[*a], &keys[*b])),
        }

        let mut inverse = vec![usize::MAX; order.len()];
        for (display, logical) in order.iter().enumerate() {
            if *logical < inverse.len() {
                inverse[*logical] = display;
            }
        }
        let bijective = inverse.iter().all(|d| *d != usize::MAX);
        debug_assert!(bijective, "sort permutation is not a bijection");
        if bijective {
            self.permutation = order;
            self.inverse = inverse;
        } else {
            log::error!("sort permutation is not a bijection, falling back to source order");
            self.permutation.clear();
            self.inverse.clear();
        }
    }

    pub fn clear(&mut self) {
        self.spec = None;
        self.permutation.clear();
        self.inverse.clear();
    }

    /// Logical row shown at `display_row`.
    pub fn original_index(&self, display_row: usize) -> usize {
        self.permutation
            .get(display_row)
            .copied()
            .unwrap_or(display_row)
    }

    /// Display position of `logical_row`.
    pub fn display_index(&self, logical_row: usize) -> usize {
        self.inverse.get(logical_row).copied().unwrap_or(logical_row)
    }
}

pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
        _ => type_rank(left)
            .cmp(&type_rank(right))
            .then_with(|| data_model::display_value(left).cmp(&data_model::display_value(right))),
    }
}

fn compare_numbers(left: &Number, right: &Number) -> Ordering {
    match (left.as_i64(), left.as_u64(), right.as_i64(), right.as_u64()) {
        (Some(a), _, Some(b), _) => a.cmp(&b),
        (Some(a), _, _, Some(b)) => {
            if a < 0 {
                Ordering::Less
            } else {
                (a as u64).cmp(&b)
            }
        }
        (_, Some(a), Some(b), _) => {
            if b < 0 {
                Ordering::Greater
            } else {
                a.cmp(&(b as u64))
            }
        }
        (_, Some(a), _, Some(b)) => a.cmp(&b),
        _ => {
            let left = left.as_f64().unwrap_or(f64::NAN);
            let right = right.as_f64().unwrap_or(f64::NAN);
            left.partial_cmp(&right).unwrap_or(Ordering::Equal)
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

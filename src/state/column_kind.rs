use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::state::data_model::{self, DataType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
    Checkbox,
    Selectbox,
    List,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthPreset {
    Small,
    Medium,
    Large,
}

/// Resolved per-kind parameters after config merging.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeConfig {
    pub format: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub max_chars: Option<usize>,
    pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CellError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("{value} is below the minimum of {min}")]
    BelowMin { value: f64, min: f64 },
    #[error("{value} is above the maximum of {max}")]
    AboveMax { value: f64, max: f64 },
    #[error("'{0}' is not a boolean")]
    NotABool(String),
    #[error("'{0}' is not one of the allowed options")]
    NotAnOption(String),
    #[error("'{0}' is not a list")]
    NotAList(String),
    #[error("a value is required")]
    Required,
    #[error("cell is read-only")]
    ReadOnly,
}

impl ColumnKind {
    pub fn from_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::String | DataType::Empty => Self::Text,
            DataType::Number => Self::Number,
            DataType::Bool => Self::Checkbox,
            DataType::List => Self::List,
            DataType::Object => Self::Json,
        }
    }

    pub fn default_width(self) -> WidthPreset {
        match self {
            Self::Number | Self::Checkbox => WidthPreset::Small,
            Self::Text | Self::Selectbox => WidthPreset::Medium,
            Self::List | Self::Json => WidthPreset::Large,
        }
    }

    pub fn is_editable(self) -> bool {
        !matches!(self, Self::Json)
    }

    /// Value a cell takes when its content is deleted.
    pub fn empty_value(self) -> Value {
        match self {
            Self::Checkbox => Value::Bool(false),
            Self::List => Value::Array(Vec::new()),
            _ => Value::Null,
        }
    }

    /// Checks and normalizes a value for this kind. Null always passes.
    pub fn validate(self, value: &Value, config: &TypeConfig) -> Result<Value, CellError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Self::Text => {
                let mut text = data_model::display_value(value);
                if let Some(max) = config.max_chars {
                    if let Some((cut, _)) = text.char_indices().nth(max) {
                        text.truncate(cut);
                    }
                }
                Ok(Value::String(text))
            }
            Self::Number => {
                let raw = coerce_number(value)
                    .ok_or_else(|| CellError::NotANumber(data_model::display_value(value)))?;
                check_number(raw, config).map(Value::Number)
            }
            Self::Checkbox => coerce_bool(value)
                .map(Value::Bool)
                .ok_or_else(|| CellError::NotABool(data_model::display_value(value))),
            Self::Selectbox => {
                let text = data_model::display_value(value);
                if config.options.is_empty() || config.options.contains(&text) {
                    Ok(Value::String(text))
                } else {
                    Err(CellError::NotAnOption(text))
                }
            }
            Self::List => match value {
                Value::Array(items) => Ok(Value::Array(items.clone())),
                Value::String(s) => Ok(Value::Array(
                    s.split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(|item| Value::String(item.to_string()))
                        .collect(),
                )),
                other => Err(CellError::NotAList(data_model::display_value(other))),
            },
            Self::Json => Err(CellError::ReadOnly),
        }
    }

    /// Parses raw text typed or pasted into a cell.
    pub fn parse_input(self, input: &str, config: &TypeConfig) -> Result<Value, CellError> {
        let trimmed = input.trim();
        if trimmed.is_empty() && self != Self::Text {
            return Ok(Value::Null);
        }
        match self {
            Self::List => match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Array(items)) => Ok(Value::Array(items)),
                _ => self.validate(&Value::String(input.to_string()), config),
            },
            _ => self.validate(&Value::String(input.to_string()), config),
        }
    }

    pub fn format(self, value: &Value, config: &TypeConfig) -> String {
        match (self, value) {
            (_, Value::Null) => String::new(),
            (Self::Number, Value::Number(n)) => match (config.format.as_deref(), n.as_f64()) {
                (Some(format), Some(f)) => format_number_with(f, format),
                _ => n.to_string(),
            },
            (Self::List, Value::Array(items)) => items
                .iter()
                .map(data_model::display_value)
                .collect::<Vec<_>>()
                .join(", "),
            _ => data_model::display_value(value),
        }
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim().replace(',', "");
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn check_number(raw: f64, config: &TypeConfig) -> Result<Number, CellError> {
    let value = match config.step {
        Some(step) if step > 0.0 => {
            let precision = step_precision(step);
            let factor = 10f64.powi(precision as i32);
            (raw * factor).round() / factor
        }
        _ => raw,
    };
    if let Some(min) = config.min {
        if value < min {
            return Err(CellError::BelowMin { value, min });
        }
    }
    if let Some(max) = config.max {
        if value > max {
            return Err(CellError::AboveMax { value, max });
        }
    }
    json_number(value).ok_or_else(|| CellError::NotANumber(raw.to_string()))
}

fn step_precision(step: f64) -> usize {
    let repr = format!("{step}");
    repr.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0)
}

/// Integral values are stored as JSON integers so they round-trip unchanged.
fn json_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => parse_bool(s),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        Some(false)
    } else {
        None
    }
}

fn format_number_with(value: f64, format: &str) -> String {
    match format {
        "plain" => format_number(value),
        "percent" => format!("{:.2}%", value * 100.0),
        "dollar" => {
            let sign = if value < 0.0 { "-" } else { "" };
            format!("{sign}${}", group_thousands(&format!("{:.2}", value.abs())))
        }
        "localized" => group_thousands(&format_number(value)),
        "scientific" => format!("{value:e}"),
        "compact" => format_compact(value),
        other => format_printf(value, other).unwrap_or_else(|| format_number(value)),
    }
}

fn format_printf(value: f64, format: &str) -> Option<String> {
    let start = format.find('%')?;
    let rest = &format[start + 1..];
    let (body, consumed) = if let Some(stripped) = rest.strip_prefix('d') {
        (format!("{}", value.round() as i64), rest.len() - stripped.len())
    } else if let Some(spec) = rest.strip_prefix('.') {
        let digits: String = spec.chars().take_while(|c| c.is_ascii_digit()).collect();
        let precision: usize = digits.parse().ok()?;
        let tail = &spec[digits.len()..];
        let stripped = tail.strip_prefix('f')?;
        (
            format!("{value:.precision$}"),
            rest.len() - stripped.len(),
        )
    } else {
        return None;
    };
    Some(format!(
        "{}{}{}",
        &format[..start],
        body,
        &rest[consumed..]
    ))
}

fn format_compact(value: f64) -> String {
    const SCALES: [(f64, &str); 5] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];
    let mut out = String::new();
    for (scale, suffix) in SCALES {
        // The bucket is decided after rounding so 999_950 reads 1M, not 1000K.
        let scaled = format_trimmed(value / scale, 1);
        let magnitude: f64 = scaled.trim_start_matches('-').parse().unwrap_or(0.0);
        out = format!("{scaled}{suffix}");
        if magnitude < 1000.0 {
            break;
        }
    }
    out
}

fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

fn format_number(value: f64) -> String {
    format_trimmed(value, 6)
}

fn format_trimmed(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    let mut out = format!("{value:.precision$}");
    while out.ends_with('0') {
        out.pop();
    }
    if out.ends_with('.') {
        out.pop();
    }
    out
}

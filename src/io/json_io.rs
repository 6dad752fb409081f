use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::state::data_model::{Frame, TableData};
use crate::state::element::DataFrameElement;

#[derive(Debug, thiserror::Error)]
pub enum JsonIoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSON root is not an array")]
    NotAnArray,
    #[error("JSON array contains non-object elements")]
    NotArrayOfObjects,
}

/// Loads an array of row objects.
pub fn load_json(path: &Path) -> Result<TableData, JsonIoError> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;

    match value {
        Value::Array(arr) => {
            let mut rows = Vec::with_capacity(arr.len());
            for item in arr {
                match item {
                    Value::Object(map) => {
                        rows.push(map.into_iter().collect());
                    }
                    _ => return Err(JsonIoError::NotArrayOfObjects),
                }
            }
            Ok(rows)
        }
        _ => Err(JsonIoError::NotAnArray),
    }
}

/// Loads rows into a columnar frame, optionally marking an index column.
pub fn load_frame(path: &Path, index: Option<&str>) -> Result<Frame, JsonIoError> {
    let frame = Frame::from_rows(&load_json(path)?);
    Ok(match index {
        Some(index) => frame.with_index(index),
        None => frame,
    })
}

/// Loads a grid element description.
pub fn load_element(path: &Path) -> Result<DataFrameElement, JsonIoError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

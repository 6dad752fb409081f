use serde_json::Value;

use crate::state::columns::Column;
use crate::state::data_model;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Byte order mark so spreadsheet apps detect UTF-8.
const UTF8_BOM: &str = "\u{feff}";

/// Renders `num_rows` rows of `columns` as CSV with a header of column labels.
/// `get_cell` receives display coordinates.
pub fn to_csv(
    columns: &[Column],
    num_rows: usize,
    get_cell: impl Fn(usize, usize) -> Option<Value>,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.label.as_str()))?;
    for row in 0..num_rows {
        let record: Vec<String> = (0..columns.len())
            .map(|col| {
                get_cell(row, col)
                    .map(|value| data_model::display_value(&value))
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record)?;
    }
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(format!("{UTF8_BOM}{}", String::from_utf8(bytes)?))
}

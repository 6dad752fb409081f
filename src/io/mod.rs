pub mod json_io;

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Writes through a sibling temp file so a failed export never leaves a
/// truncated file behind.
fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;

    if let Err(err) = staged.persist(path) {
        // Windows refuses to rename over an existing file.
        if err.error.kind() != io::ErrorKind::AlreadyExists {
            return Err(err.error);
        }
        std::fs::remove_file(path)?;
        err.file.persist(path).map_err(|e| e.error)?;
    }
    Ok(())
}

/// Writes a CSV export, replacing any existing file.
pub fn save_csv(path: &Path, csv: &str) -> io::Result<()> {
    log::info!("writing CSV export to {}", path.display());
    replace_file(path, csv.as_bytes())
}

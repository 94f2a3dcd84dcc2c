//! CSV snapshot format
//!
//! One line per grid row, cells separated by `,`. A present cell is written
//! with Rust's shortest round-trip float formatting; an absent cell is an
//! empty field. Lines are joined with `\n` and there is no trailing newline.
//!
//! ```text
//! ,0.05,
//! 0.05,0.1,0.05
//! ,0.05,
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, ResultExt, ScanError};
use crate::types::HeightField;

/// Field separator
pub const SEPARATOR: char = ',';

/// Serialize a field to CSV text
pub fn serialize(field: &HeightField) -> String {
    let mut out = String::with_capacity(field.cell_count() * 8);
    for (row_idx, row) in field.rows().enumerate() {
        if row_idx > 0 {
            out.push('\n');
        }
        for (col, cell) in row.iter().enumerate() {
            if col > 0 {
                out.push(SEPARATOR);
            }
            if let Some(z) = cell {
                out.push_str(&z.to_string());
            }
        }
    }
    out
}

/// Parse CSV text produced by [`serialize`]
///
/// A single trailing newline (`\n` or `\r\n`) is tolerated. Line numbers in
/// errors are 1-based.
pub fn parse(text: &str) -> Result<HeightField> {
    let body = text
        .strip_suffix('\n')
        .map(|t| t.strip_suffix('\r').unwrap_or(t))
        .unwrap_or(text);

    let lines: Vec<&str> = body.split('\n').collect();
    let size = lines.len();

    let mut rows = Vec::with_capacity(size);
    for (idx, raw_line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        let row = line
            .split(SEPARATOR)
            .enumerate()
            .map(|(col, field)| parse_cell(field, line_no, col))
            .collect::<Result<Vec<_>>>()?;

        if row.len() != size {
            return Err(ScanError::Parse {
                line: line_no,
                message: format!(
                    "expected {} fields for a {}x{} grid, found {}",
                    size,
                    size,
                    size,
                    row.len()
                ),
            });
        }
        rows.push(row);
    }

    HeightField::from_rows(rows)
}

fn parse_cell(field: &str, line: usize, col: usize) -> Result<Option<f64>> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: f64 = trimmed.parse().map_err(|e| ScanError::Parse {
        line,
        message: format!("column {}: invalid number {:?}: {}", col + 1, trimmed, e),
    })?;

    if !value.is_finite() {
        return Err(ScanError::Parse {
            line,
            message: format!("column {}: non-finite value {:?}", col + 1, trimmed),
        });
    }
    Ok(Some(value))
}

/// Write a field to `path` as CSV, creating parent directories
pub fn write_to(path: impl AsRef<Path>, field: &HeightField) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory {:?}", parent))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(serialize(field).as_bytes())
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write {:?}", path))?;

    tracing::info!(
        "Exported {}x{} field ({} present cells) to {:?}",
        field.size(),
        field.size(),
        field.present_count(),
        path
    );
    Ok(())
}

/// Read a CSV file written by [`write_to`]
pub fn read_from(path: impl AsRef<Path>) -> Result<HeightField> {
    let path = path.as_ref();
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    parse(&text).with_context(|| format!("Failed to parse {:?}", path))
}

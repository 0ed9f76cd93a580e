//! Table downloads in CSV and spreadsheet formats.
//!
//! Both formats are produced from an `ExportTable`, so headers and cell
//! values are identical across them. Files are written into a caller-chosen
//! directory under the table's fixed file stem.

use super::types::{ExportCell, ExportTable};
use log::info;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Byte-order mark so spreadsheet programs detect UTF-8
const BOM: &str = "\u{feff}";

/// Column width used for every spreadsheet column
const COLUMN_WIDTH: f64 = 20.0;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to download. Carries the noun shown to the user.
    #[error("No hay {0} para descargar")]
    Empty(&'static str),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build spreadsheet: {0}")]
    Spreadsheet(#[from] XlsxError),

    #[error("failed to serialize: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ast(#[from] crate::ast::AstError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }
}

/// Quote a value only when it contains a delimiter, a double quote or a
/// line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render a table as BOM-prefixed CSV with `\n` row separators.
pub fn to_csv(table: &ExportTable) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(table.headers.join(","));
    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                ExportCell::Text(s) => csv_field(s),
                ExportCell::Integer(n) => n.to_string(),
            })
            .collect();
        lines.push(cells.join(","));
    }
    format!("{}{}", BOM, lines.join("\n"))
}

/// Render a table as a single-sheet workbook. Numbers stay numeric.
pub fn to_spreadsheet(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(table.sheet_name)?;

    for (col, header) in table.headers.iter().enumerate() {
        let col = col as u16;
        sheet.set_column_width(col, COLUMN_WIDTH)?;
        sheet.write_string(0, col, *header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                ExportCell::Text(s) => sheet.write_string(r, col, s)?,
                ExportCell::Integer(n) => sheet.write_number(r, col, *n as f64)?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write a table into `dir` as `<file_stem>.<ext>`.
///
/// `what` names the table contents for the empty-table message.
pub fn write_table(
    table: &ExportTable,
    format: ExportFormat,
    dir: &Path,
    what: &'static str,
) -> Result<PathBuf, ExportError> {
    if table.is_empty() {
        return Err(ExportError::Empty(what));
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", table.file_stem, format.extension()));
    match format {
        ExportFormat::Csv => fs::write(&path, to_csv(table))?,
        ExportFormat::Xlsx => fs::write(&path, to_spreadsheet(table)?)?,
    }

    info!("exported {} rows to {}", table.rows.len(), path.display());
    Ok(path)
}

/// Write raw bytes under `dir/name`, creating the directory.
pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    info!("wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExportTable {
        ExportTable {
            headers: vec!["No.", "Descripción", "Línea"],
            rows: vec![
                vec![ExportCell::Integer(1), ExportCell::Text("expected ',' got ')'".into()), ExportCell::Integer(3)],
                vec![ExportCell::Integer(2), ExportCell::Text("plain".into()), ExportCell::Integer(0)],
            ],
            sheet_name: "Errores",
            file_stem: "errores",
        }
    }

    #[test]
    fn test_csv_bom_and_quoting() {
        let csv = to_csv(&sample());
        assert!(csv.starts_with('\u{feff}'));
        let body = csv.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = body.split('\n').collect();
        assert_eq!(lines[0], "No.,Descripción,Línea");
        assert_eq!(lines[1], "1,\"expected ',' got ')'\",3");
        assert_eq!(lines[2], "2,plain,0");
    }

    #[test]
    fn test_csv_escapes_quotes() {
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("no special"), "no special");
    }

    #[test]
    fn test_csv_multiline_message_stays_one_record() {
        let table = ExportTable {
            headers: vec!["No.", "Descripción"],
            rows: vec![vec![ExportCell::Integer(1), ExportCell::Text("línea uno\nlínea dos".into())]],
            sheet_name: "Errores",
            file_stem: "errores",
        };
        let csv = to_csv(&table);
        assert!(csv.ends_with("1,\"línea uno\nlínea dos\""));
        assert_eq!(csv_field("a\r\nb"), "\"a\r\nb\"");
    }

    #[test]
    fn test_spreadsheet_is_a_zip_container() {
        let bytes = to_spreadsheet(&sample()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_write_table_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_table(&sample(), ExportFormat::Csv, dir.path(), "errores").unwrap();
        let xlsx = write_table(&sample(), ExportFormat::Xlsx, dir.path(), "errores").unwrap();
        assert_eq!(csv.file_name().unwrap(), "errores.csv");
        assert_eq!(xlsx.file_name().unwrap(), "errores.xlsx");
        assert!(fs::read_to_string(csv).unwrap().contains("plain"));
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let mut table = sample();
        table.rows.clear();
        let dir = tempfile::tempdir().unwrap();
        let err = write_table(&table, ExportFormat::Csv, dir.path(), "errores").unwrap_err();
        assert_eq!(err.to_string(), "No hay errores para descargar");
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("xlsx"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("pdf"), None);
    }
}

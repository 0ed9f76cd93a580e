//! The reports panel: errors table, symbol table and AST view kept in sync
//! with the report store.

use super::export::{ExportError, ExportFormat, write_bytes, write_table};
use super::table::{TableRenderer, activate};
use super::types::{ReportTable, SortOrder, TableId};
use crate::ast::{AstError, AstRenderer, JSON_FILE_NAME, PNG_FILE_NAME, SVG_FILE_NAME};
use crate::host::EditorHost;
use crate::store::ReportView;
use crate::types::ReportSnapshot;
use log::debug;
use std::path::{Path, PathBuf};

/// AST download formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstExport {
    Svg,
    Png,
    Json,
}

impl AstExport {
    pub fn file_name(&self) -> &'static str {
        match self {
            AstExport::Svg => SVG_FILE_NAME,
            AstExport::Png => PNG_FILE_NAME,
            AstExport::Json => JSON_FILE_NAME,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Some(AstExport::Svg),
            "png" => Some(AstExport::Png),
            "json" => Some(AstExport::Json),
            _ => None,
        }
    }
}

pub struct ReportsPanel {
    tables: TableRenderer,
    ast: AstRenderer,
    snapshot: ReportSnapshot,
    errors: ReportTable,
    symbols: ReportTable,
    refreshes: usize,
}

impl Default for ReportsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportView for ReportsPanel {
    fn refresh(&mut self, snapshot: &ReportSnapshot) {
        self.snapshot = snapshot.clone();
        // Rebuilt tables start unsorted
        self.tables.reset_sort();
        self.errors = self.tables.render_errors(&snapshot.errors);
        self.symbols = self.tables.render_symbols(&snapshot.symbols);
        self.ast.render(snapshot.ast.clone());
        self.refreshes += 1;
        debug!("reports panel refreshed ({})", self.refreshes);
    }
}

impl ReportsPanel {
    pub fn new() -> Self {
        let tables = TableRenderer::new();
        let errors = tables.render_errors(&[]);
        let symbols = tables.render_symbols(&[]);
        Self { tables, ast: AstRenderer::new(), snapshot: ReportSnapshot::default(), errors, symbols, refreshes: 0 }
    }

    pub fn errors(&self) -> &ReportTable {
        &self.errors
    }

    pub fn symbols(&self) -> &ReportTable {
        &self.symbols
    }

    pub fn table(&self, id: TableId) -> &ReportTable {
        match id {
            TableId::Errors => &self.errors,
            TableId::Symbols => &self.symbols,
        }
    }

    pub fn ast(&self) -> &AstRenderer {
        &self.ast
    }

    pub fn ast_mut(&mut self) -> &mut AstRenderer {
        &mut self.ast
    }

    pub fn snapshot(&self) -> &ReportSnapshot {
        &self.snapshot
    }

    /// Number of times the store pushed a snapshot
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    /// Header click on `column`
    pub fn sort(&mut self, id: TableId, column: usize) -> Option<SortOrder> {
        match id {
            TableId::Errors => self.tables.sort_table(&mut self.errors, column),
            TableId::Symbols => self.tables.sort_table(&mut self.symbols, column),
        }
    }

    /// Row click. Rows are addressed in their current (possibly sorted) order.
    pub fn activate(&self, id: TableId, row: usize, editor: &mut dyn EditorHost) -> bool {
        self.table(id).rows.get(row).map(|r| activate(r, editor)).unwrap_or(false)
    }

    pub fn export_errors(&self, format: ExportFormat, dir: &Path) -> Result<PathBuf, ExportError> {
        write_table(&self.tables.error_export(&self.snapshot.errors), format, dir, "errores")
    }

    pub fn export_symbols(&self, format: ExportFormat, dir: &Path) -> Result<PathBuf, ExportError> {
        write_table(&self.tables.symbol_export(&self.snapshot.symbols), format, dir, "símbolos")
    }

    pub fn export_ast(&self, format: AstExport, dir: &Path) -> Result<PathBuf, ExportError> {
        let bytes = match format {
            AstExport::Svg => self.ast.to_svg()?.into_bytes(),
            AstExport::Png => self.ast.to_png()?,
            AstExport::Json => self.ast.to_json()?.into_bytes(),
        };
        write_bytes(dir, format.file_name(), &bytes)
    }

    /// Write every download that has content. Empty tables and a missing
    /// graphic are skipped; other failures abort.
    pub fn export_all(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();
        let attempts = [
            self.export_errors(ExportFormat::Csv, dir),
            self.export_errors(ExportFormat::Xlsx, dir),
            self.export_symbols(ExportFormat::Csv, dir),
            self.export_symbols(ExportFormat::Xlsx, dir),
            self.export_ast(AstExport::Json, dir),
            self.export_ast(AstExport::Svg, dir),
            self.export_ast(AstExport::Png, dir),
        ];

        for attempt in attempts {
            match attempt {
                Ok(path) => written.push(path),
                Err(ExportError::Empty(_) | ExportError::Ast(AstError::NoAst | AstError::NoSvg)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }
}

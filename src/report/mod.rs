//! Reports module - errors table, symbol table and their downloads.
//!
//! This module handles:
//! - Projecting report entries into sortable table view models
//! - Symbol, scope and error-type classification for styling
//! - CSV and spreadsheet downloads
//! - The reports panel that keeps tables and the AST view in sync
//!
//! Terminal rendering is handled by the console_format module.
//!
//! # Module Organization
//!
//! - `types` - Table view model (TableId, SortOrder, ReportTable, ExportTable)
//! - `table` - TableRenderer, classification and sorting
//! - `export` - CSV / XLSX serialization and file writing
//! - `panel` - ReportsPanel, the store-driven view

mod export;
mod panel;
mod table;
mod types;

// Re-export types
pub use types::{Badge, Column, ExportCell, ExportTable, Location, ReportTable, SortIcon, SortOrder, TableId, TableRow};

// Re-export table functions
pub use table::{
    ERROR_COLUMNS, SYMBOL_COLUMNS, SymbolClass, TableRenderer, activate, classify_symbol, compare_cells, scope_class,
    sort_rows, symbol_label,
};

// Re-export export functions
pub use export::{ExportError, ExportFormat, to_csv, to_spreadsheet, write_bytes, write_table};

pub use panel::{AstExport, ReportsPanel};

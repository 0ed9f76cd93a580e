//! Table view model.
//!
//! Rendered tables are plain data: captions, columns with sort indicators,
//! and rows of display strings plus the metadata a front end needs to style
//! and activate them.

use serde::Serialize;

/// Which report table a row or sort key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableId {
    Errors,
    Symbols,
}

impl TableId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableId::Errors => "errors",
            TableId::Symbols => "symbols",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "errors" | "errores" => Some(TableId::Errors),
            "symbols" | "simbolos" | "símbolos" => Some(TableId::Symbols),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Sort indicator shown in a column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortIcon {
    Neutral,
    Ascending,
    Descending,
}

impl SortIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortIcon::Neutral => "↕",
            SortIcon::Ascending => "↑",
            SortIcon::Descending => "↓",
        }
    }
}

impl From<SortOrder> for SortIcon {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Ascending => SortIcon::Ascending,
            SortOrder::Descending => SortIcon::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub title: &'static str,
    pub icon: SortIcon,
}

/// Styled cell (error type or symbol type badge).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    /// Index of the cell the badge decorates
    pub column: usize,
    pub label: String,
    pub class: &'static str,
}

/// Source location a row points at. `line == 0` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub badge: Option<Badge>,
    /// Style class of the scope cell (symbols only)
    pub scope_class: Option<&'static str>,
    pub location: Location,
}

impl TableRow {
    /// Rows only jump to the editor when they carry a known line.
    pub fn is_clickable(&self) -> bool {
        self.location.is_known()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub id: TableId,
    pub columns: Vec<Column>,
    pub rows: Vec<TableRow>,
    /// "1 error", "3 símbolos", ...
    pub caption: String,
    /// Placeholder shown when there are no rows
    pub empty_message: &'static str,
}

impl ReportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_values(&self, column: usize) -> Vec<&str> {
        self.rows.iter().map(|r| r.cells.get(column).map(String::as_str).unwrap_or("")).collect()
    }
}

/// Export cell: numbers stay numbers in spreadsheets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExportCell {
    Text(String),
    Integer(u64),
}

impl ExportCell {
    pub fn display(&self) -> String {
        match self {
            ExportCell::Text(s) => s.clone(),
            ExportCell::Integer(n) => n.to_string(),
        }
    }
}

/// Column layout and data of a downloadable table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<ExportCell>>,
    pub sheet_name: &'static str,
    pub file_stem: &'static str,
}

impl ExportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

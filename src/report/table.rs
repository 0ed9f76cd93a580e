//! Errors and symbols tables.
//!
//! Projects report entries into sortable table view models and into the
//! column layouts used for CSV / spreadsheet downloads.

use super::types::*;
use crate::host::EditorHost;
use crate::types::{ErrorEntry, SymbolEntry};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const ERROR_COLUMNS: [&str; 5] = ["#", "Descripción", "Línea", "Columna", "Tipo"];
pub const SYMBOL_COLUMNS: [&str; 6] = ["Nombre", "Tipo", "Tipo de Dato", "Ámbito", "Línea", "Columna"];

const ERROR_EXPORT_HEADERS: [&str; 5] = ["No.", "Descripción", "Línea", "Columna", "Tipo"];
const SYMBOL_EXPORT_HEADERS: [&str; 6] = ["ID", "Tipo de Símbolo", "Tipo de Dato", "Ámbito", "Línea", "Columna"];

/// Variable-like symbol types reported by the analyzer
const VARIABLE_TYPES: [&str; 5] = ["variable", "int", "string", "bool", "float"];

/// Style bucket of a symbol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Builtin,
    Variable,
    Function,
    Struct,
    Unknown,
}

impl SymbolClass {
    pub fn css_class(&self) -> &'static str {
        match self {
            SymbolClass::Builtin => "symbol-type-builtin",
            SymbolClass::Variable => "symbol-type-variable",
            SymbolClass::Function => "symbol-type-function",
            SymbolClass::Struct => "symbol-type-struct",
            SymbolClass::Unknown => "symbol-type-unknown",
        }
    }
}

/// Classify a symbol type. First match wins:
/// builtin ("Embebida"), variable aliases, function, struct.
/// Unrecognized types land in the variable bucket.
pub fn classify_symbol(kind: Option<&str>) -> SymbolClass {
    let Some(kind) = kind else {
        return SymbolClass::Unknown;
    };

    if kind.contains("Embebida") {
        SymbolClass::Builtin
    } else if VARIABLE_TYPES.contains(&kind) {
        SymbolClass::Variable
    } else if kind.contains("function") {
        SymbolClass::Function
    } else if kind == "struct" {
        SymbolClass::Struct
    } else {
        SymbolClass::Variable
    }
}

/// Badge text for a symbol type. Unrecognized types show uppercased.
pub fn symbol_label(kind: Option<&str>) -> String {
    let Some(kind) = kind else {
        return "DESCONOCIDO".to_string();
    };

    if kind.contains("Embebida") {
        "INCORPORADA".to_string()
    } else if VARIABLE_TYPES.contains(&kind) {
        "VARIABLE".to_string()
    } else if kind.contains("function") {
        "FUNCIÓN".to_string()
    } else if kind == "struct" {
        "ESTRUCTURA".to_string()
    } else {
        kind.to_uppercase()
    }
}

/// Style class of a scope name
pub fn scope_class(scope: &str) -> &'static str {
    if scope.is_empty() || scope == "global" {
        "scope-global"
    } else if scope.contains("func") {
        "scope-function"
    } else if scope.contains("struct") {
        "scope-struct"
    } else {
        "scope-local"
    }
}

fn symbol_name(symbol: &SymbolEntry, index: usize) -> String {
    symbol.name.clone().unwrap_or_else(|| format!("SYM_{}", index + 1))
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

fn columns(titles: &[&'static str]) -> Vec<Column> {
    titles.iter().map(|title| Column { title, icon: SortIcon::Neutral }).collect()
}

/// Builds tables and keeps per-column sort state across refreshes.
#[derive(Debug, Default)]
pub struct TableRenderer {
    sort_state: HashMap<(TableId, usize), SortOrder>,
}

impl TableRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_errors(&self, errors: &[ErrorEntry]) -> ReportTable {
        let rows = errors
            .iter()
            .enumerate()
            .map(|(i, error)| {
                let label = error.kind.label();
                TableRow {
                    cells: vec![
                        (i + 1).to_string(),
                        error.message.clone(),
                        error.line.to_string(),
                        error.column.to_string(),
                        label.clone(),
                    ],
                    badge: Some(Badge { column: 4, label, class: error.kind.css_class() }),
                    scope_class: None,
                    location: Location { line: error.line, column: error.column },
                }
            })
            .collect();

        ReportTable {
            id: TableId::Errors,
            columns: columns(&ERROR_COLUMNS),
            rows,
            caption: plural(errors.len(), "error", "errores"),
            empty_message: "No hay errores que mostrar",
        }
    }

    pub fn render_symbols(&self, symbols: &[SymbolEntry]) -> ReportTable {
        let rows = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let kind = symbol.kind.as_deref();
                let label = symbol_label(kind);
                TableRow {
                    cells: vec![
                        symbol_name(symbol, i),
                        label.clone(),
                        symbol.data_type.clone(),
                        symbol.scope.clone(),
                        symbol.line.to_string(),
                        symbol.column.to_string(),
                    ],
                    badge: Some(Badge { column: 1, label, class: classify_symbol(kind).css_class() }),
                    scope_class: Some(scope_class(&symbol.scope)),
                    location: Location { line: symbol.line, column: symbol.column },
                }
            })
            .collect();

        ReportTable {
            id: TableId::Symbols,
            columns: columns(&SYMBOL_COLUMNS),
            rows,
            caption: plural(symbols.len(), "símbolo", "símbolos"),
            empty_message: "No hay símbolos que mostrar",
        }
    }

    /// Toggle the sort order of `column` and reorder the rows.
    ///
    /// The first sort of a column is descending. Returns the applied order,
    /// or `None` when there is nothing to sort.
    pub fn sort_table(&mut self, table: &mut ReportTable, column: usize) -> Option<SortOrder> {
        if table.rows.is_empty() || column >= table.columns.len() {
            return None;
        }

        let key = (table.id, column);
        let order = self.sort_state.get(&key).map(|o| o.toggled()).unwrap_or(SortOrder::Descending);
        self.sort_state.insert(key, order);

        sort_rows(table, column, order);
        debug!("sorted {} by column {} {:?}", table.id.as_str(), column, order);
        Some(order)
    }

    /// Forget every column's sort order
    pub fn reset_sort(&mut self) {
        self.sort_state.clear();
    }

    /// Last order applied to a column, if any
    pub fn sort_order(&self, table: TableId, column: usize) -> Option<SortOrder> {
        self.sort_state.get(&(table, column)).copied()
    }

    /// Column layout for downloading the errors table
    pub fn error_export(&self, errors: &[ErrorEntry]) -> ExportTable {
        let rows = errors
            .iter()
            .enumerate()
            .map(|(i, error)| {
                vec![
                    ExportCell::Integer(i as u64 + 1),
                    ExportCell::Text(error.message.clone()),
                    ExportCell::Integer(error.line as u64),
                    ExportCell::Integer(error.column as u64),
                    ExportCell::Text(error.kind.as_str().to_uppercase()),
                ]
            })
            .collect();

        ExportTable { headers: ERROR_EXPORT_HEADERS.to_vec(), rows, sheet_name: "Errores", file_stem: "errores" }
    }

    /// Column layout for downloading the symbol table
    pub fn symbol_export(&self, symbols: &[SymbolEntry]) -> ExportTable {
        let rows = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                vec![
                    ExportCell::Text(symbol_name(symbol, i)),
                    ExportCell::Text(symbol.kind.as_deref().unwrap_or("variable").to_uppercase()),
                    ExportCell::Text(symbol.data_type.clone()),
                    ExportCell::Text(symbol.scope.clone()),
                    ExportCell::Integer(symbol.line as u64),
                    ExportCell::Integer(symbol.column as u64),
                ]
            })
            .collect();

        ExportTable {
            headers: SYMBOL_EXPORT_HEADERS.to_vec(),
            rows,
            sheet_name: "Símbolos",
            file_stem: "tabla_simbolos",
        }
    }
}

/// Stable sort of the rows by one column, updating header icons.
pub fn sort_rows(table: &mut ReportTable, column: usize, order: SortOrder) {
    table.rows.sort_by(|a, b| {
        let a = a.cells.get(column).map(String::as_str).unwrap_or("");
        let b = b.cells.get(column).map(String::as_str).unwrap_or("");
        let cmp = compare_cells(a, b);
        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });

    for (i, col) in table.columns.iter_mut().enumerate() {
        col.icon = if i == column { order.into() } else { SortIcon::Neutral };
    }
}

/// Numeric when both cells are numbers, lexicographic otherwise
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Activate a row: jump the editor to its location when the line is known.
pub fn activate(row: &TableRow, editor: &mut dyn EditorHost) -> bool {
    if !row.is_clickable() {
        return false;
    }
    editor.jump_to(row.location.line, row.location.column);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    fn error(message: &str, line: u32, kind: &str) -> ErrorEntry {
        ErrorEntry { message: message.to_string(), line, column: 1, kind: ErrorKind::from_raw(Some(kind)) }
    }

    fn symbol(name: &str, kind: Option<&str>, line: u32) -> SymbolEntry {
        SymbolEntry {
            name: Some(name.to_string()),
            kind: kind.map(str::to_string),
            data_type: "int".to_string(),
            scope: "global".to_string(),
            line,
            column: 4,
        }
    }

    #[derive(Default)]
    struct Jumps(Vec<(u32, u32)>);

    impl EditorHost for Jumps {
        fn active_file(&self) -> Option<String> {
            None
        }
        fn content(&self) -> String {
            String::new()
        }
        fn jump_to(&mut self, line: u32, column: u32) {
            self.0.push((line, column));
        }
    }

    #[test]
    fn test_symbol_classification_and_labels() {
        assert_eq!(classify_symbol(Some("Embebida-print")), SymbolClass::Builtin);
        assert_eq!(symbol_label(Some("Embebida-print")), "INCORPORADA");

        assert_eq!(classify_symbol(Some("struct")), SymbolClass::Struct);
        assert_eq!(symbol_label(Some("struct")), "ESTRUCTURA");

        assert_eq!(classify_symbol(Some("float")), SymbolClass::Variable);
        assert_eq!(symbol_label(Some("float")), "VARIABLE");

        assert_eq!(classify_symbol(Some("function")), SymbolClass::Function);
        assert_eq!(symbol_label(Some("method function")), "FUNCIÓN");
    }

    #[test]
    fn test_unrecognized_symbol_type_class_and_label_differ() {
        assert_eq!(classify_symbol(Some("weirdtype")), SymbolClass::Variable);
        assert_eq!(classify_symbol(Some("weirdtype")).css_class(), "symbol-type-variable");
        assert_eq!(symbol_label(Some("weirdtype")), "WEIRDTYPE");
    }

    #[test]
    fn test_missing_symbol_type() {
        assert_eq!(classify_symbol(None), SymbolClass::Unknown);
        assert_eq!(symbol_label(None), "DESCONOCIDO");
    }

    #[test]
    fn test_builtin_wins_over_function() {
        assert_eq!(classify_symbol(Some("Embebida function")), SymbolClass::Builtin);
    }

    #[test]
    fn test_scope_classes() {
        assert_eq!(scope_class("global"), "scope-global");
        assert_eq!(scope_class("func main"), "scope-function");
        assert_eq!(scope_class("struct Punto"), "scope-struct");
        assert_eq!(scope_class("if_3"), "scope-local");
    }

    #[test]
    fn test_render_errors() {
        let table = TableRenderer::new().render_errors(&[error("undeclared identifier x", 5, "semantic")]);
        assert_eq!(table.caption, "1 error");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells, vec!["1", "undeclared identifier x", "5", "1", "SEMÁNTICO"]);
        let badge = table.rows[0].badge.as_ref().unwrap();
        assert_eq!(badge.label, "SEMÁNTICO");
        assert_eq!(badge.class, "error-type-semantic");
    }

    #[test]
    fn test_render_empty_tables() {
        let renderer = TableRenderer::new();
        let errors = renderer.render_errors(&[]);
        assert!(errors.is_empty());
        assert_eq!(errors.caption, "0 errores");
        assert_eq!(errors.empty_message, "No hay errores que mostrar");
        assert_eq!(renderer.render_symbols(&[]).caption, "0 símbolos");
    }

    #[test]
    fn test_render_symbols_with_generated_name() {
        let mut unnamed = symbol("", Some("int"), 3);
        unnamed.name = None;
        let table = TableRenderer::new().render_symbols(&[symbol("x", Some("int"), 2), unnamed]);
        assert_eq!(table.caption, "2 símbolos");
        assert_eq!(table.rows[1].cells[0], "SYM_2");
        assert_eq!(table.rows[0].scope_class, Some("scope-global"));
    }

    #[test]
    fn test_sort_numeric_not_lexicographic() {
        let mut renderer = TableRenderer::new();
        let mut table = renderer.render_errors(&[error("a", 10, "syntax"), error("b", 2, "syntax")]);

        assert_eq!(renderer.sort_table(&mut table, 2), Some(SortOrder::Descending));
        assert_eq!(table.column_values(2), vec!["10", "2"]);

        assert_eq!(renderer.sort_table(&mut table, 2), Some(SortOrder::Ascending));
        assert_eq!(table.column_values(2), vec!["2", "10"]);
    }

    #[test]
    fn test_sort_lexicographic_for_text() {
        let mut renderer = TableRenderer::new();
        let mut table = renderer.render_errors(&[error("alfa", 1, "syntax"), error("zeta", 1, "syntax")]);
        renderer.sort_table(&mut table, 1);
        assert_eq!(table.column_values(1), vec!["zeta", "alfa"]);
        renderer.sort_table(&mut table, 1);
        assert_eq!(table.column_values(1), vec!["alfa", "zeta"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut renderer = TableRenderer::new();
        let mut table = renderer.render_errors(&[
            error("first", 3, "syntax"),
            error("second", 1, "syntax"),
            error("third", 3, "syntax"),
        ]);
        renderer.sort_table(&mut table, 2);
        assert_eq!(table.column_values(1), vec!["first", "third", "second"]);
        renderer.sort_table(&mut table, 2);
        assert_eq!(table.column_values(1), vec!["second", "first", "third"]);
    }

    #[test]
    fn test_sort_icons_follow_active_column() {
        let mut renderer = TableRenderer::new();
        let mut table = renderer.render_errors(&[error("a", 1, "syntax"), error("b", 2, "syntax")]);
        renderer.sort_table(&mut table, 2);
        renderer.sort_table(&mut table, 3);

        let icons: Vec<SortIcon> = table.columns.iter().map(|c| c.icon).collect();
        assert_eq!(
            icons,
            vec![SortIcon::Neutral, SortIcon::Neutral, SortIcon::Neutral, SortIcon::Descending, SortIcon::Neutral]
        );
    }

    #[test]
    fn test_sort_state_is_keyed_by_table_and_column() {
        let mut renderer = TableRenderer::new();
        let mut errors = renderer.render_errors(&[error("a", 1, "syntax"), error("b", 2, "syntax")]);
        let mut symbols = renderer.render_symbols(&[symbol("x", None, 1), symbol("y", None, 2)]);

        renderer.sort_table(&mut errors, 2);
        assert_eq!(renderer.sort_table(&mut symbols, 2), Some(SortOrder::Descending));
        assert_eq!(renderer.sort_order(TableId::Errors, 2), Some(SortOrder::Descending));
    }

    #[test]
    fn test_sort_empty_table_is_noop() {
        let mut renderer = TableRenderer::new();
        let mut table = renderer.render_errors(&[]);
        assert_eq!(renderer.sort_table(&mut table, 0), None);
        assert_eq!(renderer.sort_order(TableId::Errors, 0), None);
    }

    #[test]
    fn test_reset_sort_restarts_descending() {
        let mut renderer = TableRenderer::new();
        let mut table = renderer.render_errors(&[error("a", 2, "syntax"), error("b", 10, "syntax")]);
        renderer.sort_table(&mut table, 2);
        renderer.reset_sort();
        assert_eq!(renderer.sort_order(TableId::Errors, 2), None);
        assert_eq!(renderer.sort_table(&mut table, 2), Some(SortOrder::Descending));
    }

    #[test]
    fn test_activate_only_known_lines() {
        let renderer = TableRenderer::new();
        let table = renderer.render_errors(&[error("a", 5, "syntax"), error("b", 0, "syntax")]);
        let mut editor = Jumps::default();

        assert!(activate(&table.rows[0], &mut editor));
        assert!(!activate(&table.rows[1], &mut editor));
        assert_eq!(editor.0, vec![(5, 1)]);
    }

    #[test]
    fn test_export_layouts() {
        let renderer = TableRenderer::new();
        let errors = renderer.error_export(&[error("x", 5, "semantic")]);
        assert_eq!(errors.headers, vec!["No.", "Descripción", "Línea", "Columna", "Tipo"]);
        assert_eq!(errors.rows[0][4], ExportCell::Text("SEMANTIC".into()));

        let symbols = renderer.symbol_export(&[symbol("x", None, 2)]);
        assert_eq!(symbols.rows[0][1], ExportCell::Text("VARIABLE".into()));
        assert_eq!(symbols.rows[0][4], ExportCell::Integer(2));
        assert_eq!(symbols.sheet_name, "Símbolos");
    }
}

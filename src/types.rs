/// Core data structures for execution results and report snapshots
///
/// This module defines the canonical shapes the rest of the crate works with.
/// Raw backend payloads are turned into these types by the `normalize` module;
/// nothing here talks to the network or the terminal.
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Category of a diagnostic reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Semantic,
    Runtime,
    /// Anything else, kept verbatim. A missing type is stored as `"unknown"`.
    Other(String),
}

impl ErrorKind {
    /// Build from the raw backend `type` string
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("lexical") => ErrorKind::Lexical,
            Some("syntax") => ErrorKind::Syntax,
            Some("semantic") => ErrorKind::Semantic,
            Some("runtime") => ErrorKind::Runtime,
            Some(other) if !other.is_empty() => ErrorKind::Other(other.to_string()),
            _ => ErrorKind::Other("unknown".to_string()),
        }
    }

    /// Raw wire name
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Semantic => "semantic",
            ErrorKind::Runtime => "runtime",
            ErrorKind::Other(raw) => raw,
        }
    }

    /// Badge text shown in the errors table
    pub fn label(&self) -> String {
        match self {
            ErrorKind::Lexical => "LÉXICO".to_string(),
            ErrorKind::Syntax => "SINTÁCTICO".to_string(),
            ErrorKind::Semantic => "SEMÁNTICO".to_string(),
            ErrorKind::Runtime => "EJECUCIÓN".to_string(),
            ErrorKind::Other(raw) => raw.to_uppercase(),
        }
    }

    /// Style class of the badge
    pub fn css_class(&self) -> &'static str {
        match self {
            ErrorKind::Lexical => "error-type-lexical",
            ErrorKind::Syntax => "error-type-syntax",
            ErrorKind::Semantic => "error-type-semantic",
            ErrorKind::Runtime => "error-type-runtime",
            ErrorKind::Other(_) => "error-type-unknown",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single diagnostic. Line and column are 0 when unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    pub line: u32,
    pub column: u32,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

/// A symbol table row, kept exactly as the backend reported it
///
/// `kind` and `name` stay optional because the tables render a missing
/// value differently from an empty one (`DESCONOCIDO`, `SYM_<n>`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolEntry {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "dataType")]
    pub data_type: String,
    pub scope: String,
    pub line: u32,
    pub column: u32,
}

/// Kind of a console entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
    Info,
    Success,
    Warning,
    Error,
    Output,
    System,
}

impl ConsoleKind {
    pub const ALL: [ConsoleKind; 6] = [
        ConsoleKind::Info,
        ConsoleKind::Success,
        ConsoleKind::Warning,
        ConsoleKind::Error,
        ConsoleKind::Output,
        ConsoleKind::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleKind::Info => "info",
            ConsoleKind::Success => "success",
            ConsoleKind::Warning => "warning",
            ConsoleKind::Error => "error",
            ConsoleKind::Output => "output",
            ConsoleKind::System => "system",
        }
    }

    /// Map a message type sent by the backend interpreter.
    ///
    /// The interpreter only emits output/error/info/warning; anything else
    /// is shown as program output.
    pub fn from_backend(raw: Option<&str>) -> Self {
        match raw {
            Some("error") => ConsoleKind::Error,
            Some("info") => ConsoleKind::Info,
            Some("warning") => ConsoleKind::Warning,
            _ => ConsoleKind::Output,
        }
    }
}

impl fmt::Display for ConsoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry retained by the console sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleEntry {
    pub content: String,
    pub kind: ConsoleKind,
    pub timestamp: DateTime<Local>,
}

/// A structured console message as sent by the backend (timestamp optional)
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleMessage {
    pub content: String,
    pub kind: ConsoleKind,
    pub timestamp: Option<DateTime<Local>>,
}

/// Explicitly tagged AST representation
///
/// Serializes as `{"kind": "...", "payload": ...}`, which is also the tagged
/// form a backend may send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum AstRepr {
    /// Vector-graphic markup containing an `<svg` root
    Graphic(String),
    /// Structured tree (nested objects / arrays of primitives)
    Tree(Value),
    /// Anything else, shown verbatim
    Text(String),
}

impl AstRepr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AstRepr::Graphic(_) => "graphic",
            AstRepr::Tree(_) => "tree",
            AstRepr::Text(_) => "text",
        }
    }
}

/// Error counts by kind, as reported in `errorSummary`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSummary(pub BTreeMap<String, u64>);

impl ErrorSummary {
    pub fn count(&self, kind: &str) -> u64 {
        self.0.get(kind).copied().unwrap_or(0)
    }

    /// Human summary, e.g. "2 léxicos, 1 semánticos". "0" when nothing is counted.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let labelled = [
            ("lexical", "léxicos"),
            ("syntax", "sintácticos"),
            ("semantic", "semánticos"),
            ("runtime", "de ejecución"),
        ];
        for (kind, label) in labelled {
            let n = self.count(kind);
            if n > 0 {
                parts.push(format!("{} {}", n, label));
            }
        }

        if parts.is_empty() { "0".to_string() } else { parts.join(", ") }
    }
}

/// The normalized `{errors, symbols, ast}` triple held by the report store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSnapshot {
    pub errors: Vec<ErrorEntry>,
    pub symbols: Vec<SymbolEntry>,
    pub ast: Option<AstRepr>,
}

impl ReportSnapshot {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.symbols.is_empty() && self.ast.is_none()
    }
}

/// Full payload of one execute request, after defaulting
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub errors: Vec<ErrorEntry>,
    pub error_summary: Option<ErrorSummary>,
    pub symbols: Vec<SymbolEntry>,
    pub ast: Option<AstRepr>,
    pub console_messages: Vec<ConsoleMessage>,
    pub formatted_output: Option<String>,
    pub output: Option<String>,
    pub has_arm64: bool,
    pub arm64_code: Option<String>,
    /// Server-side execution time, when the backend reports it
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    pub fn snapshot(&self) -> ReportSnapshot {
        ReportSnapshot { errors: self.errors.clone(), symbols: self.symbols.clone(), ast: self.ast.clone() }
    }

    /// Generated ARM64 listing, only when the backend flagged it as present
    pub fn arm64(&self) -> Option<&str> {
        if !self.has_arm64 {
            return None;
        }
        self.arm64_code.as_deref().filter(|code| !code.is_empty())
    }
}

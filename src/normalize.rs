/// Result normalization
///
/// The backend's execution-result schema has drifted over time (field names
/// differ between versions, entries can be partially filled). This module is
/// the single adapter between that payload and the canonical types in
/// `types`. It never rejects input: missing or malformed fields fall back to
/// safe defaults (0 for numbers, "unknown"/"global" for text).
use crate::types::*;
use chrono::{DateTime, Local};
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

/// Marker that identifies vector-graphic markup in an untagged AST payload
pub const GRAPHIC_MARKER: &str = "<svg";

/// Build the `{errors, symbols, ast}` snapshot from a raw execution result.
pub fn normalize_report(raw: &Value) -> ReportSnapshot {
    let errors: Vec<ErrorEntry> = array_field(raw, &["errors"]).map(|items| items.iter().map(error_entry).collect()).unwrap_or_default();

    // Two historical names for the symbol table
    let symbols: Vec<SymbolEntry> = array_field(raw, &["symbols", "symbolTable"])
        .map(|items| items.iter().map(symbol_entry).collect())
        .unwrap_or_default();

    let ast = ast_field(raw);

    debug!(
        "normalized report: {} errors, {} symbols, ast={}",
        errors.len(),
        symbols.len(),
        ast.as_ref().map(|a| a.kind_name()).unwrap_or("none")
    );

    ReportSnapshot { errors, symbols, ast }
}

/// Build the full execution result, applying the same defaulting rules.
pub fn parse_execution_result(raw: &Value) -> ExecutionResult {
    let ReportSnapshot { errors, symbols, ast } = normalize_report(raw);

    let console_messages = array_field(raw, &["consoleMessages"])
        .map(|items| items.iter().map(console_message).collect())
        .unwrap_or_default();

    ExecutionResult {
        success: bool_field(raw, "success"),
        errors,
        error_summary: error_summary(raw),
        symbols,
        ast,
        console_messages,
        formatted_output: text_field(raw, &["formattedOutput"]),
        output: text_field(raw, &["output"]),
        has_arm64: bool_field(raw, "hasArm64"),
        arm64_code: text_field(raw, &["arm64Code"]),
        execution_time_ms: raw.get("executionTime").and_then(Value::as_u64),
    }
}

/// Classify an AST value into its tagged representation.
///
/// A backend that sends `{"kind": ..., "payload": ...}` is taken at its word;
/// untagged payloads are sniffed: text containing an `<svg` root is a graphic,
/// other text is plain text, objects and arrays are trees.
pub fn classify_ast(value: &Value) -> Option<AstRepr> {
    if let Some(tagged) = tagged_ast(value) {
        return Some(tagged);
    }

    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) if s.contains(GRAPHIC_MARKER) => Some(AstRepr::Graphic(s.clone())),
        Value::String(s) => Some(AstRepr::Text(s.clone())),
        Value::Object(_) | Value::Array(_) => Some(AstRepr::Tree(value.clone())),
        Value::Bool(_) | Value::Number(_) => Some(AstRepr::Text(value.to_string())),
    }
}

fn tagged_ast(value: &Value) -> Option<AstRepr> {
    let obj = value.as_object()?;
    if obj.len() != 2 {
        return None;
    }
    let kind = obj.get("kind")?.as_str()?;
    let payload = obj.get("payload")?;

    let as_text = |p: &Value| match p {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match kind {
        "graphic" => Some(AstRepr::Graphic(as_text(payload))),
        "tree" => Some(AstRepr::Tree(payload.clone())),
        "text" => Some(AstRepr::Text(as_text(payload))),
        _ => None,
    }
}

fn ast_field(raw: &Value) -> Option<AstRepr> {
    // `ast` wins when it carries anything; the backend sends "" when it built none
    ["ast", "cstSvg"].iter().filter_map(|key| present(raw, key)).find_map(classify_ast)
}

fn error_entry(item: &Value) -> ErrorEntry {
    if let Value::String(message) = item {
        return ErrorEntry {
            message: message.clone(),
            line: 0,
            column: 0,
            kind: ErrorKind::from_raw(None),
        };
    }

    ErrorEntry {
        message: text_field(item, &["message", "msg", "description"]).unwrap_or_default(),
        line: number_field(item, "line"),
        column: number_field(item, "column"),
        kind: ErrorKind::from_raw(text_field(item, &["type"]).as_deref()),
    }
}

fn symbol_entry(item: &Value) -> SymbolEntry {
    SymbolEntry {
        name: text_field(item, &["name", "id"]),
        kind: text_field(item, &["type"]),
        data_type: text_field(item, &["dataType", "valueType"]).unwrap_or_else(|| "unknown".to_string()),
        scope: text_field(item, &["scope", "ambito"]).unwrap_or_else(|| "global".to_string()),
        line: number_field(item, "line"),
        column: number_field(item, "column"),
    }
}

fn console_message(item: &Value) -> ConsoleMessage {
    let timestamp = text_field(item, &["timestamp"])
        .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
        .map(|ts| ts.with_timezone(&Local));

    ConsoleMessage {
        content: text_field(item, &["content"]).unwrap_or_default(),
        kind: ConsoleKind::from_backend(text_field(item, &["type"]).as_deref()),
        timestamp,
    }
}

fn error_summary(raw: &Value) -> Option<ErrorSummary> {
    let obj = present(raw, "errorSummary")?.as_object()?;
    let counts: BTreeMap<String, u64> =
        obj.iter().filter_map(|(kind, n)| Some((kind.clone(), count_value(n)?))).collect();
    Some(ErrorSummary(counts))
}

//
// Field access helpers
//

/// Field that exists and is not null
fn present<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| !v.is_null())
}

/// First of `keys` that holds an array
fn array_field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().filter_map(|key| present(raw, key)).find_map(Value::as_array)
}

/// First of `keys` holding non-empty text. Numbers and booleans are stringified.
fn text_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| present(raw, key)).find_map(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn bool_field(raw: &Value, key: &str) -> bool {
    present(raw, key).and_then(Value::as_bool).unwrap_or(false)
}

/// Non-negative integer field; numeric strings are accepted, anything else is 0.
fn number_field(raw: &Value, key: &str) -> u32 {
    present(raw, key).and_then(count_value).map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(0)
}

fn count_value(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod normalize_test;

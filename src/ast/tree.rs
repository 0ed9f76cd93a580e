//! Structured and plain-text AST views.

use serde::Serialize;
use serde_json::Value;

/// Horizontal indent per nesting level, in display units
pub const INDENT_UNITS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Punct,
    Key,
    Str,
    Number,
    Bool,
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token { kind, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeLine {
    pub depth: usize,
    pub tokens: Vec<Token>,
}

impl TreeLine {
    /// Left offset of the line
    pub fn indent(&self) -> usize {
        self.depth * INDENT_UNITS
    }

    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// Collapsible-looking JSON rendering of a tree value, one line per
/// bracket or member. Object keys keep the order the backend sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeView {
    lines: Vec<TreeLine>,
}

impl TreeView {
    pub fn new(value: &Value) -> Self {
        let mut lines = Vec::new();
        emit(value, 0, None, false, &mut lines);
        TreeView { lines }
    }

    pub fn lines(&self) -> &[TreeLine] {
        &self.lines
    }

    /// Plain rendering with two spaces per level
    pub fn to_text(&self) -> String {
        self.lines.iter().map(|l| format!("{}{}", "  ".repeat(l.depth), l.text())).collect::<Vec<_>>().join("\n")
    }
}

fn leaf(value: &Value) -> Token {
    match value {
        Value::String(s) => Token::new(TokenKind::Str, format!("\"{}\"", s)),
        Value::Number(n) => Token::new(TokenKind::Number, n.to_string()),
        Value::Bool(b) => Token::new(TokenKind::Bool, b.to_string()),
        _ => Token::new(TokenKind::Null, "null"),
    }
}

fn emit(value: &Value, depth: usize, key: Option<&str>, comma: bool, lines: &mut Vec<TreeLine>) {
    let mut head = Vec::new();
    if let Some(key) = key {
        head.push(Token::new(TokenKind::Key, format!("\"{}\"", key)));
        head.push(Token::new(TokenKind::Punct, ": "));
    }
    let tail = || comma.then(|| Token::new(TokenKind::Punct, ","));

    let (open, close, len) = match value {
        Value::Array(items) => ("[", "]", items.len()),
        Value::Object(map) => ("{", "}", map.len()),
        other => {
            head.push(leaf(other));
            head.extend(tail());
            lines.push(TreeLine { depth, tokens: head });
            return;
        }
    };

    if len == 0 {
        head.push(Token::new(TokenKind::Punct, format!("{}{}", open, close)));
        head.extend(tail());
        lines.push(TreeLine { depth, tokens: head });
        return;
    }

    head.push(Token::new(TokenKind::Punct, open));
    lines.push(TreeLine { depth, tokens: head });

    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                emit(item, depth + 1, None, i + 1 < len, lines);
            }
        }
        Value::Object(map) => {
            for (i, (k, v)) in map.iter().enumerate() {
                emit(v, depth + 1, Some(k), i + 1 < len, lines);
            }
        }
        _ => {}
    }

    let mut closing = vec![Token::new(TokenKind::Punct, close)];
    closing.extend(tail());
    lines.push(TreeLine { depth, tokens: closing });
}

/// Whitespace-preserving text view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextView {
    text: String,
}

impl TextView {
    pub fn new(text: &str) -> Self {
        TextView { text: text.to_string() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

//! AST visualization.
//!
//! `AstRenderer` turns the report's AST representation into one of four
//! views and produces the SVG / PNG / JSON downloads. Rendering failures
//! never escape: they become an error panel with a retry action.
//!
//! # Module Organization
//!
//! - `svg` - Graphic view: measuring, fitting, zoom / pan / fullscreen, PNG
//! - `tree` - Structured tree lines and the plain-text view

mod svg;
mod tree;

pub use svg::{
    Bounds, FIT_MARGIN, PointerButton, SvgView, ViewHost, ViewKey, ZOOM_MAX, ZOOM_MIN, content_bounds,
    ensure_namespaces, extract_svg, fit_markup, rasterize, set_root_attribute,
};
pub use tree::{INDENT_UNITS, TextView, Token, TokenKind, TreeLine, TreeView};

use crate::types::AstRepr;
use log::{debug, warn};
use serde_json::json;
use thiserror::Error;

pub const SVG_FILE_NAME: &str = "ast-export.svg";
pub const PNG_FILE_NAME: &str = "ast-export.png";
pub const JSON_FILE_NAME: &str = "ast.json";

#[derive(Debug, Error)]
pub enum AstError {
    #[error("No hay AST para descargar")]
    NoAst,

    #[error("No hay SVG para descargar")]
    NoSvg,

    #[error("markup has no <svg> root element")]
    MissingRoot,

    #[error("invalid SVG: {0}")]
    Parse(#[from] resvg::usvg::Error),

    #[error("failed to rasterize AST: {0}")]
    Raster(String),

    #[error("failed to serialize AST: {0}")]
    Json(#[from] serde_json::Error),
}

/// Inline failure panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub message: String,
}

impl ErrorPanel {
    pub const TITLE: &'static str = "Error al cargar el AST";
    pub const RETRY_LABEL: &'static str = "Reintentar";
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstView {
    /// Nothing to show yet
    Empty,
    Graphic(SvgView),
    Tree(TreeView),
    Text(TextView),
    Failed(ErrorPanel),
}

impl AstView {
    pub const EMPTY_MESSAGE: &'static str = "No hay AST que mostrar";
    pub const EMPTY_HINT: &'static str = "Ejecuta código para generar el árbol de sintaxis";

    pub fn kind_name(&self) -> &'static str {
        match self {
            AstView::Empty => "empty",
            AstView::Graphic(_) => "graphic",
            AstView::Tree(_) => "tree",
            AstView::Text(_) => "text",
            AstView::Failed(_) => "failed",
        }
    }
}

fn build_view(ast: Option<&AstRepr>) -> AstView {
    let Some(ast) = ast else {
        return AstView::Empty;
    };

    match ast {
        AstRepr::Graphic(markup) => match SvgView::new(markup) {
            Ok(view) => AstView::Graphic(view),
            Err(e) => {
                warn!("could not render AST graphic: {}", e);
                AstView::Failed(ErrorPanel { message: e.to_string() })
            }
        },
        AstRepr::Tree(value) => AstView::Tree(TreeView::new(value)),
        AstRepr::Text(text) => AstView::Text(TextView::new(text)),
    }
}

/// Holds the last AST representation and the view built from it.
#[derive(Debug, Clone)]
pub struct AstRenderer {
    source: Option<AstRepr>,
    view: AstView,
}

impl Default for AstRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl AstRenderer {
    pub fn new() -> Self {
        Self { source: None, view: AstView::Empty }
    }

    pub fn render(&mut self, ast: Option<AstRepr>) -> &AstView {
        debug!("rendering AST as {}", ast.as_ref().map(|a| a.kind_name()).unwrap_or("empty"));
        self.source = ast;
        self.view = build_view(self.source.as_ref());
        &self.view
    }

    /// Rebuild the view from the stored representation
    pub fn retry(&mut self) -> &AstView {
        self.view = build_view(self.source.as_ref());
        &self.view
    }

    pub fn view(&self) -> &AstView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut AstView {
        &mut self.view
    }

    pub fn source(&self) -> Option<&AstRepr> {
        self.source.as_ref()
    }

    fn graphic(&self) -> Result<&SvgView, AstError> {
        match (&self.source, &self.view) {
            (None, _) => Err(AstError::NoAst),
            (_, AstView::Graphic(view)) => Ok(view),
            _ => Err(AstError::NoSvg),
        }
    }

    /// Displayed markup with namespace declarations
    pub fn to_svg(&self) -> Result<String, AstError> {
        Ok(ensure_namespaces(self.graphic()?.markup()))
    }

    pub fn to_png(&self) -> Result<Vec<u8>, AstError> {
        rasterize(self.graphic()?.source())
    }

    /// Pretty JSON. Markup and text are wrapped as `{"ast": ...}`.
    pub fn to_json(&self) -> Result<String, AstError> {
        let value = match self.source.as_ref().ok_or(AstError::NoAst)? {
            AstRepr::Tree(value) => value.clone(),
            AstRepr::Graphic(text) | AstRepr::Text(text) => json!({ "ast": text }),
        };
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Forward a key press to the graphic view
    pub fn handle_key(&mut self, key: ViewKey) -> bool {
        match &mut self.view {
            AstView::Graphic(view) => view.handle_key(key),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><circle cx="50" cy="50" r="10"/></svg>"#;

    #[test]
    fn test_absent_ast_is_empty_view() {
        let mut renderer = AstRenderer::new();
        assert_eq!(renderer.render(None), &AstView::Empty);
        assert!(matches!(renderer.to_json(), Err(AstError::NoAst)));
        assert_eq!(renderer.to_svg().unwrap_err().to_string(), "No hay AST para descargar");
    }

    #[test]
    fn test_dispatch_by_kind() {
        let mut renderer = AstRenderer::new();
        assert_eq!(renderer.render(Some(AstRepr::Graphic(SVG.into()))).kind_name(), "graphic");
        assert_eq!(renderer.render(Some(AstRepr::Tree(json!({"a": 1})))).kind_name(), "tree");
        assert_eq!(renderer.render(Some(AstRepr::Text("Program".into()))).kind_name(), "text");
    }

    #[test]
    fn test_broken_graphic_becomes_error_panel() {
        let mut renderer = AstRenderer::new();
        let view = renderer.render(Some(AstRepr::Graphic("<svg><g>".into())));
        let AstView::Failed(panel) = view else {
            panic!("expected failure panel, got {:?}", view);
        };
        assert!(panel.message.starts_with("invalid SVG"));

        // Retry goes through the same dispatch
        assert_eq!(renderer.retry().kind_name(), "failed");
    }

    #[test]
    fn test_svg_export_has_namespaces() {
        let mut renderer = AstRenderer::new();
        renderer.render(Some(AstRepr::Graphic(SVG.into())));
        let svg = renderer.to_svg().unwrap();
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
        assert!(svg.contains("viewBox="));
    }

    #[test]
    fn test_svg_export_requires_graphic() {
        let mut renderer = AstRenderer::new();
        renderer.render(Some(AstRepr::Text("Program".into())));
        assert!(matches!(renderer.to_svg(), Err(AstError::NoSvg)));
        assert!(matches!(renderer.to_png(), Err(AstError::NoSvg)));
    }

    #[test]
    fn test_png_export() {
        let mut renderer = AstRenderer::new();
        renderer.render(Some(AstRepr::Graphic(SVG.into())));
        let png = renderer.to_png().unwrap();
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        assert_eq!(width, 40);
    }

    #[test]
    fn test_json_export_shapes() {
        let mut renderer = AstRenderer::new();
        renderer.render(Some(AstRepr::Text("Program".into())));
        assert_eq!(renderer.to_json().unwrap(), "{\n  \"ast\": \"Program\"\n}");

        renderer.render(Some(AstRepr::Tree(json!({"type": "Program", "body": []}))));
        assert_eq!(renderer.to_json().unwrap(), "{\n  \"type\": \"Program\",\n  \"body\": []\n}");
    }

    #[test]
    fn test_tree_json_parses_back_to_same_value() {
        let tree = json!({
            "type": "Program",
            "line": 1,
            "ratio": 0.5,
            "exported": false,
            "doc": null,
            "body": [
                {"type": "Assign", "target": "x", "value": {"type": "Int", "value": -3}},
                ["nested", 2, true, null]
            ]
        });
        let mut renderer = AstRenderer::new();
        renderer.render(Some(AstRepr::Tree(tree.clone())));

        let parsed: serde_json::Value = serde_json::from_str(&renderer.to_json().unwrap()).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_escape_is_forwarded_to_graphic_view() {
        let mut renderer = AstRenderer::new();
        renderer.render(Some(AstRepr::Graphic(SVG.into())));
        if let AstView::Graphic(view) = renderer.view_mut() {
            view.toggle_fullscreen();
        }
        assert!(renderer.handle_key(ViewKey::Escape));
        assert!(!renderer.handle_key(ViewKey::Escape));
    }
}

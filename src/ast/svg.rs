//! Graphic AST view.
//!
//! The backend draws the tree as SVG. We measure the drawing with `usvg`,
//! rewrite the root so the content sits inside a fixed margin, and keep the
//! interactive state (zoom, scroll, drag, fullscreen) as plain numbers.

use super::AstError;
use lazy_static::lazy_static;
use log::debug;
use resvg::tiny_skia::{Color, Pixmap, Rect, Transform};
use resvg::usvg::{self, fontdb};
use std::sync::Arc;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Space kept around the content when fitting the root
pub const FIT_MARGIN: f32 = 40.0;

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 3.0;

const WHEEL_OUT: f64 = 0.9;
const WHEEL_IN: f64 = 1.1;
const BUTTON_IN: f64 = 1.2;
const BUTTON_OUT: f64 = 0.8;

/// Scroll distance per unit of pointer movement while dragging
const PAN_SPEED: f64 = 2.0;

/// PNG exports are rendered at twice the content size
const PNG_SCALE: f32 = 2.0;

lazy_static! {
    static ref FONTS: Arc<fontdb::Database> = {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("loaded {} font faces for AST rendering", db.len());
        Arc::new(db)
    };
}

/// Axis-aligned box in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        Bounds { x: r.x(), y: r.y(), width: r.width(), height: r.height() }
    }
}

impl Bounds {
    /// The box grown by `margin` on every side
    pub fn expand(&self, margin: f32) -> Bounds {
        Bounds {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

fn parse_tree(markup: &str) -> Result<usvg::Tree, AstError> {
    let options = usvg::Options { fontdb: FONTS.clone(), ..usvg::Options::default() };
    Ok(usvg::Tree::from_str(markup, &options)?)
}

/// Content bounding box in the root's user space. Falls back to the canvas
/// size when the drawing is empty.
pub fn content_bounds(tree: &usvg::Tree) -> Bounds {
    let root = tree.root();
    if root.has_children() {
        let bounds = Bounds::from(root.bounding_box());
        if !bounds.is_empty() {
            return bounds;
        }
    }
    let size = tree.size();
    Bounds { x: 0.0, y: 0.0, width: size.width(), height: size.height() }
}

/// Same as `content_bounds` but in canvas space, where rendering happens.
fn canvas_bounds(tree: &usvg::Tree) -> Bounds {
    let root = tree.root();
    if root.has_children() {
        let bounds = Bounds::from(root.abs_bounding_box());
        if !bounds.is_empty() {
            return bounds;
        }
    }
    let size = tree.size();
    Bounds { x: 0.0, y: 0.0, width: size.width(), height: size.height() }
}

/// Slice the `<svg ...>...</svg>` element out of arbitrary markup
pub fn extract_svg(markup: &str) -> Option<&str> {
    let start = markup.find("<svg")?;
    let end = markup.rfind("</svg>").map(|i| i + "</svg>".len()).filter(|&end| end > start).unwrap_or(markup.len());
    Some(&markup[start..end])
}

/// Byte range of the root start tag, `<svg` through its closing `>`.
fn root_tag(markup: &str) -> Option<(usize, usize)> {
    let start = markup.find("<svg")?;
    let mut quote = None;
    for (i, c) in markup[start..].char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some((start, start + i)),
            _ => {}
        }
    }
    None
}

/// Range of an attribute's value inside a start tag
fn attribute_value(tag: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = tag.as_bytes();
    let mut from = 0;
    while let Some(pos) = tag[from..].find(name) {
        let at = from + pos;
        from = at + name.len();

        let preceded_by_space = at > 0 && bytes[at - 1].is_ascii_whitespace();
        let rest = tag[from..].trim_start();
        if !preceded_by_space || !rest.starts_with('=') {
            continue;
        }
        let after_eq = rest[1..].trim_start();
        let Some(quote) = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let value_start = tag.len() - after_eq.len() + 1;
        let value_len = tag[value_start..].find(quote)?;
        return Some((value_start, value_start + value_len));
    }
    None
}

/// Set (or replace) an attribute on the root `<svg>` tag.
pub fn set_root_attribute(markup: &str, name: &str, value: &str) -> String {
    let Some((start, end)) = root_tag(markup) else {
        return markup.to_string();
    };
    let tag = &markup[start..end];

    if let Some((v_start, v_end)) = attribute_value(tag, name) {
        return format!("{}{}{}", &markup[..start + v_start], value, &markup[start + v_end..]);
    }

    // Insert before `>` or `/>`
    let insert_at = if tag.ends_with('/') { end - 1 } else { end };
    format!("{} {}=\"{}\"{}", markup[..insert_at].trim_end(), name, value, &markup[insert_at..])
}

/// Make sure the root declares the SVG and XLink namespaces.
pub fn ensure_namespaces(markup: &str) -> String {
    let mut out = markup.to_string();
    for (decl, ns) in [("xmlns", SVG_NS), ("xmlns:xlink", XLINK_NS)] {
        let Some((start, end)) = root_tag(&out) else {
            return out;
        };
        if attribute_value(&out[start..end], decl).is_none() {
            let at = start + "<svg".len();
            out.insert_str(at, &format!(" {}=\"{}\"", decl, ns));
        }
    }
    out
}

/// Rewrite the root so the viewport is exactly the content plus margin.
pub fn fit_markup(markup: &str, bounds: Bounds) -> String {
    let fitted = bounds.expand(FIT_MARGIN);
    let view_box = format!("{} {} {} {}", fitted.x, fitted.y, fitted.width, fitted.height);

    let out = set_root_attribute(markup, "viewBox", &view_box);
    let out = set_root_attribute(&out, "width", &fitted.width.to_string());
    let out = set_root_attribute(&out, "height", &fitted.height.to_string());
    set_root_attribute(&out, "preserveAspectRatio", "xMidYMid meet")
}

/// Render markup to PNG at 2x the content size on an opaque white canvas.
pub fn rasterize(markup: &str) -> Result<Vec<u8>, AstError> {
    let tree = parse_tree(markup)?;
    let bounds = canvas_bounds(&tree);

    let width = (bounds.width.ceil().max(1.0) * PNG_SCALE) as u32;
    let height = (bounds.height.ceil().max(1.0) * PNG_SCALE) as u32;
    let mut pixmap =
        Pixmap::new(width, height).ok_or_else(|| AstError::Raster(format!("invalid canvas {}x{}", width, height)))?;
    pixmap.fill(Color::WHITE);

    let transform = Transform::from_scale(PNG_SCALE, PNG_SCALE).pre_translate(-bounds.x, -bounds.y);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| AstError::Raster(e.to_string()))
}

/// Where the graphic view is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewHost {
    Panel,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKey {
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    pointer: (f64, f64),
    scroll: (f64, f64),
}

/// Interactive state of a rendered SVG tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgView {
    source: String,
    markup: String,
    bounds: Bounds,
    zoom: f64,
    scroll: (f64, f64),
    drag: Option<Drag>,
    host: ViewHost,
}

impl SvgView {
    /// Parse, measure and fit the markup.
    pub fn new(markup: &str) -> Result<Self, AstError> {
        let svg = extract_svg(markup).ok_or(AstError::MissingRoot)?;
        let source = ensure_namespaces(svg);
        let tree = parse_tree(&source)?;
        let bounds = content_bounds(&tree);
        debug!("AST drawing bounds: {:?}", bounds);

        Ok(Self {
            markup: fit_markup(&source, bounds),
            source,
            bounds,
            zoom: 1.0,
            scroll: (0.0, 0.0),
            drag: None,
            host: ViewHost::Panel,
        })
    }

    /// Fitted markup as displayed
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Markup as received (namespaces added)
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Size of the fitted viewport
    pub fn view_box_size(&self) -> (f64, f64) {
        let fitted = self.bounds.expand(FIT_MARGIN);
        (fitted.width as f64, fitted.height as f64)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scroll(&self) -> (f64, f64) {
        self.scroll
    }

    pub fn host(&self) -> ViewHost {
        self.host
    }

    /// Zoom indicator text, e.g. "120%"
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.zoom * 100.0).round() as i64)
    }

    pub fn zoom_by(&mut self, factor: f64) -> f64 {
        self.zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        self.zoom
    }

    /// Mouse wheel: scrolling down zooms out
    pub fn wheel(&mut self, delta_y: f64) -> f64 {
        self.zoom_by(if delta_y > 0.0 { WHEEL_OUT } else { WHEEL_IN })
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom_by(BUTTON_IN)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom_by(BUTTON_OUT)
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.scroll = (0.0, 0.0);
        self.drag = None;
    }

    /// Start a pan. Only the primary button drags.
    pub fn begin_drag(&mut self, button: PointerButton, x: f64, y: f64) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        self.drag = Some(Drag { pointer: (x, y), scroll: self.scroll });
        true
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some(drag) = self.drag else {
            return;
        };
        let dx = (x - drag.pointer.0) * PAN_SPEED;
        let dy = (y - drag.pointer.1) * PAN_SPEED;
        self.scroll = ((drag.scroll.0 - dx).max(0.0), (drag.scroll.1 - dy).max(0.0));
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Zoom out until the drawing fits the container. Never zooms in.
    pub fn fit_to_container(&mut self, container_width: f64, container_height: f64) -> f64 {
        let (width, height) = self.view_box_size();
        if width <= 0.0 || height <= 0.0 || container_width <= 0.0 || container_height <= 0.0 {
            return self.zoom;
        }
        let scale = (container_width / width).min(container_height / height).min(1.0);
        self.zoom = scale.max(ZOOM_MIN);
        self.zoom
    }

    /// Scroll so the drawing's center is in the middle of the container.
    pub fn center(&mut self, container_width: f64, container_height: f64) {
        let (width, height) = self.view_box_size();
        self.scroll = (
            ((width * self.zoom - container_width) / 2.0).max(0.0),
            ((height * self.zoom - container_height) / 2.0).max(0.0),
        );
    }

    pub fn toggle_fullscreen(&mut self) -> ViewHost {
        self.host = match self.host {
            ViewHost::Panel => ViewHost::Fullscreen,
            ViewHost::Fullscreen => ViewHost::Panel,
        };
        self.host
    }

    /// Escape leaves fullscreen. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: ViewKey) -> bool {
        if key == ViewKey::Escape && self.host == ViewHost::Fullscreen {
            self.host = ViewHost::Panel;
            return true;
        }
        false
    }

    /// Icon and tooltip of the fullscreen button
    pub fn fullscreen_button(&self) -> (&'static str, &'static str) {
        match self.host {
            ViewHost::Panel => ("⛶", "Ver en pantalla completa"),
            ViewHost::Fullscreen => ("⤓", "Salir de pantalla completa"),
        }
    }
}

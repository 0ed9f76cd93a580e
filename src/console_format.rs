/// Console formatting module - Pure rendering concerns
///
/// This module handles all terminal output formatting including:
/// - Console entries with per-kind colors
/// - Box-drawn report tables with fitted column widths
/// - AST views (tree lines, text, SVG summary, error panel)
/// - Text truncation and padding
///
/// It accepts view models from the report, ast and console modules and
/// renders them; it never decides what to show.
///
/// ## Output Flexibility
///
/// This module supports writing to any `std::io::Write` destination:
/// - Console (stdout/stderr) with optional colors
/// - String buffers (for tests)
/// - Files
/// - Any combination via `TableWriter`

use crate::ast::{AstView, ErrorPanel, SvgView, TextView, TokenKind, TreeView, ViewHost};
use crate::connectivity::ConnectionState;
use crate::console::{ConsoleRenderer, ConsoleStats, TIME_FORMAT};
use crate::report::ReportTable;
use crate::types::{ConsoleEntry, ConsoleKind};
use std::io::{self, Write};
use std::sync::OnceLock;
use term::color::Color;
use terminal_size::{Width, terminal_size};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Narrowest a column is squeezed to when the terminal is too small
const MIN_COLUMN: usize = 8;

/// Writer for table output - configurable for color/plain text
pub struct TableWriter<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> TableWriter<W> {
    /// Create a new table writer
    pub fn new(writer: W, use_colors: bool) -> Self {
        Self { writer, use_colors }
    }

    /// Write formatted text, optionally with color
    fn write_colored(&mut self, text: &str, color: Color) -> io::Result<()> {
        if !self.use_colors {
            return write!(self.writer, "{}", text);
        }
        // Use RGB for bright yellow (better Windows Terminal support)
        if color == term::color::BRIGHT_YELLOW {
            write!(self.writer, "\x1b[38;2;255;255;102m{}\x1b[0m", text)
        } else {
            write!(self.writer, "\x1b[{}m{}\x1b[0m", ansi_code(color), text)
        }
    }

    /// Write a newline
    fn writeln(&mut self) -> io::Result<()> {
        writeln!(self.writer)
    }

    /// `[HH:MM:SS] content`, colored by kind
    pub fn write_console_entry(&mut self, entry: &ConsoleEntry) -> io::Result<()> {
        write!(self.writer, "[{}] ", entry.timestamp.format(TIME_FORMAT))?;
        match kind_color(entry.kind) {
            Some(color) => self.write_colored(&entry.content, color)?,
            None => write!(self.writer, "{}", entry.content)?,
        }
        self.writeln()
    }

    pub fn write_divider(&mut self) -> io::Result<()> {
        let width = console_width().min(80);
        self.write_colored(&"─".repeat(width), term::color::BRIGHT_BLACK)?;
        self.writeln()
    }

    /// Write a report table: caption line, header with sort icons, rows.
    pub fn write_report_table(&mut self, title: &str, table: &ReportTable) -> io::Result<()> {
        let widths = TableWidths::for_table(table, console_width());

        writeln!(self.writer, "\n{} ({})", title, table.caption)?;
        writeln!(self.writer, "{}", border_line('┌', '┬', '┐', &widths))?;

        let headers: Vec<String> = table.columns.iter().map(|c| format!("{} {}", c.title, c.icon.as_str())).collect();
        self.write_row(&headers, &widths, None)?;
        writeln!(self.writer, "{}", border_line('├', '┼', '┤', &widths))?;

        if table.is_empty() {
            let inner = widths.total.saturating_sub(2);
            let message = truncate_with_padding(table.empty_message, inner);
            writeln!(self.writer, "│{}│", center(message.trim_end(), inner))?;
        } else {
            for row in &table.rows {
                let badge = row.badge.as_ref().map(|b| (b.column, badge_color(b.class)));
                self.write_row(&row.cells, &widths, badge)?;
            }
        }

        writeln!(self.writer, "{}", border_line('└', '┴', '┘', &widths))
    }

    fn write_row(&mut self, cells: &[String], widths: &TableWidths, badge: Option<(usize, Color)>) -> io::Result<()> {
        write!(self.writer, "│")?;
        for (i, width) in widths.columns.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let text = format!(" {} ", truncate_with_padding(cell, width.saturating_sub(2)));
            match badge {
                Some((column, color)) if column == i => self.write_colored(&text, color)?,
                _ => write!(self.writer, "{}", text)?,
            }
            write!(self.writer, "│")?;
        }
        self.writeln()
    }

    /// Write whichever AST view is active
    pub fn write_ast_view(&mut self, view: &AstView) -> io::Result<()> {
        match view {
            AstView::Empty => {
                writeln!(self.writer, "🌳 {}", AstView::EMPTY_MESSAGE)?;
                writeln!(self.writer, "   {}", AstView::EMPTY_HINT)
            }
            AstView::Graphic(svg) => self.write_svg_summary(svg),
            AstView::Tree(tree) => self.write_tree(tree),
            AstView::Text(text) => self.write_text(text),
            AstView::Failed(panel) => self.write_error_panel(panel),
        }
    }

    /// Tree lines, two spaces per level, tokens colored by kind
    pub fn write_tree(&mut self, tree: &TreeView) -> io::Result<()> {
        for line in tree.lines() {
            write!(self.writer, "{}", "  ".repeat(line.depth))?;
            for token in &line.tokens {
                match token_color(token.kind) {
                    Some(color) => self.write_colored(&token.text, color)?,
                    None => write!(self.writer, "{}", token.text)?,
                }
            }
            self.writeln()?;
        }
        Ok(())
    }

    pub fn write_text(&mut self, text: &TextView) -> io::Result<()> {
        for line in text.lines() {
            writeln!(self.writer, "{}", line)?;
        }
        Ok(())
    }

    /// The terminal cannot draw SVG; summarize the view state instead
    pub fn write_svg_summary(&mut self, view: &SvgView) -> io::Result<()> {
        let (width, height) = view.view_box_size();
        let host = match view.host() {
            ViewHost::Panel => "panel",
            ViewHost::Fullscreen => "pantalla completa",
        };
        let (icon, tooltip) = view.fullscreen_button();
        writeln!(
            self.writer,
            "AST (SVG) · {}×{} · zoom {} · {} · {} {}",
            width,
            height,
            view.zoom_label(),
            host,
            icon,
            tooltip
        )
    }

    /// Boxed failure panel with the retry action
    pub fn write_error_panel(&mut self, panel: &ErrorPanel) -> io::Result<()> {
        let title = format!("⚠️ {}", ErrorPanel::TITLE);
        let retry = format!("[{}]", ErrorPanel::RETRY_LABEL);
        let lines = [title.as_str(), panel.message.as_str(), retry.as_str()];

        let widest = lines.iter().map(|l| display_width(l)).max().unwrap_or(0);
        let inner = widest.min(console_width().saturating_sub(4)).max(MIN_COLUMN);

        writeln!(self.writer, "╭{}╮", "─".repeat(inner + 2))?;
        for (i, line) in lines.iter().enumerate() {
            write!(self.writer, "│ ")?;
            let text = truncate_with_padding(line, inner);
            if i == 0 {
                self.write_colored(&text, term::color::BRIGHT_RED)?;
            } else {
                write!(self.writer, "{}", text)?;
            }
            writeln!(self.writer, " │")?;
        }
        writeln!(self.writer, "╰{}╯", "─".repeat(inner + 2))
    }

    /// Per-kind message counts
    pub fn write_console_stats(&mut self, stats: &ConsoleStats) -> io::Result<()> {
        let label_width = 26;
        let value_width = 8;

        writeln!(self.writer, "\nEstadísticas de consola:")?;
        writeln!(self.writer, "{}", "━".repeat(label_width + value_width))?;
        for kind in ConsoleKind::ALL {
            write!(self.writer, "{}", pad_right(kind_label(kind), label_width))?;
            writeln!(self.writer, "{:>value_width$}", stats.count(kind), value_width = value_width)?;
        }
        writeln!(self.writer, "{}", "━".repeat(label_width + value_width))?;
        writeln!(self.writer, "{}{:>value_width$}", pad_right("Total", label_width), stats.total)
    }

    /// One-line status bar: connection, file, status, console, timing
    pub fn write_status_bar(
        &mut self,
        connection: ConnectionState,
        active_file: Option<&str>,
        status_message: &str,
        console_line: &str,
        elapsed: Option<&str>,
    ) -> io::Result<()> {
        let color = match connection {
            ConnectionState::Connected => term::color::BRIGHT_GREEN,
            ConnectionState::Disconnected => term::color::BRIGHT_RED,
            ConnectionState::Unknown => term::color::WHITE,
        };
        self.write_colored(connection.label(), color)?;

        let mut parts = vec![active_file.unwrap_or("-").to_string()];
        if !status_message.is_empty() {
            parts.push(status_message.to_string());
        }
        parts.push(console_line.to_string());
        if let Some(elapsed) = elapsed {
            parts.push(elapsed.to_string());
        }
        writeln!(self.writer, " │ {}", parts.join(" │ "))
    }
}

/// SGR foreground code for a terminal palette color
fn ansi_code(color: Color) -> u32 {
    if color < 8 { 30 + color } else { 90 + (color - 8) }
}

fn kind_color(kind: ConsoleKind) -> Option<Color> {
    match kind {
        ConsoleKind::Info => Some(term::color::BRIGHT_BLUE),
        ConsoleKind::Success => Some(term::color::BRIGHT_GREEN),
        ConsoleKind::Warning => Some(term::color::BRIGHT_YELLOW),
        ConsoleKind::Error => Some(term::color::BRIGHT_RED),
        ConsoleKind::System => Some(term::color::BRIGHT_MAGENTA),
        ConsoleKind::Output => None,
    }
}

fn kind_label(kind: ConsoleKind) -> &'static str {
    match kind {
        ConsoleKind::Info => "Información",
        ConsoleKind::Success => "Éxito",
        ConsoleKind::Warning => "Advertencias",
        ConsoleKind::Error => "Errores",
        ConsoleKind::Output => "Salidas",
        ConsoleKind::System => "Sistema",
    }
}

fn badge_color(class: &str) -> Color {
    match class {
        "error-type-lexical" => term::color::BRIGHT_MAGENTA,
        "error-type-syntax" => term::color::BRIGHT_YELLOW,
        "error-type-semantic" => term::color::BRIGHT_RED,
        "error-type-runtime" => term::color::RED,
        "symbol-type-builtin" => term::color::BRIGHT_CYAN,
        "symbol-type-variable" => term::color::BRIGHT_GREEN,
        "symbol-type-function" => term::color::BRIGHT_BLUE,
        "symbol-type-struct" => term::color::BRIGHT_MAGENTA,
        _ => term::color::WHITE,
    }
}

fn token_color(kind: TokenKind) -> Option<Color> {
    match kind {
        TokenKind::Key => Some(term::color::BRIGHT_CYAN),
        TokenKind::Str => Some(term::color::YELLOW),
        TokenKind::Number => Some(term::color::BRIGHT_GREEN),
        TokenKind::Bool => Some(term::color::BRIGHT_BLUE),
        TokenKind::Null | TokenKind::Punct => None,
    }
}

//
// Table Layout and Widths
//

/// Column widths of a box table, each including one space of padding per side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWidths {
    pub columns: Vec<usize>,
    pub total: usize, // Total table width including borders
}

impl TableWidths {
    /// Start from the natural content widths and squeeze the widest
    /// column until the table fits the terminal.
    pub fn fit(natural: &[usize], terminal_width: usize) -> Self {
        let borders = natural.len() + 1;
        let available = terminal_width.saturating_sub(borders);
        let mut columns: Vec<usize> = natural.iter().map(|w| w + 2).collect();

        loop {
            let sum: usize = columns.iter().sum();
            if sum <= available {
                break;
            }
            let Some((i, widest)) = columns.iter().copied().enumerate().max_by_key(|&(_, w)| w) else {
                break;
            };
            if widest <= MIN_COLUMN {
                break;
            }
            columns[i] = widest - (sum - available).min(widest - MIN_COLUMN);
        }

        let total = columns.iter().sum::<usize>() + borders;
        TableWidths { columns, total }
    }

    /// Natural widths of a report table: header (with icon) and every cell
    pub fn for_table(table: &ReportTable, terminal_width: usize) -> Self {
        let natural: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let header = display_width(column.title) + 2;
                table
                    .rows
                    .iter()
                    .map(|row| row.cells.get(i).map(|c| display_width(c)).unwrap_or(0))
                    .fold(header, usize::max)
            })
            .collect();
        Self::fit(&natural, terminal_width)
    }
}

fn border_line(left: char, mid: char, right: char, widths: &TableWidths) -> String {
    let segments: Vec<String> = widths.columns.iter().map(|w| "─".repeat(*w)).collect();
    format!("{}{}{}", left, segments.join(&mid.to_string()), right)
}

/// Get terminal width or default to 120
fn get_terminal_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        w as usize
    } else {
        120 // Default width
    }
}

static CONSOLE_WIDTH: OnceLock<usize> = OnceLock::new();

/// Pin the console width (tests, piped output). First call wins.
pub fn set_console_width(width: usize) {
    let _ = CONSOLE_WIDTH.set(width); // Ignore error if already initialized
}

/// Width tables are fitted to
pub fn console_width() -> usize {
    *CONSOLE_WIDTH.get_or_init(get_terminal_width)
}

//
// Text Formatting Utilities
//

/// Count the display width of a string, accounting for wide Unicode characters
pub fn display_width(s: &str) -> usize {
    // Use unicode-width crate for accurate width calculation
    UnicodeWidthStr::width(s)
}

/// Truncate and pad string to exact width
pub fn truncate_with_padding(s: &str, width: usize) -> String {
    let display_w = display_width(s);

    if display_w > width {
        // Truncate
        let mut result = String::new();
        let mut current_width = 0;

        // Reserve space for "..."
        let target_width = if width >= 3 { width - 3 } else { width };

        for c in s.chars() {
            let c_width = UnicodeWidthChar::width(c).unwrap_or(1);

            if current_width + c_width > target_width {
                break;
            }

            result.push(c);
            current_width += c_width;
        }

        if width >= 3 {
            result.push_str("...");
            current_width += 3;
        }

        // Pad if needed
        if current_width < width {
            result.push_str(&" ".repeat(width - current_width));
        }

        result
    } else {
        pad_right(s, width)
    }
}

fn pad_right(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(display_width(s));
    format!("{}{}", s, " ".repeat(padding))
}

fn center(s: &str, width: usize) -> String {
    let free = width.saturating_sub(display_width(s));
    let left = free / 2;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(free - left))
}

//
// Stdout Rendering
//

/// Console entries go straight to stdout as they are appended
pub struct TerminalConsole {
    use_colors: bool,
}

impl TerminalConsole {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }
}

impl ConsoleRenderer for TerminalConsole {
    fn render_entry(&mut self, entry: &ConsoleEntry) {
        let mut writer = TableWriter::new(io::stdout(), self.use_colors);
        let _ = writer.write_console_entry(entry);
    }

    fn render_divider(&mut self) {
        let mut writer = TableWriter::new(io::stdout(), self.use_colors);
        let _ = writer.write_divider();
    }
}

/// Print a report table to stdout
pub fn print_report_table(title: &str, table: &ReportTable, use_colors: bool) {
    let mut writer = TableWriter::new(io::stdout(), use_colors);
    let _ = writer.write_report_table(title, table);
}

/// Print the AST view to stdout
pub fn print_ast_view(view: &AstView, use_colors: bool) {
    let mut writer = TableWriter::new(io::stdout(), use_colors);
    let _ = writer.write_ast_view(view);
}

/// Print console statistics to stdout
pub fn print_console_stats(stats: &ConsoleStats) {
    let mut writer = TableWriter::new(io::stdout(), false);
    let _ = writer.write_console_stats(stats);
}

#[cfg(test)]
#[path = "console_format_test.rs"]
mod console_format_test;

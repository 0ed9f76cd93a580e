/// Execution console
///
/// `ConsoleSink` is an append-only, bounded log of typed messages. Entries are
/// rendered as soon as they are appended through an optional
/// `ConsoleRenderer`, newest last. Retention is enforced in batches: once more
/// than `capacity` entries are retained, the oldest `evict_batch` entries are
/// dropped together before the next entry is added.
use crate::types::{ConsoleEntry, ConsoleKind};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use log::debug;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 500;
pub const DEFAULT_EVICT_BATCH: usize = 50;

/// Time format used for entry stamps and the exported log
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Presentation surface for console entries
pub trait ConsoleRenderer {
    /// Draw a freshly appended entry at the bottom of the view
    fn render_entry(&mut self, entry: &ConsoleEntry);

    /// Draw a visual separator (not an entry)
    fn render_divider(&mut self) {}

    /// The oldest `count` entries were dropped
    fn evict(&mut self, _count: usize) {}

    /// All entries were removed
    fn clear(&mut self) {}
}

/// Per-kind message counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConsoleStats {
    pub total: usize,
    pub info: usize,
    pub success: usize,
    pub warning: usize,
    pub error: usize,
    pub output: usize,
    pub system: usize,
}

impl ConsoleStats {
    pub fn count(&self, kind: ConsoleKind) -> usize {
        match kind {
            ConsoleKind::Info => self.info,
            ConsoleKind::Success => self.success,
            ConsoleKind::Warning => self.warning,
            ConsoleKind::Error => self.error,
            ConsoleKind::Output => self.output,
            ConsoleKind::System => self.system,
        }
    }

    /// `Tipo,Cantidad` table for spreadsheet import, stamped with `now`
    pub fn to_csv(&self, now: DateTime<Local>) -> String {
        let stamp = now.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true);
        [
            "Tipo,Cantidad".to_string(),
            format!("Total,{}", self.total),
            format!("Información,{}", self.info),
            format!("Éxito,{}", self.success),
            format!("Advertencias,{}", self.warning),
            format!("Errores,{}", self.error),
            format!("Salidas,{}", self.output),
            format!("Sistema,{}", self.system),
            format!("Timestamp,{}", stamp),
        ]
        .join("\n")
    }
}

pub struct ConsoleSink {
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
    evict_batch: usize,
    renderer: Option<Box<dyn ConsoleRenderer>>,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_EVICT_BATCH)
    }

    /// Sink with a custom retention bound. `evict_batch` is clamped to `1..=capacity`.
    pub fn with_capacity(capacity: usize, evict_batch: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            evict_batch: evict_batch.clamp(1, capacity),
            renderer: None,
        }
    }

    /// Attach the surface entries are drawn on
    pub fn with_renderer(mut self, renderer: Box<dyn ConsoleRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Append an entry. Without a timestamp the wall clock is used.
    pub fn append(&mut self, content: impl Into<String>, kind: ConsoleKind, timestamp: Option<DateTime<Local>>) {
        if self.entries.len() > self.capacity {
            let count = self.evict_batch.min(self.entries.len());
            self.entries.drain(..count);
            debug!("console retention: evicted {} oldest entries", count);
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.evict(count);
            }
        }

        let entry = ConsoleEntry { content: content.into(), kind, timestamp: timestamp.unwrap_or_else(Local::now) };
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render_entry(&entry);
        }
        self.entries.push_back(entry);
    }

    /// Shorthand for `append` with the current time
    pub fn push(&mut self, content: impl Into<String>, kind: ConsoleKind) {
        self.append(content, kind, None);
    }

    /// Split raw program output into one `Output` entry per line.
    ///
    /// Blank lines are kept as a single space so the layout survives, except
    /// for the final line (the usual trailing newline).
    pub fn append_plain_output(&mut self, text: &str) {
        let lines: Vec<&str> = text.split('\n').collect();
        let last = lines.len() - 1;
        for (i, line) in lines.into_iter().enumerate() {
            if !line.trim().is_empty() || i < last {
                let content = if line.is_empty() { " " } else { line };
                self.push(content, ConsoleKind::Output);
            }
        }
    }

    /// Split pre-formatted output into entries, reading the kind from a
    /// leading marker (❌ error, ⚠️ warning, ℹ️ info). Blank lines are skipped.
    pub fn append_formatted_output(&mut self, text: &str) {
        for line in text.split('\n') {
            if line.trim().is_empty() {
                continue;
            }
            let (kind, content) = classify_formatted_line(line);
            self.push(content, kind);
        }
    }

    pub fn append_divider(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render_divider();
        }
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ConsoleEntry> {
        self.entries.back()
    }

    pub fn stats(&self) -> ConsoleStats {
        let mut stats = ConsoleStats { total: self.entries.len(), ..Default::default() };
        for entry in &self.entries {
            match entry.kind {
                ConsoleKind::Info => stats.info += 1,
                ConsoleKind::Success => stats.success += 1,
                ConsoleKind::Warning => stats.warning += 1,
                ConsoleKind::Error => stats.error += 1,
                ConsoleKind::Output => stats.output += 1,
                ConsoleKind::System => stats.system += 1,
            }
        }
        stats
    }

    /// One line per entry: `[HH:MM:SS] [KIND] content`
    pub fn export_log(&self) -> String {
        self.entries.iter().map(format_log_line).collect::<Vec<_>>().join("\n")
    }

    /// Status-bar caption: "N mensajes · Último: HH:MM:SS"
    pub fn status_line(&self) -> String {
        let n = self.entries.len();
        let caption = format!("{} {}", n, if n == 1 { "mensaje" } else { "mensajes" });
        match self.last() {
            Some(entry) => format!("{} · Último: [{}]", caption, entry.timestamp.format(TIME_FORMAT)),
            None => caption,
        }
    }
}

/// Render one entry the way the exported log shows it
pub fn format_log_line(entry: &ConsoleEntry) -> String {
    format!(
        "[{}] [{}] {}",
        entry.timestamp.format(TIME_FORMAT),
        entry.kind.as_str().to_uppercase(),
        entry.content
    )
}

fn classify_formatted_line(line: &str) -> (ConsoleKind, String) {
    const MARKERS: [(&str, ConsoleKind); 5] = [
        ("❌", ConsoleKind::Error),
        ("⚠️", ConsoleKind::Warning),
        ("⚠", ConsoleKind::Warning),
        ("ℹ️", ConsoleKind::Info),
        ("ℹ", ConsoleKind::Info),
    ];

    for (marker, kind) in MARKERS {
        if let Some(rest) = line.strip_prefix(marker) {
            return (kind, rest.trim().to_string());
        }
    }
    (ConsoleKind::Output, line.to_string())
}

/// `2026-10-18T09-05-03`: ISO stamp safe for file names
pub fn file_stamp(now: DateTime<Local>) -> String {
    now.with_timezone(&Utc).format("%Y-%m-%dT%H-%M-%S").to_string()
}

pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("vlancherry-log-{}.txt", file_stamp(now))
}

pub fn stats_file_name(now: DateTime<Local>) -> String {
    format!("vlancherry-stats-{}.csv", file_stamp(now))
}

#[cfg(test)]
#[path = "console_test.rs"]
mod console_test;

/// IDE session
///
/// `IdeSession` is the composition root: it owns the backend client, the
/// editor collaborator, the console, the report store and the connectivity
/// state, and implements the execute flow on top of them. Nothing here is
/// global; front ends build a session and drive it.
use crate::api::Backend;
use crate::connectivity::{ConnectionState, Connectivity};
use crate::console::{ConsoleSink, log_file_name, stats_file_name};
use crate::host::{EditorHost, MenuCommand};
use crate::normalize::parse_execution_result;
use crate::report::{ExportError, write_bytes};
use crate::store::{ReportStore, ReportView};
use crate::types::{ConsoleKind, ExecutionResult};
use chrono::Local;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const STARTUP_MESSAGE: &str = "VLan Cherry IDE iniciado correctamente";

/// Which bottom panel is in front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Console,
    Reports,
}

/// How an execute request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    NoActiveFile,
    Disconnected,
    EmptySource,
    /// A previous request is still outstanding
    Busy,
    /// The request never produced a result
    TransportFailed,
    Completed { success: bool, errors: usize },
}

/// Snapshot of the session for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeState {
    pub active_file: Option<String>,
    pub is_connected: bool,
    pub has_errors: bool,
    pub busy: bool,
    pub status_message: String,
    pub active_panel: Panel,
}

pub struct IdeSession<B: Backend, E: EditorHost> {
    backend: B,
    editor: E,
    console: ConsoleSink,
    store: ReportStore,
    connectivity: Connectivity,
    busy: bool,
    status_message: String,
    last_elapsed: Option<Duration>,
    last_result: Option<ExecutionResult>,
    active_panel: Panel,
}

impl<B: Backend, E: EditorHost> IdeSession<B, E> {
    pub fn new(backend: B, editor: E) -> Self {
        Self {
            backend,
            editor,
            console: ConsoleSink::new(),
            store: ReportStore::new(),
            connectivity: Connectivity::new(),
            busy: false,
            status_message: String::new(),
            last_elapsed: None,
            last_result: None,
            active_panel: Panel::Console,
        }
    }

    /// Replace the console (custom retention or renderer)
    pub fn with_console(mut self, console: ConsoleSink) -> Self {
        self.console = console;
        self
    }

    pub fn attach_view(&mut self, view: Box<dyn ReportView>) {
        self.store.attach(view);
    }

    pub fn on_connectivity_change(&mut self, subscriber: impl FnMut(ConnectionState) + 'static) {
        self.connectivity.subscribe(subscriber);
    }

    /// Greet and run the first health probe
    pub fn start(&mut self) -> ConnectionState {
        self.console.push(STARTUP_MESSAGE, ConsoleKind::Info);
        self.check_connection()
    }

    pub fn check_connection(&mut self) -> ConnectionState {
        self.connectivity.probe(&self.backend)
    }

    /// Run the active file on the backend and display the outcome.
    pub fn execute(&mut self) -> ExecuteOutcome {
        if self.busy {
            debug!("execute ignored: request in flight");
            return ExecuteOutcome::Busy;
        }

        let Some(file) = self.editor.active_file() else {
            self.console.push("No hay archivo activo para ejecutar", ConsoleKind::Warning);
            return ExecuteOutcome::NoActiveFile;
        };

        if !self.connectivity.is_connected() {
            self.console.push("No hay conexión con el backend", ConsoleKind::Error);
            return ExecuteOutcome::Disconnected;
        }

        let code = self.editor.content();
        if code.trim().is_empty() {
            self.console.push("El archivo está vacío", ConsoleKind::Warning);
            return ExecuteOutcome::EmptySource;
        }

        self.busy = true;
        self.console.push(format!("Ejecutando archivo: {}", file), ConsoleKind::Info);
        info!("executing {} ({} bytes)", file, code.len());

        let start = Instant::now();
        let outcome = match self.backend.execute(&code, &file) {
            Ok(raw) => self.display_execution_results(&raw, start.elapsed()),
            Err(e) => {
                warn!("execute request failed: {}", e);
                self.console.push(format!("Error al ejecutar: {}", e), ConsoleKind::Error);
                self.status_message = "Error de ejecución".to_string();
                self.check_connection();
                ExecuteOutcome::TransportFailed
            }
        };

        self.busy = false;
        outcome
    }

    /// Show a raw execution result: console lines, editor markers, status,
    /// then hand it to the report store.
    pub fn display_execution_results(&mut self, raw: &Value, elapsed: Duration) -> ExecuteOutcome {
        let result = parse_execution_result(raw);
        self.editor.clear_errors();

        if result.success {
            self.console.push("✅ Ejecución completada exitosamente", ConsoleKind::Success);
            self.display_program_output(&result);
            self.status_message = "Ejecución exitosa".to_string();
        } else {
            self.console.push("❌ Ejecución falló con errores", ConsoleKind::Error);
            if !result.errors.is_empty() {
                self.editor.mark_errors(&result.errors);
                let summary = result.error_summary.clone().unwrap_or_default();
                self.console.push(format!("Errores encontrados: {}", summary.describe()), ConsoleKind::Error);
            }
            self.status_message = format!("{} errores encontrados", result.errors.len());
        }

        self.last_elapsed = Some(elapsed);

        if result.arm64().is_some() {
            self.console.push("🔧 Código ARM64 generado exitosamente", ConsoleKind::Success);
            self.console.push("📊 Revisa la pestaña ARM64 en Reportes para ver el código", ConsoleKind::Info);
        }

        self.console.append_divider();
        self.store.update(raw);

        let errors = result.errors.len();
        if errors > 0 {
            self.show_reports();
        }

        let outcome = ExecuteOutcome::Completed { success: result.success, errors };
        self.last_result = Some(result);
        outcome
    }

    /// Structured messages win over formatted output, which wins over plain output
    fn display_program_output(&mut self, result: &ExecutionResult) {
        if !result.console_messages.is_empty() {
            for msg in &result.console_messages {
                self.console.append(msg.content.clone(), msg.kind, msg.timestamp);
            }
        } else if let Some(formatted) = result.formatted_output.as_deref().filter(|s| !s.is_empty()) {
            self.console.append_formatted_output(formatted);
        } else if let Some(output) = result.output.as_deref().filter(|s| !s.is_empty()) {
            self.console.append_plain_output(output);
        }
    }

    /// Dispatch a menu command. File commands belong to the shell and are
    /// ignored here; returns whether the session acted.
    pub fn handle_menu(&mut self, command: MenuCommand) -> bool {
        match command {
            MenuCommand::Execute => {
                self.execute();
                true
            }
            MenuCommand::ShowReports => {
                self.show_reports();
                true
            }
            MenuCommand::ClearConsole => {
                self.clear_console();
                true
            }
            MenuCommand::New | MenuCommand::Open | MenuCommand::Save | MenuCommand::SaveAs => {
                debug!("menu command '{}' is handled by the shell", command.as_str());
                false
            }
        }
    }

    pub fn show_reports(&mut self) {
        self.active_panel = Panel::Reports;
        self.store.show();
    }

    pub fn show_console(&mut self) {
        self.active_panel = Panel::Console;
        self.store.hide();
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
        self.console.push("🧹 Consola limpiada", ConsoleKind::System);
    }

    /// Write the console log into `dir` and note it in the console.
    pub fn export_console_log(&mut self, dir: &Path) -> Result<PathBuf, ExportError> {
        let now = Local::now();
        let path = write_bytes(dir, &log_file_name(now), self.console.export_log().as_bytes())?;
        self.console.push("📄 Log de consola exportado", ConsoleKind::Info);
        Ok(path)
    }

    pub fn export_console_stats(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let now = Local::now();
        write_bytes(dir, &stats_file_name(now), self.console.stats().to_csv(now).as_bytes())
    }

    pub fn state(&self) -> IdeState {
        IdeState {
            active_file: self.editor.active_file(),
            is_connected: self.connectivity.is_connected(),
            has_errors: self.store.has_errors(),
            busy: self.busy,
            status_message: self.status_message.clone(),
            active_panel: self.active_panel,
        }
    }

    /// "Tiempo: 42ms" once something ran
    pub fn elapsed_label(&self) -> Option<String> {
        self.last_elapsed.map(|d| format!("Tiempo: {}ms", d.as_millis()))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn console(&self) -> &ConsoleSink {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut ConsoleSink {
        &mut self.console
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connectivity.state()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn active_panel(&self) -> Panel {
        self.active_panel
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use cherry_ide::api::{Backend, HttpBackend, file_content, file_descriptors};
use cherry_ide::cli::{self, Command, FilesCommand, RunArgs};
use cherry_ide::config::{self, Config};
use cherry_ide::connectivity::{ConnectionState, Connectivity, HealthCheck};
use cherry_ide::console::ConsoleSink;
use cherry_ide::console_format::{self, TableWriter, TerminalConsole, print_ast_view, print_report_table};
use cherry_ide::host::{EditorHost, FileEditor};
use cherry_ide::normalize::normalize_report;
use cherry_ide::report::{ExportError, ReportsPanel, TableId};
use cherry_ide::session::{ExecuteOutcome, IdeSession, Panel};
use cherry_ide::store::ReportView;
use cherry_ide::ui;
use log::debug;
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    // Parse CLI arguments
    let args = cli::CliArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        std::process::exit(1);
    }

    // Set console width override if specified (for testing)
    if let Some(width) = args.console_width {
        console_format::set_console_width(width);
    }

    let config = match config::resolve_config(&args) {
        Ok(c) => c,
        Err(e) => {
            ui::print_error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };
    debug!("{:?}", config);

    let backend = HttpBackend::new(&config.backend_url);

    let exit_code = match &args.command {
        Command::Run(run) => run_file(run, backend, &config),
        Command::Status => print_status(&backend),
        Command::Watch { interval, count } => {
            let interval = interval.map(Duration::from_secs).unwrap_or(config.probe_interval);
            watch(&backend, interval, *count)
        }
        Command::Files(cmd) => files(cmd, &backend),
        Command::Reports { json } => show_backend_reports(&backend, *json, &config),
    };

    std::process::exit(exit_code);
}

/// Execute a file and show what came back
fn run_file(run: &RunArgs, backend: HttpBackend, config: &Config) -> i32 {
    let editor = match FileEditor::open(&run.file) {
        Ok(e) => e,
        Err(e) => {
            ui::print_error(&e);
            return 1;
        }
    };

    // Console entries stream to stdout as they arrive, except in JSON mode
    let mut console = ConsoleSink::with_capacity(config.console_capacity, config.console_evict_batch);
    if !run.json {
        console = console.with_renderer(Box::new(TerminalConsole::new(config.use_colors)));
    }

    let panel = Rc::new(RefCell::new(ReportsPanel::new()));
    let mut session = IdeSession::new(backend, editor).with_console(console);
    session.attach_view(Box::new(Rc::clone(&panel)));
    session.on_connectivity_change(|state| debug!("connectivity changed: {}", state.label()));

    if session.start() != ConnectionState::Connected {
        ui::print_warning(&format!("backend at {} is not reachable", config.backend_url));
    }

    let outcome = session.execute();
    debug!("execute outcome: {:?}", outcome);

    let wants_exports = run.export.is_some() || run.export_ast.is_some() || run.export_all;
    if run.reports || wants_exports {
        session.show_reports();
    }

    if run.json {
        let doc = serde_json::json!({ "state": session.state(), "report": session.store().current() });
        match serde_json::to_string_pretty(&doc) {
            Ok(s) => println!("{}", s),
            Err(e) => ui::print_error(&format!("Failed to serialize report: {}", e)),
        }
    } else if session.active_panel() == Panel::Reports {
        let mut panel = panel.borrow_mut();
        for spec in &run.sort {
            // Already validated
            if let Ok((id, column)) = cli::parse_sort_spec(spec) {
                panel.sort(id, column);
            }
        }

        println!();
        print_report_table("Errores", panel.errors(), config.use_colors);
        println!();
        print_report_table("Tabla de símbolos", panel.symbols(), config.use_colors);
        println!();
        print_ast_view(panel.ast().view(), config.use_colors);

        if let Some(n) = run.goto_error {
            goto_error(&panel, session.editor_mut(), n);
        }
    }

    if wants_exports {
        let panel = panel.borrow();
        write_exports(&panel, run, &config.export_dir);
    }

    if run.export_log {
        match session.export_console_log(&config.export_dir) {
            Ok(path) => ui::status(&format!("Log guardado en {}", path.display())),
            Err(e) => ui::print_error(&e.to_string()),
        }
        match session.export_console_stats(&config.export_dir) {
            Ok(path) => ui::status(&format!("Estadísticas guardadas en {}", path.display())),
            Err(e) => ui::print_error(&e.to_string()),
        }
    }

    if !run.json {
        let mut writer = TableWriter::new(io::stdout(), config.use_colors);
        if let Err(e) = writer.write_status_bar(
            session.connection_state(),
            session.editor().active_file().as_deref(),
            session.status_message(),
            &session.console().status_line(),
            session.elapsed_label().as_deref(),
        ) {
            ui::print_error(&format!("Failed to write status bar: {}", e));
        }
    }

    match outcome {
        ExecuteOutcome::Completed { success: true, .. } => 0,
        _ => 1,
    }
}

/// Activate the Nth error row and show where it points
fn goto_error(panel: &ReportsPanel, editor: &mut FileEditor, n: usize) {
    if !panel.activate(TableId::Errors, n - 1, editor) {
        ui::print_warning(&format!("no error row {} with a location", n));
        return;
    }

    if let Some((line, column)) = editor.cursor() {
        let text = editor.line(line).unwrap_or("");
        println!();
        println!("{}:{}:{}", editor.path().display(), line, column);
        println!("  {} | {}", line, text);
        println!("  {} | {}^", " ".repeat(line.to_string().len()), " ".repeat(column.saturating_sub(1) as usize));
    }
}

fn write_exports(panel: &ReportsPanel, run: &RunArgs, dir: &Path) {
    let mut results: Vec<Result<PathBuf, ExportError>> = Vec::new();

    if run.export_all {
        match panel.export_all(dir) {
            Ok(paths) if paths.is_empty() => ui::print_warning("No hay datos para descargar"),
            Ok(paths) => results.extend(paths.into_iter().map(Ok)),
            Err(e) => results.push(Err(e)),
        }
    }
    if let Some(format) = run.export {
        results.push(panel.export_errors(format, dir));
        results.push(panel.export_symbols(format, dir));
    }
    if let Some(format) = run.export_ast {
        results.push(panel.export_ast(format, dir));
    }

    for result in results {
        match result {
            Ok(path) => ui::status(&format!("Descargado {}", path.display())),
            // Nothing to download is a notice, not a failure
            Err(e @ ExportError::Empty(_)) => ui::print_warning(&e.to_string()),
            Err(ExportError::Ast(e)) => ui::print_warning(&e.to_string()),
            Err(e) => ui::print_error(&format!("Descarga fallida: {}", e)),
        }
    }
}

fn print_status<B: Backend>(backend: &B) -> i32 {
    let mut connectivity = Connectivity::new();
    let state = connectivity.probe(backend);
    println!("{}", state.label());
    if state == ConnectionState::Connected { 0 } else { 1 }
}

/// Probe on a fixed period and report transitions only
fn watch<B: Backend>(backend: &B, interval: Duration, count: Option<usize>) -> i32 {
    let mut connectivity = Connectivity::new();
    connectivity.subscribe(|state| ui::status(state.label()));

    let mut health = HealthCheck::new(interval);
    let mut probes = 0;
    loop {
        let now = Instant::now();
        if health.is_due(now) {
            connectivity.probe(backend);
            health.mark(now);
            probes += 1;
            if count.is_some_and(|c| probes >= c) {
                break;
            }
        }
        std::thread::sleep(health.remaining(Instant::now()));
    }

    if connectivity.is_connected() { 0 } else { 1 }
}

fn files<B: Backend>(cmd: &FilesCommand, backend: &B) -> i32 {
    let result = match cmd {
        FilesCommand::List => backend.list_files().map(|listing| {
            let files = file_descriptors(&listing);
            if files.is_empty() {
                println!("(sin archivos)");
            }
            for f in files {
                let size = f.size.map(|s| format!("{} B", s)).unwrap_or_default();
                println!(
                    "{}  {:>10}  {}",
                    console_format::truncate_with_padding(&f.name, 32),
                    size,
                    f.modified.unwrap_or_default()
                );
            }
        }),
        FilesCommand::Open { name } => backend.open_file(name).map(|response| match file_content(&response) {
            Some(content) => print!("{}", content),
            None => ui::print_warning(&format!("{} has no content", name)),
        }),
        FilesCommand::Save { path, name } => {
            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    ui::print_error(&format!("Failed to read {}: {}", path.display(), e));
                    return 1;
                }
            };
            let name = name
                .clone()
                .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_default();
            backend.save_file(&name, &content).map(|_| ui::status(&format!("Archivo guardado: {}", name)))
        }
        FilesCommand::Create { name, content } => {
            backend.create_file(name, content).map(|_| ui::status(&format!("Archivo creado: {}", name)))
        }
        FilesCommand::Delete { name, yes } => {
            if !*yes && !ui::confirm(&format!("¿Eliminar {} del backend?", name)) {
                ui::status("Cancelado");
                return 0;
            }
            backend.delete_file(name).map(|_| ui::status(&format!("Archivo eliminado: {}", name)))
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            ui::print_error(&e.to_string());
            1
        }
    }
}

fn show_backend_reports<B: Backend>(backend: &B, json: bool, config: &Config) -> i32 {
    let raw = match backend.reports() {
        Ok(raw) => raw,
        Err(e) => {
            ui::print_error(&e.to_string());
            return 1;
        }
    };
    let snapshot = normalize_report(&raw);

    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                ui::print_error(&format!("Failed to serialize report: {}", e));
                return 1;
            }
        }
        return 0;
    }

    let mut panel = ReportsPanel::new();
    panel.refresh(&snapshot);
    print_report_table("Errores", panel.errors(), config.use_colors);
    println!();
    print_report_table("Tabla de símbolos", panel.symbols(), config.use_colors);
    println!();
    print_ast_view(panel.ast().view(), config.use_colors);
    0
}

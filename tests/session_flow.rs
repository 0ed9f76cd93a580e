/// End-to-end tests for the execute flow
///
/// These tests drive an `IdeSession` against a scripted in-process backend
/// and read back what the console, the reports panel and the downloads show.
/// No network access is needed.
use cherry_ide::api::{ApiError, Backend};
use cherry_ide::ast::AstView;
use cherry_ide::connectivity::ConnectionState;
use cherry_ide::host::{EditorHost, FileEditor};
use cherry_ide::report::{AstExport, ExportFormat, ReportsPanel, SortOrder, TableId};
use cherry_ide::session::{ExecuteOutcome, IdeSession, Panel};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

struct MockBackend {
    up: Cell<bool>,
    replies: RefCell<Vec<Result<Value, ApiError>>>,
}

impl MockBackend {
    fn new(replies: Vec<Result<Value, ApiError>>) -> Self {
        Self { up: Cell::new(true), replies: RefCell::new(replies) }
    }
}

impl Backend for MockBackend {
    fn status(&self) -> Result<Value, ApiError> {
        if self.up.get() { Ok(json!({"status": "ok"})) } else { Err(ApiError::Transport("connection refused".into())) }
    }

    fn execute(&self, _code: &str, _file_name: &str) -> Result<Value, ApiError> {
        let mut replies = self.replies.borrow_mut();
        if replies.is_empty() { Err(ApiError::Transport("no scripted reply".into())) } else { replies.remove(0) }
    }

    fn save_file(&self, _: &str, _: &str) -> Result<Value, ApiError> {
        Ok(json!({"success": true}))
    }

    fn open_file(&self, _: &str) -> Result<Value, ApiError> {
        Ok(json!({"content": ""}))
    }

    fn create_file(&self, _: &str, _: &str) -> Result<Value, ApiError> {
        Ok(json!({"success": true}))
    }

    fn list_files(&self) -> Result<Value, ApiError> {
        Ok(json!([]))
    }

    fn delete_file(&self, _: &str) -> Result<Value, ApiError> {
        Ok(json!({"success": true}))
    }

    fn reports(&self) -> Result<Value, ApiError> {
        Ok(json!({}))
    }
}

const SOURCE: &str = "fn main() {\n    y := x + 1\n}\n";

fn failing_reply() -> Value {
    json!({
        "success": false,
        "errors": [
            {"message": "undeclared identifier x", "line": 2, "column": 10, "type": "semantic"}
        ],
        "errorSummary": {"semantic": 1},
        "symbolTable": [
            {"name": "main", "type": "function", "dataType": "void", "scope": "global", "line": 1, "column": 1},
            {"name": "y", "type": "variable", "dataType": "int", "scope": "main", "line": 2, "column": 5}
        ],
        "ast": {"type": "Program", "body": [{"type": "FunctionDecl", "name": "main"}]}
    })
}

fn session_with_panel(
    replies: Vec<Result<Value, ApiError>>,
) -> (IdeSession<MockBackend, FileEditor>, Rc<RefCell<ReportsPanel>>) {
    let editor = FileEditor::from_source(Path::new("main.vch"), SOURCE.to_string());
    let panel = Rc::new(RefCell::new(ReportsPanel::new()));
    let mut session = IdeSession::new(MockBackend::new(replies), editor);
    session.attach_view(Box::new(Rc::clone(&panel)));
    session.start();
    (session, panel)
}

fn console_lines(session: &IdeSession<MockBackend, FileEditor>) -> Vec<String> {
    session.console().entries().map(|e| e.content.clone()).collect()
}

#[test]
fn test_failed_run_fills_reports_panel() {
    let (mut session, panel) = session_with_panel(vec![Ok(failing_reply())]);

    assert_eq!(session.execute(), ExecuteOutcome::Completed { success: false, errors: 1 });
    assert_eq!(session.active_panel(), Panel::Reports);
    assert!(console_lines(&session).contains(&"Errores encontrados: 1 semánticos".to_string()));

    let panel = panel.borrow();
    assert_eq!(panel.refresh_count(), 1);

    let errors = panel.errors();
    assert_eq!(errors.caption, "1 error");
    assert_eq!(errors.rows.len(), 1);
    let badge = errors.rows[0].badge.as_ref().unwrap();
    assert_eq!(badge.label, "SEMÁNTICO");
    assert_eq!(errors.rows[0].cells[2], "2");

    // symbolTable is read when symbols is absent
    let symbols = panel.symbols();
    assert_eq!(symbols.rows.len(), 2);
    assert_eq!(symbols.rows[0].cells[1], "FUNCIÓN");
    assert_eq!(symbols.rows[0].scope_class, Some("scope-global"));
    assert_eq!(symbols.rows[1].scope_class, Some("scope-local"));

    assert!(matches!(panel.ast().view(), AstView::Tree(_)));
}

#[test]
fn test_error_row_moves_editor_cursor() {
    let (mut session, panel) = session_with_panel(vec![Ok(failing_reply())]);
    session.execute();

    let activated = panel.borrow().activate(TableId::Errors, 0, session.editor_mut());
    assert!(activated);
    assert_eq!(session.editor().cursor(), Some((2, 10)));
    assert_eq!(session.editor().line(2), Some("    y := x + 1"));
    assert_eq!(session.editor().marked_errors().len(), 1);
}

#[test]
fn test_sorting_survives_until_next_refresh() {
    let (mut session, panel) = session_with_panel(vec![Ok(failing_reply())]);
    session.execute();

    let mut panel = panel.borrow_mut();
    assert_eq!(panel.sort(TableId::Symbols, 0), Some(SortOrder::Descending));
    assert_eq!(panel.symbols().column_values(0), vec!["y", "main"]);
    assert_eq!(panel.sort(TableId::Symbols, 0), Some(SortOrder::Ascending));
    assert_eq!(panel.symbols().column_values(0), vec!["main", "y"]);
}

#[test]
fn test_transport_failure_keeps_previous_report() {
    let (mut session, panel) =
        session_with_panel(vec![Ok(failing_reply()), Err(ApiError::Transport("connection reset".into()))]);
    session.execute();
    assert_eq!(panel.borrow().errors().rows.len(), 1);

    session.backend().up.set(false);
    assert_eq!(session.execute(), ExecuteOutcome::TransportFailed);

    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    assert_eq!(session.console().last().unwrap().content, "Error al ejecutar: connection reset");
    assert_eq!(session.store().error_count(), 1);
    assert_eq!(panel.borrow().errors().rows.len(), 1);
    assert_eq!(panel.borrow().refresh_count(), 1);

    // Disconnected sessions refuse to run until a probe succeeds
    assert_eq!(session.execute(), ExecuteOutcome::Disconnected);
    session.backend().up.set(true);
    assert_eq!(session.check_connection(), ConnectionState::Connected);
}

#[test]
fn test_successful_run_refreshes_lazily() {
    let reply = json!({"success": true, "output": "42\n", "ast": "Program"});
    let (mut session, panel) = session_with_panel(vec![Ok(reply)]);

    assert_eq!(session.execute(), ExecuteOutcome::Completed { success: true, errors: 0 });
    assert_eq!(session.active_panel(), Panel::Console);
    assert!(console_lines(&session).contains(&"42".to_string()));
    assert_eq!(panel.borrow().refresh_count(), 0);

    session.show_reports();
    assert_eq!(panel.borrow().refresh_count(), 1);
    assert!(matches!(panel.borrow().ast().view(), AstView::Text(_)));
}

#[test]
fn test_downloads_after_failed_run() {
    let (mut session, panel) = session_with_panel(vec![Ok(failing_reply())]);
    session.execute();
    let dir = tempfile::tempdir().unwrap();

    let panel = panel.borrow();
    let csv_path = panel.export_errors(ExportFormat::Csv, dir.path()).unwrap();
    assert_eq!(csv_path.file_name().unwrap(), "errores.csv");
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert!(csv.contains("undeclared identifier x,2,10,SEMANTIC"));

    let xlsx = panel.export_symbols(ExportFormat::Xlsx, dir.path()).unwrap();
    let bytes = std::fs::read(xlsx).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let json_path = panel.export_ast(AstExport::Json, dir.path()).unwrap();
    let ast: Value = serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(ast["type"], "Program");

    // A tree AST has no graphic to download
    assert!(panel.export_ast(AstExport::Svg, dir.path()).is_err());
    assert_eq!(session.editor().active_file().as_deref(), Some("main.vch"));
}

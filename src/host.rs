/// Editor collaborator and menu commands
///
/// The code editor is external to this crate. The session reaches it only
/// through `EditorHost`; the CLI provides a file-backed implementation.
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::types::ErrorEntry;

pub trait EditorHost {
    /// Name of the file being edited, if any
    fn active_file(&self) -> Option<String>;

    /// Current buffer contents
    fn content(&self) -> String;

    /// Move the cursor to a 1-based location
    fn jump_to(&mut self, line: u32, column: u32);

    /// Underline diagnostics in the buffer
    fn mark_errors(&mut self, _errors: &[ErrorEntry]) {}

    fn clear_errors(&mut self) {}
}

/// Fire-once commands sent by the application menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    New,
    Open,
    Save,
    SaveAs,
    Execute,
    ShowReports,
    ClearConsole,
}

impl MenuCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCommand::New => "new",
            MenuCommand::Open => "open",
            MenuCommand::Save => "save",
            MenuCommand::SaveAs => "save-as",
            MenuCommand::Execute => "execute",
            MenuCommand::ShowReports => "show-reports",
            MenuCommand::ClearConsole => "clear-console",
        }
    }
}

impl FromStr for MenuCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(MenuCommand::New),
            "open" => Ok(MenuCommand::Open),
            "save" => Ok(MenuCommand::Save),
            "save-as" => Ok(MenuCommand::SaveAs),
            "execute" => Ok(MenuCommand::Execute),
            "show-reports" => Ok(MenuCommand::ShowReports),
            "clear-console" => Ok(MenuCommand::ClearConsole),
            other => Err(format!("unknown menu command: {}", other)),
        }
    }
}

/// A source file loaded from disk, used by the command-line front end.
#[derive(Debug, Clone)]
pub struct FileEditor {
    path: PathBuf,
    content: String,
    cursor: Option<(u32, u32)>,
    marked: Vec<ErrorEntry>,
}

impl FileEditor {
    pub fn open(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Ok(Self::from_source(path, content))
    }

    pub fn from_source(path: &Path, content: String) -> Self {
        Self { path: path.to_path_buf(), content, cursor: None, marked: Vec::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cursor(&self) -> Option<(u32, u32)> {
        self.cursor
    }

    pub fn marked_errors(&self) -> &[ErrorEntry] {
        &self.marked
    }

    /// Text of a 1-based line, if it exists
    pub fn line(&self, line: u32) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        self.content.lines().nth(index)
    }
}

impl EditorHost for FileEditor {
    fn active_file(&self) -> Option<String> {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned())
    }

    fn content(&self) -> String {
        self.content.clone()
    }

    fn jump_to(&mut self, line: u32, column: u32) {
        debug!("editor cursor -> {}:{}", line, column);
        self.cursor = Some((line, column));
    }

    fn mark_errors(&mut self, errors: &[ErrorEntry]) {
        self.marked = errors.to_vec();
    }

    fn clear_errors(&mut self) {
        self.marked.clear();
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::report::{AstExport, ExportFormat, TableId};

#[derive(Parser, Debug, Clone)]
#[command(name = "cherry")]
#[command(about = "Run VLan Cherry programs on the IDE backend and browse errors, symbols and the AST")]
#[command(version)]
pub struct CliArgs {
    /// Config file (default: <config dir>/vlan-cherry/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8080/api
    /// Overrides CHERRY_BACKEND_URL and the config file
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Directory downloads are written to (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Override console width for testing (default: auto-detect)
    #[arg(long, global = true, value_name = "COLUMNS")]
    pub console_width: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute a source file and show its console output and reports
    Run(RunArgs),

    /// Probe the backend once
    Status,

    /// Probe the backend periodically and print connectivity changes
    Watch {
        /// Seconds between probes (default: from config, 5)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Stop after this many probes (default: run until interrupted)
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },

    /// Manage files stored on the backend
    #[command(subcommand)]
    Files(FilesCommand),

    /// Fetch and show the backend's last reports
    Reports {
        /// Print the normalized snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Source file to execute
    pub file: PathBuf,

    /// Show the reports panel even when the run has no errors
    #[arg(long)]
    pub reports: bool,

    /// Sort a table by clicking its header, e.g. "errors:2" or "symbols:0".
    /// The first click sorts descending; repeat to flip the order
    #[arg(long, value_name = "TABLE:COL")]
    pub sort: Vec<String>,

    /// Jump to the location of the Nth error row (1-based, after sorting)
    #[arg(long, value_name = "N")]
    pub goto_error: Option<usize>,

    /// Download the errors and symbol tables in this format
    #[arg(long, value_name = "FORMAT", value_parser = parse_export_format)]
    pub export: Option<ExportFormat>,

    /// Download the AST in this format
    #[arg(long, value_name = "FORMAT", value_parser = parse_ast_export)]
    pub export_ast: Option<AstExport>,

    /// Write every available download (CSV, XLSX, SVG, PNG, JSON)
    #[arg(long, conflicts_with_all = ["export", "export_ast"])]
    pub export_all: bool,

    /// Write the console log and its statistics after the run
    #[arg(long)]
    pub export_log: bool,

    /// Print the session state and report snapshot as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FilesCommand {
    /// List files on the backend
    List,

    /// Print a file's content
    Open { name: String },

    /// Upload a local file under NAME (default: the local file name)
    Save {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },

    /// Create an empty file (or one with --content)
    Create {
        name: String,
        #[arg(long, default_value = "")]
        content: String,
    },

    /// Delete a file from the backend
    Delete {
        name: String,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn parse_export_format(s: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(s).ok_or_else(|| format!("unknown table format '{}' (expected csv or xlsx)", s))
}

fn parse_ast_export(s: &str) -> Result<AstExport, String> {
    AstExport::parse(s).ok_or_else(|| format!("unknown AST format '{}' (expected svg, png or json)", s))
}

/// Parse a `--sort` value into a table and a 0-based column.
pub fn parse_sort_spec(spec: &str) -> Result<(TableId, usize), String> {
    let (table, column) =
        spec.split_once(':').ok_or_else(|| format!("invalid sort '{}': expected TABLE:COLUMN", spec))?;

    let id = TableId::parse(&table.trim().to_lowercase())
        .ok_or_else(|| format!("unknown table '{}' (expected errors or symbols)", table.trim()))?;

    let column: usize =
        column.trim().parse().map_err(|_| format!("invalid column '{}' in sort '{}'", column.trim(), spec))?;
    let columns = match id {
        TableId::Errors => crate::report::ERROR_COLUMNS.len(),
        TableId::Symbols => crate::report::SYMBOL_COLUMNS.len(),
    };
    if column >= columns {
        return Err(format!("column {} out of range for {} (0..{})", column, table.trim(), columns));
    }

    Ok((id, column))
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        CliArgs::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.console_width == Some(0) {
            return Err("--console-width must be greater than zero".to_string());
        }

        match &self.command {
            Command::Run(run) => {
                for spec in &run.sort {
                    parse_sort_spec(spec)?;
                }
                if run.goto_error == Some(0) {
                    return Err("--goto-error is 1-based".to_string());
                }
                if run.json && (run.goto_error.is_some() || !run.sort.is_empty()) {
                    return Err("--json prints the raw snapshot; it cannot be combined with --sort or --goto-error"
                        .to_string());
                }
            }
            Command::Watch { interval: Some(0), .. } => {
                return Err("--interval must be at least one second".to_string());
            }
            Command::Files(FilesCommand::Create { name, .. } | FilesCommand::Open { name } | FilesCommand::Delete { name, .. })
                if name.trim().is_empty() =>
            {
                return Err("file name must not be empty".to_string());
            }
            _ => {}
        }

        Ok(())
    }
}

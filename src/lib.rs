//! VLan Cherry IDE shell.
//!
//! Sends source code to the language backend and turns each execution result
//! into console messages, an errors table, a symbol table and an AST view.
//! `session::IdeSession` wires the pieces together; the `cherry` binary is a
//! terminal front end over it.

pub mod api;
pub mod ast;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod console;
pub mod console_format;
pub mod host;
pub mod normalize;
pub mod report;
pub mod session;
pub mod store;
pub mod types;
pub mod ui;

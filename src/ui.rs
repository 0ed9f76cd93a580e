/// User interface and status output utilities
///
/// This module handles:
/// - Thread-safe status output
/// - Colored terminal text
/// - Confirmation prompts for destructive commands
use lazy_static::lazy_static;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Execute a function with exclusive access to console output
/// Prevents interleaved output from multiple threads
fn status_lock<F>(f: F)
where
    F: FnOnce(),
{
    lazy_static! {
        static ref LOCK: Mutex<()> = Mutex::new(());
    }
    let _guard = LOCK.lock();
    f();
}

/// Print the "cherry: " prefix for status messages
fn print_status_header() {
    print!("cherry: ");
}

/// Print colored text to terminal, with fallback to plain text
fn print_color(s: &str, fg: term::color::Color) {
    if !really_print_color(s, fg) {
        print!("{}", s);
    }

    fn really_print_color(s: &str, fg: term::color::Color) -> bool {
        if let Some(ref mut t) = term::stdout() {
            if t.fg(fg).is_err() {
                return false;
            }
            let _ = t.attr(term::Attr::Bold);
            if write!(t, "{}", s).is_err() {
                return false;
            }
            let _ = t.reset();
        }

        true
    }
}

/// Print a status message with "cherry: " prefix (thread-safe)
pub fn status(s: &str) {
    status_lock(|| {
        print_status_header();
        println!("{}", s);
    });
}

/// Print an error message with colored "error" prefix
pub fn print_error(msg: &str) {
    status_lock(|| {
        println!();
        print_color("error", term::color::BRIGHT_RED);
        println!(": {}", msg);
        println!();
    });
}

/// Print a warning with colored "warning" prefix
pub fn print_warning(msg: &str) {
    status_lock(|| {
        print_color("warning", term::color::BRIGHT_YELLOW);
        println!(": {}", msg);
    });
}

/// Ask a yes/no question on stdin. Anything but y/yes (or EOF) means no.
pub fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    let _ = io::stdout().flush();
    read_confirmation(io::stdin().lock())
}

fn read_confirmation<R: BufRead>(mut input: R) -> bool {
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => is_yes(&answer),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}

//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output shown only in verbose mode
//! - `Elapsed` for "updated in 3ms" style timings
//!
//! # Example
//!
//! ```ignore
//! log!("config"; "resolve valaxyConfig from {}", path.display());
//!
//! let elapsed = Elapsed::start();
//! log!("hmr"; "{} updated in {}", page, elapsed);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    fmt,
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable `debug!` output for the whole process.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

#[inline]
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown in verbose mode)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write `[module] message` to stdout, clearing whatever the line held.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

/// `[module]`, colored by subsystem.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "hmr" => tag.bright_yellow().bold().to_string(),
        "config" => tag.bright_blue().bold().to_string(),
        "watch" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_cyan().bold().to_string(),
    }
}

// ============================================================================
// Elapsed
// ============================================================================

/// Wall-clock timer for reload log lines.
#[derive(Debug, Clone, Copy)]
pub struct Elapsed(Instant);

impl Elapsed {
    pub fn start() -> Self {
        Self(Instant::now())
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.0.elapsed();
        if elapsed.as_secs() >= 1 {
            write!(f, "{:.2}s", elapsed.as_secs_f64())
        } else {
            write!(f, "{}ms", elapsed.as_millis())
        }
    }
}

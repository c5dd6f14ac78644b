//! User-facing status output.
//!
//! Every component that talks to the user receives a [`Reporter`] instead of
//! printing directly. `main` picks the implementation once: the console for
//! interactive runs, the `tracing` log for daemon runs.

use std::sync::{Mutex, PoisonError};

use colored::Colorize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::render::render_block;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    /// A failure the user must act on. Reporting one never exits the process;
    /// the caller decides.
    Critical,
}

pub trait Reporter: Send + Sync {
    fn emit(&self, severity: Severity, message: &str);

    /// `false` when output goes to a log rather than a terminal.
    fn is_interactive(&self) -> bool;

    fn info(&self, message: &str) {
        self.emit(Severity::Info, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Severity::Warning, message);
    }

    fn critical(&self, message: &str) {
        self.emit(Severity::Critical, message);
    }
}

/// Lines on stdout. Warnings and critical messages are red; in the others
/// backticked names are cyan and a URL after `` `slug`: `` is white.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => println!("{}", highlight(message)),
            Severity::Warning | Severity::Critical => println!("{}", message.red()),
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

fn highlight(message: &str) -> String {
    let parts: Vec<&str> = message.split('`').collect();
    let last = parts.len() - 1;
    let mut out = String::with_capacity(message.len());
    for (i, part) in parts.iter().enumerate() {
        let quoted = i % 2 == 1;
        if quoted && i != last {
            out.push_str(&format!("`{part}`").cyan().to_string());
        } else if quoted {
            // unmatched backtick
            out.push('`');
            out.push_str(part);
        } else if i == last && i > 0 && part.starts_with(": ") {
            out.push_str(": ");
            out.push_str(&part[2..].white().to_string());
        } else {
            out.push_str(part);
        }
    }
    out
}

/// Daemon-mode sink: one `tracing` event per message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn emit(&self, severity: Severity, message: &str) {
        let message = message.trim_end();
        match severity {
            Severity::Info => info!(target: "vizbee", "{message}"),
            Severity::Warning => warn!(target: "vizbee", "{message}"),
            Severity::Critical => error!(target: "vizbee", "{message}"),
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Keeps every message in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    interactive: bool,
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemoryReporter {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, m)| m).collect()
    }

    /// Everything emitted so far, one message per line.
    pub fn output(&self) -> String {
        self.messages()
            .iter()
            .map(|m| format!("{m}\n"))
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, severity: Severity, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_string()));
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Format a structured error payload for display.
///
/// Strings are shown as-is, anything else as a YAML-style block. On a
/// terminal the block is pushed below the message by a blank line.
pub fn format_errors(errors: &Value, interactive: bool) -> String {
    let block = match errors {
        Value::String(s) => s.clone(),
        other => render_block(other),
    };
    if interactive {
        format!("\n\n{block}")
    } else {
        block
    }
}

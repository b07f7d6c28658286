//! Run-scoped warnings and errors.
//!
//! Every entry carries the folder it was found in. In strict mode the first fatal condition
//! dumps the log and aborts the run; in permissive (debug) mode it is only recorded here.
use log::{error, info, warn};
use prettytable::{Table, row};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub folder: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}\n  Folder: {}", self.severity, self.message, self.folder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// first fatal condition aborts the run
    Strict,
    /// fatal conditions drop the folder, the run continues
    Permissive,
}

impl RunMode {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            RunMode::Permissive
        } else {
            RunMode::Strict
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    pub mode: RunMode,
    entries: Vec<Diagnostic>,
}

impl DiagnosticsLog {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
        }
    }

    pub fn warn(&mut self, folder: &str, message: impl Into<String>) {
        let message = message.into();
        warn!("{} ({})", message, folder);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            folder: folder.to_string(),
            message,
        });
    }

    pub fn error(&mut self, folder: &str, message: impl Into<String>) {
        let message = message.into();
        error!("{} ({})", message, folder);
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            folder: folder.to_string(),
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// writes every entry to the log, oldest first
    pub fn dump(&self) {
        if self.entries.is_empty() {
            return;
        }
        info!("---------------- {} diagnostics ----------------", self.entries.len());
        for entry in &self.entries {
            match entry.severity {
                Severity::Warning => warn!("{}", entry),
                Severity::Error => error!("{}", entry),
            }
        }
    }

    /// one row per entry
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["#", "Severity", "Folder", "Message"]);
        for (i, entry) in self.entries.iter().enumerate() {
            table.add_row(row![i + 1, entry.severity, entry.folder, entry.message]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_folder() {
        let mut log = DiagnosticsLog::new(RunMode::from_debug(true));
        assert_eq!(log.mode, RunMode::Permissive);
        log.warn("a/b", "more than one empty slab");
        log.error("a/c", "Empty slab needed for reaction!");
        assert_eq!(log.count(Severity::Warning), 1);
        assert_eq!(log.count(Severity::Error), 1);
        assert_eq!(log.entries()[1].folder, "a/c");
        assert!(log.entries()[1].to_string().contains("Folder: a/c"));
        // header plus one row per entry
        assert_eq!(log.table().len(), 3);
        log.clear();
        assert!(log.is_empty());
    }
}

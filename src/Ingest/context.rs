use crate::Ingest::config::IngestConfig;
use crate::Ingest::diagnostics::{DiagnosticsLog, RunMode, Severity};
use prettytable::{Table, row};
use std::collections::BTreeMap;

/// Structure ids of everything the current reaction refers to, keyed by entry name.
///
/// Gas references, the empty slab (`star`) and the bulk (`bulk<crystal>`) are registered
/// before the final folders are read; `star` and `bulk*` survive the pruning between reactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesIdCache {
    ids: BTreeMap<String, String>,
}

impl SpeciesIdCache {
    pub fn insert(&mut self, entry: &str, id: &str) {
        self.ids.insert(entry.to_string(), id.to_string());
    }

    pub fn extend(&mut self, ids: &BTreeMap<String, String>) {
        for (entry, id) in ids {
            self.insert(entry, id);
        }
    }

    pub fn get(&self, entry: &str) -> Option<&str> {
        self.ids.get(entry).map(String::as_str)
    }

    /// keeps `star`, `bulk*` and the entries of the next reaction
    pub fn prune_for_reaction(&mut self, entry_names: &[String]) {
        self.ids.retain(|entry, _| {
            entry == "star" || entry.starts_with("bulk") || entry_names.contains(entry)
        });
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.ids.clone()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub folders: usize,
    pub written: usize,
    pub updated: usize,
    pub already_present: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// The only state shared between folders of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: IngestConfig,
    pub diagnostics: DiagnosticsLog,
    pub species_ids: SpeciesIdCache,
    pub stats: RunStats,
}

impl RunContext {
    pub fn new(config: IngestConfig) -> Self {
        let mode = RunMode::from_debug(config.debug);
        Self {
            config,
            diagnostics: DiagnosticsLog::new(mode),
            species_ids: SpeciesIdCache::default(),
            stats: RunStats::default(),
        }
    }

    pub fn mode(&self) -> RunMode {
        self.diagnostics.mode
    }

    /// end-of-run counters
    pub fn summary_table(&self) -> Table {
        let s = &self.stats;
        let mut table = Table::new();
        table.add_row(row!["Final folders", s.folders]);
        table.add_row(row!["Records written", s.written]);
        table.add_row(row!["Records updated", s.updated]);
        table.add_row(row!["Already present", s.already_present]);
        table.add_row(row!["Folders skipped", s.skipped]);
        table.add_row(row!["Folders dropped", s.dropped]);
        table.add_row(row!["Warnings", self.diagnostics.count(Severity::Warning)]);
        table.add_row(row!["Errors", self.diagnostics.count(Severity::Error)]);
        table
    }
}

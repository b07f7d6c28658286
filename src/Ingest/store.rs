//! Keyed record stores. Records are identified by (chemical composition, reaction energy).
use crate::Ingest::errors::StoreError;
use crate::Ingest::record::ReactionRecord;
use approx::abs_diff_eq;
use enum_dispatch::enum_dispatch;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// tolerance (eV) for matching reaction energies of stored records
pub const ENERGY_TOLERANCE: f64 = 1e-8;

#[enum_dispatch]
pub trait RecordStore {
    /// id of a stored record with this key
    fn check(&self, chemical_composition: &str, reaction_energy: f64) -> Option<usize>;
    fn write(&mut self, record: ReactionRecord) -> Result<usize, StoreError>;
    fn update(&mut self, id: usize, record: ReactionRecord) -> Result<(), StoreError>;
    fn records(&self) -> &[ReactionRecord];
    fn len(&self) -> usize {
        self.records().len()
    }
}

fn find_record(records: &[ReactionRecord], chemical_composition: &str, reaction_energy: f64) -> Option<usize> {
    records.iter().position(|r| {
        r.chemical_composition == chemical_composition
            && abs_diff_eq!(r.reaction_energy, reaction_energy, epsilon = ENERGY_TOLERANCE)
    })
}

/// puts `record` at `id` and hands back the one it replaced
fn replace_record(
    records: &mut [ReactionRecord],
    id: usize,
    record: ReactionRecord,
) -> Result<ReactionRecord, StoreError> {
    let slot = records
        .get_mut(id)
        .ok_or_else(|| StoreError::NotFound(format!("no record with id {}", id)))?;
    Ok(std::mem::replace(slot, record))
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<ReactionRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryStore {
    fn check(&self, chemical_composition: &str, reaction_energy: f64) -> Option<usize> {
        find_record(&self.records, chemical_composition, reaction_energy)
    }

    fn write(&mut self, record: ReactionRecord) -> Result<usize, StoreError> {
        self.records.push(record);
        Ok(self.records.len() - 1)
    }

    fn update(&mut self, id: usize, record: ReactionRecord) -> Result<(), StoreError> {
        replace_record(&mut self.records, id, record).map(|_| ())
    }

    fn records(&self) -> &[ReactionRecord] {
        &self.records
    }
}

/// All records in one pretty-printed JSON array, rewritten after every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<ReactionRecord>,
}

impl JsonFileStore {
    /// opens an existing dump or starts an empty one
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let records = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        debug!("opened {} with {} records", path.display(), records.len());
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonFileStore {
    fn check(&self, chemical_composition: &str, reaction_energy: f64) -> Option<usize> {
        find_record(&self.records, chemical_composition, reaction_energy)
    }

    /// the record is kept only once it is on disk
    fn write(&mut self, record: ReactionRecord) -> Result<usize, StoreError> {
        self.records.push(record);
        if let Err(err) = self.flush() {
            self.records.pop();
            return Err(err);
        }
        Ok(self.records.len() - 1)
    }

    fn update(&mut self, id: usize, record: ReactionRecord) -> Result<(), StoreError> {
        let previous = replace_record(&mut self.records, id, record)?;
        if let Err(err) = self.flush() {
            self.records[id] = previous;
            return Err(err);
        }
        Ok(())
    }

    fn records(&self) -> &[ReactionRecord] {
        &self.records
    }
}

#[derive(Debug, Clone)]
#[enum_dispatch(RecordStore)]
pub enum StoreBackend {
    InMemory(InMemoryStore),
    JsonFile(JsonFileStore),
}

pub enum StoreType {
    InMemory,
    JsonFile(PathBuf),
}

pub fn create_store(store_type: StoreType) -> Result<StoreBackend, StoreError> {
    Ok(match store_type {
        StoreType::InMemory => StoreBackend::InMemory(InMemoryStore::new()),
        StoreType::JsonFile(path) => StoreBackend::JsonFile(JsonFileStore::open(&path)?),
    })
}

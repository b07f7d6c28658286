//! Per-folder pipeline: reaction equation, structure matching, energies, record upsert.
//!
//! `Ingestor::ingest` is the one place where strict and permissive runs differ.
use crate::Ingest::config::IngestConfig;
use crate::Ingest::context::RunContext;
use crate::Ingest::diagnostics::{RunMode, Severity};
use crate::Ingest::errors::IngestError;
use crate::Ingest::folder::{Calculation, FolderInput, Publication, SurfaceInfo};
use crate::Ingest::record::ReactionRecord;
use crate::Ingest::store::{RecordStore, StoreBackend};
use crate::Reactions::energy::{EnergyAssembler, validate};
use crate::Reactions::errors::ReactionError;
use crate::Reactions::matcher::StructureMatcher;
use crate::Reactions::prefactors::resolve;
use crate::Reactions::reaction_spec::ReactionSpec;
use crate::Reactions::structure::{AtomicStructure, Side};
use log::{info, warn};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(usize),
    Updated(usize),
    AlreadyPresent(usize),
}

#[derive(Debug)]
pub enum FolderOutcome {
    Emitted {
        record: ReactionRecord,
        write: WriteOutcome,
    },
    EmittedWithWarnings {
        record: ReactionRecord,
        write: WriteOutcome,
        warnings: usize,
    },
    /// nothing to read, not an error
    Skipped { reason: String },
    /// dropped in a permissive run
    Fatal(IngestError),
}

impl FolderOutcome {
    pub fn record(&self) -> Option<&ReactionRecord> {
        match self {
            FolderOutcome::Emitted { record, .. }
            | FolderOutcome::EmittedWithWarnings { record, .. } => Some(record),
            _ => None,
        }
    }
}

pub struct Ingestor {
    pub ctx: RunContext,
    store: StoreBackend,
    /// parsed reaction folders, parsed once per run
    specs: HashMap<String, ReactionSpec>,
}

impl Ingestor {
    pub fn new(config: IngestConfig, store: StoreBackend) -> Self {
        Self {
            ctx: RunContext::new(config),
            store,
            specs: HashMap::new(),
        }
    }

    pub fn store(&self) -> &StoreBackend {
        &self.store
    }

    /// Announces the start of a publication / DFT scope and its energy corrections.
    pub fn begin_scope(&mut self, publication: &Publication, calculation: &Calculation) {
        info!(
            "Reading {} ({} / {})",
            publication.pub_id, calculation.dft_code, calculation.dft_functional
        );
        if !publication.energy_corrections.is_empty() {
            let listed: Vec<String> = publication
                .energy_corrections
                .iter()
                .map(|(species, correction)| format!("{}: {:+.3} eV", species, correction))
                .collect();
            info!("Applying energy corrections: {}", listed.join(", "));
        }
    }

    /// bulk structure of a material folder, kept for all its reactions
    pub fn register_bulk(&mut self, surface: &SurfaceInfo, bulk: &AtomicStructure) {
        if let Some(key) = surface.bulk_key() {
            self.ctx.species_ids.insert(&key, &bulk.unique_id);
        }
    }

    /// Parsed equation of a reaction folder. Every final folder starts from a cache
    /// pruned to this reaction, so ids of another folder (its transition states too) never leak.
    fn reaction_spec(&mut self, reaction_folder: &str) -> Result<ReactionSpec, ReactionError> {
        let spec = match self.specs.get(reaction_folder) {
            Some(spec) => spec.clone(),
            None => {
                let spec = ReactionSpec::parse(reaction_folder)?;
                self.specs.insert(reaction_folder.to_string(), spec.clone());
                spec
            }
        };
        self.ctx.species_ids.prune_for_reaction(&spec.entry_names());
        Ok(spec)
    }

    fn reference_slab(
        &mut self,
        spec: &ReactionSpec,
        input: &FolderInput,
    ) -> Result<AtomicStructure, ReactionError> {
        if let Some(empty) = &input.empty_slab {
            self.ctx.species_ids.insert("star", &empty.unique_id);
            return Ok(empty.clone());
        }
        if spec.has_placeholder() {
            return Err(ReactionError::mismatch(&input.path, "Empty slab needed for reaction!"));
        }
        // structures are non-empty here
        let first = input.structures[0].clone();
        self.ctx.diagnostics.warn(
            &input.path,
            format!(
                "No empty slab; using {} ({}) as the reference structure",
                first.filename,
                first.hill_formula()
            ),
        );
        Ok(first)
    }

    /// Reads one final folder. `Err` is a fatal condition of that folder.
    fn process(&mut self, input: &FolderInput) -> Result<FolderOutcome, IngestError> {
        self.ctx.stats.folders += 1;
        let path = input.path.as_str();
        if input.structures.is_empty() {
            let reason = "No structure files found in final folder".to_string();
            self.ctx.diagnostics.warn(path, reason.clone());
            self.ctx.stats.skipped += 1;
            return Ok(FolderOutcome::Skipped { reason });
        }
        let warnings_before = self.ctx.diagnostics.count(Severity::Warning);

        let spec = self
            .reaction_spec(&input.reaction_folder)
            .map_err(|e| match e {
                ReactionError::ParseError { message, .. } => ReactionError::parse(path, message),
                other => other,
            })?;
        let empty = self.reference_slab(&spec, input)?;

        let table = StructureMatcher::new(&spec, path).match_structures(
            &input.structures,
            &empty,
            &input.gas,
        )?;
        for warning in &table.warnings {
            self.ctx.diagnostics.warn(path, warning.clone());
        }

        let coefficients = resolve(&spec, &table, path)?;
        let corrections = &input.publication.energy_corrections;
        let energies = EnergyAssembler::new(&spec, &table, corrections, path).assemble(&coefficients)?;
        for warning in validate(&energies, self.ctx.config.energy_limit, path)? {
            self.ctx.diagnostics.warn(path, warning);
        }

        self.ctx.species_ids.extend(&table.structure_ids(&spec));
        let record = ReactionRecord {
            chemical_composition: empty.hill_formula(),
            surface_composition: input.surface.metal.clone(),
            facet: input.surface.facet.clone(),
            sites: spec.sites.clone(),
            reactants: spec.coefficient_map(Side::Reactants),
            products: spec.coefficient_map(Side::Products),
            reaction_energy: energies.reaction_energy,
            activation_energy: energies.activation_energy,
            dft_code: input.calculation.dft_code.clone(),
            dft_functional: input.calculation.dft_functional.clone(),
            pub_id: input.publication.pub_id.clone(),
            doi: input.publication.doi.clone(),
            year: input.publication.year,
            structure_ids: self.ctx.species_ids.snapshot(),
            energy_corrections: corrections.clone(),
            username: self.ctx.config.userhandle.clone(),
        };
        if self.ctx.config.verbose {
            info!(
                "{}: {}  dE = {:.3} eV",
                path,
                record.equation(),
                record.reaction_energy
            );
        }

        let write = self.write(&record, path)?;
        let warnings = self.ctx.diagnostics.count(Severity::Warning) - warnings_before;
        Ok(if warnings == 0 {
            FolderOutcome::Emitted { record, write }
        } else {
            FolderOutcome::EmittedWithWarnings {
                record,
                write,
                warnings,
            }
        })
    }

    /// check, then write or (with `update`) overwrite
    fn write(&mut self, record: &ReactionRecord, folder: &str) -> Result<WriteOutcome, IngestError> {
        let store_err = |source| IngestError::Store {
            folder: folder.to_string(),
            source,
        };
        match self
            .store
            .check(&record.chemical_composition, record.reaction_energy)
        {
            None => {
                let id = self.store.write(record.clone()).map_err(store_err)?;
                self.ctx.stats.written += 1;
                Ok(WriteOutcome::Written(id))
            }
            Some(id) if self.ctx.config.update => {
                self.store.update(id, record.clone()).map_err(store_err)?;
                self.ctx.stats.updated += 1;
                Ok(WriteOutcome::Updated(id))
            }
            Some(id) => {
                info!("{} already in the record store (id {})", record.equation(), id);
                self.ctx.stats.already_present += 1;
                Ok(WriteOutcome::AlreadyPresent(id))
            }
        }
    }

    /// Reads one final folder and applies the run policy to fatal conditions:
    /// strict runs dump the diagnostics and return the error, permissive runs log it,
    /// drop the folder and go on.
    pub fn ingest(&mut self, input: &FolderInput) -> Result<FolderOutcome, IngestError> {
        match self.process(input) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let folder = err.folder().unwrap_or(&input.path).to_string();
                self.ctx.diagnostics.error(&folder, err.to_string());
                match self.ctx.mode() {
                    RunMode::Strict => {
                        self.ctx.diagnostics.dump();
                        Err(err)
                    }
                    RunMode::Permissive => {
                        self.ctx.stats.dropped += 1;
                        Ok(FolderOutcome::Fatal(err))
                    }
                }
            }
        }
    }

    /// reads the folders in order; stops at the first fatal folder of a strict run
    pub fn ingest_all<'a>(
        &mut self,
        inputs: impl IntoIterator<Item = &'a FolderInput>,
    ) -> Result<Vec<FolderOutcome>, IngestError> {
        inputs.into_iter().map(|input| self.ingest(input)).collect()
    }

    /// summary tables and, in permissive runs, the full diagnostics dump
    pub fn finish(&self) {
        if self.ctx.mode() == RunMode::Permissive {
            self.ctx.diagnostics.dump();
        }
        self.ctx.summary_table().printstd();
        if !self.ctx.diagnostics.is_empty() {
            self.ctx.diagnostics.table().printstd();
        }
        let errors = self.ctx.diagnostics.count(Severity::Error);
        if errors > 0 {
            warn!("{} folder(s) dropped because of errors", errors);
        }
    }
}

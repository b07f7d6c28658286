//! Assignment of the structures of one final folder to the entries of a parsed reaction.
//!
//! Gas entries are seeded from the gas-phase references, the empty-slab placeholder from
//! the empty slab. Every other structure is reduced to its adsorbate atoms (structure minus
//! the empty slab, replicated by the supercell factor) and bound greedily: entries are
//! tried in order, each with multiplicities 1..=4, and the first fit wins.
//! Files whose name contains `TS` are transition states (`TS` + `empty`: their reference).
use crate::Reactions::errors::ReactionError;
use crate::Reactions::formula::{clear_state, hill_formula, scale_numbers, subtract_numbers};
use crate::Reactions::reaction_spec::ReactionSpec;
use crate::Reactions::structure::{AtomicStructure, GasReferences, Side, SidePair, State};
use log::debug;
use std::collections::BTreeMap;

/// largest adsorbate multiplicity tried when matching
pub const MAX_N_ADS: usize = 4;

/// content of one reaction entry
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Unfilled,
    Bound(AtomicStructure),
    /// the shared empty slab standing in for a bare `star` entry
    EmptySlab,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotBinding {
    pub slot: Slot,
    /// number of adsorbate units found in the bound structure
    pub n_ads: usize,
    /// repeat units of the bound structure relative to the empty slab
    pub supercell_factor: usize,
}

impl SlotBinding {
    fn new(slot: Slot) -> Self {
        Self {
            slot,
            n_ads: 1,
            supercell_factor: 1,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.slot != Slot::Unfilled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    TransitionState,
    TransitionStateReference,
    AdsorbateSlab,
    Rejected,
}

/// what the matcher made of one input structure
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub structure: AtomicStructure,
    pub adsorbate_atomic_numbers: Vec<u8>,
    pub supercell_factor: usize,
    pub role: Role,
}

/// Result of matching one final folder. Built fresh per folder.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSlotTable {
    pub slots: SidePair<Vec<SlotBinding>>,
    pub empty: AtomicStructure,
    pub transition_state: Option<AtomicStructure>,
    pub ts_reference: Option<AtomicStructure>,
    pub candidates: Vec<MatchCandidate>,
    /// non-fatal findings, in the order they occurred
    pub warnings: Vec<String>,
}

impl StructureSlotTable {
    pub fn binding(&self, side: Side, index: usize) -> &SlotBinding {
        &self.slots.get(side)[index]
    }

    /// structure standing behind an entry; `None` while the slot is unfilled
    pub fn structure(&self, side: Side, index: usize) -> Option<&AtomicStructure> {
        match &self.slots.get(side)[index].slot {
            Slot::Bound(structure) => Some(structure),
            Slot::EmptySlab => Some(&self.empty),
            Slot::Unfilled => None,
        }
    }

    pub fn n_ads(&self) -> SidePair<Vec<usize>> {
        self.slots
            .map(|_, slots| slots.iter().map(|b| b.n_ads).collect())
    }

    pub fn supercell_factors(&self) -> SidePair<Vec<usize>> {
        self.slots
            .map(|_, slots| slots.iter().map(|b| b.supercell_factor).collect())
    }

    pub fn is_complete(&self) -> bool {
        Side::BOTH
            .iter()
            .all(|&side| self.slots.get(side).iter().all(SlotBinding::is_filled))
    }

    /// entry name -> structure id for everything that entered the reaction,
    /// including `TSstar` and `TSemptystar`
    pub fn structure_ids(&self, spec: &ReactionSpec) -> BTreeMap<String, String> {
        let mut ids = BTreeMap::new();
        for side in Side::BOTH {
            for i in 0..self.slots.get(side).len() {
                if let Some(structure) = self.structure(side, i) {
                    ids.insert(
                        spec.entry_name(side, i).to_string(),
                        structure.unique_id.clone(),
                    );
                }
            }
        }
        if let Some(ts) = &self.transition_state {
            ids.insert("TSstar".to_string(), ts.unique_id.clone());
        }
        if let Some(ts_ref) = &self.ts_reference {
            ids.insert("TSemptystar".to_string(), ts_ref.unique_id.clone());
        }
        ids
    }
}

fn supercell_factor(n_atoms: usize, n_empty: usize) -> usize {
    if n_empty > 0 && n_atoms > 2 * n_empty {
        n_atoms / n_empty
    } else {
        1
    }
}

pub struct StructureMatcher<'a> {
    spec: &'a ReactionSpec,
    folder: &'a str,
}

impl<'a> StructureMatcher<'a> {
    pub fn new(spec: &'a ReactionSpec, folder: &'a str) -> Self {
        Self { spec, folder }
    }

    fn seed(&self, gas: &GasReferences) -> SidePair<Vec<SlotBinding>> {
        let spec = self.spec;
        spec.entries.map(|side, entries| {
            (0..entries.len())
                .map(|i| {
                    if spec.is_placeholder(side, i) {
                        return SlotBinding::new(Slot::EmptySlab);
                    }
                    if spec.states.get(side)[i] == State::Gas {
                        if let Some(reference) = gas.find(&spec.species_numbers.get(side)[i]) {
                            return SlotBinding::new(Slot::Bound(reference.clone()));
                        }
                    }
                    SlotBinding::new(Slot::Unfilled)
                })
                .collect()
        })
    }

    /// unfilled adsorbate entries in spec order, reactants first
    fn open_adsorbate_slots(&self, slots: &SidePair<Vec<SlotBinding>>) -> Vec<(Side, usize)> {
        Side::BOTH
            .iter()
            .flat_map(|&side| (0..slots.get(side).len()).map(move |i| (side, i)))
            .filter(|&(side, i)| {
                self.spec.states.get(side)[i] == State::Star
                    && !self.spec.is_placeholder(side, i)
                    && !slots.get(side)[i].is_filled()
            })
            .collect()
    }

    /// first open slot the adsorbate fits, then the lowest multiplicity for it
    fn find_slot(&self, slots: &SidePair<Vec<SlotBinding>>, adsorbate: &[u8]) -> Option<(Side, usize, usize)> {
        for (side, i) in self.open_adsorbate_slots(slots) {
            let numbers = &self.spec.species_numbers.get(side)[i];
            for n_ads in 1..=MAX_N_ADS {
                if scale_numbers(numbers, n_ads) == adsorbate {
                    return Some((side, i, n_ads));
                }
            }
        }
        None
    }

    /// the file is named after an adsorbate entry but holds a different composition
    fn misnamed(&self, stem: &str, adsorbate: &[u8]) -> Option<String> {
        for side in Side::BOTH {
            for i in 0..self.spec.len(side) {
                if self.spec.states.get(side)[i] != State::Star || self.spec.is_placeholder(side, i) {
                    continue;
                }
                let species = self.spec.species_name(side, i);
                if stem != species && clear_state(stem) != species {
                    continue;
                }
                let numbers = &self.spec.species_numbers.get(side)[i];
                let fits = (1..=MAX_N_ADS).any(|n| scale_numbers(numbers, n) == adsorbate);
                if !fits {
                    return Some(species.to_string());
                }
            }
        }
        None
    }

    pub fn match_structures(
        &self,
        structures: &[AtomicStructure],
        empty: &AtomicStructure,
        gas: &GasReferences,
    ) -> Result<StructureSlotTable, ReactionError> {
        let mut table = StructureSlotTable {
            slots: self.seed(gas),
            empty: empty.clone(),
            transition_state: None,
            ts_reference: None,
            candidates: Vec::new(),
            warnings: Vec::new(),
        };
        let empty_numbers = empty.sorted_numbers();

        for structure in structures {
            // the empty slab itself usually lives in the folder too
            if structure == empty {
                continue;
            }
            let mut candidate = MatchCandidate {
                structure: structure.clone(),
                adsorbate_atomic_numbers: Vec::new(),
                supercell_factor: 1,
                role: Role::Rejected,
            };

            if structure.len() <= empty.len() && structure.is_molecular() && empty.has_heavy_atoms()
            {
                table.warnings.push(format!(
                    "Only molecular species for structure {}; molecular species found among slab files",
                    structure.filename
                ));
                table.candidates.push(candidate);
                continue;
            }

            let factor = supercell_factor(structure.len(), empty.len());
            candidate.supercell_factor = factor;
            let subtraction = subtract_numbers(
                &structure.sorted_numbers(),
                &scale_numbers(&empty_numbers, factor),
            );
            if !subtraction.is_feasible() && !subtraction.remainder.is_empty() {
                table.warnings.push(format!(
                    "Structure {} ({}) does not contain the empty slab {}, skipping",
                    structure.filename,
                    structure.hill_formula(),
                    empty.hill_formula()
                ));
                table.candidates.push(candidate);
                continue;
            }
            let adsorbate = if subtraction.is_feasible() {
                subtraction.remainder
            } else {
                Vec::new()
            };
            candidate.adsorbate_atomic_numbers = adsorbate.clone();

            let stem = structure.stem();
            if stem.contains("TS") {
                let (target, role, what) = if stem.contains("empty") {
                    (
                        &mut table.ts_reference,
                        Role::TransitionStateReference,
                        "transition-state reference",
                    )
                } else {
                    (&mut table.transition_state, Role::TransitionState, "transition state")
                };
                if let Some(previous) = target.as_ref() {
                    return Err(ReactionError::mismatch(
                        self.folder,
                        format!(
                            "more than one {} structure: {} and {}",
                            what, previous.filename, structure.filename
                        ),
                    ));
                }
                *target = Some(structure.clone());
                candidate.role = role;
                table.candidates.push(candidate);
                continue;
            }

            if let Some((side, i, n_ads)) = self.find_slot(&table.slots, &adsorbate) {
                debug!(
                    "{} -> {} ({} side, n_ads = {}, supercell = {})",
                    structure.filename,
                    self.spec.entry_name(side, i),
                    side.as_str(),
                    n_ads,
                    factor
                );
                table.slots.get_mut(side)[i] = SlotBinding {
                    slot: Slot::Bound(structure.clone()),
                    n_ads,
                    supercell_factor: factor,
                };
                candidate.role = Role::AdsorbateSlab;
                table.candidates.push(candidate);
                continue;
            }

            if adsorbate.is_empty() {
                table.warnings.push(format!(
                    "No adsorbate found in {} after removing the empty slab, skipping",
                    structure.filename
                ));
            } else if let Some(species) = self.misnamed(stem, &adsorbate) {
                return Err(ReactionError::mismatch(
                    self.folder,
                    format!(
                        "Name of file does not match chemical formula: {} holds adsorbate {} but is named after {}",
                        structure.filename,
                        hill_formula(&adsorbate),
                        species
                    ),
                ));
            } else {
                table.warnings.push(format!(
                    "Structure {} with adsorbate {} does not fit any species of {}, skipping",
                    structure.filename,
                    hill_formula(&adsorbate),
                    self.spec
                ));
            }
            table.candidates.push(candidate);
        }

        self.check_complete(&table, gas)?;
        Ok(table)
    }

    fn check_complete(&self, table: &StructureSlotTable, gas: &GasReferences) -> Result<(), ReactionError> {
        let mut missing_gas = Vec::new();
        let mut missing_ads = Vec::new();
        for side in Side::BOTH {
            for (i, binding) in table.slots.get(side).iter().enumerate() {
                if binding.is_filled() {
                    continue;
                }
                let entry = self.spec.entry_name(side, i).to_string();
                match self.spec.states.get(side)[i] {
                    State::Gas => missing_gas.push(entry),
                    State::Star => missing_ads.push(entry),
                }
            }
        }
        if !missing_ads.is_empty() {
            return Err(ReactionError::mismatch(
                self.folder,
                format!(
                    "Adsorbate structure(s) {} not found among the slab files of reaction {}",
                    missing_ads.join(", "),
                    self.spec.folder_name
                ),
            ));
        }
        if !missing_gas.is_empty() {
            return Err(ReactionError::mismatch(
                self.folder,
                format!(
                    "Gas-phase reference(s) {} missing; add the molecules to the gas folder '{}'",
                    missing_gas.join(", "),
                    gas.folder
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PT: u8 = 78;

    fn slab(extra: &[u8]) -> Vec<u8> {
        let mut numbers = vec![PT; 4];
        numbers.extend_from_slice(extra);
        numbers
    }

    fn empty() -> AtomicStructure {
        AtomicStructure::new("empty_slab.traj", slab(&[]), -100.0).with_id("id-empty")
    }

    fn gas() -> GasReferences {
        GasReferences::new(
            "gas",
            vec![
                AtomicStructure::new("CO.traj", vec![6, 8], -14.8).with_id("id-co"),
                AtomicStructure::new("H2.traj", vec![1, 1], -6.7).with_id("id-h2"),
            ],
        )
    }

    #[test]
    fn test_adsorption_binds_slots() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        let structures = vec![
            empty(),
            AtomicStructure::new("COstar.traj", slab(&[6, 8]), -115.5).with_id("id-costar"),
        ];
        let table = StructureMatcher::new(&spec, "run/CO")
            .match_structures(&structures, &empty(), &gas())
            .unwrap();
        assert!(table.is_complete());
        assert_eq!(table.slots.reactants[1].slot, Slot::EmptySlab);
        assert_eq!(
            table.structure(Side::Products, 0).map(|s| s.unique_id.as_str()),
            Some("id-costar")
        );
        let ids = table.structure_ids(&spec);
        assert_eq!(ids.get("COgas").map(String::as_str), Some("id-co"));
        assert_eq!(ids.get("star").map(String::as_str), Some("id-empty"));
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn test_multiplicity_and_supercell_detection() {
        let spec = ReactionSpec::parse("H2gas+star_Hstar").unwrap();
        // doubled slab carrying two H atoms
        let mut numbers = vec![PT; 8];
        numbers.extend_from_slice(&[1, 1]);
        let structures = vec![AtomicStructure::new("H.traj", numbers, -210.0)];
        let table = StructureMatcher::new(&spec, "run/H")
            .match_structures(&structures, &empty(), &gas())
            .unwrap();
        let binding = table.binding(Side::Products, 0);
        assert_eq!(binding.n_ads, 2);
        assert_eq!(binding.supercell_factor, 2);
        assert_eq!(table.candidates[0].adsorbate_atomic_numbers, vec![1, 1]);
    }

    #[test]
    fn test_transition_states_by_filename() {
        let spec = ReactionSpec::parse("COstar_Cstar_Ostar").unwrap();
        let structures = vec![
            AtomicStructure::new("COstar.traj", slab(&[6, 8]), -115.0),
            AtomicStructure::new("Cstar.traj", slab(&[6]), -106.0),
            AtomicStructure::new("Ostar.traj", slab(&[8]), -105.0),
            AtomicStructure::new("TS.traj", slab(&[6, 8]), -113.0),
            AtomicStructure::new("TSempty.traj", slab(&[]), -100.1),
        ];
        let table = StructureMatcher::new(&spec, "run/CO")
            .match_structures(&structures, &empty(), &gas())
            .unwrap();
        assert_eq!(table.transition_state.as_ref().map(|s| s.stem()), Some("TS"));
        assert_eq!(table.ts_reference.as_ref().map(|s| s.stem()), Some("TSempty"));
        let roles: Vec<Role> = table.candidates.iter().map(|c| c.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::AdsorbateSlab,
                Role::AdsorbateSlab,
                Role::AdsorbateSlab,
                Role::TransitionState,
                Role::TransitionStateReference
            ]
        );
    }

    #[test]
    fn test_duplicate_transition_state_is_fatal() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        let structures = vec![
            AtomicStructure::new("COstar.traj", slab(&[6, 8]), -115.0),
            AtomicStructure::new("TS1.traj", slab(&[6, 8]), -113.0),
            AtomicStructure::new("TS2.traj", slab(&[6, 8]), -113.2),
        ];
        let err = StructureMatcher::new(&spec, "run/CO")
            .match_structures(&structures, &empty(), &gas())
            .unwrap_err();
        assert!(matches!(err, ReactionError::MatchInconsistency { .. }));
    }

    #[test]
    fn test_molecules_and_bare_slabs_are_skipped_with_warnings() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        let structures = vec![
            AtomicStructure::new("water.traj", vec![8, 1, 1], -14.2),
            AtomicStructure::new("clean.traj", slab(&[]), -100.05),
            AtomicStructure::new("COstar.traj", slab(&[6, 8]), -115.0),
        ];
        let table = StructureMatcher::new(&spec, "run/CO")
            .match_structures(&structures, &empty(), &gas())
            .unwrap();
        assert_eq!(table.warnings.len(), 2);
        assert!(table.warnings[0].contains("molecular"));
        assert!(table.warnings[1].contains("No adsorbate"));
        assert_eq!(table.candidates[0].role, Role::Rejected);
    }

    #[test]
    fn test_missing_gas_reference_points_at_gas_folder() {
        let spec = ReactionSpec::parse("O2gas+2star_2Ostar").unwrap();
        let structures = vec![AtomicStructure::new("Ostar.traj", slab(&[8]), -105.0)];
        let err = StructureMatcher::new(&spec, "run/O2")
            .match_structures(&structures, &empty(), &gas())
            .unwrap_err();
        assert_eq!(err.folder(), "run/O2");
        let message = err.to_string();
        assert!(message.contains("O2gas"));
        assert!(message.contains("'gas'"));
    }

    #[test]
    fn test_misnamed_file_is_fatal() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        let structures = vec![AtomicStructure::new("COstar.traj", slab(&[6, 8, 8]), -120.0)];
        let err = StructureMatcher::new(&spec, "run/CO")
            .match_structures(&structures, &empty(), &gas())
            .unwrap_err();
        assert!(err.to_string().contains("does not match chemical formula"));
    }

    #[test]
    fn test_first_entry_wins_before_higher_multiplicity() {
        let spec = ReactionSpec::parse("O2gas+2star_Ostar+O2star").unwrap();
        let gas = GasReferences::new("gas", vec![AtomicStructure::new("O2.traj", vec![8, 8], -9.9)]);
        let o2_slab = || AtomicStructure::new("slab.traj", slab(&[8, 8]), -110.0);

        // Ostar with two O atoms comes before O2star with one molecule
        let err = StructureMatcher::new(&spec, "run/O2")
            .match_structures(&[o2_slab()], &empty(), &gas)
            .unwrap_err();
        assert!(err.to_string().contains("structure(s) O2star not found"));

        let mut second = o2_slab();
        second.filename = "slab2.traj".to_string();
        let table = StructureMatcher::new(&spec, "run/O2")
            .match_structures(&[o2_slab(), second], &empty(), &gas)
            .unwrap();
        assert_eq!(table.binding(Side::Products, 0).n_ads, 2);
        assert_eq!(
            table.structure(Side::Products, 0).map(|s| s.filename.as_str()),
            Some("slab.traj")
        );
        assert_eq!(table.binding(Side::Products, 1).n_ads, 1);
        assert_eq!(
            table.structure(Side::Products, 1).map(|s| s.filename.as_str()),
            Some("slab2.traj")
        );
    }

    #[test]
    fn test_structure_without_the_slab_atoms_is_skipped() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        // Pd surface instead of the Pt one
        let foreign = AtomicStructure::new("other.traj", vec![46, 46, 46, 46, 6, 8], -90.0);
        let structures = vec![
            foreign,
            AtomicStructure::new("COstar.traj", slab(&[6, 8]), -115.0),
        ];
        let table = StructureMatcher::new(&spec, "run/CO")
            .match_structures(&structures, &empty(), &gas())
            .unwrap();
        assert_eq!(table.warnings.len(), 1);
        assert!(table.warnings[0].contains("does not contain the empty slab"));
        assert_eq!(table.candidates[0].role, Role::Rejected);
        assert!(table.candidates[0].adsorbate_atomic_numbers.is_empty());
        assert!(table.is_complete());
    }

    #[test]
    fn test_partial_slab_counts_as_bare() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        // three of the four Pt atoms: nothing is left after the subtraction
        let structures = vec![
            AtomicStructure::new("defect.traj", vec![PT; 3], -75.0),
            AtomicStructure::new("COstar.traj", slab(&[6, 8]), -115.0),
        ];
        let table = StructureMatcher::new(&spec, "run/CO")
            .match_structures(&structures, &empty(), &gas())
            .unwrap();
        assert_eq!(table.warnings.len(), 1);
        assert!(table.warnings[0].contains("No adsorbate"));
        assert_eq!(table.candidates[0].role, Role::Rejected);
        assert_eq!(table.binding(Side::Products, 0).n_ads, 1);
    }
}

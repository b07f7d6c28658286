//! Reaction and activation energies of one final folder.
//!
//! ```text
//! ΔE = Σ_products c_i (E_i + corr_i) - Σ_reactants c_i (E_i + corr_i)
//! Ea = (E_TS - E_TSempty) - Σ_reactants t_i (E_i + corr_i - [star] E_empty)   TS and TS reference
//! Ea = E_TS - Σ_reactants t_i (E_i + corr_i)                                  TS only
//! ```
//! `c_i` are the final coefficients, `t_i` the transition-state prefactors of the reaction.
use crate::Reactions::errors::ReactionError;
use crate::Reactions::formula::clear_state;
use crate::Reactions::matcher::StructureSlotTable;
use crate::Reactions::reaction_spec::ReactionSpec;
use crate::Reactions::structure::{AtomicStructure, Side, SidePair, State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionEnergies {
    pub reaction_energy: f64,
    /// `None` without a transition state
    pub activation_energy: Option<f64>,
}

pub struct EnergyAssembler<'a> {
    spec: &'a ReactionSpec,
    table: &'a StructureSlotTable,
    corrections: &'a BTreeMap<String, f64>,
    folder: &'a str,
}

impl<'a> EnergyAssembler<'a> {
    pub fn new(
        spec: &'a ReactionSpec,
        table: &'a StructureSlotTable,
        corrections: &'a BTreeMap<String, f64>,
        folder: &'a str,
    ) -> Self {
        Self {
            spec,
            table,
            corrections,
            folder,
        }
    }

    /// correction of an entry: "COstar" first, then "CO"
    pub fn correction(&self, side: Side, index: usize) -> f64 {
        let entry = self.spec.entry_name(side, index);
        self.corrections
            .get(entry)
            .or_else(|| self.corrections.get(clear_state(entry)))
            .copied()
            .unwrap_or(0.0)
    }

    fn potential_energy(&self, structure: &AtomicStructure) -> Result<f64, ReactionError> {
        match structure.potential_energy {
            Some(energy) if energy.is_finite() => Ok(energy),
            Some(energy) => Err(ReactionError::computation(
                self.folder,
                format!("potential energy of {} is {}", structure.filename, energy),
            )),
            None => Err(ReactionError::computation(
                self.folder,
                format!("no potential energy stored in {}", structure.filename),
            )),
        }
    }

    /// corrected energy of one entry
    fn entry_energy(&self, side: Side, index: usize) -> Result<f64, ReactionError> {
        let structure = self.table.structure(side, index).ok_or_else(|| {
            ReactionError::computation(
                self.folder,
                format!("no structure for {}", self.spec.entry_name(side, index)),
            )
        })?;
        Ok(self.potential_energy(structure)? + self.correction(side, index))
    }

    fn check_shape(&self, name: &str, coefficients: &SidePair<Vec<f64>>) -> Result<(), ReactionError> {
        for side in Side::BOTH {
            let n = self.spec.len(side);
            if coefficients.get(side).len() != n || self.table.slots.get(side).len() != n {
                return Err(ReactionError::computation(
                    self.folder,
                    format!(
                        "{} of the {} side have {} values for {} entries",
                        name,
                        side.as_str(),
                        coefficients.get(side).len(),
                        n
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn reaction_energy(&self, coefficients: &SidePair<Vec<f64>>) -> Result<f64, ReactionError> {
        self.check_shape("final prefactors", coefficients)?;
        let mut energy = 0.0;
        for (side, sign) in [(Side::Reactants, -1.0), (Side::Products, 1.0)] {
            for (i, c) in coefficients.get(side).iter().enumerate() {
                energy += sign * c * self.entry_energy(side, i)?;
            }
        }
        Ok(energy)
    }

    pub fn activation_energy(&self) -> Result<Option<f64>, ReactionError> {
        let Some(ts) = &self.table.transition_state else {
            return Ok(None);
        };
        self.check_shape("transition-state prefactors", &self.spec.ts_prefactors)?;
        let e_ts = self.potential_energy(ts)?;
        let t = &self.spec.ts_prefactors.reactants;
        let energy = match &self.table.ts_reference {
            Some(ts_ref) => {
                let e_empty = self.potential_energy(&self.table.empty)?;
                let mut basin = 0.0;
                for (i, t_i) in t.iter().enumerate() {
                    if self.spec.is_placeholder(Side::Reactants, i) {
                        continue;
                    }
                    let mut e = self.entry_energy(Side::Reactants, i)?;
                    if self.spec.states.reactants[i] == State::Star {
                        e -= e_empty;
                    }
                    basin += t_i * e;
                }
                e_ts - self.potential_energy(ts_ref)? - basin
            }
            None => {
                let mut basin = 0.0;
                for (i, t_i) in t.iter().enumerate() {
                    basin += t_i * self.entry_energy(Side::Reactants, i)?;
                }
                e_ts - basin
            }
        };
        Ok(Some(energy))
    }

    pub fn assemble(&self, coefficients: &SidePair<Vec<f64>>) -> Result<ReactionEnergies, ReactionError> {
        let energies = ReactionEnergies {
            reaction_energy: self.reaction_energy(coefficients)?,
            activation_energy: self.activation_energy()?,
        };
        let finite = energies.reaction_energy.is_finite()
            && energies.activation_energy.is_none_or(f64::is_finite);
        if !finite {
            return Err(ReactionError::computation(
                self.folder,
                format!("non-finite energies {:?}", energies),
            ));
        }
        Ok(energies)
    }
}

/// Checks the energies against the open interval (-limit, limit) for ΔE and `< limit`
/// for Ea. Returns the warnings of an accepted result.
pub fn validate(
    energies: &ReactionEnergies,
    limit: f64,
    folder: &str,
) -> Result<Vec<String>, ReactionError> {
    let de = energies.reaction_energy;
    if !(de > -limit && de < limit) {
        return Err(ReactionError::bounds(
            folder,
            format!(
                "reaction energy {:.3} eV outside the limits (-{}, {}) eV; check the structures or raise the energy limit",
                de, limit, limit
            ),
        ));
    }
    let mut warnings = Vec::new();
    if let Some(ea) = energies.activation_energy {
        if !(ea < limit) {
            return Err(ReactionError::bounds(
                folder,
                format!(
                    "activation energy {:.3} eV above the limit of {} eV",
                    ea, limit
                ),
            ));
        }
        if ea < de {
            warnings.push(format!(
                "Activation energy {:.3} eV is smaller than the reaction energy {:.3} eV",
                ea, de
            ));
        }
    }
    Ok(warnings)
}

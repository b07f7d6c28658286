use crate::Reactions::errors::ReactionError;
use crate::Reactions::matcher::StructureSlotTable;
use crate::Reactions::reaction_spec::ReactionSpec;
use crate::Reactions::structure::{Side, SidePair, State};

/// Final stoichiometric coefficients of one final folder.
///
/// The literal prefactors of the folder name are multiplied by scales discovered while
/// matching:
/// * an adsorbate slab holding `n_ads > 1` adsorbate units sets the scale of every gas entry
///   (both sides) to `n_ads`; when several slabs do so the last one in entry order wins
/// * a slab holding `supercell_factor > 1` repeat units of the empty slab multiplies the
///   scale of every empty-slab entry by that factor
///
/// The reported coefficients of the reaction record stay the literal ones.
pub fn resolve(
    spec: &ReactionSpec,
    table: &StructureSlotTable,
    folder: &str,
) -> Result<SidePair<Vec<f64>>, ReactionError> {
    let n_ads = table.n_ads();
    let supercell = table.supercell_factors();
    for side in Side::BOTH {
        let expected = spec.len(side);
        let found = [
            spec.prefactors.get(side).len(),
            spec.states.get(side).len(),
            n_ads.get(side).len(),
            supercell.get(side).len(),
        ];
        if found.iter().any(|&len| len != expected) {
            return Err(ReactionError::computation(
                folder,
                format!(
                    "prefactor shapes differ on the {} side: {} entries, found {:?}",
                    side.as_str(),
                    expected,
                    found
                ),
            ));
        }
    }

    let mut scale: SidePair<Vec<f64>> = spec.prefactors.map(|_, p| vec![1.0; p.len()]);
    for side in Side::BOTH {
        for i in 0..spec.len(side) {
            let n = n_ads.get(side)[i];
            if n > 1 {
                for gas_side in Side::BOTH {
                    for (j, state) in spec.states.get(gas_side).iter().enumerate() {
                        if *state == State::Gas {
                            scale.get_mut(gas_side)[j] = n as f64;
                        }
                    }
                }
            }
            let factor = supercell.get(side)[i];
            if factor > 1 {
                for slab_side in Side::BOTH {
                    for j in 0..spec.len(slab_side) {
                        if spec.is_placeholder(slab_side, j) {
                            scale.get_mut(slab_side)[j] *= factor as f64;
                        }
                    }
                }
            }
        }
    }

    Ok(spec.prefactors.map(|side, literal| {
        literal
            .iter()
            .zip(scale.get(side))
            .map(|(p, s)| p * s)
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reactions::matcher::StructureMatcher;
    use crate::Reactions::structure::{AtomicStructure, GasReferences};

    fn slab(n_pt: usize, extra: &[u8]) -> Vec<u8> {
        let mut numbers = vec![78; n_pt];
        numbers.extend_from_slice(extra);
        numbers
    }

    #[test]
    fn test_unit_scales_keep_literal_prefactors() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        let empty = AtomicStructure::new("empty.traj", slab(4, &[]), -100.0);
        let gas = GasReferences::new("gas", vec![AtomicStructure::new("CO", vec![6, 8], -14.8)]);
        let structures = vec![AtomicStructure::new("COstar.traj", slab(4, &[6, 8]), -115.5)];
        let table = StructureMatcher::new(&spec, "f")
            .match_structures(&structures, &empty, &gas)
            .unwrap();
        let resolved = resolve(&spec, &table, "f").unwrap();
        assert_eq!(resolved, spec.prefactors);
    }

    #[test]
    fn test_n_ads_scales_every_gas_entry() {
        let spec = ReactionSpec::parse("0.5H2gas+star_Hstar").unwrap();
        let empty = AtomicStructure::new("empty.traj", slab(4, &[]), -100.0);
        let gas = GasReferences::new("gas", vec![AtomicStructure::new("H2", vec![1, 1], -6.7)]);
        let structures = vec![AtomicStructure::new("Hstar.traj", slab(4, &[1, 1]), -107.0)];
        let table = StructureMatcher::new(&spec, "f")
            .match_structures(&structures, &empty, &gas)
            .unwrap();
        let resolved = resolve(&spec, &table, "f").unwrap();
        assert_eq!(resolved.reactants, vec![1.0, 1.0]);
        assert_eq!(resolved.products, vec![1.0]);
    }

    #[test]
    fn test_supercell_multiplies_slab_entries() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        let empty = AtomicStructure::new("empty.traj", slab(4, &[]), -100.0);
        let gas = GasReferences::new("gas", vec![AtomicStructure::new("CO", vec![6, 8], -14.8)]);
        let structures = vec![AtomicStructure::new("COstar.traj", slab(8, &[6, 8]), -215.5)];
        let table = StructureMatcher::new(&spec, "f")
            .match_structures(&structures, &empty, &gas)
            .unwrap();
        let resolved = resolve(&spec, &table, "f").unwrap();
        assert_eq!(resolved.reactants, vec![1.0, 2.0]);
        assert_eq!(resolved.products, vec![1.0]);
    }

    #[test]
    fn test_shape_mismatch_is_a_computation_error() {
        let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
        let empty = AtomicStructure::new("empty.traj", slab(4, &[]), -100.0);
        let gas = GasReferences::new("gas", vec![AtomicStructure::new("CO", vec![6, 8], -14.8)]);
        let structures = vec![AtomicStructure::new("COstar.traj", slab(4, &[6, 8]), -115.5)];
        let mut table = StructureMatcher::new(&spec, "f")
            .match_structures(&structures, &empty, &gas)
            .unwrap();
        table.slots.products.clear();
        let err = resolve(&spec, &table, "f").unwrap_err();
        assert!(matches!(err, ReactionError::EnergyComputationError { .. }));
    }
}

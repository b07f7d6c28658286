/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Reactions::energy::{EnergyAssembler, ReactionEnergies, validate};
    use crate::Reactions::errors::ReactionError;
    use crate::Reactions::matcher::{StructureMatcher, StructureSlotTable};
    use crate::Reactions::prefactors::resolve;
    use crate::Reactions::reaction_spec::ReactionSpec;
    use crate::Reactions::structure::{AtomicStructure, GasReferences, Side};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    const PT: u8 = 78;

    fn slab(n_pt: usize, adsorbate: &[u8]) -> Vec<u8> {
        let mut numbers = vec![PT; n_pt];
        numbers.extend_from_slice(adsorbate);
        numbers
    }

    fn empty_slab() -> AtomicStructure {
        AtomicStructure::new("empty_slab.traj", slab(4, &[]), -100.0).with_id("empty")
    }

    fn gas_references() -> GasReferences {
        GasReferences::new(
            "Pub/VASP/PBE/gas",
            vec![
                AtomicStructure::new("CO2gas.traj", vec![6, 8, 8], -20.0).with_id("co2"),
                AtomicStructure::new("COgas.traj", vec![6, 8], -14.8).with_id("co"),
                AtomicStructure::new("H2gas.traj", vec![1, 1], -6.7).with_id("h2"),
            ],
        )
    }

    /// match, resolve and compute one final folder
    fn assemble(
        reaction: &str,
        structures: &[AtomicStructure],
    ) -> Result<(ReactionSpec, StructureSlotTable, ReactionEnergies), ReactionError> {
        let folder = format!("Pub/VASP/PBE/Pt_fcc/111/{}", reaction);
        let spec = ReactionSpec::parse(reaction)?;
        let table = StructureMatcher::new(&spec, &folder).match_structures(
            structures,
            &empty_slab(),
            &gas_references(),
        )?;
        let coefficients = resolve(&spec, &table, &folder)?;
        let corrections = BTreeMap::new();
        let energies =
            EnergyAssembler::new(&spec, &table, &corrections, &folder).assemble(&coefficients)?;
        Ok((spec, table, energies))
    }

    fn co2_dissociation_structures() -> Vec<AtomicStructure> {
        vec![
            empty_slab(),
            AtomicStructure::new("COstar.traj", slab(4, &[6, 8]), -114.4).with_id("costar"),
            AtomicStructure::new("Ostar.traj", slab(4, &[8]), -112.0).with_id("ostar"),
        ]
    }

    #[test]
    fn test_co2_dissociation_energy_and_limits() {
        let (spec, table, energies) =
            assemble("CO2gas_COstar+Ostar", &co2_dissociation_structures()).unwrap();
        // two empty slabs balance COstar + Ostar
        assert_eq!(spec.prefactors.reactants, vec![1.0, 2.0]);
        assert_relative_eq!(energies.reaction_energy, -6.4, epsilon = 1e-9);
        assert_eq!(energies.activation_energy, None);

        let err = validate(&energies, 5.0, "Pt_fcc/111/CO2gas_COstar+Ostar").unwrap_err();
        assert!(matches!(err, ReactionError::EnergyBoundsViolation { .. }));
        assert!(validate(&energies, 10.0, "f").unwrap().is_empty());

        let ids = table.structure_ids(&spec);
        assert_eq!(ids.get("CO2gas").map(String::as_str), Some("co2"));
        assert_eq!(ids.get("Ostar").map(String::as_str), Some("ostar"));
        assert_eq!(ids.get("star").map(String::as_str), Some("empty"));
    }

    #[test]
    fn test_co2_dissociation_counts_the_balancing_slabs() {
        // energies of the slab files taken literally, with a 4-atom slab at -16.0 eV
        let folder = "Pub/VASP/PBE/Pt_fcc/111/CO2gas_COstar+Ostar";
        let spec = ReactionSpec::parse("CO2gas_COstar+Ostar").unwrap();
        let empty = AtomicStructure::new("empty_slab.traj", slab(4, &[]), -16.0);
        let gas = GasReferences::new(
            "Pub/VASP/PBE/gas",
            vec![AtomicStructure::new("CO2gas.traj", vec![6, 8, 8], -18.0)],
        );
        let structures = vec![
            AtomicStructure::new("COstar.traj", slab(4, &[6, 8]), -20.1),
            AtomicStructure::new("Ostar.traj", slab(4, &[8]), -4.3),
        ];
        let table = StructureMatcher::new(&spec, folder)
            .match_structures(&structures, &empty, &gas)
            .unwrap();
        let coefficients = resolve(&spec, &table, folder).unwrap();
        let corrections = BTreeMap::new();
        let energies = EnergyAssembler::new(&spec, &table, &corrections, folder)
            .assemble(&coefficients)
            .unwrap();
        // (-20.1 - 4.3) - (-18.0 + 2 * (-16.0))
        assert_relative_eq!(energies.reaction_energy, 25.6, epsilon = 1e-9);
        // leaving the two balancing slabs out gives (-20.1 - 4.3) - (-18.0)
        assert_relative_eq!(energies.reaction_energy + 2.0 * -16.0, -6.4, epsilon = 1e-9);
        for limit in [5.0, 10.0] {
            let err = validate(&energies, limit, folder).unwrap_err();
            assert!(matches!(err, ReactionError::EnergyBoundsViolation { .. }));
        }
    }

    #[test]
    fn test_rematching_is_idempotent() {
        let spec = ReactionSpec::parse("CO2gas_COstar+Ostar").unwrap();
        let structures = co2_dissociation_structures();
        let matcher = StructureMatcher::new(&spec, "f");
        let first = matcher
            .match_structures(&structures, &empty_slab(), &gas_references())
            .unwrap();
        let second = matcher
            .match_structures(&structures, &empty_slab(), &gas_references())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_species_names_species_and_folder() {
        let structures = vec![
            AtomicStructure::new("COstar.traj", slab(4, &[6, 8]), -115.0),
            AtomicStructure::new("Cstar.traj", slab(4, &[6]), -106.0),
        ];
        let err = assemble("COstar_Cstar_Ostar", &structures).unwrap_err();
        assert!(matches!(err, ReactionError::MatchInconsistency { .. }));
        assert_eq!(err.folder(), "Pub/VASP/PBE/Pt_fcc/111/COstar_Cstar_Ostar");
        assert!(err.to_string().contains("Ostar"));
    }

    #[test]
    fn test_supercell_doubles_slab_reference() {
        // the adsorbate slab is a doubled cell of the empty slab
        let structures = vec![AtomicStructure::new("COstar.traj", slab(8, &[6, 8]), -215.5)];
        let (spec, table, energies) = assemble("COgas+star_COstar", &structures).unwrap();
        assert_eq!(table.binding(Side::Products, 0).supercell_factor, 2);
        // -215.5 - (-14.8) - 2 * (-100.0)
        assert_relative_eq!(energies.reaction_energy, -0.7, epsilon = 1e-9);
        // reported coefficients stay the balanced literal ones
        assert_eq!(spec.coefficient_map(Side::Reactants).get("star"), Some(&1.0));
        assert_eq!(spec.coefficient_map(Side::Products).get("COstar"), Some(&1.0));
    }

    #[test]
    fn test_n_ads_scales_gas_reference() {
        let structures = vec![AtomicStructure::new("Hstar.traj", slab(4, &[1, 1]), -107.0)];
        let (spec, table, energies) = assemble("0.5H2gas+star_Hstar", &structures).unwrap();
        assert_eq!(table.binding(Side::Products, 0).n_ads, 2);
        // -107.0 - (-6.7) - (-100.0)
        assert_relative_eq!(energies.reaction_energy, -0.3, epsilon = 1e-9);
        assert_eq!(spec.coefficient_map(Side::Reactants).get("H2gas"), Some(&0.5));
    }

    fn co_dissociation_structures(with_reference: bool) -> Vec<AtomicStructure> {
        let mut structures = vec![
            AtomicStructure::new("COstar.traj", slab(4, &[6, 8]), -115.0),
            AtomicStructure::new("Cstar.traj", slab(4, &[6]), -106.0),
            AtomicStructure::new("Ostar.traj", slab(4, &[8]), -105.0),
            AtomicStructure::new("TS.traj", slab(4, &[6, 8]), -113.0),
        ];
        if with_reference {
            structures.push(AtomicStructure::new("TSempty.traj", slab(4, &[]), -100.1));
        }
        structures
    }

    #[test]
    fn test_activation_energy_with_ts_reference() {
        let (_, _, energies) = assemble("COstar_Cstar_Ostar", &co_dissociation_structures(true)).unwrap();
        // -106 - 105 - (-115 - 100)
        assert_relative_eq!(energies.reaction_energy, 4.0, epsilon = 1e-9);
        // (-113.0 + 100.1) - (-115.0 + 100.0)
        let ea = energies.activation_energy.unwrap();
        assert_relative_eq!(ea, 2.1, epsilon = 1e-9);
        let warnings = validate(&energies, 5.0, "f").unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("smaller than the reaction energy"));
    }

    #[test]
    fn test_activation_energy_without_ts_reference() {
        let (_, _, energies) =
            assemble("COstar_Cstar_Ostar", &co_dissociation_structures(false)).unwrap();
        // the second empty slab carries transition-state prefactor 0
        assert_relative_eq!(energies.activation_energy.unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_potential_energy() {
        let mut costar = AtomicStructure::new("COstar.traj", slab(4, &[6, 8]), 0.0);
        costar.potential_energy = None;
        let err = assemble("COgas+star_COstar", &[costar]).unwrap_err();
        assert!(matches!(err, ReactionError::EnergyComputationError { .. }));
    }
}

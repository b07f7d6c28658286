//! # Surface Reaction Assembly Module
//!
//! Turns the atomic structures of one "final" reaction folder into a reaction energy.
//!
//! ## Nomenclature
//!
//! | Term | Meaning |
//! |------|---------|
//! | slab | periodic surface model of the catalyst, with or without adsorbates |
//! | empty slab | bare slab, energetic and compositional reference |
//! | adsorbate | atoms on top of the bare slab composition |
//! | `star` | slab-bound state; a bare `star` entry is the empty-slab placeholder |
//! | `gas` | gas-phase reference molecule |
//! | TS | transition state, optionally with its own empty reference (`TSempty`) |
//! | prefactor | stoichiometric coefficient of a reaction entry |
//! | supercell factor | number of repeat units of a structure relative to the empty slab |
//!
//! ## Pipeline
//!
//! ```text
//! folder name --reaction_spec--> ReactionSpec
//! structures + empty slab + gas references --matcher--> StructureSlotTable
//! ReactionSpec + StructureSlotTable --prefactors--> final coefficients
//! final coefficients + corrections --energy--> (ΔE, Ea) + bounds check
//! ```
//!
//! ## Example
//! ```
//! use CatReact::Reactions::reaction_spec::ReactionSpec;
//! use CatReact::Reactions::structure::Side;
//! let spec = ReactionSpec::parse("COgas+star_COstar").unwrap();
//! assert_eq!(spec.len(Side::Reactants), 2);
//! assert_eq!(spec.species_name(Side::Products, 0), "CO");
//! ```

/// errors of the assembly pipeline (all of them are fatal for one folder)
pub mod errors;
/// element table, formula parsing and atomic-number multiset algebra
pub mod formula;
/// input structures, sides of a reaction and gas-phase references
pub mod structure;
/// parsing of reaction folder names into stoichiometric entries
pub mod reaction_spec;
/// assignment of structures to reaction entries
pub mod matcher;
/// final stoichiometric coefficients
pub mod prefactors;
/// reaction and activation energies
pub mod energy;
mod reaction_assembly_tests;

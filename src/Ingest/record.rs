use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One reaction as it goes to the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    /// hill formula of the empty slab (or the structure used in its place)
    pub chemical_composition: String,
    pub surface_composition: String,
    pub facet: String,
    /// species -> adsorption site
    pub sites: BTreeMap<String, String>,
    /// entry -> literal prefactor
    pub reactants: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    pub reaction_energy: f64,
    pub activation_energy: Option<f64>,
    pub dft_code: String,
    pub dft_functional: String,
    pub pub_id: String,
    pub doi: Option<String>,
    pub year: Option<i32>,
    /// entry -> structure id, including `star`, `bulk*`, `TSstar` and `TSemptystar`
    pub structure_ids: BTreeMap<String, String>,
    pub energy_corrections: BTreeMap<String, f64>,
    pub username: String,
}

impl ReactionRecord {
    /// "A + B --> C" from the coefficient maps
    pub fn equation(&self) -> String {
        let side = |map: &BTreeMap<String, f64>| {
            map.iter()
                .map(|(entry, c)| {
                    if (c - 1.0).abs() < 1e-12 {
                        entry.clone()
                    } else {
                        format!("{}{}", c, entry)
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        format!("{} --> {}", side(&self.reactants), side(&self.products))
    }
}

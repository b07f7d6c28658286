//! Structures in JSON form, one array per file:
//! ```json
//! [{"filename": "COstar.traj", "atomic_numbers": [78, 78, 6, 8], "potential_energy": -115.5, "unique_id": "a1"}]
//! ```
use crate::Reactions::structure::{AtomicStructure, GasReferences};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn load_structures_from_file(file_name: &str) -> Result<Vec<AtomicStructure>, String> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(format!("File '{}' does not exist", file_name));
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(format!("Failed to open file '{}': {}", file_name, e)),
    };
    let structures: Vec<AtomicStructure> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Failed to parse structures in '{}': {}", file_name, e))?;
    let without_energy = structures
        .iter()
        .filter(|s| s.potential_energy.is_none())
        .count();
    if without_energy > 0 {
        warn!(
            "{} of {} structures in '{}' have no potential energy",
            without_energy,
            structures.len(),
            file_name
        );
    }
    info!("Loaded {} structures from '{}'", structures.len(), file_name);
    Ok(structures)
}

/// gas-phase references; the folder label is the file's parent directory
pub fn load_gas_references(file_name: &str) -> Result<GasReferences, String> {
    let structures = load_structures_from_file(file_name)?;
    let folder = Path::new(file_name)
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    Ok(GasReferences::new(&folder, structures))
}

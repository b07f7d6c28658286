//! Inputs of one final folder and helpers for the traversal that produces them.
use crate::Ingest::diagnostics::DiagnosticsLog;
use crate::Ingest::errors::IngestError;
use crate::Reactions::structure::{AtomicStructure, GasReferences};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInfo {
    /// metal label of the material folder, e.g. "Pt"
    pub metal: String,
    pub crystal: Option<String>,
    pub facet: String,
}

impl SurfaceInfo {
    /// key of the bulk structure in the species-id cache
    pub fn bulk_key(&self) -> Option<String> {
        self.crystal.as_ref().map(|crystal| format!("bulk{}", crystal))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub dft_code: String,
    pub dft_functional: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub pub_id: String,
    pub doi: Option<String>,
    pub year: Option<i32>,
    /// entry or species name -> energy correction (eV)
    #[serde(default)]
    pub energy_corrections: BTreeMap<String, f64>,
}

/// Everything the traversal collaborator delivers for one final folder.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderInput {
    pub path: String,
    /// name of the reaction folder, parsed into the reaction equation
    pub reaction_folder: String,
    pub structures: Vec<AtomicStructure>,
    /// empty slab selected at facet level, if any
    pub empty_slab: Option<AtomicStructure>,
    pub gas: GasReferences,
    pub surface: SurfaceInfo,
    pub calculation: Calculation,
    pub publication: Publication,
}

/// Picks the empty slab among the candidates of a facet folder.
///
/// Several candidates are only accepted when the folder also holds transition-state files,
/// which bring their own `TSempty` reference; the first candidate is used then.
pub fn select_empty_slab(
    candidates: &[AtomicStructure],
    filenames: &[String],
    folder: &str,
    diagnostics: &mut DiagnosticsLog,
) -> Option<AtomicStructure> {
    match candidates {
        [] => {
            diagnostics.warn(folder, "No empty slab found in the facet folder");
            None
        }
        [single] => Some(single.clone()),
        [first, ..] => {
            diagnostics.warn(
                folder,
                format!("More than one empty slab found ({} files)", candidates.len()),
            );
            if filenames.iter().any(|f| f.contains("TS")) {
                Some(first.clone())
            } else {
                None
            }
        }
    }
}

/// "Pt_fcc" -> ("Pt", "fcc")
pub fn parse_surface_folder(name: &str) -> Result<(String, String), IngestError> {
    match name.split_once('_') {
        Some((metal, crystal)) if !metal.is_empty() && !crystal.is_empty() => {
            Ok((metal.to_string(), crystal.to_string()))
        }
        _ => Err(IngestError::folder_error(
            name,
            "material folder name should be <metal>_<crystal>, e.g. Pt_fcc",
        )),
    }
}

/// "111_3x3" -> "111"
pub fn parse_facet_folder(name: &str) -> String {
    name.split('_').next().unwrap_or(name).to_string()
}

/// Skips material and reaction folders until the requested ones are reached;
/// everything after them is read.
#[derive(Debug, Clone, Default)]
pub struct FolderFilter {
    goto_metal: Option<String>,
    goto_reaction: Option<String>,
}

impl FolderFilter {
    pub fn new(goto_metal: Option<&str>, goto_reaction: Option<&str>) -> Self {
        Self {
            goto_metal: goto_metal.map(str::to_string),
            goto_reaction: goto_reaction.map(str::to_string),
        }
    }

    pub fn admit_metal(&mut self, metal_folder: &str) -> bool {
        Self::admit(&mut self.goto_metal, metal_folder)
    }

    pub fn admit_reaction(&mut self, reaction_folder: &str) -> bool {
        Self::admit(&mut self.goto_reaction, reaction_folder)
    }

    fn admit(target: &mut Option<String>, name: &str) -> bool {
        if target.as_deref().is_some_and(|wanted| wanted != name) {
            return false;
        }
        *target = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ingest::diagnostics::{RunMode, Severity};

    #[test]
    fn test_surface_and_facet_names() {
        assert_eq!(
            parse_surface_folder("Pt_fcc").unwrap(),
            ("Pt".to_string(), "fcc".to_string())
        );
        assert_eq!(
            parse_surface_folder("Cu3Pt_L12").unwrap(),
            ("Cu3Pt".to_string(), "L12".to_string())
        );
        assert!(parse_surface_folder("Pt").is_err());
        assert!(parse_surface_folder("_fcc").is_err());
        assert_eq!(parse_facet_folder("111_3x3"), "111");
        assert_eq!(parse_facet_folder("0001"), "0001");
        let surface = SurfaceInfo {
            metal: "Pt".into(),
            crystal: Some("fcc".into()),
            facet: "111".into(),
        };
        assert_eq!(surface.bulk_key().as_deref(), Some("bulkfcc"));
    }

    #[test]
    fn test_empty_slab_selection() {
        let mut log = DiagnosticsLog::new(RunMode::Permissive);
        let a = AtomicStructure::new("empty_a.traj", vec![78; 4], -100.0);
        let b = AtomicStructure::new("empty_b.traj", vec![78; 4], -100.2);

        assert_eq!(select_empty_slab(&[], &[], "f", &mut log), None);
        assert_eq!(
            select_empty_slab(&[a.clone()], &[], "f", &mut log),
            Some(a.clone())
        );
        let files = vec!["empty_a.traj".to_string(), "empty_b.traj".to_string()];
        assert_eq!(
            select_empty_slab(&[a.clone(), b.clone()], &files, "f", &mut log),
            None
        );
        let with_ts = vec!["TS.traj".to_string(), "TSempty.traj".to_string()];
        assert_eq!(select_empty_slab(&[a.clone(), b], &with_ts, "f", &mut log), Some(a));
        assert_eq!(log.count(Severity::Warning), 3);
    }

    #[test]
    fn test_folder_filter() {
        let mut filter = FolderFilter::new(Some("Pt_fcc"), Some("COgas+star_COstar"));
        assert!(!filter.admit_metal("Au_fcc"));
        assert!(filter.admit_metal("Pt_fcc"));
        assert!(filter.admit_metal("Rh_fcc"));
        assert!(!filter.admit_reaction("H2gas+2star_2Hstar"));
        assert!(filter.admit_reaction("COgas+star_COstar"));
        assert!(filter.admit_reaction("H2gas+2star_2Hstar"));
        assert!(FolderFilter::default().admit_reaction("anything"));
    }
}

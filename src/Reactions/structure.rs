use crate::Reactions::formula::{has_heavy_atoms, hill_formula, LIGHT_ELEMENT_LIMIT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// side of a reaction equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Reactants,
    Products,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Reactants, Side::Products];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Reactants => "reactants",
            Side::Products => "products",
        }
    }
}

/// Two values of the same shape, one per reaction side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub reactants: T,
    pub products: T,
}

impl<T> SidePair<T> {
    pub fn new(reactants: T, products: T) -> Self {
        Self {
            reactants,
            products,
        }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Reactants => &self.reactants,
            Side::Products => &self.products,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Reactants => &mut self.reactants,
            Side::Products => &mut self.products,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Side, &T) -> U) -> SidePair<U> {
        SidePair {
            reactants: f(Side::Reactants, &self.reactants),
            products: f(Side::Products, &self.products),
        }
    }
}

/// state tag of a reaction entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Gas,
    Star,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Gas => "gas",
            State::Star => "star",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An atomic structure as delivered by the structure loader: ordered atomic numbers,
/// the DFT potential energy and the identifier the structure store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicStructure {
    pub filename: String,
    pub atomic_numbers: Vec<u8>,
    pub potential_energy: Option<f64>,
    #[serde(default)]
    pub unique_id: String,
}

impl AtomicStructure {
    pub fn new(filename: &str, atomic_numbers: Vec<u8>, potential_energy: f64) -> Self {
        Self {
            filename: filename.to_string(),
            atomic_numbers,
            potential_energy: Some(potential_energy),
            unique_id: String::new(),
        }
    }

    pub fn with_id(mut self, unique_id: &str) -> Self {
        self.unique_id = unique_id.to_string();
        self
    }

    pub fn len(&self) -> usize {
        self.atomic_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atomic_numbers.is_empty()
    }

    /// file name without directories and extension: "dir/OH.traj" -> "OH"
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }

    pub fn sorted_numbers(&self) -> Vec<u8> {
        let mut numbers = self.atomic_numbers.clone();
        numbers.sort_unstable();
        numbers
    }

    pub fn hill_formula(&self) -> String {
        hill_formula(&self.atomic_numbers)
    }

    pub fn has_heavy_atoms(&self) -> bool {
        has_heavy_atoms(&self.atomic_numbers)
    }

    /// only H..O atoms, i.e. a molecule rather than a slab
    pub fn is_molecular(&self) -> bool {
        self.atomic_numbers
            .iter()
            .all(|&z| z <= LIGHT_ELEMENT_LIMIT)
    }
}

/// Gas-phase reference molecules of one DFT code / functional scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasReferences {
    /// folder the references were read from, quoted in "not found" messages
    pub folder: String,
    pub structures: Vec<AtomicStructure>,
}

impl GasReferences {
    pub fn new(folder: &str, structures: Vec<AtomicStructure>) -> Self {
        Self {
            folder: folder.to_string(),
            structures,
        }
    }

    /// reference molecule with exactly this composition (sorted atomic numbers)
    pub fn find(&self, composition: &[u8]) -> Option<&AtomicStructure> {
        self.structures
            .iter()
            .find(|s| s.sorted_numbers() == composition)
    }
}

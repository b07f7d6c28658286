//! Module to turn chemical formulae into atomic-number multisets and back
//!
//! Compositions are compared as sorted vectors of atomic numbers, i.e. "CO2" -> [6, 8, 8].
//! This representation is shared by the structure matcher (structure minus empty slab),
//! the gas-reference lookup and the hill formula of the reported chemical composition.
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Unknown element '{0}'")]
    UnknownElement(String),
    #[error("Unbalanced brackets in formula '{0}'")]
    UnbalancedBrackets(String),
    #[error("Unexpected character '{character}' in formula '{formula}'")]
    UnexpectedCharacter { formula: String, character: char },
    #[error("Empty formula")]
    Empty,
}

// Define a struct to hold element data
pub struct Element {
    pub name: &'static str,
    pub atomic_number: u8,
}

/// elements with atomic number above this one are "heavy" (slab material)
pub const LIGHT_ELEMENT_LIMIT: u8 = 8;

const fn el(name: &'static str, atomic_number: u8) -> Element {
    Element {
        name,
        atomic_number,
    }
}

// periodic table up to Bi, the range used in surface-science calculations
const ELEMENTS: &[Element] = &[
    el("H", 1),
    el("He", 2),
    el("Li", 3),
    el("Be", 4),
    el("B", 5),
    el("C", 6),
    el("N", 7),
    el("O", 8),
    el("F", 9),
    el("Ne", 10),
    el("Na", 11),
    el("Mg", 12),
    el("Al", 13),
    el("Si", 14),
    el("P", 15),
    el("S", 16),
    el("Cl", 17),
    el("Ar", 18),
    el("K", 19),
    el("Ca", 20),
    el("Sc", 21),
    el("Ti", 22),
    el("V", 23),
    el("Cr", 24),
    el("Mn", 25),
    el("Fe", 26),
    el("Co", 27),
    el("Ni", 28),
    el("Cu", 29),
    el("Zn", 30),
    el("Ga", 31),
    el("Ge", 32),
    el("As", 33),
    el("Se", 34),
    el("Br", 35),
    el("Kr", 36),
    el("Rb", 37),
    el("Sr", 38),
    el("Y", 39),
    el("Zr", 40),
    el("Nb", 41),
    el("Mo", 42),
    el("Tc", 43),
    el("Ru", 44),
    el("Rh", 45),
    el("Pd", 46),
    el("Ag", 47),
    el("Cd", 48),
    el("In", 49),
    el("Sn", 50),
    el("Sb", 51),
    el("Te", 52),
    el("I", 53),
    el("Xe", 54),
    el("Cs", 55),
    el("Ba", 56),
    el("La", 57),
    el("Ce", 58),
    el("Pr", 59),
    el("Nd", 60),
    el("Pm", 61),
    el("Sm", 62),
    el("Eu", 63),
    el("Gd", 64),
    el("Tb", 65),
    el("Dy", 66),
    el("Ho", 67),
    el("Er", 68),
    el("Tm", 69),
    el("Yb", 70),
    el("Lu", 71),
    el("Hf", 72),
    el("Ta", 73),
    el("W", 74),
    el("Re", 75),
    el("Os", 76),
    el("Ir", 77),
    el("Pt", 78),
    el("Au", 79),
    el("Hg", 80),
    el("Tl", 81),
    el("Pb", 82),
    el("Bi", 83),
];

pub fn atomic_number(symbol: &str) -> Option<u8> {
    ELEMENTS
        .iter()
        .find(|e| e.name == symbol)
        .map(|e| e.atomic_number)
}

pub fn symbol(atomic_number: u8) -> Option<&'static str> {
    ELEMENTS
        .iter()
        .find(|e| e.atomic_number == atomic_number)
        .map(|e| e.name)
}

fn read_count(chars: &[char], pos: &mut usize) -> usize {
    let start = *pos;
    while *pos < chars.len() && chars[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if start == *pos {
        1
    } else {
        chars[start..*pos]
            .iter()
            .collect::<String>()
            .parse()
            .unwrap_or(1)
    }
}

// Function to parse a chemical formula and return a HashMap of elements and their counts.
// Brackets may be nested: "Ca(NO3)2", "Pt(C(OH)2)2".
pub fn parse_formula(formula: &str) -> Result<HashMap<String, usize>, FormulaError> {
    let formula: String = formula.chars().filter(|c| !c.is_whitespace()).collect();
    if formula.is_empty() {
        return Err(FormulaError::Empty);
    }
    let chars: Vec<char> = formula.chars().collect();
    // one map per open bracket level
    let mut stack: Vec<HashMap<String, usize>> = vec![HashMap::new()];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '(' {
            stack.push(HashMap::new());
            i += 1;
        } else if c == ')' {
            i += 1;
            let multiplier = read_count(&chars, &mut i);
            let group = stack
                .pop()
                .ok_or_else(|| FormulaError::UnbalancedBrackets(formula.clone()))?;
            let parent = stack
                .last_mut()
                .ok_or_else(|| FormulaError::UnbalancedBrackets(formula.clone()))?;
            for (element, count) in group {
                *parent.entry(element).or_insert(0) += count * multiplier;
            }
        } else if c.is_ascii_uppercase() {
            let start = i;
            i += 1;
            if i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            let element: String = chars[start..i].iter().collect();
            if atomic_number(&element).is_none() {
                return Err(FormulaError::UnknownElement(element));
            }
            let count = read_count(&chars, &mut i);
            let current = stack
                .last_mut()
                .ok_or_else(|| FormulaError::UnbalancedBrackets(formula.clone()))?;
            *current.entry(element).or_insert(0) += count;
        } else {
            return Err(FormulaError::UnexpectedCharacter {
                formula: formula.clone(),
                character: c,
            });
        }
    }
    if stack.len() != 1 {
        return Err(FormulaError::UnbalancedBrackets(formula));
    }
    Ok(stack.pop().unwrap_or_default())
}

/// sorted atomic numbers of all atoms in the formula, "OH" -> [1, 8]
pub fn numbers_from_formula(formula: &str) -> Result<Vec<u8>, FormulaError> {
    let counts = parse_formula(formula)?;
    let mut numbers = Vec::new();
    for (element, count) in counts {
        let z = atomic_number(&element).ok_or(FormulaError::UnknownElement(element))?;
        numbers.extend(std::iter::repeat(z).take(count));
    }
    numbers.sort_unstable();
    Ok(numbers)
}

/// multiset repeated `n` times, kept sorted
pub fn scale_numbers(numbers: &[u8], n: usize) -> Vec<u8> {
    let mut scaled: Vec<u8> = numbers
        .iter()
        .flat_map(|&z| std::iter::repeat(z).take(n))
        .collect();
    scaled.sort_unstable();
    scaled
}

/// Result of removing one multiset from another
#[derive(Debug, Clone, PartialEq)]
pub struct Subtraction {
    /// sorted atoms left after the removal
    pub remainder: Vec<u8>,
    /// atoms of the subtrahend that were not present in the minuend
    pub missing: Vec<u8>,
}

impl Subtraction {
    pub fn is_feasible(&self) -> bool {
        self.missing.is_empty()
    }
}

/// elementwise multiset difference `minuend - subtrahend`
pub fn subtract_numbers(minuend: &[u8], subtrahend: &[u8]) -> Subtraction {
    let mut remainder = minuend.to_vec();
    let mut missing = Vec::new();
    for z in subtrahend {
        match remainder.iter().position(|x| x == z) {
            Some(pos) => {
                remainder.remove(pos);
            }
            None => missing.push(*z),
        }
    }
    remainder.sort_unstable();
    missing.sort_unstable();
    Subtraction { remainder, missing }
}

/// Hill formula as ASE writes it: C and H first if carbon is present, then alphabetical;
/// without carbon strictly alphabetical.
pub fn hill_formula(numbers: &[u8]) -> String {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for z in numbers {
        let name = symbol(*z).unwrap_or("X");
        *counts.entry(name).or_insert(0) += 1;
    }
    let mut order: Vec<&'static str> = counts.keys().copied().collect();
    order.sort_unstable();
    if counts.contains_key("C") {
        order.retain(|e| *e != "C" && *e != "H");
        if counts.contains_key("H") {
            order.insert(0, "H");
        }
        order.insert(0, "C");
    }
    order
        .into_iter()
        .map(|e| match counts[e] {
            1 => e.to_string(),
            n => format!("{}{}", e, n),
        })
        .collect()
}

pub fn has_heavy_atoms(numbers: &[u8]) -> bool {
    numbers.iter().any(|&z| z > LIGHT_ELEMENT_LIMIT)
}

///////////////////////////////REACTION ENTRY STRINGS////////////////////////////////////////
// Reaction entries look like "2CO2gas", "0.5H2gas", "OHstar", "star"

/// "2COstar" -> "COstar"
pub fn clear_prefactor(entry: &str) -> &str {
    match entry.find(|c: char| c.is_alphabetic()) {
        Some(pos) => &entry[pos..],
        None => "",
    }
}

/// "2COstar" -> Some(2.0), "COstar" -> Some(1.0), "x2" -> None for non-numeric prefixes
pub fn get_prefactor(entry: &str) -> Option<f64> {
    let pos = entry
        .find(|c: char| c.is_alphabetic())
        .unwrap_or(entry.len());
    let prefix = &entry[..pos];
    if prefix.is_empty() {
        return Some(1.0);
    }
    prefix.parse::<f64>().ok()
}

/// "COstar" -> "CO", "H2gas" -> "H2", "star" -> ""
pub fn clear_state(entry: &str) -> &str {
    for suffix in ["star", "gas", "*"] {
        if let Some(stripped) = entry.strip_suffix(suffix) {
            return stripped;
        }
    }
    entry
}

/// prefactor written back the way folder names use it: "" for 1, "2", "0.5"
pub fn format_prefactor(prefactor: f64) -> String {
    if (prefactor - 1.0).abs() < 1e-12 {
        String::new()
    } else if prefactor.fract() == 0.0 {
        format!("{}", prefactor as i64)
    } else {
        format!("{}", prefactor)
    }
}

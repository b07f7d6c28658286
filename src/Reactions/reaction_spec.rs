//! Parsing of reaction folder names.
//!
//! Three layouts are accepted:
//! - `CO2gas+H2gas_COgas+H2Ogas`: one `_` between the sides, `+` between species
//! - `OH_O_H`: one reactant and two products (standard layout)
//! - `COgas_2star__Cstar_Ostar`: `__` between the sides, `_` between species
//!
//! Each entry may carry a leading prefactor (`2CO2gas`, `0.5H2gas`), a trailing state
//! (`gas`, `star` or `*`, default `gas`) and a site label (`OHstar@ontop`).
//! A bare `star` entry stands for the empty slab.
use crate::Reactions::errors::ReactionError;
use crate::Reactions::formula::{clear_prefactor, format_prefactor, get_prefactor, numbers_from_formula};
use crate::Reactions::structure::{Side, SidePair, State};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9.]*[A-Za-z][A-Za-z0-9()]*\*?$").unwrap());

/// tolerance for comparing prefactors, which may be half-integers
const PREFACTOR_EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
struct ParsedEntry {
    prefactor: f64,
    species: String,
    state: State,
    site: Option<String>,
}

impl ParsedEntry {
    fn is_placeholder(&self) -> bool {
        self.species.is_empty() && self.state == State::Star
    }

    fn entry(&self) -> String {
        format!(
            "{}{}{}",
            format_prefactor(self.prefactor),
            self.species,
            self.state
        )
    }
}

fn parse_entry(token: &str, folder: &str) -> Result<ParsedEntry, ReactionError> {
    let (body, site) = match token.split_once('@') {
        Some((body, site)) => (body, Some(site.to_string())),
        None => (token, None),
    };
    if !ENTRY_RE.is_match(body) {
        return Err(ReactionError::parse(
            folder,
            format!("no recognizable species in entry '{}'", token),
        ));
    }
    let prefactor = get_prefactor(body).ok_or_else(|| {
        ReactionError::parse(folder, format!("invalid prefactor in entry '{}'", token))
    })?;
    let unprefixed = clear_prefactor(body);
    let (species, state) = if let Some(species) = unprefixed.strip_suffix("star") {
        (species, State::Star)
    } else if let Some(species) = unprefixed.strip_suffix('*') {
        (species, State::Star)
    } else if let Some(species) = unprefixed.strip_suffix("gas") {
        (species, State::Gas)
    } else {
        (unprefixed, State::Gas)
    };
    if species.is_empty() && state == State::Gas {
        return Err(ReactionError::parse(
            folder,
            format!("gas entry '{}' has no species", token),
        ));
    }
    if !species.is_empty() {
        numbers_from_formula(species).map_err(|e| {
            ReactionError::parse(folder, format!("entry '{}': {}", token, e))
        })?;
    }
    Ok(ParsedEntry {
        prefactor,
        species: species.to_string(),
        state,
        site,
    })
}

fn split_sides(name: &str) -> Result<(Vec<&str>, Vec<&str>), String> {
    let layout_hint = "folder name should look like <A>+<B>_<C>+<D>, <AB>_<A>_<B> or <A>_<B>__<C>_<D>";
    if name.contains("__") {
        let parts: Vec<&str> = name.split("__").collect();
        if parts.len() != 2 {
            return Err(format!("more than one '__' separator; {}", layout_hint));
        }
        return Ok((
            parts[0].split(['_', '+']).collect(),
            parts[1].split(['_', '+']).collect(),
        ));
    }
    let parts: Vec<&str> = name.split('_').collect();
    match parts.len() {
        2 => Ok((
            parts[0].split('+').collect(),
            parts[1].split('+').collect(),
        )),
        3 => Ok((vec![parts[0]], vec![parts[1], parts[2]])),
        _ => Err(layout_hint.to_string()),
    }
}

/// Parsed reaction equation of one reaction folder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionSpec {
    pub folder_name: String,
    /// entry strings, e.g. "2COstar", "H2gas", "star"
    pub entries: SidePair<Vec<String>>,
    pub states: SidePair<Vec<State>>,
    /// literal stoichiometric prefactors, after slab balancing
    pub prefactors: SidePair<Vec<f64>>,
    /// prefactors of the activation-energy reference (reactant basin)
    pub ts_prefactors: SidePair<Vec<f64>>,
    /// species names without prefactor and state, "" for the empty slab
    pub species: SidePair<Vec<String>>,
    /// sorted atomic numbers of one species unit, empty for the empty slab
    pub species_numbers: SidePair<Vec<Vec<u8>>>,
    /// species name -> adsorption site
    pub sites: BTreeMap<String, String>,
}

impl ReactionSpec {
    pub fn parse(folder_name: &str) -> Result<Self, ReactionError> {
        let name = folder_name.trim();
        if name.is_empty() {
            return Err(ReactionError::parse(folder_name, "empty reaction folder name"));
        }
        let (raw_reactants, raw_products) =
            split_sides(name).map_err(|e| ReactionError::parse(folder_name, e))?;

        let mut spec = ReactionSpec {
            folder_name: folder_name.to_string(),
            entries: SidePair::default(),
            states: SidePair::default(),
            prefactors: SidePair::default(),
            ts_prefactors: SidePair::default(),
            species: SidePair::default(),
            species_numbers: SidePair::default(),
            sites: BTreeMap::new(),
        };

        for (side, tokens) in [
            (Side::Reactants, raw_reactants),
            (Side::Products, raw_products),
        ] {
            let mut parsed = Vec::new();
            for token in tokens {
                if token.is_empty() {
                    return Err(ReactionError::parse(
                        folder_name,
                        format!("empty entry on the {} side", side.as_str()),
                    ));
                }
                parsed.push(parse_entry(token, folder_name)?);
            }
            // several bare slabs on one side are one "nstar" entry
            let n_placeholders = parsed.iter().filter(|e| e.is_placeholder()).count();
            if n_placeholders > 1 {
                let total: f64 = parsed
                    .iter()
                    .filter(|e| e.is_placeholder())
                    .map(|e| e.prefactor)
                    .sum();
                parsed.retain(|e| !e.is_placeholder());
                parsed.push(ParsedEntry {
                    prefactor: total,
                    species: String::new(),
                    state: State::Star,
                    site: None,
                });
            }
            for entry in parsed {
                if let Some(site) = &entry.site {
                    spec.sites.insert(entry.species.clone(), site.clone());
                }
                let numbers = if entry.species.is_empty() {
                    Vec::new()
                } else {
                    numbers_from_formula(&entry.species)
                        .map_err(|e| ReactionError::parse(folder_name, e.to_string()))?
                };
                spec.entries.get_mut(side).push(entry.entry());
                spec.states.get_mut(side).push(entry.state);
                spec.prefactors.get_mut(side).push(entry.prefactor);
                spec.species.get_mut(side).push(entry.species);
                spec.species_numbers.get_mut(side).push(numbers);
            }
        }
        spec.ts_prefactors = spec.prefactors.clone();
        spec.balance_slabs();
        Ok(spec)
    }

    fn push_placeholder(&mut self, side: Side, prefactor: f64, ts_prefactor: f64) {
        self.entries.get_mut(side).push("star".to_string());
        self.states.get_mut(side).push(State::Star);
        self.prefactors.get_mut(side).push(prefactor);
        self.ts_prefactors.get_mut(side).push(ts_prefactor);
        self.species.get_mut(side).push(String::new());
        self.species_numbers.get_mut(side).push(Vec::new());
    }

    /// Adds empty-slab units so both sides carry the same number of slabs, and
    /// derives the transition-state prefactors of the reactant basin.
    fn balance_slabs(&mut self) {
        let mut n_r = self.star_units(Side::Reactants);
        let n_p = self.star_units(Side::Products);
        let diff = n_p - n_r;
        if diff.abs() > PREFACTOR_EPS {
            let (side, amount) = if diff > 0.0 {
                n_r += diff;
                (Side::Reactants, diff)
            } else {
                (Side::Products, -diff)
            };
            match self.placeholder_index(side) {
                Some(index) => {
                    self.prefactors.get_mut(side)[index] += amount;
                    if side == Side::Reactants {
                        self.ts_prefactors.get_mut(side)[index] += amount;
                    }
                }
                None => {
                    let ts = if side == Side::Reactants { 1.0 } else { amount };
                    self.push_placeholder(side, amount, ts);
                }
            }
        }

        if n_r > 1.0 + PREFACTOR_EPS {
            match self.placeholder_index(Side::Reactants) {
                Some(index) => {
                    let count_empty = self.ts_prefactors.reactants[index];
                    self.ts_prefactors.reactants[index] = -(n_r - count_empty - 1.0);
                }
                None => self.push_placeholder(Side::Reactants, 0.0, -(n_r - 1.0)),
            }
        } else if let Some(index) = self.placeholder_index(Side::Reactants) {
            self.ts_prefactors.reactants[index] = 1.0;
        }
    }

    /// number of slab units on one side, placeholders included
    pub fn star_units(&self, side: Side) -> f64 {
        self.states
            .get(side)
            .iter()
            .zip(self.prefactors.get(side))
            .filter(|(state, _)| **state == State::Star)
            .map(|(_, p)| *p)
            .sum()
    }

    pub fn len(&self, side: Side) -> usize {
        self.entries.get(side).len()
    }

    pub fn placeholder_index(&self, side: Side) -> Option<usize> {
        (0..self.len(side)).find(|&i| self.is_placeholder(side, i))
    }

    /// the entry stands for the bare empty slab
    pub fn is_placeholder(&self, side: Side, index: usize) -> bool {
        self.states.get(side)[index] == State::Star && self.species.get(side)[index].is_empty()
    }

    pub fn has_placeholder(&self) -> bool {
        Side::BOTH
            .iter()
            .any(|&side| self.placeholder_index(side).is_some())
    }

    pub fn species_name(&self, side: Side, index: usize) -> &str {
        &self.species.get(side)[index]
    }

    /// entry without prefactor: "COstar", "H2gas", "star"
    pub fn entry_name(&self, side: Side, index: usize) -> &str {
        clear_prefactor(&self.entries.get(side)[index])
    }

    /// entry names of both sides, used to prune the species-id cache for each final folder
    pub fn entry_names(&self) -> Vec<String> {
        Side::BOTH
            .iter()
            .flat_map(|&side| (0..self.len(side)).map(move |i| (side, i)))
            .map(|(side, i)| self.entry_name(side, i).to_string())
            .collect()
    }

    /// entry name -> literal prefactor, as reported in the reaction record
    pub fn coefficient_map(&self, side: Side) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for i in 0..self.len(side) {
            map.insert(
                self.entry_name(side, i).to_string(),
                self.prefactors.get(side)[i],
            );
        }
        map
    }
}

impl fmt::Display for ReactionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |side: Side| -> String {
            self.entries
                .get(side)
                .iter()
                .zip(self.prefactors.get(side))
                .map(|(e, p)| format!("{}{}", format_prefactor(*p), clear_prefactor(e)))
                .collect::<Vec<_>>()
                .join(" + ")
        };
        write!(f, "{} --> {}", side(Side::Reactants), side(Side::Products))
    }
}

#[allow(non_snake_case)]
pub mod Ingest;
/// reaction equations, structure matching and reaction energies
#[allow(non_snake_case)]
pub mod Reactions;
#[allow(non_snake_case)]
pub mod Utils;

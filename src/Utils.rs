/// JSON structure files as written by the structure loader
pub mod load_structures;
/// simplelog setup
pub mod logger;

//! # Ingestion Module
//!
//! Drives the reaction assembly over the final folders of a publication tree and
//! writes the resulting reaction records.
//!
//! ## Folder hierarchy
//! ```text
//! <publication>/<DFT code>/<functional>/
//!     gas/                                gas-phase references
//!     <metal>_<crystal>/                  bulk structure
//!         <facet>_<...>/                  empty slab
//!             <reaction>/[<site>/]        final folder: adsorbate slabs, TS, TSempty
//! ```
//! Walking that tree and loading the structure files is left to the caller, which
//! hands every final folder over as a [`folder::FolderInput`].
//!
//! ## Run policy
//! With `debug = false` the first fatal folder aborts the run; with `debug = true` it is
//! logged, its record dropped, and the run goes on. Warnings never block a record.
//!
//! ## Example
//! ```
//! use CatReact::Ingest::config::IngestConfig;
//! use CatReact::Ingest::ingestor::Ingestor;
//! use CatReact::Ingest::store::{create_store, StoreType};
//! let store = create_store(StoreType::InMemory).unwrap();
//! let ingestor = Ingestor::new(IngestConfig::default(), store);
//! assert_eq!(ingestor.ctx.stats.folders, 0);
//! ```

/// run settings
pub mod config;
/// run context and species-id cache
pub mod context;
/// warnings and errors of a run
pub mod diagnostics;
pub mod errors;
/// per-folder inputs and traversal helpers
pub mod folder;
/// per-folder pipeline and record upsert
pub mod ingestor;
pub mod record;
/// record stores
pub mod store;

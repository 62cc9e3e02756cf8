//! `invmatch-recon`: cross-catalog inventory-number reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded records, returns classified results.
//! No CLI or IO dependencies.

pub mod classify;
pub mod compound;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod identifier;
pub mod index;
pub mod model;
pub mod report;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use identifier::{normalize, CanonicalId, SourceKind};
pub use index::{build_index, IndexStats, SourceIndex};
pub use model::{Category, MatchRow, ReconInput, ReconResult, RecordRef};
pub use report::{render, render_all, ReportTable};

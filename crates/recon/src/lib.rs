//! `sensorgrid-recon` — Cross-source sensor reconciliation engine.
//!
//! Pure engine crate: receives already-fetched payloads (a pipe-delimited
//! sensor listing and the management API's thermal/power documents), returns a
//! reconciliation report. No network, process or file IO.

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod limits;
pub mod matcher;
pub mod model;
pub mod structured;
pub mod tabular;

pub use config::{ReconConfig, ReconSettings};
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use matcher::KeywordSet;
pub use model::{ReconInput, ReconReport, ReconResult, SensorMap, SensorReading};
pub use structured::extract_structured;
pub use tabular::parse_tabular;

//! Synthetic data generator for Data Vault practice fixtures.
//!
//! Produces ERP, SaaS and payment snapshot tables with deliberate noise,
//! plus a change-data-capture event log for each ERP table.

pub mod cdc;
pub mod config;
pub mod fake;
pub mod generator;
pub mod snapshot;
pub mod table;
pub mod validate;
pub mod writer;

pub use cdc::{CdcEvent, CdcOp, CdcStats, EventLog};
pub use config::{CdcConfig, Counts, DateRange, GenerateConfig, NoiseConfig};
pub use generator::{Dataset, Generator, RunSummary};
pub use snapshot::Snapshot;
pub use table::{Table, Value};

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the observation table (`Observation`, `Dataset`)
//! - truth parameters and the truth grid (`Truth`, `TruthGrid`)
//! - fit outputs (`StandardizationParams`, `LinearParams`)
//! - run configuration (`SimConfig`, `ScriptConfig`) and the exported `AggregateRow`

pub mod types;

pub use types::*;

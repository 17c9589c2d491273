//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - aggregate result tables (`export`)
//! - JSON run manifest (`manifest`)
//! - all-or-nothing output publication (`staged`)

pub mod export;
pub mod ingest;
pub mod manifest;
pub mod staged;

pub use export::*;
pub use ingest::*;
pub use manifest::*;
pub use staged::*;

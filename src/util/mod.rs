//! Shared ambient utilities.
//!
//! The teacher's retrieved pack also declared `clock` and `serde`
//! submodules here, but their source files were absent from the pack and
//! both belonged to the capacity-accounted resource-pool domain this
//! crate does not implement (see `DESIGN.md`), so only `telemetry`
//! survives into the transformed crate.
pub mod telemetry;

pub use telemetry::*;

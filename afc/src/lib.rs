#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::correctness)]

//! # AFC
//!
//! Automated Frequency Coordination compute engine for unlicensed 6 GHz
//! spectrum: decide, per channel, the maximum EIRP an access point may use
//! without interfering with licensed fixed-service incumbents.
//!

/// Geometry and numeric primitives.
#[cfg(feature = "geo")]
pub use afc_geo as geo;

/// Domain data model: bands, channels, documents, incumbents, antennas.
#[cfg(feature = "model")]
pub use afc_model as model;

/// Raster access, terrain stack, and population grids.
#[cfg(feature = "terrain")]
pub use afc_terrain as terrain;

/// The EIRP solver core.
#[cfg(feature = "engine")]
pub use afc_engine as engine;

pub mod prelude;
pub mod result;

pub use result::{Error, Result};

//!
//! Unified error types for the AFC facade crate.
//!
//! Consolidates the sub-crate error types into one surface so callers using
//! several layers together can propagate with a single `?`. Variants are
//! feature-gated to match the enabled sub-crates; all features are on by
//! default.
//!

use thiserror::Error as ThisError;

/// A unified result type using the facade-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the AFC facade crate.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Error from the geometry layer (afc-geo).
    #[cfg(feature = "geo")]
    #[error("geometry error: {0}")]
    Geo(#[from] afc_geo::result::Error),

    /// Error from the domain model layer (afc-model).
    #[cfg(feature = "model")]
    #[error("model error: {0}")]
    Model(#[from] afc_model::result::Error),

    /// Error from raster and grid access (afc-terrain).
    #[cfg(feature = "terrain")]
    #[error("terrain error: {0}")]
    Terrain(#[from] afc_terrain::result::Error),

    /// Error from the solver core (afc-engine).
    #[cfg(feature = "engine")]
    #[error("engine error: {0}")]
    Engine(#[from] afc_engine::result::Error),
}

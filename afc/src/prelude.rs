//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use afc::prelude::*;
//!
//! let mut region = RlanRegion::ellipse(center, Height::Agl(3.0), 1.0, 50.0, 100.0, 45.0)?;
//! region.configure(&terrain)?;
//! let output = solve_request(&inputs, &request, &cancel)?;
//! ```

pub use crate::{Error, Result};

#[cfg(feature = "geo")]
pub use afc_geo::point::{GeoPoint, Height, LatLonBounds};

#[cfg(feature = "model")]
pub use afc_model::channel::{Channel, ChannelColor};
#[cfg(feature = "model")]
pub use afc_model::config::AfcConfig;
#[cfg(feature = "model")]
pub use afc_model::incumbent::{FsLink, FsReceiver, PassiveRepeater};
#[cfg(feature = "model")]
pub use afc_model::request::SpectrumInquiryRequestDocument;
#[cfg(feature = "model")]
pub use afc_model::response::SpectrumInquiryResponseDocument;

#[cfg(feature = "terrain")]
pub use afc_terrain::terrain::{TerrainStack, TerrainStackSources};
#[cfg(feature = "terrain")]
pub use afc_terrain::tiled::{TiledRaster, TiledRasterConfig};

#[cfg(feature = "engine")]
pub use afc_engine::region::{RlanRegion, ScanMethod};
#[cfg(feature = "engine")]
pub use afc_engine::solver::{solve_request, SolverInputs};

//!
//! Contains the Result and Error types for the domain model.
//!

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("unknown global operating class {0}")]
    UnknownOperatingClass(u8),
    #[error("frequency {0} MHz is outside the supported 6 GHz bands")]
    UnsupportedFrequency(f64),
    #[error("unknown antenna pattern {0:?}")]
    UnknownAntennaPattern(String),
    #[error("antenna gain table is unusable")]
    BadGainTable(#[source] afc_geo::result::Error),
    #[error("invalid antenna gain table line: {0:?}")]
    BadGainTableLine(String),
    #[error("location must carry exactly one of ellipse, linearPolygon, radialPolygon")]
    AmbiguousLocation,
    #[error("unknown height type {0:?}")]
    UnknownHeightType(String),
    #[error(transparent)]
    Geo(#[from] afc_geo::result::Error),
}

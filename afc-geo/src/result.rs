//!
//! Contains the Result and Error types for geometry operations.
//!

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("polygon ring has fewer than three distinct vertices")]
    DegeneratePolygon,
    #[error("scan raster contains no covered cells")]
    EmptyScanRaster,
    #[error("KML placemark is missing a {0} element")]
    KmlMissingElement(&'static str),
    #[error("invalid KML coordinate token: {0}")]
    KmlInvalidCoordinate(String),
    #[error("interpolation table needs at least two samples")]
    TableTooSmall,
    #[error("interpolation table abscissae must be strictly increasing")]
    TableNotIncreasing,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

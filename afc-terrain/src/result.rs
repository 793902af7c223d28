//!
//! Contains the Result and Error types for raster and grid access.
//!
//! Missing or unreadable reference data is fatal by design: every variant
//! that names a file carries the offending path so the diagnostic survives
//! to the top of the request.
//!

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("raster file IO error for {path}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unreadable raster format in {path}: {reason}")]
    BadFormat { path: String, reason: String },
    #[error("TIFF decoding error in {path}")]
    Tiff {
        path: String,
        #[source]
        source: tiff::TiffError,
    },
    #[error("raster {path} has no usable geotransform")]
    MissingGeoTransform { path: String },
    #[error("band {band} is not present in raster {path}")]
    BadBand { path: String, band: usize },
    #[error("read outside raster bounds in {path}: rows {row0}..{row1} cols {col0}..{col1}")]
    OutOfBounds {
        path: String,
        row0: usize,
        row1: usize,
        col0: usize,
        col1: usize,
    },
    #[error("unknown file name pattern field: {{{0}}}")]
    BadPatternField(String),
    #[error("unsupported raster file extension: {0}")]
    UnsupportedExtension(String),
    #[error("population raster does not span the full Earth at a single resolution")]
    NotWorldRaster,
    #[error("population record off the grid at ({latitude_deg}, {longitude_deg})")]
    OffGridSample {
        latitude_deg: f64,
        longitude_deg: f64,
    },
    #[error("population grid is already cumulative")]
    AlreadyCumulative,
    #[error("population grid is not cumulative")]
    NotCumulative,
    #[error("population grid has no cells")]
    EmptyGrid,
    #[error(transparent)]
    Geo(#[from] afc_geo::result::Error),
}

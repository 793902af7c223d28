//!
//! Raster dataset abstraction.
//!
//! Every raster file format used by the engine exposes the same surface: a
//! north-up geotransform, raster dimensions, one or more bands, a per-band
//! no-data sentinel, and bulk rectangular reads. Three concrete readers are
//! provided: GeoTIFF (terrain, surface, and population rasters), raw SRTM
//! `.hgt` tiles, and ESRI BIL multi-band rasters (LIDAR terrain + building
//! height pairs).
//!

mod bil;
mod geotiff;
mod hgt;

pub use bil::BilDataset;
pub use geotiff::GeoTiffDataset;
pub use hgt::HgtDataset;

use std::path::Path;

use afc_geo::point::LatLonBounds;

use crate::result::{Error, Result};

/// A north-up affine mapping between pixel and geographic coordinates.
///
/// Row 0 is the northernmost row; rows advance south and columns advance
/// east. Both pixel dimensions are stored positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform {
    /// Longitude of the west edge of pixel (0, 0).
    pub west_deg: f64,
    /// Latitude of the north edge of pixel (0, 0).
    pub north_deg: f64,
    /// Pixel width in degrees of longitude.
    pub pixel_width_deg: f64,
    /// Pixel height in degrees of latitude.
    pub pixel_height_deg: f64,
}

impl GeoTransform {
    /// The geographic rectangle covered by a raster of `width` x `height`
    /// pixels under this transform.
    pub fn bounds(&self, width: usize, height: usize) -> LatLonBounds {
        LatLonBounds {
            min_latitude_deg: self.north_deg - height as f64 * self.pixel_height_deg,
            min_longitude_deg: self.west_deg,
            max_latitude_deg: self.north_deg,
            max_longitude_deg: self.west_deg + width as f64 * self.pixel_width_deg,
        }
    }

    /// Fractional `(row, col)` of a geographic position. The integer part of
    /// each component is the pixel containing the position.
    pub fn pixel_of(&self, latitude_deg: f64, longitude_deg: f64) -> (f64, f64) {
        (
            (self.north_deg - latitude_deg) / self.pixel_height_deg,
            (longitude_deg - self.west_deg) / self.pixel_width_deg,
        )
    }

    /// Pixels per degree along (latitude, longitude).
    pub fn pixels_per_degree(&self) -> (f64, f64) {
        (1.0 / self.pixel_height_deg, 1.0 / self.pixel_width_deg)
    }

    /// The transform with both pixel-per-degree rates snapped to the nearest
    /// multiple of `multiple`. Guards against storage formats that carry
    /// slightly inexact pixel sizes.
    pub fn snapped(&self, multiple: f64) -> GeoTransform {
        let snap = |pixel_deg: f64| {
            let ppd = 1.0 / pixel_deg;
            let snapped = (ppd / multiple).round() * multiple;
            if snapped > 0.0 {
                1.0 / snapped
            } else {
                pixel_deg
            }
        };
        GeoTransform {
            west_deg: self.west_deg,
            north_deg: self.north_deg,
            pixel_width_deg: snap(self.pixel_width_deg),
            pixel_height_deg: snap(self.pixel_height_deg),
        }
    }
}

/// A typed pixel buffer read out of a raster band.
#[derive(Clone, Debug)]
pub enum PixelBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl PixelBuffer {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::U8(v) => v.len(),
            PixelBuffer::U16(v) => v.len(),
            PixelBuffer::I16(v) => v.len(),
            PixelBuffer::I32(v) => v.len(),
            PixelBuffer::F32(v) => v.len(),
            PixelBuffer::F64(v) => v.len(),
        }
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sample at `index` widened to `f64`.
    pub fn sample(&self, index: usize) -> f64 {
        match self {
            PixelBuffer::U8(v) => v[index] as f64,
            PixelBuffer::U16(v) => v[index] as f64,
            PixelBuffer::I16(v) => v[index] as f64,
            PixelBuffer::I32(v) => v[index] as f64,
            PixelBuffer::F32(v) => v[index] as f64,
            PixelBuffer::F64(v) => v[index],
        }
    }

    /// Copy the rectangle `rows` x `cols` starting at `(row0, col0)` out of a
    /// buffer laid out row-major with `src_cols` columns.
    pub fn copy_rect(
        &self,
        src_cols: usize,
        row0: usize,
        col0: usize,
        rows: usize,
        cols: usize,
    ) -> PixelBuffer {
        macro_rules! rect {
            ($variant:ident, $v:expr) => {{
                let mut out = Vec::with_capacity(rows * cols);
                for r in 0..rows {
                    let start = (row0 + r) * src_cols + col0;
                    out.extend_from_slice(&$v[start..start + cols]);
                }
                PixelBuffer::$variant(out)
            }};
        }
        match self {
            PixelBuffer::U8(v) => rect!(U8, v),
            PixelBuffer::U16(v) => rect!(U16, v),
            PixelBuffer::I16(v) => rect!(I16, v),
            PixelBuffer::I32(v) => rect!(I32, v),
            PixelBuffer::F32(v) => rect!(F32, v),
            PixelBuffer::F64(v) => rect!(F64, v),
        }
    }
}

/// A raster file open for reading.
///
/// Bands are 1-based, following the convention of the file formats served.
pub trait RasterDataset: Send {
    /// The path this dataset was opened from.
    fn path(&self) -> &Path;

    /// Raster width in pixels.
    fn width(&self) -> usize;

    /// Raster height in pixels.
    fn height(&self) -> usize;

    /// Number of bands.
    fn num_bands(&self) -> usize;

    /// The pixel-to-geographic transform.
    fn geo_transform(&self) -> GeoTransform;

    /// The no-data sentinel for `band`, if the file declares one.
    fn no_data(&self, band: usize) -> Option<f64>;

    /// Read the rectangle of `rows` x `cols` pixels with top-left pixel
    /// `(row0, col0)` from `band` in one bulk transfer.
    fn read_block(
        &mut self,
        band: usize,
        row0: usize,
        col0: usize,
        rows: usize,
        cols: usize,
    ) -> Result<PixelBuffer>;
}

/// Open a raster file, choosing the reader from the file extension.
pub fn open_raster(path: &Path) -> Result<Box<dyn RasterDataset>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "tif" | "tiff" => Ok(Box::new(GeoTiffDataset::open(path)?)),
        "hgt" => Ok(Box::new(HgtDataset::open(path)?)),
        "bil" => Ok(Box::new(BilDataset::open(path)?)),
        other => Err(Error::UnsupportedExtension(format!(
            "{other} ({})",
            path.display()
        ))),
    }
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::FileIo {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn check_block(
    dataset_path: &Path,
    width: usize,
    height: usize,
    num_bands: usize,
    band: usize,
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
) -> Result<()> {
    if band == 0 || band > num_bands {
        return Err(Error::BadBand {
            path: dataset_path.display().to_string(),
            band,
        });
    }
    if rows == 0 || cols == 0 || row0 + rows > height || col0 + cols > width {
        return Err(Error::OutOfBounds {
            path: dataset_path.display().to_string(),
            row0,
            row1: row0 + rows,
            col0,
            col1: col0 + cols,
        });
    }
    Ok(())
}

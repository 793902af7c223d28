//!
//! Raster fixture writers shared by the crate's tests. Fixtures are small
//! synthetic tiles written into temp dirs; no binary test data is committed.
//!

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// Write a single-band `f32` GeoTIFF with a north-up geotransform.
pub(crate) fn write_geotiff(
    path: &Path,
    west: f64,
    north: f64,
    pixel_deg: f64,
    width: u32,
    height: u32,
    no_data: Option<f64>,
    data: &[f32],
) {
    let mut file = File::create(path).unwrap();
    let mut tiff = TiffEncoder::new(&mut file).unwrap();
    let mut image = tiff
        .new_image::<colortype::Gray32Float>(width, height)
        .unwrap();
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &[pixel_deg, pixel_deg, 0.0][..])
        .unwrap();
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, west, north, 0.0][..])
        .unwrap();
    if let Some(nd) = no_data {
        image
            .encoder()
            .write_tag(Tag::GdalNodata, format!("{nd}").as_str())
            .unwrap();
    }
    image.write_data(data).unwrap();
    file.flush().unwrap();
}

/// Write a square `.hgt` tile of `size` x `size` big-endian `i16` samples.
pub(crate) fn write_hgt(path: &Path, size: usize, sample: impl Fn(usize, usize) -> i16) {
    let mut bytes = Vec::with_capacity(size * size * 2);
    for row in 0..size {
        for col in 0..size {
            bytes.extend_from_slice(&sample(row, col).to_be_bytes());
        }
    }
    std::fs::write(path, bytes).unwrap();
}

/// Write a little-endian `f32` BIL raster plus its `.hdr` sidecar. `bands`
/// holds one row-major plane per band; `(ulx, uly)` is the center of the
/// upper-left pixel.
pub(crate) fn write_bil_f32(
    path: &Path,
    ulx: f64,
    uly: f64,
    dim: f64,
    width: usize,
    height: usize,
    no_data: Option<f64>,
    bands: &[&[f32]],
) {
    let mut header = format!(
        "BYTEORDER I\nLAYOUT BIL\nNROWS {height}\nNCOLS {width}\nNBANDS {}\n\
         NBITS 32\nPIXELTYPE FLOAT\nULXMAP {ulx}\nULYMAP {uly}\nXDIM {dim}\nYDIM {dim}\n",
        bands.len()
    );
    if let Some(nd) = no_data {
        header.push_str(&format!("NODATA {nd}\n"));
    }
    std::fs::write(path.with_extension("hdr"), header).unwrap();

    let mut bytes = Vec::with_capacity(width * height * bands.len() * 4);
    for row in 0..height {
        for band in bands {
            for col in 0..width {
                bytes.extend_from_slice(&band[row * width + col].to_le_bytes());
            }
        }
    }
    std::fs::write(path, bytes).unwrap();
}

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::dataset::{check_block, io_error, GeoTransform, PixelBuffer, RasterDataset};
use crate::result::{Error, Result};

/// A single-band GeoTIFF raster.
///
/// The geotransform is taken from the `ModelPixelScale` and `ModelTiepoint`
/// tags and the no-data sentinel from the `GDAL_NODATA` ASCII tag. The image
/// is decoded once at open; block reads copy out of the decoded buffer, so
/// the open-file cache bounds the resident set.
pub struct GeoTiffDataset {
    path: PathBuf,
    width: usize,
    height: usize,
    transform: GeoTransform,
    no_data: Option<f64>,
    pixels: PixelBuffer,
}

impl GeoTiffDataset {
    /// Open and decode a GeoTIFF file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let tiff_error = |source| Error::Tiff {
            path: path.display().to_string(),
            source,
        };

        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(tiff_error)?
            .with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions().map_err(tiff_error)?;

        let pixel_scale = decoder
            .find_tag(Tag::ModelPixelScaleTag)
            .map_err(tiff_error)?
            .map(|v| v.into_f64_vec())
            .transpose()
            .map_err(tiff_error)?;
        let tie_point = decoder
            .find_tag(Tag::ModelTiepointTag)
            .map_err(tiff_error)?
            .map(|v| v.into_f64_vec())
            .transpose()
            .map_err(tiff_error)?;
        let transform = match (pixel_scale, tie_point) {
            (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 5 => GeoTransform {
                west_deg: tie[3] - tie[0] * scale[0],
                north_deg: tie[4] + tie[1] * scale[1],
                pixel_width_deg: scale[0],
                pixel_height_deg: scale[1],
            },
            _ => {
                return Err(Error::MissingGeoTransform {
                    path: path.display().to_string(),
                })
            }
        };

        let no_data = decoder
            .find_tag(Tag::GdalNodata)
            .map_err(tiff_error)?
            .map(|v| v.into_string())
            .transpose()
            .map_err(tiff_error)?
            .and_then(|s| s.trim().trim_end_matches('\0').parse::<f64>().ok());

        let pixels = match decoder.read_image().map_err(tiff_error)? {
            DecodingResult::U8(v) => PixelBuffer::U8(v),
            DecodingResult::U16(v) => PixelBuffer::U16(v),
            DecodingResult::U32(v) => PixelBuffer::F64(v.into_iter().map(f64::from).collect()),
            DecodingResult::U64(v) => PixelBuffer::F64(v.into_iter().map(|s| s as f64).collect()),
            DecodingResult::I8(v) => PixelBuffer::I16(v.into_iter().map(i16::from).collect()),
            DecodingResult::I16(v) => PixelBuffer::I16(v),
            DecodingResult::I32(v) => PixelBuffer::I32(v),
            DecodingResult::I64(v) => PixelBuffer::F64(v.into_iter().map(|s| s as f64).collect()),
            DecodingResult::F32(v) => PixelBuffer::F32(v),
            DecodingResult::F64(v) => PixelBuffer::F64(v),
        };

        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::BadFormat {
                path: path.display().to_string(),
                reason: format!(
                    "decoded {} samples for a {width}x{height} single-band raster",
                    pixels.len()
                ),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            width: width as usize,
            height: height as usize,
            transform,
            no_data,
            pixels,
        })
    }
}

impl RasterDataset for GeoTiffDataset {
    fn path(&self) -> &Path {
        &self.path
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn num_bands(&self) -> usize {
        1
    }

    fn geo_transform(&self) -> GeoTransform {
        self.transform
    }

    fn no_data(&self, _band: usize) -> Option<f64> {
        self.no_data
    }

    fn read_block(
        &mut self,
        band: usize,
        row0: usize,
        col0: usize,
        rows: usize,
        cols: usize,
    ) -> Result<PixelBuffer> {
        check_block(
            &self.path,
            self.width,
            self.height,
            1,
            band,
            row0,
            col0,
            rows,
            cols,
        )?;
        Ok(self.pixels.copy_rect(self.width, row0, col0, rows, cols))
    }
}

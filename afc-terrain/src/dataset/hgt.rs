use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::dataset::{check_block, io_error, GeoTransform, PixelBuffer, RasterDataset};
use crate::result::{Error, Result};

/// SRTM height void sentinel.
const HGT_NO_DATA: f64 = -32768.0;

/// A raw SRTM `.hgt` tile.
///
/// The file is a bare square grid of big-endian `i16` samples; the covered
/// one-degree cell is encoded in the file name (`N34W119.hgt` has its
/// south-west corner at 34N 119W) and the grid edge length comes from the
/// file size (3601 for 1 arc-second, 1201 for 3 arc-second). Samples are
/// point values on the lattice, so the transform is shifted by half a pixel
/// to make truncating pixel math behave as nearest-sample.
pub struct HgtDataset {
    path: PathBuf,
    file: File,
    size: usize,
    transform: GeoTransform,
}

impl HgtDataset {
    /// Open an `.hgt` tile, deriving coverage from its name and size.
    pub fn open(path: &Path) -> Result<Self> {
        let (sw_lat, sw_lon) = parse_hgt_name(path)?;

        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let bytes = file.metadata().map_err(|e| io_error(path, e))?.len();
        let samples = bytes / 2;
        let size = (samples as f64).sqrt().round() as usize;
        if size < 2 || (size * size) as u64 * 2 != bytes {
            return Err(Error::BadFormat {
                path: path.display().to_string(),
                reason: format!("{bytes} bytes is not a square i16 grid"),
            });
        }

        let pixel_deg = 1.0 / (size - 1) as f64;
        let transform = GeoTransform {
            west_deg: sw_lon - pixel_deg / 2.0,
            north_deg: sw_lat + 1.0 + pixel_deg / 2.0,
            pixel_width_deg: pixel_deg,
            pixel_height_deg: pixel_deg,
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
            transform,
        })
    }
}

impl RasterDataset for HgtDataset {
    fn path(&self) -> &Path {
        &self.path
    }

    fn width(&self) -> usize {
        self.size
    }

    fn height(&self) -> usize {
        self.size
    }

    fn num_bands(&self) -> usize {
        1
    }

    fn geo_transform(&self) -> GeoTransform {
        self.transform
    }

    fn no_data(&self, _band: usize) -> Option<f64> {
        Some(HGT_NO_DATA)
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
            &self.path, self.size, self.size, 1, band, row0, col0, rows, cols,
        )?;

        let mut out = Vec::with_capacity(rows * cols);
        let mut row_bytes = vec![0u8; cols * 2];
        for r in 0..rows {
            let offset = (((row0 + r) * self.size) + col0) as u64 * 2;
            self.file
                .seek(SeekFrom::Start(offset))
                .map_err(|e| io_error(&self.path, e))?;
            self.file
                .read_exact(&mut row_bytes)
                .map_err(|e| io_error(&self.path, e))?;
            for pair in row_bytes.chunks_exact(2) {
                out.push(i16::from_be_bytes([pair[0], pair[1]]));
            }
        }
        Ok(PixelBuffer::I16(out))
    }
}

/// Parse the south-west corner from an SRTM tile name like `N34W119.hgt`.
fn parse_hgt_name(path: &Path) -> Result<(f64, f64)> {
    let bad = || Error::BadFormat {
        path: path.display().to_string(),
        reason: "file name is not of the form N34W119.hgt".to_string(),
    };

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(bad)?;
    let bytes = stem.as_bytes();
    if bytes.len() < 7 {
        return Err(bad());
    }

    let lat_sign = match bytes[0].to_ascii_uppercase() {
        b'N' => 1.0,
        b'S' => -1.0,
        _ => return Err(bad()),
    };
    let lat: f64 = stem[1..3].parse().map_err(|_| bad())?;
    let lon_sign = match bytes[3].to_ascii_uppercase() {
        b'E' => 1.0,
        b'W' => -1.0,
        _ => return Err(bad()),
    };
    let lon: f64 = stem[4..7].parse().map_err(|_| bad())?;

    Ok((lat_sign * lat, lon_sign * lon))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::test_util::write_hgt;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_open_parses_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        // A small synthetic 11x11 grid standing in for a 1-degree tile.
        let path = dir.path().join("N34W119.hgt");
        write_hgt(&path, 11, |row, col| (row * 100 + col) as i16);

        let ds = HgtDataset::open(&path).unwrap();
        assert_eq!(ds.width(), 11);
        let t = ds.geo_transform();
        assert_approx_eq!(f64, t.pixel_width_deg, 0.1);
        assert_approx_eq!(f64, t.west_deg, -119.05);
        assert_approx_eq!(f64, t.north_deg, 35.05);
    }

    #[test]
    fn test_block_read_is_big_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("S02E045.hgt");
        write_hgt(&path, 3, |row, col| (row as i16) * 10 - col as i16);

        let mut ds = HgtDataset::open(&path).unwrap();
        let block = ds.read_block(1, 1, 0, 2, 3).unwrap();
        assert_approx_eq!(f64, block.sample(0), 10.0);
        assert_approx_eq!(f64, block.sample(2), 8.0);
        assert_approx_eq!(f64, block.sample(4), 19.0);
    }

    #[test]
    fn test_bad_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["X34W119.hgt", "N3W119.hgt", "tile.hgt"] {
            let path = dir.path().join(name);
            write_hgt(&path, 3, |_, _| 0);
            assert!(matches!(
                HgtDataset::open(&path),
                Err(Error::BadFormat { .. })
            ));
        }
    }

    #[test]
    fn test_truncated_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("N00E000.hgt");
        std::fs::write(&path, [0u8; 7]).unwrap();
        assert!(matches!(
            HgtDataset::open(&path),
            Err(Error::BadFormat { .. })
        ));
    }
}

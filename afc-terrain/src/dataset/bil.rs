use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::dataset::{check_block, io_error, GeoTransform, PixelBuffer, RasterDataset};
use crate::result::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PixelKind {
    SignedInt,
    UnsignedInt,
    Float,
}

/// An ESRI BIL (band-interleaved-by-line) raster with a `.hdr` sidecar.
///
/// This is the multi-band format of the stack; LIDAR tiles carry terrain in
/// band 1 and building height in band 2. Reads seek directly into the binary
/// file, one row per transfer, so opening a BIL file is cheap.
pub struct BilDataset {
    path: PathBuf,
    file: File,
    width: usize,
    height: usize,
    bands: usize,
    bits: usize,
    kind: PixelKind,
    big_endian: bool,
    transform: GeoTransform,
    no_data: Option<f64>,
}

impl BilDataset {
    /// Open a `.bil` raster by parsing the `.hdr` file next to it.
    pub fn open(path: &Path) -> Result<Self> {
        let header_path = path.with_extension("hdr");
        let header = std::fs::read_to_string(&header_path)
            .map_err(|e| io_error(&header_path, e))?;

        let bad = |reason: String| Error::BadFormat {
            path: header_path.display().to_string(),
            reason,
        };

        let mut ncols = None;
        let mut nrows = None;
        let mut nbands = 1usize;
        let mut nbits = 16usize;
        let mut pixel_type = None;
        let mut big_endian = false;
        let mut ulx = None;
        let mut uly = None;
        let mut xdim = None;
        let mut ydim = None;
        let mut no_data = None;

        for line in header.lines() {
            let mut fields = line.split_whitespace();
            let Some(key) = fields.next() else { continue };
            let Some(value) = fields.next() else { continue };
            match key.to_ascii_uppercase().as_str() {
                "NCOLS" => ncols = value.parse::<usize>().ok(),
                "NROWS" => nrows = value.parse::<usize>().ok(),
                "NBANDS" => nbands = value.parse::<usize>().ok().unwrap_or(1),
                "NBITS" => nbits = value.parse::<usize>().ok().unwrap_or(16),
                "PIXELTYPE" => {
                    pixel_type = Some(match value.to_ascii_uppercase().as_str() {
                        "SIGNEDINT" => PixelKind::SignedInt,
                        "UNSIGNEDINT" => PixelKind::UnsignedInt,
                        "FLOAT" => PixelKind::Float,
                        other => return Err(bad(format!("unknown PIXELTYPE {other}"))),
                    })
                }
                "BYTEORDER" => big_endian = value.to_ascii_uppercase().starts_with('M'),
                "LAYOUT" => {
                    if !value.eq_ignore_ascii_case("BIL") {
                        return Err(bad(format!("unsupported LAYOUT {value}")));
                    }
                }
                "ULXMAP" => ulx = value.parse::<f64>().ok(),
                "ULYMAP" => uly = value.parse::<f64>().ok(),
                "XDIM" => xdim = value.parse::<f64>().ok(),
                "YDIM" => ydim = value.parse::<f64>().ok(),
                "NODATA" | "NODATA_VALUE" => no_data = value.parse::<f64>().ok(),
                _ => {}
            }
        }

        let width = ncols.ok_or_else(|| bad("missing NCOLS".to_string()))?;
        let height = nrows.ok_or_else(|| bad("missing NROWS".to_string()))?;
        let xdim = xdim.ok_or_else(|| bad("missing XDIM".to_string()))?;
        let ydim = ydim.ok_or_else(|| bad("missing YDIM".to_string()))?;
        // ULXMAP/ULYMAP give the center of the upper-left pixel.
        let ulx = ulx.ok_or_else(|| bad("missing ULXMAP".to_string()))?;
        let uly = uly.ok_or_else(|| bad("missing ULYMAP".to_string()))?;

        let kind = pixel_type.unwrap_or(match nbits {
            32 | 64 => PixelKind::Float,
            _ => PixelKind::SignedInt,
        });
        match (kind, nbits) {
            (PixelKind::Float, 32 | 64)
            | (PixelKind::SignedInt, 16 | 32)
            | (PixelKind::UnsignedInt, 8 | 16) => {}
            _ => return Err(bad(format!("unsupported NBITS {nbits} for {kind:?}"))),
        }

        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let expected = (width * height * nbands * nbits / 8) as u64;
        let actual = file.metadata().map_err(|e| io_error(path, e))?.len();
        if actual < expected {
            return Err(Error::BadFormat {
                path: path.display().to_string(),
                reason: format!("file holds {actual} bytes, header implies {expected}"),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            width,
            height,
            bands: nbands,
            bits: nbits,
            kind,
            big_endian,
            transform: GeoTransform {
                west_deg: ulx - xdim / 2.0,
                north_deg: uly + ydim / 2.0,
                pixel_width_deg: xdim,
                pixel_height_deg: ydim,
            },
            no_data,
        })
    }

    fn decode_row(&self, bytes: &[u8], out: &mut Vec<f64>) {
        let step = self.bits / 8;
        for sample in bytes.chunks_exact(step) {
            let value = match (self.kind, self.bits) {
                (PixelKind::UnsignedInt, 8) => sample[0] as f64,
                (PixelKind::UnsignedInt, 16) => {
                    let raw = [sample[0], sample[1]];
                    if self.big_endian {
                        u16::from_be_bytes(raw) as f64
                    } else {
                        u16::from_le_bytes(raw) as f64
                    }
                }
                (PixelKind::SignedInt, 16) => {
                    let raw = [sample[0], sample[1]];
                    if self.big_endian {
                        i16::from_be_bytes(raw) as f64
                    } else {
                        i16::from_le_bytes(raw) as f64
                    }
                }
                (PixelKind::SignedInt, 32) => {
                    let raw = [sample[0], sample[1], sample[2], sample[3]];
                    if self.big_endian {
                        i32::from_be_bytes(raw) as f64
                    } else {
                        i32::from_le_bytes(raw) as f64
                    }
                }
                (PixelKind::Float, 32) => {
                    let raw = [sample[0], sample[1], sample[2], sample[3]];
                    if self.big_endian {
                        f32::from_be_bytes(raw) as f64
                    } else {
                        f32::from_le_bytes(raw) as f64
                    }
                }
                (PixelKind::Float, 64) => {
                    let raw = [
                        sample[0], sample[1], sample[2], sample[3], sample[4], sample[5],
                        sample[6], sample[7],
                    ];
                    if self.big_endian {
                        f64::from_be_bytes(raw)
                    } else {
                        f64::from_le_bytes(raw)
                    }
                }
                // Combinations are validated at open.
                _ => f64::NAN,
            };
            out.push(value);
        }
    }
}

impl RasterDataset for BilDataset {
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
        self.bands
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
            self.bands,
            band,
            row0,
            col0,
            rows,
            cols,
        )?;

        let step = self.bits / 8;
        let mut out = Vec::with_capacity(rows * cols);
        let mut row_bytes = vec![0u8; cols * step];
        for r in 0..rows {
            // Rows are interleaved by band: all of band 1's row, then band
            // 2's row, and so on.
            let row_index = (row0 + r) * self.bands + (band - 1);
            let offset = (row_index * self.width + col0) as u64 * step as u64;
            self.file
                .seek(SeekFrom::Start(offset))
                .map_err(|e| io_error(&self.path, e))?;
            self.file
                .read_exact(&mut row_bytes)
                .map_err(|e| io_error(&self.path, e))?;
            self.decode_row(&row_bytes, &mut out);
        }
        Ok(PixelBuffer::F64(out))
    }
}

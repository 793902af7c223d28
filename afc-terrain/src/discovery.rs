//!
//! Raster file discovery.
//!
//! A mapper either formats the file name covering a position from a pattern
//! with substitutable degree fields, or scans a directory once and matches
//! positions against each file's bounding rectangle.
//!

use std::path::{Path, PathBuf};

use afc_geo::point::LatLonBounds;

use crate::dataset::open_raster;
use crate::result::{Error, Result};

/// A discovered file with its coverage rectangle.
#[derive(Clone, Debug)]
pub struct ScanEntry {
    pub name: String,
    pub bounds: LatLonBounds,
}

/// Maps a geographic position to the raster file covering it.
#[derive(Debug)]
pub enum NameMapper {
    /// Format a name from a pattern, e.g. `{latHem}{latDegFloor:02}{lonHem}{lonDegFloor:03}.hgt`.
    Pattern {
        directory: PathBuf,
        pattern: String,
        entries: Option<Vec<ScanEntry>>,
    },
    /// Enumerate the directory once and match against file bounds.
    Scan {
        directory: PathBuf,
        entries: Option<Vec<ScanEntry>>,
    },
}

impl NameMapper {
    /// A pattern-based mapper rooted at `directory`.
    pub fn pattern(directory: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        NameMapper::Pattern {
            directory: directory.into(),
            pattern: pattern.into(),
            entries: None,
        }
    }

    /// A directory-scanning mapper.
    pub fn scan(directory: impl Into<PathBuf>) -> Self {
        NameMapper::Scan {
            directory: directory.into(),
            entries: None,
        }
    }

    /// The directory the mapper serves files from.
    pub fn directory(&self) -> &Path {
        match self {
            NameMapper::Pattern { directory, .. } | NameMapper::Scan { directory, .. } => directory,
        }
    }

    /// The base name of the file covering `(lat, lon)`, or `None` when no
    /// known file covers the position. A pattern mapper always resolves to a
    /// name; whether the file exists is the caller's concern.
    pub fn resolve(&mut self, latitude_deg: f64, longitude_deg: f64) -> Result<Option<String>> {
        match self {
            NameMapper::Pattern { pattern, .. } => {
                Ok(Some(format_name(pattern, latitude_deg, longitude_deg)?))
            }
            NameMapper::Scan { .. } => {
                let entries = self.entries()?;
                Ok(entries
                    .iter()
                    .find(|e| contains_half_open(&e.bounds, latitude_deg, longitude_deg))
                    .map(|e| e.name.clone()))
            }
        }
    }

    /// All files the mapper knows about, enumerating the directory on first
    /// use. Coverage and bound-rectangle queries walk this list in both
    /// modes.
    pub fn entries(&mut self) -> Result<&[ScanEntry]> {
        let (directory, entries) = match self {
            NameMapper::Pattern {
                directory, entries, ..
            }
            | NameMapper::Scan { directory, entries } => (directory, entries),
        };
        if entries.is_none() {
            *entries = Some(enumerate(directory)?);
        }
        Ok(entries.as_deref().unwrap_or_default())
    }
}

fn enumerate(directory: &Path) -> Result<Vec<ScanEntry>> {
    let mut entries = Vec::new();
    let read_dir = std::fs::read_dir(directory).map_err(|e| Error::FileIo {
        path: directory.display().to_string(),
        source: e,
    })?;
    for entry in read_dir {
        let entry = entry.map_err(|e| Error::FileIo {
            path: directory.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        // Sidecar and non-raster files are not an error here.
        let mut dataset = match open_raster(&path) {
            Ok(dataset) => dataset,
            Err(Error::UnsupportedExtension(_)) => continue,
            Err(e) => return Err(e),
        };
        let bounds = dataset
            .geo_transform()
            .bounds(dataset.width(), dataset.height());
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push(ScanEntry { name, bounds });
    }
    // Directory order is filesystem-dependent; sort for determinism.
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Half-open containment used for tile attribution: the top and left edges
/// belong to the tile, the bottom and right edges do not.
fn contains_half_open(bounds: &LatLonBounds, latitude_deg: f64, longitude_deg: f64) -> bool {
    latitude_deg > bounds.min_latitude_deg
        && latitude_deg <= bounds.max_latitude_deg
        && longitude_deg >= bounds.min_longitude_deg
        && longitude_deg < bounds.max_longitude_deg
}

/// Format a file name for `(lat, lon)` from a pattern.
///
/// Supported fields, each with an optional zero-pad width (`{latDegFloor:02}`):
/// `latHem` (N/S), `lonHem` (E/W), `latDegFloor`, `latDegCeil`,
/// `lonDegFloor`, `lonDegCeil`. The floor/ceil fields carry an off-by-one
/// tiebreak for integer arguments so a point on a tile boundary belongs to
/// the tile whose top and left edges include it.
pub fn format_name(pattern: &str, latitude_deg: f64, longitude_deg: f64) -> Result<String> {
    // A tile's bottom edge index; integer latitudes belong to the tile below.
    let lat_floor = {
        let f = latitude_deg.floor();
        if f == latitude_deg {
            f - 1.0
        } else {
            f
        }
    } as i64;
    // A tile's top edge index; integer latitudes already name their tile.
    let lat_ceil = latitude_deg.ceil() as i64;
    // A tile's left edge index; integer longitudes already name their tile.
    let lon_floor = longitude_deg.floor() as i64;
    // A tile's right edge index; integer longitudes belong to the tile east.
    let lon_ceil = {
        let c = longitude_deg.ceil();
        if c == longitude_deg {
            c + 1.0
        } else {
            c
        }
    } as i64;

    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| Error::BadPatternField(after.to_string()))?;
        let field = &after[..close];
        rest = &after[close + 1..];

        let (name, width) = match field.split_once(':') {
            Some((name, w)) => {
                let width = w
                    .parse::<usize>()
                    .map_err(|_| Error::BadPatternField(field.to_string()))?;
                (name, width)
            }
            None => (field, 0),
        };

        match name {
            "latHem" => out.push_str(if lat_floor >= 0 { "N" } else { "S" }),
            "lonHem" => out.push_str(if lon_floor >= 0 { "E" } else { "W" }),
            "latDegFloor" => out.push_str(&pad(lat_floor.unsigned_abs(), width)),
            "latDegCeil" => out.push_str(&pad(lat_ceil.unsigned_abs(), width)),
            "lonDegFloor" => out.push_str(&pad(lon_floor.unsigned_abs(), width)),
            "lonDegCeil" => out.push_str(&pad(lon_ceil.unsigned_abs(), width)),
            other => return Err(Error::BadPatternField(other.to_string())),
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn pad(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::test_util::write_hgt;

    const SRTM: &str = "{latHem}{latDegFloor:02}{lonHem}{lonDegFloor:03}.hgt";

    #[test]
    fn test_srtm_names() {
        assert_eq!(format_name(SRTM, 34.5, -118.2).unwrap(), "N34W119.hgt");
        assert_eq!(format_name(SRTM, -0.5, 0.5).unwrap(), "S01E000.hgt");
        assert_eq!(format_name(SRTM, 40.75924, -73.97434).unwrap(), "N40W074.hgt");
    }

    #[test]
    fn test_boundary_tiebreaks() {
        // A point on the shared horizontal edge belongs to the tile whose
        // top edge includes it.
        assert_eq!(format_name(SRTM, 35.0, -118.5).unwrap(), "N34W119.hgt");
        // A point on the shared vertical edge belongs to the tile whose left
        // edge includes it.
        assert_eq!(format_name(SRTM, 34.5, -119.0).unwrap(), "N34W119.hgt");

        // Ceil fields name the top-right corner.
        let ceil = "{latDegCeil:02}_{lonDegCeil:03}";
        assert_eq!(format_name(ceil, 34.2, 10.4).unwrap(), "35_011");
        assert_eq!(format_name(ceil, 35.0, 10.0).unwrap(), "35_011");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            format_name("{latDeg}", 0.5, 0.5),
            Err(Error::BadPatternField(_))
        ));
    }

    #[test]
    fn test_scan_mapper_matches_bounds() {
        let dir = tempfile::tempdir().unwrap();
        // Two adjacent one-degree tiles.
        write_hgt(&dir.path().join("N34W119.hgt"), 11, |_, _| 100);
        write_hgt(&dir.path().join("N34W118.hgt"), 11, |_, _| 200);

        let mut mapper = NameMapper::scan(dir.path());
        assert_eq!(
            mapper.resolve(34.5, -118.5).unwrap().as_deref(),
            Some("N34W119.hgt")
        );
        assert_eq!(
            mapper.resolve(34.5, -117.5).unwrap().as_deref(),
            Some("N34W118.hgt")
        );
        assert_eq!(mapper.resolve(10.0, 10.0).unwrap(), None);
        assert_eq!(mapper.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_pattern_mapper_resolves_without_io() {
        let mut mapper = NameMapper::pattern("/nonexistent", SRTM);
        assert_eq!(
            mapper.resolve(34.5, -118.5).unwrap().as_deref(),
            Some("N34W119.hgt")
        );
    }
}

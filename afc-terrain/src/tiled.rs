//!
//! Cached tiled raster access.
//!
//! A `TiledRaster` presents a directory of raster files as one height field.
//! Files are discovered by name, opened lazily through a small LRU of open
//! datasets, partitioned into tiles of bounded size, and served through an
//! LRU tile cache. Known-absent files are cached negatively so repeated
//! queries over uncovered areas stay constant-time.
//!
//! All shared state sits behind one mutex; tile values are handed out inside
//! `Arc`s, so no reference escapes the critical section.
//!

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use afc_geo::point::LatLonBounds;

use crate::cache::LruCache;
use crate::dataset::{open_raster, GeoTransform, PixelBuffer, RasterDataset};
use crate::discovery::NameMapper;
use crate::result::{Error, Result};

/// Tuning knobs for a tiled raster layer.
#[derive(Clone, Copy, Debug)]
pub struct TiledRasterConfig {
    /// Maximum tile edge length in pixels.
    pub max_tile_size: usize,
    /// Tile cache capacity in tiles. Zero disables tile caching.
    pub tile_cache_entries: usize,
    /// Open-dataset cache capacity in files.
    pub open_file_entries: usize,
    /// Pixels trimmed from every file edge; the usable rectangle is smaller
    /// than the storage rectangle by this margin, guarding against edge
    /// pixels with bad interpolation.
    pub margin_pixels: usize,
    /// When set, snap each file's pixels-per-degree to the nearest multiple
    /// of this value before deriving pixel indices.
    pub snap_pixels_per_degree: Option<f64>,
}

impl Default for TiledRasterConfig {
    fn default() -> Self {
        Self {
            max_tile_size: 512,
            tile_cache_entries: 256,
            open_file_entries: 8,
            margin_pixels: 0,
            snap_pixels_per_degree: None,
        }
    }
}

/// Per-file metadata derived once from the file's geotransform.
#[derive(Debug)]
pub struct FileMeta {
    pub name: String,
    pub path: PathBuf,
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub no_data: Vec<Option<f64>>,
    /// Full rectangle of the file's storage.
    pub storage_bounds: LatLonBounds,
    /// Storage rectangle inset by the configured margin.
    pub usable_bounds: LatLonBounds,
}

/// Key of one cached tile.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TileKey {
    file: String,
    band: usize,
    row0: usize,
    col0: usize,
}

/// One resident tile: its pixel rectangle and decoded samples. The entry
/// owns its pixels and shares the file metadata by `Arc` identity.
#[derive(Debug)]
struct Tile {
    meta: Arc<FileMeta>,
    row0: usize,
    col0: usize,
    cols: usize,
    pixels: PixelBuffer,
}

/// Result of sampling a raster stack at a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOutcome {
    /// No file covers the position.
    Outside,
    /// A file covers the position but holds the no-data sentinel there.
    NoData,
    /// A valid sample.
    Value(f64),
}

impl SampleOutcome {
    /// The sample when one is present.
    pub fn value(&self) -> Option<f64> {
        match self {
            SampleOutcome::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Aggregate cache counters, observable for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner {
    mapper: NameMapper,
    /// `None` marks a file name known to be absent.
    metas: HashMap<String, Option<Arc<FileMeta>>>,
    tiles: LruCache<TileKey, Arc<Tile>>,
    files: LruCache<String, Arc<Mutex<Box<dyn RasterDataset>>>>,
}

/// A multi-file raster layer served through tile and open-file caches.
pub struct TiledRaster {
    config: TiledRasterConfig,
    inner: Mutex<Inner>,
}

impl TiledRaster {
    /// Create a layer over the files reachable through `mapper`.
    pub fn new(mapper: NameMapper, config: TiledRasterConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                mapper,
                metas: HashMap::new(),
                tiles: LruCache::new(config.tile_cache_entries),
                files: LruCache::new(config.open_file_entries.max(1)),
            }),
        }
    }

    /// Sample `band` at a position. In direct mode the tile cache is
    /// bypassed and a single pixel is read from the file.
    pub fn value_at(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        band: usize,
        direct: bool,
    ) -> Result<SampleOutcome> {
        let mut inner = self.lock();

        let Some(name) = inner.mapper.resolve(latitude_deg, longitude_deg)? else {
            return Ok(SampleOutcome::Outside);
        };
        let Some(meta) = inner.meta_for(&name, &self.config)? else {
            return Ok(SampleOutcome::Outside);
        };

        if !meta.usable_bounds.contains(afc_geo::point::GeoPoint {
            latitude_deg,
            longitude_deg,
        }) {
            return Ok(SampleOutcome::Outside);
        }
        if band == 0 || band > meta.bands {
            return Err(Error::BadBand {
                path: meta.path.display().to_string(),
                band,
            });
        }

        let (frow, fcol) = meta.transform.pixel_of(latitude_deg, longitude_deg);
        let margin = self.config.margin_pixels;
        let row = (frow.floor() as i64)
            .clamp(margin as i64, (meta.height - margin) as i64 - 1) as usize;
        let col = (fcol.floor() as i64)
            .clamp(margin as i64, (meta.width - margin) as i64 - 1) as usize;

        let (value, meta) = if direct {
            let dataset = inner.open(&meta)?;
            let mut dataset = lock_arc(&dataset);
            (dataset.read_block(band, row, col, 1, 1)?.sample(0), meta)
        } else {
            let (tile_row0, tile_col0) = self.tile_origin(&meta, row, col);
            let key = TileKey {
                file: meta.name.clone(),
                band,
                row0: tile_row0,
                col0: tile_col0,
            };
            let tile = match inner.tiles.get(&key) {
                Some(tile) => tile,
                None => {
                    let tile = Arc::new(self.load_tile(&mut inner, &meta, band, tile_row0, tile_col0)?);
                    inner.tiles.add(key, tile.clone());
                    tile
                }
            };
            let value = tile
                .pixels
                .sample((row - tile.row0) * tile.cols + (col - tile.col0));
            // The tile's own metadata back-reference resolves the sentinel.
            (value, tile.meta.clone())
        };

        let no_data = meta.no_data.get(band - 1).copied().flatten();
        match no_data {
            Some(nd) if value == nd || (nd.is_nan() && value.is_nan()) => {
                Ok(SampleOutcome::NoData)
            }
            _ => Ok(SampleOutcome::Value(value)),
        }
    }

    /// Whether any known file covers the position. Walks every file in the
    /// mapper's directory, enumerating it on first use.
    pub fn covers(&self, latitude_deg: f64, longitude_deg: f64) -> Result<bool> {
        let mut inner = self.lock();
        let point = afc_geo::point::GeoPoint {
            latitude_deg,
            longitude_deg,
        };
        Ok(inner.mapper.entries()?.iter().any(|e| e.bounds.contains(point)))
    }

    /// The union of every known file's bounds, or `None` when the directory
    /// holds no rasters.
    pub fn bound_rect(&self) -> Result<Option<LatLonBounds>> {
        let mut inner = self.lock();
        let mut union: Option<LatLonBounds> = None;
        for entry in inner.mapper.entries()? {
            union = Some(match union {
                Some(u) => u.union(&entry.bounds),
                None => entry.bounds,
            });
        }
        Ok(union)
    }

    /// Tile cache counters.
    pub fn tile_stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.tiles.hits(),
            misses: inner.tiles.misses(),
            evictions: inner.tiles.evictions(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Top-left pixel of the tile holding `(row, col)`, aligned to the tile
    /// grid that starts at the margin.
    fn tile_origin(&self, meta: &FileMeta, row: usize, col: usize) -> (usize, usize) {
        let margin = self.config.margin_pixels;
        let tile = self.config.max_tile_size.max(1);
        let row0 = margin + (row.saturating_sub(margin) / tile) * tile;
        let col0 = margin + (col.saturating_sub(margin) / tile) * tile;
        (row0, col0)
    }

    fn load_tile(
        &self,
        inner: &mut Inner,
        meta: &Arc<FileMeta>,
        band: usize,
        row0: usize,
        col0: usize,
    ) -> Result<Tile> {
        let margin = self.config.margin_pixels;
        let tile = self.config.max_tile_size.max(1);
        let rows = tile.min(meta.height - margin - row0);
        let cols = tile.min(meta.width - margin - col0);

        let dataset = inner.open(meta)?;
        let mut dataset = lock_arc(&dataset);
        let pixels = dataset.read_block(band, row0, col0, rows, cols)?;
        Ok(Tile {
            meta: meta.clone(),
            row0,
            col0,
            cols,
            pixels,
        })
    }
}

impl Inner {
    /// The metadata record for `name`, deriving it from the file on first
    /// use. A missing file is cached as `None`.
    fn meta_for(&mut self, name: &str, config: &TiledRasterConfig) -> Result<Option<Arc<FileMeta>>> {
        if let Some(cached) = self.metas.get(name) {
            return Ok(cached.clone());
        }

        let path = self.mapper.directory().join(name);
        if !path.is_file() {
            self.metas.insert(name.to_string(), None);
            return Ok(None);
        }

        let dataset = open_raster(&path)?;
        if dataset.width() <= 2 * config.margin_pixels
            || dataset.height() <= 2 * config.margin_pixels
        {
            return Err(Error::BadFormat {
                path: path.display().to_string(),
                reason: format!(
                    "raster smaller than twice the {}-pixel margin",
                    config.margin_pixels
                ),
            });
        }
        let mut transform = dataset.geo_transform();
        if let Some(multiple) = config.snap_pixels_per_degree {
            transform = transform.snapped(multiple);
        }
        let (width, height, bands) = (dataset.width(), dataset.height(), dataset.num_bands());
        let storage_bounds = transform.bounds(width, height);
        let inset_lat = config.margin_pixels as f64 * transform.pixel_height_deg;
        let inset_lon = config.margin_pixels as f64 * transform.pixel_width_deg;
        let usable_bounds = LatLonBounds {
            min_latitude_deg: storage_bounds.min_latitude_deg + inset_lat,
            min_longitude_deg: storage_bounds.min_longitude_deg + inset_lon,
            max_latitude_deg: storage_bounds.max_latitude_deg - inset_lat,
            max_longitude_deg: storage_bounds.max_longitude_deg - inset_lon,
        };
        let no_data = (1..=bands).map(|b| dataset.no_data(b)).collect();

        let meta = Arc::new(FileMeta {
            name: name.to_string(),
            path,
            transform,
            width,
            height,
            bands,
            no_data,
            storage_bounds,
            usable_bounds,
        });
        // The freshly opened dataset goes straight into the open-file cache.
        self.files
            .add(name.to_string(), Arc::new(Mutex::new(dataset)));
        self.metas
            .insert(name.to_string(), Some(meta.clone()));
        Ok(Some(meta))
    }

    /// The open dataset for `meta`, reopening through the LRU on a miss.
    fn open(&mut self, meta: &FileMeta) -> Result<Arc<Mutex<Box<dyn RasterDataset>>>> {
        if let Some(dataset) = self.files.get(&meta.name) {
            return Ok(dataset);
        }
        let dataset = Arc::new(Mutex::new(open_raster(&meta.path)?));
        self.files.add(meta.name.clone(), dataset.clone());
        Ok(dataset)
    }
}

fn lock_arc(
    dataset: &Arc<Mutex<Box<dyn RasterDataset>>>,
) -> std::sync::MutexGuard<'_, Box<dyn RasterDataset>> {
    dataset.lock().unwrap_or_else(|poison| poison.into_inner())
}

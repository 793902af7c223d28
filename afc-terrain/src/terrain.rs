//!
//! The layered terrain stack.
//!
//! Five prioritized height sources sit behind one query: LIDAR (terrain in
//! band 1, building height in band 2), an optional canopy surface model, a
//! high-resolution DEM, SRTM, and a coarse global fallback. Per-source
//! atomic counters record which layer answered each query.
//!

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::result::Result;
use crate::tiled::{SampleOutcome, TiledRaster};

/// Which layer produced a terrain height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainSource {
    Cdsm,
    Lidar,
    Dep,
    Srtm,
    Global,
    /// Nothing covered the position; the height defaulted to zero.
    Default,
}

const SOURCE_COUNT: usize = 6;

impl TerrainSource {
    fn index(self) -> usize {
        match self {
            TerrainSource::Cdsm => 0,
            TerrainSource::Lidar => 1,
            TerrainSource::Dep => 2,
            TerrainSource::Srtm => 3,
            TerrainSource::Global => 4,
            TerrainSource::Default => 5,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TerrainSource::Cdsm => "CDSM",
            TerrainSource::Lidar => "LIDAR",
            TerrainSource::Dep => "DEP",
            TerrainSource::Srtm => "SRTM",
            TerrainSource::Global => "GLOBAL",
            TerrainSource::Default => "DEFAULT",
        }
    }

    fn all() -> [TerrainSource; SOURCE_COUNT] {
        [
            TerrainSource::Cdsm,
            TerrainSource::Lidar,
            TerrainSource::Dep,
            TerrainSource::Srtm,
            TerrainSource::Global,
            TerrainSource::Default,
        ]
    }
}

/// What the LIDAR layer said about the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LidarOutcome {
    /// The position is outside every LIDAR tile.
    OutsideRegion,
    /// A LIDAR tile covers the position but holds no data there.
    NoData,
    /// LIDAR terrain with no building at the position.
    NoBuilding,
    /// LIDAR terrain with a building at the position.
    Building,
}

/// One resolved height query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainHeightResult {
    /// Ground height in meters AMSL.
    pub terrain_m: f64,
    /// Building height above ground, when LIDAR reports one.
    pub building_m: Option<f64>,
    pub lidar: LidarOutcome,
    pub source: TerrainSource,
}

/// The stack's source layers, highest priority first. Any layer may be
/// absent.
#[derive(Default)]
pub struct TerrainStackSources {
    pub lidar: Option<TiledRaster>,
    pub cdsm: Option<TiledRaster>,
    pub dep: Option<TiledRaster>,
    pub srtm: Option<TiledRaster>,
    pub global: Option<TiledRaster>,
}

/// Per-source query counts, readable after a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerrainStats {
    pub counts: [u64; SOURCE_COUNT],
}

/// A layered height query over the five prioritized sources.
pub struct TerrainStack {
    sources: TerrainStackSources,
    counters: [AtomicU64; SOURCE_COUNT],
}

impl TerrainStack {
    pub fn new(sources: TerrainStackSources) -> Self {
        Self {
            sources,
            counters: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Resolve the terrain (and building) height at a position.
    ///
    /// With `use_cdsm` set, a canopy surface sample wins over everything
    /// else. Otherwise LIDAR is consulted first, then the DEM layers in
    /// priority order. A position outside every layer never fails: the
    /// height defaults to zero.
    pub fn terrain_height(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        use_cdsm: bool,
    ) -> Result<TerrainHeightResult> {
        if use_cdsm {
            if let Some(layer) = &self.sources.cdsm {
                if let SampleOutcome::Value(height) =
                    layer.value_at(latitude_deg, longitude_deg, 1, false)?
                {
                    return Ok(self.tally(TerrainHeightResult {
                        terrain_m: height,
                        building_m: None,
                        lidar: LidarOutcome::OutsideRegion,
                        source: TerrainSource::Cdsm,
                    }));
                }
            }
        }

        let mut lidar_outcome = LidarOutcome::OutsideRegion;
        if let Some(layer) = &self.sources.lidar {
            match layer.value_at(latitude_deg, longitude_deg, 1, false)? {
                SampleOutcome::Value(terrain) => {
                    let building =
                        match layer.value_at(latitude_deg, longitude_deg, 2, false)? {
                            SampleOutcome::Value(b) if b > 0.0 => Some(b),
                            _ => None,
                        };
                    return Ok(self.tally(TerrainHeightResult {
                        terrain_m: terrain,
                        building_m: building,
                        lidar: if building.is_some() {
                            LidarOutcome::Building
                        } else {
                            LidarOutcome::NoBuilding
                        },
                        source: TerrainSource::Lidar,
                    }));
                }
                SampleOutcome::NoData => lidar_outcome = LidarOutcome::NoData,
                SampleOutcome::Outside => {}
            }
        }

        for (layer, source) in [
            (&self.sources.dep, TerrainSource::Dep),
            (&self.sources.srtm, TerrainSource::Srtm),
            (&self.sources.global, TerrainSource::Global),
        ] {
            if let Some(layer) = layer {
                if let SampleOutcome::Value(height) =
                    layer.value_at(latitude_deg, longitude_deg, 1, false)?
                {
                    return Ok(self.tally(TerrainHeightResult {
                        terrain_m: height,
                        building_m: None,
                        lidar: lidar_outcome,
                        source,
                    }));
                }
            }
        }

        Ok(self.tally(TerrainHeightResult {
            terrain_m: 0.0,
            building_m: None,
            lidar: lidar_outcome,
            source: TerrainSource::Default,
        }))
    }

    /// Snapshot of the per-source counters.
    pub fn stats(&self) -> TerrainStats {
        TerrainStats {
            counts: std::array::from_fn(|i| self.counters[i].load(Ordering::Relaxed)),
        }
    }

    /// Emit the per-source summary through the logger.
    pub fn log_stats(&self) {
        let stats = self.stats();
        for source in TerrainSource::all() {
            debug!(
                "terrain source {}: {} queries",
                source.name(),
                stats.counts[source.index()]
            );
        }
    }

    fn tally(&self, result: TerrainHeightResult) -> TerrainHeightResult {
        self.counters[result.source.index()].fetch_add(1, Ordering::Relaxed);
        result
    }
}

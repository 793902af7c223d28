//!
//! Terrain stack assembly from a state directory.
//!
//! The state root holds one subdirectory per source layer; absent layers are
//! simply skipped and the stack falls through to the next source.
//!

use std::path::Path;

use log::info;

use afc_terrain::discovery::NameMapper;
use afc_terrain::terrain::{TerrainStack, TerrainStackSources};
use afc_terrain::tiled::{TiledRaster, TiledRasterConfig};

/// SRTM tiles are named by their south-west corner.
const SRTM_PATTERN: &str = "{latHem}{latDegFloor:02}{lonHem}{lonDegFloor:03}.hgt";

/// Build the layered terrain stack from `<state_root>/{lidar,cdsm,dep,srtm,global}`.
pub fn build_terrain_stack(state_root: &Path) -> TerrainStack {
    let layer = |name: &str| -> Option<TiledRaster> {
        let dir = state_root.join(name);
        if !dir.is_dir() {
            return None;
        }
        info!("terrain layer {name}: {}", dir.display());
        let mapper = if name == "srtm" {
            NameMapper::pattern(&dir, SRTM_PATTERN)
        } else {
            NameMapper::scan(&dir)
        };
        Some(TiledRaster::new(mapper, TiledRasterConfig::default()))
    };

    TerrainStack::new(TerrainStackSources {
        lidar: layer("lidar"),
        cdsm: layer("cdsm"),
        dep: layer("dep"),
        srtm: layer("srtm"),
        global: layer("global"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_layers_fall_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stack = build_terrain_stack(dir.path());
        // No layers at all: flat fallback, never an error.
        let result = stack.terrain_height(40.0, -74.0, false).expect("height");
        assert_eq!(result.terrain_m, 0.0);
    }

    #[test]
    fn test_srtm_layer_discovered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let srtm = dir.path().join("srtm");
        std::fs::create_dir_all(&srtm).expect("mkdir");
        // A tiny 3x3 tile at 250 m.
        let mut bytes = Vec::new();
        for _ in 0..9 {
            bytes.extend_from_slice(&250i16.to_be_bytes());
        }
        std::fs::write(srtm.join("N40W075.hgt"), bytes).expect("fixture");

        let stack = build_terrain_stack(dir.path());
        let result = stack.terrain_height(40.5, -74.5, false).expect("height");
        assert_eq!(result.terrain_m, 250.0);
    }
}

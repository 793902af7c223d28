//!
//! Terrain profiles between path endpoints.
//!

use afc_geo::point::GeoPoint;
use afc_terrain::terrain::TerrainStack;

use crate::result::Result;

/// Terrain heights sampled at even spacing along a path, endpoints included.
#[derive(Clone, Debug)]
pub struct TerrainProfile {
    pub step_m: f64,
    pub heights_m: Vec<f64>,
}

impl TerrainProfile {
    /// Path length implied by the sample count.
    pub fn distance_m(&self) -> f64 {
        self.step_m * (self.heights_m.len().saturating_sub(1)) as f64
    }

    /// Whether the straight ray between the endpoint heights clears every
    /// terrain sample, and the largest obstruction depth in meters when it
    /// does not.
    pub fn max_obstruction_m(&self, h1_amsl_m: f64, h2_amsl_m: f64) -> Option<f64> {
        let n = self.heights_m.len();
        if n < 3 {
            return None;
        }
        let mut worst: Option<f64> = None;
        for (i, &ground) in self.heights_m.iter().enumerate().take(n - 1).skip(1) {
            let t = i as f64 / (n - 1) as f64;
            let ray = h1_amsl_m + t * (h2_amsl_m - h1_amsl_m);
            let depth = ground - ray;
            if depth > 0.0 {
                worst = Some(worst.map_or(depth, |w: f64| w.max(depth)));
            }
        }
        worst
    }
}

/// Sample the terrain between `from` and `to` at roughly `step_m` spacing.
pub fn path_profile(
    terrain: &TerrainStack,
    from: GeoPoint,
    to: GeoPoint,
    step_m: f64,
) -> Result<TerrainProfile> {
    let distance = from.distance_m(&to);
    let n = ((distance / step_m.max(1.0)).ceil() as usize).max(1);

    let mut heights = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let t = i as f64 / n as f64;
        let lat = from.latitude_deg + t * (to.latitude_deg - from.latitude_deg);
        let lon = from.longitude_deg + t * (to.longitude_deg - from.longitude_deg);
        heights.push(terrain.terrain_height(lat, lon, false)?.terrain_m);
    }
    Ok(TerrainProfile {
        step_m: if n == 0 { 0.0 } else { distance / n as f64 },
        heights_m: heights,
    })
}

/// Elevation angle of the ray from `(h1, origin)` to `(h2, target)` above
/// the local horizontal, in degrees.
pub fn elevation_angle_deg(distance_m: f64, h1_amsl_m: f64, h2_amsl_m: f64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    ((h2_amsl_m - h1_amsl_m) / distance_m).atan().to_degrees()
}

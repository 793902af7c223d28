//!
//! Population density and propagation-environment grid.
//!
//! A dense latitude/longitude grid of people-per-cell, environment class,
//! and region index. Built either from a world population GeoTIFF clipped to
//! a bounding box, or from a tabular density file. The grid can be
//! renormalized to per-region totals, pruned to the neighborhood of the FS
//! catalog, and flipped into a row-major CDF for weighted sampling.
//!

use afc_geo::point::{GeoPoint, LatLonBounds, EARTH_RADIUS_M};
use afc_geo::polygon::IntPolygon;

use crate::dataset::RasterDataset;
use crate::result::{Error, Result};

/// Propagation environment classes, ordered densest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropEnv {
    Urban,
    Suburban,
    Rural,
    Barren,
    Undefined,
}

/// People per square kilometer at or above which a cell is urban.
pub const URBAN_DENSITY_PER_KM2: f64 = 486.75;
/// People per square kilometer at or above which a cell is suburban.
pub const SUBURBAN_DENSITY_PER_KM2: f64 = 211.205;
/// People per square kilometer at or above which a cell is rural.
pub const RURAL_DENSITY_PER_KM2: f64 = 0.5;

/// Classify a density in people per square kilometer.
pub fn classify_density(density_per_km2: f64) -> PropEnv {
    if density_per_km2 >= URBAN_DENSITY_PER_KM2 {
        PropEnv::Urban
    } else if density_per_km2 >= SUBURBAN_DENSITY_PER_KM2 {
        PropEnv::Suburban
    } else if density_per_km2 >= RURAL_DENSITY_PER_KM2 {
        PropEnv::Rural
    } else {
        PropEnv::Barren
    }
}

const NO_REGION: u32 = u32::MAX;
const ENV_COUNT: usize = 4;

fn env_index(env: PropEnv) -> Option<usize> {
    match env {
        PropEnv::Urban => Some(0),
        PropEnv::Suburban => Some(1),
        PropEnv::Rural => Some(2),
        PropEnv::Barren => Some(3),
        PropEnv::Undefined => None,
    }
}

/// The dense grid. Grid points are point-registered: point `(i, j)` sits at
/// `(min_lat + i*dlat, min_lon + j*dlon)` and owns the surrounding cell.
#[derive(Clone, Debug)]
pub struct PopulationGrid {
    min_lat_deg: f64,
    min_lon_deg: f64,
    delta_lat_deg: f64,
    delta_lon_deg: f64,
    n_lat: usize,
    n_lon: usize,
    num_regions: u32,
    /// People per cell; holds the running prefix sum in CDF mode.
    pop: Vec<f64>,
    env: Vec<PropEnv>,
    region: Vec<u32>,
    cumulative: bool,
}

impl PopulationGrid {
    /// Build the grid from a world population raster (people per km²),
    /// clipped to `window`, attributing each cell to the first polygon of
    /// `regions` containing its center. `region_resolution_deg` is the
    /// integer-grid resolution the region polygons were quantized at.
    pub fn from_world_geotiff(
        dataset: &mut dyn RasterDataset,
        window: LatLonBounds,
        regions: &[IntPolygon],
        region_resolution_deg: f64,
    ) -> Result<Self> {
        let transform = dataset.geo_transform();
        let (width, height) = (dataset.width(), dataset.height());
        let bounds = transform.bounds(width, height);

        // The source must span the full Earth at one resolution; otherwise
        // clipping with anti-meridian wrap is not well defined.
        let tol = transform.pixel_height_deg / 2.0;
        let square =
            (transform.pixel_width_deg - transform.pixel_height_deg).abs() < 1.0e-9;
        if !square
            || (bounds.min_latitude_deg + 90.0).abs() > tol
            || (bounds.max_latitude_deg - 90.0).abs() > tol
            || (bounds.min_longitude_deg + 180.0).abs() > tol
            || (bounds.max_longitude_deg - 180.0).abs() > tol
        {
            return Err(Error::NotWorldRaster);
        }

        let dlat = transform.pixel_height_deg;
        let dlon = transform.pixel_width_deg;
        let no_data = dataset.no_data(1);

        // Clip to the pixel centers falling inside the window.
        let row_of = |lat: f64| (transform.north_deg - lat) / dlat - 0.5;
        let col_of = |lon: f64| (lon - transform.west_deg) / dlon - 0.5;
        let row_top = (row_of(window.max_latitude_deg).ceil() as i64).max(0);
        let row_bottom = (row_of(window.min_latitude_deg).floor() as i64).min(height as i64 - 1);
        if row_top > row_bottom {
            return Err(Error::EmptyGrid);
        }
        let n_lat = (row_bottom - row_top + 1) as usize;

        // A window whose west edge lies east of its east edge wraps the
        // anti-meridian; columns are then taken modulo the raster width.
        let col_west = col_of(window.min_longitude_deg).ceil() as i64;
        let col_east = col_of(window.max_longitude_deg).floor() as i64;
        let wrapped = window.min_longitude_deg > window.max_longitude_deg;
        let n_lon = if wrapped {
            (col_east + width as i64 - col_west + 1).max(0) as usize
        } else {
            (col_east - col_west + 1).max(0) as usize
        };
        if n_lon == 0 {
            return Err(Error::EmptyGrid);
        }

        let min_lat = transform.north_deg - (row_bottom as f64 + 0.5) * dlat;
        let min_lon = transform.west_deg + (col_west as f64 + 0.5) * dlon;

        let mut pop = vec![0.0; n_lat * n_lon];
        let mut env = vec![PropEnv::Undefined; n_lat * n_lon];
        let mut region = vec![NO_REGION; n_lat * n_lon];

        for i in 0..n_lat {
            // Row i of the grid is the southernmost-first ordering; the
            // raster stores north-first.
            let raster_row = row_bottom as usize - i;
            let row_buffer = dataset.read_block(1, raster_row, 0, 1, width)?;
            let lat = min_lat + i as f64 * dlat;
            let cell_area_m2 = spherical_cell_area_m2(lat, dlat, dlon);

            for j in 0..n_lon {
                let raster_col = ((col_west + j as i64).rem_euclid(width as i64)) as usize;
                let mut density = row_buffer.sample(raster_col);
                if let Some(nd) = no_data {
                    if density == nd || (nd.is_nan() && density.is_nan()) {
                        density = 0.0;
                    }
                }
                let lon = normalize_lon(min_lon + j as f64 * dlon);

                let idx = i * n_lon + j;
                let cell_region = regions.iter().position(|p| {
                    let q = (
                        (lon / region_resolution_deg).round() as i64,
                        (lat / region_resolution_deg).round() as i64,
                    );
                    let c = p.contains(q);
                    c.inside || c.edge
                });
                // Cells outside every region carry no population.
                let Some(r) = cell_region else { continue };
                region[idx] = r as u32;
                env[idx] = classify_density(density);
                pop[idx] = density * 1.0e-6 * cell_area_m2;
            }
        }

        Ok(Self {
            min_lat_deg: min_lat,
            min_lon_deg: min_lon,
            delta_lat_deg: dlat,
            delta_lon_deg: dlon,
            n_lat,
            n_lon,
            num_regions: regions.len() as u32,
            pop,
            env,
            region,
            cumulative: false,
        })
    }

    /// Build the grid from tabular `(lat, lon, people per km²)` records on a
    /// known lattice. A record more than 5% of a cell off the lattice is
    /// fatal.
    pub fn from_density_records(
        min_lat_deg: f64,
        min_lon_deg: f64,
        delta_lat_deg: f64,
        delta_lon_deg: f64,
        n_lat: usize,
        n_lon: usize,
        records: impl IntoIterator<Item = (f64, f64, f64)>,
    ) -> Result<Self> {
        if n_lat == 0 || n_lon == 0 {
            return Err(Error::EmptyGrid);
        }
        let mut grid = Self {
            min_lat_deg,
            min_lon_deg,
            delta_lat_deg,
            delta_lon_deg,
            n_lat,
            n_lon,
            num_regions: 1,
            pop: vec![0.0; n_lat * n_lon],
            env: vec![PropEnv::Undefined; n_lat * n_lon],
            region: vec![0; n_lat * n_lon],
            cumulative: false,
        };

        for (lat, lon, density) in records {
            let fi = (lat - min_lat_deg) / delta_lat_deg;
            let fj = (lon - min_lon_deg) / delta_lon_deg;
            let i = fi.round();
            let j = fj.round();
            let off_grid = (fi - i).abs() > 0.05 || (fj - j).abs() > 0.05;
            if off_grid || i < 0.0 || j < 0.0 || i as usize >= n_lat || j as usize >= n_lon {
                return Err(Error::OffGridSample {
                    latitude_deg: lat,
                    longitude_deg: lon,
                });
            }
            let idx = i as usize * n_lon + j as usize;
            let area = spherical_cell_area_m2(lat, delta_lat_deg, delta_lon_deg);
            grid.pop[idx] = density * 1.0e-6 * area;
            grid.env[idx] = classify_density(density);
        }
        Ok(grid)
    }

    pub fn n_lat(&self) -> usize {
        self.n_lat
    }

    pub fn n_lon(&self) -> usize {
        self.n_lon
    }

    /// The grid point `(i, j)` as a geographic position.
    pub fn cell_center(&self, i: usize, j: usize) -> GeoPoint {
        GeoPoint {
            latitude_deg: self.min_lat_deg + i as f64 * self.delta_lat_deg,
            longitude_deg: normalize_lon(self.min_lon_deg + j as f64 * self.delta_lon_deg),
        }
    }

    fn cell_of(&self, latitude_deg: f64, longitude_deg: f64) -> Option<usize> {
        let i = ((latitude_deg - self.min_lat_deg) / self.delta_lat_deg).round();
        let dj = normalize_lon(longitude_deg) - self.min_lon_deg;
        let dj = if dj < -self.delta_lon_deg / 2.0 { dj + 360.0 } else { dj };
        let j = (dj / self.delta_lon_deg).round();
        if i < 0.0 || j < 0.0 {
            return None;
        }
        let (i, j) = (i as usize, j as usize);
        (i < self.n_lat && j < self.n_lon).then_some(i * self.n_lon + j)
    }

    /// The environment class at a position; `Undefined` outside the grid.
    pub fn env_at(&self, latitude_deg: f64, longitude_deg: f64) -> PropEnv {
        self.cell_of(latitude_deg, longitude_deg)
            .map_or(PropEnv::Undefined, |idx| self.env[idx])
    }

    /// People in the cell at a position; zero outside the grid.
    pub fn population_at(&self, latitude_deg: f64, longitude_deg: f64) -> Result<f64> {
        if self.cumulative {
            return Err(Error::AlreadyCumulative);
        }
        Ok(self
            .cell_of(latitude_deg, longitude_deg)
            .map_or(0.0, |idx| self.pop[idx]))
    }

    /// Total population over the grid.
    pub fn total_population(&self) -> f64 {
        if self.cumulative {
            self.pop.last().copied().unwrap_or(0.0)
        } else {
            self.pop.iter().sum()
        }
    }

    /// Population in one `(environment, region)` stratum.
    pub fn population_in(&self, env: PropEnv, region: u32) -> f64 {
        self.pop
            .iter()
            .zip(&self.env)
            .zip(&self.region)
            .filter(|((_, e), r)| **e == env && **r == region)
            .map(|((p, _), _)| p)
            .sum()
    }

    /// Renormalize each `(environment, region)` stratum to the supplied
    /// targets, one `[urban, suburban, rural, barren]` row per region.
    /// Strata currently empty are left untouched.
    pub fn scale(&mut self, targets_by_region: &[[f64; ENV_COUNT]]) -> Result<()> {
        if self.cumulative {
            return Err(Error::AlreadyCumulative);
        }

        let mut current = vec![[0.0; ENV_COUNT]; self.num_regions as usize];
        for idx in 0..self.pop.len() {
            if let (Some(e), r) = (env_index(self.env[idx]), self.region[idx]) {
                if r != NO_REGION {
                    current[r as usize][e] += self.pop[idx];
                }
            }
        }

        for idx in 0..self.pop.len() {
            let r = self.region[idx];
            if r == NO_REGION || r as usize >= targets_by_region.len() {
                continue;
            }
            if let Some(e) = env_index(self.env[idx]) {
                let have = current[r as usize][e];
                if have > 0.0 {
                    self.pop[idx] *= targets_by_region[r as usize][e] / have;
                }
            }
        }
        Ok(())
    }

    /// Prune the grid to cells within `max_radius_m` of any of `receivers`,
    /// cropping the hull and rescaling each `(environment, region)` stratum
    /// so its total is preserved.
    pub fn adjust_region(&mut self, receivers: &[GeoPoint], max_radius_m: f64) -> Result<()> {
        if self.cumulative {
            return Err(Error::AlreadyCumulative);
        }

        let mut before = vec![[0.0; ENV_COUNT]; self.num_regions as usize];
        for idx in 0..self.pop.len() {
            if let (Some(e), r) = (env_index(self.env[idx]), self.region[idx]) {
                if r != NO_REGION {
                    before[r as usize][e] += self.pop[idx];
                }
            }
        }

        // Cheap per-receiver prefilter rectangles.
        let boxes: Vec<LatLonBounds> = receivers
            .iter()
            .map(|rx| LatLonBounds::from_point(*rx).expanded_by_m(max_radius_m))
            .collect();

        let mut keep = vec![false; self.pop.len()];
        let (mut i_min, mut i_max, mut j_min, mut j_max) =
            (usize::MAX, 0usize, usize::MAX, 0usize);
        for i in 0..self.n_lat {
            for j in 0..self.n_lon {
                let center = self.cell_center(i, j);
                let near = receivers.iter().zip(&boxes).any(|(rx, b)| {
                    b.contains(center) && rx.distance_m(&center) <= max_radius_m
                });
                if near {
                    keep[i * self.n_lon + j] = true;
                    i_min = i_min.min(i);
                    i_max = i_max.max(i);
                    j_min = j_min.min(j);
                    j_max = j_max.max(j);
                }
            }
        }
        if i_min == usize::MAX {
            return Err(Error::EmptyGrid);
        }

        let new_n_lat = i_max - i_min + 1;
        let new_n_lon = j_max - j_min + 1;
        let mut pop = vec![0.0; new_n_lat * new_n_lon];
        let mut env = vec![PropEnv::Undefined; new_n_lat * new_n_lon];
        let mut region = vec![NO_REGION; new_n_lat * new_n_lon];
        let mut after = vec![[0.0; ENV_COUNT]; self.num_regions as usize];

        for i in 0..new_n_lat {
            for j in 0..new_n_lon {
                let old = (i + i_min) * self.n_lon + (j + j_min);
                if !keep[old] {
                    continue;
                }
                let new = i * new_n_lon + j;
                pop[new] = self.pop[old];
                env[new] = self.env[old];
                region[new] = self.region[old];
                if let (Some(e), r) = (env_index(self.env[old]), self.region[old]) {
                    if r != NO_REGION {
                        after[r as usize][e] += self.pop[old];
                    }
                }
            }
        }

        // Preserve stratum totals across the prune.
        for idx in 0..pop.len() {
            let r = region[idx];
            if r == NO_REGION {
                continue;
            }
            if let Some(e) = env_index(env[idx]) {
                let kept = after[r as usize][e];
                if kept > 0.0 {
                    pop[idx] *= before[r as usize][e] / kept;
                }
            }
        }

        self.min_lat_deg += i_min as f64 * self.delta_lat_deg;
        self.min_lon_deg = normalize_lon(self.min_lon_deg + j_min as f64 * self.delta_lon_deg);
        self.n_lat = new_n_lat;
        self.n_lon = new_n_lon;
        self.pop = pop;
        self.env = env;
        self.region = region;
        Ok(())
    }

    /// Flip the grid into a row-major CDF. One-shot and irreversible within
    /// the instance.
    pub fn make_cdf(&mut self) -> Result<()> {
        if self.cumulative {
            return Err(Error::AlreadyCumulative);
        }
        let mut running = 0.0;
        for p in &mut self.pop {
            running += *p;
            *p = running;
        }
        self.cumulative = true;
        Ok(())
    }

    /// The probability mass of cell `(i, j)` under the CDF.
    pub fn prob_from_cdf(&self, i: usize, j: usize) -> Result<f64> {
        let total = self.total_population();
        if total <= 0.0 {
            return Ok(0.0);
        }
        Ok(self.pop_from_cdf(i, j)? / total)
    }

    /// The original population of cell `(i, j)`, recovered from the CDF by
    /// first difference.
    pub fn pop_from_cdf(&self, i: usize, j: usize) -> Result<f64> {
        if !self.cumulative {
            return Err(Error::NotCumulative);
        }
        let idx = i * self.n_lon + j;
        let prev = if idx == 0 { 0.0 } else { self.pop[idx - 1] };
        Ok(self.pop[idx] - prev)
    }
}

/// Area of the spherical cell of `dlat` x `dlon` degrees centered at `lat`.
fn spherical_cell_area_m2(lat_deg: f64, dlat_deg: f64, dlon_deg: f64) -> f64 {
    let lat_top = (lat_deg + dlat_deg / 2.0).to_radians();
    let lat_bottom = (lat_deg - dlat_deg / 2.0).to_radians();
    EARTH_RADIUS_M * EARTH_RADIUS_M * dlon_deg.to_radians() * (lat_top.sin() - lat_bottom.sin())
}

fn normalize_lon(lon_deg: f64) -> f64 {
    let mut lon = lon_deg;
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::dataset::GeoTiffDataset;
    use crate::test_util::write_geotiff;
    use float_cmp::assert_approx_eq;

    fn world_polygon() -> IntPolygon {
        // A region polygon covering the whole test window, at 1e-6 degrees.
        IntPolygon::from_vertices(vec![
            (-180_000_000, -90_000_000),
            (180_000_000, -90_000_000),
            (180_000_000, 90_000_000),
            (-180_000_000, 90_000_000),
        ])
        .unwrap()
    }

    fn world_dataset(dir: &std::path::Path, density: impl Fn(usize, usize) -> f32) -> GeoTiffDataset {
        // 36x18 world raster at 10 degrees per pixel.
        let mut data = vec![0.0f32; 36 * 18];
        for (idx, v) in data.iter_mut().enumerate() {
            *v = density(idx / 36, idx % 36);
        }
        let path = dir.join("world.tif");
        write_geotiff(&path, -180.0, 90.0, 10.0, 36, 18, None, &data);
        GeoTiffDataset::open(&path).unwrap()
    }

    #[test]
    fn test_world_clip_and_classification() {
        let dir = tempfile::tempdir().unwrap();
        // Northern hemisphere dense, southern sparse.
        let mut ds = world_dataset(dir.path(), |row, _| if row < 9 { 600.0 } else { 0.0 });

        let window = LatLonBounds {
            min_latitude_deg: -30.0,
            min_longitude_deg: -30.0,
            max_latitude_deg: 30.0,
            max_longitude_deg: 30.0,
        };
        let grid =
            PopulationGrid::from_world_geotiff(&mut ds, window, &[world_polygon()], 1.0e-6)
                .unwrap();

        assert_eq!(grid.n_lat(), 6);
        assert_eq!(grid.n_lon(), 6);
        assert_eq!(grid.env_at(25.0, 5.0), PropEnv::Urban);
        assert_eq!(grid.env_at(-25.0, 5.0), PropEnv::Barren);
        assert_eq!(grid.env_at(75.0, 5.0), PropEnv::Undefined);
        assert!(grid.population_at(25.0, 5.0).unwrap() > 0.0);
        assert_approx_eq!(f64, grid.population_at(-25.0, 5.0).unwrap(), 0.0, epsilon = 1.0);
    }

    #[test]
    fn test_non_world_raster_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.tif");
        write_geotiff(&path, -10.0, 10.0, 1.0, 20, 20, None, &vec![1.0f32; 400]);
        let mut ds = GeoTiffDataset::open(&path).unwrap();

        let window = LatLonBounds {
            min_latitude_deg: -5.0,
            min_longitude_deg: -5.0,
            max_latitude_deg: 5.0,
            max_longitude_deg: 5.0,
        };
        assert!(matches!(
            PopulationGrid::from_world_geotiff(&mut ds, window, &[world_polygon()], 1.0e-6),
            Err(Error::NotWorldRaster)
        ));
    }

    #[test]
    fn test_tabular_grid_and_off_grid_detection() {
        let records = vec![
            (30.0, -100.0, 600.0),
            (30.0, -99.9, 300.0),
            (30.1, -100.0, 100.0),
            (30.1, -99.9, 0.0),
        ];
        let grid = PopulationGrid::from_density_records(
            30.0, -100.0, 0.1, 0.1, 2, 2, records,
        )
        .unwrap();
        assert_eq!(grid.env_at(30.0, -100.0), PropEnv::Urban);
        assert_eq!(grid.env_at(30.0, -99.9), PropEnv::Suburban);
        assert_eq!(grid.env_at(30.1, -100.0), PropEnv::Rural);
        assert_eq!(grid.env_at(30.1, -99.9), PropEnv::Barren);

        // A row 30% of a cell off the lattice is fatal.
        assert!(matches!(
            PopulationGrid::from_density_records(
                30.0,
                -100.0,
                0.1,
                0.1,
                2,
                2,
                vec![(30.03, -100.0, 10.0)],
            ),
            Err(Error::OffGridSample { .. })
        ));
    }

    #[test]
    fn test_scale_preserves_relative_shape() {
        let records = vec![
            (30.0, -100.0, 600.0),
            (30.0, -99.9, 700.0),
            (30.1, -100.0, 100.0),
            (30.1, -99.9, 250.0),
        ];
        let mut grid = PopulationGrid::from_density_records(
            30.0, -100.0, 0.1, 0.1, 2, 2, records,
        )
        .unwrap();

        let urban_before: [f64; 2] = [
            grid.population_at(30.0, -100.0).unwrap(),
            grid.population_at(30.0, -99.9).unwrap(),
        ];
        grid.scale(&[[1000.0, 400.0, 50.0, 0.0]]).unwrap();

        // Stratum totals hit the targets within 0.1%.
        let urban = grid.population_in(PropEnv::Urban, 0);
        assert!((urban - 1000.0).abs() / 1000.0 < 1.0e-3);
        let suburban = grid.population_in(PropEnv::Suburban, 0);
        assert!((suburban - 400.0).abs() / 400.0 < 1.0e-3);
        let rural = grid.population_in(PropEnv::Rural, 0);
        assert!((rural - 50.0).abs() / 50.0 < 1.0e-3);

        // Relative shape within the stratum is untouched.
        let a = grid.population_at(30.0, -100.0).unwrap();
        let b = grid.population_at(30.0, -99.9).unwrap();
        assert_approx_eq!(
            f64,
            a / b,
            urban_before[0] / urban_before[1],
            epsilon = 1.0e-9
        );
    }

    #[test]
    fn test_cdf_round_trip() {
        let records = vec![
            (30.0, -100.0, 600.0),
            (30.0, -99.9, 700.0),
            (30.1, -100.0, 300.0),
            (30.1, -99.9, 10.0),
        ];
        let mut grid = PopulationGrid::from_density_records(
            30.0, -100.0, 0.1, 0.1, 2, 2, records,
        )
        .unwrap();

        let mut original = vec![];
        for i in 0..2 {
            for j in 0..2 {
                original.push(
                    grid.population_at(30.0 + i as f64 * 0.1, -100.0 + j as f64 * 0.1)
                        .unwrap(),
                );
            }
        }
        let total_before = grid.total_population();

        grid.make_cdf().unwrap();
        assert!(matches!(grid.make_cdf(), Err(Error::AlreadyCumulative)));
        assert_approx_eq!(f64, grid.total_population(), total_before, epsilon = 1.0e-9);

        let mut prob_sum = 0.0;
        for i in 0..2 {
            for j in 0..2 {
                let mass = grid.pop_from_cdf(i, j).unwrap();
                assert_approx_eq!(f64, mass, original[i * 2 + j], epsilon = 1.0e-9);
                prob_sum += grid.prob_from_cdf(i, j).unwrap();
            }
        }
        assert_approx_eq!(f64, prob_sum, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn test_adjust_region_crops_and_preserves_totals() {
        // 10x10 grid, uniform density; keep only the neighborhood of one
        // receiver at a corner.
        let mut records = vec![];
        for i in 0..10 {
            for j in 0..10 {
                records.push((30.0 + i as f64 * 0.1, -100.0 + j as f64 * 0.1, 600.0));
            }
        }
        let mut grid = PopulationGrid::from_density_records(
            30.0, -100.0, 0.1, 0.1, 10, 10, records,
        )
        .unwrap();

        let total_before = grid.population_in(PropEnv::Urban, 0);
        let rx = GeoPoint {
            latitude_deg: 30.0,
            longitude_deg: -100.0,
        };
        grid.adjust_region(&[rx], 25_000.0).unwrap();

        assert!(grid.n_lat() < 10 && grid.n_lon() < 10);
        let total_after = grid.population_in(PropEnv::Urban, 0);
        assert_approx_eq!(f64, total_after, total_before, epsilon = total_before * 1.0e-9);
    }
}

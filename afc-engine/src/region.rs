//!
//! RLAN uncertainty-region model.
//!
//! A region is an ellipse or polygon on the WGS-84 surface plus a height
//! range. Geometry runs in a local east/north tangent frame at the region
//! center, with the polygon variants quantized onto the fixed integer grid.
//! `configure` binds the region to terrain and must run before heights or
//! angles are queried.
//!

use afc_geo::point::{GeoPoint, Height, LatLonBounds, EARTH_RADIUS_M};
use afc_geo::polygon::{IntPolygon, ScanRaster};
use afc_geo::vec3::{self, Vec3};
use afc_terrain::terrain::TerrainStack;

use crate::result::{Error, InquiryError, Result};

/// Integer-grid resolution for polygon regions, in degrees per unit.
pub const POLYGON_RESOLUTION_DEG: f64 = 1.0e-6;

/// Upper bound on the number of footprint samples taken while binding a
/// region to terrain; the sweep coarsens beyond it.
const MAX_CONFIGURE_SCAN_POINTS: usize = 200_000;

/// How to enumerate scan points over the region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScanMethod {
    /// Step north and east at a fixed ground resolution.
    NorthEast { resolution_m: f64 },
    /// Step along the ellipse's own axes (falls back to north/east stepping
    /// for polygon regions).
    MajorMinor { resolution_m: f64 },
    /// Rasterize onto the global lat/lon grid at a fixed density and emit
    /// covered-cell centers; also reconstructs the swept-cell boundary.
    LatLonGrid { points_per_degree: f64 },
}

#[derive(Clone, Debug)]
enum Shape {
    Ellipse {
        semi_major_m: f64,
        semi_minor_m: f64,
        orientation_deg: f64,
        /// Canonical unit disc to east/north meters.
        to_en: [[f64; 2]; 2],
        /// East/north meters to the canonical unit disc.
        from_en: [[f64; 2]; 2],
        /// Quadratic-form metric: `p` is inside when `p' M p <= 1`.
        metric: [[f64; 2]; 2],
    },
    Polygon(IntPolygon),
}

#[derive(Clone, Copy, Debug)]
struct Configured {
    fixed_amsl: bool,
    center_terrain_m: f64,
    center_height_amsl_m: f64,
    min_terrain_m: f64,
    max_terrain_m: f64,
}

#[derive(Clone, Debug)]
struct ScanBoundary {
    /// Swept-cell boundary on the lat/lon grid, vertices in grid units.
    polygon: IntPolygon,
    resolution_deg: f64,
}

/// An RLAN uncertainty region bound to a height declaration.
#[derive(Clone, Debug)]
pub struct RlanRegion {
    center: GeoPoint,
    input_height: Height,
    height_uncertainty_m: f64,
    shape: Shape,
    configured: Option<Configured>,
    scan_boundary: Option<ScanBoundary>,
}

impl RlanRegion {
    /// An elliptical region; axes in meters, orientation of the major axis
    /// in degrees clockwise from true north.
    pub fn ellipse(
        center: GeoPoint,
        input_height: Height,
        height_uncertainty_m: f64,
        semi_minor_m: f64,
        semi_major_m: f64,
        orientation_deg: f64,
    ) -> Result<Self> {
        if semi_major_m <= 0.0 || semi_minor_m <= 0.0 {
            return Err(InquiryError::ZeroSizedRegion.into());
        }
        let theta = orientation_deg.to_radians();
        // Major axis unit vector in (east, north).
        let (me, mn) = (theta.sin(), theta.cos());
        // Minor axis: major rotated 90 degrees clockwise.
        let (ne, nn) = (mn, -me);
        let to_en = [
            [me * semi_major_m, ne * semi_minor_m],
            [mn * semi_major_m, nn * semi_minor_m],
        ];
        let det = to_en[0][0] * to_en[1][1] - to_en[0][1] * to_en[1][0];
        let from_en = [
            [to_en[1][1] / det, -to_en[0][1] / det],
            [-to_en[1][0] / det, to_en[0][0] / det],
        ];
        // M = from_en' from_en.
        let metric = [
            [
                from_en[0][0] * from_en[0][0] + from_en[1][0] * from_en[1][0],
                from_en[0][0] * from_en[0][1] + from_en[1][0] * from_en[1][1],
            ],
            [
                from_en[0][0] * from_en[0][1] + from_en[1][0] * from_en[1][1],
                from_en[0][1] * from_en[0][1] + from_en[1][1] * from_en[1][1],
            ],
        ];
        Ok(Self {
            center,
            input_height,
            height_uncertainty_m,
            shape: Shape::Ellipse {
                semi_major_m,
                semi_minor_m,
                orientation_deg,
                to_en,
                from_en,
                metric,
            },
            configured: None,
            scan_boundary: None,
        })
    }

    /// A polygon region from explicit vertices; the center is the vertex
    /// centroid.
    pub fn linear_polygon(
        vertices: &[GeoPoint],
        input_height: Height,
        height_uncertainty_m: f64,
    ) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(InquiryError::ZeroSizedRegion.into());
        }
        let center = GeoPoint {
            latitude_deg: vertices.iter().map(|v| v.latitude_deg).sum::<f64>()
                / vertices.len() as f64,
            longitude_deg: vertices.iter().map(|v| v.longitude_deg).sum::<f64>()
                / vertices.len() as f64,
        };
        let ring = vertices
            .iter()
            .map(|v| {
                (
                    (v.longitude_deg / POLYGON_RESOLUTION_DEG).round() as i64,
                    (v.latitude_deg / POLYGON_RESOLUTION_DEG).round() as i64,
                )
            })
            .collect();
        let polygon =
            IntPolygon::from_vertices(ring).map_err(|_| InquiryError::ZeroSizedRegion)?;
        Ok(Self {
            center,
            input_height,
            height_uncertainty_m,
            shape: Shape::Polygon(polygon),
            configured: None,
            scan_boundary: None,
        })
    }

    /// A polygon region from `(bearing from north, length)` vectors
    /// projected onto the local tangent plane around `center`.
    pub fn radial_polygon(
        center: GeoPoint,
        vectors: &[(f64, f64)],
        input_height: Height,
        height_uncertainty_m: f64,
    ) -> Result<Self> {
        if vectors.len() < 3 {
            return Err(InquiryError::ZeroSizedRegion.into());
        }
        let cos_lat = center.latitude_deg.to_radians().cos();
        let ring = vectors
            .iter()
            .map(|&(bearing_deg, length_m)| {
                let east = length_m * bearing_deg.to_radians().sin();
                let north = length_m * bearing_deg.to_radians().cos();
                let lon = center.longitude_deg
                    + (east / (EARTH_RADIUS_M * cos_lat)).to_degrees();
                let lat = center.latitude_deg + (north / EARTH_RADIUS_M).to_degrees();
                (
                    (lon / POLYGON_RESOLUTION_DEG).round() as i64,
                    (lat / POLYGON_RESOLUTION_DEG).round() as i64,
                )
            })
            .collect();
        let polygon =
            IntPolygon::from_vertices(ring).map_err(|_| InquiryError::ZeroSizedRegion)?;
        Ok(Self {
            center,
            input_height,
            height_uncertainty_m,
            shape: Shape::Polygon(polygon),
            configured: None,
            scan_boundary: None,
        })
    }

    /// The region center.
    pub fn center(&self) -> GeoPoint {
        self.center
    }

    /// Bind the region to terrain: resolve the center's AMSL height and
    /// sweep the footprint for its terrain extremes.
    pub fn configure(&mut self, terrain: &TerrainStack) -> Result<()> {
        let center_terrain_m = terrain
            .terrain_height(self.center.latitude_deg, self.center.longitude_deg, false)?
            .terrain_m;

        // Nominal 1 m ground sweep, coarsened only when the footprint is too
        // large to sample at that pitch.
        let mut resolution_m = 1.0;
        let footprint_m2 = self.footprint_area_m2();
        if footprint_m2 / (resolution_m * resolution_m) > MAX_CONFIGURE_SCAN_POINTS as f64 {
            resolution_m = (footprint_m2 / MAX_CONFIGURE_SCAN_POINTS as f64).sqrt();
        }

        let mut min_terrain_m = center_terrain_m;
        let mut max_terrain_m = center_terrain_m;
        for point in self.scan_ground(resolution_m) {
            let height = terrain
                .terrain_height(point.latitude_deg, point.longitude_deg, false)?
                .terrain_m;
            min_terrain_m = min_terrain_m.min(height);
            max_terrain_m = max_terrain_m.max(height);
        }

        self.configured = Some(Configured {
            fixed_amsl: matches!(self.input_height, Height::Amsl(_)),
            center_terrain_m,
            center_height_amsl_m: self.input_height.to_amsl(center_terrain_m),
            min_terrain_m,
            max_terrain_m,
        });
        Ok(())
    }

    fn state(&self) -> Result<&Configured> {
        self.configured.as_ref().ok_or(Error::RegionNotConfigured)
    }

    /// Lowest point of the uncertainty volume, meters AMSL.
    pub fn min_height_amsl(&self) -> Result<f64> {
        let s = self.state()?;
        if s.fixed_amsl {
            Ok(s.center_height_amsl_m - self.height_uncertainty_m)
        } else {
            Ok(self.min_height_agl()? + s.min_terrain_m)
        }
    }

    /// Highest point of the uncertainty volume, meters AMSL.
    pub fn max_height_amsl(&self) -> Result<f64> {
        let s = self.state()?;
        if s.fixed_amsl {
            Ok(s.center_height_amsl_m + self.height_uncertainty_m)
        } else {
            Ok(self.max_height_agl()? + s.max_terrain_m)
        }
    }

    /// Lowest height above ground anywhere over the footprint.
    pub fn min_height_agl(&self) -> Result<f64> {
        let s = self.state()?;
        if s.fixed_amsl {
            Ok(s.center_height_amsl_m - self.height_uncertainty_m - s.max_terrain_m)
        } else {
            Ok(s.center_height_amsl_m - self.height_uncertainty_m - s.center_terrain_m)
        }
    }

    /// Highest height above ground anywhere over the footprint.
    pub fn max_height_agl(&self) -> Result<f64> {
        let s = self.state()?;
        if s.fixed_amsl {
            Ok(s.center_height_amsl_m + self.height_uncertainty_m - s.min_terrain_m)
        } else {
            Ok(s.center_height_amsl_m + self.height_uncertainty_m - s.center_terrain_m)
        }
    }

    /// The center's resolved height, meters AMSL.
    pub fn center_height_amsl(&self) -> Result<f64> {
        Ok(self.state()?.center_height_amsl_m)
    }

    /// Whether the position lies inside the region footprint (boundary
    /// included).
    pub fn contains(&self, point: GeoPoint) -> bool {
        match &self.shape {
            Shape::Ellipse { metric, .. } => {
                let (e, n) = self.en_of(point);
                let q = metric[0][0] * e * e
                    + 2.0 * metric[0][1] * e * n
                    + metric[1][1] * n * n;
                q <= 1.0 + 1.0e-12
            }
            Shape::Polygon(polygon) => {
                let q = (
                    (point.longitude_deg / POLYGON_RESOLUTION_DEG).round() as i64,
                    (point.latitude_deg / POLYGON_RESOLUTION_DEG).round() as i64,
                );
                let c = polygon.contains(q);
                c.inside || c.edge
            }
        }
    }

    /// The point of the region closest to `point`; `point` itself when it is
    /// inside.
    pub fn closest_point(&self, point: GeoPoint) -> GeoPoint {
        match &self.shape {
            Shape::Ellipse { to_en, from_en, .. } => {
                let (e, n) = self.en_of(point);
                let u = from_en[0][0] * e + from_en[0][1] * n;
                let v = from_en[1][0] * e + from_en[1][1] * n;
                let r = (u * u + v * v).sqrt();
                if r <= 1.0 {
                    return point;
                }
                let (u, v) = (u / r, v / r);
                let be = to_en[0][0] * u + to_en[0][1] * v;
                let bn = to_en[1][0] * u + to_en[1][1] * v;
                self.point_at_en(be, bn)
            }
            Shape::Polygon(polygon) => {
                let q = (
                    point.longitude_deg / POLYGON_RESOLUTION_DEG,
                    point.latitude_deg / POLYGON_RESOLUTION_DEG,
                );
                let c = polygon.contains((q.0.round() as i64, q.1.round() as i64));
                if c.inside || c.edge {
                    return point;
                }
                let (x, y) = polygon.closest_boundary_point(q);
                GeoPoint {
                    latitude_deg: y * POLYGON_RESOLUTION_DEG,
                    longitude_deg: x * POLYGON_RESOLUTION_DEG,
                }
            }
        }
    }

    /// Greatest distance from the center to any point of the region.
    pub fn max_distance_m(&self) -> f64 {
        match &self.shape {
            Shape::Ellipse { semi_major_m, .. } => *semi_major_m,
            Shape::Polygon(polygon) => polygon
                .rings()
                .iter()
                .flatten()
                .map(|&(x, y)| {
                    self.center.distance_m(&GeoPoint {
                        latitude_deg: y as f64 * POLYGON_RESOLUTION_DEG,
                        longitude_deg: x as f64 * POLYGON_RESOLUTION_DEG,
                    })
                })
                .fold(0.0, f64::max),
        }
    }

    /// The region's footprint rectangle.
    pub fn bound_rect(&self) -> LatLonBounds {
        match &self.shape {
            Shape::Ellipse {
                semi_major_m,
                semi_minor_m,
                orientation_deg,
                ..
            } => {
                let theta = orientation_deg.to_radians();
                let extent_e = ((semi_major_m * theta.sin()).powi(2)
                    + (semi_minor_m * theta.cos()).powi(2))
                .sqrt();
                let extent_n = ((semi_major_m * theta.cos()).powi(2)
                    + (semi_minor_m * theta.sin()).powi(2))
                .sqrt();
                let p0 = self.point_at_en(-extent_e, -extent_n);
                let p1 = self.point_at_en(extent_e, extent_n);
                LatLonBounds {
                    min_latitude_deg: p0.latitude_deg,
                    min_longitude_deg: p0.longitude_deg,
                    max_latitude_deg: p1.latitude_deg,
                    max_longitude_deg: p1.longitude_deg,
                }
            }
            Shape::Polygon(polygon) => {
                let (min, max) = polygon.bounding_box();
                LatLonBounds {
                    min_latitude_deg: min.1 as f64 * POLYGON_RESOLUTION_DEG,
                    min_longitude_deg: min.0 as f64 * POLYGON_RESOLUTION_DEG,
                    max_latitude_deg: max.1 as f64 * POLYGON_RESOLUTION_DEG,
                    max_longitude_deg: max.0 as f64 * POLYGON_RESOLUTION_DEG,
                }
            }
        }
    }

    /// Enumerate sample points over the footprint. The lat/lon-grid method
    /// additionally reconstructs the swept-cell boundary used by later
    /// boresight queries.
    pub fn scan(&mut self, method: ScanMethod) -> Result<Vec<GeoPoint>> {
        match method {
            ScanMethod::NorthEast { resolution_m } => {
                self.scan_boundary = None;
                Ok(self.scan_ground(resolution_m))
            }
            ScanMethod::MajorMinor { resolution_m } => {
                self.scan_boundary = None;
                Ok(self.scan_major_minor(resolution_m))
            }
            ScanMethod::LatLonGrid { points_per_degree } => {
                self.scan_lat_lon_grid(points_per_degree)
            }
        }
    }

    /// North/east-aligned enumeration of the enclosing rectangle, keeping
    /// contained points.
    fn scan_ground(&self, resolution_m: f64) -> Vec<GeoPoint> {
        let resolution_m = resolution_m.max(0.01);
        let dlat = (resolution_m / EARTH_RADIUS_M).to_degrees();
        let dlon = dlat / self.center.latitude_deg.to_radians().cos();
        let rect = self.bound_rect();

        let mut points = Vec::new();
        let n_lat = ((rect.max_latitude_deg - rect.min_latitude_deg) / dlat).ceil() as i64;
        let n_lon = ((rect.max_longitude_deg - rect.min_longitude_deg) / dlon).ceil() as i64;
        for i in 0..=n_lat {
            let lat = rect.min_latitude_deg + i as f64 * dlat;
            for j in 0..=n_lon {
                let lon = rect.min_longitude_deg + j as f64 * dlon;
                let p = GeoPoint {
                    latitude_deg: lat,
                    longitude_deg: lon,
                };
                if self.contains(p) {
                    points.push(p);
                }
            }
        }
        points
    }

    /// Ellipse-axis-aligned enumeration; rows and columns land on radial
    /// fractions of the canonical disc.
    fn scan_major_minor(&self, resolution_m: f64) -> Vec<GeoPoint> {
        let (to_en, a, b) = match &self.shape {
            Shape::Ellipse {
                to_en,
                semi_major_m,
                semi_minor_m,
                ..
            } => (to_en, *semi_major_m, *semi_minor_m),
            Shape::Polygon(_) => return self.scan_ground(resolution_m),
        };

        let resolution_m = resolution_m.max(0.01);
        let du = resolution_m / a;
        let dv = resolution_m / b;
        let mut points = Vec::new();
        let nu = (1.0 / du).ceil() as i64;
        let nv = (1.0 / dv).ceil() as i64;
        for i in -nu..=nu {
            let u = i as f64 * du;
            for j in -nv..=nv {
                let v = j as f64 * dv;
                if u * u + v * v > 1.0 {
                    continue;
                }
                let e = to_en[0][0] * u + to_en[0][1] * v;
                let n = to_en[1][0] * u + to_en[1][1] * v;
                points.push(self.point_at_en(e, n));
            }
        }
        points
    }

    /// Rasterize onto the global lat/lon lattice: sweep every grid row and
    /// column across the footprint, cover the swept cells, and emit centers.
    fn scan_lat_lon_grid(&mut self, points_per_degree: f64) -> Result<Vec<GeoPoint>> {
        let res = 1.0 / points_per_degree.max(1.0);
        let rect = self.bound_rect();
        let ix0 = (rect.min_longitude_deg / res).floor() as i64;
        let iy0 = (rect.min_latitude_deg / res).floor() as i64;
        let nx = ((rect.max_longitude_deg / res).ceil() as i64 - ix0).max(1) as usize + 1;
        let ny = ((rect.max_latitude_deg / res).ceil() as i64 - iy0).max(1) as usize + 1;

        let mut raster = ScanRaster::new(nx, ny);
        // Row sweeps: the horizontal extent of the footprint at each row of
        // cell centers.
        for iy in 0..ny {
            let lat = (iy0 + iy as i64) as f64 * res + res / 2.0;
            if let Some((lon_min, lon_max)) = self.extent_at_latitude(lat) {
                let j0 = ((lon_min / res).floor() as i64 - ix0).max(0) as usize;
                let j1 = ((lon_max / res).floor() as i64 - ix0).min(nx as i64 - 1);
                for j in j0..=j1.max(0) as usize {
                    raster.set(j, iy);
                }
            }
        }
        // Column sweeps, symmetrically.
        for ix in 0..nx {
            let lon = (ix0 + ix as i64) as f64 * res + res / 2.0;
            if let Some((lat_min, lat_max)) = self.extent_at_longitude(lon) {
                let i0 = ((lat_min / res).floor() as i64 - iy0).max(0) as usize;
                let i1 = ((lat_max / res).floor() as i64 - iy0).min(ny as i64 - 1);
                for i in i0..=i1.max(0) as usize {
                    raster.set(ix, i);
                }
            }
        }

        if raster.covered_count() == 0 {
            return Err(InquiryError::ZeroSizedRegion.into());
        }

        let mut boundary = IntPolygon::from_scan_raster(&raster)?;
        boundary.translate(ix0, iy0);
        self.scan_boundary = Some(ScanBoundary {
            polygon: boundary,
            resolution_deg: res,
        });

        let mut points = Vec::new();
        for iy in 0..ny {
            for ix in 0..nx {
                if raster.get(ix, iy) {
                    points.push(GeoPoint {
                        latitude_deg: (iy0 + iy as i64) as f64 * res + res / 2.0,
                        longitude_deg: (ix0 + ix as i64) as f64 * res + res / 2.0,
                    });
                }
            }
        }
        Ok(points)
    }

    /// Longitude extent of the footprint at a latitude.
    fn extent_at_latitude(&self, latitude_deg: f64) -> Option<(f64, f64)> {
        match &self.shape {
            Shape::Ellipse { metric, .. } => {
                let n = (latitude_deg - self.center.latitude_deg).to_radians() * EARTH_RADIUS_M;
                // Solve M00 e^2 + 2 M01 e n + M11 n^2 = 1 for e.
                let a = metric[0][0];
                let b = 2.0 * metric[0][1] * n;
                let c = metric[1][1] * n * n - 1.0;
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    return None;
                }
                let e0 = (-b - disc.sqrt()) / (2.0 * a);
                let e1 = (-b + disc.sqrt()) / (2.0 * a);
                let cos_lat = self.center.latitude_deg.to_radians().cos();
                let lon0 = self.center.longitude_deg
                    + (e0 / (EARTH_RADIUS_M * cos_lat)).to_degrees();
                let lon1 = self.center.longitude_deg
                    + (e1 / (EARTH_RADIUS_M * cos_lat)).to_degrees();
                Some((lon0, lon1))
            }
            Shape::Polygon(polygon) => {
                let y = (latitude_deg / POLYGON_RESOLUTION_DEG).round() as i64;
                polygon
                    .horizontal_extent(y)
                    .map(|(x0, x1)| (x0 * POLYGON_RESOLUTION_DEG, x1 * POLYGON_RESOLUTION_DEG))
            }
        }
    }

    /// Latitude extent of the footprint at a longitude.
    fn extent_at_longitude(&self, longitude_deg: f64) -> Option<(f64, f64)> {
        match &self.shape {
            Shape::Ellipse { metric, .. } => {
                let cos_lat = self.center.latitude_deg.to_radians().cos();
                let e = (longitude_deg - self.center.longitude_deg).to_radians()
                    * EARTH_RADIUS_M
                    * cos_lat;
                let a = metric[1][1];
                let b = 2.0 * metric[0][1] * e;
                let c = metric[0][0] * e * e - 1.0;
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    return None;
                }
                let n0 = (-b - disc.sqrt()) / (2.0 * a);
                let n1 = (-b + disc.sqrt()) / (2.0 * a);
                let lat0 = self.center.latitude_deg + (n0 / EARTH_RADIUS_M).to_degrees();
                let lat1 = self.center.latitude_deg + (n1 / EARTH_RADIUS_M).to_degrees();
                Some((lat0, lat1))
            }
            Shape::Polygon(polygon) => {
                let x = (longitude_deg / POLYGON_RESOLUTION_DEG).round() as i64;
                polygon
                    .vertical_extent(x)
                    .map(|(y0, y1)| (y0 * POLYGON_RESOLUTION_DEG, y1 * POLYGON_RESOLUTION_DEG))
            }
        }
    }

    /// Boundary vertices lifted to AMSL: a 32-vertex polar sweep for an
    /// ellipse, the polygon vertices otherwise. With a fixed-AMSL height the
    /// lift is the center height; otherwise each vertex rides its local
    /// terrain.
    pub fn boundary(&self, terrain: &TerrainStack) -> Result<Vec<(GeoPoint, f64)>> {
        let s = *self.state()?;
        let ground: Vec<GeoPoint> = match &self.shape {
            Shape::Ellipse { to_en, .. } => (0..32)
                .map(|k| {
                    let phi = k as f64 * std::f64::consts::TAU / 32.0;
                    let (u, v) = (phi.cos(), phi.sin());
                    let e = to_en[0][0] * u + to_en[0][1] * v;
                    let n = to_en[1][0] * u + to_en[1][1] * v;
                    self.point_at_en(e, n)
                })
                .collect(),
            Shape::Polygon(polygon) => polygon
                .rings()
                .iter()
                .flatten()
                .map(|&(x, y)| GeoPoint {
                    latitude_deg: y as f64 * POLYGON_RESOLUTION_DEG,
                    longitude_deg: x as f64 * POLYGON_RESOLUTION_DEG,
                })
                .collect(),
        };

        let mut out = Vec::with_capacity(ground.len());
        for p in ground {
            let height_amsl = if s.fixed_amsl {
                s.center_height_amsl_m
            } else {
                let local = terrain
                    .terrain_height(p.latitude_deg, p.longitude_deg, false)?
                    .terrain_m;
                s.center_height_amsl_m - s.center_terrain_m + local
            };
            out.push((p, height_amsl));
        }
        Ok(out)
    }

    /// East/north meters of a point of the region volume, for assembling
    /// pointing vectors in the region's frame. `height_amsl` becomes the up
    /// component directly.
    pub fn enu_of(&self, point: GeoPoint, height_amsl_m: f64) -> Vec3 {
        let (e, n) = self.en_of(point);
        [e, n, height_amsl_m]
    }

    /// Smallest angle between the FS antenna boresight and any ray from the
    /// FS receiver into the region's uncertainty volume, in degrees.
    ///
    /// The volume is the most recent scan boundary (or the region boundary
    /// when no grid scan ran) swept between the min and max AMSL heights.
    /// Inside the boresight cone the answer is exactly zero; otherwise each
    /// boundary edge is minimized analytically in its edge parameter.
    pub fn min_aob_deg(
        &self,
        fs_position: GeoPoint,
        fs_height_amsl_m: f64,
        pointing: Vec3,
    ) -> Result<f64> {
        let h_min = self.min_height_amsl()?;
        let h_max = self.max_height_amsl()?;
        let f = self.enu_of(fs_position, fs_height_amsl_m);
        let d = vec3::normalize(pointing);

        let ring = self.boundary_en()?;

        // Boresight-ray test: where the ray crosses the slab of region
        // heights, does its ground track touch the footprint polygon?
        if let Some((p0, p1)) = slab_crossing(f, d, h_min, h_max) {
            if self.ground_track_hits(&ring, p0, p1) {
                return Ok(0.0);
            }
        }

        let mut max_cos = -1.0f64;
        let mut consider = |a: Vec3, b: Vec3| {
            for epsilon in edge_candidates(f, d, a, b) {
                let p = vec3::add(a, vec3::scale(vec3::sub(b, a), epsilon));
                let r = vec3::sub(p, f);
                let norm = vec3::norm(r);
                if norm > 0.0 {
                    max_cos = max_cos.max(vec3::dot(d, r) / norm);
                }
            }
        };

        let n = ring.len();
        for i in 0..n {
            let (ax, ay) = ring[i];
            let (bx, by) = ring[(i + 1) % n];
            // Top and bottom edges of the swept volume.
            consider([ax, ay, h_min], [bx, by, h_min]);
            consider([ax, ay, h_max], [bx, by, h_max]);
            // The vertical edge at each vertex.
            consider([ax, ay, h_min], [ax, ay, h_max]);
        }

        Ok(max_cos.clamp(-1.0, 1.0).acos().to_degrees())
    }

    /// The boundary ring in east/north meters: the latest grid-scan boundary
    /// when one exists, the shape boundary otherwise.
    fn boundary_en(&self) -> Result<Vec<(f64, f64)>> {
        if let Some(scan) = &self.scan_boundary {
            let ring = scan
                .polygon
                .rings()
                .iter()
                .flatten()
                .map(|&(x, y)| {
                    self.en_of(GeoPoint {
                        latitude_deg: y as f64 * scan.resolution_deg,
                        longitude_deg: x as f64 * scan.resolution_deg,
                    })
                })
                .collect();
            return Ok(ring);
        }

        match &self.shape {
            Shape::Ellipse { to_en, .. } => Ok((0..32)
                .map(|k| {
                    let phi = k as f64 * std::f64::consts::TAU / 32.0;
                    let (u, v) = (phi.cos(), phi.sin());
                    (
                        to_en[0][0] * u + to_en[0][1] * v,
                        to_en[1][0] * u + to_en[1][1] * v,
                    )
                })
                .collect()),
            Shape::Polygon(polygon) => Ok(polygon
                .rings()
                .iter()
                .flatten()
                .map(|&(x, y)| {
                    self.en_of(GeoPoint {
                        latitude_deg: y as f64 * POLYGON_RESOLUTION_DEG,
                        longitude_deg: x as f64 * POLYGON_RESOLUTION_DEG,
                    })
                })
                .collect()),
        }
    }

    /// Whether the ground segment `p0`..`p1` touches the footprint ring:
    /// either endpoint inside, or the segment crossing any edge.
    fn ground_track_hits(&self, ring: &[(f64, f64)], p0: (f64, f64), p1: (f64, f64)) -> bool {
        if point_in_ring(ring, p0) || point_in_ring(ring, p1) {
            return true;
        }
        let n = ring.len();
        (0..n).any(|i| segments_cross(p0, p1, ring[i], ring[(i + 1) % n]))
    }

    /// Footprint area in square meters, for sizing the configure sweep.
    fn footprint_area_m2(&self) -> f64 {
        match &self.shape {
            Shape::Ellipse {
                semi_major_m,
                semi_minor_m,
                ..
            } => std::f64::consts::PI * semi_major_m * semi_minor_m,
            Shape::Polygon(polygon) => {
                let grid_area = polygon.signed_area().abs();
                let cos_lat = self.center.latitude_deg.to_radians().cos();
                let unit_m = POLYGON_RESOLUTION_DEG.to_radians() * EARTH_RADIUS_M;
                grid_area * unit_m * unit_m * cos_lat
            }
        }
    }

    fn en_of(&self, point: GeoPoint) -> (f64, f64) {
        let cos_lat = self.center.latitude_deg.to_radians().cos();
        (
            (point.longitude_deg - self.center.longitude_deg).to_radians()
                * EARTH_RADIUS_M
                * cos_lat,
            (point.latitude_deg - self.center.latitude_deg).to_radians() * EARTH_RADIUS_M,
        )
    }

    fn point_at_en(&self, east_m: f64, north_m: f64) -> GeoPoint {
        let cos_lat = self.center.latitude_deg.to_radians().cos();
        GeoPoint {
            latitude_deg: self.center.latitude_deg + (north_m / EARTH_RADIUS_M).to_degrees(),
            longitude_deg: self.center.longitude_deg
                + (east_m / (EARTH_RADIUS_M * cos_lat)).to_degrees(),
        }
    }
}

/// Where the ray `f + t d` (t >= 0) traverses the height slab
/// `[h_min, h_max]`, as the ground points at the slab entry and exit.
fn slab_crossing(f: Vec3, d: Vec3, h_min: f64, h_max: f64) -> Option<((f64, f64), (f64, f64))> {
    let ground = |t: f64| (f[0] + t * d[0], f[1] + t * d[1]);
    if d[2].abs() < 1.0e-12 {
        // Level ray: inside the slab or not at all.
        if f[2] >= h_min && f[2] <= h_max {
            // Far enough to cross any practical footprint.
            return Some((ground(0.0), ground(1.0e7)));
        }
        return None;
    }
    let t0 = (h_min - f[2]) / d[2];
    let t1 = (h_max - f[2]) / d[2];
    let (t_enter, t_exit) = (t0.min(t1), t0.max(t1));
    if t_exit < 0.0 {
        return None;
    }
    Some((ground(t_enter.max(0.0)), ground(t_exit)))
}

/// Candidate edge parameters for minimizing the angle to the boresight: the
/// two vertices plus the interior critical point when it falls in (0, 1).
fn edge_candidates(f: Vec3, d: Vec3, a: Vec3, b: Vec3) -> Vec<f64> {
    let af = vec3::sub(a, f);
    let ab = vec3::sub(b, a);
    let c0 = vec3::dot(d, af);
    let c1 = vec3::dot(d, ab);
    let d0 = vec3::dot(af, af);
    let d1 = 2.0 * vec3::dot(af, ab);
    let d2 = vec3::dot(ab, ab);

    let mut candidates = vec![0.0, 1.0];
    let denominator = c0 * d2 - c1 * d1 / 2.0;
    if denominator.abs() > 1.0e-300 {
        let epsilon = (c1 * d0 - c0 * d1 / 2.0) / denominator;
        if epsilon > 0.0 && epsilon < 1.0 {
            candidates.push(epsilon);
        }
    }
    candidates
}

fn point_in_ring(ring: &[(f64, f64)], p: (f64, f64)) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        if (y0 > p.1) != (y1 > p.1) {
            let x_int = x0 + (p.1 - y0) * (x1 - x0) / (y1 - y0);
            if x_int > p.0 {
                inside = !inside;
            }
        }
    }
    inside
}

fn segments_cross(a0: (f64, f64), a1: (f64, f64), b0: (f64, f64), b1: (f64, f64)) -> bool {
    let orient = |p: (f64, f64), q: (f64, f64), r: (f64, f64)| {
        (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
    };
    let d0 = orient(a0, a1, b0);
    let d1 = orient(a0, a1, b1);
    let d2 = orient(b0, b1, a0);
    let d3 = orient(b0, b1, a1);
    (d0 * d1 < 0.0) && (d2 * d3 < 0.0)
}

//!
//! Integer-grid polygons.
//!
//! Vertices are `(x, y)` pairs at a fixed fraction of a degree, which keeps
//! containment and area computations exact. Rings are cyclic: the closing
//! edge from the last vertex back to the first is implicit and the duplicate
//! closing vertex is dropped on construction.
//!

use crate::result::{Error, Result};

/// A vertex on the integer grid.
pub type IntPoint = (i64, i64);

/// The relationship of a query point to a polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Containment {
    /// The point is strictly interior.
    pub inside: bool,
    /// The point lies exactly on an edge or vertex. When set, `inside` is
    /// false; callers decide whether to treat edges as inside.
    pub edge: bool,
}

/// A polygon of one or more closed integer-grid rings.
#[derive(Clone, Debug, PartialEq)]
pub struct IntPolygon {
    rings: Vec<Vec<IntPoint>>,
}

impl IntPolygon {
    /// Build a polygon from explicit rings. Consecutive duplicate vertices
    /// (including a repeated closing vertex) are dropped; every ring must
    /// retain at least three distinct vertices.
    pub fn new(rings: Vec<Vec<IntPoint>>) -> Result<Self> {
        let mut cleaned = Vec::with_capacity(rings.len());
        for ring in rings {
            let mut vertices: Vec<IntPoint> = Vec::with_capacity(ring.len());
            for v in ring {
                if vertices.last() != Some(&v) {
                    vertices.push(v);
                }
            }
            while vertices.len() > 1 && vertices.first() == vertices.last() {
                vertices.pop();
            }
            if vertices.len() < 3 {
                return Err(Error::DegeneratePolygon);
            }
            cleaned.push(vertices);
        }
        if cleaned.is_empty() {
            return Err(Error::DegeneratePolygon);
        }
        Ok(Self { rings: cleaned })
    }

    /// Build a single-ring polygon from a vertex list.
    pub fn from_vertices(vertices: Vec<IntPoint>) -> Result<Self> {
        Self::new(vec![vertices])
    }

    /// Build a polygon from a KML placemark string.
    ///
    /// Extracts `<Placemark>`, then every `<Polygon>` (a `MultiGeometry` of
    /// outer boundaries yields one ring each), takes each polygon's
    /// `<outerBoundaryIs>`/`<coordinates>` text, tokenizes the
    /// whitespace-separated `lon,lat[,h]` triples, and quantizes to the grid
    /// at `resolution_deg` degrees per grid unit.
    pub fn from_kml_placemark(kml: &str, resolution_deg: f64) -> Result<Self> {
        let (placemark, _) =
            find_element(kml, "Placemark").ok_or(Error::KmlMissingElement("Placemark"))?;

        let mut rings = Vec::new();
        let mut rest = placemark;
        while let Some((polygon, after)) = find_element(rest, "Polygon") {
            let (outer, _) = find_element(polygon, "outerBoundaryIs")
                .ok_or(Error::KmlMissingElement("outerBoundaryIs"))?;
            let (coordinates, _) = find_element(outer, "coordinates")
                .ok_or(Error::KmlMissingElement("coordinates"))?;

            let mut ring = Vec::new();
            for token in coordinates.split_whitespace() {
                let mut fields = token.split(',');
                let lon = parse_coordinate_field(token, fields.next())?;
                let lat = parse_coordinate_field(token, fields.next())?;
                ring.push((
                    (lon / resolution_deg).round() as i64,
                    (lat / resolution_deg).round() as i64,
                ));
            }
            rings.push(ring);
            rest = after;
        }

        if rings.is_empty() {
            return Err(Error::KmlMissingElement("Polygon"));
        }
        Self::new(rings)
    }

    /// The polygon's rings.
    pub fn rings(&self) -> &[Vec<IntPoint>] {
        &self.rings
    }

    /// Total vertex count over all rings.
    pub fn num_vertices(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// The inclusive bounding box `(min, max)` over all rings.
    pub fn bounding_box(&self) -> (IntPoint, IntPoint) {
        let mut min = (i64::MAX, i64::MAX);
        let mut max = (i64::MIN, i64::MIN);
        for v in self.rings.iter().flatten() {
            min.0 = min.0.min(v.0);
            min.1 = min.1.min(v.1);
            max.0 = max.0.max(v.0);
            max.1 = max.1.max(v.1);
        }
        (min, max)
    }

    /// Translate every vertex by `(dx, dy)`.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        for v in self.rings.iter_mut().flatten() {
            v.0 += dx;
            v.1 += dy;
        }
    }

    /// Reverse the orientation of every ring in place.
    pub fn reverse(&mut self) {
        for ring in &mut self.rings {
            ring.reverse();
        }
    }

    /// Signed area in grid units by the shoelace formula, summed over rings.
    /// Counter-clockwise rings contribute positive area.
    pub fn signed_area(&self) -> f64 {
        let mut twice_area: i128 = 0;
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                twice_area += a.0 as i128 * b.1 as i128 - b.0 as i128 * a.1 as i128;
            }
        }
        twice_area as f64 / 2.0
    }

    /// Point-in-polygon by horizontal-ray crossing count.
    ///
    /// Edges exactly coincident with the query report `edge = true` and are
    /// never counted as interior. Horizontal runs on the ray line are
    /// resolved by carrying the side of the last off-line vertex until the
    /// run ends.
    pub fn contains(&self, q: IntPoint) -> Containment {
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                if on_segment(ring[i], ring[(i + 1) % n], q) {
                    return Containment {
                        inside: false,
                        edge: true,
                    };
                }
            }
        }

        let crossings: u64 = self.rings.iter().map(|ring| ray_crossings(ring, q)).sum();
        Containment {
            inside: crossings % 2 == 1,
            edge: false,
        }
    }

    /// The boundary point closest to `q`, in floating-point grid units.
    /// Every edge is parameterized by alpha in [0, 1] and the minimizing
    /// projection is returned.
    pub fn closest_boundary_point(&self, q: (f64, f64)) -> (f64, f64) {
        let mut best_d2 = f64::INFINITY;
        let mut best = (0.0, 0.0);
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                let (ax, ay) = (a.0 as f64, a.1 as f64);
                let (dx, dy) = (b.0 as f64 - ax, b.1 as f64 - ay);
                let len2 = dx * dx + dy * dy;
                let alpha = if len2 == 0.0 {
                    0.0
                } else {
                    (((q.0 - ax) * dx + (q.1 - ay) * dy) / len2).clamp(0.0, 1.0)
                };
                let p = (ax + alpha * dx, ay + alpha * dy);
                let d2 = (p.0 - q.0).powi(2) + (p.1 - q.1).powi(2);
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = p;
                }
            }
        }
        best
    }

    /// The polygon point closest to `q`: `q` itself when interior or on an
    /// edge, otherwise the closest boundary point.
    pub fn closest_point(&self, q: IntPoint) -> (f64, f64) {
        let c = self.contains(q);
        if c.inside || c.edge {
            (q.0 as f64, q.1 as f64)
        } else {
            self.closest_boundary_point((q.0 as f64, q.1 as f64))
        }
    }

    /// The `(x_min, x_max)` extent of the polygon's edges along the
    /// horizontal line at `y`, or `None` when no edge meets the line.
    pub fn horizontal_extent(&self, y: i64) -> Option<(f64, f64)> {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                if a.1 == b.1 {
                    if a.1 == y {
                        min_x = min_x.min(a.0.min(b.0) as f64);
                        max_x = max_x.max(a.0.max(b.0) as f64);
                    }
                } else if (a.1.min(b.1)..=a.1.max(b.1)).contains(&y) {
                    let x = a.0 as f64
                        + (y - a.1) as f64 * (b.0 - a.0) as f64 / (b.1 - a.1) as f64;
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                }
            }
        }
        min_x.is_finite().then_some((min_x, max_x))
    }

    /// The `(y_min, y_max)` extent of the polygon's edges along the vertical
    /// line at `x`, or `None` when no edge meets the line.
    pub fn vertical_extent(&self, x: i64) -> Option<(f64, f64)> {
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                if a.0 == b.0 {
                    if a.0 == x {
                        min_y = min_y.min(a.1.min(b.1) as f64);
                        max_y = max_y.max(a.1.max(b.1) as f64);
                    }
                } else if (a.0.min(b.0)..=a.0.max(b.0)).contains(&x) {
                    let y = a.1 as f64
                        + (x - a.0) as f64 * (b.1 - a.1) as f64 / (b.0 - a.0) as f64;
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }
        min_y.is_finite().then_some((min_y, max_y))
    }

    /// Reconstruct the boundary polygon of a rasterized scan set.
    ///
    /// Each covered cell `(ix, iy)` occupies the unit square with corners
    /// `(ix, iy)` and `(ix + 1, iy + 1)`. The result is the minimal polygon
    /// of axis-parallel segments tracing the cell-edge boundary, with outer
    /// rings oriented counter-clockwise. Cells touching only at a corner are
    /// traced as separate rings.
    pub fn from_scan_raster(raster: &ScanRaster) -> Result<Self> {
        // Directed boundary edges keep the covered region on their left.
        let mut edges: std::collections::HashMap<IntPoint, Vec<IntPoint>> =
            std::collections::HashMap::new();
        let mut add = |from: IntPoint, to: IntPoint| {
            edges.entry(from).or_default().push(to);
        };
        for iy in 0..raster.ny {
            for ix in 0..raster.nx {
                if !raster.get(ix, iy) {
                    continue;
                }
                let (x, y) = (ix as i64, iy as i64);
                if !raster.get_signed(ix as i64, iy as i64 - 1) {
                    add((x, y), (x + 1, y));
                }
                if !raster.get_signed(ix as i64 + 1, iy as i64) {
                    add((x + 1, y), (x + 1, y + 1));
                }
                if !raster.get_signed(ix as i64, iy as i64 + 1) {
                    add((x + 1, y + 1), (x, y + 1));
                }
                if !raster.get_signed(ix as i64 - 1, iy as i64) {
                    add((x, y + 1), (x, y));
                }
            }
        }
        if edges.is_empty() {
            return Err(Error::EmptyScanRaster);
        }

        let mut rings = Vec::new();
        while let Some((&start, _)) = edges.iter().find(|(_, outs)| !outs.is_empty()) {
            let mut ring = vec![start];
            let mut current = start;
            let mut incoming = (0i64, 0i64);
            loop {
                let outs = match edges.get_mut(&current) {
                    Some(outs) if !outs.is_empty() => outs,
                    _ => break,
                };
                // At a corner where two diagonal cells touch there are two
                // candidates; turning left keeps each blob on its own ring.
                let next_idx = if outs.len() == 1 {
                    0
                } else {
                    let left = (-incoming.1, incoming.0);
                    outs.iter()
                        .position(|&to| {
                            (to.0 - current.0, to.1 - current.1) == left
                        })
                        .unwrap_or(0)
                };
                let next = outs.swap_remove(next_idx);
                incoming = (next.0 - current.0, next.1 - current.1);
                current = next;
                if current == start {
                    break;
                }
                ring.push(current);
            }
            rings.push(collapse_collinear(ring));
        }

        Self::new(rings)
    }
}

/// A binary raster of scanned cells on an axis-aligned grid.
#[derive(Clone, Debug)]
pub struct ScanRaster {
    nx: usize,
    ny: usize,
    cells: Vec<bool>,
}

impl ScanRaster {
    /// An empty raster of `nx` by `ny` cells.
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            cells: vec![false; nx * ny],
        }
    }

    /// Mark the cell at `(ix, iy)` as covered.
    pub fn set(&mut self, ix: usize, iy: usize) {
        if ix < self.nx && iy < self.ny {
            self.cells[iy * self.nx + ix] = true;
        }
    }

    /// Whether the cell at `(ix, iy)` is covered.
    pub fn get(&self, ix: usize, iy: usize) -> bool {
        ix < self.nx && iy < self.ny && self.cells[iy * self.nx + ix]
    }

    fn get_signed(&self, ix: i64, iy: i64) -> bool {
        ix >= 0 && iy >= 0 && self.get(ix as usize, iy as usize)
    }

    /// Number of covered cells.
    pub fn covered_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Grid width in cells.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Grid height in cells.
    pub fn ny(&self) -> usize {
        self.ny
    }
}

fn parse_coordinate_field(token: &str, field: Option<&str>) -> Result<f64> {
    field
        .and_then(|f| f.trim().parse::<f64>().ok())
        .ok_or_else(|| Error::KmlInvalidCoordinate(token.to_string()))
}

/// Content of the first `<name ...>...</name>` element in `s`, and the text
/// following its close tag.
fn find_element<'a>(s: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let open = format!("<{name}");
    let start = s.find(&open)?;
    let after_open = &s[start + open.len()..];
    let gt = after_open.find('>')?;
    let body = &after_open[gt + 1..];
    let close = format!("</{name}>");
    let end = body.find(&close)?;
    Some((&body[..end], &body[end + close.len()..]))
}

fn on_segment(a: IntPoint, b: IntPoint, q: IntPoint) -> bool {
    let cross = (b.0 - a.0) as i128 * (q.1 - a.1) as i128
        - (b.1 - a.1) as i128 * (q.0 - a.0) as i128;
    cross == 0
        && q.0 >= a.0.min(b.0)
        && q.0 <= a.0.max(b.0)
        && q.1 >= a.1.min(b.1)
        && q.1 <= a.1.max(b.1)
}

/// Crossings of the horizontal ray from `q` toward +x with one ring. The
/// caller has already excluded points lying on the boundary.
fn ray_crossings(ring: &[IntPoint], q: IntPoint) -> u64 {
    let n = ring.len();
    let Some(start) = (0..n).find(|&i| ring[i].1 != q.1) else {
        return 0;
    };

    let mut crossings = 0;
    let mut side = ring[start].1 > q.1;
    let mut prev = ring[start];
    // Rightmost x of the current horizontal run on the ray line, if any.
    let mut run_max_x: Option<i64> = None;

    for step in 1..=n {
        let v = ring[(start + step) % n];
        if v.1 == q.1 {
            run_max_x = Some(run_max_x.map_or(v.0, |m| m.max(v.0)));
        } else {
            let new_side = v.1 > q.1;
            if let Some(max_x) = run_max_x.take() {
                // The boundary met the ray line along a run; it crosses only
                // if it leaves on the other side.
                if new_side != side && max_x > q.0 {
                    crossings += 1;
                }
            } else if new_side != side {
                let x_int = prev.0 as f64
                    + (q.1 - prev.1) as f64 * (v.0 - prev.0) as f64 / (v.1 - prev.1) as f64;
                if x_int > q.0 as f64 {
                    crossings += 1;
                }
            }
            side = new_side;
        }
        prev = v;
    }
    crossings
}

fn collapse_collinear(ring: Vec<IntPoint>) -> Vec<IntPoint> {
    let n = ring.len();
    if n < 3 {
        return ring;
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let v = ring[i];
        let next = ring[(i + 1) % n];
        let d1 = (v.0 - prev.0, v.1 - prev.1);
        let d2 = (next.0 - v.0, next.1 - v.1);
        if d1.0 as i128 * d2.1 as i128 != d1.1 as i128 * d2.0 as i128 {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use float_cmp::assert_approx_eq;

    fn square() -> IntPolygon {
        IntPolygon::from_vertices(vec![(0, 0), (10, 0), (10, 10), (0, 10)]).unwrap()
    }

    #[test]
    fn test_signed_area_orientation() {
        let mut p = square();
        assert_approx_eq!(f64, p.signed_area(), 100.0);
        p.reverse();
        assert_approx_eq!(f64, p.signed_area(), -100.0);
    }

    #[test]
    fn test_closing_vertex_dropped() {
        let p = IntPolygon::from_vertices(vec![(0, 0), (4, 0), (4, 4), (0, 4), (0, 0)]).unwrap();
        assert_eq!(p.num_vertices(), 4);
    }

    #[test]
    fn test_degenerate_rejected() {
        assert!(IntPolygon::from_vertices(vec![(0, 0), (1, 1)]).is_err());
        assert!(IntPolygon::from_vertices(vec![(0, 0), (0, 0), (1, 1), (1, 1)]).is_err());
    }

    #[test]
    fn test_containment_interior_edge_exterior() {
        let p = square();
        assert_eq!(
            p.contains((5, 5)),
            Containment {
                inside: true,
                edge: false
            }
        );
        assert_eq!(
            p.contains((15, 5)),
            Containment {
                inside: false,
                edge: false
            }
        );
        // Every vertex and a mid-edge point report edge.
        for q in [(0, 0), (10, 0), (10, 10), (0, 10), (5, 0), (10, 5)] {
            assert_eq!(
                p.contains(q),
                Containment {
                    inside: false,
                    edge: true
                },
                "query {q:?}"
            );
        }
    }

    #[test]
    fn test_containment_matches_area_sign() {
        // Invariant: for a positive-area polygon, interior containment holds
        // regardless of the concavity the query sits next to.
        let p = IntPolygon::from_vertices(vec![
            (0, 0),
            (20, 0),
            (20, 20),
            (12, 20),
            (12, 8),
            (8, 8),
            (8, 20),
            (0, 20),
        ])
        .unwrap();
        assert!(p.signed_area() > 0.0);
        assert!(p.contains((4, 18)).inside);
        assert!(p.contains((16, 18)).inside);
        assert!(p.contains((10, 4)).inside);
        // The notch interior is outside.
        assert!(!p.contains((10, 12)).inside);
        assert!(!p.contains((10, 12)).edge);
    }

    #[test]
    fn test_ray_through_vertex_and_horizontal_run() {
        // Diamond: a ray through the left/right vertices grazes them.
        let p = IntPolygon::from_vertices(vec![(0, 5), (5, 0), (10, 5), (5, 10)]).unwrap();
        assert!(p.contains((5, 5)).inside);
        assert!(!p.contains((-3, 5)).inside);
        assert!(!p.contains((12, 5)).inside);

        // Polygon with a horizontal top run level with the query ray.
        let p = IntPolygon::from_vertices(vec![(0, 0), (10, 0), (10, 5), (6, 5), (4, 5), (0, 5)])
            .unwrap();
        assert!(!p.contains((-2, 5)).inside);
        assert!(p.contains((3, 2)).inside);
    }

    #[test]
    fn test_closest_point_idempotent() {
        let p = square();
        // Interior query maps to itself.
        assert_eq!(p.closest_point((3, 7)), (3.0, 7.0));
        // Exterior query projects onto the boundary, no farther than any
        // vertex.
        let q = (14, 5);
        let c = p.closest_point(q);
        assert_approx_eq!(f64, c.0, 10.0);
        assert_approx_eq!(f64, c.1, 5.0);
        let dq = |p: (f64, f64)| ((p.0 - q.0 as f64).powi(2) + (p.1 - q.1 as f64).powi(2)).sqrt();
        for v in &p.rings()[0] {
            assert!(dq(c) <= dq((v.0 as f64, v.1 as f64)) + 1.0e-12);
        }
    }

    #[test]
    fn test_closest_boundary_point_prefers_projection() {
        let p = square();
        let c = p.closest_boundary_point((5.0, 13.0));
        assert_approx_eq!(f64, c.0, 5.0);
        assert_approx_eq!(f64, c.1, 10.0);
    }

    #[test]
    fn test_extents() {
        let p = IntPolygon::from_vertices(vec![(0, 0), (10, 0), (5, 10)]).unwrap();
        let (x_min, x_max) = p.horizontal_extent(5).expect("line crosses polygon");
        assert_approx_eq!(f64, x_min, 2.5);
        assert_approx_eq!(f64, x_max, 7.5);
        assert!(p.horizontal_extent(11).is_none());

        let (y_min, y_max) = p.vertical_extent(5).expect("line crosses polygon");
        assert_approx_eq!(f64, y_min, 0.0);
        assert_approx_eq!(f64, y_max, 10.0);
    }

    #[test]
    fn test_translate_and_bounding_box() {
        let mut p = square();
        p.translate(-3, 7);
        assert_eq!(p.bounding_box(), ((-3, 7), (7, 17)));
    }

    #[test]
    fn test_kml_single_polygon() {
        let kml = r#"<Placemark><name>zone</name><Polygon><outerBoundaryIs><LinearRing>
            <coordinates>
              -73.9700,40.7500,0 -73.9600,40.7500,0 -73.9600,40.7600,0 -73.9700,40.7600,0 -73.9700,40.7500,0
            </coordinates>
        </LinearRing></outerBoundaryIs></Polygon></Placemark>"#;
        let p = IntPolygon::from_kml_placemark(kml, 1.0e-6).unwrap();
        assert_eq!(p.rings().len(), 1);
        assert_eq!(p.num_vertices(), 4);
        assert_eq!(p.rings()[0][0], (-73_970_000, 40_750_000));
    }

    #[test]
    fn test_kml_multi_geometry() {
        let kml = "<Placemark><MultiGeometry>\
            <Polygon><outerBoundaryIs><LinearRing><coordinates>\
              0.000001,0.000001 0.000003,0.000001 0.000003,0.000003\
            </coordinates></LinearRing></outerBoundaryIs></Polygon>\
            <Polygon><outerBoundaryIs><LinearRing><coordinates>\
              0.00001,0.00001 0.00003,0.00001 0.00003,0.00003\
            </coordinates></LinearRing></outerBoundaryIs></Polygon>\
            </MultiGeometry></Placemark>";
        let p = IntPolygon::from_kml_placemark(kml, 1.0e-6).unwrap();
        assert_eq!(p.rings().len(), 2);
    }

    #[test]
    fn test_kml_missing_elements() {
        assert!(matches!(
            IntPolygon::from_kml_placemark("<Polygon/>", 1.0e-6),
            Err(Error::KmlMissingElement("Placemark"))
        ));
        assert!(matches!(
            IntPolygon::from_kml_placemark("<Placemark></Placemark>", 1.0e-6),
            Err(Error::KmlMissingElement("Polygon"))
        ));
    }

    #[test]
    fn test_scan_raster_single_cell() {
        let mut raster = ScanRaster::new(4, 4);
        raster.set(1, 2);
        let p = IntPolygon::from_scan_raster(&raster).unwrap();
        assert_eq!(p.rings().len(), 1);
        assert_eq!(p.num_vertices(), 4);
        assert_approx_eq!(f64, p.signed_area(), 1.0);
        assert_eq!(p.bounding_box(), ((1, 2), (2, 3)));
    }

    #[test]
    fn test_scan_raster_l_shape() {
        // Two cells across the bottom, one stacked on the left.
        let mut raster = ScanRaster::new(3, 3);
        raster.set(0, 0);
        raster.set(1, 0);
        raster.set(0, 1);
        let p = IntPolygon::from_scan_raster(&raster).unwrap();
        assert_eq!(p.rings().len(), 1);
        assert_approx_eq!(f64, p.signed_area(), 3.0);
        // Minimal axis-parallel boundary of an L has six vertices.
        assert_eq!(p.num_vertices(), 6);
        assert!(p.contains((1, 1)).edge);
    }

    #[test]
    fn test_scan_raster_empty() {
        let raster = ScanRaster::new(3, 3);
        assert!(matches!(
            IntPolygon::from_scan_raster(&raster),
            Err(Error::EmptyScanRaster)
        ));
    }
}

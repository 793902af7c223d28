use crate::result::{Error, Result};
use crate::vec3::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Earth radius of the spherical approximation, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position on the WGS-84 surface.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl GeoPoint {
    /// Create a point, validating coordinate ranges.
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(Error::LatitudeOutOfRange(latitude_deg));
        }
        if !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(Error::LongitudeOutOfRange(longitude_deg));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
        })
    }

    /// Great-circle distance to `other` in meters on the spherical model.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.latitude_deg.to_radians();
        let phi2 = other.latitude_deg.to_radians();
        let dphi = (other.latitude_deg - self.latitude_deg).to_radians();
        let dlam = (other.longitude_deg - self.longitude_deg).to_radians();

        let a = (dphi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (dlam / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Initial bearing from this point toward `other`, degrees clockwise from
    /// true north in [0, 360).
    pub fn bearing_deg_to(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.latitude_deg.to_radians();
        let phi2 = other.latitude_deg.to_radians();
        let dlam = (other.longitude_deg - self.longitude_deg).to_radians();

        let y = dlam.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlam.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }

    /// The point reached by traveling `distance_m` along `bearing_deg`
    /// (clockwise from true north) on the great circle.
    pub fn destination(&self, bearing_deg: f64, distance_m: f64) -> GeoPoint {
        let delta = distance_m / EARTH_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let phi1 = self.latitude_deg.to_radians();
        let lam1 = self.longitude_deg.to_radians();

        let phi2 =
            (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let lam2 = lam1
            + (theta.sin() * delta.sin() * phi1.cos())
                .atan2(delta.cos() - phi1.sin() * phi2.sin());

        GeoPoint {
            latitude_deg: phi2.to_degrees(),
            longitude_deg: (lam2.to_degrees() + 540.0) % 360.0 - 180.0,
        }
    }

    /// Geocentric cartesian position in meters for a height above mean sea
    /// level, on the spherical model.
    pub fn to_ecef(&self, height_amsl_m: f64) -> Vec3 {
        let r = EARTH_RADIUS_M + height_amsl_m;
        let phi = self.latitude_deg.to_radians();
        let lam = self.longitude_deg.to_radians();
        [
            r * phi.cos() * lam.cos(),
            r * phi.cos() * lam.sin(),
            r * phi.sin(),
        ]
    }

    /// The local orthonormal east/north/up basis at this point, in geocentric
    /// cartesian coordinates.
    pub fn enu_basis(&self) -> EnuBasis {
        let phi = self.latitude_deg.to_radians();
        let lam = self.longitude_deg.to_radians();
        EnuBasis {
            east: [-lam.sin(), lam.cos(), 0.0],
            north: [-phi.sin() * lam.cos(), -phi.sin() * lam.sin(), phi.cos()],
            up: [phi.cos() * lam.cos(), phi.cos() * lam.sin(), phi.sin()],
        }
    }
}

/// Local orthonormal basis at a geographic point.
#[derive(Clone, Copy, Debug)]
pub struct EnuBasis {
    pub east: Vec3,
    pub north: Vec3,
    pub up: Vec3,
}

/// A height measurement with its reference surface.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Height {
    /// Above mean sea level.
    Amsl(f64),
    /// Above ground level.
    Agl(f64),
}

impl Height {
    /// The raw height value in meters, ignoring the reference surface.
    pub fn meters(&self) -> f64 {
        match self {
            Height::Amsl(m) | Height::Agl(m) => *m,
        }
    }

    /// Convert to meters above mean sea level given the local terrain height.
    pub fn to_amsl(&self, terrain_m: f64) -> f64 {
        match self {
            Height::Amsl(m) => *m,
            Height::Agl(m) => m + terrain_m,
        }
    }

    /// Convert to meters above ground level given the local terrain height.
    pub fn to_agl(&self, terrain_m: f64) -> f64 {
        match self {
            Height::Amsl(m) => m - terrain_m,
            Height::Agl(m) => *m,
        }
    }
}

/// Distance to the radio horizon for a transmitter `height_agl_m` above
/// ground, on the spherical model.
pub fn horizon_distance_m(height_agl_m: f64) -> f64 {
    (2.0 * EARTH_RADIUS_M * height_agl_m.max(0.0)).sqrt()
}

/// An axis-aligned latitude/longitude rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatLonBounds {
    pub min_latitude_deg: f64,
    pub min_longitude_deg: f64,
    pub max_latitude_deg: f64,
    pub max_longitude_deg: f64,
}

impl LatLonBounds {
    /// A rectangle covering exactly one point.
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            min_latitude_deg: point.latitude_deg,
            min_longitude_deg: point.longitude_deg,
            max_latitude_deg: point.latitude_deg,
            max_longitude_deg: point.longitude_deg,
        }
    }

    /// Whether the rectangle contains the point. Edges are inclusive.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude_deg >= self.min_latitude_deg
            && point.latitude_deg <= self.max_latitude_deg
            && point.longitude_deg >= self.min_longitude_deg
            && point.longitude_deg <= self.max_longitude_deg
    }

    /// Whether the two rectangles overlap. Touching edges count as overlap.
    pub fn intersects(&self, other: &LatLonBounds) -> bool {
        self.min_latitude_deg <= other.max_latitude_deg
            && other.min_latitude_deg <= self.max_latitude_deg
            && self.min_longitude_deg <= other.max_longitude_deg
            && other.min_longitude_deg <= self.max_longitude_deg
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &LatLonBounds) -> LatLonBounds {
        LatLonBounds {
            min_latitude_deg: self.min_latitude_deg.min(other.min_latitude_deg),
            min_longitude_deg: self.min_longitude_deg.min(other.min_longitude_deg),
            max_latitude_deg: self.max_latitude_deg.max(other.max_latitude_deg),
            max_longitude_deg: self.max_longitude_deg.max(other.max_longitude_deg),
        }
    }

    /// Grow the rectangle to include the point.
    pub fn extend(&mut self, point: GeoPoint) {
        self.min_latitude_deg = self.min_latitude_deg.min(point.latitude_deg);
        self.max_latitude_deg = self.max_latitude_deg.max(point.latitude_deg);
        self.min_longitude_deg = self.min_longitude_deg.min(point.longitude_deg);
        self.max_longitude_deg = self.max_longitude_deg.max(point.longitude_deg);
    }

    /// The rectangle expanded by `distance_m` in every direction. The
    /// longitude expansion is scaled by the cosine of the rectangle's
    /// most poleward latitude so the margin holds everywhere inside.
    pub fn expanded_by_m(&self, distance_m: f64) -> LatLonBounds {
        let dlat = (distance_m / EARTH_RADIUS_M).to_degrees();
        let worst_lat = self
            .min_latitude_deg
            .abs()
            .max(self.max_latitude_deg.abs())
            .min(89.0);
        let dlon = dlat / worst_lat.to_radians().cos();
        LatLonBounds {
            min_latitude_deg: self.min_latitude_deg - dlat,
            min_longitude_deg: self.min_longitude_deg - dlon,
            max_latitude_deg: self.max_latitude_deg + dlat,
            max_longitude_deg: self.max_longitude_deg + dlon,
        }
    }

    /// The center of the rectangle.
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            latitude_deg: (self.min_latitude_deg + self.max_latitude_deg) / 2.0,
            longitude_deg: (self.min_longitude_deg + self.max_longitude_deg) / 2.0,
        }
    }
}

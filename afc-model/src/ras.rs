//!
//! Radio-astronomy exclusion zones.
//!
//! A zone denies its frequency range outright to transmitters inside its
//! geometry, so overlapping channels turn black rather than being power
//! limited.
//!

use serde::{Deserialize, Serialize};

use afc_geo::point::{horizon_distance_m, GeoPoint, LatLonBounds};

/// The geometry of an exclusion zone.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExclusionGeometry {
    Rect(LatLonBounds),
    RectUnion(Vec<LatLonBounds>),
    Circle {
        center: GeoPoint,
        radius_m: f64,
    },
    /// A circle whose radius is the transmitter's own radio-horizon
    /// distance, so higher transmitters are excluded farther out.
    HorizonCircle {
        center: GeoPoint,
    },
}

/// One radio-astronomy site and the spectrum it protects.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasZone {
    pub name: String,
    pub geometry: ExclusionGeometry,
    pub start_mhz: f64,
    pub stop_mhz: f64,
    /// Transmitters below this AGL height are not governed by the zone.
    pub min_height_agl_m: f64,
}

impl RasZone {
    /// Whether the zone denies a transmitter at `position` and
    /// `height_agl_m` for a channel spanning `[start, stop]` MHz.
    pub fn denies(
        &self,
        position: GeoPoint,
        height_agl_m: f64,
        start_mhz: f64,
        stop_mhz: f64,
    ) -> bool {
        if stop_mhz <= self.start_mhz || start_mhz >= self.stop_mhz {
            return false;
        }
        if height_agl_m < self.min_height_agl_m {
            return false;
        }
        match &self.geometry {
            ExclusionGeometry::Rect(bounds) => bounds.contains(position),
            ExclusionGeometry::RectUnion(rects) => rects.iter().any(|r| r.contains(position)),
            ExclusionGeometry::Circle { center, radius_m } => {
                center.distance_m(&position) <= *radius_m
            }
            ExclusionGeometry::HorizonCircle { center } => {
                center.distance_m(&position) <= horizon_distance_m(height_agl_m)
            }
        }
    }
}

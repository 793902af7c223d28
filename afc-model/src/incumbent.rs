//!
//! Fixed-service incumbent records.
//!
//! An `FsLink` is one licensed point-to-point path: a transmitter, a primary
//! receiver (optionally with a diversity receiver), and zero or more passive
//! repeaters between them. Repeaters are ordered from the receiver outward,
//! so `repeaters[0]` is the node the receiver's antenna points at.
//!

use afc_geo::point::GeoPoint;

use crate::antenna::FsAntenna;
use crate::result::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarization {
    Horizontal,
    Vertical,
    Unknown,
}

/// One receiving site of an FS link.
#[derive(Clone, Debug)]
pub struct FsReceiver {
    pub position: GeoPoint,
    pub height_agl_m: f64,
    pub antenna: FsAntenna,
    /// Waveguide loss between antenna and LNA.
    pub feeder_loss_db: f64,
    /// Noise power spectral density at the LNA input.
    pub noise_psd_dbm_per_mhz: f64,
    pub polarization: Polarization,
}

/// A passive repeater extending an FS path without electronics.
#[derive(Clone, Debug)]
pub enum PassiveRepeater {
    /// Two dish antennas joined back to back; both faces share one
    /// discrimination pattern.
    BackToBack {
        position: GeoPoint,
        rx_height_agl_m: f64,
        tx_height_agl_m: f64,
        antenna: FsAntenna,
    },
    /// A flat billboard reflector.
    Billboard {
        position: GeoPoint,
        rx_height_agl_m: f64,
        tx_height_agl_m: f64,
        width_over_lambda: f64,
        height_over_lambda: f64,
        /// Incidence angle of the reflected path against the panel normal.
        incidence_angle_deg: f64,
        /// Effective-aperture shape factor relating the panel to its
        /// equivalent linear aperture.
        reflection_ks: f64,
        /// Main-lobe extent parameter bounding the sinc region.
        reflection_q: f64,
    },
}

impl PassiveRepeater {
    pub fn position(&self) -> GeoPoint {
        match self {
            PassiveRepeater::BackToBack { position, .. }
            | PassiveRepeater::Billboard { position, .. } => *position,
        }
    }

    /// Height of the face toward the far end of the chain, the face an
    /// interferer couples into.
    pub fn rx_height_agl_m(&self) -> f64 {
        match self {
            PassiveRepeater::BackToBack {
                rx_height_agl_m, ..
            }
            | PassiveRepeater::Billboard {
                rx_height_agl_m, ..
            } => *rx_height_agl_m,
        }
    }

    /// Height of the face toward the receiver side of the chain.
    pub fn tx_height_agl_m(&self) -> f64 {
        match self {
            PassiveRepeater::BackToBack {
                tx_height_agl_m, ..
            }
            | PassiveRepeater::Billboard {
                tx_height_agl_m, ..
            } => *tx_height_agl_m,
        }
    }

    /// Discrimination in dB (at or below zero) for a signal arriving
    /// `aob_deg` off the face's boresight.
    pub fn discrimination_db(&self, aob_deg: f64, freq_mhz: f64) -> Result<f64> {
        match self {
            PassiveRepeater::BackToBack { antenna, .. } => {
                let side = antenna.gain_dbi(aob_deg, freq_mhz, false)?;
                Ok((side - antenna.max_gain_dbi()).min(0.0))
            }
            PassiveRepeater::Billboard {
                width_over_lambda,
                height_over_lambda,
                incidence_angle_deg,
                reflection_ks,
                reflection_q,
                ..
            } => Ok(billboard_discrimination_db(
                aob_deg,
                *width_over_lambda,
                *height_over_lambda,
                *incidence_angle_deg,
                *reflection_ks,
                *reflection_q,
            )),
        }
    }
}

/// Billboard reflector discrimination: the floor `D0` set by the aperture,
/// against the three-branch sinc rolloff `D1`.
pub fn billboard_discrimination_db(
    aob_deg: f64,
    width_over_lambda: f64,
    height_over_lambda: f64,
    incidence_angle_deg: f64,
    ks: f64,
    q: f64,
) -> f64 {
    let theta = aob_deg.clamp(0.0, 180.0);
    let cos_in = incidence_angle_deg.to_radians().cos().max(1.0e-6);
    let aperture = 4.0 * std::f64::consts::PI * width_over_lambda * height_over_lambda * cos_in;
    let d0 = -10.0 * aperture.log10();

    // Equivalent linear aperture and the angle where the sinc main lobe
    // hands over to its envelope.
    let s_over_lambda = (ks * (width_over_lambda * height_over_lambda * cos_in).sqrt()).max(1.0e-6);
    let theta1_deg = (q / s_over_lambda).clamp(-1.0, 1.0).asin().to_degrees();

    let u = |t_deg: f64| s_over_lambda * t_deg.to_radians().sin();
    let d1 = if theta <= theta1_deg {
        let x = std::f64::consts::PI * u(theta);
        if x.abs() < 1.0e-12 {
            0.0
        } else {
            20.0 * (x.sin() / x).abs().max(1.0e-12).log10()
        }
    } else if theta <= 20.0 {
        -20.0 * (std::f64::consts::PI * u(theta)).abs().max(1.0e-12).log10()
    } else {
        let at20 = -20.0 * (std::f64::consts::PI * u(20.0)).abs().max(1.0e-12).log10();
        at20 - 0.4165 * (theta - 20.0)
    };

    d0.max(d1).min(0.0)
}

/// Precomputed path-loss bounds used to window the catalog before any
/// per-point evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathLossBounds {
    pub min_db: f64,
    pub max_db: f64,
}

/// One FS incumbent link.
#[derive(Clone, Debug)]
pub struct FsLink {
    /// Catalog identifier (callsign).
    pub id: String,
    pub start_mhz: f64,
    pub stop_mhz: f64,
    /// Occupied bandwidth, at most `stop - start`.
    pub bandwidth_mhz: f64,
    pub tx_position: GeoPoint,
    pub tx_height_agl_m: f64,
    pub rx: FsReceiver,
    pub diversity_rx: Option<FsReceiver>,
    pub repeaters: Vec<PassiveRepeater>,
    /// Filled during catalog windowing.
    pub path_loss_bounds: Option<PathLossBounds>,
}

impl FsLink {
    /// Center of the licensed band.
    pub fn center_mhz(&self) -> f64 {
        (self.start_mhz + self.stop_mhz) / 2.0
    }

    /// Width of the overlap between the licensed band and `[start, stop]`.
    pub fn overlap_mhz(&self, start_mhz: f64, stop_mhz: f64) -> f64 {
        (self.stop_mhz.min(stop_mhz) - self.start_mhz.max(start_mhz)).max(0.0)
    }

    /// The node an interferer couples into: the incoming face of the
    /// repeater nearest the receiver, or the primary receiver itself.
    pub fn last_hop(&self) -> (GeoPoint, f64) {
        match self.repeaters.first() {
            Some(pr) => (pr.position(), pr.rx_height_agl_m()),
            None => (self.rx.position, self.rx.height_agl_m),
        }
    }

    /// What the last-hop node's antenna points at: the next repeater out, or
    /// the far-end transmitter.
    pub fn last_hop_pointing_target(&self) -> (GeoPoint, f64) {
        match self.repeaters.get(1) {
            Some(pr) => (pr.position(), pr.rx_height_agl_m()),
            None => (self.tx_position, self.tx_height_agl_m),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::antenna::{AntennaCategory, AntennaPattern};
    use float_cmp::assert_approx_eq;

    fn receiver(lat: f64, lon: f64) -> FsReceiver {
        FsReceiver {
            position: GeoPoint {
                latitude_deg: lat,
                longitude_deg: lon,
            },
            height_agl_m: 30.0,
            antenna: FsAntenna::new(
                AntennaPattern::F1245,
                38.0,
                150.0,
                AntennaCategory::Other,
            ),
            feeder_loss_db: 3.0,
            noise_psd_dbm_per_mhz: -110.0,
            polarization: Polarization::Vertical,
        }
    }

    fn link_with_repeaters(repeaters: Vec<PassiveRepeater>) -> FsLink {
        FsLink {
            id: "WQZZ123".to_string(),
            start_mhz: 6000.0,
            stop_mhz: 6060.0,
            bandwidth_mhz: 30.0,
            tx_position: GeoPoint {
                latitude_deg: 40.9,
                longitude_deg: -74.1,
            },
            tx_height_agl_m: 50.0,
            rx: receiver(40.75, -73.97),
            diversity_rx: None,
            repeaters,
            path_loss_bounds: None,
        }
    }

    #[test]
    fn test_overlap_and_center() {
        let link = link_with_repeaters(vec![]);
        assert_approx_eq!(f64, link.center_mhz(), 6030.0);
        assert_approx_eq!(f64, link.overlap_mhz(5990.0, 6010.0), 10.0);
        assert_approx_eq!(f64, link.overlap_mhz(6100.0, 6200.0), 0.0);
    }

    #[test]
    fn test_last_hop_selection() {
        let plain = link_with_repeaters(vec![]);
        let (pos, height) = plain.last_hop();
        assert_approx_eq!(f64, pos.latitude_deg, 40.75);
        assert_approx_eq!(f64, height, 30.0);
        let (target, _) = plain.last_hop_pointing_target();
        assert_approx_eq!(f64, target.latitude_deg, 40.9);

        let pr = PassiveRepeater::BackToBack {
            position: GeoPoint {
                latitude_deg: 40.8,
                longitude_deg: -74.0,
            },
            rx_height_agl_m: 60.0,
            tx_height_agl_m: 58.0,
            antenna: FsAntenna::new(
                AntennaPattern::F699,
                35.0,
                120.0,
                AntennaCategory::Other,
            ),
        };
        let chained = link_with_repeaters(vec![pr]);
        let (pos, height) = chained.last_hop();
        assert_approx_eq!(f64, pos.latitude_deg, 40.8);
        assert_approx_eq!(f64, height, 60.0);
        // With one repeater, its antenna points at the transmitter.
        let (target, _) = chained.last_hop_pointing_target();
        assert_approx_eq!(f64, target.latitude_deg, 40.9);
    }

    #[test]
    fn test_back_to_back_discrimination_nonpositive() {
        let pr = PassiveRepeater::BackToBack {
            position: GeoPoint {
                latitude_deg: 40.8,
                longitude_deg: -74.0,
            },
            rx_height_agl_m: 60.0,
            tx_height_agl_m: 58.0,
            antenna: FsAntenna::new(
                AntennaPattern::R2Aip07,
                40.0,
                150.0,
                AntennaCategory::HighPerformance,
            ),
        };
        assert_approx_eq!(f64, pr.discrimination_db(0.0, 6000.0).unwrap(), 0.0);
        // 7 degrees off: Category A calls for 25 dB of suppression.
        assert_approx_eq!(f64, pr.discrimination_db(7.0, 6000.0).unwrap(), -25.0);
        for aob in [1.0, 10.0, 45.0, 120.0] {
            assert!(pr.discrimination_db(aob, 6000.0).unwrap() <= 0.0);
        }
    }

    #[test]
    fn test_billboard_discrimination_shape() {
        let disc =
            |aob: f64| billboard_discrimination_db(aob, 60.0, 40.0, 30.0, 1.0, 0.5);

        // On boresight the panel reflects without loss.
        assert_approx_eq!(f64, disc(0.0), 0.0);
        // The aperture floor bounds the rolloff from below.
        let floor = -10.0
            * (4.0 * std::f64::consts::PI * 60.0 * 40.0 * 30.0_f64.to_radians().cos()).log10();
        for aob in [1.0, 5.0, 15.0, 25.0, 90.0, 180.0] {
            let d = disc(aob);
            assert!(d <= 0.0, "at {aob}");
            assert!(d >= floor - 1.0e-9, "at {aob}");
        }
        // Beyond 20 degrees the linear decay takes over until the floor.
        assert!(disc(21.0) >= disc(25.0) - 0.4165 * 4.0 - 1.0e-9);
    }
}

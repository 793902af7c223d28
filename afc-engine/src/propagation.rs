//!
//! Propagation models.
//!
//! The evaluator treats path loss as a pluggable function of the path
//! geometry, the terrain profile, the frequency, and the propagation
//! environment. Two models ship: free space, and a clutter-aware model that
//! adds a single-knife-edge diffraction term for obstructed profiles, a
//! per-environment clutter loss, and a confidence-scaled shadowing margin.
//!

use afc_terrain::population::PropEnv;

use crate::profile::TerrainProfile;
use crate::result::Result;

/// Geometry of one evaluated path.
#[derive(Clone, Copy, Debug)]
pub struct PathGeometry {
    pub distance_m: f64,
    pub tx_height_amsl_m: f64,
    pub rx_height_amsl_m: f64,
}

/// A point-to-point median path loss model.
pub trait PropagationModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Median path loss in dB, excluding clutter.
    fn path_loss_db(
        &self,
        geometry: &PathGeometry,
        profile: &TerrainProfile,
        freq_mhz: f64,
    ) -> Result<f64>;

    /// End-site clutter loss for an environment class. Zero unless the
    /// model accounts for clutter.
    fn clutter_db(&self, _env: PropEnv) -> f64 {
        0.0
    }
}

/// Free-space path loss.
pub fn free_space_path_loss_db(distance_m: f64, freq_mhz: f64) -> f64 {
    let d_km = (distance_m / 1000.0).max(1.0e-6);
    20.0 * d_km.log10() + 20.0 * freq_mhz.log10() + 32.447_783
}

/// Pure free-space propagation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreeSpace;

impl PropagationModel for FreeSpace {
    fn name(&self) -> &'static str {
        "FSPL"
    }

    fn path_loss_db(
        &self,
        geometry: &PathGeometry,
        _profile: &TerrainProfile,
        freq_mhz: f64,
    ) -> Result<f64> {
        Ok(free_space_path_loss_db(geometry.distance_m, freq_mhz))
    }
}

/// Free space plus terrain diffraction, environment clutter, and a
/// confidence-scaled shadowing margin.
#[derive(Clone, Copy, Debug)]
pub struct ClutterModel {
    /// Prediction confidence in (0, 1); 0.5 is the median.
    pub confidence: f64,
}

/// Log-normal shadowing spread.
const SHADOWING_STD_DB: f64 = 8.0;

impl PropagationModel for ClutterModel {
    fn name(&self) -> &'static str {
        "CLUTTER"
    }

    fn path_loss_db(
        &self,
        geometry: &PathGeometry,
        profile: &TerrainProfile,
        freq_mhz: f64,
    ) -> Result<f64> {
        let mut loss = free_space_path_loss_db(geometry.distance_m, freq_mhz);

        if let Some(depth_m) =
            profile.max_obstruction_m(geometry.tx_height_amsl_m, geometry.rx_height_amsl_m)
        {
            loss += knife_edge_loss_db(
                depth_m,
                geometry.distance_m,
                freq_mhz,
            );
        }

        // Confidence above the median buys margin, below gives it back.
        loss -= normal_quantile(self.confidence.clamp(1.0e-6, 1.0 - 1.0e-6))
            * SHADOWING_STD_DB;
        Ok(loss)
    }

    fn clutter_db(&self, env: PropEnv) -> f64 {
        match env {
            PropEnv::Urban => 18.4,
            PropEnv::Suburban => 9.1,
            PropEnv::Rural | PropEnv::Barren | PropEnv::Undefined => 0.0,
        }
    }
}

/// Select a model by its configuration name.
pub fn select_model(name: &str, confidence: f64) -> Result<Box<dyn PropagationModel>> {
    match name {
        "FSPL" => Ok(Box::new(FreeSpace)),
        "CLUTTER" => Ok(Box::new(ClutterModel { confidence })),
        other => Err(crate::result::Error::UnknownPropagationModel(
            other.to_string(),
        )),
    }
}

/// Single-knife-edge diffraction loss for an obstacle standing `depth_m`
/// above the direct ray near mid-path.
fn knife_edge_loss_db(depth_m: f64, distance_m: f64, freq_mhz: f64) -> f64 {
    let lambda = 299.792_458 / freq_mhz;
    // Worst case obstacle placement: mid path.
    let d1 = distance_m / 2.0;
    let d2 = distance_m / 2.0;
    let v = depth_m * (2.0 / lambda * (d1 + d2) / (d1 * d2).max(1.0e-9)).sqrt();
    if v <= -0.78 {
        0.0
    } else {
        6.9 + 20.0 * (((v - 0.1).powi(2) + 1.0).sqrt() + v - 0.1).log10()
    }
}

/// Inverse standard normal CDF (Acklam's rational approximation).
fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use float_cmp::assert_approx_eq;

    fn flat_profile(n: usize, step: f64) -> TerrainProfile {
        TerrainProfile {
            step_m: step,
            heights_m: vec![0.0; n],
        }
    }

    #[test]
    fn test_fspl_reference_values() {
        // 1 km at 6000 MHz: 32.45 + 20 log 6000 = 108.0 dB.
        let loss = free_space_path_loss_db(1000.0, 6000.0);
        assert_approx_eq!(f64, loss, 108.01, epsilon = 0.02);
        // Doubling the distance adds 6.02 dB.
        let loss2 = free_space_path_loss_db(2000.0, 6000.0);
        assert_approx_eq!(f64, loss2 - loss, 6.02, epsilon = 0.01);
    }

    #[test]
    fn test_free_space_model_ignores_terrain() {
        let model = FreeSpace;
        let geometry = PathGeometry {
            distance_m: 5000.0,
            tx_height_amsl_m: 10.0,
            rx_height_amsl_m: 30.0,
        };
        let blocked = TerrainProfile {
            step_m: 500.0,
            heights_m: vec![0.0, 500.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        };
        let clear = flat_profile(11, 500.0);
        let l1 = model.path_loss_db(&geometry, &blocked, 6000.0).unwrap();
        let l2 = model.path_loss_db(&geometry, &clear, 6000.0).unwrap();
        assert_approx_eq!(f64, l1, l2);
        assert_approx_eq!(f64, model.clutter_db(PropEnv::Urban), 0.0);
    }

    #[test]
    fn test_clutter_model_obstruction_adds_loss() {
        let model = ClutterModel { confidence: 0.5 };
        let geometry = PathGeometry {
            distance_m: 5000.0,
            tx_height_amsl_m: 10.0,
            rx_height_amsl_m: 30.0,
        };
        let clear = flat_profile(11, 500.0);
        let mut blocked = flat_profile(11, 500.0);
        blocked.heights_m[5] = 100.0;

        let l_clear = model.path_loss_db(&geometry, &clear, 6000.0).unwrap();
        let l_blocked = model.path_loss_db(&geometry, &blocked, 6000.0).unwrap();
        // An 80 m obstruction at 6 GHz adds tens of dB.
        assert!(l_blocked > l_clear + 20.0);
    }

    #[test]
    fn test_confidence_margin_monotone() {
        let geometry = PathGeometry {
            distance_m: 5000.0,
            tx_height_amsl_m: 10.0,
            rx_height_amsl_m: 30.0,
        };
        let profile = flat_profile(11, 500.0);
        // Higher confidence of protection = less predicted loss (more
        // conservative toward the incumbent).
        let mut previous = f64::INFINITY;
        for confidence in [0.05, 0.25, 0.5, 0.75, 0.95] {
            let model = ClutterModel { confidence };
            let loss = model.path_loss_db(&geometry, &profile, 6000.0).unwrap();
            assert!(loss < previous);
            previous = loss;
        }
        // The median adds no margin at all.
        let median = ClutterModel { confidence: 0.5 }
            .path_loss_db(&geometry, &profile, 6000.0)
            .unwrap();
        assert_approx_eq!(
            f64,
            median,
            free_space_path_loss_db(5000.0, 6000.0),
            epsilon = 1.0e-6
        );
    }

    #[test]
    fn test_clutter_table() {
        let model = ClutterModel { confidence: 0.5 };
        assert!(model.clutter_db(PropEnv::Urban) > model.clutter_db(PropEnv::Suburban));
        assert_approx_eq!(f64, model.clutter_db(PropEnv::Rural), 0.0);
        assert_approx_eq!(f64, model.clutter_db(PropEnv::Undefined), 0.0);
    }

    #[test]
    fn test_normal_quantile() {
        assert_approx_eq!(f64, normal_quantile(0.5), 0.0, epsilon = 1.0e-9);
        assert_approx_eq!(f64, normal_quantile(0.975), 1.9600, epsilon = 1.0e-3);
        assert_approx_eq!(f64, normal_quantile(0.025), -1.9600, epsilon = 1.0e-3);
    }

    #[test]
    fn test_select_model() {
        assert_eq!(select_model("FSPL", 0.5).unwrap().name(), "FSPL");
        assert_eq!(select_model("CLUTTER", 0.5).unwrap().name(), "CLUTTER");
        assert!(select_model("RAYTRACE", 0.5).is_err());
    }
}

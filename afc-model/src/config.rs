//!
//! Engine configuration document.
//!
//! Deserialized once per deployment region; every field has a deployable
//! default so partial documents stay valid.
//!

use serde::{Deserialize, Serialize};

use crate::band::{FrequencyBand, UNII_5, UNII_7};

/// Per-band receiver characteristics applied when the catalog record leaves
/// them unset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandReceiverDefaults {
    pub start_mhz: f64,
    pub stop_mhz: f64,
    /// Waveguide/feeder loss between antenna and LNA.
    pub feeder_loss_db: f64,
    /// Receiver noise power spectral density at the LNA input.
    pub noise_psd_dbm_per_mhz: f64,
}

/// Building penetration loss applied to indoor deployments.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingLossConfig {
    /// Fixed entry loss in dB.
    pub fixed_db: f64,
}

impl Default for BuildingLossConfig {
    fn default() -> Self {
        Self { fixed_db: 20.5 }
    }
}

/// Horizontal/vertical padding added to the device's declared uncertainty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApUncertaintyConfig {
    pub horizontal_m: f64,
    pub vertical_m: f64,
}

/// Irregular-terrain-model surface parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItmConfig {
    /// Relative ground permittivity.
    pub epsilon: f64,
    /// Ground conductivity in S/m.
    pub sigma: f64,
    /// Surface refractivity in N-units.
    pub refractivity: f64,
}

impl Default for ItmConfig {
    fn default() -> Self {
        Self {
            epsilon: 15.0,
            sigma: 0.005,
            refractivity: 301.0,
        }
    }
}

/// The engine configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AfcConfig {
    /// Operating bands the device may be granted.
    pub bands: Vec<FrequencyBand>,
    /// Reference antenna pattern for FS receivers without a tabulated one,
    /// e.g. "F.1245".
    pub antenna_pattern: String,
    /// Fixed polarization mismatch credit.
    pub polarization_mismatch_loss_db: f64,
    /// Fixed body loss at the RLAN.
    pub body_loss_db: f64,
    pub building_loss: BuildingLossConfig,
    pub band_receiver_defaults: Vec<BandReceiverDefaults>,
    /// Aggregate interference-to-noise threshold at the incumbent.
    pub threshold_i2n_db: f64,
    /// Links longer than this cannot be affected and are not evaluated.
    pub max_link_distance_km: f64,
    /// EIRP floor: channels below it are denied outright.
    pub min_eirp_dbm: f64,
    /// EIRP ceiling of the ruleset.
    pub max_eirp_dbm: f64,
    /// Propagation model selector: "FSPL" or "CLUTTER".
    pub propagation_model: String,
    /// Prediction confidence handed to the propagation model.
    pub propagation_confidence: f64,
    /// Path of the FS incumbent catalog.
    pub fs_database: String,
    /// Deployment region label.
    pub region: String,
    /// Optional radio-astronomy exclusion database.
    pub ras_database: Option<String>,
    pub ap_uncertainty: ApUncertaintyConfig,
    pub itm: ItmConfig,
    /// Apply clutter loss at the FS end of the path as well.
    pub clutter_at_fs: bool,
    /// Ground sample distance for uncertainty-region scans.
    pub scan_resolution_m: f64,
    /// Row density of the lat/lon-grid scan method.
    pub scan_points_per_degree: u32,
    /// Terrain profile sample spacing for path loss.
    pub profile_step_m: f64,
    /// Wall-clock budget for one request.
    pub request_timeout_s: f64,
}

impl Default for AfcConfig {
    fn default() -> Self {
        Self {
            bands: vec![UNII_5, UNII_7],
            antenna_pattern: "F.1245".to_string(),
            polarization_mismatch_loss_db: 3.0,
            body_loss_db: 0.0,
            building_loss: BuildingLossConfig::default(),
            band_receiver_defaults: vec![
                BandReceiverDefaults {
                    start_mhz: UNII_5.start_mhz,
                    stop_mhz: UNII_5.stop_mhz,
                    feeder_loss_db: 3.0,
                    noise_psd_dbm_per_mhz: -110.0,
                },
                BandReceiverDefaults {
                    start_mhz: UNII_7.start_mhz,
                    stop_mhz: UNII_7.stop_mhz,
                    feeder_loss_db: 3.0,
                    noise_psd_dbm_per_mhz: -109.5,
                },
            ],
            threshold_i2n_db: -6.0,
            max_link_distance_km: 50.0,
            min_eirp_dbm: 18.0,
            max_eirp_dbm: 36.0,
            propagation_model: "CLUTTER".to_string(),
            propagation_confidence: 0.5,
            fs_database: String::new(),
            region: "CONUS".to_string(),
            ras_database: None,
            ap_uncertainty: ApUncertaintyConfig::default(),
            itm: ItmConfig::default(),
            clutter_at_fs: false,
            scan_resolution_m: 30.0,
            scan_points_per_degree: 3600,
            profile_step_m: 90.0,
            request_timeout_s: 600.0,
        }
    }
}

impl AfcConfig {
    /// The per-band receiver defaults covering `freq_mhz`, falling back to
    /// the first entry.
    pub fn band_defaults_for(&self, freq_mhz: f64) -> Option<&BandReceiverDefaults> {
        self.band_receiver_defaults
            .iter()
            .find(|b| freq_mhz >= b.start_mhz && freq_mhz <= b.stop_mhz)
            .or_else(|| self.band_receiver_defaults.first())
    }
}

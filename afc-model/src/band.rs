use serde::{Deserialize, Serialize};

/// An operating band of the 6 GHz unlicensed rules.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub start_mhz: f64,
    pub stop_mhz: f64,
}

/// UNII-5, 5925-6425 MHz.
pub const UNII_5: FrequencyBand = FrequencyBand {
    start_mhz: 5925.0,
    stop_mhz: 6425.0,
};

/// UNII-7, 6525-6875 MHz.
pub const UNII_7: FrequencyBand = FrequencyBand {
    start_mhz: 6525.0,
    stop_mhz: 6875.0,
};

impl FrequencyBand {
    /// Whether `[start, stop]` lies entirely inside the band.
    pub fn contains_range(&self, start_mhz: f64, stop_mhz: f64) -> bool {
        start_mhz >= self.start_mhz && stop_mhz <= self.stop_mhz
    }

    /// Width of the overlap with `[start, stop]` in MHz, zero when disjoint.
    pub fn overlap_mhz(&self, start_mhz: f64, stop_mhz: f64) -> f64 {
        (self.stop_mhz.min(stop_mhz) - self.start_mhz.max(start_mhz)).max(0.0)
    }
}

/// Whether `freq_mhz` falls inside any of the bands.
pub fn in_any_band(bands: &[FrequencyBand], freq_mhz: f64) -> bool {
    bands
        .iter()
        .any(|b| freq_mhz >= b.start_mhz && freq_mhz <= b.stop_mhz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_band_constants() {
        assert_approx_eq!(f64, UNII_5.start_mhz, 5925.0);
        assert_approx_eq!(f64, UNII_5.stop_mhz, 6425.0);
        assert_approx_eq!(f64, UNII_7.start_mhz, 6525.0);
        assert_approx_eq!(f64, UNII_7.stop_mhz, 6875.0);
    }

    #[test]
    fn test_overlap() {
        assert_approx_eq!(f64, UNII_5.overlap_mhz(5900.0, 5950.0), 25.0);
        assert_approx_eq!(f64, UNII_5.overlap_mhz(6400.0, 6500.0), 25.0);
        assert_approx_eq!(f64, UNII_5.overlap_mhz(6430.0, 6500.0), 0.0);
        assert!(UNII_7.contains_range(6525.0, 6545.0));
        assert!(!UNII_7.contains_range(6515.0, 6545.0));
    }
}

//!
//! FS receive antenna discrimination models.
//!
//! Given an angle off boresight and the antenna's peak gain (plus its
//! dish-diameter-to-wavelength ratio where the pattern needs it), each model
//! yields the gain toward the interferer in dBi. Reference patterns follow
//! ITU-R F.699 and F.1245 with the sidelobe region joined continuously to
//! the plateau, F.1336-4's average-sidelobe omnidirectional pattern, a
//! tabulated pattern, and the R2-AIP-07 minimum-suppression rules with
//! antenna-category branching.
//!

use afc_geo::interp::LinearInterpolator;

use crate::band::{in_any_band, UNII_5, UNII_7};
use crate::result::{Error, Result};

/// Part 101 performance category of an FS antenna.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AntennaCategory {
    /// Known high-performance Category A.
    HighPerformance,
    B1,
    B2,
    /// Blank or unrecognized model name.
    Other,
}

/// The discrimination pattern an antenna follows.
#[derive(Clone, Debug)]
pub enum AntennaPattern {
    /// No discrimination: peak gain in every direction.
    Omni,
    /// ITU-R F.699 reference pattern.
    F699,
    /// ITU-R F.1245 average reference pattern.
    F1245,
    /// ITU-R F.1336-4 omnidirectional average-sidelobe pattern.
    F1336Omni,
    /// Tabulated (angle off boresight, gain relative to peak) samples.
    Lut(LinearInterpolator),
    /// FCC R2-AIP-07 minimum suppression with category branching.
    R2Aip07,
}

/// A fixed-service antenna: pattern, peak gain, and the dish geometry the
/// reference patterns key off.
#[derive(Clone, Debug)]
pub struct FsAntenna {
    pattern: AntennaPattern,
    gain_dbi: f64,
    dish_over_lambda: f64,
    category: AntennaCategory,
}

impl FsAntenna {
    pub fn new(
        pattern: AntennaPattern,
        gain_dbi: f64,
        dish_over_lambda: f64,
        category: AntennaCategory,
    ) -> Self {
        Self {
            pattern,
            gain_dbi,
            dish_over_lambda: dish_over_lambda.max(1.0),
            category,
        }
    }

    /// Build from a configuration pattern name such as "F.1245".
    pub fn from_pattern_name(
        name: &str,
        gain_dbi: f64,
        dish_over_lambda: f64,
        category: AntennaCategory,
    ) -> Result<Self> {
        let pattern = match name {
            "OMNI" => AntennaPattern::Omni,
            "F.699" => AntennaPattern::F699,
            "F.1245" => AntennaPattern::F1245,
            "F.1336" => AntennaPattern::F1336Omni,
            "R2-AIP-07" => AntennaPattern::R2Aip07,
            other => return Err(Error::UnknownAntennaPattern(other.to_string())),
        };
        Ok(Self::new(pattern, gain_dbi, dish_over_lambda, category))
    }

    /// Peak gain in dBi.
    pub fn max_gain_dbi(&self) -> f64 {
        self.gain_dbi
    }

    /// Gain toward an interferer `aob_deg` off boresight, in dBi.
    ///
    /// The angle is clamped to [0, 180]. `freq_mhz` matters only to
    /// R2-AIP-07, which is undefined outside the UNII-5/UNII-7 bands;
    /// `diversity` selects the diversity-receiver branch of that rule.
    pub fn gain_dbi(&self, aob_deg: f64, freq_mhz: f64, diversity: bool) -> Result<f64> {
        let theta = aob_deg.clamp(0.0, 180.0);
        match &self.pattern {
            AntennaPattern::Omni => Ok(self.gain_dbi),
            AntennaPattern::F699 => Ok(f699_gain(theta, self.gain_dbi, self.dish_over_lambda)),
            AntennaPattern::F1245 => Ok(f1245_gain(theta, self.gain_dbi, self.dish_over_lambda)),
            AntennaPattern::F1336Omni => Ok(f1336_omni_gain(theta, self.gain_dbi)),
            AntennaPattern::Lut(table) => Ok(self.gain_dbi + table.value(theta)),
            AntennaPattern::R2Aip07 => {
                if !in_any_band(&[UNII_5, UNII_7], freq_mhz) {
                    return Err(Error::UnsupportedFrequency(freq_mhz));
                }
                Ok(self.r2aip07_gain(theta, diversity))
            }
        }
    }

    /// The smallest angle at which the gain has fallen `attn_db` below the
    /// peak. Brackets by doubling up to 180 degrees, then bisects to 1e-8
    /// degrees.
    pub fn beamwidth_deg(&self, attn_db: f64, freq_mhz: f64) -> Result<f64> {
        if attn_db <= 0.0 {
            return Ok(0.0);
        }
        let peak = self.gain_dbi(0.0, freq_mhz, false)?;
        let dropped = |theta: f64, this: &Self| -> Result<bool> {
            Ok(peak - this.gain_dbi(theta, freq_mhz, false)? >= attn_db)
        };

        let mut hi = 1.0e-3;
        while hi < 180.0 && !dropped(hi, self)? {
            hi *= 2.0;
        }
        let mut hi = hi.min(180.0);
        if !dropped(hi, self)? {
            return Ok(180.0);
        }

        let mut lo = 0.0;
        while hi - lo > 1.0e-8 {
            let mid = (lo + hi) / 2.0;
            if dropped(mid, self)? {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }

    fn r2aip07_gain(&self, theta: f64, diversity: bool) -> f64 {
        // Inside the main-lobe region the reference pattern governs.
        if theta < 5.0 {
            return f699_gain(theta, self.gain_dbi, self.dish_over_lambda);
        }

        if diversity {
            // Diversity receivers are held to the B1 floor only.
            return self.gain_dbi - suppression(theta, TABLE_B1);
        }

        match self.category {
            AntennaCategory::HighPerformance => self.gain_dbi - suppression(theta, TABLE_A),
            AntennaCategory::B1 => self.gain_dbi - suppression(theta, TABLE_B1),
            AntennaCategory::B2 => self.gain_dbi - suppression(theta, TABLE_B2),
            AntennaCategory::Other => {
                if self.gain_dbi >= CATEGORY_A_GAIN_DBI {
                    // Unverified Category A: never assume more suppression
                    // than the reference pattern supports.
                    let by_table = self.gain_dbi - suppression(theta, TABLE_A);
                    let by_pattern = f699_gain(theta, self.gain_dbi, self.dish_over_lambda);
                    by_table.max(by_pattern)
                } else {
                    self.gain_dbi - suppression(theta, TABLE_B1)
                }
            }
        }
    }
}

/// Parse a plain-text antenna pattern: one `<angle_deg>, <gain_db>` pair per
/// line, sorted by angle. Blank lines and `#` comments are skipped. Gains
/// are relative to the peak; [`AntennaPattern::Lut`] adds the peak back.
pub fn parse_gain_table(text: &str) -> Result<LinearInterpolator> {
    let mut samples = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split(',');
        let angle = fields
            .next()
            .and_then(|f| f.trim().parse::<f64>().ok())
            .ok_or_else(|| Error::BadGainTableLine(line.to_string()))?;
        let gain = fields
            .next()
            .and_then(|f| f.trim().parse::<f64>().ok())
            .ok_or_else(|| Error::BadGainTableLine(line.to_string()))?;
        samples.push((angle, gain));
    }
    LinearInterpolator::new(&samples).map_err(Error::BadGainTable)
}

/// Peak gain at or above which an uncategorized antenna is treated as
/// Category A.
const CATEGORY_A_GAIN_DBI: f64 = 38.0;

/// Minimum suppression in dB over angle ranges [5,10), [10,15), [15,20),
/// [20,30), [30,100), [100,180].
type SuppressionTable = [f64; 6];

const TABLE_A: SuppressionTable = [25.0, 29.0, 33.0, 36.0, 42.0, 55.0];
const TABLE_B1: SuppressionTable = [21.0, 25.0, 29.0, 32.0, 35.0, 39.0];
const TABLE_B2: SuppressionTable = [20.0, 24.0, 28.0, 32.0, 35.0, 36.0];

fn suppression(theta: f64, table: SuppressionTable) -> f64 {
    if theta < 10.0 {
        table[0]
    } else if theta < 15.0 {
        table[1]
    } else if theta < 20.0 {
        table[2]
    } else if theta < 30.0 {
        table[3]
    } else if theta < 100.0 {
        table[4]
    } else {
        table[5]
    }
}

/// ITU-R F.699 reference pattern.
pub fn f699_gain(theta_deg: f64, g0_dbi: f64, dish_over_lambda: f64) -> f64 {
    let dl = dish_over_lambda.max(1.0);
    let theta = theta_deg.clamp(0.0, 180.0);
    let g1 = 2.0 + 15.0 * dl.log10();
    let theta_m = 20.0 / dl * (g0_dbi - g1).max(0.0).sqrt();

    if dl > 100.0 {
        // The sidelobe envelope meets the plateau where 32 - 25 log θ = G1.
        let theta_r = 10.0_f64.powf((32.0 - g1) / 25.0);
        if theta < theta_m {
            g0_dbi - 2.5e-3 * (dl * theta).powi(2)
        } else if theta < theta_r {
            g1.min(g0_dbi)
        } else if theta < 48.0 {
            32.0 - 25.0 * theta.log10()
        } else {
            -10.0
        }
    } else {
        let theta_r = 100.0 / dl;
        if theta < theta_m {
            g0_dbi - 2.5e-3 * (dl * theta).powi(2)
        } else if theta < theta_r {
            g1.min(g0_dbi)
        } else if theta < 48.0 {
            52.0 - 10.0 * dl.log10() - 25.0 * theta.log10()
        } else {
            10.0 - 10.0 * dl.log10()
        }
    }
}

/// ITU-R F.1245 average reference pattern. The breakpoint out of the main
/// lobe depends on the dish-to-wavelength ratio.
pub fn f1245_gain(theta_deg: f64, g0_dbi: f64, dish_over_lambda: f64) -> f64 {
    let dl = dish_over_lambda.max(1.0);
    let theta = theta_deg.clamp(0.0, 180.0);
    let g1 = 2.0 + 15.0 * dl.log10();
    let theta_m = 20.0 / dl * (g0_dbi - g1).max(0.0).sqrt();

    if dl > 100.0 {
        let theta_r = 10.0_f64.powf((29.0 - g1) / 25.0);
        if theta < theta_m {
            g0_dbi - 2.5e-3 * (dl * theta).powi(2)
        } else if theta < theta_r {
            g1.min(g0_dbi)
        } else if theta < 48.0 {
            29.0 - 25.0 * theta.log10()
        } else {
            -13.0
        }
    } else {
        let theta_r = 100.0 / dl;
        if theta < theta_m {
            g0_dbi - 2.5e-3 * (dl * theta).powi(2)
        } else if theta < theta_r {
            g1.min(g0_dbi)
        } else if theta < 48.0 {
            49.0 - 10.0 * dl.log10() - 25.0 * theta.log10()
        } else {
            -10.0 - 10.0 * dl.log10()
        }
    }
}

/// ITU-R F.1336-4 omnidirectional average-sidelobe pattern over elevation
/// angle.
pub fn f1336_omni_gain(theta_deg: f64, g0_dbi: f64) -> f64 {
    // Average sidelobe parameter.
    const K: f64 = 0.7;
    let theta = theta_deg.abs().clamp(0.0, 90.0);
    // Elevation 3 dB beamwidth implied by the peak gain.
    let theta3 = 107.6 * 10.0_f64.powf(-0.1 * g0_dbi);
    let theta4 = theta3 * (1.0 - (K + 1.0).log10() / 1.2).max(0.0).sqrt();

    if theta < theta4 {
        g0_dbi - 12.0 * (theta / theta3).powi(2)
    } else {
        g0_dbi - 12.0 + 10.0 * ((theta / theta3).max(1.0).powf(-1.5) + K).log10()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use float_cmp::assert_approx_eq;

    fn f1245_antenna(g0: f64, dl: f64) -> FsAntenna {
        FsAntenna::new(AntennaPattern::F1245, g0, dl, AntennaCategory::Other)
    }

    #[test]
    fn test_reference_patterns_monotone_main_lobe() {
        // Invariant: F.699 and F.1245 are non-increasing inside the main
        // lobe and never exceed the peak beyond it.
        for (g0, dl) in [(38.0f64, 150.0f64), (32.0, 80.0), (41.5, 200.0)] {
            for pattern in [f699_gain, f1245_gain] {
                let g1 = 2.0 + 15.0 * dl.log10();
                let theta_m = 20.0 / dl * (g0 - g1).max(0.0).sqrt();
                let mut previous = pattern(0.0, g0, dl);
                assert_approx_eq!(f64, previous, g0);
                let steps = 200;
                for i in 1..=steps {
                    let theta = theta_m * i as f64 / steps as f64;
                    let gain = pattern(theta, g0, dl);
                    assert!(gain <= previous + 1.0e-9, "at theta {theta}");
                    previous = gain;
                }
                for theta in [theta_m * 1.5, 10.0, 30.0, 60.0, 120.0, 180.0] {
                    assert!(pattern(theta, g0, dl) <= g0);
                }
            }
        }
    }

    #[test]
    fn test_f699_floor_values() {
        assert_approx_eq!(f64, f699_gain(90.0, 40.0, 150.0), -10.0);
        // Small dish floor is gain-ratio dependent.
        assert_approx_eq!(f64, f699_gain(90.0, 30.0, 50.0), 10.0 - 10.0 * 50.0_f64.log10());
    }

    #[test]
    fn test_f1336_omni_continuity_and_peak() {
        let g0 = 10.0;
        assert_approx_eq!(f64, f1336_omni_gain(0.0, g0), g0);
        // The two branches agree at the transition angle.
        let theta3 = 107.6 * 10.0_f64.powf(-0.1 * g0);
        let theta4 = theta3 * (1.0 - (1.7_f64).log10() / 1.2).sqrt();
        let below = f1336_omni_gain(theta4 - 1.0e-9, g0);
        let above = f1336_omni_gain(theta4 + 1.0e-9, g0);
        assert_approx_eq!(f64, below, above, epsilon = 1.0e-6);
    }

    #[test]
    fn test_lut_adds_peak_gain() {
        let table =
            LinearInterpolator::new(&[(0.0, 0.0), (10.0, -20.0), (180.0, -40.0)]).unwrap();
        let antenna = FsAntenna::new(
            AntennaPattern::Lut(table),
            35.0,
            100.0,
            AntennaCategory::Other,
        );
        assert_approx_eq!(f64, antenna.gain_dbi(0.0, 6000.0, false).unwrap(), 35.0);
        assert_approx_eq!(f64, antenna.gain_dbi(5.0, 6000.0, false).unwrap(), 25.0);
        assert_approx_eq!(f64, antenna.gain_dbi(10.0, 6000.0, false).unwrap(), 15.0);
    }

    #[test]
    fn test_parse_gain_table() {
        let table = parse_gain_table(
            "# boresight first\n0.0, 0.0\n10.0, -20.0\n\n180.0, -40.0\n",
        )
        .unwrap();
        let antenna = FsAntenna::new(
            AntennaPattern::Lut(table),
            30.0,
            100.0,
            AntennaCategory::Other,
        );
        assert_approx_eq!(f64, antenna.gain_dbi(5.0, 6000.0, false).unwrap(), 20.0);

        assert!(matches!(
            parse_gain_table("0.0 0.0\n"),
            Err(Error::BadGainTableLine(_))
        ));
        assert!(matches!(
            parse_gain_table("0.0, 0.0\n"),
            Err(Error::BadGainTable(_))
        ));
    }

    #[test]
    fn test_r2aip07_branches() {
        let high = FsAntenna::new(
            AntennaPattern::R2Aip07,
            40.0,
            150.0,
            AntennaCategory::HighPerformance,
        );
        // Below 5 degrees the reference pattern governs.
        assert_approx_eq!(
            f64,
            high.gain_dbi(2.0, 6000.0, false).unwrap(),
            f699_gain(2.0, 40.0, 150.0)
        );
        // Category A suppression beyond.
        assert_approx_eq!(f64, high.gain_dbi(7.0, 6000.0, false).unwrap(), 15.0);
        assert_approx_eq!(f64, high.gain_dbi(12.0, 6000.0, false).unwrap(), 11.0);
        assert_approx_eq!(f64, high.gain_dbi(150.0, 6000.0, false).unwrap(), -15.0);

        // B2 uses its own table.
        let b2 = FsAntenna::new(AntennaPattern::R2Aip07, 30.0, 80.0, AntennaCategory::B2);
        assert_approx_eq!(f64, b2.gain_dbi(7.0, 6600.0, false).unwrap(), 10.0);

        // Blank model below 38 dBi falls back to B1.
        let other = FsAntenna::new(AntennaPattern::R2Aip07, 33.0, 90.0, AntennaCategory::Other);
        assert_approx_eq!(f64, other.gain_dbi(25.0, 6000.0, false).unwrap(), 1.0);

        // Blank model at or above 38 dBi never claims more suppression than
        // F.699 supports.
        let unknown_a =
            FsAntenna::new(AntennaPattern::R2Aip07, 41.0, 160.0, AntennaCategory::Other);
        let gain = unknown_a.gain_dbi(7.0, 6000.0, false).unwrap();
        let floor = f699_gain(7.0, 41.0, 160.0);
        assert!(gain >= floor - 1.0e-12);
        assert!(gain >= 41.0 - 25.0 - 1.0e-12);

        // Diversity receivers are held to B1.
        assert_approx_eq!(f64, high.gain_dbi(7.0, 6000.0, true).unwrap(), 19.0);
    }

    #[test]
    fn test_r2aip07_frequency_domain() {
        let antenna = FsAntenna::new(
            AntennaPattern::R2Aip07,
            40.0,
            150.0,
            AntennaCategory::HighPerformance,
        );
        assert!(antenna.gain_dbi(10.0, 6425.0, false).is_ok());
        assert!(antenna.gain_dbi(10.0, 6525.0, false).is_ok());
        assert!(matches!(
            antenna.gain_dbi(10.0, 6450.0, false),
            Err(Error::UnsupportedFrequency(_))
        ));
        assert!(matches!(
            antenna.gain_dbi(10.0, 5000.0, false),
            Err(Error::UnsupportedFrequency(_))
        ));
    }

    #[test]
    fn test_aob_clamped() {
        let antenna = f1245_antenna(38.0, 150.0);
        assert_approx_eq!(
            f64,
            antenna.gain_dbi(-3.0, 6000.0, false).unwrap(),
            antenna.gain_dbi(0.0, 6000.0, false).unwrap()
        );
        assert_approx_eq!(
            f64,
            antenna.gain_dbi(200.0, 6000.0, false).unwrap(),
            antenna.gain_dbi(180.0, 6000.0, false).unwrap()
        );
    }

    #[test]
    fn test_beamwidth_properties() {
        let antenna = f1245_antenna(38.0, 150.0);

        // beamwidth(0) = 0 and beamwidth is increasing in the attenuation.
        assert_approx_eq!(f64, antenna.beamwidth_deg(0.0, 6000.0).unwrap(), 0.0);
        let mut previous = 0.0;
        for attn in [1.0, 3.0, 10.0, 20.0, 38.0] {
            let bw = antenna.beamwidth_deg(attn, 6000.0).unwrap();
            assert!(bw >= previous, "beamwidth not increasing at {attn} dB");
            assert!(bw <= 180.0);
            previous = bw;
        }

        // The 3 dB point of the quadratic main lobe is analytic:
        // theta = sqrt(3 / 2.5e-3) / (D/lambda).
        let expected = (3.0_f64 / 2.5e-3).sqrt() / 150.0;
        assert_approx_eq!(
            f64,
            antenna.beamwidth_deg(3.0, 6000.0).unwrap(),
            expected,
            epsilon = 1.0e-6
        );

        // An omni antenna never drops: beamwidth saturates at 180.
        let omni = FsAntenna::new(AntennaPattern::Omni, 10.0, 1.0, AntennaCategory::Other);
        assert_approx_eq!(f64, omni.beamwidth_deg(3.0, 6000.0).unwrap(), 180.0);
    }
}

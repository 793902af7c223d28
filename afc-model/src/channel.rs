//!
//! 6 GHz channelization.
//!
//! Global operating classes map a channel center frequency index (CFI) to a
//! center frequency of `5950 + 5 * cfi` MHz at the class's bandwidth.
//!

use serde::{Deserialize, Serialize};

use crate::band::FrequencyBand;
use crate::result::{Error, Result};

/// How a channel entered the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    InquiredFrequency,
    InquiredChannel,
}

/// Availability label of a channel in the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelColor {
    /// Usable at the maximum EIRP.
    Green,
    /// Usable at a reduced EIRP.
    Yellow,
    /// Denied: the permitted EIRP fell below the configured minimum.
    Red,
    /// Denied: inside an exclusion zone.
    Black,
}

/// One channel under evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub opclass: u8,
    pub cfi: u8,
    pub start_mhz: f64,
    pub stop_mhz: f64,
    pub kind: ChannelKind,
    pub availability: ChannelColor,
    pub max_eirp_dbm: f64,
}

impl Channel {
    pub fn center_mhz(&self) -> f64 {
        (self.start_mhz + self.stop_mhz) / 2.0
    }

    pub fn bandwidth_mhz(&self) -> f64 {
        self.stop_mhz - self.start_mhz
    }
}

/// Channel bandwidth in MHz for a global operating class.
pub fn opclass_bandwidth_mhz(opclass: u8) -> Result<f64> {
    match opclass {
        131 | 136 => Ok(20.0),
        132 => Ok(40.0),
        133 => Ok(80.0),
        134 => Ok(160.0),
        other => Err(Error::UnknownOperatingClass(other)),
    }
}

/// All `(cfi, start_mhz, stop_mhz)` tuples of a global operating class that
/// fall entirely inside one of `bands`.
pub fn opclass_channels(
    opclass: u8,
    bands: &[FrequencyBand],
) -> Result<Vec<(u8, f64, f64)>> {
    let bandwidth = opclass_bandwidth_mhz(opclass)?;
    let cfis: Vec<u8> = match opclass {
        // 20 MHz channels: 1, 5, 9, ... 233.
        131 => (0..59).map(|k| 1 + 4 * k).collect(),
        // 40 MHz: 3, 11, ... 227.
        132 => (0..29).map(|k| 3 + 8 * k).collect(),
        // 80 MHz: 7, 23, ... 215.
        133 => (0..14).map(|k| 7 + 16 * k).collect(),
        // 160 MHz: 15, 47, ... 207.
        134 => (0..7).map(|k| 15 + 32 * k).collect(),
        // The lone 20 MHz channel 2.
        136 => vec![2],
        other => return Err(Error::UnknownOperatingClass(other)),
    };

    Ok(cfis
        .into_iter()
        .filter_map(|cfi| {
            let center = if opclass == 136 {
                5935.0
            } else {
                5950.0 + 5.0 * cfi as f64
            };
            let start = center - bandwidth / 2.0;
            let stop = center + bandwidth / 2.0;
            bands
                .iter()
                .any(|b| b.contains_range(start, stop))
                .then_some((cfi, start, stop))
        })
        .collect())
}

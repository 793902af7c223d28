//!
//! Threshold-exceedance audit output.
//!
//! Every (incumbent, channel, scan point) evaluation whose I/N at maximum
//! EIRP crossed the threshold is recorded, and the rows are written as a
//! gzip-compressed CSV next to the response for offline review.
//!

use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use crate::result::{Error, Result};

/// One threshold-crossing evaluation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExcThrRow {
    pub request_id: String,
    pub callsign: String,
    pub opclass: u8,
    pub cfi: u8,
    pub point_index: usize,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_amsl_m: f64,
    pub distance_m: f64,
    pub path_loss_db: f64,
    pub aob_deg: f64,
    pub coupling_gain_dbi: f64,
    pub i2n_db: f64,
    pub eirp_limit_dbm: f64,
}

/// Write the audit rows as `exc_thr.csv.gz` style output at `path`.
pub fn write_audit(path: &Path, rows: &[ExcThrRow]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::AuditIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = csv::Writer::from_writer(encoder);
    for row in rows {
        writer.serialize(row)?;
    }
    let encoder = writer.into_inner().map_err(|e| Error::AuditIo {
        path: path.display().to_string(),
        source: e.into_error(),
    })?;
    encoder
        .finish()
        .and_then(|mut f| f.flush())
        .map_err(|e| Error::AuditIo {
            path: path.display().to_string(),
            source: e,
        })?;
    Ok(())
}

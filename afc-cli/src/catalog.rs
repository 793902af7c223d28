//!
//! FS catalog loading.
//!
//! The engine consumes fully populated incumbent records; this module maps
//! the on-disk JSON catalog onto them, filling per-band receiver defaults
//! from the configuration where the catalog leaves fields unset.
//!

use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use afc_geo::point::GeoPoint;
use afc_model::antenna::{AntennaCategory, FsAntenna};
use afc_model::config::AfcConfig;
use afc_model::incumbent::{FsLink, FsReceiver, PassiveRepeater, Polarization};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub links: Vec<CatalogLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogLink {
    pub callsign: String,
    pub start_mhz: f64,
    pub stop_mhz: f64,
    pub bandwidth_mhz: f64,
    pub tx: CatalogSite,
    pub rx: CatalogSite,
    #[serde(default)]
    pub diversity_rx: Option<CatalogSite>,
    #[serde(default)]
    pub repeaters: Vec<CatalogRepeater>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSite {
    pub latitude: f64,
    pub longitude: f64,
    pub height_agl_m: f64,
    #[serde(default)]
    pub gain_dbi: f64,
    /// "OMNI", "F.699", "F.1245", "F.1336", "R2-AIP-07".
    #[serde(default)]
    pub antenna_pattern: Option<String>,
    /// Plain-text `<angle_deg>, <gain_db>` table, relative to the catalog
    /// file; overrides `antenna_pattern` when present.
    #[serde(default)]
    pub gain_table_file: Option<String>,
    /// "A" (known high performance), "B1", "B2"; blank means unverified.
    #[serde(default)]
    pub antenna_category: Option<String>,
    #[serde(default)]
    pub dish_over_lambda: Option<f64>,
    #[serde(default)]
    pub feeder_loss_db: Option<f64>,
    #[serde(default)]
    pub noise_psd_dbm_per_mhz: Option<f64>,
    #[serde(default)]
    pub polarization: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum CatalogRepeater {
    BackToBack {
        latitude: f64,
        longitude: f64,
        rx_height_agl_m: f64,
        tx_height_agl_m: f64,
        gain_dbi: f64,
        #[serde(default)]
        dish_over_lambda: Option<f64>,
    },
    Billboard {
        latitude: f64,
        longitude: f64,
        rx_height_agl_m: f64,
        tx_height_agl_m: f64,
        width_over_lambda: f64,
        height_over_lambda: f64,
        incidence_angle_deg: f64,
        reflection_ks: f64,
        reflection_q: f64,
    },
}

/// Load the catalog file and materialize the incumbent records.
pub fn load_catalog(path: &Path, config: &AfcConfig) -> anyhow::Result<Vec<FsLink>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading FS catalog {}", path.display()))?;
    let document: CatalogDocument = serde_json::from_str(&text)
        .with_context(|| format!("parsing FS catalog {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    document
        .links
        .into_iter()
        .map(|link| materialize(link, base, config))
        .collect()
}

fn materialize(link: CatalogLink, base: &Path, config: &AfcConfig) -> anyhow::Result<FsLink> {
    let center_mhz = (link.start_mhz + link.stop_mhz) / 2.0;
    let rx = receiver(&link.rx, base, center_mhz, config, &link.callsign)?;
    let diversity_rx = link
        .diversity_rx
        .as_ref()
        .map(|site| receiver(site, base, center_mhz, config, &link.callsign))
        .transpose()?;

    let repeaters = link
        .repeaters
        .into_iter()
        .map(|pr| repeater(pr, config))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(FsLink {
        id: link.callsign,
        start_mhz: link.start_mhz,
        stop_mhz: link.stop_mhz,
        bandwidth_mhz: link.bandwidth_mhz,
        tx_position: GeoPoint::new(link.tx.latitude, link.tx.longitude)?,
        tx_height_agl_m: link.tx.height_agl_m,
        rx,
        diversity_rx,
        repeaters,
        path_loss_bounds: None,
    })
}

fn receiver(
    site: &CatalogSite,
    base: &Path,
    center_mhz: f64,
    config: &AfcConfig,
    callsign: &str,
) -> anyhow::Result<FsReceiver> {
    let defaults = config
        .band_defaults_for(center_mhz)
        .with_context(|| format!("no band defaults cover {callsign} at {center_mhz} MHz"))?;

    let antenna = if let Some(table_file) = &site.gain_table_file {
        let table_path = base.join(table_file);
        let text = std::fs::read_to_string(&table_path)
            .with_context(|| format!("reading gain table {}", table_path.display()))?;
        let table = afc_model::antenna::parse_gain_table(&text)
            .with_context(|| format!("gain table for {callsign}"))?;
        FsAntenna::new(
            afc_model::antenna::AntennaPattern::Lut(table),
            site.gain_dbi,
            site.dish_over_lambda.unwrap_or(150.0),
            category(site.antenna_category.as_deref()),
        )
    } else {
        let pattern = site
            .antenna_pattern
            .as_deref()
            .unwrap_or(config.antenna_pattern.as_str());
        FsAntenna::from_pattern_name(
            pattern,
            site.gain_dbi,
            site.dish_over_lambda.unwrap_or(150.0),
            category(site.antenna_category.as_deref()),
        )
        .with_context(|| format!("antenna for {callsign}"))?
    };

    Ok(FsReceiver {
        position: GeoPoint::new(site.latitude, site.longitude)?,
        height_agl_m: site.height_agl_m,
        antenna,
        feeder_loss_db: site.feeder_loss_db.unwrap_or(defaults.feeder_loss_db),
        noise_psd_dbm_per_mhz: site
            .noise_psd_dbm_per_mhz
            .unwrap_or(defaults.noise_psd_dbm_per_mhz),
        polarization: polarization(site.polarization.as_deref())?,
    })
}

fn repeater(pr: CatalogRepeater, config: &AfcConfig) -> anyhow::Result<PassiveRepeater> {
    Ok(match pr {
        CatalogRepeater::BackToBack {
            latitude,
            longitude,
            rx_height_agl_m,
            tx_height_agl_m,
            gain_dbi,
            dish_over_lambda,
        } => PassiveRepeater::BackToBack {
            position: GeoPoint::new(latitude, longitude)?,
            rx_height_agl_m,
            tx_height_agl_m,
            antenna: FsAntenna::from_pattern_name(
                config.antenna_pattern.as_str(),
                gain_dbi,
                dish_over_lambda.unwrap_or(150.0),
                AntennaCategory::Other,
            )?,
        },
        CatalogRepeater::Billboard {
            latitude,
            longitude,
            rx_height_agl_m,
            tx_height_agl_m,
            width_over_lambda,
            height_over_lambda,
            incidence_angle_deg,
            reflection_ks,
            reflection_q,
        } => PassiveRepeater::Billboard {
            position: GeoPoint::new(latitude, longitude)?,
            rx_height_agl_m,
            tx_height_agl_m,
            width_over_lambda,
            height_over_lambda,
            incidence_angle_deg,
            reflection_ks,
            reflection_q,
        },
    })
}

fn category(label: Option<&str>) -> AntennaCategory {
    match label.map(str::trim) {
        Some("A") => AntennaCategory::HighPerformance,
        Some("B1") => AntennaCategory::B1,
        Some("B2") => AntennaCategory::B2,
        _ => AntennaCategory::Other,
    }
}

fn polarization(label: Option<&str>) -> anyhow::Result<Polarization> {
    match label.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
        Some("H") | Some("HORIZONTAL") => Ok(Polarization::Horizontal),
        Some("V") | Some("VERTICAL") => Ok(Polarization::Vertical),
        None | Some("") => Ok(Polarization::Unknown),
        Some(other) => bail!("unknown polarization {other:?}"),
    }
}

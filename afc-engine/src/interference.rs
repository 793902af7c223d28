//!
//! Per-link interference evaluation.
//!
//! One evaluation takes an RLAN sample point at a height, one FS incumbent,
//! and one channel, and produces the interference-to-noise ratio at the
//! incumbent's LNA together with the EIRP that would drive it exactly to
//! the configured threshold. Deterministic for a given input tuple; the only
//! I/O is through the shared raster caches.
//!

use afc_geo::point::GeoPoint;
use afc_geo::vec3;
use afc_model::channel::Channel;
use afc_model::config::AfcConfig;
use afc_model::incumbent::{FsLink, FsReceiver, PassiveRepeater};
use afc_terrain::population::{PopulationGrid, PropEnv};
use afc_terrain::terrain::TerrainStack;

use crate::profile::path_profile;
use crate::propagation::{free_space_path_loss_db, PathGeometry, PropagationModel};
use crate::result::Result;

/// Shared read-only state for link evaluations.
pub struct EvalContext<'a> {
    pub config: &'a AfcConfig,
    pub terrain: &'a TerrainStack,
    pub population: Option<&'a PopulationGrid>,
    pub model: &'a dyn PropagationModel,
}

impl<'a> EvalContext<'a> {
    fn environment_at(&self, point: GeoPoint) -> PropEnv {
        self.population
            .map_or(PropEnv::Undefined, |grid| {
                grid.env_at(point.latitude_deg, point.longitude_deg)
            })
    }
}

/// The result of evaluating one (RLAN point, incumbent, channel) triple.
#[derive(Clone, Debug)]
pub struct LinkEvaluation {
    /// Slant distance from the RLAN to the coupling node.
    pub distance_m: f64,
    /// Median path loss excluding clutter.
    pub path_loss_db: f64,
    /// Clutter at the RLAN end, plus the FS end when configured.
    pub clutter_db: f64,
    /// Building entry loss applied for indoor deployments.
    pub building_loss_db: f64,
    /// Angle off the FS antenna boresight toward the RLAN.
    pub aob_deg: f64,
    /// Effective FS-side gain: receive antenna or full repeater chain,
    /// feeder loss excluded.
    pub coupling_gain_dbi: f64,
    /// I/N at the LNA with the ruleset's maximum EIRP.
    pub i2n_at_max_eirp_db: f64,
    /// The EIRP that drives I/N exactly to the threshold.
    pub eirp_limit_dbm: f64,
}

/// Evaluate one RLAN sample point against one incumbent and channel,
/// covering the diversity receiver when the link has one. The returned
/// limit is the more restrictive of the two receivers.
pub fn evaluate_link(
    ctx: &EvalContext<'_>,
    rlan: GeoPoint,
    rlan_height_amsl_m: f64,
    indoor: bool,
    link: &FsLink,
    channel: &Channel,
) -> Result<LinkEvaluation> {
    let primary = evaluate_receiver(
        ctx,
        rlan,
        rlan_height_amsl_m,
        indoor,
        link,
        channel,
        &link.rx,
        false,
    )?;

    let Some(diversity) = &link.diversity_rx else {
        return Ok(primary);
    };
    let diverse = evaluate_receiver(
        ctx,
        rlan,
        rlan_height_amsl_m,
        indoor,
        link,
        channel,
        diversity,
        true,
    )?;
    Ok(if diverse.eirp_limit_dbm < primary.eirp_limit_dbm {
        diverse
    } else {
        primary
    })
}

#[allow(clippy::too_many_arguments)]
fn evaluate_receiver(
    ctx: &EvalContext<'_>,
    rlan: GeoPoint,
    rlan_height_amsl_m: f64,
    indoor: bool,
    link: &FsLink,
    channel: &Channel,
    receiver: &FsReceiver,
    diversity: bool,
) -> Result<LinkEvaluation> {
    let config = ctx.config;
    let freq_mhz = channel.center_mhz();

    // The node the RLAN couples into: the nearest repeater's outward face,
    // or this receiver directly.
    let (hop_position, hop_agl) = match link.repeaters.first() {
        Some(pr) => (pr.position(), pr.rx_height_agl_m()),
        None => (receiver.position, receiver.height_agl_m),
    };
    let hop_terrain = ctx
        .terrain
        .terrain_height(hop_position.latitude_deg, hop_position.longitude_deg, false)?
        .terrain_m;
    let hop_amsl = hop_terrain + hop_agl;

    let profile = path_profile(ctx.terrain, rlan, hop_position, config.profile_step_m)?;
    let ground_m = profile.distance_m();
    let slant_m = (ground_m.powi(2) + (hop_amsl - rlan_height_amsl_m).powi(2))
        .sqrt()
        .max(1.0);

    let geometry = PathGeometry {
        distance_m: slant_m,
        tx_height_amsl_m: rlan_height_amsl_m,
        rx_height_amsl_m: hop_amsl,
    };
    let path_loss_db = ctx.model.path_loss_db(&geometry, &profile, freq_mhz)?;

    let mut clutter_db = ctx.model.clutter_db(ctx.environment_at(rlan));
    if config.clutter_at_fs {
        clutter_db += ctx.model.clutter_db(ctx.environment_at(hop_position));
    }

    let building_loss_db = if indoor {
        config.building_loss.fixed_db
    } else {
        0.0
    };

    // Angle off boresight at the coupling node.
    let rlan_ecef = rlan.to_ecef(rlan_height_amsl_m);
    let hop_ecef = hop_position.to_ecef(hop_amsl);
    let (target_position, target_agl) = match link.repeaters.first() {
        Some(_) => link.last_hop_pointing_target(),
        None => (link.tx_position, link.tx_height_agl_m),
    };
    let target_terrain = ctx
        .terrain
        .terrain_height(
            target_position.latitude_deg,
            target_position.longitude_deg,
            false,
        )?
        .terrain_m;
    let target_ecef = target_position.to_ecef(target_terrain + target_agl);
    let to_rlan = vec3::normalize(vec3::sub(rlan_ecef, hop_ecef));
    let boresight = vec3::normalize(vec3::sub(target_ecef, hop_ecef));
    let aob_deg = vec3::dot(to_rlan, boresight)
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees();

    // Effective FS-side gain: direct receive gain, or the repeater chain's
    // coupling, per-segment losses, and main-lobe gains down to the LNA.
    let coupling_gain_dbi = if link.repeaters.is_empty() {
        receiver.antenna.gain_dbi(aob_deg, freq_mhz, diversity)?
    } else {
        repeater_chain_gain_dbi(ctx, link, receiver, aob_deg, freq_mhz)?
    };

    let eirp_psd = config.max_eirp_dbm - 10.0 * channel.bandwidth_mhz().log10();
    let interference_psd = eirp_psd - path_loss_db - clutter_db - building_loss_db
        - config.body_loss_db
        - config.polarization_mismatch_loss_db
        + coupling_gain_dbi
        - receiver.feeder_loss_db;
    let i2n_at_max_eirp_db = interference_psd - receiver.noise_psd_dbm_per_mhz;

    // I/N is linear in EIRP, so the limit follows directly.
    let eirp_limit_dbm = config.max_eirp_dbm + (config.threshold_i2n_db - i2n_at_max_eirp_db);

    Ok(LinkEvaluation {
        distance_m: slant_m,
        path_loss_db,
        clutter_db,
        building_loss_db,
        aob_deg,
        coupling_gain_dbi,
        i2n_at_max_eirp_db,
        eirp_limit_dbm,
    })
}

/// Gain through a passive-repeater chain: coupling into the first
/// repeater's outward face at the given angle, then per-segment free-space
/// losses with main-lobe gains at every subsequent face, ending at the
/// receiver's antenna.
fn repeater_chain_gain_dbi(
    ctx: &EvalContext<'_>,
    link: &FsLink,
    receiver: &FsReceiver,
    aob_deg: f64,
    freq_mhz: f64,
) -> Result<f64> {
    let mut gain = match &link.repeaters[0] {
        PassiveRepeater::BackToBack { antenna, .. } => {
            antenna.gain_dbi(aob_deg, freq_mhz, false)?
        }
        pr @ PassiveRepeater::Billboard { .. } => {
            billboard_aperture_gain_dbi(pr) + pr.discrimination_db(aob_deg, freq_mhz)?
        }
    };

    let amsl_of = |position: GeoPoint, agl: f64| -> Result<f64> {
        Ok(ctx
            .terrain
            .terrain_height(position.latitude_deg, position.longitude_deg, false)?
            .terrain_m
            + agl)
    };

    for k in 0..link.repeaters.len() {
        let node = &link.repeaters[k];
        let node_amsl = amsl_of(node.position(), node.tx_height_agl_m())?;

        // The face feeding the next segment toward the receiver.
        if let PassiveRepeater::BackToBack { antenna, .. } = node {
            gain += antenna.max_gain_dbi();
        }

        let (next_position, next_amsl, next_gain) = match link.repeaters.get(k + 1) {
            Some(next) => {
                let amsl = amsl_of(next.position(), next.rx_height_agl_m())?;
                let g = match next {
                    PassiveRepeater::BackToBack { antenna, .. } => antenna.max_gain_dbi(),
                    pr @ PassiveRepeater::Billboard { .. } => billboard_aperture_gain_dbi(pr),
                };
                (next.position(), amsl, g)
            }
            None => (
                receiver.position,
                amsl_of(receiver.position, receiver.height_agl_m)?,
                receiver.antenna.max_gain_dbi(),
            ),
        };

        let ground = node.position().distance_m(&next_position);
        let slant = (ground.powi(2) + (next_amsl - node_amsl).powi(2)).sqrt().max(1.0);
        gain += next_gain - free_space_path_loss_db(slant, freq_mhz);
    }

    Ok(gain)
}

fn billboard_aperture_gain_dbi(pr: &PassiveRepeater) -> f64 {
    match pr {
        PassiveRepeater::Billboard {
            width_over_lambda,
            height_over_lambda,
            incidence_angle_deg,
            ..
        } => {
            let cos_in = incidence_angle_deg.to_radians().cos().max(1.0e-6);
            10.0 * (4.0 * std::f64::consts::PI * width_over_lambda * height_over_lambda * cos_in)
                .log10()
        }
        PassiveRepeater::BackToBack { .. } => 0.0,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::propagation::FreeSpace;
    use afc_model::antenna::{AntennaCategory, AntennaPattern, FsAntenna};
    use afc_model::channel::{Channel, ChannelColor, ChannelKind};
    use afc_model::incumbent::Polarization;
    use afc_terrain::terrain::TerrainStackSources;
    use float_cmp::assert_approx_eq;

    const RLAN: GeoPoint = GeoPoint {
        latitude_deg: 40.75,
        longitude_deg: -73.97,
    };

    fn flat_terrain() -> TerrainStack {
        TerrainStack::new(TerrainStackSources::default())
    }

    fn channel_80() -> Channel {
        Channel {
            opclass: 133,
            cfi: 7,
            start_mhz: 5945.0,
            stop_mhz: 6025.0,
            kind: ChannelKind::InquiredChannel,
            availability: ChannelColor::Green,
            max_eirp_dbm: 36.0,
        }
    }

    fn omni_receiver(position: GeoPoint, gain: f64) -> FsReceiver {
        FsReceiver {
            position,
            height_agl_m: 30.0,
            antenna: FsAntenna::new(AntennaPattern::Omni, gain, 150.0, AntennaCategory::Other),
            feeder_loss_db: 2.0,
            noise_psd_dbm_per_mhz: -110.0,
            polarization: Polarization::Vertical,
        }
    }

    fn plain_link(rx: FsReceiver) -> FsLink {
        let tx = rx.position.destination(0.0, 20_000.0);
        FsLink {
            id: "WTEST1".to_string(),
            start_mhz: 5945.0,
            stop_mhz: 6025.0,
            bandwidth_mhz: 30.0,
            tx_position: tx,
            tx_height_agl_m: 50.0,
            rx,
            diversity_rx: None,
            repeaters: vec![],
            path_loss_bounds: None,
        }
    }

    #[test]
    fn test_i2n_hand_computed() {
        let terrain = flat_terrain();
        let config = AfcConfig {
            body_loss_db: 0.0,
            polarization_mismatch_loss_db: 0.0,
            ..AfcConfig::default()
        };
        let model = FreeSpace;
        let ctx = EvalContext {
            config: &config,
            terrain: &terrain,
            population: None,
            model: &model,
        };

        // Receiver 10 km east of the RLAN, omni 10 dBi antenna.
        let rx = omni_receiver(RLAN.destination(90.0, 10_000.0), 10.0);
        let link = plain_link(rx);
        let eval = evaluate_link(&ctx, RLAN, 30.0, false, &link, &channel_80()).unwrap();

        // Hand composition: PSD = 36 - 10log10(80); FSPL at the slant
        // distance; + 10 dBi - 2 dB feeder; N = -110.
        let expected_psd = 36.0 - 10.0 * 80.0_f64.log10();
        let fspl = free_space_path_loss_db(eval.distance_m, 5985.0);
        let expected_i2n = expected_psd - fspl + 10.0 - 2.0 + 110.0;
        assert_approx_eq!(f64, eval.i2n_at_max_eirp_db, expected_i2n, epsilon = 1.0e-9);

        // The limit is the EIRP that lands exactly on the threshold.
        assert_approx_eq!(
            f64,
            eval.eirp_limit_dbm,
            36.0 + (-6.0 - expected_i2n),
            epsilon = 1.0e-9
        );
    }

    #[test]
    fn test_indoor_gains_building_loss() {
        let terrain = flat_terrain();
        let config = AfcConfig::default();
        let model = FreeSpace;
        let ctx = EvalContext {
            config: &config,
            terrain: &terrain,
            population: None,
            model: &model,
        };
        let rx = omni_receiver(RLAN.destination(90.0, 10_000.0), 10.0);
        let link = plain_link(rx);

        let outdoor = evaluate_link(&ctx, RLAN, 30.0, false, &link, &channel_80()).unwrap();
        let indoor = evaluate_link(&ctx, RLAN, 30.0, true, &link, &channel_80()).unwrap();
        assert_approx_eq!(
            f64,
            outdoor.i2n_at_max_eirp_db - indoor.i2n_at_max_eirp_db,
            config.building_loss.fixed_db,
            epsilon = 1.0e-9
        );
        assert_approx_eq!(
            f64,
            indoor.eirp_limit_dbm - outdoor.eirp_limit_dbm,
            config.building_loss.fixed_db,
            epsilon = 1.0e-9
        );
    }

    #[test]
    fn test_antenna_discrimination_matters() {
        let terrain = flat_terrain();
        let config = AfcConfig::default();
        let model = FreeSpace;
        let ctx = EvalContext {
            config: &config,
            terrain: &terrain,
            population: None,
            model: &model,
        };

        // A directional receiver pointing away from the RLAN (its tx is
        // further east) sees the RLAN far off boresight.
        let rx_position = RLAN.destination(90.0, 10_000.0);
        let mut rx = omni_receiver(rx_position, 38.0);
        rx.antenna = FsAntenna::new(
            AntennaPattern::F1245,
            38.0,
            150.0,
            AntennaCategory::Other,
        );
        let mut link = plain_link(rx);
        link.tx_position = rx_position.destination(90.0, 20_000.0);

        let away = evaluate_link(&ctx, RLAN, 30.0, false, &link, &channel_80()).unwrap();
        assert!(away.aob_deg > 170.0);

        // Re-aim the link so the receiver stares straight at the RLAN.
        link.tx_position = RLAN;
        link.tx_height_agl_m = 30.0;
        let at_us = evaluate_link(&ctx, RLAN, 30.0, false, &link, &channel_80()).unwrap();
        assert!(at_us.aob_deg < 1.0);
        assert!(at_us.i2n_at_max_eirp_db > away.i2n_at_max_eirp_db + 40.0);
        assert!(at_us.eirp_limit_dbm < away.eirp_limit_dbm);
    }

    #[test]
    fn test_diversity_takes_the_tighter_limit() {
        let terrain = flat_terrain();
        let config = AfcConfig::default();
        let model = FreeSpace;
        let ctx = EvalContext {
            config: &config,
            terrain: &terrain,
            population: None,
            model: &model,
        };

        let rx_position = RLAN.destination(90.0, 10_000.0);
        let rx = omni_receiver(rx_position, 10.0);
        // Diversity antenna with a hotter gain is the binding receiver.
        let mut diversity = omni_receiver(rx_position, 20.0);
        diversity.height_agl_m = 20.0;

        let mut link = plain_link(rx);
        let solo = evaluate_link(&ctx, RLAN, 30.0, false, &link, &channel_80()).unwrap();
        link.diversity_rx = Some(diversity);
        let paired = evaluate_link(&ctx, RLAN, 30.0, false, &link, &channel_80()).unwrap();
        assert!(paired.eirp_limit_dbm < solo.eirp_limit_dbm);
    }

    #[test]
    fn test_repeater_chain_composition() {
        let terrain = flat_terrain();
        let config = AfcConfig {
            body_loss_db: 0.0,
            polarization_mismatch_loss_db: 0.0,
            ..AfcConfig::default()
        };
        let model = FreeSpace;
        let ctx = EvalContext {
            config: &config,
            terrain: &terrain,
            population: None,
            model: &model,
        };

        let rx_position = RLAN.destination(90.0, 15_000.0);
        let pr_position = RLAN.destination(90.0, 10_000.0);
        let rx = omni_receiver(rx_position, 30.0);
        let pr_antenna =
            FsAntenna::new(AntennaPattern::Omni, 35.0, 150.0, AntennaCategory::Other);
        let mut link = plain_link(rx);
        link.repeaters = vec![PassiveRepeater::BackToBack {
            position: pr_position,
            rx_height_agl_m: 40.0,
            tx_height_agl_m: 40.0,
            antenna: pr_antenna,
        }];
        // The transmitter sits beyond the repeater, west of the RLAN.
        link.tx_position = RLAN.destination(270.0, 10_000.0);

        let eval = evaluate_link(&ctx, RLAN, 30.0, false, &link, &channel_80()).unwrap();

        // Chain: omni coupling 35 dBi + out face 35 dBi - segment FSPL +
        // receive 30 dBi.
        let seg_ground = pr_position.distance_m(&rx_position);
        let seg_slant = (seg_ground.powi(2) + (30.0_f64 - 40.0).powi(2)).sqrt();
        let expected_chain =
            35.0 + 35.0 - free_space_path_loss_db(seg_slant, 5985.0) + 30.0;
        assert_approx_eq!(f64, eval.coupling_gain_dbi, expected_chain, epsilon = 1.0e-6);

        // The RLAN's path loss runs to the repeater, not the receiver.
        let d_expected = 10_000.0;
        assert!((eval.distance_m - d_expected).abs() < 5.0);
    }
}

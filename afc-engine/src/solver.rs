//!
//! The per-request EIRP solver.
//!
//! For each inquiry: build and configure the uncertainty region, window the
//! FS catalog around it, bound I/N over the region's scan points and height
//! extremes for every (channel, incumbent) pair, and reduce to the most
//! restrictive per-channel EIRP with its availability color. Incumbents are
//! evaluated in parallel; the reduction is a plain minimum, so scheduling
//! order never shows in the output.
//!

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use afc_geo::point::GeoPoint;
use afc_geo::vec3;
use afc_model::channel::{opclass_channels, Channel, ChannelColor, ChannelKind};
use afc_model::config::AfcConfig;
use afc_model::incumbent::{FsLink, PathLossBounds};
use afc_model::ras::RasZone;
use afc_model::request::{
    FrequencyRange, LocationShape, SpectrumInquiryRequest, SpectrumInquiryRequestDocument,
};
use afc_model::response::{
    ChannelInfo, FrequencyInfo, ResponseCode, ResponseStatus, SpectrumInquiryResponse,
    SpectrumInquiryResponseDocument, RULESET_US,
};
use afc_terrain::population::PopulationGrid;
use afc_terrain::terrain::TerrainStack;

use crate::excthr::ExcThrRow;
use crate::interference::{evaluate_link, EvalContext};
use crate::propagation::{free_space_path_loss_db, PropagationModel};
use crate::region::{RlanRegion, ScanMethod};
use crate::result::{Error, InquiryError, Result};

/// Protocol versions this engine answers.
const SUPPORTED_VERSIONS: &[&str] = &["1.4"];

/// Margin subtracted from the free-space bound during catalog windowing so
/// confidence-shifted models cannot defeat the prefilter.
const PREFILTER_MARGIN_DB: f64 = 20.0;

/// Read-only state shared by every inquiry of a request.
pub struct SolverInputs<'a> {
    pub config: &'a AfcConfig,
    pub terrain: &'a TerrainStack,
    pub population: Option<&'a PopulationGrid>,
    pub catalog: &'a [FsLink],
    pub ras: &'a [RasZone],
    pub model: &'a dyn PropagationModel,
}

/// One evaluated channel with its availability.
#[derive(Clone, Debug)]
pub struct ChannelResult {
    pub channel: Channel,
    pub color: ChannelColor,
    /// Permitted EIRP clamped to the configured bounds.
    pub eirp_dbm: f64,
}

/// Everything the solver produced for one request.
#[derive(Debug)]
pub struct SolveOutput {
    pub document: SpectrumInquiryResponseDocument,
    pub audit: Vec<ExcThrRow>,
}

/// Solve a whole request document. Per-inquiry failures become response
/// codes; missing reference data stays fatal.
pub fn solve_request(
    inputs: &SolverInputs<'_>,
    request: &SpectrumInquiryRequestDocument,
    cancel: &AtomicBool,
) -> Result<SolveOutput> {
    let started = Instant::now();
    let mut responses = Vec::with_capacity(request.available_spectrum_inquiry_requests.len());
    let mut audit = Vec::new();

    let version_ok = SUPPORTED_VERSIONS.contains(&request.version.as_str());

    for inquiry in &request.available_spectrum_inquiry_requests {
        if !version_ok {
            responses.push(failure_response(
                inquiry,
                ResponseStatus::from_code(ResponseCode::VersionNotSupported),
            ));
            continue;
        }

        match solve_inquiry(inputs, inquiry, cancel, started) {
            Ok((response, mut rows)) => {
                audit.append(&mut rows);
                responses.push(response);
            }
            Err(Error::Inquiry(e)) => {
                info!("inquiry {} rejected: {e}", inquiry.request_id);
                responses.push(failure_response(
                    inquiry,
                    ResponseStatus::failure(e.response_code(), e.to_string()),
                ));
            }
            Err(fatal) => return Err(fatal),
        }
    }

    audit.sort_by(|a, b| {
        (a.request_id.as_str(), a.callsign.as_str(), a.opclass, a.cfi, a.point_index).cmp(&(
            b.request_id.as_str(),
            b.callsign.as_str(),
            b.opclass,
            b.cfi,
            b.point_index,
        ))
    });

    Ok(SolveOutput {
        document: SpectrumInquiryResponseDocument {
            version: request.version.clone(),
            available_spectrum_inquiry_responses: responses,
        },
        audit,
    })
}

fn failure_response(
    inquiry: &SpectrumInquiryRequest,
    status: ResponseStatus,
) -> SpectrumInquiryResponse {
    SpectrumInquiryResponse {
        request_id: inquiry.request_id.clone(),
        ruleset_id: RULESET_US.to_string(),
        response: status,
        available_frequency_info: None,
        available_channel_info: None,
        availability_expire_time: None,
    }
}

fn solve_inquiry(
    inputs: &SolverInputs<'_>,
    inquiry: &SpectrumInquiryRequest,
    cancel: &AtomicBool,
    started: Instant,
) -> Result<(SpectrumInquiryResponse, Vec<ExcThrRow>)> {
    let config = inputs.config;

    let mut region = build_region(config, inquiry)?;
    region.configure(inputs.terrain)?;

    let mut channels = build_channels(config, inquiry)?;
    let scan_points = region.scan(ScanMethod::NorthEast {
        resolution_m: config.scan_resolution_m,
    })?;
    let scan_points = if scan_points.is_empty() {
        vec![region.center()]
    } else {
        scan_points
    };

    let indoor = inquiry.location.is_indoor();
    let h_min = region.min_height_amsl()?;
    let h_max = region.max_height_amsl()?;
    let max_agl = region.max_height_agl()?;

    let windowed = window_catalog(inputs, &region)?;
    debug!(
        "inquiry {}: {} scan points, {} incumbents in window",
        inquiry.request_id,
        scan_points.len(),
        windowed.len()
    );

    let ctx = EvalContext {
        config,
        terrain: inputs.terrain,
        population: inputs.population,
        model: inputs.model,
    };

    let mut results = Vec::with_capacity(channels.len());
    let mut audit = Vec::new();

    for channel in channels.drain(..) {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        if started.elapsed().as_secs_f64() > config.request_timeout_s {
            return Err(Error::Timeout);
        }

        // Exclusion zones turn the whole channel black.
        let denied = inputs.ras.iter().any(|zone| {
            scan_points
                .iter()
                .any(|p| zone.denies(*p, max_agl, channel.start_mhz, channel.stop_mhz))
        });
        if denied {
            results.push(ChannelResult {
                eirp_dbm: config.min_eirp_dbm,
                color: ChannelColor::Black,
                channel,
            });
            continue;
        }

        let relevant: Vec<&FsLink> = windowed
            .iter()
            .filter(|link| link.overlap_mhz(channel.start_mhz, channel.stop_mhz) > 0.0)
            .collect();

        #[cfg(feature = "parallel")]
        let iterator = relevant.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iterator = relevant.iter();

        let per_incumbent: Vec<(f64, Vec<ExcThrRow>)> = iterator
            .map(|link| evaluate_incumbent(&ctx, inquiry, &scan_points, h_min, h_max, indoor, link, &channel))
            .collect::<Result<_>>()?;

        // Most restrictive incumbent wins; min is order-independent.
        let mut limit = f64::INFINITY;
        for (incumbent_limit, mut rows) in per_incumbent {
            limit = limit.min(incumbent_limit);
            audit.append(&mut rows);
        }

        let clamped = limit.min(config.max_eirp_dbm);
        let color = if limit >= config.max_eirp_dbm {
            ChannelColor::Green
        } else if clamped >= config.min_eirp_dbm {
            ChannelColor::Yellow
        } else {
            ChannelColor::Red
        };
        results.push(ChannelResult {
            eirp_dbm: clamped.max(config.min_eirp_dbm),
            color,
            channel,
        });
    }

    let response = assemble_response(inquiry, &results);
    Ok((response, audit))
}

/// Construct the uncertainty region from the inquiry location, widened by
/// the configured AP uncertainty padding.
fn build_region(config: &AfcConfig, inquiry: &SpectrumInquiryRequest) -> Result<RlanRegion> {
    let location = &inquiry.location;
    let height = location
        .elevation
        .to_height()
        .map_err(|_| InquiryError::BadHeightType(location.elevation.height_type.clone()))?;
    let vertical = location.elevation.vertical_uncertainty + config.ap_uncertainty.vertical_m;
    let pad = config.ap_uncertainty.horizontal_m;

    match location.shape().map_err(|_| InquiryError::BadLocation)? {
        LocationShape::Ellipse(e) => {
            let center = GeoPoint::new(e.center.latitude, e.center.longitude)
                .map_err(|_| InquiryError::BadCoordinates(e.center.latitude, e.center.longitude))?;
            RlanRegion::ellipse(
                center,
                height,
                vertical,
                e.minor_axis + pad,
                e.major_axis + pad,
                e.orientation,
            )
        }
        LocationShape::LinearPolygon(p) => {
            let vertices: Vec<GeoPoint> = p
                .outer_boundary
                .iter()
                .map(|v| {
                    GeoPoint::new(v.latitude, v.longitude)
                        .map_err(|_| InquiryError::BadCoordinates(v.latitude, v.longitude))
                })
                .collect::<std::result::Result<_, _>>()?;
            RlanRegion::linear_polygon(&vertices, height, vertical)
        }
        LocationShape::RadialPolygon(r) => {
            let center = GeoPoint::new(r.center.latitude, r.center.longitude)
                .map_err(|_| InquiryError::BadCoordinates(r.center.latitude, r.center.longitude))?;
            let vectors: Vec<(f64, f64)> = r
                .outer_boundary
                .iter()
                .map(|v| (v.angle, v.length + pad))
                .collect();
            RlanRegion::radial_polygon(center, &vectors, height, vertical)
        }
    }
}

/// Materialize the channel list: explicit channel inquiries at their plan
/// bandwidths, plus 20 MHz probe channels covering inquired frequency
/// ranges.
fn build_channels(config: &AfcConfig, inquiry: &SpectrumInquiryRequest) -> Result<Vec<Channel>> {
    let mut channels = Vec::new();

    if let Some(inquired) = &inquiry.inquired_channels {
        for entry in inquired {
            let plan = opclass_channels(entry.global_operating_class, &config.bands)
                .map_err(|_| InquiryError::UnknownOperatingClass(entry.global_operating_class))?;
            for (cfi, start, stop) in plan {
                if let Some(filter) = &entry.channel_cfi {
                    if !filter.contains(&cfi) {
                        continue;
                    }
                }
                channels.push(Channel {
                    opclass: entry.global_operating_class,
                    cfi,
                    start_mhz: start,
                    stop_mhz: stop,
                    kind: ChannelKind::InquiredChannel,
                    availability: ChannelColor::Green,
                    max_eirp_dbm: config.max_eirp_dbm,
                });
            }
        }
    }

    if let Some(ranges) = &inquiry.inquired_frequency_range {
        let plan = opclass_channels(131, &config.bands)
            .map_err(|_| InquiryError::UnknownOperatingClass(131))?;
        for range in ranges {
            for &(cfi, start, stop) in &plan {
                let overlap = stop.min(range.high_frequency) - start.max(range.low_frequency);
                if overlap > 0.0 {
                    channels.push(Channel {
                        opclass: 131,
                        cfi,
                        start_mhz: start,
                        stop_mhz: stop,
                        kind: ChannelKind::InquiredFrequency,
                        availability: ChannelColor::Green,
                        max_eirp_dbm: config.max_eirp_dbm,
                    });
                }
            }
        }
    }

    if inquiry.inquired_channels.is_none() && inquiry.inquired_frequency_range.is_none() {
        return Err(InquiryError::EmptyInquiry.into());
    }
    if channels.is_empty() {
        return Err(InquiryError::UnsupportedSpectrum.into());
    }

    // One evaluation per distinct channel even when a frequency range and a
    // channel inquiry cover the same spectrum.
    channels.sort_by(|a, b| {
        (a.kind == ChannelKind::InquiredFrequency, a.opclass, a.cfi).cmp(&(
            b.kind == ChannelKind::InquiredFrequency,
            b.opclass,
            b.cfi,
        ))
    });
    channels.dedup_by(|a, b| a.kind == b.kind && a.opclass == b.opclass && a.cfi == b.cfi);
    Ok(channels)
}

/// Clip the catalog to incumbents whose coupling node falls inside the
/// region footprint expanded by the maximum link distance, and whose best
/// conceivable I/N still reaches the threshold. The angle bound comes from
/// the minimum angle off boresight over the whole uncertainty volume; the
/// loss bound from free space at the closest approach. Fills each
/// survivor's path-loss bounds.
fn window_catalog(inputs: &SolverInputs<'_>, region: &RlanRegion) -> Result<Vec<FsLink>> {
    let config = inputs.config;
    let rect = region
        .bound_rect()
        .expanded_by_m(config.max_link_distance_km * 1000.0);

    let mut windowed = Vec::new();
    for link in inputs.catalog {
        let (hop, hop_agl) = link.last_hop();
        if !rect.contains(hop) {
            continue;
        }

        let center_distance = region.center().distance_m(&hop);
        let near = (center_distance - region.max_distance_m()).max(1.0);
        let far = center_distance + region.max_distance_m();
        let freq = link.center_mhz();
        let bounds = PathLossBounds {
            min_db: free_space_path_loss_db(near, freq),
            max_db: free_space_path_loss_db(far.max(1.0), freq),
        };

        // Worst-case coupling angle over the uncertainty volume bounds the
        // receive gain from above.
        let hop_amsl = inputs
            .terrain
            .terrain_height(hop.latitude_deg, hop.longitude_deg, false)?
            .terrain_m
            + hop_agl;
        let (target, target_agl) = link.last_hop_pointing_target();
        let target_amsl = inputs
            .terrain
            .terrain_height(target.latitude_deg, target.longitude_deg, false)?
            .terrain_m
            + target_agl;
        let pointing = vec3::sub(
            region.enu_of(target, target_amsl),
            region.enu_of(hop, hop_amsl),
        );
        let min_aob = region.min_aob_deg(hop, hop_amsl, pointing)?;
        let best_gain = link
            .rx
            .antenna
            .gain_dbi(min_aob, freq, false)
            .unwrap_or(link.rx.antenna.max_gain_dbi());

        // Best case for the interferer: minimum path loss, the angle-bound
        // gain, no clutter. If that still cannot reach the threshold, skip.
        let eirp_psd = config.max_eirp_dbm - 10.0 * 20.0_f64.log10();
        let noise = link.rx.noise_psd_dbm_per_mhz;
        let best_i2n = eirp_psd - (bounds.min_db - PREFILTER_MARGIN_DB) + best_gain
            - link.rx.feeder_loss_db
            - noise;
        if best_i2n < config.threshold_i2n_db {
            continue;
        }

        let mut survivor = link.clone();
        survivor.path_loss_bounds = Some(bounds);
        windowed.push(survivor);
    }
    Ok(windowed)
}

/// Evaluate one incumbent over every scan point at both height extremes,
/// returning its EIRP limit and the audit rows of threshold-crossing
/// evaluations.
#[allow(clippy::too_many_arguments)]
fn evaluate_incumbent(
    ctx: &EvalContext<'_>,
    inquiry: &SpectrumInquiryRequest,
    scan_points: &[GeoPoint],
    h_min_amsl: f64,
    h_max_amsl: f64,
    indoor: bool,
    link: &FsLink,
    channel: &Channel,
) -> Result<(f64, Vec<ExcThrRow>)> {
    let mut limit = f64::INFINITY;
    let mut rows = Vec::new();

    for (index, point) in scan_points.iter().enumerate() {
        let mut worst: Option<crate::interference::LinkEvaluation> = None;
        let mut worst_height = h_min_amsl;
        for height in [h_min_amsl, h_max_amsl] {
            let eval = evaluate_link(ctx, *point, height, indoor, link, channel)?;
            let replace = worst
                .as_ref()
                .map_or(true, |w| eval.eirp_limit_dbm < w.eirp_limit_dbm);
            if replace {
                worst = Some(eval);
                worst_height = height;
            }
            if h_max_amsl == h_min_amsl {
                break;
            }
        }

        // The loop above always yields one evaluation.
        let Some(eval) = worst else { continue };
        limit = limit.min(eval.eirp_limit_dbm);

        if eval.i2n_at_max_eirp_db > ctx.config.threshold_i2n_db {
            rows.push(ExcThrRow {
                request_id: inquiry.request_id.clone(),
                callsign: link.id.clone(),
                opclass: channel.opclass,
                cfi: channel.cfi,
                point_index: index,
                latitude_deg: point.latitude_deg,
                longitude_deg: point.longitude_deg,
                height_amsl_m: worst_height,
                distance_m: eval.distance_m,
                path_loss_db: eval.path_loss_db,
                aob_deg: eval.aob_deg,
                coupling_gain_dbi: eval.coupling_gain_dbi,
                i2n_db: eval.i2n_at_max_eirp_db,
                eirp_limit_dbm: eval.eirp_limit_dbm,
            });
        }
    }

    Ok((limit, rows))
}

/// Assemble the response: channel availability grouped by operating class,
/// and inquired-frequency PSD segments reduced from the 20 MHz probes.
fn assemble_response(
    inquiry: &SpectrumInquiryRequest,
    results: &[ChannelResult],
) -> SpectrumInquiryResponse {
    // Channel inquiries: parallel cfi/eirp arrays per class, usable
    // channels only.
    let mut channel_info: Vec<ChannelInfo> = Vec::new();
    if let Some(inquired) = &inquiry.inquired_channels {
        for entry in inquired {
            let mut cfis = Vec::new();
            let mut eirps = Vec::new();
            for r in results.iter().filter(|r| {
                r.channel.kind == ChannelKind::InquiredChannel
                    && r.channel.opclass == entry.global_operating_class
                    && matches!(r.color, ChannelColor::Green | ChannelColor::Yellow)
            }) {
                cfis.push(r.channel.cfi);
                eirps.push(round_milli_db(r.eirp_dbm));
            }
            channel_info.push(ChannelInfo {
                global_operating_class: entry.global_operating_class,
                channel_cfi: cfis,
                max_eirp: eirps,
            });
        }
    }

    // Frequency inquiries: the PSD of each 20 MHz probe, merged into runs
    // of equal PSD clipped to the requested ranges.
    let mut frequency_info: Vec<FrequencyInfo> = Vec::new();
    if let Some(ranges) = &inquiry.inquired_frequency_range {
        let mut probes: Vec<&ChannelResult> = results
            .iter()
            .filter(|r| {
                r.channel.kind == ChannelKind::InquiredFrequency
                    && matches!(r.color, ChannelColor::Green | ChannelColor::Yellow)
            })
            .collect();
        probes.sort_by(|a, b| a.channel.start_mhz.total_cmp(&b.channel.start_mhz));

        for range in ranges {
            let mut run: Option<(f64, f64, f64)> = None;
            for probe in &probes {
                let start = probe.channel.start_mhz.max(range.low_frequency);
                let stop = probe.channel.stop_mhz.min(range.high_frequency);
                if stop <= start {
                    continue;
                }
                let psd = round_milli_db(
                    probe.eirp_dbm - 10.0 * probe.channel.bandwidth_mhz().log10(),
                );
                run = match run {
                    Some((run_start, run_stop, run_psd))
                        if run_psd == psd && (start - run_stop).abs() < 1.0e-9 =>
                    {
                        Some((run_start, stop, run_psd))
                    }
                    Some((run_start, run_stop, run_psd)) => {
                        frequency_info.push(segment(run_start, run_stop, run_psd));
                        Some((start, stop, psd))
                    }
                    None => Some((start, stop, psd)),
                };
            }
            if let Some((run_start, run_stop, run_psd)) = run {
                frequency_info.push(segment(run_start, run_stop, run_psd));
            }
        }
    }

    let expires = (Utc::now() + chrono::Duration::hours(24))
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    SpectrumInquiryResponse {
        request_id: inquiry.request_id.clone(),
        ruleset_id: RULESET_US.to_string(),
        response: ResponseStatus::from_code(ResponseCode::Success),
        available_frequency_info: inquiry
            .inquired_frequency_range
            .as_ref()
            .map(|_| frequency_info),
        available_channel_info: inquiry.inquired_channels.as_ref().map(|_| channel_info),
        availability_expire_time: Some(expires),
    }
}

fn segment(start: f64, stop: f64, psd: f64) -> FrequencyInfo {
    FrequencyInfo {
        frequency_range: FrequencyRange {
            low_frequency: start,
            high_frequency: stop,
        },
        max_psd: psd,
    }
}

/// Round to a thousandth of a dB for stable output.
fn round_milli_db(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

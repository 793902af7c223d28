//! End-to-end solver scenarios over small synthetic worlds: flat terrain,
//! hand-built FS catalogs, and literal inquiry documents.

use std::sync::atomic::AtomicBool;

use afc_engine::propagation::FreeSpace;
use afc_engine::solver::{solve_request, SolverInputs};
use afc_geo::point::GeoPoint;
use afc_model::antenna::{AntennaCategory, AntennaPattern, FsAntenna};
use afc_model::config::AfcConfig;
use afc_model::incumbent::{FsLink, FsReceiver, Polarization};
use afc_model::ras::{ExclusionGeometry, RasZone};
use afc_model::request::{
    DeviceDescriptor, Elevation, Ellipse, FrequencyRange, GeoCoordinate, InquiredChannels,
    Location, SpectrumInquiryRequest, SpectrumInquiryRequestDocument,
};
use afc_model::response::SpectrumInquiryResponse;
use afc_terrain::terrain::{TerrainStack, TerrainStackSources};

const CENTER: GeoCoordinate = GeoCoordinate {
    latitude: 40.75924,
    longitude: -73.97434,
};

fn center_point() -> GeoPoint {
    GeoPoint {
        latitude_deg: CENTER.latitude,
        longitude_deg: CENTER.longitude,
    }
}

fn flat_terrain() -> TerrainStack {
    TerrainStack::new(TerrainStackSources::default())
}

fn test_config() -> AfcConfig {
    AfcConfig {
        propagation_model: "FSPL".to_string(),
        max_link_distance_km: 50.0,
        scan_resolution_m: 30.0,
        ..AfcConfig::default()
    }
}

/// A directional incumbent whose boresight is offset from the RLAN by
/// placing its far-end transmitter `aob_offset_deg` away from the
/// receiver-to-region bearing.
fn incumbent(id: &str, distance_m: f64, aob_offset_deg: f64) -> FsLink {
    let rx_position = center_point().destination(90.0, distance_m);
    let bearing_to_region = rx_position.bearing_deg_to(&center_point());
    let tx_position =
        rx_position.destination(bearing_to_region + aob_offset_deg, 20_000.0);
    FsLink {
        id: id.to_string(),
        start_mhz: 5925.0,
        stop_mhz: 6425.0,
        bandwidth_mhz: 60.0,
        tx_position,
        tx_height_agl_m: 50.0,
        rx: FsReceiver {
            position: rx_position,
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
        },
        diversity_rx: None,
        repeaters: vec![],
        path_loss_bounds: None,
    }
}

fn ellipse_location(indoor: u8) -> Location {
    Location {
        ellipse: Some(Ellipse {
            center: CENTER,
            major_axis: 100.0,
            minor_axis: 50.0,
            orientation: 45.0,
        }),
        linear_polygon: None,
        radial_polygon: None,
        elevation: Elevation {
            height: 129.0,
            height_type: "AGL".to_string(),
            vertical_uncertainty: 5.0,
        },
        indoor_deployment: indoor,
    }
}

fn channel_inquiry(request_id: &str, indoor: u8) -> SpectrumInquiryRequest {
    SpectrumInquiryRequest {
        request_id: request_id.to_string(),
        device_descriptor: DeviceDescriptor {
            serial_number: "SN0001".to_string(),
            certification_id: vec![],
            ruleset_ids: vec!["US_47_CFR_PART_15_SUBPART_E".to_string()],
        },
        location: ellipse_location(indoor),
        inquired_frequency_range: None,
        inquired_channels: Some(vec![InquiredChannels {
            global_operating_class: 133,
            channel_cfi: None,
        }]),
    }
}

fn document(requests: Vec<SpectrumInquiryRequest>) -> SpectrumInquiryRequestDocument {
    SpectrumInquiryRequestDocument {
        version: "1.4".to_string(),
        available_spectrum_inquiry_requests: requests,
    }
}

fn solve(
    config: &AfcConfig,
    catalog: &[FsLink],
    ras: &[RasZone],
    doc: &SpectrumInquiryRequestDocument,
) -> afc_engine::solver::SolveOutput {
    let terrain = flat_terrain();
    let model = FreeSpace;
    let inputs = SolverInputs {
        config,
        terrain: &terrain,
        population: None,
        catalog,
        ras,
        model: &model,
    };
    solve_request(&inputs, doc, &AtomicBool::new(false)).expect("request should solve")
}

fn single_response(output: &afc_engine::solver::SolveOutput) -> &SpectrumInquiryResponse {
    assert_eq!(output.document.available_spectrum_inquiry_responses.len(), 1);
    &output.document.available_spectrum_inquiry_responses[0]
}

fn eirps_of(response: &SpectrumInquiryResponse) -> Vec<(u8, f64)> {
    let info = response
        .available_channel_info
        .as_ref()
        .expect("channel info present");
    info[0]
        .channel_cfi
        .iter()
        .copied()
        .zip(info[0].max_eirp.iter().copied())
        .collect()
}

#[test]
fn test_no_incumbents_all_green_at_max() {
    let config = test_config();
    let output = solve(&config, &[], &[], &document(vec![channel_inquiry("0", 2)]));
    let response = single_response(&output);
    assert_eq!(response.response.response_code, 0);

    let eirps = eirps_of(response);
    // Every 80 MHz channel that fits the two bands: six in UNII-5, three in
    // UNII-7.
    assert_eq!(eirps.len(), 9);
    assert!(eirps.iter().all(|&(_, e)| e == config.max_eirp_dbm));
    assert!(output.audit.is_empty());
}

#[test]
fn test_distant_incumbent_is_windowed_out() {
    let config = test_config();
    // 200 km away: outside the 50 km link-distance window.
    let catalog = vec![incumbent("WFAR1", 200_000.0, 0.0)];
    let output = solve(&config, &catalog, &[], &document(vec![channel_inquiry("0", 2)]));
    let eirps = eirps_of(single_response(&output));
    assert!(eirps.iter().all(|&(_, e)| e == config.max_eirp_dbm));
}

#[test]
fn test_off_boresight_incumbent_reduces_eirp() {
    let config = test_config();
    // The receiver stares 10 degrees off the region: sidelobe coupling
    // limits, but does not deny, the overlapping channels.
    let catalog = vec![incumbent("WMID1", 10_000.0, 10.0)];
    let output = solve(&config, &catalog, &[], &document(vec![channel_inquiry("0", 2)]));
    let response = single_response(&output);
    let eirps = eirps_of(response);
    assert!(!eirps.is_empty());
    assert!(
        eirps
            .iter()
            .any(|&(_, e)| e < config.max_eirp_dbm && e >= config.min_eirp_dbm),
        "expected a power-limited channel, got {eirps:?}"
    );
    // Threshold crossings at max EIRP were audited.
    assert!(!output.audit.is_empty());
    assert!(output.audit.iter().all(|r| r.callsign == "WMID1"));
}

#[test]
fn test_boresight_incumbent_denies_channels() {
    let config = test_config();
    // Staring straight down the region's throat from 10 km: overlapping
    // channels fall below the EIRP floor and drop from the response.
    let catalog = vec![incumbent("WHOT1", 10_000.0, 0.0)];
    let output = solve(&config, &catalog, &[], &document(vec![channel_inquiry("0", 2)]));
    let denied = eirps_of(single_response(&output));

    let clear = solve(&config, &[], &[], &document(vec![channel_inquiry("0", 2)]));
    let all = eirps_of(single_response(&clear));
    assert!(
        denied.len() < all.len(),
        "expected denied channels: {} vs {}",
        denied.len(),
        all.len()
    );
}

#[test]
fn test_min_reduction_over_incumbents() {
    let config = test_config();
    let near = vec![incumbent("WNEAR", 10_000.0, 10.0)];
    let far = vec![incumbent("WFARO", 25_000.0, 10.0)];
    let both = vec![near[0].clone(), far[0].clone()];

    let doc = document(vec![channel_inquiry("0", 2)]);
    let e_near = eirps_of(single_response(&solve(&config, &near, &[], &doc)));
    let e_far = eirps_of(single_response(&solve(&config, &far, &[], &doc)));
    let e_both = eirps_of(single_response(&solve(&config, &both, &[], &doc)));

    // Most restrictive wins, channel by channel.
    for &(cfi, combined) in &e_both {
        let a = e_near.iter().find(|&&(c, _)| c == cfi).map(|&(_, e)| e);
        let b = e_far.iter().find(|&&(c, _)| c == cfi).map(|&(_, e)| e);
        if let (Some(a), Some(b)) = (a, b) {
            assert!(
                (combined - a.min(b)).abs() < 1.0e-9,
                "channel {cfi}: {combined} vs min({a}, {b})"
            );
        }
    }

    // And the closer incumbent is the tighter constraint.
    for &(cfi, e) in &e_near {
        if let Some(&(_, f)) = e_far.iter().find(|&&(c, _)| c == cfi) {
            assert!(e <= f + 1.0e-9, "channel {cfi}");
        }
    }
}

#[test]
fn test_indoor_buys_back_eirp() {
    let config = test_config();
    let catalog = vec![incumbent("WMID1", 10_000.0, 10.0)];
    let outdoor = solve(&config, &catalog, &[], &document(vec![channel_inquiry("0", 2)]));
    let indoor = solve(&config, &catalog, &[], &document(vec![channel_inquiry("0", 1)]));

    let out_eirps = eirps_of(single_response(&outdoor));
    let in_eirps = eirps_of(single_response(&indoor));
    for &(cfi, e_in) in &in_eirps {
        if let Some(&(_, e_out)) = out_eirps.iter().find(|&&(c, _)| c == cfi) {
            assert!(e_in >= e_out, "indoor should never be tighter (cfi {cfi})");
        }
    }
    // Where the outdoor case was power-limited, the building credit shows.
    let limited = out_eirps
        .iter()
        .find(|&&(_, e)| e < config.max_eirp_dbm)
        .map(|&(cfi, _)| cfi);
    if let Some(cfi) = limited {
        let e_out = out_eirps.iter().find(|&&(c, _)| c == cfi).unwrap().1;
        let e_in = in_eirps.iter().find(|&&(c, _)| c == cfi).unwrap().1;
        assert!(e_in > e_out);
    }
}

#[test]
fn test_ras_zone_blacks_out_overlap() {
    let config = test_config();
    let ras = vec![RasZone {
        name: "observatory".to_string(),
        geometry: ExclusionGeometry::Circle {
            center: center_point(),
            radius_m: 5_000.0,
        },
        start_mhz: 5945.0,
        stop_mhz: 6025.0,
        min_height_agl_m: 0.0,
    }];

    let clear = solve(&config, &[], &[], &document(vec![channel_inquiry("0", 2)]));
    let shaded = solve(&config, &[], &ras, &document(vec![channel_inquiry("0", 2)]));

    let all: Vec<u8> = eirps_of(single_response(&clear)).iter().map(|&(c, _)| c).collect();
    let left: Vec<u8> = eirps_of(single_response(&shaded)).iter().map(|&(c, _)| c).collect();

    // Channel 7 (5945-6025) overlaps the zone and disappears; channels
    // clear of the zone stay.
    assert!(all.contains(&7));
    assert!(!left.contains(&7));
    assert!(left.contains(&55));
    assert!(left.len() < all.len());
}

#[test]
fn test_frequency_inquiry_psd() {
    let config = test_config();
    let mut inquiry = channel_inquiry("0", 2);
    inquiry.inquired_channels = None;
    inquiry.inquired_frequency_range = Some(vec![FrequencyRange {
        low_frequency: 5925.0,
        high_frequency: 6425.0,
    }]);

    let output = solve(&config, &[], &[], &document(vec![inquiry]));
    let response = single_response(&output);
    let info = response
        .available_frequency_info
        .as_ref()
        .expect("frequency info present");
    assert!(!info.is_empty());

    // Unconstrained: PSD everywhere equals EIRP spread over 20 MHz.
    let expected_psd = ((config.max_eirp_dbm - 10.0 * 20.0_f64.log10()) * 1000.0).round() / 1000.0;
    for segment in info {
        assert!((segment.max_psd - expected_psd).abs() < 1.0e-9);
        assert!(segment.frequency_range.low_frequency >= 5925.0);
        assert!(segment.frequency_range.high_frequency <= 6425.0);
    }
}

#[test]
fn test_invalid_inquiry_does_not_poison_siblings() {
    let config = test_config();
    let mut bad = channel_inquiry("bad", 2);
    bad.location.elevation.height_type = "HAE".to_string();
    let good = channel_inquiry("good", 2);

    let output = solve(&config, &[], &[], &document(vec![bad, good]));
    let responses = &output.document.available_spectrum_inquiry_responses;
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].request_id, "bad");
    assert_eq!(responses[0].response.response_code, 103);
    assert!(responses[0].available_channel_info.is_none());
    assert_eq!(responses[1].request_id, "good");
    assert_eq!(responses[1].response.response_code, 0);
}

#[test]
fn test_unsupported_version() {
    let config = test_config();
    let mut doc = document(vec![channel_inquiry("0", 2)]);
    doc.version = "9.9".to_string();
    let output = solve(&config, &[], &[], &doc);
    let response = single_response(&output);
    assert_eq!(response.response.response_code, 100);
}

#[test]
fn test_deterministic_across_runs() {
    let config = test_config();
    let catalog = vec![
        incumbent("WAAA1", 10_000.0, 10.0),
        incumbent("WBBB2", 15_000.0, 5.0),
        incumbent("WCCC3", 20_000.0, 20.0),
    ];
    let doc = document(vec![channel_inquiry("0", 1)]);

    let first = solve(&config, &catalog, &[], &doc);
    let second = solve(&config, &catalog, &[], &doc);

    // Channel results and audit rows are identical run to run; only the
    // expiry timestamp may differ.
    assert_eq!(
        single_response(&first).available_channel_info,
        single_response(&second).available_channel_info
    );
    assert_eq!(first.audit, second.audit);
}

#[test]
fn test_cancellation() {
    let config = test_config();
    let terrain = flat_terrain();
    let model = FreeSpace;
    let inputs = SolverInputs {
        config: &config,
        terrain: &terrain,
        population: None,
        catalog: &[],
        ras: &[],
        model: &model,
    };
    let cancelled = AtomicBool::new(true);
    let result = solve_request(&inputs, &document(vec![channel_inquiry("0", 2)]), &cancelled);
    assert!(matches!(result, Err(afc_engine::result::Error::Cancelled)));
}

//! Solve a channel inquiry over a synthetic flat world with a single FS
//! incumbent, printing the response document.
//!
//! ```text
//! cargo run --example flat_world -- --distance-m 10000 --indoor
//! ```

use std::sync::atomic::AtomicBool;

use clap::Parser;

use afc_engine::propagation::FreeSpace;
use afc_engine::solver::{solve_request, SolverInputs};
use afc_geo::point::GeoPoint;
use afc_model::antenna::{AntennaCategory, AntennaPattern, FsAntenna};
use afc_model::config::AfcConfig;
use afc_model::incumbent::{FsLink, FsReceiver, Polarization};
use afc_model::request::{
    DeviceDescriptor, Elevation, Ellipse, GeoCoordinate, InquiredChannels, Location,
    SpectrumInquiryRequest, SpectrumInquiryRequestDocument,
};
use afc_terrain::terrain::{TerrainStack, TerrainStackSources};

#[derive(Parser)]
struct Cli {
    /// Distance from the access point to the FS receiver in meters.
    #[arg(long, default_value_t = 10_000.0)]
    distance_m: f64,

    /// Declare the deployment indoor.
    #[arg(long)]
    indoor: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let center = GeoPoint {
        latitude_deg: 40.75924,
        longitude_deg: -73.97434,
    };
    let rx_position = center.destination(90.0, cli.distance_m);

    // One directional incumbent staring ten degrees off the access point.
    let bearing_back = rx_position.bearing_deg_to(&center);
    let link = FsLink {
        id: "WDEMO01".to_string(),
        start_mhz: 5925.0,
        stop_mhz: 6425.0,
        bandwidth_mhz: 60.0,
        tx_position: rx_position.destination(bearing_back + 10.0, 20_000.0),
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
    };

    let request = SpectrumInquiryRequestDocument {
        version: "1.4".to_string(),
        available_spectrum_inquiry_requests: vec![SpectrumInquiryRequest {
            request_id: "demo".to_string(),
            device_descriptor: DeviceDescriptor {
                serial_number: "DEMO-SN".to_string(),
                certification_id: vec![],
                ruleset_ids: vec!["US_47_CFR_PART_15_SUBPART_E".to_string()],
            },
            location: Location {
                ellipse: Some(Ellipse {
                    center: GeoCoordinate {
                        latitude: center.latitude_deg,
                        longitude: center.longitude_deg,
                    },
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
                indoor_deployment: if cli.indoor { 1 } else { 2 },
            },
            inquired_frequency_range: None,
            inquired_channels: Some(vec![InquiredChannels {
                global_operating_class: 133,
                channel_cfi: None,
            }]),
        }],
    };

    let config = AfcConfig {
        propagation_model: "FSPL".to_string(),
        ..AfcConfig::default()
    };
    let terrain = TerrainStack::new(TerrainStackSources::default());
    let model = FreeSpace;
    let inputs = SolverInputs {
        config: &config,
        terrain: &terrain,
        population: None,
        catalog: std::slice::from_ref(&link),
        ras: &[],
        model: &model,
    };

    let output = solve_request(&inputs, &request, &AtomicBool::new(false))?;
    println!("{}", serde_json::to_string_pretty(&output.document)?);
    eprintln!("{} audit rows", output.audit.len());
    Ok(())
}

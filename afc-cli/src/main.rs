//!
//! Single-invocation AFC engine driver: read a spectrum-inquiry request and
//! an engine configuration, run the solver against the local reference data,
//! and write the response document plus the threshold-exceedance audit.
//!

mod catalog;
mod stack;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;

use afc_engine::excthr::write_audit;
use afc_engine::propagation::select_model;
use afc_engine::solver::{solve_request, SolverInputs};
use afc_model::config::AfcConfig;
use afc_model::ras::RasZone;
use afc_model::request::SpectrumInquiryRequestDocument;

#[derive(Parser)]
#[command(name = "afc-engine")]
#[command(author, version, about = "Automated Frequency Coordination compute engine")]
struct Cli {
    /// Kind of analysis to run; only AP-AFC is implemented.
    #[arg(long, default_value = "AP-AFC")]
    analysis_type: String,

    /// Root directory of the terrain state (lidar/, cdsm/, dep/, srtm/, global/).
    #[arg(long)]
    state_root: PathBuf,

    /// Directory of constant inputs: the FS catalog and RAS database named
    /// by the configuration.
    #[arg(long)]
    const_inputs: PathBuf,

    /// The available-spectrum inquiry request document.
    #[arg(long)]
    input_device: PathBuf,

    /// The engine configuration document; defaults apply when omitted.
    #[arg(long)]
    input_config: Option<PathBuf>,

    /// Where to write the response document. The audit CSV lands next to it
    /// as exc_thr.csv.gz.
    #[arg(long)]
    output_file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.analysis_type != "AP-AFC" {
        bail!("unsupported analysis type {:?}", cli.analysis_type);
    }

    let config: AfcConfig = match &cli.input_config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading configuration {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing configuration {}", path.display()))?
        }
        None => AfcConfig::default(),
    };

    let request: SpectrumInquiryRequestDocument = {
        let text = std::fs::read_to_string(&cli.input_device)
            .with_context(|| format!("reading request {}", cli.input_device.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing request {}", cli.input_device.display()))?
    };

    let terrain = stack::build_terrain_stack(&cli.state_root);

    let catalog = if config.fs_database.is_empty() {
        Vec::new()
    } else {
        catalog::load_catalog(&cli.const_inputs.join(&config.fs_database), &config)?
    };
    info!("{} incumbent links loaded", catalog.len());

    let ras: Vec<RasZone> = match &config.ras_database {
        Some(name) => {
            let path = cli.const_inputs.join(name);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading RAS database {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing RAS database {}", path.display()))?
        }
        None => Vec::new(),
    };

    let model = select_model(&config.propagation_model, config.propagation_confidence)?;

    let inputs = SolverInputs {
        config: &config,
        terrain: &terrain,
        population: None,
        catalog: &catalog,
        ras: &ras,
        model: model.as_ref(),
    };

    let cancel = AtomicBool::new(false);
    let output = solve_request(&inputs, &request, &cancel)?;

    let response_text = serde_json::to_string_pretty(&output.document)
        .context("serializing response document")?;
    std::fs::write(&cli.output_file, response_text)
        .with_context(|| format!("writing response {}", cli.output_file.display()))?;

    let audit_path = cli
        .output_file
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .join("exc_thr.csv.gz");
    write_audit(&audit_path, &output.audit)?;

    terrain.log_stats();
    info!(
        "wrote {} responses and {} audit rows",
        output.document.available_spectrum_inquiry_responses.len(),
        output.audit.len()
    );
    Ok(())
}

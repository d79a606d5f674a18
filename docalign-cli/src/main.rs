use clap::Parser;
use docalign::io::{load_image, save_image};
use docalign::{
    OrbConfig, OrbExtractor, RansacConfig, RansacHomography, ScanConfig, ScanOutcome, Scanner,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "DocAlign CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for each pipeline stage.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScanConfigJson {
    feature_budget: usize,
    retain_fraction: f64,
    parallel: bool,
    fill_value: u8,
}

impl Default for ScanConfigJson {
    fn default() -> Self {
        let cfg = ScanConfig::default();
        Self {
            feature_budget: cfg.feature_budget,
            retain_fraction: cfg.retain_fraction,
            parallel: cfg.parallel,
            fill_value: cfg.fill_value,
        }
    }
}

impl From<ScanConfigJson> for ScanConfig {
    fn from(value: ScanConfigJson) -> Self {
        Self {
            feature_budget: value.feature_budget,
            retain_fraction: value.retain_fraction,
            parallel: value.parallel,
            fill_value: value.fill_value,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OrbConfigJson {
    fast_threshold: u8,
    n_levels: usize,
    harris_k: f32,
    edge_threshold: usize,
    pattern_seed: u64,
}

impl Default for OrbConfigJson {
    fn default() -> Self {
        let cfg = OrbConfig::default();
        Self {
            fast_threshold: cfg.fast_threshold,
            n_levels: cfg.n_levels,
            harris_k: cfg.harris_k,
            edge_threshold: cfg.edge_threshold,
            pattern_seed: cfg.pattern_seed,
        }
    }
}

impl From<OrbConfigJson> for OrbConfig {
    fn from(value: OrbConfigJson) -> Self {
        Self {
            fast_threshold: value.fast_threshold,
            n_levels: value.n_levels,
            harris_k: value.harris_k,
            edge_threshold: value.edge_threshold,
            pattern_seed: value.pattern_seed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RansacConfigJson {
    reprojection_threshold: f64,
    max_iterations: usize,
    confidence: f64,
    min_inliers: usize,
    seed: u64,
    refine: bool,
}

impl Default for RansacConfigJson {
    fn default() -> Self {
        let cfg = RansacConfig::default();
        Self {
            reprojection_threshold: cfg.reprojection_threshold,
            max_iterations: cfg.max_iterations,
            confidence: cfg.confidence,
            min_inliers: cfg.min_inliers,
            seed: cfg.seed,
            refine: cfg.refine,
        }
    }
}

impl From<RansacConfigJson> for RansacConfig {
    fn from(value: RansacConfigJson) -> Self {
        Self {
            reprojection_threshold: value.reprojection_threshold,
            max_iterations: value.max_iterations,
            confidence: value.confidence,
            min_inliers: value.min_inliers,
            seed: value.seed,
            refine: value.refine,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    template_path: String,
    rectified_path: Option<String>,
    matches_path: Option<String>,
    report_path: Option<String>,
    scan: ScanConfigJson,
    orb: OrbConfigJson,
    ransac: RansacConfigJson,
}

#[derive(Debug, Serialize)]
struct Report {
    success: bool,
    error: Option<String>,
    recoverable: Option<bool>,
    homography: Option<[[f64; 3]; 3]>,
    image_keypoints: usize,
    template_keypoints: usize,
    candidates: usize,
    retained: usize,
    inliers: usize,
    rectified_path: Option<String>,
    matches_path: Option<String>,
}

impl Report {
    fn new(outcome: &ScanOutcome, rectified_path: Option<String>, matches_path: Option<String>) -> Self {
        Self {
            success: outcome.is_success(),
            error: outcome.error_message(),
            recoverable: outcome.error.as_ref().map(|err| err.is_recoverable()),
            homography: outcome.homography.map(|h| h.to_rows()),
            image_keypoints: outcome.image_keypoints,
            template_keypoints: outcome.template_keypoints,
            candidates: outcome.candidates,
            retained: outcome.correspondences.len(),
            inliers: outcome.inliers,
            rectified_path,
            matches_path,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("docalign=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() || config.template_path.is_empty() {
        return Err("image_path and template_path must be set in the config".into());
    }

    let image = load_image(&config.image_path)?;
    let template = load_image(&config.template_path)?;

    let scanner = Scanner::with_parts(
        config.scan.into(),
        OrbExtractor::new(config.orb.into())?,
        RansacHomography::new(config.ransac.into())?,
    )?;
    let outcome = scanner.scan(&image, &template)?;
    if let Some(err) = &outcome.error {
        tracing::warn!(error = %err, "scan did not produce a rectified image");
    }

    let mut rectified_written = None;
    if let (Some(path), Some(rectified)) = (&config.rectified_path, &outcome.rectified) {
        save_image(rectified, path)?;
        rectified_written = Some(path.clone());
    }
    if let Some(path) = &config.matches_path {
        save_image(&outcome.visualization, path)?;
    }

    let report = Report::new(&outcome, rectified_written, config.matches_path.clone());
    let json = serde_json::to_string_pretty(&report)?;

    match config.report_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

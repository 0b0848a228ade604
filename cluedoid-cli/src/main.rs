use clap::Parser;
use cluedoid::image::io::load_frame;
use cluedoid::{
    load_template_dir, CorrelationConfig, CorrelationMatch, DetectionSink, FileSink,
    IdentifyConfig, Identifier, OrbConfig, OrbDetector,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Identify a character card in a frame (JSON config driven)")]
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
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum Strategy {
    #[default]
    Features,
    Correlation,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OrbConfigJson {
    max_features: usize,
    scale_factor: f32,
    levels: usize,
    fast_threshold: u8,
    edge_threshold: usize,
    patch_size: usize,
}

impl Default for OrbConfigJson {
    fn default() -> Self {
        let cfg = OrbConfig::default();
        Self {
            max_features: cfg.max_features,
            scale_factor: cfg.scale_factor,
            levels: cfg.levels,
            fast_threshold: cfg.fast_threshold,
            edge_threshold: cfg.edge_threshold,
            patch_size: cfg.patch_size,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CorrelationConfigJson {
    scales_pct: Vec<u32>,
    min_score: f32,
}

impl Default for CorrelationConfigJson {
    fn default() -> Self {
        let cfg = CorrelationConfig::default();
        Self {
            scales_pct: cfg.scales_pct,
            min_score: cfg.min_score,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct IdentifyConfigJson {
    ratio: f32,
    min_matches: usize,
    min_region_area: usize,
    thumbnail_scale: f32,
    parallel: bool,
    orb: OrbConfigJson,
    correlation: CorrelationConfigJson,
}

impl Default for IdentifyConfigJson {
    fn default() -> Self {
        let cfg = IdentifyConfig::default();
        Self {
            ratio: cfg.ratio,
            min_matches: cfg.min_matches,
            min_region_area: cfg.min_region_area,
            thumbnail_scale: cfg.thumbnail_scale,
            parallel: cfg.parallel,
            orb: OrbConfigJson::default(),
            correlation: CorrelationConfigJson::default(),
        }
    }
}

impl IdentifyConfigJson {
    fn into_config(self) -> IdentifyConfig {
        IdentifyConfig {
            ratio: self.ratio,
            min_matches: self.min_matches,
            min_region_area: self.min_region_area,
            thumbnail_scale: self.thumbnail_scale,
            parallel: self.parallel,
            orb: OrbConfig {
                max_features: self.orb.max_features,
                scale_factor: self.orb.scale_factor,
                levels: self.orb.levels,
                fast_threshold: self.orb.fast_threshold,
                edge_threshold: self.orb.edge_threshold,
                patch_size: self.orb.patch_size,
                ..OrbConfig::default()
            },
            correlation: CorrelationConfig {
                scales_pct: self.correlation.scales_pct,
                min_score: self.correlation.min_score,
                parallel: self.parallel,
            },
            ..IdentifyConfig::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    template_dir: String,
    frame_path: String,
    output_dir: Option<String>,
    strategy: Strategy,
    identify: IdentifyConfigJson,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    template: String,
    good_matches: usize,
}

#[derive(Debug, Serialize)]
struct CorrelationRecord {
    template: String,
    score: f32,
    x: f32,
    y: f32,
    scale: f32,
}

impl From<CorrelationMatch> for CorrelationRecord {
    fn from(value: CorrelationMatch) -> Self {
        Self {
            template: value.name,
            score: value.score,
            x: value.x,
            y: value.y,
            scale: value.scale,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    matched: bool,
    character: Option<String>,
    color: Option<String>,
    matches: Vec<MatchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation: Option<CorrelationRecord>,
    failure: Option<&'static str>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("cluedoid=info".parse()?))
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
    if config.template_dir.is_empty() || config.frame_path.is_empty() {
        return Err("template_dir and frame_path must be set in the config".into());
    }

    let identify_cfg = config.identify.into_config();
    identify_cfg.validate()?;
    let detector = OrbDetector::new(identify_cfg.orb.clone())?;
    let store = load_template_dir(&config.template_dir, &detector, identify_cfg.thumbnail_scale)?;
    let identifier = Identifier::new(store, identify_cfg)?;
    let frame = load_frame(&config.frame_path)?;

    let report = match config.strategy {
        Strategy::Features => {
            let identification = identifier.identify_detailed(&frame);
            Report {
                matched: identification.verdict.matched,
                character: identification.verdict.character,
                color: identification
                    .color
                    .and_then(|idx| identifier.bands().get(idx))
                    .map(|band| band.name.clone()),
                matches: identification
                    .results
                    .into_iter()
                    .map(|r| MatchRecord {
                        template: r.template_name,
                        good_matches: r.good_matches,
                    })
                    .collect(),
                correlation: None,
                failure: identification.cause.map(|cause| cause.as_str()),
            }
        }
        Strategy::Correlation => {
            let hit = identifier.correlate(&frame);
            Report {
                matched: hit.is_some(),
                character: hit.as_ref().map(|h| h.name.clone()),
                color: None,
                matches: Vec::new(),
                failure: hit.is_none().then_some("no_candidate"),
                correlation: hit.map(CorrelationRecord::from),
            }
        }
    };

    if let (Some(dir), Some(character)) = (&config.output_dir, &report.character) {
        let sink = FileSink::new(dir);
        if let Err(err) = sink.record(&frame, character) {
            tracing::error!(error = %err, "failed to save detection");
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

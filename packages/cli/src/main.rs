#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line runner for the flood impact functions.
//!
//! Loads a hazard and an exposure layer, runs one impact function over them
//! and writes the impact layer next to its keywords and style sidecars.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use hazard_impact_functions::{ImpactLayer, Outcome, all_metadata, build};
use hazard_impact_layer::{PassThroughInterpolator, load_layer, save_layer};
use hazard_impact_models::ImpactFunctionId;
use hazard_impact_report::{Granularity, RendererRegistry};
use hazard_impact_report_models::Keywords;

#[derive(Parser)]
#[command(name = "hazard_impact", about = "Flood impact assessment runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available impact functions
    Functions {
        /// Also print each function's synopsis and default parameters
        #[arg(long)]
        verbose: bool,
    },
    /// Flooded buildings (FB1)
    Buildings(RunArgs),
    /// People in need of evacuation from a depth grid (FP1)
    Evacuation(RunArgs),
    /// People in need of evacuation from flood polygons (FP2)
    EvacuationRegions(RunArgs),
    /// Render the summary table of a saved keywords document
    Render {
        /// Keywords JSON written by a previous run
        keywords: PathBuf,

        /// `analysis-result` or `complete`
        #[arg(long, default_value = "complete")]
        granularity: Granularity,

        /// Print HTML instead of plain text
        #[arg(long)]
        html: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Hazard layer (GeoJSON or grid JSON)
    #[arg(long)]
    hazard: PathBuf,

    /// Exposure layer (GeoJSON or grid JSON)
    #[arg(long)]
    exposure: PathBuf,

    /// Where to write the impact layer
    #[arg(long)]
    output: PathBuf,

    /// Parameter overrides: a JSON or TOML file, or an inline JSON object
    #[arg(long)]
    parameters: Option<String>,

    /// Hazard subcategory, e.g. `tsunami` (defaults to the function's first)
    #[arg(long)]
    hazard_subcategory: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Functions { verbose } => list_functions(verbose)?,
        Commands::Buildings(args) => run_function(ImpactFunctionId::FloodBuildingImpact, &args)?,
        Commands::Evacuation(args) => run_function(ImpactFunctionId::FloodEvacuation, &args)?,
        Commands::EvacuationRegions(args) => {
            run_function(ImpactFunctionId::FloodEvacuationRegions, &args)?;
        }
        Commands::Render {
            keywords,
            granularity,
            html,
        } => {
            let text = std::fs::read_to_string(&keywords)?;
            let document = Keywords::parse(&text)?;
            let table = RendererRegistry::default().render(&document, granularity);
            if html {
                println!("{}", table.to_html());
            } else {
                println!("{table}");
            }
        }
    }

    Ok(())
}

fn list_functions(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{:<6} {:<36} TITLE", "ID", "NAME");
    println!("{}", "-".repeat(60));
    for meta in all_metadata() {
        println!("{:<6} {:<36} {}", meta.id, meta.name, meta.title);
        if verbose {
            println!("       {}", meta.synopsis);
            println!("       hazards: {}", meta.hazard_subcategories.join(", "));
            println!("       parameters: {}", serde_json::to_string(&meta.parameters)?);
        }
    }
    Ok(())
}

fn run_function(id: ImpactFunctionId, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = args.parameters.as_deref().map(read_parameters).transpose()?;
    let function = build(id, overrides.as_ref())?;

    let mut hazard = load_layer(&args.hazard)?;
    hazard.subcategory.clone_from(&args.hazard_subcategory);
    let exposure = load_layer(&args.exposure)?;

    match function.run(&hazard, &exposure, &PassThroughInterpolator)? {
        Outcome::Impact(layer) => {
            write_outputs(&args.output, &layer)?;
            let table = RendererRegistry::default().render(&layer.report, Granularity::Complete);
            println!("{table}");
        }
        Outcome::ZeroImpact(report) => {
            log::info!("No impact: nothing written to {}", args.output.display());
            println!("{}", report.table);
        }
    }
    Ok(())
}

/// Reads parameter overrides from a file, or parses `source` as inline JSON
/// when no such file exists.
fn read_parameters(source: &str) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let path = Path::new(source);
    if !path.is_file() {
        return Ok(serde_json::from_str(source)?);
    }
    let text = std::fs::read_to_string(path)?;
    let value = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&text)?
    } else {
        serde_json::from_str(&text)?
    };
    Ok(value)
}

/// `flood_impact.json` becomes `flood_impact.<suffix>`.
fn sidecar_path(output: &Path, suffix: &str) -> PathBuf {
    output.with_extension(suffix)
}

#[derive(serde::Serialize)]
struct StyleSidecar<'a> {
    keywords: &'a hazard_impact_functions::LayerKeywords,
    style_info: &'a hazard_impact_models::StyleInfo,
}

fn write_outputs(output: &Path, layer: &ImpactLayer) -> Result<(), Box<dyn std::error::Error>> {
    save_layer(output, &layer.data)?;

    let keywords_path = sidecar_path(output, "keywords.json");
    std::fs::write(&keywords_path, layer.report.to_json_pretty()?)?;

    let style_path = sidecar_path(output, "style.json");
    let sidecar = StyleSidecar {
        keywords: &layer.keywords,
        style_info: &layer.style_info,
    };
    std::fs::write(&style_path, serde_json::to_string_pretty(&sidecar)?)?;

    log::info!(
        "Wrote '{}' with {} and {}",
        layer.name,
        keywords_path.display(),
        style_path.display()
    );
    Ok(())
}

use std::io;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::warn;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use follow_lane::errors::Result;
use follow_lane::{resolve, ResolvedWay, ResolverConfig, WayId};

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Geojson,
}

/// Follows a road lane using OSM data
#[derive(Parser)]
#[command(name = "follow-lane", version, about, long_about = None)]
struct CliArgs {
    /// OSM way id to start from (123, w123 or an openstreetmap.org way URL)
    #[arg(long)]
    way: WayId,

    /// Preprocessed OSM PBF file path. Without it the Overpass API is queried.
    #[arg(long)]
    pbf: Option<PathBuf>,

    /// JSON resolver config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Query the Overpass API when local extraction fails
    #[arg(long)]
    fallback_remote: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn load_config(args: &CliArgs) -> Result<ResolverConfig> {
    match &args.config {
        Some(path) => ResolverConfig::load(path),
        None => Ok(ResolverConfig::default()),
    }
}

fn print_way(way: &ResolvedWay, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (key, value) in &way.tags {
                println!("{}={}", key, value);
            }
            println!("{}", way.geometry);
        },
        OutputFormat::Geojson => println!("{}", serde_json::to_string_pretty(&way.to_geojson())?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(&args.log_level);

    let config = load_config(&args)?;
    let way = match resolve(Some(args.way), args.pbf.as_deref(), &config) {
        Err(err) if args.fallback_remote && args.pbf.is_some() => {
            let message = err.to_string();
            warn!(way_id = args.way.get(), err = message.as_str(); "Local extraction failed, querying remote service");
            resolve(Some(args.way), None, &config)?
        },
        result => result?,
    };

    print_way(&way, args.format)
}

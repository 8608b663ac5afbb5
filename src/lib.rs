//! Audiopack - pack audio clips into duration-bounded containers and back.
//!
//! `pack` concatenates many small clips into sequentially numbered WAV
//! containers, none longer than a configured maximum, and records in a JSON
//! ledger where every clip landed. `segment` reads that ledger and slices the
//! containers back into the original clips, sample for sample.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod packer;
pub mod progress;
pub mod scan;
pub mod segment;

use audio::SymphoniaDecoder;
use clap::Parser;
use cli::{Cli, Command, ConfigAction, PackArgs, SegmentArgs};
use config::{
    Config, config_file_path, load_default_config, save_default_config, validate_pack_config,
    validate_segment_config,
};
use constants::SUPPORTED_EXTENSIONS;
use ledger::Ledger;
use packer::{PackOptions, Packer};
use scan::SourceScanner;
use segment::{ContainerCache, ResegmentOptions, Resegmenter};
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the audiopack CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);
    let progress = cli.show_progress();

    match cli.command {
        Command::Pack(args) => pack_command(&args, &load_default_config()?, progress),
        Command::Segment(args) => segment_command(&args, &load_default_config()?, progress),
        Command::Config { action } => handle_config_command(action),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt().with_env_filter(filter).init();
}

fn pack_command(args: &PackArgs, config: &Config, progress: bool) -> Result<()> {
    let mut pack = config.pack.clone();
    args.apply(&mut pack);
    validate_pack_config(&pack)?;

    for ext in &pack.extensions {
        if !SUPPORTED_EXTENSIONS
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(ext))
        {
            warn!("Extension '{ext}' is not a known audio format; decoding may fail");
        }
    }

    let scanner = SourceScanner::new(&args.input, &pack.extensions)
        .skip_containers_in(&args.output, &pack.part_prefix);
    let clips = scanner.collect(pack.order)?;
    info!(
        "Found {} clip(s) under {}",
        clips.len(),
        scanner.root().display()
    );

    let mut options = PackOptions::from_config(&pack);
    options.base_dir = Some(args.input.clone());
    options.progress = progress;

    let report = Packer::new(options, SymphoniaDecoder).pack(&clips, &args.output)?;

    info!("Ledger written to {}", report.ledger_path.display());
    info!("Container list written to {}", report.listing_path.display());
    Ok(())
}

fn segment_command(args: &SegmentArgs, config: &Config, progress: bool) -> Result<()> {
    let mut segment = config.segment.clone();
    args.apply(&mut segment);
    validate_segment_config(&segment)?;

    // The ledger name is shared with `pack` so both commands agree on it.
    let ledger_path = args.ledger_path(&config.pack.ledger_file);
    let ledger = Ledger::load(&ledger_path)?;
    info!(
        "Loaded {} ledger entries from {}",
        ledger.len(),
        ledger_path.display()
    );

    let mut options = ResegmentOptions::from_config(&segment);
    options.progress = progress;

    let cache = ContainerCache::new(SymphoniaDecoder);
    let report =
        Resegmenter::new(options, &cache).resegment(&ledger, &args.container_dir, &args.output)?;

    report.into_result().map(|_| ())
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            let rendered =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{rendered}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", config_file_path()?.display());
            Ok(())
        }
    }
}

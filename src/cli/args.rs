//! CLI argument definitions.

use super::validators::{parse_duration, parse_jobs};
use crate::config::{DecodeFailurePolicy, PackConfig, RateMismatchPolicy, ScanOrder, SegmentConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pack small audio clips into duration-bounded WAV containers and split them back.
#[derive(Debug, Parser)]
#[command(name = "audiopack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Only log warnings and errors, and hide progress bars.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars.
    #[arg(long, global = true, env = "AUDIOPACK_NO_PROGRESS")]
    pub no_progress: bool,
}

impl Cli {
    /// Whether progress bars should be drawn.
    pub const fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pack the clips under a directory into containers.
    Pack(PackArgs),
    /// Restore the original clips from packed containers.
    Segment(SegmentArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for `pack`.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct PackArgs {
    /// Directory to scan for clips.
    pub input: PathBuf,

    /// Directory receiving containers, ledger and path listing.
    #[arg(short, long, env = "AUDIOPACK_OUTPUT_DIR")]
    pub output: PathBuf,

    /// Maximum container duration (seconds, or e.g. 29m40s).
    #[arg(short = 'd', long, value_parser = parse_duration, env = "AUDIOPACK_MAX_DURATION")]
    pub max_duration: Option<f64>,

    /// Container file name prefix.
    #[arg(long, env = "AUDIOPACK_PART_PREFIX")]
    pub prefix: Option<String>,

    /// Clip extensions to pick up (comma-separated).
    #[arg(long, value_delimiter = ',', env = "AUDIOPACK_EXTENSIONS")]
    pub ext: Option<Vec<String>>,

    /// Keep directory traversal order instead of sorting paths.
    #[arg(long)]
    pub traversal_order: bool,

    /// Skip clips that cannot be decoded instead of aborting.
    #[arg(long)]
    pub skip_bad: bool,

    /// Start a new container when the sample rate changes instead of failing.
    #[arg(long)]
    pub split_on_rate_change: bool,
}

impl PackArgs {
    /// Overlay command-line values onto the `[pack]` configuration.
    pub fn apply(&self, pack: &mut PackConfig) {
        if let Some(max_duration) = self.max_duration {
            pack.max_duration = max_duration;
        }
        if let Some(prefix) = &self.prefix {
            pack.part_prefix.clone_from(prefix);
        }
        if let Some(ext) = &self.ext {
            pack.extensions = ext
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect();
        }
        if self.traversal_order {
            pack.order = ScanOrder::Traversal;
        }
        if self.skip_bad {
            pack.on_decode_error = DecodeFailurePolicy::Skip;
        }
        if self.split_on_rate_change {
            pack.on_rate_mismatch = RateMismatchPolicy::NewContainer;
        }
    }
}

/// Arguments for `segment`.
#[derive(Debug, Args)]
pub struct SegmentArgs {
    /// Directory holding the containers.
    pub container_dir: PathBuf,

    /// Directory receiving the restored clips.
    #[arg(short, long, env = "AUDIOPACK_SEGMENT_OUTPUT_DIR")]
    pub output: PathBuf,

    /// Ledger file (default: ledger file name inside the container directory).
    #[arg(long, env = "AUDIOPACK_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Number of worker threads.
    #[arg(short, long, value_parser = parse_jobs, env = "AUDIOPACK_JOBS")]
    pub jobs: Option<usize>,
}

impl SegmentArgs {
    /// Overlay command-line values onto the `[segment]` configuration.
    pub fn apply(&self, segment: &mut SegmentConfig) {
        if let Some(jobs) = self.jobs {
            segment.jobs = jobs;
        }
    }

    /// Ledger path to read: `--ledger`, or `ledger_file` inside the container directory.
    pub fn ledger_path(&self, ledger_file: &str) -> PathBuf {
        self.ledger
            .clone()
            .unwrap_or_else(|| self.container_dir.join(ledger_file))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_pack() {
        let cli = Cli::try_parse_from(["audiopack", "pack", "clips", "-o", "out"]).unwrap();
        let Command::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert_eq!(args.input, PathBuf::from("clips"));
        assert_eq!(args.output, PathBuf::from("out"));
        assert!(args.max_duration.is_none());
    }

    #[test]
    fn test_cli_parse_pack_with_options() {
        let cli = Cli::try_parse_from([
            "audiopack",
            "pack",
            "clips",
            "-o",
            "out",
            "--max-duration",
            "10m",
            "--ext",
            "wav,.flac",
            "--skip-bad",
            "--split-on-rate-change",
            "--traversal-order",
            "-q",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert!(!cli.show_progress());
        let Command::Pack(args) = cli.command else {
            panic!("expected pack");
        };

        let mut pack = PackConfig::default();
        args.apply(&mut pack);
        assert_eq!(pack.max_duration, 600.0);
        assert_eq!(pack.extensions, vec!["wav", "flac"]);
        assert_eq!(pack.order, ScanOrder::Traversal);
        assert_eq!(pack.on_decode_error, DecodeFailurePolicy::Skip);
        assert_eq!(pack.on_rate_mismatch, RateMismatchPolicy::NewContainer);
    }

    #[test]
    fn test_cli_pack_requires_output() {
        assert!(Cli::try_parse_from(["audiopack", "pack", "clips"]).is_err());
    }

    #[test]
    fn test_cli_pack_rejects_bad_duration() {
        assert!(
            Cli::try_parse_from(["audiopack", "pack", "c", "-o", "o", "-d", "soon"]).is_err()
        );
    }

    #[test]
    fn test_cli_parse_segment() {
        let cli = Cli::try_parse_from([
            "audiopack", "segment", "out", "-o", "restored", "--jobs", "4", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Segment(args) = cli.command else {
            panic!("expected segment");
        };

        let mut segment = SegmentConfig::default();
        args.apply(&mut segment);
        assert_eq!(segment.jobs, 4);
        assert_eq!(
            args.ledger_path(&PackConfig::default().ledger_file),
            PathBuf::from("out").join("metadata.json")
        );
    }

    #[test]
    fn test_cli_segment_explicit_ledger() {
        let cli = Cli::try_parse_from([
            "audiopack",
            "segment",
            "out",
            "-o",
            "restored",
            "--ledger",
            "elsewhere/ledger.json",
        ])
        .unwrap();
        let Command::Segment(args) = cli.command else {
            panic!("expected segment");
        };
        assert_eq!(
            args.ledger_path(&PackConfig::default().ledger_file),
            PathBuf::from("elsewhere/ledger.json")
        );
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["audiopack", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["audiopack"]).is_err());
    }
}

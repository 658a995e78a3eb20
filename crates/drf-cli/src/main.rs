/// DRF command-line tool: inspect, validate, extract from, and build
/// `.drf` documents.
///
/// # Command overview
///
/// ```text
/// drf <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    List the regions of a document without loading images
///   validate   Fully decode a document, loading every image
///   extract    Write one image region's raw pixels to a file
///   encode     Create a document from a JSON manifest
///   help       Print help information
///
/// Global options:
///   -v, --verbose              Debug logging (RUST_LOG overrides)
///   --lazy-threshold <BYTES>   Defer images whose body is at least this big
///   -h, --help                 Print help
///   -V, --version              Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                 |
/// |------|-----------------------------------------|
/// | 0    | Success                                 |
/// | 1    | Error (I/O failure, invalid file, etc.) |
///
/// Errors and log output go to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use drf_decoder::{DecoderConfig, LazyPolicy};

mod cmd_encode;
mod cmd_extract;
mod cmd_inspect;
mod cmd_validate;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "drf", version, about = "Deferred-region document tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log what the reader defers and loads.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Leave images lazy when their stored body is at least this many bytes.
    #[arg(long, global = true, value_name = "BYTES")]
    lazy_threshold: Option<u64>,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// List the regions of a document.
    Inspect(InspectArgs),
    /// Check that every region, including every image, decodes.
    Validate(ValidateArgs),
    /// Write one image's decoded pixels to a file.
    Extract(ExtractArgs),
    /// Create a document from a JSON manifest.
    Encode(EncodeArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `drf inspect`.
///
/// ```text
/// ┌─────────────┬──────────────────────────────────────────────────────┐
/// │ Flag        │ Effect                                               │
/// ├─────────────┼──────────────────────────────────────────────────────┤
/// │ --load      │ Force deferred loads, report stream position around  │
/// │ --region N  │ Show only the region at index N                      │
/// └─────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InspectArgs {
    pub file: PathBuf,

    /// Load deferred images and show where the stream was before and after.
    #[arg(long)]
    pub load: bool,

    /// Inspect only the region at this zero-based index.
    #[arg(long)]
    pub region: Option<usize>,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    pub file: PathBuf,

    /// Zero-based index of an IMAGE region.
    #[arg(long)]
    pub region: usize,

    /// Where to write the raw pixels.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for `drf encode`. See `cmd_encode` for the manifest format.
#[derive(clap::Args)]
pub struct EncodeArgs {
    /// JSON manifest describing the regions.
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    /// zstd-compress every image payload that benefits.
    #[arg(long)]
    pub compress: bool,

    /// Store a BLAKE3 digest for every image.
    #[arg(long)]
    pub digest: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = decoder_config(&cli);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args, &config),
        Commands::Validate(args) => cmd_validate::run(&args, &config),
        Commands::Extract(args) => cmd_extract::run(&args, &config),
        Commands::Encode(args) => cmd_encode::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn decoder_config(cli: &Cli) -> DecoderConfig {
    let mut config = DecoderConfig::default();
    if let Some(threshold) = cli.lazy_threshold {
        config.lazy_policy = LazyPolicy::Threshold(threshold);
    }
    log::debug!("decoder config: {config:?}");
    config
}

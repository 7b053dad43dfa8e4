//! CLI entry point: wires the extraction pipeline to command-line
//! arguments and maps run statistics to a process exit code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use curator_engine::{ExtractorRegistry, FallbackExtractor, FetchSettings, Pipeline, StorageManager};
use curator_logging::{curator_error, curator_info, LogDestination};

#[derive(Debug, Parser)]
#[command(
    name = "curator",
    about = "Extract, classify and store readable content from a list of URLs"
)]
struct Args {
    /// Input JSON file with resources.
    #[arg(short, long, default_value = "data/resources-raw/resources-raw.json")]
    input: PathBuf,

    /// Output directory for extracted content.
    #[arg(short, long, default_value = "knowledge")]
    output: PathBuf,

    /// HTTP request timeout in seconds.
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    curator_logging::initialize(LogDestination::Terminal, args.verbose);

    curator_info!("Smart Content Curator");

    let storage = match StorageManager::new(&args.output) {
        Ok(storage) => storage,
        Err(err) => {
            curator_error!("Failed to prepare output directory: {err}");
            return ExitCode::from(1);
        }
    };

    let settings = FetchSettings {
        request_timeout: Duration::from_secs(args.timeout),
        ..FetchSettings::default()
    };
    let registry = ExtractorRegistry::new(Box::new(FallbackExtractor::new(settings)));
    let mut pipeline = Pipeline::new(registry, storage);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            curator_error!("Failed to start runtime: {err}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(pipeline.run(&args.input)) {
        Ok(stats) => {
            if stats.failed > 0 && stats.successful == 0 {
                ExitCode::from(1)
            } else if stats.failed > 0 {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            curator_error!("Failed to load resources: {err}");
            ExitCode::from(1)
        }
    }
}

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use race_gatherer::api::HttpApiClient;
use race_gatherer::app::{App, RunSummary};
use race_gatherer::config::{DataPaths, RunOptions, Strictness, resolve_api_key};
use race_gatherer::error::GatherError;
use race_gatherer::reference::ReferenceData;
use race_gatherer::store::Store;

#[derive(Parser)]
#[command(name = "race-gatherer")]
#[command(about = "Join candidate endorsements and campaign-finance data into per-district JSON")]
#[command(version, author)]
struct Cli {
    /// transparencydata.com API key (or TRANSPARENCY_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Log cache and download chatter
    #[arg(long)]
    debug: bool,

    /// Print a tally of skipped entities at the end of the run
    #[arg(long)]
    skips: bool,

    /// Report districts with fewer than two candidates
    #[arg(long)]
    missing: bool,

    /// Re-download even when a cached payload exists
    #[arg(long)]
    force: bool,

    /// Abort on the first unmappable entity instead of skipping it
    #[arg(long, value_enum, default_value_t)]
    strictness: Strictness,

    #[arg(long, default_value = "data")]
    data_dir: Utf8PathBuf,

    #[arg(long, default_value = "cache")]
    cache_dir: Utf8PathBuf,

    #[arg(long, default_value = "photos")]
    photos_dir: Utf8PathBuf,

    /// Output directory, `<data-dir>/districts` unless set
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(gather) = report.downcast_ref::<GatherError>() {
            return ExitCode::from(map_exit_code(gather));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GatherError) -> u8 {
    match error {
        GatherError::UnresolvableEntity { .. }
        | GatherError::UnrecognizedSeat { .. }
        | GatherError::MissingDistrict { .. }
        | GatherError::InvalidDistrict { .. }
        | GatherError::UnknownReferencePool { .. }
        | GatherError::AmbiguousName { .. } => 2,
        GatherError::ApiHttp(_) | GatherError::ApiJson { .. } | GatherError::ApiPayload { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let api_key = resolve_api_key(cli.api_key).into_diagnostic()?;
    let options = RunOptions {
        api_key,
        debug: cli.debug,
        skips: cli.skips,
        missing: cli.missing,
        force: cli.force,
        strictness: cli.strictness,
    };

    let paths = DataPaths::new(cli.data_dir, cli.cache_dir, cli.photos_dir, cli.out_dir);
    let reference = ReferenceData::load(&paths).into_diagnostic()?;
    let store = Store::new(paths.cache_dir.clone(), paths.districts_dir.clone());
    let client = HttpApiClient::new().into_diagnostic()?;

    let app = App::new(&client, &store, &reference, options.clone());
    let summary = app.run(&paths.endorsements()).into_diagnostic()?;

    print_summary(&summary);
    if options.skips {
        print_skips(&summary);
    }
    if options.missing {
        print_missing(&summary);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Processed {} House districts.", summary.house_districts);
    println!("Processed {} Senate districts.", summary.senate_races);
    println!();
    println!("Wrote {} district files.", summary.files_written);
}

fn print_skips(summary: &RunSummary) {
    println!();
    println!(
        "Skipped {} of {} rows ({} entities):",
        summary.skipped_rows,
        summary.rows,
        summary.skips.len()
    );
    for skip in &summary.skips {
        println!("  [{}] {}", skip.entity_id, skip.reason);
    }
}

fn print_missing(summary: &RunSummary) {
    println!();
    println!(
        "{} districts with fewer than two candidates:",
        summary.missing_districts.len()
    );
    for (key, count) in &summary.missing_districts {
        let state = key.split('-').next().unwrap_or_default();
        let name = ReferenceData::state_name(state).unwrap_or(state);
        println!("  {key} ({name}): {count}");
    }
}

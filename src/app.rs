//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and environment settings
//! - sets up logging
//! - preloads indicators and runs the view pipeline
//! - prints reports/plots and writes optional exports

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Command, ShowArgs, TuiArgs};
use crate::config::Settings;
use crate::data::WorldBankClient;
use crate::error::AppError;
use crate::forecast::LinearTrend;

pub mod pipeline;

use pipeline::Preload;

/// Entry point for the `wdi` binary.
pub fn run() -> Result<(), AppError> {
    // `wdi` and `wdi -c Brazil` behave like `wdi tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let settings = Settings::from_env()?;

    // The TUI owns the terminal, so only it logs to a file.
    match &cli.command {
        Command::Tui(_) => crate::logging::init_file(&settings.log_file)?,
        _ => crate::logging::init_stderr(),
    }

    match cli.command {
        Command::Show(args) => handle_show(args, &settings),
        Command::Countries => handle_countries(&settings),
        Command::Indicators => {
            print!("{}", crate::report::format_indicators());
            Ok(())
        }
        Command::Tui(args) => handle_tui(args, settings),
    }
}

fn start(settings: &Settings) -> Result<(WorldBankClient, Preload), AppError> {
    let client = WorldBankClient::from_settings(settings);
    info!(base = client.base_url(), "preloading indicators");
    let preload = pipeline::preload(&client, settings.preload_span)
        .map_err(|halt| AppError::halted(halt.message()))?;
    Ok((client, preload))
}

fn handle_show(args: ShowArgs, settings: &Settings) -> Result<(), AppError> {
    let (client, preload) = start(settings)?;
    let config = args.run_config(&preload.countries);
    if let Some(requested) = args.selection.country.as_deref() {
        if requested != config.inputs.country {
            warn!(requested, using = %config.inputs.country, "unknown country; using the first listed");
        }
    }

    let outcome = pipeline::render(&client, &LinearTrend::new(), &config.inputs);
    let map = pipeline::map_layer(&client, &outcome);

    // Print whatever the pass produced before reporting a halt.
    println!("{}", crate::report::format_run_summary(&outcome, map.as_ref()));

    if let Some(series) = &outcome.series {
        let forecast = outcome.forecast.forecast();
        println!("{}", crate::report::format_series(series, outcome.indicator, forecast));
        if config.plot {
            let plot = crate::plot::render_ascii_plot(series, forecast, config.plot_width, config.plot_height);
            println!("{plot}");
        }
    }

    if let Some(snapshot) = &outcome.regional {
        let rankings = crate::report::rank_regional(snapshot, config.top_n);
        println!("{}", crate::report::format_rankings(&rankings, outcome.indicator));
    }

    // Optional exports.
    if let (Some(path), Some(series)) = (&config.export_series, &outcome.series) {
        crate::io::export::write_series_csv(path, series, outcome.forecast.forecast())?;
    }
    if let (Some(path), Some(snapshot)) = (&config.export_regional, &outcome.regional) {
        crate::io::export::write_regional_csv(path, snapshot, &client.locations())?;
    }
    if let Some(path) = &config.export_json {
        crate::io::json::write_outcome_json(path, &outcome, map.as_ref())?;
    }

    match outcome.halt {
        Some(halt) => Err(AppError::halted(halt.message())),
        None => Ok(()),
    }
}

fn handle_countries(settings: &Settings) -> Result<(), AppError> {
    let (_, preload) = start(settings)?;
    for name in preload.countries.names() {
        println!("{name}");
    }
    Ok(())
}

fn handle_tui(args: TuiArgs, settings: Settings) -> Result<(), AppError> {
    crate::tui::run(args, settings)
}

/// Rewrite argv so `wdi` defaults to `wdi tui`.
///
/// Rules:
/// - `wdi`                      -> `wdi tui`
/// - `wdi -c Brazil ...`        -> `wdi tui -c Brazil ...`
/// - `wdi --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "countries" | "indicators" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

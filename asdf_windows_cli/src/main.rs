//! # asdf_windows_cli
//!
//! Part of the asdf_windows crate family.
//!
//! Command line front-end for selecting windows on one event.
//!
//! ## Use
//!
//! Make a template configuration and fill it out
//!
//! ```bash
//! asdf_windows_cli -p config.yml new
//! ```
//!
//! then run
//!
//! ```bash
//! asdf_windows_cli -p config.yml
//! ```
//!
//! A log of the run is written to `./asdf_windows.log`.
use clap::{Arg, Command};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libasdf_windows::config::Config;
use libasdf_windows::external_selector::ExternalSelector;
use libasdf_windows::process::process_event;

const LOG_FILE: &str = "./asdf_windows.log";

fn make_template_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

/// Log to the terminal and to a file
fn init_logging() -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from(LOG_FILE))
            .formatter(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [{logger}] - [{^{level}}] - {payload}{eol}"
                ),
            ))
            .truncate(true)
            .build()?,
    );
    let mut sinks = spdlog::default_logger().sinks().to_owned();
    sinks.push(file_sink);
    let logger = Arc::new(
        spdlog::Logger::builder()
            .sinks(sinks)
            .flush_level_filter(spdlog::LevelFilter::All)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

fn main() {
    // Create a cli
    let matches = Command::new("asdf_windows_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    if let Err(e) = init_logging() {
        eprintln!("Could not create log file {LOG_FILE}: {e}");
    }

    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            spdlog::error!("A configuration path is required");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        spdlog::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        match make_template_config(&config_path) {
            Ok(()) => spdlog::info!("Done."),
            Err(e) => spdlog::error!("Could not write template config: {e}"),
        }
        return;
    }

    // Load our config
    spdlog::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            return;
        }
    };
    spdlog::info!("Config successfully loaded.");
    spdlog::info!("Event: {} Period band: {}", config.event_name, config.period_band);
    spdlog::info!("Data Path: {}", config.data_path.to_string_lossy());
    spdlog::info!("Parameter Path: {}", config.param_path.to_string_lossy());
    spdlog::info!("Output Path: {}", config.output_path.to_string_lossy());
    spdlog::info!(
        "Observed Tag: {} Synthetic Tag: {}",
        config.get_observed_tag(),
        config.get_synthetic_tag()
    );
    spdlog::info!(
        "Selector: {} {}",
        config.selector_program.to_string_lossy(),
        config.selector_args.join(" ")
    );

    // Setup the progress bar
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
        pb.set_style(style);
    }

    let selector = ExternalSelector::new(&config.selector_program, &config.selector_args);
    let result = process_event(&config, Box::new(selector), &mut |status| {
        pb.set_length(status.total as u64);
        pb.set_position(status.index as u64 + 1);
        pb.set_message(status.station);
    });
    pb.finish_and_clear();

    match result {
        Ok(path) => spdlog::info!(
            "Successfully selected windows! Written to {}",
            path.to_string_lossy()
        ),
        Err(e) => spdlog::error!("Window selection failed with error: {e}"),
    }

    spdlog::info!("Done.");
}

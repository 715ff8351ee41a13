use spdlog::{Level, LevelFilter, Logger};
use std::str::FromStr;
use std::sync::Arc;

use super::dataset::{EventMetadata, StationMetadata};
use super::error::{ConfigError, SelectorError};
use super::params::OptionRecord;
use super::selector::{SelectorConfig, WindowSelector};
use super::trace::Trace;
use super::window::WindowRecord;

const SELECTOR_LOGGER_NAME: &str = "selector";

/// Parse a log level name (critical, error, warn, info, debug, trace)
pub fn parse_level(level: &str) -> Result<LevelFilter, ConfigError> {
    Level::from_str(level)
        .map(LevelFilter::MoreSevereEqual)
        .map_err(|_| ConfigError::BadLogLevel(level.to_string()))
}

/// Build the logger used for window selection output.
///
/// It writes to the same sinks as the default logger, but with its own level so that
/// the per-trace selection chatter can be tuned without touching the rest of the run.
pub fn selector_logger(level: LevelFilter) -> Result<Arc<Logger>, spdlog::Error> {
    let logger = Logger::builder()
        .name(SELECTOR_LOGGER_NAME)
        .sinks(spdlog::default_logger().sinks().to_owned())
        .level_filter(level)
        .build()?;
    Ok(Arc::new(logger))
}

/// WindowInvoker runs the selection backend on one trace pair at a time.
pub struct WindowInvoker {
    selector: Box<dyn WindowSelector>,
    logger: Arc<Logger>,
}

impl WindowInvoker {
    pub fn new(selector: Box<dyn WindowSelector>, logger: Arc<Logger>) -> Self {
        Self { selector, logger }
    }

    /// Select windows on a pair of observed and synthetic traces.
    ///
    /// The algorithm config is built here, so an unrecognized option fails on the first
    /// trace pair that uses it. Selection errors are returned as-is.
    pub fn select_windows_trace(
        &self,
        observed: &Trace,
        synthetic: &Trace,
        options: &OptionRecord,
        event: &EventMetadata,
        station: &StationMetadata,
    ) -> Result<Vec<WindowRecord>, SelectorError> {
        let config = SelectorConfig::from_options(options)?;
        spdlog::debug!(logger: self.logger, "obs trace: {}", observed);
        spdlog::debug!(logger: self.logger, "syn trace: {}", synthetic);
        spdlog::trace!(logger: self.logger, "config: {:?}", config);

        let windows =
            self.selector
                .select_windows(observed, synthetic, &config, event, station)?;
        spdlog::info!(
            logger: self.logger,
            "Number of windows selected for {}: {}",
            observed.id,
            windows.len()
        );
        Ok(windows)
    }
}

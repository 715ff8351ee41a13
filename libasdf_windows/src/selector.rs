//! The window selection capability.
//!
//! Window selection itself (STA/LTA screening, similarity tests, window merging) is done
//! by an external algorithm. This module holds its configuration object and the trait
//! every backend implements.
use serde::{Deserialize, Serialize};

use super::dataset::{EventMetadata, StationMetadata};
use super::error::SelectorError;
use super::params::OptionRecord;
use super::trace::Trace;
use super::window::WindowRecord;

/// Every option name the algorithm configuration accepts
pub const OPTION_NAMES: [&str; 30] = [
    "min_period",
    "max_period",
    "stalta_waterlevel",
    "tshift_acceptance_level",
    "tshift_reference",
    "dlna_acceptance_level",
    "dlna_reference",
    "cc_acceptance_level",
    "s2n_limit",
    "earth_model",
    "min_surface_wave_velocity",
    "max_time_before_first_arrival",
    "c_0",
    "c_1",
    "c_2",
    "c_3a",
    "c_3b",
    "c_4a",
    "c_4b",
    "check_global_data_quality",
    "snr_integrate_base",
    "snr_max_base",
    "noise_start_index",
    "noise_end_index",
    "signal_start_index",
    "signal_end_index",
    "window_weight_fct",
    "window_signal_to_noise_type",
    "resolution_strategy",
    "selection_mode",
];

fn default_stalta_waterlevel() -> f64 {
    0.07
}
fn default_tshift_acceptance_level() -> f64 {
    10.0
}
fn default_dlna_acceptance_level() -> f64 {
    1.3
}
fn default_cc_acceptance_level() -> f64 {
    0.7
}
fn default_s2n_limit() -> f64 {
    1.5
}
fn default_earth_model() -> String {
    String::from("ak135")
}
fn default_min_surface_wave_velocity() -> f64 {
    3.0
}
fn default_max_time_before_first_arrival() -> f64 {
    50.0
}
fn default_c_0() -> f64 {
    1.0
}
fn default_c_1() -> f64 {
    1.5
}
fn default_c_3a() -> f64 {
    4.0
}
fn default_c_3b() -> f64 {
    2.5
}
fn default_c_4a() -> f64 {
    2.0
}
fn default_c_4b() -> f64 {
    6.0
}
fn default_snr_integrate_base() -> f64 {
    3.5
}
fn default_snr_max_base() -> f64 {
    3.0
}
fn default_signal_end_index() -> i64 {
    -1
}
fn default_window_signal_to_noise_type() -> String {
    String::from("amplitude")
}
fn default_resolution_strategy() -> String {
    String::from("interval_scheduling")
}

/// Configuration of the window selection algorithm for one component.
///
/// Only the periods are required; every other option falls back to the algorithm's
/// own default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorConfig {
    pub min_period: f64,
    pub max_period: f64,
    #[serde(default = "default_stalta_waterlevel")]
    pub stalta_waterlevel: f64,
    #[serde(default = "default_tshift_acceptance_level")]
    pub tshift_acceptance_level: f64,
    #[serde(default)]
    pub tshift_reference: f64,
    #[serde(default = "default_dlna_acceptance_level")]
    pub dlna_acceptance_level: f64,
    #[serde(default)]
    pub dlna_reference: f64,
    #[serde(default = "default_cc_acceptance_level")]
    pub cc_acceptance_level: f64,
    #[serde(default = "default_s2n_limit")]
    pub s2n_limit: f64,
    #[serde(default = "default_earth_model")]
    pub earth_model: String,
    #[serde(default = "default_min_surface_wave_velocity")]
    pub min_surface_wave_velocity: f64,
    #[serde(default = "default_max_time_before_first_arrival")]
    pub max_time_before_first_arrival: f64,
    #[serde(default = "default_c_0")]
    pub c_0: f64,
    #[serde(default = "default_c_1")]
    pub c_1: f64,
    #[serde(default)]
    pub c_2: f64,
    #[serde(default = "default_c_3a")]
    pub c_3a: f64,
    #[serde(default = "default_c_3b")]
    pub c_3b: f64,
    #[serde(default = "default_c_4a")]
    pub c_4a: f64,
    #[serde(default = "default_c_4b")]
    pub c_4b: f64,
    #[serde(default)]
    pub check_global_data_quality: bool,
    #[serde(default = "default_snr_integrate_base")]
    pub snr_integrate_base: f64,
    #[serde(default = "default_snr_max_base")]
    pub snr_max_base: f64,
    #[serde(default)]
    pub noise_start_index: i64,
    #[serde(default)]
    pub noise_end_index: Option<i64>,
    #[serde(default)]
    pub signal_start_index: Option<i64>,
    #[serde(default = "default_signal_end_index")]
    pub signal_end_index: i64,
    #[serde(default)]
    pub window_weight_fct: Option<String>,
    #[serde(default = "default_window_signal_to_noise_type")]
    pub window_signal_to_noise_type: String,
    #[serde(default = "default_resolution_strategy")]
    pub resolution_strategy: String,
    #[serde(default)]
    pub selection_mode: Option<String>,
}

impl SelectorConfig {
    /// Build the configuration from a materialized option record.
    ///
    /// Fails on the first option name the algorithm does not accept, or on a value of
    /// the wrong type.
    pub fn from_options(options: &OptionRecord) -> Result<Self, SelectorError> {
        if let Some(name) = options
            .keys()
            .find(|name| !OPTION_NAMES.contains(&name.as_str()))
        {
            return Err(SelectorError::UnrecognizedOption(name.clone()));
        }
        let mapping: serde_yaml::Mapping = options
            .iter()
            .map(|(k, v)| (serde_yaml::Value::String(k.clone()), v.clone()))
            .collect();
        Ok(serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))?)
    }
}

/// A backend capable of selecting windows on an observed/synthetic trace pair.
///
/// Implementations perform the signal analysis and return windows in chronological
/// order. Any failure is an `Analysis` error; callers do not retry.
pub trait WindowSelector {
    fn select_windows(
        &self,
        observed: &Trace,
        synthetic: &Trace,
        config: &SelectorConfig,
        event: &EventMetadata,
        station: &StationMetadata,
    ) -> Result<Vec<WindowRecord>, SelectorError>;
}

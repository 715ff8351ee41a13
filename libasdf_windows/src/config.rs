use serde::{Deserialize, Serialize};
use spdlog::LevelFilter;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::invoker::parse_level;

/// Structure representing the run configuration. Contains pathing, tag and selector information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub event_name: String,
    pub period_band: String,
    pub data_path: PathBuf,
    pub param_path: PathBuf,
    pub output_path: PathBuf,
    pub observed_tag: Option<String>,
    pub synthetic_tag: Option<String>,
    pub selector_program: PathBuf,
    pub selector_args: Vec<String>,
    pub selector_log_level: String,
}

impl Default for Config {
    /// Generate a new Config object. All paths will be empty/invalid
    fn default() -> Self {
        Self {
            event_name: String::from(""),
            period_band: String::from(""),
            data_path: PathBuf::from("None"),
            param_path: PathBuf::from("None"),
            output_path: PathBuf::from("None"),
            observed_tag: None,
            synthetic_tag: None,
            selector_program: PathBuf::from("None"),
            selector_args: vec![],
            selector_log_level: String::from("info"),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Tag of the processed observed waveforms (proc_obsd_<band> unless given)
    pub fn get_observed_tag(&self) -> String {
        match &self.observed_tag {
            Some(tag) => tag.clone(),
            None => format!("proc_obsd_{}", self.period_band),
        }
    }

    /// Tag of the processed synthetic waveforms (proc_synt_<band> unless given)
    pub fn get_synthetic_tag(&self) -> String {
        match &self.synthetic_tag {
            Some(tag) => tag.clone(),
            None => format!("proc_synt_{}", self.period_band),
        }
    }

    /// Get the path to the observed ASDF file
    pub fn get_observed_file(&self) -> Result<PathBuf, ConfigError> {
        self.get_data_file(&self.get_observed_tag())
    }

    /// Get the path to the synthetic ASDF file
    pub fn get_synthetic_file(&self) -> Result<PathBuf, ConfigError> {
        self.get_data_file(&self.get_synthetic_tag())
    }

    fn get_data_file(&self, tag: &str) -> Result<PathBuf, ConfigError> {
        let data_file = self.data_path.join(format!("{}.{}.h5", self.event_name, tag));
        if data_file.exists() {
            Ok(data_file)
        } else {
            Err(ConfigError::BadFilePath(data_file))
        }
    }

    /// Get the path to the output window file. The directory may not exist yet.
    pub fn get_output_file(&self) -> PathBuf {
        self.output_path
            .join(format!("{}.{}.json", self.event_name, self.period_band))
    }

    /// Level of the window selection logger
    pub fn get_selector_level(&self) -> Result<LevelFilter, ConfigError> {
        parse_level(&self.selector_log_level)
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config has an invalid selector log level: {0}")]
    BadLogLevel(String),
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Could not load window parameters as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Window parameters failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Window parameter template is malformed (requires a default and a components mapping): {0}")]
    MalformedTemplate(#[from] serde_yaml::Error),
    #[error("Window parameter flag {0} must be a boolean")]
    InvalidFlag(String),
}

#[derive(Debug, Clone, Error)]
pub enum TraceIdError {
    #[error("Trace id {0} is not of the form network.station.location.channel")]
    BadFormat(String),
    #[error("Trace id {0} has an empty channel code")]
    EmptyChannel(String),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Could not open waveform dataset as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Waveform dataset failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Waveform dataset failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Waveform dataset does not contain an event record")]
    MissingEvent,
    #[error("Waveform dataset has no station {0}")]
    MissingStation(String),
    #[error("Waveform dataset has no StationXML for station {0}")]
    MissingStationMetadata(String),
    #[error("Waveform dataset contains a waveform with a malformed name: {0}")]
    BadWaveformName(String),
    #[error("Waveform dataset contains a bad trace id: {0}")]
    BadTraceId(#[from] TraceIdError),
    #[error("Waveform dataset contains a waveform with an invalid start time: {0}")]
    BadStartTime(#[from] time::error::ComponentRange),
    #[error("Waveform dataset contains metadata that is not valid UTF-8: {0}")]
    BadMetadata(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Window selection config does not recognize the option {0}")]
    UnrecognizedOption(String),
    #[error("Window selection config was given an invalid option value: {0}")]
    InvalidOption(#[from] serde_yaml::Error),
    #[error("Window selection failed to launch the external selector {0:?}: {1}")]
    Launch(PathBuf, std::io::Error),
    #[error("Window selection failed during analysis: {0}")]
    Analysis(String),
    #[error("Window selection failed to exchange JSON with the external selector: {0}")]
    Protocol(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Window writer failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Window writer failed to encode JSON: {0}")]
    EncodingError(#[from] serde_json::Error),
    #[error("Window on {0} starts or ends {1} s after its first sample, which is not a valid time")]
    TimeOutOfRange(String, f64),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to window parameter error: {0}")]
    ParamError(#[from] ParamError),
    #[error("Processor failed due to waveform dataset error: {0}")]
    DatasetError(#[from] DatasetError),
    #[error("Processor failed due to window selection error: {0}")]
    SelectorError(#[from] SelectorError),
    #[error("Processor failed due to window writer error: {0}")]
    WriterError(#[from] WriterError),
    #[error("Processor failed to build the selector logger: {0}")]
    LoggerError(#[from] spdlog::Error),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}

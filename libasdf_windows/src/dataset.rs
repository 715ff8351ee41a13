use std::collections::BTreeMap;

use super::error::DatasetError;
use super::trace::Stream;

/// Earthquake source description (QuakeML). Passed through to the selector untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMetadata {
    pub quakeml: String,
}

impl EventMetadata {
    pub fn new(quakeml: &str) -> Self {
        Self {
            quakeml: quakeml.to_string(),
        }
    }
}

/// Station inventory and instrument response (StationXML). Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationMetadata {
    pub station_xml: String,
}

impl StationMetadata {
    pub fn new(station_xml: &str) -> Self {
        Self {
            station_xml: station_xml.to_string(),
        }
    }
}

/// The read-only query surface of a waveform container.
///
/// Station names are reported in the container's own order.
pub trait WaveformDataset {
    /// All station names (NET.STA) in the dataset
    fn station_names(&self) -> Result<Vec<String>, DatasetError>;

    /// Tags of the waveform groups held by a station
    fn waveform_tags(&self, station: &str) -> Result<Vec<String>, DatasetError>;

    /// The group of traces under a tag. None if the station or tag does not exist.
    fn get_stream(&self, station: &str, tag: &str) -> Result<Option<Stream>, DatasetError>;

    /// The station's instrument metadata, if present
    fn get_station_metadata(&self, station: &str)
        -> Result<Option<StationMetadata>, DatasetError>;

    /// The event record of the dataset
    fn get_event(&self) -> Result<EventMetadata, DatasetError>;

    fn has_station(&self, station: &str) -> Result<bool, DatasetError> {
        Ok(self.station_names()?.iter().any(|name| name == station))
    }

    fn has_tag(&self, station: &str, tag: &str) -> Result<bool, DatasetError> {
        Ok(self.waveform_tags(station)?.iter().any(|t| t == tag))
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryStation {
    groups: BTreeMap<String, Stream>,
    metadata: Option<StationMetadata>,
}

/// A dataset held entirely in memory, i.e. for data that did not come from a file
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    order: Vec<String>,
    stations: BTreeMap<String, MemoryStation>,
    event: Option<EventMetadata>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event: EventMetadata) -> Self {
        self.event = Some(event);
        self
    }

    fn station_mut(&mut self, station: &str) -> &mut MemoryStation {
        if !self.stations.contains_key(station) {
            self.order.push(station.to_string());
        }
        self.stations.entry(station.to_string()).or_default()
    }

    /// Add a station with no data
    pub fn add_station(&mut self, station: &str) {
        self.station_mut(station);
    }

    /// Add (or replace) a tagged waveform group
    pub fn add_stream(&mut self, station: &str, tag: &str, stream: Stream) {
        self.station_mut(station)
            .groups
            .insert(tag.to_string(), stream);
    }

    pub fn add_station_metadata(&mut self, station: &str, metadata: StationMetadata) {
        self.station_mut(station).metadata = Some(metadata);
    }
}

impl WaveformDataset for MemoryDataset {
    fn station_names(&self) -> Result<Vec<String>, DatasetError> {
        Ok(self.order.clone())
    }

    fn waveform_tags(&self, station: &str) -> Result<Vec<String>, DatasetError> {
        match self.stations.get(station) {
            Some(sta) => Ok(sta.groups.keys().cloned().collect()),
            None => Err(DatasetError::MissingStation(station.to_string())),
        }
    }

    fn get_stream(&self, station: &str, tag: &str) -> Result<Option<Stream>, DatasetError> {
        Ok(self
            .stations
            .get(station)
            .and_then(|sta| sta.groups.get(tag))
            .cloned())
    }

    fn get_station_metadata(
        &self,
        station: &str,
    ) -> Result<Option<StationMetadata>, DatasetError> {
        Ok(self
            .stations
            .get(station)
            .and_then(|sta| sta.metadata.clone()))
    }

    fn get_event(&self) -> Result<EventMetadata, DatasetError> {
        self.event.clone().ok_or(DatasetError::MissingEvent)
    }
}

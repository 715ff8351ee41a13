use ndarray::Array1;
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;
use time::OffsetDateTime;

use super::error::TraceIdError;
use super::window::format_utc;

/// Location code used by all synthetic traces
const SYNTHETIC_LOCATION: &str = "S3";
/// Band and instrument code prefix used by all synthetic traces
const SYNTHETIC_CHANNEL_PREFIX: &str = "MX";

/// Dot delimited trace identifier network.station.location.channel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraceId {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
}

impl TraceId {
    pub fn new(network: &str, station: &str, location: &str, channel: &str) -> Self {
        Self {
            network: network.to_string(),
            station: station.to_string(),
            location: location.to_string(),
            channel: channel.to_string(),
        }
    }

    /// The component code is the last character of the channel (LHZ -> Z)
    pub fn component(&self) -> char {
        // Parsing guarantees a non-empty channel
        self.channel.chars().last().unwrap_or_default()
    }

    /// The synthetic counterpart of this trace. Synthetic naming is fixed, never discovered.
    pub fn synthetic_id(&self) -> Self {
        Self {
            network: self.network.clone(),
            station: self.station.clone(),
            location: String::from(SYNTHETIC_LOCATION),
            channel: format!("{}{}", SYNTHETIC_CHANNEL_PREFIX, self.component()),
        }
    }

    /// Instrument id, the trace id minus the component code (IU.ANMO.00.LH)
    pub fn instrument(&self) -> String {
        let mut id = self.to_string();
        id.pop();
        id
    }

    /// Station group name as used by the dataset (IU.ANMO)
    pub fn station_name(&self) -> String {
        format!("{}.{}", self.network, self.station)
    }
}

impl FromStr for TraceId {
    type Err = TraceIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('.').collect();
        if fields.len() != 4 {
            return Err(TraceIdError::BadFormat(s.to_string()));
        }
        if fields[3].is_empty() {
            return Err(TraceIdError::EmptyChannel(s.to_string()));
        }
        Ok(Self::new(fields[0], fields[1], fields[2], fields[3]))
    }
}

impl Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn serialize_starttime<S: Serializer>(time: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_utc(time))
}

fn serialize_samples<S: Serializer>(data: &Array1<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(data.iter())
}

/// A single time series for one channel
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub id: TraceId,
    #[serde(serialize_with = "serialize_starttime")]
    pub starttime: OffsetDateTime,
    pub sampling_rate: f64,
    #[serde(serialize_with = "serialize_samples")]
    pub data: Array1<f64>,
}

impl Trace {
    pub fn new(id: TraceId, starttime: OffsetDateTime, sampling_rate: f64, data: Array1<f64>) -> Self {
        Self {
            id,
            starttime,
            sampling_rate,
            data,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.data.len()
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {} Hz, {} samples",
            self.id,
            format_utc(&self.starttime),
            self.sampling_rate,
            self.n_samples()
        )
    }
}

/// The ordered set of traces in one tagged station group
#[derive(Debug, Clone, Default)]
pub struct Stream {
    pub traces: Vec<Trace>,
}

impl Stream {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    /// All traces whose id exactly matches
    pub fn select(&self, id: &TraceId) -> Vec<&Trace> {
        self.traces.iter().filter(|tr| tr.id == *id).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trace> {
        self.traces.iter()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

use super::error::WriterError;

/// UTC timestamps are written with microsecond precision, i.e. 2005-01-01T19:08:00.000000Z
const UTC_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

/// Format a timestamp in UTC using the fixed window format
pub fn format_utc(time: &OffsetDateTime) -> String {
    // The format description has no fallible components
    time.to_offset(UtcOffset::UTC)
        .format(UTC_FORMAT)
        .unwrap_or_default()
}

/// A seismic phase predicted to arrive inside a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseArrival {
    pub name: String,
    pub time: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One window selected by the external algorithm on a trace pair.
///
/// Indices are sample indices into the observed trace. Attributes the algorithm reports
/// beyond the known ones are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub left: usize,
    pub right: usize,
    pub center: usize,
    pub channel_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time_of_first_sample: OffsetDateTime,
    pub dt: f64,
    #[serde(deserialize_with = "positive_period")]
    pub min_period: f64,
    pub max_cc_value: f64,
    pub cc_shift: i64,
    #[serde(rename = "dlnA")]
    pub dlna: f64,
    #[serde(default)]
    pub phase_arrivals: Vec<PhaseArrival>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The window weight divides by the minimum period
fn positive_period<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let period = f64::deserialize(deserializer)?;
    if period > 0.0 {
        Ok(period)
    } else {
        Err(serde::de::Error::custom(format!(
            "min_period must be positive, got {period}"
        )))
    }
}

impl WindowRecord {
    pub fn relative_starttime(&self) -> f64 {
        self.left as f64 * self.dt
    }

    pub fn relative_endtime(&self) -> f64 {
        self.right as f64 * self.dt
    }

    pub fn absolute_starttime(&self) -> Result<OffsetDateTime, WriterError> {
        self.offset_time(self.relative_starttime())
    }

    pub fn absolute_endtime(&self) -> Result<OffsetDateTime, WriterError> {
        self.offset_time(self.relative_endtime())
    }

    /// Indices and dt come from the selector unchecked, so the sum may not be a valid time
    fn offset_time(&self, seconds: f64) -> Result<OffsetDateTime, WriterError> {
        Duration::checked_seconds_f64(seconds)
            .and_then(|offset| self.time_of_first_sample.checked_add(offset))
            .ok_or_else(|| WriterError::TimeOutOfRange(self.channel_id.clone(), seconds))
    }

    pub fn cc_shift_in_seconds(&self) -> f64 {
        self.cc_shift as f64 * self.dt
    }

    /// Window length in seconds
    pub fn length(&self) -> f64 {
        self.relative_endtime() - self.relative_starttime()
    }

    /// Length in units of the minimum period, scaled by the cross-correlation
    pub fn weight(&self) -> f64 {
        self.length() / self.min_period * self.max_cc_value
    }

    /// Encode the window in the window file format.
    ///
    /// Extra attributes are written first so that the known fields always win on a
    /// name clash.
    pub fn to_json(&self, with_phase: bool) -> Result<Value, WriterError> {
        let mut info: Map<String, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let known = json!({
            "left_index": self.left,
            "right_index": self.right,
            "center_index": self.center,
            "channel_id": self.channel_id,
            "time_of_first_sample": format_utc(&self.time_of_first_sample),
            "max_cc_value": self.max_cc_value,
            "cc_shift_in_samples": self.cc_shift,
            "cc_shift_in_seconds": self.cc_shift_in_seconds(),
            "dlnA": self.dlna,
            "dt": self.dt,
            "min_period": self.min_period,
            "absolute_starttime": format_utc(&self.absolute_starttime()?),
            "absolute_endtime": format_utc(&self.absolute_endtime()?),
            "relative_starttime": self.relative_starttime(),
            "relative_endtime": self.relative_endtime(),
            "window_weight": self.weight(),
        });
        if let Value::Object(known) = known {
            info.extend(known);
        }
        if with_phase {
            info.insert(
                String::from("phase_arrivals"),
                serde_json::to_value(&self.phase_arrivals)?,
            );
        }
        Ok(Value::Object(info))
    }
}

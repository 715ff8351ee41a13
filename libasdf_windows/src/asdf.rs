use hdf5::{File, Group};
use ndarray::Array1;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::OffsetDateTime;

use super::dataset::{EventMetadata, StationMetadata, WaveformDataset};
use super::error::DatasetError;
use super::trace::{Stream, Trace, TraceId};

const QUAKEML_NAME: &str = "QuakeML";
const WAVEFORMS_NAME: &str = "Waveforms";
const STATIONXML_NAME: &str = "StationXML";
const SAMPLING_RATE_ATTR: &str = "sampling_rate";
const STARTTIME_ATTR: &str = "starttime";
const NAME_SEPARATOR: &str = "__";

// Structure (only the parts that are read)
// QuakeML(dset, i8)
// Waveforms
// |---- NET.STA
// |    |---- StationXML(dset, i8)
// |    |---- NET.STA.LOC.CHA__start__end__tag(dset) - sampling_rate, starttime

/// The parts of an ASDF waveform dataset name that matter here
#[derive(Debug, Clone, PartialEq, Eq)]
struct WaveformName {
    id: TraceId,
    tag: String,
}

impl FromStr for WaveformName {
    type Err = DatasetError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.splitn(4, NAME_SEPARATOR).collect();
        if fields.len() != 4 || fields[3].is_empty() {
            return Err(DatasetError::BadWaveformName(s.to_string()));
        }
        Ok(Self {
            id: TraceId::from_str(fields[0])?,
            tag: fields[3].to_string(),
        })
    }
}

/// A read-only ASDF (HDF5) waveform file.
///
/// Only the query surface needed for window selection is read: station groups,
/// tagged waveforms, StationXML and the QuakeML event record.
#[derive(Debug)]
pub struct AsdfDataset {
    file_handle: File,
    path: PathBuf,
}

impl AsdfDataset {
    /// Open an existing ASDF file read-only
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::BadFilePath(path.to_path_buf()));
        }
        let size = path.metadata()?.len();
        spdlog::info!(
            "Opening ASDF file {} ({})",
            path.to_string_lossy(),
            human_bytes::human_bytes(size as f64)
        );
        Ok(Self {
            file_handle: File::open(path)?,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn waveforms_group(&self) -> Result<Option<Group>, DatasetError> {
        if self.file_handle.link_exists(WAVEFORMS_NAME) {
            Ok(Some(self.file_handle.group(WAVEFORMS_NAME)?))
        } else {
            Ok(None)
        }
    }

    fn station_group(&self, station: &str) -> Result<Option<Group>, DatasetError> {
        match self.waveforms_group()? {
            Some(waveforms) if waveforms.link_exists(station) => {
                Ok(Some(waveforms.group(station)?))
            }
            _ => Ok(None),
        }
    }

    /// Parse the names of all waveforms in a station group
    fn waveform_names(group: &Group) -> Result<Vec<(String, WaveformName)>, DatasetError> {
        let mut names = Vec::new();
        for member in group.member_names()? {
            if member == STATIONXML_NAME {
                continue;
            }
            let parsed = WaveformName::from_str(&member)?;
            names.push((member, parsed));
        }
        Ok(names)
    }

    fn read_trace(group: &Group, name: &str, id: TraceId) -> Result<Trace, DatasetError> {
        let dset = group.dataset(name)?;
        let data = Array1::from_vec(dset.read_raw::<f64>()?);
        let sampling_rate = dset.attr(SAMPLING_RATE_ATTR)?.read_scalar::<f64>()?;
        let start_ns = dset.attr(STARTTIME_ATTR)?.read_scalar::<i64>()?;
        let starttime = OffsetDateTime::from_unix_timestamp_nanos(start_ns as i128)?;
        Ok(Trace::new(id, starttime, sampling_rate, data))
    }

    /// XML documents are stored as signed bytes; reinterpret them, don't convert
    fn read_text(group: &Group, name: &str) -> Result<String, DatasetError> {
        let bytes: Vec<u8> = group
            .dataset(name)?
            .read_raw::<i8>()?
            .into_iter()
            .map(|b| b as u8)
            .collect();
        Ok(String::from_utf8(bytes)?)
    }
}

impl WaveformDataset for AsdfDataset {
    fn station_names(&self) -> Result<Vec<String>, DatasetError> {
        match self.waveforms_group()? {
            Some(waveforms) => Ok(waveforms.member_names()?),
            None => Ok(vec![]),
        }
    }

    fn has_station(&self, station: &str) -> Result<bool, DatasetError> {
        Ok(self.station_group(station)?.is_some())
    }

    fn waveform_tags(&self, station: &str) -> Result<Vec<String>, DatasetError> {
        let group = self
            .station_group(station)?
            .ok_or_else(|| DatasetError::MissingStation(station.to_string()))?;
        let mut tags: Vec<String> = Vec::new();
        for (_, name) in Self::waveform_names(&group)? {
            if !tags.contains(&name.tag) {
                tags.push(name.tag);
            }
        }
        Ok(tags)
    }

    fn get_stream(&self, station: &str, tag: &str) -> Result<Option<Stream>, DatasetError> {
        let group = match self.station_group(station)? {
            Some(g) => g,
            None => return Ok(None),
        };
        let mut traces = Vec::new();
        for (member, name) in Self::waveform_names(&group)? {
            if name.tag == tag {
                traces.push(Self::read_trace(&group, &member, name.id)?);
            }
        }
        if traces.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Stream::new(traces)))
        }
    }

    fn get_station_metadata(
        &self,
        station: &str,
    ) -> Result<Option<StationMetadata>, DatasetError> {
        match self.station_group(station)? {
            Some(group) if group.link_exists(STATIONXML_NAME) => Ok(Some(StationMetadata {
                station_xml: Self::read_text(&group, STATIONXML_NAME)?,
            })),
            _ => Ok(None),
        }
    }

    fn get_event(&self) -> Result<EventMetadata, DatasetError> {
        if !self.file_handle.link_exists(QUAKEML_NAME) {
            return Err(DatasetError::MissingEvent);
        }
        let quakeml = Self::read_text(&self.file_handle, QUAKEML_NAME)?;
        if quakeml.trim().is_empty() {
            return Err(DatasetError::MissingEvent);
        }
        Ok(EventMetadata { quakeml })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const START_NS: i64 = 1_104_606_480_000_000_000; // 2005-01-01T19:08:00

    fn write_trace(group: &Group, name: &str, data: &[f32]) {
        let dset = group
            .new_dataset_builder()
            .with_data(data)
            .create(name)
            .unwrap();
        dset.new_attr::<f64>()
            .create(SAMPLING_RATE_ATTR)
            .unwrap()
            .write_scalar(&1.0)
            .unwrap();
        dset.new_attr::<i64>()
            .create(STARTTIME_ATTR)
            .unwrap()
            .write_scalar(&START_NS)
            .unwrap();
    }

    /// Text as pyasdf stores it
    fn xml(text: &str) -> Vec<i8> {
        text.bytes().map(|b| b as i8).collect()
    }

    fn make_file(path: &Path) {
        let file = File::create(path).unwrap();
        file.new_dataset_builder()
            .with_data(&xml("<quakeml/>"))
            .create(QUAKEML_NAME)
            .unwrap();
        let waveforms = file.create_group(WAVEFORMS_NAME).unwrap();
        let anmo = waveforms.create_group("IU.ANMO").unwrap();
        anmo.new_dataset_builder()
            .with_data(&xml("<FDSNStationXML/>"))
            .create(STATIONXML_NAME)
            .unwrap();
        write_trace(
            &anmo,
            "IU.ANMO.00.LHZ__2005-01-01T19:08:00__2005-01-01T19:08:02__proc_obsd_17_40",
            &[1.0, 2.0, 3.0],
        );
        write_trace(
            &anmo,
            "IU.ANMO.00.LHR__2005-01-01T19:08:00__2005-01-01T19:08:01__proc_obsd_17_40",
            &[4.0, 5.0],
        );
        write_trace(
            &anmo,
            "IU.ANMO.00.LHZ__2005-01-01T19:08:00__2005-01-01T19:08:02__raw_observed",
            &[0.0, 0.0, 0.0],
        );
        waveforms.create_group("II.AAK").unwrap();
    }

    /// Write a minimal ASDF file with one group per station under a single tag
    pub(crate) fn make_asdf(path: &Path, tag: &str, trace_ids: &[&str]) {
        let file = File::create(path).unwrap();
        file.new_dataset_builder()
            .with_data(&xml("<quakeml/>"))
            .create(QUAKEML_NAME)
            .unwrap();
        let waveforms = file.create_group(WAVEFORMS_NAME).unwrap();
        for trace_id in trace_ids {
            let id = TraceId::from_str(trace_id).unwrap();
            let station = id.station_name();
            let group = if waveforms.link_exists(&station) {
                waveforms.group(&station).unwrap()
            } else {
                let group = waveforms.create_group(&station).unwrap();
                group
                    .new_dataset_builder()
                    .with_data(&xml("<FDSNStationXML/>"))
                    .create(STATIONXML_NAME)
                    .unwrap();
                group
            };
            write_trace(
                &group,
                &format!("{trace_id}__2005-01-01T19:08:00__2005-01-01T19:08:02__{tag}"),
                &[1.0, 2.0, 3.0],
            );
        }
    }

    #[test]
    fn test_waveform_name() {
        let name = WaveformName::from_str(
            "IU.ANMO.00.LHZ__2005-01-01T19:08:00__2005-01-01T21:08:00__proc_obsd_17_40",
        )
        .unwrap();
        assert_eq!(name.id.to_string(), "IU.ANMO.00.LHZ");
        assert_eq!(name.tag, "proc_obsd_17_40");
        assert!(WaveformName::from_str("IU.ANMO.00.LHZ__proc_obsd_17_40").is_err());
    }

    #[test]
    fn test_read_asdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C200501011908A.proc_obsd_17_40.h5");
        make_file(&path);

        let ds = AsdfDataset::open(&path).unwrap();
        assert_eq!(ds.station_names().unwrap(), vec!["II.AAK", "IU.ANMO"]);
        assert!(ds.has_station("IU.ANMO").unwrap());
        assert!(!ds.has_station("IU.COLA").unwrap());
        assert_eq!(ds.get_event().unwrap().quakeml, "<quakeml/>");

        let tags = ds.waveform_tags("IU.ANMO").unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&String::from("proc_obsd_17_40")));
        assert!(tags.contains(&String::from("raw_observed")));

        let stream = ds.get_stream("IU.ANMO", "proc_obsd_17_40").unwrap().unwrap();
        assert_eq!(stream.len(), 2);
        let z = stream.select(&"IU.ANMO.00.LHZ".parse().unwrap());
        assert_eq!(z.len(), 1);
        assert_eq!(z[0].data.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(z[0].sampling_rate, 1.0);
        assert_eq!(z[0].starttime.unix_timestamp(), START_NS / 1_000_000_000);

        assert!(ds.get_stream("II.AAK", "proc_obsd_17_40").unwrap().is_none());
        assert!(ds.get_stream("IU.COLA", "proc_obsd_17_40").unwrap().is_none());
        assert_eq!(
            ds.get_station_metadata("IU.ANMO").unwrap().unwrap().station_xml,
            "<FDSNStationXML/>"
        );
        assert!(ds.get_station_metadata("II.AAK").unwrap().is_none());
    }

    #[test]
    fn test_missing_file_and_event() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AsdfDataset::open(&dir.path().join("missing.h5")),
            Err(DatasetError::BadFilePath(_))
        ));

        let path = dir.path().join("empty.h5");
        File::create(&path).unwrap();
        let ds = AsdfDataset::open(&path).unwrap();
        assert!(ds.station_names().unwrap().is_empty());
        assert!(matches!(ds.get_event(), Err(DatasetError::MissingEvent)));
    }
}

use std::collections::BTreeMap;

use super::dataset::{EventMetadata, StationMetadata, WaveformDataset};
use super::error::{DatasetError, ProcessorError};
use super::invoker::WindowInvoker;
use super::params::MaterializedParams;
use super::progress::StationStatus;
use super::trace::Stream;
use super::window::WindowRecord;

/// Windows of one station keyed by observed trace id
pub type StationWindows = BTreeMap<String, Vec<WindowRecord>>;

/// Windows of every processed station. A None value marks a station whose windows were
/// not attempted; it is never written out.
pub type ResultTree = BTreeMap<String, Option<StationWindows>>;

/// Select windows on every matched trace pair of one station
fn select_windows_stream(
    obs_stream: &Stream,
    syn_stream: &Stream,
    params: &MaterializedParams,
    invoker: &WindowInvoker,
    event: &EventMetadata,
    station: &StationMetadata,
) -> Result<StationWindows, ProcessorError> {
    let mut windows = StationWindows::new();
    for obs_trace in obs_stream.iter() {
        let syn_id = obs_trace.id.synthetic_id();
        let matches = syn_stream.select(&syn_id);
        let syn_trace = match matches.as_slice() {
            [] => {
                spdlog::info!(
                    "Synthetic trace {} not found in synthetic station group. Skipping {}",
                    syn_id,
                    obs_trace.id
                );
                continue;
            }
            [first] => *first,
            [first, ..] => {
                spdlog::warn!(
                    "Found {} synthetic traces matching {}; only the first is used for {}",
                    matches.len(),
                    syn_id,
                    obs_trace.id
                );
                *first
            }
        };

        let component = obs_trace.id.component().to_string();
        let options = match params.get(&component) {
            Some(o) => o,
            None => {
                spdlog::info!(
                    "Component {} not in window parameters. Skipping {}",
                    component,
                    obs_trace.id
                );
                continue;
            }
        };

        let trace_windows =
            invoker.select_windows_trace(obs_trace, syn_trace, options, event, station)?;
        windows.insert(obs_trace.id.to_string(), trace_windows);
    }
    Ok(windows)
}

/// Walk the observed dataset and select windows against the synthetic dataset.
///
/// Stations missing from the synthetic dataset, or missing a group under either tag,
/// are skipped and get no entry. Traces with no synthetic counterpart or no component
/// parameters are skipped and get no entry. A paired station without StationXML and
/// any selection error abort the walk.
pub fn select_windows_dataset(
    obs_ds: &dyn WaveformDataset,
    obs_tag: &str,
    syn_ds: &dyn WaveformDataset,
    syn_tag: &str,
    params: &MaterializedParams,
    invoker: &WindowInvoker,
    on_progress: &mut dyn FnMut(StationStatus),
) -> Result<ResultTree, ProcessorError> {
    let obs_stations = obs_ds.station_names()?;
    spdlog::info!("Number of stations in observed: {}", obs_stations.len());

    let event = obs_ds.get_event()?;
    let mut results = ResultTree::new();

    for (idx, station_name) in obs_stations.iter().enumerate() {
        on_progress(StationStatus::new(idx, obs_stations.len(), station_name));

        if !syn_ds.has_station(station_name)? {
            spdlog::info!(
                "Station {} not found in synthetic dataset. Skipping",
                station_name
            );
            continue;
        }

        let obs_stream = match obs_ds.get_stream(station_name, obs_tag)? {
            Some(s) => s,
            None => {
                spdlog::info!(
                    "Station {} has no observed group {}. Skipping",
                    station_name,
                    obs_tag
                );
                continue;
            }
        };
        let syn_stream = match syn_ds.get_stream(station_name, syn_tag)? {
            Some(s) => s,
            None => {
                spdlog::info!(
                    "Station {} has no synthetic group {}. Skipping",
                    station_name,
                    syn_tag
                );
                continue;
            }
        };

        let station = obs_ds
            .get_station_metadata(station_name)?
            .ok_or_else(|| DatasetError::MissingStationMetadata(station_name.clone()))?;

        spdlog::info!("Processing station group: {}", station_name);
        let windows =
            select_windows_stream(&obs_stream, &syn_stream, params, invoker, &event, &station)?;
        results.insert(station_name.clone(), Some(windows));
    }

    Ok(results)
}

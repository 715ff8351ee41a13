use std::path::PathBuf;

use super::asdf::AsdfDataset;
use super::config::Config;
use super::error::ProcessorError;
use super::invoker::{selector_logger, WindowInvoker};
use super::merge::merge_windows;
use super::pairing::select_windows_dataset;
use super::params::load_window_param_file;
use super::progress::StationStatus;
use super::selector::WindowSelector;
use super::writer::write_window_json;

/// The main loop of asdf_windows.
///
/// Loads the window parameters, walks the observed and synthetic ASDF files of one event,
/// and writes the selected windows. Nothing is written unless every station succeeds.
/// Returns the path of the window file.
pub fn process_event(
    config: &Config,
    selector: Box<dyn WindowSelector>,
    on_progress: &mut dyn FnMut(StationStatus),
) -> Result<PathBuf, ProcessorError> {
    let params = load_window_param_file(&config.param_path)?;
    spdlog::info!(
        "Window parameters loaded for components: {}",
        params
            .components
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    for (comp, options) in params.components.iter() {
        spdlog::debug!("Component {}: {:?}", comp, options);
    }

    let obs_tag = config.get_observed_tag();
    let syn_tag = config.get_synthetic_tag();
    let obs_ds = AsdfDataset::open(&config.get_observed_file()?)?;
    let syn_ds = AsdfDataset::open(&config.get_synthetic_file()?)?;

    let logger = selector_logger(config.get_selector_level()?)?;
    let invoker = WindowInvoker::new(selector, logger);

    let mut windows = select_windows_dataset(
        &obs_ds,
        &obs_tag,
        &syn_ds,
        &syn_tag,
        &params.components,
        &invoker,
        on_progress,
    )?;

    if params.output.instrument_merge {
        spdlog::info!("Merging windows across instruments...");
        windows = merge_windows(windows);
    }

    let output_file = config.get_output_file();
    spdlog::info!("Save window to file: {}", output_file.to_string_lossy());
    write_window_json(&windows, &output_file, params.output.with_phase)?;
    Ok(output_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asdf::tests::make_asdf;
    use crate::error::ConfigError;
    use crate::invoker::tests::MockSelector;
    use serde_json::Value;
    use std::path::Path;

    fn make_config(dir: &Path, params: &str) -> Config {
        let param_path = dir.join("window.param.yml");
        std::fs::write(&param_path, params).unwrap();
        Config {
            event_name: String::from("C200501011908A"),
            period_band: String::from("17_40"),
            data_path: dir.to_path_buf(),
            param_path,
            output_path: dir.join("window"),
            ..Default::default()
        }
    }

    #[test]
    fn test_process_event() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(
            dir.path(),
            "default: {min_period: 17, max_period: 40, instrument_merge_flag: true, write_window_with_phase: true}\ncomponents: {Z: null, R: null}",
        );
        make_asdf(
            &dir.path().join("C200501011908A.proc_obsd_17_40.h5"),
            "proc_obsd_17_40",
            &[
                "IU.ANMO.00.LHZ",
                "IU.ANMO.00.LHR",
                "IU.ANMO.10.LHZ",
                "II.AAK.00.LHZ",
            ],
        );
        make_asdf(
            &dir.path().join("C200501011908A.proc_synt_17_40.h5"),
            "proc_synt_17_40",
            &["IU.ANMO.S3.MXZ", "IU.ANMO.S3.MXR"],
        );

        let mut n_stations = 0;
        let output = process_event(&config, Box::new(MockSelector::new(1)), &mut |s| {
            n_stations = s.total
        })
        .unwrap();
        assert_eq!(n_stations, 2);
        assert_eq!(output, config.get_output_file());

        let parsed: Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
        let stations = parsed.as_object().unwrap();
        assert_eq!(stations.len(), 1);
        let anmo = stations["IU.ANMO"].as_object().unwrap();
        assert_eq!(
            anmo.keys().cloned().collect::<Vec<_>>(),
            vec!["IU.ANMO.00.LHR", "IU.ANMO.00.LHZ"]
        );
        assert!(anmo["IU.ANMO.00.LHZ"][0].get("phase_arrivals").is_some());
    }

    #[test]
    fn test_missing_inputs_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let param_path = dir.path().join("window.param.yml");
        std::fs::write(
            &param_path,
            "default: {min_period: 17, max_period: 40}\ncomponents: {Z: null}",
        )
        .unwrap();
        let config = Config {
            event_name: String::from("C200501011908A"),
            period_band: String::from("17_40"),
            data_path: dir.path().to_path_buf(),
            param_path,
            output_path: dir.path().join("window"),
            ..Default::default()
        };

        let result = process_event(&config, Box::new(MockSelector::new(1)), &mut |_| {});
        assert!(matches!(
            result,
            Err(ProcessorError::ConfigError(ConfigError::BadFilePath(_)))
        ));
        assert!(!config.get_output_file().exists());
    }
}

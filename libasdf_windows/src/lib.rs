//! # asdf_windows
//!
//! asdf_windows selects measurement windows on paired observed and synthetic seismograms
//! of an earthquake, written in Rust. It reads the processed observed and synthetic
//! waveforms of one event from two ASDF (HDF5) files, pairs every observed trace with its
//! synthetic counterpart, runs a window selection algorithm on each pair, and writes the
//! selected windows to a JSON file for the misfit measurement stage of a tomography
//! workflow.
//!
//! The window selection algorithm itself (STA/LTA screening, cross-correlation and
//! amplitude tests, window merging) is not part of this crate. It is an external
//! capability behind the [`selector::WindowSelector`] trait. The bundled backend,
//! [`external_selector::ExternalSelector`], runs an external program (for example a thin
//! wrapper around pyflex) once per trace pair.
//!
//! ## Installation
//!
//! Like the rest of the workspace, asdf_windows is installed from source.
//!
//! ### HDF5
//!
//! Before building and running asdf_windows, HDF5 must be installed. Typically this will
//! be installed using a package manager (homebrew, apt, etc), and the Rust libraries will
//! auto detect the location of the HDF install. If it is installed to a custom location,
//! write the following snippet into the file `.cargo/config.toml` in the repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./asdf_windows_cli` from the
//! top level repository.
//!
//! ## Configuration
//!
//! A run is described by a YAML file (`asdf_windows_cli -p config.yml new` writes a
//! template):
//!
//! ```yml
//! event_name: C200501011908A
//! period_band: 17_40
//! data_path: data
//! param_path: params/window.17_40.param.yml
//! output_path: data/window
//! observed_tag: null
//! synthetic_tag: null
//! selector_program: pyflex_select
//! selector_args: []
//! selector_log_level: info
//! ```
//!
//! - `data_path`: directory holding `<event_name>.<tag>.h5` for both datasets
//! - `observed_tag`/`synthetic_tag`: waveform tags to read. If null, `proc_obsd_<period_band>`
//! and `proc_synt_<period_band>` are used.
//! - `output_path`: directory of the window file `<event_name>.<period_band>.json`. It is
//! created if it does not exist.
//! - `selector_program`/`selector_args`: the external window selection program
//! - `selector_log_level`: verbosity of the per-trace selection log
//!
//! ### Window Parameters
//!
//! The window parameter file holds a shared `default` record and a `components` mapping.
//! A component set to null uses the defaults unchanged, otherwise its keys replace the
//! default ones:
//!
//! ```yml
//! default:
//!   min_period: 17.0
//!   max_period: 40.0
//!   s2n_limit: 3.0
//!   instrument_merge_flag: true
//!   write_window_with_phase: false
//! components:
//!   Z:
//!   R:
//!     s2n_limit: 2.5
//!   T:
//! ```
//!
//! `instrument_merge_flag` and `write_window_with_phase` never reach the algorithm. The
//! first keeps only the best instrument per station; the second adds the predicted phase
//! arrivals to every window in the output.
//!
//! ## Output
//!
//! ```text
//! C200501011908A.17_40.json
//! NET.STA
//! |---- NET.STA.LOC.CHA
//! |    |---- [window, window, ...]
//! ```
//!
//! Keys are sorted at every level. Windows keep the order the algorithm returned them in.
pub mod asdf;
pub mod config;
pub mod dataset;
pub mod error;
pub mod external_selector;
pub mod invoker;
pub mod merge;
pub mod pairing;
pub mod params;
pub mod process;
pub mod progress;
pub mod selector;
pub mod trace;
pub mod window;
pub mod writer;

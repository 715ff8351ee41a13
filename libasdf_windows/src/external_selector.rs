use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use super::dataset::{EventMetadata, StationMetadata};
use super::error::SelectorError;
use super::selector::{SelectorConfig, WindowSelector};
use super::trace::Trace;
use super::window::WindowRecord;

/// The JSON document written to the external program's stdin
#[derive(Debug, Serialize)]
struct SelectionRequest<'a> {
    observed: &'a Trace,
    synthetic: &'a Trace,
    config: &'a SelectorConfig,
    event: &'a str,
    station: &'a str,
}

/// Delegates window selection to an external program.
///
/// For every trace pair the program is run once. It receives a JSON object with the
/// `observed` and `synthetic` traces, the algorithm `config`, the `event` QuakeML and the
/// `station` StationXML on stdin, and must print a JSON array of windows on stdout. A
/// non-zero exit status is an analysis failure.
#[derive(Debug, Clone)]
pub struct ExternalSelector {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalSelector {
    pub fn new(program: &Path, args: &[String]) -> Self {
        Self {
            program: program.to_path_buf(),
            args: args.to_vec(),
        }
    }
}

impl WindowSelector for ExternalSelector {
    fn select_windows(
        &self,
        observed: &Trace,
        synthetic: &Trace,
        config: &SelectorConfig,
        event: &EventMetadata,
        station: &StationMetadata,
    ) -> Result<Vec<WindowRecord>, SelectorError> {
        let request = SelectionRequest {
            observed,
            synthetic,
            config,
            event: &event.quakeml,
            station: &station.station_xml,
        };
        let payload = serde_json::to_vec(&request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SelectorError::Launch(self.program.clone(), e))?;

        // Feed stdin on its own thread so a program that answers before it has read
        // everything cannot block on a full stdout pipe
        let stdin = child.stdin.take();
        let feeder = thread::spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        }); // stdin dropped at the end of the thread so the program sees EOF

        let output = child
            .wait_with_output()
            .map_err(|e| SelectorError::Launch(self.program.clone(), e))?;
        let fed = feeder
            .join()
            .unwrap_or_else(|_| {
                Err(std::io::Error::new(ErrorKind::Other, "stdin writer panicked"))
            });
        if !output.status.success() {
            return Err(SelectorError::Analysis(format!(
                "{} exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // A program may finish without reading its whole request
        if let Err(e) = fed {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(SelectorError::Launch(self.program.clone(), e));
            }
        }

        Ok(serde_json::from_slice::<Vec<WindowRecord>>(&output.stdout)?)
    }
}

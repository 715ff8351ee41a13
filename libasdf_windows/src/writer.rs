use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Serializer, Value};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::WriterError;
use super::pairing::ResultTree;

const INDENT: &[u8] = b"  ";

/// Two space indentation, with a bare `:` between keys and values.
///
/// Wraps the pretty formatter and only changes the key/value separator.
struct WindowFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl WindowFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(INDENT),
        }
    }
}

impl Formatter for WindowFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> std::io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> std::io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(b":")
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.pretty.end_object_value(writer)
    }
}

/// A JSON value whose objects serialize with their keys sorted at every level.
///
/// serde_json::Map keeps insertion order when its `preserve_order` feature is on, so the
/// sort is done here rather than left to the map type.
struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let sorted: BTreeMap<&String, Sorted> =
                    map.iter().map(|(key, value)| (key, Sorted(value))).collect();
                sorted.serialize(serializer)
            }
            Value::Array(values) => serializer.collect_seq(values.iter().map(Sorted)),
            other => other.serialize(serializer),
        }
    }
}

/// Flatten the result tree into the window file document.
///
/// Stations marked None are dropped. Window order is kept as selected. Fails if a
/// window cannot be placed in absolute time.
pub fn encode_windows(results: &ResultTree, with_phase: bool) -> Result<Value, WriterError> {
    let mut window_all = Map::new();
    for (station, sta_win) in results.iter() {
        let sta_win = match sta_win {
            Some(w) => w,
            None => continue,
        };
        let mut window_comp = Map::new();
        for (trace_id, trace_win) in sta_win.iter() {
            let windows = trace_win
                .iter()
                .map(|w| w.to_json(with_phase))
                .collect::<Result<Vec<_>, _>>()?;
            window_comp.insert(trace_id.clone(), Value::Array(windows));
        }
        window_all.insert(station.clone(), Value::Object(window_comp));
    }
    Ok(Value::Object(window_all))
}

/// Write a JSON value with the window file formatting and sorted keys
pub fn write_formatted<W: Write>(value: &Value, writer: W) -> Result<(), WriterError> {
    let mut serializer = Serializer::with_formatter(writer, WindowFormatter::new());
    Sorted(value).serialize(&mut serializer)?;
    Ok(())
}

/// Encode the result tree to bytes
pub fn encode_window_json(results: &ResultTree, with_phase: bool) -> Result<Vec<u8>, WriterError> {
    let mut buffer = Vec::new();
    write_formatted(&encode_windows(results, with_phase)?, &mut buffer)?;
    Ok(buffer)
}

/// Write the result tree to a window file, creating the parent directory if needed
pub fn write_window_json(
    results: &ResultTree,
    output_file: &Path,
    with_phase: bool,
) -> Result<(), WriterError> {
    // Encode first so a bad window leaves no partial file behind
    let document = encode_windows(results, with_phase)?;
    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(std::fs::File::create(output_file)?);
    write_formatted(&document, &mut writer)?;
    writer.flush()?;
    spdlog::info!("Windows written to {}", output_file.to_string_lossy());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::StationWindows;
    use crate::window::tests::make_window;
    use serde_json::json;

    fn tree() -> ResultTree {
        let mut anmo = StationWindows::new();
        anmo.insert(
            String::from("IU.ANMO.00.LHZ"),
            vec![make_window(300, 400), make_window(100, 200)],
        );
        anmo.insert(String::from("IU.ANMO.00.LHR"), vec![]);
        let mut tree = ResultTree::new();
        tree.insert(String::from("IU.ANMO"), Some(anmo));
        tree.insert(String::from("IU.HRV"), None);
        tree.insert(String::from("II.AAK"), Some(StationWindows::new()));
        tree
    }

    #[test]
    fn test_format() {
        let mut buffer = Vec::new();
        write_formatted(&json!({"b": [1, 2], "a": {"c": []}}), &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "{\n  \"a\":{\n    \"c\":[]\n  },\n  \"b\":[\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn test_round_trip() {
        let bytes = encode_window_json(&tree(), false).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        let stations = parsed.as_object().unwrap();
        assert_eq!(
            stations.keys().cloned().collect::<Vec<_>>(),
            vec!["II.AAK", "IU.ANMO"]
        );
        assert!(stations["II.AAK"].as_object().unwrap().is_empty());

        let anmo = stations["IU.ANMO"].as_object().unwrap();
        assert_eq!(
            anmo.keys().cloned().collect::<Vec<_>>(),
            vec!["IU.ANMO.00.LHR", "IU.ANMO.00.LHZ"]
        );
        let lhz = anmo["IU.ANMO.00.LHZ"].as_array().unwrap();
        assert_eq!(lhz.len(), 2);
        assert_eq!(lhz[0]["left_index"], json!(300));
        assert_eq!(lhz[1]["left_index"], json!(100));
        assert!(lhz[0].get("phase_arrivals").is_none());
    }

    #[test]
    fn test_sorted_keys_and_idempotent() {
        let first = encode_window_json(&tree(), true).unwrap();
        let second = encode_window_json(&tree(), true).unwrap();
        assert_eq!(first, second);

        let text = String::from_utf8(first).unwrap();
        assert!(!text.contains("IU.HRV"));
        assert!(!text.contains(": "));
        let absolute = text.find("\"absolute_endtime\"").unwrap();
        let window_weight = text.find("\"window_weight\"").unwrap();
        let phase = text.find("\"phase_arrivals\"").unwrap();
        assert!(absolute < phase && phase < window_weight);
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window").join("C200501011908A.17_40.json");
        write_window_json(&tree(), &path, false).unwrap();
        // Existing directory is fine
        write_window_json(&tree(), &path, false).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, encode_window_json(&tree(), false).unwrap());
    }

    #[test]
    fn test_nested_keys_sorted() {
        let value = json!({
            "z": [{"name": "P", "time": 1.0, "arc": 2}],
            "m": {"y": 1, "b": {"k": 0, "c": null}}
        });
        let mut buffer = Vec::new();
        write_formatted(&value, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let order: Vec<usize> = ["m", "b", "c", "k", "y", "z", "arc", "name", "time"]
            .iter()
            .map(|key| text.find(&format!("\"{key}\"")).unwrap())
            .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_bad_window_writes_nothing() {
        let mut bad = make_window(1, 2);
        bad.dt = 1e20;
        let mut station = StationWindows::new();
        station.insert(String::from("IU.ANMO.00.LHZ"), vec![bad]);
        let mut results = ResultTree::new();
        results.insert(String::from("IU.ANMO"), Some(station));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window").join("C200501011908A.17_40.json");
        assert!(matches!(
            write_window_json(&results, &path, false),
            Err(WriterError::TimeOutOfRange(_, _))
        ));
        assert!(!path.exists());
    }
}

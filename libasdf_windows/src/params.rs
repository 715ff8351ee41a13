//! Window selection parameters.
//!
//! A parameter file holds a shared `default` record plus a `components` mapping. Each
//! component either inherits the defaults unchanged (`null`) or overrides some of the
//! options. The template is expanded into one concrete option record per component.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::error::ParamError;

/// Flag consumed by the instrument merge step, never by the selection algorithm
pub const INSTRUMENT_MERGE_FLAG: &str = "instrument_merge_flag";
/// Flag consumed by the window writer, never by the selection algorithm
pub const WRITE_WITH_PHASE_FLAG: &str = "write_window_with_phase";

const RESERVED_OPTIONS: [&str; 2] = [INSTRUMENT_MERGE_FLAG, WRITE_WITH_PHASE_FLAG];

/// A flat option-name to value record
pub type OptionRecord = BTreeMap<String, serde_yaml::Value>;

/// Fully resolved option records keyed by component code (i.e. Z, R, T)
pub type MaterializedParams = BTreeMap<String, OptionRecord>;

/// The raw template as read from the parameter file
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterTemplate {
    pub default: OptionRecord,
    pub components: BTreeMap<String, Option<OptionRecord>>,
}

/// Output controls carried by the reserved options of the template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputFlags {
    pub with_phase: bool,
    pub instrument_merge: bool,
}

/// Everything loaded from a window parameter file
#[derive(Debug, Clone)]
pub struct WindowParams {
    pub components: MaterializedParams,
    pub output: OutputFlags,
}

impl ParameterTemplate {
    /// Parse a template from a YAML string
    pub fn from_yaml(yaml_str: &str) -> Result<Self, ParamError> {
        Ok(serde_yaml::from_str::<Self>(yaml_str)?)
    }

    /// Read the reserved flags from the default record. Missing flags are false.
    pub fn output_flags(&self) -> Result<OutputFlags, ParamError> {
        Ok(OutputFlags {
            with_phase: read_flag(&self.default, WRITE_WITH_PHASE_FLAG)?,
            instrument_merge: read_flag(&self.default, INSTRUMENT_MERGE_FLAG)?,
        })
    }
}

fn read_flag(record: &OptionRecord, name: &str) -> Result<bool, ParamError> {
    match record.get(name) {
        None | Some(serde_yaml::Value::Null) => Ok(false),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| ParamError::InvalidFlag(name.to_string())),
    }
}

/// Overwrite each key of the override onto the base. Nested values are replaced, not merged.
fn apply_overrides(base: &mut OptionRecord, overrides: &OptionRecord) {
    for (key, value) in overrides.iter() {
        base.insert(key.clone(), value.clone());
    }
}

/// Expand the template into one option record per declared component.
///
/// The reserved flags are stripped from every record, wherever they came from. No
/// validation of option names happens here; unknown options surface when the
/// selector config is built.
pub fn materialize(template: &ParameterTemplate) -> MaterializedParams {
    let mut results = MaterializedParams::new();
    for (comp, overrides) in template.components.iter() {
        let mut record = template.default.clone();
        if let Some(overrides) = overrides {
            apply_overrides(&mut record, overrides);
        }
        for key in RESERVED_OPTIONS {
            record.remove(key);
        }
        results.insert(comp.clone(), record);
    }
    results
}

/// Load a window parameter file and materialize it
pub fn load_window_param_file(path: &Path) -> Result<WindowParams, ParamError> {
    if !path.exists() {
        return Err(ParamError::BadFilePath(path.to_path_buf()));
    }
    let yaml_str = std::fs::read_to_string(path)?;
    let template = ParameterTemplate::from_yaml(&yaml_str)?;
    Ok(WindowParams {
        components: materialize(&template),
        output: template.output_flags()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn num(v: i64) -> Value {
        Value::Number(v.into())
    }

    #[test]
    fn test_materialize_default_and_override() {
        let template = ParameterTemplate::from_yaml(
            "default: {min_period: 17, max_period: 40}\ncomponents: {Z: null, N: {min_period: 20}}",
        )
        .unwrap();
        let params = materialize(&template);

        assert_eq!(params.len(), 2);
        let z = &params["Z"];
        assert_eq!(z.len(), 2);
        assert_eq!(z["min_period"], num(17));
        assert_eq!(z["max_period"], num(40));
        let n = &params["N"];
        assert_eq!(n.len(), 2);
        assert_eq!(n["min_period"], num(20));
        assert_eq!(n["max_period"], num(40));
    }

    #[test]
    fn test_reserved_options_always_stripped() {
        let template = ParameterTemplate::from_yaml(
            r#"
default:
  min_period: 17
  instrument_merge_flag: true
  write_window_with_phase: true
components:
  Z: null
  R:
    write_window_with_phase: false
  T:
    instrument_merge_flag: false
    s2n_limit: 2.5
"#,
        )
        .unwrap();
        let params = materialize(&template);
        assert_eq!(params.len(), 3);
        for record in params.values() {
            for key in RESERVED_OPTIONS {
                assert!(!record.contains_key(key));
            }
            assert_eq!(record["min_period"], num(17));
        }
        assert_eq!(params["T"]["s2n_limit"], Value::from(2.5));

        let flags = template.output_flags().unwrap();
        assert!(flags.with_phase);
        assert!(flags.instrument_merge);
    }

    #[test]
    fn test_shallow_override() {
        let template = ParameterTemplate::from_yaml(
            "default: {nested: {a: 1, b: 2}}\ncomponents: {Z: {nested: {a: 3}}}",
        )
        .unwrap();
        let params = materialize(&template);
        let nested = params["Z"]["nested"].as_mapping().unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested.get("a"), Some(&num(3)));
    }

    #[test]
    fn test_malformed_template() {
        assert!(matches!(
            ParameterTemplate::from_yaml("components: {Z: null}"),
            Err(ParamError::MalformedTemplate(_))
        ));
        assert!(matches!(
            ParameterTemplate::from_yaml("default: {min_period: 17}"),
            Err(ParamError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn test_bad_flag() {
        let template = ParameterTemplate::from_yaml(
            "default: {write_window_with_phase: maybe}\ncomponents: {Z: null}",
        )
        .unwrap();
        assert!(matches!(
            template.output_flags(),
            Err(ParamError::InvalidFlag(_))
        ));
        let template =
            ParameterTemplate::from_yaml("default: {}\ncomponents: {Z: null}").unwrap();
        assert_eq!(template.output_flags().unwrap(), OutputFlags::default());
    }

    #[test]
    fn test_load_param_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.param.yml");
        std::fs::write(
            &path,
            "default:\n  min_period: 17\n  max_period: 40\n  write_window_with_phase: true\ncomponents:\n  Z:\n  T:\n    max_period: 60\n",
        )
        .unwrap();
        let params = load_window_param_file(&path).unwrap();
        assert!(params.output.with_phase);
        assert!(!params.output.instrument_merge);
        assert_eq!(params.components["T"]["max_period"], num(60));
        assert_eq!(params.components["Z"]["max_period"], num(40));

        assert!(matches!(
            load_window_param_file(&dir.path().join("missing.yml")),
            Err(ParamError::BadFilePath(_))
        ));
    }
}

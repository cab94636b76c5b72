//! JSON filter lists.
//!
//! The document is an array of `{"id": <filter type>, "name": <symbolic
//! name>, "params": {...}}` objects. Names are used as given and the graph
//! always runs in realtime mode.

use crate::error::{Error, Result};
use crate::writer::{check_field, write_graph_sections, write_header, CanonicalWriter, ConvertOptions};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Run mode written for every flat document (realtime, run all sources).
pub const RUN_EVERYTHING: &str = "255";

#[derive(Debug, Deserialize)]
struct FlatFilter {
    #[serde(alias = "ID")]
    id: String,
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "PARAMS", default)]
    params: Map<String, Value>,
}

/// Convert a JSON filter list into canonical text.
pub fn to_canonical(json: &str, options: &ConvertOptions) -> Result<String> {
    let filters: Vec<FlatFilter> = serde_json::from_str(json)?;

    let mut writer = CanonicalWriter::new();
    write_header(&mut writer, options);

    let mut names = Vec::with_capacity(filters.len());
    for filter in &filters {
        check_field("filter type", &filter.id)?;
        check_field("filter name", &filter.name)?;

        writer.blank();
        writer.directive(&["createfilterbyname", &filter.id, &filter.name]);

        for (param, value) in &filter.params {
            let value = stringify(param, value)?;
            check_field("parameter name", param)?;
            check_field("parameter value", &value)?;
            writer.directive(&["setParams", &filter.name, param, &value]);
        }
        names.push(filter.name.clone());
    }

    tracing::debug!(filters = names.len(), "converted JSON filter list");

    write_graph_sections(&mut writer, options, &names, true, RUN_EVERYTHING);
    Ok(writer.finish())
}

fn stringify(param: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        other => Err(Error::document(format!(
            "parameter '{param}' must be a string, number or boolean, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_upper_case_keys_accepted() {
        let json = r#"[{"ID": "Reader", "Name": "src", "PARAMS": {"Path": "a.mvx"}}]"#;
        let text = to_canonical(json, &ConvertOptions::default()).unwrap();
        assert!(text.contains("createfilterbyname~Reader~src~b\n"));
        assert!(text.contains("setParams~src~Path~a.mvx~b\n"));
    }

    #[test]
    fn test_params_optional() {
        let json = r#"[{"id": "Viewer", "name": "view"}]"#;
        let text = to_canonical(json, &ConvertOptions::default()).unwrap();
        assert!(!text.contains("setParams"));
    }

    #[test]
    fn test_scalar_values_are_stringified() {
        let json = r#"[{"id": "Amp", "name": "amp", "params": {"Gain": 2.5, "Mute": false, "Taps": 4}}]"#;
        let text = to_canonical(json, &ConvertOptions::default()).unwrap();
        assert!(text.contains("setParams~amp~Gain~2.5~b\n"));
        assert!(text.contains("setParams~amp~Mute~False~b\n"));
        assert!(text.contains("setParams~amp~Taps~4~b\n"));
    }

    #[test]
    fn test_parameter_order_preserved() {
        let json = r#"[{"id": "A", "name": "a", "params": {"Zeta": "1", "Alpha": "2"}}]"#;
        let text = to_canonical(json, &ConvertOptions::default()).unwrap();
        let zeta = text.find("Zeta").unwrap();
        let alpha = text.find("Alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_nested_value_rejected() {
        let json = r#"[{"id": "A", "name": "a", "params": {"List": [1, 2]}}]"#;
        assert_matches!(
            to_canonical(json, &ConvertOptions::default()),
            Err(Error::Document(_))
        );
    }

    #[test]
    fn test_not_a_list() {
        assert_matches!(
            to_canonical(r#"{"id": "A"}"#, &ConvertOptions::default()),
            Err(Error::Json(_))
        );
    }
}

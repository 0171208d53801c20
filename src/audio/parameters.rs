// Parameters - Serializable parameter trees addressed by dotted paths
//
// Effect and instrument parameters are stored as a nested map so that
// `envelope.attack` style paths can address a leaf directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nested parameter map
pub type Params = BTreeMap<String, ParamValue>;

/// A parameter leaf (number or text) or a nested group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    Group(Params),
}

impl ParamValue {
    /// Coerce to a finite number
    ///
    /// Text is parsed; non-finite results and groups yield None.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            ParamValue::Number(n) => *n,
            ParamValue::Text(s) => s.trim().parse::<f64>().ok()?,
            ParamValue::Group(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as a flag: non-zero numbers and "true"/"on" are true
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ParamValue::Number(n) if n.is_finite() => Some(*n != 0.0),
            ParamValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "1" => Some(true),
                "false" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ParamValue::Group(_))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Number(if value { 1.0 } else { 0.0 })
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Look up a value by dotted path
pub fn get_path<'a>(params: &'a Params, path: &str) -> Option<&'a ParamValue> {
    let mut segments = path.split('.');
    let mut current = params.get(segments.next()?)?;
    for segment in segments {
        match current {
            ParamValue::Group(group) => current = group.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Set a value by dotted path, creating intermediate groups
///
/// Returns false if the path is empty or walks through an existing leaf.
pub fn set_path(params: &mut Params, path: &str, value: ParamValue) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return false;
    }

    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return false,
    };

    let mut current = params;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| ParamValue::Group(Params::new()));
        match entry {
            ParamValue::Group(group) => current = group,
            _ => return false,
        }
    }

    current.insert(leaf.to_string(), value);
    true
}

/// Deep-merge `overlay` into `base`; overlay leaves win
pub fn merge(base: &mut Params, overlay: &Params) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(ParamValue::Group(base_group)), ParamValue::Group(overlay_group)) => {
                merge(base_group, overlay_group);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Flatten into (dotted path, leaf) pairs, in key order
pub fn leaf_paths(params: &Params) -> Vec<(String, ParamValue)> {
    fn walk(prefix: &str, params: &Params, out: &mut Vec<(String, ParamValue)>) {
        for (key, value) in params {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                ParamValue::Group(group) => walk(&path, group, out),
                leaf => out.push((path, leaf.clone())),
            }
        }
    }

    let mut out = Vec::new();
    walk("", params, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_params() -> Params {
        let mut params = Params::new();
        set_path(&mut params, "envelope.attack", 0.01.into());
        set_path(&mut params, "envelope.release", 0.5.into());
        set_path(&mut params, "wet", 0.3.into());
        params
    }

    #[test]
    fn test_get_and_set_nested_path() {
        let mut params = envelope_params();
        assert_eq!(get_path(&params, "envelope.attack"), Some(&ParamValue::Number(0.01)));

        assert!(set_path(&mut params, "envelope.attack", 0.2.into()));
        assert_eq!(get_path(&params, "envelope.attack"), Some(&ParamValue::Number(0.2)));
        assert_eq!(get_path(&params, "envelope.missing"), None);
    }

    #[test]
    fn test_set_path_refuses_to_walk_through_leaf() {
        let mut params = envelope_params();
        assert!(!set_path(&mut params, "wet.inner", 1.0.into()));
        assert!(!set_path(&mut params, "", 1.0.into()));
        assert!(!set_path(&mut params, "a..b", 1.0.into()));
    }

    #[test]
    fn test_merge_keeps_unrelated_keys() {
        let mut base = envelope_params();
        let mut overlay = Params::new();
        set_path(&mut overlay, "envelope.attack", 1.0.into());

        merge(&mut base, &overlay);
        assert_eq!(get_path(&base, "envelope.attack"), Some(&ParamValue::Number(1.0)));
        assert_eq!(get_path(&base, "envelope.release"), Some(&ParamValue::Number(0.5)));
        assert_eq!(get_path(&base, "wet"), Some(&ParamValue::Number(0.3)));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(ParamValue::from("0.5").as_number(), Some(0.5));
        assert_eq!(ParamValue::from("abc").as_number(), None);
        assert_eq!(ParamValue::Number(f64::NAN).as_number(), None);
        assert_eq!(ParamValue::from(true).as_flag(), Some(true));
        assert_eq!(ParamValue::from("off").as_flag(), Some(false));
    }

    #[test]
    fn test_leaf_paths_are_flattened() {
        let paths: Vec<String> = leaf_paths(&envelope_params())
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(paths, vec!["envelope.attack", "envelope.release", "wet"]);
    }

    #[test]
    fn test_json_shape_is_plain() {
        let json = serde_json::to_string(&envelope_params()).unwrap();
        assert_eq!(json, r#"{"envelope":{"attack":0.01,"release":0.5},"wet":0.3}"#);
        let back: Params = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope_params());
    }
}

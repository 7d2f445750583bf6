//! Loading of free-form parameter blobs
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Parse `input` as a JSON object, either given inline or as a path to a file
///
/// Inline JSON wins: the filesystem is only consulted when `input` does not
/// parse. An empty input is the empty object.
pub fn parse_json_or_file(input: &str) -> Result<Map<String, Value>> {
    if input.trim().is_empty() {
        return Ok(Map::new());
    }
    let value = match serde_json::from_str::<Value>(input) {
        Ok(value) => value,
        Err(_) => {
            let path = Path::new(input);
            let contents = std::fs::read_to_string(path).map_err(|source| Error::ReadParams {
                path: path.to_owned(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|source| Error::ParseParams {
                path: path.to_owned(),
                source,
            })?
        }
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::ParamsNotAnObject(kind_of(&other))),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn inline_json() {
        let p = parse_json_or_file(r#"{"permissions":"read-only"}"#).unwrap();
        assert_eq!(Value::Object(p), json!({"permissions": "read-only"}));
    }

    #[test]
    fn empty_is_empty_object() {
        assert!(parse_json_or_file("").unwrap().is_empty());
        assert!(parse_json_or_file("{}").unwrap().is_empty());
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"plan": "small", "replicas": 2}}"#).unwrap();
        let p = parse_json_or_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(Value::Object(p), json!({"plan": "small", "replicas": 2}));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = parse_json_or_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::ReadParams { .. }));
    }

    #[test]
    fn file_with_garbage_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = parse_json_or_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::ParseParams { .. }));
    }

    #[test]
    fn arrays_are_rejected() {
        let err = parse_json_or_file("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::ParamsNotAnObject("an array")));
    }
}

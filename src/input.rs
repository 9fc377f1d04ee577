//! The value source: turn raw input text into the chain's initial value.
//!
//! Structured parsing is pass-through: documents become `serde_json::Value`
//! whatever the source format. Malformed JSON gets a small set of
//! best-effort recovery attempts before the original error surfaces.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

use crate::error::InputError;

/// How to interpret input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
    Yaml,
    Xml,
}

/// Sniff a file's format from its extension. Anything unrecognized is
/// plain text.
pub fn sniff_format(path: &Path) -> Format {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Format::Json,
        Some("yaml") | Some("yml") => Format::Yaml,
        Some("xml") => Format::Xml,
        _ => Format::Text,
    }
}

/// Parse input text into a document per format. Text passes through as a
/// string value.
pub fn parse_document(text: &str, format: Format) -> Result<Value, InputError> {
    match format {
        Format::Text => Ok(Value::String(text.to_string())),
        Format::Json => parse_json_lenient(text),
        Format::Yaml => Ok(serde_yaml::from_str(text)?),
        Format::Xml => Ok(quick_xml::de::from_str(text)?),
    }
}

/// Strict JSON parse, then recovery attempts in order:
/// 1. newline-delimited JSON records → array
/// 2. concatenated JSON values → array
/// 3. input with `}` appended
/// 4. input with `]` appended
///
/// If every attempt fails, the original strict-parse error is returned.
pub fn parse_json_lenient(text: &str) -> Result<Value, InputError> {
    let original = match serde_json::from_str(text) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    if let Some(v) = try_json_lines(text) {
        log::debug!("recovered malformed JSON as newline-delimited records");
        return Ok(v);
    }
    if let Some(v) = try_concatenated(text) {
        log::debug!("recovered malformed JSON as concatenated values");
        return Ok(v);
    }
    for suffix in ["}", "]"] {
        if let Ok(v) = serde_json::from_str::<Value>(&format!("{text}{suffix}")) {
            log::debug!("recovered malformed JSON by appending `{suffix}`");
            return Ok(v);
        }
    }

    Err(original.into())
}

/// One JSON value per non-empty line.
fn try_json_lines(text: &str) -> Option<Value> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }
    let mut records = Vec::with_capacity(lines.len());
    for line in lines {
        records.push(serde_json::from_str(line).ok()?);
    }
    Some(Value::Array(records))
}

/// Concatenated values (`{..}{..}` or `{..} {..}`) via the streaming
/// deserializer; fails if any trailing garbage remains.
fn try_concatenated(text: &str) -> Option<Value> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    let mut values = Vec::new();
    for item in &mut stream {
        values.push(item.ok()?);
    }
    if values.len() < 2 || !text[stream.byte_offset()..].trim().is_empty() {
        return None;
    }
    Some(Value::Array(values))
}

/// Run a command through the shell and capture its stdout as input text.
pub fn exec_input(command: &str) -> Result<String, InputError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|e| InputError::Exec { command: command.to_string(), message: e.to_string() })?;

    if !output.status.success() {
        return Err(InputError::Exec {
            command: command.to_string(),
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| InputError::Exec {
        command: command.to_string(),
        message: format!("stdout was not UTF-8: {e}"),
    })
}

/// Split on single spaces, keeping other whitespace inside tokens.
pub fn split_spaces(text: &str) -> Value {
    Value::Array(text.split(' ').map(|t| Value::String(t.to_string())).collect())
}

/// Trim, then split into an array of lines.
pub fn split_newlines(text: &str) -> Value {
    Value::Array(text.trim().lines().map(|l| Value::String(l.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sniff_by_extension() {
        assert_eq!(sniff_format(Path::new("a.json")), Format::Json);
        assert_eq!(sniff_format(Path::new("a.yaml")), Format::Yaml);
        assert_eq!(sniff_format(Path::new("a.yml")), Format::Yaml);
        assert_eq!(sniff_format(Path::new("a.xml")), Format::Xml);
        assert_eq!(sniff_format(Path::new("a.txt")), Format::Text);
        assert_eq!(sniff_format(Path::new("noext")), Format::Text);
    }

    #[test]
    fn text_passes_through() {
        assert_eq!(parse_document("hi\n", Format::Text).unwrap(), json!("hi\n"));
    }

    #[test]
    fn valid_json_parses() {
        assert_eq!(
            parse_document(r#"{"a": [1, 2]}"#, Format::Json).unwrap(),
            json!({"a": [1, 2]})
        );
    }

    #[test]
    fn yaml_parses() {
        let v = parse_document("a: 1\nb:\n  - x\n  - y\n", Format::Yaml).unwrap();
        assert_eq!(v, json!({"a": 1, "b": ["x", "y"]}));
    }

    #[test]
    fn xml_parses() {
        let v = parse_document("<root><a>x</a><b>y</b></root>", Format::Xml).unwrap();
        assert_eq!(v, json!({"a": "x", "b": "y"}));
    }

    #[test]
    fn recovery_newline_delimited() {
        let v = parse_json_lenient("{\"a\":1}\n{\"a\":2}\n").unwrap();
        assert_eq!(v, json!([{"a": 1}, {"a": 2}]));
    }

    #[test]
    fn recovery_concatenated() {
        let v = parse_json_lenient(r#"{"a":1} {"a":2}"#).unwrap();
        assert_eq!(v, json!([{"a": 1}, {"a": 2}]));
    }

    #[test]
    fn recovery_trailing_brace() {
        let v = parse_json_lenient(r#"{"a": 1"#).unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn recovery_trailing_bracket() {
        let v = parse_json_lenient("[1, 2").unwrap();
        assert_eq!(v, json!([1, 2]));
    }

    #[test]
    fn recovery_failure_surfaces_original_error() {
        let err = parse_json_lenient("not json at all").unwrap_err();
        assert!(matches!(err, InputError::Json(_)));
    }

    #[test]
    fn split_spaces_keeps_newlines_inside_tokens() {
        assert_eq!(split_spaces("I am\ntest text."), json!(["I", "am\ntest", "text."]));
    }

    #[test]
    fn split_newlines_trims_first() {
        assert_eq!(split_newlines("what\nis\nthis\n"), json!(["what", "is", "this"]));
    }

    #[test]
    fn exec_captures_stdout() {
        assert_eq!(exec_input("printf hello").unwrap(), "hello");
    }

    #[test]
    fn exec_failure_is_error() {
        assert!(exec_input("exit 3").is_err());
    }
}

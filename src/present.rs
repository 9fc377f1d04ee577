//! Output formatting: plain text for strings and scalars, pretty-printed
//! (optionally colorized) JSON for structures, and in-place file writes.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use crate::config::ColorMode;
use crate::expr::eval::value_to_string;

// ANSI palette for structured output
const KEY: &str = "\x1b[94m"; // bright blue
const STRING: &str = "\x1b[32m"; // green
const LITERAL: &str = "\x1b[33m"; // yellow: numbers and booleans
const PUNCT: &str = "\x1b[97m"; // bright white
const RESET: &str = "\x1b[0m";

/// Resolve a color mode against whether stdout is a terminal.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Render a final value for output. Strings are verbatim (the caller
/// decides about terminators); scalars use their display form; arrays and
/// objects pretty-print with a trailing newline.
pub fn render(value: &Value, color: bool) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            let mut out = String::new();
            write_pretty(&mut out, value, 0, color);
            out.push('\n');
            out
        }
        other => {
            let mut out = value_to_string(other);
            out.push('\n');
            out
        }
    }
}

fn punct(out: &mut String, text: &str, color: bool) {
    if color {
        out.push_str(PUNCT);
        out.push_str(text);
        out.push_str(RESET);
    } else {
        out.push_str(text);
    }
}

fn colored(out: &mut String, code: &str, text: &str, color: bool) {
    if color {
        out.push_str(code);
        out.push_str(text);
        out.push_str(RESET);
    } else {
        out.push_str(text);
    }
}

/// 2-space-indented JSON writer. String escaping is delegated to
/// serde_json so the plain rendering and the colorized one never disagree.
fn write_pretty(out: &mut String, value: &Value, depth: usize, color: bool) {
    let pad = "  ".repeat(depth + 1);
    let close_pad = "  ".repeat(depth);

    match value {
        Value::Array(items) => {
            if items.is_empty() {
                punct(out, "[]", color);
                return;
            }
            punct(out, "[", color);
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    punct(out, ",", color);
                }
                out.push('\n');
                out.push_str(&pad);
                write_pretty(out, item, depth + 1, color);
            }
            out.push('\n');
            out.push_str(&close_pad);
            punct(out, "]", color);
        }
        Value::Object(map) => {
            if map.is_empty() {
                punct(out, "{}", color);
                return;
            }
            punct(out, "{", color);
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    punct(out, ",", color);
                }
                out.push('\n');
                out.push_str(&pad);
                let quoted = serde_json::to_string(key).unwrap_or_default();
                colored(out, KEY, &quoted, color);
                punct(out, ":", color);
                out.push(' ');
                write_pretty(out, item, depth + 1, color);
            }
            out.push('\n');
            out.push_str(&close_pad);
            punct(out, "}", color);
        }
        Value::String(s) => {
            let quoted = serde_json::to_string(s).unwrap_or_default();
            colored(out, STRING, &quoted, color);
        }
        Value::Number(_) | Value::Bool(_) => {
            colored(out, LITERAL, &value.to_string(), color);
        }
        Value::Null => out.push_str("null"),
    }
}

/// Write transformed content back to the source file. With a backup
/// suffix, the original is copied aside first.
pub fn write_in_place(path: &Path, content: &str, backup: Option<&str>) -> std::io::Result<()> {
    if let Some(suffix) = backup {
        let mut backup_path = path.as_os_str().to_owned();
        backup_path.push(suffix);
        std::fs::copy(path, &backup_path)?;
    }
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_render_verbatim() {
        assert_eq!(render(&json!("hello\n"), false), "hello\n");
        assert_eq!(render(&json!("no newline"), false), "no newline");
    }

    #[test]
    fn numbers_render_with_newline() {
        assert_eq!(render(&json!(10), false), "10\n");
    }

    #[test]
    fn objects_pretty_print() {
        assert_eq!(
            render(&json!({"key": "value"}), false),
            "{\n  \"key\": \"value\"\n}\n"
        );
    }

    #[test]
    fn arrays_pretty_print() {
        assert_eq!(render(&json!([1, 2]), false), "[\n  1,\n  2\n]\n");
    }

    #[test]
    fn empty_containers_stay_compact() {
        assert_eq!(render(&json!([]), false), "[]\n");
        assert_eq!(render(&json!({}), false), "{}\n");
    }

    #[test]
    fn nested_indentation() {
        assert_eq!(
            render(&json!({"a": [1]}), false),
            "{\n  \"a\": [\n    1\n  ]\n}\n"
        );
    }

    #[test]
    fn plain_matches_serde_pretty() {
        let v = json!({"a": [1, "two", null], "b": {"c": true}});
        let expected = serde_json::to_string_pretty(&v).unwrap();
        assert_eq!(render(&v, false), format!("{expected}\n"));
    }

    #[test]
    fn colorized_strips_back_to_plain() {
        let v = json!({"key": "value", "n": 3, "ok": true});
        let colored = render(&v, true);
        let stripped: String = strip_ansi(&colored);
        assert_eq!(stripped, render(&v, false));
    }

    #[test]
    fn string_escapes_survive_colorizing() {
        let v = json!({"k": "a\"b\n"});
        let stripped = strip_ansi(&render(&v, true));
        assert_eq!(stripped, render(&v, false));
    }

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for e in chars.by_ref() {
                    if e == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn in_place_with_backup() {
        let dir = std::env::temp_dir().join("slrp-present-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("file.txt");
        std::fs::write(&path, "before").unwrap();

        write_in_place(&path, "after", Some(".bak")).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "after");
        assert_eq!(
            std::fs::read_to_string(dir.join("file.txt.bak")).unwrap(),
            "before"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! The chain runner: fold an ordered list of segments over a running value.
//!
//! Whole-value mode runs the chain once. Line-wise mode runs the full chain
//! independently per line, preserving each line's terminator byte-for-byte
//! so in-place edits touch nothing but the transformed content.

use serde_json::Value;

use crate::classify::{SegmentKind, classify};
use crate::error::Error;
use crate::expr::eval::{BINDING_NAME, Scope, value_to_string};
use crate::expr::{Env, Expr, ExprError, apply_function, eval, parse};

/// The exclusion sentinel. A per-line result equal to this string drops the
/// line from the output. Expressions reach it as `<namespace>.exclude`.
pub const EXCLUDE: &str = "SLRP_EXCLUDE";

/// Evaluate one segment against the current value.
pub fn evaluate_segment(segment: &str, value: &Value, env: &Env) -> Result<Value, ExprError> {
    let kind = classify(segment);
    log::debug!("segment `{segment}` classified as {kind:?}");

    match kind {
        SegmentKind::Identity => Ok(value.clone()),

        // Templates and `this`-prefixed accesses are ordinary expressions
        // evaluated with the running value bound to `this`.
        SegmentKind::ContextTemplate | SegmentKind::ContextAccess => {
            let expr = parse(segment.trim())?;
            let scope = Scope::root(value);
            eval(&expr, env, &scope)
        }

        // A bare access is the same access chain with the binding name
        // left implicit; prefixing it yields a well-formed expression.
        SegmentKind::BareAccess => {
            let rewritten = format!("{BINDING_NAME}{}", segment.trim());
            let expr = parse(&rewritten)?;
            let scope = Scope::root(value);
            eval(&expr, env, &scope)
        }

        SegmentKind::Function => {
            let expr = parse(segment.trim())?;
            // A namespace member like `slrp.exclude` is a constant, not a
            // callable; evaluate it directly.
            if namespace_rooted(&expr, env) {
                let scope = Scope::root(value);
                return eval(&expr, env, &scope);
            }
            apply_function(&expr, value, env)
        }
    }
}

/// True for access chains rooted at the utility-namespace identifier.
fn namespace_rooted(expr: &Expr, env: &Env) -> bool {
    match expr {
        Expr::Field { target, .. } | Expr::Index { target, .. } => namespace_rooted(target, env),
        Expr::Ident(name) => name == env.namespace(),
        _ => false,
    }
}

/// Left fold of [`evaluate_segment`] over the chain. An empty chain is the
/// identity transform. The first failing segment aborts the rest and is
/// identified by index and literal text.
pub fn run<S: AsRef<str>>(segments: &[S], initial: Value, env: &Env) -> Result<Value, Error> {
    let mut value = initial;
    for (index, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        value = evaluate_segment(segment, &value, env).map_err(|source| Error::Chain {
            index,
            segment: segment.to_string(),
            source,
        })?;
    }
    Ok(value)
}

/// Run the chain once per line. Each line's content (terminator stripped)
/// is that line's initial value; the original terminator is re-attached to
/// the result. Lines whose result equals [`EXCLUDE`] are dropped entirely.
/// Buffered: nothing is emitted if any line fails.
pub fn run_linewise<S: AsRef<str>>(
    text: &str,
    segments: &[S],
    env: &Env,
) -> Result<String, Error> {
    let mut out = String::with_capacity(text.len());

    for (content, terminator) in split_lines(text) {
        let result = run(segments, Value::String(content.to_string()), env)?;
        if matches!(&result, Value::String(s) if s == EXCLUDE) {
            continue;
        }
        out.push_str(&value_to_string(&result));
        out.push_str(terminator);
    }

    Ok(out)
}

/// Split into (content, terminator) pairs, where the terminator is `"\n"`,
/// `"\r\n"`, or `""` for a final unterminated line. Internal terminators
/// are never altered, so concatenating the pairs reproduces the input.
fn split_lines(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split_inclusive('\n').map(|line| {
        if let Some(content) = line.strip_suffix("\r\n") {
            (content, "\r\n")
        } else if let Some(content) = line.strip_suffix('\n') {
            (content, "\n")
        } else {
            (line, "")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run_chain(segments: &[&str], initial: Value) -> Result<Value, Error> {
        run(segments, initial, &Env::new())
    }

    #[test]
    fn empty_chain_is_identity() {
        assert_eq!(run_chain(&[], json!({"a": 1})).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn identity_segment_is_noop() {
        for v in [json!(null), json!(5), json!("s"), json!([1]), json!({"k": "v"})] {
            assert_eq!(run_chain(&["."], v.clone()).unwrap(), v);
        }
    }

    #[test]
    fn chain_is_left_fold() {
        // length of "hello" is 5, doubled is 10
        assert_eq!(
            run_chain(&["x => x.length", "x => x + x"], json!("hello")).unwrap(),
            json!(10)
        );
    }

    #[test]
    fn fold_equals_stepwise_evaluation() {
        let segments = ["x => x + 1", "x => x * 3", "x => x - 2"];
        let chained = run_chain(&segments, json!(4)).unwrap();
        let mut stepped = json!(4);
        let env = Env::new();
        for s in &segments {
            stepped = evaluate_segment(s, &stepped, &env).unwrap();
        }
        assert_eq!(chained, stepped);
        assert_eq!(chained, json!(13));
    }

    #[test]
    fn bare_and_prefixed_access_agree() {
        let value = json!({"field": [10, 20]});
        assert_eq!(
            run_chain(&[".field"], value.clone()).unwrap(),
            run_chain(&["this.field"], value.clone()).unwrap(),
        );
        assert_eq!(
            run_chain(&["[\"field\"][0]"], value.clone()).unwrap(),
            run_chain(&["this[\"field\"][0]"], value).unwrap(),
        );
    }

    #[test]
    fn double_index_into_string() {
        // No prior split: the first index takes a character, the second
        // indexes that one-character string
        assert_eq!(run_chain(&["[0][0]"], json!("hello world")).unwrap(), json!("h"));
    }

    #[test]
    fn split_then_access() {
        assert_eq!(
            run_chain(&[r#"x => x.split(" ")"#, "[0].length"], json!("hello world")).unwrap(),
            json!(5)
        );
    }

    #[test]
    fn template_preserves_string_literal() {
        assert_eq!(
            run_chain(&[r#"{ ...this, added: "this.key" }"#], json!({"key": "value"})).unwrap(),
            json!({"key": "value", "added": "this.key"})
        );
    }

    #[test]
    fn error_names_failing_segment() {
        let err = run_chain(&[".", "x => x.bogus()", "."], json!("v")).unwrap_err();
        let Error::Chain { index, segment, .. } = &err else {
            panic!("expected chain error, got {err}");
        };
        assert_eq!(*index, 1);
        assert_eq!(segment, "x => x.bogus()");
    }

    #[test]
    fn error_aborts_remaining_segments() {
        // The third segment would also fail; the first failure is reported
        let err = run_chain(&["missing_fn", "also_missing"], json!(1)).unwrap_err();
        let Error::Chain { index, .. } = &err else { panic!("expected chain error") };
        assert_eq!(*index, 0);
    }

    #[test]
    fn namespace_member_segment_yields_sentinel() {
        assert_eq!(run_chain(&["slrp.exclude"], json!(null)).unwrap(), json!(EXCLUDE));
    }

    #[test]
    fn namespace_member_segment_honors_alias() {
        let env = Env::with_namespace("util");
        assert_eq!(run(&["util.exclude"], json!(null), &env).unwrap(), json!(EXCLUDE));
        // The default alias is not special under a custom one
        assert!(run(&["slrp.exclude"], json!(null), &env).is_err());
    }

    #[test]
    fn unknown_namespace_member_errors() {
        let err = run_chain(&["slrp.nope"], json!(null)).unwrap_err();
        assert!(matches!(err, Error::Chain { index: 0, .. }));
    }

    // ── Line-wise mode ──

    fn linewise(text: &str, segments: &[&str]) -> String {
        run_linewise(text, segments, &Env::new()).unwrap()
    }

    #[test]
    fn linewise_identity_round_trips_bytes() {
        for text in [
            "first\nsecond\nthird\n",
            "first\nsecond\nthird",
            "one\r\ntwo\r\n",
            "mixed\nendings\r\nlast",
            "",
            "\n",
        ] {
            assert_eq!(linewise(text, &["."]), text, "input: {text:?}");
        }
    }

    #[test]
    fn linewise_applies_chain_per_line() {
        assert_eq!(linewise("ab\ncdef\n", &["x => x.length"]), "2\n4\n");
    }

    #[test]
    fn linewise_exclusion_drops_lines() {
        let out = linewise(
            "first\nsecond\n\nthird\n",
            &["x => x.length ? x : slrp.exclude"],
        );
        assert_eq!(out, "first\nsecond\nthird\n");
    }

    #[test]
    fn linewise_exclusion_drops_terminator_too() {
        let out = linewise("keep\ndrop\n", &["x => x == 'drop' ? slrp.exclude : x"]);
        assert_eq!(out, "keep\n");
    }

    #[test]
    fn linewise_preserves_missing_final_terminator() {
        assert_eq!(linewise("a\nb", &["x => x + x"]), "aa\nbb");
    }

    #[test]
    fn linewise_crlf_preserved() {
        assert_eq!(linewise("a\r\nb\r\n", &["x => x + '!'"]), "a!\r\nb!\r\n");
    }

    #[test]
    fn linewise_error_names_segment() {
        let err = run_linewise("ok\n", &["x => nope"], &Env::new()).unwrap_err();
        assert!(matches!(err, Error::Chain { index: 0, .. }));
    }

    #[test]
    fn linewise_structured_results_render_compact() {
        assert_eq!(
            linewise("a b\n", &[r#"x => x.split(" ")"#]),
            "[\"a\",\"b\"]\n"
        );
    }
}

//! Tree-walking evaluator for segment expressions.
//!
//! Values are `serde_json::Value`; scoping is a parent-linked chain so
//! lambda bodies can see enclosing bindings without cloning. Semantics lean
//! on familiar scripting-language behavior: `null`/`false`/`0`/`""` are
//! falsy, `+` concatenates when either side is a string, `&&`/`||` return
//! operand values rather than booleans, and `.length` works as a property
//! on strings, arrays, and objects.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::chain::EXCLUDE;
use crate::expr::error::ExprError;
use crate::expr::parser::{BinaryOp, Expr, ObjectEntry, UnaryOp, parse};

/// Free functions callable as bare segments (`parse`, `stringify`).
/// Config validation uses this list for namespace collision checks.
pub const BUILTIN_FUNCTIONS: &[&str] = &["parse", "stringify"];

/// The implicit name a segment uses to refer to the running value.
pub const BINDING_NAME: &str = "this";

// ─── Environment ─────────────────────────────────────

/// The evaluation environment: the utility-namespace alias plus the
/// registered named functions. Built once from configuration and passed
/// explicitly into every evaluation; there is no global state.
#[derive(Debug, Clone)]
pub struct Env {
    namespace: String,
    functions: BTreeMap<String, Expr>,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    pub fn new() -> Self {
        Self { namespace: "slrp".into(), functions: BTreeMap::new() }
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), functions: BTreeMap::new() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register a named function. The source must parse to a lambda.
    pub fn register(&mut self, name: impl Into<String>, source: &str) -> Result<(), ExprError> {
        let expr = parse(source)?;
        if !matches!(expr, Expr::Lambda { .. }) {
            return Err(ExprError::NotAFunction(source.to_string()));
        }
        self.functions.insert(name.into(), expr);
        Ok(())
    }

    pub fn contains_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order (for `--list` and completion).
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    fn namespace_member(&self, name: &str) -> Result<Value, ExprError> {
        match name {
            "exclude" => Ok(Value::String(EXCLUDE.into())),
            _ => Err(ExprError::UnknownProperty { property: name.into(), kind: "namespace" }),
        }
    }
}

// ─── Scope ───────────────────────────────────────────

/// One lexical binding, linked to its parent. Lambda application pushes a
/// child scope; lookup walks outward.
pub struct Scope<'a> {
    name: &'a str,
    value: &'a Value,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// Root scope binding the running value to `this`.
    pub fn root(value: &'a Value) -> Self {
        Self { name: BINDING_NAME, value, parent: None }
    }

    fn child(&'a self, name: &'a str, value: &'a Value) -> Scope<'a> {
        Scope { name, value, parent: Some(self) }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        if self.name == name {
            return Some(self.value);
        }
        self.parent.and_then(|p| p.lookup(name))
    }
}

// ─── Evaluation ──────────────────────────────────────

pub fn eval(expr: &Expr, env: &Env, scope: &Scope) -> Result<Value, ExprError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),

        Expr::Ident(name) => {
            if let Some(v) = scope.lookup(name) {
                return Ok(v.clone());
            }
            Err(ExprError::UnknownIdent(name.clone()))
        }

        Expr::Array(elements) => {
            let mut out = Vec::with_capacity(elements.len());
            for e in elements {
                out.push(eval(e, env, scope)?);
            }
            Ok(Value::Array(out))
        }

        Expr::Object(entries) => {
            let mut map = Map::new();
            for entry in entries {
                match entry {
                    ObjectEntry::Spread(e) => {
                        let v = eval(e, env, scope)?;
                        let Value::Object(inner) = v else {
                            return Err(ExprError::Type {
                                expected: "object to spread",
                                got: kind_of(&v),
                            });
                        };
                        for (k, v) in inner {
                            map.insert(k, v);
                        }
                    }
                    ObjectEntry::Pair { key, value } => {
                        map.insert(key.clone(), eval(value, env, scope)?);
                    }
                }
            }
            Ok(Value::Object(map))
        }

        // A lambda only means something when applied; reaching one in value
        // position is a misuse of the segment.
        Expr::Lambda { .. } => Err(ExprError::NotAFunction("bare lambda in value position".into())),

        Expr::Field { target, name } => {
            // Namespace member access (`slrp.exclude`), unless the name is
            // shadowed by a lexical binding.
            if let Expr::Ident(base) = target.as_ref()
                && base == env.namespace()
                && scope.lookup(base).is_none()
            {
                return env.namespace_member(name);
            }
            let value = eval(target, env, scope)?;
            get_property(&value, name)
        }

        Expr::Index { target, index } => {
            let value = eval(target, env, scope)?;
            let idx = eval(index, env, scope)?;
            get_index(&value, &idx)
        }

        Expr::Call { target, args } => eval_call(target, args, env, scope),

        Expr::Unary { op, expr } => {
            let v = eval(expr, env, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&v))),
                UnaryOp::Neg => {
                    let n = as_f64(&v).ok_or(ExprError::Type {
                        expected: "number",
                        got: kind_of(&v),
                    })?;
                    Ok(number(-n))
                }
            }
        }

        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, env, scope),

        Expr::Cond { cond, then, otherwise } => {
            let c = eval(cond, env, scope)?;
            if truthy(&c) { eval(then, env, scope) } else { eval(otherwise, env, scope) }
        }
    }
}

/// Apply a segment in function position: a lambda, or the name of a
/// registered/built-in function, invoked with the running value.
pub fn apply_function(expr: &Expr, value: &Value, env: &Env) -> Result<Value, ExprError> {
    match resolve_callable(expr, env) {
        Some(c) => apply_callable(&c, value, env, None),
        None => {
            // Not callable: describe what the segment actually was.
            let desc = match expr {
                Expr::Ident(name) => name.clone(),
                _ => "segment".into(),
            };
            Err(ExprError::NotAFunction(desc))
        }
    }
}

/// Something applicable to a single value.
enum Callable<'a> {
    Lambda { param: &'a str, body: &'a Expr },
    Builtin(&'a str),
}

fn resolve_callable<'a>(expr: &'a Expr, env: &'a Env) -> Option<Callable<'a>> {
    match expr {
        Expr::Lambda { param, body } => Some(Callable::Lambda { param, body }),
        Expr::Ident(name) => {
            if let Some(Expr::Lambda { param, body }) = env.functions.get(name.as_str()) {
                return Some(Callable::Lambda { param, body });
            }
            if BUILTIN_FUNCTIONS.contains(&name.as_str()) {
                return Some(Callable::Builtin(name));
            }
            None
        }
        _ => None,
    }
}

fn apply_callable(
    callable: &Callable<'_>,
    value: &Value,
    env: &Env,
    outer: Option<&Scope<'_>>,
) -> Result<Value, ExprError> {
    match *callable {
        Callable::Lambda { param, body } => {
            let scope = match outer {
                Some(s) => s.child(param, value),
                None => Scope { name: param, value, parent: None },
            };
            eval(body, env, &scope)
        }
        Callable::Builtin(name) => call_builtin(name, value),
    }
}

fn call_builtin(name: &str, value: &Value) -> Result<Value, ExprError> {
    match name {
        "parse" => {
            let Value::String(s) = value else {
                return Err(ExprError::Type { expected: "string", got: kind_of(value) });
            };
            serde_json::from_str(s).map_err(|e| ExprError::BadJson(e.to_string()))
        }
        "stringify" => {
            // Compact JSON text; serialization of a Value cannot fail.
            Ok(Value::String(serde_json::to_string(value).unwrap_or_default()))
        }
        _ => Err(ExprError::NotAFunction(name.into())),
    }
}

// ─── Calls and methods ───────────────────────────────

fn eval_call(
    target: &Expr,
    args: &[Expr],
    env: &Env,
    scope: &Scope,
) -> Result<Value, ExprError> {
    // Method call: receiver.method(args)
    if let Expr::Field { target: recv, name } = target {
        // Not a method if the receiver is the utility namespace
        let is_namespace = matches!(recv.as_ref(), Expr::Ident(b)
            if b == env.namespace() && scope.lookup(b).is_none());
        if !is_namespace {
            let value = eval(recv, env, scope)?;
            return call_method(&value, name, args, env, scope);
        }
    }

    // Named or inline function call: f(x), (y => y + 1)(x)
    if let Some(callable) = resolve_callable(target, env) {
        if args.len() != 1 {
            let desc = match target {
                Expr::Ident(name) => name.clone(),
                _ => "lambda".into(),
            };
            return Err(ExprError::Arity { method: desc, expected: 1, got: args.len() });
        }
        let arg = eval(&args[0], env, scope)?;
        return apply_callable(&callable, &arg, env, Some(scope));
    }

    let desc = match target {
        Expr::Ident(name) => name.clone(),
        _ => "expression".into(),
    };
    Err(ExprError::NotAFunction(desc))
}

fn expect_args(method: &str, args: &[Expr], n: usize) -> Result<(), ExprError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(ExprError::Arity { method: method.into(), expected: n, got: args.len() })
    }
}

fn call_method(
    recv: &Value,
    method: &str,
    args: &[Expr],
    env: &Env,
    scope: &Scope,
) -> Result<Value, ExprError> {
    // Higher-order methods take their argument unevaluated so it can be
    // applied per element.
    match (recv, method) {
        (Value::Array(items), "map") => {
            expect_args("map", args, 1)?;
            let callable = resolve_callable(&args[0], env)
                .ok_or_else(|| ExprError::NotAFunction("map argument".into()))?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(apply_callable(&callable, item, env, Some(scope))?);
            }
            return Ok(Value::Array(out));
        }
        (Value::Array(items), "filter") => {
            expect_args("filter", args, 1)?;
            let callable = resolve_callable(&args[0], env)
                .ok_or_else(|| ExprError::NotAFunction("filter argument".into()))?;
            let mut out = Vec::new();
            for item in items {
                if truthy(&apply_callable(&callable, item, env, Some(scope))?) {
                    out.push(item.clone());
                }
            }
            return Ok(Value::Array(out));
        }
        _ => {}
    }

    let mut values = Vec::with_capacity(args.len());
    for a in args {
        values.push(eval(a, env, scope)?);
    }

    match recv {
        Value::String(s) => string_method(s, method, &values),
        Value::Array(items) => array_method(items, method, &values),
        Value::Object(map) => object_method(map, method, &values),
        Value::Number(_) => number_method(recv, method, &values),
        _ => Err(ExprError::UnknownMethod { method: method.into(), kind: kind_of(recv) }),
    }
}

fn want_str<'a>(_method: &str, v: &'a Value) -> Result<&'a str, ExprError> {
    v.as_str().ok_or(ExprError::Type { expected: "string", got: kind_of(v) })
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Result<Value, ExprError> {
    match method {
        "split" => {
            expect_vals("split", args, 1)?;
            let sep = want_str("split", &args[0])?;
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(sep).map(|p| Value::String(p.to_string())).collect()
            };
            Ok(Value::Array(parts))
        }
        "lines" => {
            expect_vals("lines", args, 0)?;
            Ok(Value::Array(s.lines().map(|l| Value::String(l.to_string())).collect()))
        }
        "trim" => {
            expect_vals("trim", args, 0)?;
            Ok(Value::String(s.trim().to_string()))
        }
        "upper" => {
            expect_vals("upper", args, 0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        "lower" => {
            expect_vals("lower", args, 0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        // `replace` swaps the first occurrence, `replace_all` every one.
        "replace" => {
            expect_vals("replace", args, 2)?;
            let from = want_str("replace", &args[0])?;
            let to = want_str("replace", &args[1])?;
            Ok(Value::String(s.replacen(from, to, 1)))
        }
        "replace_all" => {
            expect_vals("replace_all", args, 2)?;
            let from = want_str("replace_all", &args[0])?;
            let to = want_str("replace_all", &args[1])?;
            Ok(Value::String(s.replace(from, to)))
        }
        "contains" => {
            expect_vals("contains", args, 1)?;
            Ok(Value::Bool(s.contains(want_str("contains", &args[0])?)))
        }
        "starts_with" => {
            expect_vals("starts_with", args, 1)?;
            Ok(Value::Bool(s.starts_with(want_str("starts_with", &args[0])?)))
        }
        "ends_with" => {
            expect_vals("ends_with", args, 1)?;
            Ok(Value::Bool(s.ends_with(want_str("ends_with", &args[0])?)))
        }
        "repeat" => {
            expect_vals("repeat", args, 1)?;
            let n = as_f64(&args[0]).ok_or(ExprError::Type {
                expected: "number",
                got: kind_of(&args[0]),
            })?;
            Ok(Value::String(s.repeat(n.max(0.0) as usize)))
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(args, chars.len())?;
            Ok(Value::String(chars[start..end].iter().collect()))
        }
        "to_number" => {
            expect_vals("to_number", args, 0)?;
            s.trim().parse::<f64>().map(number).map_err(|_| ExprError::Type {
                expected: "numeric string",
                got: "string",
            })
        }
        "to_string" => {
            expect_vals("to_string", args, 0)?;
            Ok(Value::String(s.to_string()))
        }
        _ => Err(ExprError::UnknownMethod { method: method.into(), kind: "string" }),
    }
}

fn array_method(items: &[Value], method: &str, args: &[Value]) -> Result<Value, ExprError> {
    match method {
        "join" => {
            expect_vals("join", args, 1)?;
            let sep = want_str("join", &args[0])?;
            let parts: Vec<String> = items.iter().map(value_to_string).collect();
            Ok(Value::String(parts.join(sep)))
        }
        "reverse" => {
            expect_vals("reverse", args, 0)?;
            let mut out = items.to_vec();
            out.reverse();
            Ok(Value::Array(out))
        }
        "sort" => {
            expect_vals("sort", args, 0)?;
            let mut out = items.to_vec();
            if out.iter().all(|v| v.is_number()) {
                out.sort_by(|a, b| {
                    let (a, b) = (as_f64(a).unwrap_or(0.0), as_f64(b).unwrap_or(0.0));
                    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
                });
            } else if out.iter().all(|v| v.is_string()) {
                out.sort_by(|a, b| a.as_str().unwrap_or("").cmp(b.as_str().unwrap_or("")));
            } else {
                return Err(ExprError::Type {
                    expected: "array of numbers or strings",
                    got: "mixed array",
                });
            }
            Ok(Value::Array(out))
        }
        "unique" => {
            expect_vals("unique", args, 0)?;
            let mut out: Vec<Value> = Vec::new();
            for item in items {
                if !out.contains(item) {
                    out.push(item.clone());
                }
            }
            Ok(Value::Array(out))
        }
        "sum" => {
            expect_vals("sum", args, 0)?;
            let mut total = 0.0;
            for item in items {
                total += as_f64(item).ok_or(ExprError::Type {
                    expected: "array of numbers",
                    got: kind_of(item),
                })?;
            }
            Ok(number(total))
        }
        "first" => {
            expect_vals("first", args, 0)?;
            items.first().cloned().ok_or(ExprError::IndexOutOfBounds { index: 0, len: 0 })
        }
        "last" => {
            expect_vals("last", args, 0)?;
            items.last().cloned().ok_or(ExprError::IndexOutOfBounds { index: -1, len: 0 })
        }
        "contains" => {
            expect_vals("contains", args, 1)?;
            Ok(Value::Bool(items.iter().any(|v| values_equal(v, &args[0]))))
        }
        "slice" => {
            let (start, end) = slice_bounds(args, items.len())?;
            Ok(Value::Array(items[start..end].to_vec()))
        }
        _ => Err(ExprError::UnknownMethod { method: method.into(), kind: "array" }),
    }
}

fn object_method(
    map: &Map<String, Value>,
    method: &str,
    args: &[Value],
) -> Result<Value, ExprError> {
    match method {
        "keys" => {
            expect_vals("keys", args, 0)?;
            Ok(Value::Array(map.keys().map(|k| Value::String(k.clone())).collect()))
        }
        "values" => {
            expect_vals("values", args, 0)?;
            Ok(Value::Array(map.values().cloned().collect()))
        }
        "entries" => {
            expect_vals("entries", args, 0)?;
            Ok(Value::Array(
                map.iter()
                    .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                    .collect(),
            ))
        }
        "has" => {
            expect_vals("has", args, 1)?;
            Ok(Value::Bool(map.contains_key(want_str("has", &args[0])?)))
        }
        "get" => {
            // get(key) errors on a miss; get(key, default) does not
            if args.is_empty() || args.len() > 2 {
                return Err(ExprError::Arity { method: "get".into(), expected: 1, got: args.len() });
            }
            let key = want_str("get", &args[0])?;
            match map.get(key) {
                Some(v) => Ok(v.clone()),
                None if args.len() == 2 => Ok(args[1].clone()),
                None => Err(ExprError::MissingKey(key.to_string())),
            }
        }
        _ => Err(ExprError::UnknownMethod { method: method.into(), kind: "object" }),
    }
}

fn number_method(recv: &Value, method: &str, args: &[Value]) -> Result<Value, ExprError> {
    let n = as_f64(recv).unwrap_or(0.0);
    match method {
        "to_string" => {
            expect_vals("to_string", args, 0)?;
            Ok(Value::String(value_to_string(recv)))
        }
        "round" => {
            expect_vals("round", args, 0)?;
            Ok(number(n.round()))
        }
        "floor" => {
            expect_vals("floor", args, 0)?;
            Ok(number(n.floor()))
        }
        "ceil" => {
            expect_vals("ceil", args, 0)?;
            Ok(number(n.ceil()))
        }
        "abs" => {
            expect_vals("abs", args, 0)?;
            Ok(number(n.abs()))
        }
        _ => Err(ExprError::UnknownMethod { method: method.into(), kind: "number" }),
    }
}

fn expect_vals(method: &str, args: &[Value], n: usize) -> Result<(), ExprError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(ExprError::Arity { method: method.into(), expected: n, got: args.len() })
    }
}

/// Shared bounds logic for `slice(start)` / `slice(start, end)`; negative
/// offsets count from the end.
fn slice_bounds(args: &[Value], len: usize) -> Result<(usize, usize), ExprError> {
    if args.is_empty() || args.len() > 2 {
        return Err(ExprError::Arity { method: "slice".into(), expected: 2, got: args.len() });
    }
    let clamp = |raw: f64| -> usize {
        let i = raw as i64;
        let i = if i < 0 { i + len as i64 } else { i };
        i.clamp(0, len as i64) as usize
    };
    let start = clamp(as_f64(&args[0]).ok_or(ExprError::Type {
        expected: "number",
        got: kind_of(&args[0]),
    })?);
    let end = match args.get(1) {
        Some(v) => clamp(as_f64(v).ok_or(ExprError::Type {
            expected: "number",
            got: kind_of(v),
        })?),
        None => len,
    };
    Ok((start, end.max(start)))
}

// ─── Properties and indexing ─────────────────────────

fn get_property(value: &Value, name: &str) -> Result<Value, ExprError> {
    if name == "length" {
        let len = match value {
            Value::String(s) => s.chars().count(),
            Value::Array(a) => a.len(),
            Value::Object(m) => m.len(),
            _ => {
                return Err(ExprError::UnknownProperty {
                    property: "length".into(),
                    kind: kind_of(value),
                });
            }
        };
        return Ok(number(len as f64));
    }

    match value {
        Value::Object(map) => {
            map.get(name).cloned().ok_or_else(|| ExprError::MissingKey(name.to_string()))
        }
        _ => Err(ExprError::UnknownProperty { property: name.into(), kind: kind_of(value) }),
    }
}

fn get_index(value: &Value, index: &Value) -> Result<Value, ExprError> {
    match (value, index) {
        (Value::Array(items), idx) if idx.is_number() => {
            let i = resolve_index(as_f64(idx).unwrap_or(0.0) as i64, items.len())?;
            Ok(items[i].clone())
        }
        (Value::String(s), idx) if idx.is_number() => {
            let chars: Vec<char> = s.chars().collect();
            let i = resolve_index(as_f64(idx).unwrap_or(0.0) as i64, chars.len())?;
            Ok(Value::String(chars[i].to_string()))
        }
        (Value::Object(map), Value::String(key)) => {
            map.get(key).cloned().ok_or_else(|| ExprError::MissingKey(key.clone()))
        }
        _ => Err(ExprError::Type {
            expected: "indexable value and matching index",
            got: kind_of(value),
        }),
    }
}

/// Negative indices count from the end.
fn resolve_index(index: i64, len: usize) -> Result<usize, ExprError> {
    let i = if index < 0 { index + len as i64 } else { index };
    if i < 0 || i as usize >= len {
        return Err(ExprError::IndexOutOfBounds { index, len });
    }
    Ok(i as usize)
}

// ─── Operators ───────────────────────────────────────

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    env: &Env,
    scope: &Scope,
) -> Result<Value, ExprError> {
    // Short-circuit forms return operand values, not booleans
    match op {
        BinaryOp::And => {
            let l = eval(lhs, env, scope)?;
            if !truthy(&l) {
                return Ok(l);
            }
            return eval(rhs, env, scope);
        }
        BinaryOp::Or => {
            let l = eval(lhs, env, scope)?;
            if truthy(&l) {
                return Ok(l);
            }
            return eval(rhs, env, scope);
        }
        _ => {}
    }

    let l = eval(lhs, env, scope)?;
    let r = eval(rhs, env, scope)?;

    match op {
        BinaryOp::Add => add_values(&l, &r),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (a, b) = both_numbers(&l, &r)?;
            let n = match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => unreachable!(),
            };
            Ok(number(n))
        }
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&l, &r))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ord = compare_values(&l, &r)?;
            let ok = match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::LtEq => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                BinaryOp::GtEq => ord.is_ge(),
                _ => unreachable!(),
            };
            Ok(Value::Bool(ok))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

/// `+`: numeric addition, string concatenation when either side is a
/// string, array concatenation when both are arrays.
fn add_values(l: &Value, r: &Value) -> Result<Value, ExprError> {
    if let (Some(a), Some(b)) = (as_f64(l), as_f64(r)) {
        return Ok(number(a + b));
    }
    if l.is_string() || r.is_string() {
        return Ok(Value::String(format!("{}{}", value_to_string(l), value_to_string(r))));
    }
    if let (Value::Array(a), Value::Array(b)) = (l, r) {
        let mut out = a.clone();
        out.extend(b.iter().cloned());
        return Ok(Value::Array(out));
    }
    Err(ExprError::Type { expected: "numbers, strings, or arrays", got: kind_of(l) })
}

fn both_numbers(l: &Value, r: &Value) -> Result<(f64, f64), ExprError> {
    match (as_f64(l), as_f64(r)) {
        (Some(a), Some(b)) => Ok((a, b)),
        (None, _) => Err(ExprError::Type { expected: "number", got: kind_of(l) }),
        (_, None) => Err(ExprError::Type { expected: "number", got: kind_of(r) }),
    }
}

fn compare_values(l: &Value, r: &Value) -> Result<std::cmp::Ordering, ExprError> {
    if let (Some(a), Some(b)) = (as_f64(l), as_f64(r)) {
        return a.partial_cmp(&b).ok_or(ExprError::Type {
            expected: "comparable numbers",
            got: "NaN",
        });
    }
    if let (Value::String(a), Value::String(b)) = (l, r) {
        return Ok(a.cmp(b));
    }
    Err(ExprError::Type { expected: "two numbers or two strings", got: kind_of(l) })
}

/// Deep equality with numeric comparison done on the numeric value, so
/// `1 == 1.0`.
pub fn values_equal(l: &Value, r: &Value) -> bool {
    match (as_f64(l), as_f64(r)) {
        (Some(a), Some(b)) => a == b,
        _ => l == r,
    }
}

// ─── Value helpers ───────────────────────────────────

/// `null`, `false`, `0`, and `""` are falsy; everything else is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Build a number value, collapsing to an integer representation when the
/// result is whole (so `5 + 5` prints as `10`, not `10.0`).
pub fn number(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_992.0 {
        Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

pub fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Plain-text rendering of a value: strings bare, structures as compact
/// JSON. Used for final string output and per-line results.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".into(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! The embedded expression language segments are written in.
//!
//! A segment is one short expression: a lambda (`x => x.length`), an access
//! chain (`this.foo[0]`), an object template (`{ ...this, x: 1 }`), or the
//! name of a registered function. [`parser::parse`] turns the text into an
//! [`parser::Expr`]; [`eval::eval`] walks it against a `serde_json::Value`.

pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use error::ExprError;
pub use eval::{BINDING_NAME, BUILTIN_FUNCTIONS, Env, Scope, apply_function, eval};
pub use parser::{Expr, parse};

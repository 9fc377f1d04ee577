//! Segment classification: decide what kind of transformation a segment
//! string denotes before evaluating it.
//!
//! The patterns overlap, so the checks run in a fixed precedence order and
//! the first match wins. The one subtle case is the context template: the
//! binding name must appear as a real token, not as text inside a string
//! literal, so detection lexes the segment instead of scanning raw text.

use crate::expr::lexer::{Token, tokenize};
use crate::expr::eval::BINDING_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// `.` — the running value unchanged.
    Identity,
    /// `{ ...this, x: 1 }` — object literal referencing the binding name.
    ContextTemplate,
    /// `this.field`, `this[0]` — access chain spelled with the binding name.
    ContextAccess,
    /// `.field`, `[0]` — access chain against the running value directly.
    BareAccess,
    /// Anything else: evaluated as a single-argument function.
    Function,
}

/// Classify one segment. Total: every string maps to exactly one kind.
pub fn classify(segment: &str) -> SegmentKind {
    let s = segment.trim();

    if s == "." {
        return SegmentKind::Identity;
    }

    if s.starts_with('{') && references_binding(s) {
        return SegmentKind::ContextTemplate;
    }

    if let Some(rest) = s.strip_prefix(BINDING_NAME)
        && rest.starts_with(['.', '['])
    {
        return SegmentKind::ContextAccess;
    }

    if s.starts_with('[') {
        return SegmentKind::BareAccess;
    }
    if let Some(rest) = s.strip_prefix('.')
        && rest.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
    {
        return SegmentKind::BareAccess;
    }

    SegmentKind::Function
}

/// True when the binding name occurs as an identifier token. Lexing first
/// means `"this.key"` inside a string literal never counts. A segment that
/// fails to lex cannot reference anything.
fn references_binding(segment: &str) -> bool {
    match tokenize(segment) {
        Ok(tokens) => tokens
            .iter()
            .any(|t| matches!(&t.token, Token::Ident(name) if name == BINDING_NAME)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_lone_dot() {
        assert_eq!(classify("."), SegmentKind::Identity);
        assert_eq!(classify(" . "), SegmentKind::Identity);
    }

    #[test]
    fn dot_dot_is_not_identity() {
        assert_ne!(classify(".."), SegmentKind::Identity);
    }

    #[test]
    fn template_with_spread() {
        assert_eq!(classify("{ ...this, added: 1 }"), SegmentKind::ContextTemplate);
    }

    #[test]
    fn template_with_member_reference() {
        assert_eq!(classify("{ added: this.key }"), SegmentKind::ContextTemplate);
    }

    #[test]
    fn template_binding_in_string_literal_only_is_not_a_template() {
        // `this` appears solely inside a string literal, so the object has
        // no free reference to the running value
        assert_eq!(classify(r#"{ added: "this.key" }"#), SegmentKind::Function);
    }

    #[test]
    fn template_with_both_reference_and_literal() {
        assert_eq!(
            classify(r#"{ ...this, added: "this.key" }"#),
            SegmentKind::ContextTemplate
        );
    }

    #[test]
    fn context_access_dot() {
        assert_eq!(classify("this.foo"), SegmentKind::ContextAccess);
    }

    #[test]
    fn context_access_bracket() {
        assert_eq!(classify("this[0].length"), SegmentKind::ContextAccess);
    }

    #[test]
    fn plain_this_prefix_ident_is_function() {
        // `thisThing` is an ordinary identifier
        assert_eq!(classify("thisThing"), SegmentKind::Function);
    }

    #[test]
    fn bare_property() {
        assert_eq!(classify(".length"), SegmentKind::BareAccess);
        assert_eq!(classify(".default.hello"), SegmentKind::BareAccess);
    }

    #[test]
    fn bare_index() {
        assert_eq!(classify("[0][0]"), SegmentKind::BareAccess);
        assert_eq!(classify(r#"["hello-there"]"#), SegmentKind::BareAccess);
    }

    #[test]
    fn lambda_is_function() {
        assert_eq!(classify("x => x.length"), SegmentKind::Function);
    }

    #[test]
    fn registered_name_is_function() {
        assert_eq!(classify("size"), SegmentKind::Function);
    }

    #[test]
    fn precedence_template_before_access() {
        // Starts with `{`, references the binding: template wins even
        // though it also contains `this.`
        assert_eq!(classify("{ a: this.b }"), SegmentKind::ContextTemplate);
    }
}

//! Macro-to-constant promotion
//!
//! This module scans the compilation's preprocessor macros once, after
//! structural mapping and the binding-stage rules have run, and promotes
//! matching macros into typed constant declarations inside a synthetic
//! container class.
//!
//! A macro is promoted when some rule's regex spans its entire name and
//! its value is not blank. Value expressions that are not pure integer
//! literals are scanned for references to other macros, which are rewritten
//! to their promoted names so cross-macro arithmetic keeps resolving.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::binding::{BindingNode, BindingTree};
use crate::diagnostics::{BindError, BindResult};
use crate::header::HeaderMacro;
use crate::rules::full_match;
use crate::types::CsType;

lazy_static! {
    /// Identifier tokens inside macro value expressions. Two characters
    /// minimum, letter first; boundary characters are checked separately.
    static ref IDENT_REGEX: Regex = Regex::new(r"[A-Za-z]\w+").unwrap();
}

/// Name or value transform applied while promoting a macro.
pub type MacroTransform = Box<dyn Fn(&str) -> String>;

/// A promotion rule: which macros it claims and how to shape the
/// resulting constant.
pub struct MacroRule {
    pattern: Regex,
    only_unclaimed: bool,
    const_type: CsType,
    file_name: String,
    container: String,
    name_transform: Option<MacroTransform>,
    value_transform: Option<MacroTransform>,
}

impl MacroRule {
    /// Create a rule promoting macros whose name fully matches `pattern`
    /// into constants of `const_type`, hosted by `container` in
    /// `file_name`.
    pub fn new(
        pattern: &str,
        const_type: CsType,
        file_name: impl Into<String>,
        container: impl Into<String>,
    ) -> BindResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| BindError::invalid_pattern(pattern, e.to_string()))?;
        Ok(Self {
            pattern,
            only_unclaimed: false,
            const_type,
            file_name: file_name.into(),
            container: container.into(),
            name_transform: None,
            value_transform: None,
        })
    }

    /// Skip this rule for macros already claimed by an earlier rule in the
    /// same scan.
    pub fn only_unclaimed(mut self) -> Self {
        self.only_unclaimed = true;
        self
    }

    /// Set the constant-name transform (default: identity).
    pub fn name_transform(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.name_transform = Some(Box::new(f));
        self
    }

    /// Set the value transform (default: identity).
    pub fn value_transform(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.value_transform = Some(Box::new(f));
        self
    }

    fn transform_name(&self, name: &str) -> String {
        match &self.name_transform {
            Some(f) => f(name),
            None => name.to_string(),
        }
    }

    fn transform_value(&self, value: &str) -> String {
        match &self.value_transform {
            Some(f) => f(value),
            None => value.to_string(),
        }
    }
}

/// Promote matching macros into constants, appending them to their rules'
/// synthetic containers in macro-scan order.
///
/// Runs exactly once per generation, after all structural mapping and
/// binding-stage rules.
pub fn promote(
    tree: &mut BindingTree,
    namespace: &str,
    macros: &[HeaderMacro],
    rules: &[MacroRule],
) {
    let mut promoted = 0usize;

    for mac in macros {
        if mac.is_blank() {
            continue;
        }

        let mut processed = false;
        for rule in rules {
            if !full_match(&rule.pattern, &mac.name) {
                continue;
            }
            if processed && rule.only_unclaimed {
                continue;
            }
            promote_one(tree, namespace, macros, rule, mac);
            processed = true;
            promoted += 1;
        }
    }

    debug!(constants = promoted, "macro promotion complete");
}

fn promote_one(
    tree: &mut BindingTree,
    namespace: &str,
    macros: &[HeaderMacro],
    rule: &MacroRule,
    mac: &HeaderMacro,
) {
    let name = rule.transform_name(&mac.name);
    let mut value = rule.transform_value(&mac.value);

    // Pure integer literals cannot reference other macros.
    if value.trim().parse::<i64>().is_err() {
        value = rename_macro_refs(&value, macros, |n| rule.transform_name(n));
    }

    let file = tree.ensure_file(&rule.file_name);
    let ns = tree.ensure_namespace(file, namespace);
    let container = tree.ensure_container(ns, &rule.container);
    tree.add_child(
        container,
        BindingNode::constant(name, rule.const_type.clone(), value),
    );
}

/// Rewrite references to known macros inside a value expression.
///
/// Tokens are runs of alphanumeric/underscore characters starting with a
/// letter, bounded by the string edges, whitespace, or one of
/// `( ) | & - +`. A token equal to a known macro name is replaced with its
/// renamed form; everything else is copied through untouched. The scan is
/// left-to-right into a fresh buffer, so replacements of differing length
/// never disturb later match positions.
pub fn rename_macro_refs(
    expression: &str,
    macros: &[HeaderMacro],
    rename: impl Fn(&str) -> String,
) -> String {
    let mut result = String::with_capacity(expression.len());
    let mut last = 0;

    for m in IDENT_REGEX.find_iter(expression) {
        result.push_str(&expression[last..m.start()]);

        let bounded_before = expression[..m.start()]
            .chars()
            .next_back()
            .map_or(true, is_boundary);
        let bounded_after = expression[m.end()..].chars().next().map_or(true, is_boundary);
        let known = macros.iter().any(|mac| mac.name == m.as_str());

        if bounded_before && bounded_after && known {
            result.push_str(&rename(m.as_str()));
        } else {
            result.push_str(m.as_str());
        }
        last = m.end();
    }

    result.push_str(&expression[last..]);
    result
}

fn is_boundary(c: char) -> bool {
    matches!(c, '(' | ')' | '|' | '&' | '-' | '+') || c.is_whitespace()
}

//! Rule matching and dispatch
//!
//! This module provides the ordered, predicate-matched rewrite pipeline
//! applied to declaration trees. A rule pairs a predicate (a kind set plus
//! an optional exact-name or full-match regex filter) with a mutation
//! callback. Rules run at two stages: against the source tree before
//! structural mapping, and against the generated tree after it.
//!
//! Within a stage, rule order is significant: every matching rule runs in
//! registration order and later rules observe the mutations of earlier
//! ones. When two rules would rename the same node differently, the last
//! applicable rule wins.

use regex::Regex;

use crate::binding::{BindingDef, BindingKind, BindingTree};
use crate::diagnostics::{BindError, BindResult};
use crate::doc::DirectionHint;
use crate::header::{HeaderKind, HeaderTree, NodeId};
use crate::types::RefKind;

/// A tree the rule engine can traverse and match against.
///
/// Implemented by both the source and the generated tree so the two
/// transform stages share one dispatch path.
pub trait RuleTree {
    /// The tree's closed set of declaration kinds.
    type Kind: Copy + PartialEq + std::fmt::Debug;

    /// Top-level nodes, in insertion order.
    fn root_ids(&self) -> Vec<NodeId>;
    /// Children of a node, in insertion order.
    fn child_ids(&self, id: NodeId) -> Vec<NodeId>;
    /// Whether the node is still part of the tree.
    fn is_live(&self, id: NodeId) -> bool;
    /// The node's kind.
    fn kind_of(&self, id: NodeId) -> Self::Kind;
    /// The node's current display name.
    fn name_of(&self, id: NodeId) -> String;
    /// The node's current qualified display name (`Owner::name`).
    fn qualified_name_of(&self, id: NodeId) -> String;
}

impl RuleTree for HeaderTree {
    type Kind = HeaderKind;

    fn root_ids(&self) -> Vec<NodeId> {
        self.roots().to_vec()
    }

    fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).to_vec()
    }

    fn is_live(&self, id: NodeId) -> bool {
        HeaderTree::is_live(self, id)
    }

    fn kind_of(&self, id: NodeId) -> HeaderKind {
        self.node(id).kind()
    }

    fn name_of(&self, id: NodeId) -> String {
        self.node(id).name.clone()
    }

    fn qualified_name_of(&self, id: NodeId) -> String {
        self.qualified_name(id)
    }
}

impl RuleTree for BindingTree {
    type Kind = BindingKind;

    fn root_ids(&self) -> Vec<NodeId> {
        self.roots().to_vec()
    }

    fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).to_vec()
    }

    fn is_live(&self, id: NodeId) -> bool {
        BindingTree::is_live(self, id)
    }

    fn kind_of(&self, id: NodeId) -> BindingKind {
        self.node(id).kind()
    }

    fn name_of(&self, id: NodeId) -> String {
        self.node(id).name.clone()
    }

    fn qualified_name_of(&self, id: NodeId) -> String {
        self.qualified_name(id)
    }
}

/// Name predicate of a rule.
#[derive(Debug, Clone)]
pub enum NameFilter {
    /// Match any name.
    Any,
    /// Match the exact display name or exact qualified name.
    Exact(String),
    /// Match when the regex spans the entire display name.
    Pattern(Regex),
}

impl NameFilter {
    fn matches(&self, name: &str, qualified: &str) -> bool {
        match self {
            NameFilter::Any => true,
            NameFilter::Exact(expected) => name == expected || qualified == expected,
            NameFilter::Pattern(regex) => full_match(regex, name),
        }
    }
}

/// Whether `regex` matches the whole of `text`; partial matches are
/// rejected.
pub(crate) fn full_match(regex: &Regex, text: &str) -> bool {
    regex
        .find(text)
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

/// Mutation callback invoked with the tree and the matched node.
pub type RuleAction<T> = Box<dyn FnMut(&mut T, NodeId)>;

/// A predicate + mutation pair applied to tree nodes during a transform
/// pass.
///
/// Callbacks are written defensively: a rule that fires on a node it does
/// not expect (wrong payload shape, missing parent) early-returns and the
/// pass continues.
pub struct Rule<T: RuleTree> {
    kinds: Vec<T::Kind>,
    filter: NameFilter,
    action: RuleAction<T>,
}

impl<T: RuleTree> Rule<T> {
    /// Rule matching every node of every kind.
    pub fn for_all(action: impl FnMut(&mut T, NodeId) + 'static) -> Self {
        Self {
            kinds: Vec::new(),
            filter: NameFilter::Any,
            action: Box::new(action),
        }
    }

    /// Rule matching every node of one kind.
    pub fn for_kind(kind: T::Kind, action: impl FnMut(&mut T, NodeId) + 'static) -> Self {
        Self {
            kinds: vec![kind],
            filter: NameFilter::Any,
            action: Box::new(action),
        }
    }

    /// Rule matching every node whose kind is in the given set.
    pub fn for_kinds(
        kinds: impl Into<Vec<T::Kind>>,
        action: impl FnMut(&mut T, NodeId) + 'static,
    ) -> Self {
        Self {
            kinds: kinds.into(),
            filter: NameFilter::Any,
            action: Box::new(action),
        }
    }

    /// Restrict the rule to an exact display or qualified name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.filter = NameFilter::Exact(name.into());
        self
    }

    /// Restrict the rule to names fully matching a regex.
    pub fn matching(mut self, pattern: &str) -> BindResult<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| BindError::invalid_pattern(pattern, e.to_string()))?;
        self.filter = NameFilter::Pattern(regex);
        Ok(self)
    }

    fn matches(&self, tree: &T, id: NodeId) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&tree.kind_of(id)) {
            return false;
        }
        let name = tree.name_of(id);
        let qualified = tree.qualified_name_of(id);
        self.filter.matches(&name, &qualified)
    }
}

/// Apply an ordered rule list to every node of a tree.
///
/// Traversal is pre-order (parent before children, siblings in insertion
/// order). Every rule whose predicate matches a node runs, in list order;
/// a node discarded by a rule is neither offered to subsequent rules nor
/// descended into.
pub fn apply_rules<T: RuleTree>(tree: &mut T, rules: &mut [Rule<T>]) {
    for root in tree.root_ids() {
        visit(tree, rules, root);
    }
}

fn visit<T: RuleTree>(tree: &mut T, rules: &mut [Rule<T>], id: NodeId) {
    if !tree.is_live(id) {
        return;
    }

    for rule in rules.iter_mut() {
        if !tree.is_live(id) {
            return;
        }
        if rule.matches(tree, id) {
            (rule.action)(tree, id);
        }
    }

    if !tree.is_live(id) {
        return;
    }
    // Children are re-read after the rules ran so discards take effect.
    for child in tree.child_ids(id) {
        visit(tree, rules, child);
    }
}

/// Built-in binding-stage rule: reclassify by-reference parameter
/// directions from the owning method's parameter doc comments.
///
/// A `[out]` marker makes the parameter pure-output, `[in]` makes it a
/// read-only reference; anything else leaves the conservative
/// input-output default in place.
pub fn infer_ref_directions() -> Rule<BindingTree> {
    Rule::for_kind(BindingKind::Parameter, |tree: &mut BindingTree, id| {
        let node = tree.node(id);
        let BindingDef::Parameter { ref_kind, .. } = &node.def else {
            return;
        };
        if !ref_kind.is_by_ref() {
            return;
        }
        let name = node.name.clone();

        let Some(method_id) = tree.parent(id) else {
            return;
        };
        let method = tree.node(method_id);
        if method.kind() != BindingKind::Method {
            return;
        }
        let Some(param_doc) = method.doc.param(&name) else {
            return;
        };

        match param_doc.direction() {
            Some(DirectionHint::Out) => tree.set_ref_kind(id, RefKind::Out),
            Some(DirectionHint::In) => tree.set_ref_kind(id, RefKind::In),
            None => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingNode;
    use crate::doc::{HeaderDoc, ParamDoc};
    use crate::header::{CType, HeaderNode};
    use crate::types::CsType;
    use pretty_assertions::assert_eq;

    fn tree_with_function() -> (HeaderTree, NodeId) {
        let mut tree = HeaderTree::new();
        let f = tree.add_root(HeaderNode::function("iplContextCreate", CType::Void));
        (tree, f)
    }

    #[test]
    fn test_kind_filter() {
        let (mut tree, f) = tree_with_function();
        tree.add_root(HeaderNode::structure("IPLVector3"));

        let mut rules = vec![Rule::<HeaderTree>::for_kind(
            HeaderKind::Function,
            |tree, id| {
                let renamed = format!("fn_{}", tree.node(id).name);
                tree.rename(id, renamed);
            },
        )];
        apply_rules(&mut tree, &mut rules);

        assert_eq!(tree.node(f).name, "fn_iplContextCreate");
        assert_eq!(
            tree.node(tree.find_root("IPLVector3").unwrap()).name,
            "IPLVector3"
        );
    }

    #[test]
    fn test_last_applicable_rule_wins() {
        let (mut tree, f) = tree_with_function();

        let mut rules = vec![
            Rule::<HeaderTree>::for_kind(HeaderKind::Function, |tree, id| {
                tree.rename(id, "First");
            }),
            Rule::<HeaderTree>::for_kind(HeaderKind::Function, |tree, id| {
                // Observes the mutation of the earlier rule.
                assert_eq!(tree.node(id).name, "First");
                tree.rename(id, "Second");
            }),
        ];
        apply_rules(&mut tree, &mut rules);

        assert_eq!(tree.node(f).name, "Second");
    }

    #[test]
    fn test_exact_name_matches_qualified() {
        let mut tree = HeaderTree::new();
        let s = tree.add_root(HeaderNode::structure("IPLMatrix4x4"));
        let field = tree.add_child(
            s,
            HeaderNode::field("elements", CType::array(CType::Float, vec![4, 4])),
        );

        let mut rules = vec![Rule::<HeaderTree>::for_kind(HeaderKind::Field, |tree, id| {
            tree.rename(id, "Elements");
        })
        .named("IPLMatrix4x4::elements")];
        apply_rules(&mut tree, &mut rules);

        assert_eq!(tree.node(field).name, "Elements");
    }

    #[test]
    fn test_regex_requires_full_match() {
        let (mut tree, f) = tree_with_function();
        tree.add_root(HeaderNode::function("iplContextCreateExtra", CType::Void));

        let mut rules = vec![Rule::<HeaderTree>::for_kind(HeaderKind::Function, |tree, id| {
            tree.rename(id, "Matched");
        })
        .matching("iplContext.*te")
        .unwrap()];
        apply_rules(&mut tree, &mut rules);

        // Full match on the first, only partial on the second.
        assert_eq!(tree.node(f).name, "Matched");
        assert!(tree.find_root("iplContextCreateExtra").is_some());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let rule = Rule::<HeaderTree>::for_all(|_, _| {}).matching("(unclosed");
        assert!(matches!(rule, Err(BindError::InvalidPattern { .. })));
    }

    #[test]
    fn test_discard_stops_subsequent_rules() {
        let (mut tree, f) = tree_with_function();

        let mut rules = vec![
            Rule::<HeaderTree>::for_kind(HeaderKind::Function, |tree, id| {
                tree.discard(id);
            }),
            Rule::<HeaderTree>::for_kind(HeaderKind::Function, |tree, id| {
                tree.rename(id, "ShouldNotHappen");
            }),
        ];
        apply_rules(&mut tree, &mut rules);

        assert!(!HeaderTree::is_live(&tree, f));
        assert_eq!(tree.node(f).name, "iplContextCreate");
    }

    #[test]
    fn test_preorder_parent_before_children() {
        let mut tree = HeaderTree::new();
        let s = tree.add_root(HeaderNode::structure("Outer"));
        tree.add_child(s, HeaderNode::field("a", CType::Float));
        tree.add_child(s, HeaderNode::field("b", CType::Float));

        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen = order.clone();
        let mut rules = vec![Rule::<HeaderTree>::for_all(move |tree, id| {
            seen.borrow_mut().push(tree.node(id).name.clone());
        })];
        apply_rules(&mut tree, &mut rules);

        assert_eq!(*order.borrow(), vec!["Outer", "a", "b"]);
    }

    fn binding_with_param(doc: HeaderDoc) -> (BindingTree, NodeId) {
        let mut tree = BindingTree::new();
        let file = tree.ensure_file("A.cs");
        let ns = tree.ensure_namespace(file, "Audio");
        let class = tree.ensure_container(ns, "Api");
        let method = tree.add_child(
            class,
            BindingNode::method("ContextCreate", CsType::named("Error")).with_doc(doc),
        );
        let param = tree.add_child(
            method,
            BindingNode::parameter("context", CsType::named("Context"), RefKind::InOut),
        );
        (tree, param)
    }

    #[test]
    fn test_infer_out_direction() {
        let doc = HeaderDoc {
            text: None,
            params: vec![ParamDoc::new("context", "[out] writes the result")],
        };
        let (mut tree, param) = binding_with_param(doc);
        apply_rules(&mut tree, &mut [infer_ref_directions()]);

        let BindingDef::Parameter { ref_kind, .. } = tree.node(param).def else {
            panic!("expected parameter");
        };
        assert_eq!(ref_kind, RefKind::Out);
    }

    #[test]
    fn test_infer_in_direction() {
        let doc = HeaderDoc {
            text: None,
            params: vec![ParamDoc::new("context", "[in] read only")],
        };
        let (mut tree, param) = binding_with_param(doc);
        apply_rules(&mut tree, &mut [infer_ref_directions()]);

        let BindingDef::Parameter { ref_kind, .. } = tree.node(param).def else {
            panic!("expected parameter");
        };
        assert_eq!(ref_kind, RefKind::In);
    }

    #[test]
    fn test_undocumented_param_stays_inout() {
        let (mut tree, param) = binding_with_param(HeaderDoc::default());
        apply_rules(&mut tree, &mut [infer_ref_directions()]);

        let BindingDef::Parameter { ref_kind, .. } = tree.node(param).def else {
            panic!("expected parameter");
        };
        assert_eq!(ref_kind, RefKind::InOut);
    }
}

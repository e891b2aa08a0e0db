//! Generated declaration tree
//!
//! This module provides the target-side tree the structural mapper builds
//! from a source header: files, namespaces, static container classes,
//! extern method stubs, value structs, enums, and promoted constants.
//!
//! Like the source tree it is arena-backed and mutated in place by the
//! binding-stage rules; the emitter serializes it once rules and macro
//! promotion have run.

use serde::{Deserialize, Serialize};

use crate::doc::HeaderDoc;
use crate::header::{NodeId, Visibility};
use crate::types::{CsType, RefKind};

/// Kind of generated declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingKind {
    /// Generated source file
    File,
    /// Namespace block
    Namespace,
    /// Static container class
    Class,
    /// Extern method stub
    Method,
    /// Value struct
    Struct,
    /// Struct field
    Field,
    /// Method parameter
    Parameter,
    /// Enumeration
    Enum,
    /// Enumeration member
    EnumMember,
    /// Promoted constant
    Constant,
}

impl BindingKind {
    /// Get display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            BindingKind::File => "file",
            BindingKind::Namespace => "namespace",
            BindingKind::Class => "class",
            BindingKind::Method => "method",
            BindingKind::Struct => "struct",
            BindingKind::Field => "field",
            BindingKind::Parameter => "parameter",
            BindingKind::Enum => "enum",
            BindingKind::EnumMember => "enum member",
            BindingKind::Constant => "constant",
        }
    }
}

/// Value of a generated enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EnumValue {
    /// Integer value carried over from the source.
    Int {
        /// The value.
        value: i64,
    },
    /// Expression text, e.g. a reference to a sibling member.
    Expr {
        /// Raw C# expression.
        repr: String,
    },
}

impl EnumValue {
    /// Integer shorthand
    pub fn int(value: i64) -> Self {
        EnumValue::Int { value }
    }

    /// Expression shorthand
    pub fn expr(repr: impl Into<String>) -> Self {
        EnumValue::Expr { repr: repr.into() }
    }

    /// Render the C# initializer text.
    pub fn to_csharp(&self) -> String {
        match self {
            EnumValue::Int { value } => value.to_string(),
            EnumValue::Expr { repr } => repr.clone(),
        }
    }
}

/// Kind-specific payload of a generated declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BindingDef {
    /// Generated source file
    File {
        /// Output file name, relative to the output directory.
        path: String,
    },
    /// Namespace block
    Namespace,
    /// Static container class
    Class,
    /// Extern method stub
    Method {
        /// Mapped return type.
        return_type: CsType,
        /// Exported symbol to bind when the display name diverges from
        /// the native entry point.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        entry_point: Option<String>,
    },
    /// Value struct
    Struct,
    /// Struct field
    Field {
        /// Mapped field type.
        ty: CsType,
    },
    /// Method parameter
    Parameter {
        /// Mapped parameter type.
        ty: CsType,
        /// Passing direction.
        #[serde(default)]
        ref_kind: RefKind,
    },
    /// Enumeration
    Enum,
    /// Enumeration member
    EnumMember {
        /// Member value.
        value: EnumValue,
    },
    /// Promoted constant
    Constant {
        /// Constant type.
        ty: CsType,
        /// Initializer expression text.
        value: String,
    },
}

impl BindingDef {
    /// The kind tag of this payload.
    pub fn kind(&self) -> BindingKind {
        match self {
            BindingDef::File { .. } => BindingKind::File,
            BindingDef::Namespace => BindingKind::Namespace,
            BindingDef::Class => BindingKind::Class,
            BindingDef::Method { .. } => BindingKind::Method,
            BindingDef::Struct => BindingKind::Struct,
            BindingDef::Field { .. } => BindingKind::Field,
            BindingDef::Parameter { .. } => BindingKind::Parameter,
            BindingDef::Enum => BindingKind::Enum,
            BindingDef::EnumMember { .. } => BindingKind::EnumMember,
            BindingDef::Constant { .. } => BindingKind::Constant,
        }
    }
}

/// A declaration in the generated tree.
#[derive(Debug, Clone)]
pub struct BindingNode {
    /// Current display name. Rules may rewrite this freely.
    pub name: String,
    /// Kind-specific payload.
    pub def: BindingDef,
    /// Documentation carried over from the source declaration.
    pub doc: HeaderDoc,
    /// Visibility flag.
    pub visibility: Visibility,
    /// Owning node, if any.
    pub parent: Option<NodeId>,
    /// Owned children, in insertion order.
    pub children: Vec<NodeId>,
    discarded: bool,
}

impl BindingNode {
    /// Create a node with the given name and payload.
    pub fn new(name: impl Into<String>, def: BindingDef) -> Self {
        Self {
            name: name.into(),
            def,
            doc: HeaderDoc::default(),
            visibility: Visibility::Public,
            parent: None,
            children: Vec::new(),
            discarded: false,
        }
    }

    /// Create a file node.
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(path.clone(), BindingDef::File { path })
    }

    /// Create a namespace node.
    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(name, BindingDef::Namespace)
    }

    /// Create a container class node.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, BindingDef::Class)
    }

    /// Create an extern method node.
    pub fn method(name: impl Into<String>, return_type: CsType) -> Self {
        Self::new(
            name,
            BindingDef::Method {
                return_type,
                entry_point: None,
            },
        )
    }

    /// Create a struct node.
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, BindingDef::Struct)
    }

    /// Create a field node.
    pub fn field(name: impl Into<String>, ty: CsType) -> Self {
        Self::new(name, BindingDef::Field { ty })
    }

    /// Create a parameter node.
    pub fn parameter(name: impl Into<String>, ty: CsType, ref_kind: RefKind) -> Self {
        Self::new(name, BindingDef::Parameter { ty, ref_kind })
    }

    /// Create an enum node.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, BindingDef::Enum)
    }

    /// Create an enum member node.
    pub fn enum_member(name: impl Into<String>, value: EnumValue) -> Self {
        Self::new(name, BindingDef::EnumMember { value })
    }

    /// Create a constant node.
    pub fn constant(name: impl Into<String>, ty: CsType, value: impl Into<String>) -> Self {
        Self::new(
            name,
            BindingDef::Constant {
                ty,
                value: value.into(),
            },
        )
    }

    /// Attach documentation, builder-style.
    pub fn with_doc(mut self, doc: HeaderDoc) -> Self {
        self.doc = doc;
        self
    }

    /// The kind of this node.
    pub fn kind(&self) -> BindingKind {
        self.def.kind()
    }
}

/// Arena-backed generated declaration tree.
#[derive(Debug, Clone, Default)]
pub struct BindingTree {
    nodes: Vec<BindingNode>,
    roots: Vec<NodeId>,
}

impl BindingTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: BindingNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Add a top-level node (a file).
    pub fn add_root(&mut self, node: BindingNode) -> NodeId {
        let id = self.insert(node);
        self.roots.push(id);
        id
    }

    /// Add a node owned by `parent`, appended to its children.
    pub fn add_child(&mut self, parent: NodeId, node: BindingNode) -> NodeId {
        let id = self.insert(node);
        self.nodes[id.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Add a node owned by `parent` at a specific child position.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: BindingNode) -> NodeId {
        let id = self.insert(node);
        self.nodes[id.index()].parent = Some(parent);
        let children = &mut self.nodes[parent.index()].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Top-level nodes, in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &BindingNode {
        &self.nodes[id.index()]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut BindingNode {
        &mut self.nodes[id.index()]
    }

    /// Children of a node, in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Parent of a node, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Whether the node is still part of the tree.
    pub fn is_live(&self, id: NodeId) -> bool {
        !self.nodes[id.index()].discarded
    }

    /// Change a node's display name.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) {
        self.nodes[id.index()].name = name.into();
    }

    /// Remove a node (and its subtree) from the tree.
    pub fn discard(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        } else {
            self.roots.retain(|r| *r != id);
        }
        self.discard_subtree(id);
    }

    fn discard_subtree(&mut self, id: NodeId) {
        self.nodes[id.index()].discarded = true;
        let children = self.nodes[id.index()].children.clone();
        for child in children {
            self.discard_subtree(child);
        }
    }

    /// Fully qualified display name: `Owner::name` for owned declarations.
    pub fn qualified_name(&self, id: NodeId) -> String {
        let node = &self.nodes[id.index()];
        match node.parent {
            Some(parent) => format!("{}::{}", self.nodes[parent.index()].name, node.name),
            None => node.name.clone(),
        }
    }

    /// Find a live child of `parent` by kind and current display name.
    pub fn find_child(&self, parent: NodeId, kind: BindingKind, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|id| self.node(*id).kind() == kind && self.node(*id).name == name)
    }

    /// Find a root file node by output path.
    pub fn find_file(&self, path: &str) -> Option<NodeId> {
        self.roots.iter().copied().find(|id| {
            matches!(&self.node(*id).def, BindingDef::File { path: p } if p == path)
        })
    }

    /// Find the file node for `path`, creating it on first use.
    pub fn ensure_file(&mut self, path: &str) -> NodeId {
        match self.find_file(path) {
            Some(id) => id,
            None => self.add_root(BindingNode::file(path)),
        }
    }

    /// Find the namespace `name` in `file`, creating it on first use.
    pub fn ensure_namespace(&mut self, file: NodeId, name: &str) -> NodeId {
        match self.find_child(file, BindingKind::Namespace, name) {
            Some(id) => id,
            None => self.add_child(file, BindingNode::namespace(name)),
        }
    }

    /// Find the container class `name` in `namespace`, creating it on
    /// first use.
    ///
    /// A freshly created container is inserted as the first member of the
    /// namespace so promoted constants stay visually prominent.
    pub fn ensure_container(&mut self, namespace: NodeId, name: &str) -> NodeId {
        match self.find_child(namespace, BindingKind::Class, name) {
            Some(id) => id,
            None => self.insert_child(namespace, 0, BindingNode::class(name)),
        }
    }

    /// Set a method's entry-point symbol. Early-returns on non-methods.
    pub fn set_entry_point(&mut self, id: NodeId, symbol: impl Into<String>) {
        if let BindingDef::Method { entry_point, .. } = &mut self.nodes[id.index()].def {
            *entry_point = Some(symbol.into());
        }
    }

    /// Replace a parameter's type. Early-returns on non-parameters.
    pub fn set_parameter_type(&mut self, id: NodeId, new_ty: CsType) {
        if let BindingDef::Parameter { ty, .. } = &mut self.nodes[id.index()].def {
            *ty = new_ty;
        }
    }

    /// Change a parameter's passing direction. Early-returns on
    /// non-parameters.
    pub fn set_ref_kind(&mut self, id: NodeId, kind: RefKind) {
        if let BindingDef::Parameter { ref_kind, .. } = &mut self.nodes[id.index()].def {
            *ref_kind = kind;
        }
    }

    /// Replace a field's type. Early-returns on non-fields.
    pub fn set_field_type(&mut self, id: NodeId, new_ty: CsType) {
        if let BindingDef::Field { ty } = &mut self.nodes[id.index()].def {
            *ty = new_ty;
        }
    }

    /// Override an enum member's value. Early-returns on non-members.
    pub fn set_enum_value(&mut self, id: NodeId, value: EnumValue) {
        if let BindingDef::EnumMember { value: v } = &mut self.nodes[id.index()].def {
            *v = value;
        }
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.discarded).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ensure_file_is_idempotent() {
        let mut tree = BindingTree::new();
        let a = tree.ensure_file("Audio.Generated.cs");
        let b = tree.ensure_file("Audio.Generated.cs");
        assert_eq!(a, b);
        assert_eq!(tree.roots().len(), 1);
    }

    #[test]
    fn test_ensure_container_created_first() {
        let mut tree = BindingTree::new();
        let file = tree.ensure_file("Audio.Generated.cs");
        let ns = tree.ensure_namespace(file, "Audio");
        let _existing = tree.add_child(ns, BindingNode::structure("Vector3"));

        let container = tree.ensure_container(ns, "Api");
        assert_eq!(tree.children(ns)[0], container);

        // Probing again reuses the same container.
        assert_eq!(tree.ensure_container(ns, "Api"), container);
        assert_eq!(tree.children(ns).len(), 2);
    }

    #[test]
    fn test_set_helpers_ignore_wrong_kinds() {
        let mut tree = BindingTree::new();
        let file = tree.ensure_file("A.cs");
        tree.set_entry_point(file, "symbol");
        tree.set_ref_kind(file, RefKind::Out);

        assert!(matches!(tree.node(file).def, BindingDef::File { .. }));
    }

    #[test]
    fn test_enum_value_rendering() {
        assert_eq!(EnumValue::int(4).to_csharp(), "4");
        assert_eq!(EnumValue::expr("Sse2").to_csharp(), "Sse2");
    }
}

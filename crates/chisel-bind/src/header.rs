//! Source declaration tree
//!
//! This module provides the parsed representation of a C header's public
//! surface: an arena-backed tree of declarations (functions, structs,
//! fields, parameters, enums, enum members, typedefs) plus the flat,
//! order-preserving macro collection at compilation scope.
//!
//! The tree is built once by the parser collaborator and mutated in place
//! by source-stage rules; it is never reconstructed. Nodes are addressed
//! by [`NodeId`] arena indices, so renames and type changes never disturb
//! parent/child links.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::doc::HeaderDoc;

/// Arena index of a tree node.
///
/// Ids are stable for the lifetime of the tree; discarding a node retires
/// its id but never reuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Symbol visibility in the source header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    /// Part of the public API surface.
    #[default]
    Public,
    /// Present in the header but not part of the binding surface.
    Private,
}

impl Visibility {
    /// Check if this is publicly visible
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// C type reference as declared in the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CType {
    /// `void`
    Void,
    /// `bool` / `_Bool`
    Bool,
    /// `char`
    Char,
    /// Fixed-width or platform integer
    Int {
        /// Width in bits (8, 16, 32, 64).
        width: u8,
        /// Signedness.
        signed: bool,
    },
    /// `float`
    Float,
    /// `double`
    Double,
    /// Pointer to another type
    Pointer {
        /// Pointee type.
        inner: Box<CType>,
    },
    /// Fixed-size array, possibly multi-dimensional
    Array {
        /// Element type.
        element: Box<CType>,
        /// Extent of each dimension, outermost first.
        dims: Vec<usize>,
    },
    /// Reference to a named struct, enum, or typedef
    Named {
        /// Name as written in the header.
        name: String,
    },
}

impl CType {
    /// `int32_t` shorthand
    pub fn int32() -> Self {
        CType::Int {
            width: 32,
            signed: true,
        }
    }

    /// `uint32_t` shorthand
    pub fn uint32() -> Self {
        CType::Int {
            width: 32,
            signed: false,
        }
    }

    /// Pointer to the given type
    pub fn pointer(inner: CType) -> Self {
        CType::Pointer {
            inner: Box::new(inner),
        }
    }

    /// Fixed-size array of the given element type
    pub fn array(element: CType, dims: impl Into<Vec<usize>>) -> Self {
        CType::Array {
            element: Box::new(element),
            dims: dims.into(),
        }
    }

    /// Reference to a named type
    pub fn named(name: impl Into<String>) -> Self {
        CType::Named { name: name.into() }
    }

    /// Name of the referenced type, if this is a named reference
    /// (looking through one level of pointer).
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            CType::Named { name } => Some(name),
            CType::Pointer { inner } => inner.referenced_name(),
            _ => None,
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Bool => write!(f, "bool"),
            CType::Char => write!(f, "char"),
            CType::Int { width, signed } => {
                write!(f, "{}int{}_t", if *signed { "" } else { "u" }, width)
            }
            CType::Float => write!(f, "float"),
            CType::Double => write!(f, "double"),
            CType::Pointer { inner } => write!(f, "{inner}*"),
            CType::Array { element, dims } => {
                write!(f, "{element}")?;
                for dim in dims {
                    write!(f, "[{dim}]")?;
                }
                Ok(())
            }
            CType::Named { name } => write!(f, "{name}"),
        }
    }
}

/// Kind of source declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderKind {
    /// Exported function
    Function,
    /// Struct or union
    Struct,
    /// Struct field
    Field,
    /// Function parameter
    Parameter,
    /// Enumeration
    Enum,
    /// Enumeration member
    EnumMember,
    /// Type alias
    Typedef,
}

impl HeaderKind {
    /// Get display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            HeaderKind::Function => "function",
            HeaderKind::Struct => "struct",
            HeaderKind::Field => "field",
            HeaderKind::Parameter => "parameter",
            HeaderKind::Enum => "enum",
            HeaderKind::EnumMember => "enum member",
            HeaderKind::Typedef => "typedef",
        }
    }
}

/// Kind-specific payload of a source declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum HeaderDef {
    /// Exported function
    Function {
        /// Declared return type.
        return_type: CType,
    },
    /// Struct or union
    Struct,
    /// Struct field
    Field {
        /// Declared type.
        ty: CType,
    },
    /// Function parameter
    Parameter {
        /// Declared type.
        ty: CType,
    },
    /// Enumeration
    Enum,
    /// Enumeration member
    EnumMember {
        /// Source integer value.
        value: i64,
    },
    /// Type alias
    Typedef {
        /// Aliased type.
        ty: CType,
    },
}

impl HeaderDef {
    /// The kind tag of this payload.
    pub fn kind(&self) -> HeaderKind {
        match self {
            HeaderDef::Function { .. } => HeaderKind::Function,
            HeaderDef::Struct => HeaderKind::Struct,
            HeaderDef::Field { .. } => HeaderKind::Field,
            HeaderDef::Parameter { .. } => HeaderKind::Parameter,
            HeaderDef::Enum => HeaderKind::Enum,
            HeaderDef::EnumMember { .. } => HeaderKind::EnumMember,
            HeaderDef::Typedef { .. } => HeaderKind::Typedef,
        }
    }
}

/// A declaration in the source tree.
#[derive(Debug, Clone)]
pub struct HeaderNode {
    /// Current display name. Rules may rewrite this freely.
    pub name: String,
    /// Name as declared in the header. Never changes; type references and
    /// exported symbols resolve through it after display renames.
    pub original_name: String,
    /// Kind-specific payload.
    pub def: HeaderDef,
    /// Attached documentation.
    pub doc: HeaderDoc,
    /// Visibility flag.
    pub visibility: Visibility,
    /// Owning node, if any. Every node except roots has exactly one.
    pub parent: Option<NodeId>,
    /// Owned children, in insertion order.
    pub children: Vec<NodeId>,
    discarded: bool,
}

impl HeaderNode {
    /// Create a node with the given name and payload.
    pub fn new(name: impl Into<String>, def: HeaderDef) -> Self {
        let name = name.into();
        Self {
            original_name: name.clone(),
            name,
            def,
            doc: HeaderDoc::default(),
            visibility: Visibility::Public,
            parent: None,
            children: Vec::new(),
            discarded: false,
        }
    }

    /// Create a function node.
    pub fn function(name: impl Into<String>, return_type: CType) -> Self {
        Self::new(name, HeaderDef::Function { return_type })
    }

    /// Create a struct node.
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, HeaderDef::Struct)
    }

    /// Create a field node.
    pub fn field(name: impl Into<String>, ty: CType) -> Self {
        Self::new(name, HeaderDef::Field { ty })
    }

    /// Create a parameter node.
    pub fn parameter(name: impl Into<String>, ty: CType) -> Self {
        Self::new(name, HeaderDef::Parameter { ty })
    }

    /// Create an enum node.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, HeaderDef::Enum)
    }

    /// Create an enum member node.
    pub fn enum_member(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, HeaderDef::EnumMember { value })
    }

    /// Create a typedef node.
    pub fn typedef(name: impl Into<String>, ty: CType) -> Self {
        Self::new(name, HeaderDef::Typedef { ty })
    }

    /// Attach documentation, builder-style.
    pub fn with_doc(mut self, doc: HeaderDoc) -> Self {
        self.doc = doc;
        self
    }

    /// Set the visibility flag, builder-style.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// The kind of this node.
    pub fn kind(&self) -> HeaderKind {
        self.def.kind()
    }
}

/// A preprocessor macro at compilation scope.
///
/// Macros have no owner in the tree; they form a flat, order-preserving
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderMacro {
    /// Macro name.
    pub name: String,
    /// Raw textual value. Blank values are ignored by promotion.
    #[serde(default)]
    pub value: String,
}

impl HeaderMacro {
    /// Create a macro.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether the value is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Arena-backed source declaration tree.
#[derive(Debug, Clone, Default)]
pub struct HeaderTree {
    nodes: Vec<HeaderNode>,
    roots: Vec<NodeId>,
}

impl HeaderTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: HeaderNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Add a top-level declaration.
    pub fn add_root(&mut self, node: HeaderNode) -> NodeId {
        let id = self.insert(node);
        self.roots.push(id);
        id
    }

    /// Add a declaration owned by `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: HeaderNode) -> NodeId {
        let id = self.insert(node);
        self.nodes[id.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Top-level declarations, in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &HeaderNode {
        &self.nodes[id.index()]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut HeaderNode {
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

    /// Change a node's display name. Parentage, children, and the original
    /// name are untouched.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) {
        self.nodes[id.index()].name = name.into();
    }

    /// Remove a node (and its subtree) from the tree.
    ///
    /// This is a hard delete: the node disappears from its parent's child
    /// list immediately and is never visited by subsequent rules.
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

    /// Fully qualified display name: `Owner::name` for owned declarations,
    /// the plain name for roots.
    pub fn qualified_name(&self, id: NodeId) -> String {
        let node = &self.nodes[id.index()];
        match node.parent {
            Some(parent) => format!("{}::{}", self.nodes[parent.index()].name, node.name),
            None => node.name.clone(),
        }
    }

    /// Find a live top-level declaration by current display name.
    pub fn find_root(&self, name: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.node(*id).name == name)
    }

    /// Find a live top-level declaration by original header name.
    pub fn find_root_by_original(&self, name: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.node(*id).original_name == name)
    }

    /// Replace the declared type of a field or parameter. Early-returns
    /// silently on other kinds, matching the defensive-rule contract.
    pub fn set_declared_type(&mut self, id: NodeId, new_ty: CType) {
        match &mut self.nodes[id.index()].def {
            HeaderDef::Field { ty } | HeaderDef::Parameter { ty } => *ty = new_ty,
            _ => {}
        }
    }

    /// Find a discarded declaration by original header name.
    pub fn find_discarded_by_original(&self, name: &str) -> Option<&HeaderNode> {
        self.nodes
            .iter()
            .find(|n| n.discarded && n.original_name == name)
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.discarded).count()
    }
}

/// Everything the parser collaborator hands the generator: the declaration
/// tree, the flat macro collection, and the parse/convert diagnostics.
#[derive(Debug, Clone, Default)]
pub struct HeaderCompilation {
    /// Parsed declaration tree.
    pub tree: HeaderTree,
    /// Preprocessor macros, in scan order.
    pub macros: Vec<HeaderMacro>,
    /// Parse and conversion diagnostics.
    pub diagnostics: Diagnostics,
}

impl HeaderCompilation {
    /// Create an empty compilation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a macro by exact name.
    pub fn find_macro(&self, name: &str) -> Option<&HeaderMacro> {
        self.macros.iter().find(|m| m.name == name)
    }
}

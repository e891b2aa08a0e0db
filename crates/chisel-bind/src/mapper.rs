//! Default structural mapper
//!
//! This module converts each source declaration kind into its generated
//! counterpart before the binding-stage rules run: functions become extern
//! method stubs keeping a hidden link to the exported symbol, structs
//! become value aggregates with fields in source order, enums keep their
//! member values, and multi-dimensional array fields are flattened into a
//! single fixed-size buffer.
//!
//! Typedefs are unwrapped rather than emitted: named references resolve
//! through the typedef table, so a handle typedef over an opaque struct
//! pointer maps straight to `IntPtr`. References to declarations a source
//! rule discarded map to an unresolved free-text type that a binding rule
//! is expected to rewrite.

use std::collections::HashMap;

use tracing::debug;

use crate::binding::{BindingNode, BindingTree, EnumValue};
use crate::header::{CType, HeaderDef, HeaderKind, HeaderTree, NodeId};
use crate::types::{CsPrimitive, CsType, RefKind, UnmanagedKind};

/// Maximum typedef chain length followed before giving up.
const MAX_TYPEDEF_DEPTH: usize = 32;

/// Map a source tree into a fresh generated tree.
///
/// `output_file`, `namespace`, and `class` name the generated file, its
/// namespace block, and the static container class receiving the method
/// stubs.
pub fn map_header(
    tree: &HeaderTree,
    output_file: &str,
    namespace: &str,
    class: &str,
) -> BindingTree {
    let mapper = Mapper::new(tree);
    mapper.run(output_file, namespace, class)
}

struct Mapper<'a> {
    tree: &'a HeaderTree,
    typedefs: HashMap<String, CType>,
}

impl<'a> Mapper<'a> {
    fn new(tree: &'a HeaderTree) -> Self {
        let mut typedefs = HashMap::new();
        for id in tree.roots() {
            let node = tree.node(*id);
            if let HeaderDef::Typedef { ty } = &node.def {
                typedefs.insert(node.original_name.clone(), ty.clone());
            }
        }
        Self { tree, typedefs }
    }

    fn run(&self, output_file: &str, namespace: &str, class: &str) -> BindingTree {
        let mut out = BindingTree::new();
        let file = out.ensure_file(output_file);
        let ns = out.ensure_namespace(file, namespace);
        let container = out.ensure_container(ns, class);

        for id in self.tree.roots() {
            let node = self.tree.node(*id);
            match node.kind() {
                HeaderKind::Function => self.map_function(&mut out, container, *id),
                HeaderKind::Struct => self.map_struct(&mut out, ns, *id),
                HeaderKind::Enum => self.map_enum(&mut out, ns, *id),
                // Typedefs are unwrapped; fields/params/members only occur
                // below their owners.
                _ => {}
            }
        }

        debug!(
            declarations = out.live_count(),
            "structural mapping complete"
        );
        out
    }

    fn map_function(&self, out: &mut BindingTree, container: NodeId, id: NodeId) {
        let node = self.tree.node(id);
        let HeaderDef::Function { return_type } = &node.def else {
            return;
        };

        let mut method = BindingNode::method(&node.name, self.map_value_type(return_type))
            .with_doc(node.doc.clone());
        method.visibility = node.visibility;
        let method_id = out.add_child(container, method);
        // The exported symbol survives any later display rename.
        out.set_entry_point(method_id, &node.original_name);

        for param_id in self.tree.children(id) {
            let param = self.tree.node(*param_id);
            let HeaderDef::Parameter { ty } = &param.def else {
                continue;
            };
            let (mapped, ref_kind) = self.map_param_type(ty);
            let mut generated = BindingNode::parameter(&param.name, mapped, ref_kind);
            generated.visibility = param.visibility;
            out.add_child(method_id, generated);
        }
    }

    fn map_struct(&self, out: &mut BindingTree, ns: NodeId, id: NodeId) {
        let node = self.tree.node(id);
        let mut generated = BindingNode::structure(&node.name).with_doc(node.doc.clone());
        generated.visibility = node.visibility;
        let struct_id = out.add_child(ns, generated);

        for field_id in self.tree.children(id) {
            let field = self.tree.node(*field_id);
            let HeaderDef::Field { ty } = &field.def else {
                continue;
            };
            let mut generated = BindingNode::field(&field.name, self.map_value_type(ty))
                .with_doc(field.doc.clone());
            generated.visibility = field.visibility;
            out.add_child(struct_id, generated);
        }
    }

    fn map_enum(&self, out: &mut BindingTree, ns: NodeId, id: NodeId) {
        let node = self.tree.node(id);
        let mut generated = BindingNode::enumeration(&node.name).with_doc(node.doc.clone());
        generated.visibility = node.visibility;
        let enum_id = out.add_child(ns, generated);

        for member_id in self.tree.children(id) {
            let member = self.tree.node(*member_id);
            let HeaderDef::EnumMember { value } = &member.def else {
                continue;
            };
            let mut generated =
                BindingNode::enum_member(&member.name, EnumValue::int(*value))
                    .with_doc(member.doc.clone());
            generated.visibility = member.visibility;
            out.add_child(enum_id, generated);
        }
    }

    /// Follow typedef chains until a non-alias type is reached.
    fn resolve_typedefs(&self, ty: &CType) -> CType {
        let mut current = ty.clone();
        for _ in 0..MAX_TYPEDEF_DEPTH {
            match &current {
                CType::Named { name } => match self.typedefs.get(name) {
                    Some(aliased) => current = aliased.clone(),
                    None => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// Map a type in field/return position.
    fn map_value_type(&self, ty: &CType) -> CsType {
        match self.resolve_typedefs(ty) {
            CType::Void => CsType::primitive(CsPrimitive::Void),
            CType::Bool => CsType::marshalled(CsType::bool(), UnmanagedKind::U1),
            CType::Char => CsType::primitive(CsPrimitive::SByte),
            CType::Int { width, signed } => CsType::primitive(int_primitive(width, signed)),
            CType::Float => CsType::float(),
            CType::Double => CsType::primitive(CsPrimitive::Double),
            // Pointers in value position stay opaque.
            CType::Pointer { .. } => CsType::intptr(),
            CType::Array { element, dims } => {
                let length = dims.iter().product::<usize>().max(1);
                CsType::fixed_buffer(self.map_value_type(&element), length)
            }
            CType::Named { name } => self.map_named(&name),
        }
    }

    /// Map a type in parameter position, inferring the passing direction.
    fn map_param_type(&self, ty: &CType) -> (CsType, RefKind) {
        match self.resolve_typedefs(ty) {
            CType::Pointer { inner } => {
                let pointee = self.resolve_typedefs(&inner);
                match pointee {
                    CType::Void => (CsType::intptr(), RefKind::Value),
                    CType::Char => (CsType::primitive(CsPrimitive::String), RefKind::Value),
                    // A pointer to a struct the header never declares is an
                    // opaque handle: the pointer itself is the value.
                    CType::Named { name } if !self.is_declared(&name) => {
                        (CsType::intptr(), RefKind::Value)
                    }
                    other => (self.map_value_type(&other), RefKind::InOut),
                }
            }
            // Array parameters decay to an opaque pointer.
            CType::Array { .. } => (CsType::intptr(), RefKind::Value),
            other => (self.map_value_type(&other), RefKind::Value),
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.tree.find_root_by_original(name).is_some()
            || self.tree.find_discarded_by_original(name).is_some()
    }

    /// Map a named reference to a generated type name.
    fn map_named(&self, name: &str) -> CsType {
        if let Some(id) = self.tree.find_root_by_original(name) {
            return CsType::named(&self.tree.node(id).name);
        }
        if let Some(node) = self.tree.find_discarded_by_original(name) {
            // A source rule removed the declaration; leave a marker for a
            // binding rule to redirect.
            return CsType::free(format!(
                "unsupported /* {} {} */",
                node.kind().display_name(),
                node.original_name
            ));
        }
        CsType::named(name)
    }
}

fn int_primitive(width: u8, signed: bool) -> CsPrimitive {
    match (width, signed) {
        (8, true) => CsPrimitive::SByte,
        (8, false) => CsPrimitive::Byte,
        (16, true) => CsPrimitive::Short,
        (16, false) => CsPrimitive::UShort,
        (64, true) => CsPrimitive::Long,
        (64, false) => CsPrimitive::ULong,
        (_, true) => CsPrimitive::Int,
        (_, false) => CsPrimitive::UInt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingDef, BindingKind};
    use crate::header::HeaderNode;
    use pretty_assertions::assert_eq;

    fn find_in<'t>(
        tree: &'t BindingTree,
        parent: NodeId,
        kind: BindingKind,
        name: &str,
    ) -> NodeId {
        tree.find_child(parent, kind, name)
            .unwrap_or_else(|| panic!("missing {} {}", kind.display_name(), name))
    }

    fn mapped_layout(tree: &BindingTree) -> (NodeId, NodeId) {
        let file = tree.find_file("Audio.Generated.cs").expect("file");
        let ns = find_in(tree, file, BindingKind::Namespace, "Audio");
        let class = find_in(tree, ns, BindingKind::Class, "Api");
        (ns, class)
    }

    #[test]
    fn test_function_becomes_extern_stub_with_entry_point() {
        let mut tree = HeaderTree::new();
        let f = tree.add_root(HeaderNode::function("iplContextCreate", CType::named("IPLerror")));
        tree.add_child(
            f,
            HeaderNode::parameter("context", CType::pointer(CType::named("IPLContext"))),
        );
        tree.add_root(HeaderNode::typedef(
            "IPLContext",
            CType::pointer(CType::named("_IPLContext_t")),
        ));

        let out = map_header(&tree, "Audio.Generated.cs", "Audio", "Api");
        let (_, class) = mapped_layout(&out);
        let method = find_in(&out, class, BindingKind::Method, "iplContextCreate");

        let BindingDef::Method { entry_point, .. } = &out.node(method).def else {
            panic!("expected method");
        };
        assert_eq!(entry_point.as_deref(), Some("iplContextCreate"));

        // Handle typedef over an opaque struct pointer: the parameter is a
        // by-ref IntPtr.
        let param = out.children(method)[0];
        let BindingDef::Parameter { ty, ref_kind } = &out.node(param).def else {
            panic!("expected parameter");
        };
        assert_eq!(ty, &CsType::intptr());
        assert_eq!(*ref_kind, RefKind::InOut);
    }

    #[test]
    fn test_struct_fields_keep_order() {
        let mut tree = HeaderTree::new();
        let s = tree.add_root(HeaderNode::structure("IPLVector3"));
        tree.add_child(s, HeaderNode::field("x", CType::Float));
        tree.add_child(s, HeaderNode::field("y", CType::Float));
        tree.add_child(s, HeaderNode::field("z", CType::Float));

        let out = map_header(&tree, "Audio.Generated.cs", "Audio", "Api");
        let (ns, _) = mapped_layout(&out);
        let generated = find_in(&out, ns, BindingKind::Struct, "IPLVector3");

        let names: Vec<_> = out
            .children(generated)
            .iter()
            .map(|id| out.node(*id).name.clone())
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_multi_dimensional_array_flattens() {
        let mut tree = HeaderTree::new();
        let s = tree.add_root(HeaderNode::structure("IPLMatrix4x4"));
        tree.add_child(
            s,
            HeaderNode::field("elements", CType::array(CType::Float, vec![4, 4])),
        );

        let out = map_header(&tree, "Audio.Generated.cs", "Audio", "Api");
        let (ns, _) = mapped_layout(&out);
        let generated = find_in(&out, ns, BindingKind::Struct, "IPLMatrix4x4");
        let field = out.children(generated)[0];

        let BindingDef::Field { ty } = &out.node(field).def else {
            panic!("expected field");
        };
        assert_eq!(ty, &CsType::fixed_buffer(CsType::float(), 16));
    }

    #[test]
    fn test_enum_members_keep_values() {
        let mut tree = HeaderTree::new();
        let e = tree.add_root(HeaderNode::enumeration("IPLerror"));
        tree.add_child(e, HeaderNode::enum_member("IPL_STATUS_SUCCESS", 0));
        tree.add_child(e, HeaderNode::enum_member("IPL_STATUS_FAILURE", 1));

        let out = map_header(&tree, "Audio.Generated.cs", "Audio", "Api");
        let (ns, _) = mapped_layout(&out);
        let generated = find_in(&out, ns, BindingKind::Enum, "IPLerror");
        let member = out.children(generated)[1];

        let BindingDef::EnumMember { value } = &out.node(member).def else {
            panic!("expected member");
        };
        assert_eq!(value, &EnumValue::int(1));
    }

    #[test]
    fn test_discarded_enum_reference_becomes_free_type() {
        let mut tree = HeaderTree::new();
        let e = tree.add_root(HeaderNode::enumeration("IPLbool"));
        tree.add_child(e, HeaderNode::enum_member("IPL_FALSE", 0));
        let s = tree.add_root(HeaderNode::structure("IPLSettings"));
        tree.add_child(s, HeaderNode::field("enabled", CType::named("IPLbool")));
        tree.discard(e);

        let out = map_header(&tree, "Audio.Generated.cs", "Audio", "Api");
        let (ns, _) = mapped_layout(&out);
        let generated = find_in(&out, ns, BindingKind::Struct, "IPLSettings");
        let field = out.children(generated)[0];

        let BindingDef::Field { ty } = &out.node(field).def else {
            panic!("expected field");
        };
        assert_eq!(ty, &CsType::free("unsupported /* enum IPLbool */"));
    }

    #[test]
    fn test_handle_typedef_param_is_by_value_intptr() {
        let mut tree = HeaderTree::new();
        tree.add_root(HeaderNode::typedef(
            "IPLContext",
            CType::pointer(CType::named("_IPLContext_t")),
        ));
        let f = tree.add_root(HeaderNode::function("iplContextRetain", CType::Void));
        tree.add_child(f, HeaderNode::parameter("context", CType::named("IPLContext")));

        let out = map_header(&tree, "Audio.Generated.cs", "Audio", "Api");
        let (_, class) = mapped_layout(&out);
        let method = find_in(&out, class, BindingKind::Method, "iplContextRetain");
        let param = out.children(method)[0];

        let BindingDef::Parameter { ty, ref_kind } = &out.node(param).def else {
            panic!("expected parameter");
        };
        assert_eq!(ty, &CsType::intptr());
        assert_eq!(*ref_kind, RefKind::Value);
    }

    #[test]
    fn test_const_char_pointer_param_is_string() {
        let mut tree = HeaderTree::new();
        let f = tree.add_root(HeaderNode::function("iplContextLog", CType::Void));
        tree.add_child(f, HeaderNode::parameter("message", CType::pointer(CType::Char)));

        let out = map_header(&tree, "Audio.Generated.cs", "Audio", "Api");
        let (_, class) = mapped_layout(&out);
        let method = find_in(&out, class, BindingKind::Method, "iplContextLog");
        let param = out.children(method)[0];

        let BindingDef::Parameter { ty, ref_kind } = &out.node(param).def else {
            panic!("expected parameter");
        };
        assert_eq!(ty, &CsType::primitive(CsPrimitive::String));
        assert_eq!(*ref_kind, RefKind::Value);
    }
}

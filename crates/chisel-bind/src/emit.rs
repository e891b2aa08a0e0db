//! Binding emitter
//!
//! This module serializes a generated tree to C# source text. Each file
//! root becomes one compilation unit: a generated-code header, the using
//! directives, and the namespace block with the constant container first.
//!
//! Rendering is infallible; the generator writes the rendered units to
//! disk only after every stage has succeeded, so no partial output ever
//! lands in the output directory.

use tracing::debug;

use crate::binding::{BindingDef, BindingKind, BindingTree};
use crate::header::NodeId;
use crate::types::{CsType, RefKind};

/// A rendered compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFile {
    /// Output file name, relative to the output directory.
    pub path: String,
    /// Full C# source text.
    pub content: String,
}

/// Render every file root of the tree.
///
/// `dll_import` is the identifier passed to `[DllImport]`; the consumer
/// side is expected to define it as a string constant naming the native
/// library.
pub fn emit_tree(tree: &BindingTree, dll_import: &str) -> Vec<EmittedFile> {
    let files: Vec<EmittedFile> = tree
        .roots()
        .iter()
        .filter_map(|id| {
            let node = tree.node(*id);
            match &node.def {
                BindingDef::File { path } => Some(EmittedFile {
                    path: path.clone(),
                    content: emit_file(tree, *id, dll_import),
                }),
                _ => None,
            }
        })
        .collect();

    debug!(files = files.len(), "emission complete");
    files
}

fn emit_file(tree: &BindingTree, file: NodeId, dll_import: &str) -> String {
    let mut w = CsWriter::new();
    w.line("// <auto-generated>");
    w.line("// This file was generated by chisel. Changes will be lost on regeneration.");
    w.line("// </auto-generated>");
    w.blank();
    w.line("using System;");
    w.line("using System.Runtime.InteropServices;");

    for ns in tree.children(file) {
        let node = tree.node(*ns);
        if node.kind() != BindingKind::Namespace {
            continue;
        }
        w.blank();
        w.line(&format!("namespace {}", node.name));
        w.open();
        emit_namespace_members(&mut w, tree, *ns, dll_import);
        w.close();
    }

    w.finish()
}

fn emit_namespace_members(w: &mut CsWriter, tree: &BindingTree, ns: NodeId, dll_import: &str) {
    let mut first = true;
    for id in tree.children(ns) {
        let node = tree.node(*id);
        if !node.visibility.is_public() {
            continue;
        }
        if !first {
            w.blank();
        }
        first = false;

        match node.kind() {
            BindingKind::Class => emit_class(w, tree, *id, dll_import),
            BindingKind::Struct => emit_struct(w, tree, *id),
            BindingKind::Enum => emit_enum(w, tree, *id),
            _ => {}
        }
    }
}

fn emit_class(w: &mut CsWriter, tree: &BindingTree, class: NodeId, dll_import: &str) {
    emit_summary(w, tree, class);
    w.line(&format!("public static partial class {}", tree.node(class).name));
    w.open();

    // Constants lead the container so promoted values stay prominent.
    let children = tree.children(class);
    let (constants, rest): (Vec<&NodeId>, Vec<&NodeId>) = children
        .iter()
        .partition(|id| tree.node(**id).kind() == BindingKind::Constant);

    let mut first = true;
    for id in &constants {
        first = false;
        emit_constant(w, tree, **id);
    }
    for id in &rest {
        if !first {
            w.blank();
        }
        first = false;
        if tree.node(**id).kind() == BindingKind::Method {
            emit_method(w, tree, **id, dll_import);
        }
    }

    w.close();
}

fn emit_constant(w: &mut CsWriter, tree: &BindingTree, id: NodeId) {
    let node = tree.node(id);
    let BindingDef::Constant { ty, value } = &node.def else {
        return;
    };
    w.line(&format!(
        "public const {} {} = {};",
        ty.to_csharp(),
        node.name,
        value
    ));
}

fn emit_method(w: &mut CsWriter, tree: &BindingTree, id: NodeId, dll_import: &str) {
    let node = tree.node(id);
    let BindingDef::Method {
        return_type,
        entry_point,
    } = &node.def
    else {
        return;
    };

    emit_summary(w, tree, id);

    let mut attribute = format!("[DllImport({dll_import}");
    match entry_point {
        // The display rename must not break symbol resolution.
        Some(symbol) if symbol != &node.name => {
            attribute.push_str(&format!(", EntryPoint = \"{symbol}\""));
        }
        _ => {}
    }
    attribute.push_str(", CallingConvention = CallingConvention.Cdecl)]");
    w.line(&attribute);

    let params: Vec<String> = tree
        .children(id)
        .iter()
        .filter_map(|p| {
            let param = tree.node(*p);
            match &param.def {
                BindingDef::Parameter { ty, ref_kind } => {
                    Some(render_parameter(&param.name, ty, *ref_kind))
                }
                _ => None,
            }
        })
        .collect();

    w.line(&format!(
        "public static extern {} {}({});",
        return_type.to_csharp(),
        node.name,
        params.join(", ")
    ));
}

fn render_parameter(name: &str, ty: &CsType, ref_kind: RefKind) -> String {
    let mut rendered = String::new();
    if let Some(unmanaged) = ty.unmanaged_kind() {
        rendered.push_str(&format!(
            "[MarshalAs(UnmanagedType.{})] ",
            unmanaged.to_csharp()
        ));
    }
    rendered.push_str(ref_kind.modifier());
    rendered.push_str(&ty.to_csharp());
    rendered.push(' ');
    rendered.push_str(name);
    rendered
}

fn emit_struct(w: &mut CsWriter, tree: &BindingTree, id: NodeId) {
    let node = tree.node(id);
    emit_summary(w, tree, id);
    w.line("[StructLayout(LayoutKind.Sequential)]");

    let has_fixed = tree.children(id).iter().any(|f| {
        matches!(
            &tree.node(*f).def,
            BindingDef::Field {
                ty: CsType::FixedBuffer { .. }
            }
        )
    });
    let modifier = if has_fixed { "unsafe partial" } else { "partial" };
    w.line(&format!("public {modifier} struct {}", node.name));
    w.open();

    for field_id in tree.children(id) {
        let field = tree.node(*field_id);
        let BindingDef::Field { ty } = &field.def else {
            continue;
        };
        if !field.visibility.is_public() {
            continue;
        }
        match ty {
            CsType::FixedBuffer { element, length } => {
                w.line(&format!(
                    "public fixed {} {}[{}];",
                    element.to_csharp(),
                    field.name,
                    length
                ));
            }
            _ => {
                if let Some(unmanaged) = ty.unmanaged_kind() {
                    w.line(&format!(
                        "[MarshalAs(UnmanagedType.{})]",
                        unmanaged.to_csharp()
                    ));
                }
                w.line(&format!("public {} {};", ty.to_csharp(), field.name));
            }
        }
    }

    w.close();
}

fn emit_enum(w: &mut CsWriter, tree: &BindingTree, id: NodeId) {
    let node = tree.node(id);
    emit_summary(w, tree, id);
    w.line(&format!("public enum {}", node.name));
    w.open();

    for member_id in tree.children(id) {
        let member = tree.node(*member_id);
        let BindingDef::EnumMember { value } = &member.def else {
            continue;
        };
        w.line(&format!("{} = {},", member.name, value.to_csharp()));
    }

    w.close();
}

fn emit_summary(w: &mut CsWriter, tree: &BindingTree, id: NodeId) {
    if let Some(summary) = tree.node(id).doc.summary() {
        w.line("/// <summary>");
        for line in summary.lines() {
            w.line(&format!("/// {}", line.trim()));
        }
        w.line("/// </summary>");
    }
}

/// Minimal indented C# writer.
struct CsWriter {
    buf: String,
    indent: usize,
}

impl CsWriter {
    fn new() -> Self {
        Self {
            buf: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn open(&mut self) {
        self.line("{");
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        self.buf
    }
}

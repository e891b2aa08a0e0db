//! Header AST loading
//!
//! The C parser itself is an external collaborator: it analyzes the header
//! (and its include search paths) and hands the generator a JSON document
//! describing the public surface: declarations, the flat macro
//! collection, and any parse/convert diagnostics. This module defines that
//! document contract and builds the in-memory [`HeaderTree`] from it.
//!
//! Documentation may arrive either as raw comment text (parsed here for
//! `\param` entries) or already structured.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::diagnostics::{BindError, BindResult, Diagnostic, Diagnostics};
use crate::doc::HeaderDoc;
use crate::header::{
    CType, HeaderCompilation, HeaderMacro, HeaderNode, HeaderTree, Visibility,
};

/// Load and build a header compilation from a JSON AST document on disk.
pub fn load_header_ast(path: &Path) -> BindResult<HeaderCompilation> {
    if !path.exists() {
        return Err(BindError::FileNotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    parse_header_ast(&json).map_err(|e| BindError::ast(path, e.to_string()))
}

/// Build a header compilation from JSON AST text.
pub fn parse_header_ast(json: &str) -> BindResult<HeaderCompilation> {
    let ast: HeaderAst = serde_json::from_str(json)?;
    Ok(build_compilation(ast))
}

fn build_compilation(ast: HeaderAst) -> HeaderCompilation {
    let mut tree = HeaderTree::new();

    for decl in ast.declarations {
        match decl {
            AstDecl::Function {
                name,
                return_type,
                doc,
                visibility,
                params,
            } => {
                let node = HeaderNode::function(name, return_type)
                    .with_doc(doc.into_doc())
                    .with_visibility(visibility);
                let id = tree.add_root(node);
                for param in params {
                    tree.add_child(id, HeaderNode::parameter(param.name, param.ty));
                }
            }
            AstDecl::Struct {
                name,
                doc,
                visibility,
                fields,
            } => {
                let node = HeaderNode::structure(name)
                    .with_doc(doc.into_doc())
                    .with_visibility(visibility);
                let id = tree.add_root(node);
                for field in fields {
                    let child = HeaderNode::field(field.name, field.ty)
                        .with_doc(field.doc.into_doc());
                    tree.add_child(id, child);
                }
            }
            AstDecl::Enum {
                name,
                doc,
                visibility,
                members,
            } => {
                let node = HeaderNode::enumeration(name)
                    .with_doc(doc.into_doc())
                    .with_visibility(visibility);
                let id = tree.add_root(node);
                for member in members {
                    tree.add_child(id, HeaderNode::enum_member(member.name, member.value));
                }
            }
            AstDecl::Typedef { name, ty } => {
                tree.add_root(HeaderNode::typedef(name, ty));
            }
        }
    }

    HeaderCompilation {
        tree,
        macros: ast.macros,
        diagnostics: ast.diagnostics.into_iter().collect::<Diagnostics>(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeaderAst {
    #[serde(default)]
    declarations: Vec<AstDecl>,
    #[serde(default)]
    macros: Vec<HeaderMacro>,
    #[serde(default)]
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
enum AstDecl {
    #[serde(rename_all = "camelCase")]
    Function {
        name: String,
        return_type: CType,
        #[serde(default)]
        doc: AstDoc,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        params: Vec<AstParam>,
    },
    Struct {
        name: String,
        #[serde(default)]
        doc: AstDoc,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        fields: Vec<AstField>,
    },
    Enum {
        name: String,
        #[serde(default)]
        doc: AstDoc,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        members: Vec<AstEnumMember>,
    },
    Typedef {
        name: String,
        ty: CType,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AstParam {
    name: String,
    ty: CType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AstField {
    name: String,
    ty: CType,
    #[serde(default)]
    doc: AstDoc,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AstEnumMember {
    name: String,
    #[serde(default)]
    value: i64,
}

/// Documentation in the AST document: raw comment text or structured.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum AstDoc {
    #[default]
    None,
    Raw(String),
    Structured(HeaderDoc),
}

impl AstDoc {
    fn into_doc(self) -> HeaderDoc {
        match self {
            AstDoc::None => HeaderDoc::default(),
            AstDoc::Raw(comment) => HeaderDoc::parse(&comment),
            AstDoc::Structured(doc) => doc,
        }
    }
}

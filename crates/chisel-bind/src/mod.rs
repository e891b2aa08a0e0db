//! chisel-bind: rule-based C header to C# binding generator
//!
//! This crate turns a parsed C-header AST into idiomatic C# P/Invoke
//! bindings by:
//! - Applying ordered, predicate-matched rewrite rules to the source tree
//!   before structural mapping and to the generated tree after it
//! - Promoting preprocessor macros to typed constants, rewriting
//!   cross-macro references inside value expressions
//! - Normalizing C identifiers to C# naming conventions
//! - Emitting the generated tree as C# source files
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ header AST (JSON)│  external parser collaborator
//! └────────┬─────────┘
//!          ▼
//!   ┌─────────────┐   source rules
//!   │ HeaderTree  │◄──────────────
//!   └──────┬──────┘
//!          ▼ structural mapping
//!   ┌─────────────┐   binding rules, macro promotion
//!   │ BindingTree │◄─────────────────────────────────
//!   └──────┬──────┘
//!          ▼
//!     C# source files
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use chisel_bind::generator::{Generator, GeneratorOptions};
//! use chisel_bind::parser::load_header_ast;
//! use chisel_bind::rules::infer_ref_directions;
//!
//! let compilation = load_header_ast(Path::new("include/phonon.json"))?;
//! Generator::new(GeneratorOptions::new("SteamAudio", "IPL"))
//!     .binding_rule(infer_ref_directions())
//!     .generate(compilation, Path::new("generated"))?;
//! # Ok::<(), chisel_bind::BindError>(())
//! ```

// Core types
pub mod binding;
pub mod doc;
pub mod header;
pub mod names;
pub mod types;

// Transform stages
pub mod mapper;
pub mod promote;
pub mod rules;

// Input, output, and orchestration
pub mod diagnostics;
pub mod emit;
pub mod generator;
pub mod parser;


// Re-exports for convenience
pub use binding::{BindingDef, BindingKind, BindingNode, BindingTree, EnumValue};
pub use diagnostics::{BindError, BindResult, Diagnostic, DiagnosticSeverity, Diagnostics};
pub use doc::{DirectionHint, HeaderDoc, ParamDoc};
pub use emit::{emit_tree, EmittedFile};
pub use generator::{GenerateOutput, Generator, GeneratorOptions};
pub use header::{
    CType, HeaderCompilation, HeaderDef, HeaderKind, HeaderMacro, HeaderNode, HeaderTree, NodeId,
    Visibility,
};
pub use mapper::map_header;
pub use names::NameReplacementTable;
pub use parser::{load_header_ast, parse_header_ast};
pub use promote::{promote, rename_macro_refs, MacroRule};
pub use rules::{apply_rules, infer_ref_directions, NameFilter, Rule, RuleTree};
pub use types::{CsPrimitive, CsType, RefKind, UnmanagedKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Generator orchestration
//!
//! This module runs the whole pipeline for one header: the source-stage
//! rules over the parsed tree, structural mapping, the binding-stage rules
//! over the generated tree, macro promotion, and finally emission.
//!
//! The run is a single-threaded, synchronous batch transform. Any
//! error-severity diagnostic from the parser collaborator aborts the run
//! before rule application, and nothing is written to the output directory
//! unless every stage succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::binding::BindingTree;
use crate::diagnostics::{BindError, BindResult};
use crate::emit::emit_tree;
use crate::header::{HeaderCompilation, HeaderTree};
use crate::mapper::map_header;
use crate::promote::{promote, MacroRule};
use crate::rules::{apply_rules, Rule};

/// Options for one generation run.
///
/// # Example
///
/// ```
/// use chisel_bind::generator::GeneratorOptions;
///
/// let options = GeneratorOptions::new("SteamAudio", "IPL")
///     .output_file("IPL.Generated.cs")
///     .dll_import("Library");
/// assert_eq!(options.output_file, "IPL.Generated.cs");
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Namespace wrapping every generated declaration.
    pub namespace: String,
    /// Static container class receiving the method stubs.
    pub class: String,
    /// Output file name, relative to the output directory.
    pub output_file: String,
    /// Identifier passed to `[DllImport]`; the consumer defines it as a
    /// string constant naming the native library.
    pub dll_import: String,
}

impl GeneratorOptions {
    /// Create options for the given namespace and container class.
    ///
    /// The output file defaults to `<class>.Generated.cs` and the dll
    /// import identifier to `Library`.
    pub fn new(namespace: impl Into<String>, class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            namespace: namespace.into(),
            output_file: format!("{class}.Generated.cs"),
            class,
            dll_import: "Library".to_string(),
        }
    }

    /// Set the output file name.
    pub fn output_file(mut self, file: impl Into<String>) -> Self {
        self.output_file = file.into();
        self
    }

    /// Set the dll import identifier.
    pub fn dll_import(mut self, name: impl Into<String>) -> Self {
        self.dll_import = name.into();
        self
    }
}

/// Result of a successful generation run.
#[derive(Debug)]
pub struct GenerateOutput {
    /// Generated files, in emission order.
    pub files: Vec<PathBuf>,
    /// Number of live declarations in the generated tree.
    pub symbol_count: usize,
}

/// Configured binding generator.
///
/// Rules are registered in application order; see [`crate::rules`] for the
/// ordering contract.
pub struct Generator {
    options: GeneratorOptions,
    source_rules: Vec<Rule<HeaderTree>>,
    binding_rules: Vec<Rule<BindingTree>>,
    macro_rules: Vec<MacroRule>,
}

impl Generator {
    /// Create a generator with no rules registered.
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            source_rules: Vec::new(),
            binding_rules: Vec::new(),
            macro_rules: Vec::new(),
        }
    }

    /// Register a rule applied to the source tree before mapping.
    pub fn source_rule(mut self, rule: Rule<HeaderTree>) -> Self {
        self.source_rules.push(rule);
        self
    }

    /// Register a rule applied to the generated tree after mapping.
    pub fn binding_rule(mut self, rule: Rule<BindingTree>) -> Self {
        self.binding_rules.push(rule);
        self
    }

    /// Register a macro promotion rule.
    pub fn macro_rule(mut self, rule: MacroRule) -> Self {
        self.macro_rules.push(rule);
        self
    }

    /// Borrow the configured options.
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Run the pipeline and write the generated files under `output_dir`.
    ///
    /// Fails without writing anything if the compilation carries
    /// error-severity diagnostics (they are enumerated to the operator
    /// first) or if the output directory cannot be written.
    pub fn generate(
        mut self,
        compilation: HeaderCompilation,
        output_dir: &Path,
    ) -> BindResult<GenerateOutput> {
        if compilation.diagnostics.has_errors() {
            compilation.diagnostics.print_errors();
            return Err(BindError::Conversion(compilation.diagnostics.error_count()));
        }

        let HeaderCompilation {
            mut tree, macros, ..
        } = compilation;

        apply_rules(&mut tree, &mut self.source_rules);
        debug!(rules = self.source_rules.len(), "source rules applied");

        let mut binding = map_header(
            &tree,
            &self.options.output_file,
            &self.options.namespace,
            &self.options.class,
        );

        apply_rules(&mut binding, &mut self.binding_rules);
        debug!(rules = self.binding_rules.len(), "binding rules applied");

        promote(&mut binding, &self.options.namespace, &macros, &self.macro_rules);

        // Render everything before touching the filesystem so a failure
        // cannot leave partial output behind.
        let rendered = emit_tree(&binding, &self.options.dll_import);

        fs::create_dir_all(output_dir)?;
        let mut files = Vec::with_capacity(rendered.len());
        for unit in rendered {
            let path = output_dir.join(&unit.path);
            fs::write(&path, unit.content)?;
            files.push(path);
        }

        let symbol_count = binding.live_count();
        info!(
            files = files.len(),
            symbols = symbol_count,
            "generation complete"
        );

        Ok(GenerateOutput {
            files,
            symbol_count,
        })
    }
}

//! chisel: generate C# bindings for a native audio library header.
//!
//! Usage: `chisel <output-dir> [--ast <header-ast.json>]`
//!
//! The header AST document is produced by the external C parser; chisel
//! runs the binding profile over it and writes the generated sources into
//! the output directory.

mod profile;

use std::path::PathBuf;

use anyhow::{bail, Result};
use chisel_bind::parser::load_header_ast;

fn main() -> Result<()> {
    // Initialize tracing with env-filter support.
    // Use CHISEL_LOG env var for log level configuration, default to "info".
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("CHISEL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cmd = Command::parse(&args)?;
    tracing::debug!(
        ast = %cmd.ast.display(),
        output = %cmd.output.display(),
        "starting generation"
    );

    println!(
        "Processing '{}'...",
        cmd.ast
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cmd.ast.display().to_string())
    );

    let compilation = load_header_ast(&cmd.ast)?;
    let generator = profile::phonon();
    let output = generator.generate(compilation, &cmd.output)?;

    println!(
        "Success. Wrote {} file(s), {} symbols.",
        output.files.len(),
        output.symbol_count
    );
    Ok(())
}

/// Generator command configuration
#[derive(Debug)]
struct Command {
    /// Output directory for generated sources
    output: PathBuf,
    /// Header AST document produced by the external parser
    ast: PathBuf,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let mut output = None;
        let mut ast = PathBuf::from("include/phonon.json");

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--ast" => {
                    if i + 1 < args.len() {
                        ast = PathBuf::from(&args[i + 1]);
                        i += 2;
                    } else {
                        bail!("--ast requires a value");
                    }
                }
                arg if !arg.starts_with('-') => {
                    output = Some(PathBuf::from(arg));
                    i += 1;
                }
                _ => {
                    bail!("Unknown flag: {}", args[i]);
                }
            }
        }

        let Some(output) = output else {
            bail!("An output path must be provided in command line arguments.");
        };

        Ok(Self { output, ast })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_output_is_a_usage_error() {
        let err = Command::parse(&args(&[])).unwrap_err();
        assert!(err.to_string().contains("output path"));
    }

    #[test]
    fn test_output_and_ast_override() {
        let cmd = Command::parse(&args(&["generated", "--ast", "phonon.json"])).unwrap();
        assert_eq!(cmd.output, PathBuf::from("generated"));
        assert_eq!(cmd.ast, PathBuf::from("phonon.json"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = Command::parse(&args(&["out", "--bogus"])).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"));
    }
}

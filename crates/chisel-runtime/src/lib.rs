//! Runtime support for chisel-generated bindings
//!
//! Generated bindings import their native functions through a logical dll
//! name; this crate resolves that name to the platform-specific binary via
//! a library map file shipped next to the consuming application.
//!
//! The map is a TOML document with one `[[map]]` entry per candidate:
//!
//! ```toml
//! [[map]]
//! dll = "phonon.dll"
//! os = "linux"
//! cpu = "x86-64"
//! wordsize = "64"
//! target = "libphonon.so"
//! ```
//!
//! `os`, `cpu`, and `wordsize` are optional; an absent attribute matches
//! any host. Resolution requires exactly one candidate for the current
//! host: zero or several is an error naming the dll and the candidate
//! count, so a broken map fails loudly instead of loading the wrong
//! binary.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Result type for chisel-runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised while loading or resolving a library map
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// IO error reading the map file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed map document
    #[error("library map parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Resolution did not produce exactly one candidate
    #[error("found {candidates} possible mapping candidates for dll '{dll}'")]
    Resolve {
        /// The logical dll name being resolved.
        dll: String,
        /// How many entries matched the current host.
        candidates: usize,
    },
}

/// The current host's os/cpu/wordsize combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTriple {
    /// Operating system: `windows`, `linux`, `osx`, or `freebsd`.
    pub os: String,
    /// Processor: `x86`, `x86-64`, `arm`, or `armv8`.
    pub cpu: String,
    /// Pointer width in bits: `32` or `64`.
    pub wordsize: String,
}

impl HostTriple {
    /// Build a triple explicitly (useful for tests and cross-resolution).
    pub fn new(
        os: impl Into<String>,
        cpu: impl Into<String>,
        wordsize: impl Into<String>,
    ) -> Self {
        Self {
            os: os.into(),
            cpu: cpu.into(),
            wordsize: wordsize.into(),
        }
    }

    /// Detect the running host.
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "osx",
            other => other,
        };
        let cpu = match std::env::consts::ARCH {
            "x86" => "x86",
            "arm" => "arm",
            "aarch64" => "armv8",
            _ => "x86-64",
        };
        let wordsize = if cfg!(target_pointer_width = "64") {
            "64"
        } else {
            "32"
        };
        Self::new(os, cpu, wordsize)
    }
}

/// One `[[map]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryMapping {
    /// Logical dll name the binding imports.
    pub dll: String,
    /// Operating system filter; absent matches any.
    #[serde(default)]
    pub os: Option<String>,
    /// Processor filter; absent matches any.
    #[serde(default)]
    pub cpu: Option<String>,
    /// Word-size filter; absent matches any.
    #[serde(default)]
    pub wordsize: Option<String>,
    /// Path of the native binary to load.
    pub target: String,
}

impl LibraryMapping {
    fn matches(&self, dll: &str, host: &HostTriple) -> bool {
        self.dll.eq_ignore_ascii_case(dll)
            && attr_matches(self.os.as_deref(), &host.os)
            && attr_matches(self.cpu.as_deref(), &host.cpu)
            && attr_matches(self.wordsize.as_deref(), &host.wordsize)
    }
}

fn attr_matches(attr: Option<&str>, value: &str) -> bool {
    match attr {
        Some(attr) => attr.eq_ignore_ascii_case(value),
        None => true,
    }
}

/// Parsed library map document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryMap {
    /// Candidate entries, in document order.
    #[serde(default, rename = "map")]
    pub maps: Vec<LibraryMapping>,
}

impl LibraryMap {
    /// Parse a map from TOML text.
    pub fn parse(text: &str) -> RuntimeResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a map from a file.
    pub fn load(path: &Path) -> RuntimeResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Resolve a logical dll name to the native binary path for `host`.
    ///
    /// Exactly one entry must match; zero or more than one is a
    /// [`RuntimeError::Resolve`].
    pub fn resolve(&self, dll: &str, host: &HostTriple) -> RuntimeResult<&str> {
        let candidates: Vec<&LibraryMapping> = self
            .maps
            .iter()
            .filter(|m| m.matches(dll, host))
            .collect();

        match candidates.as_slice() {
            [single] => {
                debug!(dll, target = single.target.as_str(), "library resolved");
                Ok(&single.target)
            }
            _ => Err(RuntimeError::Resolve {
                dll: dll.to_string(),
                candidates: candidates.len(),
            }),
        }
    }
}

//! Dynamic loading of compiled tree-sitter grammar artifacts.
//!
//! This crate implements the runtime side of graft's load check: an
//! artifact is opened as a shared library, its `tree_sitter_<name>` entry
//! point is resolved and called, and the resulting [`Language`] is checked
//! for ABI compatibility with the linked tree-sitter runtime. The returned
//! handle keeps the library mapped for as long as the language is alive.
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::path::PathBuf;

use graft::{CompiledGrammarArtifact, LanguageLoader};
use libloading::{Library, Symbol};
use thiserror::Error;
use tree_sitter::{Language, LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION};
use tree_sitter_language::LanguageFn;

/// Errors raised while turning an artifact into a language handle.
///
/// At the check boundary these all collapse into a single
/// [`GrammarLoadFailure`](graft::GrammarLoadFailure); the variants exist so
/// the underlying cause stays legible in logs and failure causes.
#[derive(Debug, Error)]
pub enum DylibError {
    /// The artifact could not be opened as a shared library at all.
    #[error("failed to open grammar library {path:?}: {source}")]
    Open {
        /// The artifact location that was passed to the dynamic linker.
        path: PathBuf,
        /// The dynamic linker's own error.
        source: libloading::Error,
    },

    /// The library loaded but does not export the grammar entry point.
    #[error("grammar entry point `{symbol}` not found: {source}")]
    EntryPoint {
        /// The symbol that was looked up.
        symbol: String,
        /// The dynamic linker's own error.
        source: libloading::Error,
    },

    /// The grammar was generated against an incompatible runtime ABI.
    #[error("grammar ABI version {found} is outside the supported range {min}..={max}")]
    AbiVersion {
        /// The ABI version the grammar reports.
        found: usize,
        /// The oldest ABI version the linked runtime accepts.
        min: usize,
        /// The newest ABI version the linked runtime accepts.
        max: usize,
    },
}

/// A successfully loaded grammar.
///
/// Owns both the [`Language`] and the library it was resolved from, so the
/// language's parse tables stay mapped for the handle's lifetime. Dropping
/// the handle releases both.
pub struct LanguageHandle {
    // declared before the library: the language's destructor runs code that
    // lives in the mapped library, so it must drop first
    language: Language,
    _library: Library,
}

impl LanguageHandle {
    /// The loaded tree-sitter language.
    #[must_use]
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The ABI version the grammar was generated with.
    #[must_use]
    pub fn abi_version(&self) -> usize {
        self.language.abi_version()
    }
}

/// The exported entry-point symbol for a grammar name.
///
/// Generated grammars export `tree_sitter_<name>`, with `-` mapped to `_`.
#[must_use]
pub fn entry_point(name: &str) -> String {
    format!("tree_sitter_{}", name.replace('-', "_"))
}

/// A [`LanguageLoader`] that opens artifacts with the system dynamic linker.
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl DylibLoader {
    /// Creates a loader. The loader is stateless; every load stands alone.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LanguageLoader for DylibLoader {
    type Handle = LanguageHandle;
    type Error = DylibError;

    fn load(&self, artifact: &CompiledGrammarArtifact) -> Result<LanguageHandle, DylibError> {
        let library = unsafe { Library::new(artifact.path()) }.map_err(|source| {
            tracing::warn!(grammar = artifact.name(), "failed to open grammar library");
            DylibError::Open {
                path: artifact.path().to_path_buf(),
                source,
            }
        })?;

        let symbol = entry_point(artifact.name());
        let language = unsafe {
            let entry: Symbol<unsafe extern "C" fn() -> *const ()> = library
                .get(symbol.as_bytes())
                .map_err(|source| {
                    tracing::warn!(
                        grammar = artifact.name(),
                        symbol = symbol.as_str(),
                        "grammar entry point not found"
                    );
                    DylibError::EntryPoint {
                        symbol: symbol.clone(),
                        source,
                    }
                })?;
            Language::new(LanguageFn::from_raw(*entry))
        };

        let abi = language.abi_version();
        if !(MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&abi) {
            tracing::warn!(grammar = artifact.name(), abi, "grammar ABI version out of range");
            return Err(DylibError::AbiVersion {
                found: abi,
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            });
        }

        tracing::debug!(grammar = artifact.name(), abi, "grammar loaded");
        Ok(LanguageHandle {
            language,
            _library: library,
        })
    }
}

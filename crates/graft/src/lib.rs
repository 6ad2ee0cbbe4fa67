//! Load verification for compiled tree-sitter grammar artifacts.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// Core structures describing compiled grammar artifacts.
///
/// This module defines how Graft refers to the binary output of a grammar
/// build pipeline: an opaque artifact bound to a grammar name, and the
/// capability that supplies one artifact per grammar. Everything else in
/// the crate consumes these types.
pub mod artifact;

/// The single-shot grammar load check.
///
/// The check exists to answer exactly one question: can this artifact be
/// turned into a usable runtime language handle? Any fault raised while
/// constructing the handle collapses into one failure outcome at the check
/// boundary, so a broken artifact is reported rather than propagated.
pub mod check;

/// Grammar registration and batch verification.
///
/// The registry turns the per-grammar check into a parameterized procedure
/// run once per registered grammar, keeping one independent pass/fail
/// result per entry.
pub mod registry;

pub use artifact::{ArtifactProvider, CompiledGrammarArtifact, FileArtifact};
pub use check::{verify_grammar_loads, GrammarLoadFailure, LanguageLoader, LoadOutcome};
pub use registry::{
    parse_grammar_set, CheckReport, GrammarEntry, GrammarSet, GrammarSetError, Verifier,
};

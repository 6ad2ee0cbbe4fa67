//! Core types for describing compiled grammar artifacts.
//!
//! A compiled grammar artifact is the binary output of an external grammar
//! build pipeline (parse tables compiled into a shared library). Graft never
//! inspects its contents; it only binds the artifact to a grammar name and
//! hands it to a runtime loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::check::GrammarLoadFailure;

/// An opaque, externally produced grammar binary, identified by grammar name.
///
/// Artifacts are immutable once constructed and consumed read-only. The
/// artifact carries no parsed structure of its own; whether it actually
/// encodes a loadable grammar is only discoverable by attempting a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGrammarArtifact {
    name: String,
    path: PathBuf,
}

impl CompiledGrammarArtifact {
    /// Binds a grammar name to the location of its compiled library.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// The short name of the grammar this artifact was compiled from
    /// (e.g. `"melbi"`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The filesystem location of the compiled library.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A capability that supplies the compiled artifact for one specific grammar.
///
/// Each provider is bound to a single grammar at construction time; the load
/// check is parameterized only by which provider is injected.
pub trait ArtifactProvider {
    /// The name of the grammar this provider is bound to.
    fn grammar_name(&self) -> &str;

    /// Produces the artifact for this grammar.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarLoadFailure`] when the artifact cannot be supplied
    /// at all, for instance because the backing file is missing or
    /// unreadable.
    fn artifact(&self) -> Result<CompiledGrammarArtifact, GrammarLoadFailure>;
}

/// An [`ArtifactProvider`] backed by a compiled library on disk.
#[derive(Debug, Clone)]
pub struct FileArtifact {
    name: String,
    path: PathBuf,
}

impl FileArtifact {
    /// Binds a grammar name to the expected location of its compiled
    /// library.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl ArtifactProvider for FileArtifact {
    fn grammar_name(&self) -> &str {
        &self.name
    }

    fn artifact(&self) -> Result<CompiledGrammarArtifact, GrammarLoadFailure> {
        match fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_file() => Ok(CompiledGrammarArtifact::new(
                self.name.clone(),
                self.path.clone(),
            )),
            Ok(_) => Err(GrammarLoadFailure::new(
                &self.name,
                format!("artifact at {} is not a file", self.path.display()),
            )),
            Err(e) => Err(GrammarLoadFailure::new(
                &self.name,
                format!("artifact missing at {}: {e}", self.path.display()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_artifact_resolves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("melbi.so");
        std::fs::write(&path, b"\x7fELF").unwrap();

        let provider = FileArtifact::new("melbi", &path);
        let artifact = provider.artifact().unwrap();
        assert_eq!(artifact.name(), "melbi");
        assert_eq!(artifact.path(), path);
    }

    #[test]
    fn file_artifact_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileArtifact::new("Rhizome", dir.path().join("rhizome.so"));

        let failure = provider.artifact().unwrap_err();
        assert_eq!(failure.grammar(), "Rhizome");
        assert!(failure.cause().contains("missing"));
    }

    #[test]
    fn file_artifact_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileArtifact::new("melbi", dir.path());

        let failure = provider.artifact().unwrap_err();
        assert!(failure.cause().contains("not a file"));
    }
}

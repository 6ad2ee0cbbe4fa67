//! The single-shot grammar load check.
//!
//! This module answers one question per invocation: can a named compiled
//! grammar artifact be turned into a usable runtime language handle? The
//! check performs exactly one load attempt, holds no state between
//! invocations, and maps every fault raised during handle construction to a
//! single [`LoadFailed`](LoadOutcome::LoadFailed) outcome at the check
//! boundary, so one grammar's failure never aborts verification of another.

use std::fmt;

use crate::artifact::{ArtifactProvider, CompiledGrammarArtifact};

/// The one failure class reported by the load check.
///
/// All causes (missing artifact, version skew between the grammar compiler
/// and the runtime, corrupt tables, unexpected runtime faults) collapse into
/// this type. The `Display` text is the canonical per-grammar message
/// consumed by test harnesses; the underlying cause is retained for
/// diagnostics but not distinguished at the check surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarLoadFailure {
    grammar: String,
    cause: String,
}

impl GrammarLoadFailure {
    /// Records a load failure for the named grammar with a collapsed cause.
    #[must_use]
    pub fn new(grammar: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            grammar: grammar.into(),
            cause: cause.into(),
        }
    }

    /// The name of the grammar that failed to load.
    #[must_use]
    pub fn grammar(&self) -> &str {
        &self.grammar
    }

    /// The collapsed description of what went wrong.
    #[must_use]
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

impl fmt::Display for GrammarLoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error loading {} Language Parser grammar", self.grammar)
    }
}

impl std::error::Error for GrammarLoadFailure {}

/// The consumed runtime interface: load an artifact, or fail.
///
/// Implementations own the handle type and decide what "loaded" means; the
/// check itself only observes whether construction succeeds and discards
/// the handle immediately afterwards.
pub trait LanguageLoader {
    /// A successfully constructed runtime language handle.
    type Handle;

    /// The loader's own error type, collapsed into [`GrammarLoadFailure`]
    /// at the check boundary.
    type Error: fmt::Display;

    /// Attempts to construct a language handle from the artifact.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when the artifact cannot be turned into a
    /// handle, whatever the cause.
    fn load(&self, artifact: &CompiledGrammarArtifact) -> Result<Self::Handle, Self::Error>;
}

/// The two terminal outcomes of one load check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A handle was constructed (and has already been released).
    Loaded,

    /// No handle could be constructed.
    LoadFailed(GrammarLoadFailure),
}

impl LoadOutcome {
    /// Returns `true` if the artifact yielded a handle.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded)
    }

    /// The failure, if the load did not succeed.
    #[must_use]
    pub fn failure(&self) -> Option<&GrammarLoadFailure> {
        match self {
            LoadOutcome::Loaded => None,
            LoadOutcome::LoadFailed(failure) => Some(failure),
        }
    }
}

/// Verifies that the provider's grammar artifact yields a language handle.
///
/// Exactly one load attempt is made; there is no retry. The check is
/// idempotent for an unchanged artifact and runtime, and the transient
/// handle is released before returning on both the success and failure
/// paths.
#[must_use]
pub fn verify_grammar_loads<P, L>(provider: &P, loader: &L) -> LoadOutcome
where
    P: ArtifactProvider + ?Sized,
    L: LanguageLoader + ?Sized,
{
    let artifact = match provider.artifact() {
        Ok(artifact) => artifact,
        Err(failure) => return LoadOutcome::LoadFailed(failure),
    };

    match loader.load(&artifact) {
        Ok(handle) => {
            // the check only observes construction; the handle is not kept
            drop(handle);
            LoadOutcome::Loaded
        }
        Err(cause) => LoadOutcome::LoadFailed(GrammarLoadFailure::new(
            provider.grammar_name(),
            cause.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider {
        name: &'static str,
        available: bool,
    }

    impl ArtifactProvider for StaticProvider {
        fn grammar_name(&self) -> &str {
            self.name
        }

        fn artifact(&self) -> Result<CompiledGrammarArtifact, GrammarLoadFailure> {
            if self.available {
                Ok(CompiledGrammarArtifact::new(self.name, "grammar.so"))
            } else {
                Err(GrammarLoadFailure::new(self.name, "artifact missing"))
            }
        }
    }

    /// Fails loads for the named grammars, succeeds for everything else.
    struct StubLoader {
        fail_for: &'static [&'static str],
    }

    impl LanguageLoader for StubLoader {
        type Handle = ();
        type Error = String;

        fn load(&self, artifact: &CompiledGrammarArtifact) -> Result<(), String> {
            if self.fail_for.contains(&artifact.name()) {
                Err(format!("corrupt parse tables in {}", artifact.name()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn valid_artifact_loads() {
        let provider = StaticProvider {
            name: "Melbi",
            available: true,
        };
        let loader = StubLoader { fail_for: &[] };

        let outcome = verify_grammar_loads(&provider, &loader);
        assert!(outcome.is_loaded());
        assert!(outcome.failure().is_none());
    }

    #[test]
    fn missing_artifact_fails_and_names_the_grammar() {
        let provider = StaticProvider {
            name: "Rhizome",
            available: false,
        };
        let loader = StubLoader { fail_for: &[] };

        let outcome = verify_grammar_loads(&provider, &loader);
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.grammar(), "Rhizome");
        assert_eq!(
            failure.to_string(),
            "Error loading Rhizome Language Parser grammar"
        );
    }

    #[test]
    fn loader_fault_collapses_into_load_failed() {
        let provider = StaticProvider {
            name: "Melbi",
            available: true,
        };
        let loader = StubLoader {
            fail_for: &["Melbi"],
        };

        let outcome = verify_grammar_loads(&provider, &loader);
        let failure = outcome.failure().unwrap();
        assert_eq!(
            failure.to_string(),
            "Error loading Melbi Language Parser grammar"
        );
        assert!(failure.cause().contains("corrupt parse tables"));
    }

    #[test]
    fn abi_version_skew_collapses_into_load_failed() {
        struct AbiSkewLoader;

        impl LanguageLoader for AbiSkewLoader {
            type Handle = ();
            type Error = String;

            fn load(&self, _artifact: &CompiledGrammarArtifact) -> Result<(), String> {
                Err("grammar ABI version 99 is outside the supported range 13..=15".to_owned())
            }
        }

        let provider = StaticProvider {
            name: "Melbi",
            available: true,
        };

        let outcome = verify_grammar_loads(&provider, &AbiSkewLoader);
        let failure = outcome.failure().unwrap();
        assert_eq!(
            failure.to_string(),
            "Error loading Melbi Language Parser grammar"
        );
        assert!(failure.cause().contains("ABI version"));
    }

    #[test]
    fn check_is_idempotent() {
        let provider = StaticProvider {
            name: "Melbi",
            available: true,
        };
        let loader = StubLoader {
            fail_for: &["Melbi"],
        };

        let first = verify_grammar_loads(&provider, &loader);
        let second = verify_grammar_loads(&provider, &loader);
        assert_eq!(first, second);
    }

    #[test]
    fn one_failing_grammar_does_not_affect_another() {
        let loader = StubLoader {
            fail_for: &["Melbi"],
        };
        let melbi = StaticProvider {
            name: "Melbi",
            available: true,
        };
        let rhizome = StaticProvider {
            name: "Rhizome",
            available: true,
        };

        assert!(!verify_grammar_loads(&melbi, &loader).is_loaded());
        assert!(verify_grammar_loads(&rhizome, &loader).is_loaded());
    }
}

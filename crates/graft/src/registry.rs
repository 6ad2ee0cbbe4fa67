//! Grammar registration and batch verification.
//!
//! A grammar set is declared in JSON (one entry per grammar, mirroring the
//! grammar listing a build pipeline publishes alongside its artifacts) and
//! deserialized with [`facet_json`]. The [`Verifier`] runs the load check
//! once per registered grammar against a chosen runtime loader, collecting
//! one independent pass/fail result per entry.

use facet::Facet;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::artifact::FileArtifact;
use crate::check::{verify_grammar_loads, GrammarLoadFailure, LanguageLoader, LoadOutcome};

/// The set of grammars registered for load verification.
///
/// This structure directly mirrors the serialized JSON registration format:
///
/// ```json
/// {
///     "grammars": [
///         { "name": "melbi" },
///         { "name": "rhizome", "artifact": "build/rhizome.so" }
///     ]
/// }
/// ```
#[derive(Debug, Clone, Facet)]
pub struct GrammarSet {
    /// The registered grammars, in declaration order.
    pub grammars: Vec<GrammarEntry>,
}

/// One registered grammar.
#[derive(Debug, Clone, Facet)]
pub struct GrammarEntry {
    /// The grammar's short name (e.g. `"melbi"`), which also names the
    /// artifact's runtime entry point.
    pub name: String,

    /// Optional artifact location relative to the verification root.
    /// Defaults to `<name>` with the platform's shared-library suffix.
    #[facet(default)]
    pub artifact: Option<String>,
}

/// Parse a JSON grammar registration into a typed [`GrammarSet`].
///
/// # Errors
///
/// Returns [`GrammarSetError::JsonParse`] if the provided string is not
/// valid JSON or fails schema deserialization.
pub fn parse_grammar_set(json: &str) -> Result<GrammarSet, GrammarSetError> {
    facet_json::from_str(json).map_err(|e| GrammarSetError::JsonParse(e.to_string()))
}

/// Possible errors raised while registering grammars for verification.
#[derive(Debug)]
pub enum GrammarSetError {
    /// The input JSON was syntactically invalid or structurally mismatched.
    JsonParse(String),

    /// The registration declared no grammars at all.
    Empty,

    /// The same grammar name was registered more than once. Each grammar
    /// must own exactly one independent verification result.
    Duplicate(String),
}

impl fmt::Display for GrammarSetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarSetError::JsonParse(e) => write!(f, "JSON parse error: {e}"),
            GrammarSetError::Empty => write!(f, "grammar set is empty"),
            GrammarSetError::Duplicate(name) => write!(f, "duplicate grammar '{name}'"),
        }
    }
}

impl std::error::Error for GrammarSetError {}

/// Runs the load check once per registered grammar.
///
/// The verifier is bound to a root directory in which artifacts are
/// expected, following the convention of one shared library per grammar.
/// It holds no state across runs; repeated runs over unchanged artifacts
/// and an unchanged runtime report the same outcomes.
#[derive(Debug, Clone)]
pub struct Verifier {
    root: PathBuf,
    set: GrammarSet,
}

impl Verifier {
    /// Registers a validated grammar set rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarSetError::Empty`] for a set with no entries and
    /// [`GrammarSetError::Duplicate`] when a grammar name appears twice.
    pub fn new(root: impl Into<PathBuf>, set: GrammarSet) -> Result<Self, GrammarSetError> {
        if set.grammars.is_empty() {
            return Err(GrammarSetError::Empty);
        }

        let mut seen = HashSet::new();
        for entry in &set.grammars {
            if !seen.insert(entry.name.as_str()) {
                return Err(GrammarSetError::Duplicate(entry.name.clone()));
            }
        }

        Ok(Self {
            root: root.into(),
            set,
        })
    }

    /// Parses a JSON registration and registers it rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarSetError`] for malformed JSON or an invalid set.
    pub fn from_json(root: impl Into<PathBuf>, json: &str) -> Result<Self, GrammarSetError> {
        Self::new(root, parse_grammar_set(json)?)
    }

    /// The names of the registered grammars, in declaration order.
    pub fn grammar_names(&self) -> impl Iterator<Item = &str> {
        self.set.grammars.iter().map(|entry| entry.name.as_str())
    }

    fn artifact_path(&self, entry: &GrammarEntry) -> PathBuf {
        match &entry.artifact {
            Some(relative) => self.root.join(relative),
            None => self
                .root
                .join(format!("{}{}", entry.name, std::env::consts::DLL_SUFFIX)),
        }
    }

    /// Runs one load check per registered grammar.
    ///
    /// Checks are independent: a grammar that fails to load never aborts or
    /// alters the check of any other grammar in the same run.
    #[must_use]
    pub fn run<L: LanguageLoader>(&self, loader: &L) -> CheckReport {
        let results = self
            .set
            .grammars
            .iter()
            .map(|entry| {
                let provider = FileArtifact::new(&entry.name, self.artifact_path(entry));
                (entry.name.clone(), verify_grammar_loads(&provider, loader))
            })
            .collect();

        CheckReport { results }
    }
}

/// One independent load outcome per registered grammar.
///
/// The report's `Display` follows test-runner conventions: one line per
/// failed grammar, and no output at all when every grammar loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    results: Vec<(String, LoadOutcome)>,
}

impl CheckReport {
    /// Returns `true` if every registered grammar loaded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(|(_, outcome)| outcome.is_loaded())
    }

    /// The outcome recorded for the named grammar, if it was registered.
    #[must_use]
    pub fn outcome(&self, grammar: &str) -> Option<&LoadOutcome> {
        self.results
            .iter()
            .find(|(name, _)| name == grammar)
            .map(|(_, outcome)| outcome)
    }

    /// The failures recorded in this run, in registration order.
    pub fn failures(&self) -> impl Iterator<Item = &GrammarLoadFailure> {
        self.results
            .iter()
            .filter_map(|(_, outcome)| outcome.failure())
    }

    /// Iterates over `(grammar name, outcome)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LoadOutcome)> {
        self.results
            .iter()
            .map(|(name, outcome)| (name.as_str(), outcome))
    }

    /// The number of grammars checked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if no grammars were checked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for failure in self.failures() {
            writeln!(f, "{failure}")?;
        }
        Ok(())
    }
}

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::cycles::CycleSignature;
use crate::cycles::strategy::FixStrategy;

/// Where a diagnostic points: the import statement that closes the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: PathBuf,
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
}

/// One reported circular dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub location: Location,
    pub strategy: FixStrategy,
    /// `a.ts -> b.ts -> a.ts`, starting at the linted file, root-relative.
    pub cycle_display: String,
    pub suggested_fix: String,
    pub message: String,
    /// The specifier of the anchoring import, as written.
    pub specifier: String,
    pub signature: CycleSignature,
}

impl Diagnostic {
    pub fn message_for(cycle_display: &str) -> String {
        format!("Circular dependency detected: {cycle_display}")
    }
}

/// Deduplicates diagnostics by cycle signature for one run.
#[derive(Debug, Default)]
pub struct Reporter {
    reported: HashSet<CycleSignature>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reported(&self, signature: &CycleSignature) -> bool {
        self.reported.contains(signature)
    }

    /// Accept `diagnostic` unless its cycle has already been reported.
    pub fn report(&mut self, diagnostic: Diagnostic) -> Option<Diagnostic> {
        if self.reported.insert(diagnostic.signature.clone()) {
            Some(diagnostic)
        } else {
            None
        }
    }

    /// Distinct cycles reported so far.
    pub fn count(&self) -> usize {
        self.reported.len()
    }
}

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed or contradictory lineage
    BadLineage,
    /// Malformed marriage
    BadMarriage,
    /// Malformed sibship, or siblings linked to two different families
    BadSibship,
    /// A member was re-declared with the opposite sex
    BadGender,
    /// A sex was filled in from a mate
    GenderInferred,
    /// Both parents of a family have the same sex
    SameSexMarriage,
    /// Both parents of a family have a missing sex
    NoSexParents,
    /// An odd cycle in the marriage graph
    BadMarriageLoop,
    UnresolvedLineage,
    UnresolvedMarriage,
    UnresolvedSibship,
}

impl DiagnosticKind {
    pub fn is_warning(self) -> bool {
        matches!(
            self,
            Self::GenderInferred
                | Self::UnresolvedLineage
                | Self::UnresolvedMarriage
                | Self::UnresolvedSibship
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub names: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, names: &[&str]) -> Self {
        Self {
            kind,
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn name(&self, i: usize) -> &str {
        self.names.get(i).map_or("", String::as_str)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use DiagnosticKind::*;
        match self.kind {
            BadLineage => write!(f, "Bad lineage: {}", self.names.join(", ")),
            BadMarriage => write!(f, "Bad marriage: {}", self.names.join(", ")),
            BadSibship => write!(f, "Bad sibship: {}", self.names.join(", ")),
            BadGender => write!(
                f,
                "Member {} declared {} and then {}",
                self.name(0),
                self.name(1),
                self.name(2)
            ),
            GenderInferred => write!(f, "Sex of {} inferred as {}", self.name(0), self.name(1)),
            SameSexMarriage => write!(
                f,
                "Mates {} and {} are both {}",
                self.name(0),
                self.name(1),
                self.name(2)
            ),
            NoSexParents => write!(
                f,
                "Mates {} and {} both have a missing sex",
                self.name(0),
                self.name(1)
            ),
            BadMarriageLoop => write!(
                f,
                "Marriage loop through {} cannot be sexed consistently",
                self.name(0)
            ),
            UnresolvedLineage => write!(f, "Unresolved lineage: {}", self.names.join(", ")),
            UnresolvedMarriage => write!(f, "Unresolved marriage: {}", self.names.join(", ")),
            UnresolvedSibship => write!(f, "Unresolved sibship: {}", self.names.join(", ")),
        }
    }
}

/// Ordered error and warning lists. Identical records are kept once.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: IndexSet<Diagnostic>,
    warnings: IndexSet<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("{diagnostic}");
        match diagnostic.kind.is_warning() {
            true => self.warnings.insert(diagnostic),
            false => self.errors.insert(diagnostic),
        };
    }

    pub fn record(&mut self, kind: DiagnosticKind, names: &[&str]) {
        self.push(Diagnostic::new(kind, names));
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.warnings.iter()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Number of errors and warnings of a given kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(|d| d.kind == kind)
            .count()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.warnings.clear();
    }
}

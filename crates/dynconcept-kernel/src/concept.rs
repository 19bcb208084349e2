//! Concepts and their clauses.
//!
//! A concept is an ordered, immutable list of clauses. Each clause is either
//! a required operation (a name and its [`Signature`]) or a refinement of
//! another concept, referenced by its [`ConceptId`]. The clause tag is the
//! only thing later stages branch on.

use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a declared concept.
///
/// Issued by a [`Catalog`](crate::catalog::Catalog), one per declaration.
/// Two concepts with structurally equal clause lists still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConceptId(pub(crate) usize);

impl ConceptId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which kind of requirement a clause carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Operation,
    Refinement,
}

/// One requirement within a concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    /// A named operation with its call shape.
    Operation { name: String, signature: Signature },

    /// Everything the referenced concept requires.
    Refines(ConceptId),
}

impl Clause {
    pub fn operation(name: impl Into<String>, signature: Signature) -> Self {
        Self::Operation {
            name: name.into(),
            signature,
        }
    }

    pub fn kind(&self) -> ClauseKind {
        match self {
            Self::Operation { .. } => ClauseKind::Operation,
            Self::Refines(_) => ClauseKind::Refinement,
        }
    }

    /// The refined concept, if this is a refinement clause.
    pub fn refined(&self) -> Option<ConceptId> {
        match self {
            Self::Refines(id) => Some(*id),
            Self::Operation { .. } => None,
        }
    }
}

impl From<ConceptId> for Clause {
    fn from(id: ConceptId) -> Self {
        Self::Refines(id)
    }
}

impl<N: Into<String>> From<(N, Signature)> for Clause {
    fn from((name, signature): (N, Signature)) -> Self {
        Self::operation(name, signature)
    }
}

/// Build a clause list from any mixture of concept ids and
/// `(name, signature)` pairs, preserving argument order.
///
/// ```
/// use dynconcept_kernel::{Catalog, Signature, clauses};
///
/// let mut catalog = Catalog::new();
/// let sig = |s: &str| s.parse::<Signature>().unwrap();
/// let incrementable = catalog.declare("Incrementable", clauses![("increment", sig("(T&) -> void"))]);
/// let iterator = catalog.declare(
///     "Iterator",
///     clauses![incrementable, ("dereference", sig("(T&) -> Reference"))],
/// );
/// assert_eq!(catalog.direct_refinements(iterator).unwrap(), vec![incrementable]);
/// ```
#[macro_export]
macro_rules! clauses {
    ($($clause:expr),* $(,)?) => {
        ::std::vec![$($crate::Clause::from($clause)),*]
    };
}

/// A declared concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Concept {
    id: ConceptId,
    name: String,
    clauses: Vec<Clause>,
}

impl Concept {
    pub(crate) fn new(id: ConceptId, name: String, clauses: Vec<Clause>) -> Self {
        Self { id, name, clauses }
    }

    pub fn id(&self) -> ConceptId {
        self.id
    }

    /// Human-readable label; not part of identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The concept's own clauses, unexpanded, in declaration order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Concepts this one refines directly, in declaration order.
    ///
    /// Does not descend into the refined concepts' own refinements.
    pub fn refinements(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.clauses.iter().filter_map(Clause::refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> Signature {
        s.parse().unwrap()
    }

    #[test]
    fn clause_kind_is_fixed_by_construction() {
        let op = Clause::from(("increment", sig("(T&) -> void")));
        let refine = Clause::from(ConceptId(3));
        assert_eq!(op.kind(), ClauseKind::Operation);
        assert_eq!(refine.kind(), ClauseKind::Refinement);
        assert_eq!(op.refined(), None);
        assert_eq!(refine.refined(), Some(ConceptId(3)));
    }

    #[test]
    fn macro_preserves_argument_order() {
        let clauses = clauses![
            ConceptId(0),
            ("x", sig("(T&) -> void")),
            ConceptId(1),
        ];
        let kinds: Vec<_> = clauses.iter().map(Clause::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ClauseKind::Refinement,
                ClauseKind::Operation,
                ClauseKind::Refinement
            ]
        );
    }

    #[test]
    fn refinements_are_one_level_in_order() {
        let concept = Concept::new(
            ConceptId(5),
            "C".into(),
            clauses![ConceptId(2), ("f", sig("() -> void")), ConceptId(1)],
        );
        let refined: Vec<_> = concept.refinements().collect();
        assert_eq!(refined, vec![ConceptId(2), ConceptId(1)]);
    }
}

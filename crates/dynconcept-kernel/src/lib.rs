//! # dynconcept Kernel
//!
//! Declaration-time concept composition and signature resolution.
//!
//! A concept is a named, ordered set of requirements: operations with a call
//! signature, and refinements of other concepts. The kernel turns any concept,
//! however deeply it refines others, into one flat table of operation name →
//! signature, rejecting name collisions and cyclic refinement. That table is
//! what an external dispatch-table generator lays out for type-erased values.
//!
//! Nothing here runs at call time and nothing here checks that a concrete
//! type models a concept.
//!
//! ## Architecture
//!
//! ```text
//! Signature             ← Call shape: (params) -> ret, compared by value
//!     │
//! Clause                ← Operation(name, Signature) | Refines(ConceptId)
//!     │
//! Concept / Catalog     ← Ordered clauses behind a declaration identity
//!     │
//! flatten               ← Depth-first inlining of refinements, cycle-checked
//!     │
//! ResolvedTable         ← Unique names → Signature, cached per identity
//! ```
//!
//! ## Example
//!
//! ```
//! use dynconcept_kernel::{Catalog, Signature, clauses};
//!
//! let sig = |s: &str| s.parse::<Signature>().unwrap();
//! let mut catalog = Catalog::new();
//! let incrementable =
//!     catalog.declare("Incrementable", clauses![("increment", sig("(T&) -> void"))]);
//! let iterator = catalog.declare(
//!     "Iterator",
//!     clauses![incrementable, ("dereference", sig("(T&) -> Reference"))],
//! );
//!
//! let table = catalog.resolved_table(iterator).unwrap();
//! assert_eq!(table.names().collect::<Vec<_>>(), ["increment", "dereference"]);
//! assert_eq!(catalog.signature_of(iterator, "increment").unwrap(), sig("(T&) -> void"));
//! assert_eq!(catalog.direct_refinements(iterator).unwrap(), [incrementable]);
//! ```

pub mod catalog;
pub mod concept;
pub mod config;
pub mod error;
pub mod flatten;
pub mod resolve;
pub mod signature;

pub use catalog::Catalog;
pub use concept::{Clause, ClauseKind, Concept, ConceptId};
pub use config::{DiamondPolicy, ResolveOptions};
pub use error::{ConceptError, ConfigError};
pub use flatten::{ConceptSource, Operation};
pub use resolve::{ResolvedTable, TableDigest};
pub use signature::{Passing, Signature, TypeDesc};

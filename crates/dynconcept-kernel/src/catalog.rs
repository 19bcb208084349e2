//! The concept catalog.
//!
//! A [`Catalog`] owns every declared concept and hands out their identities.
//! Declaration needs `&mut Catalog`; every query takes `&Catalog`. Once the
//! declaration phase is over a catalog can be shared across threads freely.
//!
//! Each concept slot caches its resolution outcome, table or error, the first
//! time it is asked for. Concurrent first requests may race to compute it;
//! resolution is deterministic and side-effect free, so whichever result is
//! stored is the one every reader sees.

use crate::concept::{Clause, Concept, ConceptId};
use crate::config::ResolveOptions;
use crate::error::{ConceptError, ConfigError};
use crate::flatten::{self, ConceptSource, Operation};
use crate::resolve::ResolvedTable;
use crate::signature::Signature;
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
struct Slot {
    name: String,

    /// `None` while reserved but not yet defined.
    concept: Option<Concept>,

    resolved: OnceLock<Result<Arc<ResolvedTable>, ConceptError>>,
}

impl Slot {
    fn new(name: String, concept: Option<Concept>) -> Self {
        Self {
            name,
            concept,
            resolved: OnceLock::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    options: ResolveOptions,
    slots: Vec<Slot>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty catalog resolving under `options`, which must validate.
    pub fn with_options(options: ResolveOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            options,
            slots: Vec::new(),
        })
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Number of declared (or reserved) concepts.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn next_id(&self) -> ConceptId {
        ConceptId(self.slots.len())
    }

    /// Declare a new concept with the given clauses, in order.
    ///
    /// Never fails: clauses are validated when the concept is resolved.
    pub fn declare(&mut self, name: impl Into<String>, clauses: Vec<Clause>) -> ConceptId {
        let id = self.next_id();
        let name = name.into();
        tracing::trace!(concept = %name, %id, clauses = clauses.len(), "declared concept");
        let concept = Concept::new(id, name.clone(), clauses);
        self.slots.push(Slot::new(name, Some(concept)));
        id
    }

    /// Reserve an identity whose clauses are supplied later by [`define`].
    ///
    /// This is how a concept can be referenced before it exists, including by
    /// its own clauses.
    ///
    /// [`define`]: Catalog::define
    pub fn reserve(&mut self, name: impl Into<String>) -> ConceptId {
        let id = self.next_id();
        let name = name.into();
        tracing::trace!(concept = %name, %id, "reserved concept");
        self.slots.push(Slot::new(name, None));
        id
    }

    /// Give a reserved concept its clauses. A concept is defined once.
    ///
    /// Cached resolutions are dropped: any of them may have run into the
    /// concept while it was still undefined.
    pub fn define(&mut self, id: ConceptId, clauses: Vec<Clause>) -> Result<(), ConceptError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(ConceptError::UnknownConcept(id))?;
        if slot.concept.is_some() {
            return Err(ConceptError::AlreadyDefined {
                concept: slot.name.clone(),
            });
        }
        tracing::trace!(concept = %slot.name, %id, clauses = clauses.len(), "defined concept");
        slot.concept = Some(Concept::new(id, slot.name.clone(), clauses));

        let stale = self
            .slots
            .iter_mut()
            .filter_map(|slot| slot.resolved.take())
            .count();
        if stale > 0 {
            tracing::trace!(%id, stale, "dropped cached resolutions");
        }
        Ok(())
    }

    pub fn concept(&self, id: ConceptId) -> Result<&Concept, ConceptError> {
        self.lookup(id)
    }

    pub fn name(&self, id: ConceptId) -> Option<&str> {
        self.slots.get(id.index()).map(|slot| slot.name.as_str())
    }

    /// The full transitive requirement set of `id`.
    ///
    /// Computed on first use and cached; later calls return the same `Arc`,
    /// or the same error.
    pub fn resolved_table(&self, id: ConceptId) -> Result<Arc<ResolvedTable>, ConceptError> {
        let slot = self
            .slots
            .get(id.index())
            .ok_or(ConceptError::UnknownConcept(id))?;
        slot.resolved
            .get_or_init(|| self.resolve_uncached(id, &slot.name))
            .clone()
    }

    fn resolve_uncached(
        &self,
        id: ConceptId,
        name: &str,
    ) -> Result<Arc<ResolvedTable>, ConceptError> {
        let outcome = self
            .flatten(id)
            .and_then(|flattened| ResolvedTable::build(self, id, flattened));
        match &outcome {
            Ok(table) => tracing::debug!(
                concept = %name,
                operations = table.len(),
                digest = %table.digest(),
                "resolved concept table"
            ),
            Err(err) => tracing::warn!(
                concept = %name,
                kind = err.kind(),
                error = %err,
                "concept failed to resolve"
            ),
        }
        outcome.map(Arc::new)
    }

    /// The signature `id` requires for `operation`.
    pub fn signature_of(&self, id: ConceptId, operation: &str) -> Result<Signature, ConceptError> {
        let table = self.resolved_table(id)?;
        table
            .signature_of(&self.label(id), operation)
            .map(Clone::clone)
    }

    /// Concepts `id` refines directly, in declaration order.
    pub fn direct_refinements(&self, id: ConceptId) -> Result<Vec<ConceptId>, ConceptError> {
        Ok(self.lookup(id)?.refinements().collect())
    }

    /// The flattened clause sequence of `id`, before uniqueness checking.
    pub fn flatten(&self, id: ConceptId) -> Result<Vec<Operation>, ConceptError> {
        flatten::flatten(self, id, &self.options)
    }

    /// Every concept `id` refines, directly or transitively, each once.
    pub fn refinement_closure(&self, id: ConceptId) -> Result<Vec<ConceptId>, ConceptError> {
        flatten::refinement_closure(self, id, self.options.max_refinement_depth)
    }

    /// Resolve every concept, returning the failures in declaration order.
    pub fn validate_all(&self) -> Vec<(ConceptId, ConceptError)> {
        (0..self.slots.len())
            .map(ConceptId)
            .filter_map(|id| self.resolved_table(id).err().map(|err| (id, err)))
            .collect()
    }
}

impl ConceptSource for Catalog {
    fn lookup(&self, id: ConceptId) -> Result<&Concept, ConceptError> {
        let slot = self
            .slots
            .get(id.index())
            .ok_or(ConceptError::UnknownConcept(id))?;
        slot.concept
            .as_ref()
            .ok_or_else(|| ConceptError::UndefinedConcept {
                concept: slot.name.clone(),
            })
    }

    fn label(&self, id: ConceptId) -> String {
        self.name(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }
}

//! Refinement flattening.
//!
//! Expanding a concept walks its clauses in declaration order. An operation
//! clause yields itself; a refinement clause is replaced, in place, by the
//! full expansion of the refined concept. The result is one flat ordered
//! sequence of operations:
//!
//! ```text
//! A = [a1, a2]
//! B = [A, b1]          expand(B) = [a1, a2, b1]
//! C = [c0, B, c1]      expand(C) = [c0, a1, a2, b1, c1]
//! ```
//!
//! The walk keeps the chain of concepts currently being expanded. Meeting a
//! concept that is already on that chain is a cycle.
//!
//! A concept is expanded in full at most once per walk. Reaching it again:
//!
//! - contributes nothing if its expansion was empty;
//! - under [`DiamondPolicy::MergeIdentical`], contributes nothing if it is
//!   reached along a chain of concepts not seen before (a diamond);
//! - otherwise repeats its first operation and ends the walk, since the
//!   resolver must reject that repeat and nothing after it can change the
//!   outcome.
//!
//! Each walk therefore visits every refinement edge once.

use crate::concept::{Clause, Concept, ConceptId};
use crate::config::{DiamondPolicy, ResolveOptions};
use crate::error::ConceptError;
use crate::signature::Signature;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Where flattening looks up concepts by id.
///
/// Kept minimal: a source only needs to hand out defined concepts and a
/// label for diagnostics.
pub trait ConceptSource {
    /// The defined concept behind `id`.
    fn lookup(&self, id: ConceptId) -> Result<&Concept, ConceptError>;

    /// A display label for `id`, available even when it is undefined.
    fn label(&self, id: ConceptId) -> String;
}

/// One entry of a flattened clause sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub name: String,
    pub signature: Signature,

    /// The concept whose own clause declared this operation.
    pub origin: ConceptId,
}

/// Expand every refinement of `root`, depth-first, in declaration order.
///
/// The sequence stops right after the first repeat that is bound to collide;
/// diamond repeats are left out under `MergeIdentical`.
pub fn flatten<S: ConceptSource + ?Sized>(
    source: &S,
    root: ConceptId,
    options: &ResolveOptions,
) -> Result<Vec<Operation>, ConceptError> {
    let mut walk = Walk::new(source, root, options.max_refinement_depth);
    walk.policy = options.diamond_policy;
    let mut out = Vec::new();
    walk.expand_concept(root, &mut out)?;
    Ok(out)
}

/// Every concept `root` refines, directly or transitively.
///
/// Depth-first pre-order; a concept reachable along several paths is listed
/// once, at its first occurrence. `root` itself is not included.
pub fn refinement_closure<S: ConceptSource + ?Sized>(
    source: &S,
    root: ConceptId,
    max_depth: usize,
) -> Result<Vec<ConceptId>, ConceptError> {
    let mut walk = Walk::new(source, root, max_depth);
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk.collect_refinements(root, &mut seen, &mut out)?;
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Halt,
}

/// A concept already expanded in full during this walk.
struct Expansion {
    /// Concept chains (root first, the concept last) it was reached by.
    chains: HashSet<Vec<ConceptId>>,

    /// Index in the output of the first operation it produced.
    first: Option<usize>,
}

struct Walk<'a, S: ?Sized> {
    source: &'a S,
    root: ConceptId,
    max_depth: usize,
    policy: DiamondPolicy,
    path: Vec<ConceptId>,
    expanded: HashMap<ConceptId, Expansion>,
}

impl<'a, S: ConceptSource + ?Sized> Walk<'a, S> {
    fn new(source: &'a S, root: ConceptId, max_depth: usize) -> Self {
        Self {
            source,
            root,
            max_depth,
            policy: DiamondPolicy::Reject,
            path: Vec::new(),
            expanded: HashMap::new(),
        }
    }

    /// Push `id` onto the expansion chain.
    fn enter(&mut self, id: ConceptId) -> Result<&'a Concept, ConceptError> {
        let source: &'a S = self.source;

        if let Some(start) = self.path.iter().position(|&on_path| on_path == id) {
            let mut path: Vec<String> = self.path[start..]
                .iter()
                .map(|&on_path| source.label(on_path))
                .collect();
            path.push(source.label(id));
            return Err(ConceptError::CyclicRefinement { path });
        }
        if self.path.len() >= self.max_depth {
            return Err(ConceptError::RefinementTooDeep {
                concept: source.label(self.root),
                limit: self.max_depth,
            });
        }

        let concept = source.lookup(id)?;
        self.path.push(id);
        Ok(concept)
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn expand_concept(
        &mut self,
        id: ConceptId,
        out: &mut Vec<Operation>,
    ) -> Result<Step, ConceptError> {
        if let Some(step) = self.revisit(id, out) {
            return Ok(step);
        }

        let start = out.len();
        let concept = self.enter(id)?;
        for clause in concept.clauses() {
            match clause {
                Clause::Operation { name, signature } => out.push(Operation {
                    name: name.clone(),
                    signature: signature.clone(),
                    origin: id,
                }),
                Clause::Refines(refined) => {
                    if self.expand_concept(*refined, out)? == Step::Halt {
                        return Ok(Step::Halt);
                    }
                }
            }
        }

        let expansion = Expansion {
            chains: HashSet::from([self.path.clone()]),
            first: (out.len() > start).then_some(start),
        };
        self.expanded.insert(id, expansion);
        self.leave();
        Ok(Step::Continue)
    }

    /// Handle a concept expanded earlier in this walk; `None` if `id` still
    /// has to be expanded.
    fn revisit(&mut self, id: ConceptId, out: &mut Vec<Operation>) -> Option<Step> {
        // Still on the chain: `enter` reports the cycle.
        if self.path.contains(&id) {
            return None;
        }
        let expansion = self.expanded.get_mut(&id)?;
        let Some(first) = expansion.first else {
            return Some(Step::Continue);
        };

        if self.policy == DiamondPolicy::MergeIdentical {
            let mut chain = self.path.clone();
            chain.push(id);
            if expansion.chains.insert(chain) {
                return Some(Step::Continue);
            }
        }

        let repeat = out[first].clone();
        out.push(repeat);
        Some(Step::Halt)
    }

    fn collect_refinements(
        &mut self,
        id: ConceptId,
        seen: &mut HashSet<ConceptId>,
        out: &mut Vec<ConceptId>,
    ) -> Result<(), ConceptError> {
        let concept = self.enter(id)?;
        for refined in concept.refinements() {
            // A revisit that is still on the chain must reach `enter` to be
            // reported as a cycle.
            if seen.insert(refined) {
                out.push(refined);
                self.collect_refinements(refined, seen, out)?;
            } else if self.path.contains(&refined) {
                self.enter(refined)?;
            }
        }
        self.leave();
        Ok(())
    }
}

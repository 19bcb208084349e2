//! Resolved operation tables.
//!
//! A [`ResolvedTable`] is the canonical answer to "what does this concept
//! require": every transitively required operation, keyed by name, in
//! flattening order. Names are unique; building a table from a flattened
//! sequence with a repeated name fails instead of overwriting. Diamond
//! repeats accepted by [`DiamondPolicy::MergeIdentical`] never get this far:
//! flattening leaves them out.
//!
//! [`DiamondPolicy::MergeIdentical`]: crate::config::DiamondPolicy::MergeIdentical

use crate::concept::ConceptId;
use crate::error::ConceptError;
use crate::flatten::{ConceptSource, Operation};
use crate::signature::Signature;
use serde::Serialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

pub const RESOLVED_TABLE_KIND: &str = "dynconcept.resolved_table.v1";

/// The flattened requirement set of one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTable {
    concept: ConceptId,
    operations: Vec<Operation>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl ResolvedTable {
    /// Build the table for `concept` from its flattened sequence.
    pub fn build<S: ConceptSource + ?Sized>(
        source: &S,
        concept: ConceptId,
        flattened: Vec<Operation>,
    ) -> Result<Self, ConceptError> {
        let mut operations: Vec<Operation> = Vec::with_capacity(flattened.len());
        let mut index = BTreeMap::new();

        for op in flattened {
            if op.name.is_empty() {
                return Err(ConceptError::EmptyOperationName {
                    concept: source.label(op.origin),
                });
            }
            match index.entry(op.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(operations.len());
                    operations.push(op);
                }
                Entry::Occupied(slot) => {
                    let first = &operations[*slot.get()];
                    return Err(ConceptError::DuplicateOperationName {
                        concept: source.label(concept),
                        operation: op.name,
                        first_origin: source.label(first.origin),
                        second_origin: source.label(op.origin),
                    });
                }
            }
        }

        Ok(Self {
            concept,
            operations,
            index,
        })
    }

    /// The concept this table was resolved for.
    pub fn concept(&self) -> ConceptId {
        self.concept
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.operation(name).map(|op| &op.signature)
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.index.get(name).map(|&i| &self.operations[i])
    }

    /// Operations in flattening order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name.as_str())
    }

    /// Point lookup that fails for names outside the requirement set.
    ///
    /// `concept_label` only feeds the error message.
    pub fn signature_of(&self, concept_label: &str, name: &str) -> Result<&Signature, ConceptError> {
        self.get(name).ok_or_else(|| ConceptError::UnknownOperation {
            concept: concept_label.to_string(),
            operation: name.to_string(),
        })
    }

    /// Layout fingerprint over the ordered (name, signature) pairs.
    ///
    /// Origins and the concept identity do not contribute: two concepts that
    /// flatten to the same operations in the same order share a digest.
    pub fn digest(&self) -> TableDigest {
        let mut hasher = Sha256::new();
        for op in &self.operations {
            hash_field(&mut hasher, op.name.as_bytes());
            hash_field(&mut hasher, op.signature.to_string().as_bytes());
        }
        TableDigest(format!("{:x}", hasher.finalize()))
    }

    /// Deterministic JSON projection for downstream consumers.
    pub fn to_json(&self, concept_label: &str) -> Value {
        let operations: Vec<Value> = self
            .operations
            .iter()
            .map(|op| {
                json!({
                    "name": op.name,
                    "signature": op.signature,
                    "origin": op.origin,
                })
            })
            .collect();
        json!({
            "schema": 1,
            "tableKind": RESOLVED_TABLE_KIND,
            "concept": concept_label,
            "digest": self.digest(),
            "operations": operations,
        })
    }
}

/// Length-prefixed, so no name or signature text can mimic a field boundary.
fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// SHA-256 fingerprint of a resolved table's layout, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableDigest(pub String);

impl fmt::Display for TableDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

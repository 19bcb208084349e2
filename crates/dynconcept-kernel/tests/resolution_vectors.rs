//! Integration tests: run the resolution vectors.
//!
//! Each fixture in tests/fixtures/ has:
//! - case.json: concept declarations, optional resolve options, and the
//!   concept to resolve
//! - expect.json: the expected resolved table (or error) and the concept's
//!   direct refinements
//!
//! Every concept name is reserved before any clauses are defined, so a
//! fixture may reference concepts declared later, or itself.

use dynconcept_kernel::{Catalog, Clause, ConceptId, ResolveOptions, Signature};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Case {
    #[serde(default)]
    options: Option<ResolveOptions>,
    concepts: Vec<ConceptCase>,
    resolve: String,
}

#[derive(Debug, Deserialize)]
struct ConceptCase {
    name: String,
    clauses: Vec<ClauseCase>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClauseCase {
    Refines { refines: String },
    Operation { op: String, signature: Signature },
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_json(path: &PathBuf) -> Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn build_catalog(case: &Case) -> (Catalog, HashMap<String, ConceptId>) {
    let mut catalog = Catalog::with_options(case.options.clone().unwrap_or_default())
        .expect("fixture options are valid");
    let ids: HashMap<String, ConceptId> = case
        .concepts
        .iter()
        .map(|c| (c.name.clone(), catalog.reserve(c.name.clone())))
        .collect();

    for concept in &case.concepts {
        let clauses = concept
            .clauses
            .iter()
            .map(|clause| match clause {
                ClauseCase::Refines { refines } => Clause::from(
                    *ids.get(refines)
                        .unwrap_or_else(|| panic!("unknown concept in fixture: {refines}")),
                ),
                ClauseCase::Operation { op, signature } => {
                    Clause::operation(op.clone(), signature.clone())
                }
            })
            .collect();
        catalog
            .define(ids[&concept.name], clauses)
            .expect("fixture concept defined twice");
    }

    (catalog, ids)
}

fn label(catalog: &Catalog, id: ConceptId) -> Value {
    json!(catalog.name(id).expect("fixture ids are always named"))
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let case_json = read_json(&dir.join("case.json"));
    let expected = read_json(&dir.join("expect.json"));

    let case: Case = serde_json::from_value(case_json)
        .unwrap_or_else(|e| panic!("malformed case in fixture {name}: {e}"));
    let (catalog, ids) = build_catalog(&case);
    let root = *ids
        .get(&case.resolve)
        .unwrap_or_else(|| panic!("fixture resolves an undeclared concept: {}", case.resolve));

    let mut result = serde_json::Map::new();
    match catalog.resolved_table(root) {
        Ok(table) => {
            let rows: Vec<Value> = table
                .iter()
                .map(|op| {
                    json!({
                        "name": op.name,
                        "signature": op.signature.to_string(),
                        "origin": label(&catalog, op.origin),
                    })
                })
                .collect();
            result.insert("table".to_string(), Value::Array(rows));
        }
        Err(err) => {
            result.insert(
                "error".to_string(),
                json!({ "kind": err.kind(), "message": err.to_string() }),
            );
        }
    }
    let direct: Vec<Value> = catalog
        .direct_refinements(root)
        .expect("fixture root is always defined")
        .into_iter()
        .map(|id| label(&catalog, id))
        .collect();
    result.insert("directRefinements".to_string(), Value::Array(direct));

    let result_json = Value::Object(result);
    assert_eq!(
        result_json,
        expected,
        "\n\nFixture: {name}\n\nGot:\n{}\n\nExpected:\n{}\n",
        serde_json::to_string_pretty(&result_json).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap(),
    );
}

#[test]
fn golden_iterator() {
    run_fixture("golden_iterator");
}

#[test]
fn golden_transitive_chain() {
    run_fixture("golden_transitive_chain");
}

#[test]
fn golden_inline_position() {
    run_fixture("golden_inline_position");
}

#[test]
fn golden_diamond_merge_identical() {
    run_fixture("golden_diamond_merge_identical");
}

#[test]
fn adversarial_duplicate_direct() {
    run_fixture("adversarial_duplicate_direct");
}

#[test]
fn adversarial_duplicate_across_branches() {
    run_fixture("adversarial_duplicate_across_branches");
}

#[test]
fn adversarial_diamond_identical() {
    run_fixture("adversarial_diamond_identical");
}

#[test]
fn adversarial_self_cycle() {
    run_fixture("adversarial_self_cycle");
}

#[test]
fn adversarial_mutual_cycle() {
    run_fixture("adversarial_mutual_cycle");
}

fn sig(s: &str) -> Signature {
    s.parse().unwrap()
}

#[test]
fn lookup_matches_every_resolved_entry() {
    let case: Case =
        serde_json::from_value(read_json(&fixtures_dir().join("golden_transitive_chain/case.json")))
            .unwrap();
    let (catalog, ids) = build_catalog(&case);
    let root = ids["Level3"];
    let table = catalog.resolved_table(root).unwrap();

    for op in table.iter() {
        assert_eq!(catalog.signature_of(root, &op.name).unwrap(), op.signature);
    }
    let err = catalog.signature_of(root, "c4").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"`Level3` does not require an operation named `c4`");
}

#[test]
fn refined_table_is_prefix_of_refining_table() {
    let mut catalog = Catalog::new();
    let a = catalog.declare(
        "A",
        vec![
            Clause::operation("a1", sig("(T&) -> void")),
            Clause::operation("a2", sig("(const T&) -> size")),
        ],
    );
    let b = catalog.declare("B", vec![Clause::from(a), Clause::operation("x", sig("() -> T"))]);

    let flat_a = catalog.flatten(a).unwrap();
    let flat_b = catalog.flatten(b).unwrap();
    assert_eq!(flat_b.len(), flat_a.len() + 1);
    assert_eq!(&flat_b[..flat_a.len()], &flat_a[..]);
    assert_eq!(flat_b[2].name, "x");
    assert_eq!(catalog.direct_refinements(b).unwrap(), vec![a]);
}

#[test]
fn refinement_closure_walks_the_whole_graph() {
    let case: Case =
        serde_json::from_value(read_json(&fixtures_dir().join("golden_diamond_merge_identical/case.json")))
            .unwrap();
    let (catalog, ids) = build_catalog(&case);
    assert_eq!(
        catalog.refinement_closure(ids["Top"]).unwrap(),
        vec![ids["Left"], ids["Base"], ids["Right"]]
    );
    assert_eq!(catalog.direct_refinements(ids["Top"]).unwrap(), vec![ids["Left"], ids["Right"]]);
}

#[test]
fn concurrent_readers_share_one_table() {
    let mut catalog = Catalog::new();
    let base = catalog.declare("Base", vec![Clause::operation("f", sig("(T&) -> void"))]);
    let top = catalog.declare("Top", vec![Clause::from(base), Clause::operation("g", sig("() -> void"))]);

    let tables: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| catalog.resolved_table(top).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = &tables[0];
    for table in &tables {
        assert!(Arc::ptr_eq(first, table));
    }
    assert_eq!(first.digest(), catalog.resolved_table(top).unwrap().digest());
}

#[test]
fn failed_resolution_is_cached_too() {
    let mut catalog = Catalog::new();
    let x = catalog.reserve("X");
    catalog.define(x, vec![Clause::from(x)]).unwrap();
    let first = catalog.resolved_table(x).unwrap_err();
    let second = catalog.resolved_table(x).unwrap_err();
    assert_eq!(first, second);
    assert_eq!(
        catalog.signature_of(x, "anything").unwrap_err().kind(),
        "cyclic_refinement"
    );
}

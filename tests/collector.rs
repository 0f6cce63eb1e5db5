use isa_dataset_finder::collector::{collect, collect_scalars};
use isa_dataset_finder::document::{MetadataNode, Scalar};
use serde_json::json;

fn node(value: serde_json::Value) -> MetadataNode {
    MetadataNode::from(value)
}

#[test]
fn finds_field_at_two_depths() {
    let assay = node(json!({
        "annotationValue": "top",
        "measurementType": {"annotationValue": "nested"}
    }));

    let found = collect_scalars(&assay, "annotationValue");
    assert_eq!(found.len(), 2);
    assert!(found.contains(&&Scalar::from("top")));
    assert!(found.contains(&&Scalar::from("nested")));
}

#[test]
fn descends_into_lists_of_records() {
    let assay = node(json!({
        "characteristicCategories": [
            {"annotationValue": "a"},
            "loose scalar",
            [{"annotationValue": "b"}]
        ]
    }));

    let found = collect_scalars(&assay, "annotationValue");
    assert_eq!(found, vec![&Scalar::from("a"), &Scalar::from("b")]);
}

#[test]
fn missing_field_yields_nothing() {
    let assay = node(json!({"a": {"b": [1, 2, {"c": 3}]}}));
    assert!(collect(&assay, "nonexistent").is_empty());
}

#[test]
fn scalar_yields_nothing() {
    let leaf = MetadataNode::Scalar(Scalar::from("annotationValue"));
    assert!(collect(&leaf, "annotationValue").is_empty());
}

#[test]
fn matches_are_case_sensitive() {
    let assay = node(json!({"AnnotationValue": "x"}));
    assert!(collect(&assay, "annotationValue").is_empty());
}

#[test]
fn container_values_are_returned_whole() {
    let assay = node(json!({"technologyType": {"annotationValue": "NMR"}}));
    let found = collect(&assay, "technologyType");
    assert_eq!(found, vec![&node(json!({"annotationValue": "NMR"}))]);
}

#[test]
fn results_follow_document_order() {
    let assay = node(json!({
        "first": {"name": 1},
        "name": 2,
        "last": [{"name": 3}]
    }));
    let found = collect_scalars(&assay, "name");
    assert_eq!(
        found,
        vec![&Scalar::Integer(1), &Scalar::Integer(2), &Scalar::Integer(3)]
    );
}

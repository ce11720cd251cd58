//! Integration tests for filter normalization over the JSON wire format

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::PathBuf;
use tablefilter::config::Config;
use tablefilter::core::{FieldRegistry, FilterGroup};
use tablefilter::error::FilterError;
use tablefilter::services::normalize_filter;

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("sample-data")
        .join(name)
}

fn registry() -> FieldRegistry {
    Config::from_path(Some(&sample("books.json5")))
        .unwrap()
        .registry()
}

fn normalize(filter: Value, registry: &FieldRegistry) -> Result<Option<Value>, FilterError> {
    let group: FilterGroup = serde_json::from_value(filter)?;
    Ok(normalize_filter(Some(&group), registry)?.map(|g| serde_json::to_value(&g).unwrap()))
}

#[test]
fn test_sample_filter_normalizes() {
    let text = std::fs::read_to_string(sample("filter.json")).unwrap();
    let filter: Value = serde_json::from_str(&text).unwrap();

    let normalized = normalize(filter, &registry()).unwrap();
    assert_eq!(
        normalized,
        Some(json!({"and": [
            {"title": {"like": "%rust%"}},
            {"or": [
                {"pages": {"gte": 300}},
                {"author": {"name": {"like": "Kla%"}}}
            ]},
            {"published": {"between": {
                "lower": "2023-05-04T00:00:00.000Z",
                "upper": "2023-05-05T00:00:00.000Z"
            }}}
        ]}))
    );
}

#[test]
fn test_only_empty_rules_normalize_to_nothing() {
    let filter = json!({"or": [{}, {"and": [{}, {"or": []}]}, {"and": null}]});
    assert_eq!(normalize(filter, &registry()).unwrap(), None);
}

#[test]
fn test_text_operators_on_null_value() {
    let filter = json!({"and": [
        {"title": {"contains": null}},
        {"title": {"equals": null}},
        {"isbn": {"isNot": "anything"}}
    ]});
    assert_eq!(
        normalize(filter, &registry()).unwrap(),
        Some(json!({"and": [
            {"title": {"like": "%%"}},
            {"title": {"eq": ""}},
            {"isbn": {"isNot": null}}
        ]}))
    );
}

#[test]
fn test_boolean_and_passthrough_operators() {
    let filter = json!({"and": [
        {"available": {"is": false}},
        {"pages": {"in": [100, 200]}}
    ]});
    assert_eq!(
        normalize(filter, &registry()).unwrap(),
        Some(json!({"and": [
            {"available": {"is": false}},
            {"pages": {"in": [100, 200]}}
        ]}))
    );
}

#[test]
fn test_unregistered_field_is_an_error() {
    let err = normalize(json!({"and": [{"publisher": {"equals": "x"}}]}), &registry()).unwrap_err();
    assert!(matches!(err, FilterError::UnregisteredField(_)));
    assert_eq!(err.to_string(), "filterable field not found: publisher");

    // the relation is registered only under its sub-field
    let err = normalize(json!({"and": [{"author": {"contains": "x"}}]}), &registry()).unwrap_err();
    assert!(matches!(err, FilterError::UnregisteredField(_)));
}

#[test]
fn test_malformed_filters_are_rejected() {
    for bad in [
        json!({"and": [], "or": []}),
        json!({"and": "nope"}),
        json!({"and": [{"title": {"contains": "a"}, "isbn": {"equals": "b"}}]}),
        json!({"and": [42]}),
    ] {
        assert!(
            serde_json::from_value::<FilterGroup>(bad.clone()).is_err(),
            "expected {bad} to be rejected"
        );
    }
}

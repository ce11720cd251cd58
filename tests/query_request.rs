//! Integration tests for request assembly from a configured table

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::PathBuf;
use tablefilter::config::Config;
use tablefilter::core::{FilterGroup, FilterNode};
use tablefilter::editor::{SortDirection, SortItem};

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("sample-data")
        .join(name)
}

fn load_json(name: &str) -> Value {
    serde_json::from_str(&std::fs::read_to_string(sample(name)).unwrap()).unwrap()
}

fn config() -> Config {
    Config::from_path(Some(&sample("books.json5"))).unwrap()
}

#[test]
fn test_full_request_shape() {
    let cfg = config();
    let mut state = cfg.query_state();

    let static_filter: FilterNode = serde_json::from_value(load_json("static-filter.json")).unwrap();
    let filter: FilterGroup = serde_json::from_value(load_json("filter.json")).unwrap();

    assert!(state.set_static_filter(Some(static_filter)).unwrap().is_none());
    assert!(state.set_filter(Some(filter)).unwrap().is_none());
    assert!(state.set_fulltext(Some("ferris".into())).unwrap().is_none());

    let request = state.set_page(10, cfg.paging_default()).unwrap().unwrap();
    assert_eq!(
        request.to_json().unwrap(),
        json!({
            "filter": {"and": [
                {"available": {"is": true}},
                {"and": [
                    {"title": {"like": "%rust%"}},
                    {"or": [
                        {"pages": {"gte": 300}},
                        {"author": {"name": {"like": "Kla%"}}}
                    ]},
                    {"published": {"between": {
                        "lower": "2023-05-04T00:00:00.000Z",
                        "upper": "2023-05-05T00:00:00.000Z"
                    }}}
                ]},
                {"or": [
                    {"title": {"like": "%ferris%"}},
                    {"author": {"name": {"like": "%ferris%"}}}
                ]}
            ]},
            "paging": {"offset": 10, "limit": 10},
            "sorting": [],
            "customSort": [{"field": "id", "order": "DESC"}]
        })
    );
    assert_eq!(state.filter_rules_count(), 4);
}

#[test]
fn test_configured_default_sort_drives_header_only() {
    let mut state = config().query_state();
    assert_eq!(state.table_sort(), vec![("published".to_string(), -1)]);

    state.set_page(0, 25).unwrap();
    let request = state
        .set_sort(vec![SortItem::new("title", SortDirection::Asc)])
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::to_value(&request.custom_sort).unwrap(),
        json!([{"field": "title", "order": "ASC"}])
    );
}

#[test]
fn test_clearing_fulltext_refetches_without_search_group() {
    let mut state = config().query_state();
    state.set_page(0, 25).unwrap();

    let with_search = state.set_fulltext(Some("ferris".into())).unwrap().unwrap();
    assert!(with_search.filter.is_some());

    let cleared = state.set_fulltext(None).unwrap().unwrap();
    assert_eq!(cleared.to_json().unwrap()["filter"], json!({}));
}

//! JSON wire format of filter trees.
//!
//! The backend (and the UI binding layer) exchange filters as plain JSON:
//! `{and: [...]}` / `{or: [...]}` for groups, `{field: {op: value}}` or
//! `{field: {subField: {op: value}}}` for rules. This module is the only place
//! that inspects key shapes; everything past it works on the tagged model.
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::core::models::{
    Combinator, Comparator, FieldPath, FilterGroup, FilterNode, FilterRule, FilterValue, Operator,
};
use crate::error::FilterError;

/// Dates go over the wire as RFC 3339 with millisecond precision, UTC.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn value_to_json(value: &FilterValue) -> Value {
    match value {
        FilterValue::Null => Value::Null,
        FilterValue::Bool(b) => Value::Bool(*b),
        FilterValue::Number(n) => Value::Number(n.clone()),
        FilterValue::Text(s) => Value::String(s.clone()),
        FilterValue::Date(d) => Value::String(format_date(d)),
        FilterValue::List(items) => Value::Array(items.iter().map(value_to_json).collect()),
        FilterValue::Range { lower, upper } => {
            let mut map = Map::new();
            map.insert("lower".to_string(), value_to_json(lower));
            map.insert("upper".to_string(), value_to_json(upper));
            Value::Object(map)
        }
    }
}

/// Strings are read as text, exactly as sent. Dates are recognized later,
/// against the field type (see `FilterValue::with_dates`).
pub fn value_from_json(value: &Value) -> Result<FilterValue, FilterError> {
    Ok(match value {
        Value::Null => FilterValue::Null,
        Value::Bool(b) => FilterValue::Bool(*b),
        Value::Number(n) => FilterValue::Number(n.clone()),
        Value::String(s) => FilterValue::Text(s.clone()),
        Value::Array(items) => FilterValue::List(
            items
                .iter()
                .map(value_from_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(map) if is_range(map) => FilterValue::range(
            value_from_json(&map["lower"])?,
            value_from_json(&map["upper"])?,
        ),
        Value::Object(_) => {
            return Err(FilterError::invalid(format!(
                "object values are only allowed as {{lower, upper}} ranges: {value}"
            )));
        }
    })
}

fn is_range(map: &Map<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("lower") && map.contains_key("upper")
}

pub fn comparator_to_json(comparator: &Comparator) -> Value {
    let mut map = Map::new();
    map.insert(
        comparator.operator.as_str().to_string(),
        value_to_json(&comparator.value),
    );
    Value::Object(map)
}

pub fn rule_to_json(rule: &FilterRule) -> Value {
    let mut map = Map::new();
    if let FilterRule::Condition { path, comparator } = rule {
        let comparator = comparator_to_json(comparator);
        let inner = match &path.sub_field {
            Some(sub) => {
                let mut wrapper = Map::new();
                wrapper.insert(sub.clone(), comparator);
                Value::Object(wrapper)
            }
            None => comparator,
        };
        map.insert(path.field.clone(), inner);
    }
    Value::Object(map)
}

pub fn group_to_json(group: &FilterGroup) -> Value {
    let mut map = Map::new();
    map.insert(
        group.combinator.as_str().to_string(),
        Value::Array(group.items.iter().map(node_to_json).collect()),
    );
    Value::Object(map)
}

pub fn node_to_json(node: &FilterNode) -> Value {
    match node {
        FilterNode::Group(group) => group_to_json(group),
        FilterNode::Rule(rule) => rule_to_json(rule),
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, FilterError> {
    value
        .as_object()
        .ok_or_else(|| FilterError::invalid(format!("{what} must be an object, got {value}")))
}

/// A JSON object carrying an `and` or `or` key is a group, anything else a rule.
pub fn node_from_json(value: &Value) -> Result<FilterNode, FilterError> {
    let map = as_object(value, "filter item")?;
    if map.contains_key("and") || map.contains_key("or") {
        group_from_json(value).map(FilterNode::Group)
    } else {
        rule_from_json(value).map(FilterNode::Rule)
    }
}

pub fn group_from_json(value: &Value) -> Result<FilterGroup, FilterError> {
    let map = as_object(value, "filter group")?;
    let (combinator, list) = match (map.get("and"), map.get("or")) {
        (Some(_), Some(_)) => {
            return Err(FilterError::invalid("group carries both `and` and `or`"));
        }
        (Some(list), None) => (Combinator::And, list),
        (None, Some(list)) => (Combinator::Or, list),
        (None, None) => return Err(FilterError::invalid("group needs an `and` or `or` key")),
    };
    let items = match list {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(node_from_json)
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(FilterError::invalid(format!(
                "`{combinator}` must hold a list, got {other}"
            )));
        }
    };
    Ok(FilterGroup::new(combinator, items))
}

pub fn rule_from_json(value: &Value) -> Result<FilterRule, FilterError> {
    let map = as_object(value, "filter rule")?;
    let mut entries = map.iter();
    let Some((field, inner)) = entries.next() else {
        return Ok(FilterRule::Empty);
    };
    if entries.next().is_some() {
        return Err(FilterError::invalid(format!(
            "rule must have exactly one field, got {value}"
        )));
    }
    let inner = as_object(inner, "rule condition")?;

    if is_comparator(inner) {
        return Ok(match comparator_from_json(inner)? {
            Some(comparator) => FilterRule::condition(FieldPath::new(field), comparator),
            None => FilterRule::Empty,
        });
    }

    // relation: {field: {subField: comparator}}
    let mut sub_entries = inner.iter();
    let Some((sub_field, comparator)) = sub_entries.next() else {
        return Ok(FilterRule::Empty);
    };
    if sub_entries.next().is_some() {
        return Err(FilterError::invalid(format!(
            "relation rule must wrap exactly one sub-field, got {value}"
        )));
    }
    let comparator = as_object(comparator, "sub-field comparator")?;
    Ok(match comparator_from_json(comparator)? {
        Some(comparator) => FilterRule::condition(FieldPath::nested(field, sub_field), comparator),
        None => FilterRule::Empty,
    })
}

/// A flat `{op: value}` mapping: its first value is not an object, or is a range.
fn is_comparator(map: &Map<String, Value>) -> bool {
    match map.values().next() {
        None => false,
        Some(Value::Object(inner)) => is_range(inner),
        Some(_) => true,
    }
}

fn comparator_from_json(map: &Map<String, Value>) -> Result<Option<Comparator>, FilterError> {
    let mut entries = map.iter();
    let Some((operator, value)) = entries.next() else {
        return Ok(None);
    };
    if entries.next().is_some() {
        return Err(FilterError::invalid(format!(
            "comparator must hold a single operator, got {}",
            Value::Object(map.clone())
        )));
    }
    Ok(Some(Comparator {
        operator: Operator::parse(operator),
        value: value_from_json(value)?,
    }))
}

macro_rules! json_serde {
    ($ty:ty, $to:path, $from:path) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $to(self).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                $from(&value).map_err(serde::de::Error::custom)
            }
        }
    };
}

json_serde!(FilterValue, value_to_json, value_from_json);
json_serde!(FilterRule, rule_to_json, rule_from_json);
json_serde!(FilterGroup, group_to_json, group_from_json);
json_serde!(FilterNode, node_to_json, node_from_json);

impl Serialize for Comparator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        comparator_to_json(self).serialize(serializer)
    }
}

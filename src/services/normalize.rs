//! Normalization of user filter trees into backend comparators.
//!
//! Empty rules and groups are pruned, and every `(field type, operator, value)`
//! triple is rewritten through `QUERY_COMPARATORS`. A transform returning
//! `None` cancels its rule; pairs with no transform pass through unchanged.
use chrono::TimeDelta;
use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::core::{
    Comparator, FieldPath, FieldRegistry, FieldType, FilterGroup, FilterNode, FilterRule,
    FilterValue, Operator,
};
use crate::error::FilterError;

/// Rewrites a UI comparator value into a backend comparator; `None` cancels the rule
pub type ComparatorTransform = fn(&FilterValue) -> Option<Comparator>;

fn one_day() -> TimeDelta {
    TimeDelta::milliseconds(24 * 60 * 60 * 1000)
}

fn text_or_empty(value: &FilterValue) -> FilterValue {
    match value {
        FilterValue::Null => FilterValue::Text(String::new()),
        other => other.clone(),
    }
}

fn like(pattern: String) -> Option<Comparator> {
    Some(Comparator::new(Operator::Like, pattern))
}

fn text_contains(value: &FilterValue) -> Option<Comparator> {
    like(format!("%{}%", value.to_text()))
}

fn text_not_contains(value: &FilterValue) -> Option<Comparator> {
    Some(Comparator::new(Operator::NotLike, format!("%{}%", value.to_text())))
}

fn text_starts_with(value: &FilterValue) -> Option<Comparator> {
    like(format!("{}%", value.to_text()))
}

fn text_ends_with(value: &FilterValue) -> Option<Comparator> {
    like(format!("%{}", value.to_text()))
}

fn text_equals(value: &FilterValue) -> Option<Comparator> {
    Some(Comparator::new(Operator::Eq, text_or_empty(value)))
}

fn text_not_equals(value: &FilterValue) -> Option<Comparator> {
    Some(Comparator::new(Operator::Neq, text_or_empty(value)))
}

fn is_null(_: &FilterValue) -> Option<Comparator> {
    Some(Comparator::new(Operator::Is, FilterValue::Null))
}

fn is_not_null(_: &FilterValue) -> Option<Comparator> {
    Some(Comparator::new(Operator::IsNot, FilterValue::Null))
}

fn bool_is(value: &FilterValue) -> Option<Comparator> {
    Some(Comparator::new(Operator::Is, value.clone()))
}

fn bool_is_not(value: &FilterValue) -> Option<Comparator> {
    Some(Comparator::new(Operator::IsNot, value.clone()))
}

fn required(operator: Operator, value: &FilterValue) -> Option<Comparator> {
    if value.is_null() {
        return None;
    }
    Some(Comparator::new(operator, value.clone()))
}

fn eq(value: &FilterValue) -> Option<Comparator> {
    required(Operator::Eq, value)
}

fn neq(value: &FilterValue) -> Option<Comparator> {
    required(Operator::Neq, value)
}

fn gt(value: &FilterValue) -> Option<Comparator> {
    required(Operator::Gt, value)
}

fn gte(value: &FilterValue) -> Option<Comparator> {
    required(Operator::Gte, value)
}

fn lt(value: &FilterValue) -> Option<Comparator> {
    required(Operator::Lt, value)
}

fn lte(value: &FilterValue) -> Option<Comparator> {
    required(Operator::Lte, value)
}

/// The whole calendar day starting at the given instant
fn date_is(value: &FilterValue) -> Option<Comparator> {
    match value {
        FilterValue::Null => None,
        FilterValue::Date(lower) => Some(Comparator::new(
            Operator::Between,
            FilterValue::range((*lower).into(), (*lower + one_day()).into()),
        )),
        other => {
            warn!(value = ?other, "dateIs needs a date value, dropping rule");
            None
        }
    }
}

lazy_static! {
    pub static ref QUERY_COMPARATORS: HashMap<(FieldType, Operator), ComparatorTransform> = {
        let mut table: HashMap<(FieldType, Operator), ComparatorTransform> = HashMap::new();
        let mut add = |t: FieldType, op: Operator, f: ComparatorTransform| {
            table.insert((t, op), f);
        };

        add(FieldType::Text, Operator::Contains, text_contains);
        add(FieldType::Text, Operator::NotContains, text_not_contains);
        add(FieldType::Text, Operator::StartsWith, text_starts_with);
        add(FieldType::Text, Operator::EndsWith, text_ends_with);
        add(FieldType::Text, Operator::Equals, text_equals);
        add(FieldType::Text, Operator::NotEquals, text_not_equals);
        add(FieldType::Text, Operator::Is, is_null);
        add(FieldType::Text, Operator::IsNot, is_not_null);

        add(FieldType::Boolean, Operator::Is, bool_is);
        add(FieldType::Boolean, Operator::IsNot, bool_is_not);

        for t in [FieldType::Number, FieldType::Date] {
            add(t, Operator::Equals, eq);
            add(t, Operator::NotEquals, neq);
            add(t, Operator::Gt, gt);
            add(t, Operator::Gte, gte);
            add(t, Operator::Lt, lt);
            add(t, Operator::Lte, lte);
        }
        add(FieldType::Date, Operator::DateIs, date_is);

        table
    };
}

/// Translate one comparator. Errors when `path` is not a registered field.
pub fn normalize_comparator(
    comparator: &Comparator,
    path: &FieldPath,
    registry: &FieldRegistry,
) -> Result<Option<Comparator>, FilterError> {
    let field = registry
        .find(path)
        .ok_or_else(|| FilterError::UnregisteredField(path.clone()))?;

    // Wire strings stay text until the field says they are dates
    let dated;
    let comparator = if field.field_type == FieldType::Date {
        dated = Comparator::new(comparator.operator.clone(), comparator.value.with_dates());
        &dated
    } else {
        comparator
    };

    let key = (field.field_type, comparator.operator.clone());
    match QUERY_COMPARATORS.get(&key) {
        Some(transform) => {
            let normalized = transform(&comparator.value);
            if normalized.is_none() {
                debug!(%path, operator = %comparator.operator, "comparator cancelled");
            }
            Ok(normalized)
        }
        None => {
            warn!(
                %path,
                field_type = %field.field_type,
                operator = %comparator.operator,
                "no comparator transform registered, passing through"
            );
            Ok(Some(comparator.clone()))
        }
    }
}

/// `None` for the empty rule and for cancelled comparators
pub fn normalize_rule(
    rule: &FilterRule,
    registry: &FieldRegistry,
) -> Result<Option<FilterRule>, FilterError> {
    let FilterRule::Condition { path, comparator } = rule else {
        return Ok(None);
    };
    Ok(normalize_comparator(comparator, path, registry)?
        .map(|comparator| FilterRule::condition(path.clone(), comparator)))
}

fn normalize_node(
    node: &FilterNode,
    registry: &FieldRegistry,
) -> Result<Option<FilterNode>, FilterError> {
    Ok(match node {
        FilterNode::Group(group) => normalize_filter(Some(group), registry)?.map(FilterNode::Group),
        FilterNode::Rule(rule) => normalize_rule(rule, registry)?.map(FilterNode::Rule),
    })
}

/// Prune and translate a filter tree. Returns `None` when nothing is left;
/// never returns a group with an empty list.
pub fn normalize_filter(
    group: Option<&FilterGroup>,
    registry: &FieldRegistry,
) -> Result<Option<FilterGroup>, FilterError> {
    let Some(group) = group else {
        return Ok(None);
    };

    let mut items = Vec::with_capacity(group.items.len());
    for node in &group.items {
        if let Some(normalized) = normalize_node(node, registry)? {
            items.push(normalized);
        }
    }

    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(FilterGroup::new(group.combinator, items)))
}

//! Filter tree model: values, comparators, rules and AND/OR groups
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Value carried by a comparator
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Date(DateTime<Utc>),
    List(Vec<FilterValue>),
    /// Inclusive lower / exclusive upper bound, as produced for day buckets
    Range {
        lower: Box<FilterValue>,
        upper: Box<FilterValue>,
    },
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for `List([])`; every other value, `Null` included, is not an empty list.
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Self::List(items) if items.is_empty())
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Text holding an RFC 3339 timestamp becomes a UTC date, inside lists and
    /// ranges too. Other values are returned unchanged.
    pub fn with_dates(&self) -> FilterValue {
        match self {
            Self::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| Self::Date(d.with_timezone(&Utc)))
                .unwrap_or_else(|_| self.clone()),
            Self::List(items) => Self::List(items.iter().map(Self::with_dates).collect()),
            Self::Range { lower, upper } => Self::range(lower.with_dates(), upper.with_dates()),
            other => other.clone(),
        }
    }

    /// Render the value as plain text for pattern building. `Null` renders as "".
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Date(d) => crate::core::wire::format_date(d),
            Self::List(_) | Self::Range { .. } => crate::core::wire::value_to_json(self).to_string(),
        }
    }

    pub fn range(lower: FilterValue, upper: FilterValue) -> Self {
        Self::Range {
            lower: Box::new(lower),
            upper: Box::new(upper),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for FilterValue {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(Self::Number)
            .unwrap_or(Self::Null)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Comparison operator. UI-level names (`contains`, `dateIs`, ...) are
/// translated into backend names (`like`, `between`, ...) by normalization;
/// any other name is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Operator {
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Equals,
    NotEquals,
    Is,
    IsNot,
    Gt,
    Gte,
    Lt,
    Lte,
    DateIs,
    In,
    Like,
    NotLike,
    Eq,
    Neq,
    Between,
    #[strum(default)]
    Custom(String),
}

impl Operator {
    pub fn parse(name: &str) -> Self {
        Self::from_str(name).unwrap_or_else(|_| Self::Custom(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::Is => "is",
            Self::IsNot => "isNot",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::DateIs => "dateIs",
            Self::In => "in",
            Self::Like => "like",
            Self::NotLike => "notLike",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Between => "between",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

impl serde::Serialize for Operator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Operator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

/// One active operator with its value. Selecting another operator replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparator {
    pub operator: Operator,
    pub value: FilterValue,
}

impl Comparator {
    pub fn new(operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

/// Field address of a rule: a column, or a sub-field of a relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub field: String,
    pub sub_field: Option<String>,
}

impl FieldPath {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sub_field: None,
        }
    }

    pub fn nested(field: impl Into<String>, sub_field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sub_field: Some(sub_field.into()),
        }
    }

    /// Parse `field` or `field.subField`; only the first dot splits.
    pub fn parse(path: &str) -> Self {
        match path.split_once('.') {
            Some((field, sub_field)) => Self::nested(field, sub_field),
            None => Self::new(path),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_field {
            Some(sub) => write!(f, "{}.{}", self.field, sub),
            None => write!(f, "{}", self.field),
        }
    }
}

/// Single leaf condition. `Empty` is the "nothing selected yet" state (`{}`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterRule {
    #[default]
    Empty,
    Condition {
        path: FieldPath,
        comparator: Comparator,
    },
}

impl FilterRule {
    pub fn condition(path: FieldPath, comparator: Comparator) -> Self {
        Self::Condition { path, comparator }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::Empty => None,
            Self::Condition { path, .. } => Some(path),
        }
    }

    pub fn comparator(&self) -> Option<&Comparator> {
        match self {
            Self::Empty => None,
            Self::Condition { comparator, .. } => Some(comparator),
        }
    }
}

/// Boolean combinator of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// AND/OR group of rules and nested groups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGroup {
    pub combinator: Combinator,
    pub items: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn new(combinator: Combinator, items: Vec<FilterNode>) -> Self {
        Self { combinator, items }
    }

    pub fn and(items: Vec<FilterNode>) -> Self {
        Self::new(Combinator::And, items)
    }

    pub fn or(items: Vec<FilterNode>) -> Self {
        Self::new(Combinator::Or, items)
    }

    /// A fresh group as the editor creates it: `{and: [{}]}`
    pub fn seeded() -> Self {
        Self::and(vec![FilterNode::Rule(FilterRule::Empty)])
    }
}

/// Child of a group: either a nested group or a rule
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Group(FilterGroup),
    Rule(FilterRule),
}

impl FilterNode {
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Only the empty rule `{}` counts as empty; a group always carries its combinator key.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Rule(FilterRule::Empty))
    }

    pub fn kind(&self) -> FilterItemKind {
        match self {
            Self::Group(_) => FilterItemKind::Group,
            Self::Rule(_) => FilterItemKind::Rule,
        }
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(value: FilterGroup) -> Self {
        Self::Group(value)
    }
}

impl From<FilterRule> for FilterNode {
    fn from(value: FilterRule) -> Self {
        Self::Rule(value)
    }
}

/// Identity of an item in an editor list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FilterItemKind {
    Group,
    Rule,
}

/// Editor-side wrapper of a group child
#[derive(Debug, Clone, PartialEq)]
pub struct FilterItem {
    pub id: ItemId,
    pub node: FilterNode,
}

impl FilterItem {
    pub fn new(node: FilterNode) -> Self {
        Self {
            id: ItemId::new(),
            node,
        }
    }

    pub fn kind(&self) -> FilterItemKind {
        self.node.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_round_trip() {
        for name in [
            "contains", "notContains", "startsWith", "endsWith", "equals", "notEquals", "is",
            "isNot", "gt", "gte", "lt", "lte", "dateIs", "in", "like", "notLike", "eq", "neq",
            "between",
        ] {
            let op = Operator::parse(name);
            assert!(!matches!(op, Operator::Custom(_)), "{name} parsed as custom");
            assert_eq!(op.as_str(), name);
        }
    }

    #[test]
    fn unknown_operator_is_kept_verbatim() {
        let op = Operator::parse("iLike");
        assert_eq!(op, Operator::Custom("iLike".to_string()));
        assert_eq!(op.to_string(), "iLike");
    }

    #[test]
    fn with_dates_parses_timestamp_text_only() {
        use chrono::TimeZone;
        let noon = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        assert_eq!(FilterValue::from("2024-01-01T10:00:00+02:00").with_dates(), FilterValue::Date(noon));
        assert_eq!(FilterValue::from("tomorrow").with_dates(), FilterValue::from("tomorrow"));
        assert_eq!(
            FilterValue::from(vec!["2024-01-01T08:00:00Z", "x"]).with_dates(),
            FilterValue::List(vec![FilterValue::Date(noon), "x".into()])
        );
        assert_eq!(FilterValue::from(3).with_dates(), FilterValue::from(3));
    }

    #[test]
    fn field_path_splits_on_first_dot() {
        assert_eq!(FieldPath::parse("email.local"), FieldPath::nested("email", "local"));
        assert_eq!(FieldPath::parse("a.b.c"), FieldPath::nested("a", "b.c"));
        assert_eq!(FieldPath::parse("name").to_string(), "name");
    }

    #[test]
    fn only_empty_rule_is_empty_node() {
        assert!(FilterNode::Rule(FilterRule::Empty).is_empty());
        assert!(!FilterNode::Group(FilterGroup::and(vec![])).is_empty());
        assert_eq!(FilterGroup::seeded().items.len(), 1);
    }

    #[test]
    fn item_ids_are_unique() {
        let a = FilterItem::new(FilterRule::Empty.into());
        let b = FilterItem::new(FilterRule::Empty.into());
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind().to_string(), "rule");
    }
}

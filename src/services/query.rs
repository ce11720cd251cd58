//! Composite query builder: static filter + normalized user filter + fulltext,
//! with paging and sorting, assembled into one backend request.
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::core::{
    Comparator, FieldRegistry, FilterGroup, FilterNode, FilterRule, Operator,
};
use crate::editor::{SortDirection, SortItem};
use crate::error::FilterError;
use crate::services::normalize::normalize_filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSort {
    pub field: String,
    pub order: SortDirection,
}

impl CustomSort {
    pub fn new(field: impl Into<String>, order: SortDirection) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// Request sent to the data service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// `None` is sent as `{}`
    #[serde(serialize_with = "filter_or_empty")]
    pub filter: Option<FilterGroup>,
    pub paging: Paging,
    /// Always empty, kept for the backend contract
    pub sorting: Vec<Value>,
    pub custom_sort: Vec<CustomSort>,
}

fn filter_or_empty<S: Serializer>(filter: &Option<FilterGroup>, s: S) -> Result<S::Ok, S::Error> {
    match filter {
        Some(group) => group.serialize(s),
        None => Map::new().serialize(s),
    }
}

impl QueryRequest {
    pub fn to_json(&self) -> Result<Value, FilterError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// `{or: [...]}` of `like %text%` over TEXT fields flagged for fulltext.
/// `None` for a blank search or when no field is eligible.
pub fn fulltext_filter(fulltext: Option<&str>, registry: &FieldRegistry) -> Option<FilterGroup> {
    let text = fulltext.filter(|t| !t.is_empty())?;
    let pattern = format!("%{text}%");
    let items: Vec<FilterNode> = registry
        .fulltext_fields()
        .map(|f| {
            FilterNode::Rule(FilterRule::condition(
                f.path(),
                Comparator::new(Operator::Like, pattern.as_str()),
            ))
        })
        .collect();
    if items.is_empty() {
        debug!(fulltext = text, "no fulltext fields registered, search ignored");
        return None;
    }
    Some(FilterGroup::or(items))
}

/// Top-level AND of the static filter, the normalized user filter and the
/// fulltext group, in that order. `None` when there is nothing to filter on.
pub fn compose_filter(
    static_filter: Option<&FilterNode>,
    user_filter: Option<&FilterGroup>,
    fulltext: Option<&str>,
    registry: &FieldRegistry,
) -> Result<Option<FilterGroup>, FilterError> {
    let user = normalize_filter(user_filter, registry)?;
    Ok(combine_filters(static_filter, user.as_ref(), fulltext, registry))
}

/// `compose_filter` over a user filter that is already normalized
fn combine_filters(
    static_filter: Option<&FilterNode>,
    normalized_user: Option<&FilterGroup>,
    fulltext: Option<&str>,
    registry: &FieldRegistry,
) -> Option<FilterGroup> {
    let mut items = Vec::new();
    if let Some(node) = static_filter {
        items.push(node.clone());
    }
    if let Some(user) = normalized_user {
        items.push(user.clone().into());
    }
    if let Some(search) = fulltext_filter(fulltext, registry) {
        items.push(search.into());
    }

    if items.is_empty() {
        return None;
    }
    Some(FilterGroup::and(items))
}

/// Number of leaf rules, recursing into nested groups
pub fn count_filter_rules(filter: Option<&FilterGroup>) -> usize {
    filter.map_or(0, |group| {
        group
            .items
            .iter()
            .map(|node| match node {
                FilterNode::Group(g) => count_filter_rules(Some(g)),
                FilterNode::Rule(_) => 1,
            })
            .sum()
    })
}

/// Fetch state of one table. Every setter that can change the result
/// returns the request to dispatch, if any.
#[derive(Debug)]
pub struct TableQueryState {
    registry: Arc<FieldRegistry>,
    static_filter: Option<FilterNode>,
    filter: Option<FilterGroup>,
    fulltext: Option<String>,
    sort: Vec<SortItem>,
    backend_default_sort: Vec<SortItem>,
    last_page: Option<Paging>,
    /// Outer `None` until the first request goes out
    last_fetch_filter: Option<Option<FilterGroup>>,
    filter_rules_count: usize,
}

impl TableQueryState {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self {
            registry,
            static_filter: None,
            filter: None,
            fulltext: None,
            sort: Vec::new(),
            backend_default_sort: vec![SortItem::new("id", SortDirection::Desc)],
            last_page: None,
            last_fetch_filter: None,
            filter_rules_count: 0,
        }
    }

    pub fn with_backend_default_sort(mut self, sort: Vec<SortItem>) -> Self {
        self.backend_default_sort = sort;
        self
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn filter(&self) -> Option<&FilterGroup> {
        self.filter.as_ref()
    }

    pub fn static_filter(&self) -> Option<&FilterNode> {
        self.static_filter.as_ref()
    }

    pub fn fulltext(&self) -> Option<&str> {
        self.fulltext.as_deref()
    }

    pub fn sort(&self) -> &[SortItem] {
        &self.sort
    }

    pub fn filter_rules_count(&self) -> usize {
        self.filter_rules_count
    }

    pub fn set_filter(&mut self, filter: Option<FilterGroup>) -> Result<Option<QueryRequest>, FilterError> {
        self.filter = filter;
        self.refetch(true)
    }

    pub fn set_static_filter(&mut self, filter: Option<FilterNode>) -> Result<Option<QueryRequest>, FilterError> {
        self.static_filter = filter;
        self.refetch(true)
    }

    pub fn set_fulltext(&mut self, fulltext: Option<String>) -> Result<Option<QueryRequest>, FilterError> {
        self.fulltext = fulltext;
        self.refetch(false)
    }

    pub fn set_sort(&mut self, sort: Vec<SortItem>) -> Result<Option<QueryRequest>, FilterError> {
        self.sort = sort;
        self.refetch(false)
    }

    /// Page event from the table widget. Nothing is fetched before the first one.
    pub fn set_page(&mut self, offset: usize, limit: usize) -> Result<Option<QueryRequest>, FilterError> {
        self.last_page = Some(Paging { offset, limit });
        self.refetch(false)
    }

    pub fn reset_filter(&mut self) -> Result<Option<QueryRequest>, FilterError> {
        self.set_filter(Some(FilterGroup::seeded()))
    }

    pub fn reset_sort(&mut self) -> Result<Option<QueryRequest>, FilterError> {
        self.set_sort(Vec::new())
    }

    /// User sort, or `id DESC` when the user has not sorted
    pub fn custom_sort(&self) -> Vec<CustomSort> {
        let sort: Vec<CustomSort> = self
            .sort
            .iter()
            .filter_map(|s| s.field.as_ref().map(|f| CustomSort::new(f.as_str(), s.direction)))
            .collect();
        if sort.is_empty() {
            return vec![CustomSort::new("id", SortDirection::Desc)];
        }
        sort
    }

    /// Sort indicators for the table header: user sort, else the backend default
    pub fn table_sort(&self) -> Vec<(String, i8)> {
        let pairs = |items: &[SortItem]| -> Vec<(String, i8)> {
            items
                .iter()
                .filter_map(|s| s.field.clone().map(|f| (f, s.direction.order())))
                .collect()
        };
        let sort = pairs(&self.sort);
        if sort.is_empty() {
            return pairs(&self.backend_default_sort);
        }
        sort
    }

    /// Build the request for the current state. With `check_filter`, an
    /// unchanged composite filter produces no request.
    pub fn refetch(&mut self, check_filter: bool) -> Result<Option<QueryRequest>, FilterError> {
        let Some(paging) = self.last_page else {
            trace!("no page event yet, fetch skipped");
            return Ok(None);
        };

        let user = normalize_filter(self.filter.as_ref(), &self.registry)?;
        let filter = combine_filters(
            self.static_filter.as_ref(),
            user.as_ref(),
            self.fulltext.as_deref(),
            &self.registry,
        );

        if check_filter && self.last_fetch_filter.as_ref() == Some(&filter) {
            debug!("filter unchanged, fetch skipped");
            return Ok(None);
        }

        self.filter_rules_count = count_filter_rules(user.as_ref());
        self.last_fetch_filter = Some(filter.clone());

        Ok(Some(QueryRequest {
            filter,
            paging,
            sorting: Vec::new(),
            custom_sort: self.custom_sort(),
        }))
    }
}

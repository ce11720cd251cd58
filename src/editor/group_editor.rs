//! GroupEditor: ordered children of one AND/OR group
use tracing::trace;

use crate::core::{Combinator, FilterGroup, FilterItem, FilterNode, FilterRule, ItemId};
use crate::editor::binding::{Bindings, ChangeCallback, TouchedCallback, ValueAccessor};

/// Holds the combinator and the child items of a group and republishes the
/// rebuilt `FilterGroup` after every edit.
#[derive(Debug)]
pub struct GroupEditor {
    condition: Combinator,
    items: Vec<FilterItem>,
    /// Last value written or published
    filter: FilterGroup,
    bindings: Bindings<FilterGroup>,
}

impl Default for GroupEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupEditor {
    /// Starts as `{and: [{}]}`
    pub fn new() -> Self {
        let filter = FilterGroup::seeded();
        Self {
            condition: filter.combinator,
            items: items_from_group(&filter),
            filter,
            bindings: Bindings::new(),
        }
    }

    pub fn condition(&self) -> Combinator {
        self.condition
    }

    pub fn items(&self) -> &[FilterItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&FilterItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn filter(&self) -> &FilterGroup {
        &self.filter
    }

    pub fn set_condition(&mut self, condition: Combinator) {
        self.condition = condition;
        self.update_filter();
    }

    /// Append an empty rule
    pub fn add_rule(&mut self) -> ItemId {
        self.push(FilterNode::Rule(FilterRule::Empty))
    }

    /// Append a nested group seeded with one empty rule
    pub fn add_group(&mut self) -> ItemId {
        self.push(FilterNode::Group(FilterGroup::seeded()))
    }

    fn push(&mut self, node: FilterNode) -> ItemId {
        let item = FilterItem::new(node);
        let id = item.id;
        self.items.push(item);
        self.update_filter();
        id
    }

    /// Remove an item by identity; returns false if it is not in the list
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            return false;
        };
        self.items.remove(index);
        self.update_filter();
        true
    }

    /// Replace the filter of one child, as published by its own editor
    pub fn set_item_filter(&mut self, id: ItemId, node: FilterNode) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        item.node = node;
        self.update_filter();
        true
    }

    /// Rebuild the group from the items in list order and publish it
    pub fn update_filter(&mut self) {
        let items = self.items.iter().map(|i| i.node.clone()).collect();
        self.filter = FilterGroup::new(self.condition, items);
        trace!(items = self.items.len(), condition = %self.condition, "group updated");
        self.bindings.emit_change(&self.filter);
    }

    /// Report blur to the host
    pub fn touch(&mut self) {
        self.bindings.emit_touched();
    }
}

fn items_from_group(group: &FilterGroup) -> Vec<FilterItem> {
    group.items.iter().cloned().map(FilterItem::new).collect()
}

impl ValueAccessor<FilterGroup> for GroupEditor {
    /// Structurally equal values (typically our own published value echoed
    /// back by the host) are ignored.
    fn write_value(&mut self, value: FilterGroup) {
        if value == self.filter {
            return;
        }
        self.items = items_from_group(&value);
        self.condition = value.combinator;
        self.filter = value;
    }

    fn register_on_change(&mut self, callback: ChangeCallback<FilterGroup>) {
        self.bindings.set_on_change(callback);
    }

    fn register_on_touched(&mut self, callback: TouchedCallback) {
        self.bindings.set_on_touched(callback);
    }
}

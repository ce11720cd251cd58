//! SortEditor: ordered list of sort columns and directions
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use strum::Display as SDisplay;

use crate::core::{ItemId, TableColumn};
use crate::editor::binding::{Bindings, ChangeCallback, TouchedCallback, ValueAccessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, SDisplay, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    #[strum(serialize = "ASC")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    #[strum(serialize = "DESC")]
    Desc,
}

impl SortDirection {
    /// Table widget sort order: 1 ascending, -1 descending
    pub fn order(&self) -> i8 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// One sort entry; `field` stays unset until the user picks a column
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct SortItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortItem {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: Some(field.into()),
            direction,
        }
    }
}

impl Display for SortItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field.as_deref().unwrap_or("<none>"), self.direction)
    }
}

/// Column offered by the sort picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub label: String,
}

/// Sortable columns in column order
pub fn sort_fields(columns: &[TableColumn]) -> Vec<SortField> {
    columns
        .iter()
        .filter(|c| c.sortable)
        .map(|c| SortField {
            field: c.field.clone(),
            label: c.header.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortItemContainer {
    pub id: ItemId,
    pub item: SortItem,
}

#[derive(Debug, Default)]
pub struct SortEditor {
    containers: Vec<SortItemContainer>,
    sort: Vec<SortItem>,
    bindings: Bindings<Vec<SortItem>>,
}

impl SortEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SortItemContainer] {
        &self.containers
    }

    pub fn sort(&self) -> &[SortItem] {
        &self.sort
    }

    /// Append an ascending entry without a column. Not published until it is edited.
    pub fn add_item(&mut self) -> ItemId {
        let id = ItemId::new();
        self.containers.push(SortItemContainer {
            id,
            item: SortItem::default(),
        });
        id
    }

    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let Some(index) = self.containers.iter().position(|c| c.id == id) else {
            return false;
        };
        self.containers.remove(index);
        self.update_sort();
        true
    }

    pub fn set_item(&mut self, id: ItemId, item: SortItem) -> bool {
        let Some(container) = self.containers.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        container.item = item;
        self.update_sort();
        true
    }

    pub fn update_sort(&mut self) {
        self.sort = self.containers.iter().map(|c| c.item.clone()).collect();
        self.bindings.emit_change(&self.sort);
    }
}

impl ValueAccessor<Vec<SortItem>> for SortEditor {
    fn write_value(&mut self, value: Vec<SortItem>) {
        if value == self.sort {
            return;
        }
        self.containers = value
            .iter()
            .cloned()
            .map(|item| SortItemContainer {
                id: ItemId::new(),
                item,
            })
            .collect();
        self.sort = value;
    }

    fn register_on_change(&mut self, callback: ChangeCallback<Vec<SortItem>>) {
        self.bindings.set_on_change(callback);
    }

    fn register_on_touched(&mut self, callback: TouchedCallback) {
        self.bindings.set_on_touched(callback);
    }
}

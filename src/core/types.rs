use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strum::Display;

use crate::core::models::{FieldPath, FilterValue, Operator};

/// Data type of a filterable field; selects its operator set and comparator table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub enum FieldType {
    #[default]
    #[serde(rename = "text")]
    #[strum(serialize = "text")]
    Text,
    #[serde(rename = "numeric")]
    #[strum(serialize = "numeric")]
    Number,
    #[serde(rename = "date")]
    #[strum(serialize = "date")]
    Date,
    #[serde(rename = "boolean")]
    #[strum(serialize = "boolean")]
    Boolean,
}

/// Option of a select-style filter input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct SelectOption {
    pub value: serde_json::Value,
    pub label: String,
}

/// Filterable (and sortable) column description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct FilterRuleField {
    pub field: String,
    #[serde(
        default,
        rename = "subField",
        alias = "sub_field",
        alias = "subfield",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_field: Option<String>,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(
        default,
        rename = "useInFulltext",
        alias = "use_in_fulltext",
        alias = "useinfulltext"
    )]
    pub use_in_fulltext: bool,
    #[serde(
        default,
        rename = "selectField",
        alias = "select_field",
        alias = "selectfield",
        skip_serializing_if = "Option::is_none"
    )]
    pub select_field: Option<String>,
    #[serde(
        default,
        rename = "selectOptions",
        alias = "select_options",
        alias = "selectoptions",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub select_options: Vec<SelectOption>,
}

impl FilterRuleField {
    pub fn new(field: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            sub_field: None,
            label: label.into(),
            field_type,
            use_in_fulltext: false,
            select_field: None,
            select_options: Vec::new(),
        }
    }

    pub fn with_sub_field(mut self, sub_field: impl Into<String>) -> Self {
        self.sub_field = Some(sub_field.into());
        self
    }

    pub fn in_fulltext(mut self, enabled: bool) -> Self {
        self.use_in_fulltext = enabled;
        self
    }

    pub fn path(&self) -> FieldPath {
        FieldPath {
            field: self.field.clone(),
            sub_field: self.sub_field.clone(),
        }
    }

    pub fn matches(&self, path: &FieldPath) -> bool {
        self.field == path.field && self.sub_field == path.sub_field
    }
}

/// Converts between the editor's input value and the value stored in a rule
pub type ValueTransform = Arc<dyn Fn(FilterValue) -> FilterValue + Send + Sync>;

/// Per-field editor behavior
#[derive(Clone, Default, Deserialize)]
pub struct FieldOptions {
    /// Recompute the rule on every value change instead of after the debounce delay
    #[serde(default)]
    pub disable_update_debounce: bool,
    /// Emit this operator regardless of the selected one
    #[serde(default)]
    pub force_operator: Option<Operator>,
    #[serde(skip)]
    pub value_to_rule_value: Option<ValueTransform>,
    #[serde(skip)]
    pub rule_value_to_value: Option<ValueTransform>,
}

impl FieldOptions {
    pub fn to_rule_value(&self, value: FilterValue) -> FilterValue {
        match &self.value_to_rule_value {
            Some(transform) => transform(value),
            None => value,
        }
    }

    pub fn from_rule_value(&self, value: FilterValue) -> FilterValue {
        match &self.rule_value_to_value {
            Some(transform) => transform(value),
            None => value,
        }
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("disable_update_debounce", &self.disable_update_debounce)
            .field("force_operator", &self.force_operator)
            .field("value_to_rule_value", &self.value_to_rule_value.is_some())
            .field("rule_value_to_value", &self.rule_value_to_value.is_some())
            .finish()
    }
}

/// Table column as configured by the host; filter fields can be derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct TableColumn {
    /// Column path, `field` or `field.subField`
    pub field: String,
    pub header: String,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub filterable: bool,
    #[serde(default, alias = "filterType", alias = "filtertype")]
    pub filter_type: Option<FieldType>,
    #[serde(default = "default_true")]
    pub searchable: bool,
    #[serde(default)]
    pub hidden: bool,
}

fn default_true() -> bool {
    true
}

impl TableColumn {
    pub fn new(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header: header.into(),
            sortable: true,
            filterable: true,
            filter_type: None,
            searchable: true,
            hidden: false,
        }
    }
}

/// Declared filter fields plus per-field editor options
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<FilterRuleField>,
    options: HashMap<String, FieldOptions>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FilterRuleField>) -> Self {
        Self {
            fields,
            options: HashMap::new(),
        }
    }

    /// Filterable columns become fields; `field.subField` paths become relation fields.
    pub fn from_columns(columns: &[TableColumn]) -> Self {
        let fields = columns
            .iter()
            .filter(|c| c.filterable)
            .map(|c| {
                let path = FieldPath::parse(&c.field);
                FilterRuleField {
                    field: path.field,
                    sub_field: path.sub_field,
                    label: c.header.clone(),
                    field_type: c.filter_type.unwrap_or_default(),
                    use_in_fulltext: c.searchable,
                    select_field: None,
                    select_options: Vec::new(),
                }
            })
            .collect();
        Self::new(fields)
    }

    pub fn with_options(mut self, field: impl Into<String>, options: FieldOptions) -> Self {
        self.set_options(field, options);
        self
    }

    pub fn set_options(&mut self, field: impl Into<String>, options: FieldOptions) {
        self.options.insert(field.into(), options);
    }

    pub fn fields(&self) -> &[FilterRuleField] {
        &self.fields
    }

    /// Exact `(field, subField)` match
    pub fn find(&self, path: &FieldPath) -> Option<&FilterRuleField> {
        self.fields.iter().find(|f| f.matches(path))
    }

    /// All entries sharing a field name, in declaration order
    pub fn by_name<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FilterRuleField> + 'a {
        self.fields.iter().filter(move |f| f.field == field)
    }

    /// TEXT fields flagged for fulltext search
    pub fn fulltext_fields(&self) -> impl Iterator<Item = &FilterRuleField> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Text && f.use_in_fulltext)
    }

    pub fn options(&self, field: &str) -> Option<&FieldOptions> {
        self.options.get(field)
    }
}

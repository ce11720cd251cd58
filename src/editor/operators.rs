//! Operator sets offered per field type
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::{FieldType, Operator};

/// One entry of an operator picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorOption {
    pub label: String,
    pub operator: Operator,
    /// The operator takes no value (e.g. "is empty")
    #[serde(default)]
    pub value_hidden: bool,
    #[serde(default)]
    pub default: bool,
}

impl OperatorOption {
    pub fn new(label: impl Into<String>, operator: Operator) -> Self {
        Self {
            label: label.into(),
            operator,
            value_hidden: false,
            default: false,
        }
    }

    pub fn hidden_value(mut self) -> Self {
        self.value_hidden = true;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }
}

/// Ordered operator options per field type.
///
/// The default TEXT row lists "is" and "is not" both as `equals`. That is how
/// the table has always been shipped; hosts that want `notEquals` for "is not"
/// override the row with `set_operators`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTable {
    rows: HashMap<FieldType, Vec<OperatorOption>>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            FieldType::Text,
            vec![
                OperatorOption::new("is filled", Operator::IsNot).hidden_value(),
                OperatorOption::new("is empty", Operator::Is).hidden_value(),
                OperatorOption::new("contains", Operator::Contains).as_default(),
                OperatorOption::new("does not contain", Operator::NotContains),
                OperatorOption::new("starts with", Operator::StartsWith),
                OperatorOption::new("ends with", Operator::EndsWith),
                OperatorOption::new("is", Operator::Equals),
                OperatorOption::new("is not", Operator::Equals),
            ],
        );
        rows.insert(
            FieldType::Boolean,
            vec![OperatorOption::new("is", Operator::Is).as_default()],
        );
        rows.insert(
            FieldType::Number,
            vec![
                OperatorOption::new("equals", Operator::Equals).as_default(),
                OperatorOption::new("does not equal", Operator::NotEquals),
                OperatorOption::new("greater than", Operator::Gt),
                OperatorOption::new("greater than or equal", Operator::Gte),
                OperatorOption::new("less than", Operator::Lt),
                OperatorOption::new("less than or equal", Operator::Lte),
            ],
        );
        rows.insert(
            FieldType::Date,
            vec![
                OperatorOption::new("on", Operator::DateIs).as_default(),
                OperatorOption::new("equals", Operator::Equals),
                OperatorOption::new("does not equal", Operator::NotEquals),
                OperatorOption::new("after", Operator::Gt),
                OperatorOption::new("on or after", Operator::Gte),
                OperatorOption::new("before", Operator::Lt),
                OperatorOption::new("on or before", Operator::Lte),
            ],
        );
        Self { rows }
    }
}

impl OperatorTable {
    pub fn operators(&self, field_type: FieldType) -> &[OperatorOption] {
        self.rows.get(&field_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_operators(&mut self, field_type: FieldType, operators: Vec<OperatorOption>) {
        self.rows.insert(field_type, operators);
    }

    /// Index of the flagged default, else the first option
    pub fn default_index(&self, field_type: FieldType) -> Option<usize> {
        let operators = self.operators(field_type);
        operators
            .iter()
            .position(|o| o.default)
            .or_else(|| (!operators.is_empty()).then_some(0))
    }

    /// First option emitting `operator`
    pub fn position(&self, field_type: FieldType, operator: &Operator) -> Option<usize> {
        self.operators(field_type)
            .iter()
            .position(|o| &o.operator == operator)
    }
}

pub mod config;
pub mod core;
pub mod editor;
pub mod error;
pub mod logging;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    Combinator, Comparator, FieldPath, FieldRegistry, FieldType, FilterGroup, FilterNode,
    FilterRule, FilterRuleField, FilterValue, Operator,
};
pub use crate::editor::{GroupEditor, RuleEditor, SearchField, SortEditor, ValueAccessor};
pub use crate::error::FilterError;
pub use crate::services::{QueryRequest, TableQueryState, normalize_filter};

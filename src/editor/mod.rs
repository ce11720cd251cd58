pub mod binding;
pub mod debounce;
pub mod group_editor;
pub mod operators;
pub mod rule_editor;
pub mod search_field;
pub mod sort_editor;

pub use binding::{ChangeCallback, TouchedCallback, ValueAccessor};
pub use group_editor::GroupEditor;
pub use operators::{OperatorOption, OperatorTable};
pub use rule_editor::RuleEditor;
pub use search_field::SearchField;
pub use sort_editor::{SortDirection, SortEditor, SortField, SortItem};

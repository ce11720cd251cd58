//! RuleEditor: state of a single filter rule row (field, operator, value)
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::core::{
    Comparator, FieldOptions, FieldPath, FieldRegistry, FieldType, FilterRule, FilterRuleField,
    FilterValue, Operator,
};
use crate::editor::binding::{Bindings, ChangeCallback, TouchedCallback, ValueAccessor};
use crate::editor::debounce::Debouncer;
use crate::editor::operators::{OperatorOption, OperatorTable};
use crate::error::FilterError;

pub const DEFAULT_RULE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Edits one rule. Field selection picks the operator set, operator and value
/// selection derive a single-comparator `FilterRule`, and `write_value`
/// decomposes an existing rule back into the three selections.
#[derive(Debug)]
pub struct RuleEditor {
    registry: Arc<FieldRegistry>,
    operator_table: Arc<OperatorTable>,
    selected_field: Option<FilterRuleField>,
    operators: Vec<OperatorOption>,
    selected_operator: Option<usize>,
    value: FilterValue,
    rule: FilterRule,
    debounce: Debouncer,
    remove_requested: bool,
    bindings: Bindings<FilterRule>,
}

impl RuleEditor {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self {
            registry,
            operator_table: Arc::new(OperatorTable::default()),
            selected_field: None,
            operators: Vec::new(),
            selected_operator: None,
            value: FilterValue::Null,
            rule: FilterRule::Empty,
            debounce: Debouncer::new(DEFAULT_RULE_DEBOUNCE),
            remove_requested: false,
            bindings: Bindings::new(),
        }
    }

    pub fn with_operator_table(mut self, table: Arc<OperatorTable>) -> Self {
        self.operator_table = table;
        self
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = Debouncer::new(delay);
        self
    }

    pub fn selected_field(&self) -> Option<&FilterRuleField> {
        self.selected_field.as_ref()
    }

    pub fn operators(&self) -> &[OperatorOption] {
        &self.operators
    }

    pub fn selected_operator_index(&self) -> Option<usize> {
        self.selected_operator
    }

    pub fn selected_operator(&self) -> Option<&OperatorOption> {
        self.selected_operator.and_then(|i| self.operators.get(i))
    }

    /// Whether the value input should be hidden for the selected operator
    pub fn value_hidden(&self) -> bool {
        self.selected_operator().is_some_and(|o| o.value_hidden)
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    pub fn rule(&self) -> &FilterRule {
        &self.rule
    }

    pub fn is_update_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Ask the owning group to drop this row
    pub fn request_remove(&mut self) {
        self.remove_requested = true;
    }

    pub fn remove_requested(&self) -> bool {
        self.remove_requested
    }

    /// Report blur to the host
    pub fn touch(&mut self) {
        self.bindings.emit_touched();
    }

    fn field_options(&self) -> Option<&FieldOptions> {
        self.selected_field
            .as_ref()
            .and_then(|f| self.registry.options(&f.field))
    }

    fn load_operators(&mut self, field_type: FieldType) {
        self.operators = self.operator_table.operators(field_type).to_vec();
    }

    /// Select a registered field. Resets the value and selects the type's default operator.
    pub fn select_field(&mut self, path: &FieldPath) -> Result<(), FilterError> {
        let field = self
            .registry
            .find(path)
            .cloned()
            .ok_or_else(|| FilterError::UnregisteredField(path.clone()))?;
        self.load_operators(field.field_type);
        self.selected_operator = self.operator_table.default_index(field.field_type);
        self.selected_field = Some(field);
        self.value = FilterValue::Null;
        self.debounce.cancel();
        self.update_rule();
        Ok(())
    }

    pub fn clear_field(&mut self) {
        self.selected_field = None;
        self.operators.clear();
        self.selected_operator = None;
        self.value = FilterValue::Null;
        self.debounce.cancel();
        self.update_rule();
    }

    /// Select an operator by its position in `operators()`; out of range clears it.
    pub fn select_operator(&mut self, index: usize) {
        self.selected_operator = (index < self.operators.len()).then_some(index);
        self.update_rule();
    }

    /// Store a raw input value. The rule is recomputed after the debounce
    /// delay, or immediately when the field disables debouncing.
    pub fn set_value(&mut self, value: FilterValue, now: Instant) {
        self.value = value;
        if self.field_options().is_some_and(|o| o.disable_update_debounce) {
            self.debounce.cancel();
            self.update_rule();
            return;
        }
        self.debounce.arm(now);
    }

    /// Drive the debounce timer; returns true when the rule was recomputed
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.debounce.poll(now) {
            self.update_rule();
            return true;
        }
        false
    }

    /// Apply a pending value change right away
    pub fn flush(&mut self) {
        if self.debounce.is_pending() {
            self.debounce.cancel();
            self.update_rule();
        }
    }

    /// Derive the rule from the current selections and publish it
    pub fn update_rule(&mut self) {
        self.rule = self.derive_rule();
        trace!(rule = ?self.rule, "rule updated");
        self.bindings.emit_change(&self.rule);
    }

    fn derive_rule(&self) -> FilterRule {
        let (Some(field), Some(option)) = (self.selected_field.as_ref(), self.selected_operator())
        else {
            return FilterRule::Empty;
        };
        let options = self.field_options();
        let value = match options {
            Some(o) => o.to_rule_value(self.value.clone()),
            None => self.value.clone(),
        };
        // an empty multiselect means "no condition"
        if value.is_empty_list() {
            return FilterRule::Empty;
        }

        let operator = options
            .and_then(|o| o.force_operator.clone())
            .unwrap_or_else(|| option.operator.clone());

        if field.field_type == FieldType::Boolean && value.is_null() {
            return FilterRule::Empty;
        }
        if operator == Operator::In && value.is_null() {
            return FilterRule::Empty;
        }

        FilterRule::condition(field.path(), Comparator::new(operator, value))
    }

    /// Returns false when the rule addresses no registered field
    fn decompose(&mut self, rule: &FilterRule) -> bool {
        let FilterRule::Condition { path, comparator } = rule else {
            return false;
        };
        let candidates: Vec<&FilterRuleField> = self.registry.by_name(&path.field).collect();
        let Some(first) = candidates.first() else {
            debug!(field = %path.field, "ignoring rule for unknown field");
            return false;
        };
        // prefer the relation whose sub-field the rule actually addresses
        let field = candidates
            .iter()
            .find(|f| f.sub_field.is_some() && f.sub_field == path.sub_field)
            .copied()
            .unwrap_or(*first)
            .clone();

        self.load_operators(field.field_type);
        self.selected_operator = self
            .operator_table
            .position(field.field_type, &comparator.operator)
            .or_else(|| self.operator_table.default_index(field.field_type));
        let value = comparator.value.clone();
        self.value = match self.registry.options(&field.field) {
            Some(o) => o.from_rule_value(value),
            None => value,
        };
        self.selected_field = Some(field);
        true
    }
}

impl ValueAccessor<FilterRule> for RuleEditor {
    /// Decompose an external rule into field, operator and value. Empty rules,
    /// unknown fields and the rule already held are ignored.
    fn write_value(&mut self, value: FilterRule) {
        if value.is_empty() || value == self.rule {
            return;
        }
        if self.decompose(&value) {
            self.debounce.cancel();
            self.rule = value;
        }
    }

    fn register_on_change(&mut self, callback: ChangeCallback<FilterRule>) {
        self.bindings.set_on_change(callback);
    }

    fn register_on_touched(&mut self, callback: TouchedCallback) {
        self.bindings.set_on_touched(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::binding::testing::recorder;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn registry() -> Arc<FieldRegistry> {
        Arc::new(FieldRegistry::new(vec![
            FilterRuleField::new("name", "Name", FieldType::Text),
            FilterRuleField::new("age", "Age", FieldType::Number),
            FilterRuleField::new("active", "Active", FieldType::Boolean),
            FilterRuleField::new("created", "Created", FieldType::Date),
            FilterRuleField::new("author", "Author name", FieldType::Text).with_sub_field("name"),
            FilterRuleField::new("author", "Author age", FieldType::Number).with_sub_field("age"),
        ]))
    }

    #[test]
    fn selecting_field_picks_default_operator_and_resets_value() {
        let mut editor = RuleEditor::new(registry());
        editor.select_field(&FieldPath::new("age")).unwrap();
        editor.set_value(FilterValue::from(5), Instant::now());
        editor.flush();

        editor.select_field(&FieldPath::new("name")).unwrap();
        assert_eq!(editor.selected_operator().unwrap().operator, Operator::Contains);
        assert_eq!(editor.value(), &FilterValue::Null);
        assert_eq!(
            editor.rule(),
            &FilterRule::condition(
                FieldPath::new("name"),
                Comparator::new(Operator::Contains, FilterValue::Null)
            )
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut editor = RuleEditor::new(registry());
        assert!(matches!(
            editor.select_field(&FieldPath::new("missing")),
            Err(FilterError::UnregisteredField(_))
        ));
    }

    #[test]
    fn value_change_is_debounced() {
        let (callback, seen) = recorder();
        let mut editor = RuleEditor::new(registry());
        editor.register_on_change(callback);
        editor.select_field(&FieldPath::new("name")).unwrap();
        let published = seen.lock().unwrap().len();

        let start = Instant::now();
        editor.set_value(FilterValue::from("ab"), start);
        editor.set_value(FilterValue::from("abc"), start + Duration::from_millis(300));
        assert!(!editor.tick(start + Duration::from_millis(600)));
        assert_eq!(seen.lock().unwrap().len(), published);

        assert!(editor.tick(start + Duration::from_millis(800)));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), published + 1);
        assert_eq!(
            seen.last().unwrap(),
            &FilterRule::condition(
                FieldPath::new("name"),
                Comparator::new(Operator::Contains, "abc")
            )
        );
    }

    #[test]
    fn disabled_debounce_applies_immediately() {
        let registry = Arc::new(
            FieldRegistry::new(vec![FilterRuleField::new("age", "Age", FieldType::Number)])
                .with_options(
                    "age",
                    FieldOptions {
                        disable_update_debounce: true,
                        ..Default::default()
                    },
                ),
        );
        let mut editor = RuleEditor::new(registry);
        editor.select_field(&FieldPath::new("age")).unwrap();
        editor.set_value(FilterValue::from(7), Instant::now());
        assert!(!editor.is_update_pending());
        assert_eq!(editor.rule().comparator().unwrap().value, FilterValue::from(7));
    }

    #[test]
    fn relation_field_wraps_sub_field() {
        let mut editor = RuleEditor::new(registry());
        editor.select_field(&FieldPath::nested("author", "age")).unwrap();
        editor.select_operator(2);
        editor.set_value(FilterValue::from(40), Instant::now());
        editor.flush();
        assert_eq!(
            editor.rule(),
            &FilterRule::condition(
                FieldPath::nested("author", "age"),
                Comparator::new(Operator::Gt, 40)
            )
        );
    }

    #[test]
    fn boolean_without_value_is_empty() {
        let mut editor = RuleEditor::new(registry());
        editor.select_field(&FieldPath::new("active")).unwrap();
        assert_eq!(editor.rule(), &FilterRule::Empty);

        editor.set_value(FilterValue::from(false), Instant::now());
        editor.flush();
        assert_eq!(
            editor.rule(),
            &FilterRule::condition(FieldPath::new("active"), Comparator::new(Operator::Is, false))
        );
    }

    #[test]
    fn empty_list_and_null_in_are_empty() {
        let registry = Arc::new(
            FieldRegistry::new(vec![FilterRuleField::new("tag", "Tag", FieldType::Text)])
                .with_options(
                    "tag",
                    FieldOptions {
                        force_operator: Some(Operator::In),
                        ..Default::default()
                    },
                ),
        );
        let mut editor = RuleEditor::new(registry);
        editor.select_field(&FieldPath::new("tag")).unwrap();
        assert_eq!(editor.rule(), &FilterRule::Empty);

        editor.set_value(FilterValue::List(vec![]), Instant::now());
        editor.flush();
        assert_eq!(editor.rule(), &FilterRule::Empty);

        editor.set_value(FilterValue::from(vec!["a"]), Instant::now());
        editor.flush();
        assert_eq!(
            editor.rule(),
            &FilterRule::condition(FieldPath::new("tag"), Comparator::new(Operator::In, vec!["a"]))
        );
    }

    #[test]
    fn value_transforms_apply_both_ways() {
        let registry = Arc::new(
            FieldRegistry::new(vec![FilterRuleField::new("code", "Code", FieldType::Text)])
                .with_options(
                    "code",
                    FieldOptions {
                        value_to_rule_value: Some(Arc::new(|v: FilterValue| {
                            FilterValue::Text(v.to_text().to_uppercase())
                        })),
                        rule_value_to_value: Some(Arc::new(|v: FilterValue| {
                            FilterValue::Text(v.to_text().to_lowercase())
                        })),
                        ..Default::default()
                    },
                ),
        );
        let mut editor = RuleEditor::new(Arc::clone(&registry));
        editor.select_field(&FieldPath::new("code")).unwrap();
        editor.set_value(FilterValue::from("ab"), Instant::now());
        editor.flush();
        let rule = editor.rule().clone();
        assert_eq!(rule.comparator().unwrap().value, FilterValue::from("AB"));

        let mut other = RuleEditor::new(registry);
        other.write_value(rule);
        assert_eq!(other.value(), &FilterValue::from("ab"));
    }

    #[test]
    fn write_value_prefers_matching_relation() {
        let mut editor = RuleEditor::new(registry());
        editor.write_value(FilterRule::condition(
            FieldPath::nested("author", "age"),
            Comparator::new(Operator::Lte, 30),
        ));
        assert_eq!(editor.selected_field().unwrap().path(), FieldPath::nested("author", "age"));
        assert_eq!(editor.selected_operator().unwrap().operator, Operator::Lte);
        assert_eq!(editor.value(), &FilterValue::from(30));
    }

    #[test]
    fn write_value_falls_back_to_default_operator() {
        let mut editor = RuleEditor::new(registry());
        editor.write_value(FilterRule::condition(
            FieldPath::new("age"),
            Comparator::new(Operator::Custom("between".into()), 1),
        ));
        assert_eq!(editor.selected_operator().unwrap().operator, Operator::Equals);
    }

    #[test]
    fn write_value_ignores_unknown_and_empty() {
        let mut editor = RuleEditor::new(registry());
        editor.write_value(FilterRule::Empty);
        editor.write_value(FilterRule::condition(
            FieldPath::new("missing"),
            Comparator::new(Operator::Equals, 1),
        ));
        assert!(editor.selected_field().is_none());
    }

    #[test]
    fn write_value_does_not_publish() {
        let (callback, seen) = recorder();
        let mut editor = RuleEditor::new(registry());
        editor.register_on_change(callback);
        editor.write_value(FilterRule::condition(
            FieldPath::new("name"),
            Comparator::new(Operator::StartsWith, "x"),
        ));
        assert!(seen.lock().unwrap().is_empty());
    }

    fn round_trip(editor: &mut RuleEditor, path: &FieldPath, index: usize, value: FilterValue) {
        editor.select_field(path).unwrap();
        editor.select_operator(index);
        editor.set_value(value.clone(), Instant::now());
        editor.flush();
        let rule = editor.rule().clone();

        let mut fresh = RuleEditor::new(registry());
        fresh.write_value(rule.clone());
        let expected_index = match (fresh.selected_field().unwrap().field_type, index) {
            // "is not" reads back as "is": both emit `equals`
            (FieldType::Text, 7) => 6,
            _ => index,
        };
        assert_eq!(fresh.selected_field().unwrap().path(), *path, "{rule:?}");
        assert_eq!(fresh.selected_operator_index(), Some(expected_index), "{rule:?}");
        assert_eq!(fresh.value(), &value, "{rule:?}");

        // writing the derived rule back is a no-op
        editor.write_value(rule.clone());
        assert_eq!(editor.selected_operator_index(), Some(index));
        assert_eq!(editor.rule(), &rule);
    }

    #[test]
    fn every_operator_round_trips() {
        let date = FilterValue::from(Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap());
        let cases = [
            (FieldPath::new("name"), FilterValue::from("abc")),
            (FieldPath::new("age"), FilterValue::from(42)),
            (FieldPath::new("created"), date),
            (FieldPath::new("active"), FilterValue::from(true)),
            (FieldPath::nested("author", "name"), FilterValue::from("ann")),
        ];
        let mut editor = RuleEditor::new(registry());
        for (path, value) in cases {
            editor.select_field(&path).unwrap();
            for index in 0..editor.operators().len() {
                round_trip(&mut editor, &path, index, value.clone());
            }
        }
    }
}

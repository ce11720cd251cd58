//! SearchField: fulltext input with debounced publication
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use crate::editor::debounce::{DebouncedSender, debounced_channel};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Typed text is published on the returned receiver once the user pauses;
/// clearing publishes immediately. Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct SearchField {
    value: Option<String>,
    input_visible: bool,
    sender: DebouncedSender<Option<String>>,
}

impl SearchField {
    pub fn new(delay: Duration) -> (Self, UnboundedReceiver<Option<String>>) {
        let (sender, changes) = debounced_channel(delay);
        (
            Self {
                value: None,
                input_visible: false,
                sender,
            },
            changes,
        )
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_input_visible(&self) -> bool {
        self.input_visible
    }

    /// Returns false when the publishing task is gone and the edit was not queued
    pub fn set_value(&mut self, value: Option<String>) -> bool {
        self.value = value.clone();
        let queued = self.sender.send(value);
        if !queued {
            warn!("search channel closed, fulltext change not published");
        }
        queued
    }

    /// Set from the host without publishing
    pub fn write_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn clear(&mut self) -> bool {
        self.value = None;
        let sent = self.sender.send_now(None);
        if !sent {
            warn!("search channel closed, clear not published");
        }
        sent
    }

    pub fn show_input(&mut self) {
        self.input_visible = true;
    }

    /// The input collapses on blur unless it holds text
    pub fn on_blur(&mut self) {
        if self.value.as_deref().is_none_or(str::is_empty) {
            self.input_visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn typing_is_coalesced() {
        let (mut field, mut changes) = SearchField::new(DEFAULT_SEARCH_DEBOUNCE);
        field.set_value(Some("f".into()));
        field.set_value(Some("fo".into()));
        field.set_value(Some("foo".into()));
        assert_eq!(changes.recv().await, Some(Some("foo".to_string())));
        assert_eq!(field.value(), Some("foo"));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_publishes_immediately() {
        let (mut field, mut changes) = SearchField::new(DEFAULT_SEARCH_DEBOUNCE);
        field.set_value(Some("foo".into()));
        field.clear();
        assert_eq!(changes.recv().await, Some(None));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn lost_channel_is_reported() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (mut field, _changes) = runtime.block_on(async { SearchField::new(DEFAULT_SEARCH_DEBOUNCE) });
        drop(runtime);

        assert!(!field.set_value(Some("x".into())));
        assert_eq!(field.value(), Some("x"));
        assert!(!field.clear());
    }

    #[tokio::test]
    async fn blur_hides_empty_input() {
        let (mut field, _changes) = SearchField::new(DEFAULT_SEARCH_DEBOUNCE);
        field.show_input();
        field.on_blur();
        assert!(!field.is_input_visible());

        field.show_input();
        field.write_value(Some("x".into()));
        field.on_blur();
        assert!(field.is_input_visible());
    }
}

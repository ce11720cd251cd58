//! Control-like binding contract between editors and the UI layer that hosts them

use std::fmt;

pub type ChangeCallback<T> = Box<dyn FnMut(&T) + Send>;
pub type TouchedCallback = Box<dyn FnMut() + Send>;

/// Value binding implemented by every editor.
///
/// The host pushes external values with `write_value` and is told about user
/// edits through the change callback. Writing the value the editor currently
/// holds is a no-op, so echoing a published value back does not loop.
pub trait ValueAccessor<T> {
    /// Push an externally owned value into the editor without publishing it back
    fn write_value(&mut self, value: T);

    fn register_on_change(&mut self, callback: ChangeCallback<T>);

    fn register_on_touched(&mut self, callback: TouchedCallback);
}

/// Registered callbacks of one editor
pub struct Bindings<T> {
    on_change: Option<ChangeCallback<T>>,
    on_touched: Option<TouchedCallback>,
}

impl<T> Bindings<T> {
    pub fn new() -> Self {
        Self {
            on_change: None,
            on_touched: None,
        }
    }

    pub fn set_on_change(&mut self, callback: ChangeCallback<T>) {
        self.on_change = Some(callback);
    }

    pub fn set_on_touched(&mut self, callback: TouchedCallback) {
        self.on_touched = Some(callback);
    }

    pub fn emit_change(&mut self, value: &T) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(value);
        }
    }

    pub fn emit_touched(&mut self) {
        if let Some(callback) = self.on_touched.as_mut() {
            callback();
        }
    }
}

impl<T> Default for Bindings<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Bindings<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("on_change", &self.on_change.is_some())
            .field("on_touched", &self.on_touched.is_some())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every published value
    pub fn recorder<T: Clone + Send + 'static>() -> (ChangeCallback<T>, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ChangeCallback<T> = Box::new(move |value: &T| {
            sink.lock().unwrap().push(value.clone());
        });
        (callback, seen)
    }
}

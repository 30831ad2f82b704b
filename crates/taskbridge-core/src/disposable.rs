//! Handles returned by listener registration.

use std::fmt;

/// Removes a registered listener when disposed.
///
/// Dropping a `Disposable` does NOT remove the listener; registration
/// lives until `dispose()` is called or the registry itself is dropped.
#[must_use = "dropping a Disposable keeps the listener registered"]
pub struct Disposable {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposable {
    /// Create a disposable that runs `f` on first disposal.
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(f)),
        }
    }

    /// A disposable with nothing to undo.
    pub fn empty() -> Self {
        Self { dispose: None }
    }

    /// Run the disposal action. Later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }

    /// Returns true once disposed (or if created empty).
    pub fn is_disposed(&self) -> bool {
        self.dispose.is_none()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

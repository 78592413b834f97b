//! Stock [`Notifier`] implementations.

use std::sync::Arc;

use parking_lot::Mutex;

use modelkit_core::{ChangeNotification, Notifier, NotifyError, Record, Verb};

/// Accepts every change and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(
        &self,
        _kind: &str,
        _verb: Verb,
        _before: Option<&Record>,
        _after: Option<&Record>,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Keeps every change it is given, in order.
///
/// Useful for backends that drain events after the fact, and for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ChangeNotification>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded events.
    pub fn events(&self) -> Vec<ChangeNotification> {
        self.events.lock().clone()
    }

    /// Remove and return the recorded events.
    pub fn drain(&self) -> Vec<ChangeNotification> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        kind: &str,
        verb: Verb,
        before: Option<&Record>,
        after: Option<&Record>,
    ) -> Result<(), NotifyError> {
        self.events
            .lock()
            .push(ChangeNotification::capture(kind, verb, before, after));
        Ok(())
    }
}

/// Delivers each change to several backends in order.
///
/// Stops at the first failing backend and returns its error; backends after
/// it are not called for that change.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    backends: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    /// Create a fan-out with no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend.
    #[must_use]
    pub fn with(mut self, backend: impl Notifier + 'static) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Number of backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// True if there are no backends.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for FanoutNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutNotifier")
            .field("backends", &self.backends.len())
            .finish()
    }
}

impl Notifier for FanoutNotifier {
    fn notify(
        &self,
        kind: &str,
        verb: Verb,
        before: Option<&Record>,
        after: Option<&Record>,
    ) -> Result<(), NotifyError> {
        for backend in &self.backends {
            backend.notify(kind, verb, before, after)?;
        }
        Ok(())
    }
}

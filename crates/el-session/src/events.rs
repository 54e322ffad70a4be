//! Notifications produced by an edit session.

use std::fmt;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use el_edit::GuardNote;
use el_model::{EngineSpec, FieldPath, PatchValue};
use serde::Serialize;

/// A requested value that policy adjusted or ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardRail {
    pub path: FieldPath,
    pub requested: PatchValue,
    pub note: GuardNote,
}

impl GuardRail {
    /// Human-readable note, e.g. `RevLimit_RPM: clamped to 8000`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GuardRail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.note)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The current snapshot after a quiet period.
    SpecChanged(Arc<EngineSpec>),
    GuardRail(GuardRail),
}

type SpecCallback = Arc<dyn Fn(&Arc<EngineSpec>) + Send + Sync>;
type GuardCallback = Arc<dyn Fn(&GuardRail) + Send + Sync>;

/// Fan-out to registered callbacks and channel subscribers.
///
/// Callbacks are cloned out of the registry before they run, so a callback
/// may register further callbacks.
#[derive(Default)]
pub(crate) struct EventHub {
    spec_callbacks: Mutex<Vec<SpecCallback>>,
    guard_callbacks: Mutex<Vec<GuardCallback>>,
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EventHub {
    pub(crate) fn on_spec_changed(&self, f: impl Fn(&Arc<EngineSpec>) + Send + Sync + 'static) {
        lock(&self.spec_callbacks).push(Arc::new(f));
    }

    pub(crate) fn on_guardrail(&self, f: impl Fn(&GuardRail) + Send + Sync + 'static) {
        lock(&self.guard_callbacks).push(Arc::new(f));
    }

    pub(crate) fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    pub(crate) fn spec_changed(&self, spec: Arc<EngineSpec>) {
        let callbacks = lock(&self.spec_callbacks).clone();
        for cb in &callbacks {
            cb(&spec);
        }
        self.broadcast(SessionEvent::SpecChanged(spec));
    }

    pub(crate) fn guardrail(&self, guard: GuardRail) {
        let callbacks = lock(&self.guard_callbacks).clone();
        for cb in &callbacks {
            cb(&guard);
        }
        self.broadcast(SessionEvent::GuardRail(guard));
    }

    fn broadcast(&self, event: SessionEvent) {
        // dropped receivers unsubscribe themselves
        lock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }
}

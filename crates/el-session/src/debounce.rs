//! Single-shot cancellable delay running on one worker thread.
//!
//! Every `arm` bumps a generation counter and replaces the deadline, so at
//! most one firing is pending. `cancel` clears the deadline under the same
//! lock the worker checks before firing; a cancelled timer never fires.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Default)]
struct TimerState {
    generation: u64,
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Default)]
struct Timer {
    state: Mutex<TimerState>,
    wake: Condvar,
}

impl Timer {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) struct Debouncer {
    delay: Duration,
    timer: Arc<Timer>,
    worker: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Start the worker. `fire` runs on the worker thread with the
    /// generation that expired.
    pub(crate) fn spawn(delay: Duration, fire: impl Fn(u64) + Send + 'static) -> Self {
        let timer = Arc::new(Timer::default());
        let worker = {
            let timer = timer.clone();
            thread::spawn(move || run(&timer, fire))
        };
        Self {
            delay,
            timer,
            worker: Some(worker),
        }
    }

    /// Schedule a firing `delay` from now, superseding any pending one.
    pub(crate) fn arm(&self) -> u64 {
        let mut state = self.timer.lock();
        if state.deadline.is_some() {
            debug!(generation = state.generation, "debounce superseded");
        }
        state.generation += 1;
        state.deadline = Some(Instant::now() + self.delay);
        debug!(generation = state.generation, delay_ms = self.delay.as_millis() as u64, "debounce armed");
        self.timer.wake.notify_all();
        state.generation
    }

    /// Drop the pending firing. Returns whether one was pending.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.timer.lock();
        let was_pending = state.deadline.take().is_some();
        if was_pending {
            state.generation += 1;
            debug!(generation = state.generation, "debounce cancelled");
            self.timer.wake.notify_all();
        }
        was_pending
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.timer.lock().deadline.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        {
            let mut state = self.timer.lock();
            state.shutdown = true;
            state.deadline = None;
            self.timer.wake.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

fn run(timer: &Timer, fire: impl Fn(u64)) {
    let mut state = timer.lock();
    loop {
        if state.shutdown {
            return;
        }
        let Some(deadline) = state.deadline else {
            state = timer
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        };
        let now = Instant::now();
        if now < deadline {
            state = match timer.wake.wait_timeout(state, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
            continue;
        }

        state.deadline = None;
        let generation = state.generation;
        drop(state);
        debug!(generation, "debounce fired");
        fire(generation);
        state = timer.lock();
    }
}

//! Shared cancellation for listener registrations.
//!
//! Every listener a knob installs (pointer, keyboard, readout, focus and
//! the document-level drag listeners) is registered against one
//! [`AbortSignal`]. Aborting it removes all of them at once.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type AbortCallback = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbortRegistration(u64);

#[derive(Default)]
struct SignalState {
    aborted: Cell<bool>,
    next_id: Cell<u64>,
    callbacks: RefCell<Vec<(AbortRegistration, AbortCallback)>>,
}

#[derive(Clone, Default)]
pub struct AbortSignal {
    state: Rc<SignalState>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.get()
    }

    /// Runs `callback` once when the signal aborts. Returns `None` if the
    /// signal has already fired, in which case the callback is dropped.
    pub fn on_abort(&self, callback: impl FnOnce() + 'static) -> Option<AbortRegistration> {
        if self.is_aborted() {
            return None;
        }
        let id = AbortRegistration(self.state.next_id.get());
        self.state.next_id.set(id.0 + 1);
        self.state
            .callbacks
            .borrow_mut()
            .push((id, Box::new(callback)));
        Some(id)
    }

    /// Drops a pending callback without running it.
    pub fn forget(&self, registration: AbortRegistration) {
        if let Ok(mut callbacks) = self.state.callbacks.try_borrow_mut() {
            callbacks.retain(|(id, _)| *id != registration);
        }
    }

    pub fn pending(&self) -> usize {
        self.state.callbacks.borrow().len()
    }

    pub fn same_signal(&self, other: &AbortSignal) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    fn fire(&self) -> usize {
        if self.state.aborted.replace(true) {
            return 0;
        }
        let callbacks = std::mem::take(&mut *self.state.callbacks.borrow_mut());
        let count = callbacks.len();
        for (_, callback) in callbacks {
            callback();
        }
        count
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .field("pending", &self.pending())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Fires the signal. Only the first call has any effect.
    pub fn abort(&self) {
        let removed = self.signal.fire();
        if removed > 0 {
            log::debug!("Aborted {} listener registrations", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_runs_each_callback_once() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let hits = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            signal.on_abort(move || hits.set(hits.get() + 1));
        }

        controller.abort();
        controller.abort();

        assert_eq!(hits.get(), 3);
        assert!(signal.is_aborted());
        assert_eq!(signal.pending(), 0);
    }

    #[test]
    fn forgotten_callbacks_do_not_run() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let hits = Rc::new(Cell::new(0));

        let kept = hits.clone();
        signal.on_abort(move || kept.set(kept.get() + 1));
        let dropped = hits.clone();
        let registration = signal
            .on_abort(move || dropped.set(dropped.get() + 10))
            .unwrap();
        signal.forget(registration);

        controller.abort();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn registering_after_abort_is_refused() {
        let controller = AbortController::new();
        controller.abort();
        assert!(controller.signal().on_abort(|| {}).is_none());
    }
}

//! Event targets and the knob signal protocol.
//!
//! An [`EventTarget`] is a node in a small DOM-like tree. Listeners are
//! keyed by [`EventKind`] and run synchronously in registration order.
//! Events that bubble continue to each ancestor after the target itself.
//!
//! The knob protocol is the closed set of [`KnobSignal`]s. Input
//! controllers emit them on the knob element and the knob subscribes to
//! them, so neither side holds a reference to the other.

use crate::abort::{AbortRegistration, AbortSignal};
use crate::error::KnobError;
use crate::input::{FocusEvent, KeyEvent, PointerEvent};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
pub enum Direction {
    #[strum(serialize = "+1")]
    Clockwise,
    #[strum(serialize = "-1")]
    CounterClockwise,
}

impl Direction {
    pub fn sign(&self) -> i8 {
        match self {
            Self::Clockwise => 1,
            Self::CounterClockwise => -1,
        }
    }

    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            Self::Clockwise
        } else {
            Self::CounterClockwise
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, StrumDisplay, IntoStaticStr,
)]
pub enum SignalKind {
    #[strum(serialize = "knob-value-change")]
    ValueChange,
    #[strum(serialize = "knob-value-relative-change")]
    ValueRelativeChange,
    #[strum(serialize = "knob-direction-change")]
    DirectionChange,
    #[strum(serialize = "knob-value-input-mode-toggle")]
    ValueInputModeToggle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnobSignal {
    ValueChange { value: f64 },
    ValueRelativeChange { value: f64 },
    DirectionChange { direction: Direction },
    ValueInputModeToggle,
}

impl KnobSignal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::ValueChange { .. } => SignalKind::ValueChange,
            Self::ValueRelativeChange { .. } => SignalKind::ValueRelativeChange,
            Self::DirectionChange { .. } => SignalKind::DirectionChange,
            Self::ValueInputModeToggle => SignalKind::ValueInputModeToggle,
        }
    }
}

/// Payload of the public `change` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDetail {
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum Event {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    KeyDown(KeyEvent),
    KeyPress(KeyEvent),
    FocusIn(FocusEvent),
    FocusOut(FocusEvent),
    /// The readout's edited text, sent when editing is committed.
    Commit(String),
    Signal(KnobSignal),
    Change(ChangeDetail),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerDown(_) => EventKind::PointerDown,
            Self::PointerMove(_) => EventKind::PointerMove,
            Self::PointerUp(_) => EventKind::PointerUp,
            Self::KeyDown(_) => EventKind::KeyDown,
            Self::KeyPress(_) => EventKind::KeyPress,
            Self::FocusIn(_) => EventKind::FocusIn,
            Self::FocusOut(_) => EventKind::FocusOut,
            Self::Commit(_) => EventKind::Commit,
            Self::Signal(signal) => EventKind::Signal(signal.kind()),
            Self::Change(_) => EventKind::Change,
        }
    }

    pub fn bubbles(&self) -> bool {
        !matches!(self, Self::Signal(_) | Self::Commit(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    KeyDown,
    KeyPress,
    FocusIn,
    FocusOut,
    Commit,
    Change,
    Signal(SignalKind),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
            Self::KeyDown => "keydown",
            Self::KeyPress => "keypress",
            Self::FocusIn => "focusin",
            Self::FocusOut => "focusout",
            Self::Commit => "commit",
            Self::Change => "change",
            Self::Signal(kind) => (*kind).into(),
        };
        f.write_str(name)
    }
}

impl From<SignalKind> for EventKind {
    fn from(kind: SignalKind) -> Self {
        Self::Signal(kind)
    }
}

#[derive(Default)]
struct DispatchState {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

/// Per-listener view of an in-flight dispatch.
pub struct Dispatch<'a> {
    target: &'a EventTarget,
    current_target: &'a EventTarget,
    state: &'a DispatchState,
}

impl Dispatch<'_> {
    pub fn target(&self) -> &EventTarget {
        self.target
    }

    pub fn current_target(&self) -> &EventTarget {
        self.current_target
    }

    pub fn prevent_default(&self) {
        self.state.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.state.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.state.propagation_stopped.set(true);
    }
}

pub type Listener = Rc<dyn Fn(&Event, &Dispatch<'_>)>;
pub type SignalListener = Rc<dyn Fn(&KnobSignal)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    kind: EventKind,
    identity: *const (),
    callback: Listener,
    live: Rc<Cell<bool>>,
    abort: Option<(AbortSignal, AbortRegistration)>,
}

#[derive(Default)]
struct Node {
    name: String,
    parent: RefCell<Weak<Node>>,
    listeners: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

#[derive(Clone)]
pub struct EventTarget {
    node: Rc<Node>,
}

#[derive(Clone, Default)]
pub struct WeakEventTarget {
    node: Weak<Node>,
}

impl WeakEventTarget {
    pub fn upgrade(&self) -> Option<EventTarget> {
        self.node.upgrade().map(|node| EventTarget { node })
    }
}

impl EventTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            node: Rc::new(Node {
                name: name.into(),
                ..Node::default()
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn downgrade(&self) -> WeakEventTarget {
        WeakEventTarget {
            node: Rc::downgrade(&self.node),
        }
    }

    pub fn same_node(&self, other: &EventTarget) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn append_child(&self, child: &EventTarget) {
        *child.node.parent.borrow_mut() = Rc::downgrade(&self.node);
    }

    pub fn parent(&self) -> Option<EventTarget> {
        self.node
            .parent
            .borrow()
            .upgrade()
            .map(|node| EventTarget { node })
    }

    /// Inclusive descendant check, like `Node.contains`.
    pub fn contains(&self, other: &EventTarget) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.same_node(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Registers `callback` for `kind`. When `signal` is given the listener
    /// is removed as soon as it aborts; an already-aborted signal means the
    /// listener is never added and `None` is returned.
    pub fn add_listener(
        &self,
        kind: impl Into<EventKind>,
        callback: Listener,
        signal: Option<&AbortSignal>,
    ) -> Option<ListenerId> {
        let identity = Rc::as_ptr(&callback) as *const ();
        self.insert(kind.into(), identity, callback, signal)
    }

    fn insert(
        &self,
        kind: EventKind,
        identity: *const (),
        callback: Listener,
        signal: Option<&AbortSignal>,
    ) -> Option<ListenerId> {
        if signal.is_some_and(AbortSignal::is_aborted) {
            return None;
        }

        let id = ListenerId(self.node.next_id.get());
        self.node.next_id.set(id.0 + 1);

        let abort = signal.and_then(|signal| {
            let target = self.downgrade();
            signal
                .on_abort(move || {
                    if let Some(target) = target.upgrade() {
                        target.remove_listener_id(id);
                    }
                })
                .map(|registration| (signal.clone(), registration))
        });

        self.node.listeners.borrow_mut().push(Entry {
            id,
            kind,
            identity,
            callback,
            live: Rc::new(Cell::new(true)),
            abort,
        });
        Some(id)
    }

    /// Removes the listener registered for `kind` with this exact callback.
    pub fn remove_listener(&self, kind: impl Into<EventKind>, callback: &Listener) -> bool {
        self.remove_identity(kind.into(), Rc::as_ptr(callback) as *const ())
    }

    fn remove_identity(&self, kind: EventKind, identity: *const ()) -> bool {
        let id = self
            .node
            .listeners
            .borrow()
            .iter()
            .find(|entry| entry.kind == kind && std::ptr::eq(entry.identity, identity))
            .map(|entry| entry.id);
        id.is_some_and(|id| self.remove_listener_id(id))
    }

    pub fn remove_listener_id(&self, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.node.listeners.borrow_mut();
            listeners
                .iter()
                .position(|entry| entry.id == id)
                .map(|index| listeners.remove(index))
        };

        match removed {
            Some(entry) => {
                entry.live.set(false);
                if let Some((signal, registration)) = entry.abort {
                    signal.forget(registration);
                }
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self, kind: impl Into<EventKind>) -> usize {
        let kind = kind.into();
        self.node
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    /// Delivers `event` synchronously to this target and, for bubbling
    /// events, to each ancestor. Returns `false` if a listener called
    /// [`Dispatch::prevent_default`].
    pub fn dispatch(&self, event: Event) -> bool {
        let kind = event.kind();
        let state = DispatchState::default();

        let mut path = vec![self.clone()];
        if event.bubbles() {
            let mut current = self.parent();
            while let Some(node) = current {
                current = node.parent();
                path.push(node);
            }
        }

        for current_target in &path {
            let snapshot: Vec<(Listener, Rc<Cell<bool>>)> = current_target
                .node
                .listeners
                .borrow()
                .iter()
                .filter(|entry| entry.kind == kind)
                .map(|entry| (entry.callback.clone(), entry.live.clone()))
                .collect();

            let dispatch = Dispatch {
                target: self,
                current_target,
                state: &state,
            };

            for (callback, live) in snapshot {
                if live.get() {
                    callback(&event, &dispatch);
                }
            }

            if state.propagation_stopped.get() {
                break;
            }
        }

        !state.default_prevented.get()
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("name", &self.node.name)
            .field("listeners", &self.node.listeners.borrow().len())
            .finish()
    }
}

impl fmt::Debug for WeakEventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakEventTarget")
            .field(&self.upgrade().map(|t| t.name().to_string()))
            .finish()
    }
}

pub fn emit_event(target: Option<&EventTarget>, signal: KnobSignal) -> Result<(), KnobError> {
    let target = target.ok_or(KnobError::InvalidTarget)?;
    target.dispatch(Event::Signal(signal));
    Ok(())
}

/// Subscribes `callback` to one signal kind. The registration is keyed by
/// the callback's identity so the same `Rc` removes it again.
pub fn listen_to_event(
    target: Option<&EventTarget>,
    kind: SignalKind,
    callback: SignalListener,
    signal: Option<&AbortSignal>,
) -> Result<Option<ListenerId>, KnobError> {
    let target = target.ok_or(KnobError::InvalidTarget)?;
    let identity = Rc::as_ptr(&callback) as *const ();
    let listener: Listener = Rc::new(move |event, _| {
        if let Event::Signal(signal) = event {
            callback(signal);
        }
    });
    Ok(target.insert(kind.into(), identity, listener, signal))
}

pub fn remove_event(
    target: Option<&EventTarget>,
    kind: SignalKind,
    callback: &SignalListener,
) -> Result<bool, KnobError> {
    let target = target.ok_or(KnobError::InvalidTarget)?;
    Ok(target.remove_identity(kind.into(), Rc::as_ptr(callback) as *const ()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::AbortController;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn recorder() -> (Rc<RefCell<Vec<KnobSignal>>>, SignalListener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener: SignalListener = Rc::new(move |signal| sink.borrow_mut().push(*signal));
        (seen, listener)
    }

    #[test]
    fn signal_names() {
        let names: Vec<String> = SignalKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            [
                "knob-value-change",
                "knob-value-relative-change",
                "knob-direction-change",
                "knob-value-input-mode-toggle",
            ]
        );
        assert_eq!(
            SignalKind::from_str("knob-direction-change").unwrap(),
            SignalKind::DirectionChange
        );
        assert_eq!(
            EventKind::from(SignalKind::ValueChange).to_string(),
            "knob-value-change"
        );
    }

    #[test]
    fn missing_target_is_rejected() {
        let (_, listener) = recorder();
        assert_eq!(
            emit_event(None, KnobSignal::ValueInputModeToggle),
            Err(KnobError::InvalidTarget)
        );
        assert_eq!(
            listen_to_event(None, SignalKind::ValueChange, listener.clone(), None),
            Err(KnobError::InvalidTarget)
        );
        assert_eq!(
            remove_event(None, SignalKind::ValueChange, &listener),
            Err(KnobError::InvalidTarget)
        );
    }

    #[test]
    fn listeners_receive_only_their_signal() {
        let target = EventTarget::new("knob");
        let (seen, listener) = recorder();
        listen_to_event(Some(&target), SignalKind::ValueChange, listener, None).unwrap();

        emit_event(Some(&target), KnobSignal::ValueChange { value: 0.25 }).unwrap();
        emit_event(Some(&target), KnobSignal::ValueRelativeChange { value: 0.1 }).unwrap();

        assert_eq!(*seen.borrow(), [KnobSignal::ValueChange { value: 0.25 }]);
    }

    #[test]
    fn removal_is_by_kind_and_identity() {
        let target = EventTarget::new("knob");
        let (seen, listener) = recorder();
        let (_, other) = recorder();
        listen_to_event(Some(&target), SignalKind::ValueChange, listener.clone(), None).unwrap();

        assert!(!remove_event(Some(&target), SignalKind::ValueChange, &other).unwrap());
        assert!(!remove_event(Some(&target), SignalKind::DirectionChange, &listener).unwrap());
        assert!(remove_event(Some(&target), SignalKind::ValueChange, &listener).unwrap());

        emit_event(Some(&target), KnobSignal::ValueChange { value: 0.5 }).unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn change_bubbles_but_signals_do_not() {
        let card = EventTarget::new("card");
        let knob = EventTarget::new("knob");
        card.append_child(&knob);

        let hits = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::Change, EventKind::Signal(SignalKind::ValueChange)] {
            let hits = hits.clone();
            card.add_listener(
                kind,
                Rc::new(move |event, dispatch| {
                    assert_eq!(dispatch.target().name(), "knob");
                    assert_eq!(dispatch.current_target().name(), "card");
                    hits.borrow_mut().push(event.kind());
                }),
                None,
            );
        }

        knob.dispatch(Event::Change(ChangeDetail {
            value: "1.0".to_string(),
        }));
        knob.dispatch(Event::Signal(KnobSignal::ValueChange { value: 0.1 }));

        assert_eq!(*hits.borrow(), [EventKind::Change]);
    }

    #[test]
    fn abort_removes_listeners_on_every_target() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let element = EventTarget::new("knob");
        let document = EventTarget::new("document");

        let noop: Listener = Rc::new(|_, _| {});
        element.add_listener(EventKind::PointerDown, noop.clone(), Some(&signal));
        document.add_listener(EventKind::PointerMove, noop.clone(), Some(&signal));
        document.add_listener(EventKind::PointerUp, noop.clone(), None);

        controller.abort();

        assert_eq!(element.listener_count(EventKind::PointerDown), 0);
        assert_eq!(document.listener_count(EventKind::PointerMove), 0);
        assert_eq!(document.listener_count(EventKind::PointerUp), 1);
        assert!(
            element
                .add_listener(EventKind::PointerDown, noop, Some(&signal))
                .is_none()
        );
    }

    #[test]
    fn manual_removal_forgets_abort_registration() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let target = EventTarget::new("document");

        let noop: Listener = Rc::new(|_, _| {});
        let id = target
            .add_listener(EventKind::PointerMove, noop, Some(&signal))
            .unwrap();
        assert_eq!(signal.pending(), 1);

        assert!(target.remove_listener_id(id));
        assert_eq!(signal.pending(), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_does_not_run() {
        let target = EventTarget::new("knob");
        let ran = Rc::new(Cell::new(false));
        let second_id = Rc::new(Cell::new(None));

        let ids = second_id.clone();
        let first: Listener = Rc::new(move |_, dispatch| {
            if let Some(id) = ids.get() {
                dispatch.current_target().remove_listener_id(id);
            }
        });
        let flag = ran.clone();
        let second: Listener = Rc::new(move |_, _| flag.set(true));

        target.add_listener(EventKind::KeyDown, first, None);
        second_id.set(target.add_listener(EventKind::KeyDown, second, None));

        target.dispatch(Event::KeyDown(crate::input::KeyEvent::new('a')));
        assert!(!ran.get());
    }

    #[test]
    fn prevent_default_is_reported() {
        let target = EventTarget::new("readout");
        target.add_listener(
            EventKind::KeyPress,
            Rc::new(|_, dispatch| dispatch.prevent_default()),
            None,
        );
        assert!(!target.dispatch(Event::KeyPress(crate::input::KeyEvent::new('x'))));
        assert!(target.dispatch(Event::KeyDown(crate::input::KeyEvent::new('x'))));
    }

    #[test]
    fn containment() {
        let root = EventTarget::new("root");
        let child = EventTarget::new("child");
        let grandchild = EventTarget::new("grandchild");
        let stranger = EventTarget::new("stranger");
        root.append_child(&child);
        child.append_child(&grandchild);

        assert!(root.contains(&root));
        assert!(root.contains(&grandchild));
        assert!(!grandchild.contains(&root));
        assert!(!root.contains(&stranger));
    }
}

//! Pointer drag handling.
//!
//! A drag starts on the knob element and continues on the document, so the
//! pointer may leave the element without breaking the angle computation.
//! The center is captured once when the drag begins.

use crate::abort::AbortSignal;
use crate::error::KnobError;
use crate::events::{Direction, Event, EventKind, EventTarget, KnobSignal, ListenerId, Listener};
use crate::geometry::{
    Bounds, Point, angle_from_vector, center_of, degree_to_normalized, vector_between,
};
use crate::input::PointerEvent;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Supplies the element's current bounding box in pointer coordinates.
pub trait BoundsProvider {
    fn bounding_rect(&self) -> Bounds;
}

impl<F> BoundsProvider for F
where
    F: Fn() -> Bounds,
{
    fn bounding_rect(&self) -> Bounds {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Default)]
struct Session {
    state: GestureState,
    center: Point,
    last_value: f64,
    last_direction: Option<Direction>,
    document_listeners: Vec<ListenerId>,
}

struct Inner {
    element: EventTarget,
    document: EventTarget,
    bounds: Rc<dyn BoundsProvider>,
    signal: Option<AbortSignal>,
    session: RefCell<Session>,
}

pub struct GestureController {
    inner: Rc<Inner>,
}

impl GestureController {
    pub fn new(
        element: Option<&EventTarget>,
        document: EventTarget,
        bounds: Rc<dyn BoundsProvider>,
        signal: Option<AbortSignal>,
    ) -> Result<Self, KnobError> {
        let element = element.ok_or(KnobError::InvalidTarget)?;
        Ok(Self {
            inner: Rc::new(Inner {
                element: element.clone(),
                document,
                bounds,
                signal,
                session: RefCell::new(Session::default()),
            }),
        })
    }

    /// Listens for drags starting on `surface`.
    pub fn attach_events(&self, surface: &EventTarget) {
        let inner = Rc::downgrade(&self.inner);
        let listener: Listener = Rc::new(move |event, _| {
            if let (Event::PointerDown(pointer), Some(inner)) = (event, inner.upgrade()) {
                inner.on_pointer_down(pointer);
            }
        });
        surface.add_listener(EventKind::PointerDown, listener, self.inner.signal.as_ref());
    }

    pub fn state(&self) -> GestureState {
        self.inner.session.borrow().state
    }

    pub fn is_dragging(&self) -> bool {
        self.state() == GestureState::Dragging
    }

    pub fn center(&self) -> Point {
        self.inner.session.borrow().center
    }

    pub fn last_value(&self) -> f64 {
        self.inner.session.borrow().last_value
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.inner.session.borrow().last_direction
    }

    pub fn on_pointer_down(&self, event: &PointerEvent) {
        self.inner.on_pointer_down(event);
    }

    pub fn on_pointer_move(&self, event: &PointerEvent) {
        self.inner.on_pointer_move(event);
    }

    pub fn on_pointer_up(&self, event: &PointerEvent) {
        self.inner.on_pointer_up(event);
    }
}

impl Inner {
    fn value_at(&self, position: Point) -> f64 {
        let center = self.session.borrow().center;
        let delta = vector_between(center, position);
        degree_to_normalized(angle_from_vector(delta.y, delta.x))
    }

    fn emit(&self, signal: KnobSignal) {
        self.element.dispatch(Event::Signal(signal));
    }

    fn on_pointer_down(self: &Rc<Self>, event: &PointerEvent) {
        {
            let mut session = self.session.borrow_mut();
            if session.state == GestureState::Dragging {
                log::debug!("Ignoring pointer down during an active drag");
                return;
            }
            session.state = GestureState::Dragging;
            session.center = center_of(self.bounds.bounding_rect());
            log::debug!("Drag started around {:?}", session.center);
        }

        let ids: Vec<ListenerId> = [
            (EventKind::PointerMove, self.document_listener(Self::on_pointer_move)),
            (EventKind::PointerUp, self.document_listener(Self::on_pointer_up)),
        ]
        .into_iter()
        .filter_map(|(kind, listener)| {
            self.document
                .add_listener(kind, listener, self.signal.as_ref())
        })
        .collect();
        self.session.borrow_mut().document_listeners = ids;

        let value = self.value_at(event.position);
        self.emit(KnobSignal::ValueChange { value });
        self.session.borrow_mut().last_value = value;
    }

    fn document_listener(self: &Rc<Self>, handler: fn(&Self, &PointerEvent)) -> Listener {
        let inner: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |event, _| {
            let pointer = match event {
                Event::PointerMove(pointer) | Event::PointerUp(pointer) => pointer,
                _ => return,
            };
            if let Some(inner) = inner.upgrade() {
                handler(&inner, pointer);
            }
        })
    }

    fn on_pointer_move(&self, event: &PointerEvent) {
        let (last_value, last_direction) = {
            let session = self.session.borrow();
            if session.state != GestureState::Dragging {
                return;
            }
            (session.last_value, session.last_direction)
        };

        let value = self.value_at(event.position);
        let direction = Direction::between(last_value, value);

        self.emit(KnobSignal::ValueChange { value });
        if last_direction != Some(direction) {
            self.emit(KnobSignal::DirectionChange { direction });
        }

        let mut session = self.session.borrow_mut();
        session.last_value = value;
        session.last_direction = Some(direction);
    }

    fn on_pointer_up(&self, event: &PointerEvent) {
        let listeners = {
            let mut session = self.session.borrow_mut();
            if session.state != GestureState::Dragging {
                return;
            }
            session.state = GestureState::Idle;
            std::mem::take(&mut session.document_listeners)
        };

        let value = self.value_at(event.position);
        self.emit(KnobSignal::ValueChange { value });

        for id in listeners {
            self.document.remove_listener_id(id);
        }
        log::debug!("Drag ended at {}", value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::AbortController;
    use proptest::prelude::*;

    struct Harness {
        element: EventTarget,
        document: EventTarget,
        controller: GestureController,
        seen: Rc<RefCell<Vec<KnobSignal>>>,
    }

    fn harness(signal: Option<AbortSignal>) -> Harness {
        let element = EventTarget::new("knob");
        let document = EventTarget::new("document");
        document.append_child(&element);

        let bounds: Rc<dyn BoundsProvider> = Rc::new(|| Bounds::new(0.0, 0.0, 100.0, 100.0));
        let controller =
            GestureController::new(Some(&element), document.clone(), bounds, signal)
                .unwrap();
        controller.attach_events(&element);

        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in [
            crate::events::SignalKind::ValueChange,
            crate::events::SignalKind::DirectionChange,
        ] {
            let seen = seen.clone();
            element.add_listener(
                kind,
                Rc::new(move |event, _| {
                    if let Event::Signal(signal) = event {
                        seen.borrow_mut().push(*signal);
                    }
                }),
                None,
            );
        }

        Harness {
            element,
            document,
            controller,
            seen,
        }
    }

    fn value_changes(signals: &[KnobSignal]) -> Vec<f64> {
        signals
            .iter()
            .filter_map(|s| match s {
                KnobSignal::ValueChange { value } => Some(*value),
                _ => None,
            })
            .collect()
    }

    fn direction_changes(signals: &[KnobSignal]) -> Vec<Direction> {
        signals
            .iter()
            .filter_map(|s| match s {
                KnobSignal::DirectionChange { direction } => Some(*direction),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn requires_a_target() {
        let bounds: Rc<dyn BoundsProvider> = Rc::new(Bounds::default);
        let result = GestureController::new(None, EventTarget::new("document"), bounds, None);
        assert!(matches!(result, Err(KnobError::InvalidTarget)));
    }

    #[test]
    fn quarter_turn_drag() {
        let h = harness(None);

        h.element.dispatch(Event::PointerDown(PointerEvent::new(50.0, 0.0)));
        assert!(h.controller.is_dragging());
        assert_eq!(h.controller.center(), Point::new(50.0, 50.0));

        h.document
            .dispatch(Event::PointerMove(PointerEvent::new(100.0, 50.0)));

        let seen = h.seen.borrow();
        let values = value_changes(&seen);
        assert_eq!(values.len(), 2);
        assert!(values[0].abs() < 1e-12);
        assert!((values[1] - 0.25).abs() < 1e-12);
        assert_eq!(direction_changes(&seen), [Direction::Clockwise]);
    }

    #[test]
    fn direction_is_edge_triggered() {
        let h = harness(None);
        h.element.dispatch(Event::PointerDown(PointerEvent::new(50.0, 0.0)));

        // clockwise through the right half, then back
        for (x, y) in [(80.0, 10.0), (100.0, 50.0), (80.0, 90.0), (100.0, 50.0), (90.0, 20.0)] {
            h.document.dispatch(Event::PointerMove(PointerEvent::new(x, y)));
        }

        let seen = h.seen.borrow();
        assert_eq!(value_changes(&seen).len(), 6);
        assert_eq!(
            direction_changes(&seen),
            [Direction::Clockwise, Direction::CounterClockwise]
        );
        assert_eq!(
            h.controller.last_direction(),
            Some(Direction::CounterClockwise)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        /// A direction change fires on the first move and then exactly once
        /// each time the value turns around, never while it keeps going the
        /// same way.
        #[test]
        fn direction_changes_once_per_turnaround(
            moves in prop::collection::vec((0.0f64..100.0, 0.0f64..100.0), 1..40),
        ) {
            let h = harness(None);
            h.element.dispatch(Event::PointerDown(PointerEvent::new(50.0, 0.0)));
            for &(x, y) in &moves {
                h.document.dispatch(Event::PointerMove(PointerEvent::new(x, y)));
            }

            let seen = h.seen.borrow();
            let values = value_changes(&seen);
            prop_assert_eq!(values.len(), moves.len() + 1);

            let mut expected = Vec::new();
            for pair in values.windows(2) {
                let direction = if pair[1] > pair[0] {
                    Direction::Clockwise
                } else {
                    Direction::CounterClockwise
                };
                if expected.last() != Some(&direction) {
                    expected.push(direction);
                }
            }
            prop_assert_eq!(direction_changes(&seen), expected);
        }
    }

    #[test]
    fn pointer_up_ends_the_drag() {
        let h = harness(None);
        h.element.dispatch(Event::PointerDown(PointerEvent::new(50.0, 0.0)));
        assert_eq!(h.document.listener_count(EventKind::PointerMove), 1);

        h.document
            .dispatch(Event::PointerUp(PointerEvent::new(50.0, 100.0)));

        assert_eq!(h.controller.state(), GestureState::Idle);
        assert_eq!(h.document.listener_count(EventKind::PointerMove), 0);
        assert_eq!(h.document.listener_count(EventKind::PointerUp), 0);

        let last = *value_changes(&h.seen.borrow()).last().unwrap();
        assert!((last - 0.5).abs() < 1e-12);

        let before = h.seen.borrow().len();
        h.document
            .dispatch(Event::PointerMove(PointerEvent::new(0.0, 50.0)));
        assert_eq!(h.seen.borrow().len(), before);
    }

    #[test]
    fn second_pointer_down_is_ignored() {
        let h = harness(None);
        h.element.dispatch(Event::PointerDown(PointerEvent::new(50.0, 0.0)));
        h.element.dispatch(Event::PointerDown(PointerEvent::new(100.0, 50.0)));

        assert_eq!(h.document.listener_count(EventKind::PointerMove), 1);
        assert_eq!(value_changes(&h.seen.borrow()).len(), 1);
    }

    #[test]
    fn abort_mid_drag_silences_document_moves() {
        let abort = AbortController::new();
        let h = harness(Some(abort.signal()));
        h.element.dispatch(Event::PointerDown(PointerEvent::new(50.0, 0.0)));

        abort.abort();
        let before = h.seen.borrow().len();
        h.document
            .dispatch(Event::PointerMove(PointerEvent::new(100.0, 50.0)));
        h.document
            .dispatch(Event::PointerUp(PointerEvent::new(100.0, 50.0)));

        assert_eq!(h.seen.borrow().len(), before);
        assert_eq!(h.element.listener_count(EventKind::PointerDown), 0);
    }
}

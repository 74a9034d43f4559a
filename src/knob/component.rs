use super::model::{Attribute, KnobConfig, KnobState, clamp_normalized};
use super::readout::{ReadoutKey, classify};
use super::view::{RenderSurface, ResizeObserver, arc_for};
use crate::abort::{AbortController, AbortSignal};
use crate::error::KnobError;
use crate::events::{
    ChangeDetail, Direction, Event, EventKind, EventTarget, KnobSignal, Listener, SignalKind,
    SignalListener, listen_to_event,
};
use crate::gesture::{BoundsProvider, GestureController};
use crate::keyboard::KeyboardController;
use crate::numeric::parse_float;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use strum::IntoEnumIterator;

const TABINDEX: &str = "tabindex";

/// Everything created by one `attach`, torn down together by `detach`.
struct Session {
    abort: AbortController,
    gesture: GestureController,
    observer: ResizeObserver,
}

struct KnobInner {
    element: EventTarget,
    document: EventTarget,
    bounds: Rc<dyn BoundsProvider>,
    state: RefCell<KnobState>,
    attributes: RefCell<Vec<(String, String)>>,
    surface: RefCell<Option<Box<dyn RenderSurface>>>,
    session: RefCell<Option<Session>>,
}

/// A circular knob bound to an element.
///
/// The knob reacts to attributes at any time. Input and rendering only
/// happen between [`Knob::attach`] and [`Knob::detach`].
#[derive(Clone)]
pub struct Knob {
    inner: Rc<KnobInner>,
}

impl Knob {
    /// `element` is the knob itself, `document` receives the pointer events
    /// of a drag once it has started.
    pub fn new(element: EventTarget, document: EventTarget, bounds: Rc<dyn BoundsProvider>) -> Self {
        Self {
            inner: Rc::new(KnobInner {
                element,
                document,
                bounds,
                state: RefCell::new(KnobState::default()),
                attributes: RefCell::new(Vec::new()),
                surface: RefCell::new(None),
                session: RefCell::new(None),
            }),
        }
    }

    pub fn with_config(self, config: KnobConfig) -> Self {
        self.inner.state.borrow_mut().config = config.bounded();
        self
    }

    pub fn element(&self) -> &EventTarget {
        &self.inner.element
    }

    /// Stores the attribute and applies it straight away. Names the knob
    /// does not know are only stored.
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), KnobError> {
        {
            let mut attributes = self.inner.attributes.borrow_mut();
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
        self.inner.attribute_changed(name, value)
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Wires input, focus and resize handling to `surface` and replays the
    /// stored attributes. Attaching again replaces the previous session.
    pub fn attach(&self, surface: Box<dyn RenderSurface>) -> Result<(), KnobError> {
        if self.is_attached() {
            self.detach();
        }
        self.inner.attach(surface)
    }

    /// Removes every listener installed by [`Knob::attach`]. Safe to call
    /// more than once.
    pub fn detach(&self) {
        self.inner.detach();
    }

    /// Redraws the arc for `value`. Does nothing while detached.
    pub fn redraw(&self, value: f64) {
        self.inner.redraw(value);
    }

    /// Applies edited readout text as an output value.
    pub fn commit(&self, text: &str) -> Result<(), KnobError> {
        self.inner.commit(text)
    }

    pub fn value(&self) -> Option<f64> {
        self.inner.state.borrow().value
    }

    pub fn direction(&self) -> Option<Direction> {
        self.inner.state.borrow().direction
    }

    pub fn config(&self) -> KnobConfig {
        self.inner.state.borrow().config
    }

    pub fn output(&self) -> Option<String> {
        self.inner.state.borrow().output()
    }

    pub fn is_editing(&self) -> bool {
        self.inner.state.borrow().editing
    }

    pub fn has_focus_within(&self) -> bool {
        self.inner.state.borrow().focus_within
    }

    pub fn is_attached(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.inner
            .session
            .borrow()
            .as_ref()
            .is_some_and(|session| session.gesture.is_dragging())
    }
}

impl fmt::Debug for Knob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Knob")
            .field("element", &self.inner.element.name())
            .field("state", &self.inner.state.borrow())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl KnobInner {
    fn attach(self: &Rc<Self>, mut surface: Box<dyn RenderSurface>) -> Result<(), KnobError> {
        let abort = AbortController::new();
        let signal = abort.signal();

        let gesture = GestureController::new(
            Some(&self.element),
            self.document.clone(),
            self.bounds.clone(),
            Some(signal.clone()),
        )?;
        gesture.attach_events(&self.element);

        let keyboard = KeyboardController::new(Some(&self.element), Some(signal.clone()))?;
        keyboard.attach_events(&self.element);

        self.subscribe_signals(&signal)?;
        self.observe_focus(&signal);

        if let Some(readout) = surface.readout_target() {
            if !self.element.contains(&readout) {
                self.element.append_child(&readout);
            }
            self.wire_readout(&readout, &signal);
        }

        let observer = self.resize_observer();
        surface.observe_resize(observer.clone());
        signal.on_abort({
            let observer = observer.clone();
            move || observer.disconnect()
        });

        *self.surface.borrow_mut() = Some(surface);
        *self.session.borrow_mut() = Some(Session {
            abort,
            gesture,
            observer: observer.clone(),
        });
        log::debug!("Knob {} attached", self.element.name());

        if !self.has_attribute(TABINDEX) {
            self.attributes
                .borrow_mut()
                .push((TABINDEX.to_string(), "0".to_string()));
        }

        observer.notify();
        self.replay_attributes();
        Ok(())
    }

    fn detach(&self) {
        let Some(session) = self.session.borrow_mut().take() else {
            return;
        };
        session.abort.abort();
        session.observer.disconnect();
        self.surface.borrow_mut().take();

        let mut state = self.state.borrow_mut();
        state.editing = false;
        state.focus_within = false;
        log::debug!("Knob {} detached", self.element.name());
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.borrow().iter().any(|(n, _)| n == name)
    }

    fn replay_attributes(&self) {
        let attributes = self.attributes.borrow().clone();
        for (name, value) in attributes {
            if let Err(err) = self.attribute_changed(&name, &value) {
                log::warn!("Ignoring attribute {}={:?}: {}", name, value, err);
            }
        }
    }

    fn attribute_changed(&self, name: &str, value: &str) -> Result<(), KnobError> {
        let Ok(attribute) = Attribute::from_str(name) else {
            return Ok(());
        };

        match attribute {
            Attribute::Value => {
                let config = self.state.borrow().config;
                let output = parse_float(value).ok_or_else(|| KnobError::MalformedNumericInput {
                    field: attribute.into(),
                    input: value.to_string(),
                })?;
                let normalized = config.normalize(output)?;
                self.set_value(normalized);
            }
            _ => {
                let current = {
                    let mut state = self.state.borrow_mut();
                    state.config.apply(attribute, value)?;
                    state.value
                };
                if let Some(current) = current {
                    self.redraw(current);
                }
            }
        }
        Ok(())
    }

    fn subscribe_signals(self: &Rc<Self>, signal: &AbortSignal) -> Result<(), KnobError> {
        for kind in SignalKind::iter() {
            let inner = Rc::downgrade(self);
            let listener: SignalListener = Rc::new(move |knob_signal| {
                if let Some(inner) = inner.upgrade() {
                    inner.on_signal(knob_signal);
                }
            });
            listen_to_event(Some(&self.element), kind, listener, Some(signal))?;
        }
        Ok(())
    }

    fn observe_focus(self: &Rc<Self>, signal: &AbortSignal) {
        let inner = Rc::downgrade(self);
        let listener: Listener = Rc::new(move |event, _| {
            let (entering, focus) = match event {
                Event::FocusIn(focus) => (true, focus),
                Event::FocusOut(focus) => (false, focus),
                _ => return,
            };
            let Some(inner) = inner.upgrade() else {
                return;
            };

            let internal = focus
                .related_target
                .as_ref()
                .is_some_and(|related| inner.element.contains(related));
            if internal {
                return;
            }

            inner.state.borrow_mut().focus_within = entering;
            if entering {
                log::debug!("Focus entered knob {}", inner.element.name());
            } else {
                log::debug!("Focus left knob {}", inner.element.name());
            }
        });

        for kind in [EventKind::FocusIn, EventKind::FocusOut] {
            self.element.add_listener(kind, listener.clone(), Some(signal));
        }
    }

    fn wire_readout(self: &Rc<Self>, readout: &EventTarget, signal: &AbortSignal) {
        let inner = Rc::downgrade(self);
        let on_key: Listener = Rc::new(move |event, dispatch| {
            let Event::KeyPress(key) = event else {
                return;
            };
            match classify(&key.key) {
                ReadoutKey::Accept => {}
                ReadoutKey::Reject => dispatch.prevent_default(),
                ReadoutKey::Commit => {
                    if let Some(inner) = inner.upgrade() {
                        inner.with_surface(|surface| surface.blur_readout());
                    }
                }
            }
        });
        readout.add_listener(EventKind::KeyPress, on_key, Some(signal));

        let inner = Rc::downgrade(self);
        let on_commit: Listener = Rc::new(move |event, _| {
            if let (Event::Commit(text), Some(inner)) = (event, inner.upgrade())
                && let Err(err) = inner.commit(text)
            {
                log::warn!("Rejected readout entry {:?}: {}", text, err);
            }
        });
        readout.add_listener(EventKind::Commit, on_commit, Some(signal));
    }

    fn resize_observer(self: &Rc<Self>) -> ResizeObserver {
        let inner = Rc::downgrade(self);
        ResizeObserver::new(move || {
            if let Some(inner) = inner.upgrade() {
                let value = inner.state.borrow().value.unwrap_or(0.0);
                inner.redraw(value);
            }
        })
    }

    fn on_signal(&self, signal: &KnobSignal) {
        match *signal {
            KnobSignal::ValueChange { value } => self.set_value(value),
            KnobSignal::ValueRelativeChange { value: delta } => {
                let current = self.state.borrow().value.unwrap_or(0.0);
                self.set_value(current + delta);
            }
            KnobSignal::DirectionChange { direction } => {
                log::debug!("Knob {} turning {}", self.element.name(), direction);
                self.state.borrow_mut().direction = Some(direction);
            }
            KnobSignal::ValueInputModeToggle => {
                self.state.borrow_mut().editing = true;
                self.with_surface(|surface| surface.set_readout_editable(true));
            }
        }
    }

    /// Ends editing. The value is only replaced when the text is a number
    /// and the range is not degenerate.
    fn commit(&self, text: &str) -> Result<(), KnobError> {
        self.end_editing();

        let config = self.state.borrow().config;
        let result = parse_float(text)
            .ok_or_else(|| KnobError::MalformedNumericInput {
                field: Attribute::Value.into(),
                input: text.to_string(),
            })
            .and_then(|output| config.normalize(config.clamp_output(output)));

        match result {
            Ok(value) => {
                self.set_value(value);
                Ok(())
            }
            Err(err) => {
                if let Some(output) = self.state.borrow().output() {
                    self.with_surface(|surface| surface.set_readout(&output));
                }
                Err(err)
            }
        }
    }

    fn end_editing(&self) {
        let was_editing = std::mem::replace(&mut self.state.borrow_mut().editing, false);
        if was_editing {
            self.with_surface(|surface| surface.set_readout_editable(false));
        }
    }

    fn set_value(&self, value: f64) {
        let value = clamp_normalized(value);
        self.redraw(value);

        let output = {
            let mut state = self.state.borrow_mut();
            state.value = Some(value);
            state.config.format_output(value)
        };
        self.with_surface(|surface| surface.set_readout(&output));

        self.element
            .dispatch(Event::Change(ChangeDetail { value: output }));
    }

    fn redraw(&self, value: f64) {
        let config = self.state.borrow().config;
        self.with_surface(|surface| {
            let arc = arc_for(&*surface, &config, value);
            surface.set_arc(&arc);
        });
    }

    fn with_surface(&self, f: impl FnOnce(&mut dyn RenderSurface)) {
        match self.surface.try_borrow_mut() {
            Ok(mut surface) => {
                if let Some(surface) = surface.as_mut() {
                    f(&mut **surface);
                }
            }
            Err(_) => log::debug!("Surface busy, skipping update"),
        }
    }
}

use crate::abort::AbortSignal;
use crate::error::KnobError;
use crate::events::{Event, EventKind, EventTarget, KnobSignal, Listener, WeakEventTarget};
use crate::input::{Key, KeyEvent, Modifiers, NamedKey};
use std::rc::Rc;

/// One degree of rotation.
pub const STEP_SIZE: f64 = 1.0 / 360.0;
pub const LARGE_STEP_SIZE: f64 = STEP_SIZE * 10.0;
pub const FINE_STEP_SIZE: f64 = STEP_SIZE / 10.0;

/// Maps key presses on the knob to relative value changes. Shift selects
/// the large step; Shift together with Meta selects the fine step.
#[derive(Debug, Clone)]
pub struct KeyboardController {
    element: WeakEventTarget,
    signal: Option<AbortSignal>,
    step_size: f64,
    large_step_size: f64,
    fine_step_size: f64,
}

impl KeyboardController {
    pub fn new(element: Option<&EventTarget>, signal: Option<AbortSignal>) -> Result<Self, KnobError> {
        let element = element.ok_or(KnobError::InvalidTarget)?;
        Ok(Self {
            element: element.downgrade(),
            signal,
            step_size: STEP_SIZE,
            large_step_size: LARGE_STEP_SIZE,
            fine_step_size: FINE_STEP_SIZE,
        })
    }

    pub fn attach_events(&self, surface: &EventTarget) {
        let controller = self.clone();
        let listener: Listener = Rc::new(move |event, dispatch| {
            if let Event::KeyDown(key) = event
                && controller.on_key_down(key)
            {
                dispatch.prevent_default();
            }
        });
        surface.add_listener(EventKind::KeyDown, listener, self.signal.as_ref());
    }

    pub fn step_for(&self, modifiers: Modifiers) -> f64 {
        match (modifiers.shift, modifiers.meta) {
            (true, true) => self.fine_step_size,
            (true, false) => self.large_step_size,
            _ => self.step_size,
        }
    }

    /// Returns whether the key was handled.
    pub fn on_key_down(&self, event: &KeyEvent) -> bool {
        let step = self.step_for(event.modifiers);

        let signal = match event.key {
            Key::Named(NamedKey::Enter) => KnobSignal::ValueInputModeToggle,
            Key::Named(NamedKey::ArrowUp) => KnobSignal::ValueRelativeChange { value: step },
            Key::Named(NamedKey::ArrowDown) => KnobSignal::ValueRelativeChange { value: -step },
            _ => return false,
        };

        match self.element.upgrade() {
            Some(element) => {
                element.dispatch(Event::Signal(signal));
                true
            }
            None => false,
        }
    }
}

pub mod abort;
pub mod error;
pub mod events;
pub mod geometry;
pub mod gesture;
pub mod input;
pub mod keyboard;
pub mod knob;
pub mod numeric;
pub mod settings;

pub use abort::{AbortController, AbortSignal};
pub use error::KnobError;
pub use events::{
    ChangeDetail, Direction, Event, EventKind, EventTarget, KnobSignal, SignalKind, emit_event,
    listen_to_event, remove_event,
};
pub use geometry::{ArcGeometry, Bounds, Point, Size, describe_arc};
pub use gesture::{BoundsProvider, GestureController};
pub use keyboard::KeyboardController;
pub use knob::{Attribute, Knob, KnobConfig, RenderSurface, ResizeObserver, StyleProperty};

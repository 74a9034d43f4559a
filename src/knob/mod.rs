//! The knob component: configuration, rendering and the readout.

mod component;
mod model;
mod readout;
mod view;

pub use component::Knob;
pub use model::{Attribute, KnobConfig, KnobState, MAX_NORMALIZED, MAX_PRECISION, clamp_normalized};
pub use readout::{ReadoutKey, classify};
pub use view::{RenderSurface, ResizeObserver, StyleProperty, arc_for};

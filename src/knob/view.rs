use super::model::KnobConfig;
use crate::events::EventTarget;
use crate::geometry::{ArcGeometry, Size, normalized_to_degree};
use crate::numeric::parse_float;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use strum::{Display as StrumDisplay, EnumIter, IntoStaticStr};

/// Style properties that override the configured stroke width and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, IntoStaticStr)]
pub enum StyleProperty {
    #[strum(serialize = "--stroke-width")]
    StrokeWidth,
    #[strum(serialize = "--offset")]
    Offset,
}

/// What the knob draws into. Built and styled outside this crate.
pub trait RenderSurface {
    /// Rendered size of the square container holding the arc.
    fn size(&self) -> Size;

    /// Raw computed value of a style property, e.g. `"6px"`.
    fn style_property(&self, property: StyleProperty) -> Option<String>;

    fn set_arc(&mut self, arc: &ArcGeometry);

    fn set_readout(&mut self, text: &str);

    fn set_readout_editable(&mut self, editable: bool);

    /// Moves focus away from the readout, which commits an edit in progress.
    fn blur_readout(&mut self) {}

    /// Node that receives key presses and commits for the readout, if the
    /// surface has one.
    fn readout_target(&self) -> Option<EventTarget> {
        None
    }

    /// Hands the surface the observer to notify whenever its size changes.
    fn observe_resize(&mut self, _observer: ResizeObserver) {}
}

type ResizeCallback = Box<dyn Fn()>;

/// Passive size-change hook. The surface calls [`ResizeObserver::notify`];
/// after [`ResizeObserver::disconnect`] notifications are ignored.
#[derive(Clone)]
pub struct ResizeObserver {
    callback: Rc<RefCell<Option<ResizeCallback>>>,
}

impl ResizeObserver {
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self {
            callback: Rc::new(RefCell::new(Some(Box::new(callback)))),
        }
    }

    pub fn notify(&self) {
        if let Ok(callback) = self.callback.try_borrow()
            && let Some(callback) = callback.as_ref()
        {
            callback();
        }
    }

    pub fn disconnect(&self) {
        self.callback.borrow_mut().take();
    }

    pub fn is_connected(&self) -> bool {
        self.callback.borrow().is_some()
    }
}

impl fmt::Debug for ResizeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeObserver")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// A style value wins when it parses to a non-zero number.
fn resolve(surface: &dyn RenderSurface, property: StyleProperty, fallback: f64) -> f64 {
    surface
        .style_property(property)
        .and_then(|raw| parse_float(&raw))
        .filter(|v| *v != 0.0)
        .unwrap_or(fallback)
}

/// Arc for `value` on the surface's current size.
pub fn arc_for(surface: &dyn RenderSurface, config: &KnobConfig, value: f64) -> ArcGeometry {
    let angle = normalized_to_degree(value);
    let offset = resolve(surface, StyleProperty::Offset, config.offset);
    let stroke_width = resolve(surface, StyleProperty::StrokeWidth, config.stroke_width);

    let size = surface.size();
    let radius = size.width / 2.0 - stroke_width - offset;

    ArcGeometry::new(size.center(), radius, 0.0, angle)
}

use crate::gui::view::Scene;
use arc_knob::geometry::Size;
use arc_knob::{ArcGeometry, EventTarget, RenderSurface, ResizeObserver, StyleProperty};
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

/// Draws a knob into a `DrawingArea` with an `Entry` as its readout.
pub struct GtkSurface {
    area: gtk::DrawingArea,
    entry: gtk::Entry,
    readout: EventTarget,
    scene: Rc<RefCell<Scene>>,
}

impl GtkSurface {
    pub fn new(
        area: gtk::DrawingArea,
        entry: gtk::Entry,
        readout: EventTarget,
        scene: Rc<RefCell<Scene>>,
    ) -> Self {
        Self {
            area,
            entry,
            readout,
            scene,
        }
    }
}

impl RenderSurface for GtkSurface {
    fn size(&self) -> Size {
        Size::new(self.area.width() as f64, self.area.height() as f64)
    }

    // GTK has no custom CSS properties, so stroke and offset always come
    // from the knob's attributes.
    fn style_property(&self, _property: StyleProperty) -> Option<String> {
        None
    }

    fn set_arc(&mut self, arc: &ArcGeometry) {
        self.scene.borrow_mut().arc = Some(*arc);
        self.area.queue_draw();
    }

    fn set_readout(&mut self, text: &str) {
        self.entry.set_text(text);
    }

    fn set_readout_editable(&mut self, editable: bool) {
        self.entry.set_editable(editable);
        if editable {
            self.entry.grab_focus();
            self.entry.select_region(0, -1);
        }
    }

    // Deferred: moving focus commits the entry, which calls back into the knob.
    fn blur_readout(&mut self) {
        let area = self.area.clone();
        glib::idle_add_local_once(move || {
            area.grab_focus();
        });
    }

    fn readout_target(&self) -> Option<EventTarget> {
        Some(self.readout.clone())
    }

    fn observe_resize(&mut self, observer: ResizeObserver) {
        self.area
            .connect_resize(move |_, _, _| observer.notify());
    }
}

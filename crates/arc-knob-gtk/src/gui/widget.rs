use crate::gui::input::{key_from_gdk, modifiers_from_gdk};
use crate::gui::surface::GtkSurface;
use crate::gui::theme::ThemeColors;
use crate::gui::view::{self, Scene};
use arc_knob::input::{FocusEvent, KeyEvent, PointerEvent};
use arc_knob::settings::{KnobDefaults, KnobDefinition};
use arc_knob::{Bounds, BoundsProvider, Event, EventTarget, Knob};
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

const KNOB_SIZE: i32 = 120;

/// One labelled knob: drawing area, readout entry and the core [`Knob`].
pub struct KnobWidget {
    pub root: gtk::Box,
    knob: Knob,
}

impl KnobWidget {
    pub fn new(
        definition: &KnobDefinition,
        defaults: KnobDefaults,
        document: &EventTarget,
    ) -> Self {
        let element = EventTarget::new(definition.label.clone());
        document.append_child(&element);
        let readout = EventTarget::new(format!("{} readout", definition.label));

        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        let label = gtk::Label::new(Some(&definition.label));
        let area = gtk::DrawingArea::new();
        area.set_content_width(KNOB_SIZE);
        area.set_content_height(KNOB_SIZE);
        area.set_focusable(true);
        let entry = gtk::Entry::new();
        entry.set_editable(false);
        entry.set_width_chars(8);
        entry.add_css_class("knob-readout");

        root.append(&label);
        root.append(&area);
        root.append(&entry);

        let bounds = {
            let area = area.downgrade();
            let provider: Rc<dyn BoundsProvider> = Rc::new(move || {
                area.upgrade()
                    .map(|a| Bounds::new(0.0, 0.0, a.width() as f64, a.height() as f64))
                    .unwrap_or_default()
            });
            provider
        };

        let knob = Knob::new(element.clone(), document.clone(), bounds).with_config(*defaults);
        if let Err(e) = definition.apply_to(&knob) {
            log::warn!("Knob '{}': {}", definition.label, e);
        }

        let scene = Rc::new(RefCell::new(Scene {
            stroke_width: knob.config().stroke_width,
            ..Scene::default()
        }));

        Self::connect_draw(&area, scene.clone());
        Self::connect_pointer(&area, &element, document);
        Self::connect_keys(&area, &element);
        Self::connect_focus(&root, &element, scene.clone(), &area);
        Self::connect_readout(&entry, &readout);

        let surface = GtkSurface::new(area, entry, readout, scene);
        if let Err(e) = knob.attach(Box::new(surface)) {
            log::error!("Failed to attach knob '{}': {}", definition.label, e);
        }

        Self { root, knob }
    }

    pub fn knob(&self) -> &Knob {
        &self.knob
    }

    fn connect_draw(area: &gtk::DrawingArea, scene: Rc<RefCell<Scene>>) {
        area.set_draw_func(move |area, cr, _, _| {
            let style_context = area.style_context();
            let colors = ThemeColors::from_context(&style_context);
            if let Err(e) = view::draw(cr, &scene.borrow(), &colors) {
                log::error!("Drawing error: {}", e);
            }
        });
    }

    fn connect_pointer(area: &gtk::DrawingArea, element: &EventTarget, document: &EventTarget) {
        let drag = gtk::GestureDrag::new();

        let target = element.clone();
        let weak = area.downgrade();
        drag.connect_drag_begin(move |_, x, y| {
            if let Some(area) = weak.upgrade() {
                area.grab_focus();
            }
            target.dispatch(Event::PointerDown(PointerEvent::new(x, y)));
        });

        let target = document.clone();
        drag.connect_drag_update(move |gesture, dx, dy| {
            if let Some((x, y)) = gesture.start_point() {
                target.dispatch(Event::PointerMove(PointerEvent::new(x + dx, y + dy)));
            }
        });

        let target = document.clone();
        drag.connect_drag_end(move |gesture, dx, dy| {
            if let Some((x, y)) = gesture.start_point() {
                target.dispatch(Event::PointerUp(PointerEvent::new(x + dx, y + dy)));
            }
        });

        area.add_controller(drag);
    }

    fn connect_keys(area: &gtk::DrawingArea, element: &EventTarget) {
        let keys = gtk::EventControllerKey::new();
        let target = element.clone();
        keys.connect_key_pressed(move |_, key, _, state| {
            let event = KeyEvent::new(key_from_gdk(key)).with_modifiers(modifiers_from_gdk(state));
            if target.dispatch(Event::KeyDown(event)) {
                glib::Propagation::Proceed
            } else {
                glib::Propagation::Stop
            }
        });
        area.add_controller(keys);
    }

    fn connect_focus(
        root: &gtk::Box,
        element: &EventTarget,
        scene: Rc<RefCell<Scene>>,
        area: &gtk::DrawingArea,
    ) {
        // enter/leave fire only when focus crosses the box boundary
        let focus = gtk::EventControllerFocus::new();

        let target = element.clone();
        let entered = scene.clone();
        let redraw = area.clone();
        focus.connect_enter(move |_| {
            target.dispatch(Event::FocusIn(FocusEvent::new(None)));
            entered.borrow_mut().focused = true;
            redraw.queue_draw();
        });

        let target = element.clone();
        let redraw = area.clone();
        focus.connect_leave(move |_| {
            target.dispatch(Event::FocusOut(FocusEvent::new(None)));
            scene.borrow_mut().focused = false;
            redraw.queue_draw();
        });

        root.add_controller(focus);
    }

    fn connect_readout(entry: &gtk::Entry, readout: &EventTarget) {
        let keys = gtk::EventControllerKey::new();
        keys.set_propagation_phase(gtk::PropagationPhase::Capture);
        let target = readout.clone();
        keys.connect_key_pressed(move |_, key, _, state| {
            let event = KeyEvent::new(key_from_gdk(key)).with_modifiers(modifiers_from_gdk(state));
            if target.dispatch(Event::KeyPress(event)) {
                glib::Propagation::Proceed
            } else {
                glib::Propagation::Stop
            }
        });
        entry.add_controller(keys);

        let focus = gtk::EventControllerFocus::new();
        let target = readout.clone();
        let weak = entry.downgrade();
        focus.connect_leave(move |_| {
            let Some(entry) = weak.upgrade() else {
                return;
            };
            if entry.is_editable() {
                target.dispatch(Event::Commit(entry.text().to_string()));
            }
        });
        entry.add_controller(focus);
    }
}

impl Drop for KnobWidget {
    fn drop(&mut self) {
        self.knob.detach();
    }
}

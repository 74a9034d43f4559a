use crate::events::AppEvent;
use crate::gui::theme;
use crate::gui::widget::KnobWidget;
use arc_knob::{Event, EventKind, EventTarget};
use arc_knob::settings::{self, Settings};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::path::PathBuf;
use std::rc::Rc;

pub struct AppModel {
    pub config_path: PathBuf,
    pub document: EventTarget,
    pub knobs: Vec<KnobWidget>,
    pub status: String,
    pub panel: gtk::Box,
}

#[derive(Debug)]
pub enum AppMsg {
    Changed { label: String, value: String },
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (Settings, PathBuf, async_channel::Receiver<AppEvent>);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        gtk::ApplicationWindow {
            set_title: Some("Arc Knob"),

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 12,
                add_css_class: "knob-panel",

                #[name = "panel"]
                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 24,
                    set_halign: gtk::Align::Center,
                }

                gtk::Label {
                    #[watch]
                    set_label: &model.status,
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (settings, config_path, rx) = init;

        theme::load_css();

        let model = AppModel {
            config_path,
            document: EventTarget::new("document"),
            knobs: Vec::new(),
            status: String::new(),
            panel: gtk::Box::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.panel = widgets.panel.clone();
        let change_sender = sender.clone();
        model.document.add_listener(
            EventKind::Change,
            Rc::new(move |event, dispatch| {
                if let Event::Change(detail) = event {
                    change_sender.input(AppMsg::Changed {
                        label: dispatch.target().name().to_string(),
                        value: detail.value.clone(),
                    });
                }
            }),
            None,
        );

        model.rebuild(&settings);

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Changed { label, value } => {
                self.status = format!("{}: {}", label, value);
            }
            AppMsg::ConfigReload => match settings::load_config_from(&self.config_path) {
                Ok(new_settings) => {
                    self.rebuild(&new_settings);
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }
}

impl AppModel {
    fn rebuild(&mut self, settings: &Settings) {
        for widget in self.knobs.drain(..) {
            self.panel.remove(&widget.root);
        }

        for definition in &settings.knobs {
            let widget = KnobWidget::new(definition, settings.defaults, &self.document);
            self.panel.append(&widget.root);
            log::debug!(
                "Added knob '{}' at {:?}",
                definition.label,
                widget.knob().output()
            );
            self.knobs.push(widget);
        }
    }
}

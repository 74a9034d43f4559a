use arc_knob::input::{Key, Modifiers, NamedKey};
use gtk::gdk;
use gtk4 as gtk;

pub fn key_from_gdk(key: gdk::Key) -> Key {
    let named = match key {
        gdk::Key::Return | gdk::Key::KP_Enter => Some(NamedKey::Enter),
        gdk::Key::Escape => Some(NamedKey::Escape),
        gdk::Key::Tab | gdk::Key::ISO_Left_Tab => Some(NamedKey::Tab),
        gdk::Key::BackSpace => Some(NamedKey::Backspace),
        gdk::Key::Delete => Some(NamedKey::Delete),
        gdk::Key::Up | gdk::Key::KP_Up => Some(NamedKey::ArrowUp),
        gdk::Key::Down | gdk::Key::KP_Down => Some(NamedKey::ArrowDown),
        gdk::Key::Left | gdk::Key::KP_Left => Some(NamedKey::ArrowLeft),
        gdk::Key::Right | gdk::Key::KP_Right => Some(NamedKey::ArrowRight),
        gdk::Key::Home => Some(NamedKey::Home),
        gdk::Key::End => Some(NamedKey::End),
        gdk::Key::Page_Up => Some(NamedKey::PageUp),
        gdk::Key::Page_Down => Some(NamedKey::PageDown),
        _ => None,
    };

    match (named, key.to_unicode()) {
        (Some(named), _) => Key::Named(named),
        (None, Some(c)) => Key::Character(c),
        (None, None) => Key::Unidentified(key.name().map(|n| n.to_string()).unwrap_or_default()),
    }
}

pub fn modifiers_from_gdk(state: gdk::ModifierType) -> Modifiers {
    Modifiers {
        shift: state.contains(gdk::ModifierType::SHIFT_MASK),
        meta: state.intersects(gdk::ModifierType::META_MASK | gdk::ModifierType::SUPER_MASK),
        ctrl: state.contains(gdk::ModifierType::CONTROL_MASK),
        alt: state.contains(gdk::ModifierType::ALT_MASK),
    }
}

use crate::events::EventTarget;
use crate::geometry::Point;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub position: Point,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub meta: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        meta: false,
        ctrl: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn shift_meta() -> Self {
        Self {
            shift: true,
            meta: true,
            ..Self::NONE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay, IntoStaticStr)]
pub enum NamedKey {
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
}

/// A key value as reported by the platform: a named key, a single
/// printable character, or anything else verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Named(NamedKey),
    Character(char),
    Unidentified(String),
}

impl FromStr for Key {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        Ok(match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Character(c),
            _ => NamedKey::from_str(s)
                .map(Key::Named)
                .unwrap_or_else(|_| Key::Unidentified(s.to_string())),
        })
    }
}

impl From<NamedKey> for Key {
    fn from(key: NamedKey) -> Self {
        Key::Named(key)
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Key::Character(c)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Named(named) => write!(f, "{named}"),
            Key::Character(c) => write!(f, "{c}"),
            Key::Unidentified(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// `related_target` is the node losing focus for `focusin` and the node
/// gaining it for `focusout`.
#[derive(Debug, Clone, Default)]
pub struct FocusEvent {
    pub related_target: Option<EventTarget>,
}

impl FocusEvent {
    pub fn new(related_target: Option<EventTarget>) -> Self {
        Self { related_target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_parsing() {
        let cases = [
            ("Enter", Key::Named(NamedKey::Enter)),
            ("ArrowUp", Key::Named(NamedKey::ArrowUp)),
            ("7", Key::Character('7')),
            (".", Key::Character('.')),
            ("F13", Key::Unidentified("F13".to_string())),
        ];

        for (raw, expected) in cases {
            let parsed: Key = raw.parse().unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.to_string(), raw);
        }
    }
}

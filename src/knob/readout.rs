use crate::input::{Key, NamedKey};

/// What the readout does with a key press while it is editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadoutKey {
    Accept,
    Reject,
    Commit,
}

pub fn classify(key: &Key) -> ReadoutKey {
    match key {
        Key::Character(c) if c.is_ascii_digit() || *c == '.' => ReadoutKey::Accept,
        Key::Named(NamedKey::Backspace) => ReadoutKey::Accept,
        Key::Named(NamedKey::Enter) => ReadoutKey::Commit,
        _ => ReadoutKey::Reject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_point_are_accepted() {
        for c in "0123456789.".chars() {
            assert_eq!(classify(&Key::Character(c)), ReadoutKey::Accept);
        }
        assert_eq!(classify(&NamedKey::Backspace.into()), ReadoutKey::Accept);
    }

    #[test]
    fn enter_commits() {
        assert_eq!(classify(&NamedKey::Enter.into()), ReadoutKey::Commit);
    }

    #[test]
    fn everything_else_is_rejected() {
        for key in [
            Key::Character('-'),
            Key::Character('e'),
            Key::Character(' '),
            Key::Named(NamedKey::ArrowUp),
            Key::Named(NamedKey::Delete),
            Key::Unidentified("Dead".to_string()),
        ] {
            assert_eq!(classify(&key), ReadoutKey::Reject, "{key}");
        }
    }
}

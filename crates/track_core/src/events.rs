//! Host input events as seen by the engine.

pub const KEY_BACKSPACE: u32 = 8;
pub const KEY_TAB: u32 = 9;
pub const KEY_ENTER: u32 = 13;
pub const KEY_PAGE_UP: u32 = 33;
pub const KEY_PAGE_DOWN: u32 = 34;
pub const KEY_END: u32 = 35;
pub const KEY_HOME: u32 = 36;
pub const KEY_LEFT: u32 = 37;
pub const KEY_UP: u32 = 38;
pub const KEY_RIGHT: u32 = 39;
pub const KEY_DOWN: u32 = 40;
pub const KEY_DELETE: u32 = 46;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub is_composing: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, key_code: u32) -> Self {
        Self {
            key: key.into(),
            key_code,
            ..Self::default()
        }
    }

    /// A printable character key with its char code.
    pub fn character(ch: char) -> Self {
        Self::new(ch.to_string(), ch as u32)
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn composing(mut self) -> Self {
        self.is_composing = true;
        self
    }

    /// The text a keypress would type, if any.
    pub fn printable(&self) -> Option<&str> {
        if self.ctrl || self.meta || self.alt {
            return None;
        }
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if !ch.is_control() => Some(&self.key),
            _ => None,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self.key_code,
            KEY_LEFT | KEY_RIGHT | KEY_UP | KEY_DOWN | KEY_HOME | KEY_END | KEY_PAGE_UP | KEY_PAGE_DOWN
        )
    }
}

/// Normalized modifier/key string: names sorted and joined with `+`, e.g. `ctrl+shift+z`.
pub fn key_combo(event: &KeyEvent) -> String {
    let mut keys: Vec<String> = Vec::new();
    if event.ctrl || event.meta {
        keys.push("ctrl".into());
    }
    if event.shift {
        keys.push("shift".into());
    }
    if event.alt {
        keys.push("alt".into());
    }
    let name = match event.key_code {
        KEY_ENTER => Some("enter".to_string()),
        KEY_LEFT => Some("left".to_string()),
        KEY_RIGHT => Some("right".to_string()),
        KEY_UP => Some("up".to_string()),
        KEY_DOWN => Some("down".to_string()),
        KEY_TAB => Some("tab".to_string()),
        KEY_DELETE => Some("delete".to_string()),
        0 => None,
        code => char::from_u32(code).map(|c| c.to_lowercase().collect()),
    };
    keys.extend(name);
    keys.sort();
    keys.join("+")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    /// `insertText`, `deleteContentBackward`, `deleteContentForward`, ...
    pub input_type: String,
    pub data: Option<String>,
    pub is_composing: bool,
}

impl InputEvent {
    pub fn new(input_type: impl Into<String>, data: Option<&str>) -> Self {
        Self {
            input_type: input_type.into(),
            data: data.map(str::to_string),
            is_composing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    KeyDown(KeyEvent),
    KeyPress(KeyEvent),
    KeyUp(KeyEvent),
    BeforeInput(InputEvent),
    CompositionStart,
    CompositionEnd,
    MouseDown,
    Click,
    SelectionChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorEvent {
    pub kind: EventKind,
    default_prevented: bool,
}

impl EditorEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            default_prevented: false,
        }
    }

    pub fn key_down(key: KeyEvent) -> Self {
        Self::new(EventKind::KeyDown(key))
    }

    pub fn key_press(key: KeyEvent) -> Self {
        Self::new(EventKind::KeyPress(key))
    }

    pub fn before_input(input: InputEvent) -> Self {
        Self::new(EventKind::BeforeInput(input))
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_composing(&self) -> bool {
        match &self.kind {
            EventKind::KeyDown(k) | EventKind::KeyPress(k) | EventKind::KeyUp(k) => k.is_composing,
            EventKind::BeforeInput(i) => i.is_composing,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combos_are_sorted() {
        assert_eq!(key_combo(&KeyEvent::new("z", 'Z' as u32).with_shift().with_ctrl()), "ctrl+shift+z");
        assert_eq!(key_combo(&KeyEvent::new("ArrowLeft", KEY_LEFT).with_alt()), "alt+left");
        assert_eq!(key_combo(&KeyEvent::new("Delete", KEY_DELETE)), "delete");
    }

    #[test]
    fn printable_excludes_modifiers_and_named_keys() {
        assert_eq!(KeyEvent::character('a').printable(), Some("a"));
        assert_eq!(KeyEvent::character('a').with_ctrl().printable(), None);
        assert_eq!(KeyEvent::new("Enter", KEY_ENTER).printable(), None);
        assert!(KeyEvent::new("Home", KEY_HOME).is_navigation());
    }

    #[test]
    fn composing_flag_is_read_from_payload() {
        let event = EditorEvent::key_down(KeyEvent::new(" ", 32).composing());
        assert!(event.is_composing());
        assert!(!event.default_prevented());
    }
}

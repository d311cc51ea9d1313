#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
}

impl KeyInput {
    pub const fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub const fn with_shift(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// What the composer wants the widget to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerAction {
    None,
    Commit,
}

/// Compose buffer with emoji insertion and send gating.
#[derive(Debug, Default)]
pub struct InputComposer {
    buffer: String,
    emoji_picker_open: bool,
}

impl InputComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn is_emoji_picker_open(&self) -> bool {
        self.emoji_picker_open
    }

    pub fn toggle_emoji_picker(&mut self) {
        self.emoji_picker_open = !self.emoji_picker_open;
    }

    pub fn insert_emoji(&mut self, glyph: &str) {
        self.buffer.push_str(glyph);
        self.emoji_picker_open = false;
    }

    pub fn can_send(&self, loading: bool) -> bool {
        !loading && !self.buffer.trim().is_empty()
    }

    pub fn on_key(&mut self, input: KeyInput, loading: bool) -> ComposerAction {
        match input.key {
            Key::Enter if input.shift => {
                self.buffer.push('\n');
                ComposerAction::None
            }
            // Mirrors the disabled send button.
            Key::Enter if loading => ComposerAction::None,
            Key::Enter => ComposerAction::Commit,
            Key::Escape => {
                self.emoji_picker_open = false;
                ComposerAction::None
            }
            Key::Other => ComposerAction::None,
        }
    }
}

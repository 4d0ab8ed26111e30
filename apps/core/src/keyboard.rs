use crate::domain::is_navigable_url;
use crate::filter::FilterKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        }
    }

    /// Ctrl on Linux/Windows, Cmd on macOS. Holding both is not a primary chord.
    pub fn primary(&self) -> bool {
        self.ctrl != self.meta
    }
}

/// Parses chords written as `Ctrl+Shift+Enter`, `Cmd+2` or `Escape`.
pub fn parse_chord(input: &str) -> Result<KeyChord, String> {
    let parts: Vec<&str> = input
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    let Some((key_raw, modifiers)) = parts.split_last() else {
        return Err("chord is empty".into());
    };

    let mut chord = KeyChord::plain(parse_key(key_raw)?);
    for modifier in modifiers {
        match modifier.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => chord.ctrl = true,
            "cmd" | "meta" | "super" => chord.meta = true,
            "shift" => chord.shift = true,
            "alt" | "option" => chord.alt = true,
            _ => return Err(format!("unsupported modifier '{modifier}'")),
        }
    }
    Ok(chord)
}

fn parse_key(raw: &str) -> Result<Key, String> {
    let mut chars = raw.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Key::Char(c.to_ascii_lowercase()));
    }

    match raw.to_ascii_lowercase().as_str() {
        "enter" | "return" => Ok(Key::Enter),
        "esc" | "escape" => Ok(Key::Escape),
        "up" | "arrowup" => Ok(Key::ArrowUp),
        "down" | "arrowdown" => Ok(Key::ArrowDown),
        "" => Err("chord is missing a key".into()),
        _ => Ok(Key::Other(raw.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    ToggleFilter(FilterKind),
    WebSearch(String),
    Navigate(String),
    OpenSubmenu,
    CloseSubmenu,
}

/// Result of routing one chord. A consumed chord never reaches the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Consumed(Option<KeyCommand>),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOverflow {
    Scroll,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Submenu,
}

/// Chord handling for the popup's single text input plus the secondary
/// actions submenu.
#[derive(Debug, Clone)]
pub struct KeyboardRouter {
    submenu_open: bool,
    overflow: ListOverflow,
    focus: Focus,
    scroll_top: usize,
}

impl Default for KeyboardRouter {
    fn default() -> Self {
        Self {
            submenu_open: false,
            overflow: ListOverflow::Scroll,
            focus: Focus::Input,
            scroll_top: 0,
        }
    }
}

impl KeyboardRouter {
    pub fn submenu_open(&self) -> bool {
        self.submenu_open
    }

    pub fn overflow(&self) -> ListOverflow {
        self.overflow
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn scroll_to(&mut self, offset: usize) {
        if self.overflow == ListOverflow::Scroll {
            self.scroll_top = offset;
        }
    }

    pub fn on_query_changed(&mut self) {
        self.scroll_top = 0;
    }

    pub fn route(&mut self, chord: &KeyChord, query: &str) -> KeyOutcome {
        if chord.primary() && !chord.shift && !chord.alt && chord.key == Key::Char('o') {
            return KeyOutcome::Consumed(Some(self.toggle_submenu()));
        }

        if self.submenu_open && chord == &KeyChord::plain(Key::Escape) {
            return KeyOutcome::Consumed(Some(self.toggle_submenu()));
        }

        if self.focus != Focus::Input || !chord.primary() || chord.alt {
            return KeyOutcome::Ignored;
        }

        match &chord.key {
            Key::Char(digit) if !chord.shift => match FilterKind::from_digit(*digit) {
                Some(kind) => KeyOutcome::Consumed(Some(KeyCommand::ToggleFilter(kind))),
                None => KeyOutcome::Ignored,
            },
            Key::Enter => {
                let trimmed = query.trim();
                if trimmed.is_empty() {
                    return KeyOutcome::Consumed(None);
                }
                if chord.shift && is_navigable_url(trimmed) {
                    KeyOutcome::Consumed(Some(KeyCommand::Navigate(trimmed.to_string())))
                } else {
                    KeyOutcome::Consumed(Some(KeyCommand::WebSearch(trimmed.to_string())))
                }
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn toggle_submenu(&mut self) -> KeyCommand {
        if self.submenu_open {
            self.submenu_open = false;
            self.overflow = ListOverflow::Scroll;
            self.focus = Focus::Input;
            KeyCommand::CloseSubmenu
        } else {
            self.submenu_open = true;
            self.overflow = ListOverflow::Hidden;
            self.focus = Focus::Submenu;
            KeyCommand::OpenSubmenu
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_chord, Focus, Key, KeyChord, KeyCommand, KeyOutcome, KeyboardRouter, ListOverflow,
    };
    use crate::filter::FilterKind;

    fn chord(input: &str) -> KeyChord {
        parse_chord(input).unwrap()
    }

    #[test]
    fn parses_modifiers_and_named_keys() {
        let parsed = chord("Ctrl+Shift+Enter");
        assert!(parsed.ctrl && parsed.shift && !parsed.meta);
        assert_eq!(parsed.key, Key::Enter);
        assert_eq!(chord("Cmd+O").key, Key::Char('o'));
        assert!(parse_chord("Hyper+K").is_err());
        assert!(parse_chord("").is_err());
    }

    #[test]
    fn digit_chords_toggle_filters() {
        let mut router = KeyboardRouter::default();
        let expected = [
            ("Ctrl+1", FilterKind::All),
            ("Ctrl+2", FilterKind::Tab),
            ("Cmd+3", FilterKind::History),
            ("Ctrl+4", FilterKind::Bookmark),
        ];
        for (input, kind) in expected {
            assert_eq!(
                router.route(&chord(input), ""),
                KeyOutcome::Consumed(Some(KeyCommand::ToggleFilter(kind)))
            );
        }
    }

    #[test]
    fn extra_modifiers_fall_through() {
        let mut router = KeyboardRouter::default();
        assert_eq!(router.route(&chord("Ctrl+Shift+2"), ""), KeyOutcome::Ignored);
        assert_eq!(router.route(&chord("Ctrl+Alt+2"), ""), KeyOutcome::Ignored);
        assert_eq!(router.route(&chord("Ctrl+Cmd+2"), ""), KeyOutcome::Ignored);
        assert_eq!(router.route(&chord("Ctrl+Cmd+Enter"), "test"), KeyOutcome::Ignored);
        assert_eq!(router.route(&chord("Ctrl+5"), ""), KeyOutcome::Ignored);
        assert_eq!(router.route(&chord("2"), ""), KeyOutcome::Ignored);
    }

    #[test]
    fn ctrl_enter_searches_even_for_addresses() {
        let mut router = KeyboardRouter::default();
        assert_eq!(
            router.route(&chord("Ctrl+Enter"), "https://example.com"),
            KeyOutcome::Consumed(Some(KeyCommand::WebSearch(
                "https://example.com".into()
            )))
        );
    }

    #[test]
    fn ctrl_shift_enter_navigates_only_for_addresses() {
        let mut router = KeyboardRouter::default();
        assert_eq!(
            router.route(&chord("Ctrl+Shift+Enter"), "https://example.com"),
            KeyOutcome::Consumed(Some(KeyCommand::Navigate("https://example.com".into())))
        );
        assert_eq!(
            router.route(&chord("Ctrl+Shift+Enter"), "test"),
            KeyOutcome::Consumed(Some(KeyCommand::WebSearch("test".into())))
        );
    }

    #[test]
    fn submenu_suspends_scrolling_and_restores_focus() {
        let mut router = KeyboardRouter::default();
        router.scroll_to(120);
        assert_eq!(
            router.route(&chord("Ctrl+O"), ""),
            KeyOutcome::Consumed(Some(KeyCommand::OpenSubmenu))
        );
        assert_eq!(router.overflow(), ListOverflow::Hidden);
        assert_eq!(router.focus(), Focus::Submenu);
        router.scroll_to(0);
        assert_eq!(router.scroll_top(), 120);

        // input-scoped chords are inert while the submenu has focus
        assert_eq!(router.route(&chord("Ctrl+2"), ""), KeyOutcome::Ignored);

        assert_eq!(
            router.route(&chord("Escape"), ""),
            KeyOutcome::Consumed(Some(KeyCommand::CloseSubmenu))
        );
        assert_eq!(router.overflow(), ListOverflow::Scroll);
        assert_eq!(router.focus(), Focus::Input);
        assert!(!router.submenu_open());
    }

    #[test]
    fn escape_without_submenu_falls_through() {
        let mut router = KeyboardRouter::default();
        assert_eq!(router.route(&chord("Escape"), ""), KeyOutcome::Ignored);
    }

    #[test]
    fn query_change_resets_scroll() {
        let mut router = KeyboardRouter::default();
        router.scroll_to(64);
        router.on_query_changed();
        assert_eq!(router.scroll_top(), 0);
    }
}

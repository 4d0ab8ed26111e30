use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    All,
    Tab,
    History,
    Bookmark,
}

impl FilterKind {
    /// Position used by the `Ctrl+1..4` chords.
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(Self::All),
            '2' => Some(Self::Tab),
            '3' => Some(Self::History),
            '4' => Some(Self::Bookmark),
            _ => None,
        }
    }
}

/// Coupled selection flags. `all` holds exactly when no specific flag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    all: bool,
    tab: bool,
    history: bool,
    bookmark: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            all: true,
            tab: false,
            history: false,
            bookmark: false,
        }
    }
}

impl FilterState {
    pub fn toggle(&mut self, kind: FilterKind) {
        match kind {
            FilterKind::All => {
                *self = Self::default();
                return;
            }
            FilterKind::Tab => self.tab = !self.tab,
            FilterKind::History => self.history = !self.history,
            FilterKind::Bookmark => self.bookmark = !self.bookmark,
        }
        self.all = !(self.tab || self.history || self.bookmark);
    }

    pub fn is_active(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::All => self.all,
            FilterKind::Tab => self.tab,
            FilterKind::History => self.history,
            FilterKind::Bookmark => self.bookmark,
        }
    }

    pub fn shows_tabs(&self) -> bool {
        self.all || self.tab
    }

    pub fn shows_history(&self) -> bool {
        self.all || self.history
    }

    pub fn shows_bookmarks(&self) -> bool {
        self.all || self.bookmark
    }
}

use super::button::LogicalButton;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Normalized, device-agnostic button event
///
/// `value` is only present for analog samples (trigger travel or stick deflection)
/// and always lies in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub player: u8,
    pub button: LogicalButton,
    pub pressed: bool,
    pub value: Option<f32>,
}

impl InputEvent {
    pub fn new(player: u8, button: LogicalButton, pressed: bool) -> Self {
        Self {
            player,
            button,
            pressed,
            value: None,
        }
    }

    pub fn with_value(player: u8, button: LogicalButton, pressed: bool, value: f32) -> Self {
        Self {
            player,
            button,
            pressed,
            value: Some(value.clamp(0.0, 1.0)),
        }
    }
}

/// Source category an event was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Gamepad,
    Keyboard,
}

impl Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::Gamepad => write!(f, "Gamepad"),
            EventCategory::Keyboard => write!(f, "Keyboard"),
        }
    }
}

/// Set of accepted event categories for a handler
///
/// A handler registered without a filter accepts every category; a filter
/// only accepts the categories it contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CategoryFilter {
    gamepad: bool,
    keyboard: bool,
}

impl CategoryFilter {
    pub const fn empty() -> Self {
        Self {
            gamepad: false,
            keyboard: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            gamepad: true,
            keyboard: true,
        }
    }

    pub fn only(category: EventCategory) -> Self {
        let mut filter = Self::empty();
        filter.insert(category);
        filter
    }

    pub fn insert(&mut self, category: EventCategory) {
        match category {
            EventCategory::Gamepad => self.gamepad = true,
            EventCategory::Keyboard => self.keyboard = true,
        }
    }

    pub fn remove(&mut self, category: EventCategory) {
        match category {
            EventCategory::Gamepad => self.gamepad = false,
            EventCategory::Keyboard => self.keyboard = false,
        }
    }

    pub fn contains(&self, category: EventCategory) -> bool {
        match category {
            EventCategory::Gamepad => self.gamepad,
            EventCategory::Keyboard => self.keyboard,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.gamepad && !self.keyboard
    }
}

impl FromIterator<EventCategory> for CategoryFilter {
    fn from_iter<I: IntoIterator<Item = EventCategory>>(iter: I) -> Self {
        let mut filter = Self::empty();
        for category in iter {
            filter.insert(category);
        }
        filter
    }
}

/// Absent filter means "accept everything"
pub fn accepts(filter: Option<&CategoryFilter>, category: EventCategory) -> bool {
    filter.map_or(true, |f| f.contains(category))
}

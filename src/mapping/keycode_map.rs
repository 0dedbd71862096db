//! Keyboard scancode to logical button mapping, one map per keyboard player

use crate::input::LogicalButton;
use std::collections::HashMap;
use std::fmt::{self, Display};
use tracing::debug;

macro_rules! keymap_insert {
    ($map:expr, $( $code:expr => $button:ident ),* $(,)?) => {
        $( $map.insert($code, LogicalButton::$button); )*
    };
}

/// Keyboard player slot; each slot owns an independent [`KeyCodeMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    /// Player number reported in events produced through this slot
    pub fn player(self) -> u8 {
        match self {
            PlayerSlot::One => 1,
            PlayerSlot::Two => 2,
        }
    }
}

impl Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.player())
    }
}

/// Mutable mapping from a raw scancode to a logical button
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCodeMap {
    entries: HashMap<u16, LogicalButton>,
}

impl KeyCodeMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard single-player layout (macOS virtual key codes)
    pub fn default_layout() -> Self {
        let mut entries = HashMap::new();
        keymap_insert!(entries,
            0 => Left,
            2 => Right,
            13 => Up,
            1 => Down,
            35 => A,
            33 => B,
            30 => C,
            41 => X,
            39 => Y,
            42 => Z,
            18 => Select,
            19 => Start,
            36 => A,
            53 => Menu,
        );
        Self { entries }
    }

    pub fn get(&self, code: u16) -> Option<LogicalButton> {
        self.entries.get(&code).copied()
    }

    /// Binds `code` to `button`, returning the previous binding
    pub fn set(&mut self, code: u16, button: LogicalButton) -> Option<LogicalButton> {
        let previous = self.entries.insert(code, button);
        debug!("Key {} bound to {} (was {:?})", code, button, previous);
        previous
    }

    pub fn remove(&mut self, code: u16) -> Option<LogicalButton> {
        self.entries.remove(&code)
    }

    pub fn contains(&self, code: u16) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, LogicalButton)> + '_ {
        self.entries.iter().map(|(code, button)| (*code, *button))
    }

    /// All scancodes currently bound to `button`
    pub fn codes_for(&self, button: LogicalButton) -> Vec<u16> {
        let mut codes: Vec<u16> = self
            .entries
            .iter()
            .filter(|(_, b)| **b == button)
            .map(|(code, _)| *code)
            .collect();
        codes.sort_unstable();
        codes
    }
}

impl FromIterator<(u16, LogicalButton)> for KeyCodeMap {
    fn from_iter<I: IntoIterator<Item = (u16, LogicalButton)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The two keyboard player maps
///
/// Slot one starts with [`KeyCodeMap::default_layout`], slot two starts empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardMaps {
    p1: KeyCodeMap,
    p2: KeyCodeMap,
}

impl Default for KeyboardMaps {
    fn default() -> Self {
        Self {
            p1: KeyCodeMap::default_layout(),
            p2: KeyCodeMap::empty(),
        }
    }
}

impl KeyboardMaps {
    pub fn slot(&self, slot: PlayerSlot) -> &KeyCodeMap {
        match slot {
            PlayerSlot::One => &self.p1,
            PlayerSlot::Two => &self.p2,
        }
    }

    pub fn slot_mut(&mut self, slot: PlayerSlot) -> &mut KeyCodeMap {
        match slot {
            PlayerSlot::One => &mut self.p1,
            PlayerSlot::Two => &mut self.p2,
        }
    }

    /// Looks `code` up in slot one first, then slot two
    pub fn resolve(&self, code: u16) -> Option<(PlayerSlot, LogicalButton)> {
        if let Some(button) = self.p1.get(code) {
            return Some((PlayerSlot::One, button));
        }
        self.p2.get(code).map(|button| (PlayerSlot::Two, button))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_lookups() {
        let map = KeyCodeMap::default_layout();
        assert_eq!(map.get(13), Some(LogicalButton::Up));
        assert_eq!(map.get(53), Some(LogicalButton::Menu));
        assert_eq!(map.get(999), None);
        assert_eq!(map.len(), 14);
    }

    #[test]
    fn test_default_layout_has_two_a_keys() {
        let map = KeyCodeMap::default_layout();
        assert_eq!(map.codes_for(LogicalButton::A), vec![35, 36]);
    }

    #[test]
    fn test_set_and_remove() {
        let mut map = KeyCodeMap::empty();
        assert_eq!(map.set(126, LogicalButton::Up), None);
        assert_eq!(map.set(126, LogicalButton::Down), Some(LogicalButton::Up));
        assert_eq!(map.get(126), Some(LogicalButton::Down));
        assert_eq!(map.remove(126), Some(LogicalButton::Down));
        assert!(map.is_empty());
        assert_eq!(map.remove(126), None);
    }

    #[test]
    fn test_slot_one_wins_over_slot_two() {
        let mut maps = KeyboardMaps::default();
        maps.slot_mut(PlayerSlot::Two).set(13, LogicalButton::Down);
        maps.slot_mut(PlayerSlot::Two).set(126, LogicalButton::Up);

        assert_eq!(maps.resolve(13), Some((PlayerSlot::One, LogicalButton::Up)));
        assert_eq!(maps.resolve(126), Some((PlayerSlot::Two, LogicalButton::Up)));
        assert_eq!(maps.resolve(999), None);
    }

    #[test]
    fn test_slot_two_starts_empty() {
        let maps = KeyboardMaps::default();
        assert!(maps.slot(PlayerSlot::Two).is_empty());
        assert_eq!(PlayerSlot::Two.player(), 2);
    }
}

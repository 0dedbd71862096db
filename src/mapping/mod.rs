//! Keyboard mapping
//!
//! Each keyboard player owns an independent scancode map. Applications remap keys by
//! mutating the maps directly; nothing here is persisted.

pub mod keycode_map;

pub use keycode_map::{KeyCodeMap, KeyboardMaps, PlayerSlot};

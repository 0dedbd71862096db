//! Device-agnostic input layer
//!
//! Normalizes gamepads and keyboards into one stream of [`InputEvent`]s and routes each
//! event to the single handler on top of a registration stack.

pub mod config;
pub mod controller;
pub mod input;
pub mod mapping;
pub mod router;
pub mod store;

pub use config::{ConfigError, StoreSettings};
pub use input::{CategoryFilter, EventCategory, InputEvent, LogicalButton};
pub use router::{HandlerId, StackCommands};
pub use store::handle::{InputStoreHandle, StoreCommand, StoreError, StoreStatus};
pub use store::InputStore;

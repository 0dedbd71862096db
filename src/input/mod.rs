//! Shared vocabulary for every other subsystem
//!
//! - [`button`] - the closed catalog of logical buttons
//! - [`event`] - normalized events and the category filter used for routing

pub mod button;
pub mod event;

pub use button::LogicalButton;
pub use event::{CategoryFilter, EventCategory, InputEvent};

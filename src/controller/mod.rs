//! Gamepad side of the input layer
//!
//! 1. [`event_collector`] - gilrs device source producing raw store commands
//! 2. [`sample`] - raw sample, element and device descriptor types
//! 3. [`dpad`] - directional debouncing of d-pads and sticks
//!
//! ```text
//! Gamepad ──► Collector ──► PadSample ──► InputStore ──► DPadDebouncer ──► InputEvent
//!             (gilrs)       (raw)                        (edges)
//! ```

pub mod dpad;
pub mod event_collector;
pub mod sample;

pub use dpad::{DPadDebouncer, Direction, DirectionChangePolicy, DirectionalState, DpadEdge};
pub use event_collector::{spawn_collector, CollectorError, CollectorSettings};
pub use sample::{ElementState, PadDescriptor, PadElement, PadId, PadProfile, PadSample, Stick};

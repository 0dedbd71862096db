//! Raw gamepad sample types handed to the store by a device source

use crate::controller::dpad::{DirectionalSource, DirectionalState};
use crate::input::LogicalButton;
use chrono::{DateTime, Local};
use std::fmt::{self, Display};

/// Stable identifier of a physical pad, assigned by the device source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadId(pub usize);

impl Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pad#{}", self.0)
    }
}

/// Element layout a pad reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadProfile {
    /// Full controller: d-pad, face buttons, shoulders, triggers, sticks, menu
    Extended,
    /// Remote-style controller: d-pad plus A and X
    Micro,
    /// Nothing usable; skipped during player assignment
    Unsupported,
}

impl PadProfile {
    pub fn accepts(self, element: &PadElement) -> bool {
        match self {
            PadProfile::Extended => match element {
                PadElement::DPad(_) | PadElement::Stick { .. } => true,
                PadElement::Button { button, .. } => matches!(
                    button,
                    LogicalButton::Menu
                        | LogicalButton::A
                        | LogicalButton::B
                        | LogicalButton::X
                        | LogicalButton::Y
                        | LogicalButton::L1
                        | LogicalButton::R1
                        | LogicalButton::L2
                        | LogicalButton::R2
                        | LogicalButton::L3
                        | LogicalButton::R3
                        | LogicalButton::Select
                ),
            },
            PadProfile::Micro => match element {
                PadElement::DPad(_) => true,
                PadElement::Button { button, .. } => {
                    matches!(button, LogicalButton::A | LogicalButton::X)
                }
                PadElement::Stick { .. } => false,
            },
            PadProfile::Unsupported => false,
        }
    }
}

/// One entry of the platform's current device list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadDescriptor {
    pub id: PadId,
    pub name: String,
    pub profile: PadProfile,
}

/// Analog stick selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    pub fn source(self) -> DirectionalSource {
        match self {
            Stick::Left => DirectionalSource::LeftStick,
            Stick::Right => DirectionalSource::RightStick,
        }
    }
}

/// Pressed flag plus optional analog magnitude of a single element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementState {
    pub pressed: bool,
    pub value: Option<f32>,
}

impl ElementState {
    pub fn digital(pressed: bool) -> Self {
        Self {
            pressed,
            value: None,
        }
    }

    /// Analog element whose pressed flag is derived from `threshold`
    pub fn analog(value: f32, threshold: f32) -> Self {
        Self {
            pressed: value >= threshold,
            value: Some(value),
        }
    }
}

/// A changed element inside one raw sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadElement {
    DPad(DirectionalState),
    Button {
        button: LogicalButton,
        state: ElementState,
    },
    Stick {
        stick: Stick,
        x: f32,
        y: f32,
    },
}

/// Raw device-state-changed notification for one pad
#[derive(Debug, Clone)]
pub struct PadSample {
    pub elements: Vec<PadElement>,
    pub timestamp: DateTime<Local>,
}

impl PadSample {
    pub fn new(elements: Vec<PadElement>) -> Self {
        Self {
            elements,
            timestamp: Local::now(),
        }
    }

    pub fn single(element: PadElement) -> Self {
        Self::new(vec![element])
    }
}

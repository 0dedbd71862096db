use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Closed catalog of logical buttons shared by every input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalButton {
    Up,
    Down,
    Left,
    Right,

    /// A or Cross
    A,
    /// B or Circle
    B,
    C,
    /// X or Square
    X,
    /// Y or Triangle
    Y,
    Z,

    L1,
    L2,
    L3,
    R1,
    R2,
    R3,
    Start,
    Select,
    AnalogMode,
    LeftAnalogUp,
    LeftAnalogDown,
    LeftAnalogLeft,
    LeftAnalogRight,
    RightAnalogUp,
    RightAnalogDown,
    RightAnalogLeft,
    RightAnalogRight,
    Menu,
}

impl LogicalButton {
    pub const ALL: [LogicalButton; 28] = [
        LogicalButton::Up,
        LogicalButton::Down,
        LogicalButton::Left,
        LogicalButton::Right,
        LogicalButton::A,
        LogicalButton::B,
        LogicalButton::C,
        LogicalButton::X,
        LogicalButton::Y,
        LogicalButton::Z,
        LogicalButton::L1,
        LogicalButton::L2,
        LogicalButton::L3,
        LogicalButton::R1,
        LogicalButton::R2,
        LogicalButton::R3,
        LogicalButton::Start,
        LogicalButton::Select,
        LogicalButton::AnalogMode,
        LogicalButton::LeftAnalogUp,
        LogicalButton::LeftAnalogDown,
        LogicalButton::LeftAnalogLeft,
        LogicalButton::LeftAnalogRight,
        LogicalButton::RightAnalogUp,
        LogicalButton::RightAnalogDown,
        LogicalButton::RightAnalogLeft,
        LogicalButton::RightAnalogRight,
        LogicalButton::Menu,
    ];

    /// True for the four d-pad directions
    pub fn is_dpad(self) -> bool {
        matches!(
            self,
            LogicalButton::Up | LogicalButton::Down | LogicalButton::Left | LogicalButton::Right
        )
    }

    /// True for the eight analog stick half-axes
    pub fn is_analog_direction(self) -> bool {
        matches!(
            self,
            LogicalButton::LeftAnalogUp
                | LogicalButton::LeftAnalogDown
                | LogicalButton::LeftAnalogLeft
                | LogicalButton::LeftAnalogRight
                | LogicalButton::RightAnalogUp
                | LogicalButton::RightAnalogDown
                | LogicalButton::RightAnalogLeft
                | LogicalButton::RightAnalogRight
        )
    }
}

impl Display for LogicalButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

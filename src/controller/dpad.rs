//! Directional debouncing
//!
//! Converts four independent direction booleans (d-pad buttons, or a thresholded
//! analog stick) into a single active direction with edge-triggered press and
//! release transitions.
//!
//! ```text
//!            press(d)              release(d)
//!   None ───────────────► Active(d) ───────────► None
//!                            │  ▲
//!                            └──┘ press(d') (last writer wins)
//! ```

use crate::input::LogicalButton;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the four pad directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Evaluation order when several directions are held at once
    pub const PRIORITY: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];
}

/// Which physical element a directional sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionalSource {
    DPad,
    LeftStick,
    RightStick,
}

impl DirectionalSource {
    pub fn button(self, direction: Direction) -> LogicalButton {
        match (self, direction) {
            (DirectionalSource::DPad, Direction::Left) => LogicalButton::Left,
            (DirectionalSource::DPad, Direction::Right) => LogicalButton::Right,
            (DirectionalSource::DPad, Direction::Up) => LogicalButton::Up,
            (DirectionalSource::DPad, Direction::Down) => LogicalButton::Down,
            (DirectionalSource::LeftStick, Direction::Left) => LogicalButton::LeftAnalogLeft,
            (DirectionalSource::LeftStick, Direction::Right) => LogicalButton::LeftAnalogRight,
            (DirectionalSource::LeftStick, Direction::Up) => LogicalButton::LeftAnalogUp,
            (DirectionalSource::LeftStick, Direction::Down) => LogicalButton::LeftAnalogDown,
            (DirectionalSource::RightStick, Direction::Left) => LogicalButton::RightAnalogLeft,
            (DirectionalSource::RightStick, Direction::Right) => LogicalButton::RightAnalogRight,
            (DirectionalSource::RightStick, Direction::Up) => LogicalButton::RightAnalogUp,
            (DirectionalSource::RightStick, Direction::Down) => LogicalButton::RightAnalogDown,
        }
    }
}

/// Raw pressed state of the four directions for one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionalState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionalState {
    pub fn is_pressed(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    /// Thresholds an analog stick sample; positive `y` points up
    pub fn from_axes(x: f32, y: f32, threshold: f32) -> Self {
        Self {
            up: y >= threshold,
            down: y <= -threshold,
            left: x <= -threshold,
            right: x >= threshold,
        }
    }

    /// First pressed direction in [`Direction::PRIORITY`] order
    pub fn candidate(&self) -> Option<Direction> {
        Direction::PRIORITY
            .into_iter()
            .find(|direction| self.is_pressed(*direction))
    }
}

/// What to emit when the active direction switches without passing through neutral
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionChangePolicy {
    /// Only the new press; the old direction is never released explicitly
    #[default]
    LastWriterWins,
    /// Release of the old direction followed by the press of the new one
    ReleaseThenPress,
}

/// Transition produced by a single debouncer update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpadEdge {
    Pressed(Direction),
    Released(Direction),
    /// Only produced under [`DirectionChangePolicy::ReleaseThenPress`]
    Changed { from: Direction, to: Direction },
}

impl DpadEdge {
    /// `(direction, pressed)` pairs in emission order
    pub fn transitions(self) -> impl Iterator<Item = (Direction, bool)> {
        let (first, second) = match self {
            DpadEdge::Pressed(direction) => ((direction, true), None),
            DpadEdge::Released(direction) => ((direction, false), None),
            DpadEdge::Changed { from, to } => ((from, false), Some((to, true))),
        };
        std::iter::once(first).chain(second)
    }
}

/// Per-pad debounce state machine
#[derive(Debug, Clone, Default)]
pub struct DPadDebouncer {
    active: Option<Direction>,
    policy: DirectionChangePolicy,
}

impl DPadDebouncer {
    pub fn new(policy: DirectionChangePolicy) -> Self {
        Self {
            active: None,
            policy,
        }
    }

    pub fn active(&self) -> Option<Direction> {
        self.active
    }

    pub fn policy(&self) -> DirectionChangePolicy {
        self.policy
    }

    /// Feed one raw sample; returns at most one edge
    pub fn update(&mut self, state: DirectionalState) -> Option<DpadEdge> {
        let edge = match (state.candidate(), self.active) {
            (Some(candidate), Some(active)) if candidate == active => None,
            (Some(candidate), Some(active)) => {
                self.active = Some(candidate);
                match self.policy {
                    DirectionChangePolicy::LastWriterWins => Some(DpadEdge::Pressed(candidate)),
                    DirectionChangePolicy::ReleaseThenPress => Some(DpadEdge::Changed {
                        from: active,
                        to: candidate,
                    }),
                }
            }
            (Some(candidate), None) => {
                self.active = Some(candidate);
                Some(DpadEdge::Pressed(candidate))
            }
            (None, Some(active)) => {
                self.active = None;
                Some(DpadEdge::Released(active))
            }
            (None, None) => None,
        };

        if let Some(edge) = edge {
            debug!("Directional edge: {:?}", edge);
        }
        edge
    }
}

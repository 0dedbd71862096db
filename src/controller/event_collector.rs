//! gilrs device source
//!
//! Polls gilrs and turns its events into [`StoreCommand`]s: device list rescans on
//! connect, detach notices, and per-change pad samples. Normalization itself happens
//! in the store; this module only reports raw element state.

use crate::controller::dpad::DirectionalState;
use crate::controller::sample::{
    ElementState, PadDescriptor, PadElement, PadId, PadProfile, PadSample, Stick,
};
use crate::input::LogicalButton;
use crate::store::handle::StoreCommand;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs, MappingSource};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub trigger_press_threshold: f32,
    pub poll_interval_us: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            trigger_press_threshold: 0.5,
            poll_interval_us: 100,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Store channel closed: {0}")]
    ChannelClosed(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct EventCollector<S: CollectionState> {
    gilrs: Gilrs,
    settings: CollectorSettings,
    command_tx: mpsc::Sender<StoreCommand>,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Current device list in gilrs enumeration order
    fn descriptors(&self) -> Vec<PadDescriptor> {
        self.gilrs
            .gamepads()
            .map(|(id, gamepad)| PadDescriptor {
                id: pad_id(id),
                name: gamepad.name().to_string(),
                profile: profile_for(&gamepad),
            })
            .collect()
    }

    fn send(&self, command: StoreCommand) -> Result<(), CollectorError> {
        self.command_tx
            .blocking_send(command)
            .map_err(|e| CollectorError::ChannelClosed(format!("{:?}", e.0)))
    }
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        command_tx: mpsc::Sender<StoreCommand>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, settings, command_tx))
    }

    /// Announces the devices present at startup and starts collecting
    pub fn initialize(self) -> Result<EventCollector<Collecting>, CollectorError> {
        let devices = self.descriptors();
        if devices.is_empty() {
            warn!("No gamepad connected, waiting for hotplug");
        } else {
            info!("Found {} gamepads", devices.len());
            self.send(StoreCommand::DevicesChanged(devices))?;
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        Ok(self.transition())
    }
}

impl EventCollector<Collecting> {
    /// Forwards at most one gilrs event
    pub fn collect_next_event(&mut self) -> Result<(), CollectorError> {
        let Some(Event { id, event, time, .. }) = self.gilrs.next_event() else {
            return Ok(());
        };
        debug!("Processing gilrs event: {:?} at time: {:?}", event, time);

        let command = match event {
            EventType::Connected => {
                info!("Controller connected, rescanning");
                Some(StoreCommand::DevicesChanged(self.descriptors()))
            }
            EventType::Disconnected => {
                warn!("Controller {} disconnected", id);
                Some(StoreCommand::DeviceDetached(pad_id(id)))
            }
            other => self
                .convert_element(id, other)
                .map(|element| StoreCommand::PadSample {
                    pad: pad_id(id),
                    player: None,
                    sample: PadSample::single(element),
                }),
        };

        match command {
            Some(command) => self.send(command),
            None => {
                debug!("Event ignored due to filtering or mapping");
                Ok(())
            }
        }
    }

    /// Runs until the store goes away
    pub fn run_collection_loop(&mut self) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");
        let pause = Duration::from_micros(self.settings.poll_interval_us);

        loop {
            if self.command_tx.is_closed() {
                return Err(CollectorError::ChannelClosed("store stopped".to_string()));
            }
            if let Err(e) = self.collect_next_event() {
                error!("Error collecting event: {}", e);
                return Err(e);
            }
            std::thread::sleep(pause);
        }
    }

    fn convert_element(&self, id: GamepadId, event: EventType) -> Option<PadElement> {
        let gamepad = self.gilrs.gamepad(id);
        let threshold = self.settings.trigger_press_threshold;

        match event {
            EventType::ButtonPressed(button, _) | EventType::ButtonReleased(button, _)
                if is_dpad(button) =>
            {
                Some(PadElement::DPad(dpad_state(&gamepad)))
            }
            EventType::ButtonChanged(button, value, _) if is_analog_trigger(button) => {
                map_button(button).map(|button| PadElement::Button {
                    button,
                    state: ElementState::analog(value, threshold),
                })
            }
            EventType::ButtonPressed(button, _) if !is_analog_trigger(button) => {
                map_button(button).map(|button| PadElement::Button {
                    button,
                    state: ElementState::digital(true),
                })
            }
            EventType::ButtonReleased(button, _) if !is_analog_trigger(button) => {
                map_button(button).map(|button| PadElement::Button {
                    button,
                    state: ElementState::digital(false),
                })
            }
            EventType::AxisChanged(axis, _, _) => match axis {
                Axis::LeftStickX | Axis::LeftStickY => Some(PadElement::Stick {
                    stick: Stick::Left,
                    x: gamepad.value(Axis::LeftStickX),
                    y: gamepad.value(Axis::LeftStickY),
                }),
                Axis::RightStickX | Axis::RightStickY => Some(PadElement::Stick {
                    stick: Stick::Right,
                    x: gamepad.value(Axis::RightStickX),
                    y: gamepad.value(Axis::RightStickY),
                }),
                // some drivers report triggers as -1..1 axes
                Axis::LeftZ | Axis::RightZ => {
                    let value = ((gamepad.value(axis) + 1.0) / 2.0).clamp(0.0, 1.0);
                    let button = if axis == Axis::LeftZ {
                        LogicalButton::L2
                    } else {
                        LogicalButton::R2
                    };
                    Some(PadElement::Button {
                        button,
                        state: ElementState::analog(value, threshold),
                    })
                }
                _ => {
                    debug!("Ignoring unsupported axis: {:?}", axis);
                    None
                }
            },
            _ => None,
        }
    }
}

/// Spawns the collector on a blocking thread
///
/// gilrs is created on that thread, so initialization errors are logged there.
pub fn spawn_collector(
    settings: Option<CollectorSettings>,
    command_tx: mpsc::Sender<StoreCommand>,
) -> JoinHandle<()> {
    info!("Spawning Event Collector with settings: {:?}", settings);
    tokio::task::spawn_blocking(move || {
        let collector = match EventCollector::create(settings, command_tx) {
            Ok(collector) => collector,
            Err(e) => {
                error!("Failed to create Event Collector: {}", e);
                return;
            }
        };
        match collector.initialize() {
            Ok(mut collecting) => {
                if let Err(e) = collecting.run_collection_loop() {
                    info!("Event Collector stopped: {}", e);
                }
            }
            Err(e) => error!("Failed to initialize Event Collector: {}", e),
        }
    })
}

fn pad_id(id: GamepadId) -> PadId {
    PadId(usize::from(id))
}

/// Pads without a known layout only get the micro element set
///
/// The collector never reports [`PadProfile::Unsupported`]; hosts feeding
/// descriptors themselves use it to exclude a device.
fn profile_for(gamepad: &Gamepad<'_>) -> PadProfile {
    profile_for_source(gamepad.mapping_source())
}

fn profile_for_source(source: MappingSource) -> PadProfile {
    match source {
        MappingSource::SdlMappings | MappingSource::Driver => PadProfile::Extended,
        MappingSource::None => PadProfile::Micro,
    }
}

fn dpad_state(gamepad: &Gamepad<'_>) -> DirectionalState {
    DirectionalState {
        up: gamepad.is_pressed(Button::DPadUp),
        down: gamepad.is_pressed(Button::DPadDown),
        left: gamepad.is_pressed(Button::DPadLeft),
        right: gamepad.is_pressed(Button::DPadRight),
    }
}

fn is_dpad(button: Button) -> bool {
    matches!(
        button,
        Button::DPadUp | Button::DPadDown | Button::DPadLeft | Button::DPadRight
    )
}

fn is_analog_trigger(button: Button) -> bool {
    matches!(button, Button::LeftTrigger2 | Button::RightTrigger2)
}

fn map_button(button: Button) -> Option<LogicalButton> {
    match button {
        Button::South => Some(LogicalButton::A),
        Button::East => Some(LogicalButton::B),
        Button::West => Some(LogicalButton::X),
        Button::North => Some(LogicalButton::Y),
        Button::Start => Some(LogicalButton::Menu),
        Button::Select => Some(LogicalButton::Select),
        Button::LeftTrigger => Some(LogicalButton::L1),
        Button::RightTrigger => Some(LogicalButton::R1),
        Button::LeftTrigger2 => Some(LogicalButton::L2),
        Button::RightTrigger2 => Some(LogicalButton::R2),
        Button::LeftThumb => Some(LogicalButton::L3),
        Button::RightThumb => Some(LogicalButton::R3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_buttons_follow_positional_layout() {
        assert_eq!(map_button(Button::South), Some(LogicalButton::A));
        assert_eq!(map_button(Button::West), Some(LogicalButton::X));
        assert_eq!(map_button(Button::Start), Some(LogicalButton::Menu));
        assert_eq!(map_button(Button::Mode), None);
    }

    #[test]
    fn test_dpad_and_trigger_classification() {
        assert!(is_dpad(Button::DPadLeft));
        assert!(!is_dpad(Button::South));
        assert!(is_analog_trigger(Button::RightTrigger2));
        assert!(!is_analog_trigger(Button::RightTrigger));
    }

    #[test]
    fn test_profile_follows_mapping_source() {
        assert_eq!(profile_for_source(MappingSource::SdlMappings), PadProfile::Extended);
        assert_eq!(profile_for_source(MappingSource::Driver), PadProfile::Extended);
        assert_eq!(profile_for_source(MappingSource::None), PadProfile::Micro);
    }
}

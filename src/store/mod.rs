//! Input store - composition root of the input layer
//!
//! Owns one set of debouncers per attached pad, both keyboard maps and the handler
//! router, and exposes the ingestion entry points a device source calls:
//!
//! ```text
//! rescan_devices / on_device_detached ──► player assignment ──► connection handler
//! on_gamepad_sample ──► DPadDebouncer (directional) ─┐
//!                   └─► direct mapping (discrete) ───┼──► EventRouter ──► top handler
//! on_key_event ──► KeyboardMaps ─────────────────────┘
//! ```
//!
//! Use [`InputStore`] directly when every call comes from one thread; use
//! [`handle::InputStoreHandle`] to drive it from several tasks.

pub mod handle;

use crate::config::StoreSettings;
use crate::controller::dpad::{DPadDebouncer, Direction, DirectionalSource, DirectionalState};
use crate::controller::sample::{PadDescriptor, PadElement, PadId, PadProfile, PadSample};
use crate::input::{CategoryFilter, EventCategory, InputEvent};
use crate::mapping::keycode_map::{KeyCodeMap, KeyboardMaps, PlayerSlot};
use crate::router::{
    ConnectionEventHandler, EventRouter, HandlerId, InputEventHandler, StackCommands,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Per-pad normalization state
#[derive(Debug)]
struct PadState {
    name: String,
    player: u8,
    profile: PadProfile,
    dpad: DPadDebouncer,
    left_stick: DPadDebouncer,
    right_stick: DPadDebouncer,
}

impl PadState {
    fn new(name: String, player: u8, profile: PadProfile, settings: &StoreSettings) -> Self {
        let policy = settings.direction_change_policy;
        Self {
            name,
            player,
            profile,
            dpad: DPadDebouncer::new(policy),
            left_stick: DPadDebouncer::new(policy),
            right_stick: DPadDebouncer::new(policy),
        }
    }

    fn debouncer(&mut self, source: DirectionalSource) -> &mut DPadDebouncer {
        match source {
            DirectionalSource::DPad => &mut self.dpad,
            DirectionalSource::LeftStick => &mut self.left_stick,
            DirectionalSource::RightStick => &mut self.right_stick,
        }
    }
}

pub struct InputStore {
    settings: StoreSettings,
    router: EventRouter,
    keymaps: KeyboardMaps,
    pads: HashMap<PadId, PadState>,
    window_active: bool,
}

impl Default for InputStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

impl InputStore {
    /// Invalid settings are logged and replaced by defaults
    pub fn new(settings: StoreSettings) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!("{}, using default settings", e);
                StoreSettings::default()
            }
        };
        info!("Creating input store with settings: {:?}", settings);
        Self {
            window_active: settings.window_active_on_start,
            settings,
            router: EventRouter::new(),
            keymaps: KeyboardMaps::default(),
            pads: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    // ---- registration ----

    pub fn register_handler(
        &mut self,
        filter: Option<CategoryFilter>,
        handler: impl FnMut(&InputEvent) + Send + 'static,
    ) -> HandlerId {
        self.router.register(filter, handler)
    }

    pub fn register_handler_with_id(
        &mut self,
        id: HandlerId,
        filter: Option<CategoryFilter>,
        handler: InputEventHandler,
    ) {
        self.router.register_with_id(id, filter, handler)
    }

    pub fn unregister_handler(&mut self, id: HandlerId) -> bool {
        self.router.unregister(id)
    }

    /// Single-slot convenience on top of the handler stack
    ///
    /// The first call pushes an unfiltered entry; later calls replace its callback in
    /// place. `None` removes the entry.
    pub fn set_button_handler(&mut self, handler: Option<InputEventHandler>) {
        match handler {
            Some(handler) => self.router.upsert(HandlerId::BUTTON_SLOT, None, handler),
            None => {
                self.router.unregister(HandlerId::BUTTON_SLOT);
            }
        }
    }

    pub fn set_connection_handler(&mut self, handler: Option<ConnectionEventHandler>) {
        self.router.set_connection_handler(handler)
    }

    /// Deferred stack access for use inside handler callbacks
    pub fn commands(&self) -> StackCommands {
        self.router.commands()
    }

    pub fn handler_depth(&mut self) -> usize {
        self.router.depth()
    }

    pub fn top_handler(&mut self) -> Option<HandlerId> {
        self.router.top()
    }

    // ---- keyboard maps ----

    pub fn keymap(&self, slot: PlayerSlot) -> &KeyCodeMap {
        self.keymaps.slot(slot)
    }

    pub fn keymap_mut(&mut self, slot: PlayerSlot) -> &mut KeyCodeMap {
        self.keymaps.slot_mut(slot)
    }

    // ---- window gate ----

    pub fn set_window_active(&mut self, active: bool) {
        if self.window_active != active {
            debug!("Window active: {}", active);
        }
        self.window_active = active;
    }

    pub fn is_window_active(&self) -> bool {
        self.window_active
    }

    // ---- devices ----

    /// Reassigns players from the current device list and reports a connection
    ///
    /// Players are numbered from 0 in list order; unsupported devices are skipped
    /// without consuming a number. Pads no longer listed lose their state.
    pub fn rescan_devices(&mut self, devices: &[PadDescriptor]) {
        let mut previous = std::mem::take(&mut self.pads);
        let mut player: u8 = 0;

        for device in devices {
            if device.profile == PadProfile::Unsupported {
                debug!("Skipping {} ({}): no usable profile", device.id, device.name);
                continue;
            }

            let state = match previous.remove(&device.id) {
                Some(mut state) if state.profile == device.profile => {
                    state.player = player;
                    state.name = device.name.clone();
                    state
                }
                _ => PadState::new(device.name.clone(), player, device.profile, &self.settings),
            };
            info!(
                "  [{}] {} ({}) as {:?}",
                player, device.name, device.id, device.profile
            );
            self.pads.insert(device.id, state);
            player = player.saturating_add(1);
        }

        info!("Rescanned devices: {} usable pads", self.pads.len());
        self.router.notify_connection(true);
    }

    pub fn on_device_detached(&mut self, pad_id: PadId) {
        match self.pads.remove(&pad_id) {
            Some(state) => info!("{} ({}) detached", pad_id, state.name),
            None => debug!("Detach for unknown {}", pad_id),
        }
        self.router.notify_connection(false);
    }

    pub fn player_for(&self, pad_id: PadId) -> Option<u8> {
        self.pads.get(&pad_id).map(|state| state.player)
    }

    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }

    // ---- ingestion ----

    /// Normalizes one raw pad sample and dispatches the resulting events
    ///
    /// Returns how many events were delivered. A pad that was never announced through
    /// [`rescan_devices`](Self::rescan_devices) is treated as an extended controller.
    pub fn on_gamepad_sample(&mut self, pad_id: PadId, player: u8, sample: &PadSample) -> usize {
        let settings = &self.settings;
        let pad = self.pads.entry(pad_id).or_insert_with(|| {
            debug!("Sample from unannounced {}, assuming extended profile", pad_id);
            PadState::new(pad_id.to_string(), player, PadProfile::Extended, settings)
        });

        let mut events = Vec::new();
        for element in &sample.elements {
            if !pad.profile.accepts(element) {
                debug!("{:?} not part of {:?} profile, ignored", element, pad.profile);
                continue;
            }

            match *element {
                PadElement::DPad(state) => {
                    let source = DirectionalSource::DPad;
                    collect_directional(pad, player, source, state, None, &mut events);
                }
                PadElement::Button { button, state } => {
                    events.push(match state.value {
                        Some(value) => {
                            InputEvent::with_value(player, button, state.pressed, value)
                        }
                        None => InputEvent::new(player, button, state.pressed),
                    });
                }
                PadElement::Stick { stick, x, y } => {
                    let state = DirectionalState::from_axes(x, y, settings.stick_threshold);
                    let axes = Some((x, y));
                    collect_directional(pad, player, stick.source(), state, axes, &mut events);
                }
            }
        }

        debug!(
            "{} sample at {} produced {} events",
            pad_id,
            sample.timestamp.format("%H:%M:%S.%3f"),
            events.len()
        );

        events
            .into_iter()
            .filter(|event| self.router.dispatch(*event, EventCategory::Gamepad))
            .count()
    }

    /// Maps a raw key change and dispatches it
    ///
    /// Returns `true` only when a handler consumed the event; callers pass the native
    /// key event through otherwise.
    pub fn on_key_event(&mut self, raw_code: u16, pressed: bool) -> bool {
        if !self.window_active {
            debug!("Window inactive, key {} passed through", raw_code);
            return false;
        }

        match self.keymaps.resolve(raw_code) {
            Some((slot, button)) => {
                let event = InputEvent::new(slot.player(), button, pressed);
                self.router.dispatch(event, EventCategory::Keyboard)
            }
            None => {
                debug!("Unmapped key {} ignored", raw_code);
                false
            }
        }
    }
}

fn collect_directional(
    pad: &mut PadState,
    player: u8,
    source: DirectionalSource,
    state: DirectionalState,
    axes: Option<(f32, f32)>,
    events: &mut Vec<InputEvent>,
) {
    let Some(edge) = pad.debouncer(source).update(state) else {
        return;
    };

    for (direction, pressed) in edge.transitions() {
        let button = source.button(direction);
        events.push(match axes {
            Some((x, y)) => {
                let magnitude = match direction {
                    Direction::Left | Direction::Right => x.abs(),
                    Direction::Up | Direction::Down => y.abs(),
                };
                InputEvent::with_value(player, button, pressed, magnitude)
            }
            None => InputEvent::new(player, button, pressed),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::dpad::DirectionChangePolicy;
    use crate::controller::sample::{ElementState, Stick};
    use crate::input::LogicalButton;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<InputEvent>>>;

    fn store_with_recorder(filter: Option<CategoryFilter>) -> (InputStore, Log) {
        let mut store = InputStore::default();
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        store.register_handler(filter, move |event: &InputEvent| {
            sink.lock().unwrap().push(*event)
        });
        (store, log)
    }

    fn dpad(left: bool, right: bool, up: bool, down: bool) -> PadSample {
        PadSample::single(PadElement::DPad(DirectionalState {
            up,
            down,
            left,
            right,
        }))
    }

    fn descriptor(id: usize, profile: PadProfile) -> PadDescriptor {
        PadDescriptor {
            id: PadId(id),
            name: format!("Pad {}", id),
            profile,
        }
    }

    #[test]
    fn test_dpad_scenario() {
        let (mut store, log) = store_with_recorder(None);
        let pad = PadId(7);

        store.on_gamepad_sample(pad, 0, &dpad(true, false, false, false));
        store.on_gamepad_sample(pad, 0, &dpad(true, false, false, false));
        store.on_gamepad_sample(pad, 0, &dpad(false, false, false, false));
        store.on_gamepad_sample(pad, 0, &dpad(false, true, false, false));

        let events = log.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                InputEvent::new(0, LogicalButton::Left, true),
                InputEvent::new(0, LogicalButton::Left, false),
                InputEvent::new(0, LogicalButton::Right, true),
            ]
        );
    }

    #[test]
    fn test_debouncers_are_per_pad() {
        let (mut store, log) = store_with_recorder(None);

        store.on_gamepad_sample(PadId(1), 0, &dpad(false, false, true, false));
        store.on_gamepad_sample(PadId(2), 1, &dpad(false, false, true, false));

        let events = log.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].player, 0);
        assert_eq!(events[1].player, 1);
    }

    #[test]
    fn test_discrete_buttons_mirror_raw_state() {
        let (mut store, log) = store_with_recorder(None);
        let sample = PadSample::new(vec![
            PadElement::Button {
                button: LogicalButton::A,
                state: ElementState::digital(true),
            },
            PadElement::Button {
                button: LogicalButton::R2,
                state: ElementState::analog(0.75, 0.5),
            },
        ]);

        assert_eq!(store.on_gamepad_sample(PadId(0), 0, &sample), 2);
        let events = log.lock().unwrap();
        assert_eq!(events[0], InputEvent::new(0, LogicalButton::A, true));
        assert_eq!(events[1], InputEvent::with_value(0, LogicalButton::R2, true, 0.75));
    }

    #[test]
    fn test_keyboard_default_map() {
        let (mut store, log) = store_with_recorder(None);

        assert!(store.on_key_event(13, true));
        assert!(store.on_key_event(53, false));
        assert!(!store.on_key_event(999, true));

        let events = log.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                InputEvent::new(1, LogicalButton::Up, true),
                InputEvent::new(1, LogicalButton::Menu, false),
            ]
        );
    }

    #[test]
    fn test_keyboard_slot_two() {
        let (mut store, log) = store_with_recorder(None);
        store.keymap_mut(PlayerSlot::Two).set(126, LogicalButton::Up);

        assert!(store.on_key_event(126, true));
        assert_eq!(log.lock().unwrap()[0], InputEvent::new(2, LogicalButton::Up, true));
    }

    #[test]
    fn test_keyboard_not_consumed_by_gamepad_only_handler() {
        let filter = CategoryFilter::only(EventCategory::Gamepad);
        let (mut store, log) = store_with_recorder(Some(filter));
        assert!(!store.on_key_event(13, true));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_gamepad_not_delivered_to_keyboard_only_handler() {
        let filter = CategoryFilter::only(EventCategory::Keyboard);
        let (mut store, log) = store_with_recorder(Some(filter));
        let delivered = store.on_gamepad_sample(PadId(0), 0, &dpad(true, false, false, false));
        assert_eq!(delivered, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_inactive_window_suppresses_keyboard() {
        let (mut store, log) = store_with_recorder(None);
        store.set_window_active(false);
        assert!(!store.on_key_event(13, true));

        store.set_window_active(true);
        assert!(store.on_key_event(13, true));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rescan_assigns_players_in_order() {
        let mut store = InputStore::default();
        let connections = Arc::new(Mutex::new(Vec::new()));
        let sink = connections.clone();
        store.set_connection_handler(Some(Box::new(move |connected: bool| {
            sink.lock().unwrap().push(connected)
        })));

        store.rescan_devices(&[
            descriptor(10, PadProfile::Extended),
            descriptor(11, PadProfile::Unsupported),
            descriptor(12, PadProfile::Micro),
        ]);
        assert_eq!(store.player_for(PadId(10)), Some(0));
        assert_eq!(store.player_for(PadId(11)), None);
        assert_eq!(store.player_for(PadId(12)), Some(1));

        store.on_device_detached(PadId(10));
        assert_eq!(store.pad_count(), 1);
        assert_eq!(*connections.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_micro_profile_filters_elements() {
        let (mut store, log) = store_with_recorder(None);
        store.rescan_devices(&[descriptor(3, PadProfile::Micro)]);

        let sample = PadSample::new(vec![
            PadElement::Button {
                button: LogicalButton::B,
                state: ElementState::digital(true),
            },
            PadElement::Button {
                button: LogicalButton::X,
                state: ElementState::digital(true),
            },
        ]);
        assert_eq!(store.on_gamepad_sample(PadId(3), 0, &sample), 1);
        assert_eq!(log.lock().unwrap()[0].button, LogicalButton::X);
    }

    #[test]
    fn test_stick_emits_analog_direction_with_value() {
        let (mut store, log) = store_with_recorder(None);
        let push = |x, y| {
            PadSample::single(PadElement::Stick {
                stick: Stick::Left,
                x,
                y,
            })
        };

        store.on_gamepad_sample(PadId(0), 0, &push(0.0, 0.9));
        store.on_gamepad_sample(PadId(0), 0, &push(0.0, 0.95));
        store.on_gamepad_sample(PadId(0), 0, &push(0.0, 0.1));

        let events = log.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].button, LogicalButton::LeftAnalogUp);
        assert!(events[0].pressed);
        assert_eq!(events[0].value, Some(0.9));
        assert!(!events[1].pressed);
    }

    #[test]
    fn test_release_then_press_policy() {
        let settings = StoreSettings {
            direction_change_policy: DirectionChangePolicy::ReleaseThenPress,
            ..StoreSettings::default()
        };
        let mut store = InputStore::new(settings);
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        store.register_handler(None, move |event: &InputEvent| {
            sink.lock().unwrap().push(*event)
        });

        store.on_gamepad_sample(PadId(0), 0, &dpad(false, false, true, false));
        assert_eq!(
            store.on_gamepad_sample(PadId(0), 0, &dpad(true, false, false, false)),
            2
        );

        let events = log.lock().unwrap();
        assert_eq!(events[1], InputEvent::new(0, LogicalButton::Up, false));
        assert_eq!(events[2], InputEvent::new(0, LogicalButton::Left, true));
    }

    #[test]
    fn test_button_handler_single_slot() {
        let mut store = InputStore::default();
        let first: Log = Arc::new(Mutex::new(Vec::new()));
        let second: Log = Arc::new(Mutex::new(Vec::new()));

        let sink = first.clone();
        store.set_button_handler(Some(Box::new(move |event: &InputEvent| {
            sink.lock().unwrap().push(*event)
        })));
        let sink = second.clone();
        store.set_button_handler(Some(Box::new(move |event: &InputEvent| {
            sink.lock().unwrap().push(*event)
        })));
        assert_eq!(store.handler_depth(), 1);

        store.on_key_event(35, true);
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);

        store.set_button_handler(None);
        assert_eq!(store.handler_depth(), 0);
        assert!(!store.on_key_event(35, false));
    }

    #[test]
    fn test_register_unregister_restores_routing() {
        let (mut store, log) = store_with_recorder(None);
        let depth = store.handler_depth();
        let top = store.top_handler();

        let id = store.register_handler(None, |_event: &InputEvent| {});
        store.unregister_handler(id);

        assert_eq!(store.handler_depth(), depth);
        assert_eq!(store.top_handler(), top);
        assert!(store.on_key_event(36, true));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_button_handler_survives_queued_unregister() {
        let mut store = InputStore::default();
        let hits = Arc::new(Mutex::new(0));

        store.set_button_handler(Some(Box::new(|_event: &InputEvent| {})));
        let slot = store.top_handler().unwrap();
        store.commands().unregister(slot);

        let counter = hits.clone();
        store.set_button_handler(Some(Box::new(move |_event: &InputEvent| {
            *counter.lock().unwrap() += 1
        })));

        assert_eq!(store.handler_depth(), 1);
        assert!(store.on_key_event(35, true));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_rescan_renumbers_and_keeps_held_direction() {
        let (mut store, log) = store_with_recorder(None);
        store.rescan_devices(&[
            descriptor(1, PadProfile::Extended),
            descriptor(2, PadProfile::Extended),
        ]);
        store.on_gamepad_sample(PadId(2), 1, &dpad(false, false, true, false));

        store.rescan_devices(&[
            descriptor(2, PadProfile::Extended),
            descriptor(1, PadProfile::Extended),
        ]);
        assert_eq!(store.player_for(PadId(2)), Some(0));
        assert_eq!(store.player_for(PadId(1)), Some(1));

        store.on_gamepad_sample(PadId(2), 0, &dpad(false, false, true, false));
        store.on_gamepad_sample(PadId(2), 0, &dpad(false, false, false, false));

        let events = log.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                InputEvent::new(1, LogicalButton::Up, true),
                InputEvent::new(0, LogicalButton::Up, false),
            ]
        );
    }

    #[test]
    fn test_invalid_settings_fall_back_to_defaults() {
        let settings = StoreSettings {
            stick_threshold: 0.0,
            ..StoreSettings::default()
        };
        let mut store = InputStore::new(settings);
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        store.register_handler(None, move |event: &InputEvent| {
            sink.lock().unwrap().push(*event)
        });
        assert_eq!(store.settings(), &StoreSettings::default());

        let at_rest = PadSample::single(PadElement::Stick {
            stick: Stick::Left,
            x: 0.0,
            y: 0.0,
        });
        assert_eq!(store.on_gamepad_sample(PadId(0), 0, &at_rest), 0);
        assert!(log.lock().unwrap().is_empty());
    }
}

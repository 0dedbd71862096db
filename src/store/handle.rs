//! Store Handle - async front end for the input store
//!
//! Moves an [`InputStore`] into its own tokio task and feeds it through a bounded
//! command channel. Every ingestion and registration call from any task or thread
//! ends up on that single task, which keeps dispatch single-threaded without locks.
//!
//! ```text
//! EventCollector ─┐
//! Application ────┼─[StoreCommand]→ store task ──► InputStore ──► handlers
//! Key source ─────┘  (mpsc)            │
//!        ▲                             │
//!        └──────── consumed flag ◄─────┘ (oneshot)
//! ```

use super::InputStore;
use crate::config::StoreSettings;
use crate::controller::sample::{PadDescriptor, PadId, PadSample};
use crate::input::{CategoryFilter, InputEvent};
use crate::mapping::keycode_map::{KeyCodeMap, PlayerSlot};
use crate::router::{ConnectionEventHandler, HandlerId, InputEventHandler};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub type KeymapEdit = Box<dyn FnOnce(&mut KeyCodeMap) + Send>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store task is not running: {0}")]
    ChannelClosed(String),

    #[error("Store task dropped the reply")]
    ReplyDropped(#[from] oneshot::error::RecvError),
}

/// Observable state of the running store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub handler_depth: usize,
    pub pad_count: usize,
    pub window_active: bool,
}

/// Everything the store task understands
pub enum StoreCommand {
    DevicesChanged(Vec<PadDescriptor>),
    DeviceDetached(PadId),
    PadSample {
        pad: PadId,
        /// Falls back to the player assigned at the last rescan
        player: Option<u8>,
        sample: PadSample,
    },
    Key {
        code: u16,
        pressed: bool,
        reply: Option<oneshot::Sender<bool>>,
    },
    WindowFocus(bool),
    Register {
        id: HandlerId,
        filter: Option<CategoryFilter>,
        handler: InputEventHandler,
    },
    Unregister(HandlerId),
    SetButtonHandler(Option<InputEventHandler>),
    SetConnectionHandler(Option<ConnectionEventHandler>),
    EditKeymap {
        slot: PlayerSlot,
        edit: KeymapEdit,
    },
    Status(oneshot::Sender<StoreStatus>),
    Shutdown,
}

impl std::fmt::Debug for StoreCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreCommand::DevicesChanged(devices) => {
                write!(f, "DevicesChanged({} devices)", devices.len())
            }
            StoreCommand::DeviceDetached(pad) => write!(f, "DeviceDetached({})", pad),
            StoreCommand::PadSample { pad, sample, .. } => {
                write!(f, "PadSample({}, {} elements)", pad, sample.elements.len())
            }
            StoreCommand::Key { code, pressed, .. } => write!(f, "Key({}, {})", code, pressed),
            StoreCommand::WindowFocus(active) => write!(f, "WindowFocus({})", active),
            StoreCommand::Register { id, .. } => write!(f, "Register({})", id),
            StoreCommand::Unregister(id) => write!(f, "Unregister({})", id),
            StoreCommand::SetButtonHandler(h) => write!(f, "SetButtonHandler({})", h.is_some()),
            StoreCommand::SetConnectionHandler(h) => {
                write!(f, "SetConnectionHandler({})", h.is_some())
            }
            StoreCommand::EditKeymap { slot, .. } => write!(f, "EditKeymap({})", slot),
            StoreCommand::Status(_) => write!(f, "Status"),
            StoreCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Cloneable handle to a store running in its own task
#[derive(Clone)]
pub struct InputStoreHandle {
    command_tx: mpsc::Sender<StoreCommand>,
}

impl InputStoreHandle {
    /// Spawns the store task; must be called inside a tokio runtime
    pub fn spawn(settings: StoreSettings) -> (Self, JoinHandle<()>) {
        let buffer = settings.command_buffer.max(1);
        let (command_tx, command_rx) = mpsc::channel(buffer);
        debug!("Created store command channel with capacity {}", buffer);

        let store = InputStore::new(settings);
        let task = tokio::spawn(async move {
            info!("Input store task started");
            run_store_loop(store, command_rx).await;
            info!("Input store task finished");
        });

        (Self { command_tx }, task)
    }

    /// Raw sender for device sources such as the event collector
    pub fn command_sender(&self) -> mpsc::Sender<StoreCommand> {
        self.command_tx.clone()
    }

    async fn send(&self, command: StoreCommand) -> Result<(), StoreError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| StoreError::ChannelClosed(format!("{:?}", e.0)))
    }

    pub async fn register_handler(
        &self,
        filter: Option<CategoryFilter>,
        handler: impl FnMut(&InputEvent) + Send + 'static,
    ) -> Result<HandlerId, StoreError> {
        let id = HandlerId::new();
        self.send(StoreCommand::Register {
            id,
            filter,
            handler: Box::new(handler),
        })
        .await?;
        Ok(id)
    }

    pub async fn unregister_handler(&self, id: HandlerId) -> Result<(), StoreError> {
        self.send(StoreCommand::Unregister(id)).await
    }

    pub async fn set_button_handler(
        &self,
        handler: Option<InputEventHandler>,
    ) -> Result<(), StoreError> {
        self.send(StoreCommand::SetButtonHandler(handler)).await
    }

    pub async fn set_connection_handler(
        &self,
        handler: Option<ConnectionEventHandler>,
    ) -> Result<(), StoreError> {
        self.send(StoreCommand::SetConnectionHandler(handler)).await
    }

    /// Applies `edit` to one keyboard map on the store task
    pub async fn edit_keymap(
        &self,
        slot: PlayerSlot,
        edit: impl FnOnce(&mut KeyCodeMap) + Send + 'static,
    ) -> Result<(), StoreError> {
        self.send(StoreCommand::EditKeymap {
            slot,
            edit: Box::new(edit),
        })
        .await
    }

    pub async fn devices_changed(&self, devices: Vec<PadDescriptor>) -> Result<(), StoreError> {
        self.send(StoreCommand::DevicesChanged(devices)).await
    }

    pub async fn device_detached(&self, pad: PadId) -> Result<(), StoreError> {
        self.send(StoreCommand::DeviceDetached(pad)).await
    }

    pub async fn pad_sample(
        &self,
        pad: PadId,
        player: Option<u8>,
        sample: PadSample,
    ) -> Result<(), StoreError> {
        self.send(StoreCommand::PadSample {
            pad,
            player,
            sample,
        })
        .await
    }

    /// Returns whether a handler consumed the key
    pub async fn key_event(&self, code: u16, pressed: bool) -> Result<bool, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(StoreCommand::Key {
            code,
            pressed,
            reply: Some(reply_tx),
        })
        .await?;
        Ok(reply_rx.await?)
    }

    pub async fn window_focus(&self, active: bool) -> Result<(), StoreError> {
        self.send(StoreCommand::WindowFocus(active)).await
    }

    pub async fn status(&self) -> Result<StoreStatus, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(StoreCommand::Status(reply_tx)).await?;
        Ok(reply_rx.await?)
    }

    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.send(StoreCommand::Shutdown).await
    }
}

async fn run_store_loop(mut store: InputStore, mut command_rx: mpsc::Receiver<StoreCommand>) {
    while let Some(command) = command_rx.recv().await {
        debug!("Store command: {:?}", command);
        match command {
            StoreCommand::DevicesChanged(devices) => store.rescan_devices(&devices),
            StoreCommand::DeviceDetached(pad) => store.on_device_detached(pad),
            StoreCommand::PadSample {
                pad,
                player,
                sample,
            } => match player.or_else(|| store.player_for(pad)) {
                Some(player) => {
                    store.on_gamepad_sample(pad, player, &sample);
                }
                None => warn!("Sample from {} without an assigned player dropped", pad),
            },
            StoreCommand::Key {
                code,
                pressed,
                reply,
            } => {
                let consumed = store.on_key_event(code, pressed);
                if let Some(reply) = reply {
                    if reply.send(consumed).is_err() {
                        debug!("Key {} reply receiver dropped", code);
                    }
                }
            }
            StoreCommand::WindowFocus(active) => store.set_window_active(active),
            StoreCommand::Register {
                id,
                filter,
                handler,
            } => store.register_handler_with_id(id, filter, handler),
            StoreCommand::Unregister(id) => {
                store.unregister_handler(id);
            }
            StoreCommand::SetButtonHandler(handler) => store.set_button_handler(handler),
            StoreCommand::SetConnectionHandler(handler) => store.set_connection_handler(handler),
            StoreCommand::EditKeymap { slot, edit } => edit(store.keymap_mut(slot)),
            StoreCommand::Status(reply) => {
                let status = StoreStatus {
                    handler_depth: store.handler_depth(),
                    pad_count: store.pad_count(),
                    window_active: store.is_window_active(),
                };
                if reply.send(status).is_err() {
                    error!("Failed to send store status");
                }
            }
            StoreCommand::Shutdown => {
                info!("Input store shutting down");
                break;
            }
        }
    }
}

//! Handler stack routing
//!
//! Handlers form a priority stack: only the most recently registered entry that is
//! still registered ever sees input. Lower entries stay inert until everything above
//! them is unregistered, which matches a modal UI where the active screen or overlay
//! captures all input.
//!
//! ```text
//!   register(A)  register(B)        dispatch(e)
//!   [A]          [A, B]      ──►    B(e)        (A never sees e)
//!                unregister(B)
//!                [A]         ──►    A(e)
//! ```
//!
//! Stack changes requested from inside a callback go through [`StackCommands`]; they
//! are queued and applied once the running dispatch returns.

use crate::input::event::accepts;
use crate::input::{CategoryFilter, EventCategory, InputEvent};
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub type InputEventHandler = Box<dyn FnMut(&InputEvent) + Send>;
pub type ConnectionEventHandler = Box<dyn FnMut(bool) + Send>;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque token identifying a handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Reserved for the single-slot button handler of the store
    pub(crate) const BUTTON_SLOT: HandlerId = HandlerId(0);

    pub fn new() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

struct HandlerEntry {
    id: HandlerId,
    filter: Option<CategoryFilter>,
    callback: InputEventHandler,
}

enum StackMutation {
    Register {
        id: HandlerId,
        filter: Option<CategoryFilter>,
        callback: InputEventHandler,
    },
    Unregister(HandlerId),
}

/// Deferred access to the handler stack, safe to use from inside a callback
#[derive(Clone)]
pub struct StackCommands {
    tx: mpsc::UnboundedSender<StackMutation>,
}

impl StackCommands {
    /// Queues a registration; the id is valid immediately
    pub fn register(
        &self,
        filter: Option<CategoryFilter>,
        callback: impl FnMut(&InputEvent) + Send + 'static,
    ) -> HandlerId {
        let id = HandlerId::new();
        let _ = self.tx.send(StackMutation::Register {
            id,
            filter,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unregister(&self, id: HandlerId) {
        let _ = self.tx.send(StackMutation::Unregister(id));
    }
}

pub struct EventRouter {
    entries: Vec<HandlerEntry>,
    connection_handler: Option<ConnectionEventHandler>,
    pending_tx: mpsc::UnboundedSender<StackMutation>,
    pending_rx: mpsc::UnboundedReceiver<StackMutation>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        Self {
            entries: Vec::new(),
            connection_handler: None,
            pending_tx,
            pending_rx,
        }
    }

    pub fn commands(&self) -> StackCommands {
        StackCommands {
            tx: self.pending_tx.clone(),
        }
    }

    pub fn register(
        &mut self,
        filter: Option<CategoryFilter>,
        callback: impl FnMut(&InputEvent) + Send + 'static,
    ) -> HandlerId {
        let id = HandlerId::new();
        self.register_with_id(id, filter, Box::new(callback));
        id
    }

    /// Pushes an entry under a caller-owned id; duplicates are allowed
    pub fn register_with_id(
        &mut self,
        id: HandlerId,
        filter: Option<CategoryFilter>,
        callback: InputEventHandler,
    ) {
        self.apply_pending();
        self.push(id, filter, callback);
    }

    /// Removes the last entry registered under `id`
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        self.apply_pending();
        self.remove_last(id)
    }

    /// Replaces the callback under `id` in place, or pushes a new entry if none is left
    ///
    /// Mutations queued through [`StackCommands`] are applied before the lookup.
    pub fn upsert(
        &mut self,
        id: HandlerId,
        filter: Option<CategoryFilter>,
        callback: InputEventHandler,
    ) {
        self.apply_pending();
        match self.entries.iter_mut().rev().find(|entry| entry.id == id) {
            Some(entry) => entry.callback = callback,
            None => self.push(id, filter, callback),
        }
    }

    /// Delivers `event` to the top of the stack; returns whether it was delivered
    pub fn dispatch(&mut self, event: InputEvent, category: EventCategory) -> bool {
        self.apply_pending();

        let delivered = match self.entries.last_mut() {
            None => {
                debug!("No handlers, dropping {:?}", event);
                false
            }
            Some(top) if !accepts(top.filter.as_ref(), category) => {
                debug!(
                    "Current handler {} doesn't accept {} events, dropping {:?}",
                    top.id, category, event
                );
                false
            }
            Some(top) => {
                (top.callback)(&event);
                true
            }
        };

        self.apply_pending();
        delivered
    }

    pub fn set_connection_handler(&mut self, handler: Option<ConnectionEventHandler>) {
        self.connection_handler = handler;
    }

    pub fn notify_connection(&mut self, connected: bool) {
        info!(
            "Controller {}",
            if connected { "connected" } else { "disconnected" }
        );
        if let Some(handler) = self.connection_handler.as_mut() {
            handler(connected);
        }
        self.apply_pending();
    }

    /// Stack depth after applying queued mutations
    pub fn depth(&mut self) -> usize {
        self.apply_pending();
        self.entries.len()
    }

    /// Top entry after applying queued mutations
    pub fn top(&mut self) -> Option<HandlerId> {
        self.apply_pending();
        self.entries.last().map(|entry| entry.id)
    }

    pub fn contains(&mut self, id: HandlerId) -> bool {
        self.apply_pending();
        self.entries.iter().any(|entry| entry.id == id)
    }

    fn push(&mut self, id: HandlerId, filter: Option<CategoryFilter>, callback: InputEventHandler) {
        debug!("Registering {} with filter {:?}", id, filter);
        self.entries.push(HandlerEntry {
            id,
            filter,
            callback,
        });
    }

    fn remove_last(&mut self, id: HandlerId) -> bool {
        match self.entries.iter().rposition(|entry| entry.id == id) {
            Some(index) => {
                self.entries.remove(index);
                debug!("Unregistered {}", id);
                true
            }
            None => {
                debug!("Unregister of unknown {} ignored", id);
                false
            }
        }
    }

    fn apply_pending(&mut self) {
        while let Ok(mutation) = self.pending_rx.try_recv() {
            match mutation {
                StackMutation::Register {
                    id,
                    filter,
                    callback,
                } => self.push(id, filter, callback),
                StackMutation::Unregister(id) => {
                    self.remove_last(id);
                }
            }
        }
    }
}

//! Host event ingestion
//!
//! The windowing system reports raw device activity as [`InputEvent`]s. Hosts that
//! call back on the frame thread push them straight into an [`EventSink`]; hosts that
//! deliver events on another thread use an [`EventSender`], whose queue the frame
//! driver drains at the start of every update.

use crate::device::{KeyCode, MouseButton};
use tokio::sync::mpsc;
use tracing::debug;

/// Raw device activity reported by the windowing system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    MouseMoved { x: i32, y: i32 },
    FocusGained,
    FocusLost,
}

/// Receiver of raw host events
pub trait EventSink {
    fn dispatch(&mut self, event: InputEvent);
}

/// Whether the host window holds input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusState {
    #[default]
    Unfocused,
    Focused,
}

/// What a focus event did to the [`FocusState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTransition {
    Gained,
    Lost,
    Unchanged,
}

impl FocusState {
    pub fn is_focused(&self) -> bool {
        matches!(self, FocusState::Focused)
    }

    /// Applies a focus event; non-focus events leave the state alone
    pub fn apply(&mut self, event: &InputEvent) -> FocusTransition {
        let next = match event {
            InputEvent::FocusGained => FocusState::Focused,
            InputEvent::FocusLost => FocusState::Unfocused,
            _ => return FocusTransition::Unchanged,
        };

        let transition = match (*self, next) {
            (FocusState::Unfocused, FocusState::Focused) => FocusTransition::Gained,
            (FocusState::Focused, FocusState::Unfocused) => FocusTransition::Lost,
            _ => FocusTransition::Unchanged,
        };
        *self = next;
        transition
    }
}

/// Cloneable, thread-safe handle for pushing host events into an `Input`
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::UnboundedSender<InputEvent>,
}

impl EventSender {
    /// Queues an event for the next frame. Returns `false` once the receiving side is
    /// gone.
    pub fn send(&self, event: InputEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiving end of the cross-thread event queue
#[derive(Debug)]
pub struct EventQueue {
    receiver: mpsc::UnboundedReceiver<InputEvent>,
}

impl EventQueue {
    /// Creates a connected sender/queue pair
    pub fn channel() -> (EventSender, EventQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (EventSender { sender }, EventQueue { receiver })
    }

    /// Delivers everything queued so far to `sink`, in arrival order
    pub fn drain_into(&mut self, sink: &mut impl EventSink) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.receiver.try_recv() {
            sink.dispatch(event);
            delivered += 1;
        }
        if delivered > 0 {
            debug!("Drained {} queued host events", delivered);
        }
        delivered
    }
}

//! Controller subsystem for gamepad input
//!
//! The device SDK is hidden behind [`ControllerBackend`]; the rest of the crate only
//! sees [`DeviceInfo`] records and `(component, value)` events.
//!
//! 1. [`gilrs_backend`] - backends: gilrs for real hardware, a null backend for hosts
//!    without gamepad support
//! 2. [`session`] - lifecycle of the one active controller (detect, poll, disconnect)
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► ControllerBackend ──► ControllerSession ──► DeviceStateBuffer
//!             (SDK events)          (scan / poll_events)   (component values)
//! ```

pub mod gilrs_backend;
pub mod session;

pub use gilrs_backend::{GilrsBackend, NullBackend};
pub use session::{ControllerSession, ScanOutcome};

use crate::binding::ComponentId;
use std::fmt;

/// Opaque handle the backend hands out for one connected device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub usize);

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Device classification as reported by the SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Gamepad,
    Joystick,
}

/// One enumerated device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub handle: DeviceHandle,
    pub name: String,
    pub kind: DeviceKind,
    /// Every analog axis and button the device reports
    pub components: Vec<ComponentId>,
}

/// A component value change reported since the last drain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentEvent {
    pub component: ComponentId,
    pub value: f32,
}

// Controller errors
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to initialize controller backend: {0}")]
    InitializationError(String),

    #[error("Failed to enumerate devices: {0}")]
    EnumerationError(String),
}

/// Device SDK collaborator
///
/// Implementations must be cheap enough to call once per frame: `devices` while no
/// controller is active, `poll` and `drain_events` while one is.
pub trait ControllerBackend {
    /// Lists the currently connected devices
    fn devices(&mut self) -> Result<Vec<DeviceInfo>, ControllerError>;

    /// Refreshes the device. `false` means it is gone.
    fn poll(&mut self, device: DeviceHandle) -> bool;

    /// Takes all component events queued for `device` since the last call
    fn drain_events(&mut self, device: DeviceHandle) -> Vec<ComponentEvent>;

    /// Backend name used in log lines
    fn name(&self) -> &str {
        "controller backend"
    }
}

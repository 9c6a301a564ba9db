//! Named-axis input for games and simulations
//!
//! Keyboard, mouse and gamepad signals are unified behind axis names. Application code
//! asks "is `Jump` held?", "how far is `Throttle` pushed?" or "was `Fire` just
//! pressed?" and never touches device-specific state.
//!
//! - [`binding`] - axis bindings and controller component names
//! - [`device`] - per-frame keyboard, mouse and component state
//! - [`controller`] - gamepad backends and the active controller session
//! - [`resolver`] - axis resolution and edge detection
//! - [`event`] - host event ingestion and focus tracking
//! - [`input`] - frame driver tying everything together
//! - [`config`] - runtime settings
//!
//! ```rust
//! use inputaxis::{AxisBinding, BindingSet, EventSink, Input, InputEvent, InputSettings, KeyCode};
//! use inputaxis::controller::NullBackend;
//!
//! let mut input = Input::new(InputSettings::default(), Box::new(NullBackend));
//! input.set_bindings(BindingSet::new(vec![
//!     AxisBinding::key_only("Jump", KeyCode::SPACE).unwrap(),
//! ]).unwrap());
//!
//! input.dispatch(InputEvent::FocusGained);
//! input.dispatch(InputEvent::KeyDown(KeyCode::SPACE));
//! input.update();
//!
//! assert!(input.is_active("Jump"));
//! assert!(input.was_just_activated("jump"));
//! ```

pub mod binding;
pub mod config;
pub mod controller;
pub mod device;
pub mod event;
pub mod input;
pub mod resolver;

pub use binding::{AxisBinding, BindingError, BindingSet, ComponentId};
pub use config::InputSettings;
pub use controller::{ControllerBackend, ControllerError, ControllerSession, ScanOutcome};
pub use device::{DeviceStateBuffer, KeyCode, MouseButton};
pub use event::{EventSender, EventSink, FocusState, InputEvent};
pub use input::{FrameReport, Input};
pub use resolver::{ExitHook, InputResolver, ResolveContext};

/// Top-level error type of the crate
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Cannot get axis from name: {0}")]
    UnknownAxis(String),

    #[error("Binding error: {0}")]
    BindingError(#[from] BindingError),
}

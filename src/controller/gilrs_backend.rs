//! Device backends
//!
//! [`GilrsBackend`] talks to real hardware through gilrs. gilrs delivers events for all
//! gamepads through one queue, so the backend sorts them into per-device queues that
//! [`ControllerBackend::drain_events`] hands out.

use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs, MappingSource};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, error, info, warn};

use super::{ComponentEvent, ControllerBackend, ControllerError, DeviceHandle, DeviceInfo, DeviceKind};
use crate::binding::ComponentId;

/// Per-device queue bound; the oldest events are dropped beyond it
const MAX_PENDING_EVENTS: usize = 1000;

/// gilrs-backed device SDK
pub struct GilrsBackend {
    gilrs: Gilrs,
    known: HashMap<DeviceHandle, GamepadId>,
    pending: HashMap<DeviceHandle, VecDeque<ComponentEvent>>,
}

impl GilrsBackend {
    pub fn new() -> Result<Self, ControllerError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(ControllerError::InitializationError(e.to_string()));
            }
        };

        Ok(Self {
            gilrs,
            known: HashMap::new(),
            pending: HashMap::new(),
        })
    }

    /// Moves everything gilrs queued into the per-device queues
    fn pump(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let handle = DeviceHandle(usize::from(id));
            let component_event = match event {
                EventType::AxisChanged(axis, value, _) => {
                    map_axis(axis).map(|component| ComponentEvent { component, value })
                }
                EventType::ButtonChanged(button, value, _) => {
                    map_button(button).map(|component| ComponentEvent { component, value })
                }
                EventType::Connected => {
                    info!("Controller connected event detected: {}", handle);
                    None
                }
                EventType::Disconnected => {
                    warn!("Controller disconnected event detected: {}", handle);
                    self.pending.remove(&handle);
                    None
                }
                _ => None,
            };

            if let Some(component_event) = component_event {
                let queue = self.pending.entry(handle).or_default();
                if queue.len() >= MAX_PENDING_EVENTS {
                    queue.pop_front();
                }
                queue.push_back(component_event);
            }
        }
    }
}

impl ControllerBackend for GilrsBackend {
    fn devices(&mut self) -> Result<Vec<DeviceInfo>, ControllerError> {
        self.pump();

        let mut devices = Vec::new();
        for (id, gamepad) in self.gilrs.gamepads() {
            let handle = DeviceHandle(usize::from(id));
            let info = DeviceInfo {
                handle,
                name: gamepad.name().to_string(),
                kind: classify(&gamepad),
                components: components_of(&gamepad),
            };
            debug!(
                "  {} {} ({:?}, {} components)",
                handle,
                info.name,
                info.kind,
                info.components.len()
            );
            self.known.insert(handle, id);
            devices.push(info);
        }
        Ok(devices)
    }

    fn poll(&mut self, device: DeviceHandle) -> bool {
        self.pump();
        match self.known.get(&device) {
            Some(id) => self.gilrs.connected_gamepad(*id).is_some(),
            None => false,
        }
    }

    fn drain_events(&mut self, device: DeviceHandle) -> Vec<ComponentEvent> {
        self.pump();
        self.pending
            .get_mut(&device)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "gilrs"
    }
}

/// Backend without any devices, for hosts that run keyboard and mouse only
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl ControllerBackend for NullBackend {
    fn devices(&mut self) -> Result<Vec<DeviceInfo>, ControllerError> {
        Ok(Vec::new())
    }

    fn poll(&mut self, _device: DeviceHandle) -> bool {
        false
    }

    fn drain_events(&mut self, _device: DeviceHandle) -> Vec<ComponentEvent> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "null backend"
    }
}

// Devices without a known mapping report raw axes and are not treated as gamepads
fn classify(gamepad: &Gamepad<'_>) -> DeviceKind {
    match gamepad.mapping_source() {
        MappingSource::None => DeviceKind::Joystick,
        _ => DeviceKind::Gamepad,
    }
}

fn components_of(gamepad: &Gamepad<'_>) -> Vec<ComponentId> {
    let reported: Vec<ComponentId> = ComponentId::ALL
        .into_iter()
        .filter(|component| match to_gilrs(*component) {
            GilrsComponent::Axis(axis) => gamepad.axis_code(axis).is_some(),
            GilrsComponent::Button(button) => gamepad.button_code(button).is_some(),
        })
        .collect();

    if reported.is_empty() {
        // Some drivers expose no codes until the first event arrives
        ComponentId::ALL.to_vec()
    } else {
        reported
    }
}

enum GilrsComponent {
    Axis(Axis),
    Button(Button),
}

fn to_gilrs(component: ComponentId) -> GilrsComponent {
    use GilrsComponent::{Axis as A, Button as B};
    match component {
        ComponentId::LeftStickX => A(Axis::LeftStickX),
        ComponentId::LeftStickY => A(Axis::LeftStickY),
        ComponentId::RightStickX => A(Axis::RightStickX),
        ComponentId::RightStickY => A(Axis::RightStickY),
        ComponentId::LeftZ => A(Axis::LeftZ),
        ComponentId::RightZ => A(Axis::RightZ),
        ComponentId::DPadX => A(Axis::DPadX),
        ComponentId::DPadY => A(Axis::DPadY),
        ComponentId::South => B(Button::South),
        ComponentId::East => B(Button::East),
        ComponentId::North => B(Button::North),
        ComponentId::West => B(Button::West),
        ComponentId::LeftTrigger => B(Button::LeftTrigger),
        ComponentId::LeftTrigger2 => B(Button::LeftTrigger2),
        ComponentId::RightTrigger => B(Button::RightTrigger),
        ComponentId::RightTrigger2 => B(Button::RightTrigger2),
        ComponentId::Select => B(Button::Select),
        ComponentId::Start => B(Button::Start),
        ComponentId::Mode => B(Button::Mode),
        ComponentId::LeftThumb => B(Button::LeftThumb),
        ComponentId::RightThumb => B(Button::RightThumb),
        ComponentId::DPadUp => B(Button::DPadUp),
        ComponentId::DPadDown => B(Button::DPadDown),
        ComponentId::DPadLeft => B(Button::DPadLeft),
        ComponentId::DPadRight => B(Button::DPadRight),
    }
}

fn map_axis(axis: Axis) -> Option<ComponentId> {
    match axis {
        Axis::LeftStickX => Some(ComponentId::LeftStickX),
        Axis::LeftStickY => Some(ComponentId::LeftStickY),
        Axis::RightStickX => Some(ComponentId::RightStickX),
        Axis::RightStickY => Some(ComponentId::RightStickY),
        Axis::LeftZ => Some(ComponentId::LeftZ),
        Axis::RightZ => Some(ComponentId::RightZ),
        Axis::DPadX => Some(ComponentId::DPadX),
        Axis::DPadY => Some(ComponentId::DPadY),
        _ => None,
    }
}

fn map_button(button: Button) -> Option<ComponentId> {
    match button {
        Button::South => Some(ComponentId::South),
        Button::East => Some(ComponentId::East),
        Button::North => Some(ComponentId::North),
        Button::West => Some(ComponentId::West),
        Button::LeftTrigger => Some(ComponentId::LeftTrigger),
        Button::LeftTrigger2 => Some(ComponentId::LeftTrigger2),
        Button::RightTrigger => Some(ComponentId::RightTrigger),
        Button::RightTrigger2 => Some(ComponentId::RightTrigger2),
        Button::Select => Some(ComponentId::Select),
        Button::Start => Some(ComponentId::Start),
        Button::Mode => Some(ComponentId::Mode),
        Button::LeftThumb => Some(ComponentId::LeftThumb),
        Button::RightThumb => Some(ComponentId::RightThumb),
        Button::DPadUp => Some(ComponentId::DPadUp),
        Button::DPadDown => Some(ComponentId::DPadDown),
        Button::DPadLeft => Some(ComponentId::DPadLeft),
        Button::DPadRight => Some(ComponentId::DPadRight),
        _ => None,
    }
}

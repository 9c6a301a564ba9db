//! Controller session - lifecycle of the one active gamepad
//!
//! # State Machine
//!
//! ```text
//!               scan finds a gamepad
//! NoController ──────────────────────► ControllerActive
//!      ▲                                     │
//!      └─────────────────────────────────────┘
//!               poll fails (disconnect)
//! ```
//!
//! Reconnection is opportunistic: every [`ControllerSession::scan`] while no controller
//! is active enumerates the devices again, without backoff.

use chrono::{DateTime, Local};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use super::{ControllerBackend, DeviceHandle, DeviceKind};
use crate::binding::ComponentId;
use crate::device::DeviceStateBuffer;

/// Result of one [`ControllerSession::scan`]
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// A gamepad was found and became the active controller
    Detected(String),
    /// The active controller answered its poll
    StillConnected,
    /// The active controller failed its poll and was dropped
    Disconnected,
    /// No controller active and none found
    NoGamepad,
}

/// The device a session is bound to
#[derive(Debug, Clone)]
pub struct ActiveDevice {
    pub handle: DeviceHandle,
    pub name: String,
    pub components: Vec<ComponentId>,
    pub connected_at: DateTime<Local>,
}

#[state]
#[derive(Debug, Clone)]
pub enum LinkState {
    NoController,
    ControllerActive(ActiveDevice),
}

#[machine]
pub struct ControllerLink<S: LinkState> {
    backend: Box<dyn ControllerBackend>,
}

enum SessionLink {
    Idle(ControllerLink<NoController>),
    Active(ControllerLink<ControllerActive>),
}

impl ControllerLink<NoController> {
    fn create(backend: Box<dyn ControllerBackend>) -> Self {
        Self::new(backend)
    }

    /// Enumerates devices and binds the first gamepad
    fn detect(
        mut self,
        buffer: &mut DeviceStateBuffer,
    ) -> (SessionLink, ScanOutcome) {
        let devices = match self.backend.devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Device enumeration failed: {}", e);
                Vec::new()
            }
        };
        debug!(
            "{} reported {} devices",
            self.backend.name(),
            devices.len()
        );

        let Some(device) = devices
            .into_iter()
            .find(|device| device.kind == DeviceKind::Gamepad)
        else {
            return (SessionLink::Idle(self), ScanOutcome::NoGamepad);
        };

        buffer.reset_components(&device.components);
        let name = device.name.clone();
        let active = ActiveDevice {
            handle: device.handle,
            name: device.name,
            components: device.components,
            connected_at: Local::now(),
        };
        debug!(
            "Binding {} ({}) with {} components",
            active.name,
            active.handle,
            active.components.len()
        );

        (
            SessionLink::Active(self.transition_with(active)),
            ScanOutcome::Detected(name),
        )
    }
}

impl ControllerLink<ControllerActive> {
    fn device(&self) -> Option<&ActiveDevice> {
        self.get_state_data()
    }

    /// Polls the bound device, dropping it when the poll fails
    fn check(mut self) -> (SessionLink, ScanOutcome) {
        let Some(handle) = self.device().map(|device| device.handle) else {
            error!("Active controller link without device data");
            return (SessionLink::Idle(self.transition()), ScanOutcome::Disconnected);
        };

        if self.backend.poll(handle) {
            (SessionLink::Active(self), ScanOutcome::StillConnected)
        } else {
            (SessionLink::Idle(self.transition()), ScanOutcome::Disconnected)
        }
    }

    /// Moves queued component events into the buffer's recording snapshot
    fn pump(&mut self, buffer: &mut DeviceStateBuffer) -> usize {
        let Some(handle) = self.device().map(|device| device.handle) else {
            return 0;
        };

        let mut applied = 0;
        for event in self.backend.drain_events(handle) {
            if buffer.record_component(event.component, event.value) {
                applied += 1;
            } else {
                debug!("Ignoring unannounced component {}", event.component);
            }
        }
        applied
    }
}

/// Lifecycle of the one active controller connection
pub struct ControllerSession {
    // Always Some between calls; taken only while a transition is in flight
    link: Option<SessionLink>,
    absence_reported: bool,
}

impl ControllerSession {
    pub fn new(backend: Box<dyn ControllerBackend>) -> Self {
        info!("Creating controller session on {}", backend.name());
        Self {
            link: Some(SessionLink::Idle(ControllerLink::create(backend))),
            absence_reported: false,
        }
    }

    /// Polls the active controller, or looks for one when none is active.
    ///
    /// Newly detected devices get all of their components registered in `buffer` at
    /// 0.0.
    pub fn scan(&mut self, buffer: &mut DeviceStateBuffer) -> ScanOutcome {
        let Some(link) = self.link.take() else {
            error!("Controller session lost its link");
            return ScanOutcome::NoGamepad;
        };

        let (link, outcome) = match link {
            SessionLink::Active(active) => active.check(),
            SessionLink::Idle(idle) => idle.detect(buffer),
        };
        self.link = Some(link);

        match &outcome {
            ScanOutcome::Detected(name) => {
                info!("Gamepad detected: {}", name);
                self.absence_reported = false;
            }
            ScanOutcome::Disconnected => {
                info!("Controller disconnected.");
                self.absence_reported = false;
            }
            ScanOutcome::NoGamepad if !self.absence_reported => {
                info!("No gamepad detected.");
                self.absence_reported = true;
            }
            ScanOutcome::NoGamepad => debug!("No gamepad detected."),
            ScanOutcome::StillConnected => {}
        }

        outcome
    }

    /// Drains the active device's event queue into `buffer`.
    ///
    /// Must run before [`DeviceStateBuffer::advance_frame`] for the frame, otherwise
    /// the values land one frame late and tap detection on components breaks.
    /// Returns the number of component values applied.
    pub fn poll_events(&mut self, buffer: &mut DeviceStateBuffer) -> usize {
        match self.link.as_mut() {
            Some(SessionLink::Active(active)) => active.pump(buffer),
            _ => 0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.link, Some(SessionLink::Active(_)))
    }

    fn active_device(&self) -> Option<&ActiveDevice> {
        match &self.link {
            Some(SessionLink::Active(active)) => active.device(),
            _ => None,
        }
    }

    pub fn device_name(&self) -> Option<&str> {
        self.active_device().map(|device| device.name.as_str())
    }

    /// Components announced by the active device; empty without one
    pub fn known_components(&self) -> &[ComponentId] {
        self.active_device()
            .map(|device| device.components.as_slice())
            .unwrap_or(&[])
    }

    pub fn connected_since(&self) -> Option<DateTime<Local>> {
        self.active_device().map(|device| device.connected_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ComponentEvent, ControllerError, DeviceInfo};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Script {
        devices: Vec<DeviceInfo>,
        poll_ok: bool,
        events: VecDeque<ComponentEvent>,
        enumerations: usize,
        enumeration_failure: Option<String>,
    }

    struct ScriptedBackend(Arc<Mutex<Script>>);

    impl ControllerBackend for ScriptedBackend {
        fn devices(&mut self) -> Result<Vec<DeviceInfo>, ControllerError> {
            let mut script = self.0.lock().unwrap();
            script.enumerations += 1;
            if let Some(reason) = script.enumeration_failure.take() {
                return Err(ControllerError::EnumerationError(reason));
            }
            Ok(script.devices.clone())
        }

        fn poll(&mut self, _device: DeviceHandle) -> bool {
            self.0.lock().unwrap().poll_ok
        }

        fn drain_events(&mut self, _device: DeviceHandle) -> Vec<ComponentEvent> {
            self.0.lock().unwrap().events.drain(..).collect()
        }
    }

    fn pad(name: &str, kind: DeviceKind) -> DeviceInfo {
        DeviceInfo {
            handle: DeviceHandle(3),
            name: name.to_string(),
            kind,
            components: vec![ComponentId::LeftStickX, ComponentId::South],
        }
    }

    fn session() -> (ControllerSession, Arc<Mutex<Script>>) {
        let script = Arc::new(Mutex::new(Script {
            poll_ok: true,
            ..Default::default()
        }));
        let session = ControllerSession::new(Box::new(ScriptedBackend(script.clone())));
        (session, script)
    }

    #[test]
    fn no_devices_means_no_gamepad() {
        let (mut session, _) = session();
        let mut buffer = DeviceStateBuffer::new();
        assert_eq!(session.scan(&mut buffer), ScanOutcome::NoGamepad);
        assert!(!session.is_active());
        assert!(session.known_components().is_empty());
    }

    #[test]
    fn enumeration_failure_is_retried_next_scan() {
        let (mut session, script) = session();
        {
            let mut script = script.lock().unwrap();
            script.devices = vec![pad("Pad", DeviceKind::Gamepad)];
            script.enumeration_failure = Some("device list busy".into());
        }
        let mut buffer = DeviceStateBuffer::new();

        assert_eq!(session.scan(&mut buffer), ScanOutcome::NoGamepad);
        assert!(!session.is_active());
        assert_eq!(
            session.scan(&mut buffer),
            ScanOutcome::Detected("Pad".into())
        );
        assert_eq!(script.lock().unwrap().enumerations, 2);
    }

    #[test]
    fn first_gamepad_is_selected() {
        let (mut session, script) = session();
        script.lock().unwrap().devices = vec![
            pad("Flight Stick", DeviceKind::Joystick),
            pad("Pad One", DeviceKind::Gamepad),
            pad("Pad Two", DeviceKind::Gamepad),
        ];
        let mut buffer = DeviceStateBuffer::new();

        assert_eq!(
            session.scan(&mut buffer),
            ScanOutcome::Detected("Pad One".into())
        );
        assert!(session.is_active());
        assert_eq!(session.device_name(), Some("Pad One"));
        assert!(session.connected_since().is_some());
        assert_eq!(buffer.component_value(ComponentId::LeftStickX), Some(0.0));
        assert_eq!(
            buffer.previous_component_value(ComponentId::South),
            Some(0.0)
        );
    }

    #[test]
    fn failed_poll_disconnects_and_next_scan_reconnects() {
        let (mut session, script) = session();
        script.lock().unwrap().devices = vec![pad("Pad", DeviceKind::Gamepad)];
        let mut buffer = DeviceStateBuffer::new();
        session.scan(&mut buffer);

        assert_eq!(session.scan(&mut buffer), ScanOutcome::StillConnected);
        assert_eq!(script.lock().unwrap().enumerations, 1);

        script.lock().unwrap().poll_ok = false;
        assert_eq!(session.scan(&mut buffer), ScanOutcome::Disconnected);
        assert!(!session.is_active());
        assert_eq!(session.device_name(), None);

        script.lock().unwrap().poll_ok = true;
        assert_eq!(
            session.scan(&mut buffer),
            ScanOutcome::Detected("Pad".into())
        );
        assert_eq!(script.lock().unwrap().enumerations, 2);
    }

    #[test]
    fn poll_events_fills_the_recording_snapshot() {
        let (mut session, script) = session();
        {
            let mut script = script.lock().unwrap();
            script.devices = vec![pad("Pad", DeviceKind::Gamepad)];
            script.events.extend([
                ComponentEvent {
                    component: ComponentId::LeftStickX,
                    value: -0.7,
                },
                ComponentEvent {
                    component: ComponentId::RightZ,
                    value: 1.0,
                },
            ]);
        }
        let mut buffer = DeviceStateBuffer::new();
        assert_eq!(session.poll_events(&mut buffer), 0);

        session.scan(&mut buffer);
        // RightZ was never announced by the device
        assert_eq!(session.poll_events(&mut buffer), 1);
        assert_eq!(buffer.component_value(ComponentId::LeftStickX), Some(0.0));

        buffer.advance_frame();
        assert_eq!(buffer.component_value(ComponentId::LeftStickX), Some(-0.7));
        assert_eq!(buffer.component_value(ComponentId::RightZ), None);
    }
}

//! Frame driver
//!
//! [`Input`] wires the pieces together for hosts that want one object to talk to:
//!
//! ```text
//! host events ──► EventSink / EventSender ──► DeviceStateBuffer ◄── ControllerSession
//!                                                   │
//!                                  advance_frame ───┤
//!                                                   ▼
//!                              InputResolver ──► is_active / value / was_just_activated
//! ```
//!
//! [`Input::update`] runs one frame in the required order: queued events, controller
//! scan and poll, snapshot rotation, active-axis refresh. Queries made after it see a
//! consistent frame.

use crate::binding::{AxisBinding, BindingSet};
use crate::config::InputSettings;
use crate::controller::{ControllerBackend, ControllerSession, ScanOutcome};
use crate::device::DeviceStateBuffer;
use crate::event::{EventQueue, EventSender, EventSink, FocusState, FocusTransition, InputEvent};
use crate::resolver::{ExitHook, InputResolver, ResolveContext};
use crate::InputError;
use tracing::{debug, info};

/// What one [`Input::update`] did
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Host events taken from the cross-thread queue
    pub queued_events: usize,
    /// Controller scan result; `None` when controller input is disabled
    pub scan: Option<ScanOutcome>,
    /// Component values applied from the controller's event queue
    pub component_updates: usize,
}

// Everything the event sink writes to, split out so the queue can drain into it
struct Recorder {
    state: DeviceStateBuffer,
    focus: FocusState,
}

impl EventSink for Recorder {
    fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(code) => self.state.record_key_down(code),
            InputEvent::KeyUp(code) => self.state.record_key_up(code),
            InputEvent::MouseDown(button) => self.state.record_mouse_down(button),
            InputEvent::MouseUp(button) => self.state.record_mouse_up(button),
            InputEvent::MouseMoved { x, y } => self.state.record_mouse_position(x, y),
            InputEvent::FocusGained | InputEvent::FocusLost => {
                let transition = self.focus.apply(&event);
                if event == InputEvent::FocusLost {
                    self.state.clear_on_focus_loss();
                }
                match transition {
                    FocusTransition::Gained => debug!("Input focus gained"),
                    FocusTransition::Lost => debug!("Input focus lost"),
                    FocusTransition::Unchanged => {}
                }
            }
        }
    }
}

/// Keyboard, mouse and gamepad input behind named axes
pub struct Input {
    settings: InputSettings,
    bindings: BindingSet,
    recorder: Recorder,
    session: ControllerSession,
    resolver: InputResolver,
    queue: EventQueue,
    sender: EventSender,
}

impl Input {
    /// Creates the input layer and runs a first controller scan
    pub fn new(settings: InputSettings, backend: Box<dyn ControllerBackend>) -> Self {
        info!("Initializing input with settings: {:?}", settings);

        let (sender, queue) = EventQueue::channel();
        let mut input = Self {
            recorder: Recorder {
                state: DeviceStateBuffer::with_capacity(
                    settings.key_capacity,
                    settings.mouse_capacity,
                ),
                focus: FocusState::default(),
            },
            bindings: BindingSet::empty(),
            session: ControllerSession::new(backend),
            resolver: InputResolver::new(),
            queue,
            sender,
            settings,
        };

        if input.settings.use_controller {
            input.scan_controller();
        }
        input
    }

    /// Replaces the process-exit behaviour for unresolvable axis names
    pub fn with_exit_hook(mut self, exit_hook: ExitHook) -> Self {
        self.resolver = InputResolver::with_exit_hook(exit_hook);
        self
    }

    pub fn set_bindings(&mut self, bindings: BindingSet) {
        info!("Registered {} axis bindings", bindings.len());
        self.bindings = bindings;
    }

    /// Validates `bindings` as a set and installs them
    pub fn register_bindings(&mut self, bindings: Vec<AxisBinding>) -> Result<(), InputError> {
        self.set_bindings(BindingSet::new(bindings)?);
        Ok(())
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Handle for hosts that deliver window events from another thread
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Runs one full frame. Call once per rendered frame, before any query.
    pub fn update(&mut self) -> FrameReport {
        let queued_events = self.drain_events();

        let (scan, component_updates) = if self.settings.use_controller {
            let scan = self.scan_controller();
            (Some(scan), self.poll_controller())
        } else {
            (None, 0)
        };

        self.advance_frame();
        self.refresh_active_axes();

        FrameReport {
            queued_events,
            scan,
            component_updates,
        }
    }

    /// Applies events queued through [`EventSender`]s
    pub fn drain_events(&mut self) -> usize {
        self.queue.drain_into(&mut self.recorder)
    }

    /// Polls the active controller or looks for a new one
    pub fn scan_controller(&mut self) -> ScanOutcome {
        self.session.scan(&mut self.recorder.state)
    }

    /// Pulls pending controller events into the frame being recorded.
    ///
    /// Must run before [`advance_frame`](Self::advance_frame) of the same frame.
    pub fn poll_controller(&mut self) -> usize {
        self.session.poll_events(&mut self.recorder.state)
    }

    /// Publishes the recorded frame and keeps the last one for edge detection
    pub fn advance_frame(&mut self) {
        self.recorder.state.advance_frame();
    }

    /// Recomputes the list returned by [`active_axis_names`](Self::active_axis_names)
    pub fn refresh_active_axes(&mut self) {
        let ctx = ResolveContext {
            bindings: &self.bindings,
            state: &self.recorder.state,
            controller_active: self.settings.use_controller && self.session.is_active(),
            focus: self.recorder.focus,
        };
        self.resolver.refresh_active_axes(&ctx);
    }

    fn context(&self) -> ResolveContext<'_> {
        ResolveContext {
            bindings: &self.bindings,
            state: &self.recorder.state,
            controller_active: self.using_controller(),
            focus: self.recorder.focus,
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.resolver.is_active(&self.context(), name)
    }

    pub fn value(&self, name: &str) -> f32 {
        self.resolver.value(&self.context(), name)
    }

    pub fn was_just_activated(&self, name: &str) -> bool {
        self.resolver.was_just_activated(&self.context(), name)
    }

    /// Axes active at the last update, in registration order
    pub fn active_axis_names(&self) -> Vec<String> {
        self.resolver.active_axis_names()
    }

    /// Looks up a binding; unknown names are fatal
    pub fn resolve_binding(&self, name: &str) -> &AxisBinding {
        self.resolver.resolve_binding(&self.bindings, name)
    }

    pub fn try_resolve_binding(&self, name: &str) -> Result<&AxisBinding, InputError> {
        self.resolver.try_resolve_binding(&self.bindings, name)
    }

    pub fn mouse_position(&self) -> (i32, i32) {
        self.recorder.state.mouse_position()
    }

    pub fn has_focus(&self) -> bool {
        self.recorder.focus.is_focused()
    }

    /// Controller input enabled and a controller connected
    pub fn using_controller(&self) -> bool {
        self.settings.use_controller && self.session.is_active()
    }

    pub fn controller_name(&self) -> Option<&str> {
        self.session.device_name()
    }

    pub fn controller(&self) -> &ControllerSession {
        &self.session
    }

    pub fn state(&self) -> &DeviceStateBuffer {
        &self.recorder.state
    }
}

impl EventSink for Input {
    fn dispatch(&mut self, event: InputEvent) {
        self.recorder.dispatch(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingError;
    use crate::controller::NullBackend;
    use crate::device::{KeyCode, MouseButton};

    fn input() -> Input {
        let mut input = Input::new(InputSettings::default(), Box::new(NullBackend));
        input.set_bindings(
            BindingSet::new(vec![
                AxisBinding::key_only("Jump", KeyCode::SPACE).unwrap(),
                AxisBinding::builder("Fire")
                    .mouse(MouseButton::LEFT)
                    .build()
                    .unwrap(),
            ])
            .unwrap(),
        );
        input
    }

    #[test]
    fn starts_unfocused_without_controller() {
        let input = input();
        assert!(!input.has_focus());
        assert!(!input.using_controller());
        assert_eq!(input.controller_name(), None);
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut input = input();
        input.dispatch(InputEvent::FocusGained);
        input.dispatch(InputEvent::KeyDown(KeyCode::SPACE));
        input.update();
        assert!(input.is_active("Jump"));

        input.dispatch(InputEvent::FocusLost);
        assert!(!input.is_active("Jump"));

        input.dispatch(InputEvent::FocusGained);
        input.update();
        assert!(!input.is_active("Jump"));
        assert!(input.active_axis_names().is_empty());

        input.dispatch(InputEvent::KeyDown(KeyCode::SPACE));
        input.update();
        assert!(input.is_active("Jump"));
        assert!(input.was_just_activated("Jump"));
    }

    #[test]
    fn queued_events_land_in_the_next_frame() {
        let mut input = input();
        let sender = input.event_sender();
        sender.send(InputEvent::FocusGained);
        sender.send(InputEvent::MouseDown(MouseButton::LEFT));
        sender.send(InputEvent::MouseMoved { x: 40, y: 2 });

        let report = input.update();
        assert_eq!(report.queued_events, 3);
        assert_eq!(report.scan, Some(ScanOutcome::NoGamepad));
        assert!(input.is_active("fire"));
        assert_eq!(input.value("Fire"), 1.0);
        assert_eq!(input.mouse_position(), (40, 2));
        assert_eq!(input.active_axis_names(), ["Fire"]);
    }

    #[test]
    fn register_bindings_keeps_the_old_set_on_error() {
        let mut input = input();
        let result = input.register_bindings(vec![
            AxisBinding::key_only("Run", KeyCode(16)).unwrap(),
            AxisBinding::key_only("RUN", KeyCode(17)).unwrap(),
        ]);
        assert!(matches!(
            result,
            Err(InputError::BindingError(BindingError::DuplicateName(name))) if name == "RUN"
        ));
        assert_eq!(input.bindings().len(), 2);

        input
            .register_bindings(vec![AxisBinding::key_only("Run", KeyCode(16)).unwrap()])
            .unwrap();
        assert_eq!(input.bindings().len(), 1);
        assert!(input.try_resolve_binding("run").is_ok());
    }

    #[test]
    fn disabled_controller_skips_scanning() {
        let settings = InputSettings {
            use_controller: false,
            ..Default::default()
        };
        let mut input = Input::new(settings, Box::new(NullBackend));
        assert_eq!(input.update().scan, None);
    }
}

//! Axis resolution and edge detection
//!
//! [`InputResolver`] turns the per-frame device state into answers about named axes.
//! It owns no device state: every query borrows a [`ResolveContext`] describing the
//! frame. The only thing it keeps is the list of axes that were active when
//! [`InputResolver::refresh_active_axes`] last ran.
//!
//! While the host window does not have focus every query reports "not active".

use crate::binding::{AxisBinding, BindingSet};
use crate::device::DeviceStateBuffer;
use crate::event::FocusState;
use crate::InputError;
use tracing::{debug, error};

/// Called with the exit code after an unresolvable axis name was logged
pub type ExitHook = fn(i32) -> !;

/// Exit code used for unresolvable axis names
pub const FATAL_EXIT_CODE: i32 = -1;

/// Everything a query needs to know about the current frame
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub bindings: &'a BindingSet,
    pub state: &'a DeviceStateBuffer,
    /// True when controller input is enabled and a controller session is active
    pub controller_active: bool,
    pub focus: FocusState,
}

impl ResolveContext<'_> {
    fn focused(&self) -> bool {
        self.focus.is_focused()
    }
}

/// Resolves axis names to pressed state, analog value and rising edges
pub struct InputResolver {
    active_axes: Vec<String>,
    exit_hook: ExitHook,
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InputResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputResolver")
            .field("active_axes", &self.active_axes)
            .finish_non_exhaustive()
    }
}

impl InputResolver {
    pub fn new() -> Self {
        Self::with_exit_hook(std::process::exit)
    }

    /// Resolver that calls `exit_hook` instead of terminating the process when an axis
    /// name cannot be resolved
    pub fn with_exit_hook(exit_hook: ExitHook) -> Self {
        Self {
            active_axes: Vec::new(),
            exit_hook,
        }
    }

    /// Case-insensitive lookup that reports unknown names as an error
    pub fn try_resolve_binding<'a>(
        &self,
        bindings: &'a BindingSet,
        name: &str,
    ) -> Result<&'a AxisBinding, InputError> {
        bindings
            .get(name)
            .ok_or_else(|| InputError::UnknownAxis(name.to_string()))
    }

    /// Case-insensitive lookup.
    ///
    /// Axis names are fixed wiring, so an unknown name is a programming error: it is
    /// logged and the exit hook runs.
    pub fn resolve_binding<'a>(&self, bindings: &'a BindingSet, name: &str) -> &'a AxisBinding {
        match self.try_resolve_binding(bindings, name) {
            Ok(binding) => binding,
            Err(e) => {
                error!("Cannot get axis from name: {} ({})", name, e);
                (self.exit_hook)(FATAL_EXIT_CODE)
            }
        }
    }

    /// Whether the axis is held: bound key, bound mouse button, or any bound
    /// component inside the activation zone.
    pub fn is_active(&self, ctx: &ResolveContext<'_>, name: &str) -> bool {
        let binding = self.resolve_binding(ctx.bindings, name);
        if !ctx.focused() {
            return false;
        }
        Self::binding_active(ctx, binding)
    }

    /// 1.0 while the key or mouse binding is down, otherwise the raw value of the first
    /// bound component (ignoring the threshold), otherwise 0.0
    pub fn value(&self, ctx: &ResolveContext<'_>, name: &str) -> f32 {
        let binding = self.resolve_binding(ctx.bindings, name);
        if !ctx.focused() {
            return 0.0;
        }
        if Self::digital_down(ctx.state, binding) {
            return 1.0;
        }
        if ctx.controller_active {
            if let Some(first) = binding.components().first() {
                return ctx.state.component_value(*first).unwrap_or(0.0);
            }
        }
        0.0
    }

    /// Rising edge within the current frame boundary. Releases never count.
    pub fn was_just_activated(&self, ctx: &ResolveContext<'_>, name: &str) -> bool {
        let binding = self.resolve_binding(ctx.bindings, name);
        if !ctx.focused() {
            return false;
        }

        if binding.key_code().is_some_and(|key| ctx.state.key_rose(key)) {
            return true;
        }
        if binding
            .mouse_button()
            .is_some_and(|button| ctx.state.mouse_rose(button))
        {
            return true;
        }
        if ctx.controller_active {
            return binding.components().iter().any(|component| {
                match (
                    ctx.state.component_value(*component),
                    ctx.state.previous_component_value(*component),
                ) {
                    (Some(value), Some(previous)) => {
                        value != previous && binding.crosses_threshold(value)
                    }
                    _ => false,
                }
            });
        }
        false
    }

    /// Re-evaluates every binding, in registration order. Run once per frame after
    /// the frame's snapshot was published.
    pub fn refresh_active_axes(&mut self, ctx: &ResolveContext<'_>) {
        self.active_axes.clear();
        if !ctx.focused() {
            return;
        }
        self.active_axes.extend(
            ctx.bindings
                .iter()
                .filter(|binding| Self::binding_active(ctx, binding))
                .map(|binding| binding.name().to_string()),
        );
        if !self.active_axes.is_empty() {
            debug!("Active axes: {:?}", self.active_axes);
        }
    }

    /// Snapshot of the axes active at the last refresh
    pub fn active_axis_names(&self) -> Vec<String> {
        self.active_axes.clone()
    }

    fn binding_active(ctx: &ResolveContext<'_>, binding: &AxisBinding) -> bool {
        if Self::digital_down(ctx.state, binding) {
            return true;
        }
        ctx.controller_active
            && binding.components().iter().any(|component| {
                ctx.state
                    .component_value(*component)
                    .is_some_and(|value| binding.crosses_threshold(value))
            })
    }

    fn digital_down(state: &DeviceStateBuffer, binding: &AxisBinding) -> bool {
        binding.key_code().is_some_and(|key| state.is_key_down(key))
            || binding
                .mouse_button()
                .is_some_and(|button| state.is_mouse_down(button))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ComponentId;
    use crate::device::{KeyCode, MouseButton};
    use rstest::rstest;

    fn exit_by_panicking(code: i32) -> ! {
        panic!("process exit requested with code {}", code)
    }

    fn bindings() -> BindingSet {
        BindingSet::new(vec![
            AxisBinding::builder("Jump").key(KeyCode::SPACE).build().unwrap(),
            AxisBinding::builder("Fire")
                .mouse(MouseButton::LEFT)
                .build()
                .unwrap(),
            AxisBinding::builder("Right")
                .key(KeyCode::D)
                .components([ComponentId::LeftStickX, ComponentId::DPadX], 0.5)
                .build()
                .unwrap(),
            AxisBinding::builder("Left")
                .components([ComponentId::LeftStickX], -0.5)
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    fn pad_state() -> DeviceStateBuffer {
        let mut state = DeviceStateBuffer::new();
        state.reset_components(&[ComponentId::LeftStickX, ComponentId::DPadX]);
        state
    }

    fn ctx<'a>(bindings: &'a BindingSet, state: &'a DeviceStateBuffer) -> ResolveContext<'a> {
        ResolveContext {
            bindings,
            state,
            controller_active: true,
            focus: FocusState::Focused,
        }
    }

    #[test]
    #[should_panic(expected = "process exit requested with code -1")]
    fn unknown_axis_runs_the_exit_hook() {
        let resolver = InputResolver::with_exit_hook(exit_by_panicking);
        let bindings = bindings();
        let state = DeviceStateBuffer::new();
        resolver.is_active(&ctx(&bindings, &state), "Jmup");
    }

    #[test]
    fn try_resolve_reports_unknown_axis() {
        let resolver = InputResolver::new();
        let bindings = bindings();
        assert!(matches!(
            resolver.try_resolve_binding(&bindings, "Crouch"),
            Err(InputError::UnknownAxis(name)) if name == "Crouch"
        ));
        assert_eq!(
            resolver.resolve_binding(&bindings, "fIRE").name(),
            "Fire"
        );
    }

    #[test]
    fn key_axis_requires_focus() {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = DeviceStateBuffer::new();
        state.record_key_down(KeyCode::SPACE);
        state.advance_frame();

        let mut context = ctx(&bindings, &state);
        assert!(resolver.is_active(&context, "jump"));
        assert_eq!(resolver.value(&context, "Jump"), 1.0);

        context.focus = FocusState::Unfocused;
        assert!(!resolver.is_active(&context, "Jump"));
        assert!(!resolver.was_just_activated(&context, "Jump"));
        assert_eq!(resolver.value(&context, "Jump"), 0.0);
    }

    #[rstest]
    #[case("Right", 0.5, true)]
    #[case("Right", 0.49, false)]
    #[case("Left", -0.5, true)]
    #[case("Left", -0.49, false)]
    #[case("Left", 0.9, false)]
    fn stick_threshold_zones(#[case] axis: &str, #[case] value: f32, #[case] expected: bool) {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = pad_state();
        state.record_component(ComponentId::LeftStickX, value);
        state.advance_frame();

        assert_eq!(resolver.is_active(&ctx(&bindings, &state), axis), expected);
    }

    #[test]
    fn any_bound_component_activates() {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = pad_state();
        state.record_component(ComponentId::DPadX, 1.0);
        state.advance_frame();

        let context = ctx(&bindings, &state);
        assert!(resolver.is_active(&context, "Right"));
        // value reports the first bound component only, ungated
        assert_eq!(resolver.value(&context, "Right"), 0.0);
    }

    #[test]
    fn components_are_ignored_without_a_controller() {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = pad_state();
        state.record_component(ComponentId::LeftStickX, 1.0);
        state.advance_frame();

        let mut context = ctx(&bindings, &state);
        context.controller_active = false;
        assert!(!resolver.is_active(&context, "Right"));
        assert!(!resolver.was_just_activated(&context, "Right"));
        assert_eq!(resolver.value(&context, "Right"), 0.0);
    }

    #[test]
    fn digital_binding_wins_over_analog_value() {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = pad_state();
        state.record_key_down(KeyCode::D);
        state.record_component(ComponentId::LeftStickX, 0.2);
        state.advance_frame();

        assert_eq!(resolver.value(&ctx(&bindings, &state), "Right"), 1.0);
    }

    #[test]
    fn value_is_raw_below_threshold() {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = pad_state();
        state.record_component(ComponentId::LeftStickX, 0.2);
        state.advance_frame();

        let context = ctx(&bindings, &state);
        assert!(!resolver.is_active(&context, "Right"));
        assert_eq!(resolver.value(&context, "Right"), 0.2);
    }

    #[rstest]
    #[case("Right", 0.8, 0.9)]
    #[case("Left", -0.8, -0.9)]
    fn component_tap_needs_change_and_zone(
        #[case] axis: &str,
        #[case] pushed: f32,
        #[case] pushed_further: f32,
    ) {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = pad_state();

        state.record_component(ComponentId::LeftStickX, pushed);
        state.advance_frame();
        assert!(resolver.was_just_activated(&ctx(&bindings, &state), axis));

        // held still
        state.advance_frame();
        assert!(resolver.is_active(&ctx(&bindings, &state), axis));
        assert!(!resolver.was_just_activated(&ctx(&bindings, &state), axis));

        // moving inside the zone still counts as a change
        state.record_component(ComponentId::LeftStickX, pushed_further);
        state.advance_frame();
        assert!(resolver.was_just_activated(&ctx(&bindings, &state), axis));

        // leaving the zone is a falling edge
        state.record_component(ComponentId::LeftStickX, 0.1);
        state.advance_frame();
        assert!(!resolver.was_just_activated(&ctx(&bindings, &state), axis));
    }

    #[test]
    fn mouse_rising_edge_only() {
        let resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = DeviceStateBuffer::new();

        state.record_mouse_down(MouseButton::LEFT);
        state.advance_frame();
        assert!(resolver.was_just_activated(&ctx(&bindings, &state), "Fire"));

        state.record_mouse_up(MouseButton::LEFT);
        state.advance_frame();
        let context = ctx(&bindings, &state);
        assert!(!resolver.was_just_activated(&context, "Fire"));
        assert!(!resolver.is_active(&context, "Fire"));
    }

    #[test]
    fn active_axes_follow_registration_order() {
        let mut resolver = InputResolver::new();
        let bindings = bindings();
        let mut state = pad_state();
        state.record_component(ComponentId::LeftStickX, -0.9);
        state.record_mouse_down(MouseButton::LEFT);
        state.record_key_down(KeyCode::SPACE);
        state.advance_frame();

        resolver.refresh_active_axes(&ctx(&bindings, &state));
        let snapshot = resolver.active_axis_names();
        assert_eq!(snapshot, ["Jump", "Fire", "Left"]);

        let mut unfocused = ctx(&bindings, &state);
        unfocused.focus = FocusState::Unfocused;
        resolver.refresh_active_axes(&unfocused);
        assert!(resolver.active_axis_names().is_empty());
        // earlier snapshots are owned copies
        assert_eq!(snapshot.len(), 3);
    }
}

//! Controller component identifiers
//!
//! Every analog axis and button a gamepad can report is named by a [`ComponentId`].
//! Bindings refer to components either directly or through their canonical string
//! names (`"Axis.LeftStickX"`, `"Button.South"`), which are resolved through a static
//! table instead of runtime lookups on the device SDK.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::BindingError;

/// Stable identifier of one gamepad component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentId {
    // Analog axes
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftZ,
    RightZ,
    DPadX,
    DPadY,

    // Buttons
    South,
    East,
    North,
    West,
    LeftTrigger,
    LeftTrigger2,
    RightTrigger,
    RightTrigger2,
    Select,
    Start,
    Mode,
    LeftThumb,
    RightThumb,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

/// Canonical names first, aliases after. `Display` uses the first entry per component.
const COMPONENT_NAMES: &[(&str, ComponentId)] = &[
    ("Axis.LeftStickX", ComponentId::LeftStickX),
    ("Axis.LeftStickY", ComponentId::LeftStickY),
    ("Axis.RightStickX", ComponentId::RightStickX),
    ("Axis.RightStickY", ComponentId::RightStickY),
    ("Axis.LeftZ", ComponentId::LeftZ),
    ("Axis.RightZ", ComponentId::RightZ),
    ("Axis.DPadX", ComponentId::DPadX),
    ("Axis.DPadY", ComponentId::DPadY),
    ("Button.South", ComponentId::South),
    ("Button.East", ComponentId::East),
    ("Button.North", ComponentId::North),
    ("Button.West", ComponentId::West),
    ("Button.LeftTrigger", ComponentId::LeftTrigger),
    ("Button.LeftTrigger2", ComponentId::LeftTrigger2),
    ("Button.RightTrigger", ComponentId::RightTrigger),
    ("Button.RightTrigger2", ComponentId::RightTrigger2),
    ("Button.Select", ComponentId::Select),
    ("Button.Start", ComponentId::Start),
    ("Button.Mode", ComponentId::Mode),
    ("Button.LeftThumb", ComponentId::LeftThumb),
    ("Button.RightThumb", ComponentId::RightThumb),
    ("Button.DPadUp", ComponentId::DPadUp),
    ("Button.DPadDown", ComponentId::DPadDown),
    ("Button.DPadLeft", ComponentId::DPadLeft),
    ("Button.DPadRight", ComponentId::DPadRight),
    // Classic joystick-style aliases
    ("Axis.X", ComponentId::LeftStickX),
    ("Axis.Y", ComponentId::LeftStickY),
    ("Axis.RX", ComponentId::RightStickX),
    ("Axis.RY", ComponentId::RightStickY),
    ("Axis.Z", ComponentId::LeftZ),
    ("Axis.RZ", ComponentId::RightZ),
    ("Button.A", ComponentId::South),
    ("Button.B", ComponentId::East),
    ("Button.X", ComponentId::West),
    ("Button.Y", ComponentId::North),
];

impl ComponentId {
    /// All components, in declaration order
    pub const ALL: [ComponentId; 25] = [
        ComponentId::LeftStickX,
        ComponentId::LeftStickY,
        ComponentId::RightStickX,
        ComponentId::RightStickY,
        ComponentId::LeftZ,
        ComponentId::RightZ,
        ComponentId::DPadX,
        ComponentId::DPadY,
        ComponentId::South,
        ComponentId::East,
        ComponentId::North,
        ComponentId::West,
        ComponentId::LeftTrigger,
        ComponentId::LeftTrigger2,
        ComponentId::RightTrigger,
        ComponentId::RightTrigger2,
        ComponentId::Select,
        ComponentId::Start,
        ComponentId::Mode,
        ComponentId::LeftThumb,
        ComponentId::RightThumb,
        ComponentId::DPadUp,
        ComponentId::DPadDown,
        ComponentId::DPadLeft,
        ComponentId::DPadRight,
    ];

    /// Resolves a component from its canonical or alias name.
    ///
    /// The literal `"null"` (any case) stands for "no component" and yields `Ok(None)`.
    /// Names are matched case-insensitively.
    pub fn from_name(name: &str) -> Result<Option<ComponentId>, BindingError> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("null") {
            return Ok(None);
        }

        COMPONENT_NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, id)| Some(*id))
            .ok_or_else(|| BindingError::UnknownComponent(name.to_string()))
    }

    /// Canonical name, e.g. `Axis.LeftStickX`
    pub fn name(&self) -> &'static str {
        COMPONENT_NAMES
            .iter()
            .find(|(_, id)| id == self)
            .map(|(name, _)| *name)
            .unwrap_or("Unknown")
    }

    pub fn is_axis(&self) -> bool {
        matches!(
            self,
            ComponentId::LeftStickX
                | ComponentId::LeftStickY
                | ComponentId::RightStickX
                | ComponentId::RightStickY
                | ComponentId::LeftZ
                | ComponentId::RightZ
                | ComponentId::DPadX
                | ComponentId::DPadY
        )
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ComponentId {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentId::from_name(s)?.ok_or_else(|| BindingError::NullComponent(s.to_string()))
    }
}

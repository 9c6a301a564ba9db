//! Axis bindings
//!
//! An [`AxisBinding`] maps one named logical input ("Jump", "Fire", "Move") to the
//! physical controls that drive it: at most one key, at most one mouse button and a
//! set of gamepad components sharing one activation threshold.
//!
//! Bindings are built once by the host at startup and collected in a [`BindingSet`],
//! which preserves registration order and enforces case-insensitive unique names.
//!
//! ```rust
//! use inputaxis::binding::{AxisBinding, BindingSet, ComponentId};
//! use inputaxis::device::{KeyCode, MouseButton};
//!
//! let bindings = BindingSet::new(vec![
//!     AxisBinding::builder("Jump").key(KeyCode::SPACE).build().unwrap(),
//!     AxisBinding::builder("Fire").mouse(MouseButton::LEFT).build().unwrap(),
//!     AxisBinding::builder("Move")
//!         .components([ComponentId::LeftStickX], 0.5)
//!         .build()
//!         .unwrap(),
//! ])
//! .unwrap();
//!
//! assert!(bindings.get("jump").is_some());
//! ```

pub mod component;

pub use component::ComponentId;

use crate::device::{KeyCode, MouseButton};
use thiserror::Error;
use tracing::debug;

/// Errors raised while building bindings
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("Axis name must not be empty")]
    EmptyName,

    #[error("Axis '{0}' was given an empty controller component set")]
    EmptyComponentSet(String),

    #[error("Axis '{axis}' contains a null controller component at position {index}")]
    NullComponentEntry { axis: String, index: usize },

    #[error("Unknown controller component name: {0}")]
    UnknownComponent(String),

    #[error("Component name '{0}' resolves to no component")]
    NullComponent(String),

    #[error("Axis '{0}' is bound more than once")]
    DuplicateName(String),
}

/// Immutable mapping of one axis name to its physical controls
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBinding {
    name: String,
    key_code: Option<KeyCode>,
    mouse_button: Option<MouseButton>,
    components: Option<Vec<ComponentId>>,
    activation_threshold: f32,
}

impl AxisBinding {
    pub fn builder(name: impl Into<String>) -> AxisBindingBuilder {
        AxisBindingBuilder {
            name: name.into(),
            key_code: None,
            mouse_button: None,
            components: None,
            activation_threshold: 0.0,
        }
    }

    /// Shorthand for a binding driven only by a single key
    pub fn key_only(name: impl Into<String>, key: KeyCode) -> Result<Self, BindingError> {
        Self::builder(name).key(key).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_code(&self) -> Option<KeyCode> {
        self.key_code
    }

    pub fn mouse_button(&self) -> Option<MouseButton> {
        self.mouse_button
    }

    /// Bound gamepad components, in the order they were supplied. Empty when the axis
    /// has no controller binding.
    pub fn components(&self) -> &[ComponentId] {
        self.components.as_deref().unwrap_or(&[])
    }

    pub fn has_components(&self) -> bool {
        self.components.is_some()
    }

    pub fn activation_threshold(&self) -> f32 {
        self.activation_threshold
    }

    /// Whether an analog value lies inside the activation zone.
    ///
    /// A positive threshold activates at or above it, a zero or negative threshold at or
    /// below it, so triggers and both stick directions share one field.
    pub fn crosses_threshold(&self, value: f32) -> bool {
        if self.activation_threshold > 0.0 {
            value >= self.activation_threshold
        } else {
            value <= self.activation_threshold
        }
    }

    // Unicode case folding, so "SPRÜNGE" finds "Sprünge"
    pub(crate) fn matches_name(&self, name: &str) -> bool {
        fold_case(&self.name).eq(fold_case(name))
    }
}

fn fold_case(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars().flat_map(char::to_lowercase)
}

/// Builder for [`AxisBinding`]; validation happens in [`AxisBindingBuilder::build`]
#[derive(Debug, Clone)]
pub struct AxisBindingBuilder {
    name: String,
    key_code: Option<KeyCode>,
    mouse_button: Option<MouseButton>,
    components: Option<Vec<Option<ComponentId>>>,
    activation_threshold: f32,
}

impl AxisBindingBuilder {
    pub fn key(mut self, key: KeyCode) -> Self {
        self.key_code = Some(key);
        self
    }

    pub fn mouse(mut self, button: MouseButton) -> Self {
        self.mouse_button = Some(button);
        self
    }

    /// Binds gamepad components with a shared activation threshold
    pub fn components(
        mut self,
        components: impl IntoIterator<Item = ComponentId>,
        activation_threshold: f32,
    ) -> Self {
        self.components = Some(components.into_iter().map(Some).collect());
        self.activation_threshold = activation_threshold;
        self
    }

    /// Binds gamepad components by canonical name.
    ///
    /// Unknown names fail immediately; `"null"` entries are kept and rejected by
    /// [`build`](Self::build) like any other null entry.
    pub fn component_names<'a>(
        mut self,
        names: impl IntoIterator<Item = &'a str>,
        activation_threshold: f32,
    ) -> Result<Self, BindingError> {
        let components = names
            .into_iter()
            .map(ComponentId::from_name)
            .collect::<Result<Vec<_>, _>>()?;
        self.components = Some(components);
        self.activation_threshold = activation_threshold;
        Ok(self)
    }

    pub fn build(self) -> Result<AxisBinding, BindingError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(BindingError::EmptyName);
        }

        let components = match self.components {
            None => None,
            Some(entries) if entries.is_empty() => {
                return Err(BindingError::EmptyComponentSet(name));
            }
            Some(entries) => {
                let mut ids: Vec<ComponentId> = Vec::with_capacity(entries.len());
                for (index, entry) in entries.into_iter().enumerate() {
                    let id = entry.ok_or_else(|| BindingError::NullComponentEntry {
                        axis: name.clone(),
                        index,
                    })?;
                    // set semantics, first occurrence wins
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                Some(ids)
            }
        };

        debug!(
            "Built binding '{}' key={:?} mouse={:?} components={:?} threshold={}",
            name, self.key_code, self.mouse_button, components, self.activation_threshold
        );

        Ok(AxisBinding {
            name,
            key_code: self.key_code,
            mouse_button: self.mouse_button,
            components,
            activation_threshold: self.activation_threshold,
        })
    }
}

/// Ordered collection of bindings with case-insensitive unique names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingSet {
    bindings: Vec<AxisBinding>,
}

impl BindingSet {
    pub fn new(bindings: Vec<AxisBinding>) -> Result<Self, BindingError> {
        for (index, binding) in bindings.iter().enumerate() {
            if bindings[..index]
                .iter()
                .any(|earlier| earlier.matches_name(binding.name()))
            {
                return Err(BindingError::DuplicateName(binding.name().to_string()));
            }
        }
        Ok(Self { bindings })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&AxisBinding> {
        self.bindings.iter().find(|binding| binding.matches_name(name))
    }

    /// Bindings in registration order
    pub fn iter(&self) -> impl Iterator<Item = &AxisBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

//! Wig-type and product customization choices.

use super::SelectionMap;
use crate::domain::value_objects::{Naira, SelectionOption};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationAxis {
    pub name: String,
    pub options: Vec<SelectionOption>,
}

impl CustomizationAxis {
    pub fn new(name: impl Into<String>, options: Vec<SelectionOption>) -> Self {
        Self { name: name.into(), options }
    }

    pub fn default_option(&self) -> Option<&SelectionOption> { self.options.first() }
}

/// What customizations hang off: a wig type in the builder, or a catalogue product.
///
/// Axes are only meaningful for the parent that declares them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationParent {
    pub id: String,
    pub base_price: Naira,
    pub axes: Vec<CustomizationAxis>,
}

impl CustomizationParent {
    pub fn new(id: impl Into<String>, base_price: Naira, axes: Vec<CustomizationAxis>) -> Self {
        Self { id: id.into(), base_price, axes }
    }

    pub fn axis(&self, name: &str) -> Option<&CustomizationAxis> { self.axes.iter().find(|a| a.name == name) }
}

#[derive(Clone, Debug, Default)]
pub struct CustomizationStore {
    parent: Option<CustomizationParent>,
    selected: SelectionMap,
}

impl CustomizationStore {
    pub fn new() -> Self { Self::default() }

    pub fn parent(&self) -> Option<&CustomizationParent> { self.parent.as_ref() }
    pub fn selected_options(&self) -> &SelectionMap { &self.selected }

    /// Switches to a new parent: every prior selection is dropped, then each
    /// axis of the new parent is seeded with its first option.
    pub fn set_parent(&mut self, parent: CustomizationParent) {
        self.selected.clear();
        for axis in &parent.axes {
            if let Some(option) = axis.default_option() {
                self.selected.select(axis.name.clone(), option.clone());
            }
        }
        tracing::debug!(parent = %parent.id, axes = parent.axes.len(), "customization parent changed");
        self.parent = Some(parent);
    }

    pub fn set_selected_wig_type(&mut self, wig_type: CustomizationParent) { self.set_parent(wig_type); }

    /// No validation against the parent's axes; callers only offer valid options.
    pub fn set_selected_option(&mut self, axis: impl Into<String>, option: SelectionOption) {
        self.selected.select(axis, option);
    }

    pub fn base_price(&self) -> Naira { self.parent.as_ref().map(|p| p.base_price).unwrap_or_default() }
    pub fn customization_total(&self) -> Naira { self.selected.total() }
    pub fn total_price(&self) -> Naira { self.base_price() + self.customization_total() }

    pub fn reset(&mut self) {
        self.parent = None;
        self.selected.clear();
    }
}

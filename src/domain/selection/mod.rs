//! Selection stores
//!
//! Each store owns one map of in-progress choices. The price aggregator reads
//! them; the cart deep-copies them when a line is committed.

pub mod consultation;
pub mod customization;
pub mod delivery;

pub use consultation::{Consultation, ConsultationSelection, ConsultationStore};
pub use customization::{CustomizationAxis, CustomizationParent, CustomizationStore};
pub use delivery::DeliveryStore;

use crate::domain::value_objects::{Naira, SelectionOption};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis name to chosen option. At most one option per axis; a missing axis costs nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionMap(BTreeMap<String, SelectionOption>);

impl SelectionMap {
    pub fn new() -> Self { Self::default() }

    /// Replaces whatever was chosen for `axis`.
    pub fn select(&mut self, axis: impl Into<String>, option: SelectionOption) {
        self.0.insert(axis.into(), option);
    }

    pub fn get(&self, axis: &str) -> Option<&SelectionOption> { self.0.get(axis) }
    pub fn remove(&mut self, axis: &str) -> Option<SelectionOption> { self.0.remove(axis) }
    pub fn clear(&mut self) { self.0.clear(); }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn contains_axis(&self, axis: &str) -> bool { self.0.contains_key(axis) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectionOption)> {
        self.0.iter().map(|(axis, option)| (axis.as_str(), option))
    }

    pub fn total(&self) -> Naira { self.0.values().map(|o| o.price).sum() }
}

impl FromIterator<(String, SelectionOption)> for SelectionMap {
    fn from_iter<I: IntoIterator<Item = (String, SelectionOption)>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

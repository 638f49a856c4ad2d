//! Processing-time and fitting surcharges.

use super::SelectionMap;
use crate::domain::value_objects::{Naira, SelectionOption};

#[derive(Clone, Debug, Default)]
pub struct DeliveryStore {
    product_id: Option<String>,
    selected: SelectionMap,
}

impl DeliveryStore {
    pub fn new() -> Self { Self::default() }

    pub fn product_id(&self) -> Option<&str> { self.product_id.as_deref() }
    pub fn selected_options(&self) -> &SelectionMap { &self.selected }

    /// Delivery choices belong to one product; moving to another starts over.
    pub fn set_product(&mut self, product_id: impl Into<String>) {
        let product_id = product_id.into();
        if self.product_id.as_deref() != Some(product_id.as_str()) {
            self.selected.clear();
            self.product_id = Some(product_id);
        }
    }

    pub fn set_selection(&mut self, axis: impl Into<String>, option: SelectionOption) {
        self.selected.select(axis, option);
    }

    /// Options to offer for an axis: the free `None` choice first.
    pub fn options_for(offered: &[SelectionOption]) -> Vec<SelectionOption> {
        std::iter::once(SelectionOption::none())
            .chain(offered.iter().filter(|o| !o.is_none()).cloned())
            .collect()
    }

    pub fn total_price(&self) -> Naira { self.selected.total() }

    pub fn reset(&mut self) {
        self.product_id = None;
        self.selected.clear();
    }
}

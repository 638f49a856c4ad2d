//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::selection::{CustomizationAxis, CustomizationParent, DeliveryStore};
use crate::domain::value_objects::{Naira, SelectionOption};

/// A catalogue wig or hair unit as the storefront offers it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: String,
    title: String,
    #[serde(default)]
    image: Option<String>,
    base_price: Naira,
    #[serde(default)]
    customization_axes: Vec<CustomizationAxis>,
    #[serde(default)]
    delivery_axes: Vec<DeliveryAxis>,
    #[serde(default)]
    status: ProductStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAxis { pub name: String, pub options: Vec<SelectionOption> }
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus { #[default] Active, OutOfStock, Archived }

impl Product {
    pub fn create(id: impl Into<String>, title: impl Into<String>, base_price: Naira) -> Self {
        Self {
            id: id.into(), title: title.into(), image: None, base_price,
            customization_axes: vec![], delivery_axes: vec![], status: ProductStatus::Active, updated_at: Utc::now(),
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self { self.image = Some(url.into()); self }
    pub fn with_customization(mut self, axis: CustomizationAxis) -> Self { self.customization_axes.push(axis); self }
    pub fn with_delivery(mut self, name: impl Into<String>, options: Vec<SelectionOption>) -> Self {
        self.delivery_axes.push(DeliveryAxis { name: name.into(), options });
        self
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn image(&self) -> Option<&str> { self.image.as_deref() }
    pub fn base_price(&self) -> Naira { self.base_price }
    pub fn status(&self) -> &ProductStatus { &self.status }
    pub fn customization_axes(&self) -> &[CustomizationAxis] { &self.customization_axes }
    pub fn delivery_axes(&self) -> &[DeliveryAxis] { &self.delivery_axes }

    /// Choices shown for a delivery axis, led by the free "None" option.
    pub fn delivery_options(&self, axis: &str) -> Option<Vec<SelectionOption>> {
        self.delivery_axes.iter().find(|a| a.name == axis).map(|a| DeliveryStore::options_for(&a.options))
    }
    pub fn is_purchasable(&self) -> bool { self.status == ProductStatus::Active }

    /// The product as a customization parent; its price is the base.
    pub fn customization_parent(&self) -> CustomizationParent {
        CustomizationParent::new(self.id.clone(), self.base_price, self.customization_axes.clone())
    }

    pub fn update_price(&mut self, base_price: Naira) { self.base_price = base_price; self.touch(); }
    pub fn mark_out_of_stock(&mut self) { self.status = ProductStatus::OutOfStock; self.touch(); }
    pub fn archive(&mut self) { self.status = ProductStatus::Archived; self.touch(); }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

//! Cart Aggregate
//!
//! Line items are frozen price snapshots taken when the shopper confirms
//! "add to cart". A price change means remove and re-add; only quantity moves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::selection::{Consultation, ConsultationStore, CustomizationStore, DeliveryStore, SelectionMap};
use crate::domain::value_objects::{Naira, Quantity};

/// Where a line lives. Remote lines carry the backend's cart item id and are
/// edited through the cart API; local lines never leave this device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineSource {
    #[default]
    Local,
    Remote {
        #[serde(rename = "cartItemId")]
        cart_item_id: String,
    },
}

impl LineSource {
    pub fn is_remote(&self) -> bool { matches!(self, Self::Remote { .. }) }
    pub fn cart_item_id(&self) -> Option<&str> {
        match self { Self::Remote { cart_item_id } => Some(cart_item_id), Self::Local => None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    #[serde(default = "Uuid::new_v4")]
    pub line_id: Uuid,
    pub product_id: String,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    pub base_price: Naira,
    #[serde(default)]
    pub customizations: SelectionMap,
    #[serde(default)]
    pub customization_total: Naira,
    #[serde(default)]
    pub delivery: SelectionMap,
    #[serde(default)]
    pub delivery_total: Naira,
    pub total_price: Naira,
    pub quantity: Quantity,
    #[serde(default)]
    pub consultation: Option<Consultation>,
    #[serde(default)]
    pub source: LineSource,
}

impl CartLineItem {
    /// Freezes a validated request into a line. Totals are computed here, once.
    pub fn snapshot(new: NewLineItem, source: LineSource) -> Result<Self, CartError> {
        new.validate().map_err(|e| CartError::InvalidItem(e.to_string()))?;
        let quantity = Quantity::new(new.quantity).map_err(|e| CartError::InvalidItem(e.to_string()))?;
        let customization_total = new.customizations.total();
        let delivery_total = new.delivery.total();
        Ok(Self {
            line_id: Uuid::new_v4(), product_id: new.product_id, title: new.title, image: new.image,
            base_price: new.base_price, customizations: new.customizations, customization_total,
            delivery: new.delivery, delivery_total,
            total_price: new.base_price + customization_total + delivery_total,
            quantity, consultation: new.consultation, source,
        })
    }

    pub fn line_total(&self) -> Naira { self.total_price.multiply(self.quantity.value()) }

    /// Same product, same options at the same prices. Lines that agree here
    /// only differ in quantity.
    pub fn same_configuration(&self, other: &CartLineItem) -> bool {
        self.product_id == other.product_id
            && self.base_price == other.base_price
            && self.total_price == other.total_price
            && self.customizations == other.customizations
            && self.delivery == other.delivery
            && self.consultation == other.consultation
    }
}

/// What the shopper asked for, before it is frozen into a [`CartLineItem`].
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub title: String,
    pub image: Option<String>,
    pub base_price: Naira,
    pub customizations: SelectionMap,
    pub delivery: SelectionMap,
    pub consultation: Option<Consultation>,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

impl NewLineItem {
    /// Copies the current store contents; later edits to the stores do not reach the line.
    pub fn from_selections(
        product: &Product,
        customization: &CustomizationStore,
        delivery: &DeliveryStore,
        consultation: &ConsultationStore,
        quantity: u32,
    ) -> Self {
        let base_price = customization.parent().map(|p| p.base_price).unwrap_or_else(|| product.base_price());
        Self {
            product_id: product.id().to_string(),
            title: product.title().to_string(),
            image: product.image().map(str::to_string),
            base_price,
            customizations: customization.selected_options().clone(),
            delivery: delivery.selected_options().clone(),
            consultation: consultation.selection().consultation().cloned(),
            quantity,
        }
    }
}

impl From<&CartLineItem> for NewLineItem {
    fn from(line: &CartLineItem) -> Self {
        Self {
            product_id: line.product_id.clone(), title: line.title.clone(), image: line.image.clone(),
            base_price: line.base_price, customizations: line.customizations.clone(), delivery: line.delivery.clone(),
            consultation: line.consultation.clone(), quantity: line.quantity.value(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartLineItem>,
    remote_total: Option<Naira>,
    updated_at: Option<DateTime<Utc>>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rehydrates persisted lines without raising events.
    pub fn from_items(items: Vec<CartLineItem>) -> Self { Self { items, ..Self::default() } }

    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity.value()).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn remote_total(&self) -> Option<Naira> { self.remote_total }
    pub fn updated_at(&self) -> Option<DateTime<Utc>> { self.updated_at }
    pub fn line(&self, line_id: Uuid) -> Option<&CartLineItem> { self.items.iter().find(|i| i.line_id == line_id) }
    pub fn local_items(&self) -> impl Iterator<Item = &CartLineItem> { self.items.iter().filter(|i| !i.source.is_remote()) }

    /// Identical local configurations merge into one line; anything else is appended.
    /// A remote line the backend already knows replaces its earlier mirror.
    pub fn add_item(&mut self, item: CartLineItem) -> Uuid {
        let existing = match &item.source {
            LineSource::Remote { cart_item_id } => self.items.iter_mut().find(|i| i.source.cart_item_id() == Some(cart_item_id.as_str())),
            LineSource::Local => self.items.iter_mut().find(|i| !i.source.is_remote() && i.same_configuration(&item)),
        };
        let (line_id, quantity) = match existing {
            Some(line) => {
                if line.source.is_remote() {
                    let line_id = line.line_id;
                    *line = CartLineItem { line_id, ..item };
                } else {
                    line.quantity = line.quantity.add(item.quantity);
                }
                let (line_id, quantity) = (line.line_id, line.quantity);
                self.raise_event(DomainEvent::Cart(CartEvent::QuantityChanged { line_id, quantity }));
                (line_id, quantity)
            }
            None => {
                let (line_id, quantity) = (item.line_id, item.quantity);
                self.raise_event(DomainEvent::Cart(CartEvent::ItemAdded { line_id, product_id: item.product_id.clone(), quantity }));
                self.items.push(item);
                (line_id, quantity)
            }
        };
        tracing::debug!(%line_id, quantity = quantity.value(), "cart line added");
        self.touch();
        line_id
    }

    pub fn set_quantity(&mut self, line_id: Uuid, quantity: Quantity) -> Result<(), CartError> {
        let line = self.items.iter_mut().find(|i| i.line_id == line_id).ok_or(CartError::LineNotFound)?;
        if line.quantity == quantity { return Ok(()); }
        line.quantity = quantity;
        self.raise_event(DomainEvent::Cart(CartEvent::QuantityChanged { line_id, quantity }));
        self.touch();
        Ok(())
    }

    pub fn increment(&mut self, line_id: Uuid) -> Result<Quantity, CartError> {
        let next = self.line(line_id).ok_or(CartError::LineNotFound)?.quantity.increment();
        self.set_quantity(line_id, next)?;
        Ok(next)
    }

    /// Returns `None`, leaving the line alone, when it is already at 1.
    pub fn decrement(&mut self, line_id: Uuid) -> Result<Option<Quantity>, CartError> {
        let Some(next) = self.line(line_id).ok_or(CartError::LineNotFound)?.quantity.decrement() else { return Ok(None) };
        self.set_quantity(line_id, next)?;
        Ok(Some(next))
    }

    pub fn remove_line(&mut self, line_id: Uuid) -> Result<CartLineItem, CartError> {
        let idx = self.items.iter().position(|i| i.line_id == line_id).ok_or(CartError::LineNotFound)?;
        let removed = self.items.remove(idx);
        self.raise_event(DomainEvent::Cart(CartEvent::ItemRemoved { line_id, product_id: removed.product_id.clone() }));
        self.touch();
        Ok(removed)
    }

    /// Removes every line of a product, whatever its customization.
    pub fn remove_product(&mut self, product_id: &str) -> Vec<CartLineItem> {
        let ids: Vec<Uuid> = self.items.iter().filter(|i| i.product_id == product_id).map(|i| i.line_id).collect();
        ids.into_iter().filter_map(|id| self.remove_line(id).ok()).collect()
    }

    /// Installs the backend's view: remote lines in server order, then any
    /// lines still local (added before sign-in).
    pub fn replace_remote_lines(&mut self, remote: Vec<CartLineItem>, total: Naira) {
        let mut merged = Vec::with_capacity(remote.len() + self.items.len());
        for mut line in remote {
            if let Some(previous) = self.items.iter().find(|i| i.source.is_remote() && i.source == line.source) {
                line.line_id = previous.line_id;
            }
            merged.push(line);
        }
        let remote_count = merged.len();
        merged.extend(self.items.drain(..).filter(|i| !i.source.is_remote()));
        self.items = merged;
        self.remote_total = Some(total);
        self.raise_event(DomainEvent::Cart(CartEvent::RemoteSynced { items: remote_count, total }));
        self.touch();
    }

    /// Drops every server-backed line, e.g. when the session expires.
    pub fn drop_remote_lines(&mut self) {
        self.items.retain(|i| !i.source.is_remote());
        self.remote_total = None;
        self.touch();
    }

    /// The backend total no longer matches the lines until the next fetch.
    pub fn invalidate_remote_total(&mut self) { self.remote_total = None; }

    pub fn clear(&mut self) {
        self.items.clear();
        self.remote_total = None;
        self.raise_event(DomainEvent::Cart(CartEvent::Cleared));
        self.touch();
    }

    pub fn clear_local(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.source.is_remote());
        let cleared = before - self.items.len();
        if cleared > 0 { self.raise_event(DomainEvent::Cart(CartEvent::Cleared)); self.touch(); }
        cleared
    }

    /// Each distinct consultation type is one booking, charged once per cart.
    pub fn consultation_total(&self) -> Naira {
        let mut seen = HashSet::new();
        self.items.iter()
            .filter_map(|i| i.consultation.as_ref())
            .filter(|c| seen.insert(c.kind.as_str()))
            .map(|c| c.price)
            .sum()
    }

    /// Client-side cart total: line totals times quantity, plus consultations.
    pub fn subtotal(&self) -> Naira {
        self.items.iter().map(CartLineItem::line_total).sum::<Naira>() + self.consultation_total()
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Some(Utc::now()); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { LineNotFound, InvalidItem(String) }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::LineNotFound => write!(f, "Cart line not found"), Self::InvalidItem(msg) => write!(f, "Invalid cart item: {}", msg) }
    }
}

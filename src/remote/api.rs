//! Backend cart API contract and wire types.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use super::ApiError;
use crate::domain::aggregates::{CartLineItem, LineSource, NewLineItem};
use crate::domain::selection::{Consultation, SelectionMap};
use crate::domain::value_objects::{Naira, Quantity};

/// Every backend response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> { pub data: T }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartItem {
    pub id: String,
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
}

impl RemoteCartItem {
    /// Mirrors the server line. The server's prices are kept as sent.
    pub fn into_line(self) -> CartLineItem {
        CartLineItem {
            line_id: Uuid::new_v4(), product_id: self.product_id, title: self.title, image: self.image,
            base_price: self.base_price, customizations: self.customizations, customization_total: self.customization_total,
            delivery: self.delivery, delivery_total: self.delivery_total, total_price: self.total_price,
            quantity: self.quantity, consultation: self.consultation,
            source: LineSource::Remote { cart_item_id: self.id },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    #[serde(default)]
    pub total_price: Naira,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationBooking {
    #[validate(length(min = 1))]
    pub consultation_type: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    pub preferred_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Where to send the shopper to pay for a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRedirect { pub authorization_url: String }

#[derive(Debug, Serialize)]
pub(crate) struct QuantityUpdate { pub quantity: u32 }

/// The backend cart. Paths and auth are the implementation's concern.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn fetch_cart(&self) -> Result<RemoteCart, ApiError>;
    async fn add_cart_item(&self, item: &NewLineItem) -> Result<RemoteCartItem, ApiError>;
    async fn update_cart_item(&self, cart_item_id: &str, quantity: u32) -> Result<RemoteCartItem, ApiError>;
    async fn remove_cart_item(&self, cart_item_id: &str) -> Result<(), ApiError>;
    async fn book_consultation(&self, booking: &ConsultationBooking) -> Result<BookingRedirect, ApiError>;
}

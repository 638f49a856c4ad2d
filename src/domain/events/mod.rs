//! Domain events
use crate::domain::value_objects::{Naira, Quantity};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { line_id: Uuid, product_id: String, quantity: Quantity },
    QuantityChanged { line_id: Uuid, quantity: Quantity },
    ItemRemoved { line_id: Uuid, product_id: String },
    Cleared,
    RemoteSynced { items: usize, total: Naira },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutEvent {
    PaymentRequested { reference: String, amount: Naira },
    Completed { cleared_items: usize },
}

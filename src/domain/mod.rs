//! Storefront domain: selections, pricing, cart, checkout.
pub mod aggregates;
pub mod events;
pub mod pricing;
pub mod selection;
pub mod value_objects;

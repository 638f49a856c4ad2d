//! Aggregates module
pub mod product;
pub mod checkout;
pub mod cart;
pub mod wishlist;

pub use product::{DeliveryAxis, Product, ProductStatus};
pub use checkout::{CheckoutError, CheckoutSummary, PaymentRequest, SummaryLine};
pub use cart::{Cart, CartError, CartLineItem, LineSource, NewLineItem};
pub use wishlist::{Wishlist, WishlistItem};

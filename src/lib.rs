//! Storefront cart and pricing
//!
//! Cart, pricing and checkout reconciliation for a hair and wig storefront.
//!
//! ## Features
//! - Customization, delivery and consultation selection stores
//! - Price breakdown aggregation
//! - Guest cart with versioned durable storage
//! - Signed-in cart mirrored against the backend cart API
//! - Checkout summary and payment hand-off
//! - Cloudinary signed media deletion

pub mod cloudinary;
pub mod config;
pub mod domain;
pub mod remote;
pub mod routes;
pub mod storage;

pub use config::{CloudinaryConfig, StorefrontConfig};
pub use domain::aggregates::{Cart, CartLineItem, CheckoutSummary, LineSource, NewLineItem, Product};
pub use domain::pricing::{compute_breakdown, PriceBreakdown};
pub use domain::value_objects::{Naira, Quantity, SelectionOption};
pub use remote::{ApiError, CartApi, CartSession, HttpCartApi};

use domain::aggregates::{CartError, CheckoutError};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Coarse failure class shown to the shopper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; shown next to the offending field.
    Validation,
    /// Backend unreachable or failing; shown with a retry affordance.
    Network,
    /// Not signed in. `expired` sessions are signed out globally.
    Auth { expired: bool },
    Unknown,
}

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorefrontError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Cart(CartError::InvalidItem(_)) | Self::Checkout(_) => ErrorKind::Validation,
            Self::Api(e) => e.kind(),
            _ => ErrorKind::Unknown,
        }
    }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(errors: validator::ValidationErrors) -> Self { Self::Validation(errors.to_string()) }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

//! Backend cart API and the session that reconciles it with the guest cart.

pub mod api;
pub mod error;
pub mod http;
pub mod session;

pub use api::{BookingRedirect, CartApi, ConsultationBooking, RemoteCart, RemoteCartItem};
pub use error::ApiError;
pub use http::HttpCartApi;
pub use session::CartSession;

//! HTTP client for the backend cart API.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use super::api::{ApiEnvelope, BookingRedirect, CartApi, ConsultationBooking, QuantityUpdate, RemoteCart, RemoteCartItem};
use super::ApiError;
use crate::domain::aggregates::NewLineItem;
use crate::{ErrorKind, StorefrontConfig};

/// `reqwest` implementation of [`CartApi`].
///
/// The bearer token can be swapped at any time; requests without one go out
/// anonymous and the backend decides what that means.
#[derive(Debug)]
pub struct HttpCartApi {
    client: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpCartApi {
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.api_base_url, config.request_timeout_secs)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ApiError::new(ErrorKind::Unknown, format!("invalid base URL '{}': {}", base_url, e)))?;
        Ok(Self { client, base_url, token: RwLock::new(None) })
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn has_token(&self) -> bool { self.token.read().unwrap_or_else(PoisonError::into_inner).is_some() }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(ErrorKind::Unknown, format!("base URL '{}' cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let mut request = self.client.request(method, self.endpoint(segments)?);
        if let Some(token) = self.token.read().unwrap_or_else(PoisonError::into_inner).as_deref() {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(request.send().await?).await?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() { return Ok(response); }
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status, &body);
        tracing::debug!(status = status.as_u16(), error = %err, "cart API request failed");
        Err(err)
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn fetch_cart(&self) -> Result<RemoteCart, ApiError> {
        Self::send(self.request(Method::GET, &["cart"])?).await
    }

    async fn add_cart_item(&self, item: &NewLineItem) -> Result<RemoteCartItem, ApiError> {
        Self::send(self.request(Method::POST, &["cart"])?.json(item)).await
    }

    async fn update_cart_item(&self, cart_item_id: &str, quantity: u32) -> Result<RemoteCartItem, ApiError> {
        Self::send(self.request(Method::PATCH, &["cart", "items", cart_item_id])?.json(&QuantityUpdate { quantity })).await
    }

    async fn remove_cart_item(&self, cart_item_id: &str) -> Result<(), ApiError> {
        Self::check(self.request(Method::DELETE, &["cart", "items", cart_item_id])?.send().await?).await?;
        Ok(())
    }

    async fn book_consultation(&self, booking: &ConsultationBooking) -> Result<BookingRedirect, ApiError> {
        Self::send(self.request(Method::POST, &["consultations", "book"])?.json(booking)).await
    }
}

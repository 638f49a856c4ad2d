//! Cart session: the guest cart, the signed-in mirror of the backend cart,
//! and the per-line routing between them.
//!
//! Each mutation is routed by the line's own [`LineSource`], not by whether
//! the session is signed in: lines added before sign-in stay local until
//! merged, and keep taking the local path meanwhile.
//!
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. Network results are applied only if they are still current:
//! quantity edits carry a per-line monotonically increasing token, and a
//! response for a superseded token is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::api::{BookingRedirect, CartApi, ConsultationBooking, RemoteCart, RemoteCartItem};
use super::{ApiError, HttpCartApi};
use crate::domain::aggregates::{Cart, CartError, CartLineItem, CheckoutSummary, LineSource, NewLineItem, PaymentRequest};
use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::value_objects::{Naira, Quantity};
use crate::storage::{self, FileStore, KeyValueStore, CART_STORAGE_KEY};
use crate::{ErrorKind, Result, StorefrontConfig};

type SharedFetch = Shared<BoxFuture<'static, std::result::Result<RemoteCart, ApiError>>>;

const CART_RESOURCE: &str = "cart";

#[derive(Default)]
struct SessionState {
    cart: Cart,
    authenticated: bool,
    loading: bool,
    error: Option<ApiError>,
    edit_tokens: HashMap<String, u64>,
    next_token: u64,
    /// Bumped whenever the signed-in identity changes; responses from an older epoch are dropped.
    epoch: u64,
    events: Vec<DomainEvent>,
}

impl SessionState {
    fn begin_edit(&mut self, cart_item_id: &str) -> u64 {
        self.next_token += 1;
        self.edit_tokens.insert(cart_item_id.to_string(), self.next_token);
        self.next_token
    }

    fn is_latest_edit(&self, cart_item_id: &str, token: u64) -> bool {
        self.edit_tokens.get(cart_item_id) == Some(&token)
    }

    fn is_current(&self, epoch: u64) -> bool { self.authenticated && self.epoch == epoch }

    fn collect_events(&mut self) {
        let events = self.cart.take_events();
        self.events.extend(events);
    }

    /// Network failures leave the cart as it was. An expired session is signed out.
    fn record_failure(&mut self, err: &ApiError) {
        warn!(kind = ?err.kind(), status = ?err.status(), error = %err, "cart request failed");
        if err.is_session_expired() {
            self.authenticated = false;
            self.epoch += 1;
            self.cart.drop_remote_lines();
            self.edit_tokens.clear();
        }
        self.error = Some(err.clone());
    }
}

fn signed_out() -> ApiError { ApiError::new(ErrorKind::Auth { expired: false }, "The session was signed out before the request completed") }

struct RemoteEdit { cart_item_id: String, token: u64, previous: Quantity, next: Quantity }

#[derive(Clone, Copy)]
enum Step { Increase, Decrease }

pub struct CartSession<A, S>
where
    A: CartApi + 'static,
    S: KeyValueStore + ?Sized,
{
    api: Arc<A>,
    store: Arc<S>,
    state: Mutex<SessionState>,
    in_flight: Mutex<HashMap<&'static str, SharedFetch>>,
}

impl<A, S> CartSession<A, S>
where
    A: CartApi + 'static,
    S: KeyValueStore + ?Sized,
{
    /// Starts a guest session from whatever the store holds.
    pub fn new(api: Arc<A>, store: Arc<S>) -> Self {
        let items: Vec<CartLineItem> = storage::load_items(&*store, CART_STORAGE_KEY);
        let items: Vec<CartLineItem> = items.into_iter().filter(|i| !i.source.is_remote()).collect();
        info!(items = items.len(), "guest cart hydrated");
        Self {
            api,
            store,
            state: Mutex::new(SessionState { cart: Cart::from_items(items), ..SessionState::default() }),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> { self.state.lock().unwrap_or_else(PoisonError::into_inner) }
    fn in_flight(&self) -> MutexGuard<'_, HashMap<&'static str, SharedFetch>> { self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) }

    pub fn items(&self) -> Vec<CartLineItem> { self.state().cart.items().to_vec() }
    pub fn line(&self, line_id: Uuid) -> Option<CartLineItem> { self.state().cart.line(line_id).cloned() }
    pub fn is_authenticated(&self) -> bool { self.state().authenticated }
    pub fn is_loading(&self) -> bool { self.state().loading }
    pub fn remote_total(&self) -> Option<Naira> { self.state().cart.remote_total() }

    /// Last failure, kept until a later request succeeds or it is dismissed.
    pub fn error(&self) -> Option<ApiError> { self.state().error.clone() }
    pub fn dismiss_error(&self) { self.state().error = None; }

    /// Client-computed cart total.
    pub fn cart_total(&self) -> Naira { self.state().cart.subtotal() }

    pub fn checkout_summary(&self) -> CheckoutSummary {
        let state = self.state();
        CheckoutSummary::project(&state.cart, state.authenticated)
    }

    pub fn take_events(&self) -> Vec<DomainEvent> { std::mem::take(&mut self.state().events) }

    // ========== Authentication ==========

    pub async fn sign_in(&self) -> Result<()> {
        {
            let mut state = self.state();
            state.authenticated = true;
            state.epoch += 1;
        }
        self.in_flight().clear();
        info!("cart session signed in");
        self.fetch_cart().await
    }

    pub fn sign_out(&self) {
        {
            let mut state = self.state();
            state.authenticated = false;
            state.epoch += 1;
            state.loading = false;
            state.cart.clear();
            state.edit_tokens.clear();
            state.error = None;
            state.collect_events();
        }
        self.in_flight().clear();
        self.wipe_local_storage();
        info!("cart session signed out");
    }

    // ========== Remote cart ==========

    /// Loads the backend cart. Concurrent callers share one request.
    /// On failure the last-known cart stays in place and the error is kept for a retry.
    pub async fn fetch_cart(&self) -> Result<()> {
        let epoch = {
            let mut state = self.state();
            if !state.authenticated { return Ok(()); }
            state.loading = true;
            state.epoch
        };
        let fetch = self.shared_fetch();
        let result = fetch.clone().await;
        self.release_fetch(&fetch);

        let mut state = self.state();
        if !state.is_current(epoch) {
            debug!(epoch, current = state.epoch, "dropping cart fetched for a previous session");
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(remote) => {
                let total = remote.total_price;
                let lines: Vec<CartLineItem> = remote.items.into_iter().map(RemoteCartItem::into_line).collect();
                debug!(items = lines.len(), total = total.amount(), "remote cart loaded");
                state.cart.replace_remote_lines(lines, total);
                state.error = None;
                state.collect_events();
                Ok(())
            }
            Err(err) => {
                state.record_failure(&err);
                Err(err.into())
            }
        }
    }

    pub async fn retry(&self) -> Result<()> { self.fetch_cart().await }

    fn shared_fetch(&self) -> SharedFetch {
        self.in_flight()
            .entry(CART_RESOURCE)
            .or_insert_with(|| {
                let api = Arc::clone(&self.api);
                async move { api.fetch_cart().await }.boxed().shared()
            })
            .clone()
    }

    fn release_fetch(&self, fetch: &SharedFetch) {
        let mut in_flight = self.in_flight();
        if in_flight.get(CART_RESOURCE).is_some_and(|current| current.ptr_eq(fetch)) {
            in_flight.remove(CART_RESOURCE);
        }
    }

    // ========== Mutations ==========

    pub async fn add_to_cart(&self, item: NewLineItem) -> Result<Uuid> {
        item.validate()?;
        if !self.is_authenticated() {
            let line = CartLineItem::snapshot(item, LineSource::Local)?;
            let mut state = self.state();
            let line_id = state.cart.add_item(line);
            state.collect_events();
            self.persist(&state);
            return Ok(line_id);
        }

        let epoch = self.state().epoch;
        let remote = match self.api.add_cart_item(&item).await {
            Ok(remote) => remote,
            Err(err) => {
                self.state().record_failure(&err);
                return Err(err.into());
            }
        };
        let line_id = {
            let mut state = self.state();
            if !state.is_current(epoch) {
                return Err(signed_out().into());
            }
            let line_id = state.cart.add_item(remote.into_line());
            state.cart.invalidate_remote_total();
            state.error = None;
            state.collect_events();
            line_id
        };
        if let Err(e) = self.fetch_cart().await {
            debug!(error = %e, "refresh after add failed, keeping mirrored line");
        }
        Ok(line_id)
    }

    pub async fn increase_quantity(&self, line_id: Uuid) -> Result<()> { self.change_quantity(line_id, Step::Increase).await }

    /// No-op when the line is already at quantity 1.
    pub async fn decrease_quantity(&self, line_id: Uuid) -> Result<()> { self.change_quantity(line_id, Step::Decrease).await }

    async fn change_quantity(&self, line_id: Uuid, step: Step) -> Result<()> {
        let edit = {
            let mut state = self.state();
            let line = state.cart.line(line_id).ok_or(CartError::LineNotFound)?;
            let previous = line.quantity;
            let next = match step {
                Step::Increase => previous.increment(),
                Step::Decrease => match previous.decrement() {
                    Some(next) => next,
                    None => return Ok(()),
                },
            };
            match line.source.clone() {
                LineSource::Local => {
                    state.cart.set_quantity(line_id, next)?;
                    state.collect_events();
                    self.persist(&state);
                    return Ok(());
                }
                LineSource::Remote { cart_item_id } => {
                    let token = state.begin_edit(&cart_item_id);
                    state.cart.set_quantity(line_id, next)?;
                    state.cart.invalidate_remote_total();
                    state.collect_events();
                    RemoteEdit { cart_item_id, token, previous, next }
                }
            }
        };

        let result = self.api.update_cart_item(&edit.cart_item_id, edit.next.value()).await;

        let needs_refresh = {
            let mut state = self.state();
            if !state.is_latest_edit(&edit.cart_item_id, edit.token) {
                debug!(cart_item_id = %edit.cart_item_id, token = edit.token, "dropping response for superseded quantity edit");
                return Ok(());
            }
            match result {
                Ok(_) if state.cart.line(line_id).is_none() => false,
                Ok(remote) if remote.id == edit.cart_item_id && remote.quantity == edit.next => {
                    state.cart.add_item(remote.into_line());
                    state.cart.invalidate_remote_total();
                    state.error = None;
                    state.collect_events();
                    false
                }
                Ok(remote) => {
                    warn!(cart_item_id = %edit.cart_item_id, expected = edit.next.value(), actual = remote.quantity.value(), "backend disagrees with quantity edit, refreshing");
                    true
                }
                Err(err) => {
                    if state.cart.line(line_id).is_some() {
                        state.cart.set_quantity(line_id, edit.previous)?;
                    }
                    state.collect_events();
                    state.record_failure(&err);
                    return Err(err.into());
                }
            }
        };
        if needs_refresh { self.fetch_cart().await?; }
        Ok(())
    }

    pub async fn remove_line(&self, line_id: Uuid) -> Result<()> {
        let cart_item_id = {
            let mut state = self.state();
            let source = state.cart.line(line_id).ok_or(CartError::LineNotFound)?.source.clone();
            match source {
                LineSource::Local => {
                    state.cart.remove_line(line_id)?;
                    state.collect_events();
                    self.persist(&state);
                    return Ok(());
                }
                LineSource::Remote { cart_item_id } => cart_item_id,
            }
        };

        if let Err(err) = self.api.remove_cart_item(&cart_item_id).await {
            self.state().record_failure(&err);
            return Err(err.into());
        }
        let mut state = self.state();
        state.edit_tokens.remove(&cart_item_id);
        if state.cart.line(line_id).is_some() {
            state.cart.remove_line(line_id)?;
        }
        state.cart.invalidate_remote_total();
        state.error = None;
        state.collect_events();
        Ok(())
    }

    /// Removes every line of `product_id`, local and remote. Returns how many went.
    pub async fn remove_product(&self, product_id: &str) -> Result<usize> {
        let line_ids: Vec<Uuid> = self.state().cart.items().iter().filter(|i| i.product_id == product_id).map(|i| i.line_id).collect();
        for line_id in &line_ids {
            self.remove_line(*line_id).await?;
        }
        Ok(line_ids.len())
    }

    /// Pushes lines added before sign-in to the backend, replacing each with
    /// its server mirror.
    pub async fn merge_guest_items(&self) -> Result<usize> {
        if !self.is_authenticated() { return Ok(0); }
        let (pending, epoch) = {
            let state = self.state();
            (state.cart.local_items().cloned().collect::<Vec<_>>(), state.epoch)
        };
        let mut merged = 0;
        for line in pending {
            let remote = match self.api.add_cart_item(&NewLineItem::from(&line)).await {
                Ok(remote) => remote,
                Err(err) => {
                    self.state().record_failure(&err);
                    return Err(err.into());
                }
            };
            let mut state = self.state();
            if !state.is_current(epoch) { return Err(signed_out().into()); }
            if state.cart.line(line.line_id).is_some() {
                state.cart.remove_line(line.line_id)?;
            }
            state.cart.add_item(remote.into_line());
            state.collect_events();
            self.persist(&state);
            merged += 1;
        }
        if merged > 0 {
            info!(merged, "guest cart merged into account cart");
            self.fetch_cart().await?;
        }
        Ok(merged)
    }

    // ========== Checkout ==========

    /// Summary with a fresh backend total when signed in.
    pub async fn prepare_checkout(&self) -> Result<CheckoutSummary> {
        let stale = { let state = self.state(); state.authenticated && state.cart.remote_total().is_none() };
        if stale { self.fetch_cart().await?; }
        Ok(self.checkout_summary())
    }

    pub fn initiate_payment(&self, email: impl Into<String>) -> Result<PaymentRequest> {
        let request = self.checkout_summary().payment_request(email)?;
        info!(reference = %request.reference, amount = request.amount.amount(), "payment requested");
        self.state().events.push(DomainEvent::Checkout(CheckoutEvent::PaymentRequested { reference: request.reference.clone(), amount: request.amount }));
        Ok(request)
    }

    /// Clears the local cart and its stored copy regardless of sign-in state.
    /// When signed in, the backend cart is re-read to confirm order creation emptied it.
    pub async fn complete_checkout(&self) -> Result<usize> {
        let (cleared, authenticated) = {
            let mut state = self.state();
            let cleared = state.cart.clear_local();
            state.collect_events();
            state.events.push(DomainEvent::Checkout(CheckoutEvent::Completed { cleared_items: cleared }));
            (cleared, state.authenticated)
        };
        self.wipe_local_storage();
        if authenticated {
            self.fetch_cart().await?;
            let leftover = self.state().cart.items().iter().filter(|i| i.source.is_remote()).count();
            if leftover > 0 {
                warn!(leftover, "backend cart still holds items after checkout");
            }
        }
        info!(cleared, "checkout completed");
        Ok(cleared)
    }

    pub async fn book_consultation(&self, booking: ConsultationBooking) -> Result<BookingRedirect> {
        booking.validate()?;
        match self.api.book_consultation(&booking).await {
            Ok(redirect) => {
                info!(consultation = %booking.consultation_type, "consultation booked, redirecting to payment");
                Ok(redirect)
            }
            Err(err) => {
                self.state().record_failure(&err);
                Err(err.into())
            }
        }
    }

    // ========== Storage ==========

    fn persist(&self, state: &SessionState) {
        let local: Vec<&CartLineItem> = state.cart.local_items().collect();
        if let Err(e) = storage::save_items(&*self.store, CART_STORAGE_KEY, &local) {
            warn!(error = %e, "failed to persist guest cart");
        }
    }

    fn wipe_local_storage(&self) {
        if let Err(e) = self.store.remove(CART_STORAGE_KEY) {
            warn!(error = %e, "failed to clear stored cart");
        }
    }
}

impl CartSession<HttpCartApi, FileStore> {
    /// Session against the configured backend, persisting under `storage_dir`.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self> {
        let api = HttpCartApi::from_config(config)?;
        let store = FileStore::new(config.storage_dir.clone())?;
        info!(api = %config.api_base_url, storage = %config.storage_dir.display(), "cart session configured");
        Ok(Self::new(Arc::new(api), Arc::new(store)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::domain::selection::SelectionMap;
    use crate::domain::value_objects::SelectionOption;
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct FakeApi {
        items: Mutex<Vec<RemoteCartItem>>,
        fetches: AtomicUsize,
        next_id: AtomicUsize,
        fail_next: Mutex<Option<ApiError>>,
        fail_update: Mutex<Option<ApiError>>,
        /// Milliseconds to hold each successive update response back.
        update_delays: Mutex<VecDeque<u64>>,
    }

    impl FakeApi {
        fn fail_next(&self, err: ApiError) { *self.fail_next.lock().unwrap() = Some(err); }
        fn fail_update(&self, err: ApiError) { *self.fail_update.lock().unwrap() = Some(err); }
        fn delay_updates(&self, delays: &[u64]) { self.update_delays.lock().unwrap().extend(delays); }
        fn quantity_of(&self, id: &str) -> Option<u32> {
            self.items.lock().unwrap().iter().find(|i| i.id == id).map(|i| i.quantity.value())
        }
        fn take_failure(&self) -> std::result::Result<(), ApiError> {
            match self.fail_next.lock().unwrap().take() { Some(err) => Err(err), None => Ok(()) }
        }
        fn seed(&self, id: &str, product_id: &str, price: u64, quantity: u32) {
            self.items.lock().unwrap().push(RemoteCartItem {
                id: id.into(), product_id: product_id.into(), title: "Body Wave".into(), image: None,
                base_price: Naira::new(price), customizations: SelectionMap::new(), customization_total: Naira::ZERO,
                delivery: SelectionMap::new(), delivery_total: Naira::ZERO, total_price: Naira::new(price),
                quantity: Quantity::new(quantity).unwrap(), consultation: None,
            });
        }
    }

    #[async_trait::async_trait]
    impl CartApi for FakeApi {
        async fn fetch_cart(&self) -> std::result::Result<RemoteCart, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.take_failure()?;
            let items = self.items.lock().unwrap().clone();
            let total_price = items.iter().map(|i| i.total_price.multiply(i.quantity.value())).sum();
            Ok(RemoteCart { items, total_price })
        }

        async fn add_cart_item(&self, item: &NewLineItem) -> std::result::Result<RemoteCartItem, ApiError> {
            self.take_failure()?;
            let id = format!("ci_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let line = CartLineItem::snapshot(item.clone(), LineSource::Remote { cart_item_id: id.clone() }).unwrap();
            let remote = RemoteCartItem {
                id, product_id: line.product_id, title: line.title, image: line.image, base_price: line.base_price,
                customizations: line.customizations, customization_total: line.customization_total,
                delivery: line.delivery, delivery_total: line.delivery_total, total_price: line.total_price,
                quantity: line.quantity, consultation: line.consultation,
            };
            self.items.lock().unwrap().push(remote.clone());
            Ok(remote)
        }

        async fn update_cart_item(&self, cart_item_id: &str, quantity: u32) -> std::result::Result<RemoteCartItem, ApiError> {
            let delay = self.update_delays.lock().unwrap().pop_front().unwrap_or(0);
            let failure = self.fail_update.lock().unwrap().take();
            let outcome = match failure {
                Some(err) => Err(err),
                None => self.take_failure().and_then(|()| {
                    let mut items = self.items.lock().unwrap();
                    let item = items.iter_mut().find(|i| i.id == cart_item_id).ok_or_else(|| ApiError::new(ErrorKind::Unknown, "not found"))?;
                    item.quantity = Quantity::new(quantity).unwrap();
                    Ok(item.clone())
                }),
            };
            if delay > 0 { tokio::time::sleep(Duration::from_millis(delay)).await; }
            outcome
        }

        async fn remove_cart_item(&self, cart_item_id: &str) -> std::result::Result<(), ApiError> {
            self.take_failure()?;
            self.items.lock().unwrap().retain(|i| i.id != cart_item_id);
            Ok(())
        }

        async fn book_consultation(&self, _booking: &ConsultationBooking) -> std::result::Result<BookingRedirect, ApiError> {
            self.take_failure()?;
            Ok(BookingRedirect { authorization_url: "https://checkout.paystack.com/abc".into() })
        }
    }

    fn new_item(product_id: &str, base: u64, length: &str, length_price: u64) -> NewLineItem {
        let mut customizations = SelectionMap::new();
        customizations.select("Length", SelectionOption::new(length, Naira::new(length_price)));
        NewLineItem {
            product_id: product_id.into(), title: "Bone Straight".into(), image: None, base_price: Naira::new(base),
            customizations, delivery: SelectionMap::new(), consultation: None, quantity: 1,
        }
    }

    fn session(api: Arc<FakeApi>, store: Arc<MemoryStore>) -> CartSession<FakeApi, MemoryStore> { CartSession::new(api, store) }

    fn expired() -> ApiError {
        ApiError::from_response(reqwest::StatusCode::UNAUTHORIZED, r#"{"message":"Session expired"}"#)
    }

    #[tokio::test]
    async fn test_guest_lines_persist_across_sessions() {
        let store = Arc::new(MemoryStore::new());
        let first = session(Arc::new(FakeApi::default()), Arc::clone(&store));
        first.add_to_cart(new_item("A", 50_000, "16 inches", 10_000)).await.unwrap();
        first.add_to_cart(new_item("A", 50_000, "20 inches", 30_000)).await.unwrap();
        assert_eq!(first.items().len(), 2);

        let second = session(Arc::new(FakeApi::default()), store);
        let items = second.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].customizations.get("Length").unwrap().label, "20 inches");
        assert_eq!(second.cart_total(), Naira::new(140_000));
    }

    #[tokio::test]
    async fn test_guest_quantity_floor() {
        let s = session(Arc::new(FakeApi::default()), Arc::new(MemoryStore::new()));
        let id = s.add_to_cart(new_item("A", 50_000, "16 inches", 10_000)).await.unwrap();
        s.increase_quantity(id).await.unwrap();
        s.decrease_quantity(id).await.unwrap();
        s.decrease_quantity(id).await.unwrap();
        assert_eq!(s.line(id).unwrap().quantity, Quantity::ONE);
    }

    #[tokio::test]
    async fn test_remote_increase_routes_by_cart_item_id() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 2);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();
        let line_id = s.items()[0].line_id;

        s.increase_quantity(line_id).await.unwrap();
        assert_eq!(api.items.lock().unwrap()[0].quantity.value(), 3);
        assert_eq!(s.line(line_id).unwrap().quantity.value(), 3);
        assert!(s.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_update_reverts_quantity() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 2);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();
        let line_id = s.items()[0].line_id;

        api.fail_next(ApiError::from_response(reqwest::StatusCode::BAD_REQUEST, r#"{"message":"Quantity exceeds stock"}"#));
        assert!(s.increase_quantity(line_id).await.is_err());
        assert_eq!(s.line(line_id).unwrap().quantity.value(), 2);
        assert_eq!(s.error().unwrap().message(), "Quantity exceeds stock");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_last_cart_until_retry() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 1);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();

        api.fail_next(ApiError::from_response(reqwest::StatusCode::SERVICE_UNAVAILABLE, ""));
        assert!(s.fetch_cart().await.is_err());
        assert_eq!(s.items().len(), 1);
        assert_eq!(s.error().unwrap().kind(), ErrorKind::Network);
        assert!(!s.is_loading());

        s.retry().await.unwrap();
        assert!(s.error().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_request() {
        let api = Arc::new(FakeApi::default());
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.state().authenticated = true;
        let (a, b) = tokio::join!(s.fetch_cart(), s.fetch_cart());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
        s.fetch_cart().await.unwrap();
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_session_signs_out() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 1);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();

        api.fail_next(expired());
        assert!(s.fetch_cart().await.is_err());
        assert!(!s.is_authenticated());
        assert!(s.items().is_empty());
        assert!(s.error().unwrap().is_session_expired());
    }

    #[tokio::test]
    async fn test_remove_product_removes_every_configuration() {
        let s = session(Arc::new(FakeApi::default()), Arc::new(MemoryStore::new()));
        s.add_to_cart(new_item("A", 50_000, "16 inches", 10_000)).await.unwrap();
        s.add_to_cart(new_item("A", 50_000, "20 inches", 30_000)).await.unwrap();
        s.add_to_cart(new_item("B", 40_000, "12 inches", 0)).await.unwrap();
        assert_eq!(s.remove_product("A").await.unwrap(), 2);
        assert_eq!(s.items().len(), 1);
    }

    #[tokio::test]
    async fn test_guest_items_merge_on_sign_in() {
        let api = Arc::new(FakeApi::default());
        let store = Arc::new(MemoryStore::new());
        let s = session(Arc::clone(&api), Arc::clone(&store));
        s.add_to_cart(new_item("A", 50_000, "16 inches", 10_000)).await.unwrap();
        s.sign_in().await.unwrap();
        assert!(!s.items()[0].source.is_remote());

        assert_eq!(s.merge_guest_items().await.unwrap(), 1);
        let items = s.items();
        assert_eq!(items.len(), 1);
        assert!(items[0].source.is_remote());
        assert_eq!(s.checkout_summary().total(), Naira::new(60_000));
        assert!(storage::load_items::<_, CartLineItem>(&*store, CART_STORAGE_KEY).is_empty());
    }

    #[tokio::test]
    async fn test_complete_checkout_wipes_storage() {
        let store = Arc::new(MemoryStore::new());
        let s = session(Arc::new(FakeApi::default()), Arc::clone(&store));
        s.add_to_cart(new_item("A", 50_000, "16 inches", 10_000)).await.unwrap();
        let request = s.initiate_payment("ada@example.com").unwrap();
        assert_eq!(request.amount, Naira::new(60_000));

        assert_eq!(s.complete_checkout().await.unwrap(), 1);
        assert!(s.items().is_empty());
        assert!(store.read(CART_STORAGE_KEY).unwrap().is_none());
        let events = s.take_events();
        assert!(events.iter().any(|e| matches!(e, DomainEvent::Checkout(CheckoutEvent::Completed { cleared_items: 1 }))));
    }

    #[tokio::test]
    async fn test_superseded_quantity_response_is_dropped() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 2);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();
        let line_id = s.items()[0].line_id;

        // The first edit (to 3) answers after the second (to 4).
        api.delay_updates(&[60, 0]);
        let (first, second) = tokio::join!(s.increase_quantity(line_id), s.increase_quantity(line_id));
        assert!(first.is_ok() && second.is_ok());

        assert_eq!(s.line(line_id).unwrap().quantity.value(), 4);
        assert_eq!(api.quantity_of("x"), Some(4));
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_pending_edit_revertible() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 2);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();
        let line_id = s.items()[0].line_id;

        api.delay_updates(&[60]);
        api.fail_update(ApiError::from_response(reqwest::StatusCode::BAD_REQUEST, r#"{"message":"Quantity exceeds stock"}"#));
        api.fail_next(ApiError::from_response(reqwest::StatusCode::SERVICE_UNAVAILABLE, ""));
        let (increased, removed) = tokio::join!(s.increase_quantity(line_id), s.remove_line(line_id));
        assert!(increased.is_err() && removed.is_err());

        assert_eq!(s.line(line_id).unwrap().quantity.value(), 2);
        assert_eq!(api.quantity_of("x"), Some(2));
    }

    #[tokio::test]
    async fn test_fetch_landing_after_sign_out_is_dropped() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 1);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();

        let (fetched, ()) = tokio::join!(s.fetch_cart(), async { s.sign_out() });
        assert!(fetched.is_ok());
        assert!(!s.is_authenticated());
        assert!(!s.is_loading());
        assert!(s.items().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_again_fetches_fresh_cart() {
        let api = Arc::new(FakeApi::default());
        api.seed("x", "bob-10", 45_000, 1);
        let s = session(Arc::clone(&api), Arc::new(MemoryStore::new()));
        s.sign_in().await.unwrap();
        s.sign_out();
        s.sign_in().await.unwrap();
        assert_eq!(s.items().len(), 1);
        assert!(s.items()[0].source.is_remote());
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_pay() {
        let s = session(Arc::new(FakeApi::default()), Arc::new(MemoryStore::new()));
        assert!(s.initiate_payment("ada@example.com").is_err());
    }
}

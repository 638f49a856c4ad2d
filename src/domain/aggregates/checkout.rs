//! Checkout summary
//!
//! Read-only projection of a cart for the checkout page and the hand-off to
//! payment initiation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::{Cart, CartLineItem};
use crate::domain::pricing::{compute_breakdown, PriceBreakdown};
use crate::domain::value_objects::Naira;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLine { pub line_id: Uuid, pub title: String, pub quantity: u32, pub unit_price: Naira, pub line_total: Naira, pub consultation: Option<String> }

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    lines: Vec<SummaryLine>,
    breakdown: PriceBreakdown,
    client_total: Naira,
    remote_total: Option<Naira>,
    authenticated: bool,
}

/// Payment initiation request handed to the payment provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(email)]
    pub email: String,
    pub amount: Naira,
    #[validate(length(min = 1))]
    pub reference: String,
}

impl CheckoutSummary {
    pub fn project(cart: &Cart, authenticated: bool) -> Self {
        let lines = cart.items().iter().map(|i| SummaryLine {
            line_id: i.line_id, title: i.title.clone(), quantity: i.quantity.value(), unit_price: i.total_price,
            line_total: i.line_total(), consultation: i.consultation.as_ref().map(|c| c.kind.clone()),
        }).collect();
        let breakdown = compute_breakdown(
            sum_per_unit(cart, |i| i.base_price),
            sum_per_unit(cart, |i| i.customization_total),
            sum_per_unit(cart, |i| i.delivery_total),
            cart.consultation_total(),
            true,
        );
        Self { lines, breakdown, client_total: cart.subtotal(), remote_total: cart.remote_total(), authenticated }
    }

    pub fn lines(&self) -> &[SummaryLine] { &self.lines }
    pub fn breakdown(&self) -> &PriceBreakdown { &self.breakdown }
    pub fn client_total(&self) -> Naira { self.client_total }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Whether [`total`](Self::total) comes from the backend.
    pub fn is_authoritative(&self) -> bool { self.authenticated && self.remote_total.is_some() }

    /// The backend may apply discounts or taxes the client cannot see, so its
    /// total wins when signed in. Guests get the client sum.
    pub fn total(&self) -> Naira {
        match (self.authenticated, self.remote_total) {
            (true, Some(total)) => total,
            _ => self.client_total,
        }
    }

    pub fn payment_request(&self, email: impl Into<String>) -> Result<PaymentRequest, CheckoutError> {
        if self.is_empty() { return Err(CheckoutError::EmptyCart); }
        let request = PaymentRequest {
            email: email.into(),
            amount: self.total(),
            reference: format!("SF-{}", Uuid::new_v4().simple()),
        };
        request.validate().map_err(|e| CheckoutError::InvalidPayment(e.to_string()))?;
        Ok(request)
    }
}

fn sum_per_unit(cart: &Cart, price: impl Fn(&CartLineItem) -> Naira) -> Naira {
    cart.items().iter().map(|i| price(i).multiply(i.quantity.value())).sum()
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CheckoutError { EmptyCart, InvalidPayment(String) }
impl std::error::Error for CheckoutError {}
impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::EmptyCart => write!(f, "Cart is empty"), Self::InvalidPayment(msg) => write!(f, "Invalid payment request: {}", msg) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{LineSource, NewLineItem};
    use crate::domain::selection::{Consultation, SelectionMap};
    use crate::domain::value_objects::SelectionOption;

    fn cart_with_item() -> Cart {
        let mut customizations = SelectionMap::new();
        customizations.select("Length", SelectionOption::new("16 inches", Naira::new(10_000)));
        customizations.select("Color", SelectionOption::new("Blonde", Naira::new(10_000)));
        let item = NewLineItem {
            product_id: "A".into(), title: "Body Wave".into(), image: None, base_price: Naira::new(50_000),
            customizations, delivery: SelectionMap::new(),
            consultation: Some(Consultation::new("Virtual", Naira::new(120_000))), quantity: 1,
        };
        let mut cart = Cart::new();
        cart.add_item(CartLineItem::snapshot(item, LineSource::Local).unwrap());
        cart
    }

    #[test]
    fn test_summary_includes_consultation() {
        let summary = CheckoutSummary::project(&cart_with_item(), false);
        assert_eq!(summary.total(), Naira::new(190_000));
        assert_eq!(summary.breakdown().total_price, summary.client_total());
        assert_eq!(summary.breakdown().consultation_price, Naira::new(120_000));
        assert!(summary.breakdown().has_customization);
        assert_eq!(summary.lines()[0].unit_price, Naira::new(70_000));
    }

    #[test]
    fn test_remote_total_preferred_when_authenticated() {
        let mut cart = cart_with_item();
        cart.replace_remote_lines(vec![], Naira::new(171_000));
        let signed_in = CheckoutSummary::project(&cart, true);
        assert_eq!(signed_in.total(), Naira::new(171_000));
        assert!(signed_in.is_authoritative());
        let guest = CheckoutSummary::project(&cart, false);
        assert_eq!(guest.total(), Naira::new(190_000));
        assert!(!guest.is_authoritative());
    }

    #[test]
    fn test_payment_request() {
        let summary = CheckoutSummary::project(&cart_with_item(), false);
        let req = summary.payment_request("ada@example.com").unwrap();
        assert_eq!(req.amount, Naira::new(190_000));
        assert!(req.reference.starts_with("SF-"));
        assert!(matches!(summary.payment_request("not-an-email"), Err(CheckoutError::InvalidPayment(_))));
        let empty = CheckoutSummary::project(&Cart::new(), false);
        assert_eq!(empty.payment_request("ada@example.com"), Err(CheckoutError::EmptyCart));
    }
}

//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Whole-naira amount. Prices never use kobo, so plain integer addition is exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Naira(u64);

impl Naira {
    pub const ZERO: Naira = Naira(0);

    pub const fn new(amount: u64) -> Self { Self(amount) }
    pub fn amount(&self) -> u64 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
    pub fn multiply(&self, qty: u32) -> Naira { Naira(self.0.saturating_mul(u64::from(qty))) }
}

impl Add for Naira {
    type Output = Naira;
    fn add(self, other: Naira) -> Naira { Naira(self.0.saturating_add(other.0)) }
}

impl Sum for Naira {
    fn sum<I: Iterator<Item = Naira>>(iter: I) -> Naira { iter.fold(Naira::ZERO, Add::add) }
}

impl From<u64> for Naira {
    fn from(amount: u64) -> Self { Self(amount) }
}

impl fmt::Display for Naira {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 { grouped.push(','); }
            grouped.push(ch);
        }
        write!(f, "₦{}", grouped)
    }
}

/// Line quantity. Never below one; a line at zero is a removed line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
    pub fn increment(&self) -> Self { Self(self.0.saturating_add(1)) }

    /// `None` when already at the floor.
    pub fn decrement(&self) -> Option<Self> {
        if self.0 <= 1 { None } else { Some(Self(self.0 - 1)) }
    }
}

impl Default for Quantity { fn default() -> Self { Self::ONE } }

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { Zero }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "quantity must be at least 1") }
}

/// One chooseable value on a customization or delivery axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionOption {
    pub label: String,
    #[serde(default)]
    pub price: Naira,
}

impl SelectionOption {
    pub const NONE_LABEL: &'static str = "None";

    pub fn new(label: impl Into<String>, price: Naira) -> Self {
        Self { label: label.into(), price }
    }

    /// The free "no extra service" option every delivery axis offers.
    pub fn none() -> Self { Self::new(Self::NONE_LABEL, Naira::ZERO) }

    pub fn is_none(&self) -> bool { self.label == Self::NONE_LABEL && self.price.is_zero() }
}

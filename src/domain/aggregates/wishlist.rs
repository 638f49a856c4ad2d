//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Naira;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: String,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Naira,
    pub added_at: DateTime<Utc>,
}

impl WishlistItem {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id().to_string(), title: product.title().to_string(),
            image: product.image().map(str::to_string), price: product.base_price(), added_at: Utc::now(),
        }
    }
}

/// Saved products, one entry per product id, newest last.
#[derive(Clone, Debug, Default)]
pub struct Wishlist { items: Vec<WishlistItem> }

impl Wishlist {
    pub fn new() -> Self { Self::default() }
    pub fn from_items(items: Vec<WishlistItem>) -> Self {
        let mut list = Self::new();
        for item in items { list.add(item); }
        list
    }

    pub fn items(&self) -> &[WishlistItem] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn contains(&self, product_id: &str) -> bool { self.items.iter().any(|i| i.product_id == product_id) }

    /// Returns `false` when the product was already saved.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.product_id) { return false; }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Saves or unsaves; returns whether the product is saved afterwards.
    pub fn toggle(&mut self, product: &Product) -> bool {
        if self.remove(product.id()) { false } else { self.add(WishlistItem::from_product(product)) }
    }

    pub fn clear(&mut self) { self.items.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_dedupe() {
        let p = Product::create("pixie-1", "Pixie Cut Unit", Naira::new(65_000));
        let mut list = Wishlist::new();
        assert!(list.toggle(&p));
        assert!(!list.add(WishlistItem::from_product(&p)));
        assert_eq!(list.len(), 1);
        assert!(!list.toggle(&p));
        assert!(list.is_empty());
    }

    #[test]
    fn test_from_items_drops_duplicates() {
        let p = Product::create("pixie-1", "Pixie Cut Unit", Naira::new(65_000));
        let list = Wishlist::from_items(vec![WishlistItem::from_product(&p), WishlistItem::from_product(&p)]);
        assert_eq!(list.len(), 1);
    }
}

//! # Cart
//!
//! Session cart: an insertion-ordered set of products keyed by product id.

use crate::product::{Currency, Price, Product};
use serde::{Deserialize, Serialize};

/// Products selected during the current session.
///
/// Holds at most one entry per product id. Adding an id that is already
/// present replaces the entry in place and keeps its position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    currency: Currency,
    items: Vec<Product>,
}

impl Cart {
    /// Create an empty cart priced in the given currency
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            items: Vec::new(),
        }
    }

    /// Insert a product, replacing any entry with the same id
    pub fn add(&mut self, product: Product) {
        match self.items.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.items.push(product),
        }
    }

    /// Remove a product by id. Absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<Product> {
        let index = self.items.iter().position(|p| p.id == id)?;
        Some(self.items.remove(index))
    }

    /// Sum of the contained prices
    pub fn total(&self) -> Price {
        self.items
            .iter()
            .fold(Price::zero(self.currency), |acc, p| acc.plus(p.price))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|p| p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Products in insertion order
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aed(amount: f64) -> Price {
        Price::new(amount, Currency::AED)
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let cart = Cart::new(Currency::AED);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::zero(Currency::AED));
    }

    #[test]
    fn test_cart_total() {
        let mut cart = Cart::new(Currency::AED);
        cart.add(Product::electronics("E101", "Buds", aed(249.0)));
        cart.add(Product::clothing("C201", "Shirt", aed(99.5)));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total().amount, 34850);
    }

    #[test]
    fn test_add_same_id_replaces_in_place() {
        let mut cart = Cart::new(Currency::AED);
        cart.add(Product::electronics("E101", "Buds", aed(249.0)));
        cart.add(Product::clothing("C201", "Shirt", aed(99.0)));
        cart.add(Product::electronics("E101", "Buds", aed(249.0)));

        assert_eq!(cart.len(), 2);
        let ids: Vec<_> = cart.items().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["E101", "C201"]);
        assert_eq!(cart.total(), aed(348.0));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new(Currency::AED);
        cart.add(Product::electronics("E101", "Buds", aed(249.0)));
        cart.add(Product::clothing("C201", "Shirt", aed(99.0)));

        assert!(cart.remove("E101").is_some());
        let after_once: Vec<_> = cart.items().to_vec();

        assert!(cart.remove("E101").is_none());
        assert_eq!(cart.items(), after_once.as_slice());
        assert_eq!(cart.total(), aed(99.0));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new(Currency::AED);
        cart.add(Product::electronics("E101", "Buds", aed(249.0)));
        cart.clear();

        assert!(cart.is_empty());
        assert!(!cart.contains("E101"));
    }
}

//! # Product Types
//!
//! Product catalog types for smart-cart.
//! The catalog is loaded from `config/products.toml` and is never mutated by
//! the engine.

use crate::budget::Budget;
use crate::error::{CartError, CartResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Store currency (ISO 4217). The store prices everything in dirhams, so a
/// price in any other currency cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    AED,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::AED => "aed",
        }
    }

    /// Number of decimal places (fils)
    pub fn decimal_places(&self) -> u8 {
        2
    }

    /// Convert a decimal amount to the smallest currency unit (fils)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::AED
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (fils for AED)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create a price from smallest unit
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Sum of two prices
    pub fn plus(self, other: Price) -> Price {
        Price {
            amount: self.amount + other.amount,
            currency: self.currency,
        }
    }

    /// Format for display (e.g., "AED 249.00")
    pub fn display(&self) -> String {
        format!("{} {:.2}", self.currency, self.as_decimal())
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Clothing,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Clothing => "clothing",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product in the catalog.
///
/// Identity is the `id`: two products with the same id compare equal, which
/// is what the cart relies on for deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g., "E101")
    pub id: String,

    /// Display name
    pub name: String,

    /// Price
    pub price: Price,

    /// Category label
    pub category: Category,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Price,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category,
        }
    }

    /// Create an electronics product
    pub fn electronics(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self::new(id, name, price, Category::Electronics)
    }

    /// Create a clothing product
    pub fn clothing(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self::new(id, name, price, Category::Clothing)
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}

impl std::hash::Hash for Product {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Product catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Builder: add a product
    pub fn with_product(mut self, product: Product) -> Self {
        self.add(product);
        self
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Find a product by ID or fail with `ProductNotFound`
    pub fn require(&self, id: &str) -> CartResult<&Product> {
        self.get(id).ok_or_else(|| CartError::ProductNotFound {
            product_id: id.to_string(),
        })
    }

    /// List products, optionally narrowed to one category and to the items
    /// that fit within the budget limit when a budget is set.
    pub fn list_products<'a>(
        &'a self,
        category: Option<Category>,
        budget: Option<&'a Budget>,
    ) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| {
            category.map_or(true, |c| p.category == c)
                && budget.map_or(true, |b| b.admits_price(p.price))
        })
    }

    /// Currency shared by every product (AED for an empty catalog)
    pub fn currency(&self) -> Currency {
        self.products
            .first()
            .map(|p| p.price.currency)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Load catalog from TOML string and validate it
    pub fn from_toml(toml_str: &str) -> CartResult<Self> {
        let catalog: Catalog = toml::from_str(toml_str)
            .map_err(|e| CartError::Configuration(format!("invalid catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check id uniqueness and non-negative prices
    pub fn validate(&self) -> CartResult<()> {
        let mut seen = HashSet::new();
        for product in &self.products {
            if !seen.insert(product.id.as_str()) {
                return Err(CartError::Configuration(format!(
                    "duplicate product id: {}",
                    product.id
                )));
            }
            if product.price.amount < 0 {
                return Err(CartError::Configuration(format!(
                    "product {} has a negative price",
                    product.id
                )));
            }
        }
        Ok(())
    }

    /// The built-in store inventory, used when no catalog file is found
    pub fn demo() -> Self {
        let aed = |amount: f64| Price::new(amount, Currency::AED);
        let electronics = [
            ("E101", "Samsung Galaxy Buds 2", 249.0),
            ("E102", "Apple iPad 10th Gen (64GB)", 1499.0),
            ("E103", "Sony WH-1000XM4", 999.0),
            ("E104", "Logitech MX Master 3S Mouse", 299.0),
            ("E105", "Anker PowerCore 20000mAh", 129.0),
            ("E106", "Apple iPhone 15 Pro", 3999.0),
            ("E107", "Samsung Galaxy S24 Ultra", 4299.0),
            ("E108", "MacBook Air M2 13\"", 4999.0),
            ("E109", "Dell G15 Gaming Laptop", 3899.0),
            ("E110", "Sony WH-1000XM5", 1399.0),
            ("E111", "JBL Flip 6 Bluetooth Speaker", 399.0),
            ("E112", "Google Pixel 8a", 1699.0),
        ];
        let clothing = [
            ("C201", "Nike Air Max T-Shirt", 99.0),
            ("C202", "Adidas Joggers", 149.0),
            ("C203", "Zara Women's Top", 89.0),
            ("C204", "H&M Hoodie", 119.0),
            ("C205", "Levi's 511 Jeans", 199.0),
            ("C206", "Men's Classic Hoodie", 149.0),
            ("C207", "Women's Lightweight Jacket", 199.0),
            ("C208", "Sneakers (Unisex)", 259.0),
            ("C209", "Sports T-Shirt", 89.0),
            ("C210", "Formal Shirt", 129.0),
            ("C211", "Slim Fit Jeans", 159.0),
            ("C212", "Summer Dress", 149.0),
        ];

        let mut catalog = Catalog::new();
        for (id, name, price) in electronics {
            catalog.add(Product::electronics(id, name, aed(price)));
        }
        for (id, name, price) in clothing {
            catalog.add(Product::clothing(id, name, aed(price)));
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_conversion() {
        let aed = Currency::AED;
        assert_eq!(aed.to_smallest_unit(10.99), 1099);
        assert_eq!(aed.from_smallest_unit(1099), 10.99);
        assert_eq!(aed.to_smallest_unit(100.1), 10010);
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::new(249.0, Currency::AED).display(), "AED 249.00");
        assert_eq!(Price::from_cents(1999, Currency::AED).to_string(), "AED 19.99");
    }

    #[test]
    fn test_product_identity_is_id() {
        let a = Product::electronics("E101", "Buds", Price::new(249.0, Currency::AED));
        let b = Product::electronics("E101", "Buds (renamed)", Price::new(199.0, Currency::AED));
        let c = Product::clothing("C201", "Shirt", Price::new(99.0, Currency::AED));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_demo_catalog() {
        let catalog = Catalog::demo();

        assert_eq!(catalog.len(), 24);
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.get("E103").unwrap().name, "Sony WH-1000XM4");
        assert_eq!(
            catalog.list_products(Some(Category::Clothing), None).count(),
            12
        );
    }

    #[test]
    fn test_list_products_filters_by_budget() {
        let catalog = Catalog::demo();
        let mut budget = Budget::unset();
        budget.set(Price::new(100.0, Currency::AED)).unwrap();

        let ids: Vec<_> = catalog
            .list_products(None, Some(&budget))
            .map(|p| p.id.as_str())
            .collect();

        assert_eq!(ids, vec!["C201", "C203", "C209"]);
    }

    #[test]
    fn test_catalog_from_toml() {
        let toml = r#"
            [[products]]
            id = "E101"
            name = "Samsung Galaxy Buds 2"
            category = "electronics"
            price = { amount = 24900, currency = "aed" }

            [[products]]
            id = "C201"
            name = "Nike Air Max T-Shirt"
            category = "clothing"
            price = { amount = 9900, currency = "aed" }
        "#;

        let catalog = Catalog::from_toml(toml).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("C201").unwrap().category, Category::Clothing);
    }

    #[test]
    fn test_catalog_rejects_bad_inventory() {
        let duplicate = Catalog::new()
            .with_product(Product::clothing("C1", "A", Price::new(1.0, Currency::AED)))
            .with_product(Product::clothing("C1", "B", Price::new(2.0, Currency::AED)));
        assert!(matches!(
            duplicate.validate(),
            Err(CartError::Configuration(_))
        ));

        let negative = Catalog::new()
            .with_product(Product::clothing("C1", "A", Price::from_cents(-100, Currency::AED)));
        assert!(matches!(negative.validate(), Err(CartError::Configuration(_))));

        let foreign = r#"
            [[products]]
            id = "E1"
            name = "Imported"
            category = "electronics"
            price = { amount = 1000, currency = "usd" }
        "#;
        assert!(matches!(
            Catalog::from_toml(foreign),
            Err(CartError::Configuration(_))
        ));
    }

    #[test]
    fn test_require_missing_product() {
        let catalog = Catalog::demo();
        assert_eq!(
            catalog.require("X999").unwrap_err(),
            CartError::ProductNotFound {
                product_id: "X999".into()
            }
        );
    }
}

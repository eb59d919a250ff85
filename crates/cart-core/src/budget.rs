//! # Budget
//!
//! Session spending ceiling and the guard that gates add-to-cart on it.
//! The budget is advisory: when it is unset, every addition is allowed.

use crate::cart::Cart;
use crate::error::{CartError, CartResult};
use crate::product::{Price, Product};
use serde::{Deserialize, Serialize};

/// User-declared spending limit for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    limit: Option<Price>,
}

impl Budget {
    /// A budget with no limit
    pub fn unset() -> Self {
        Self { limit: None }
    }

    /// Set or change the limit. Non-positive limits are rejected and leave
    /// the budget unset.
    pub fn set(&mut self, limit: Price) -> CartResult<()> {
        if limit.amount <= 0 {
            self.limit = None;
            return Err(CartError::InvalidBudget);
        }
        self.limit = Some(limit);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.limit = None;
    }

    pub fn is_set(&self) -> bool {
        self.limit.is_some()
    }

    pub fn limit(&self) -> Option<Price> {
        self.limit
    }

    /// Display predicate: a single product fits under the limit
    pub fn admits_price(&self, price: Price) -> bool {
        self.limit.map_or(true, |limit| price.amount <= limit.amount)
    }

    /// Snapshot of how much of the budget the cart consumes
    pub fn usage(&self, cart: &Cart) -> Option<BudgetUsage> {
        let limit = self.limit?;
        let spent = cart.total();
        let percent = (spent.amount as f64 / limit.amount as f64 * 100.0).min(100.0);
        Some(BudgetUsage {
            limit,
            spent,
            remaining: Price::from_cents(limit.amount - spent.amount, limit.currency),
            percent_used: percent.round() as u8,
        })
    }
}

/// Budget consumption, as shown next to the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetUsage {
    pub limit: Price,
    pub spent: Price,
    /// Headroom left; negative once a reserved item pushed the cart over
    pub remaining: Price,
    /// Rounded and capped at 100
    pub percent_used: u8,
}

/// Decides whether a product may be added to the cart under the budget
pub struct BudgetGuard;

impl BudgetGuard {
    /// True when the budget is unset, or the prospective total stays at or
    /// under the limit
    pub fn can_add(product: &Product, cart: &Cart, budget: &Budget) -> bool {
        Self::check_add(product, cart, budget).is_ok()
    }

    /// Same decision as `can_add`, failing with the amounts the user needs to
    /// see: item price, current total and limit.
    pub fn check_add(product: &Product, cart: &Cart, budget: &Budget) -> CartResult<()> {
        let Some(limit) = budget.limit() else {
            return Ok(());
        };

        let current_total = cart.total();
        let prospective = current_total.plus(product.price);
        if prospective.amount > limit.amount {
            return Err(CartError::BudgetExceeded {
                price: product.price,
                current_total,
                limit,
            });
        }
        Ok(())
    }

    /// Whether a single product is within the budget limit, for catalog
    /// listings
    pub fn within_budget(product: &Product, budget: &Budget) -> bool {
        budget.admits_price(product.price)
    }
}

//! # Reservations
//!
//! Reservation ledger for smart-cart.
//!
//! A reservation holds a catalog item for a planned purchase date against a
//! fee. Each reservation follows a one-way state machine:
//!
//! ```text
//!            cancel()        ┌───────────┐
//!        ┌──────────────────▶│ Cancelled │
//! ┌──────┴─┐                 └───────────┘
//! │ Active │
//! └──────┬─┘  purchase_now() ┌───────────┐
//!        └──────────────────▶│ Purchased │
//!                            └───────────┘
//! ```
//!
//! Cancelled and Purchased are terminal. Reservations are never deleted.

use crate::cart::Cart;
use crate::error::{CartError, CartResult};
use crate::product::{Price, Product};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Minimum reservation fee, in major units
pub const MIN_RESERVATION_FEE: f64 = 5.0;

/// Cancellations more than this many days ahead get the full fee back
pub const FULL_REFUND_AFTER_DAYS: i64 = 7;

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Cancelled,
    Purchased,
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Active)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Purchased => "purchased",
        };
        f.write_str(s)
    }
}

/// Reservation fee: 10% of the price rounded to the currency precision,
/// never below the 5.00 minimum.
pub fn reservation_fee(price: Price) -> Price {
    let ten_percent = (price.amount + 5).div_euclid(10);
    let minimum = price.currency.to_smallest_unit(MIN_RESERVATION_FEE);
    Price::from_cents(ten_percent.max(minimum), price.currency)
}

/// Share of the fee returned on cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundTier {
    /// More than a week before the planned date
    Full,
    /// Within the last week, including the planned date itself
    Half,
    /// Planned date already passed
    None,
}

impl RefundTier {
    pub fn for_days_remaining(days: i64) -> Self {
        if days > FULL_REFUND_AFTER_DAYS {
            RefundTier::Full
        } else if days >= 0 {
            RefundTier::Half
        } else {
            RefundTier::None
        }
    }

    /// Amount refunded for the given fee. A half share of an odd amount
    /// rounds half to even, so 10.01 refunds 5.00 and 10.03 refunds 5.02.
    pub fn apply(&self, fee: Price) -> Price {
        let amount = match self {
            RefundTier::Full => fee.amount,
            RefundTier::Half => half_to_even(fee.amount),
            RefundTier::None => 0,
        };
        Price::from_cents(amount, fee.currency)
    }
}

fn half_to_even(amount: i64) -> i64 {
    let half = amount.div_euclid(2);
    if amount.rem_euclid(2) == 1 && half % 2 != 0 {
        half + 1
    } else {
        half
    }
}

/// Outcome of cancelling (or quoting a cancellation of) a reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refund {
    pub reservation_id: String,
    pub days_remaining: i64,
    pub tier: RefundTier,
    pub amount: Price,
}

/// A reserved catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Generated reservation id
    pub id: String,

    /// Reserved catalog item
    pub product: Product,

    pub reserved_on: NaiveDate,

    pub planned_date: NaiveDate,

    /// Fixed at creation
    pub fee: Price,

    pub status: ReservationStatus,

    /// Set only once purchased
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_on: Option<NaiveDate>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Whole days from `today` until the planned date; negative once passed
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.planned_date - today).num_days()
    }

    /// What cancelling on `today` would refund, without cancelling
    pub fn refund_quote(&self, today: NaiveDate) -> Refund {
        let days_remaining = self.days_remaining(today);
        let tier = RefundTier::for_days_remaining(days_remaining);
        Refund {
            reservation_id: self.id.clone(),
            days_remaining,
            tier,
            amount: tier.apply(self.fee),
        }
    }

    fn ensure_active(&self) -> CartResult<()> {
        if self.status.is_terminal() {
            return Err(CartError::AlreadyTerminal {
                status: self.status,
            });
        }
        Ok(())
    }
}

/// All reservations made in this process, in arrival order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationLedger {
    reservations: Vec<Reservation>,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self {
            reservations: Vec::new(),
        }
    }

    /// Reserve a product for `planned_date`. Fails with `InvalidDate` when the
    /// planned date is before `today`.
    pub fn reserve(
        &mut self,
        product: &Product,
        planned_date: NaiveDate,
        today: NaiveDate,
    ) -> CartResult<Reservation> {
        if planned_date < today {
            return Err(CartError::InvalidDate {
                planned: planned_date,
                today,
            });
        }

        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            product: product.clone(),
            reserved_on: today,
            planned_date,
            fee: reservation_fee(product.price),
            status: ReservationStatus::Active,
            purchased_on: None,
        };

        info!(
            "Reserved {} for {}: fee={}",
            product.id,
            planned_date,
            reservation.fee.display()
        );

        self.reservations.push(reservation.clone());
        Ok(reservation)
    }

    /// Cancel an active reservation and return the refund due on `today`
    pub fn cancel(&mut self, id: &str, today: NaiveDate) -> CartResult<Refund> {
        let reservation = self.require_mut(id)?;
        reservation.ensure_active()?;

        let refund = reservation.refund_quote(today);
        reservation.status = ReservationStatus::Cancelled;

        info!(
            "Cancelled reservation {}: {} days remaining, refund={}",
            id,
            refund.days_remaining,
            refund.amount.display()
        );
        Ok(refund)
    }

    /// Move the reserved product into the cart and mark the reservation
    /// purchased. The fee is neither credited nor charged here.
    pub fn purchase_now(
        &mut self,
        id: &str,
        cart: &mut Cart,
        today: NaiveDate,
    ) -> CartResult<Reservation> {
        let reservation = self.require_mut(id)?;
        reservation.ensure_active()?;

        cart.add(reservation.product.clone());
        reservation.status = ReservationStatus::Purchased;
        reservation.purchased_on = Some(today);

        info!(
            "Purchased reserved {} ({}), moved to cart",
            reservation.product.id, id
        );
        Ok(reservation.clone())
    }

    pub fn get(&self, id: &str) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    /// Find a reservation or fail with `ReservationNotFound`
    pub fn require(&self, id: &str) -> CartResult<&Reservation> {
        self.get(id).ok_or_else(|| CartError::ReservationNotFound {
            reservation_id: id.to_string(),
        })
    }

    fn require_mut(&mut self, id: &str) -> CartResult<&mut Reservation> {
        self.reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CartError::ReservationNotFound {
                reservation_id: id.to_string(),
            })
    }

    /// 1-based position in the listing
    pub fn by_position(&self, position: usize) -> Option<&Reservation> {
        position
            .checked_sub(1)
            .and_then(|index| self.reservations.get(index))
    }

    /// All reservations in arrival order
    pub fn list(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn active(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter().filter(|r| r.is_active())
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}

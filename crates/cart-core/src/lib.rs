//! # cart-core
//!
//! Order, reservation and checkout rules for the smart-cart in-store
//! shopping engine.
//!
//! This crate provides:
//! - `Product`, `Price` and `Catalog` for the read-only product catalog
//! - `Cart` and `BudgetGuard` for budget-gated cart aggregation
//! - `ReservationLedger` for reservation fees, refunds and status transitions
//! - `CheckoutValidator` for delivery/payment validation and order totals
//! - `Session` tying the above to one logged-in shopper
//! - `CredentialStore` for the account lookups the session logs in against
//! - `CartError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{Catalog, CheckoutRequest, Currency, DeliveryDetails, InMemoryCredentialStore,
//!     PaymentMethod, Price, Session};
//!
//! let catalog = Catalog::demo();
//! let store = InMemoryCredentialStore::demo();
//!
//! let mut session = Session::new(Currency::AED);
//! session.login(&store, "user", "user123")?;
//! session.set_budget(Price::new(500.0, Currency::AED))?;
//!
//! // Rejected with BudgetExceeded if the cart would go over 500
//! session.add_to_cart(catalog.require("E101")?)?;
//!
//! let request = CheckoutRequest::new(
//!     DeliveryDetails::new("Aisha", "Marina Walk 12", "501234567"),
//!     PaymentMethod::CashOnDelivery,
//! );
//! let confirmation = session.place_order(&request)?;
//! ```

pub mod auth;
pub mod budget;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod product;
pub mod reservation;
pub mod session;

// Re-exports for convenience
pub use auth::{CredentialStore, InMemoryCredentialStore, UserAccount, UserSeed};
pub use budget::{Budget, BudgetGuard, BudgetUsage};
pub use cart::Cart;
pub use checkout::{
    mask_card, CardDetails, CheckoutRequest, CheckoutValidator, DeliveryDetails,
    OrderConfirmation, OrderLine, OrderSummary, PaymentMethod, PaymentReceipt, COD_SURCHARGE,
    PHONE_PREFIX,
};
pub use error::{CardDetailsError, CardField, CartError, CartResult, DeliveryField, UpiIdError};
pub use product::{Catalog, Category, Currency, Price, Product};
pub use reservation::{
    reservation_fee, Refund, RefundTier, Reservation, ReservationLedger, ReservationStatus,
};
pub use session::Session;

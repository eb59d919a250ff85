//! # Session
//!
//! One shopper's working state: the logged-in user, cart, budget and the
//! reservation ledger. Every mutating operation goes through this value, so
//! the engine carries no hidden shared state.

use crate::auth::CredentialStore;
use crate::budget::{Budget, BudgetGuard, BudgetUsage};
use crate::cart::Cart;
use crate::checkout::{CheckoutRequest, CheckoutValidator, OrderConfirmation, OrderSummary, PaymentMethod};
use crate::error::{CartError, CartResult};
use crate::product::{Currency, Price, Product};
use crate::reservation::{Refund, Reservation, ReservationLedger};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// State of the single active shopping session
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<String>,
    cart: Cart,
    budget: Budget,
    reservations: ReservationLedger,
}

impl Session {
    /// Create a logged-out session pricing its cart in `currency`
    pub fn new(currency: Currency) -> Self {
        Self {
            user: None,
            cart: Cart::new(currency),
            budget: Budget::unset(),
            reservations: ReservationLedger::new(),
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in against the credential store. Logging in as a different user
    /// first logs the current one out.
    pub fn login(
        &mut self,
        store: &dyn CredentialStore,
        username: &str,
        password: &str,
    ) -> CartResult<()> {
        let username = username.trim();
        if !store.authenticate(username, password) {
            warn!("Login failed for {}", username);
            return Err(CartError::InvalidCredentials);
        }

        if self.user.as_deref().is_some_and(|current| current != username) {
            self.logout();
        }
        self.user = Some(username.to_string());
        info!("User {} logged in", username);
        Ok(())
    }

    /// Drop the user, empty the cart and unset the budget. Reservations stay
    /// in the ledger as history.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!("User {} logged out", user);
        }
        self.cart.clear();
        self.budget.clear();
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The logged-in username, or `NotAuthenticated`
    pub fn require_user(&self) -> CartResult<&str> {
        self.user.as_deref().ok_or(CartError::NotAuthenticated)
    }

    // =========================================================================
    // Budget
    // =========================================================================

    pub fn set_budget(&mut self, limit: Price) -> CartResult<()> {
        self.require_user()?;
        self.budget.set(limit)?;
        info!("Budget set to {}", limit.display());
        Ok(())
    }

    pub fn clear_budget(&mut self) -> CartResult<()> {
        self.require_user()?;
        self.budget.clear();
        Ok(())
    }

    pub fn budget(&self) -> CartResult<&Budget> {
        self.require_user()?;
        Ok(&self.budget)
    }

    /// Spent/remaining snapshot, `None` when no budget is set
    pub fn budget_usage(&self) -> CartResult<Option<BudgetUsage>> {
        self.require_user()?;
        Ok(self.budget.usage(&self.cart))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a product after the budget guard approves it
    pub fn add_to_cart(&mut self, product: &Product) -> CartResult<()> {
        self.require_user()?;
        BudgetGuard::check_add(product, &self.cart, &self.budget)?;
        self.cart.add(product.clone());
        debug!(
            "Added {} to cart, total={}",
            product.id,
            self.cart.total().display()
        );
        Ok(())
    }

    /// Remove a product by id; removing an absent id is not an error
    pub fn remove_from_cart(&mut self, product_id: &str) -> CartResult<Option<Product>> {
        self.require_user()?;
        Ok(self.cart.remove(product_id))
    }

    pub fn cart(&self) -> CartResult<&Cart> {
        self.require_user()?;
        Ok(&self.cart)
    }

    // =========================================================================
    // Reservations
    // =========================================================================

    pub fn reserve(
        &mut self,
        product: &Product,
        planned_date: NaiveDate,
        today: NaiveDate,
    ) -> CartResult<Reservation> {
        self.require_user()?;
        self.reservations.reserve(product, planned_date, today)
    }

    pub fn cancel_reservation(&mut self, id: &str, today: NaiveDate) -> CartResult<Refund> {
        self.require_user()?;
        self.reservations.cancel(id, today)
    }

    /// Move a reserved item into the cart. The budget guard is not applied,
    /// matching the store's reservation desk.
    pub fn purchase_reservation(&mut self, id: &str, today: NaiveDate) -> CartResult<Reservation> {
        self.require_user()?;
        self.reservations.purchase_now(id, &mut self.cart, today)
    }

    pub fn reservations(&self) -> CartResult<&ReservationLedger> {
        self.require_user()?;
        Ok(&self.reservations)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Preview of the order for the chosen payment method
    pub fn summary(&self, method: PaymentMethod) -> CartResult<OrderSummary> {
        self.require_user()?;
        CheckoutValidator::generate_summary(&self.cart, method)
    }

    /// Validate and place the order. On success the cart is emptied and the
    /// budget unset; on failure nothing changes.
    pub fn place_order(&mut self, request: &CheckoutRequest) -> CartResult<OrderConfirmation> {
        let user = self.require_user()?.to_string();
        let confirmation = CheckoutValidator::confirm(&self.cart, request)?;

        self.cart.clear();
        self.budget.clear();

        info!(
            "Order {} placed by {}: {} items, payment={}, total={}",
            confirmation.order_id,
            user,
            confirmation.item_count(),
            request.payment_method,
            confirmation.total.display()
        );
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryCredentialStore;
    use crate::checkout::{CardDetails, DeliveryDetails};
    use crate::reservation::ReservationStatus;
    use chrono::Days;

    fn aed(amount: f64) -> Price {
        Price::new(amount, Currency::AED)
    }

    fn logged_in() -> Session {
        let mut session = Session::new(Currency::AED);
        session
            .login(&InMemoryCredentialStore::demo(), "user", "user123")
            .unwrap();
        session
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_operations_require_login() {
        let mut session = Session::new(Currency::AED);
        let product = Product::clothing("C1", "Shirt", aed(99.0));

        assert_eq!(session.add_to_cart(&product), Err(CartError::NotAuthenticated));
        assert_eq!(
            session.reserve(&product, today(), today()).unwrap_err(),
            CartError::NotAuthenticated
        );
        assert_eq!(
            session.summary(PaymentMethod::Upi).unwrap_err(),
            CartError::NotAuthenticated
        );
        assert_eq!(session.cart().unwrap_err(), CartError::NotAuthenticated);
        assert_eq!(session.budget().unwrap_err(), CartError::NotAuthenticated);
        assert_eq!(
            session.budget_usage().unwrap_err(),
            CartError::NotAuthenticated
        );
    }

    #[test]
    fn test_bad_login() {
        let mut session = Session::new(Currency::AED);
        assert_eq!(
            session.login(&InMemoryCredentialStore::demo(), "user", "nope"),
            Err(CartError::InvalidCredentials)
        );
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_logout_clears_cart_and_budget_keeps_reservations() {
        let mut session = logged_in();
        let product = Product::clothing("C1", "Shirt", aed(99.0));
        session.set_budget(aed(500.0)).unwrap();
        session.add_to_cart(&product).unwrap();
        session.reserve(&product, today(), today()).unwrap();

        session.logout();

        assert!(session.current_user().is_none());
        assert_eq!(session.cart().unwrap_err(), CartError::NotAuthenticated);

        session
            .login(&InMemoryCredentialStore::demo(), "user", "user123")
            .unwrap();
        assert!(session.cart().unwrap().is_empty());
        assert!(!session.budget().unwrap().is_set());
        assert_eq!(session.reservations().unwrap().len(), 1);
    }

    #[test]
    fn test_switching_user_resets_cart() {
        let mut session = logged_in();
        session
            .add_to_cart(&Product::clothing("C1", "Shirt", aed(99.0)))
            .unwrap();

        session
            .login(&InMemoryCredentialStore::demo(), "admin", "admin123")
            .unwrap();

        assert_eq!(session.current_user(), Some("admin"));
        assert!(session.cart().unwrap().is_empty());
    }

    #[test]
    fn test_failed_order_leaves_state_untouched() {
        let mut session = logged_in();
        session.set_budget(aed(500.0)).unwrap();
        session
            .add_to_cart(&Product::clothing("C1", "Shirt", aed(99.0)))
            .unwrap();

        let request = CheckoutRequest::new(
            DeliveryDetails::new("Aisha", "Dubai", "123"),
            PaymentMethod::CashOnDelivery,
        );
        assert_eq!(session.place_order(&request), Err(CartError::InvalidPhone));
        assert_eq!(session.cart().unwrap().len(), 1);
        assert!(session.budget().unwrap().is_set());
    }

    #[test]
    fn test_successful_order_resets_cart_and_budget() {
        let mut session = logged_in();
        session.set_budget(aed(500.0)).unwrap();
        session
            .add_to_cart(&Product::clothing("C1", "Shirt", aed(99.0)))
            .unwrap();

        let request = CheckoutRequest::new(
            DeliveryDetails::new("Aisha", "Dubai", "501234567"),
            PaymentMethod::CardPayment,
        )
        .with_card(CardDetails::new("4111111111111111", "09/28", "321"));

        let confirmation = session.place_order(&request).unwrap();

        assert_eq!(confirmation.total, aed(99.0));
        assert!(session.cart().unwrap().is_empty());
        assert!(!session.budget().unwrap().is_set());
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut session = logged_in();
        let first = Product::electronics("E1", "Speaker", aed(100.0));
        let second = Product::clothing("C1", "Hoodie", aed(60.0));

        session.set_budget(aed(150.0)).unwrap();
        session.add_to_cart(&first).unwrap();
        assert_eq!(session.cart().unwrap().total(), aed(100.0));

        assert_eq!(
            session.add_to_cart(&second),
            Err(CartError::BudgetExceeded {
                price: aed(60.0),
                current_total: aed(100.0),
                limit: aed(150.0),
            })
        );
        assert_eq!(session.cart().unwrap().len(), 1);

        session.remove_from_cart("E1").unwrap();
        assert_eq!(session.cart().unwrap().total(), aed(0.0));

        let reservation = session
            .reserve(&first, today() + Days::new(10), today())
            .unwrap();
        assert_eq!(reservation.fee, aed(10.0));
        assert_eq!(reservation.status, ReservationStatus::Active);

        let refund = session
            .cancel_reservation(&reservation.id, today() + Days::new(2))
            .unwrap();
        assert_eq!(refund.days_remaining, 8);
        assert_eq!(refund.amount, aed(10.0));
        assert_eq!(
            session.reservations().unwrap().get(&reservation.id).unwrap().status,
            ReservationStatus::Cancelled
        );
    }

    #[test]
    fn test_purchase_reservation_bypasses_budget() {
        let mut session = logged_in();
        let laptop = Product::electronics("E108", "MacBook", aed(4999.0));
        session.set_budget(aed(100.0)).unwrap();

        let reservation = session.reserve(&laptop, today(), today()).unwrap();
        session.purchase_reservation(&reservation.id, today()).unwrap();

        assert!(session.cart().unwrap().contains("E108"));
        assert_eq!(session.budget_usage().unwrap().unwrap().percent_used, 100);
    }
}

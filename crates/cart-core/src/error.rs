//! # Cart Error Types
//!
//! Typed error handling for the smart-cart engine.
//! All engine operations return `Result<T, CartError>`. Every variant is an
//! expected, user-correctable condition except `Configuration` and `Internal`.

use crate::product::Price;
use crate::reservation::ReservationStatus;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Delivery field that failed the non-blank check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryField {
    Name,
    Address,
    Phone,
}

impl std::fmt::Display for DeliveryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeliveryField::Name => "name",
            DeliveryField::Address => "address",
            DeliveryField::Phone => "phone",
        };
        f.write_str(name)
    }
}

/// Card field that was left blank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    Number,
    Expiry,
    Cvv,
}

impl std::fmt::Display for CardField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CardField::Number => "card number",
            CardField::Expiry => "expiry",
            CardField::Cvv => "CVV",
        };
        f.write_str(name)
    }
}

/// Which card check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "field")]
pub enum CardDetailsError {
    #[error("please fill all card details ({0} is missing)")]
    MissingField(CardField),

    #[error("card number must be 16 digits")]
    CardNumberLength,

    #[error("CVV must be 3 digits")]
    CvvLength,

    #[error("expiry must be in MM/YY format with a month between 01 and 12")]
    InvalidExpiry,
}

/// Which UPI check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpiIdError {
    #[error("please fill UPI ID")]
    Missing,

    #[error("UPI ID must be digits (min 6)")]
    Format,
}

/// Core error type for all cart, reservation and checkout operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Checkout, summary or order placement on an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// A delivery field is blank
    #[error("Please fill delivery details: {field} is required")]
    MissingDeliveryInfo { field: DeliveryField },

    /// Phone is not exactly 9 digits
    #[error("Phone must be 9 digits after +971")]
    InvalidPhone,

    /// Card payment fields failed validation
    #[error("Invalid card details: {0}")]
    InvalidCardDetails(CardDetailsError),

    /// UPI id failed validation
    #[error("Invalid UPI ID: {0}")]
    InvalidUpiId(UpiIdError),

    /// Add-to-cart rejected by the budget guard
    #[error("Cannot add, exceeds your budget (item price: {price}, current total: {current_total}, budget: {limit})")]
    BudgetExceeded {
        price: Price,
        current_total: Price,
        limit: Price,
    },

    /// Budget limit must be a positive amount
    #[error("Budget must be a positive number")]
    InvalidBudget,

    /// Planned purchase date lies before today
    #[error("Planned date {planned} must be today ({today}) or in the future")]
    InvalidDate { planned: NaiveDate, today: NaiveDate },

    /// Cancel or purchase attempted on a reservation that is no longer active
    #[error("Reservation is already {status}")]
    AlreadyTerminal { status: ReservationStatus },

    /// Reservation id not present in the ledger
    #[error("Reservation not found: {reservation_id}")]
    ReservationNotFound { reservation_id: String },

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Operation requires a logged-in user
    #[error("Not logged in")]
    NotAuthenticated,

    /// Registration with an existing username
    #[error("Username exists: {username}")]
    UsernameTaken { username: String },

    /// Login with an unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Username does not match the allowed pattern
    #[error("Username invalid. Must start with a letter, 3-12 chars, letters/digits/underscore")]
    InvalidUsernameFormat,

    /// Password blank or too long
    #[error("Password must be between 1 and {max_len} characters")]
    InvalidPasswordFormat { max_len: usize },

    /// Configuration errors (unreadable catalog, duplicate ids, unknown currency)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CartError {
    /// Returns true if the user can fix the input and try again
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, CartError::Configuration(_) | CartError::Internal(_))
    }

    /// Stable machine-readable tag for the presentation layer
    pub fn kind(&self) -> &'static str {
        match self {
            CartError::EmptyCart => "empty_cart",
            CartError::MissingDeliveryInfo { .. } => "missing_delivery_info",
            CartError::InvalidPhone => "invalid_phone",
            CartError::InvalidCardDetails(_) => "invalid_card_details",
            CartError::InvalidUpiId(_) => "invalid_upi_id",
            CartError::BudgetExceeded { .. } => "budget_exceeded",
            CartError::InvalidBudget => "invalid_budget",
            CartError::InvalidDate { .. } => "invalid_date",
            CartError::AlreadyTerminal { .. } => "already_terminal",
            CartError::ReservationNotFound { .. } => "reservation_not_found",
            CartError::ProductNotFound { .. } => "product_not_found",
            CartError::NotAuthenticated => "not_authenticated",
            CartError::UsernameTaken { .. } => "username_taken",
            CartError::InvalidCredentials => "invalid_credentials",
            CartError::InvalidUsernameFormat => "invalid_username_format",
            CartError::InvalidPasswordFormat { .. } => "invalid_password_format",
            CartError::Configuration(_) => "configuration",
            CartError::Internal(_) => "internal",
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CartError::EmptyCart => 400,
            CartError::MissingDeliveryInfo { .. } => 422,
            CartError::InvalidPhone => 422,
            CartError::InvalidCardDetails(_) => 422,
            CartError::InvalidUpiId(_) => 422,
            CartError::BudgetExceeded { .. } => 409,
            CartError::InvalidBudget => 400,
            CartError::InvalidDate { .. } => 400,
            CartError::AlreadyTerminal { .. } => 409,
            CartError::ReservationNotFound { .. } => 404,
            CartError::ProductNotFound { .. } => 404,
            CartError::NotAuthenticated => 401,
            CartError::UsernameTaken { .. } => 409,
            CartError::InvalidCredentials => 401,
            CartError::InvalidUsernameFormat => 400,
            CartError::InvalidPasswordFormat { .. } => 400,
            CartError::Configuration(_) => 500,
            CartError::Internal(_) => 500,
        }
    }
}

/// Result type alias for engine operations
pub type CartResult<T> = Result<T, CartError>;

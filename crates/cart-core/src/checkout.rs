//! # Checkout
//!
//! Delivery and payment validation, order summary and order confirmation.
//!
//! Validation runs in a fixed order and the first failure wins:
//!
//! 1. cart is not empty
//! 2. name, address and phone are filled in
//! 3. phone is exactly 9 digits (shown after the `+971` prefix)
//! 4. payment-method fields (card or UPI)
//!
//! Cash on delivery adds a fixed surcharge to the total; card and UPI do not.

use crate::cart::Cart;
use crate::error::{CardDetailsError, CardField, CartError, CartResult, DeliveryField, UpiIdError};
use crate::product::{Currency, Price, Product};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

/// Cash-on-delivery surcharge, in major units
pub const COD_SURCHARGE: f64 = 20.0;

/// Local dialing prefix displayed in front of the 9-digit phone number
pub const PHONE_PREFIX: &str = "+971";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{9}$").expect("Invalid regex"));
static CARD_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{16}$").expect("Invalid regex"));
static CVV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3}$").expect("Invalid regex"));
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})$").expect("Invalid regex"));
static UPI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6,}$").expect("Invalid regex"));

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    CardPayment,
    Upi,
}

impl PaymentMethod {
    /// Extra charge added to the order total for this method
    pub fn surcharge(&self, currency: Currency) -> Option<Price> {
        match self {
            PaymentMethod::CashOnDelivery => Some(Price::new(COD_SURCHARGE, currency)),
            PaymentMethod::CardPayment | PaymentMethod::Upi => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::CardPayment => "Card Payment",
            PaymentMethod::Upi => "UPI",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Delivery fields as typed by the customer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// 9 local digits, without the dialing prefix
    #[serde(default)]
    pub phone: String,
}

impl DeliveryDetails {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
        }
    }

    fn trimmed(&self) -> Self {
        Self::new(self.name.trim(), self.address.trim(), self.phone.trim())
    }
}

/// Card fields as typed by the customer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub number: String,
    /// `MM/YY`
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvv: String,
}

impl CardDetails {
    pub fn new(number: impl Into<String>, expiry: impl Into<String>, cvv: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
        }
    }
}

/// Candidate order submitted at checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub delivery: DeliveryDetails,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    /// Only read for card payments
    #[serde(default)]
    pub card: CardDetails,

    /// Only read for UPI payments
    #[serde(default)]
    pub upi_id: String,
}

impl CheckoutRequest {
    pub fn new(delivery: DeliveryDetails, payment_method: PaymentMethod) -> Self {
        Self {
            delivery,
            payment_method,
            card: CardDetails::default(),
            upi_id: String::new(),
        }
    }

    /// Builder: set card fields
    pub fn with_card(mut self, card: CardDetails) -> Self {
        self.card = card;
        self
    }

    /// Builder: set UPI id
    pub fn with_upi_id(mut self, upi_id: impl Into<String>) -> Self {
        self.upi_id = upi_id.into();
        self
    }
}

/// A line in the order summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    /// Product name (denormalized for display)
    pub name: String,
    pub price: Price,
}

impl OrderLine {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
        }
    }
}

/// Itemized preview of the cart with the payment-dependent total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub subtotal: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<Price>,
    pub total: Price,
}

/// Payment line on the confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentReceipt {
    CashOnDelivery { surcharge: Price },
    CardPayment { masked_number: String, expiry: String },
    Upi { upi_id: String },
}

/// Immutable confirmation of a placed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderConfirmation {
    /// Generated order id
    pub order_id: String,
    pub customer_name: String,
    pub address: String,
    /// Phone with the dialing prefix, e.g. "+971 501234567"
    pub phone: String,
    pub lines: Vec<OrderLine>,
    pub payment: PaymentReceipt,
    pub subtotal: Price,
    pub total: Price,
    pub created_at: DateTime<Utc>,
}

impl OrderConfirmation {
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }
}

/// Mask all but the last four characters of a card number.
/// Values shorter than four characters are returned unchanged.
pub fn mask_card(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    if chars.len() < 4 {
        return number.to_string();
    }
    let last_four: String = chars[chars.len() - 4..].iter().collect();
    format!("****-****-****-{}", last_four)
}

/// `MM/YY` with a month between 01 and 12. The year is not compared with
/// the current date.
pub fn is_valid_expiry(expiry: &str) -> bool {
    let Some(caps) = EXPIRY_RE.captures(expiry) else {
        return false;
    };
    caps[1]
        .parse::<u8>()
        .map(|month| (1..=12).contains(&month))
        .unwrap_or(false)
}

/// Stateless checkout rules
pub struct CheckoutValidator;

impl CheckoutValidator {
    /// Itemization and total only. Fails solely on an empty cart; delivery and
    /// payment fields are not looked at.
    pub fn generate_summary(cart: &Cart, method: PaymentMethod) -> CartResult<OrderSummary> {
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let subtotal = cart.total();
        let surcharge = method.surcharge(cart.currency());
        let total = surcharge.map_or(subtotal, |fee| subtotal.plus(fee));

        Ok(OrderSummary {
            lines: cart.items().iter().map(OrderLine::from_product).collect(),
            payment_method: method,
            subtotal,
            surcharge,
            total,
        })
    }

    /// Run every checkout rule in order
    pub fn validate(cart: &Cart, request: &CheckoutRequest) -> CartResult<()> {
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let delivery = request.delivery.trimmed();
        Self::validate_delivery(&delivery)?;

        match request.payment_method {
            PaymentMethod::CashOnDelivery => Ok(()),
            PaymentMethod::CardPayment => Self::validate_card(&request.card),
            PaymentMethod::Upi => Self::validate_upi(&request.upi_id),
        }
    }

    fn validate_delivery(delivery: &DeliveryDetails) -> CartResult<()> {
        let fields = [
            (DeliveryField::Name, &delivery.name),
            (DeliveryField::Address, &delivery.address),
            (DeliveryField::Phone, &delivery.phone),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(CartError::MissingDeliveryInfo { field: *field });
        }

        if !PHONE_RE.is_match(&delivery.phone) {
            return Err(CartError::InvalidPhone);
        }
        Ok(())
    }

    fn validate_card(card: &CardDetails) -> CartResult<()> {
        let number = card.number.trim();
        let expiry = card.expiry.trim();
        let cvv = card.cvv.trim();

        let fields = [
            (CardField::Number, number),
            (CardField::Expiry, expiry),
            (CardField::Cvv, cvv),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(CartError::InvalidCardDetails(CardDetailsError::MissingField(
                *field,
            )));
        }

        if !CARD_NUMBER_RE.is_match(number) {
            return Err(CartError::InvalidCardDetails(
                CardDetailsError::CardNumberLength,
            ));
        }
        if !CVV_RE.is_match(cvv) {
            return Err(CartError::InvalidCardDetails(CardDetailsError::CvvLength));
        }
        if !is_valid_expiry(expiry) {
            return Err(CartError::InvalidCardDetails(CardDetailsError::InvalidExpiry));
        }
        Ok(())
    }

    fn validate_upi(upi_id: &str) -> CartResult<()> {
        let upi_id = upi_id.trim();
        if upi_id.is_empty() {
            return Err(CartError::InvalidUpiId(UpiIdError::Missing));
        }
        if !UPI_RE.is_match(upi_id) {
            return Err(CartError::InvalidUpiId(UpiIdError::Format));
        }
        Ok(())
    }

    /// Validate and build the order confirmation. Clearing the cart and the
    /// budget afterwards is up to the caller.
    pub fn confirm(cart: &Cart, request: &CheckoutRequest) -> CartResult<OrderConfirmation> {
        Self::validate(cart, request)?;

        let summary = Self::generate_summary(cart, request.payment_method)?;
        let delivery = request.delivery.trimmed();

        let payment = match request.payment_method {
            PaymentMethod::CashOnDelivery => PaymentReceipt::CashOnDelivery {
                surcharge: summary
                    .surcharge
                    .unwrap_or_else(|| Price::zero(cart.currency())),
            },
            PaymentMethod::CardPayment => PaymentReceipt::CardPayment {
                masked_number: mask_card(request.card.number.trim()),
                expiry: request.card.expiry.trim().to_string(),
            },
            PaymentMethod::Upi => PaymentReceipt::Upi {
                upi_id: request.upi_id.trim().to_string(),
            },
        };

        Ok(OrderConfirmation {
            order_id: Uuid::new_v4().to_string(),
            customer_name: delivery.name,
            address: delivery.address,
            phone: format!("{} {}", PHONE_PREFIX, delivery.phone),
            lines: summary.lines,
            payment,
            subtotal: summary.subtotal,
            total: summary.total,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aed(amount: f64) -> Price {
        Price::new(amount, Currency::AED)
    }

    fn cart_with(prices: &[f64]) -> Cart {
        let mut cart = Cart::new(Currency::AED);
        for (i, price) in prices.iter().enumerate() {
            cart.add(Product::electronics(format!("E{}", i), format!("Item {}", i), aed(*price)));
        }
        cart
    }

    fn delivery() -> DeliveryDetails {
        DeliveryDetails::new("Aisha", "Marina Walk 12, Dubai", "501234567")
    }

    fn card_request(number: &str, expiry: &str, cvv: &str) -> CheckoutRequest {
        CheckoutRequest::new(delivery(), PaymentMethod::CardPayment)
            .with_card(CardDetails::new(number, expiry, cvv))
    }

    fn card_error(request: &CheckoutRequest) -> CardDetailsError {
        match CheckoutValidator::validate(&cart_with(&[100.0]), request) {
            Err(CartError::InvalidCardDetails(reason)) => reason,
            other => panic!("expected card error, got {:?}", other),
        }
    }

    #[test]
    fn test_mask_card() {
        assert_eq!(mask_card("4111111111111111"), "****-****-****-1111");
        assert_eq!(mask_card("1234"), "****-****-****-1234");
        assert_eq!(mask_card("123"), "123");
        assert_eq!(mask_card(""), "");
    }

    #[test]
    fn test_expiry_format() {
        assert!(is_valid_expiry("01/27"));
        assert!(is_valid_expiry("12/30"));
        assert!(!is_valid_expiry("00/27"));
        assert!(!is_valid_expiry("13/27"));
        assert!(!is_valid_expiry("1/27"));
        assert!(!is_valid_expiry("01-27"));
    }

    #[test]
    fn test_summary_totals_by_method() {
        let cart = cart_with(&[100.0, 49.5]);

        let cod = CheckoutValidator::generate_summary(&cart, PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(cod.total, aed(169.5));
        assert_eq!(cod.surcharge, Some(aed(20.0)));
        assert_eq!(cod.lines.len(), 2);

        let card = CheckoutValidator::generate_summary(&cart, PaymentMethod::CardPayment).unwrap();
        assert_eq!(card.total, cart.total());
        assert_eq!(card.surcharge, None);

        let upi = CheckoutValidator::generate_summary(&cart, PaymentMethod::Upi).unwrap();
        assert_eq!(upi.total, cart.total());
    }

    #[test]
    fn test_summary_requires_items_only() {
        let empty = Cart::new(Currency::AED);
        assert_eq!(
            CheckoutValidator::generate_summary(&empty, PaymentMethod::Upi),
            Err(CartError::EmptyCart)
        );
        // no delivery or payment data needed
        assert!(CheckoutValidator::generate_summary(&cart_with(&[10.0]), PaymentMethod::CardPayment).is_ok());
    }

    #[test]
    fn test_empty_cart_wins_over_other_failures() {
        let request = CheckoutRequest::default();
        assert_eq!(
            CheckoutValidator::validate(&Cart::new(Currency::AED), &request),
            Err(CartError::EmptyCart)
        );
    }

    #[test]
    fn test_missing_delivery_info() {
        let cart = cart_with(&[10.0]);
        let request = CheckoutRequest::new(
            DeliveryDetails::new("Aisha", "   ", "501234567"),
            PaymentMethod::CashOnDelivery,
        );

        assert_eq!(
            CheckoutValidator::validate(&cart, &request),
            Err(CartError::MissingDeliveryInfo {
                field: DeliveryField::Address
            })
        );
    }

    #[test]
    fn test_phone_must_be_nine_digits() {
        let cart = cart_with(&[10.0]);
        for phone in ["50123456", "5012345678", "50123456a", "+971501234"] {
            let request = CheckoutRequest::new(
                DeliveryDetails::new("Aisha", "Dubai", phone),
                PaymentMethod::CashOnDelivery,
            );
            assert_eq!(
                CheckoutValidator::validate(&cart, &request),
                Err(CartError::InvalidPhone),
                "phone {}",
                phone
            );
        }
    }

    #[test]
    fn test_card_checks_in_order() {
        assert_eq!(
            card_error(&card_request("", "12/27", "123")),
            CardDetailsError::MissingField(CardField::Number)
        );
        assert_eq!(
            card_error(&card_request("4111111111111111", "12/27", "")),
            CardDetailsError::MissingField(CardField::Cvv)
        );
        assert_eq!(
            card_error(&card_request("411111111111111", "12/27", "12")),
            CardDetailsError::CardNumberLength
        );
        assert_eq!(
            card_error(&card_request("4111111111111111", "12/27", "12")),
            CardDetailsError::CvvLength
        );
        assert_eq!(
            card_error(&card_request("4111111111111111", "13/27", "123")),
            CardDetailsError::InvalidExpiry
        );
        assert!(CheckoutValidator::validate(
            &cart_with(&[100.0]),
            &card_request("4111111111111111", "12/27", "123")
        )
        .is_ok());
    }

    #[test]
    fn test_upi_checks() {
        let cart = cart_with(&[10.0]);
        let request = |upi: &str| {
            CheckoutRequest::new(delivery(), PaymentMethod::Upi).with_upi_id(upi)
        };

        assert_eq!(
            CheckoutValidator::validate(&cart, &request("")),
            Err(CartError::InvalidUpiId(UpiIdError::Missing))
        );
        assert_eq!(
            CheckoutValidator::validate(&cart, &request("12345")),
            Err(CartError::InvalidUpiId(UpiIdError::Format))
        );
        assert_eq!(
            CheckoutValidator::validate(&cart, &request("12345a")),
            Err(CartError::InvalidUpiId(UpiIdError::Format))
        );
        assert!(CheckoutValidator::validate(&cart, &request("123456")).is_ok());
    }

    #[test]
    fn test_payment_fields_ignored_for_other_methods() {
        let cart = cart_with(&[10.0]);
        let request = CheckoutRequest::new(delivery(), PaymentMethod::CashOnDelivery)
            .with_card(CardDetails::new("bad", "bad", "bad"))
            .with_upi_id("x");

        assert!(CheckoutValidator::validate(&cart, &request).is_ok());
    }

    #[test]
    fn test_confirm_card_order() {
        let cart = cart_with(&[100.0, 60.0]);
        let confirmation =
            CheckoutValidator::confirm(&cart, &card_request("4111111111111111", "12/27", "123"))
                .unwrap();

        assert_eq!(confirmation.total, aed(160.0));
        assert_eq!(confirmation.phone, "+971 501234567");
        assert_eq!(confirmation.item_count(), 2);
        assert_eq!(
            confirmation.payment,
            PaymentReceipt::CardPayment {
                masked_number: "****-****-****-1111".into(),
                expiry: "12/27".into()
            }
        );
        // confirming does not touch the cart
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_confirm_cod_order_adds_surcharge() {
        let cart = cart_with(&[100.0]);
        let confirmation = CheckoutValidator::confirm(
            &cart,
            &CheckoutRequest::new(delivery(), PaymentMethod::CashOnDelivery),
        )
        .unwrap();

        assert_eq!(confirmation.subtotal, aed(100.0));
        assert_eq!(confirmation.total, aed(120.0));
        assert_eq!(
            confirmation.payment,
            PaymentReceipt::CashOnDelivery {
                surcharge: aed(20.0)
            }
        );
    }

    #[test]
    fn test_request_deserializes_with_missing_fields() {
        let request: CheckoutRequest = serde_json::from_str(
            r#"{"delivery": {"name": "Aisha"}, "payment_method": "upi", "upi_id": "998877"}"#,
        )
        .unwrap();

        assert_eq!(request.payment_method, PaymentMethod::Upi);
        assert_eq!(request.delivery.phone, "");
        assert_eq!(request.card, CardDetails::default());
    }
}

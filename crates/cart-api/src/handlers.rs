//! # Request Handlers
//!
//! Axum request handlers for the shopping API.
//! Every handler locks the session for the whole request, so actions never
//! interleave.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cart_core::{
    BudgetUsage, CartError, Category, CheckoutRequest, CredentialStore, OrderConfirmation,
    OrderSummary, PaymentMethod, Price, Product, Refund, Reservation,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Signup and login body
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
    /// Optional budget limit to set right after login
    #[serde(default)]
    pub budget: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetResponse>,
}

/// Product listing filter
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    /// Limit in major currency units
    pub limit: f64,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub is_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<BudgetUsage>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<Product>,
    pub count: usize,
    pub total: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub product_id: String,
    /// `YYYY-MM-DD`
    pub planned_date: NaiveDate,
}

/// A reservation as listed, with its 1-based position
#[derive(Debug, Serialize)]
pub struct ReservationEntry {
    pub position: usize,
    #[serde(flatten)]
    pub reservation: Reservation,
}

/// Reservation details; active reservations include what cancelling today
/// would refund
#[derive(Debug, Serialize)]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_if_cancelled_today: Option<Refund>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub reservation: Reservation,
    pub cart: CartResponse,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable failure tag, e.g. "budget_exceeded"
    pub kind: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, kind: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Structured fields the client needs to prompt a correction
fn error_details(err: &CartError) -> Option<serde_json::Value> {
    match err {
        CartError::BudgetExceeded {
            price,
            current_total,
            limit,
        } => Some(serde_json::json!({
            "price": price,
            "current_total": current_total,
            "limit": limit,
        })),
        CartError::MissingDeliveryInfo { field } => Some(serde_json::json!({ "field": field })),
        CartError::InvalidCardDetails(reason) => serde_json::to_value(reason).ok(),
        CartError::InvalidUpiId(reason) => Some(serde_json::json!({ "reason": reason })),
        CartError::InvalidDate { planned, today } => Some(serde_json::json!({
            "planned_date": planned,
            "today": today,
        })),
        CartError::AlreadyTerminal { status } => Some(serde_json::json!({ "status": status })),
        _ => None,
    }
}

pub(crate) fn cart_error_to_response(err: CartError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), err.kind(), code);
    if let Some(details) = error_details(&err) {
        response = response.with_details(details);
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn cart_response(session: &cart_core::Session) -> Result<CartResponse, ApiError> {
    let cart = session.cart().map_err(cart_error_to_response)?;
    Ok(CartResponse {
        items: cart.items().to_vec(),
        count: cart.len(),
        total: cart.total(),
        budget: session.budget_usage().map_err(cart_error_to_response)?,
    })
}

fn budget_response(session: &cart_core::Session) -> Result<BudgetResponse, ApiError> {
    let budget = session.budget().map_err(cart_error_to_response)?;
    Ok(BudgetResponse {
        is_set: budget.is_set(),
        limit: budget.limit(),
        usage: session.budget_usage().map_err(cart_error_to_response)?,
    })
}

fn lookup_product<'a>(state: &'a AppState, product_id: &str) -> Result<&'a Product, ApiError> {
    state
        .catalog
        .require(product_id)
        .map_err(cart_error_to_response)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "smart-cart",
        "version": env!("CARGO_PKG_VERSION"),
        "products": state.catalog.len(),
    }))
}

/// Create an account
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let mut credentials = state.credentials.write().await;
    credentials
        .register(&request.username, &request.password)
        .map_err(cart_error_to_response)?;

    info!("Registered user {}", request.username.trim());
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            username: request.username.trim().to_string(),
            budget: None,
        }),
    ))
}

/// Log in and optionally declare a budget
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let credentials = state.credentials.read().await;
    let mut session = state.session.lock().await;

    session
        .login(&*credentials, &request.username, &request.password)
        .map_err(cart_error_to_response)?;

    if let Some(limit) = request.budget {
        let limit = Price::new(limit, state.catalog.currency());
        if let Err(e) = session.set_budget(limit) {
            // login still succeeds, the budget just stays unset
            warn!("Ignoring budget at login: {}", e);
        }
    }

    Ok(Json(UserResponse {
        username: request.username.trim().to_string(),
        budget: Some(budget_response(&session)?),
    }))
}

/// Log out; empties the cart and unsets the budget
pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.session.lock().await.logout();
    StatusCode::NO_CONTENT
}

/// List products, narrowed by category and, once logged in, by the session
/// budget
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    let session = state.session.lock().await;
    let products: Vec<_> = state
        .catalog
        .list_products(query.category, session.budget().ok())
        .collect();
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = lookup_product(&state, &product_id)?;
    Ok(Json(product.clone()))
}

/// Current budget and usage
pub async fn get_budget(State(state): State<AppState>) -> Result<Json<BudgetResponse>, ApiError> {
    let session = state.session.lock().await;
    Ok(Json(budget_response(&session)?))
}

/// Set or change the budget
#[instrument(skip(state))]
pub async fn set_budget(
    State(state): State<AppState>,
    Json(request): Json<SetBudgetRequest>,
) -> Result<Json<BudgetResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session
        .set_budget(Price::new(request.limit, state.catalog.currency()))
        .map_err(cart_error_to_response)?;
    Ok(Json(budget_response(&session)?))
}

/// Remove the budget limit
pub async fn clear_budget(State(state): State<AppState>) -> Result<Json<BudgetResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session.clear_budget().map_err(cart_error_to_response)?;
    Ok(Json(budget_response(&session)?))
}

/// View the cart
pub async fn get_cart(State(state): State<AppState>) -> Result<Json<CartResponse>, ApiError> {
    let session = state.session.lock().await;
    Ok(Json(cart_response(&session)?))
}

/// Add a catalog product to the cart, subject to the budget
#[instrument(skip(state, request), fields(product_id = %request.product_id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session.require_user().map_err(cart_error_to_response)?;
    let product = lookup_product(&state, &request.product_id)?;

    session.add_to_cart(product).map_err(|e| {
        warn!("Add to cart rejected: {}", e);
        cart_error_to_response(e)
    })?;
    Ok(Json(cart_response(&session)?))
}

/// Remove a product from the cart; absent ids are a no-op
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session
        .remove_from_cart(&product_id)
        .map_err(cart_error_to_response)?;
    Ok(Json(cart_response(&session)?))
}

/// List reservations in arrival order
pub async fn list_reservations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.lock().await;
    let ledger = session.reservations().map_err(cart_error_to_response)?;
    let reservations: Vec<_> = ledger
        .list()
        .iter()
        .enumerate()
        .map(|(i, r)| ReservationEntry {
            position: i + 1,
            reservation: r.clone(),
        })
        .collect();
    Ok(Json(serde_json::json!({
        "reservations": reservations,
        "count": reservations.len()
    })))
}

/// Reserve a product for a planned purchase date
#[instrument(skip(state, request), fields(product_id = %request.product_id, planned = %request.planned_date))]
pub async fn reserve(
    State(state): State<AppState>,
    Json(request): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let today = state.today();
    let mut session = state.session.lock().await;
    session.require_user().map_err(cart_error_to_response)?;
    let product = lookup_product(&state, &request.product_id)?;

    let reservation = session
        .reserve(product, request.planned_date, today)
        .map_err(cart_error_to_response)?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Reservation details
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<Json<ReservationDetails>, ApiError> {
    let today = state.today();
    let session = state.session.lock().await;
    let reservation = session
        .reservations()
        .and_then(|ledger| ledger.require(&reservation_id))
        .map_err(cart_error_to_response)?;

    Ok(Json(ReservationDetails {
        reservation: reservation.clone(),
        refund_if_cancelled_today: reservation
            .is_active()
            .then(|| reservation.refund_quote(today)),
    }))
}

/// Cancel a reservation and report the refund
#[instrument(skip(state))]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<Json<Refund>, ApiError> {
    let today = state.today();
    let mut session = state.session.lock().await;
    let refund = session
        .cancel_reservation(&reservation_id, today)
        .map_err(cart_error_to_response)?;
    Ok(Json(refund))
}

/// Move a reserved product into the cart
#[instrument(skip(state))]
pub async fn purchase_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let today = state.today();
    let mut session = state.session.lock().await;
    let reservation = session
        .purchase_reservation(&reservation_id, today)
        .map_err(cart_error_to_response)?;
    Ok(Json(PurchaseResponse {
        reservation,
        cart: cart_response(&session)?,
    }))
}

/// Order preview for a payment method
pub async fn checkout_summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<OrderSummary>, ApiError> {
    let session = state.session.lock().await;
    let summary = session
        .summary(request.payment_method)
        .map_err(cart_error_to_response)?;
    Ok(Json(summary))
}

/// Validate checkout details and place the order
#[instrument(skip(state, request), fields(payment = %request.payment_method))]
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<OrderConfirmation>, ApiError> {
    let mut session = state.session.lock().await;
    let confirmation = session.place_order(&request).map_err(|e| {
        warn!("Checkout rejected: {}", e);
        cart_error_to_response(e)
    })?;

    info!("Order confirmed: {}", confirmation.order_id);
    Ok(Json(confirmation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{CardDetailsError, Currency};

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", "test", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert!(err.details.is_none());
    }

    #[test]
    fn test_cart_error_conversion() {
        let (status, _json) = cart_error_to_response(CartError::EmptyCart);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _json) = cart_error_to_response(CartError::NotAuthenticated);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_budget_exceeded_details() {
        let err = CartError::BudgetExceeded {
            price: Price::new(60.0, Currency::AED),
            current_total: Price::new(100.0, Currency::AED),
            limit: Price::new(150.0, Currency::AED),
        };
        let (status, Json(body)) = cart_error_to_response(err);

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.kind, "budget_exceeded");
        let details = body.details.unwrap();
        assert_eq!(details["price"]["amount"], 6000);
        assert_eq!(details["limit"]["amount"], 15000);
    }

    #[test]
    fn test_card_error_details() {
        let (status, Json(body)) =
            cart_error_to_response(CartError::InvalidCardDetails(CardDetailsError::CvvLength));

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.details.unwrap()["reason"], "cvv_length");
    }
}

//! REST API for the booking service using Axum.
//!
//! Public endpoints drive the booking flow (payment create/verify, gateway
//! return page, confirmation email, hotel and booking lookups). Everything
//! under `/api/admin` except `/login` sits behind the token middleware, which
//! rejects the request before any handler or storage access runs.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    middleware::{self, Next},
    response::{Redirect, Response},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use crate::auth::{create_jwt, token_from_headers, validate_jwt, verify_password};
use crate::error::AppError;
use crate::mailer::ConfirmationEmail;
use crate::models::{BookingForm, Claims, HotelInput, InventoryCounter, PaymentSummary};
use crate::openapi::ApiDoc;
use crate::payments::{self, PaymentInitiated, Verification, VerificationResponse};
use crate::pricing::ROOM_RATES;
use crate::state::AppState;
use crate::storage::BookingQuery;

type SharedState = Arc<AppState>;

/// Unwrap a JSON body, turning malformed or mistyped input into a 400 with
/// the usual error envelope instead of axum's plain-text rejection.
fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

#[derive(Deserialize)]
pub struct UserLogin {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: LoginUser,
}

#[derive(Serialize)]
pub struct LoginUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

/// Generic acknowledgement body.
#[derive(Serialize, ToSchema)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Identifiers the gateway hands back after payment.
#[derive(Deserialize, ToSchema)]
pub struct VerifyPaymentRest {
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub payment_request_id: String,
}

#[derive(Deserialize)]
pub struct GatewayReturnQuery {
    pub payment_id: Option<String>,
    pub payment_request_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingLookupQuery {
    pub email: Option<String>,
    pub booking_id: Option<String>,
}

#[derive(Deserialize)]
pub struct InventoryAdjustRest {
    pub field: InventoryCounter,
    pub change: i64,
}

/// Reason codes understood by the static booking-error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReason {
    BookingNotFound,
    InternalError,
}

impl ErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::BookingNotFound => "BookingNotFound",
            ErrorReason::InternalError => "InternalError",
        }
    }

    fn from_error(error: &AppError) -> Self {
        match error {
            AppError::Validation(_) | AppError::NotFound(_) => ErrorReason::BookingNotFound,
            _ => ErrorReason::InternalError,
        }
    }
}

async fn auth_middleware(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_headers(req.headers()).ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;
    let claims = validate_jwt(state.jwt_secret(), &token).map_err(|e| {
        warn!(error = %e, "rejected admin token");
        AppError::Unauthorized("Unauthorized".to_string())
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Create the Axum router for the whole service.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let admin_routes = Router::new()
        .route("/stats", get(stats_handler))
        .route("/hotels", get(list_hotels_handler).post(create_hotel_handler))
        .route(
            "/hotels/:hotel_id",
            get(get_hotel_handler).put(update_hotel_handler).delete(delete_hotel_handler),
        )
        .route("/bookings", get(admin_bookings_handler))
        .route("/payments", get(admin_payments_handler))
        .route("/inventory", get(inventory_handler))
        .route("/inventory/:item_id", patch(adjust_inventory_handler))
        .route("/settings", get(get_settings_handler).put(put_settings_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route("/login", post(login_handler))
        .merge(admin_routes);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/hotels", get(public_hotels_handler))
        .route("/api/room-types", get(room_types_handler))
        .route("/api/bookings", get(booking_lookup_handler))
        .route("/api/payment/create", post(create_payment_handler))
        .route("/api/payment/verify", post(verify_payment_handler))
        .route("/api/email/send-confirmation", post(send_confirmation_handler))
        .route("/booking/success", get(gateway_return_handler))
        .nest("/api/admin", admin)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> Json<ApiMessage> {
    ApiMessage::ok("Hotel booking API healthy")
}

// --- Public booking flow ---

/// Price the stay, open a gateway payment request and record a pending booking.
#[utoipa::path(
    post,
    path = "/api/payment/create",
    request_body = BookingForm,
    responses(
        (status = 200, description = "Payment request created", body = PaymentInitiated),
        (status = 400, description = "Invalid booking form"),
        (status = 502, description = "Gateway rejected or unreachable"),
    ),
    tag = "payments"
)]
pub async fn create_payment_handler(
    State(state): State<SharedState>,
    body: Result<Json<BookingForm>, JsonRejection>,
) -> Result<Json<PaymentInitiated>, AppError> {
    let form = extract_json(body)?;
    payments::initiate_payment(&state, form).await.map(Json)
}

/// Check settlement with the gateway and settle the booking.
#[utoipa::path(
    post,
    path = "/api/payment/verify",
    request_body = VerifyPaymentRest,
    responses(
        (status = 200, description = "Settlement result; `success` is false when funds were not captured", body = VerificationResponse),
        (status = 400, description = "Missing identifiers"),
        (status = 502, description = "Gateway query failed"),
    ),
    tag = "payments"
)]
pub async fn verify_payment_handler(
    State(state): State<SharedState>,
    body: Result<Json<VerifyPaymentRest>, JsonRejection>,
) -> Result<Json<VerificationResponse>, AppError> {
    let payload = extract_json(body)?;
    let verification = payments::verify_payment(&state, &payload.payment_id, &payload.payment_request_id).await?;
    Ok(Json(VerificationResponse::from(&verification)))
}

/// Send the booking confirmation email.
#[utoipa::path(
    post,
    path = "/api/email/send-confirmation",
    request_body = ConfirmationEmail,
    responses(
        (status = 200, description = "Email accepted by the provider", body = ApiMessage),
        (status = 502, description = "Email provider failed"),
    ),
    tag = "email"
)]
pub async fn send_confirmation_handler(
    State(state): State<SharedState>,
    body: Result<Json<ConfirmationEmail>, JsonRejection>,
) -> Result<Json<ApiMessage>, AppError> {
    let email = extract_json(body)?;
    payments::send_confirmation(&state, &email)
        .await
        .map_err(|e| AppError::Upstream("Failed to send email", e.to_string()))?;
    Ok(ApiMessage::ok("Confirmation email sent successfully"))
}

fn page_redirect(state: &AppState, path: &str, params: &[(&str, &str)]) -> Redirect {
    match reqwest::Url::parse_with_params(&state.config.page_url(path), params) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(e) => {
            warn!(error = %e, path, "could not build redirect url");
            Redirect::to("/booking-error?message=InternalError")
        }
    }
}

fn error_redirect(state: &AppState, reason: ErrorReason) -> Redirect {
    page_redirect(state, "/booking-error", &[("message", reason.as_str())])
}

/// Landing point of the gateway redirect: verify, then send the guest to the
/// matching result page.
async fn gateway_return_handler(
    State(state): State<SharedState>,
    Query(query): Query<GatewayReturnQuery>,
) -> Redirect {
    let payment_id = query.payment_id.unwrap_or_default();
    let payment_request_id = query.payment_request_id.unwrap_or_default();

    match payments::verify_payment(&state, &payment_id, &payment_request_id).await {
        Ok(Verification::Completed { booking: Some(booking), .. }) => {
            page_redirect(&state, "/booking-success", &[("id", booking.booking_id.as_str())])
        }
        Ok(Verification::Completed { booking: None, .. }) => {
            warn!(%payment_id, %payment_request_id, "captured payment has no local booking");
            error_redirect(&state, ErrorReason::BookingNotFound)
        }
        Ok(Verification::NotCaptured { booking, .. }) => {
            let id = booking.map(|b| b.booking_id).unwrap_or(payment_request_id);
            page_redirect(&state, "/booking-failure", &[("id", id.as_str())])
        }
        Err(e) => {
            warn!(error = %e, "payment verification failed on return");
            error_redirect(&state, ErrorReason::from_error(&e))
        }
    }
}

async fn public_hotels_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let hotels: Vec<_> = state
        .storage
        .list_hotels()?
        .into_iter()
        .filter(|h| h.is_active)
        .collect();
    Ok(Json(json!({ "success": true, "hotels": hotels })))
}

async fn room_types_handler() -> Json<Value> {
    Json(json!({ "success": true, "roomTypes": ROOM_RATES }))
}

async fn booking_lookup_handler(
    State(state): State<SharedState>,
    Query(query): Query<BookingLookupQuery>,
) -> Result<Json<Value>, AppError> {
    let query = BookingQuery {
        email: query.email.filter(|s| !s.is_empty()),
        booking_id: query.booking_id.filter(|s| !s.is_empty()),
    };
    if query.email.is_none() && query.booking_id.is_none() {
        return Err(AppError::Validation("email or bookingId is required".to_string()));
    }
    let bookings = state.storage.find_bookings(&query)?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}

// --- Admin back office ---

async fn login_handler(
    State(state): State<SharedState>,
    body: Result<Json<UserLogin>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let payload = extract_json(body)?;
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("Username and password are required".to_string()));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
    let admin = state.storage.get_admin(&payload.username)?.ok_or_else(invalid)?;

    if !verify_password(&payload.password, &admin.password_hash).unwrap_or(false) {
        warn!(username = %payload.username, "failed admin login");
        return Err(invalid());
    }

    let token = create_jwt(state.jwt_secret(), &admin).map_err(|e| AppError::Internal(e.to_string()))?;
    info!(username = %admin.username, "admin logged in");
    Ok(Json(LoginResponse {
        success: true,
        token,
        user: LoginUser {
            id: admin.id,
            username: admin.username,
            role: admin.role,
        },
    }))
}

async fn stats_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let stats = state.storage.stats()?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

async fn list_hotels_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let hotels = state.storage.list_hotels()?;
    Ok(Json(json!({ "success": true, "hotels": hotels })))
}

async fn create_hotel_handler(
    State(state): State<SharedState>,
    body: Result<Json<HotelInput>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let input = extract_json(body)?;
    input.validate()?;
    let hotel = state.storage.create_hotel(input)?;
    Ok(Json(json!({ "success": true, "hotelId": hotel.id, "hotel": hotel })))
}

async fn get_hotel_handler(
    State(state): State<SharedState>,
    Path(hotel_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let hotel = state
        .storage
        .get_hotel(&hotel_id)?
        .ok_or_else(|| AppError::NotFound(format!("Hotel {hotel_id} not found")))?;
    Ok(Json(json!({ "success": true, "hotel": hotel })))
}

async fn update_hotel_handler(
    State(state): State<SharedState>,
    Path(hotel_id): Path<String>,
    body: Result<Json<HotelInput>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let input = extract_json(body)?;
    input.validate()?;
    let hotel = state
        .storage
        .update_hotel(&hotel_id, input)?
        .ok_or_else(|| AppError::NotFound(format!("Hotel {hotel_id} not found")))?;
    Ok(Json(json!({ "success": true, "hotel": hotel })))
}

async fn delete_hotel_handler(
    State(state): State<SharedState>,
    Path(hotel_id): Path<String>,
) -> Result<Json<ApiMessage>, AppError> {
    if !state.storage.delete_hotel(&hotel_id)? {
        return Err(AppError::NotFound(format!("Hotel {hotel_id} not found")));
    }
    Ok(ApiMessage::ok(format!("Hotel {hotel_id} deleted")))
}

async fn admin_bookings_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let bookings = state.storage.list_bookings()?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}

async fn admin_payments_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let method = state.gateway.name();
    let payments: Vec<PaymentSummary> = state
        .storage
        .list_bookings()?
        .iter()
        .map(|b| PaymentSummary::from_booking(b, method))
        .collect();
    Ok(Json(json!({ "success": true, "payments": payments })))
}

async fn inventory_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let inventory = state.storage.list_inventory()?;
    Ok(Json(json!({ "success": true, "inventory": inventory })))
}

async fn adjust_inventory_handler(
    State(state): State<SharedState>,
    Path(item_id): Path<String>,
    body: Result<Json<InventoryAdjustRest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let payload = extract_json(body)?;
    let item = state
        .storage
        .adjust_inventory(&item_id, payload.field, payload.change)?
        .ok_or_else(|| AppError::NotFound(format!("Inventory item {item_id} not found")))?;
    Ok(Json(json!({ "success": true, "item": item })))
}

async fn get_settings_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let settings = state.storage.get_settings()?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

async fn put_settings_handler(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiMessage>, AppError> {
    let settings = extract_json(body)?;
    if !settings.is_object() {
        return Err(AppError::Validation("Settings must be a JSON object".to_string()));
    }
    state.storage.put_settings(settings)?;
    info!(username = %claims.username, "settings updated");
    Ok(ApiMessage::ok("Settings updated successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::models::{sample_form, AdminUser, PaymentStatus};
    use crate::testing::TestApp;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use tower::ServiceExt; // For .oneshot() testing

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn seed_admin(test: &TestApp) {
        let now = Utc::now();
        test.state
            .storage
            .create_admin(&AdminUser {
                id: "admin-1".to_string(),
                username: "admin".to_string(),
                password_hash: hash_password("admin123").unwrap(),
                role: "superadmin".to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    async fn login(app: &Router) -> String {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({"username": "admin", "password": "admin123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_room_types() {
        let test = TestApp::new("rest_health");
        let app = create_router(test.state.clone());

        let (status, body) = send(&app, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(&app, get_request("/api/room-types", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roomTypes"][0]["price"], 100);
        assert_eq!(body["roomTypes"][1]["key"], "double");
    }

    #[tokio::test]
    async fn test_admin_endpoints_require_token() {
        let test = TestApp::new("rest_unauthorized");
        let app = create_router(test.state.clone());

        for uri in [
            "/api/admin/stats",
            "/api/admin/hotels",
            "/api/admin/bookings",
            "/api/admin/payments",
            "/api/admin/inventory",
            "/api/admin/settings",
        ] {
            let (status, body) = send(&app, get_request(uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["success"], false);

            let (status, _) = send(&app, get_request(uri, Some("not.a.token"))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }

        let (status, _) = send(
            &app,
            json_request("POST", "/api/admin/hotels", None, json!({"name": "Sneaky", "starRating": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(
            &app,
            json_request("PUT", "/api/admin/settings", Some("forged"), json!({"siteName": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Rejected before any handler ran.
        assert!(test.state.storage.list_hotels().unwrap().is_empty());
        assert!(test.state.storage.get_settings().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_flow() {
        let test = TestApp::new("rest_login");
        seed_admin(&test);
        let app = create_router(test.state.clone());

        let (status, _) = send(
            &app,
            json_request("POST", "/api/admin/login", None, json!({"username": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({"username": "admin", "password": "wrong"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({"username": "ghost", "password": "admin123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = login(&app).await;
        let (status, body) = send(&app, get_request("/api/admin/stats", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["totalBookings"], 0);

        // The admin pages may send the token as a cookie instead.
        let request = Request::builder()
            .uri("/api/admin/stats")
            .header(header::COOKIE, format!("admin-token={token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_payment_create_and_verify_over_http() {
        let test = TestApp::new("rest_payment");
        let app = create_router(test.state.clone());

        let form = serde_json::to_value(sample_form()).unwrap();
        let (status, body) = send(&app, json_request("POST", "/api/payment/create", None, form)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["amount"], 450);
        assert!(body["paymentUrl"].as_str().unwrap().starts_with("https://"));
        let request_id = body["paymentRequestId"].as_str().unwrap().to_string();
        let booking_id = body["bookingId"].as_str().unwrap().to_string();

        test.gateway.settle("MOJO10", "Credit", "450.00");
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/payment/verify",
                None,
                json!({"payment_id": "MOJO10", "payment_request_id": request_id}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["bookingConfirmed"], true);
        assert_eq!(body["bookingId"], booking_id.as_str());
        assert_eq!(body["payment"]["status"], "Credit");

        let (status, body) = send(
            &app,
            get_request(&format!("/api/bookings?bookingId={booking_id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bookings"][0]["paymentStatus"], "completed");
        assert_eq!(body["bookings"][0]["paymentId"], "MOJO10");
    }

    #[tokio::test]
    async fn test_payment_rejections_over_http() {
        let test = TestApp::new("rest_payment_rejects");
        let app = create_router(test.state.clone());

        let mut form = serde_json::to_value(sample_form()).unwrap();
        form["email"] = json!("bad-email");
        let (status, body) = send(&app, json_request("POST", "/api/payment/create", None, form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        *test.gateway.reject_create.lock().unwrap() = Some("bad key".to_string());
        let form = serde_json::to_value(sample_form()).unwrap();
        let (status, body) = send(&app, json_request("POST", "/api/payment/create", None, form)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Payment creation failed");

        test.gateway.settle("MOJO11", "Failed", "450.00");
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/payment/verify",
                None,
                json!({"payment_id": "MOJO11", "payment_request_id": "req_unknown"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Payment not completed");

        let (status, _) = send(&app, get_request("/api/bookings", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_bodies_use_error_envelope() {
        let test = TestApp::new("rest_malformed");
        seed_admin(&test);
        let app = create_router(test.state.clone());

        let mut form = serde_json::to_value(sample_form()).unwrap();
        form.as_object_mut().unwrap().remove("checkinDate");
        let (status, body) = send(&app, json_request("POST", "/api/payment/create", None, form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("checkinDate"));

        let mut form = serde_json::to_value(sample_form()).unwrap();
        form["roomType"] = json!("suite");
        let (status, body) = send(&app, json_request("POST", "/api/payment/create", None, form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("suite"));

        // Nothing reached the gateway.
        assert!(test.gateway.created.lock().unwrap().is_empty());

        let (status, body) = send(
            &app,
            json_request("POST", "/api/payment/verify", None, json!({"payment_id": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let token = login(&app).await;
        let (status, body) = send(
            &app,
            json_request(
                "PATCH",
                "/api/admin/inventory/any",
                Some(&token),
                json!({"field": "penthouses", "change": 1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_error_reason_for_return_page() {
        assert_eq!(
            ErrorReason::from_error(&AppError::Validation("missing ids".into())),
            ErrorReason::BookingNotFound
        );
        assert_eq!(
            ErrorReason::from_error(&AppError::Upstream("Payment verification failed", "timeout".into())),
            ErrorReason::InternalError
        );
        assert_eq!(
            ErrorReason::from_error(&AppError::Internal("boom".into())),
            ErrorReason::InternalError
        );
        assert_eq!(ErrorReason::BookingNotFound.as_str(), "BookingNotFound");
    }

    #[tokio::test]
    async fn test_gateway_return_redirects() {
        let test = TestApp::new("rest_return");
        let app = create_router(test.state.clone());

        let initiated = payments::initiate_payment(&test.state, sample_form()).await.unwrap();
        test.gateway.settle("MOJO20", "Credit", "450.00");

        let uri = format!(
            "/booking/success?payment_id=MOJO20&payment_request_id={}",
            initiated.payment_request_id
        );
        let response = app.clone().oneshot(get_request(&uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            format!("http://localhost:3000/booking-success?id={}", initiated.booking_id)
        );

        let response = app.clone().oneshot(get_request("/booking/success", None)).await.unwrap();
        assert_eq!(
            location(&response),
            "http://localhost:3000/booking-error?message=BookingNotFound"
        );

        let uri = format!(
            "/booking/success?payment_id=MOJO_MISSING&payment_request_id={}",
            initiated.payment_request_id
        );
        let response = app.clone().oneshot(get_request(&uri, None)).await.unwrap();
        assert_eq!(
            location(&response),
            "http://localhost:3000/booking-error?message=InternalError"
        );

        let second = payments::initiate_payment(&test.state, sample_form()).await.unwrap();
        test.gateway.settle("MOJO21", "Failed", "450.00");
        let uri = format!(
            "/booking/success?payment_id=MOJO21&payment_request_id={}",
            second.payment_request_id
        );
        let response = app.clone().oneshot(get_request(&uri, None)).await.unwrap();
        assert_eq!(
            location(&response),
            format!("http://localhost:3000/booking-failure?id={}", second.booking_id)
        );
    }

    #[tokio::test]
    async fn test_send_confirmation_endpoint() {
        let test = TestApp::new("rest_email");
        let app = create_router(test.state.clone());
        let payload = json!({
            "email": "asha@example.com",
            "name": "Asha",
            "paymentId": "MOJO30",
            "amount": "450",
            "bookingId": "HRP1700000000000ABCD"
        });

        let (status, body) = send(
            &app,
            json_request("POST", "/api/email/send-confirmation", None, payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(test.mailer.sent.lock().unwrap().len(), 1);

        *test.mailer.fail.lock().unwrap() = true;
        let (status, body) = send(
            &app,
            json_request("POST", "/api/email/send-confirmation", None, payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to send email");
    }

    #[tokio::test]
    async fn test_admin_back_office() {
        let test = TestApp::new("rest_admin");
        seed_admin(&test);
        let app = create_router(test.state.clone());
        let token = login(&app).await;

        // Hotels
        let hotel = json!({
            "name": "Hyatt Regency Pune",
            "imageUrl": "https://img.example.com/hyatt.jpg",
            "starRating": 5,
            "address": "Nagar Rd, Pune",
            "distances": {"railwayStation": "8 km", "airport": "4 km", "venue": "1 km"},
            "roomTypes": [{"type": "Deluxe", "occupancy": "double", "maxGuests": 2, "price": 150}],
            "policies": ["Check-in from 2 PM"]
        });
        let (status, body) = send(&app, json_request("POST", "/api/admin/hotels", Some(&token), hotel.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let hotel_id = body["hotelId"].as_str().unwrap().to_string();
        assert_eq!(body["hotel"]["isActive"], true);

        let (status, _) = send(
            &app,
            json_request("POST", "/api/admin/hotels", Some(&token), json!({"name": "", "starRating": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut edit = hotel.clone();
        edit["isActive"] = json!(false);
        let (status, body) = send(
            &app,
            json_request("PUT", &format!("/api/admin/hotels/{hotel_id}"), Some(&token), edit),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hotel"]["isActive"], false);

        let (_, body) = send(&app, get_request("/api/hotels", None)).await;
        assert_eq!(body["hotels"].as_array().unwrap().len(), 0);

        let (status, _) = send(&app, get_request("/api/admin/hotels/missing", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/hotels/{hotel_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        // Bookings and payments
        payments::initiate_payment(&test.state, sample_form()).await.unwrap();
        let (_, body) = send(&app, get_request("/api/admin/bookings", Some(&token))).await;
        assert_eq!(body["bookings"].as_array().unwrap().len(), 1);
        let (_, body) = send(&app, get_request("/api/admin/payments", Some(&token))).await;
        assert_eq!(body["payments"][0]["paymentMethod"], "FakePay");
        assert_eq!(body["payments"][0]["paymentId"], "N/A");
        assert_eq!(body["payments"][0]["status"], PaymentStatus::Pending.as_str());

        // Inventory
        let (_, body) = send(&app, get_request("/api/admin/inventory", Some(&token))).await;
        let item_id = body["inventory"][0]["id"].as_str().unwrap().to_string();
        let booked = body["inventory"][0]["bookedRooms"].as_i64().unwrap();
        let (status, body) = send(
            &app,
            json_request(
                "PATCH",
                &format!("/api/admin/inventory/{item_id}"),
                Some(&token),
                json!({"field": "bookedRooms", "change": 1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item"]["bookedRooms"], booked + 1);
        let (status, _) = send(
            &app,
            json_request(
                "PATCH",
                "/api/admin/inventory/missing",
                Some(&token),
                json!({"field": "bookedRooms", "change": 1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Settings
        let (_, body) = send(&app, get_request("/api/admin/settings", Some(&token))).await;
        assert_eq!(body["settings"], Value::Null);
        let (status, _) = send(
            &app,
            json_request(
                "PUT",
                "/api/admin/settings",
                Some(&token),
                json!({"siteName": "Hyatt", "paymentGateway": {"instamojo": {"enabled": true}}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, get_request("/api/admin/settings", Some(&token))).await;
        assert_eq!(body["settings"]["paymentGateway"]["instamojo"]["enabled"], true);
        let (status, _) = send(
            &app,
            json_request("PUT", "/api/admin/settings", Some(&token), json!([1, 2])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

//! OpenAPI document for the public booking flow.
//!
//! Served at `/api-docs/openapi.json` with Swagger UI at `/swagger-ui`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hotel Booking API",
        description = "Guest booking flow: price a stay, pay through the gateway, verify settlement and send the confirmation email."
    ),
    paths(
        crate::rest::create_payment_handler,
        crate::rest::verify_payment_handler,
        crate::rest::send_confirmation_handler,
    ),
    components(schemas(
        crate::models::BookingForm,
        crate::models::RoomCategory,
        crate::payments::PaymentInitiated,
        crate::payments::VerificationResponse,
        crate::mailer::ConfirmationEmail,
        crate::rest::VerifyPaymentRest,
        crate::rest::ApiMessage,
    )),
    tags(
        (name = "payments", description = "Payment request creation and verification"),
        (name = "email", description = "Booking confirmation emails"),
    )
)]
pub struct ApiDoc;

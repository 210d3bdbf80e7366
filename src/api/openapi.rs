//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, booking_requests, books, health, notifications};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshare API",
        version = "0.3.0",
        description = "Book sharing REST API: list books, request them from their owners and hand them over"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::sign_up,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::replace_book,
        books::update_book,
        books::delete_book,
        books::list_genres,
        // Booking requests
        booking_requests::list_booking_requests,
        booking_requests::create_booking_request,
        booking_requests::get_booking_request,
        booking_requests::replace_booking_request,
        booking_requests::update_booking_request,
        booking_requests::delete_booking_request,
        booking_requests::manage_booking_request,
        // Notifications
        notifications::list_notifications,
        notifications::get_notification,
    ),
    components(
        schemas(
            // Auth
            auth::SignUpResponse,
            auth::LoginResponse,
            crate::models::user::User,
            crate::models::user::SignUp,
            crate::models::user::Login,
            // Books
            crate::models::book::Book,
            crate::models::book::BookCondition,
            crate::models::book::Genre,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Booking requests
            crate::models::booking_request::BookingStatus,
            crate::models::booking_request::BookingRequest,
            crate::models::booking_request::BookingRequestDetails,
            crate::models::booking_request::CreateBookingRequest,
            crate::models::booking_request::UpdateBookingRequest,
            crate::models::booking_request::PatchBookingRequest,
            crate::models::booking_request::ManageBookingRequest,
            crate::models::booking_request::ManageBookingResponse,
            // Notifications
            crate::models::notification::Notification,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Account endpoints"),
        (name = "books", description = "Book listings"),
        (name = "booking-requests", description = "Requests for books and owner decisions"),
        (name = "notifications", description = "Decision notifications")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

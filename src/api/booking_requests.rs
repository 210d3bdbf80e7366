//! Booking request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::booking_request::{
        BookingRequest, BookingRequestDetails, CreateBookingRequest, ManageBookingRequest,
        ManageBookingResponse, PatchBookingRequest, UpdateBookingRequest,
    },
};

use super::{AuthenticatedUser, ValidJson};

/// List pending requests for books the caller owns
#[utoipa::path(
    get,
    path = "/booking-requests",
    tag = "booking-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Incoming requests", body = Vec<BookingRequestDetails>),
        (status = 204, description = "No incoming requests"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_booking_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Response> {
    let requests = state
        .services
        .booking_requests
        .list_incoming(&claims.caller())
        .await?;

    if requests.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(requests).into_response())
}

/// Request a book
#[utoipa::path(
    post,
    path = "/booking-requests",
    tag = "booking-requests",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Request created", body = BookingRequest),
        (status = 400, description = "Duplicate, self or unavailable book"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_booking_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ValidJson(data): ValidJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingRequest>)> {
    let request = state
        .services
        .booking_requests
        .create(&claims.caller(), &data)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Get a booking request
#[utoipa::path(
    get,
    path = "/booking-requests/{id}",
    tag = "booking-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking request ID")),
    responses(
        (status = 200, description = "Booking request", body = BookingRequestDetails),
        (status = 403, description = "Neither requester nor book owner"),
        (status = 404, description = "Booking request not found")
    )
)]
pub async fn get_booking_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingRequestDetails>> {
    let request = state.services.booking_requests.get(&claims.caller(), id).await?;
    Ok(Json(request))
}

/// Replace a booking request
#[utoipa::path(
    put,
    path = "/booking-requests/{id}",
    tag = "booking-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking request ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking request updated", body = BookingRequestDetails),
        (status = 400, description = "Invalid target book"),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Booking request not found")
    )
)]
pub async fn replace_booking_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidJson(data): ValidJson<UpdateBookingRequest>,
) -> AppResult<Json<BookingRequestDetails>> {
    let request = state
        .services
        .booking_requests
        .update(&claims.caller(), id, &PatchBookingRequest::from(data))
        .await?;
    Ok(Json(request))
}

/// Partially update a booking request
#[utoipa::path(
    patch,
    path = "/booking-requests/{id}",
    tag = "booking-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking request ID")),
    request_body = PatchBookingRequest,
    responses(
        (status = 200, description = "Booking request updated", body = BookingRequestDetails),
        (status = 400, description = "Invalid target book"),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Booking request not found")
    )
)]
pub async fn update_booking_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidJson(data): ValidJson<PatchBookingRequest>,
) -> AppResult<Json<BookingRequestDetails>> {
    let request = state
        .services
        .booking_requests
        .update(&claims.caller(), id, &data)
        .await?;
    Ok(Json(request))
}

/// Cancel a booking request
#[utoipa::path(
    delete,
    path = "/booking-requests/{id}",
    tag = "booking-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking request ID")),
    responses(
        (status = 204, description = "Booking request canceled"),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Booking request not found")
    )
)]
pub async fn delete_booking_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.booking_requests.delete(&claims.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve or reject a booking request
#[utoipa::path(
    put,
    path = "/booking-requests/{id}/manage",
    tag = "booking-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking request ID")),
    request_body = ManageBookingRequest,
    responses(
        (status = 200, description = "Decision applied", body = ManageBookingResponse),
        (status = 400, description = "approve missing or not a boolean"),
        (status = 403, description = "Not the book owner"),
        (status = 404, description = "Booking request not found")
    )
)]
pub async fn manage_booking_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidJson(data): ValidJson<ManageBookingRequest>,
) -> AppResult<Json<ManageBookingResponse>> {
    let resolution = state
        .services
        .booking_requests
        .resolve(&claims.caller(), id, &data)
        .await?;

    Ok(Json(ManageBookingResponse {
        approve: resolution.approved,
    }))
}

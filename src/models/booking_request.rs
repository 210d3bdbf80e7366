//! Booking request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Booking request status.
///
/// Resolution deletes requests instead of moving them to a terminal
/// status, so live rows are always `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Approved" => Ok(BookingStatus::Approved),
            "Rejected" => Ok(BookingStatus::Rejected),
            "Canceled" => Ok(BookingStatus::Canceled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for BookingStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookingStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookingStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Booking request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingRequest {
    pub id: Uuid,
    #[serde(rename = "book")]
    pub book_id: Uuid,
    #[serde(rename = "requester")]
    pub requester_id: i32,
    pub status: BookingStatus,
    pub request_selected: bool,
    pub additional_information: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking request with read-only details of the requested book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingRequestDetails {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_title: String,
    pub book_owner_id: i32,
    pub book_owner_email: String,
    pub requester: i32,
    pub status: BookingStatus,
    pub request_selected: bool,
    pub additional_information: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create booking request body.
///
/// `requester`, `status` and `request_selected` are not accepted from
/// clients; unknown fields are ignored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    /// Id of the requested book
    pub book: Uuid,
    /// Comment to the owner
    #[validate(length(max = 2000, message = "Additional information is limited to 2000 characters"))]
    pub additional_information: Option<String>,
}

/// Full update (PUT)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingRequest {
    #[serde(alias = "book_id")]
    pub book: Uuid,
    #[validate(length(max = 2000, message = "Additional information is limited to 2000 characters"))]
    pub additional_information: Option<String>,
}

/// Partial update (PATCH)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct PatchBookingRequest {
    #[serde(alias = "book_id")]
    pub book: Option<Uuid>,
    #[validate(length(max = 2000, message = "Additional information is limited to 2000 characters"))]
    pub additional_information: Option<String>,
}

impl From<UpdateBookingRequest> for PatchBookingRequest {
    fn from(update: UpdateBookingRequest) -> Self {
        Self {
            book: Some(update.book),
            additional_information: Some(update.additional_information.unwrap_or_default()),
        }
    }
}

/// Owner decision on a booking request.
///
/// `approve` is kept as raw JSON so that non-boolean values are reported
/// as validation errors rather than body rejections.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ManageBookingRequest {
    #[serde(default)]
    #[schema(value_type = bool)]
    pub approve: Value,
}

impl ManageBookingRequest {
    pub fn decision(&self) -> AppResult<bool> {
        match &self.approve {
            Value::Bool(approve) => Ok(*approve),
            Value::Null => Err(AppError::Validation("approve: This field is required.".to_string())),
            _ => Err(AppError::Validation("approve: Must be a valid boolean.".to_string())),
        }
    }
}

/// Echo of an applied decision
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManageBookingResponse {
    pub approve: bool,
}

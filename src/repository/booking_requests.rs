//! Booking requests repository

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, RuleViolation},
    models::booking_request::{BookingRequest, BookingRequestDetails},
};

use super::unique_violation;

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.book_id, b.title AS book_title, b.owner_id AS book_owner_id,
           o.email AS book_owner_email, r.requester_id AS requester, r.status,
           r.request_selected, r.additional_information, r.created_at, r.updated_at
    FROM booking_requests r
    JOIN books b ON b.id = r.book_id
    JOIN users o ON o.id = b.owner_id
"#;

#[derive(Clone)]
pub struct BookingRequestsRepository {
    pool: Pool<Postgres>,
}

impl BookingRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get booking request by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookingRequest> {
        sqlx::query_as::<_, BookingRequest>("SELECT * FROM booking_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Get booking request by ID on the given connection
    pub async fn find_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Option<BookingRequest>> {
        let row = sqlx::query_as::<_, BookingRequest>("SELECT * FROM booking_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row)
    }

    /// Get booking request with book and owner details
    pub async fn get_details(&self, id: Uuid) -> AppResult<BookingRequestDetails> {
        sqlx::query_as::<_, BookingRequestDetails>(&format!("{} WHERE r.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Requests for books currently owned by `owner_id`
    pub async fn list_for_owner(&self, owner_id: i32) -> AppResult<Vec<BookingRequestDetails>> {
        let rows = sqlx::query_as::<_, BookingRequestDetails>(&format!(
            "{} WHERE b.owner_id = $1 ORDER BY r.created_at",
            DETAILS_SELECT
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Whether `requester_id` already has a request for `book_id`, ignoring `exclude`
    pub async fn exists_for(
        &self,
        conn: &mut PgConnection,
        book_id: Uuid,
        requester_id: i32,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM booking_requests
                WHERE book_id = $1 AND requester_id = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(book_id)
        .bind(requester_id)
        .bind(exclude)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    /// Insert a pending request
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        book_id: Uuid,
        requester_id: i32,
        additional_information: &str,
    ) -> AppResult<BookingRequest> {
        sqlx::query_as::<_, BookingRequest>(
            r#"
            INSERT INTO booking_requests (id, book_id, requester_id, additional_information)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(requester_id)
        .bind(additional_information)
        .fetch_one(&mut *conn)
        .await
        .map_err(duplicate_request)
    }

    /// Change the requested book and/or comment of a request
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        book_id: Option<Uuid>,
        additional_information: Option<&str>,
    ) -> AppResult<BookingRequest> {
        sqlx::query_as::<_, BookingRequest>(
            r#"
            UPDATE booking_requests SET
                book_id = COALESCE($2, book_id),
                additional_information = COALESCE($3, additional_information),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(book_id)
        .bind(additional_information)
        .fetch_optional(&mut *conn)
        .await
        .map_err(duplicate_request)?
        .ok_or_else(|| not_found(id))
    }

    /// Delete a single request
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM booking_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    /// Purge every request for a book, returning how many were removed.
    ///
    /// Must run in the same transaction as the ownership transfer that
    /// makes the requests moot.
    pub async fn purge_for_book(&self, conn: &mut PgConnection, book_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM booking_requests WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Booking request {} not found", id))
}

fn duplicate_request(error: sqlx::Error) -> AppError {
    match unique_violation(&error).as_deref() {
        Some("booking_requests_book_requester_key") => RuleViolation::DuplicateRequest.into(),
        _ => error.into(),
    }
}

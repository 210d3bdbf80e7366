//! Notifications repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::notification::{NewNotification, Notification},
};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Write a notification on the given connection (a resolution transaction)
    pub async fn create(&self, conn: &mut PgConnection, data: &NewNotification) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, book, approved, retrieval_location)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.book)
        .bind(data.approved)
        .bind(&data.retrieval_location)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Notifications addressed to a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }
}

//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{
        normalize_author, normalize_genre, normalize_names, Book, BookQuery, CreateBook, Genre,
        UpdateBook,
    },
};

use super::unique_violation;

/// Book columns plus aggregated genre and author names
const BOOK_SELECT: &str = r#"
    SELECT b.id, b.owner_id, b.title, b.isbn, b.description, b.condition, b.available,
           b.retrieval_location, b.created_at, b.updated_at,
           ARRAY(
               SELECT g.genre_name FROM book_genres bg
               JOIN genres g ON g.id = bg.genre_id
               WHERE bg.book_id = b.id ORDER BY g.genre_name
           )::text[] AS genres,
           ARRAY(
               SELECT a.author_name FROM book_authors ba
               JOIN authors a ON a.id = ba.author_id
               WHERE ba.book_id = b.id ORDER BY a.author_name
           )::text[] AS authors
    FROM books b
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Fetch a book and lock its row until the surrounding transaction ends.
    ///
    /// Every write that depends on a book's owner or availability takes this
    /// lock first, which serializes request creation and resolution per book.
    pub async fn find_for_update(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1 FOR UPDATE OF b", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(book)
    }

    /// List books matching the given filters
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.title.is_some() {
            conditions.push(format!("b.title ILIKE ${}", idx));
            idx += 1;
        }
        if query.author.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM book_authors ba JOIN authors a ON a.id = ba.author_id \
                 WHERE ba.book_id = b.id AND a.author_name = ${})",
                idx
            ));
            idx += 1;
        }
        if query.genre.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM book_genres bg JOIN genres g ON g.id = bg.genre_id \
                 WHERE bg.book_id = b.id AND g.genre_name = ${})",
                idx
            ));
            idx += 1;
        }
        if query.condition.is_some() {
            conditions.push(format!("b.condition = ${}", idx));
            idx += 1;
        }
        if query.available.is_some() {
            conditions.push(format!("b.available = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_q = format!("{} {} ORDER BY b.created_at DESC", BOOK_SELECT, where_clause);
        let mut builder = sqlx::query_as::<_, Book>(&select_q);
        if let Some(ref title) = query.title {
            builder = builder.bind(format!("%{}%", title));
        }
        if let Some(ref author) = query.author {
            builder = builder.bind(normalize_author(author));
        }
        if let Some(ref genre) = query.genre {
            builder = builder.bind(normalize_genre(genre));
        }
        if let Some(condition) = query.condition {
            builder = builder.bind(condition);
        }
        if let Some(available) = query.available {
            builder = builder.bind(available);
        }

        let books = builder.fetch_all(&self.pool).await?;
        Ok(books)
    }

    /// Create a book owned by `owner_id`
    pub async fn create(&self, owner_id: i32, data: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO books (
                id, owner_id, title, isbn, description, condition, available, retrieval_location
            )
            VALUES ($1, $2, $3, $4, COALESCE($5, 'No description'), $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&data.title)
        .bind(&data.isbn)
        .bind(&data.description)
        .bind(data.condition.unwrap_or_default())
        .bind(data.available.unwrap_or(true))
        .bind(&data.retrieval_location)
        .execute(&mut *tx)
        .await
        .map_err(book_conflict)?;

        Self::set_genres(&mut *tx, id, &data.genres).await?;
        Self::set_authors(&mut *tx, id, &data.authors).await?;

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Update a book on the given connection; `None` fields are left unchanged
    pub async fn update(&self, conn: &mut PgConnection, id: Uuid, data: &UpdateBook) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                isbn = COALESCE($3, isbn),
                description = COALESCE($4, description),
                condition = COALESCE($5, condition),
                available = COALESCE($6, available),
                retrieval_location = COALESCE($7, retrieval_location),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.isbn)
        .bind(&data.description)
        .bind(data.condition)
        .bind(data.available)
        .bind(&data.retrieval_location)
        .execute(&mut *conn)
        .await
        .map_err(book_conflict)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        if let Some(ref genres) = data.genres {
            Self::set_genres(&mut *conn, id, genres).await?;
        }
        if let Some(ref authors) = data.authors {
            Self::set_authors(&mut *conn, id, authors).await?;
        }

        Ok(())
    }

    /// Delete a book on the given connection (its booking requests cascade)
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        Ok(())
    }

    /// Hand a book over to `new_owner_id` and mark it unavailable
    pub async fn transfer_ownership(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        new_owner_id: i32,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET owner_id = $2, available = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(new_owner_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        Ok(())
    }

    /// List all known genres
    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY genre_name")
            .fetch_all(&self.pool)
            .await?;

        Ok(genres)
    }

    /// Replace the genres of a book, creating unknown genres on the fly
    async fn set_genres(conn: &mut PgConnection, book_id: Uuid, names: &[String]) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;

        for name in normalize_names(names, normalize_genre) {
            let genre_id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO genres (genre_name) VALUES ($1)
                ON CONFLICT (genre_name) DO UPDATE SET genre_name = EXCLUDED.genre_name
                RETURNING id
                "#,
            )
            .bind(&name)
            .fetch_one(&mut *conn)
            .await?;

            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
                .bind(book_id)
                .bind(genre_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }

    /// Replace the authors of a book, creating unknown authors on the fly
    async fn set_authors(conn: &mut PgConnection, book_id: Uuid, names: &[String]) -> AppResult<()> {
        sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;

        for name in normalize_names(names, normalize_author) {
            let author_id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO authors (author_name) VALUES ($1)
                ON CONFLICT (author_name) DO UPDATE SET author_name = EXCLUDED.author_name
                RETURNING id
                "#,
            )
            .bind(&name)
            .fetch_one(&mut *conn)
            .await?;

            sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2)")
                .bind(book_id)
                .bind(author_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }
}

fn book_conflict(error: sqlx::Error) -> AppError {
    match unique_violation(&error).as_deref() {
        Some("books_title_key") => AppError::Conflict("A book with this title already exists.".to_string()),
        Some("books_isbn_key") => AppError::Conflict("A book with this ISBN already exists.".to_string()),
        Some(_) => AppError::Conflict("Book already exists".to_string()),
        None => error.into(),
    }
}

//! Book catalog service

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookQuery, CreateBook, UpdateBook},
        Book, Caller, Genre,
    },
    repository::Repository,
    services::permissions::require_book_owner,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a book owned by the caller
    pub async fn create(&self, caller: &Caller, data: &CreateBook) -> AppResult<Book> {
        let book = self.repository.books.create(caller.user_id, data).await?;
        tracing::info!(book_id = %book.id, owner_id = caller.user_id, "Book created");
        Ok(book)
    }

    /// Update one of the caller's books
    pub async fn update(&self, caller: &Caller, id: Uuid, data: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.repository.pool.begin().await?;
        self.lock_owned_book(&mut *tx, caller, id).await?;
        self.repository.books.update(&mut *tx, id, data).await?;
        tx.commit().await?;

        self.repository.books.get_by_id(id).await
    }

    /// Delete one of the caller's books
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;
        self.lock_owned_book(&mut *tx, caller, id).await?;
        self.repository.books.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.books.list_genres().await
    }

    /// Lock a book and check the caller owns it.
    ///
    /// The owner is read under the same lock that resolution takes, so a
    /// book handed over by a concurrent approval is no longer writable by
    /// its previous owner.
    async fn lock_owned_book(&self, conn: &mut PgConnection, caller: &Caller, id: Uuid) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .find_for_update(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        require_book_owner(caller, book.owner_id)?;
        Ok(book)
    }
}

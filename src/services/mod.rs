//! Business logic services

pub mod booking_requests;
pub mod books;
pub mod notifications;
pub mod permissions;
pub mod users;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub books: books::BooksService,
    pub booking_requests: booking_requests::BookingRequestsService,
    pub notifications: notifications::NotificationsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            books: books::BooksService::new(repository.clone()),
            booking_requests: booking_requests::BookingRequestsService::new(repository.clone()),
            notifications: notifications::NotificationsService::new(repository.clone()),
            repository,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }
}

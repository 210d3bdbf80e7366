//! Notifications service

use crate::{
    error::AppResult,
    models::{Caller, Notification},
    repository::Repository,
    services::permissions::require_addressee,
};

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, caller: &Caller) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_for_user(caller.user_id).await
    }

    pub async fn get(&self, caller: &Caller, id: i32) -> AppResult<Notification> {
        let notification = self.repository.notifications.get_by_id(id).await?;
        require_addressee(caller, &notification)?;
        Ok(notification)
    }
}

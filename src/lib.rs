//! Bookshare server
//!
//! REST JSON API for a book sharing community: members list the books they
//! own, request books from other members, and owners approve or reject
//! those requests. Approval hands the book over to the requester.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

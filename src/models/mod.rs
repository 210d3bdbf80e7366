//! Data models for Bookshare

pub mod book;
pub mod booking_request;
pub mod notification;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookCondition, Genre};
pub use booking_request::{BookingRequest, BookingRequestDetails, BookingStatus};
pub use notification::{NewNotification, Notification};
pub use user::{Caller, User, UserClaims};

//! Object-level access policy
//!
//! Every read or mutation of a booking request, book or notification goes
//! through [`can`] (or one of the `require_*` helpers) with an explicit
//! caller, before anything is written.

use crate::{
    error::{AppError, AppResult},
    models::{BookingRequest, BookingRequestDetails, Caller, Notification},
};

/// Actions on a booking request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Retrieve,
    Update,
    Delete,
    Resolve,
}

/// The two parties of a booking request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parties {
    pub requester_id: i32,
    pub book_owner_id: i32,
}

impl Parties {
    pub fn of(request: &BookingRequest, book_owner_id: i32) -> Self {
        Self {
            requester_id: request.requester_id,
            book_owner_id,
        }
    }
}

impl From<&BookingRequestDetails> for Parties {
    fn from(details: &BookingRequestDetails) -> Self {
        Self {
            requester_id: details.requester,
            book_owner_id: details.book_owner_id,
        }
    }
}

/// Whether `caller` may perform `action` on a request between `parties`.
///
/// The requester has full access except resolving; the book owner may
/// retrieve and resolve; nobody else may do anything.
pub fn can(caller: &Caller, action: Action, parties: &Parties) -> bool {
    let is_requester = caller.user_id == parties.requester_id;
    let is_owner = caller.user_id == parties.book_owner_id;

    match action {
        Action::Retrieve => is_requester || is_owner,
        Action::Update | Action::Delete => is_requester,
        Action::Resolve => is_owner,
    }
}

/// [`can`], as an error
pub fn authorize(caller: &Caller, action: Action, parties: &Parties) -> AppResult<()> {
    if can(caller, action, parties) {
        return Ok(());
    }

    let message = match action {
        Action::Retrieve => "You do not have permission to view this booking request.",
        Action::Update => "Only the requester can update this booking request.",
        Action::Delete => "Only the requester can delete this booking request.",
        Action::Resolve => "Only the owner of the book can manage this booking request.",
    };
    Err(AppError::Authorization(message.to_string()))
}

/// Only the addressee may see a notification
pub fn require_addressee(caller: &Caller, notification: &Notification) -> AppResult<()> {
    if notification.user_id == caller.user_id {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "You do not have permission to view this notification.".to_string(),
        ))
    }
}

/// Only the owner may modify a book
pub fn require_book_owner(caller: &Caller, owner_id: i32) -> AppResult<()> {
    if owner_id == caller.user_id {
        Ok(())
    } else {
        Err(AppError::Authorization("Only the owner can modify this book.".to_string()))
    }
}

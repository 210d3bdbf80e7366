//! Booking request lifecycle
//!
//! Creation checks the borrowing rules against a locked book row.
//! Resolution runs in a single transaction that writes the requester's
//! notification, transfers the book on approval and deletes the resolved
//! request (or, on approval, every request for the book).

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, RuleViolation},
    models::{
        booking_request::{
            BookingRequest, BookingRequestDetails, CreateBookingRequest, ManageBookingRequest,
            PatchBookingRequest,
        },
        Book, Caller, NewNotification, Notification,
    },
    repository::Repository,
    services::permissions::{authorize, Action, Parties},
};

/// Check the rules for `requester_id` asking for `book`.
///
/// Rules are checked in order: duplicate, self-request, availability.
pub fn check_request_rules(
    requester_id: i32,
    book: &Book,
    already_requested: bool,
) -> Result<(), RuleViolation> {
    if already_requested {
        return Err(RuleViolation::DuplicateRequest);
    }
    if book.owner_id == requester_id {
        return Err(RuleViolation::SelfRequestNotAllowed);
    }
    if !book.available {
        return Err(RuleViolation::BookUnavailable);
    }
    Ok(())
}

/// Writes implied by an owner's decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    pub notification: NewNotification,
    /// New owner of the book; `None` on rejection
    pub transfer_to: Option<i32>,
}

/// Work out what resolving `request` for `book` does.
///
/// The notification is built from the book as it is before any mutation.
pub fn plan_resolution(request: &BookingRequest, book: &Book, approve: bool) -> ResolutionPlan {
    ResolutionPlan {
        notification: NewNotification {
            user_id: request.requester_id,
            book: book.title.clone(),
            approved: approve,
            retrieval_location: if approve {
                book.retrieval_location.clone()
            } else {
                String::new()
            },
        },
        transfer_to: approve.then_some(request.requester_id),
    }
}

/// Result of a resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    pub approved: bool,
    pub notification: Notification,
    /// Requests deleted, including the resolved one
    pub removed_requests: u64,
}

#[derive(Clone)]
pub struct BookingRequestsService {
    repository: Repository,
}

impl BookingRequestsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Requests for the caller's books
    pub async fn list_incoming(&self, caller: &Caller) -> AppResult<Vec<BookingRequestDetails>> {
        self.repository.booking_requests.list_for_owner(caller.user_id).await
    }

    /// Create a pending request from the caller
    pub async fn create(&self, caller: &Caller, data: &CreateBookingRequest) -> AppResult<BookingRequest> {
        let mut tx = self.repository.pool.begin().await?;

        let book = self.lock_requested_book(&mut *tx, data.book).await?;

        let already_requested = self
            .repository
            .booking_requests
            .exists_for(&mut *tx, book.id, caller.user_id, None)
            .await?;
        check_request_rules(caller.user_id, &book, already_requested)?;

        let request = self
            .repository
            .booking_requests
            .insert(
                &mut *tx,
                book.id,
                caller.user_id,
                data.additional_information.as_deref().unwrap_or_default(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request.id,
            book_id = %book.id,
            requester_id = caller.user_id,
            "Booking request created"
        );

        Ok(request)
    }

    /// Get a request visible to the caller
    pub async fn get(&self, caller: &Caller, id: Uuid) -> AppResult<BookingRequestDetails> {
        let details = self.repository.booking_requests.get_details(id).await?;
        authorize(caller, Action::Retrieve, &Parties::from(&details))?;
        Ok(details)
    }

    /// Update the caller's own request.
    ///
    /// Moving the request to another book re-checks the request rules
    /// against that book.
    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        patch: &PatchBookingRequest,
    ) -> AppResult<BookingRequestDetails> {
        let current = self.repository.booking_requests.get_details(id).await?;
        authorize(caller, Action::Update, &Parties::from(&current))?;

        let mut tx = self.repository.pool.begin().await?;

        let retarget = patch.book.filter(|book_id| *book_id != current.book_id);
        if let Some(book_id) = retarget {
            let book = self.lock_requested_book(&mut *tx, book_id).await?;
            let already_requested = self
                .repository
                .booking_requests
                .exists_for(&mut *tx, book.id, caller.user_id, Some(id))
                .await?;
            check_request_rules(caller.user_id, &book, already_requested)?;
        }

        self.repository
            .booking_requests
            .update(&mut *tx, id, retarget, patch.additional_information.as_deref())
            .await?;

        tx.commit().await?;

        if let Some(book_id) = retarget {
            tracing::info!(request_id = %id, %book_id, "Booking request moved to another book");
        }

        self.repository.booking_requests.get_details(id).await
    }

    /// Cancel the caller's own request
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        let current = self.repository.booking_requests.get_details(id).await?;
        authorize(caller, Action::Delete, &Parties::from(&current))?;

        let mut conn = self.repository.pool.acquire().await?;
        self.repository.booking_requests.delete(&mut *conn, id).await?;

        tracing::info!(request_id = %id, "Booking request canceled");
        Ok(())
    }

    /// Approve or reject a request as the owner of its book.
    ///
    /// The target and the caller's ownership are checked before the
    /// decision is parsed, so strangers see 403/404 whatever they send.
    /// The book row is then locked before the request is read again, so
    /// two resolutions for the same book run one after the other; a request
    /// purged by an earlier approval is reported as not found.
    pub async fn resolve(
        &self,
        caller: &Caller,
        id: Uuid,
        decision: &ManageBookingRequest,
    ) -> AppResult<Resolution> {
        let snapshot = self.repository.booking_requests.get_details(id).await?;
        authorize(caller, Action::Resolve, &Parties::from(&snapshot))?;

        let approve = decision.decision()?;

        let mut book_id = snapshot.book_id;
        let (mut tx, book, request) = loop {
            let mut tx = self.repository.pool.begin().await?;

            let book = self
                .repository
                .books
                .find_for_update(&mut *tx, book_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Booking request {} not found", id)))?;

            let request = self
                .repository
                .booking_requests
                .find_by_id(&mut *tx, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Booking request {} not found", id)))?;

            if request.book_id == book.id {
                break (tx, book, request);
            }

            // Re-targeted by its requester in the meantime; lock the new book instead
            book_id = request.book_id;
        };

        authorize(caller, Action::Resolve, &Parties::of(&request, book.owner_id))?;

        let plan = plan_resolution(&request, &book, approve);

        let notification = self
            .repository
            .notifications
            .create(&mut *tx, &plan.notification)
            .await?;

        let removed_requests = match plan.transfer_to {
            Some(new_owner_id) => {
                self.repository
                    .books
                    .transfer_ownership(&mut *tx, book.id, new_owner_id)
                    .await?;
                self.repository
                    .booking_requests
                    .purge_for_book(&mut *tx, book.id)
                    .await?
            }
            None => {
                self.repository.booking_requests.delete(&mut *tx, request.id).await?;
                1
            }
        };

        tx.commit().await?;

        if approve {
            tracing::info!(
                request_id = %id,
                book_id = %book.id,
                previous_owner_id = book.owner_id,
                new_owner_id = request.requester_id,
                purged = removed_requests,
                "Booking request approved, book transferred"
            );
        } else {
            tracing::info!(request_id = %id, book_id = %book.id, "Booking request rejected");
        }

        Ok(Resolution {
            approved: approve,
            notification,
            removed_requests,
        })
    }

    /// Lock the book a request points at; an unknown book is a bad request
    async fn lock_requested_book(&self, conn: &mut sqlx::PgConnection, book_id: Uuid) -> AppResult<Book> {
        self.repository
            .books
            .find_for_update(conn, book_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("book: Invalid pk \"{}\" - object does not exist.", book_id))
            })
    }
}

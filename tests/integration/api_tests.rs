//! API integration tests
//!
//! These run against a live server with an empty-ish database:
//! `cargo test -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

struct Member {
    id: i64,
    token: String,
}

/// Helper to register a fresh member and log in
async fn new_member(client: &Client) -> Member {
    let email = format!("member-{}@example.org", Uuid::new_v4().simple());
    let password = "correct-horse-battery";

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse signup response");
    let id = body["id"].as_i64().expect("No id in signup response");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();

    Member { id, token }
}

/// Helper to list a book owned by `owner`
async fn new_book(client: &Client, owner: &Member) -> String {
    let suffix = Uuid::new_v4().as_u128();
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&owner.token)
        .json(&json!({
            "title": format!("Shared book {}", suffix),
            "ISBN": format!("{:013}", suffix % 10_000_000_000_000),
            "retrieval_location": "Front desk",
            "genres": ["fantasy"],
            "authors": ["ursula le guin"]
        }))
        .send()
        .await
        .expect("Failed to send book request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_str().expect("No id in book response").to_string()
}

async fn request_book(client: &Client, requester: &Member, book: &str) -> reqwest::Response {
    client
        .post(format!("{}/booking-requests", BASE_URL))
        .bearer_auth(&requester.token)
        .json(&json!({ "book": book, "additional_information": "Could pick it up on Friday" }))
        .send()
        .await
        .expect("Failed to send booking request")
}

async fn manage(client: &Client, member: &Member, request_id: &str, approve: Value) -> reqwest::Response {
    client
        .put(format!("{}/booking-requests/{}/manage", BASE_URL, request_id))
        .bearer_auth(&member.token)
        .json(&json!({ "approve": approve }))
        .send()
        .await
        .expect("Failed to send manage request")
}

async fn patch_request(client: &Client, member: &Member, request_id: &str, body: Value) -> reqwest::Response {
    client
        .patch(format!("{}/booking-requests/{}", BASE_URL, request_id))
        .bearer_auth(&member.token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send patch request")
}

async fn patch_book(client: &Client, member: &Member, book: &str, body: Value) -> reqwest::Response {
    client
        .patch(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&member.token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send book patch")
}

async fn notifications(client: &Client, member: &Member) -> Vec<Value> {
    let response = client
        .get(format!("{}/notifications", BASE_URL))
        .bearer_auth(&member.token)
        .send()
        .await
        .expect("Failed to send notifications request");

    if response.status() == StatusCode::NO_CONTENT {
        return Vec::new();
    }
    response.json().await.expect("Failed to parse notifications")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_with_unknown_email() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": "nobody@example.org", "password": "whatever" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_create_booking_request() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let response = request_book(&client, &requester, &book).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"], book.as_str());
    assert_eq!(body["requester"], requester.id);
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["request_selected"], false);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_request_is_rejected() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    assert_eq!(request_book(&client, &requester, &book).await.status(), StatusCode::CREATED);

    let response = request_book(&client, &requester, &book).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "You have already requested this book.");
}

#[tokio::test]
#[ignore]
async fn test_owner_cannot_request_own_book() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let response = request_book(&client, &owner, &book).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_request_for_unknown_book() {
    let client = Client::new();
    let requester = new_member(&client).await;

    let response = request_book(&client, &requester, &Uuid::new_v4().to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_approve_transfers_book_and_purges_siblings() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let first = new_member(&client).await;
    let second = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let response = request_book(&client, &first, &book).await;
    let approved: Value = response.json().await.expect("Failed to parse response");
    let response = request_book(&client, &second, &book).await;
    let sibling: Value = response.json().await.expect("Failed to parse response");

    let approved_id = approved["id"].as_str().unwrap();
    let sibling_id = sibling["id"].as_str().unwrap();

    let response = manage(&client, &owner, approved_id, json!(true)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["approve"], true);

    // Book changed hands and is no longer requestable
    let book_body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse book");
    assert_eq!(book_body["owner_id"], first.id);
    assert_eq!(book_body["available"], false);

    // Every request on the book is gone
    for id in [approved_id, sibling_id] {
        let response = client
            .get(format!("{}/booking-requests/{}", BASE_URL, id))
            .bearer_auth(&owner.token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // Only the approved requester is notified
    let notes = notifications(&client, &first).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["approved"], true);
    assert_eq!(notes[0]["retrieval_location"], "Front desk");
    assert!(notifications(&client, &second).await.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_reject_keeps_book_and_notifies_requester() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let other = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let rejected: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let kept: Value = request_book(&client, &other, &book).await.json().await.unwrap();
    let rejected_id = rejected["id"].as_str().unwrap();

    let response = manage(&client, &owner, rejected_id, json!(false)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let book_body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book_body["owner_id"], owner.id);
    assert_eq!(book_body["available"], true);

    let notes = notifications(&client, &requester).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["approved"], false);
    assert_eq!(notes[0]["retrieval_location"], "");

    // The other request on the same book survives
    let response = client
        .get(format!("{}/booking-requests/{}", BASE_URL, kept["id"].as_str().unwrap()))
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_resolving_twice_is_not_found() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    assert_eq!(manage(&client, &owner, id, json!(false)).await.status(), StatusCode::OK);
    assert_eq!(manage(&client, &owner, id, json!(false)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(notifications(&client, &requester).await.len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_only_owner_may_resolve() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let stranger = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    assert_eq!(manage(&client, &stranger, id, json!(true)).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(manage(&client, &requester, id, json!(true)).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(manage(&client, &owner, id, json!("yes")).await.status(), StatusCode::BAD_REQUEST);

    // Nothing changed
    assert!(notifications(&client, &requester).await.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_request_visibility() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let stranger = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let url = format!("{}/booking-requests/{}", BASE_URL, created["id"].as_str().unwrap());

    for (member, expected) in [
        (&requester, StatusCode::OK),
        (&owner, StatusCode::OK),
        (&stranger, StatusCode::FORBIDDEN),
    ] {
        let response = client.get(&url).bearer_auth(&member.token).send().await.unwrap();
        assert_eq!(response.status(), expected);
    }

    // Owner sees it among incoming requests, the requester does not
    let incoming: Vec<Value> = client
        .get(format!("{}/booking-requests", BASE_URL))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(incoming.iter().any(|r| r["id"] == created["id"]));

    let response = client
        .get(format!("{}/booking-requests", BASE_URL))
        .bearer_auth(&requester.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_requester_cancels_request() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let url = format!("{}/booking-requests/{}", BASE_URL, created["id"].as_str().unwrap());

    let response = client.delete(&url).bearer_auth(&owner.token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client.delete(&url).bearer_auth(&requester.token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The book can be requested again
    assert_eq!(request_book(&client, &requester, &book).await.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore]
async fn test_notification_scoping() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    manage(&client, &owner, created["id"].as_str().unwrap(), json!(false)).await;

    let notes = notifications(&client, &requester).await;
    let url = format!("{}/notifications/{}", BASE_URL, notes[0]["id"]);

    let response = client.get(&url).bearer_auth(&requester.token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(&url).bearer_auth(&owner.token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_request_for_unavailable_book() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let response = patch_book(&client, &owner, &book, json!({ "available": false })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request_book(&client, &requester, &book).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "This book is not available.");
}

#[tokio::test]
#[ignore]
async fn test_resolve_checks_target_and_owner_before_decision() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let stranger = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let response = manage(&client, &stranger, id, json!("yes")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let unknown = Uuid::new_v4().to_string();
    let response = manage(&client, &owner, &unknown, json!("yes")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = manage(&client, &owner, id, json!(1)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_previous_owner_loses_write_access_after_approval() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let response = manage(&client, &owner, created["id"].as_str().unwrap(), json!(true)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = patch_book(&client, &owner, &book, json!({ "available": true })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The new owner can list it again
    let response = patch_book(&client, &requester, &book, json!({ "available": true })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["owner_id"], requester.id);
    assert_eq!(body["available"], true);
}

#[tokio::test]
#[ignore]
async fn test_comment_only_update() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let response = patch_request(&client, &requester, id, json!({ "additional_information": "Saturday works too" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["additional_information"], "Saturday works too");
    assert_eq!(body["book_id"], book.as_str());

    // PUT naming the same book is not a re-target
    let response = client
        .put(format!("{}/booking-requests/{}", BASE_URL, id))
        .bearer_auth(&requester.token)
        .json(&json!({ "book": book }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["additional_information"], "");
}

#[tokio::test]
#[ignore]
async fn test_owner_cannot_update_request() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();

    let response = patch_request(
        &client,
        &owner,
        created["id"].as_str().unwrap(),
        json!({ "additional_information": "Not yours to edit" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_retarget_to_another_book() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let other_owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;
    let other_book = new_book(&client, &other_owner).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();

    let response = patch_request(&client, &requester, created["id"].as_str().unwrap(), json!({ "book": other_book })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["book_id"], other_book.as_str());
    assert_eq!(body["book_owner_id"], other_owner.id);

    // The previous owner no longer sees it
    let response = client
        .get(format!("{}/booking-requests", BASE_URL))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_retarget_to_own_book_is_rejected() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;
    let own_book = new_book(&client, &requester).await;

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();

    let response = patch_request(&client, &requester, created["id"].as_str().unwrap(), json!({ "book": own_book })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "You cannot request your own book.");
}

#[tokio::test]
#[ignore]
async fn test_retarget_to_unavailable_book_is_rejected() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let book = new_book(&client, &owner).await;
    let shelved = new_book(&client, &owner).await;

    assert_eq!(
        patch_book(&client, &owner, &shelved, json!({ "available": false })).await.status(),
        StatusCode::OK
    );

    let created: Value = request_book(&client, &requester, &book).await.json().await.unwrap();

    let response = patch_request(&client, &requester, created["id"].as_str().unwrap(), json!({ "book": shelved })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "This book is not available.");
}

#[tokio::test]
#[ignore]
async fn test_retarget_to_already_requested_book_is_rejected() {
    let client = Client::new();
    let owner = new_member(&client).await;
    let requester = new_member(&client).await;
    let first_book = new_book(&client, &owner).await;
    let second_book = new_book(&client, &owner).await;

    let first: Value = request_book(&client, &requester, &first_book).await.json().await.unwrap();
    assert_eq!(request_book(&client, &requester, &second_book).await.status(), StatusCode::CREATED);

    let response = patch_request(&client, &requester, first["id"].as_str().unwrap(), json!({ "book": second_book })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "You have already requested this book.");
}

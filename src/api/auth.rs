//! Account endpoints: sign up, login, current user

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{Login, SignUp, User},
};

use super::{AuthenticatedUser, ValidJson};

/// Created account
#[derive(Serialize, ToSchema)]
pub struct SignUpResponse {
    pub id: i32,
    pub email: String,
}

/// Issued access token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignUp,
    responses(
        (status = 201, description = "Account created", body = SignUpResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn sign_up(
    State(state): State<crate::AppState>,
    ValidJson(data): ValidJson<SignUp>,
) -> AppResult<(StatusCode, Json<SignUpResponse>)> {
    let user = state.services.users.sign_up(&data).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = Login,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    ValidJson(data): ValidJson<Login>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state
        .services
        .users
        .authenticate(&data.email, &data.password)
        .await?;

    tracing::debug!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.services.users.token_lifetime(),
    }))
}

/// Current user details
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state.services.users.me(&claims.caller()).await?;
    Ok(Json(user))
}

//! Authentication and account service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{normalize_email, Caller, SignUp, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account
    pub async fn sign_up(&self, data: &SignUp) -> AppResult<User> {
        let email = normalize_email(&data.email);
        let password_hash = hash_password(&data.password)?;

        let user = self.repository.users.create(&email, &password_hash).await?;
        tracing::info!(user_id = user.id, "User signed up");

        Ok(user)
    }

    /// Authenticate by email and password and return a JWT token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::Authentication("Unable to log in with provided credentials.".to_string()))?;

        if !user.is_active || !verify_password(&user.password, password)? {
            return Err(AppError::Authentication(
                "Unable to log in with provided credentials.".to_string(),
            ));
        }

        let token = UserClaims::for_user(&user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user))
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> u64 {
        self.config.jwt_expiration_hours * 3600
    }

    /// Account of the caller
    pub async fn me(&self, caller: &Caller) -> AppResult<User> {
        self.repository.users.get_by_id(caller.user_id).await
    }
}

/// Hash a password with argon2 and a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

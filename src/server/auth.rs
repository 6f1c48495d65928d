//! Account routes and bearer token authentication.
//!
//! Tokens are random (32 bytes, hex-encoded) and live only in memory, keyed
//! by their SHA-256 digest so the raw token is never stored. Each token maps
//! to a user id and an expiry; a restart invalidates every session.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::client::api::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, ProfileResponse, RegisterRequest,
    UserProfile,
};
use crate::db::{NewUser, UserRecord};
use crate::error::DatabaseError;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;
const DUPLICATE_USER: &str = "Username or email already exists";
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

#[derive(Debug, Clone, Copy)]
struct Grant {
    user_id: i64,
    expires_at: Instant,
}

/// In-memory store of issued bearer tokens.
#[derive(Clone)]
pub struct TokenStore {
    /// Maps sha256(token) -> grant. Never logged or persisted.
    tokens: Arc<RwLock<HashMap<String, Grant>>>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issue a fresh token for a user.
    pub async fn issue(&self, user_id: i64) -> String {
        let token = generate_token();
        let grant = Grant {
            user_id,
            expires_at: Instant::now() + self.ttl,
        };
        let mut tokens = self.tokens.write().await;
        let now = Instant::now();
        tokens.retain(|_, g| g.expires_at > now);
        tokens.insert(digest(&token), grant);
        token
    }

    /// The user a token belongs to, if it is known and unexpired.
    pub async fn validate(&self, token: &str) -> Option<i64> {
        let key = digest(token);
        let grant = self.tokens.read().await.get(&key).copied()?;
        if grant.expires_at > Instant::now() {
            Some(grant.user_id)
        } else {
            self.tokens.write().await.remove(&key);
            None
        }
    }

    pub async fn revoke(&self, token: &str) {
        self.tokens.write().await.remove(&digest(token));
    }

    /// Drop every token of a user except `keep`.
    pub async fn revoke_others(&self, user_id: i64, keep: &str) {
        let keep = digest(keep);
        self.tokens
            .write()
            .await
            .retain(|key, grant| grant.user_id != user_id || *key == keep);
    }

    /// Get the number of active tokens (for diagnostics).
    pub async fn active_count(&self) -> usize {
        let now = Instant::now();
        self.tokens
            .read()
            .await
            .values()
            .filter(|g| g.expires_at > now)
            .count()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(crate::config::AuthConfig::default().token_ttl)
    }
}

/// Generate a cryptographically random token (32 bytes, hex-encoded = 64 chars).
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex_encode(&bytes)
}

fn digest(token: &str) -> String {
    hex_encode(&Sha256::digest(token.as_bytes()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ==================== Passwords ====================

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| {
        tracing::error!("Salt encoding failed: {}", e);
        ApiError::Internal
    })?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
        .is_match(email)
}

// ==================== Extractor ====================

/// The authenticated caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Authorization token is required"))?;

        let user_id = state
            .tokens
            .validate(token)
            .await
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(Self {
            user_id,
            token: token.to_string(),
        })
    }
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: Some(user.created_at),
        }
    }
}

// -- Handlers --

pub(super) async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    let username = req.username.trim();
    let email = req.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username, email and password are required"));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if state.db.user_exists(username, &email).await? {
        return Err(ApiError::Conflict(DUPLICATE_USER.to_string()));
    }

    let user = state
        .db
        .create_user(&NewUser {
            username: username.to_string(),
            email,
            password_hash: hash_password(&req.password)?,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration.
            DatabaseError::Constraint(_) => ApiError::Conflict(DUPLICATE_USER.to_string()),
            other => other.into(),
        })?;
    let access_token = state.tokens.issue(user.id).await;

    tracing::info!(user_id = user.id, "Registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: UserProfile::from(&user),
            access_token,
        }),
    ))
}

pub(super) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    let login = req.username.trim();
    if login.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }
    // Emails are stored lowercased.
    let login = if login.contains('@') {
        login.to_lowercase()
    } else {
        login.to_string()
    };

    let user = state
        .db
        .find_user_by_login(&login)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let access_token = state.tokens.issue(user.id).await;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: UserProfile::from(&user),
        access_token,
    }))
}

pub(super) async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(ProfileResponse {
        user: UserProfile::from(&user),
    }))
}

pub(super) async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::bad_request("Current and new password are required"));
    }
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "New password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    if !verify_password(&req.current_password, &user.password_hash) {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    state
        .db
        .update_password(user.id, &hash_password(&req.new_password)?)
        .await?;
    state.tokens.revoke_others(user.id, &auth.token).await;
    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_issue_and_validate() {
        let store = TokenStore::new(Duration::from_secs(60));

        let token = store.issue(7).await;
        assert_eq!(token.len(), 64); // 32 bytes hex = 64 chars

        assert_eq!(store.validate(&token).await, Some(7));
        assert_eq!(store.validate("wrong-token").await, None);
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_token_expiry() {
        let store = TokenStore::new(Duration::ZERO);
        let token = store.issue(1).await;
        assert_eq!(store.validate(&token).await, None);
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_token_revoke() {
        let store = TokenStore::new(Duration::from_secs(60));
        let first = store.issue(1).await;
        let second = store.issue(1).await;
        let other_user = store.issue(2).await;

        store.revoke_others(1, &second).await;
        assert_eq!(store.validate(&first).await, None);
        assert_eq!(store.validate(&second).await, Some(1));
        assert_eq!(store.validate(&other_user).await, Some(2));

        store.revoke(&second).await;
        assert_eq!(store.validate(&second).await, None);
    }

    #[test]
    fn test_token_is_random() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("builder@example.com"));
        assert!(is_valid_email("first.last+site@mail.co.in"));
        assert!(!is_valid_email("builder@example"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email(""));
    }
}

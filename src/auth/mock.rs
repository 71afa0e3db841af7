use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::error::{ApiError, AppError};

use super::{AccessTokenClaims, AuthBackend, AuthResponse, AuthUser, Credentials, Session};

pub const MOCK_USER_ID: &str = "test-user-id";
pub const MOCK_EMAIL: &str = "test@example.com";
pub const MOCK_REFRESH_TOKEN: &str = "test-refresh-token";

const MOCK_JWT_SECRET: &str = "test-jwt-secret";
const MOCK_TOKEN_TTL_SECS: i64 = 3600;

/// Auth double: every call succeeds for any credentials, always as
/// `test-user-id`. Access tokens are genuine HS256 JWTs so claim parsing
/// behaves as with real tokens.
#[derive(Debug, Default)]
pub struct MockAuth;

impl MockAuth {
    pub fn new() -> Self {
        Self
    }

    pub fn session_for(&self, email: &str) -> Result<Session, ApiError> {
        let exp = Utc::now().timestamp() + MOCK_TOKEN_TTL_SECS;
        let claims = AccessTokenClaims {
            sub: MOCK_USER_ID.to_string(),
            email: Some(email.to_string()),
            exp,
            role: Some("authenticated".to_string()),
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(MOCK_JWT_SECRET.as_bytes()),
        )
        .map_err(AppError::from)?;

        Ok(Session {
            access_token,
            refresh_token: Some(MOCK_REFRESH_TOKEN.to_string()),
            expires_at: Some(exp),
            user: AuthUser {
                id: MOCK_USER_ID.to_string(),
                email: email.to_string(),
            },
        })
    }
}

#[async_trait]
impl AuthBackend for MockAuth {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        self.session_for(&credentials.email)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let session = self.session_for(&credentials.email)?;
        Ok(AuthResponse {
            user: session.user.clone(),
            session: Some(session),
        })
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), ApiError> {
        Ok(())
    }

    async fn get_user(&self, session: &Session) -> Result<AuthUser, ApiError> {
        Ok(session.user.clone())
    }
}

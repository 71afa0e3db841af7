use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::{ApiError, AppError};
use crate::http_client::HttpClient;

use super::{AuthBackend, AuthResponse, AuthUser, Credentials, Session};

/// GoTrue backend (`{project}/auth/v1`). Keeps the shared HTTP client's
/// bearer token in step with the session so table queries run as the user.
#[derive(Clone)]
pub struct RestAuth {
    http: HttpClient,
    auth_url: String,
}

impl RestAuth {
    pub fn new(http: HttpClient, auth_url: String) -> Self {
        Self { http, auth_url }
    }
}

/// Sign-up answers with a full session when autoconfirm is on and with the
/// bare user otherwise.
pub(crate) fn parse_sign_up(value: Value) -> Result<AuthResponse, AppError> {
    if value.get("access_token").is_some() {
        let session: Session = serde_json::from_value(value)?;
        return Ok(AuthResponse {
            user: session.user.clone(),
            session: Some(session),
        });
    }
    let user: AuthUser = serde_json::from_value(value)?;
    Ok(AuthResponse {
        user,
        session: None,
    })
}

#[async_trait]
impl AuthBackend for RestAuth {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let url = format!("{}/token?grant_type=password", self.auth_url);
        let builder = self.http.request(Method::POST, &url).json(credentials);
        let value = self.http.send_json(builder).await?;
        let session: Session = serde_json::from_value(value).map_err(AppError::from)?;

        self.http.set_access_token(Some(session.access_token.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let url = format!("{}/signup", self.auth_url);
        let builder = self.http.request(Method::POST, &url).json(credentials);
        let value = self.http.send_json(builder).await?;
        let response = parse_sign_up(value)?;

        if let Some(session) = &response.session {
            self.http.set_access_token(Some(session.access_token.clone()));
        }
        Ok(response)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ApiError> {
        let url = format!("{}/logout", self.auth_url);
        let builder = self
            .http
            .request_as(Method::POST, &url, &session.access_token);
        let result = self.http.send(builder).await;

        // The local token goes on every outcome; a 401 only means it was already dead.
        self.clear_session();
        match result {
            Ok(_) => Ok(()),
            Err(error) if error.code == "401" || error.code == "403" => Ok(()),
            Err(error) => Err(error),
        }
    }

    async fn get_user(&self, session: &Session) -> Result<AuthUser, ApiError> {
        let url = format!("{}/user", self.auth_url);
        let builder = self
            .http
            .request_as(Method::GET, &url, &session.access_token);
        let value = self.http.send_json(builder).await?;
        serde_json::from_value(value).map_err(|e| AppError::from(e).into())
    }

    fn clear_session(&self) {
        self.http.set_access_token(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_up_with_session() {
        let body = json!({
            "access_token": "a.b.c",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700000000,
            "refresh_token": "r",
            "user": {"id": "u-1", "email": "chef@example.com", "aud": "authenticated"}
        });
        let response = parse_sign_up(body).unwrap();
        assert_eq!(response.user.id, "u-1");
        let session = response.session.unwrap();
        assert_eq!(session.expires_at, Some(1700000000));
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_sign_up_pending_confirmation() {
        let body = json!({"id": "u-2", "email": "new@example.com", "confirmation_sent_at": "2024-01-01T00:00:00Z"});
        let response = parse_sign_up(body).unwrap();
        assert_eq!(response.user.email, "new@example.com");
        assert!(response.session.is_none());
    }
}

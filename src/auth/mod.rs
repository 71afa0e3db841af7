// Authentication facade over GoTrue and the in-memory double

pub mod mock;
pub mod rest;

pub use mock::MockAuth;
pub use rest::RestAuth;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, AppResult};
use crate::query::QueryResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds, as GoTrue reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Claims read from a Supabase access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub role: Option<String>,
}

impl Session {
    /// Decodes the token payload without checking the signature; the server
    /// does that on every request.
    pub fn claims(&self) -> AppResult<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        let data = decode::<AccessTokenClaims>(
            &self.access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        Ok(data.claims)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
            .or_else(|| self.claims().ok().map(|claims| claims.exp))
    }

    /// Unknown expiry counts as still valid.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// `data` of sign-in / sign-up. Sign-up leaves `session` empty while the
/// email still needs confirming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: AuthUser,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub user: AuthUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, ApiError>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;

    async fn sign_out(&self, session: &Session) -> Result<(), ApiError>;

    async fn get_user(&self, session: &Session) -> Result<AuthUser, ApiError>;

    /// Drops any credentials the backend holds outside the session itself.
    fn clear_session(&self) {}
}

type Listener = Arc<dyn Fn(AuthChangeEvent, Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct AuthState {
    session: Option<Session>,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

/// Keeps the current session and tells listeners when it changes.
#[derive(Clone)]
pub struct AuthClient {
    backend: Arc<dyn AuthBackend>,
    state: Arc<Mutex<AuthState>>,
}

impl AuthClient {
    pub fn new(backend: Arc<dyn AuthBackend>, session: Option<Session>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(AuthState {
                session,
                ..Default::default()
            })),
        }
    }

    fn current(&self) -> Option<Session> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.session.clone())
    }

    fn store(&self, session: Option<Session>) {
        let event = if session.is_some() {
            AuthChangeEvent::SignedIn
        } else {
            AuthChangeEvent::SignedOut
        };
        let listeners: Vec<Listener> = match self.state.lock() {
            Ok(mut state) => {
                state.session = session.clone();
                state.listeners.iter().map(|(_, l)| l.clone()).collect()
            }
            Err(_) => return,
        };
        // Callbacks run without the lock so they may call back into the client.
        for listener in listeners {
            listener(event, session.as_ref());
        }
    }

    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> QueryResult<AuthResponse> {
        match self.backend.sign_in_with_password(credentials).await {
            Ok(session) => {
                tracing::info!("Signed in: user={}", session.user.id);
                self.store(Some(session.clone()));
                QueryResult::ok(AuthResponse {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            Err(error) => {
                tracing::warn!("Sign in failed for {}: {}", credentials.email, error);
                QueryResult::err(error)
            }
        }
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> QueryResult<AuthResponse> {
        match self.backend.sign_up(credentials).await {
            Ok(response) => {
                tracing::info!(
                    "Signed up: user={}, confirmed={}",
                    response.user.id,
                    response.session.is_some()
                );
                if let Some(session) = &response.session {
                    self.store(Some(session.clone()));
                }
                QueryResult::ok(response)
            }
            Err(error) => {
                tracing::warn!("Sign up failed for {}: {}", credentials.email, error);
                QueryResult::err(error)
            }
        }
    }

    /// Resolves to `{data: None, error: None}`. Without a session this is a no-op.
    /// The local session is dropped even when the server call fails; the
    /// failure is still reported.
    pub async fn sign_out(&self) -> QueryResult<()> {
        let Some(session) = self.current() else {
            return QueryResult::empty();
        };
        let result = self.backend.sign_out(&session).await;
        self.backend.clear_session();
        self.store(None);
        match result {
            Ok(()) => {
                tracing::info!("Signed out: user={}", session.user.id);
                QueryResult::empty()
            }
            Err(error) => {
                tracing::warn!("Sign out for {} failed: {}", session.user.id, error);
                QueryResult::err(error)
            }
        }
    }

    /// Current session; an expired one is dropped and reported as absent.
    pub async fn get_session(&self) -> QueryResult<SessionData> {
        let session = self.current();
        if let Some(current) = &session {
            if current.is_expired_at(chrono::Utc::now().timestamp()) {
                tracing::warn!("Session for {} has expired", current.user.id);
                self.backend.clear_session();
                self.store(None);
                return QueryResult::ok(SessionData { session: None });
            }
        }
        QueryResult::ok(SessionData { session })
    }

    pub async fn get_user(&self) -> QueryResult<UserData> {
        let Some(session) = self.current() else {
            return QueryResult::err(ApiError::new(
                "session_not_found",
                "Auth session missing!",
            ));
        };
        self.backend
            .get_user(&session)
            .await
            .map(|user| UserData { user })
            .into()
    }

    /// Calls `callback` right away with the current state (`SignedIn` plus the
    /// session, or `SignedOut`), then on every later change until unsubscribed.
    pub fn on_auth_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AuthChangeEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(callback);
        let session = self.current();
        let event = if session.is_some() {
            AuthChangeEvent::SignedIn
        } else {
            AuthChangeEvent::SignedOut
        };
        listener(event, session.as_ref());

        let id = match self.state.lock() {
            Ok(mut state) => {
                let id = state.next_id;
                state.next_id += 1;
                state.listeners.push((id, listener));
                id
            }
            Err(_) => u64::MAX,
        };
        Subscription {
            id,
            state: Arc::downgrade(&self.state),
            active: AtomicBool::new(true),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.listeners.len())
            .unwrap_or(0)
    }
}

/// Handle returned by [`AuthClient::on_auth_state_change`].
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<AuthState>>,
    active: AtomicBool,
}

impl Subscription {
    /// Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(state) = self.state.upgrade() {
            if let Ok(mut state) = state.lock() {
                state.listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn client() -> AuthClient {
        AuthClient::new(Arc::new(MockAuth::new()), None)
    }

    #[test]
    fn test_callback_runs_before_subscription_returns() {
        let client = client();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let subscription = client.on_auth_state_change(move |event, session| {
            seen.lock().unwrap().push((event, session.is_some()));
        });
        assert_eq!(*calls.lock().unwrap(), vec![(AuthChangeEvent::SignedOut, false)]);
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_listeners_follow_sign_in_and_out() {
        let client = client();
        let count = Arc::new(AtomicUsize::new(0));
        let events = Arc::new(Mutex::new(Vec::new()));
        let (c, e) = (count.clone(), events.clone());
        let subscription = client.on_auth_state_change(move |event, _| {
            c.fetch_add(1, Ordering::SeqCst);
            e.lock().unwrap().push(event);
        });

        let result = client
            .sign_in_with_password(&Credentials::new("chef@example.com", "pw"))
            .await;
        assert!(result.is_ok());
        assert!(client.sign_out().await.is_ok());

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                AuthChangeEvent::SignedOut,
                AuthChangeEvent::SignedIn,
                AuthChangeEvent::SignedOut
            ]
        );

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert_eq!(client.listener_count(), 0);
        client
            .sign_in_with_password(&Credentials::new("chef@example.com", "pw"))
            .await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_get_user_without_session() {
        let result = client().get_user().await;
        assert_eq!(result.error.unwrap().code, "session_not_found");
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let mut session = MockAuth::new().session_for("chef@example.com").unwrap();
        session.expires_at = Some(1);
        let client = AuthClient::new(Arc::new(MockAuth::new()), Some(session));

        let result = client.get_session().await;
        assert_eq!(result, QueryResult::ok(SessionData { session: None }));
        assert!(client.get_user().await.error.is_some());
    }

    mod over_rest {
        use super::*;
        use crate::config::Config;
        use crate::http_client::HttpClient;
        use serde_json::json;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        /// Answers every connection with `status` and `body`; returns the base URL.
        async fn serve(status: &'static str, body: String) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let body = body.clone();
                    tokio::spawn(async move {
                        read_request(&mut socket).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
            });
            format!("http://{}", addr)
        }

        async fn read_request(socket: &mut TcpStream) {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while let Ok(n) = socket.read(&mut chunk).await {
                if n == 0 {
                    return;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                let Some(end) = text.find("\r\n\r\n") else {
                    continue;
                };
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }

        fn rest_client(base_url: &str, session: Option<Session>) -> (HttpClient, AuthClient) {
            let config = Config::new(base_url, "anon-key");
            let http = HttpClient::new(&config).unwrap();
            if let Some(session) = &session {
                http.set_access_token(Some(session.access_token.clone()));
            }
            let backend = RestAuth::new(http.clone(), config.auth_url());
            (http, AuthClient::new(Arc::new(backend), session))
        }

        fn user_session(token: &str, expires_at: Option<i64>) -> Session {
            Session {
                access_token: token.to_string(),
                refresh_token: Some("r".to_string()),
                expires_at,
                user: AuthUser {
                    id: "u-1".to_string(),
                    email: "chef@example.com".to_string(),
                },
            }
        }

        #[tokio::test]
        async fn test_sign_in_and_out_move_the_bearer() {
            let body = serde_json::to_string(&user_session("user-token", None)).unwrap();
            let base_url = serve("200 OK", body).await;
            let (http, client) = rest_client(&base_url, None);

            let result = client
                .sign_in_with_password(&Credentials::new("chef@example.com", "pw"))
                .await;
            assert!(result.is_ok());
            assert_eq!(http.access_token().as_deref(), Some("user-token"));

            assert!(client.sign_out().await.is_ok());
            assert_eq!(http.access_token(), None);
            assert_eq!(client.get_session().await.data.unwrap().session, None);
        }

        #[tokio::test]
        async fn test_expired_session_clears_bearer() {
            let session = user_session("expired-user-token", Some(1));
            let (http, client) = rest_client("http://127.0.0.1:9", Some(session));
            assert_eq!(http.access_token().as_deref(), Some("expired-user-token"));

            let result = client.get_session().await;
            assert_eq!(result.data.unwrap().session, None);
            assert_eq!(http.access_token(), None);
        }

        #[tokio::test]
        async fn test_failed_sign_out_still_signs_out_locally() {
            let base_url = serve(
                "500 Internal Server Error",
                json!({"msg": "logout failed"}).to_string(),
            )
            .await;
            let (http, client) = rest_client(&base_url, Some(user_session("user-token", None)));
            let events = Arc::new(Mutex::new(Vec::new()));
            let seen = events.clone();
            let _subscription = client.on_auth_state_change(move |event, _| {
                seen.lock().unwrap().push(event);
            });

            let result = client.sign_out().await;
            assert_eq!(result.error.unwrap().message, "logout failed");
            assert_eq!(client.get_session().await.data.unwrap().session, None);
            assert_eq!(http.access_token(), None);
            assert_eq!(
                *events.lock().unwrap(),
                vec![AuthChangeEvent::SignedIn, AuthChangeEvent::SignedOut]
            );
        }

        #[tokio::test]
        async fn test_unreachable_auth_server_still_signs_out_locally() {
            let (http, client) =
                rest_client("http://127.0.0.1:9", Some(user_session("user-token", None)));

            let result = client.sign_out().await;
            assert_eq!(result.error.unwrap().code, "http_error");
            assert_eq!(client.get_session().await.data.unwrap().session, None);
            assert_eq!(http.access_token(), None);
        }
    }

    #[test]
    fn test_claims_from_mock_token() {
        let session = MockAuth::new().session_for("chef@example.com").unwrap();
        let claims = session.claims().unwrap();
        assert_eq!(claims.sub, mock::MOCK_USER_ID);
        assert_eq!(claims.email.as_deref(), Some("chef@example.com"));
        assert!(!session.is_expired_at(chrono::Utc::now().timestamp()));
    }

    #[test]
    fn test_garbage_token_has_unknown_expiry() {
        let session = Session {
            access_token: "not-a-jwt".to_string(),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: "u".to_string(),
                email: String::new(),
            },
        };
        assert!(session.claims().is_err());
        assert!(!session.is_expired_at(i64::MAX));
    }
}

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use http::StatusCode;
use tracing::{debug, info, warn};

use shared::types::{LoginData, LoginResponse, ProfileUpdate, RefreshToken, Session};

use crate::api;
use crate::error::ClientError;
use crate::http::{HttpClient, TokenSource};
use crate::storage::{KeyValueStore, SESSION_KEY};

/// The signed-in operator, mirrored to storage under `user`.
///
/// Two states only: no session, or a session with a token. Every write goes
/// through this type.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current_session();
        f.debug_struct("SessionStore")
            .field("session", &current.map(|s| s.to_string()))
            .finish()
    }
}

impl SessionStore {
    /// Restore whatever session storage holds. Unreadable data is removed.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let restored = match storage.get(SESSION_KEY) {
            None => None,
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) if session.is_authenticated() => {
                    info!("Restored session: {}", session);
                    Some(session)
                }
                Ok(_) => {
                    warn!("Persisted session has no token, discarding it");
                    discard(storage.as_ref());
                    None
                }
                Err(e) => {
                    warn!("Persisted session is unreadable, discarding it: {}", e);
                    discard(storage.as_ref());
                    None
                }
            },
        };

        Self {
            storage,
            current: RwLock::new(restored),
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Session::is_authenticated)
    }

    /// Validate, call `POST /auth/login`, and replace the session on success.
    /// A failed attempt leaves the previous session as it was.
    pub async fn login(
        &self,
        http: &HttpClient,
        identifier: &str,
        password: &str,
        activation_code: &str,
    ) -> Result<Session, ClientError> {
        let data = LoginData::new(identifier, password, activation_code);
        data.validate()?;

        debug!("Signing in {}", data.identifier);
        let response: LoginResponse = http.request(api::LOGIN.request(&data.query_pairs())).await?;
        if response.token.trim().is_empty() {
            return Err(ClientError::unexpected_shape(api::LOGIN.name, "no token in response"));
        }

        let session = Session::from(response);
        self.replace(Some(session.clone()));
        info!("Signed in: {}", session);
        Ok(session)
    }

    /// Exchange the current token for a new one.
    ///
    /// If the session changed while the request was out, the newer session
    /// wins and is returned untouched.
    pub async fn refresh_token(&self, http: &HttpClient) -> Result<Session, ClientError> {
        let current = self.current_session().ok_or_else(ClientError::not_signed_in)?;
        let body = RefreshToken {
            token: current.token.clone(),
        };
        let fresh: RefreshToken = http
            .request(api::REFRESH_TOKEN.request(&[]).json(&body)?)
            .await?;

        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(session) if session.token == current.token => {
                session.token = fresh.token;
                persist(self.storage.as_ref(), session);
                debug!("Token refreshed for {}", session.username);
                Ok(session.clone())
            }
            Some(session) => Ok(session.clone()),
            None => Err(ClientError::not_signed_in()),
        }
    }

    /// Merge display name, email and avatar into the current session.
    pub fn update_profile(&self, patch: ProfileUpdate) -> Result<Session, ClientError> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let session = guard.as_mut().ok_or_else(ClientError::not_signed_in)?;
        patch.apply(session);
        persist(self.storage.as_ref(), session);
        Ok(session.clone())
    }

    /// Clear the session and its persisted copy. Never fails.
    pub fn logout(&self) {
        let previous = self.replace(None);
        if let Some(session) = previous {
            info!("Signed out: {}", session);
        }
    }

    /// Sign out only if `token` still belongs to the current session.
    /// Returns whether a session was ended.
    pub fn expire(&self, token: &str) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.as_ref().is_some_and(|s| s.token == token) {
            return false;
        }
        discard(self.storage.as_ref());
        if let Some(session) = guard.take() {
            info!("Signed out: {}", session);
        }
        true
    }

    fn replace(&self, next: Option<Session>) -> Option<Session> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match &next {
            Some(session) => persist(self.storage.as_ref(), session),
            None => discard(self.storage.as_ref()),
        }
        std::mem::replace(&mut *guard, next)
    }
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.token.clone())
            .filter(|t| !t.is_empty())
    }

    fn reject(&self, status: StatusCode, token: &str) {
        if self.expire(token) {
            warn!("Server rejected the session ({}), signed out", status);
        } else {
            debug!("Ignoring {} for a token that is no longer current", status);
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

fn persist(storage: &dyn KeyValueStore, session: &Session) {
    let result = serde_json::to_string(session)
        .map_err(|e| e.to_string())
        .and_then(|raw| storage.set(SESSION_KEY, &raw).map_err(|e| e.to_string()));
    if let Err(e) = result {
        warn!("Failed to persist session: {}", e);
    }
}

fn discard(storage: &dyn KeyValueStore) {
    if let Err(e) = storage.remove(SESSION_KEY) {
        warn!("Failed to remove persisted session: {}", e);
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

/// Credentials for `POST /auth/login`.
///
/// The backend reads these from the query string, not the body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub identifier: String,
    pub password: String,
    pub activation_code: String,
}

impl LoginData {
    pub fn new(identifier: &str, password: &str, activation_code: &str) -> Self {
        Self {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
            activation_code: activation_code.trim().to_string(),
        }
    }

    /// Reject blank fields before anything reaches the network.
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.identifier.is_empty() {
            return Err(LoginError::MissingField("identifier"));
        }
        if self.password.is_empty() {
            return Err(LoginError::MissingField("password"));
        }
        if self.activation_code.is_empty() {
            return Err(LoginError::MissingField("activationCode"));
        }
        Ok(())
    }

    /// Query-string pairs in the order the backend documents them.
    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("identifier", self.identifier.as_str()),
            ("password", self.password.as_str()),
            ("activationCode", self.activation_code.as_str()),
        ]
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub role: String,
    pub activation_code: String,
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Body for `POST /auth/refresh-token`, and its response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Login errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    MissingField(&'static str),
}

impl LoginError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => field,
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::MissingField(field) => format!("Missing required field: {}", field),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in operator, as persisted under the `user` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Display name; falls back to the username when the server sends none.
    pub name: String,
    pub username: String,
    pub role: String,
    pub activation_code: String,
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// Whether `other` belongs to the same operator and campaign.
    pub fn same_identity(&self, other: &Session) -> bool {
        self.username == other.username && self.activation_code == other.activation_code
    }
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        let name = resp
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| resp.username.clone());
        Self {
            name,
            username: resp.username,
            role: resp.role,
            activation_code: resp.activation_code,
            token: resp.token,
            email: resp.email,
            avatar: resp.avatar,
        }
    }
}

/// Partial update merged into the current session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, session: &mut Session) {
        if let Some(name) = self.name {
            session.name = name;
        }
        if let Some(email) = self.email {
            session.email = Some(email);
        }
        if let Some(avatar) = self.avatar {
            session.avatar = Some(avatar);
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

// The token never appears in logs.
impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "username={}, role={}, activation_code={}",
            self.username, self.role, self.activation_code
        )
    }
}

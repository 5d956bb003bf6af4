use serde::{Deserialize, Serialize};

/// Result of `GET /api/searchUsers`: the candidate admin for an activation
/// code and the sub-accounts registered under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDirectory {
    pub activation_code: String,
    #[serde(default)]
    pub candidate_admin_id: String,
    #[serde(default)]
    pub candidate_admin_username: String,
    #[serde(default)]
    pub candidate_admin_name: String,
    #[serde(default)]
    pub candidate_admin_mobile_number: String,
    #[serde(default)]
    pub users: Vec<SubUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubUser {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
}

impl SubUser {
    /// Name and username match case-insensitively; mobile numbers match as
    /// typed.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        let lower = term.to_lowercase();
        self.name.to_lowercase().contains(&lower)
            || self.username.to_lowercase().contains(&lower)
            || self.mobile_number.contains(term)
    }
}

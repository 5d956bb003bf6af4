use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Voter report (`GET /api/voter-report`)
// ---------------------------------------------------------------------------

/// Aggregated print/usage counts for one sub-user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterReportRow {
    #[serde(default)]
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_prints: u64,
    #[serde(default)]
    pub total_voters: u64,
}

/// Sum of prints across every row.
pub fn total_prints(rows: &[VoterReportRow]) -> u64 {
    rows.iter().map(|r| r.total_prints).sum()
}

// ---------------------------------------------------------------------------
// Print activity (`GET /report/user-prints`, `GET /report/total-prints`)
// ---------------------------------------------------------------------------

/// One row of the per-user print activity report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPrintRow {
    #[serde(alias = "username", alias = "userId")]
    pub user: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_prints: u64,
    #[serde(default)]
    pub last_login: Option<String>,
}

/// Outcome of a login attempt.
///
/// `Success` is the positive outcome. A missing status reads as `Success`,
/// matching how the dashboard has always displayed it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginStatus {
    #[default]
    #[serde(alias = "SUCCESS", alias = "success")]
    Success,
    #[serde(alias = "FAILED", alias = "failed", alias = "Failure")]
    Failed,
    #[serde(other)]
    Unknown,
}

impl LoginStatus {
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failed => f.write_str("Failed"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: LoginStatus,
    #[serde(default)]
    pub user_agent: String,
}

/// Envelope returned by `/report/total-prints`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintDetail {
    #[serde(default)]
    pub print: Vec<LoginDetail>,
}

impl PrintDetail {
    pub fn is_empty(&self) -> bool {
        self.print.is_empty()
    }
}

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Gender as recorded on the voter roll.
///
/// Rolls only carry `Male`/`Female` today; anything else decodes as `Other`
/// instead of failing the whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "MALE", alias = "male", alias = "M")]
    Male,
    #[serde(alias = "FEMALE", alias = "female", alias = "F")]
    Female,
    #[serde(other)]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    /// Parse a picker value. `None` for blank input or `"all"`.
    pub fn from_filter(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return None;
        }
        Some(match value.to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Other,
        })
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry on the voter roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    /// Stable identity within one activation code's dataset.
    pub voter_id_number: String,
    #[serde(default)]
    pub house_no: String,
    #[serde(default)]
    pub related_to: String,
    #[serde(default)]
    pub city: String,
    /// `None` when the roll leaves it blank.
    #[serde(default, deserialize_with = "optional_u32")]
    pub booth_no: Option<u32>,
    #[serde(default)]
    pub booth_address: String,
    #[serde(default)]
    pub mobile: Option<String>,
    /// Precomputed by the server; never derived here.
    #[serde(default)]
    pub is_print: bool,
}

impl VoterRecord {
    /// Mobile number, treating an empty string as missing.
    pub fn mobile(&self) -> Option<&str> {
        self.mobile.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    pub fn has_mobile(&self) -> bool {
        self.mobile().is_some()
    }

    /// House number with surrounding whitespace removed; blank is `""`.
    pub fn household_key(&self) -> &str {
        self.house_no.trim()
    }
}

/// Voter search/presearch payload.
///
/// Some backend versions return a bare array, others wrap it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VoterPage {
    Bare(Vec<VoterRecord>),
    Wrapped {
        #[serde(alias = "content", alias = "data", alias = "results")]
        voters: Vec<VoterRecord>,
    },
}

impl VoterPage {
    pub fn into_records(self) -> Vec<VoterRecord> {
        match self {
            Self::Bare(voters) | Self::Wrapped { voters } => voters,
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient scalars
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
    })
}

/// Number or numeric string; `null` and blank strings are `None`.
fn optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
        Some(Scalar::Unsigned(n)) => u32::try_from(n).map(Some).map_err(D::Error::custom),
        Some(Scalar::Signed(n)) => u32::try_from(n).map(Some).map_err(D::Error::custom),
    }
}

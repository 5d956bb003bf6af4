use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Voter attributes whose visibility an operator can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayField {
    Name,
    Age,
    Gender,
    BoothAddress,
    HouseNo,
    MobileNumber,
    RelatedTo,
    PartNo,
    City,
    VoterIdNumber,
}

impl DisplayField {
    pub const ALL: [DisplayField; 10] = [
        Self::Name,
        Self::Age,
        Self::Gender,
        Self::BoothAddress,
        Self::HouseNo,
        Self::MobileNumber,
        Self::RelatedTo,
        Self::PartNo,
        Self::City,
        Self::VoterIdNumber,
    ];

    /// Storage and wire key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::BoothAddress => "boothAddress",
            Self::HouseNo => "houseNo",
            Self::MobileNumber => "mobileNumber",
            Self::RelatedTo => "relatedTo",
            Self::PartNo => "partNo",
            Self::City => "city",
            Self::VoterIdNumber => "voterIdNumber",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::BoothAddress => "Booth Address",
            Self::HouseNo => "House Number",
            Self::MobileNumber => "Mobile Number",
            Self::RelatedTo => "Related To",
            Self::PartNo => "Part Number",
            Self::City => "City",
            Self::VoterIdNumber => "EPIC Number",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Field-name to visibility map. Every field is always present.
///
/// Deserialization ignores unknown keys and non-boolean values; fields the
/// input does not mention stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct FieldVisibility(BTreeMap<DisplayField, bool>);

impl FieldVisibility {
    pub fn all_visible() -> Self {
        Self(DisplayField::ALL.into_iter().map(|f| (f, true)).collect())
    }

    pub fn get(&self, field: DisplayField) -> bool {
        self.0.get(&field).copied().unwrap_or(true)
    }

    pub fn set(&mut self, field: DisplayField, visible: bool) {
        self.0.insert(field, visible);
    }

    pub fn iter(&self) -> impl Iterator<Item = (DisplayField, bool)> + '_ {
        self.0.iter().map(|(f, v)| (*f, *v))
    }
}

impl Default for FieldVisibility {
    fn default() -> Self {
        Self::all_visible()
    }
}

impl From<BTreeMap<String, Value>> for FieldVisibility {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut visibility = Self::all_visible();
        for (key, value) in raw {
            if let (Some(field), Some(visible)) = (DisplayField::from_key(&key), value.as_bool()) {
                visibility.set(field, visible);
            }
        }
        visibility
    }
}

impl FromIterator<(DisplayField, bool)> for FieldVisibility {
    fn from_iter<I: IntoIterator<Item = (DisplayField, bool)>>(iter: I) -> Self {
        let mut visibility = Self::all_visible();
        for (field, visible) in iter {
            visibility.set(field, visible);
        }
        visibility
    }
}

// ---------------------------------------------------------------------------
// Server-side display configuration (`GET /api/config`)
// ---------------------------------------------------------------------------

/// The display configuration stored on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct RemoteConfig {
    pub visibility: FieldVisibility,
    pub banner_url: Option<String>,
}

impl From<BTreeMap<String, Value>> for RemoteConfig {
    fn from(mut raw: BTreeMap<String, Value>) -> Self {
        let banner_url = raw
            .remove("bannerUrl")
            .and_then(|v| v.as_str().map(str::to_string));
        Self {
            visibility: FieldVisibility::from(raw),
            banner_url,
        }
    }
}

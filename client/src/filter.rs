//! # Local voter filtering
//!
//! Views hold filter inputs as raw text ([`FilterForm`]); parsing turns them
//! into [`FilterCriteria`], a conjunction of optional predicates evaluated
//! in memory over an already-fetched working set.
//!
//! | Criterion | Match rule |
//! |-----------|------------|
//! | name, house number, related to | case-insensitive substring |
//! | min/max age | inclusive bounds |
//! | gender, booth number | exact |
//! | city | exact, ignoring case |
//! | mobile required | record has a non-blank mobile |
//! | print enabled required | server's `isPrint` flag is set |
//! | search | substring of every displayable field joined by spaces |
//!
//! Unset criteria and empty strings always pass.

use std::collections::{BTreeMap, HashSet};

use shared::types::{Gender, SubUser, VoterRecord};

use crate::error::ClientError;

/// Every input the filter panel exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Name,
    MinAge,
    MaxAge,
    Gender,
    BoothNo,
    City,
    HouseNo,
    RelatedTo,
    MobileRequired,
    PrintEnabledRequired,
    Search,
}

impl FilterField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::MinAge => "minAge",
            Self::MaxAge => "maxAge",
            Self::Gender => "gender",
            Self::BoothNo => "boothNo",
            Self::City => "city",
            Self::HouseNo => "houseNo",
            Self::RelatedTo => "relatedTo",
            Self::MobileRequired => "mobileRequired",
            Self::PrintEnabledRequired => "printEnabledRequired",
            Self::Search => "search",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::MinAge => "Minimum age",
            Self::MaxAge => "Maximum age",
            Self::Gender => "Gender",
            Self::BoothNo => "Booth number",
            Self::City => "City",
            Self::HouseNo => "House number",
            Self::RelatedTo => "Related to",
            Self::MobileRequired => "Has mobile",
            Self::PrintEnabledRequired => "Print enabled",
            Self::Search => "Search",
        }
    }
}

// ---------------------------------------------------------------------------
// Form input
// ---------------------------------------------------------------------------

/// Filter inputs exactly as a view holds them.
///
/// Pickers use `"all"` (or blank) for "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterForm {
    pub name: String,
    pub min_age: String,
    pub max_age: String,
    pub gender: String,
    pub booth_no: String,
    pub city: String,
    pub house_no: String,
    pub related_to: String,
    pub mobile_required: bool,
    pub print_enabled_required: bool,
    pub search: String,
}

impl FilterForm {
    pub fn parse(&self) -> Result<FilterCriteria, ClientError> {
        let min_age = parse_number(FilterField::MinAge, &self.min_age)?;
        let max_age = parse_number(FilterField::MaxAge, &self.max_age)?;
        if let (Some(min), Some(max)) = (min_age, max_age) {
            if min > max {
                return Err(ClientError::validation(
                    FilterField::MaxAge.key(),
                    "Maximum age must not be below minimum age",
                ));
            }
        }

        Ok(FilterCriteria {
            name: text(&self.name),
            min_age,
            max_age,
            gender: Gender::from_filter(&self.gender),
            booth_no: parse_number(FilterField::BoothNo, &self.booth_no)?,
            city: picker(&self.city),
            house_no: text(&self.house_no),
            related_to: text(&self.related_to),
            mobile_required: self.mobile_required,
            print_enabled_required: self.print_enabled_required,
            search: text(&self.search),
        })
    }
}

fn text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn picker(value: &str) -> Option<String> {
    text(value).filter(|v| !v.eq_ignore_ascii_case("all"))
}

fn parse_number(field: FilterField, value: &str) -> Result<Option<u32>, ClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| {
        ClientError::validation(
            field.key(),
            format!("{} must be a whole number", field.label()),
        )
    })
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub name: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub gender: Option<Gender>,
    pub booth_no: Option<u32>,
    pub city: Option<String>,
    pub house_no: Option<String>,
    pub related_to: Option<String>,
    pub mobile_required: bool,
    pub print_enabled_required: bool,
    pub search: Option<String>,
}

impl FilterCriteria {
    /// Whether no criterion is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &VoterRecord) -> bool {
        contains_ignore_case(&record.name, self.name.as_deref())
            && self.min_age.is_none_or(|min| record.age >= min)
            && self.max_age.is_none_or(|max| record.age <= max)
            && self.gender.is_none_or(|g| record.gender == g)
            && self.booth_no.is_none_or(|b| record.booth_no == Some(b))
            && self.city.as_deref().is_none_or(|city| {
                let city = city.trim();
                city.is_empty() || record.city.trim().to_lowercase() == city.to_lowercase()
            })
            && contains_ignore_case(&record.house_no, self.house_no.as_deref())
            && contains_ignore_case(&record.related_to, self.related_to.as_deref())
            && (!self.mobile_required || record.has_mobile())
            && (!self.print_enabled_required || record.is_print)
            && contains_ignore_case(&search_text(record), self.search.as_deref())
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// All displayable fields of a record joined by single spaces.
pub fn search_text(record: &VoterRecord) -> String {
    let age = record.age.to_string();
    let booth_no = record.booth_no.map(|b| b.to_string());
    [
        record.name.as_str(),
        age.as_str(),
        record.gender.as_str(),
        record.voter_id_number.as_str(),
        record.house_no.as_str(),
        record.related_to.as_str(),
        record.city.as_str(),
        booth_no.as_deref().unwrap_or_default(),
        record.booth_address.as_str(),
        record.mobile().unwrap_or_default(),
    ]
    .join(" ")
}

/// Records passing `criteria`, in input order.
pub fn apply<'a>(records: &'a [VoterRecord], criteria: &FilterCriteria) -> Vec<&'a VoterRecord> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Group records by trimmed house number. Blank house numbers share the `""`
/// group; input order is kept within each group.
pub fn group_by_house_number<'a, I>(records: I) -> BTreeMap<String, Vec<&'a VoterRecord>>
where
    I: IntoIterator<Item = &'a VoterRecord>,
{
    let mut groups: BTreeMap<String, Vec<&'a VoterRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.household_key().to_string())
            .or_default()
            .push(record);
    }
    groups
}

/// Non-blank cities in first-seen order, for the city picker.
pub fn distinct_cities<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a VoterRecord>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .map(|r| r.city.trim())
        .filter(|city| !city.is_empty() && seen.insert(city.to_string()))
        .map(str::to_string)
        .collect()
}

/// Sub-users whose name, username or mobile number matches `term`.
pub fn filter_users<'a>(users: &'a [SubUser], term: &str) -> Vec<&'a SubUser> {
    users.iter().filter(|u| u.matches(term)).collect()
}

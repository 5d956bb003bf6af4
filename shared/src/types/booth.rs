use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothLocation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl BoothLocation {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Totals shown above the booth list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoothSummary {
    pub booths: usize,
    pub total_capacity: u64,
    pub active: usize,
}

impl BoothSummary {
    pub fn of(locations: &[BoothLocation]) -> Self {
        Self {
            booths: locations.len(),
            total_capacity: locations.iter().map(|l| u64::from(l.capacity)).sum(),
            active: locations.iter().filter(|l| l.is_active()).count(),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Remote social-network profile being evaluated as a match.
/// Keyed by its numeric social ID, upserted on every re-fetch.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub social_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Screen name / handle on the social network.
    pub domain: String,
}

impl CandidateProfile {
    pub fn new(social_id: i64) -> Self {
        Self { social_id, ..Default::default() }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

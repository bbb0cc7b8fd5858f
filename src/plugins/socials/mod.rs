use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::candidate::CandidateProfile;

use self::error::SocialResult;

pub mod error;
pub mod vk;

/// One size variant of a remote photo as the social API lists it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PhotoSizeVariant {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

/// Raw photo metadata as returned by the photo source, before curation.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SocialPhoto {
    pub id: i64,
    pub owner_id: i64,
    pub likes_count: u32,
    pub sizes: Vec<PhotoSizeVariant>,
}

// VK size types, smallest to largest: s m o p q r x y z w
fn size_priority(kind: &str) -> i32 {
    match kind {
        "w" => 9,
        "z" => 8,
        "y" => 7,
        "x" => 6,
        "r" => 5,
        "q" => 4,
        "p" => 3,
        "o" => 2,
        "m" => 1,
        "s" => 0,
        _ => -1,
    }
}

impl SocialPhoto {
    /// URL of the highest-priority size variant, if any variant has one.
    pub fn best_url(&self) -> Option<&str> {
        self.sizes
            .iter()
            .filter(|s| !s.url.is_empty())
            .max_by_key(|s| size_priority(&s.kind))
            .map(|s| s.url.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub city_id: i64,
    pub sex: u8,
    pub age_from: u8,
    pub age_to: u8,
    pub count: u32,
}

/// Contract of the remote photo-source collaborator. API-level failures come
/// back as `SocialError::Api`; transport retries live inside the
/// implementation, the consumer never retries itself.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn photos_get(&self, access_token: &str, owner_id: i64) -> SocialResult<Vec<SocialPhoto>>;
    async fn users_search(&self, access_token: &str, filters: &SearchFilters) -> SocialResult<Vec<CandidateProfile>>;
    async fn resolve_city(&self, access_token: &str, name: &str) -> SocialResult<Option<i64>>;
    async fn download(&self, url: &str) -> SocialResult<Bytes>;
}

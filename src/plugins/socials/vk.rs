use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::candidate::CandidateProfile;

use super::error::{SocialError, SocialResult};
use super::{PhotoSource, SearchFilters, SocialPhoto, PhotoSizeVariant};

pub const VK_API_VERSION: &str = "5.199";

const CALL_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);
const CALL_RETRIES: u32 = 2;

/// VK-style JSON API context. One instance per process, cheap to clone.
#[derive(Debug, Clone)]
pub struct VkContext {
    base_url: Url,
    api_version: String,
    client: Client,
}

impl Default for VkContext {
    fn default() -> Self {
        Self::new()
    }
}

impl VkContext {
    pub fn new() -> Self {
        let base_url = Url::parse("https://api.vk.com/method/").unwrap();
        VkContext {
            base_url,
            api_version: VK_API_VERSION.to_string(),
            client: Client::new(),
        }
    }

    /// Generic method call: appends `access_token` and `v`, parses the JSON
    /// body and promotes the `{"error": {...}}` envelope to a typed error.
    /// Transport failures are retried with a linear backoff.
    pub async fn call(&self, method: &str, access_token: &str, params: &[(&str, String)]) -> SocialResult<Value> {
        let url = self.base_url.join(method).map_err(|e| SocialError::Other(format!("invalid method {}: {}", method, e)))?;

        let mut last_error: Option<SocialError> = None;
        for attempt in 0..CALL_RETRIES {
            let request = self.client.get(url.clone())
                .query(params)
                .query(&[("access_token", access_token), ("v", self.api_version.as_str())])
                .timeout(CALL_TIMEOUT);
            match request.send().await {
                Ok(response) => {
                    let data = response.json::<Value>().await?;
                    if let Some(error) = api_error_of(&data) {
                        return Err(error);
                    }
                    return Ok(data);
                }
                Err(error) => {
                    last_error = Some(error.into());
                    if attempt + 1 < CALL_RETRIES {
                        tokio::time::sleep(Duration::from_millis(400 * (attempt as u64 + 1))).await;
                    }
                }
            }
        }
        Err(last_error.unwrap_or(SocialError::Error))
    }

    pub async fn photos_get(&self, access_token: &str, owner_id: i64) -> SocialResult<Vec<SocialPhoto>> {
        let data = self.call("photos.get", access_token, &[
            ("owner_id", owner_id.to_string()),
            ("album_id", "profile".to_string()),
            ("extended", "1".to_string()),
            ("count", "100".to_string()),
        ]).await?;
        parse_photos_response(&data)
    }

    pub async fn users_search(&self, access_token: &str, filters: &SearchFilters) -> SocialResult<Vec<CandidateProfile>> {
        let data = self.call("users.search", access_token, &[
            ("city", filters.city_id.to_string()),
            ("sex", filters.sex.to_string()),
            ("age_from", filters.age_from.to_string()),
            ("age_to", filters.age_to.to_string()),
            ("count", filters.count.to_string()),
            ("has_photo", "1".to_string()),
            ("fields", "domain".to_string()),
        ]).await?;
        parse_profiles_response(&data)
    }

    pub async fn resolve_city(&self, access_token: &str, name: &str) -> SocialResult<Option<i64>> {
        let data = self.call("database.getCities", access_token, &[
            ("q", name.to_string()),
            ("count", "1".to_string()),
        ]).await?;
        Ok(data.pointer("/response/items/0/id").and_then(|v| v.as_i64()))
    }

    pub async fn download(&self, url: &str) -> SocialResult<Bytes> {
        let response = self.client.get(url).timeout(DOWNLOAD_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SocialError::DownloadFailed { url: url.to_string(), status: status.as_u16() });
        }
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl PhotoSource for VkContext {
    async fn photos_get(&self, access_token: &str, owner_id: i64) -> SocialResult<Vec<SocialPhoto>> {
        VkContext::photos_get(self, access_token, owner_id).await
    }
    async fn users_search(&self, access_token: &str, filters: &SearchFilters) -> SocialResult<Vec<CandidateProfile>> {
        VkContext::users_search(self, access_token, filters).await
    }
    async fn resolve_city(&self, access_token: &str, name: &str) -> SocialResult<Option<i64>> {
        VkContext::resolve_city(self, access_token, name).await
    }
    async fn download(&self, url: &str) -> SocialResult<Bytes> {
        VkContext::download(self, url).await
    }
}

fn api_error_of(data: &Value) -> Option<SocialError> {
    let error = data.get("error")?;
    Some(SocialError::Api {
        code: error.get("error_code").and_then(|c| c.as_i64()).unwrap_or(-1),
        message: error.get("error_msg").and_then(|m| m.as_str()).unwrap_or("Unknown social API error").to_string(),
        raw: data.clone(),
    })
}

#[derive(Debug, Deserialize)]
struct VkPhotoItem {
    id: i64,
    #[serde(default)]
    owner_id: i64,
    #[serde(default)]
    likes: VkLikes,
    #[serde(default)]
    sizes: Vec<PhotoSizeVariant>,
}

#[derive(Debug, Deserialize, Default)]
struct VkLikes {
    #[serde(default)]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct VkUserItem {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    domain: String,
}

fn parse_photos_response(data: &Value) -> SocialResult<Vec<SocialPhoto>> {
    let items = data.pointer("/response/items").cloned().unwrap_or(Value::Array(vec![]));
    let items: Vec<VkPhotoItem> = serde_json::from_value(items)?;
    Ok(items.into_iter().map(|item| SocialPhoto {
        id: item.id,
        owner_id: item.owner_id,
        likes_count: item.likes.count,
        sizes: item.sizes,
    }).collect())
}

fn parse_profiles_response(data: &Value) -> SocialResult<Vec<CandidateProfile>> {
    let items = data.pointer("/response/items").cloned().unwrap_or(Value::Array(vec![]));
    let items: Vec<VkUserItem> = serde_json::from_value(items)?;
    Ok(items.into_iter().map(|item| CandidateProfile {
        social_id: item.id,
        first_name: item.first_name,
        last_name: item.last_name,
        domain: item.domain,
    }).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_envelope() {
        let data = json!({"error": {"error_code": 5, "error_msg": "User authorization failed", "request_params": []}});
        let error = api_error_of(&data).expect("should detect error envelope");
        match error {
            SocialError::Api { code, message, raw } => {
                assert_eq!(code, 5);
                assert_eq!(message, "User authorization failed");
                assert!(raw.get("error").is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(api_error_of(&json!({"response": {"items": []}})).is_none());
    }

    #[test]
    fn test_parse_photos_response() {
        let data = json!({"response": {"count": 2, "items": [
            {"id": 10, "owner_id": 42, "likes": {"count": 7}, "sizes": [
                {"type": "s", "url": "http://s"},
                {"type": "w", "url": "http://w"}
            ]},
            {"id": 11, "owner_id": 42, "sizes": []}
        ]}});
        let photos = parse_photos_response(&data).unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].likes_count, 7);
        assert_eq!(photos[0].best_url(), Some("http://w"));
        assert_eq!(photos[1].likes_count, 0);
        assert_eq!(photos[1].best_url(), None);
    }

    #[test]
    fn test_parse_profiles_response() {
        let data = json!({"response": {"count": 1, "items": [
            {"id": 99, "first_name": "Ada", "last_name": "L", "domain": "ada_l"}
        ]}});
        let profiles = parse_profiles_response(&data).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].social_id, 99);
        assert_eq!(profiles[0].domain, "ada_l");
    }
}

use crate::domain::candidate::CandidateProfile;
use crate::domain::photo::CandidatePhoto;
use crate::error::RsResult;
use crate::plugins::socials::{PhotoSource, SearchFilters};
use crate::tools::log::{log_error, log_info, LogServiceType};

use super::ModelController;

/// How many candidates one search request pulls in.
pub const SEARCH_COUNT: u32 = 50;

impl ModelController {
    pub async fn upsert_profile(&self, profile: CandidateProfile) {
        let mut profiles = self.store().profiles.write().await;
        profiles.insert(profile.social_id, profile);
    }

    pub async fn get_profile(&self, candidate_id: i64) -> Option<CandidateProfile> {
        let profiles = self.store().profiles.read().await;
        profiles.get(&candidate_id).cloned()
    }

    /// Populates the queue when it is empty: resolves the city name to an ID
    /// (cached back onto the user), searches for candidates, upserts their
    /// profiles and sets the queue. A missing token or incomplete filters
    /// leave the queue untouched; API errors propagate to the caller.
    pub async fn ensure_queue(&self, user_id: i64) -> RsResult<()> {
        if !self.get_queue(user_id).await.is_empty() {
            return Ok(());
        }
        let user = self.get_or_create_user(user_id).await;
        let Some(access_token) = user.access_token else {
            return Ok(());
        };
        if !user.filters.is_complete() {
            return Ok(());
        }

        let city_id = match user.filters.city_id {
            Some(city_id) => city_id,
            None => {
                let city_name = user.filters.city_name.clone().unwrap_or_default();
                let Some(city_id) = self.source.resolve_city(&access_token, &city_name).await? else {
                    log_info(LogServiceType::Curation, format!("User {}: city {:?} not found", user_id, city_name));
                    return Ok(());
                };
                // cache so the next search skips the resolution call
                self.set_resolved_city(user_id, city_id).await;
                city_id
            }
        };

        let filters = SearchFilters {
            city_id,
            sex: user.filters.gender.unwrap_or(0),
            age_from: user.filters.age_from.unwrap_or(0),
            age_to: user.filters.age_to.unwrap_or(0),
            count: SEARCH_COUNT,
        };
        let profiles = self.source.users_search(&access_token, &filters).await?;
        let candidate_ids: Vec<i64> = profiles.iter().map(|p| p.social_id).collect();
        for profile in profiles {
            self.upsert_profile(profile).await;
        }
        log_info(LogServiceType::Curation, format!("User {}: search returned {} candidates", user_id, candidate_ids.len()));
        self.set_queue(user_id, candidate_ids).await;
        Ok(())
    }

    /// Profile and curated photos of the current candidate, or none when
    /// there is no current candidate.
    pub async fn get_candidate_card(&self, user_id: i64) -> Option<(CandidateProfile, Vec<CandidatePhoto>)> {
        let candidate_id = self.get_current_candidate(user_id).await?;
        let profile = self.get_profile(candidate_id).await.unwrap_or_else(|| CandidateProfile::new(candidate_id));
        let photos = self.get_photos(candidate_id).await;
        Some((profile, photos))
    }

    pub async fn next_candidate(&self, user_id: i64) -> RsResult<Option<i64>> {
        self.ensure_queue(user_id).await?;
        Ok(self.move_next(user_id).await)
    }

    pub async fn prev_candidate(&self, user_id: i64) -> RsResult<Option<i64>> {
        self.ensure_queue(user_id).await?;
        Ok(self.move_prev(user_id).await)
    }

    /// Prepares photo sets for the next few queue entries past the cursor.
    /// Best-effort: per-candidate failures are logged and swallowed so the
    /// foreground navigation flow never notices them.
    pub async fn preload_ahead(&self, user_id: i64) {
        let user = self.get_or_create_user(user_id).await;
        let Some(access_token) = user.access_token else {
            return;
        };
        let ahead = self.queue_ahead(user_id, self.settings.preload_buffer).await;
        for candidate_id in ahead {
            if !self.get_photos(candidate_id).await.is_empty() {
                continue;
            }
            match self.fetch_and_save_photos(&access_token, candidate_id).await {
                Ok(photos) => log_info(LogServiceType::Curation, format!("Read-ahead: {} photos ready for candidate {}", photos.len(), candidate_id)),
                Err(error) => log_error(LogServiceType::Curation, format!("Read-ahead failed for candidate {}: {}", candidate_id, error)),
            }
        }
    }

    /// Fire-and-forget read-ahead, to call after navigation.
    pub fn spawn_preload(&self, user_id: i64) {
        let mc = self.clone();
        tokio::spawn(async move {
            mc.preload_ahead(user_id).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::tests_support::{social_photo, test_controller_with, FakeSource};
    use crate::model::users::SearchPreferences;

    fn profile(id: i64, first_name: &str) -> CandidateProfile {
        CandidateProfile {
            social_id: id,
            first_name: first_name.to_string(),
            last_name: "T".to_string(),
            domain: format!("user{}", id),
        }
    }

    async fn prepared_user(source: Arc<FakeSource>) -> crate::model::ModelController {
        let mc = test_controller_with(source);
        mc.set_credentials(1, "token".to_string(), 500).await;
        mc.update_filters(1, SearchPreferences {
            city_name: Some("Riga".to_string()),
            gender: Some(1),
            age_from: Some(20),
            age_to: Some(30),
            ..Default::default()
        }).await;
        mc
    }

    #[tokio::test]
    async fn test_ensure_queue_populates_and_caches_city() {
        let source = Arc::new(FakeSource::default());
        source.set_city(77);
        source.set_profiles(vec![profile(10, "A"), profile(20, "B")]);
        let mc = prepared_user(source).await;

        mc.ensure_queue(1).await.unwrap();
        assert_eq!(mc.get_queue(1).await, vec![10, 20]);
        assert_eq!(mc.get_profile(10).await.unwrap().first_name, "A");
        assert_eq!(mc.get_or_create_user(1).await.filters.city_id, Some(77));

        // already populated: second call is a no-op
        mc.ensure_queue(1).await.unwrap();
        assert_eq!(mc.get_current_candidate(1).await, Some(10));
    }

    #[tokio::test]
    async fn test_ensure_queue_requires_token_and_filters() {
        let source = Arc::new(FakeSource::default());
        source.set_city(77);
        source.set_profiles(vec![profile(10, "A")]);
        let mc = test_controller_with(source);

        // no token, no filters
        mc.ensure_queue(1).await.unwrap();
        assert!(mc.get_queue(1).await.is_empty());

        mc.set_credentials(1, "token".to_string(), 500).await;
        mc.ensure_queue(1).await.unwrap();
        assert!(mc.get_queue(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_candidate_card() {
        let source = Arc::new(FakeSource::default());
        source.set_city(77);
        source.set_profiles(vec![profile(10, "A")]);
        let mc = prepared_user(source).await;
        assert!(mc.get_candidate_card(1).await.is_none());

        mc.ensure_queue(1).await.unwrap();
        let (card_profile, photos) = mc.get_candidate_card(1).await.unwrap();
        assert_eq!(card_profile.social_id, 10);
        assert!(photos.is_empty());
    }

    #[tokio::test]
    async fn test_preload_ahead_prepares_window_and_skips_prepared() {
        let source = Arc::new(FakeSource::default());
        source.set_photos_for(20, vec![
            social_photo(1, 20, 5, "http://p/20-1"),
            social_photo(2, 20, 4, "http://p/20-2"),
        ]);
        source.set_photos_for(30, vec![social_photo(3, 30, 9, "http://p/30-3")]);
        let mc = test_controller_with(source.clone());
        mc.set_credentials(1, "token".to_string(), 500).await;
        mc.set_queue(1, vec![10, 20, 30]).await;

        mc.preload_ahead(1).await;
        // current candidate is not part of the window
        assert!(mc.get_photos(10).await.is_empty());
        assert_eq!(mc.get_photos(20).await.len(), 2);
        assert_eq!(mc.get_photos(30).await.len(), 1);
        let downloads = source.download_count();

        // already-prepared candidates are not fetched again
        mc.preload_ahead(1).await;
        assert_eq!(source.download_count(), downloads);
    }

    #[tokio::test]
    async fn test_preload_ahead_swallows_api_errors() {
        let source = Arc::new(FakeSource::default());
        source.set_api_error(6);
        let mc = test_controller_with(source.clone());
        mc.set_credentials(1, "token".to_string(), 500).await;
        mc.set_queue(1, vec![10, 20, 30]).await;

        // every fetch in the window fails; the loop still visits them all
        // and the call itself never errors
        mc.preload_ahead(1).await;
        assert!(mc.get_photos(20).await.is_empty());
        assert!(mc.get_photos(30).await.is_empty());
        assert_eq!(mc.get_current_candidate(1).await, Some(10));
        assert_eq!(source.download_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_city_leaves_queue_empty() {
        let source = Arc::new(FakeSource::default());
        source.set_profiles(vec![profile(10, "A")]);
        let mc = prepared_user(source).await;

        mc.ensure_queue(1).await.unwrap();
        assert!(mc.get_queue(1).await.is_empty());
    }
}

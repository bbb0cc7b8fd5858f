use serde::{Deserialize, Serialize};

use super::ModelController;

/// Search filters a user fills in before the candidate search can run.
/// The city is entered as a name and resolved to a numeric ID lazily.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchPreferences {
    pub city_name: Option<String>,
    pub city_id: Option<i64>,
    pub gender: Option<u8>,
    pub age_from: Option<u8>,
    pub age_to: Option<u8>,
}

impl SearchPreferences {
    pub fn is_complete(&self) -> bool {
        self.city_name.is_some() && self.gender.is_some() && self.age_from.is_some() && self.age_to.is_some()
    }
}

/// A user of the curation engine, keyed by their messenger-side ID.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub user_id: i64,
    /// Social-network access token obtained by the (external) auth flow.
    pub access_token: Option<String>,
    /// The user's own ID on the social network.
    pub social_id: Option<i64>,
    pub filters: SearchPreferences,
}

impl ModelController {
    pub async fn get_or_create_user(&self, user_id: i64) -> AppUser {
        let mut users = self.store().users.write().await;
        users.entry(user_id)
            .or_insert_with(|| AppUser { user_id, ..Default::default() })
            .clone()
    }

    pub async fn set_credentials(&self, user_id: i64, access_token: String, social_id: i64) {
        let mut users = self.store().users.write().await;
        let user = users.entry(user_id).or_insert_with(|| AppUser { user_id, ..Default::default() });
        user.access_token = Some(access_token);
        user.social_id = Some(social_id);
    }

    /// New filters invalidate the current search: the queue is dropped and
    /// the next navigation triggers a fresh search.
    pub async fn update_filters(&self, user_id: i64, filters: SearchPreferences) {
        {
            let mut users = self.store().users.write().await;
            let user = users.entry(user_id).or_insert_with(|| AppUser { user_id, ..Default::default() });
            user.filters = filters;
        }
        self.clear_queue(user_id).await;
    }

    pub(super) async fn set_resolved_city(&self, user_id: i64, city_id: i64) {
        let mut users = self.store().users.write().await;
        if let Some(user) = users.get_mut(&user_id) {
            user.filters.city_id = Some(city_id);
        }
    }

    pub async fn add_favorite(&self, user_id: i64, candidate_id: i64) {
        let mut favorites = self.store().favorites.write().await;
        favorites.entry(user_id).or_default().insert(candidate_id);
    }

    pub async fn remove_favorite(&self, user_id: i64, candidate_id: i64) {
        let mut favorites = self.store().favorites.write().await;
        if let Some(set) = favorites.get_mut(&user_id) {
            set.remove(&candidate_id);
        }
    }

    pub async fn list_favorites(&self, user_id: i64) -> Vec<i64> {
        let favorites = self.store().favorites.read().await;
        let mut ids: Vec<i64> = favorites.get(&user_id).map(|set| set.iter().copied().collect()).unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Blacklisting also evicts the candidate from the navigation queue,
    /// with cursor renormalization.
    pub async fn add_blacklist(&self, user_id: i64, candidate_id: i64) {
        {
            let mut blacklist = self.store().blacklist.write().await;
            blacklist.entry(user_id).or_default().insert(candidate_id);
        }
        self.remove_from_queue(user_id, candidate_id).await;
    }

    pub async fn list_blacklist(&self, user_id: i64) -> Vec<i64> {
        let blacklist = self.store().blacklist.read().await;
        let mut ids: Vec<i64> = blacklist.get(&user_id).map(|set| set.iter().copied().collect()).unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}

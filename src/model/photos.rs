use std::path::Path;

use tokio::fs;

use crate::domain::photo::{CandidatePhoto, PhotoStatus};
use crate::error::RsResult;
use crate::plugins::socials::PhotoSource;
use crate::tools::curation::select_top_photos;
use crate::tools::log::{log_debug, log_error, log_info, LogServiceType};

use super::{ModelController, MIN_PHOTOS_FOR_CLUSTERING};

impl ModelController {
    pub async fn get_photos(&self, candidate_id: i64) -> Vec<CandidatePhoto> {
        let photos = self.store().photos.read().await;
        photos.get(&candidate_id).cloned().unwrap_or_default()
    }

    /// Full replacement: a re-run never merges with a previous photo set.
    pub async fn set_photos(&self, candidate_id: i64, photos: Vec<CandidatePhoto>) {
        let mut store_photos = self.store().photos.write().await;
        store_photos.insert(candidate_id, photos);
    }

    /// Full curation pipeline for one candidate:
    ///
    /// 1) fetch photo metadata from the source (typed API errors propagate)
    /// 2) nothing there: empty result, the candidate is unselectable
    /// 3) keep entries with a resolvable URL, rank by likes, download the
    ///    top `download_n` (present files are not re-fetched; failed
    ///    downloads are dropped, never fatal)
    /// 4) fewer than 3 on disk: use them as-is, all selected
    /// 5) otherwise run the face pipeline; recognition unavailable or
    ///    nothing selected falls back to top `top_n` by likes
    /// 6) persist the final set, replacing any prior one
    pub async fn fetch_and_save_photos(&self, access_token: &str, candidate_id: i64) -> RsResult<Vec<CandidatePhoto>> {
        let items = self.source.photos_get(access_token, candidate_id).await?;
        if items.is_empty() {
            log_info(LogServiceType::Curation, format!("Candidate {}: no photos in profile", candidate_id));
            return Ok(vec![]);
        }

        let mut parsed: Vec<CandidatePhoto> = items.iter()
            .filter_map(|item| {
                item.best_url().map(|url| CandidatePhoto::new(item.id, item.owner_id, url.to_string(), item.likes_count))
            })
            .collect();
        if parsed.is_empty() {
            return Ok(vec![]);
        }

        parsed.sort_by(|a, b| b.likes_count.cmp(&a.likes_count));
        parsed.truncate(self.settings.download_n);

        let candidate_dir = self.settings.photos_dir.join(candidate_id.to_string());
        fs::create_dir_all(&candidate_dir).await?;

        let mut downloaded = Vec::new();
        for mut photo in parsed {
            if self.download_photo(&mut photo, &candidate_dir).await {
                downloaded.push(photo);
            }
        }
        if downloaded.is_empty() {
            return Ok(vec![]);
        }

        if downloaded.len() < MIN_PHOTOS_FOR_CLUSTERING {
            log_info(LogServiceType::Curation, format!(
                "Candidate {}: only {} photos, skipping identity check",
                candidate_id, downloaded.len()
            ));
            for photo in downloaded.iter_mut() {
                photo.status = PhotoStatus::Selected;
            }
            self.set_photos(candidate_id, downloaded.clone()).await;
            return Ok(downloaded);
        }

        let analyzer = match self.analyzer() {
            Ok(analyzer) => analyzer,
            Err(error) => {
                log_info(LogServiceType::Curation, format!(
                    "Candidate {}: recognition unavailable ({}), selecting by likes",
                    candidate_id, error
                ));
                return Ok(self.select_by_likes(downloaded, candidate_id).await);
            }
        };

        log_info(LogServiceType::Curation, format!(
            "Candidate {}: running face pipeline over {} photos",
            candidate_id, downloaded.len()
        ));
        let selected = select_top_photos(analyzer.as_ref(), &mut downloaded, self.settings.top_n);
        if selected.is_empty() {
            log_error(LogServiceType::Curation, format!(
                "Candidate {}: face pipeline selected nothing, selecting by likes",
                candidate_id
            ));
            return Ok(self.select_by_likes(downloaded, candidate_id).await);
        }

        self.set_photos(candidate_id, selected.clone()).await;
        Ok(selected)
    }

    /// Popularity fallback when identity verification cannot run.
    async fn select_by_likes(&self, mut photos: Vec<CandidatePhoto>, candidate_id: i64) -> Vec<CandidatePhoto> {
        photos.sort_by(|a, b| b.likes_count.cmp(&a.likes_count));
        photos.truncate(self.settings.top_n);
        for photo in photos.iter_mut() {
            photo.status = PhotoStatus::Selected;
            photo.reject_reason = None;
        }
        self.set_photos(candidate_id, photos.clone()).await;
        photos
    }

    /// One photo to disk, idempotent by candidate+photo ID path. Any
    /// download or write failure drops the photo from consideration.
    async fn download_photo(&self, photo: &mut CandidatePhoto, candidate_dir: &Path) -> bool {
        let path = candidate_dir.join(format!("{}.jpg", photo.photo_id));
        if path.exists() {
            photo.local_path = Some(path);
            return true;
        }
        let bytes = match self.source.download(&photo.url).await {
            Ok(bytes) => bytes,
            Err(error) => {
                log_debug(LogServiceType::Curation, format!("Download failed for {}: {}", photo.url, error));
                return false;
            }
        };
        match fs::write(&path, &bytes).await {
            Ok(()) => {
                photo.local_path = Some(path);
                true
            }
            Err(error) => {
                log_error(LogServiceType::Curation, format!("Unable to write {:?}: {}", path, error));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::domain::face::{DetectedFace, FaceBBox};
    use crate::model::tests_support::{social_photo, test_controller_with, FakeSource};
    use crate::plugins::socials::error::SocialError;
    use crate::tools::recognition::FaceAnalyzer;
    use crate::{Error, Result};

    #[tokio::test]
    async fn test_no_photos_means_unselectable() {
        let source = Arc::new(FakeSource::default());
        let mc = test_controller_with(source);
        let photos = mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert!(photos.is_empty());
        assert!(mc.get_photos(42).await.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let source = Arc::new(FakeSource::default());
        source.set_api_error(6); // rate limit
        let mc = test_controller_with(source);
        let result = mc.fetch_and_save_photos("token", 42).await;
        match result {
            Err(Error::Social(SocialError::Api { code, .. })) => assert_eq!(code, 6),
            other => panic!("expected Api error, got {:?}", other.map(|p| p.len())),
        }
    }

    #[tokio::test]
    async fn test_two_photos_selected_without_clustering() {
        let source = Arc::new(FakeSource::default());
        source.set_photos_for(42, vec![
            social_photo(1, 42, 5, "http://p/1"),
            social_photo(2, 42, 9, "http://p/2"),
        ]);
        let mc = test_controller_with(source);

        let photos = mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos.iter().all(|p| p.status == PhotoStatus::Selected));
        assert!(photos.iter().all(|p| p.local_path.as_ref().unwrap().exists()));
        // ranked by likes
        assert_eq!(photos[0].photo_id, 2);
        assert_eq!(mc.get_photos(42).await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_download_dropped_not_fatal() {
        let source = Arc::new(FakeSource::default());
        source.set_photos_for(42, vec![
            social_photo(1, 42, 5, "http://p/1"),
            social_photo(2, 42, 9, "http://bad/2"),
            social_photo(3, 42, 7, "http://p/3"),
        ]);
        source.fail_url("http://bad/2");
        let mc = test_controller_with(source);

        let photos = mc.fetch_and_save_photos("token", 42).await.unwrap();
        let ids: Vec<i64> = photos.iter().map(|p| p.photo_id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(photos.iter().all(|p| p.status == PhotoStatus::Selected));
    }

    #[tokio::test]
    async fn test_recognition_off_falls_back_to_likes() {
        let source = Arc::new(FakeSource::default());
        source.set_photos_for(42, (1..=5).map(|i| social_photo(i, 42, 10 - i as u32, &format!("http://p/{}", i))).collect());
        let mc = test_controller_with(source); // use_recognition = false in tests

        let photos = mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert_eq!(photos.len(), 3);
        let ids: Vec<i64> = photos.iter().map(|p| p.photo_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(photos.iter().all(|p| p.status == PhotoStatus::Selected));
    }

    #[tokio::test]
    async fn test_rerun_fully_replaces_prior_set() {
        let source = Arc::new(FakeSource::default());
        source.set_photos_for(42, vec![
            social_photo(1, 42, 5, "http://p/1"),
            social_photo(2, 42, 4, "http://p/2"),
        ]);
        let mc = test_controller_with(source.clone());
        mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert_eq!(mc.get_photos(42).await.len(), 2);

        source.set_photos_for(42, vec![social_photo(9, 42, 1, "http://p/9")]);
        let photos = mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert_eq!(photos.len(), 1);
        let stored = mc.get_photos(42).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].photo_id, 9);
    }

    #[tokio::test]
    async fn test_existing_files_not_redownloaded() {
        let source = Arc::new(FakeSource::default());
        source.set_photos_for(42, vec![
            social_photo(1, 42, 5, "http://p/1"),
            social_photo(2, 42, 4, "http://p/2"),
        ]);
        let mc = test_controller_with(source.clone());
        mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert_eq!(source.download_count(), 2);

        mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert_eq!(source.download_count(), 2);
    }

    struct SamePersonAnalyzer;

    impl FaceAnalyzer for SamePersonAnalyzer {
        fn detect(&self, _image_path: &Path) -> Result<Vec<DetectedFace>> {
            Ok(vec![DetectedFace {
                bbox: FaceBBox { x1: 0.0, y1: 0.0, x2: 120.0, y2: 120.0 },
                det_score: 0.9,
                landmarks: vec![],
                embedding: vec![1.0, 0.0],
            }])
        }
        fn blur_score(&self, _image_path: &Path, _bbox: &FaceBBox) -> f32 {
            200.0
        }
    }

    #[tokio::test]
    async fn test_pipeline_with_injected_analyzer() {
        let source = Arc::new(FakeSource::default());
        source.set_photos_for(42, (1..=5).map(|i| social_photo(i, 42, 10 - i as u32, &format!("http://p/{}", i))).collect());
        let mc = test_controller_with(source).with_analyzer(Arc::new(SamePersonAnalyzer));

        let photos = mc.fetch_and_save_photos("token", 42).await.unwrap();
        assert_eq!(photos.len(), 3);
        let ids: Vec<i64> = photos.iter().map(|p| p.photo_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(photos.iter().all(|p| p.status == PhotoStatus::Selected));
        assert_eq!(mc.get_photos(42).await.len(), 3);
    }
}

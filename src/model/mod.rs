pub mod candidates;
pub mod photos;
pub mod queues;
pub mod store;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::plugins::socials::vk::VkContext;
use crate::plugins::socials::PhotoSource;
use crate::tools::recognition::{get_face_analyzer, FaceAnalyzer};
use crate::{Error, Result};

use self::store::MemoryStore;

/// How many photos need to be on disk before identity clustering is worth
/// running; below that the downloaded photos are used as-is.
pub const MIN_PHOTOS_FOR_CLUSTERING: usize = 3;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CurationSettings {
	pub photos_dir: PathBuf,
	pub models_dir: PathBuf,
	/// How many photos end up selected per candidate.
	pub top_n: usize,
	/// How many ranked photos are downloaded for analysis.
	pub download_n: usize,
	/// How many queue entries past the cursor read-ahead prepares.
	pub preload_buffer: usize,
	/// Face recognition capability flag. When off, selection falls back to
	/// plain popularity ranking.
	pub use_recognition: bool,
}

impl Default for CurationSettings {
	fn default() -> Self {
		Self {
			photos_dir: PathBuf::from("data/photos"),
			models_dir: PathBuf::from("data/models"),
			top_n: 3,
			download_n: 10,
			preload_buffer: 5,
			use_recognition: true,
		}
	}
}

#[derive(Clone)]
pub struct ModelController {
	store: Arc<MemoryStore>,
	pub source: Arc<dyn PhotoSource>,
	pub settings: Arc<CurationSettings>,
	analyzer_override: Option<Arc<dyn FaceAnalyzer>>,
}

// Constructor
impl ModelController {
	pub fn new(source: Arc<dyn PhotoSource>, settings: CurationSettings) -> Self {
		Self {
			store: Arc::new(MemoryStore::new()),
			source,
			settings: Arc::new(settings),
			analyzer_override: None,
		}
	}

	pub fn new_vk(settings: CurationSettings) -> Self {
		Self::new(Arc::new(VkContext::new()), settings)
	}

	/// Replaces the process-wide detection capability, for tests and
	/// alternative backends.
	pub fn with_analyzer(mut self, analyzer: Arc<dyn FaceAnalyzer>) -> Self {
		self.analyzer_override = Some(analyzer);
		self
	}

	pub(crate) fn store(&self) -> &MemoryStore {
		&self.store
	}

	/// The face analysis capability: the injected override if any, otherwise
	/// the lazily initialized process-wide detector.
	pub(crate) fn analyzer(&self) -> Result<Arc<dyn FaceAnalyzer>> {
		if let Some(analyzer) = &self.analyzer_override {
			return Ok(analyzer.clone());
		}
		if !self.settings.use_recognition {
			return Err(Error::RecognitionDisabled);
		}
		let detector = get_face_analyzer(&self.settings.models_dir)?;
		Ok(detector)
	}
}

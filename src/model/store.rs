use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::domain::candidate::CandidateProfile;
use crate::domain::photo::CandidatePhoto;

use super::queues::CandidateQueue;
use super::users::AppUser;

/// In-memory single source of truth: users, candidate queues, candidate
/// profiles and curated photo sets. Every per-user read-modify-write path
/// holds the matching write lock for the whole operation, which serializes
/// queue and cursor mutations for that user.
pub struct MemoryStore {
	pub(super) users: RwLock<HashMap<i64, AppUser>>,
	pub(super) queues: RwLock<HashMap<i64, CandidateQueue>>,
	pub(super) profiles: RwLock<HashMap<i64, CandidateProfile>>,
	pub(super) photos: RwLock<HashMap<i64, Vec<CandidatePhoto>>>,
	pub(super) favorites: RwLock<HashMap<i64, HashSet<i64>>>,
	pub(super) blacklist: RwLock<HashMap<i64, HashSet<i64>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self {
			users: RwLock::new(HashMap::new()),
			queues: RwLock::new(HashMap::new()),
			profiles: RwLock::new(HashMap::new()),
			photos: RwLock::new(HashMap::new()),
			favorites: RwLock::new(HashMap::new()),
			blacklist: RwLock::new(HashMap::new()),
		}
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

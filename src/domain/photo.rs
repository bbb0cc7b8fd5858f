use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, strum_macros::Display, EnumString, Default)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum PhotoStatus {
    #[default]
    Raw,
    Accepted,
    Rejected,
    Selected,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, strum_macros::Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    NoFace,
    MultiFace,
    Blurry,
    SmallFace,
    LowScore,
    Error,
    Unknown,
}

/// One photo of a candidate as it moves through the curation pipeline.
/// `Selected` implies the photo was downloaded (`local_path` set).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePhoto {
    pub photo_id: i64,
    pub owner_id: i64,
    pub url: String,
    pub likes_count: u32,
    pub local_path: Option<PathBuf>,
    pub status: PhotoStatus,
    pub reject_reason: Option<RejectReason>,
}

impl CandidatePhoto {
    pub fn new(photo_id: i64, owner_id: i64, url: String, likes_count: u32) -> Self {
        Self {
            photo_id,
            owner_id,
            url,
            likes_count,
            local_path: None,
            status: PhotoStatus::Raw,
            reject_reason: None,
        }
    }

    pub fn reject(&mut self, reason: RejectReason) {
        self.status = PhotoStatus::Rejected;
        self.reject_reason = Some(reason);
    }
}

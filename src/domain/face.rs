use serde::{Deserialize, Serialize};

/// Face bounding box in pixel coordinates `[x1, y1, x2, y2]`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaceBBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl FaceBBox {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// Result of detecting one face on one image. Transient: consumed within a
/// single curation run, never persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    pub bbox: FaceBBox,
    pub det_score: f32,
    /// 5 landmark points (eyes, nose, mouth corners).
    pub landmarks: Vec<(f32, f32)>,
    /// L2-normalized embedding, 512 floats for ArcFace-style models.
    pub embedding: Vec<f32>,
}

impl DetectedFace {
    pub fn face_width(&self) -> f32 {
        self.bbox.width()
    }
    pub fn face_height(&self) -> f32 {
        self.bbox.height()
    }
}

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use ort::{inputs, GraphOptimizationLevel, Session, SessionOutputs};

use crate::domain::face::{DetectedFace, FaceBBox};
use crate::tools::image_tools::calc_blur_score;
use crate::tools::log::{log_error, log_info, LogServiceType};
use crate::{Error, Result};

pub const DETECTION_MODEL_FILENAME: &str = "scrfd_10g_bnkps.onnx";
pub const RECOGNITION_MODEL_FILENAME: &str = "w600k_r50.onnx";

const DET_SIZE: (u32, u32) = (640, 640);
const EMBED_SIZE: u32 = 112;
const DET_CANDIDATE_THRESHOLD: f32 = 0.3;

/// Face analysis capability consumed by the curation pipeline. The `ort`
/// backed [`FaceDetector`] is the production implementation; tests supply
/// their own.
pub trait FaceAnalyzer: Send + Sync {
    fn detect(&self, image_path: &Path) -> Result<Vec<DetectedFace>>;
    fn blur_score(&self, image_path: &Path, bbox: &FaceBBox) -> f32;
}

/// SCRFD detection + ArcFace embedding over ONNX sessions. Sessions are
/// loaded once and shared read-only, detection does not mutate state.
pub struct FaceDetector {
    detection: Session,
    recognition: Session,
    det_size: (u32, u32),
}

impl FaceDetector {
    pub fn new(models_dir: &Path) -> Result<Self> {
        let detection_path = models_dir.join(DETECTION_MODEL_FILENAME);
        let recognition_path = models_dir.join(RECOGNITION_MODEL_FILENAME);
        if !detection_path.exists() {
            return Err(Error::ModelNotFound(detection_path.to_string_lossy().to_string()));
        }
        if !recognition_path.exists() {
            return Err(Error::ModelNotFound(recognition_path.to_string_lossy().to_string()));
        }

        let detection = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&detection_path)?;
        let recognition = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&recognition_path)?;

        log_info(LogServiceType::Curation, format!("FaceDetector initialized from {:?}", models_dir));
        Ok(Self { detection, recognition, det_size: DET_SIZE })
    }

    pub fn detect_image(&self, img: &DynamicImage) -> Result<Vec<DetectedFace>> {
        let (src_width, src_height) = (img.width() as f32, img.height() as f32);
        let (det_width, det_height) = self.det_size;
        let resized = img.resize_exact(det_width, det_height, FilterType::Triangle).to_rgb8();

        let image_data: Vec<f32> = resized.pixels()
            .flat_map(|p| [(p[0] as f32 - 127.5) / 128.0, (p[1] as f32 - 127.5) / 128.0, (p[2] as f32 - 127.5) / 128.0])
            .collect();
        let input = Array4::from_shape_vec((1_usize, det_height as usize, det_width as usize, 3_usize), image_data)?;

        let input_name = self.detection.inputs.first()
            .ok_or(Error::Error { message: "Detection model does not have inputs".to_string() })?
            .name.to_string();
        let output_name = self.detection.outputs.first()
            .ok_or(Error::Error { message: "Detection model does not have outputs".to_string() })?
            .name.to_string();

        let outputs: SessionOutputs = self.detection.run(inputs![input_name => input.view()]?)?;
        let binding = outputs[output_name.as_str()].try_extract_tensor::<f32>()?;
        let output = binding.view();
        let detections: Vec<f32> = output.iter().copied().collect();

        // rows of [x1, y1, x2, y2, score, 5 landmark pairs], in det_size space
        let scale_x = src_width / det_width as f32;
        let scale_y = src_height / det_height as f32;
        let mut faces = Vec::new();
        for row in detections.chunks_exact(15) {
            let det_score = row[4];
            if det_score < DET_CANDIDATE_THRESHOLD {
                continue;
            }
            let bbox = FaceBBox {
                x1: row[0] * scale_x,
                y1: row[1] * scale_y,
                x2: row[2] * scale_x,
                y2: row[3] * scale_y,
            };
            let landmarks: Vec<(f32, f32)> = row[5..15]
                .chunks_exact(2)
                .map(|pt| (pt[0] * scale_x, pt[1] * scale_y))
                .collect();
            let embedding = self.embed(img, &bbox)?;
            faces.push(DetectedFace { bbox, det_score, landmarks, embedding });
        }
        Ok(faces)
    }

    fn embed(&self, img: &DynamicImage, bbox: &FaceBBox) -> Result<Vec<f32>> {
        let (width, height) = (img.width(), img.height());
        let x1 = (bbox.x1.max(0.0) as u32).min(width);
        let y1 = (bbox.y1.max(0.0) as u32).min(height);
        let x2 = (bbox.x2.max(0.0) as u32).min(width);
        let y2 = (bbox.y2.max(0.0) as u32).min(height);
        if x2 <= x1 || y2 <= y1 {
            return Err(Error::Error { message: "Face crop outside image bounds".to_string() });
        }
        let crop = img.crop_imm(x1, y1, x2 - x1, y2 - y1)
            .resize_exact(EMBED_SIZE, EMBED_SIZE, FilterType::Lanczos3)
            .to_rgb8();

        // NCHW, same normalization as the detector input
        let side = EMBED_SIZE as usize;
        let mut image_data = vec![0f32; 3 * side * side];
        for (x, y, pixel) in crop.enumerate_pixels() {
            for channel in 0..3 {
                image_data[channel * side * side + y as usize * side + x as usize] =
                    (pixel[channel] as f32 - 127.5) / 128.0;
            }
        }
        let input = Array4::from_shape_vec((1_usize, 3_usize, side, side), image_data)?;

        let input_name = self.recognition.inputs.first()
            .ok_or(Error::Error { message: "Recognition model does not have inputs".to_string() })?
            .name.to_string();
        let output_name = self.recognition.outputs.first()
            .ok_or(Error::Error { message: "Recognition model does not have outputs".to_string() })?
            .name.to_string();

        let outputs: SessionOutputs = self.recognition.run(inputs![input_name => input.view()]?)?;
        let binding = outputs[output_name.as_str()].try_extract_tensor::<f32>()?;
        let output = binding.view();
        let embedding: Vec<f32> = output.iter().copied().collect();
        Ok(l2_normalize(embedding))
    }
}

pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    vector
}

impl FaceAnalyzer for FaceDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<DetectedFace>> {
        let img = match image::open(image_path) {
            Ok(img) => img,
            Err(error) => {
                log_error(LogServiceType::Curation, format!("Unable to read image {:?}: {}", image_path, error));
                return Ok(vec![]);
            }
        };
        self.detect_image(&img)
    }

    fn blur_score(&self, image_path: &Path, bbox: &FaceBBox) -> f32 {
        calc_blur_score(image_path, bbox)
    }
}

// Model weights are expensive to load: one process-wide handle, lazily
// built on first use, resettable for tests.
static ANALYZER: RwLock<Option<Arc<FaceDetector>>> = RwLock::new(None);

pub fn get_face_analyzer(models_dir: &PathBuf) -> Result<Arc<FaceDetector>> {
    if let Some(existing) = ANALYZER.read().unwrap().as_ref() {
        return Ok(existing.clone());
    }
    let mut guard = ANALYZER.write().unwrap();
    if let Some(existing) = guard.as_ref() {
        return Ok(existing.clone());
    }
    let detector = Arc::new(FaceDetector::new(models_dir)?);
    *guard = Some(detector.clone());
    Ok(detector)
}

pub fn reset_face_analyzer() {
    *ANALYZER.write().unwrap() = None;
}

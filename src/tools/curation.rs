use std::path::PathBuf;

use crate::domain::face::DetectedFace;
use crate::domain::photo::{CandidatePhoto, PhotoStatus, RejectReason};
use crate::tools::image_tools::MIN_BLUR_SCORE;
use crate::tools::log::{log_debug, log_info, LogServiceType};
use crate::tools::recognition::FaceAnalyzer;

/// Minimum detector confidence for the sole face on a photo.
pub const MIN_DET_SCORE: f32 = 0.5;
/// Minimum face bbox side in pixels.
pub const MIN_FACE_SIZE: f32 = 50.0;
/// Minimum cosine similarity for two embeddings to count as the same person.
pub const SAME_PERSON_THRESHOLD: f32 = 0.4;

/// Cosine similarity of two L2-normalized embeddings. For normalized
/// vectors this is just the dot product; inputs are not renormalized here.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Quality gate: exactly one face, confident enough, large enough.
/// Returns the admissible face or the reason the photo is rejected.
pub fn filter_single_face(faces: Vec<DetectedFace>) -> core::result::Result<DetectedFace, RejectReason> {
    if faces.len() > 1 {
        return Err(RejectReason::MultiFace);
    }
    let face = faces.into_iter().next().ok_or(RejectReason::NoFace)?;
    if face.det_score < MIN_DET_SCORE {
        return Err(RejectReason::LowScore);
    }
    if face.face_width() < MIN_FACE_SIZE || face.face_height() < MIN_FACE_SIZE {
        return Err(RejectReason::SmallFace);
    }
    Ok(face)
}

struct AnalyzedPhoto {
    index: usize,
    face: DetectedFace,
}

/// Photos believed to depict the same person. Single-link membership: a
/// candidate joins if it matches at least one member.
struct FaceGroup {
    photos: Vec<AnalyzedPhoto>,
}

impl FaceGroup {
    fn matches(&self, candidate: &AnalyzedPhoto) -> bool {
        self.photos.iter().any(|member| {
            cosine_similarity(&member.face.embedding, &candidate.face.embedding) >= SAME_PERSON_THRESHOLD
        })
    }
}

/// Identity clustering and selection over an ordered (popularity-descending)
/// photo list:
///
/// 1) analyze each photo in order (detect, quality gate, blur check)
/// 2) join the first group with a matching embedding, or start a new group
/// 3) stop as soon as any group holds `top_n` photos; later photos keep
///    their `Raw` status untouched
/// 4) take the largest group (first formed wins ties), rank by likes, mark
///    the first `top_n` as selected
///
/// Statuses are written back onto `photos`; the returned list holds the
/// selected photos, ranked by likes.
pub fn select_top_photos(
    analyzer: &dyn FaceAnalyzer,
    photos: &mut [CandidatePhoto],
    top_n: usize,
) -> Vec<CandidatePhoto> {
    let mut groups: Vec<FaceGroup> = Vec::new();

    for index in 0..photos.len() {
        let local_path: Option<PathBuf> = photos[index].local_path.clone();
        let path = match local_path {
            Some(path) if path.exists() => path,
            _ => {
                photos[index].reject(RejectReason::Error);
                continue;
            }
        };

        let faces = match analyzer.detect(&path) {
            Ok(faces) => faces,
            Err(_) => {
                photos[index].reject(RejectReason::Error);
                continue;
            }
        };

        let face = match filter_single_face(faces) {
            Ok(face) => face,
            Err(reason) => {
                photos[index].reject(reason);
                log_debug(LogServiceType::Curation, format!("Photo {} rejected: {}", photos[index].photo_id, reason));
                continue;
            }
        };

        let blur_score = analyzer.blur_score(&path, &face.bbox);
        if blur_score < MIN_BLUR_SCORE {
            photos[index].reject(RejectReason::Blurry);
            log_debug(LogServiceType::Curation, format!("Photo {} rejected: blurry (blur={:.1})", photos[index].photo_id, blur_score));
            continue;
        }

        photos[index].status = PhotoStatus::Accepted;
        let analyzed = AnalyzedPhoto { index, face };

        match groups.iter().position(|group| group.matches(&analyzed)) {
            Some(group_index) => {
                let group = &mut groups[group_index];
                group.photos.push(analyzed);
                if group.photos.len() >= top_n {
                    log_info(LogServiceType::Curation, format!(
                        "Candidate {}: {} photos of the same person found, stopping early",
                        photos[index].owner_id, top_n
                    ));
                    break;
                }
            }
            None => groups.push(FaceGroup { photos: vec![analyzed] }),
        }
    }

    if groups.is_empty() {
        return vec![];
    }

    // largest group; on equal sizes the first formed one wins
    let mut best_group = &groups[0];
    for group in &groups[1..] {
        if group.photos.len() > best_group.photos.len() {
            best_group = group;
        }
    }

    let mut members: Vec<usize> = best_group.photos.iter().map(|a| a.index).collect();
    members.sort_by(|a, b| photos[*b].likes_count.cmp(&photos[*a].likes_count));
    members.truncate(top_n);

    for &index in &members {
        photos[index].status = PhotoStatus::Selected;
    }
    // other photos of the best group, and all other groups, stay accepted

    let selected: Vec<CandidatePhoto> = members.iter().map(|&index| photos[index].clone()).collect();
    log_info(LogServiceType::Curation, format!(
        "Selected {}/{} photos for candidate {} ({} face groups)",
        selected.len(),
        photos.len(),
        photos.first().map(|p| p.owner_id).unwrap_or(0),
        groups.len()
    ));
    selected
}

use std::path::Path;

use image::{DynamicImage, GrayImage};

use crate::domain::face::FaceBBox;

/// Below this Laplacian variance a face crop counts as blurry.
pub const MIN_BLUR_SCORE: f32 = 50.0;

/// Sharpness of the face crop as variance of the Laplacian response.
/// Higher means sharper edges. An undecodable image or an empty clamped
/// crop scores 0.0, which the caller treats as blurry.
pub fn calc_blur_score(image_path: &Path, bbox: &FaceBBox) -> f32 {
    let img = match image::open(image_path) {
        Ok(img) => img,
        Err(_) => return 0.0,
    };
    blur_score_of(&img, bbox)
}

pub fn blur_score_of(img: &DynamicImage, bbox: &FaceBBox) -> f32 {
    let (width, height) = (img.width(), img.height());

    // clamp the face box to the image bounds
    let x1 = (bbox.x1.max(0.0) as u32).min(width);
    let y1 = (bbox.y1.max(0.0) as u32).min(height);
    let x2 = (bbox.x2.max(0.0) as u32).min(width);
    let y2 = (bbox.y2.max(0.0) as u32).min(height);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let crop = img.crop_imm(x1, y1, x2 - x1, y2 - y1).to_luma8();
    laplacian_variance(&crop)
}

fn laplacian_variance(image: &GrayImage) -> f32 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let kernel: [[f64; 3]; 3] = [
        [0.0, -1.0, 0.0],
        [-1.0, 4.0, -1.0],
        [0.0, -1.0, 0.0],
    ];

    let mut responses = Vec::with_capacity(((width - 2) * (height - 2)) as usize);
    for y in 1..(height - 1) {
        for x in 1..(width - 1) {
            let mut value = 0.0;
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let pixel = image.get_pixel(x + kx - 1, y + ky - 1)[0] as f64;
                    value += pixel * kernel[ky as usize][kx as usize];
                }
            }
            responses.push(value);
        }
    }

    let mean = responses.iter().sum::<f64>() / responses.len() as f64;
    let variance = responses.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / responses.len() as f64;
    variance as f32
}

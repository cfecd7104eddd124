//! DCT-based perceptual hash for images.
//!
//! The image is converted to 8-bit grayscale and resized to 32x32. An
//! orthonormal 2-D DCT-II is applied, and the 8x8 low-frequency block
//! (minus the DC term) is compared against its mean. The 63 resulting
//! bits are packed MSB-first and shifted left once, so bit 0 is always 0.

use std::f64::consts::PI;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageResult};

/// Extensions considered for perceptual hashing (lower-case, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "heic", "heif",
];

/// Side length of the normalized image.
const SIZE: u32 = 32;

/// Side length of the low-frequency block.
const BLOCK: usize = 8;

/// Check whether a path has a recognized image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Decode an image file and compute its perceptual hash.
pub fn phash64(path: &Path) -> ImageResult<u64> {
    let gray = image::open(path)?.to_luma8();
    Ok(phash_gray(&gray))
}

/// Perceptual hash of an already-decoded grayscale image.
pub fn phash_gray(image: &GrayImage) -> u64 {
    let resized;
    let image = if image.dimensions() == (SIZE, SIZE) {
        image
    } else {
        resized = imageops::resize(image, SIZE, SIZE, FilterType::Triangle);
        &resized
    };

    let matrix: Vec<Vec<f64>> = (0..SIZE)
        .map(|y| {
            (0..SIZE)
                .map(|x| f64::from(image.get_pixel(x, y).0[0]))
                .collect()
        })
        .collect();
    let coeffs = dct_2d(&matrix);

    let low: Vec<f64> = coeffs[..BLOCK]
        .iter()
        .flat_map(|row| row[..BLOCK].iter().copied())
        .skip(1)
        .collect();
    let mean = low.iter().sum::<f64>() / low.len() as f64;

    let bits = low
        .iter()
        .fold(0u64, |out, &c| (out << 1) | u64::from(c > mean));
    bits << 1
}

/// Orthonormal 1-D DCT-II.
pub fn dct_1d(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    let factor = PI / (2.0 * n as f64);
    let scale0 = (1.0 / n as f64).sqrt();
    let scale = (2.0 / n as f64).sqrt();

    (0..n)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, x)| x * (((2 * i + 1) * k) as f64 * factor).cos())
                .sum();
            sum * if k == 0 { scale0 } else { scale }
        })
        .collect()
}

/// Orthonormal 2-D DCT-II: rows first, then columns.
pub fn dct_2d(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows: Vec<Vec<f64>> = matrix.iter().map(|r| dct_1d(r)).collect();
    let cols: Vec<Vec<f64>> = transpose(&rows).iter().map(|c| dct_1d(c)).collect();
    transpose(&cols)
}

fn transpose(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = matrix.first().map_or(0, Vec::len);
    (0..width)
        .map(|c| matrix.iter().map(|row| row[c]).collect())
        .collect()
}

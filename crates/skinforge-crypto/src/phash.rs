//! Perceptual hash over decoded pixel content (spec §4.2).
//!
//! A difference-hash: downscale to a small grid, convert to grayscale, and
//! compare each pixel against a neighbor. Because the comparison only looks
//! at decoded pixels, re-muxing the same image through a different PNG
//! encoder (different chunk layout, different compression level) yields an
//! identical hash. Two independent dhash passes — one comparing horizontal
//! neighbors, one vertical — are concatenated to comfortably clear the
//! "≥ 30 hex characters" floor.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

const GRID_W: u32 = 9;
const GRID_H: u32 = 8;

fn grayscale_grid(img: &DynamicImage) -> Vec<u8> {
    let small = img.resize_exact(GRID_W, GRID_H, FilterType::Lanczos3);
    let gray = small.to_luma8();
    gray.into_raw()
}

/// Horizontal dhash: for each row, compare pixel(x) to pixel(x+1). 8 rows *
/// 8 comparisons = 64 bits.
fn horizontal_bits(grid: &[u8]) -> u64 {
    let mut bits: u64 = 0;
    let mut i = 0u32;
    for y in 0..GRID_H {
        for x in 0..(GRID_W - 1) {
            let left = grid[(y * GRID_W + x) as usize];
            let right = grid[(y * GRID_W + x + 1) as usize];
            if left > right {
                bits |= 1 << i;
            }
            i += 1;
        }
    }
    bits
}

/// Vertical dhash: for each column, compare pixel(y) to pixel(y+1).
fn vertical_bits(grid: &[u8]) -> u64 {
    let mut bits: u64 = 0;
    let mut i = 0u32;
    for x in 0..GRID_W {
        for y in 0..(GRID_H - 1) {
            let top = grid[(y * GRID_W + x) as usize];
            let bottom = grid[((y + 1) * GRID_W + x) as usize];
            if top > bottom {
                bits |= 1 << i;
            }
            i += 1;
        }
    }
    bits
}

/// Computes the canonical perceptual hash of already-validated image bytes.
/// Returns a 32-character lowercase hex string (two concatenated 64-bit
/// dhash passes). Deterministic for identical pixel content; errors only if
/// the bytes can no longer be decoded (the caller is expected to have run
/// the image validator first).
pub fn perceptual_hash(bytes: &[u8]) -> Result<String, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let grid = grayscale_grid(&img);
    let h = horizontal_bits(&grid);
    let v = vertical_bits(&grid);
    Ok(format!("{:016x}{:016x}", h, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn solid_png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = ImageBuffer::from_fn(w, h, |_, _| Rgba(rgba));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn deterministic_for_identical_pixels() {
        let bytes = solid_png(64, 64, [10, 20, 30, 255]);
        assert_eq!(
            perceptual_hash(&bytes).unwrap(),
            perceptual_hash(&bytes).unwrap()
        );
    }

    #[test]
    fn hash_is_at_least_30_hex_chars() {
        let bytes = solid_png(64, 64, [10, 20, 30, 255]);
        let h = perceptual_hash(&bytes).unwrap();
        assert!(h.len() >= 30);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_pixels_differ() {
        let a = solid_png(64, 64, [0, 0, 0, 255]);
        let b = solid_png(64, 64, [255, 255, 255, 255]);
        assert_ne!(perceptual_hash(&a).unwrap(), perceptual_hash(&b).unwrap());
    }

    #[test]
    fn invariant_to_remuxing_via_different_compression() {
        // Re-encode the same decoded pixels through a distinct PNG compression
        // setting to simulate a re-mux that preserves pixel content.
        let bytes = solid_png(64, 64, [50, 60, 70, 255]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        let mut remuxed = Vec::new();
        decoded
            .write_to(
                &mut std::io::Cursor::new(&mut remuxed),
                image::ImageFormat::Png,
            )
            .unwrap();
        assert_eq!(
            perceptual_hash(&bytes).unwrap(),
            perceptual_hash(&remuxed).unwrap()
        );
    }
}

//! Single operation: `validate(bytes, options) -> ValidatedImage | Error`
//! (spec §4.3). Runs, in order: size guard, content-type guard, dimension
//! check, and — only when the caller left the variant unresolved — the
//! opacity-rectangle inference that tells classic from slim.

use image::GenericImageView;
use thiserror::Error;

use skinforge_core::constants::{
    MAX_IMAGE_BYTES, MIN_IMAGE_BYTES, SKIN_HEIGHT_CLASSIC, SKIN_HEIGHT_MODERN, SKIN_WIDTH,
    VARIANT_RECT_X, VARIANT_RECT_Y,
};
use skinforge_core::skin::Variant;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("image size {len} bytes outside allowed range [{min}, {max}]")]
    Size { len: usize, min: usize, max: usize },

    #[error("unsupported content type, expected image/png")]
    ContentType,

    #[error("invalid dimensions: expected width {expected_w}, got {got_w}x{got_h}")]
    Dimensions {
        expected_w: u32,
        got_w: u32,
        got_h: u32,
    },

    #[error("could not decode image bytes: {0}")]
    Undecodable(String),
}

pub struct ValidatedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub variant: Variant,
}

/// Detects the variant from the opacity of the arm-width rectangle,
/// following spec §4.3: a 32-px-tall skin is always classic; for a 64-px
/// skin, every pixel in x∈[54,56) × y∈[20,32) must be fully opaque for
/// classic, otherwise slim.
fn infer_variant(img: &image::DynamicImage, height: u32) -> Variant {
    if height == SKIN_HEIGHT_CLASSIC {
        return Variant::Classic;
    }

    let (x0, x1) = VARIANT_RECT_X;
    let (y0, y1) = VARIANT_RECT_Y;
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = img.get_pixel(x, y);
            if pixel.0[3] != 255 {
                return Variant::Slim;
            }
        }
    }
    Variant::Classic
}

pub fn validate(
    bytes: Vec<u8>,
    requested_variant: Variant,
) -> Result<ValidatedImage, ValidationError> {
    let len = bytes.len();
    if !(MIN_IMAGE_BYTES..=MAX_IMAGE_BYTES).contains(&len) {
        return Err(ValidationError::Size {
            len,
            min: MIN_IMAGE_BYTES,
            max: MAX_IMAGE_BYTES,
        });
    }

    let format = image::guess_format(&bytes).map_err(|e| ValidationError::Undecodable(e.to_string()))?;
    if format != image::ImageFormat::Png {
        return Err(ValidationError::ContentType);
    }

    let img =
        image::load_from_memory(&bytes).map_err(|e| ValidationError::Undecodable(e.to_string()))?;
    let (width, height) = img.dimensions();
    if width != SKIN_WIDTH || !matches!(height, h if h == SKIN_HEIGHT_CLASSIC || h == SKIN_HEIGHT_MODERN) {
        return Err(ValidationError::Dimensions {
            expected_w: SKIN_WIDTH,
            got_w: width,
            got_h: height,
        });
    }

    let variant = match requested_variant {
        Variant::Unknown => infer_variant(&img, height),
        other => other,
    };

    Ok(ValidatedImage {
        bytes,
        mime: "image/png",
        width,
        height,
        variant,
    })
}

pub mod phash;
pub mod secret;

pub use phash::perceptual_hash;
pub use secret::SecretCodec;

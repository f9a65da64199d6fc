//! Maps a freshly drawn 32-bit random to a public catalog id via a fixed
//! bijective encoder (spec §4.4). The encoder parameters are a stable
//! catalog schema — changing them breaks the injection into the existing id
//! space, so they're threaded through as configuration rather than
//! hardcoded, but production deployments must never change them in place.

use rand::RngCore;

use skinforge_core::constants::{MAX_ID_TRIES, OPTIMUS_MODULUS};

use crate::catalog::{Catalog, CatalogError};

#[derive(Debug, thiserror::Error)]
pub enum IdAllocatorError {
    #[error("failed to allocate a catalog id after {tries} tries")]
    Exhausted { tries: u32 },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Clone, Copy, Debug)]
pub struct OptimusParams {
    pub prime: u64,
    pub inverse: u64,
    pub salt: u64,
}

pub struct IdAllocator {
    params: OptimusParams,
}

impl IdAllocator {
    pub fn new(params: OptimusParams) -> Self {
        Self { params }
    }

    /// `(prime * rand) XOR salt mod 2^31` — must stay byte-for-byte
    /// identical to the historical mapping (spec §4.4, §9).
    fn encode(&self, rand_u32: u32) -> u64 {
        let product = self.params.prime.wrapping_mul(rand_u32 as u64) % OPTIMUS_MODULUS;
        (product ^ self.params.salt) % OPTIMUS_MODULUS
    }

    /// Draws a random 32-bit value, encodes it, and retries on collision up
    /// to `MAX_ID_TRIES` times before raising `FailedToCreateId`.
    pub fn new_id(&self, catalog: &dyn Catalog) -> Result<u64, IdAllocatorError> {
        let mut rng = rand::thread_rng();
        for attempt in 0..MAX_ID_TRIES {
            let candidate = rng.next_u32();
            let id = self.encode(candidate);
            if !catalog.exists_skin_id(id)? {
                return Ok(id);
            }
            tracing::debug!(attempt, id, "id collision, retrying");
        }
        Err(IdAllocatorError::Exhausted {
            tries: MAX_ID_TRIES,
        })
    }
}

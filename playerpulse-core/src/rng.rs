//! Seeded random streams for session synthesis.
//!
//! Every stream is derived from the user-visible seed plus a domain tag, so
//! adding a stream or a worker never shifts the draws of another one.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;

/// Derive an independent stream seed from the run seed and a tag.
#[must_use]
pub fn derive_stream_seed(seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&seed.to_le_bytes()).expect("HMAC accepts any key length");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Tag of the stream used by synthesis worker `index`.
#[must_use]
pub fn worker_tag(index: usize) -> String {
    format!("worker-{index}")
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

/// Portable, reproducible stream used for every production draw.
pub type SessionRng = CountingRng<ChaCha8Rng>;

impl CountingRng<ChaCha8Rng> {
    /// Stream for `tag` under the run `seed`.
    #[must_use]
    pub fn for_stream(seed: u64, tag: &str) -> Self {
        Self::wrap(ChaCha8Rng::seed_from_u64(derive_stream_seed(
            seed,
            tag.as_bytes(),
        )))
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    #[must_use]
    pub const fn wrap(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

//! Deterministic randomness for key and noise sampling.
//!
//! Every sampler writes into a caller-provided slice; nothing here allocates.
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};

use super::modular::reduce_signed;
use crate::errors::{ArgumentError, CkksResult, invalid};

/// Seeded ChaCha20 byte stream. The same seed always yields the same bytes,
/// which makes key and noise material reproducible across runs and targets.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    inner: ChaCha20Rng,
}

impl DeterministicRng {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: ChaCha20Rng::from_seed(seed),
        }
    }

    pub fn from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn fill_bytes(&mut self, out: &mut [u8]) {
        self.inner.fill_bytes(out);
    }

    /// Borrow the underlying generator for use with the samplers below.
    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.inner
    }
}

/// Sample coefficients uniformly in `[0, q)`.
pub fn uniform_residues<R: Rng + ?Sized>(
    q: u32,
    out: &mut [u32],
    rng: &mut R,
) -> CkksResult<()> {
    if q == 0 {
        return invalid(ArgumentError::InvalidSampler {
            message: "modulus must be nonzero",
        });
    }
    for coeff in out.iter_mut() {
        *coeff = rng.random_range(0..q);
    }
    Ok(())
}

/// Sample a ternary vector (entries in `{-1, 0, 1}`) with exactly
/// `hamming_weight` non-zero entries.
///
/// Positions are drawn by rejection instead of shuffling an index vector, so
/// the sampler stays allocation free.
pub fn ternary_coefficients<R: Rng + ?Sized>(
    hamming_weight: usize,
    out: &mut [i8],
    rng: &mut R,
) -> CkksResult<()> {
    if hamming_weight > out.len() {
        return invalid(ArgumentError::InvalidSampler {
            message: "hamming weight exceeds vector length",
        });
    }
    out.fill(0);
    let mut placed = 0;
    while placed < hamming_weight {
        let idx = rng.random_range(0..out.len());
        if out[idx] == 0 {
            out[idx] = if rng.random_bool(0.5) { 1 } else { -1 };
            placed += 1;
        }
    }
    Ok(())
}

/// Sample rounded Gaussian noise `round(N(0, std_dev))`.
pub fn gaussian_coefficients<R: Rng + ?Sized>(
    std_dev: f64,
    out: &mut [i64],
    rng: &mut R,
) -> CkksResult<()> {
    let normal = Normal::new(0.0, std_dev).map_err(|_| {
        ArgumentError::InvalidSampler {
            message: "standard deviation must be finite and non-negative",
        }
    })?;
    for coeff in out.iter_mut() {
        *coeff = normal.sample(rng).round() as i64;
    }
    Ok(())
}

/// Reduce a signed sample vector into `[0, q)`.
pub fn signed_to_residues(signed: &[i64], q: u32, out: &mut [u32]) -> CkksResult<()> {
    if q == 0 {
        return invalid(ArgumentError::InvalidSampler {
            message: "modulus must be nonzero",
        });
    }
    if signed.len() != out.len() {
        return invalid(ArgumentError::LengthMismatch {
            expected: signed.len(),
            actual: out.len(),
        });
    }
    for (dst, &src) in out.iter_mut().zip(signed) {
        *dst = reduce_signed(src, q);
    }
    Ok(())
}

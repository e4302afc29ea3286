use crate::errors::{ArgumentError, CkksResult, invalid};
use crate::math::{mod_inverse, mul_mod};
use crate::params::{MAX_LIMBS, check_limb_count};

/// CRT constants for a modulus chain of at most [`MAX_LIMBS`] limbs.
///
/// With every modulus below `2^32` the product `Q` stays below `2^128`, so
/// reconstruction is exact in `u128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrtBasis {
    moduli: [u32; MAX_LIMBS],
    count: usize,
    product: u128,
    /// `Q / q_i`.
    punctured: [u128; MAX_LIMBS],
    /// `(Q / q_i)^-1 mod q_i`.
    punctured_inv: [u32; MAX_LIMBS],
}

impl CrtBasis {
    /// Fails for an empty or oversized chain, a modulus below 2, or moduli
    /// that are not pairwise coprime.
    pub fn new(moduli: &[u32]) -> CkksResult<Self> {
        check_limb_count(moduli.len())?;
        let mut stored = [0u32; MAX_LIMBS];
        let mut product = 1u128;
        for (slot, &q) in stored.iter_mut().zip(moduli) {
            if q < 2 {
                return invalid(ArgumentError::NonCoprimeModulus { modulus: q });
            }
            *slot = q;
            product *= q as u128;
        }

        let mut punctured = [0u128; MAX_LIMBS];
        let mut punctured_inv = [0u32; MAX_LIMBS];
        for (i, &q) in moduli.iter().enumerate() {
            punctured[i] = product / q as u128;
            let residue = (punctured[i] % q as u128) as u64;
            let Some(inv) = mod_inverse(residue, q as u64) else {
                return invalid(ArgumentError::NonCoprimeModulus { modulus: q });
            };
            punctured_inv[i] = inv as u32;
        }

        Ok(Self {
            moduli: stored,
            count: moduli.len(),
            product,
            punctured,
            punctured_inv,
        })
    }

    pub fn moduli(&self) -> &[u32] {
        &self.moduli[..self.count]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `Q`, the product of all moduli.
    pub fn product(&self) -> u128 {
        self.product
    }

    /// Recovers `x mod Q` from `residues[i] = x mod q_i` and maps it into
    /// `(-Q/2, Q/2]`.
    pub fn reconstruct_centered(&self, residues: &[u32]) -> CkksResult<i128> {
        if residues.len() != self.count {
            return invalid(ArgumentError::LengthMismatch {
                expected: self.count,
                actual: residues.len(),
            });
        }
        Ok(self.centered_unchecked(residues.iter().copied()))
    }

    pub(crate) fn centered_unchecked(&self, residues: impl Iterator<Item = u32>) -> i128 {
        let q = self.product;
        let mut acc = 0u128;
        for (i, r) in residues.enumerate().take(self.count) {
            let qi = self.moduli[i];
            // t < q_i, so t * (Q / q_i) < Q. Q may sit just below 2^128, so
            // acc + term is only formed when it stays below Q.
            let t = mul_mod(r % qi, self.punctured_inv[i], qi);
            let term = t as u128 * self.punctured[i];
            let gap = q - term;
            acc = if acc >= gap { acc - gap } else { acc + term };
        }
        if acc > q / 2 {
            -((q - acc) as i128)
        } else {
            acc as i128
        }
    }
}

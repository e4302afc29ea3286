//! Bridge between signed coefficient vectors and RNS limbs.
//!
//! Limb data is stored limb-major: coefficient `k` of limb `i` lives at
//! `i * N + k`.

mod basis;

pub use basis::CrtBasis;

use crate::errors::{ArgumentError, CkksResult, invalid};
use crate::math::reduce_signed;
use crate::params::check_limb_count;

fn check_limb_major(coeff_count: usize, limbs: usize, actual: usize) -> CkksResult<()> {
    if coeff_count * limbs != actual {
        return invalid(ArgumentError::LengthMismatch {
            expected: coeff_count * limbs,
            actual,
        });
    }
    Ok(())
}

/// Reduces every coefficient modulo every limb modulus into `out`
/// (`moduli.len() * coeffs.len()` words).
pub fn lift_signed(coeffs: &[i64], moduli: &[u32], out: &mut [u32]) -> CkksResult<()> {
    check_limb_count(moduli.len())?;
    check_limb_major(coeffs.len(), moduli.len(), out.len())?;
    if let Some(&q) = moduli.iter().find(|&&q| q < 2) {
        return invalid(ArgumentError::NonCoprimeModulus { modulus: q });
    }
    for (limb, &q) in out.chunks_exact_mut(coeffs.len().max(1)).zip(moduli) {
        for (dst, &c) in limb.iter_mut().zip(coeffs) {
            *dst = reduce_signed(c, q);
        }
    }
    Ok(())
}

/// Single-coefficient CRT: one residue per modulus, result centered in
/// `(-Q/2, Q/2]`.
pub fn reconstruct_centered(residues: &[u32], moduli: &[u32]) -> CkksResult<i128> {
    CrtBasis::new(moduli)?.reconstruct_centered(residues)
}

/// CRT-reconstructs every coefficient of a limb-major vector into `out`.
pub fn reconstruct_limbs(limbs: &[u32], basis: &CrtBasis, out: &mut [i128]) -> CkksResult<()> {
    let n = out.len();
    check_limb_major(n, basis.len(), limbs.len())?;
    for (k, dst) in out.iter_mut().enumerate() {
        *dst = basis.centered_unchecked((0..basis.len()).map(|i| limbs[i * n + k]));
    }
    Ok(())
}

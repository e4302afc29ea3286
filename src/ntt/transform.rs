//! In-place negacyclic transforms over `Z_q[X]/(X^N + 1)`.
//!
//! The forward transform is the merged Cooley-Tukey butterfly of Longa and
//! Naehrig, consuming `psi^bitrev(k)` so that the twist by `psi^i` needs no
//! separate pass; its output is in bit-reversed order. The inverse is the
//! matching Gentleman-Sande butterfly over `psi^-bitrev(k)` followed by a
//! scaling with `N^-1`.
//!
//! Reference: P. Longa, M. Naehrig, "Speeding up the Number Theoretic
//! Transform for Faster Ideal Lattice-Based Cryptography", 2016.

use super::{LimbConstants, NttPlan};
use crate::errors::{ArgumentError, CkksResult, invalid};
use crate::math::{
    add_mod, barrett_reduce, mul_mod, mul_mod_barrett, pow_mod, reverse_bits, sub_mod,
};
use crate::params::is_ntt_friendly;

/// Checks a call against the plan and returns the limb constants. Nothing
/// is mutated here.
fn check_call(
    len: usize,
    modulus: u32,
    plan: &NttPlan<'_>,
    index: usize,
) -> CkksResult<LimbConstants> {
    let Some(expected) = plan.modulus(index) else {
        return invalid(ArgumentError::LimbIndexOutOfRange {
            index,
            num_q: plan.num_q(),
        });
    };
    if len != plan.ring_dim() as usize {
        return invalid(ArgumentError::LengthMismatch {
            expected: plan.ring_dim() as usize,
            actual: len,
        });
    }
    if modulus != expected {
        return invalid(ArgumentError::ModulusMismatch {
            modulus,
            expected,
            index,
        });
    }
    if !is_ntt_friendly(modulus, plan.ring_dim()) {
        return invalid(ArgumentError::NonNttFriendlyModulus {
            modulus,
            ring_dim: plan.ring_dim(),
        });
    }
    plan.limb_constants(index)
}

fn check_inverse(n_inv_mod_q: u32, ring_dim: u32, q: u32) -> CkksResult<u32> {
    let n_inv = n_inv_mod_q % q;
    if mul_mod(ring_dim % q, n_inv, q) != 1 {
        return invalid(ArgumentError::WrongInverse {
            n_inv: n_inv_mod_q,
            ring_dim,
            modulus: q,
        });
    }
    Ok(n_inv)
}

fn reduce_all(values: &mut [u32], limb: &LimbConstants) {
    for v in values.iter_mut() {
        *v = barrett_reduce(*v as u64, limb.q, limb.barrett_mu);
    }
}

#[inline(always)]
fn forward_kernel(a: &mut [u32], limb: &LimbConstants, root: impl Fn(usize) -> u32) {
    let (q, mu) = (limb.q, limb.barrett_mu);
    let n = a.len();
    let mut t = n;
    let mut m = 1;
    while m < n {
        t >>= 1;
        for i in 0..m {
            let s = root(m + i);
            let j1 = 2 * i * t;
            for j in j1..j1 + t {
                let u = a[j];
                let v = mul_mod_barrett(a[j + t], s, q, mu);
                a[j] = add_mod(u, v, q);
                a[j + t] = sub_mod(u, v, q);
            }
        }
        m <<= 1;
    }
}

#[inline(always)]
fn inverse_kernel(a: &mut [u32], limb: &LimbConstants, n_inv: u32, root: impl Fn(usize) -> u32) {
    let (q, mu) = (limb.q, limb.barrett_mu);
    let n = a.len();
    let mut t = 1;
    let mut m = n;
    while m > 1 {
        let h = m >> 1;
        let mut j1 = 0;
        for i in 0..h {
            let s = root(h + i);
            for j in j1..j1 + t {
                let u = a[j];
                let v = a[j + t];
                a[j] = add_mod(u, v, q);
                a[j + t] = mul_mod_barrett(sub_mod(u, v, q), s, q, mu);
            }
            j1 += 2 * t;
        }
        t <<= 1;
        m = h;
    }
    for v in a.iter_mut() {
        *v = mul_mod_barrett(*v, n_inv, q, mu);
    }
}

fn forward_checked(values: &mut [u32], plan: &NttPlan<'_>, index: usize, limb: &LimbConstants) {
    reduce_all(values, limb);
    match plan.forward_roots(index) {
        Some(table) => forward_kernel(values, limb, |k| table.at(k)),
        None => {
            let log_n = plan.ring_dim().trailing_zeros();
            forward_kernel(values, limb, |k| {
                pow_mod(limb.psi, reverse_bits(k, log_n) as u64, limb.q)
            })
        }
    }
}

fn inverse_checked(
    values: &mut [u32],
    n_inv: u32,
    plan: &NttPlan<'_>,
    index: usize,
    limb: &LimbConstants,
) {
    reduce_all(values, limb);
    match plan.inverse_roots(index) {
        Some(table) => inverse_kernel(values, limb, n_inv, |k| table.at(k)),
        None => {
            let log_n = plan.ring_dim().trailing_zeros();
            inverse_kernel(values, limb, n_inv, |k| {
                pow_mod(limb.psi_inv, reverse_bits(k, log_n) as u64, limb.q)
            })
        }
    }
}

/// Forward negacyclic NTT of limb `index`, in place.
///
/// `modulus` must be the plan's modulus at `index` and `values` must hold
/// exactly `ring_dim` words. Inputs need not be reduced. The result is in
/// bit-reversed order, which is what [`inverse_inplace`] and
/// [`pointwise_mul_inplace`] expect.
pub fn forward_inplace(
    values: &mut [u32],
    modulus: u32,
    plan: &NttPlan<'_>,
    index: usize,
) -> CkksResult<()> {
    let limb = check_call(values.len(), modulus, plan, index)?;
    forward_checked(values, plan, index, &limb);
    Ok(())
}

/// Inverse negacyclic NTT of limb `index`, in place, including the scaling
/// by `n_inv_mod_q`, which must be the inverse of `ring_dim` modulo `modulus`.
pub fn inverse_inplace(
    values: &mut [u32],
    modulus: u32,
    n_inv_mod_q: u32,
    plan: &NttPlan<'_>,
    index: usize,
) -> CkksResult<()> {
    let limb = check_call(values.len(), modulus, plan, index)?;
    let n_inv = check_inverse(n_inv_mod_q, plan.ring_dim(), modulus)?;
    inverse_checked(values, n_inv, plan, index, &limb);
    Ok(())
}

/// `acc[i] = acc[i] * other[i] mod q` for two vectors in the NTT domain.
pub fn pointwise_mul_inplace(
    acc: &mut [u32],
    other: &[u32],
    modulus: u32,
    plan: &NttPlan<'_>,
    index: usize,
) -> CkksResult<()> {
    let limb = check_call(acc.len(), modulus, plan, index)?;
    if other.len() != acc.len() {
        return invalid(ArgumentError::LengthMismatch {
            expected: acc.len(),
            actual: other.len(),
        });
    }
    pointwise(acc, other, &limb);
    Ok(())
}

fn pointwise(acc: &mut [u32], other: &[u32], limb: &LimbConstants) {
    for (a, &b) in acc.iter_mut().zip(other) {
        let b = barrett_reduce(b as u64, limb.q, limb.barrett_mu);
        *a = mul_mod_barrett(*a, b, limb.q, limb.barrett_mu);
    }
}

/// Negacyclic product `a = a * b mod (X^N + 1, q)` on limb `index`.
///
/// Both inputs are in coefficient form. `b` is used as scratch and is left in
/// the NTT domain.
pub fn negacyclic_mul_inplace(
    a: &mut [u32],
    b: &mut [u32],
    modulus: u32,
    n_inv_mod_q: u32,
    plan: &NttPlan<'_>,
    index: usize,
) -> CkksResult<()> {
    let limb = check_call(a.len(), modulus, plan, index)?;
    check_call(b.len(), modulus, plan, index)?;
    let n_inv = check_inverse(n_inv_mod_q, plan.ring_dim(), modulus)?;

    forward_checked(a, plan, index, &limb);
    forward_checked(b, plan, index, &limb);
    pointwise(a, b, &limb);
    inverse_checked(a, n_inv, plan, index, &limb);
    Ok(())
}

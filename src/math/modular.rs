//! Word-level modular arithmetic over `u32` moduli.
//!
//! All helpers assume operands are already reduced (`a, b < q`) unless stated
//! otherwise. Products are formed in `u64`, so no helper can overflow for any
//! modulus below `2^32`.

use crate::errors::{ArgumentError, CkksResult, invalid};

/// Width `k` of the Barrett constant `mu = floor(2^k / q)`.
pub const BARRETT_SHIFT: u32 = 64;

#[inline(always)]
pub fn add_mod(a: u32, b: u32, q: u32) -> u32 {
    let s = a as u64 + b as u64;
    if s >= q as u64 { (s - q as u64) as u32 } else { s as u32 }
}

#[inline(always)]
pub fn sub_mod(a: u32, b: u32, q: u32) -> u32 {
    if a >= b { a - b } else { q - b + a }
}

#[inline(always)]
pub fn neg_mod(a: u32, q: u32) -> u32 {
    if a == 0 { 0 } else { q - a }
}

/// `(a * b) mod q` through a plain `u64` remainder.
#[inline(always)]
pub fn mul_mod(a: u32, b: u32, q: u32) -> u32 {
    ((a as u64 * b as u64) % q as u64) as u32
}

/// `base^exponent mod q` by square-and-multiply.
pub fn pow_mod(base: u32, mut exponent: u64, q: u32) -> u32 {
    if q == 1 {
        return 0;
    }
    let mut acc = 1u32;
    let mut base = base % q;
    while exponent > 0 {
        if exponent & 1 == 1 {
            acc = mul_mod(acc, base, q);
        }
        base = mul_mod(base, base, q);
        exponent >>= 1;
    }
    acc
}

/// Inverse of `value` modulo a prime `q` via Fermat's little theorem.
///
/// Only meaningful when `q` is prime and `value` is not a multiple of `q`;
/// callers holding a possibly composite modulus should use [`mod_inverse`].
pub fn inv_mod_prime(value: u32, q: u32) -> u32 {
    pow_mod(value, q as u64 - 2, q)
}

/// Inverse of `value` modulo any `modulus` by the extended Euclidean
/// algorithm. Returns `None` when the two are not coprime.
pub fn mod_inverse(value: u64, modulus: u64) -> Option<u64> {
    if modulus == 0 {
        return None;
    }
    let (mut old_r, mut r) = (value as i128 % modulus as i128, modulus as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(modulus as i128) as u64)
}

/// Maps a signed integer into `[0, q)`.
#[inline]
pub fn reduce_signed(value: i64, q: u32) -> u32 {
    value.rem_euclid(q as i64) as u32
}

/// Barrett constant `floor(2^64 / q)`. Fails for `q < 2`, where the
/// quotient does not fit in a `u64`.
///
/// For every `1 < q < 2^32` the result lies in `[2^32, floor(u64::MAX / q)]`:
/// `q` does not divide `2^64` unless it is a power of two, and even then the
/// product `mu * q` is at most `2^64 - q`.
pub fn barrett_mu(q: u32) -> CkksResult<u64> {
    if q < 2 {
        return invalid(ArgumentError::ModulusTooSmall { modulus: q });
    }
    Ok(((1u128 << BARRETT_SHIFT) / q as u128) as u64)
}

/// Reduces any `x < 2^64` modulo `q` with one multiply, one shift and at most
/// one correction.
#[inline(always)]
pub fn barrett_reduce(x: u64, q: u32, mu: u64) -> u32 {
    let quotient = ((x as u128 * mu as u128) >> BARRETT_SHIFT) as u64;
    let r = x - quotient * q as u64;
    if r >= q as u64 { (r - q as u64) as u32 } else { r as u32 }
}

#[inline(always)]
pub fn mul_mod_barrett(a: u32, b: u32, q: u32, mu: u64) -> u32 {
    barrett_reduce(a as u64 * b as u64, q, mu)
}

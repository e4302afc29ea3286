//! Prime utilities for NTT-friendly `u32` moduli.
//!
//! Primality uses Miller-Rabin with the bases `{2, 7, 61}`, which is
//! deterministic for every `n < 4,759,123,141` and therefore for all `u32`.
//! Reference:
//! https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test

use super::modular::{mul_mod, pow_mod};
use crate::errors::{ArgumentError, CkksResult, invalid};

const MILLER_RABIN_BASES: [u32; 3] = [2, 7, 61];

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u32) -> (u32, u32) {
    let r = n.trailing_zeros();
    (n >> r, r)
}

/// Returns `true` if `n` is prime.
pub fn is_prime(n: u32) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a % n == 0 {
            continue;
        }
        let mut x = pow_mod(a, d as u64, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Finds the smallest primitive `2 * ring_dim`-th root of unity `psi` modulo `q`
/// reachable as `g^((q-1) / 2N)` for `g = 2, 3, ...`.
///
/// Because `2N` is a power of two, `psi` has order exactly `2N` iff
/// `psi^N == q - 1`. The search gives up after the candidates are exhausted,
/// which only happens for composite `q`.
pub fn primitive_root_2n(q: u32, ring_dim: u32) -> CkksResult<u32> {
    let order = 2 * ring_dim as u64;
    if q < 3 || !ring_dim.is_power_of_two() || (q as u64 - 1) % order != 0 {
        return invalid(ArgumentError::NonNttFriendlyModulus {
            modulus: q,
            ring_dim,
        });
    }
    let exponent = (q as u64 - 1) / order;
    for g in 2..q {
        let psi = pow_mod(g, exponent, q);
        if pow_mod(psi, ring_dim as u64, q) == q - 1 {
            return Ok(psi);
        }
        // For prime q half of all residues are non-residues, each of which
        // yields a primitive root; a long miss streak means q is composite.
        if g > 512 {
            break;
        }
    }
    invalid(ArgumentError::MissingPrimitiveRoot {
        modulus: q,
        order,
    })
}

/// Fills `out` with the largest NTT-friendly primes of exactly `bits` bits for
/// `ring_dim`, in descending order.
///
/// Only candidates `p = 1 (mod 2N)` are visited.
pub fn generate_ntt_primes(bits: u32, ring_dim: u32, out: &mut [u32]) -> CkksResult<()> {
    let count = out.len();
    let not_enough = ArgumentError::NotEnoughPrimes {
        bits,
        count,
        ring_dim,
    };
    if !(2..=32).contains(&bits) || !ring_dim.is_power_of_two() {
        return invalid(not_enough);
    }
    let step = 2 * ring_dim as u64;
    let lower = 1u64 << (bits - 1);
    let upper = (1u64 << bits) - 1;
    // Largest x <= upper with x = 1 (mod step).
    let mut candidate = upper - (upper + step - 1) % step;

    let mut found = 0;
    while found < count && candidate >= lower {
        if is_prime(candidate as u32) {
            out[found] = candidate as u32;
            found += 1;
        }
        match candidate.checked_sub(step) {
            Some(next) => candidate = next,
            None => break,
        }
    }

    if found < count {
        return invalid(not_enough);
    }
    Ok(())
}

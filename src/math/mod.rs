pub mod modular;
pub mod primes;
pub mod sampling;

pub use modular::{
    add_mod, barrett_mu, barrett_reduce, inv_mod_prime, mod_inverse, mul_mod, mul_mod_barrett,
    neg_mod, pow_mod, reduce_signed, sub_mod,
};
pub use primes::{generate_ntt_primes, is_prime, primitive_root_2n};
pub use sampling::{
    DeterministicRng, gaussian_coefficients, signed_to_residues, ternary_coefficients,
    uniform_residues,
};

/// Reverses the low `bit_count` bits of `value`.
#[inline]
pub fn reverse_bits(value: usize, bit_count: u32) -> usize {
    if bit_count == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS - bit_count)
}

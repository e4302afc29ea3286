use tracing::{debug, instrument};

use super::{MAX_LIMBS, RnsParams, validate};
use crate::errors::CkksResult;
use crate::math::{barrett_mu, inv_mod_prime};

/// Constants precomputed for one RNS modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimeConstants {
    pub q: u32,
    /// `ring_dim^-1 mod q`.
    pub n_inv_mod_q: u32,
    /// `floor(2^64 / q)`.
    pub barrett_mu: u64,
}

/// Constants derived from a validated [`RnsParams`].
///
/// Produced only by [`derive`]; entries past `num_q` stay zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedConstants {
    pub ring_dim: u32,
    pub two_n: u32,
    pub num_q: u32,
    pub primes: [PrimeConstants; MAX_LIMBS],
}

impl DerivedConstants {
    /// Per-limb constants of the active chain.
    pub fn primes(&self) -> &[PrimeConstants] {
        &self.primes[..(self.num_q as usize).min(MAX_LIMBS)]
    }

    /// Moduli of the active chain, in limb order.
    pub fn moduli(&self) -> impl Iterator<Item = u32> + '_ {
        self.primes().iter().map(|p| p.q)
    }
}

/// Validates `params` and computes per-limb constants.
///
/// The inverse uses Fermat's little theorem and is therefore only exact for
/// prime moduli. Validation does not check primality; the preset moduli and
/// anything from [`crate::math::generate_ntt_primes`] are prime.
#[instrument(skip(params), fields(ring_dim = params.ring_dim, num_q = params.num_q))]
pub fn derive(params: &RnsParams) -> CkksResult<DerivedConstants> {
    validate(params)?;

    let mut primes = [PrimeConstants::default(); MAX_LIMBS];
    for (slot, &q) in primes.iter_mut().zip(params.moduli()) {
        *slot = PrimeConstants {
            q,
            n_inv_mod_q: inv_mod_prime(params.ring_dim % q, q),
            barrett_mu: barrett_mu(q)?,
        };
    }
    debug!("derived per-limb constants");

    Ok(DerivedConstants {
        ring_dim: params.ring_dim,
        two_n: 2 * params.ring_dim,
        num_q: params.num_q,
        primes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mul_mod;
    use crate::params::PRESET_RING_DIM;

    #[test]
    fn preset_constants_are_consistent() {
        let params = RnsParams::preset(PRESET_RING_DIM).unwrap();
        let derived = derive(&params).unwrap();
        assert_eq!(derived.ring_dim, 2048);
        assert_eq!(derived.two_n, 4096);
        assert_eq!(derived.primes().len(), 3);
        for p in derived.primes() {
            assert_eq!(mul_mod(2048 % p.q, p.n_inv_mod_q, p.q), 1);
            assert!(p.barrett_mu >= 1u64 << 32);
            assert!(p.barrett_mu <= u64::MAX / p.q as u64);
        }
        assert_eq!(derived.primes[3], PrimeConstants::default());
    }

    #[test]
    fn derive_rejects_invalid_params() {
        let mut params = RnsParams::preset(PRESET_RING_DIM).unwrap();
        params.scale = -1.0;
        assert!(derive(&params).is_err());

        let mut params = RnsParams::preset(PRESET_RING_DIM).unwrap();
        params.num_q = 0;
        assert!(derive(&params).is_err());

        let mut params = RnsParams::preset(PRESET_RING_DIM).unwrap();
        params.q[1] = 998_244_354;
        assert!(derive(&params).is_err());
    }
}

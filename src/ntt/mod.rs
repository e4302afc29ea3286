//! Negacyclic NTT plans over caller-owned memory.
//!
//! A plan binds a ring dimension to an ordered modulus chain. In
//! [`NttMode::Precomputed`] it writes, per limb, a small header followed by
//! the forward and inverse root tables into the caller's pool:
//!
//! ```text
//! limb i: [header: 32 B][forward: N x u32][inverse: N x u32]
//! header: q | psi | psi^-1 | N^-1 mod q | barrett mu (u64) | N | i
//! ```
//!
//! Root tables hold `psi^bitrev(k)` and `psi^-bitrev(k)`, the order consumed
//! by the butterflies in [`transform`]. In [`NttMode::OnTheFly`] the plan owns
//! nothing and the same values are recomputed on every call.

mod transform;

pub use transform::{
    forward_inplace, inverse_inplace, negacyclic_mul_inplace, pointwise_mul_inplace,
};

use std::fmt;

use tracing::{debug, instrument};

use crate::errors::{ArgumentError, CkksResult, invalid};
use crate::math::{barrett_mu, inv_mod_prime, mul_mod, primitive_root_2n, reverse_bits};
use crate::params::{
    DerivedConstants, MAX_LIMBS, NTT_LIMB_OVERHEAD, NttMode, check_limb_count, check_ring_dim,
    estimate_ntt_plan_bytes, is_ntt_friendly, ntt_limb_bytes,
};
use crate::pool::{PoolCarver, PoolTable, PoolWord, write_words};

/// Pool bytes a plan for `moduli` needs under `mode`.
///
/// Unlike [`exact_bytes`] this rejects malformed arguments instead of
/// reporting 0. For valid arguments the two agree.
pub fn requirements(ring_dim: u32, moduli: &[u32], mode: NttMode) -> CkksResult<usize> {
    check_ring_dim(ring_dim)?;
    check_limb_count(moduli.len())?;
    Ok(exact_bytes(ring_dim, moduli.len(), mode))
}

/// Exact pool size of a plan: `num_q * (2 * ring_dim * 4 + 32)` when
/// precomputed, otherwise 0. Also 0 when the shape is not representable.
pub fn exact_bytes(ring_dim: u32, num_q: usize, mode: NttMode) -> usize {
    if num_q > MAX_LIMBS {
        return 0;
    }
    // The estimate only looks at the length of the modulus list.
    let placeholder = [0u32; MAX_LIMBS];
    estimate_ntt_plan_bytes(ring_dim, &placeholder[..num_q], mode)
}

/// Per-limb constants of a plan, as stored in a precomputed limb header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimbConstants {
    pub q: u32,
    /// Primitive `2N`-th root of unity.
    pub psi: u32,
    pub psi_inv: u32,
    pub n_inv_mod_q: u32,
    pub barrett_mu: u64,
}

impl LimbConstants {
    fn compute(q: u32, ring_dim: u32) -> CkksResult<Self> {
        let psi = primitive_root_2n(q, ring_dim)?;
        Ok(Self {
            q,
            psi,
            psi_inv: inv_mod_prime(psi, q),
            n_inv_mod_q: inv_mod_prime(ring_dim % q, q),
            barrett_mu: barrett_mu(q)?,
        })
    }
}

const HEADER_Q: usize = 0;
const HEADER_PSI: usize = 4;
const HEADER_PSI_INV: usize = 8;
const HEADER_N_INV: usize = 12;
const HEADER_MU: usize = 16;
const HEADER_RING_DIM: usize = 24;
const HEADER_INDEX: usize = 28;

#[derive(Clone, Copy)]
enum Storage<'pool> {
    OnTheFly,
    Precomputed(&'pool [u8]),
}

/// An immutable NTT plan. See the module docs for the pool layout.
pub struct NttPlan<'pool> {
    ring_dim: u32,
    num_q: usize,
    moduli: [u32; MAX_LIMBS],
    storage: Storage<'pool>,
}

impl fmt::Debug for NttPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NttPlan")
            .field("mode", &self.mode())
            .field("ring_dim", &self.ring_dim)
            .field("moduli", &&self.moduli[..self.num_q])
            .finish()
    }
}

impl<'pool> NttPlan<'pool> {
    /// Builds a plan for `moduli`, which must match `derived` limb by limb.
    ///
    /// Every check runs before the pool is written, so on error the pool
    /// contents are unchanged. `pool` is ignored for [`NttMode::OnTheFly`].
    #[instrument(skip(moduli, derived, pool), fields(num_q = moduli.len()))]
    pub fn init(
        ring_dim: u32,
        moduli: &[u32],
        derived: &DerivedConstants,
        mode: NttMode,
        pool: Option<&'pool mut [u8]>,
    ) -> CkksResult<Self> {
        check_ring_dim(ring_dim)?;
        check_limb_count(moduli.len())?;
        if derived.ring_dim != ring_dim
            || derived.num_q as usize != moduli.len()
            || derived.moduli().ne(moduli.iter().copied())
        {
            return invalid(ArgumentError::DerivedMismatch);
        }

        let mut limbs = [None; MAX_LIMBS];
        for (slot, &q) in limbs.iter_mut().zip(moduli) {
            if !is_ntt_friendly(q, ring_dim) {
                return invalid(ArgumentError::NonNttFriendlyModulus {
                    modulus: q,
                    ring_dim,
                });
            }
            *slot = Some(LimbConstants::compute(q, ring_dim)?);
        }

        let mut stored = [0u32; MAX_LIMBS];
        stored[..moduli.len()].copy_from_slice(moduli);

        let storage = match mode {
            NttMode::OnTheFly => Storage::OnTheFly,
            NttMode::Precomputed => {
                let Some(pool) = pool else {
                    return invalid(ArgumentError::MissingPool);
                };
                let required = exact_bytes(ring_dim, moduli.len(), mode);
                let mut carver = PoolCarver::new(pool, required)?;
                let region = carver.take(required);
                for (index, limb) in limbs.iter().flatten().enumerate() {
                    let start = index * ntt_limb_bytes(ring_dim);
                    let end = start + ntt_limb_bytes(ring_dim);
                    write_limb(&mut region[start..end], ring_dim, index, limb);
                }
                Storage::Precomputed(region)
            }
        };

        debug!(bytes = exact_bytes(ring_dim, moduli.len(), mode), "built NTT plan");
        Ok(Self {
            ring_dim,
            num_q: moduli.len(),
            moduli: stored,
            storage,
        })
    }

    pub fn mode(&self) -> NttMode {
        match self.storage {
            Storage::OnTheFly => NttMode::OnTheFly,
            Storage::Precomputed(_) => NttMode::Precomputed,
        }
    }

    pub fn ring_dim(&self) -> u32 {
        self.ring_dim
    }

    pub fn num_q(&self) -> usize {
        self.num_q
    }

    /// Modulus of limb `index`.
    pub fn modulus(&self, index: usize) -> Option<u32> {
        self.moduli[..self.num_q].get(index).copied()
    }

    /// Forward roots `psi^bitrev(k)` of limb `index`; `None` when the plan
    /// has no tables or the index is out of range.
    pub fn forward_roots(&self, index: usize) -> Option<PoolTable<'pool, u32>> {
        let limb = self.limb_bytes(index)?;
        let n = self.ring_dim as usize * u32::SIZE;
        Some(PoolTable::new(&limb[NTT_LIMB_OVERHEAD..NTT_LIMB_OVERHEAD + n]))
    }

    /// Inverse roots `psi^-bitrev(k)` of limb `index`.
    pub fn inverse_roots(&self, index: usize) -> Option<PoolTable<'pool, u32>> {
        let limb = self.limb_bytes(index)?;
        let n = self.ring_dim as usize * u32::SIZE;
        Some(PoolTable::new(&limb[NTT_LIMB_OVERHEAD + n..]))
    }

    /// Header of limb `index` as written into the pool.
    pub fn header(&self, index: usize) -> Option<LimbConstants> {
        let limb = self.limb_bytes(index)?;
        Some(LimbConstants {
            q: u32::read(&limb[HEADER_Q..]),
            psi: u32::read(&limb[HEADER_PSI..]),
            psi_inv: u32::read(&limb[HEADER_PSI_INV..]),
            n_inv_mod_q: u32::read(&limb[HEADER_N_INV..]),
            barrett_mu: u64::read(&limb[HEADER_MU..]),
        })
    }

    /// Releases the plan. The pool is left as it is and can be reused.
    pub fn free(self) {}

    fn limb_bytes(&self, index: usize) -> Option<&'pool [u8]> {
        let Storage::Precomputed(region) = self.storage else {
            return None;
        };
        if index >= self.num_q {
            return None;
        }
        let size = ntt_limb_bytes(self.ring_dim);
        region.get(index * size..(index + 1) * size)
    }

    /// Constants for limb `index`, from the header or recomputed.
    pub(crate) fn limb_constants(&self, index: usize) -> CkksResult<LimbConstants> {
        match self.header(index) {
            Some(constants) => Ok(constants),
            None => {
                let q = self.modulus(index).ok_or(ArgumentError::LimbIndexOutOfRange {
                    index,
                    num_q: self.num_q,
                })?;
                LimbConstants::compute(q, self.ring_dim)
            }
        }
    }
}

fn write_limb(limb: &mut [u8], ring_dim: u32, index: usize, constants: &LimbConstants) {
    let (header, tables) = limb.split_at_mut(NTT_LIMB_OVERHEAD);
    write_words(header, [constants.q, constants.psi, constants.psi_inv, constants.n_inv_mod_q]);
    constants.barrett_mu.write(&mut header[HEADER_MU..]);
    ring_dim.write(&mut header[HEADER_RING_DIM..]);
    (index as u32).write(&mut header[HEADER_INDEX..]);

    let n = ring_dim as usize;
    let log_n = ring_dim.trailing_zeros();
    let (forward, inverse) = tables.split_at_mut(n * u32::SIZE);
    let q = constants.q;
    let (mut fwd_power, mut inv_power) = (1u32, 1u32);
    for k in 0..n {
        let slot = reverse_bits(k, log_n) * u32::SIZE;
        fwd_power.write(&mut forward[slot..]);
        inv_power.write(&mut inverse[slot..]);
        fwd_power = mul_mod(fwd_power, constants.psi, q);
        inv_power = mul_mod(inv_power, constants.psi_inv, q);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::pow_mod;
    use crate::params::{PRESET_RING_DIM, RnsParams, derive};

    fn preset() -> (RnsParams, DerivedConstants) {
        let params = RnsParams::preset(PRESET_RING_DIM).unwrap();
        let derived = derive(&params).unwrap();
        (params, derived)
    }

    #[test]
    fn on_the_fly_needs_no_pool() {
        let (params, derived) = preset();
        assert_eq!(requirements(2048, &[998_244_353], NttMode::OnTheFly).unwrap(), 0);
        let plan = NttPlan::init(2048, params.moduli(), &derived, NttMode::OnTheFly, None).unwrap();
        assert_eq!(plan.mode(), NttMode::OnTheFly);
        assert_eq!(plan.ring_dim(), 2048);
        assert!(plan.forward_roots(0).is_none());
        assert!(plan.inverse_roots(0).is_none());
        assert!(plan.header(0).is_none());
        plan.free();
    }

    #[test]
    fn requirements_matches_exact_bytes() {
        let (params, _) = preset();
        let hint = requirements(2048, params.moduli(), NttMode::Precomputed).unwrap();
        assert_eq!(hint, exact_bytes(2048, 3, NttMode::Precomputed));
        assert_eq!(hint, 3 * (2 * 2048 * 4 + 32));
    }

    #[test]
    fn requirements_rejects_bad_shapes() {
        let q = [998_244_353u32];
        assert!(requirements(3000, &q, NttMode::Precomputed).is_err());
        assert!(requirements(0, &q, NttMode::Precomputed).is_err());
        assert!(requirements(2048, &[], NttMode::Precomputed).is_err());
        assert!(requirements(2048, &[q[0]; MAX_LIMBS + 1], NttMode::Precomputed).is_err());
        assert_eq!(exact_bytes(2048, MAX_LIMBS + 1, NttMode::Precomputed), 0);
    }

    #[test]
    fn precomputed_tables_hold_bit_reversed_powers() {
        let (params, derived) = preset();
        let mut pool = vec![0u8; exact_bytes(2048, 3, NttMode::Precomputed)];
        let plan =
            NttPlan::init(2048, params.moduli(), &derived, NttMode::Precomputed, Some(&mut pool))
                .unwrap();
        for i in 0..3 {
            let header = plan.header(i).unwrap();
            let q = header.q;
            assert_eq!(q, params.q[i]);
            assert_eq!(header.n_inv_mod_q, derived.primes[i].n_inv_mod_q);
            assert_eq!(pow_mod(header.psi, 2048, q), q - 1);
            assert_eq!(mul_mod(header.psi, header.psi_inv, q), 1);

            let fwd = plan.forward_roots(i).unwrap();
            let inv = plan.inverse_roots(i).unwrap();
            assert_eq!(fwd.len(), 2048);
            assert_eq!(inv.len(), 2048);
            assert_eq!(fwd.get(0), Some(1));
            // bitrev(1024, 11) = 1
            assert_eq!(fwd.get(1024), Some(header.psi));
            for k in [1usize, 5, 777, 2047] {
                assert_eq!(mul_mod(fwd.get(k).unwrap(), inv.get(k).unwrap(), q), 1);
            }
        }
        assert!(plan.forward_roots(3).is_none());
        assert!(plan.inverse_roots(3).is_none());
    }

    #[test]
    fn precomputed_rejects_missing_or_short_pool() {
        let (params, derived) = preset();
        let q = params.moduli();
        assert!(NttPlan::init(2048, q, &derived, NttMode::Precomputed, None).is_err());

        let bytes = exact_bytes(2048, 3, NttMode::Precomputed);
        let mut pool = vec![0xabu8; bytes - 4];
        assert!(NttPlan::init(2048, q, &derived, NttMode::Precomputed, Some(&mut pool)).is_err());
        assert!(pool.iter().all(|&b| b == 0xab));
    }

    #[test]
    fn init_checks_derived_constants() {
        let (params, derived) = preset();
        let mut swapped = params.q;
        swapped.swap(0, 1);
        assert!(
            NttPlan::init(2048, &swapped[..3], &derived, NttMode::OnTheFly, None).is_err()
        );
        assert!(NttPlan::init(1024, params.moduli(), &derived, NttMode::OnTheFly, None).is_err());
        assert!(NttPlan::init(2048, &params.q[..2], &derived, NttMode::OnTheFly, None).is_err());
    }

    #[test]
    fn pool_can_be_reused_after_free() {
        let (params, derived) = preset();
        let mut pool = vec![0u8; exact_bytes(2048, 3, NttMode::Precomputed)];
        for _ in 0..2 {
            let plan = NttPlan::init(
                2048,
                params.moduli(),
                &derived,
                NttMode::Precomputed,
                Some(&mut pool),
            )
            .unwrap();
            assert_eq!(plan.num_q(), 3);
            plan.free();
        }
    }
}

//! RNS parameter sets: validation, the built-in preset and plan size estimates.
//!
//! A parameter set is plain data. It is filled by the caller (by hand, from a
//! configuration document through `serde`, or through [`get_preset`]) and is
//! checked by [`validate`] before anything is derived from it.

mod derived;

pub use derived::{DerivedConstants, PrimeConstants, derive};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{ArgumentError, CkksError, CkksResult, invalid};

/// Maximum number of RNS limbs in a parameter set.
pub const MAX_LIMBS: usize = 4;
/// Every modulus must be strictly below `2^Q_MAX_BITS`.
pub const Q_MAX_BITS: u32 = 30;
/// Largest supported ring dimension.
pub const MAX_RING_DIM: u32 = 1 << 15;

/// Bytes of per-limb metadata in a precomputed NTT plan.
pub const NTT_LIMB_OVERHEAD: usize = 32;
/// Bytes of plan metadata in a precomputed encode plan.
pub const IFFT_PLAN_OVERHEAD: usize = 32;
/// Twiddle (two `f64`) plus bit-reversal (`u16`) bytes per ring element.
pub const IFFT_BYTES_PER_ELEMENT: usize = 2 * 8 + 2;

/// Ring dimension served by the built-in preset.
pub const PRESET_RING_DIM: u32 = 2048;
/// Modulus chain of the preset: three well-known NTT primes below `2^30`,
/// each `1 (mod 2^21)` or better.
pub const PRESET_MODULI: [u32; 3] = [998_244_353, 1_004_535_809, 469_762_049];
/// Default scale of the preset, `2^20`.
pub const PRESET_SCALE: f64 = (1u64 << 20) as f64;

/// Execution strategy of the NTT plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NttMode {
    /// Roots are recomputed on every transform; the plan owns no tables.
    #[default]
    OnTheFly,
    /// Forward and inverse root tables live in a caller pool.
    Precomputed,
}

/// Execution strategy of the encode (inverse FFT) plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfftMode {
    #[default]
    OnTheFly,
    Precomputed,
}

impl TryFrom<u32> for NttMode {
    type Error = CkksError;

    fn try_from(code: u32) -> CkksResult<Self> {
        match code {
            0 => Ok(Self::OnTheFly),
            1 => Ok(Self::Precomputed),
            _ => invalid(ArgumentError::UnknownMode { kind: "ntt", code }),
        }
    }
}

impl TryFrom<u32> for IfftMode {
    type Error = CkksError;

    fn try_from(code: u32) -> CkksResult<Self> {
        match code {
            0 => Ok(Self::OnTheFly),
            1 => Ok(Self::Precomputed),
            _ => invalid(ArgumentError::UnknownMode { kind: "ifft", code }),
        }
    }
}

/// A CKKS RNS parameter set.
///
/// Only the first `num_q` entries of `q` are part of the modulus chain; the
/// rest are ignored. `num_q` is kept as a separate field so that a malformed
/// count can be represented and rejected by [`validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnsParams {
    pub ring_dim: u32,
    pub num_q: u32,
    pub q: [u32; MAX_LIMBS],
    pub scale: f64,
    #[serde(default)]
    pub ntt_mode: NttMode,
    #[serde(default)]
    pub ifft_mode: IfftMode,
    /// Size of the pool the caller intends to hand to the plans.
    #[serde(default)]
    pub mempool_hint_bytes: usize,
}

impl Default for RnsParams {
    fn default() -> Self {
        Self {
            ring_dim: PRESET_RING_DIM,
            num_q: 0,
            q: [0; MAX_LIMBS],
            scale: 0.0,
            ntt_mode: NttMode::OnTheFly,
            ifft_mode: IfftMode::OnTheFly,
            mempool_hint_bytes: 0,
        }
    }
}

impl RnsParams {
    /// A fresh parameter set filled from the preset for `ring_dim`.
    pub fn preset(ring_dim: u32) -> CkksResult<Self> {
        let mut params = Self {
            ring_dim,
            ..Self::default()
        };
        get_preset(&mut params)?;
        Ok(params)
    }

    /// The active modulus chain. Clamped to `MAX_LIMBS` so an invalid
    /// `num_q` never causes an out-of-bounds slice.
    pub fn moduli(&self) -> &[u32] {
        let n = (self.num_q as usize).min(MAX_LIMBS);
        &self.q[..n]
    }

    /// Pool bytes both plans need under the configured modes.
    pub fn plan_pool_bytes(&self) -> usize {
        estimate_ntt_plan_bytes(self.ring_dim, self.moduli(), self.ntt_mode)
            + estimate_ifft_plan_bytes(self.ring_dim, self.ifft_mode)
    }
}

fn ring_dim_ok(ring_dim: u32) -> bool {
    ring_dim.is_power_of_two() && ring_dim <= MAX_RING_DIM
}

pub(crate) fn check_ring_dim(ring_dim: u32) -> CkksResult<()> {
    if !ring_dim_ok(ring_dim) {
        return invalid(ArgumentError::InvalidRingDim {
            ring_dim,
            max: MAX_RING_DIM,
        });
    }
    Ok(())
}

pub(crate) fn check_limb_count(num_q: usize) -> CkksResult<()> {
    if num_q == 0 || num_q > MAX_LIMBS {
        return invalid(ArgumentError::InvalidLimbCount {
            num_q,
            max: MAX_LIMBS,
        });
    }
    Ok(())
}

/// `true` iff `q` can carry a length-`ring_dim` negacyclic NTT: `ring_dim` is
/// a power of two, `1 < q < 2^Q_MAX_BITS` and `q = 1 (mod 2 * ring_dim)`.
///
/// `q = 1` meets the congruence trivially but is not a usable modulus.
/// Primality is not checked here.
pub fn is_ntt_friendly(q: u32, ring_dim: u32) -> bool {
    if !ring_dim.is_power_of_two() {
        return false;
    }
    let two_n = 2 * ring_dim as u64;
    q > 1 && (q as u64) < (1u64 << Q_MAX_BITS) && q as u64 % two_n == 1
}

/// Checks every structural rule of a parameter set.
pub fn validate(params: &RnsParams) -> CkksResult<()> {
    check_ring_dim(params.ring_dim)?;
    check_limb_count(params.num_q as usize)?;
    for &q in params.moduli() {
        if !is_ntt_friendly(q, params.ring_dim) {
            return invalid(ArgumentError::NonNttFriendlyModulus {
                modulus: q,
                ring_dim: params.ring_dim,
            });
        }
    }
    // `!(x > 0)` also rejects NaN.
    if !(params.scale > 0.0) || !params.scale.is_finite() {
        return invalid(ArgumentError::InvalidScale {
            scale: params.scale,
        });
    }
    Ok(())
}

/// Fills in the preset modulus chain and scale for `params.ring_dim`.
///
/// Only ring dimension 2048 has a preset. Modes and the pool hint are left as
/// the caller set them; on failure nothing is modified.
#[instrument(skip(params), fields(ring_dim = params.ring_dim))]
pub fn get_preset(params: &mut RnsParams) -> CkksResult<()> {
    if params.ring_dim != PRESET_RING_DIM {
        return invalid(ArgumentError::NoPreset {
            ring_dim: params.ring_dim,
        });
    }
    params.q = [0; MAX_LIMBS];
    params.q[..PRESET_MODULI.len()].copy_from_slice(&PRESET_MODULI);
    params.num_q = PRESET_MODULI.len() as u32;
    params.scale = PRESET_SCALE;
    debug!(num_q = params.num_q, scale = params.scale, "applied preset");
    Ok(())
}

/// Pool bytes a precomputed NTT plan needs: two `ring_dim`-word tables plus
/// [`NTT_LIMB_OVERHEAD`] bytes of metadata per modulus.
///
/// Returns 0 for `OnTheFly`, a zero or non-power-of-two `ring_dim`, or an
/// empty modulus list.
pub fn estimate_ntt_plan_bytes(ring_dim: u32, moduli: &[u32], mode: NttMode) -> usize {
    if mode == NttMode::OnTheFly || !ring_dim.is_power_of_two() || moduli.is_empty() {
        return 0;
    }
    moduli.len() * ntt_limb_bytes(ring_dim)
}

pub(crate) fn ntt_limb_bytes(ring_dim: u32) -> usize {
    2 * ring_dim as usize * size_of::<u32>() + NTT_LIMB_OVERHEAD
}

/// Pool bytes a precomputed encode plan needs: `ring_dim` complex twiddles
/// and `ring_dim` bit-reversal entries plus [`IFFT_PLAN_OVERHEAD`].
///
/// Returns 0 for `OnTheFly` or a zero or non-power-of-two `ring_dim`.
pub fn estimate_ifft_plan_bytes(ring_dim: u32, mode: IfftMode) -> usize {
    if mode == IfftMode::OnTheFly || !ring_dim.is_power_of_two() {
        return 0;
    }
    ring_dim as usize * IFFT_BYTES_PER_ELEMENT + IFFT_PLAN_OVERHEAD
}

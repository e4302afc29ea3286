use std::{f64::consts::TAU, fmt};

use num_complex::Complex64;
use tracing::{debug, instrument};

use crate::errors::{ArgumentError, CkksResult, invalid};
use crate::math::reverse_bits;
use crate::params::{IFFT_PLAN_OVERHEAD, IfftMode, check_ring_dim, estimate_ifft_plan_bytes};
use crate::pool::{PoolCarver, PoolTable, PoolWord, write_words};

/// Pool bytes an encode plan needs; rejects unusable ring dimensions.
pub fn plan_requirements(ring_dim: u32, mode: IfftMode) -> CkksResult<usize> {
    check_ring_dim(ring_dim)?;
    Ok(plan_exact_bytes(ring_dim, mode))
}

/// `2N * 8 + N * 2 + 32` bytes when precomputed; 0 for on-the-fly plans and
/// for zero or non-power-of-two dimensions.
pub fn plan_exact_bytes(ring_dim: u32, mode: IfftMode) -> usize {
    estimate_ifft_plan_bytes(ring_dim, mode)
}

#[derive(Clone, Copy)]
enum Storage<'pool> {
    OnTheFly,
    Precomputed { ring_dim: u32, pool: &'pool [u8] },
}

/// Twiddle and bit-reversal tables for the length-`N` complex FFT used by
/// the encoder.
///
/// Pool layout: `[header: 32 B][twiddles: 2N x f64][bitrev: N x u16]`, with
/// twiddle `k` stored as `(cos(-2 pi k / N), sin(-2 pi k / N))`. The header
/// records `N`, `log2 N` and the two table offsets.
pub struct EncodePlan<'pool> {
    storage: Storage<'pool>,
}

impl fmt::Debug for EncodePlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodePlan")
            .field("mode", &self.mode())
            .field("ring_dim", &self.ring_dim())
            .finish()
    }
}

impl<'pool> EncodePlan<'pool> {
    /// In [`IfftMode::OnTheFly`] both `ring_dim` and `pool` are ignored and the
    /// transform length is taken from the buffers at call time.
    #[instrument(skip(pool))]
    pub fn init(ring_dim: u32, mode: IfftMode, pool: Option<&'pool mut [u8]>) -> CkksResult<Self> {
        let storage = match mode {
            IfftMode::OnTheFly => Storage::OnTheFly,
            IfftMode::Precomputed => {
                check_ring_dim(ring_dim)?;
                let Some(pool) = pool else {
                    return invalid(ArgumentError::MissingPool);
                };
                let required = plan_exact_bytes(ring_dim, mode);
                let mut carver = PoolCarver::new(pool, required)?;
                let region = carver.take(required);
                write_tables(region, ring_dim);
                debug!(bytes = required, "built encode plan");
                Storage::Precomputed {
                    ring_dim,
                    pool: region,
                }
            }
        };
        Ok(Self { storage })
    }

    pub fn mode(&self) -> IfftMode {
        match self.storage {
            Storage::OnTheFly => IfftMode::OnTheFly,
            Storage::Precomputed { .. } => IfftMode::Precomputed,
        }
    }

    /// Ring dimension the tables were built for; 0 for on-the-fly plans.
    pub fn ring_dim(&self) -> u32 {
        match self.storage {
            Storage::OnTheFly => 0,
            Storage::Precomputed { ring_dim, .. } => ring_dim,
        }
    }

    /// Interleaved `(re, im)` twiddles, `2N` floats.
    pub fn twiddles(&self) -> Option<PoolTable<'pool, f64>> {
        let Storage::Precomputed { ring_dim, pool } = self.storage else {
            return None;
        };
        let (start, end) = twiddle_range(ring_dim);
        Some(PoolTable::new(&pool[start..end]))
    }

    pub fn twiddle(&self, k: usize) -> Option<Complex64> {
        let table = self.twiddles()?;
        let re = k.checked_mul(2)?;
        Some(Complex64::new(table.get(re)?, table.get(re.checked_add(1)?)?))
    }

    /// Bit-reversal permutation, `N` entries.
    pub fn bitrev(&self) -> Option<PoolTable<'pool, u16>> {
        let Storage::Precomputed { ring_dim, pool } = self.storage else {
            return None;
        };
        let (_, start) = twiddle_range(ring_dim);
        Some(PoolTable::new(&pool[start..start + ring_dim as usize * u16::SIZE]))
    }

    pub fn free(self) {}
}

fn twiddle_range(ring_dim: u32) -> (usize, usize) {
    let start = IFFT_PLAN_OVERHEAD;
    (start, start + 2 * ring_dim as usize * f64::SIZE)
}

fn write_tables(region: &mut [u8], ring_dim: u32) {
    let n = ring_dim as usize;
    let log_n = ring_dim.trailing_zeros();
    let (tw_start, br_start) = twiddle_range(ring_dim);

    let (header, tables) = region.split_at_mut(IFFT_PLAN_OVERHEAD);
    header.fill(0);
    write_words(header, [ring_dim, log_n, tw_start as u32, br_start as u32]);

    let (twiddles, bitrev) = tables.split_at_mut(br_start - tw_start);
    let step = TAU / n as f64;
    write_words(
        twiddles,
        (0..n).flat_map(|k| {
            let (sin, cos) = (-step * k as f64).sin_cos();
            [cos, sin]
        }),
    );
    write_words(bitrev, (0..n).map(|i| reverse_bits(i, log_n) as u16));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn on_the_fly_has_no_tables() {
        assert_eq!(plan_requirements(2048, IfftMode::OnTheFly).unwrap(), 0);
        assert_eq!(plan_exact_bytes(2048, IfftMode::OnTheFly), 0);
        let plan = EncodePlan::init(0, IfftMode::OnTheFly, None).unwrap();
        assert_eq!(plan.mode(), IfftMode::OnTheFly);
        assert_eq!(plan.ring_dim(), 0);
        assert!(plan.twiddles().is_none());
        assert!(plan.bitrev().is_none());
        assert!(plan.twiddle(0).is_none());
    }

    #[test]
    fn sizes_follow_the_layout() {
        assert_eq!(plan_requirements(2048, IfftMode::Precomputed).unwrap(), 2048 * 18 + 32);
        assert!(plan_requirements(3000, IfftMode::Precomputed).is_err());
        assert!(plan_requirements(0, IfftMode::Precomputed).is_err());
        assert_eq!(plan_exact_bytes(0, IfftMode::Precomputed), 0);
        assert_eq!(plan_exact_bytes(3000, IfftMode::Precomputed), 0);
    }

    #[test]
    fn twiddles_sit_on_the_unit_circle() {
        let mut pool = vec![0u8; plan_exact_bytes(64, IfftMode::Precomputed)];
        let plan = EncodePlan::init(64, IfftMode::Precomputed, Some(&mut pool)).unwrap();
        assert_eq!(plan.ring_dim(), 64);
        assert_eq!(plan.twiddles().unwrap().len(), 128);
        for k in 0..64 {
            let w = plan.twiddle(k).unwrap();
            assert_abs_diff_eq!(w.norm(), 1.0, epsilon = 1e-12);
        }
        let w = plan.twiddle(8).unwrap();
        assert_abs_diff_eq!(w.re, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_abs_diff_eq!(w.im, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert!(plan.twiddle(64).is_none());
    }

    #[test]
    fn huge_twiddle_indices_are_absent() {
        let mut pool = vec![0u8; plan_exact_bytes(16, IfftMode::Precomputed)];
        let plan = EncodePlan::init(16, IfftMode::Precomputed, Some(&mut pool)).unwrap();
        assert!(plan.twiddle(usize::MAX).is_none());
        assert!(plan.twiddle(usize::MAX / 2).is_none());
        assert!(plan.twiddles().unwrap().get(usize::MAX / 8).is_none());
        assert!(plan.bitrev().unwrap().get(usize::MAX).is_none());
    }

    #[test]
    fn header_records_shape() {
        let mut pool = vec![0u8; plan_exact_bytes(16, IfftMode::Precomputed)];
        EncodePlan::init(16, IfftMode::Precomputed, Some(&mut pool)).unwrap().free();
        let header = PoolTable::<u32>::new(&pool[..16]);
        assert_eq!(header.iter().collect::<Vec<_>>(), vec![16, 4, 32, 32 + 256]);
    }
}

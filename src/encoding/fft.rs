//! Iterative radix-2 FFT driven by an [`EncodePlan`].
//!
//! Computes the forward DFT `X_k = sum_j x_j e^{-2 pi i jk / N}` in natural
//! order. Precomputed plans supply the twiddles and the bit-reversal
//! permutation; on-the-fly plans recompute both.

use std::f64::consts::TAU;

use num_complex::Complex64;

use super::EncodePlan;
use crate::errors::{ArgumentError, CkksResult, invalid};
use crate::math::reverse_bits;
use crate::params::check_ring_dim;

/// Transform length for a buffer of `len` elements under `plan`.
pub(crate) fn transform_len(len: usize, plan: &EncodePlan<'_>) -> CkksResult<usize> {
    let planned = plan.ring_dim() as usize;
    if planned != 0 {
        if len != planned {
            return invalid(ArgumentError::LengthMismatch {
                expected: planned,
                actual: len,
            });
        }
        return Ok(len);
    }
    let ring_dim = u32::try_from(len).unwrap_or(u32::MAX);
    check_ring_dim(ring_dim)?;
    Ok(len)
}

#[inline(always)]
fn radix2(
    data: &mut [Complex64],
    permute: impl Fn(usize) -> usize,
    twiddle: impl Fn(usize) -> Complex64,
) {
    let n = data.len();
    for i in 0..n {
        let j = permute(i);
        if i < j {
            data.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let stride = n / len;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let w = twiddle(k * stride);
                let u = data[start + k];
                let v = data[start + k + half] * w;
                data[start + k] = u + v;
                data[start + k + half] = u - v;
            }
        }
        len <<= 1;
    }
}

/// Forward DFT of `data` in place.
///
/// With a precomputed plan `data.len()` must equal the plan's ring dimension;
/// otherwise any power-of-two length up to the maximum ring dimension works.
pub fn fft_inplace(data: &mut [Complex64], plan: &EncodePlan<'_>) -> CkksResult<()> {
    let n = transform_len(data.len(), plan)?;
    match (plan.twiddles(), plan.bitrev()) {
        (Some(twiddles), Some(bitrev)) => radix2(
            data,
            |i| bitrev.at(i) as usize,
            |k| Complex64::new(twiddles.at(2 * k), twiddles.at(2 * k + 1)),
        ),
        _ => {
            let log_n = n.trailing_zeros();
            let step = TAU / n as f64;
            radix2(
                data,
                |i| reverse_bits(i, log_n),
                |k| Complex64::from_polar(1.0, -step * k as f64),
            )
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::plan_exact_bytes;
    use crate::params::IfftMode;
    use approx::assert_abs_diff_eq;

    fn naive_dft(input: &[Complex64]) -> Vec<Complex64> {
        let n = input.len();
        (0..n)
            .map(|k| {
                input
                    .iter()
                    .enumerate()
                    .map(|(j, &x)| x * Complex64::from_polar(1.0, -TAU * (j * k) as f64 / n as f64))
                    .sum()
            })
            .collect()
    }

    #[test]
    fn matches_naive_dft_in_both_modes() {
        let input: Vec<Complex64> = (0..16)
            .map(|i| Complex64::new(i as f64 * 0.5 - 3.0, (i * i) as f64 * 0.1))
            .collect();
        let expected = naive_dft(&input);

        let mut pool = vec![0u8; plan_exact_bytes(16, IfftMode::Precomputed)];
        let table_plan = EncodePlan::init(16, IfftMode::Precomputed, Some(&mut pool)).unwrap();
        let fly_plan = EncodePlan::init(0, IfftMode::OnTheFly, None).unwrap();

        for plan in [&table_plan, &fly_plan] {
            let mut data = input.clone();
            fft_inplace(&mut data, plan).unwrap();
            for (got, want) in data.iter().zip(&expected) {
                assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-9);
                assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn rejects_bad_lengths() {
        let fly_plan = EncodePlan::init(0, IfftMode::OnTheFly, None).unwrap();
        let mut data = vec![Complex64::new(1.0, 0.0); 12];
        assert!(fft_inplace(&mut data, &fly_plan).is_err());
        assert!(fft_inplace(&mut [], &fly_plan).is_err());

        let mut pool = vec![0u8; plan_exact_bytes(16, IfftMode::Precomputed)];
        let plan = EncodePlan::init(16, IfftMode::Precomputed, Some(&mut pool)).unwrap();
        let mut data = vec![Complex64::new(1.0, 0.0); 8];
        assert!(fft_inplace(&mut data, &plan).is_err());
        assert!(data.iter().all(|c| *c == Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn length_one_is_identity() {
        let plan = EncodePlan::init(0, IfftMode::OnTheFly, None).unwrap();
        let mut data = [Complex64::new(2.5, -1.0)];
        fft_inplace(&mut data, &plan).unwrap();
        assert_eq!(data[0], Complex64::new(2.5, -1.0));
    }
}

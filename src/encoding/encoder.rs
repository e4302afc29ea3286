//! Canonical embedding encoder.
//!
//! A real polynomial `m` of degree `< N` is identified with its evaluations
//! `z_j = m(zeta^-(2j+1))`, `zeta = e^{i pi / N}`. Since
//! `z_{N-1-j} = conj(z_j)`, only the first `N/2` slots carry data. Decoding
//! twists the coefficients by `zeta^-k` and runs one forward FFT; encoding
//! inverts that through the conjugation identity
//! `IDFT(z) = conj(DFT(conj(z))) / N`, so a single FFT kernel serves both.
//!
//! Nothing here allocates: the caller provides an `N`-element scratch buffer.

use std::f64::consts::PI;

use num_complex::Complex64;

use super::EncodePlan;
use super::fft::{fft_inplace, transform_len};
use crate::errors::{ArgumentError, CkksResult, invalid};

/// Slot values accepted by the encoder.
#[derive(Clone, Copy, Debug)]
pub enum SlotInput<'a> {
    Real(&'a [f64]),
    Complex(&'a [Complex64]),
}

impl<'a> SlotInput<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            SlotInput::Real(values) => values.len(),
            SlotInput::Complex(values) => values.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Complex64 {
        match self {
            SlotInput::Real(values) => Complex64::new(values[idx], 0.0),
            SlotInput::Complex(values) => values[idx],
        }
    }
}

impl<'a> From<&'a [f64]> for SlotInput<'a> {
    fn from(values: &'a [f64]) -> Self {
        SlotInput::Real(values)
    }
}

impl<'a> From<&'a [Complex64]> for SlotInput<'a> {
    fn from(values: &'a [Complex64]) -> Self {
        SlotInput::Complex(values)
    }
}

/// Largest magnitude that still rounds to a valid `i64`.
const COEFF_LIMIT: f64 = 9.2e18;

fn check_scale(scale: f64) -> CkksResult<()> {
    if !(scale > 0.0) || !scale.is_finite() {
        return invalid(ArgumentError::InvalidScale { scale });
    }
    Ok(())
}

#[inline]
fn zeta_pow(k: usize, n: usize, sign: f64) -> Complex64 {
    Complex64::from_polar(1.0, sign * PI * k as f64 / n as f64)
}

/// Encodes up to `N/2` real slots, scaled by `scale`, into `out`.
///
/// `N` is the plan's ring dimension, or `scratch.len()` for on-the-fly plans.
/// `out` must hold `N` coefficients. `out` is only written on success.
pub fn encode(
    values: &[f64],
    scale: f64,
    plan: &EncodePlan<'_>,
    scratch: &mut [Complex64],
    out: &mut [i64],
) -> CkksResult<()> {
    encode_slots(SlotInput::Real(values), scale, plan, scratch, out)
}

/// Complex-slot variant of [`encode`].
pub fn encode_complex(
    values: &[Complex64],
    scale: f64,
    plan: &EncodePlan<'_>,
    scratch: &mut [Complex64],
    out: &mut [i64],
) -> CkksResult<()> {
    encode_slots(SlotInput::Complex(values), scale, plan, scratch, out)
}

pub fn encode_slots(
    values: SlotInput<'_>,
    scale: f64,
    plan: &EncodePlan<'_>,
    scratch: &mut [Complex64],
    out: &mut [i64],
) -> CkksResult<()> {
    let n = transform_len(scratch.len(), plan)?;
    if out.len() != n {
        return invalid(ArgumentError::LengthMismatch {
            expected: n,
            actual: out.len(),
        });
    }
    check_scale(scale)?;
    if values.len() > n / 2 {
        return invalid(ArgumentError::TooManySlots {
            got: values.len(),
            max: n / 2,
        });
    }
    for idx in 0..values.len() {
        let z = values.get(idx);
        if !z.re.is_finite() || !z.im.is_finite() {
            return invalid(ArgumentError::ValueOutOfRange {
                value: if z.re.is_finite() { z.im } else { z.re },
            });
        }
    }

    // conj(z) laid out with its mirror image, so that one forward FFT yields
    // N * conj(IDFT(z)).
    scratch.fill(Complex64::new(0.0, 0.0));
    for idx in 0..values.len() {
        let z = values.get(idx) * scale;
        scratch[idx] = z.conj();
        scratch[n - 1 - idx] = z;
    }
    fft_inplace(scratch, plan)?;

    let inv_n = 1.0 / n as f64;
    for (k, slot) in scratch.iter_mut().enumerate() {
        let coeff = (slot.conj() * inv_n * zeta_pow(k, n, 1.0)).re;
        // Also catches NaN from overflowing slot values.
        if !(coeff.abs() < COEFF_LIMIT) {
            return invalid(ArgumentError::ValueOutOfRange { value: coeff });
        }
        *slot = Complex64::new(coeff.round(), 0.0);
    }
    for (dst, src) in out.iter_mut().zip(scratch.iter()) {
        *dst = src.re as i64;
    }
    Ok(())
}

/// Evaluates `coeffs` at the slot roots and divides by `scale`, leaving the
/// full `N`-slot vector in `scratch`.
fn decode_into_scratch(
    coeffs: &[i64],
    scale: f64,
    plan: &EncodePlan<'_>,
    scratch: &mut [Complex64],
    wanted: usize,
) -> CkksResult<()> {
    let n = transform_len(scratch.len(), plan)?;
    if coeffs.len() != n {
        return invalid(ArgumentError::LengthMismatch {
            expected: n,
            actual: coeffs.len(),
        });
    }
    if wanted > n / 2 {
        return invalid(ArgumentError::TooManySlots {
            got: wanted,
            max: n / 2,
        });
    }
    check_scale(scale)?;

    for (k, (slot, &c)) in scratch.iter_mut().zip(coeffs).enumerate() {
        *slot = zeta_pow(k, n, -1.0) * c as f64;
    }
    fft_inplace(scratch, plan)?;
    let inv_scale = 1.0 / scale;
    for slot in scratch.iter_mut() {
        *slot *= inv_scale;
    }
    Ok(())
}

/// Decodes the first `out.len()` (at most `N/2`) slots as real numbers.
pub fn decode(
    coeffs: &[i64],
    scale: f64,
    plan: &EncodePlan<'_>,
    scratch: &mut [Complex64],
    out: &mut [f64],
) -> CkksResult<()> {
    decode_into_scratch(coeffs, scale, plan, scratch, out.len())?;
    for (dst, src) in out.iter_mut().zip(scratch.iter()) {
        *dst = src.re;
    }
    Ok(())
}

pub fn decode_complex(
    coeffs: &[i64],
    scale: f64,
    plan: &EncodePlan<'_>,
    scratch: &mut [Complex64],
    out: &mut [Complex64],
) -> CkksResult<()> {
    decode_into_scratch(coeffs, scale, plan, scratch, out.len())?;
    out.copy_from_slice(&scratch[..out.len()]);
    Ok(())
}

//! Multiplies two slot vectors through the RNS/NTT path and prints a few
//! products next to their exact values.

use embedded_ckks_core::encoding::{EncodePlan, decode, encode};
use embedded_ckks_core::math::{DeterministicRng, generate_ntt_primes};
use embedded_ckks_core::ntt::{self, negacyclic_mul_inplace};
use embedded_ckks_core::rns::{lift_signed, reconstruct_limbs};
use embedded_ckks_core::{CkksResult, CrtBasis, IfftMode, NttMode, NttPlan, RnsParams, derive};
use num_complex::Complex64;
use rand::Rng;
use tracing::info;

const RING_DIM: u32 = 4096;

fn main() -> CkksResult<()> {
    tracing_subscriber::fmt().init();

    // No preset exists for 4096; search a fresh chain instead.
    let mut moduli = [0u32; 3];
    generate_ntt_primes(30, RING_DIM, &mut moduli)?;
    let mut params = RnsParams {
        ring_dim: RING_DIM,
        num_q: moduli.len() as u32,
        scale: (1u64 << 24) as f64,
        ntt_mode: NttMode::Precomputed,
        ..RnsParams::default()
    };
    params.q[..moduli.len()].copy_from_slice(&moduli);
    let derived = derive(&params)?;
    info!(?moduli, "generated modulus chain");

    let n = RING_DIM as usize;
    let mut ntt_pool = vec![0u8; ntt::requirements(RING_DIM, &moduli, params.ntt_mode)?];
    let ntt_plan =
        NttPlan::init(RING_DIM, &moduli, &derived, params.ntt_mode, Some(&mut ntt_pool))?;
    let enc_plan = EncodePlan::init(RING_DIM, IfftMode::OnTheFly, None)?;

    let mut rng = DeterministicRng::from_u64(2024);
    let x: Vec<f64> = (0..16).map(|_| rng.rng().random_range(-2.0..2.0)).collect();
    let y: Vec<f64> = (0..16).map(|_| rng.rng().random_range(-2.0..2.0)).collect();

    let mut scratch = vec![Complex64::new(0.0, 0.0); n];
    let (mut cx, mut cy) = (vec![0i64; n], vec![0i64; n]);
    encode(&x, params.scale, &enc_plan, &mut scratch, &mut cx)?;
    encode(&y, params.scale, &enc_plan, &mut scratch, &mut cy)?;

    let (mut lx, mut ly) = (vec![0u32; 3 * n], vec![0u32; 3 * n]);
    lift_signed(&cx, &moduli, &mut lx)?;
    lift_signed(&cy, &moduli, &mut ly)?;
    for (i, (a, b)) in lx.chunks_exact_mut(n).zip(ly.chunks_exact_mut(n)).enumerate() {
        let prime = derived.primes[i];
        negacyclic_mul_inplace(a, b, prime.q, prime.n_inv_mod_q, &ntt_plan, i)?;
    }

    let basis = CrtBasis::new(&moduli)?;
    let mut wide = vec![0i128; n];
    reconstruct_limbs(&lx, &basis, &mut wide)?;
    let product: Vec<i64> = wide.iter().map(|&c| c as i64).collect();

    let mut slots = vec![0.0; x.len()];
    decode(&product, params.scale * params.scale, &enc_plan, &mut scratch, &mut slots)?;
    for (j, got) in slots.iter().enumerate() {
        println!("{:>8.4} * {:>8.4} = {:>9.5} (decoded {:>9.5})", x[j], y[j], x[j] * y[j], got);
    }
    Ok(())
}

//! Slot-wise multiplication through the whole core: encode, lift into RNS
//! limbs, multiply each limb with the NTT, reconstruct with the CRT, decode.

use approx::assert_abs_diff_eq;
use embedded_ckks_core::encoding::{EncodePlan, decode, encode};
use embedded_ckks_core::ntt::{self, negacyclic_mul_inplace};
use embedded_ckks_core::rns::{lift_signed, reconstruct_limbs};
use embedded_ckks_core::{CrtBasis, IfftMode, NttMode, NttPlan, RnsParams, derive};
use num_complex::Complex64;

fn multiply_slots(ntt_mode: NttMode, ifft_mode: IfftMode) {
    let params = RnsParams::preset(2048).unwrap();
    let derived = derive(&params).unwrap();
    let n = params.ring_dim as usize;
    let limbs = params.moduli().len();

    let mut ntt_pool = vec![0u8; ntt::exact_bytes(params.ring_dim, limbs, ntt_mode)];
    let ntt_plan =
        NttPlan::init(params.ring_dim, params.moduli(), &derived, ntt_mode, Some(&mut ntt_pool))
            .unwrap();
    let mut enc_pool =
        vec![0u8; embedded_ckks_core::encoding::plan_exact_bytes(params.ring_dim, ifft_mode)];
    let enc_plan = EncodePlan::init(params.ring_dim, ifft_mode, Some(&mut enc_pool)).unwrap();

    let x: Vec<f64> = (0..256).map(|i| (i as f64 * 0.05).cos()).collect();
    let y: Vec<f64> = (0..256).map(|i| 1.0 - i as f64 / 256.0).collect();

    let mut scratch = vec![Complex64::new(0.0, 0.0); n];
    let mut cx = vec![0i64; n];
    let mut cy = vec![0i64; n];
    encode(&x, params.scale, &enc_plan, &mut scratch, &mut cx).unwrap();
    encode(&y, params.scale, &enc_plan, &mut scratch, &mut cy).unwrap();

    let mut lx = vec![0u32; limbs * n];
    let mut ly = vec![0u32; limbs * n];
    lift_signed(&cx, params.moduli(), &mut lx).unwrap();
    lift_signed(&cy, params.moduli(), &mut ly).unwrap();

    for (i, prime) in derived.primes().iter().enumerate() {
        let range = i * n..(i + 1) * n;
        negacyclic_mul_inplace(
            &mut lx[range.clone()],
            &mut ly[range],
            prime.q,
            prime.n_inv_mod_q,
            &ntt_plan,
            i,
        )
        .unwrap();
    }

    let basis = CrtBasis::new(params.moduli()).unwrap();
    let mut wide = vec![0i128; n];
    reconstruct_limbs(&lx, &basis, &mut wide).unwrap();
    let product: Vec<i64> = wide.iter().map(|&c| c as i64).collect();

    let mut slots = vec![0.0; x.len()];
    decode(&product, params.scale * params.scale, &enc_plan, &mut scratch, &mut slots).unwrap();
    for (j, got) in slots.iter().enumerate() {
        assert_abs_diff_eq!(*got, x[j] * y[j], epsilon = 1e-2);
    }
}

#[test]
fn slot_products_with_tables() {
    multiply_slots(NttMode::Precomputed, IfftMode::Precomputed);
}

#[test]
fn slot_products_on_the_fly() {
    multiply_slots(NttMode::OnTheFly, IfftMode::OnTheFly);
}

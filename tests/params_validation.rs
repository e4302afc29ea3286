use embedded_ckks_core::math::mul_mod;
use embedded_ckks_core::params::PRESET_MODULI;
use embedded_ckks_core::{
    IfftMode, MAX_LIMBS, NttMode, Q_MAX_BITS, RnsParams, derive, estimate_ifft_plan_bytes,
    estimate_ntt_plan_bytes, get_preset, is_ntt_friendly, validate,
};

fn preset() -> RnsParams {
    let mut params = RnsParams {
        ring_dim: 2048,
        ..RnsParams::default()
    };
    get_preset(&mut params).unwrap();
    params
}

#[test]
fn preset_2048_fills_friendly_chain() {
    let params = preset();
    assert!(params.num_q > 0 && params.num_q as usize <= MAX_LIMBS);
    assert!(params.scale > 0.0);
    for (i, &q) in params.moduli().iter().enumerate() {
        assert!(is_ntt_friendly(q, params.ring_dim));
        assert_eq!(q, PRESET_MODULI[i]);
    }
    assert!(validate(&params).is_ok());
}

#[test]
fn preset_rejects_other_ring_dims() {
    for ring_dim in [4096, 3000] {
        let mut params = RnsParams {
            ring_dim,
            ..RnsParams::default()
        };
        assert!(get_preset(&mut params).is_err());
        assert_eq!(params.num_q, 0);
    }
}

#[test]
fn validate_rejects_bad_ring_dim() {
    let mut params = preset();
    params.ring_dim = 3000;
    assert!(validate(&params).is_err());
    params.ring_dim = 0;
    assert!(validate(&params).is_err());
    params.ring_dim = 1 << 16;
    assert!(validate(&params).is_err());
}

#[test]
fn validate_rejects_limb_count_out_of_range() {
    let mut params = preset();
    params.num_q = 0;
    assert!(validate(&params).is_err());
    params.num_q = MAX_LIMBS as u32 + 1;
    assert!(validate(&params).is_err());
}

#[test]
fn validate_rejects_bad_moduli() {
    let cases = [0u32, 1 << Q_MAX_BITS, 998_244_354];
    for bad in cases {
        let mut params = preset();
        params.q[0] = bad;
        assert!(validate(&params).is_err(), "q = {bad}");
    }
}

#[test]
fn validate_rejects_nonpositive_scale() {
    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let mut params = preset();
        params.scale = scale;
        assert!(validate(&params).is_err(), "scale = {scale}");
    }
}

#[test]
fn unknown_mode_codes_are_rejected() {
    assert!(NttMode::try_from(999).is_err());
    assert!(IfftMode::try_from(999).is_err());
    assert_eq!(IfftMode::try_from(0).unwrap(), IfftMode::OnTheFly);
}

#[test]
fn friendliness_grid() {
    for q in PRESET_MODULI {
        assert!(is_ntt_friendly(q, 2048));
    }
    assert!(!is_ntt_friendly(998_244_354, 2048));
    assert!(!is_ntt_friendly(998_244_353, 3000));
    assert!(!is_ntt_friendly((1 << Q_MAX_BITS) + 1, 2048));
}

#[test]
fn derive_matches_definitions() {
    let params = preset();
    let derived = derive(&params).unwrap();
    assert_eq!(derived.ring_dim, params.ring_dim);
    assert_eq!(derived.two_n, params.ring_dim * 2);
    assert_eq!(derived.num_q, params.num_q);
    for (i, prime) in derived.primes().iter().enumerate() {
        assert_eq!(prime.q, params.q[i]);
        assert_ne!(prime.n_inv_mod_q, 0);
        assert_eq!(mul_mod(params.ring_dim % prime.q, prime.n_inv_mod_q, prime.q), 1);
        assert!(prime.barrett_mu >= 1u64 << 32);
        assert!(prime.barrett_mu <= u64::MAX / prime.q as u64);
    }
}

#[test]
fn derive_catches_modulus_broken_after_validation() {
    let mut params = preset();
    validate(&params).unwrap();
    params.q[2] = 12_345;
    assert!(derive(&params).is_err());
}

#[test]
fn ntt_estimates() {
    let params = preset();
    let expected = params.num_q as usize * (2 * 2048 * 4 + 32);
    assert_eq!(
        estimate_ntt_plan_bytes(2048, params.moduli(), NttMode::Precomputed),
        expected
    );
    assert_eq!(estimate_ntt_plan_bytes(2048, params.moduli(), NttMode::OnTheFly), 0);
    assert_eq!(estimate_ntt_plan_bytes(0, params.moduli(), NttMode::Precomputed), 0);
    assert_eq!(estimate_ntt_plan_bytes(2048, &[], NttMode::Precomputed), 0);
    assert_eq!(estimate_ntt_plan_bytes(3000, params.moduli(), NttMode::Precomputed), 0);
}

#[test]
fn ifft_estimates() {
    assert_eq!(estimate_ifft_plan_bytes(2048, IfftMode::Precomputed), 2048 * 18 + 32);
    assert_eq!(estimate_ifft_plan_bytes(2048, IfftMode::OnTheFly), 0);
    assert_eq!(estimate_ifft_plan_bytes(0, IfftMode::Precomputed), 0);
    assert_eq!(estimate_ifft_plan_bytes(3000, IfftMode::Precomputed), 0);
}

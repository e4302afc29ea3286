//! Arithmetic and parameter core of an embedded CKKS library.
//!
//! Plans never allocate: their tables live in byte pools the caller sizes
//! with `requirements` / `exact_bytes` and lends to `init`.

pub mod encoding;
pub mod errors;
pub mod math;
pub mod ntt;
pub mod params;
pub mod pool;
pub mod rns;

pub use encoding::EncodePlan;
pub use errors::{ArgumentError, CkksError, CkksResult};
pub use ntt::NttPlan;
pub use params::{
    DerivedConstants, IfftMode, MAX_LIMBS, MAX_RING_DIM, NttMode, PrimeConstants, Q_MAX_BITS,
    RnsParams, derive, estimate_ifft_plan_bytes, estimate_ntt_plan_bytes, get_preset,
    is_ntt_friendly, validate,
};
pub use pool::PoolTable;
pub use rns::CrtBasis;

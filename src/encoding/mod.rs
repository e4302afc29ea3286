//! Encode plans, the FFT kernel they drive and the CKKS canonical embedding.

mod encoder;
mod fft;
mod plan;

pub use encoder::{SlotInput, decode, decode_complex, encode, encode_complex, encode_slots};
pub use fft::fft_inplace;
pub use plan::{EncodePlan, plan_exact_bytes, plan_requirements};

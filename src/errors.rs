use thiserror::Error;

/// The single failure kind of the core. Every fallible operation either fully
/// succeeds or returns this without touching caller-visible output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CkksError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
}

/// Diagnostic detail carried by [`CkksError::InvalidArgument`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("ring dimension must be a nonzero power of two up to {max}, got {ring_dim}")]
    InvalidRingDim { ring_dim: u32, max: u32 },
    #[error("limb count must be in 1..={max}, got {num_q}")]
    InvalidLimbCount { num_q: usize, max: usize },
    #[error("modulus {modulus} is not NTT-friendly for ring dimension {ring_dim}")]
    NonNttFriendlyModulus { modulus: u32, ring_dim: u32 },
    #[error("no primitive {order}-th root of unity modulo {modulus}")]
    MissingPrimitiveRoot { modulus: u32, order: u64 },
    #[error("scale must be positive and finite, got {scale}")]
    InvalidScale { scale: f64 },
    #[error("unrecognized {kind} mode code {code}")]
    UnknownMode { kind: &'static str, code: u32 },
    #[error("no preset for ring dimension {ring_dim}")]
    NoPreset { ring_dim: u32 },
    #[error("memory pool of {provided} bytes is smaller than the required {required}")]
    PoolTooSmall { required: usize, provided: usize },
    #[error("precomputed plan needs a memory pool")]
    MissingPool,
    #[error("derived constants do not match the plan arguments")]
    DerivedMismatch,
    #[error("limb index {index} out of range for {num_q} limbs")]
    LimbIndexOutOfRange { index: usize, num_q: usize },
    #[error("modulus {modulus} does not match plan modulus {expected} at limb {index}")]
    ModulusMismatch {
        modulus: u32,
        expected: u32,
        index: usize,
    },
    #[error("{n_inv} is not the inverse of {ring_dim} modulo {modulus}")]
    WrongInverse { n_inv: u32, ring_dim: u32, modulus: u32 },
    #[error("buffer length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("input too long: got {got} slots, max {max}")]
    TooManySlots { got: usize, max: usize },
    #[error("value {value} out of range")]
    ValueOutOfRange { value: f64 },
    #[error("invalid sampler parameter: {message}")]
    InvalidSampler { message: &'static str },
    #[error("cannot find {count} NTT primes of {bits} bits for ring dimension {ring_dim}")]
    NotEnoughPrimes { bits: u32, count: usize, ring_dim: u32 },
    #[error("modulus {modulus} is too small, need at least 2")]
    ModulusTooSmall { modulus: u32 },
    #[error("modulus {modulus} is not coprime to the rest of the basis")]
    NonCoprimeModulus { modulus: u32 },
}

pub type CkksResult<T> = Result<T, CkksError>;

/// Shorthand used throughout the crate: `invalid(ArgumentError::…)`.
pub(crate) fn invalid<T>(reason: ArgumentError) -> CkksResult<T> {
    Err(CkksError::InvalidArgument(reason))
}

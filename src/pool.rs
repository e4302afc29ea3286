//! Caller-owned memory pools and the typed views plans read them through.
//!
//! A plan never owns memory. It is built over a `&mut [u8]` the caller sized
//! with the matching `exact_bytes` function, writes its tables into that
//! region once, and afterwards only keeps a shared borrow plus offsets.
//! Words are stored little-endian and decoded on read, so the pool may start
//! at any address.

use std::{fmt, marker::PhantomData};

use crate::errors::{ArgumentError, CkksResult, invalid};

/// A fixed-width value that can live inside a pool.
pub trait PoolWord: Copy {
    const SIZE: usize;
    fn read(bytes: &[u8]) -> Self;
    fn write(self, bytes: &mut [u8]);
}

macro_rules! impl_pool_word {
    ($($ty:ty),*) => {$(
        impl PoolWord for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            #[inline(always)]
            fn read(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$ty>::from_le_bytes(raw)
            }

            #[inline(always)]
            fn write(self, bytes: &mut [u8]) {
                bytes[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
            }
        }
    )*};
}

impl_pool_word!(u16, u32, u64, f64);

/// Read-only view of `len` consecutive words inside a pool.
#[derive(Clone, Copy)]
pub struct PoolTable<'a, T: PoolWord> {
    bytes: &'a [u8],
    _word: PhantomData<T>,
}

impl<'a, T: PoolWord + 'a> PoolTable<'a, T> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len() % T::SIZE, 0);
        Self {
            bytes,
            _word: PhantomData,
        }
    }

    /// Number of words in the table.
    pub fn len(&self) -> usize {
        self.bytes.len() / T::SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::SIZE)?;
        let chunk = self.bytes.get(start..start.checked_add(T::SIZE)?)?;
        Some(T::read(chunk))
    }

    /// Unchecked-by-contract read used on transform hot paths; still panics
    /// rather than reading out of bounds.
    #[inline(always)]
    pub(crate) fn at(&self, index: usize) -> T {
        T::read(&self.bytes[index * T::SIZE..])
    }

    pub fn iter(self) -> impl Iterator<Item = T> + 'a {
        self.bytes.chunks_exact(T::SIZE).map(T::read)
    }
}

impl<T: PoolWord + fmt::Debug> fmt::Debug for PoolTable<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolTable").field("len", &self.len()).finish()
    }
}

/// Hands out consecutive, non-overlapping regions of a pool.
pub(crate) struct PoolCarver<'a> {
    rest: &'a mut [u8],
}

impl<'a> PoolCarver<'a> {
    /// Accepts the pool only if it can hold `required` bytes.
    pub(crate) fn new(pool: &'a mut [u8], required: usize) -> CkksResult<Self> {
        if pool.len() < required {
            return invalid(ArgumentError::PoolTooSmall {
                required,
                provided: pool.len(),
            });
        }
        Ok(Self { rest: pool })
    }

    pub(crate) fn take(&mut self, len: usize) -> &'a mut [u8] {
        let rest = std::mem::take(&mut self.rest);
        let (head, tail) = rest.split_at_mut(len);
        self.rest = tail;
        head
    }
}

/// Writes `words` one after another starting at `bytes[0]`.
pub(crate) fn write_words<T: PoolWord>(bytes: &mut [u8], words: impl IntoIterator<Item = T>) {
    for (chunk, word) in bytes.chunks_exact_mut(T::SIZE).zip(words) {
        word.write(chunk);
    }
}

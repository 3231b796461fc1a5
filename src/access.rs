//! Guarded memory access.
//!
//! The engine never dereferences an address itself. It reads through a
//! [`Source`] and writes through a [`Sink`], each of which may refuse an
//! access with a [`Fault`]. Local memory is wrapped in [`SliceSource`] and
//! [`SliceSink`]; a restricted region supplies its own implementation (see
//! [`crate::space::AddressSpace`]).
//!
//! Words are read and written in little-endian byte order regardless of the
//! target, which is what the merge shifts assume.

use crate::align::{WORD, Word};
use crate::fault::Fault;

/// Readable memory.
pub trait Source {
    fn load_u8(&mut self, addr: usize) -> Result<u8, Fault>;

    /// Loads the word at `addr`. The engine only calls this with word-aligned
    /// addresses.
    fn load_word(&mut self, addr: usize) -> Result<Word, Fault>;

    /// Hints that the cache line holding `addr` will be read soon. Never
    /// faults and never blocks.
    #[inline(always)]
    fn prefetch(&mut self, addr: usize) {
        let _ = addr;
    }
}

/// Writable memory. A store that fails has written nothing.
pub trait Sink {
    fn store_u8(&mut self, addr: usize, value: u8) -> Result<(), Fault>;

    fn store_word(&mut self, addr: usize, value: Word) -> Result<(), Fault>;
}

/// Issues a read prefetch for the cache line holding `ptr`.
///
/// Any address is allowed; a prefetch is a hint and does not fault.
#[inline(always)]
pub fn prefetch_read(ptr: *const u8) {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: prefetch is a hint; invalid addresses do not fault.
        unsafe {
            core::arch::x86_64::_mm_prefetch::<{ core::arch::x86_64::_MM_HINT_T0 }>(
                ptr.cast::<i8>(),
            );
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: PRFM never faults and has no architectural side effects.
        unsafe {
            core::arch::asm!(
                "prfm pldl1keep, [{0}]",
                in(reg) ptr,
                options(nostack, readonly, preserves_flags)
            );
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        let _ = ptr;
    }
}

/// Local memory being read, addressed by its real pointer values.
#[derive(Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    base: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            base: bytes.as_ptr() as usize,
            bytes,
        }
    }

    /// Address of the first byte.
    #[inline]
    pub fn addr(&self) -> usize {
        self.base
    }

    #[inline(always)]
    fn index(&self, addr: usize, len: usize) -> Result<usize, Fault> {
        match addr.checked_sub(self.base) {
            Some(i) if i <= self.bytes.len() && len <= self.bytes.len() - i => Ok(i),
            _ => Err(Fault::load(addr)),
        }
    }
}

impl Source for SliceSource<'_> {
    #[inline(always)]
    fn load_u8(&mut self, addr: usize) -> Result<u8, Fault> {
        let i = self.index(addr, 1)?;
        Ok(self.bytes[i])
    }

    #[inline(always)]
    fn load_word(&mut self, addr: usize) -> Result<Word, Fault> {
        let i = self.index(addr, WORD)?;
        let b = &self.bytes[i..i + WORD];
        Ok(Word::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    #[inline(always)]
    fn prefetch(&mut self, addr: usize) {
        prefetch_read(self.bytes.as_ptr().wrapping_add(addr.wrapping_sub(self.base)));
    }
}

/// Local memory being written, addressed by its real pointer values.
#[derive(Debug)]
pub struct SliceSink<'a> {
    bytes: &'a mut [u8],
    base: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self {
            base: bytes.as_ptr() as usize,
            bytes,
        }
    }

    /// Address of the first byte.
    #[inline]
    pub fn addr(&self) -> usize {
        self.base
    }

    #[inline(always)]
    fn index(&self, addr: usize, len: usize) -> Result<usize, Fault> {
        match addr.checked_sub(self.base) {
            Some(i) if i <= self.bytes.len() && len <= self.bytes.len() - i => Ok(i),
            _ => Err(Fault::store(addr)),
        }
    }
}

impl Sink for SliceSink<'_> {
    #[inline(always)]
    fn store_u8(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        let i = self.index(addr, 1)?;
        self.bytes[i] = value;
        Ok(())
    }

    #[inline(always)]
    fn store_word(&mut self, addr: usize, value: Word) -> Result<(), Fault> {
        let i = self.index(addr, WORD)?;
        self.bytes[i..i + WORD].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

//! A paged address space with per-page protection.
//!
//! [`AddressSpace`] stands in for memory on the far side of a trust boundary:
//! a contiguous range of addresses backed by a buffer, divided into pages that
//! can each be unmapped, read-only or read-write. Loads and stores that touch
//! a page without the needed permission fail with a [`Fault`], which is how
//! faults are injected into the copy engine. Prefetch hints are recorded in
//! issue order.

use crate::access::{Sink, Source};
use crate::align::{WORD, Word};
use crate::fault::Fault;

/// Default page size in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Access permitted on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protection {
    None,
    Read,
    ReadWrite,
}

impl Protection {
    #[inline]
    fn readable(self) -> bool {
        !matches!(self, Protection::None)
    }

    #[inline]
    fn writable(self) -> bool {
        matches!(self, Protection::ReadWrite)
    }
}

#[derive(Debug, Clone)]
pub struct AddressSpace {
    base: usize,
    page_shift: u32,
    bytes: Vec<u8>,
    pages: Vec<Protection>,
    prefetches: Vec<usize>,
    max_loaded: Option<usize>,
}

impl AddressSpace {
    /// A zero-filled, read-write space of `len` bytes at `base` with
    /// [`PAGE_SIZE`] pages.
    pub fn new(base: usize, len: usize) -> Self {
        Self::with_page_size(base, len, PAGE_SIZE)
    }

    /// # Panics
    ///
    /// If `page_size` is not a power of two of at least one word, or `base` is
    /// not page-aligned.
    pub fn with_page_size(base: usize, len: usize, page_size: usize) -> Self {
        assert!(
            page_size.is_power_of_two() && page_size >= WORD,
            "page size {} must be a power of two of at least {}",
            page_size,
            WORD
        );
        assert_eq!(base % page_size, 0, "base {:#x} is not page-aligned", base);
        let pages = len.div_ceil(page_size);
        Self {
            base,
            page_shift: page_size.trailing_zeros(),
            bytes: vec![0; len],
            pages: vec![Protection::ReadWrite; pages],
            prefetches: Vec::new(),
            max_loaded: None,
        }
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Sets the protection of every page overlapping `[addr, addr + len)`.
    ///
    /// # Panics
    ///
    /// If the range is not inside the space.
    pub fn protect(&mut self, addr: usize, len: usize, prot: Protection) {
        if len == 0 {
            return;
        }
        assert!(
            self.contains(addr, len),
            "range {:#x}+{} outside the space",
            addr,
            len
        );
        let first = self.page_index(addr);
        let last = self.page_index(addr + len - 1);
        for page in &mut self.pages[first..=last] {
            *page = prot;
        }
    }

    /// Protection of the page holding `addr`, or `None` outside the space.
    pub fn protection(&self, addr: usize) -> Option<Protection> {
        let offset = addr.checked_sub(self.base)?;
        self.pages.get(offset >> self.page_shift).copied()
    }

    /// Copies `data` in at `addr`, ignoring page protection.
    ///
    /// # Panics
    ///
    /// If `[addr, addr + data.len())` is not inside the space.
    pub fn write(&mut self, addr: usize, data: &[u8]) {
        let i = addr - self.base;
        self.bytes[i..i + data.len()].copy_from_slice(data);
    }

    /// The bytes at `[addr, addr + len)`, ignoring page protection.
    ///
    /// # Panics
    ///
    /// If the range is not inside the space.
    pub fn read(&self, addr: usize, len: usize) -> &[u8] {
        let i = addr - self.base;
        &self.bytes[i..i + len]
    }

    /// Prefetch hints received so far, in issue order.
    pub fn prefetches(&self) -> &[usize] {
        &self.prefetches
    }

    pub fn clear_prefetches(&mut self) {
        self.prefetches.clear();
    }

    /// Highest address read by a successful load, if any.
    pub fn max_loaded(&self) -> Option<usize> {
        self.max_loaded
    }

    /// Whether `[addr, addr + len)` lies inside the space.
    pub fn contains(&self, addr: usize, len: usize) -> bool {
        addr >= self.base
            && addr - self.base <= self.len()
            && len <= self.len() - (addr - self.base)
    }

    #[inline]
    fn page_index(&self, addr: usize) -> usize {
        (addr - self.base) >> self.page_shift
    }

    /// Checks `[addr, addr + len)` against the page table and returns its
    /// offset into the backing buffer.
    #[inline]
    fn check(
        &self,
        addr: usize,
        len: usize,
        allowed: fn(Protection) -> bool,
        fault: fn(usize) -> Fault,
    ) -> Result<usize, Fault> {
        if !self.contains(addr, len) {
            return Err(fault(addr));
        }
        let offset = addr - self.base;
        let first = offset >> self.page_shift;
        let last = (offset + len - 1) >> self.page_shift;
        for page in first..=last {
            if !allowed(self.pages[page]) {
                return Err(fault(addr));
            }
        }
        Ok(offset)
    }

    #[inline]
    fn note_load(&mut self, last: usize) {
        self.max_loaded = Some(self.max_loaded.map_or(last, |m| m.max(last)));
    }
}

impl Source for AddressSpace {
    fn load_u8(&mut self, addr: usize) -> Result<u8, Fault> {
        let i = self.check(addr, 1, Protection::readable, Fault::load)?;
        self.note_load(addr);
        Ok(self.bytes[i])
    }

    fn load_word(&mut self, addr: usize) -> Result<Word, Fault> {
        let i = self.check(addr, WORD, Protection::readable, Fault::load)?;
        self.note_load(addr + WORD - 1);
        let b = &self.bytes[i..i + WORD];
        Ok(Word::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn prefetch(&mut self, addr: usize) {
        self.prefetches.push(addr);
    }
}

impl Sink for AddressSpace {
    fn store_u8(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        let i = self.check(addr, 1, Protection::writable, Fault::store)?;
        self.bytes[i] = value;
        Ok(())
    }

    fn store_word(&mut self, addr: usize, value: Word) -> Result<(), Fault> {
        let i = self.check(addr, WORD, Protection::writable, Fault::store)?;
        self.bytes[i..i + WORD].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

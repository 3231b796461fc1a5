//! fastcopy: a fault-tolerant block-copy engine.
//!
//! Copies between two memory regions, either of which may sit across a trust
//! boundary where accesses can fault. The engine picks a strategy from the
//! transfer size and the relative alignment of source and destination,
//! prefetches ahead of its read cursor, merges misaligned data with
//! shift-and-combine, and on a fault reports exactly how many bytes were not
//! copied so the caller can resume.
//!
//! The entry points here use [`DefaultProfile`]; [`engine::copy`] and
//! [`engine::try_copy`] take any [`Profile`] and any pair of memories.
//!
//! # Examples
//! ```
//! use fastcopy::space::{AddressSpace, Protection};
//!
//! let mut user = AddressSpace::with_page_size(0x10000, 256, 64);
//! user.write(0x10000, &[7u8; 256]);
//! user.protect(0x10080, 64, Protection::None);
//!
//! let mut buf = [0u8; 200];
//! let uncopied = fastcopy::copy_from_restricted(&mut buf, &mut user, 0x10000);
//! let copied = buf.len() - uncopied;
//! // Stops at or before the unmapped page, depending on how `buf` is aligned.
//! assert!(copied <= 128 && uncopied > 0);
//! assert!(buf[..copied].iter().all(|&b| b == 7));
//! ```

pub mod access;
pub mod align;
mod bulk;
pub mod engine;
pub mod fault;
mod merge;
mod prefetch;
pub mod profile;
pub mod resume;
pub mod space;
mod tail;

pub use access::{Sink, SliceSink, SliceSource, Source};
pub use align::AlignClass;
pub use engine::{Strategy, select};
pub use fault::{AccessKind, Fault, ShortCopy};
pub use profile::{DefaultProfile, Direction, LargeLine, NoPrefetch, Profile, SmallLine};
pub use resume::copy_resuming;

/// Copies `src` into `dst` between two local buffers.
///
/// Returns the number of bytes not copied, which is always 0 for local
/// memory.
///
/// # Panics
///
/// If the slices differ in length.
pub fn copy_forward(dst: &mut [u8], src: &[u8]) -> usize {
    #[inline(never)]
    #[cold]
    #[track_caller]
    fn len_mismatch_fail(dst_len: usize, src_len: usize) -> ! {
        panic!(
            "source slice length ({}) does not match destination slice length ({})",
            src_len, dst_len,
        );
    }

    if dst.len() != src.len() {
        len_mismatch_fail(dst.len(), src.len());
    }
    let n = src.len();
    let mut from = SliceSource::new(src);
    let mut to = SliceSink::new(dst);
    let (src_addr, dst_addr) = (from.addr(), to.addr());
    engine::copy::<DefaultProfile, _, _>(
        Direction::Forward,
        &mut to,
        dst_addr,
        &mut from,
        src_addr,
        n,
    )
}

/// Copies `n` bytes from `src` to `dst`.
///
/// # Safety
///
/// - `src` must be valid for reads of `n` bytes and `dst` for writes of `n`
///   bytes
/// - The regions must not overlap
pub unsafe fn copy_forward_raw(dst: *mut u8, src: *const u8, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    // SAFETY: the caller guarantees both ranges are valid and disjoint.
    let (dst, src) = unsafe {
        (
            core::slice::from_raw_parts_mut(dst, n),
            core::slice::from_raw_parts(src, n),
        )
    };
    copy_forward(dst, src)
}

/// Fills `dst` from address `src` in a restricted region.
///
/// Returns the number of bytes of `dst` left unfilled because `from` faulted;
/// `dst[..dst.len() - uncopied]` holds the copied prefix.
pub fn copy_from_restricted<R>(dst: &mut [u8], from: &mut R, src: usize) -> usize
where
    R: Source + ?Sized,
{
    let n = dst.len();
    let mut to = SliceSink::new(dst);
    let dst_addr = to.addr();
    engine::copy::<DefaultProfile, _, _>(Direction::FromRestricted, &mut to, dst_addr, from, src, n)
}

/// Copies `src` to address `dst` in a restricted region.
///
/// Returns the number of trailing bytes of `src` not copied because `to`
/// faulted.
pub fn copy_to_restricted<R>(to: &mut R, dst: usize, src: &[u8]) -> usize
where
    R: Sink + ?Sized,
{
    let n = src.len();
    let mut from = SliceSource::new(src);
    let src_addr = from.addr();
    engine::copy::<DefaultProfile, _, _>(Direction::ToRestricted, to, dst, &mut from, src_addr, n)
}

//! Build-time tuning profiles.
//!
//! Every tunable the engine consults is an associated constant of a
//! [`Profile`], so a profile is fixed at compile time and each combination is
//! a separately testable configuration. [`DefaultProfile`] is what the
//! crate-level entry points use.

use crate::align::WORD;

/// Upper bound on `Profile::UNIT_WORDS`; sizes the scratch word buffers.
pub const MAX_UNIT_WORDS: usize = 8;

/// Which side of the copy, if any, lies across the trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Both sides are local memory.
    Forward,
    /// The source is the restricted region.
    FromRestricted,
    /// The destination is the restricted region.
    ToRestricted,
}

impl Direction {
    /// Largest jointly word-aligned request that takes the aligned fast path.
    #[inline(always)]
    pub fn fast_threshold<P: Profile + ?Sized>(self) -> usize {
        match self {
            Direction::Forward => P::FAST_THRESHOLD_FORWARD,
            Direction::FromRestricted => P::FAST_THRESHOLD_FROM,
            Direction::ToRestricted => P::FAST_THRESHOLD_TO,
        }
    }

    /// Whether the bulk mover first aligns the destination to `WRITE_ALIGN`.
    #[inline(always)]
    pub fn write_align<P: Profile + ?Sized>(self) -> bool {
        match self {
            Direction::Forward => P::WRITE_ALIGN_FORWARD,
            Direction::FromRestricted => P::WRITE_ALIGN_FROM,
            Direction::ToRestricted => P::WRITE_ALIGN_TO,
        }
    }
}

/// Compile-time tunables of the copy engine.
pub trait Profile {
    const NAME: &'static str;

    /// Cache line size in bytes (32 or 64).
    const CACHE_LINE: usize;

    /// Words moved per aligned bulk iteration.
    const UNIT_WORDS: usize;

    /// Bytes moved per aligned bulk iteration.
    const UNIT_BYTES: usize = Self::UNIT_WORDS * WORD;

    /// Whether prefetch hints are issued at all.
    const PREFETCH: bool;

    /// How many cache lines the prefetch lead runs ahead of the read cursor.
    const PREFETCH_DISTANCE: usize;

    /// Destination boundary the write aligner targets (8, 16 or 32).
    const WRITE_ALIGN: usize;

    /// Requests up to this length are always copied byte by byte.
    const SMALL_THRESHOLD: usize = 7;

    const FAST_THRESHOLD_FORWARD: usize;
    const FAST_THRESHOLD_FROM: usize;
    const FAST_THRESHOLD_TO: usize;

    const WRITE_ALIGN_FORWARD: bool;
    // Measured never to pay off across the trust boundary.
    const WRITE_ALIGN_FROM: bool = false;
    const WRITE_ALIGN_TO: bool = false;
}

/// 64-byte cache lines, 8-word bulk units.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargeLine;

impl Profile for LargeLine {
    const NAME: &'static str = "large-line";
    const CACHE_LINE: usize = 64;
    const UNIT_WORDS: usize = 8;
    const PREFETCH: bool = true;
    const PREFETCH_DISTANCE: usize = 3;
    const WRITE_ALIGN: usize = 32;
    const FAST_THRESHOLD_FORWARD: usize = 32;
    const FAST_THRESHOLD_FROM: usize = 64;
    const FAST_THRESHOLD_TO: usize = 64;
    const WRITE_ALIGN_FORWARD: bool = true;
}

/// 32-byte cache lines, 4-word bulk units.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallLine;

impl Profile for SmallLine {
    const NAME: &'static str = "small-line";
    const CACHE_LINE: usize = 32;
    const UNIT_WORDS: usize = 4;
    const PREFETCH: bool = true;
    const PREFETCH_DISTANCE: usize = 3;
    const WRITE_ALIGN: usize = 16;
    const FAST_THRESHOLD_FORWARD: usize = 16;
    const FAST_THRESHOLD_FROM: usize = 32;
    const FAST_THRESHOLD_TO: usize = 32;
    const WRITE_ALIGN_FORWARD: bool = true;
}

/// For cores without a usable prefetch instruction: no hints, no write
/// alignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrefetch;

impl Profile for NoPrefetch {
    const NAME: &'static str = "no-prefetch";
    const CACHE_LINE: usize = 64;
    const UNIT_WORDS: usize = 8;
    const PREFETCH: bool = false;
    const PREFETCH_DISTANCE: usize = 0;
    const WRITE_ALIGN: usize = 8;
    const FAST_THRESHOLD_FORWARD: usize = 32;
    const FAST_THRESHOLD_FROM: usize = 64;
    const FAST_THRESHOLD_TO: usize = 64;
    const WRITE_ALIGN_FORWARD: bool = false;
}

#[cfg(not(feature = "small-cache-line"))]
pub type DefaultProfile = LargeLine;

#[cfg(feature = "small-cache-line")]
pub type DefaultProfile = SmallLine;

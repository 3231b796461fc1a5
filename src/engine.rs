//! Path selection and the generic copy entry points.
//!
//! A request is dispatched to exactly one strategy before any byte moves:
//!
//! - `n <= SMALL_THRESHOLD`: byte by byte, whatever the alignment.
//! - `n <= fast threshold` for the direction, both pointers word-aligned:
//!   paired word transfers, no prefetch and no write alignment.
//! - otherwise the general path: align the destination to a word with byte
//!   copies, then the aligned bulk mover or the misaligned merger depending on
//!   the alignment class.
//!
//! Short transfers are latency-bound and long ones bandwidth-bound; the
//! thresholds are the crossover points and come from the [`Profile`].

use crate::access::{Sink, Source};
use crate::align::{AlignClass, WORD, bytes_to_boundary, is_word_aligned};
use crate::bulk::copy_aligned;
use crate::fault::{Cursor, Fault, ShortCopy};
use crate::merge::copy_misaligned;
use crate::profile::{Direction, Profile};
use crate::tail::{copy_bytes, copy_tail};

/// The execution strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Byte-wise copy of a short request.
    Small,
    /// Paired word transfers for short, jointly word-aligned requests.
    AlignedFast,
    /// General path into the aligned bulk mover.
    Bulk,
    /// General path into the misaligned merger. Never carries
    /// `AlignClass::Aligned`.
    Merge(AlignClass),
}

/// Chooses the strategy for copying `n` bytes from `src` to `dst`.
///
/// Pure: depends only on its arguments and the profile's constants.
#[inline]
pub fn select<P: Profile>(dir: Direction, dst: usize, src: usize, n: usize) -> Strategy {
    if n <= P::SMALL_THRESHOLD {
        return Strategy::Small;
    }
    if n <= dir.fast_threshold::<P>() && is_word_aligned(src | dst) {
        return Strategy::AlignedFast;
    }
    match AlignClass::classify(dst, src) {
        AlignClass::Aligned => Strategy::Bulk,
        skewed => Strategy::Merge(skewed),
    }
}

/// Copies `n` bytes from `src` in `from` to `dst` in `to`.
///
/// On a fault the copy stops and the returned [`ShortCopy`] says how many
/// bytes were durably stored; calling again from `src + copied` to
/// `dst + copied` for the remaining bytes completes the transfer.
pub fn try_copy<P, S, D>(
    dir: Direction,
    to: &mut D,
    dst: usize,
    from: &mut S,
    src: usize,
    n: usize,
) -> Result<(), ShortCopy>
where
    P: Profile,
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    let strategy = select::<P>(dir, dst, src, n);
    let mut cur = Cursor::new(dst, src, n);
    match run::<P, S, D>(strategy, dir, &mut cur, from, to) {
        Ok(()) => Ok(()),
        Err(fault) => Err(cur.unwind(fault)),
    }
}

/// Like [`try_copy`], returning the number of bytes not copied.
#[inline]
pub fn copy<P, S, D>(
    dir: Direction,
    to: &mut D,
    dst: usize,
    from: &mut S,
    src: usize,
    n: usize,
) -> usize
where
    P: Profile,
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    match try_copy::<P, S, D>(dir, to, dst, from, src, n) {
        Ok(()) => 0,
        Err(short) => short.uncopied(),
    }
}

fn run<P, S, D>(
    strategy: Strategy,
    dir: Direction,
    cur: &mut Cursor,
    from: &mut S,
    to: &mut D,
) -> Result<(), Fault>
where
    P: Profile,
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    match strategy {
        Strategy::Small => copy_bytes(cur, from, to, cur.remaining),
        Strategy::AlignedFast => copy_pairs(cur, from, to),
        Strategy::Bulk | Strategy::Merge(_) => {
            let lead = bytes_to_boundary(cur.dst, WORD).min(cur.remaining);
            copy_bytes(cur, from, to, lead)?;
            match AlignClass::classify(cur.dst, cur.src).shifts() {
                None => copy_aligned::<P, S, D>(dir, cur, from, to),
                Some((pull, push)) => copy_misaligned::<P, S, D>(cur, from, to, pull, push),
            }
        }
    }
}

/// Aligned fast path: two words per step, each committed as it lands.
#[inline]
fn copy_pairs<S, D>(cur: &mut Cursor, from: &mut S, to: &mut D) -> Result<(), Fault>
where
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    while cur.remaining >= 2 * WORD {
        let a = from.load_word(cur.src)?;
        let b = from.load_word(cur.src + WORD)?;
        to.store_word(cur.dst, a)?;
        cur.commit(WORD);
        to.store_word(cur.dst, b)?;
        cur.commit(WORD);
    }
    copy_tail(cur, from, to)
}

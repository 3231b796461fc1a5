//! Aligned bulk mover and write aligner.
//!
//! Runs once both cursors are word-aligned. Each iteration loads a full unit
//! (`UNIT_WORDS` words) into scratch, stores it, and only then commits it, so
//! a fault anywhere inside a unit leaves the cursor at the unit's start.

use crate::access::{Sink, Source};
use crate::align::{WORD, Word, bytes_to_boundary, is_word_aligned};
use crate::fault::{Cursor, Fault};
use crate::prefetch::Prefetcher;
use crate::profile::{Direction, MAX_UNIT_WORDS, Profile};
use crate::tail::copy_tail;

pub(crate) fn copy_aligned<P, S, D>(
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
    debug_assert!(is_word_aligned(cur.src) && is_word_aligned(cur.dst));

    if dir.write_align::<P>() {
        align_writes::<P, S, D>(cur, from, to)?;
    }

    let end = cur.src + cur.remaining;
    let mut pf = Prefetcher::<P>::start(from, cur.src, end);
    let mut scratch: [Word; MAX_UNIT_WORDS] = [0; MAX_UNIT_WORDS];
    let unit = &mut scratch[..P::UNIT_WORDS];

    while cur.remaining >= P::UNIT_BYTES {
        pf.advance(from, cur.src);
        for (i, w) in unit.iter_mut().enumerate() {
            *w = from.load_word(cur.src + i * WORD)?;
        }
        for (i, &w) in unit.iter().enumerate() {
            to.store_word(cur.dst + i * WORD, w)?;
        }
        cur.commit(P::UNIT_BYTES);
    }

    copy_tail(cur, from, to)
}

/// Copies single words until the destination reaches `WRITE_ALIGN`, when
/// enough is left for the aligned stores to pay for it.
#[inline]
fn align_writes<P, S, D>(cur: &mut Cursor, from: &mut S, to: &mut D) -> Result<(), Fault>
where
    P: Profile,
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    let skip = bytes_to_boundary(cur.dst, P::WRITE_ALIGN);
    if skip == 0 || cur.remaining < skip + P::UNIT_BYTES {
        return Ok(());
    }
    for _ in 0..skip / WORD {
        let w = from.load_word(cur.src)?;
        to.store_word(cur.dst, w)?;
        cur.commit(WORD);
    }
    Ok(())
}

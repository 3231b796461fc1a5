//! Tail handler: the common exit of every path.
//!
//! Copies what is left after a bulk or merge loop (normally fewer than 32
//! bytes) using decreasing transfer widths: groups of four, two and one words
//! while both cursors are word-aligned, then single bytes. Each store is
//! committed as soon as it lands, so a fault here is reported exactly.

use crate::access::{Sink, Source};
use crate::align::{WORD, Word, is_word_aligned};
use crate::fault::{Cursor, Fault};

/// Copies all remaining bytes of `cur`.
#[inline]
pub(crate) fn copy_tail<S, D>(cur: &mut Cursor, from: &mut S, to: &mut D) -> Result<(), Fault>
where
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    if is_word_aligned(cur.src) && is_word_aligned(cur.dst) {
        while cur.remaining >= 4 * WORD {
            copy_word_group::<4, _, _>(cur, from, to)?;
        }
        if cur.remaining >= 2 * WORD {
            copy_word_group::<2, _, _>(cur, from, to)?;
        }
        if cur.remaining >= WORD {
            copy_word_group::<1, _, _>(cur, from, to)?;
        }
    }
    copy_bytes(cur, from, to, cur.remaining)
}

/// Copies `len` bytes one at a time. Also the small path for short requests.
#[inline]
pub(crate) fn copy_bytes<S, D>(
    cur: &mut Cursor,
    from: &mut S,
    to: &mut D,
    len: usize,
) -> Result<(), Fault>
where
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    debug_assert!(len <= cur.remaining);
    for _ in 0..len {
        let b = from.load_u8(cur.src)?;
        to.store_u8(cur.dst, b)?;
        cur.commit(1);
    }
    Ok(())
}

#[inline(always)]
fn copy_word_group<const N: usize, S, D>(
    cur: &mut Cursor,
    from: &mut S,
    to: &mut D,
) -> Result<(), Fault>
where
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    let mut group: [Word; N] = [0; N];
    for (i, w) in group.iter_mut().enumerate() {
        *w = from.load_word(cur.src + i * WORD)?;
    }
    for w in group {
        to.store_word(cur.dst, w)?;
        cur.commit(WORD);
    }
    Ok(())
}

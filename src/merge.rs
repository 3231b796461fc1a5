//! Misaligned merger.
//!
//! Used when source and destination are skewed by `k` bytes (1..=3) modulo
//! the word size. The destination has already been word-aligned, so the
//! source sits `k` bytes into its word. Output words are assembled from pairs
//! of adjacent aligned source words:
//!
//! ```text
//! out = (earlier >> pull) | (later << push)     pull = 8k, push = 32 - 8k
//! ```
//!
//! The last source word of each step is carried into the next one, making
//! this a sliding window over the source. The window is primed with byte loads
//! of the `WORD - k` bytes up to the source's next word boundary, and a new
//! aligned word is only loaded when it lies entirely inside the request, so
//! nothing outside `[src, src + n)` is ever read.

use crate::access::{Sink, Source};
use crate::align::{WORD, Word, is_word_aligned, merge_word};
use crate::fault::{Cursor, Fault};
use crate::prefetch::Prefetcher;
use crate::profile::Profile;
use crate::tail::copy_tail;

/// Words stored per merge block (32 bytes).
pub(crate) const BLOCK_WORDS: usize = 8;

const BLOCK_BYTES: usize = BLOCK_WORDS * WORD;

pub(crate) fn copy_misaligned<P, S, D>(
    cur: &mut Cursor,
    from: &mut S,
    to: &mut D,
    pull: u32,
    push: u32,
) -> Result<(), Fault>
where
    P: Profile,
    S: Source + ?Sized,
    D: Sink + ?Sized,
{
    debug_assert!(is_word_aligned(cur.dst));
    let skew = cur.src & (WORD - 1);
    debug_assert_eq!(8 * skew as u32, pull);

    // Bytes of the carry word that still belong to the output.
    let lead = WORD - skew;
    if cur.remaining < WORD + lead {
        return copy_tail(cur, from, to);
    }

    let mut carry: Word = 0;
    for i in 0..lead {
        carry |= Word::from(from.load_u8(cur.src + i)?) << (8 * (skew + i));
    }

    let end = cur.src + cur.remaining;
    let mut pf = Prefetcher::<P>::start(from, cur.src, end);
    let mut loaded: [Word; BLOCK_WORDS] = [0; BLOCK_WORDS];
    let mut merged: [Word; BLOCK_WORDS] = [0; BLOCK_WORDS];

    while cur.remaining >= BLOCK_BYTES + lead {
        pf.advance(from, cur.src);
        // Two 4-word groups starting at the source's next word boundary.
        let next = cur.src + lead;
        for (i, w) in loaded[..4].iter_mut().enumerate() {
            *w = from.load_word(next + i * WORD)?;
        }
        for (i, w) in loaded[4..].iter_mut().enumerate() {
            *w = from.load_word(next + (4 + i) * WORD)?;
        }

        let mut earlier = carry;
        for (out, &later) in merged.iter_mut().zip(loaded.iter()) {
            *out = merge_word(earlier, later, pull, push);
            earlier = later;
        }
        for (i, &w) in merged.iter().enumerate() {
            to.store_word(cur.dst + i * WORD, w)?;
        }
        carry = earlier;
        cur.commit(BLOCK_BYTES);
    }

    while cur.remaining >= WORD + lead {
        let later = from.load_word(cur.src + lead)?;
        to.store_word(cur.dst, merge_word(carry, later, pull, push))?;
        carry = later;
        cur.commit(WORD);
    }

    copy_tail(cur, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignClass;
    use crate::profile::{LargeLine, SmallLine};
    use crate::space::{AddressSpace, Protection};

    const SRC: usize = 0x30_0000;
    const DST: usize = 0x50_0000;

    fn source(len: usize, page_size: usize) -> AddressSpace {
        let mut src = AddressSpace::with_page_size(SRC, len, page_size);
        let data: Vec<u8> = (0..len).map(|i| (i * 13 % 251) as u8).collect();
        src.write(SRC, &data);
        src
    }

    fn run<P: Profile>(
        cur: &mut Cursor,
        src: &mut AddressSpace,
        dst: &mut AddressSpace,
    ) -> Result<(), Fault> {
        let (pull, push) = AlignClass::classify(cur.dst, cur.src).shifts().unwrap();
        copy_misaligned::<P, _, _>(cur, src, dst, pull, push)
    }

    #[test]
    fn test_merge_all_skews_and_lengths() {
        for skew in 1..WORD {
            for len in 0..200 {
                for dst_off in [0, 4, 32] {
                    let mut src = source(512, 4096);
                    let mut dst = AddressSpace::new(DST, 512);
                    let src_addr = SRC + 8 + skew;
                    let mut cur = Cursor::new(DST + dst_off, src_addr, len);
                    run::<LargeLine>(&mut cur, &mut src, &mut dst).unwrap();
                    assert_eq!(cur.remaining, 0);
                    assert_eq!(
                        dst.read(DST + dst_off, len),
                        src.read(src_addr, len),
                        "skew {} len {} dst_off {}",
                        skew,
                        len,
                        dst_off
                    );
                    assert!(dst.read(DST + dst_off + len, 4).iter().all(|&b| b == 0));
                }
            }
        }
    }

    #[test]
    fn test_merge_never_reads_outside_request() {
        // Pages on both sides of the request are inaccessible; the copy must
        // still succeed for every skew.
        for skew in 1..WORD {
            for len in [5, 8, 36, 100, 131] {
                let mut src = source(1024, 16);
                let src_addr = SRC + 256 + skew;
                src.protect(SRC, 256, Protection::None);
                let after = src_addr + len;
                let guard = (after + 15) & !15;
                src.protect(guard, SRC + 1024 - guard, Protection::None);
                // Bytes between the end and the next page stay readable, so
                // also check no load goes past `after`.
                let mut dst = AddressSpace::new(DST, 256);
                let mut cur = Cursor::new(DST, src_addr, len);
                run::<SmallLine>(&mut cur, &mut src, &mut dst).unwrap();
                assert_eq!(dst.read(DST, len), src.read(src_addr, len));
                assert!(src.max_loaded().unwrap() < after, "skew {} len {}", skew, len);
            }
        }
    }

    #[test]
    fn test_merge_fault_rolls_back_to_block() {
        let mut src = source(512, 32);
        // Source skew 1; fault on the aligned page at SRC+64.
        src.protect(SRC + 64, 32, Protection::None);
        let mut dst = AddressSpace::new(DST, 512);
        let mut cur = Cursor::new(DST, SRC + 1, 200);
        let fault = run::<LargeLine>(&mut cur, &mut src, &mut dst).unwrap_err();
        assert_eq!(fault, Fault::load(SRC + 64));
        // The second block loads SRC+36..SRC+68; only the first one landed.
        assert_eq!(cur.copied(), 32);
        assert_eq!(dst.read(DST, 32), src.read(SRC + 1, 32));

        src.protect(SRC + 64, 32, Protection::ReadWrite);
        let copied = cur.copied();
        let mut resume = Cursor::new(DST + copied, SRC + 1 + copied, 200 - copied);
        run::<LargeLine>(&mut resume, &mut src, &mut dst).unwrap();
        assert_eq!(dst.read(DST, 200), src.read(SRC + 1, 200));
    }
}

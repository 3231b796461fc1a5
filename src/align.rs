//! Alignment classification for a copy request.
//!
//! The engine moves data in 32-bit words. A request is classified by the skew
//! between source and destination modulo the word size; the skew alone decides
//! whether the aligned bulk mover or the misaligned merger runs, and which
//! shift pair the merger uses.

/// Transfer word.
pub type Word = u32;

/// Width of a transfer word in bytes.
pub const WORD: usize = core::mem::size_of::<Word>();

/// Width of a transfer word in bits.
pub const WORD_BITS: u32 = Word::BITS;

/// Relative alignment of source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignClass {
    /// `src - dst` is a multiple of the word size.
    Aligned,
    /// Source sits one byte further into its word than the destination.
    Skew1,
    /// Two bytes of skew.
    Skew2,
    /// Three bytes of skew.
    Skew3,
}

impl AlignClass {
    /// Classifies a request by `(src - dst) mod WORD`.
    #[inline(always)]
    pub const fn classify(dst: usize, src: usize) -> Self {
        match src.wrapping_sub(dst) & (WORD - 1) {
            0 => AlignClass::Aligned,
            1 => AlignClass::Skew1,
            2 => AlignClass::Skew2,
            _ => AlignClass::Skew3,
        }
    }

    /// Byte skew in `0..WORD`.
    #[inline(always)]
    pub const fn skew(self) -> usize {
        match self {
            AlignClass::Aligned => 0,
            AlignClass::Skew1 => 1,
            AlignClass::Skew2 => 2,
            AlignClass::Skew3 => 3,
        }
    }

    /// The `(pull, push)` shift pair used to merge two adjacent source words,
    /// or `None` for the aligned class, which needs no merge.
    ///
    /// `pull + push == WORD_BITS` for every skewed class.
    #[inline(always)]
    pub const fn shifts(self) -> Option<(u32, u32)> {
        match self {
            AlignClass::Aligned => None,
            skewed => {
                let pull = 8 * skewed.skew() as u32;
                Some((pull, WORD_BITS - pull))
            }
        }
    }
}

/// Builds one output word from two adjacent source words.
///
/// `earlier` holds the low-address bytes, `later` the high-address bytes.
#[inline(always)]
pub const fn merge_word(earlier: Word, later: Word, pull: u32, push: u32) -> Word {
    debug_assert!(pull > 0 && push > 0 && pull + push == WORD_BITS);
    (earlier >> pull) | (later << push)
}

#[inline(always)]
pub const fn is_word_aligned(addr: usize) -> bool {
    addr & (WORD - 1) == 0
}

/// Number of bytes from `addr` up to the next multiple of `align`.
///
/// `align` must be a power of two.
#[inline(always)]
pub const fn bytes_to_boundary(addr: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    addr.wrapping_neg() & (align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_all_offsets() {
        let expected = [
            AlignClass::Aligned,
            AlignClass::Skew1,
            AlignClass::Skew2,
            AlignClass::Skew3,
        ];
        for dst_off in 0..WORD {
            for src_off in 0..WORD {
                let dst = 0x1000 + dst_off;
                let src = 0x8000 + src_off;
                let class = AlignClass::classify(dst, src);
                assert_eq!(class, expected[(src_off + WORD - dst_off) % WORD]);
                // Pure: same inputs, same class and shift pair.
                assert_eq!(class, AlignClass::classify(dst, src));
                assert_eq!(class.shifts(), AlignClass::classify(dst, src).shifts());
            }
        }
    }

    #[test]
    fn test_classify_wraps_when_src_below_dst() {
        assert_eq!(AlignClass::classify(0x1003, 0x0000), AlignClass::Skew1);
        assert_eq!(AlignClass::classify(0x1001, 0x0000), AlignClass::Skew3);
    }

    #[test]
    fn test_shift_pairs() {
        assert_eq!(AlignClass::Aligned.shifts(), None);
        assert_eq!(AlignClass::Skew1.shifts(), Some((8, 24)));
        assert_eq!(AlignClass::Skew2.shifts(), Some((16, 16)));
        assert_eq!(AlignClass::Skew3.shifts(), Some((24, 8)));
    }

    #[test]
    fn test_merge_word_reassembles_bytes() {
        let bytes: [u8; 8] = [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];
        let earlier = Word::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let later = Word::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        for class in [AlignClass::Skew1, AlignClass::Skew2, AlignClass::Skew3] {
            let (pull, push) = class.shifts().unwrap();
            assert_eq!(pull + push, WORD_BITS);
            let k = class.skew();
            let merged = merge_word(earlier, later, pull, push);
            let want = Word::from_le_bytes([bytes[k], bytes[k + 1], bytes[k + 2], bytes[k + 3]]);
            assert_eq!(merged, want, "skew {}", k);
            assert_eq!(merged, (earlier >> pull) | (later << push));
        }
    }

    #[test]
    fn test_bytes_to_boundary() {
        assert_eq!(bytes_to_boundary(0x1000, 32), 0);
        assert_eq!(bytes_to_boundary(0x1001, 32), 31);
        assert_eq!(bytes_to_boundary(0x101c, 32), 4);
        assert_eq!(bytes_to_boundary(0x1003, 4), 1);
        assert!(is_word_aligned(0x1004));
        assert!(!is_word_aligned(0x1006));
    }
}

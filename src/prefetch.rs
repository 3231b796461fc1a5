//! Prefetch scheduling for the bulk and merge loops.
//!
//! The scheduler keeps a lead of `PREFETCH_DISTANCE` cache lines ahead of the
//! line the loop is reading. On entry it prefetches the first two lines and
//! then catches up one line at a time until the lead is established, wherever
//! inside a line the copy starts. Inside the loop it issues at most one more
//! line per iteration, always exactly one line past the current lead.
//!
//! Hints are only issued for lines that start before the end of the source
//! range, so they are strictly increasing and bounded by the request.

use core::marker::PhantomData;

use crate::access::Source;
use crate::profile::Profile;

#[derive(Debug)]
pub(crate) struct Prefetcher<P> {
    /// Next line to prefetch; always line-aligned.
    next: usize,
    /// End of the source range.
    end: usize,
    _profile: PhantomData<P>,
}

impl<P: Profile> Prefetcher<P> {
    /// Starts scheduling for a read cursor at `cursor` over `[cursor, end)`.
    #[inline]
    pub fn start<S: Source + ?Sized>(from: &mut S, cursor: usize, end: usize) -> Self {
        if !P::PREFETCH {
            return Self {
                next: end,
                end,
                _profile: PhantomData,
            };
        }
        let mut pf = Self {
            next: line_of::<P>(cursor),
            end,
            _profile: PhantomData,
        };
        pf.issue(from);
        pf.issue(from);
        pf.catch_up(from, cursor);
        pf
    }

    /// Walks the lead forward until it is `PREFETCH_DISTANCE` lines ahead.
    #[inline]
    pub fn catch_up<S: Source + ?Sized>(&mut self, from: &mut S, cursor: usize) {
        while self.behind(cursor) {
            self.issue(from);
        }
    }

    /// Per-iteration step of the loop whose read cursor is at `cursor`.
    ///
    /// Issues one line whenever the lead has dropped to `PREFETCH_DISTANCE`
    /// lines, which is once every `CACHE_LINE / UNIT_BYTES` iterations.
    #[inline(always)]
    pub fn advance<S: Source + ?Sized>(&mut self, from: &mut S, cursor: usize) {
        if self.behind(cursor) {
            self.issue(from);
        }
    }

    #[inline(always)]
    fn behind(&self, cursor: usize) -> bool {
        let target = line_of::<P>(cursor).saturating_add(P::PREFETCH_DISTANCE * P::CACHE_LINE);
        self.next < self.end && self.next <= target
    }

    #[inline(always)]
    fn issue<S: Source + ?Sized>(&mut self, from: &mut S) {
        if self.next < self.end {
            from.prefetch(self.next);
        }
        self.next = self.next.saturating_add(P::CACHE_LINE);
    }
}

#[inline(always)]
fn line_of<P: Profile>(addr: usize) -> usize {
    addr & !(P::CACHE_LINE - 1)
}

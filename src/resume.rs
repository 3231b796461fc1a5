//! Resuming short copies.
//!
//! The engine never retries: a fault ends the call with the exact resume
//! point. [`copy_resuming`] is the caller-side loop on top of it. After each
//! fault it hands the fault to a fixup (for example, paging in the missing
//! page) and, if the fixup reports success, continues from the updated
//! pointers.

use crate::access::{Sink, Source};
use crate::engine::try_copy;
use crate::fault::{Fault, ShortCopy};
use crate::profile::{Direction, Profile};

/// Copies `n` bytes, calling `fixup` on every fault and resuming while it
/// returns `true`.
///
/// Gives up with the accumulated [`ShortCopy`] when `fixup` returns `false`,
/// or when the same fault recurs without any progress in between.
pub fn copy_resuming<P, S, D, F>(
    dir: Direction,
    to: &mut D,
    dst: usize,
    from: &mut S,
    src: usize,
    n: usize,
    mut fixup: F,
) -> Result<(), ShortCopy>
where
    P: Profile,
    S: Source + ?Sized,
    D: Sink + ?Sized,
    F: FnMut(&Fault, &mut S, &mut D) -> bool,
{
    let mut copied = 0;
    let mut last: Option<Fault> = None;
    loop {
        let result = try_copy::<P, S, D>(dir, to, dst + copied, from, src + copied, n - copied);
        let short = match result {
            Ok(()) => return Ok(()),
            Err(short) => short,
        };
        log::trace!("{}", short);
        copied += short.copied;
        let stuck = short.copied == 0 && last == Some(short.fault);
        let total = ShortCopy {
            requested: n,
            copied,
            fault: short.fault,
        };
        if stuck {
            log::warn!("fixup made no progress, giving up: {}", total);
            return Err(total);
        }
        log::debug!("resuming after {}", total);
        if !fixup(&short.fault, from, to) {
            return Err(total);
        }
        last = Some(short.fault);
    }
}

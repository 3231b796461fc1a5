//! Access faults and the short-copy record.
//!
//! Every load and store in the engine returns `Result<_, Fault>`. The copy
//! cursor only advances at commit points, after the stores of a transfer unit
//! have all succeeded, so when a fault propagates out of a path the cursor
//! still describes exactly what has been durably stored. Loaded-but-unstored
//! words live in stack locals of the faulting loop and are dropped unwritten.

use thiserror::Error;

/// Whether a faulting access was a load or a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Load,
    Store,
}

/// An access to memory the caller is not permitted to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("{kind:?} fault at {addr:#x}")]
pub struct Fault {
    pub addr: usize,
    pub kind: AccessKind,
}

impl Fault {
    #[inline]
    pub const fn load(addr: usize) -> Self {
        Self {
            addr,
            kind: AccessKind::Load,
        }
    }

    #[inline]
    pub const fn store(addr: usize) -> Self {
        Self {
            addr,
            kind: AccessKind::Store,
        }
    }
}

/// A copy that stopped at a fault.
///
/// `copied` counts bytes durably stored at the destination before the fault:
/// exact to the byte on the small, fast and tail paths, and rounded down to
/// the last committed unit inside the bulk and merge loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("short copy: {copied} of {requested} bytes copied ({fault})")]
pub struct ShortCopy {
    pub requested: usize,
    pub copied: usize,
    pub fault: Fault,
}

impl ShortCopy {
    /// Bytes not copied; the value the `copy*` entry points return.
    #[inline]
    pub const fn uncopied(&self) -> usize {
        self.requested - self.copied
    }
}

/// Mutable state of one in-flight copy.
#[derive(Debug)]
pub(crate) struct Cursor {
    pub src: usize,
    pub dst: usize,
    pub remaining: usize,
    requested: usize,
}

impl Cursor {
    pub fn new(dst: usize, src: usize, len: usize) -> Self {
        Self {
            src,
            dst,
            remaining: len,
            requested: len,
        }
    }

    /// Marks `bytes` more as durably stored.
    #[inline(always)]
    pub fn commit(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.remaining);
        self.src += bytes;
        self.dst += bytes;
        self.remaining -= bytes;
    }

    #[inline]
    pub fn copied(&self) -> usize {
        self.requested - self.remaining
    }

    /// Fault exit: turns the cursor into the record handed back to the caller.
    #[cold]
    #[inline(never)]
    pub fn unwind(self, fault: Fault) -> ShortCopy {
        ShortCopy {
            requested: self.requested,
            copied: self.copied(),
            fault,
        }
    }
}

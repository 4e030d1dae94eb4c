//! Alignment arithmetic and the "does this range fit" predicate.
//!
//! All pointer math for the stack lives here. Addresses are plain `usize`
//! values; the arena turns offsets back into pointers derived from its base so
//! provenance is never reconstructed from an integer.

use crate::error::{StackError, StackResult};

/// Returns `Ok` if `align` is a non-zero power of two.
#[inline]
pub fn check_alignment(align: usize) -> StackResult<()> {
    if align.is_power_of_two() {
        Ok(())
    } else {
        Err(StackError::InvalidAlignment { align })
    }
}

/// Rounds `addr` up to the next multiple of `align`.
///
/// `align` must be a power of two. Returns `None` on address-space overflow.
#[inline]
pub fn align_up(addr: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    addr.checked_add(mask).map(|v| v & !mask)
}

/// Total byte length of `count` elements of `elem_size` bytes.
#[inline]
pub fn byte_len(count: usize, elem_size: usize) -> StackResult<usize> {
    count
        .checked_mul(elem_size)
        .ok_or(StackError::SizeOverflow { count, elem_size })
}

/// Offsets `[start, end)` relative to a region base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A borrowed address range `[base, base + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    base: usize,
    len: usize,
}

impl Region {
    pub fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Places `bytes` bytes at the first `align`-aligned address at or after
    /// offset `from`. Alignment is computed on absolute addresses, so an
    /// unaligned base is handled correctly.
    pub fn fit(&self, from: usize, bytes: usize, align: usize) -> StackResult<Span> {
        check_alignment(align)?;
        let available = self.len.saturating_sub(from);
        let out_of_space = StackError::OutOfSpace {
            requested: bytes,
            available,
        };

        if self.base == 0 || from > self.len {
            return Err(out_of_space);
        }

        let addr = self.base + from;
        let aligned = align_up(addr, align).ok_or_else(|| out_of_space.clone())?;
        let start = aligned - self.base;
        let end = start.checked_add(bytes).ok_or_else(|| out_of_space.clone())?;

        if end > self.len {
            return Err(out_of_space);
        }
        Ok(Span { start, end })
    }

    /// Converts an absolute address into an offset, if it lies in `[base, base + len]`.
    pub fn offset_of(&self, addr: usize) -> Option<usize> {
        if self.base == 0 {
            return None;
        }
        let offset = addr.checked_sub(self.base)?;
        (offset <= self.len).then_some(offset)
    }
}

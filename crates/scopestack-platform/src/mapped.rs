//! Anonymous memory-mapped backing buffer.
//!
//! Pages are committed lazily by the OS, so a large mapped stack only costs
//! what the thread actually touches.

use memmap2::{MmapMut, MmapOptions};

use scopestack_core::{StackError, StackResult};

use crate::{Backing, BackingBuffer};

/// Private anonymous mapping, unmapped on drop.
#[derive(Debug)]
pub struct MappedBuffer {
    mmap: MmapMut,
}

impl MappedBuffer {
    /// Maps `capacity` zero-filled bytes.
    pub fn new(capacity: usize) -> StackResult<Self> {
        if capacity == 0 {
            return Err(StackError::InvalidCapacity);
        }
        let mmap = MmapMut::map_anon(capacity).map_err(|e| StackError::MmapFailed(e.to_string()))?;
        Ok(Self { mmap })
    }

    /// Maps `capacity` bytes and asks the OS to back them up front.
    pub fn populated(capacity: usize) -> StackResult<Self> {
        if capacity == 0 {
            return Err(StackError::InvalidCapacity);
        }
        let mmap = MmapOptions::new()
            .len(capacity)
            .populate()
            .map_anon()
            .map_err(|e| StackError::MmapFailed(e.to_string()))?;
        Ok(Self { mmap })
    }
}

// SAFETY: the mapping never moves and lives until `MmapMut` is dropped.
unsafe impl BackingBuffer for MappedBuffer {
    fn capacity(&self) -> usize {
        self.mmap.len()
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    fn backing(&self) -> Backing {
        Backing::Mapped
    }
}

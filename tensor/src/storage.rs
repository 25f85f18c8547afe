//! Raw byte storage backing tensor arguments.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::Arc;

use snafu::OptionExt;

use crate::error::{AllocationFailedSnafu, Result, ShapeTooLargeSnafu};

/// Alignment of every allocation, wide enough for vectorized kernels.
const ALIGN: usize = 64;

/// A heap allocation of raw bytes with a stable base pointer.
///
/// Storage identity (`Arc::ptr_eq`) is the storage-sharing relation the
/// aliasing analysis is built on: two tensors alias iff they hold the same
/// `Arc<Storage>`. Kernels read and write through the base pointer; the
/// storage itself never interprets its contents.
pub struct Storage {
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

// SAFETY: Storage hands out raw pointers and never touches the bytes itself;
// synchronization of kernel reads and writes is the caller's contract.
unsafe impl Send for Storage {}
unsafe impl Sync for Storage {}

impl Storage {
    /// Allocate `len` zeroed bytes. A zero-length storage holds no
    /// allocation and reports a dangling (never dereferenced) pointer.
    pub fn zeroed(len: usize) -> Result<Arc<Self>> {
        if len == 0 {
            return Ok(Arc::new(Self { ptr: NonNull::dangling(), len: 0, layout: Layout::new::<u8>() }));
        }

        let layout = Layout::from_size_align(len, ALIGN).ok().context(ShapeTooLargeSnafu { sizes: vec![len] })?;
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).context(AllocationFailedSnafu { size: len })?;
        Ok(Arc::new(Self { ptr, len, layout }))
    }

    /// Size of the allocation in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Base pointer of the allocation.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if self.len > 0 {
            // SAFETY: ptr was allocated with exactly this layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("len", &self.len).finish()
    }
}

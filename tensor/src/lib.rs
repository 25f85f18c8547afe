//! Tensor argument descriptors for the skala dispatcher.
//!
//! A [`Tensor`] here is deliberately thin: shared byte storage plus the
//! metadata the specialization machinery reads (sizes, strides, dtype,
//! device, layout, gradient flag) and the aliasing predicates the key
//! builder consults. Kernels read and write element data through the raw
//! pointer returned by [`Tensor::data_ptr`]; this crate never interprets
//! element values itself.

use std::sync::Arc;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use skala_dtype::ext::HasDType;
use skala_dtype::{DType, DeviceSpec, Layout};

pub mod error;
pub mod storage;

#[cfg(test)]
pub mod test;

pub use error::{Error, Result};
pub use storage::Storage;

use error::{RankMismatchSnafu, ShapeTooLargeSnafu, ViewOutOfBoundsSnafu};

/// Sizes or strides, stack-allocated for the common 0-4D case.
pub type Dims = SmallVec<[usize; 4]>;

/// A multi-dimensional view over shared byte storage.
///
/// Cloning is cheap (an `Arc` bump plus small copies) and produces a strict
/// alias: same storage, sizes, strides, and offset.
#[derive(Clone)]
pub struct Tensor {
    storage: Arc<Storage>,
    /// Offset from the storage base, in elements.
    offset: usize,
    sizes: Dims,
    strides: Dims,
    dtype: DType,
    device: DeviceSpec,
    layout: Layout,
    requires_grad: bool,
}

impl Tensor {
    /// Allocate a zeroed, contiguous row-major CPU tensor.
    pub fn new(sizes: &[usize], dtype: DType) -> Result<Self> {
        let numel = checked_numel(sizes)?;
        let bytes = numel.checked_mul(dtype.bytes()).context(ShapeTooLargeSnafu { sizes: sizes.to_vec() })?;
        let storage = Storage::zeroed(bytes)?;
        Ok(Self {
            storage,
            offset: 0,
            sizes: Dims::from_slice(sizes),
            strides: contiguous_strides(sizes),
            dtype,
            device: DeviceSpec::Cpu,
            layout: Layout::Strided,
            requires_grad: false,
        })
    }

    /// Allocate a 1-D tensor initialized from a slice.
    pub fn from_slice<T: HasDType>(data: &[T]) -> Result<Self> {
        let tensor = Self::new(&[data.len()], T::DTYPE)?;
        // SAFETY: the fresh storage holds exactly `len * DTYPE.bytes()` bytes
        // and size_of::<T>() == DTYPE.bytes() by the HasDType impls.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr().cast::<u8>(), tensor.storage.as_ptr(), std::mem::size_of_val(data));
        }
        Ok(tensor)
    }

    /// A view over the same storage with new sizes, strides, and element
    /// offset. Fails when any reachable element would fall outside the
    /// storage.
    pub fn as_strided(&self, sizes: &[usize], strides: &[usize], offset: usize) -> Result<Self> {
        ensure!(sizes.len() == strides.len(), RankMismatchSnafu { sizes: sizes.len(), strides: strides.len() });

        let available = if self.dtype.bytes() == 0 { 0 } else { self.storage.len() / self.dtype.bytes() };
        let required = if sizes.contains(&0) {
            // Empty view: no element is reachable, only the offset matters.
            offset
        } else {
            let mut span = offset;
            for (&size, &stride) in sizes.iter().zip(strides) {
                let reach = (size - 1).checked_mul(stride).context(ShapeTooLargeSnafu { sizes: sizes.to_vec() })?;
                span = span.checked_add(reach).context(ShapeTooLargeSnafu { sizes: sizes.to_vec() })?;
            }
            span.checked_add(1).context(ShapeTooLargeSnafu { sizes: sizes.to_vec() })?
        };
        ensure!(required <= available, ViewOutOfBoundsSnafu { required, available });

        Ok(Self {
            storage: Arc::clone(&self.storage),
            offset,
            sizes: Dims::from_slice(sizes),
            strides: Dims::from_slice(strides),
            dtype: self.dtype,
            device: self.device.clone(),
            layout: self.layout,
            requires_grad: self.requires_grad,
        })
    }

    pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = requires_grad;
        self
    }

    pub fn with_device(mut self, device: DeviceSpec) -> Self {
        self.device = device;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn ndim(&self) -> usize {
        self.sizes.len()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Extent along `dim`, or `None` past the tensor's rank.
    pub fn size(&self, dim: usize) -> Option<usize> {
        self.sizes.get(dim).copied()
    }

    /// Stride along `dim`, or `None` past the tensor's rank.
    pub fn stride(&self, dim: usize) -> Option<usize> {
        self.strides.get(dim).copied()
    }

    pub fn numel(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Element offset of this view into its storage.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> &DeviceSpec {
        &self.device
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Pointer to this view's first element.
    pub fn data_ptr(&self) -> *mut u8 {
        // SAFETY: the byte offset was bounds-checked when the view was built.
        unsafe { self.storage.as_ptr().add(self.offset * self.dtype.bytes()) }
    }

    /// Whether the two tensors share storage.
    pub fn is_alias_of(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Strict aliasing: same storage with identical sizes, strides, and
    /// offset.
    pub fn is_set_to(&self, other: &Tensor) -> bool {
        self.is_alias_of(other)
            && self.offset == other.offset
            && self.sizes == other.sizes
            && self.strides == other.strides
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("sizes", &self.sizes)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .field("dtype", &self.dtype)
            .field("device", &self.device)
            .field("layout", &self.layout)
            .field("requires_grad", &self.requires_grad)
            .finish()
    }
}

fn checked_numel(sizes: &[usize]) -> Result<usize> {
    sizes
        .iter()
        .try_fold(1usize, |acc, &size| acc.checked_mul(size))
        .context(ShapeTooLargeSnafu { sizes: sizes.to_vec() })
}

/// Row-major strides: the trailing dimension is packed, each earlier stride
/// is the product of the sizes behind it.
fn contiguous_strides(sizes: &[usize]) -> Dims {
    let mut strides = Dims::with_capacity(sizes.len());
    let mut acc = 1usize;
    for &size in sizes.iter().rev() {
        strides.push(acc);
        acc = acc.saturating_mul(size);
    }
    strides.reverse();
    strides
}

//! Packed specialization keys.
//!
//! A key captures the static properties of one argument (dtype, device
//! kind, layout, gradient flag, out marker, alias group, and per-dimension
//! size/stride categories) in a fixed-width record that is cheap to
//! compare and totally ordered, so a tuple of keys can index a sorted map.

use strum::EnumCount;

use skala_dtype::{DType, DeviceKind, Layout};
use skala_tensor::Tensor;

use crate::error::{InvalidDimFlagsSnafu, Result};
use crate::spec::{ArgSpec, SizeTag, StrideTag};

/// Dimension does not exist; trailing pad up to `MAX_DIMS`.
pub(crate) const SIZE_MISSING: u8 = 1 << 0;
/// Extent == 1.
pub(crate) const SIZE_ONE: u8 = 1 << 1;
/// Extent != 1.
pub(crate) const SIZE_OTHER: u8 = 1 << 2;
/// Stride == 0 (broadcast).
pub(crate) const STRIDE_ZERO: u8 = 1 << 3;
/// Stride == 1 (innermost packed).
pub(crate) const STRIDE_ONE: u8 = 1 << 4;
/// Stride equals `stride[d + 1] * size[d + 1]` (row-major continuation).
pub(crate) const STRIDE_CONTIGUOUS: u8 = 1 << 5;
/// Stride equals `stride[d - 1] * size[d - 1]`.
pub(crate) const STRIDE_TRANSPOSED_CONTIGUOUS: u8 = 1 << 6;
/// No rule matched; the stride travels to the kernel as a runtime argument.
pub(crate) const STRIDE_AS_ARG: u8 = 1 << 7;

// Positional packing radixes for the 16-bit property field, least
// significant first: is_out, requires_grad, dtype, layout, device kind.
const S0: u16 = 1;
const S1: u16 = S0 * 2;
const S2: u16 = S1 * 2;
const S3: u16 = S2 * DType::COUNT as u16;
const S4: u16 = S3 * Layout::COUNT as u16;
const _: () = assert!(S4 as u32 * DeviceKind::COUNT as u32 <= 1 << 16, "property field overflows 16 bits");

/// Packed per-argument specialization record, parameterized by the dim
/// bucket it belongs to.
///
/// Comparison is lexicographic over `(flags, alias_group, dimflags)`: the
/// structured equivalent of comparing the packed byte image, with no
/// padding bytes to worry about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecializationKey<const MAX_DIMS: usize> {
    /// is_out, requires_grad, dtype, layout, and device kind, packed
    /// positionally so distinct property tuples yield distinct values.
    flags: u16,
    /// 0 = unaliased; +g = strict alias of every other argument tagged +g;
    /// -g = overlapping storage with group g without strict equality.
    alias_group: i8,
    dimflags: [u8; MAX_DIMS],
}

impl<const MAX_DIMS: usize> SpecializationKey<MAX_DIMS> {
    pub fn new(arg: &Tensor, alias_group: i8, is_out: bool) -> Self {
        debug_assert!(arg.ndim() <= MAX_DIMS, "caller must route into a wide-enough dim bucket");
        Self {
            flags: pack_flags(arg, is_out),
            alias_group,
            dimflags: pack_dimflags(arg.sizes(), arg.strides()),
        }
    }

    pub fn alias_group(&self) -> i8 {
        self.alias_group
    }

    /// The out marker occupies the least significant flag position.
    pub fn is_out(&self) -> bool {
        self.flags & 1 == 1
    }

    /// Consumer-readable view of this key, handed to the compiler callback.
    /// Properties that the key only stores packed (dtype, device, layout,
    /// gradient flag, rank) are read back from the example argument the key
    /// was built from.
    pub fn describe(&self, example: &Tensor) -> Result<ArgSpec> {
        let mut shape = Vec::with_capacity(MAX_DIMS);
        let mut stride = Vec::with_capacity(MAX_DIMS);
        for &flag in &self.dimflags {
            if flag & SIZE_MISSING != 0 {
                break;
            }
            shape.push(if flag & SIZE_ONE != 0 { SizeTag::One } else { SizeTag::Other });
            stride.push(stride_tag(flag)?);
        }
        Ok(ArgSpec {
            alias_group: self.alias_group,
            ndim: example.ndim(),
            dtype: example.dtype(),
            device: example.device().clone(),
            layout: example.layout(),
            requires_grad: example.requires_grad(),
            out: self.is_out(),
            shape,
            stride,
        })
    }
}

fn pack_flags(arg: &Tensor, is_out: bool) -> u16 {
    S0 * is_out as u16
        + S1 * arg.requires_grad() as u16
        + S2 * arg.dtype() as u16
        + S3 * arg.layout() as u16
        + S4 * arg.device().kind() as u16
}

/// Classify every populated dimension and pad the rest.
///
/// The stride rules are ordered; the first match wins. The forward-
/// contiguous rule consults the descriptor's own neighbor (`d + 1` bounded
/// by the argument's rank, not the bucket), so the trailing stride of a
/// packed row-major array classifies as `STRIDE_ONE`, never
/// `STRIDE_CONTIGUOUS`.
fn pack_dimflags<const MAX_DIMS: usize>(sizes: &[usize], strides: &[usize]) -> [u8; MAX_DIMS] {
    let mut dimflags = [SIZE_MISSING | STRIDE_ZERO; MAX_DIMS];
    let ndim = sizes.len().min(MAX_DIMS);
    for dim in 0..ndim {
        let mut flag = if sizes[dim] == 1 { SIZE_ONE } else { SIZE_OTHER };
        flag |= if strides[dim] == 0 {
            STRIDE_ZERO
        } else if strides[dim] == 1 {
            STRIDE_ONE
        } else if dim + 1 < sizes.len() && strides[dim] == strides[dim + 1] * sizes[dim + 1] {
            STRIDE_CONTIGUOUS
        } else if dim > 0 && strides[dim] == strides[dim - 1] * sizes[dim - 1] {
            STRIDE_TRANSPOSED_CONTIGUOUS
        } else {
            STRIDE_AS_ARG
        };
        dimflags[dim] = flag;
    }
    dimflags
}

fn stride_tag(flag: u8) -> Result<StrideTag> {
    if flag & STRIDE_ZERO != 0 {
        Ok(StrideTag::Zero)
    } else if flag & STRIDE_ONE != 0 {
        Ok(StrideTag::One)
    } else if flag & STRIDE_CONTIGUOUS != 0 {
        Ok(StrideTag::Contiguous)
    } else if flag & STRIDE_TRANSPOSED_CONTIGUOUS != 0 {
        Ok(StrideTag::TransposedContiguous)
    } else if flag & STRIDE_AS_ARG != 0 {
        Ok(StrideTag::AsArg)
    } else {
        InvalidDimFlagsSnafu { flags: flag }.fail()
    }
}

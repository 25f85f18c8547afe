//! Consumer-readable key descriptions.
//!
//! The compiler callback never sees packed key bytes; it receives one
//! [`ArgSpec`] per argument, describing the equivalence class the kernel is
//! being compiled for.

use std::fmt;

use skala_dtype::{DType, DeviceSpec, Layout};

/// Size category of one populated dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTag {
    /// Extent == 1.
    One,
    /// Any other extent.
    Other,
}

impl fmt::Display for SizeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "one"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Stride category of one populated dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrideTag {
    Zero,
    One,
    Contiguous,
    TransposedContiguous,
    /// The actual stride value is passed to the kernel at run time.
    AsArg,
}

impl fmt::Display for StrideTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "zero"),
            Self::One => write!(f, "one"),
            Self::Contiguous => write!(f, "contiguous"),
            Self::TransposedContiguous => write!(f, "transposed_contiguous"),
            Self::AsArg => write!(f, "as_arg"),
        }
    }
}

/// Description of one argument's specialization key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub alias_group: i8,
    pub ndim: usize,
    pub dtype: DType,
    pub device: DeviceSpec,
    pub layout: Layout,
    pub requires_grad: bool,
    /// Whether this argument is the call's destination slot.
    pub out: bool,
    /// One tag per populated dimension.
    pub shape: Vec<SizeTag>,
    /// One tag per populated dimension.
    pub stride: Vec<StrideTag>,
}

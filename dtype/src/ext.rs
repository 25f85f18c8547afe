//! Mapping from native Rust scalars to their [`DType`].

use super::*;

/// Rust scalar types that correspond to a [`DType`].
///
/// Only natively representable scalars implement this. `Float16`,
/// `BFloat16`, the FP8 formats, and `Void` have no Rust counterpart and
/// travel as raw bytes.
pub trait HasDType {
    const DTYPE: DType;
}

macro_rules! impl_has_dtype {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl HasDType for $ty {
                const DTYPE: DType = DType::$dtype;
            }
            // Slice-to-buffer copies assume the native width matches.
            const _: () = assert!(std::mem::size_of::<$ty>() == DType::$dtype.bytes());
        )*
    };
}

impl_has_dtype! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

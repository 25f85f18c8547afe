//! Shape-specialized compilation cache and dispatcher.
//!
//! Sits between a polymorphic operator call site and a family of compiled
//! kernels. Each call carries a tuple of tensors; the dispatcher derives a
//! packed [`SpecializationKey`] from their static properties (dtype, device,
//! layout, gradient flag, per-dimension size/stride categories, and the
//! aliasing partition of the tuple), looks up (or compiles once, through an
//! externally supplied callback) the matching kernel entry, and invokes it
//! with raw data pointers plus inferred shape extents.
//!
//! Calls fan out over argument arity (1..=4) and a dimensionality bucket
//! (2, 4, or 8 recognized dims), so each cache works on fixed-length keys
//! and the per-call path stays branch-light.
//!
//! The pointer list handed to a kernel is
//! `[data_ptr(arg_0), .., data_ptr(arg_N-1), &extent_0, .., &extent_K-1]`
//! where the extents are selected by the entry's `shape_from` table.

pub mod alias;
pub mod cache;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod key;
pub mod spec;

#[cfg(test)]
pub mod test;

pub use cache::{CompileFn, SpecializationCache};
pub use dispatch::Dispatcher;
pub use entry::{CompiledEntry, EntryBuilder, Kernel, ShapeCheck};
pub use error::{BoxedError, Error, Result};
pub use key::SpecializationKey;
pub use spec::{ArgSpec, SizeTag, StrideTag};

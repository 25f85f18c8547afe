//! Compiled kernel entries and the configuration proxy handed to the
//! compiler callback.

use std::any::Any;
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use skala_tensor::Tensor;

use crate::error::{
    MissingKernelSnafu, Result, ShapeCheckFailedSnafu, ShapeFromTooLongSnafu, ShapeSourceOutOfRangeSnafu,
};

/// Widest dim bucket; invocation scratch is sized for it.
pub(crate) const MAX_KEY_DIMS: usize = 8;

/// A compiled kernel ready for dispatch.
///
/// Implementations wrap whatever the external compiler produced (a JIT'd
/// function, a shared-library symbol, ...). The cache only ever calls
/// `call_raw` with the pointer list described in the crate docs.
pub trait Kernel: Send + Sync {
    /// Execute the kernel with raw argument pointers.
    ///
    /// # Safety
    ///
    /// Every pointer must stay valid for the duration of the call, and the
    /// list must match the kernel's signature: one data pointer per
    /// argument followed by one `i64` extent pointer per `shape_from`
    /// entry.
    unsafe fn call_raw(&self, args: &[*mut u8]) -> Result<()>;

    /// Kernel name for logging and diagnostics.
    fn name(&self) -> &str;
}

/// One shape-equality obligation `(a, b, c, d)`, checked at invocation as
/// `args[a].size(b) == args[c].size(d)`.
pub type ShapeCheck = (usize, usize, usize, usize);

/// A cached, immutable specialization: the opaque kernel plus the
/// directives the compiler configured for invoking it.
pub struct CompiledEntry {
    kernel: Arc<dyn Kernel>,
    /// `(arg, dim)` sources of the kernel's runtime extents, in the order
    /// the kernel expects them.
    shape_from: SmallVec<[(usize, usize); MAX_KEY_DIMS]>,
    shape_checks: Vec<ShapeCheck>,
    /// Argument whose dtype/device/layout characterize the output. Stored
    /// for the compiler's benefit; dispatch does not consult it.
    options_from: usize,
    /// Keeps foreign objects co-owned by the kernel alive for the entry's
    /// lifetime.
    #[allow(dead_code)]
    pins: Vec<Arc<dyn Any + Send + Sync>>,
}

impl CompiledEntry {
    pub fn kernel_name(&self) -> &str {
        self.kernel.name()
    }

    pub fn shape_from(&self) -> &[(usize, usize)] {
        &self.shape_from
    }

    pub fn shape_checks(&self) -> &[ShapeCheck] {
        &self.shape_checks
    }

    pub fn options_from(&self) -> usize {
        self.options_from
    }

    /// Run one invocation. `call_args` arrives preloaded with the N data
    /// pointers; the inferred extents are appended behind them.
    ///
    /// The result is the final slot of the normalized argument tuple, which
    /// is the out tensor when the caller supplied one.
    pub(crate) fn invoke<const N: usize>(
        &self,
        args: &[Tensor; N],
        call_args: &mut SmallVec<[*mut u8; 12]>,
    ) -> Result<Tensor> {
        for &(left_arg, left_dim, right_arg, right_dim) in &self.shape_checks {
            let left = extent(args, left_arg, left_dim)?;
            let right = extent(args, right_arg, right_dim)?;
            ensure!(
                left == right,
                ShapeCheckFailedSnafu { left_arg, left_dim, left, right_arg, right_dim, right }
            );
        }

        let mut extents = [0i64; MAX_KEY_DIMS];
        for (slot, &(arg, dim)) in self.shape_from.iter().enumerate() {
            extents[slot] = extent(args, arg, dim)? as i64;
        }
        for slot in extents.iter_mut().take(self.shape_from.len()) {
            call_args.push((slot as *mut i64).cast());
        }

        // SAFETY: data pointers come from tensors borrowed for this call;
        // extent pointers reference the stack buffer above, which outlives
        // call_raw.
        unsafe { self.kernel.call_raw(call_args) }?;

        Ok(args[N - 1].clone())
    }
}

impl std::fmt::Debug for CompiledEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledEntry")
            .field("kernel", &self.kernel.name())
            .field("shape_from", &self.shape_from)
            .field("shape_checks", &self.shape_checks)
            .field("options_from", &self.options_from)
            .finish()
    }
}

fn extent(args: &[Tensor], arg: usize, dim: usize) -> Result<usize> {
    args.get(arg).and_then(|t| t.size(dim)).context(ShapeSourceOutOfRangeSnafu { arg, dim })
}

/// Mutation proxy the compiler callback configures a pending entry through.
///
/// The proxy narrows the callback's surface to the four directives below
/// plus retention pins; the cache freezes the result into an immutable
/// [`CompiledEntry`] before inserting it, so entries never change after the
/// callback returns.
pub struct EntryBuilder {
    max_dims: usize,
    kernel: Option<Arc<dyn Kernel>>,
    shape_from: SmallVec<[(usize, usize); MAX_KEY_DIMS]>,
    shape_checks: Vec<ShapeCheck>,
    options_from: usize,
    pins: Vec<Arc<dyn Any + Send + Sync>>,
}

impl EntryBuilder {
    pub(crate) fn new(max_dims: usize) -> Self {
        Self {
            max_dims,
            kernel: None,
            shape_from: SmallVec::new(),
            shape_checks: Vec::new(),
            options_from: 0,
            pins: Vec::new(),
        }
    }

    /// Record the compiled kernel.
    pub fn set_code(&mut self, kernel: Arc<dyn Kernel>) {
        self.kernel = Some(kernel);
    }

    /// Identify the kernel's runtime shape parameters, in the order the
    /// kernel expects them. At most one extent per recognized dimension.
    pub fn set_shape_from(&mut self, indices: &[(usize, usize)]) -> Result<()> {
        ensure!(
            indices.len() <= self.max_dims,
            ShapeFromTooLongSnafu { len: indices.len(), max_dims: self.max_dims }
        );
        self.shape_from = SmallVec::from_slice(indices);
        Ok(())
    }

    /// Which argument's dtype/device/layout characterize the output.
    pub fn set_options_from(&mut self, index: usize) {
        self.options_from = index;
    }

    /// Append a shape-equality obligation checked on every invocation.
    pub fn add_shape_check(&mut self, check: ShapeCheck) {
        self.shape_checks.push(check);
    }

    /// Keep a foreign object co-owned by the kernel alive as long as the
    /// entry.
    pub fn pin(&mut self, object: Arc<dyn Any + Send + Sync>) {
        self.pins.push(object);
    }

    pub(crate) fn freeze(self) -> Result<CompiledEntry> {
        let kernel = self.kernel.context(MissingKernelSnafu)?;
        Ok(CompiledEntry {
            kernel,
            shape_from: self.shape_from,
            shape_checks: self.shape_checks,
            options_from: self.options_from,
            pins: self.pins,
        })
    }
}

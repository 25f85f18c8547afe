//! The keyed compilation cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use snafu::ResultExt;
use tracing::{debug, trace};

use skala_tensor::Tensor;

use crate::alias::compute_key;
use crate::entry::{CompiledEntry, EntryBuilder};
use crate::error::{BoxedError, CallbackSnafu, Result};
use crate::key::SpecializationKey;
use crate::spec::ArgSpec;

/// Compiler callback supplied at construction.
///
/// Invoked at most once per distinct key tuple, with one [`ArgSpec`] per
/// argument and the proxy for the entry being built. It must configure a
/// kernel on the proxy before returning.
pub type CompileFn = dyn Fn(&[ArgSpec], &mut EntryBuilder) -> std::result::Result<(), BoxedError> + Send + Sync;

/// Maps key tuples to compiled entries for one `(arity, dim bucket)` pair.
///
/// The map only ever grows; entries live until the cache is dropped.
pub struct SpecializationCache<const N: usize, const MAX_DIMS: usize> {
    entries: Mutex<BTreeMap<[SpecializationKey<MAX_DIMS>; N], Arc<CompiledEntry>>>,
    compile: Arc<CompileFn>,
}

impl<const N: usize, const MAX_DIMS: usize> SpecializationCache<N, MAX_DIMS> {
    pub fn new(compile: Arc<CompileFn>) -> Self {
        Self { entries: Mutex::new(BTreeMap::new()), compile }
    }

    /// Dispatch one call: derive the key, reuse or synthesize the entry,
    /// invoke the kernel.
    pub fn call(&self, args: &[Tensor; N], has_out: bool) -> Result<Tensor> {
        let mut call_args: SmallVec<[*mut u8; 12]> = SmallVec::with_capacity(N + MAX_DIMS);
        call_args.extend(args.iter().map(Tensor::data_ptr));

        let key = compute_key::<N, MAX_DIMS>(args, has_out);
        let entry = self.lookup_or_compile(key, args)?;
        entry.invoke(args, &mut call_args)
    }

    /// Return the entry for `key`, invoking the compiler callback on a miss.
    ///
    /// The whole lookup runs under the cache mutex, callback included: the
    /// callback typically manipulates shared compiler state (code
    /// generators, symbol tables) and is not re-entrancy safe, so miss-time
    /// compilation is serialized and each key compiles at most once. A
    /// failed compilation leaves the map untouched, so the next call with
    /// the same key retries. Entries are immutable once inserted; the
    /// returned reference stays valid after the lock is released.
    fn lookup_or_compile(
        &self,
        key: [SpecializationKey<MAX_DIMS>; N],
        args: &[Tensor; N],
    ) -> Result<Arc<CompiledEntry>> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&key) {
            trace!(arity = N, max_dims = MAX_DIMS, kernel = entry.kernel_name(), "specialization cache hit");
            return Ok(Arc::clone(entry));
        }

        let spec: Vec<ArgSpec> =
            key.iter().zip(args.iter()).map(|(key, arg)| key.describe(arg)).collect::<Result<_>>()?;
        debug!(arity = N, max_dims = MAX_DIMS, cached = entries.len(), "compiling specialized kernel");

        let mut builder = EntryBuilder::new(MAX_DIMS);
        (self.compile)(&spec, &mut builder).context(CallbackSnafu)?;
        let entry = Arc::new(builder.freeze()?);
        entries.insert(key, Arc::clone(&entry));
        Ok(entry)
    }

    /// Number of distinct specializations compiled so far.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

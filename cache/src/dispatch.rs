//! Arity and dimensionality fan-out.
//!
//! The dispatcher owns twelve monomorphized caches (arity 1..=4 crossed
//! with dim buckets 2/4/8), so the per-call path is two table selections
//! followed by a fixed-arity cache call.

use std::sync::Arc;

use snafu::ensure;

use skala_tensor::Tensor;

use crate::cache::{CompileFn, SpecializationCache};
use crate::entry::EntryBuilder;
use crate::error::{
    BadKeywordSnafu, BoxedError, Result, TooManyKeywordsSnafu, UnsupportedAritySnafu,
    UnsupportedDimensionalitySnafu,
};
use crate::spec::ArgSpec;

/// Smallest dim bucket wide enough for `ndim` dimensions.
pub(crate) fn dim_bucket(ndim: usize) -> Option<usize> {
    match ndim {
        0..=2 => Some(2),
        3..=4 => Some(4),
        5..=8 => Some(8),
        _ => None,
    }
}

/// The three dim buckets of one arity.
struct DimRouter<const N: usize> {
    bucket2: SpecializationCache<N, 2>,
    bucket4: SpecializationCache<N, 4>,
    bucket8: SpecializationCache<N, 8>,
}

impl<const N: usize> DimRouter<N> {
    fn new(compile: &Arc<CompileFn>) -> Self {
        Self {
            bucket2: SpecializationCache::new(Arc::clone(compile)),
            bucket4: SpecializationCache::new(Arc::clone(compile)),
            bucket8: SpecializationCache::new(Arc::clone(compile)),
        }
    }

    fn call(&self, args: [Tensor; N], has_out: bool) -> Result<Tensor> {
        let max_ndim = args.iter().map(Tensor::ndim).max().unwrap_or(0);
        match dim_bucket(max_ndim) {
            Some(2) => self.bucket2.call(&args, has_out),
            Some(4) => self.bucket4.call(&args, has_out),
            Some(8) => self.bucket8.call(&args, has_out),
            _ => UnsupportedDimensionalitySnafu { ndim: max_ndim }.fail(),
        }
    }
}

/// Polymorphic front end over the cache family.
///
/// Immutable after construction; any number of threads may dispatch
/// concurrently, serializing only on the per-cache mutex of the route they
/// hit.
pub struct Dispatcher {
    unary: DimRouter<1>,
    binary: DimRouter<2>,
    ternary: DimRouter<3>,
    quaternary: DimRouter<4>,
}

impl Dispatcher {
    /// Build a dispatcher around a compiler callback. All twelve caches
    /// share the one callback; it runs at most once per distinct key within
    /// each cache.
    pub fn new<F>(compile: F) -> Self
    where
        F: Fn(&[ArgSpec], &mut EntryBuilder) -> std::result::Result<(), BoxedError> + Send + Sync + 'static,
    {
        let compile: Arc<CompileFn> = Arc::new(compile);
        Self {
            unary: DimRouter::new(&compile),
            binary: DimRouter::new(&compile),
            ternary: DimRouter::new(&compile),
            quaternary: DimRouter::new(&compile),
        }
    }

    /// Dispatch a call with positional and keyword arguments.
    ///
    /// At most one keyword is accepted and it must be named `out`. The
    /// normalized tuple places the destination last: the `out` tensor when
    /// the keyword is present, the trailing positional argument otherwise.
    /// Either spelling of the same call produces the same key and reuses
    /// the same kernel, and the destination slot is what the call returns.
    pub fn call(&self, positional: &[Tensor], kwargs: &[(&str, &Tensor)]) -> Result<Tensor> {
        ensure!(kwargs.len() <= 1, TooManyKeywordsSnafu { count: kwargs.len() });
        let out = match kwargs.first() {
            Some(&(keyword, tensor)) => {
                ensure!(keyword == "out", BadKeywordSnafu { keyword });
                Some(tensor)
            }
            None => None,
        };

        let count = positional.len() + kwargs.len();
        ensure!((1..=4).contains(&count), UnsupportedAritySnafu { count });
        let last = match out {
            Some(out) => out.clone(),
            None => positional[positional.len() - 1].clone(),
        };

        // The final slot of the normalized tuple is the call's destination
        // whichever way it was spelled, and is keyed as such.
        let has_out = true;
        match count {
            1 => self.unary.call([last], has_out),
            2 => self.binary.call([positional[0].clone(), last], has_out),
            3 => self.ternary.call([positional[0].clone(), positional[1].clone(), last], has_out),
            _ => self.quaternary.call(
                [positional[0].clone(), positional[1].clone(), positional[2].clone(), last],
                has_out,
            ),
        }
    }

    /// Convenience form of `call(positional, &[("out", out)])`.
    pub fn call_out(&self, positional: &[Tensor], out: &Tensor) -> Result<Tensor> {
        self.call(positional, &[("out", out)])
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use test_case::test_case;

use crate::Dispatcher;
use crate::dispatch::dim_bucket;
use crate::error::Error;
use crate::spec::{SizeTag, StrideTag};
use crate::test::helpers::{FailingKernel, StubCompiler, dispatcher, strided, tensor, vector};

#[test_case(0 => Some(2); "scalar")]
#[test_case(1 => Some(2); "vector")]
#[test_case(2 => Some(2); "matrix")]
#[test_case(3 => Some(4); "cube")]
#[test_case(4 => Some(4); "four dims")]
#[test_case(5 => Some(8); "five dims")]
#[test_case(8 => Some(8); "eight dims")]
#[test_case(9 => None; "nine dims")]
fn test_dim_bucket(ndim: usize) -> Option<usize> {
    dim_bucket(ndim)
}

#[test]
fn test_contiguous_vector_add_specializes_once() {
    let stub = StubCompiler::new(vec![(0, 0)]);
    let dispatcher = dispatcher(&stub);

    let (a, b, out) = (vector(1000), vector(1000), vector(1000));
    let result = dispatcher.call(&[a, b, out.clone()], &[]).unwrap();
    assert!(result.is_set_to(&out));

    let spec = stub.last_spec();
    assert_eq!(spec.len(), 3);
    for arg in &spec {
        assert_eq!(arg.alias_group, 0);
        assert_eq!(arg.shape, vec![SizeTag::Other]);
        assert_eq!(arg.stride, vec![StrideTag::One]);
    }
    assert!(!spec[0].out);
    assert!(!spec[1].out);
    assert!(spec[2].out);

    // Same shapes again: cache hit, no second compilation.
    dispatcher.call(&[vector(1000), vector(1000), vector(1000)], &[]).unwrap();
    assert_eq!(stub.compile_count(), 1);
    assert_eq!(stub.total_kernel_calls(), 2);
}

#[test]
fn test_broadcast_stride_tags() {
    let stub = StubCompiler::new(vec![]);
    let dispatcher = dispatcher(&stub);

    let a = strided(&[4, 1], &[1, 0]);
    let b = strided(&[1, 8], &[0, 1]);
    let out = tensor(&[4, 8]);
    dispatcher.call(&[a, b], &[("out", &out)]).unwrap();

    let spec = stub.last_spec();
    assert_eq!(spec[0].shape, vec![SizeTag::Other, SizeTag::One]);
    assert_eq!(spec[0].stride, vec![StrideTag::One, StrideTag::Zero]);
    assert_eq!(spec[1].shape, vec![SizeTag::One, SizeTag::Other]);
    assert_eq!(spec[1].stride, vec![StrideTag::Zero, StrideTag::One]);
    assert_eq!(spec[2].shape, vec![SizeTag::Other, SizeTag::Other]);
    assert_eq!(spec[2].stride, vec![StrideTag::Contiguous, StrideTag::One]);
}

/// `(a, b, out=x)` and `(a, b, x)` normalize to the same tuple, so they
/// share one key and one kernel.
#[test]
fn test_out_keyword_matches_positional_spelling() {
    let stub = StubCompiler::new(vec![(0, 0)]);
    let dispatcher = dispatcher(&stub);

    let (a, b, x) = (vector(32), vector(32), vector(32));
    let via_kwarg = dispatcher.call(&[a.clone(), b.clone()], &[("out", &x)]).unwrap();
    let via_positional = dispatcher.call(&[a, b, x.clone()], &[]).unwrap();

    assert_eq!(stub.compile_count(), 1);
    assert!(via_kwarg.is_set_to(&x));
    assert!(via_positional.is_set_to(&x));
}

#[test]
fn test_call_out_is_the_kwarg_spelling() {
    let stub = StubCompiler::new(vec![]);
    let dispatcher = dispatcher(&stub);

    let (a, b, x) = (vector(16), vector(16), vector(16));
    dispatcher.call_out(&[a.clone(), b.clone()], &x).unwrap();
    dispatcher.call(&[a, b], &[("out", &x)]).unwrap();
    assert_eq!(stub.compile_count(), 1);
}

#[test]
fn test_mixed_rank_routes_by_widest_argument() {
    let stub = StubCompiler::new(vec![]);
    let dispatcher = dispatcher(&stub);

    // 3-D with 1-D siblings lands in the 4-dim bucket.
    dispatcher.call(&[tensor(&[2, 3, 4]), vector(4), vector(24)], &[]).unwrap();
    // Promoting one argument to 5-D moves the call to the 8-dim bucket.
    dispatcher.call(&[tensor(&[1, 1, 2, 3, 4]), vector(4), vector(24)], &[]).unwrap();
    assert_eq!(stub.compile_count(), 2);

    let spec = stub.last_spec();
    assert_eq!(spec[0].ndim, 5);
}

#[test]
fn test_nine_dims_is_unsupported() {
    let stub = StubCompiler::new(vec![]);
    let dispatcher = dispatcher(&stub);

    let nine = tensor(&[1, 1, 1, 1, 1, 1, 1, 1, 2]);
    let err = dispatcher.call(&[nine], &[]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedDimensionality { ndim: 9 }));
}

#[test]
fn test_arity_bounds() {
    let stub = StubCompiler::new(vec![]);
    let dispatcher = dispatcher(&stub);

    let err = dispatcher.call(&[], &[]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedArity { count: 0 }));

    let five: Vec<_> = (0..5).map(|_| vector(4)).collect();
    let err = dispatcher.call(&five, &[]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedArity { count: 5 }));

    let four: Vec<_> = (0..4).map(|_| vector(4)).collect();
    let out = vector(4);
    let err = dispatcher.call(&four, &[("out", &out)]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedArity { count: 5 }));
}

#[test]
fn test_keyword_validation() {
    let stub = StubCompiler::new(vec![]);
    let dispatcher = dispatcher(&stub);
    let (a, b) = (vector(4), vector(4));

    let err = dispatcher.call(&[a.clone()], &[("axis", &b)]).unwrap_err();
    assert!(matches!(err, Error::BadKeyword { .. }));

    let err = dispatcher.call(&[a], &[("out", &b), ("out", &b)]).unwrap_err();
    assert!(matches!(err, Error::TooManyKeywords { count: 2 }));
}

#[test]
fn test_every_supported_arity_dispatches() {
    let stub = StubCompiler::new(vec![]);
    let dispatcher = dispatcher(&stub);

    dispatcher.call(&[vector(4)], &[]).unwrap();
    dispatcher.call(&[vector(4), vector(4)], &[]).unwrap();
    dispatcher.call(&[vector(4), vector(4), vector(4)], &[]).unwrap();
    dispatcher.call(&[vector(4), vector(4), vector(4), vector(4)], &[]).unwrap();

    assert_eq!(stub.compile_count(), 4);
    let lens: Vec<usize> = stub.kernels().iter().map(|kernel| kernel.calls()[0].pointers).collect();
    assert_eq!(lens, vec![1, 2, 3, 4]);
}

#[test]
fn test_kernel_failure_surfaces_to_the_caller() {
    let compiles = Arc::new(AtomicUsize::new(0));
    let dispatcher = {
        let compiles = Arc::clone(&compiles);
        Dispatcher::new(move |_, builder| {
            compiles.fetch_add(1, Ordering::SeqCst);
            builder.set_code(Arc::new(FailingKernel));
            Ok(())
        })
    };

    let err = dispatcher.call(&[vector(4), vector(4)], &[]).unwrap_err();
    assert!(matches!(err, Error::KernelExecution { .. }));

    // A failing kernel is still a compiled kernel: the entry stays cached
    // and only the invocation errors.
    let err = dispatcher.call(&[vector(4), vector(4)], &[]).unwrap_err();
    assert!(matches!(err, Error::KernelExecution { .. }));
    assert_eq!(compiles.load(Ordering::SeqCst), 1);
}

#[test]
fn test_kernel_pointer_layout_end_to_end() {
    let stub = StubCompiler::new(vec![(2, 0)]);
    let dispatcher = dispatcher(&stub);

    dispatcher.call(&[vector(8), vector(8), vector(1000)], &[]).unwrap();

    let kernels = stub.kernels();
    let calls = kernels[0].calls();
    assert_eq!(calls[0].pointers, 4);
    assert_eq!(calls[0].extents, vec![1000]);
}

use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type compiler callbacks and kernels may fail with.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("unsupported arity: expected 1..=4 arguments, got {count}"))]
    UnsupportedArity { count: usize },

    #[snafu(display("unsupported dimensionality: {ndim} exceeds the 8-dim limit"))]
    UnsupportedDimensionality { ndim: usize },

    #[snafu(display("unexpected keyword '{keyword}': only 'out' is accepted"))]
    BadKeyword { keyword: String },

    #[snafu(display("expected at most one keyword argument, got {count}"))]
    TooManyKeywords { count: usize },

    /// Internal invariant violation: a populated dimension record carries no
    /// recognizable stride category.
    #[snafu(display("invalid dimension flags {flags:#010b}"))]
    InvalidDimFlags { flags: u8 },

    #[snafu(display("shape_from lists {len} extents but the dim bucket holds at most {max_dims}"))]
    ShapeFromTooLong { len: usize, max_dims: usize },

    #[snafu(display("shape source (arg {arg}, dim {dim}) is out of range"))]
    ShapeSourceOutOfRange { arg: usize, dim: usize },

    /// The compiler callback returned without configuring a kernel.
    #[snafu(display("compiler callback left the entry without a kernel"))]
    MissingKernel,

    #[snafu(display(
        "shape check failed: args[{left_arg}].size({left_dim}) = {left}, \
         args[{right_arg}].size({right_dim}) = {right}"
    ))]
    ShapeCheckFailed {
        left_arg: usize,
        left_dim: usize,
        left: usize,
        right_arg: usize,
        right_dim: usize,
        right: usize,
    },

    #[snafu(display("compiler callback failed: {source}"))]
    Callback { source: BoxedError },

    #[snafu(display("kernel '{name}' failed: {reason}"))]
    KernelExecution { name: String, reason: String },
}

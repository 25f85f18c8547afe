use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("rank mismatch: {sizes} sizes but {strides} strides"))]
    RankMismatch { sizes: usize, strides: usize },

    #[snafu(display("shape {sizes:?} overflows the addressable size"))]
    ShapeTooLarge { sizes: Vec<usize> },

    #[snafu(display("view needs {required} elements but storage holds {available}"))]
    ViewOutOfBounds { required: usize, available: usize },

    #[snafu(display("allocation of {size} bytes failed"))]
    AllocationFailed { size: usize },
}

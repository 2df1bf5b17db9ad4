use crate::PipelineState;

/// Errors returned by resource creation, binding and command recording.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A declared vertex or binding layout disagrees with the resource bound to it.
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),
    /// A binding set does not match the layout it was created against.
    #[error("binding mismatch at binding {binding}: {reason}")]
    BindingMismatch { binding: u32, reason: String },
    /// Two entries of a binding layout use the same binding index.
    #[error("binding index {0} is declared more than once")]
    DuplicateBinding(u32),
    /// Externally supplied data (encoded image, raw pixels) could not be used.
    #[error("invalid source data: {0}")]
    SourceDataInvalid(String),
    /// An index references a vertex past the end of the vertex data.
    #[error("index {index} at position {position} is out of bounds (vertex count is {vertex_count})")]
    IndexOutOfBounds { position: usize, index: i64, vertex_count: u32 },
    /// The number of indices or vertices doesn't form whole primitives.
    #[error("{count} vertices do not form whole primitives of topology {topology}")]
    IndexCountMismatch { count: u32, topology: String },
    /// A resource is used in a way its usage flags don't allow.
    #[error("`{resource}` is used as {required} but was created with usage {actual}")]
    UsageViolation {
        resource: String,
        required: String,
        actual: String,
    },
    /// A range exceeds the resource it refers to.
    #[error("{what} out of range: end {end} exceeds {limit}")]
    OutOfRange { what: &'static str, end: u64, limit: u64 },
    /// A draw was issued without a ready pipeline.
    #[error("no ready pipeline is bound")]
    PipelineNotReady,
    /// A pipeline builder step was called out of order.
    #[error("invalid pipeline state: expected {expected:?}, was {actual:?}")]
    InvalidPipelineState {
        expected: PipelineState,
        actual: PipelineState,
    },
    /// A resource created on one device was used with another.
    #[error("`{resource}` belongs to another device than `{device}`")]
    ForeignResource { resource: String, device: String },
    /// A device limit was exceeded.
    #[error("{limit} exceeded: {value} > {max}")]
    LimitExceeded { limit: &'static str, value: u64, max: u64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<::image::ImageError> for Error {
    fn from(err: ::image::ImageError) -> Self {
        Error::SourceDataInvalid(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the toolkit kernels.
///
/// The variants mirror the three failure kinds callers need to tell apart:
/// a wrong kind of input, a bad value, or a feature that is deliberately missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolkitError {
    /// Wrong container or element kind (e.g. a float index array).
    #[error("type error: {0}")]
    Type(String),

    /// Right kind, unusable value (e.g. an unknown direction, a 3-D source).
    #[error("value error: {0}")]
    Value(String),

    /// The requested mode exists but is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

pub type Result<T> = core::result::Result<T, ToolkitError>;

impl ToolkitError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }
    pub fn value_error(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }
}

impl From<ndarray::ShapeError> for ToolkitError {
    fn from(e: ndarray::ShapeError) -> Self {
        Self::Value(e.to_string())
    }
}

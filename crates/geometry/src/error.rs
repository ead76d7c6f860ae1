use thiserror::Error;

/// Errors raised when geometry arrives as text that cannot be decoded.
///
/// Structurally odd but valid JSON never errors; it becomes
/// [`Geometry::Unsupported`](crate::Geometry::Unsupported) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("geometry is not valid JSON: {0}")]
    InvalidJson(String),
}

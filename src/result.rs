use crate::error::Error as NmbErr;

/// Result type used by engines and the client.
pub type Result<T> = std::result::Result<T, NmbErr>;

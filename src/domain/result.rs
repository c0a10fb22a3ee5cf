//! Result type alias for Wardhaven

use super::errors::HospitalError;

/// Result type alias for Wardhaven operations
///
/// # Examples
///
/// ```
/// use wardhaven::domain::result::Result;
/// use wardhaven::domain::errors::HospitalError;
///
/// fn failing_function() -> Result<()> {
///     Err(HospitalError::missing("last_name"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, HospitalError>;

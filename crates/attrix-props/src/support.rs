//! Shared helpers for container property configuration and validation.

use attrix_core::{ConfigError, ValidationError};

pub(crate) use attrix_core::json_kind_name;

/// Reject out-of-order length bounds at configuration time.
pub(crate) fn config_bounds(
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), ConfigError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ConfigError::BoundsOutOfOrder { min, max });
        }
    }
    Ok(())
}

/// Render the configured bounds for info text and error messages, or
/// `None` when the length is unconstrained.
pub(crate) fn bounds_text(min: Option<usize>, max: Option<usize>) -> Option<String> {
    match (min, max) {
        (None, None) => None,
        (Some(min), None) => Some(format!("length >= {min}")),
        (Some(min), Some(max)) if min == max => Some(format!("length of {min}")),
        (min, Some(max)) => Some(format!(
            "length between {} and {max}",
            min.unwrap_or(0)
        )),
    }
}

/// Check a validated container length against the configured bounds.
pub(crate) fn check_bounds(
    property: &str,
    len: usize,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), ValidationError> {
    let in_range = min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m);
    if in_range {
        Ok(())
    } else {
        Err(ValidationError::LengthOutOfBounds {
            property: property.to_string(),
            len,
            bounds: bounds_text(min, max).unwrap_or_else(|| "any length".to_string()),
        })
    }
}

/// Errors from validating externally supplied parameters.
///
/// Raised when a noise, camera, terrain, light, or water setting is outside
/// its domain. Construction fails; nothing is clamped behind the caller's back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be strictly positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("terrain subdivisions must be at least 1")]
    ZeroSubdivisions,
}

/// Reject NaN and infinities.
pub fn ensure_finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

/// Reject non-finite, zero, and negative values.
pub fn ensure_positive(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    let value = ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_pass() {
        assert_eq!(ensure_positive("amplitude", 0.5), Ok(0.5));
    }

    #[test]
    fn zero_and_negative_rejected() {
        assert!(matches!(
            ensure_positive("amplitude", 0.0),
            Err(ConfigError::NonPositive { field: "amplitude", .. })
        ));
        assert!(matches!(
            ensure_positive("frequency", -1.0),
            Err(ConfigError::NonPositive { field: "frequency", .. })
        ));
    }

    #[test]
    fn nan_rejected_as_non_finite() {
        assert_eq!(
            ensure_positive("gain", f32::NAN),
            Err(ConfigError::NonFinite { field: "gain" })
        );
        assert_eq!(
            ensure_finite("fudge", f32::INFINITY),
            Err(ConfigError::NonFinite { field: "fudge" })
        );
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = ConfigError::NonPositive {
            field: "lacunarity",
            value: 0.0,
        };
        assert!(err.to_string().contains("lacunarity"));
    }
}

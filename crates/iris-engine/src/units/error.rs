use crate::monitor::CalibrationField;

/// Errors raised by unit conversion.
///
/// All of them are raised synchronously by the call that needed the missing
/// data; none are retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    /// The conversion needs a physical monitor field that is not set.
    #[error("monitor `{monitor}` has no known {field}; set it before using physical units")]
    CalibrationMissing {
        monitor: String,
        field: CalibrationField,
    },

    /// Input was not shaped as paired (x, y) coordinates.
    #[error("expected an array of shape {expected}, got {found:?}")]
    Shape {
        expected: &'static str,
        found: Vec<usize>,
    },

    #[error("unit space `{0}` is not registered")]
    UnknownUnit(String),

    #[error("unit space `{0}` is already registered")]
    DuplicateUnit(String),

    /// The unit space exists but the requested operation has no meaning for it.
    #[error("unit space `{unit}` does not support {operation}")]
    Unsupported {
        unit: String,
        operation: &'static str,
    },
}

impl UnitError {
    pub(crate) fn shape(expected: &'static str, found: &[usize]) -> Self {
        Self::Shape {
            expected,
            found: found.to_vec(),
        }
    }
}

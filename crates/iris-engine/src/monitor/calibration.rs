use serde::{Deserialize, Serialize};

use crate::units::UnitError;

/// Size of one degree of visual angle at unit viewing distance (≈ tan 1°).
///
/// Uncorrected degree conversions treat every degree as this size, which is
/// exact at the screen centre and increasingly wrong towards the edges of a
/// flat screen.
pub const DEG_TAN: f64 = 0.017455;

/// Calibration fields that conversions may depend on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CalibrationField {
    WidthCm,
    DistanceCm,
    SizePix,
}

/// Errors raised while building or loading a calibration.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("monitor `{monitor}`: {field} must be positive and finite, got {value}")]
    Invalid {
        monitor: String,
        field: CalibrationField,
        value: f64,
    },
    #[error("monitor calibration is not valid JSON")]
    Json(#[from] serde_json::Error),
}

/// Physical description of a display.
///
/// Fields are optional because calibrations are often only partially known
/// (e.g. a laptop whose viewing distance was never measured). Conversions that
/// need a missing field fail with [`UnitError::CalibrationMissing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorCalibration {
    name: String,
    #[serde(default)]
    width_cm: Option<f64>,
    #[serde(default)]
    distance_cm: Option<f64>,
    #[serde(default)]
    size_pix: Option<[u32; 2]>,
    /// Opaque to the engine; carried for the gamma/linearisation layer.
    #[serde(default)]
    gamma: Option<f64>,
}

impl MonitorCalibration {
    /// Creates an empty calibration. Only unit spaces that need no physical
    /// information (`pix`, `norm`, `height`) work until fields are set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width_cm: None,
            distance_cm: None,
            size_pix: None,
            gamma: None,
        }
    }

    /// Loads a calibration from JSON and validates every present field.
    ///
    /// ```json
    /// { "name": "lab-crt", "width_cm": 40.0, "distance_cm": 57.0, "size_pix": [1024, 768] }
    /// ```
    pub fn from_json(src: &str) -> Result<Self, CalibrationError> {
        let cal: Self = serde_json::from_str(src)?;
        cal.validate()?;
        Ok(cal)
    }

    pub fn to_json(&self) -> Result<String, CalibrationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Re-checks the invariants enforced by the setters.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if let Some(v) = self.width_cm {
            self.check(CalibrationField::WidthCm, v)?;
        }
        if let Some(v) = self.distance_cm {
            self.check(CalibrationField::DistanceCm, v)?;
        }
        if let Some([w, h]) = self.size_pix {
            self.check(CalibrationField::SizePix, w.min(h) as f64)?;
        }
        Ok(())
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width_cm(&self) -> Option<f64> {
        self.width_cm
    }

    pub fn distance_cm(&self) -> Option<f64> {
        self.distance_cm
    }

    pub fn size_pix(&self) -> Option<[u32; 2]> {
        self.size_pix
    }

    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    // ── setters ───────────────────────────────────────────────────────────

    pub fn set_width_cm(&mut self, cm: f64) -> Result<(), CalibrationError> {
        self.check(CalibrationField::WidthCm, cm)?;
        self.width_cm = Some(cm);
        Ok(())
    }

    pub fn set_distance_cm(&mut self, cm: f64) -> Result<(), CalibrationError> {
        self.check(CalibrationField::DistanceCm, cm)?;
        self.distance_cm = Some(cm);
        Ok(())
    }

    pub fn set_size_pix(&mut self, size: [u32; 2]) -> Result<(), CalibrationError> {
        self.check(CalibrationField::SizePix, size[0].min(size[1]) as f64)?;
        self.size_pix = Some(size);
        Ok(())
    }

    pub fn set_gamma(&mut self, gamma: Option<f64>) {
        self.gamma = gamma;
    }

    pub fn with_width_cm(mut self, cm: f64) -> Result<Self, CalibrationError> {
        self.set_width_cm(cm)?;
        Ok(self)
    }

    pub fn with_distance_cm(mut self, cm: f64) -> Result<Self, CalibrationError> {
        self.set_distance_cm(cm)?;
        Ok(self)
    }

    pub fn with_size_pix(mut self, size: [u32; 2]) -> Result<Self, CalibrationError> {
        self.set_size_pix(size)?;
        Ok(self)
    }

    // ── required fields ───────────────────────────────────────────────────

    pub fn require_width_cm(&self) -> Result<f64, UnitError> {
        self.width_cm.ok_or_else(|| self.missing(CalibrationField::WidthCm))
    }

    pub fn require_distance_cm(&self) -> Result<f64, UnitError> {
        self.distance_cm.ok_or_else(|| self.missing(CalibrationField::DistanceCm))
    }

    /// Horizontal resolution; the only axis the physical scale is derived from.
    pub fn require_width_pix(&self) -> Result<f64, UnitError> {
        self.size_pix
            .map(|[w, _]| w as f64)
            .ok_or_else(|| self.missing(CalibrationField::SizePix))
    }

    /// Pixels per centimetre along the horizontal axis.
    ///
    /// Pixels are assumed square, so the same factor applies vertically.
    pub fn pix_per_cm(&self) -> Result<f64, UnitError> {
        let width_pix = self.require_width_pix()?;
        let width_cm = self.require_width_cm()?;
        Ok(width_pix / width_cm)
    }

    /// Centimetres covered by one (uncorrected) degree at the screen centre.
    pub fn cm_per_deg(&self) -> Result<f64, UnitError> {
        Ok(self.require_distance_cm()? * DEG_TAN)
    }

    /// Pixels covered by one (uncorrected) degree at the screen centre.
    pub fn pix_per_deg(&self) -> Result<f64, UnitError> {
        let cm_per_deg = self.cm_per_deg()?;
        Ok(cm_per_deg * self.pix_per_cm()?)
    }

    fn missing(&self, field: CalibrationField) -> UnitError {
        UnitError::CalibrationMissing {
            monitor: self.name.clone(),
            field,
        }
    }

    fn check(&self, field: CalibrationField, value: f64) -> Result<(), CalibrationError> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(CalibrationError::Invalid {
                monitor: self.name.clone(),
                field,
                value,
            })
        }
    }
}

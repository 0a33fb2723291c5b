use std::fmt;

use crate::monitor::MonitorCalibration;

use super::UnitError;

/// Coordinate system a stimulus is authored in.
///
/// Built-in spaces are dispatched statically by [`super::UnitRegistry`].
/// Any other name parses to `Custom` and is resolved against the registry's
/// strategy table at conversion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, strum::EnumString)]
pub enum UnitSpace {
    /// Pixels, origin at the surface centre.
    #[strum(serialize = "pix")]
    Pix,
    /// Centimetres on the screen surface.
    #[strum(serialize = "cm")]
    Cm,
    /// Degrees of visual angle, every degree the size of one at the centre.
    #[strum(serialize = "deg")]
    Deg,
    /// Degrees with flat-screen correction applied to vertices and position together.
    #[strum(serialize = "degFlat")]
    DegFlat,
    /// Degrees where only the position is flat-corrected; the shape keeps its size.
    #[strum(serialize = "degFlatPos")]
    DegFlatPos,
    /// `[-1, 1]` spans the surface on each axis.
    #[default]
    #[strum(serialize = "norm")]
    Norm,
    /// `1.0` is the surface height on both axes.
    #[strum(serialize = "height")]
    Height,
    /// A space registered at runtime.
    #[strum(default)]
    Custom(String),
}

impl UnitSpace {
    /// Every built-in space, in declaration order.
    pub const BUILTIN: [UnitSpace; 7] = [
        UnitSpace::Pix,
        UnitSpace::Cm,
        UnitSpace::Deg,
        UnitSpace::DegFlat,
        UnitSpace::DegFlatPos,
        UnitSpace::Norm,
        UnitSpace::Height,
    ];

    /// Parses a unit name. Never fails: unknown names become `Custom`.
    pub fn parse(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| UnitSpace::Custom(name.to_string()))
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        match self {
            UnitSpace::Pix => "pix",
            UnitSpace::Cm => "cm",
            UnitSpace::Deg => "deg",
            UnitSpace::DegFlat => "degFlat",
            UnitSpace::DegFlatPos => "degFlatPos",
            UnitSpace::Norm => "norm",
            UnitSpace::Height => "height",
            UnitSpace::Custom(name) => name,
        }
    }

    #[inline]
    pub fn is_builtin(&self) -> bool {
        !matches!(self, UnitSpace::Custom(_))
    }

    /// Linear spaces commute with vertex/position addition: converting the sum
    /// equals summing the converted parts.
    #[inline]
    pub fn is_linear(&self) -> bool {
        matches!(
            self,
            UnitSpace::Pix | UnitSpace::Cm | UnitSpace::Deg | UnitSpace::Norm | UnitSpace::Height
        )
    }

    /// Checks up front that `monitor` carries every field this space needs.
    ///
    /// Custom spaces cannot be checked and always pass.
    pub fn check_calibration(&self, monitor: &MonitorCalibration) -> Result<(), UnitError> {
        match self {
            UnitSpace::Cm => monitor.pix_per_cm().map(|_| ()),
            UnitSpace::Deg | UnitSpace::DegFlat | UnitSpace::DegFlatPos => {
                monitor.pix_per_deg().map(|_| ())
            }
            UnitSpace::Pix | UnitSpace::Norm | UnitSpace::Height | UnitSpace::Custom(_) => Ok(()),
        }
    }
}

impl fmt::Display for UnitSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_roundtrip() {
        for unit in UnitSpace::BUILTIN {
            assert_eq!(UnitSpace::parse(unit.name()), unit);
            assert!(unit.is_builtin());
        }
    }

    #[test]
    fn from_str_accepts_builtin_and_custom_names() {
        assert_eq!("deg".parse::<UnitSpace>(), Ok(UnitSpace::Deg));
        assert_eq!("degFlatPos".parse::<UnitSpace>(), Ok(UnitSpace::DegFlatPos));
        assert_eq!("polar".parse::<UnitSpace>(), Ok(UnitSpace::Custom("polar".into())));
    }

    #[test]
    fn unknown_names_become_custom() {
        assert_eq!(UnitSpace::parse("polar"), UnitSpace::Custom("polar".into()));
        assert_eq!(UnitSpace::parse("polar").to_string(), "polar");
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(UnitSpace::parse("degflat"), UnitSpace::Custom("degflat".into()));
    }

    #[test]
    fn flat_spaces_are_not_linear() {
        assert!(!UnitSpace::DegFlat.is_linear());
        assert!(!UnitSpace::DegFlatPos.is_linear());
        assert!(UnitSpace::Deg.is_linear());
    }

    #[test]
    fn calibration_check_per_space() {
        let blank = MonitorCalibration::new("blank");
        assert!(UnitSpace::Pix.check_calibration(&blank).is_ok());
        assert!(UnitSpace::Height.check_calibration(&blank).is_ok());
        assert!(UnitSpace::Cm.check_calibration(&blank).is_err());
        assert!(UnitSpace::DegFlatPos.check_calibration(&blank).is_err());
    }
}

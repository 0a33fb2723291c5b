use std::collections::HashMap;
use std::fmt;

use ndarray::{Array2, ArrayView2};

use crate::coords::{SurfaceSize, Vec2};
use crate::monitor::MonitorCalibration;

use super::{convert, UnitError, UnitSpace};

/// Conversion strategy for a custom unit space.
///
/// Receives the same inputs as the built-in conversions even when it ignores
/// some: `N×2` vertices, the position offset (both in the custom space), the
/// monitor calibration and the surface size. Returns absolute pixel vertices.
pub trait UnitConverter: Send + Sync {
    fn to_pix(
        &self,
        vertices: ArrayView2<'_, f64>,
        pos: Vec2,
        monitor: &MonitorCalibration,
        surface: SurfaceSize,
    ) -> Result<Array2<f64>, UnitError>;
}

struct FnConverter<F>(F);

impl<F> UnitConverter for FnConverter<F>
where
    F: Fn(ArrayView2<'_, f64>, Vec2, &MonitorCalibration, SurfaceSize) -> Result<Array2<f64>, UnitError>
        + Send
        + Sync,
{
    fn to_pix(
        &self,
        vertices: ArrayView2<'_, f64>,
        pos: Vec2,
        monitor: &MonitorCalibration,
        surface: SurfaceSize,
    ) -> Result<Array2<f64>, UnitError> {
        (self.0)(vertices, pos, monitor, surface)
    }
}

/// Maps unit spaces to pixel conversions.
///
/// Built-in spaces are always available and cannot be shadowed; custom spaces
/// are added with [`register`](Self::register) or
/// [`register_fn`](Self::register_fn). One registry is typically owned by the
/// runtime and lent to every frame.
#[derive(Default)]
pub struct UnitRegistry {
    custom: HashMap<String, Box<dyn UnitConverter>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom unit space backed by a strategy object.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        converter: Box<dyn UnitConverter>,
    ) -> Result<(), UnitError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(UnitError::DuplicateUnit(name));
        }
        log::debug!("registered unit space `{name}`");
        self.custom.insert(name, converter);
        Ok(())
    }

    /// Adds a custom unit space backed by a closure.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), UnitError>
    where
        F: Fn(ArrayView2<'_, f64>, Vec2, &MonitorCalibration, SurfaceSize) -> Result<Array2<f64>, UnitError>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Box::new(FnConverter(f)))
    }

    /// True for built-in names and registered custom names.
    pub fn contains(&self, name: &str) -> bool {
        UnitSpace::parse(name).is_builtin() || self.custom.contains_key(name)
    }

    /// True if `unit` can be converted by this registry.
    pub fn supports(&self, unit: &UnitSpace) -> bool {
        match unit {
            UnitSpace::Custom(name) => self.custom.contains_key(name),
            _ => true,
        }
    }

    /// Registered custom names, sorted.
    pub fn custom_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Combines `vertices` and `pos` and converts them from `unit` to absolute pixels.
    ///
    /// `pos` and `vertices` are separate because flat-corrected placement
    /// (`degFlatPos`) treats them differently.
    pub fn convert_to_pix(
        &self,
        vertices: ArrayView2<'_, f64>,
        pos: Vec2,
        unit: &UnitSpace,
        monitor: &MonitorCalibration,
        surface: SurfaceSize,
    ) -> Result<Array2<f64>, UnitError> {
        if vertices.ncols() != 2 {
            return Err(UnitError::shape("[N, 2]", vertices.shape()));
        }

        match unit {
            UnitSpace::Pix => Ok(offset(vertices, pos)),
            UnitSpace::Cm => convert::cm_to_pix(&offset(vertices, pos), monitor),
            UnitSpace::Deg => convert::deg_to_pix(&offset(vertices, pos), monitor, false),
            UnitSpace::DegFlat => convert::deg_to_pix(&offset(vertices, pos), monitor, true),
            UnitSpace::DegFlatPos => {
                let pos_pix = convert::deg_to_pix(&pos_row(pos), monitor, true)?;
                let verts_pix = convert::deg_to_pix(&vertices, monitor, false)?;
                Ok(verts_pix + &pos_pix.row(0))
            }
            UnitSpace::Norm => Ok(offset(vertices, pos) * &surface.half().to_array()),
            UnitSpace::Height => Ok(offset(vertices, pos) * surface.height),
            UnitSpace::Custom(name) => {
                let converter = self
                    .custom
                    .get(name)
                    .ok_or_else(|| UnitError::UnknownUnit(name.clone()))?;
                converter.to_pix(vertices, pos, monitor, surface)
            }
        }
    }

    /// Like [`convert_to_pix`](Self::convert_to_pix) with the unit given by name.
    pub fn convert_to_pix_named(
        &self,
        vertices: ArrayView2<'_, f64>,
        pos: Vec2,
        unit: &str,
        monitor: &MonitorCalibration,
        surface: SurfaceSize,
    ) -> Result<Array2<f64>, UnitError> {
        self.convert_to_pix(vertices, pos, &UnitSpace::parse(unit), monitor, surface)
    }

    /// Converts a single point to pixels.
    pub fn point_to_pix(
        &self,
        point: Vec2,
        unit: &UnitSpace,
        monitor: &MonitorCalibration,
        surface: SurfaceSize,
    ) -> Result<Vec2, UnitError> {
        let zero = Array2::<f64>::zeros((1, 2));
        let pix = self.convert_to_pix(zero.view(), point, unit, monitor, surface)?;
        Ok(Vec2::new(pix[[0, 0]], pix[[0, 1]]))
    }
}

impl fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("custom", &self.custom_names())
            .finish()
    }
}

fn offset(vertices: ArrayView2<'_, f64>, pos: Vec2) -> Array2<f64> {
    &vertices + &pos.to_array()
}

fn pos_row(pos: Vec2) -> Array2<f64> {
    ndarray::arr2(&[[pos.x, pos.y]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn lab() -> MonitorCalibration {
        MonitorCalibration::new("lab")
            .with_width_cm(40.0)
            .and_then(|m| m.with_distance_cm(57.0))
            .and_then(|m| m.with_size_pix([1024, 768]))
            .unwrap()
    }

    const SURFACE: SurfaceSize = SurfaceSize::new(800.0, 600.0);

    fn square() -> Array2<f64> {
        arr2(&[[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]])
    }

    fn close(a: &Array2<f64>, b: &Array2<f64>, tol: f64) -> bool {
        a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tol)
    }

    // ── built-in dispatch ─────────────────────────────────────────────────

    #[test]
    fn pix_is_plain_offset() {
        let reg = UnitRegistry::new();
        let out = reg
            .convert_to_pix(square().view(), Vec2::new(10.0, -4.0), &UnitSpace::Pix, &lab(), SURFACE)
            .unwrap();
        assert_eq!(out, arr2(&[[9.5, -4.5], [10.5, -4.5], [10.5, -3.5], [9.5, -3.5]]));
    }

    #[test]
    fn norm_scales_by_half_surface() {
        let reg = UnitRegistry::new();
        let corners = arr2(&[[1.0, 1.0], [-1.0, -1.0]]);
        let out = reg
            .convert_to_pix(corners.view(), Vec2::zero(), &UnitSpace::Norm, &lab(), SURFACE)
            .unwrap();
        assert_eq!(out, arr2(&[[400.0, 300.0], [-400.0, -300.0]]));
    }

    #[test]
    fn height_scales_uniformly_by_surface_height() {
        let reg = UnitRegistry::new();
        let out = reg
            .convert_to_pix(arr2(&[[0.5, 0.5]]).view(), Vec2::zero(), &UnitSpace::Height, &lab(), SURFACE)
            .unwrap();
        assert_eq!(out, arr2(&[[300.0, 300.0]]));
    }

    #[test]
    fn every_builtin_preserves_origin() {
        let reg = UnitRegistry::new();
        let zero = Array2::<f64>::zeros((1, 2));
        for unit in UnitSpace::BUILTIN {
            let out = reg
                .convert_to_pix(zero.view(), Vec2::zero(), &unit, &lab(), SURFACE)
                .unwrap();
            assert!(close(&out, &zero, 0.0), "{unit} moved the origin: {out:?}");
        }
    }

    #[test]
    fn linear_spaces_commute_with_offset() {
        let reg = UnitRegistry::new();
        let m = lab();
        let pos = Vec2::new(3.0, -2.0);
        for unit in UnitSpace::BUILTIN.iter().filter(|u| u.is_linear()) {
            let combined = reg.convert_to_pix(square().view(), pos, unit, &m, SURFACE).unwrap();
            let verts = reg.convert_to_pix(square().view(), Vec2::zero(), unit, &m, SURFACE).unwrap();
            let p = reg.point_to_pix(pos, unit, &m, SURFACE).unwrap();
            let separate = verts + &p.to_array();
            assert!(close(&combined, &separate, 1e-9), "{unit}");
        }
    }

    #[test]
    fn deg_flat_variants_differ_off_centre() {
        let reg = UnitRegistry::new();
        let m = lab();
        let pos = Vec2::new(20.0, 15.0);
        let flat = reg.convert_to_pix(square().view(), pos, &UnitSpace::DegFlat, &m, SURFACE).unwrap();
        let flat_pos = reg
            .convert_to_pix(square().view(), pos, &UnitSpace::DegFlatPos, &m, SURFACE)
            .unwrap();
        assert!(!close(&flat, &flat_pos, 1e-6));
    }

    #[test]
    fn deg_flat_pos_keeps_shape_size() {
        // The shape's extent matches plain degrees; only placement is corrected.
        let reg = UnitRegistry::new();
        let m = lab();
        let pos = Vec2::new(25.0, 0.0);
        let out = reg
            .convert_to_pix(square().view(), pos, &UnitSpace::DegFlatPos, &m, SURFACE)
            .unwrap();
        let width = out[[1, 0]] - out[[0, 0]];
        assert!((width - m.pix_per_deg().unwrap()).abs() < 1e-9);

        let centre = reg.point_to_pix(pos, &UnitSpace::DegFlat, &m, SURFACE).unwrap();
        let mid_x = (out[[1, 0]] + out[[0, 0]]) / 2.0;
        assert!((mid_x - centre.x).abs() < 1e-9);
    }

    #[test]
    fn deg_flat_stretches_eccentric_shapes() {
        let reg = UnitRegistry::new();
        let m = lab();
        let out = reg
            .convert_to_pix(square().view(), Vec2::new(25.0, 0.0), &UnitSpace::DegFlat, &m, SURFACE)
            .unwrap();
        let width = out[[1, 0]] - out[[0, 0]];
        assert!(width > m.pix_per_deg().unwrap());
    }

    #[test]
    fn physical_spaces_fail_without_calibration() {
        let reg = UnitRegistry::new();
        let blank = MonitorCalibration::new("blank");
        for unit in [UnitSpace::Cm, UnitSpace::Deg, UnitSpace::DegFlat, UnitSpace::DegFlatPos] {
            let res = reg.convert_to_pix(square().view(), Vec2::zero(), &unit, &blank, SURFACE);
            assert!(matches!(res, Err(UnitError::CalibrationMissing { .. })), "{unit}");
        }
    }

    #[test]
    fn rejects_vertices_without_two_columns() {
        let reg = UnitRegistry::new();
        let bad = arr2(&[[1.0], [2.0]]);
        let res = reg.convert_to_pix(bad.view(), Vec2::zero(), &UnitSpace::Pix, &lab(), SURFACE);
        assert!(matches!(res, Err(UnitError::Shape { .. })));
    }

    // ── custom spaces ─────────────────────────────────────────────────────

    #[test]
    fn unknown_custom_unit_fails() {
        let reg = UnitRegistry::new();
        let res = reg.convert_to_pix_named(square().view(), Vec2::zero(), "polar", &lab(), SURFACE);
        assert_eq!(res, Err(UnitError::UnknownUnit("polar".into())));
    }

    #[test]
    fn registered_closure_is_used() {
        let mut reg = UnitRegistry::new();
        reg.register_fn("double", |v, pos, _mon, _surface| Ok((&v + &pos.to_array()) * 2.0))
            .unwrap();
        let out = reg
            .convert_to_pix_named(arr2(&[[1.0, 2.0]]).view(), Vec2::new(1.0, 1.0), "double", &lab(), SURFACE)
            .unwrap();
        assert_eq!(out, arr2(&[[4.0, 6.0]]));
        assert!(reg.supports(&UnitSpace::parse("double")));
        assert_eq!(reg.custom_names(), vec!["double"]);
    }

    #[test]
    fn registered_strategy_sees_surface_and_monitor() {
        struct QuarterWidth;
        impl UnitConverter for QuarterWidth {
            fn to_pix(
                &self,
                vertices: ArrayView2<'_, f64>,
                pos: Vec2,
                monitor: &MonitorCalibration,
                surface: SurfaceSize,
            ) -> Result<Array2<f64>, UnitError> {
                monitor.require_distance_cm()?;
                Ok((&vertices + &pos.to_array()) * (surface.width / 4.0))
            }
        }

        let mut reg = UnitRegistry::new();
        reg.register("quarter", Box::new(QuarterWidth)).unwrap();
        let out = reg
            .convert_to_pix_named(arr2(&[[1.0, 0.0]]).view(), Vec2::zero(), "quarter", &lab(), SURFACE)
            .unwrap();
        assert_eq!(out, arr2(&[[200.0, 0.0]]));

        let blank = MonitorCalibration::new("blank");
        let res = reg.convert_to_pix_named(arr2(&[[1.0, 0.0]]).view(), Vec2::zero(), "quarter", &blank, SURFACE);
        assert!(matches!(res, Err(UnitError::CalibrationMissing { .. })));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = UnitRegistry::new();
        reg.register_fn("polar", |v, _, _, _| Ok(v.to_owned())).unwrap();
        assert_eq!(
            reg.register_fn("polar", |v, _, _, _| Ok(v.to_owned())),
            Err(UnitError::DuplicateUnit("polar".into()))
        );
    }

    #[test]
    fn builtin_names_cannot_be_shadowed() {
        let mut reg = UnitRegistry::new();
        assert_eq!(
            reg.register_fn("deg", |v, _, _, _| Ok(v.to_owned())),
            Err(UnitError::DuplicateUnit("deg".into()))
        );
    }
}

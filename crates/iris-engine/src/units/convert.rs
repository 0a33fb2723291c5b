//! Physical unit conversions.
//!
//! All functions are generic over the array dimension so they accept scalars
//! (`arr0`), vectors and `N×2` vertex arrays alike. The exception is
//! flat-corrected degree conversion: horizontal and vertical angles are coupled
//! through the viewing geometry, so those paths require an `N×2` array.
//!
//! Flat correction: with the eye at distance `d` in front of the screen centre,
//! a point at angles `(ax, ay)` lies at
//!
//! ```text
//! cm_x = hypot(d, d·tan ay) · tan ax
//! cm_y = hypot(d, d·tan ax) · tan ay
//! ```
//!
//! so a degree covers more centimetres the further it is from the centre.

use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension, Ix2};

use crate::monitor::{MonitorCalibration, DEG_TAN};

use super::UnitError;

const PAIRED: &str = "[N, 2]";

/// Centimetres on the screen to pixels.
pub fn cm_to_pix<S, D>(cm: &ArrayBase<S, D>, monitor: &MonitorCalibration) -> Result<Array<f64, D>, UnitError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let scale = monitor.pix_per_cm()?;
    Ok(cm.mapv(|v| v * scale))
}

/// Pixels to centimetres on the screen.
pub fn pix_to_cm<S, D>(pix: &ArrayBase<S, D>, monitor: &MonitorCalibration) -> Result<Array<f64, D>, UnitError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let scale = monitor.pix_per_cm()?;
    Ok(pix.mapv(|v| v / scale))
}

/// Degrees of visual angle to centimetres on the screen.
///
/// With `correct_flat == false` every degree has the size of a degree at the
/// screen centre. With `correct_flat == true` the input must be `N×2`.
pub fn deg_to_cm<S, D>(
    degrees: &ArrayBase<S, D>,
    monitor: &MonitorCalibration,
    correct_flat: bool,
) -> Result<Array<f64, D>, UnitError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let dist = monitor.require_distance_cm()?;
    if !correct_flat {
        let scale = dist * DEG_TAN;
        return Ok(degrees.mapv(|v| v * scale));
    }

    let xy = paired(degrees)?;
    let mut out = Array2::<f64>::zeros(xy.raw_dim());
    for (src, mut dst) in xy.rows().into_iter().zip(out.rows_mut()) {
        let tx = src[0].to_radians().tan();
        let ty = src[1].to_radians().tan();
        dst[0] = dist.hypot(ty * dist) * tx;
        dst[1] = dist.hypot(tx * dist) * ty;
    }
    restore_dim(out, degrees.shape())
}

/// Centimetres on the screen to degrees of visual angle.
///
/// Exact inverse of [`deg_to_cm`] for both settings of `correct_flat`.
pub fn cm_to_deg<S, D>(
    cm: &ArrayBase<S, D>,
    monitor: &MonitorCalibration,
    correct_flat: bool,
) -> Result<Array<f64, D>, UnitError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let dist = monitor.require_distance_cm()?;
    if !correct_flat {
        let scale = dist * DEG_TAN;
        return Ok(cm.mapv(|v| v / scale));
    }

    let xy = paired(cm)?;
    let mut out = Array2::<f64>::zeros(xy.raw_dim());
    for (src, mut dst) in xy.rows().into_iter().zip(out.rows_mut()) {
        let (tx, ty) = flat_tangents(src[0] / dist, src[1] / dist);
        dst[0] = tx.atan().to_degrees();
        dst[1] = ty.atan().to_degrees();
    }
    restore_dim(out, cm.shape())
}

/// Degrees of visual angle to pixels.
pub fn deg_to_pix<S, D>(
    degrees: &ArrayBase<S, D>,
    monitor: &MonitorCalibration,
    correct_flat: bool,
) -> Result<Array<f64, D>, UnitError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    // Fail on missing pixel fields before doing any trigonometry.
    let scale = monitor.pix_per_cm()?;
    let cm = deg_to_cm(degrees, monitor, correct_flat)?;
    Ok(cm.mapv_into(|v| v * scale))
}

/// Pixels to degrees of visual angle.
pub fn pix_to_deg<S, D>(
    pix: &ArrayBase<S, D>,
    monitor: &MonitorCalibration,
    correct_flat: bool,
) -> Result<Array<f64, D>, UnitError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let cm = pix_to_cm(pix, monitor)?;
    cm_to_deg(&cm, monitor, correct_flat)
}

fn paired<S, D>(a: &ArrayBase<S, D>) -> Result<ArrayView2<'_, f64>, UnitError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let view = a
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| UnitError::shape(PAIRED, a.shape()))?;
    if view.ncols() != 2 {
        return Err(UnitError::shape(PAIRED, a.shape()));
    }
    Ok(view)
}

fn restore_dim<D: Dimension>(out: Array2<f64>, shape: &[usize]) -> Result<Array<f64, D>, UnitError> {
    out.into_dimensionality::<D>()
        .map_err(|_| UnitError::shape(PAIRED, shape))
}

/// Recovers `(tan ax, tan ay)` from normalised flat-screen offsets
/// `a = cm_x / d`, `b = cm_y / d`.
///
/// With `u = tan² ax`, `v = tan² ay` the forward mapping gives
/// `a² = u (1 + v)` and `b² = v (1 + u)`, hence `u − v = a² − b²` and each
/// unknown is the non-negative root of a quadratic.
fn flat_tangents(a: f64, b: f64) -> (f64, f64) {
    let c = a * a - b * b;
    let u = positive_root(1.0 - c, a * a);
    let v = positive_root(1.0 + c, b * b);
    (u.sqrt().copysign(a), v.sqrt().copysign(b))
}

/// Non-negative root of `x² + p·x − q = 0` for `q ≥ 0`.
fn positive_root(p: f64, q: f64) -> f64 {
    if q == 0.0 {
        return (-p).max(0.0);
    }
    let disc = (p * p + 4.0 * q).sqrt();
    if p >= 0.0 {
        // Avoids cancellation when p dominates.
        2.0 * q / (p + disc)
    } else {
        (disc - p) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, arr1, arr2, Array1};

    fn lab() -> MonitorCalibration {
        MonitorCalibration::new("lab")
            .with_width_cm(40.0)
            .and_then(|m| m.with_distance_cm(57.0))
            .and_then(|m| m.with_size_pix([1024, 768]))
            .unwrap()
    }

    fn close<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>, tol: f64) -> bool {
        a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tol)
    }

    fn points() -> Array2<f64> {
        arr2(&[[0.0, 0.0], [5.0, -3.0], [-12.5, 20.0], [30.0, 30.0], [0.001, -0.002]])
    }

    // ── cm ↔ pix ──────────────────────────────────────────────────────────

    #[test]
    fn cm_pix_roundtrip() {
        let m = lab();
        let cm = arr1(&[-10.0, 0.0, 2.5, 17.0]);
        let back = pix_to_cm(&cm_to_pix(&cm, &m).unwrap(), &m).unwrap();
        assert!(close(&back, &cm, 1e-12));
    }

    #[test]
    fn cm_to_pix_scale() {
        let px = cm_to_pix(&arr0(1.0), &lab()).unwrap();
        assert!((px.into_scalar() - 25.6).abs() < 1e-12);
    }

    #[test]
    fn cm_to_pix_requires_width_and_resolution() {
        let no_width = MonitorCalibration::new("a").with_size_pix([800, 600]).unwrap();
        let no_pix = MonitorCalibration::new("b").with_width_cm(30.0).unwrap();
        let x = arr1(&[1.0]);
        assert!(matches!(cm_to_pix(&x, &no_width), Err(UnitError::CalibrationMissing { .. })));
        assert!(matches!(pix_to_cm(&x, &no_pix), Err(UnitError::CalibrationMissing { .. })));
    }

    // ── deg ↔ cm ──────────────────────────────────────────────────────────

    #[test]
    fn deg_cm_roundtrip_uncorrected() {
        let m = lab();
        let deg = points();
        let back = cm_to_deg(&deg_to_cm(&deg, &m, false).unwrap(), &m, false).unwrap();
        assert!(close(&back, &deg, 1e-10));
    }

    #[test]
    fn deg_cm_roundtrip_flat_corrected() {
        let m = lab();
        let deg = points();
        let cm = deg_to_cm(&deg, &m, true).unwrap();
        let back = cm_to_deg(&cm, &m, true).unwrap();
        assert!(close(&back, &deg, 1e-9), "{back:?}");
    }

    #[test]
    fn flat_correction_grows_with_eccentricity() {
        let m = lab();
        let near = deg_to_cm(&arr2(&[[1.0, 0.0]]), &m, true).unwrap();
        let far = deg_to_cm(&arr2(&[[31.0, 0.0], [30.0, 0.0]]), &m, true).unwrap();
        let near_step = near[[0, 0]];
        let far_step = far[[0, 0]] - far[[1, 0]];
        assert!(far_step > near_step * 1.2);
    }

    #[test]
    fn flat_correction_couples_axes() {
        // A vertical offset lengthens the horizontal distance.
        let m = lab();
        let cm = deg_to_cm(&arr2(&[[10.0, 0.0], [10.0, 20.0]]), &m, true).unwrap();
        assert!(cm[[1, 0]] > cm[[0, 0]]);
    }

    #[test]
    fn flat_correction_rejects_unpaired_shapes() {
        let m = lab();
        let flat: Array1<f64> = arr1(&[1.0, 2.0]);
        let column = arr2(&[[1.0], [2.0]]);
        let triple = arr2(&[[1.0, 2.0, 3.0]]);
        assert!(matches!(deg_to_cm(&flat, &m, true), Err(UnitError::Shape { .. })));
        assert!(matches!(deg_to_cm(&column, &m, true), Err(UnitError::Shape { .. })));
        assert!(matches!(cm_to_deg(&triple, &m, true), Err(UnitError::Shape { .. })));
        assert!(matches!(deg_to_pix(&arr0(1.0), &m, true), Err(UnitError::Shape { .. })));
    }

    #[test]
    fn flat_correction_returns_same_shape() {
        let m = lab();
        let out = deg_to_pix(&points(), &m, true).unwrap();
        assert_eq!(out.shape(), &[5, 2]);
    }

    #[test]
    fn flat_correction_accepts_dynamic_dimension() {
        let m = lab();
        let dynamic = points().into_dyn();
        let out = deg_to_cm(&dynamic, &m, true).unwrap();
        assert_eq!(out.shape(), &[5, 2]);
    }

    #[test]
    fn deg_requires_distance() {
        let m = MonitorCalibration::new("nodist")
            .with_width_cm(40.0)
            .and_then(|m| m.with_size_pix([1024, 768]))
            .unwrap();
        let x = arr1(&[1.0]);
        assert!(matches!(deg_to_cm(&x, &m, false), Err(UnitError::CalibrationMissing { .. })));
        assert!(matches!(deg_to_pix(&x, &m, false), Err(UnitError::CalibrationMissing { .. })));
        assert!(matches!(pix_to_deg(&x, &m, false), Err(UnitError::CalibrationMissing { .. })));
    }

    // ── deg ↔ pix ─────────────────────────────────────────────────────────

    #[test]
    fn deg_to_pix_one_degree() {
        let px = deg_to_pix(&arr0(1.0), &lab(), false).unwrap().into_scalar();
        let expected = 1024.0 / 40.0 * (57.0 * 0.017455);
        assert!((px - expected).abs() < 1e-9);
        assert!((px - 25.4).abs() < 0.1);
    }

    #[test]
    fn deg_pix_roundtrip_both_modes() {
        let m = lab();
        let deg = points();
        for flat in [false, true] {
            let back = pix_to_deg(&deg_to_pix(&deg, &m, flat).unwrap(), &m, flat).unwrap();
            assert!(close(&back, &deg, 1e-9), "flat={flat}: {back:?}");
        }
    }

    #[test]
    fn origin_is_fixed_point() {
        let m = lab();
        let zero = arr2(&[[0.0, 0.0]]);
        for flat in [false, true] {
            assert!(close(&deg_to_pix(&zero, &m, flat).unwrap(), &zero, 0.0));
        }
        assert!(close(&cm_to_pix(&zero, &m).unwrap(), &zero, 0.0));
    }

    // ── positive_root ─────────────────────────────────────────────────────

    #[test]
    fn positive_root_solves_quadratic() {
        for (p, q) in [(1.0, 2.0), (-3.0, 0.5), (0.0, 4.0), (1e6, 1e-6), (-2.0, 0.0)] {
            let x: f64 = positive_root(p, q);
            assert!(x >= 0.0);
            assert!((x * x + p * x - q).abs() < 1e-9, "p={p} q={q} x={x}");
        }
    }
}

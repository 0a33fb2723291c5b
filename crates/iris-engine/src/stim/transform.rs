use ndarray::{arr1, Array2};

use crate::coords::{SurfaceSize, Vec2};
use crate::monitor::MonitorCalibration;
use crate::units::{convert, UnitError, UnitRegistry, UnitSpace};

use super::shapes::{point_in_polygon, rect_vertices, regular_polygon};

/// Placement of one stimulus.
///
/// Pixel vertices are computed as
/// `convert_to_pix(rotate(base × size × flip, ori), pos, units)` and cached
/// until a mutator runs or the surface size changes. Orientation is in
/// degrees, positive clockwise.
#[derive(Debug, Clone)]
pub struct StimTransform {
    base: Array2<f64>,
    units: UnitSpace,
    pos: Vec2,
    size: Vec2,
    ori: f64,
    flip_horiz: bool,
    flip_vert: bool,

    cache: Option<(SurfaceSize, Array2<f64>)>,
}

impl StimTransform {
    /// Stimulus with `N×2` base vertices, unit size, at the origin.
    pub fn new(base: Array2<f64>, units: UnitSpace) -> Result<Self, UnitError> {
        if base.ncols() != 2 {
            return Err(UnitError::shape("[N, 2]", base.shape()));
        }
        Ok(Self {
            base,
            units,
            pos: Vec2::zero(),
            size: Vec2::splat(1.0),
            ori: 0.0,
            flip_horiz: false,
            flip_vert: false,
            cache: None,
        })
    }

    pub fn rect(units: UnitSpace) -> Self {
        Self::from_valid(rect_vertices(), units)
    }

    pub fn polygon(edges: usize, units: UnitSpace) -> Self {
        Self::from_valid(regular_polygon(edges), units)
    }

    fn from_valid(base: Array2<f64>, units: UnitSpace) -> Self {
        Self {
            base,
            units,
            pos: Vec2::zero(),
            size: Vec2::splat(1.0),
            ori: 0.0,
            flip_horiz: false,
            flip_vert: false,
            cache: None,
        }
    }

    // ── builders ──────────────────────────────────────────────────────────

    pub fn with_pos(mut self, pos: impl Into<Vec2>) -> Self {
        self.set_pos(pos);
        self
    }

    pub fn with_size(mut self, size: impl Into<Vec2>) -> Self {
        self.set_size(size);
        self
    }

    pub fn with_ori(mut self, degrees: f64) -> Self {
        self.set_ori(degrees);
        self
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn base_vertices(&self) -> &Array2<f64> {
        &self.base
    }

    #[inline]
    pub fn units(&self) -> &UnitSpace {
        &self.units
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn ori(&self) -> f64 {
        self.ori
    }

    #[inline]
    pub fn flips(&self) -> (bool, bool) {
        (self.flip_horiz, self.flip_vert)
    }

    /// True when the next [`vertices_pix`](Self::vertices_pix) recomputes.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.cache.is_none()
    }

    // ── mutators ──────────────────────────────────────────────────────────

    pub fn set_vertices(&mut self, base: Array2<f64>) -> Result<(), UnitError> {
        if base.ncols() != 2 {
            return Err(UnitError::shape("[N, 2]", base.shape()));
        }
        self.base = base;
        self.invalidate();
        Ok(())
    }

    pub fn set_units(&mut self, units: UnitSpace) {
        self.units = units;
        self.invalidate();
    }

    pub fn set_pos(&mut self, pos: impl Into<Vec2>) {
        self.pos = pos.into();
        self.invalidate();
    }

    pub fn set_size(&mut self, size: impl Into<Vec2>) {
        self.size = size.into();
        self.invalidate();
    }

    pub fn set_ori(&mut self, degrees: f64) {
        self.ori = degrees;
        self.invalidate();
    }

    pub fn set_flip_horiz(&mut self, on: bool) {
        self.flip_horiz = on;
        self.invalidate();
    }

    pub fn set_flip_vert(&mut self, on: bool) {
        self.flip_vert = on;
        self.invalidate();
    }

    /// Forces recomputation, e.g. after the monitor calibration changed.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    // ── geometry ──────────────────────────────────────────────────────────

    /// Base vertices scaled, flipped and rotated, still in the stimulus units
    /// and relative to `pos`.
    pub fn local_vertices(&self) -> Array2<f64> {
        let flip = |on: bool| if on { -1.0 } else { 1.0 };
        let scale = arr1(&[
            self.size.x * flip(self.flip_horiz),
            self.size.y * flip(self.flip_vert),
        ]);
        let scaled = &self.base * &scale;

        let (sin, cos) = self.ori.to_radians().sin_cos();
        let rotation = ndarray::array![[cos, -sin], [sin, cos]];
        scaled.dot(&rotation)
    }

    /// Absolute pixel vertices for drawing on a surface of `surface` size.
    pub fn vertices_pix(
        &mut self,
        registry: &UnitRegistry,
        monitor: &MonitorCalibration,
        surface: SurfaceSize,
    ) -> Result<&Array2<f64>, UnitError> {
        let verts = match self.cache.take() {
            Some((cached_for, verts)) if cached_for == surface => verts,
            _ => registry.convert_to_pix(
                self.local_vertices().view(),
                self.pos,
                &self.units,
                monitor,
                surface,
            )?,
        };
        Ok(&self.cache.insert((surface, verts)).1)
    }

    /// Whether `point` lies inside the stimulus outline.
    ///
    /// `point_units` defaults to the stimulus' own units.
    pub fn contains(
        &mut self,
        point: Vec2,
        point_units: Option<&UnitSpace>,
        registry: &UnitRegistry,
        monitor: &MonitorCalibration,
        surface: SurfaceSize,
    ) -> Result<bool, UnitError> {
        let units = point_units.unwrap_or(&self.units).clone();
        let point_pix = registry.point_to_pix(point, &units, monitor, surface)?;
        let verts = self.vertices_pix(registry, monitor, surface)?;
        Ok(point_in_polygon(point_pix, verts.view()))
    }
}

/// Expresses a pixel size in `units`, e.g. the natural size of an image.
///
/// Sizes are extents, so both flat degree spaces use the uncorrected
/// conversion. Custom spaces have no inverse and are rejected.
pub fn size_from_pixels(
    size_pix: Vec2,
    units: &UnitSpace,
    monitor: &MonitorCalibration,
    surface: SurfaceSize,
) -> Result<Vec2, UnitError> {
    let pix = size_pix.to_array();
    let out = match units {
        UnitSpace::Pix => pix,
        UnitSpace::Cm => convert::pix_to_cm(&pix, monitor)?,
        UnitSpace::Deg | UnitSpace::DegFlat | UnitSpace::DegFlatPos => {
            convert::pix_to_deg(&pix, monitor, false)?
        }
        UnitSpace::Norm => pix / &surface.half().to_array(),
        UnitSpace::Height => pix / surface.height,
        UnitSpace::Custom(name) => {
            return Err(UnitError::Unsupported {
                unit: name.clone(),
                operation: "size_from_pixels",
            });
        }
    };
    Ok(Vec2::new(out[0], out[1]))
}

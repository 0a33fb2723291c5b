use std::time::{Duration, Instant};

use ndarray::ArrayView2;

use crate::coords::SurfaceSize;
use crate::device::Gpu;
use crate::paint::Color;
use crate::render::{triangulate_fan, PolygonRenderer, PolygonVertex, RenderCtx, RenderTarget};
use crate::time::{SwapError, SwapSurface};

/// A window's GPU surface plus the polygons queued for its next frame.
///
/// Drawing only queues geometry; `swap_buffers` renders the queue over the
/// background colour and presents. Without `clear_buffer` the queue is kept
/// and shown again on the next swap, like an uncleared back buffer.
pub struct WindowSurface<'w> {
    gpu: Gpu<'w>,
    renderer: PolygonRenderer,
    pending: Vec<PolygonVertex>,
    background: Color,
    origin: Instant,
}

impl<'w> WindowSurface<'w> {
    pub fn new(gpu: Gpu<'w>, background: Color) -> Self {
        Self {
            gpu,
            renderer: PolygonRenderer::new(),
            pending: Vec::new(),
            background,
            origin: Instant::now(),
        }
    }

    #[inline]
    pub fn gpu_mut(&mut self) -> &mut Gpu<'w> {
        &mut self.gpu
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::from(self.gpu.size())
    }

    /// Queues a convex pixel-space polygon for the next swap.
    pub fn push_polygon(&mut self, vertices: ArrayView2<'_, f64>, color: Color) {
        if triangulate_fan(vertices, color, &mut self.pending) == 0 {
            log::debug!("skipped polygon with {} vertices", vertices.nrows());
        }
    }
}

impl SwapSurface for WindowSurface<'_> {
    fn swap_buffers(&mut self, clear_buffer: bool) -> Result<(), SwapError> {
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                // The frame is skipped; a cleared frame must not leak into the next one.
                if clear_buffer {
                    self.pending.clear();
                }
                let action = self.gpu.handle_surface_error(&err);
                return Err(action.into_swap_error(&err));
            }
        };

        {
            let ctx = RenderCtx::new(
                self.gpu.device(),
                self.gpu.queue(),
                self.gpu.surface_format(),
                SurfaceSize::from(self.gpu.size()),
            );
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            self.renderer
                .render(&ctx, &mut target, &self.pending, Some(self.background));
        }

        self.gpu.present(frame);
        if clear_buffer {
            self.pending.clear();
        }
        Ok(())
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn waits_for_blanking(&self) -> bool {
        matches!(
            self.gpu.present_mode(),
            wgpu::PresentMode::Fifo | wgpu::PresentMode::FifoRelaxed
        )
    }
}

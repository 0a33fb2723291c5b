use crate::time::SwapError;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl SurfaceErrorAction {
    /// The swap failure reported to frame timing.
    pub fn into_swap_error(self, err: &wgpu::SurfaceError) -> SwapError {
        match self {
            SurfaceErrorAction::Reconfigured => SwapError::Lost,
            SurfaceErrorAction::SkipFrame => SwapError::Timeout,
            SurfaceErrorAction::Fatal => SwapError::Fatal(err.to_string()),
        }
    }
}

use serde::Deserialize;

/// Unnormalised gaussian of standard deviation `s`, 1 at `r = 0`.
#[inline]
pub fn gaussian_distribution(r: f64, s: f64) -> f64 {
    (-(r * r) / (2.0 * s * s)).exp()
}

/// Weight of a drag on the frames around the one it was made on.
///
/// * `scale` standard deviation of the falloff, in frames
/// * `span` frames further than this from the dragged frame are left alone
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct FrameFilter {
    pub scale: f64,
    pub span: usize,
}

impl Default for FrameFilter {
    fn default() -> Self {
        Self {
            scale: 10.0,
            span: 30,
        }
    }
}

impl FrameFilter {
    pub fn new(scale: f64, span: usize) -> Self {
        assert!(scale > 0.0, "filter scale must be positive");
        Self { scale, span }
    }

    #[inline]
    pub fn weight(&self, frame_offset: f64) -> f64 {
        gaussian_distribution(frame_offset, self.scale)
    }

    /// Frames of a `len` frame trajectory affected by a drag at `root_frame`,
    /// with their offset from it.
    pub fn window(&self, root_frame: usize, len: usize) -> impl Iterator<Item = (usize, i64)> {
        let first = root_frame.saturating_sub(self.span);
        let last = (root_frame + self.span).min(len.saturating_sub(1));
        (first..=last)
            .filter(move |_| root_frame < len)
            .map(move |f| (f, f as i64 - root_frame as i64))
    }
}

use crate::groove::groove::CoordinateDescent;
use crate::groove::score::{body_distance, score};
use crate::motion::filter::FrameFilter;
use crate::spacetime::configuration::JointConfiguration;
use crate::spacetime::robot::{BodyId, ForwardKinematics};
use nalgebra::Vector3;

/// In-memory sequence of animation frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    frames: Vec<JointConfiguration>,
}

/// Result of re-solving one frame of a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameResult {
    pub frame: usize,
    pub weight: f64,
    pub target: Vector3<f64>,
    pub score: f64,
}

impl Trajectory {
    pub fn new(frames: Vec<JointConfiguration>) -> Self {
        if let Some(first) = frames.first() {
            assert!(
                frames
                    .iter()
                    .all(|f| f.len() == first.len() && f.mutable_start() == first.mutable_start()),
                "every frame must have the same layout"
            );
        }
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, i: usize) -> &JointConfiguration {
        &self.frames[i]
    }

    pub fn frames(&self) -> &[JointConfiguration] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<JointConfiguration> {
        self.frames
    }

    /// Position of `body` at frame `frame`.
    pub fn body_position<O: ForwardKinematics + ?Sized>(&self, oracle: &mut O, frame: usize, body: BodyId) -> Vector3<f64> {
        oracle.recompute(&self.frames[frame]);
        oracle.body_position(body)
    }

    /// Applies a drag of `body` made on `root_frame` to the neighbouring frames.
    ///
    /// The drag moves `body` from where it is on `root_frame` to `grabbed`.
    /// Every frame within the filter span gets the same displacement scaled by
    /// the filter weight of its offset, and is re-solved toward it with
    /// `rounds` sweeps (the root body is translated directly). Frames outside
    /// the span are left untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn drag_body<O: ForwardKinematics + ?Sized>(
        &mut self,
        oracle: &mut O,
        optimizer: &mut CoordinateDescent,
        filter: &FrameFilter,
        body: BodyId,
        root_body: BodyId,
        root_frame: usize,
        grabbed: Vector3<f64>,
        rounds: usize,
    ) -> Vec<FrameResult> {
        assert!(root_frame < self.frames.len(), "frame {root_frame} out of range");
        assert!(body.0 < oracle.num_bodies(), "body id {} out of range", body.0);
        let transformation = grabbed - self.body_position(oracle, root_frame, body);
        log::debug!("node dropped on frame {root_frame}, transformation {transformation:?}");

        let mut results = Vec::new();
        for (frame, offset) in filter.window(root_frame, self.frames.len()) {
            let weight = filter.weight(offset as f64);
            let target = self.body_position(oracle, frame, body) + transformation * weight;
            let q = &mut self.frames[frame];
            let frame_score = if body == root_body {
                let root = q.root_position() + transformation * weight;
                q.set_root_position(&root);
                score(&mut *oracle, q, &target, body)
            } else {
                let mut f = body_distance(&mut *oracle, target, body);
                for _ in 0..rounds {
                    if !optimizer.optimize(q, &mut f).improved() {
                        break;
                    }
                }
                f(&*q)
            };
            results.push(FrameResult {
                frame,
                weight,
                target,
                score: frame_score,
            });
        }
        results
    }
}

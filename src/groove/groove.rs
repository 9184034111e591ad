use crate::groove::score::ScoreFunction;
use crate::spacetime::configuration::{ActuatedIndex, JointConfiguration};
use serde::Deserialize;

/// Step size law `step = gain * error + floor`.
///
/// The step shrinks with the error so far-field targets converge fast, and the
/// floor keeps the search moving when the error is almost zero.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct StepParams {
    pub gain: f64,
    pub floor: f64,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            gain: 0.0193,
            floor: 0.0005,
        }
    }
}

impl StepParams {
    #[inline]
    pub fn step(&self, error: f64) -> f64 {
        self.gain * error + self.floor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn signum(self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// Best single-coordinate move found by a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub score: f64,
    pub index: ActuatedIndex,
    pub direction: Direction,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStatus {
    /// score before the sweep
    pub baseline: f64,
    pub step: f64,
    /// `None` when no move improved the score, the configuration is unchanged
    pub candidate: Option<Candidate>,
}

impl SweepStatus {
    /// Score after the sweep.
    pub fn score(&self) -> f64 {
        self.candidate.map_or(self.baseline, |c| c.score)
    }

    pub fn improved(&self) -> bool {
        self.candidate.is_some()
    }
}

/// Greedy derivative-free coordinate descent over the actuated range.
///
/// Every actuated coordinate is tried at `+step` and `-step`, and only the
/// single best move is kept. Perturbations happen on a scratch copy so the
/// caller's configuration is only ever touched by [`commit`](Self::commit).
pub struct CoordinateDescent {
    params: StepParams,
    scratch: Option<JointConfiguration>,
}

impl CoordinateDescent {
    pub fn new(params: StepParams) -> Self {
        CoordinateDescent {
            params,
            scratch: None,
        }
    }

    pub fn params(&self) -> StepParams {
        self.params
    }

    /// Scans every `±step` move of `q` and returns the best one that strictly
    /// beats `baseline`.
    pub fn evaluate<F: ScoreFunction>(
        &mut self,
        q: &JointConfiguration,
        baseline: f64,
        step: f64,
        f: &mut F,
    ) -> Option<Candidate> {
        let scratch = match &mut self.scratch {
            Some(s) if s.len() == q.len() && s.mutable_start() == q.mutable_start() => {
                s.copy_from(q);
                s
            }
            slot => slot.insert(q.clone()),
        };

        let mut best_score = baseline;
        let mut best: Option<Candidate> = None;
        for i in q.actuated_indices() {
            let before = scratch.get_actuated(i);
            for direction in [Direction::Positive, Direction::Negative] {
                scratch.set_actuated(i, before + direction.signum() * step);
                let observed = f(&*scratch);
                if observed < best_score {
                    best_score = observed;
                    best = Some(Candidate {
                        score: observed,
                        index: i,
                        direction,
                    });
                }
            }
            scratch.set_actuated(i, before);
        }
        best
    }

    /// Applies a candidate found by [`evaluate`](Self::evaluate) with the same step.
    pub fn commit(q: &mut JointConfiguration, candidate: &Candidate, step: f64) {
        q.nudge(candidate.index, candidate.direction.signum() * step);
    }

    /// One full sweep: score, scan, commit the best move if any.
    pub fn optimize<F: ScoreFunction>(&mut self, q: &mut JointConfiguration, f: &mut F) -> SweepStatus {
        let baseline = f(&*q);
        let step = self.params.step(baseline);
        let candidate = self.evaluate(q, baseline, step, f);
        if let Some(c) = &candidate {
            Self::commit(q, c, step);
        }
        log::trace!("sweep: baseline {baseline:.6} step {step:.6} -> {candidate:?}");
        SweepStatus {
            baseline,
            step,
            candidate,
        }
    }
}

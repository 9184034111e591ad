use std::time::Instant;

use crate::groove::groove::{CoordinateDescent, SweepStatus};
use crate::groove::score::{body_distance, score};
use crate::groove::state::IkState;
use crate::motion::pd::{reset_pdik, BodyDynamics, PdTracker};
use crate::spacetime::configuration::JointConfiguration;
use crate::spacetime::robot::{BodyId, ForwardKinematics, Robot};
use crate::utils::config_parser::Config;
use crate::Error;
use nalgebra::Vector3;

/// Mouse perturbation of the viewer: which body is held and where it is dragged.
pub trait Perturbation {
    fn is_active(&self) -> bool;
    fn selected_body(&self) -> BodyId;
    fn reference_position(&self) -> Vector3<f64>;
}

/// Plain perturbation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grab {
    pub active: bool,
    pub body: BodyId,
    pub reference: Vector3<f64>,
}

impl Grab {
    pub fn new(body: BodyId, reference: Vector3<f64>) -> Self {
        Self {
            active: true,
            body,
            reference,
        }
    }

    pub fn released() -> Self {
        Self {
            active: false,
            body: BodyId(0),
            reference: Vector3::zeros(),
        }
    }
}

impl Perturbation for Grab {
    fn is_active(&self) -> bool {
        self.active
    }

    fn selected_body(&self) -> BodyId {
        self.body
    }

    fn reference_position(&self) -> Vector3<f64> {
        self.reference
    }
}

/// What one simulation step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// nothing grabbed
    Idle,
    /// the root was grabbed and moved directly, `score` is its distance to the reference
    RootMoved { score: f64 },
    /// `score` is the distance of the live configuration to the current reference
    Optimized { rounds: usize, score: f64 },
}

/// Passed to the per-round callback of [`PdIk::solve_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundReport {
    /// 1-based
    pub round: usize,
    pub status: SweepStatus,
    pub best_score: f64,
}

/// Interactive IK session: settings, oracle, the live configuration and the
/// episode bookkeeping.
pub struct PdIk<O: ForwardKinematics = Robot> {
    pub config: Config,
    pub oracle: O,
    pub qpos: JointConfiguration,
    pub state: IkState,
    pub optimizer: CoordinateDescent,
    pub tracker: PdTracker,
    pub init_q: JointConfiguration,
    grabbed: Option<BodyId>,
}

impl PdIk<Robot> {
    pub fn new(path_to_setting: &str) -> Result<Self, Error> {
        let t1 = Instant::now();
        log::info!("Using settings file {path_to_setting}");

        let config = Config::from_settings_file(path_to_setting)?;
        log::debug!("Parsing successful {:?}", config);
        let robot = Robot::from_urdf_file(&config.robot_urdf_path, &config.body_links, &config.joint_indices)?;
        let ik = Self::from_parts(config, robot);
        let dur = Instant::now() - t1;
        log::debug!("pdik fully initialized in {dur:.3?}");
        Ok(ik)
    }
}

impl<O: ForwardKinematics> PdIk<O> {
    pub fn from_parts(config: Config, mut oracle: O) -> Self {
        let qpos = config.starting_configuration();
        oracle.recompute(&qpos);
        Self {
            state: IkState::new(&qpos),
            optimizer: CoordinateDescent::new(config.step),
            tracker: PdTracker::new(config.pd),
            init_q: qpos.clone(),
            qpos,
            oracle,
            config,
            grabbed: None,
        }
    }

    /// Replaces the live configuration, ending any running episode.
    pub fn reset(&mut self, q: JointConfiguration) {
        assert_eq!(q.len(), self.qpos.len());
        self.qpos = q;
        self.end_episode();
        self.oracle.recompute(&self.qpos);
    }

    pub fn reset_origin(&mut self) {
        self.reset(self.init_q.clone());
    }

    pub fn grabbed(&self) -> Option<BodyId> {
        self.grabbed
    }

    /// World position of `body` in the live configuration.
    pub fn body_position(&mut self, body: BodyId) -> Vector3<f64> {
        self.check_body(body);
        self.oracle.recompute(&self.qpos);
        self.oracle.body_position(body)
    }

    /// Distance of `body` to `target` in the live configuration.
    pub fn score(&mut self, target: &Vector3<f64>, body: BodyId) -> f64 {
        self.check_body(body);
        score(&mut self.oracle, &self.qpos, target, body)
    }

    /// Runs the configured number of sweeps toward `target` and returns the
    /// distance left.
    pub fn solve(&mut self, target: Vector3<f64>, body: BodyId) -> f64 {
        let rounds = self.config.rounds;
        self.solve_with(target, body, rounds, |_| true);
        self.settled_distance(&target, body)
    }

    /// Runs up to `rounds` sweeps. `on_round` is called after every sweep and
    /// stops the loop by returning `false`; the configuration is valid at that
    /// point. Returns the number of sweeps done.
    pub fn solve_with<F>(&mut self, target: Vector3<f64>, body: BodyId, rounds: usize, mut on_round: F) -> usize
    where
        F: FnMut(&RoundReport) -> bool,
    {
        self.check_body(body);
        if !self.state.enabled {
            reset_pdik(&mut self.state, &mut self.oracle, &self.qpos);
        }
        if self.state.retarget(body, &target, &self.qpos) {
            log::trace!("IK goal moved to {target:?}");
        }
        let Self {
            oracle,
            optimizer,
            qpos,
            state,
            ..
        } = self;

        let mut done = 0;
        {
            let mut f = body_distance(&mut *oracle, target, body);
            for round in 1..=rounds {
                let status = optimizer.optimize(qpos, &mut f);
                state.observe(status.score(), qpos);
                done = round;
                let report = RoundReport {
                    round,
                    status,
                    best_score: state.best_score(),
                };
                if !on_round(&report) {
                    log::debug!("IK interrupted after {round} rounds");
                    break;
                }
            }
        }
        oracle.recompute(qpos);
        log::trace!("IK toward {target:?}: {done} rounds, best {:.6}", state.best_score());
        done
    }

    /// One simulation step driven by the perturbation input.
    ///
    /// * nothing grabbed: the episode ends, no IK
    /// * root grabbed: root position set to the reference, no IK
    /// * other body grabbed: `config.rounds` sweeps toward the reference
    ///
    /// The oracle is always recomputed at the end of the step.
    pub fn per_step_control<P: Perturbation + ?Sized>(&mut self, pert: &P) -> StepOutcome {
        if !pert.is_active() {
            if self.grabbed.is_some() {
                log::debug!("body released");
            }
            self.end_episode();
            self.oracle.recompute(&self.qpos);
            return StepOutcome::Idle;
        }

        let body = pert.selected_body();
        self.check_body(body);
        let reference = pert.reference_position();
        if self.grabbed != Some(body) {
            log::debug!("body {} grabbed", body.0);
            if let Some(previous) = self.grabbed {
                self.tracker.clear_target(previous);
            }
            reset_pdik(&mut self.state, &mut self.oracle, &self.qpos);
            self.grabbed = Some(body);
        }
        self.tracker.set_target(body, reference);

        if body == self.config.root_body {
            self.qpos.set_root_position(&reference);
            self.oracle.recompute(&self.qpos);
            return StepOutcome::RootMoved {
                score: self.settled_distance(&reference, body),
            };
        }

        let rounds = self.config.rounds;
        let done = self.solve_with(reference, body, rounds, |_| true);
        StepOutcome::Optimized {
            rounds: done,
            score: self.settled_distance(&reference, body),
        }
    }

    /// PD forces pulling the grabbed body of `dynamics` toward the reference.
    /// Returns the tracking error.
    pub fn apply_tracking<D: BodyDynamics + ?Sized>(&self, dynamics: &mut D) -> f64 {
        self.tracker.per_step_control(dynamics)
    }

    /// Distance of `body` to `target` as last computed by the oracle.
    fn settled_distance(&self, target: &Vector3<f64>, body: BodyId) -> f64 {
        (self.oracle.body_position(body) - target).norm()
    }

    fn end_episode(&mut self) {
        if let Some(body) = self.grabbed.take() {
            self.tracker.clear_target(body);
        }
        self.state.disengage();
    }

    fn check_body(&self, body: BodyId) {
        assert!(
            body.0 < self.oracle.num_bodies(),
            "body id {} out of range ({} bodies)",
            body.0,
            self.oracle.num_bodies()
        );
    }
}

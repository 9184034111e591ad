use crate::groove::state::IkState;
use crate::spacetime::configuration::JointConfiguration;
use crate::spacetime::robot::{BodyId, ForwardKinematics};
use nalgebra::Vector3;
use serde::Deserialize;

/// Proportional (`k1`) and derivative (`k2`) gains.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PdGains {
    pub k1: f64,
    pub k2: f64,
}

impl Default for PdGains {
    fn default() -> Self {
        Self { k1: 100.0, k2: 20.0 }
    }
}

impl PdGains {
    #[inline]
    pub fn apply(&self, current: &Vector3<f64>, velocity: &Vector3<f64>, target: &Vector3<f64>) -> Vector3<f64> {
        apply_pd_controller(self.k1, self.k2, current, velocity, target)
    }
}

/// `k1 * (target - current) - k2 * velocity`, per axis.
#[inline]
pub fn apply_pd_controller(
    k1: f64,
    k2: f64,
    current: &Vector3<f64>,
    velocity: &Vector3<f64>,
    target: &Vector3<f64>,
) -> Vector3<f64> {
    (target - current) * k1 - velocity * k2
}

/// Starts a new IK episode: the oracle is brought up to date with `q` and the
/// state snapshots it as the initial configuration.
///
/// Call once per episode (grab start), never in the middle of one.
pub fn reset_pdik<O: ForwardKinematics + ?Sized>(state: &mut IkState, oracle: &mut O, q: &JointConfiguration) {
    oracle.recompute(q);
    state.reset(q);
    log::debug!("IK episode started");
}

/// Simulated bodies that can be pushed around by external forces.
pub trait BodyDynamics {
    fn body_position(&self, body: BodyId) -> Vector3<f64>;
    fn body_velocity(&self, body: BodyId) -> Vector3<f64>;
    /// Adds `force` to the external force applied during the next step.
    fn apply_force(&mut self, body: BodyId, force: Vector3<f64>);
}

/// Keeps a set of bodies on their targets with PD forces.
#[derive(Debug, Clone)]
pub struct PdTracker {
    pub gains: PdGains,
    targets: Vec<(BodyId, Vector3<f64>)>,
}

impl PdTracker {
    pub fn new(gains: PdGains) -> Self {
        Self {
            gains,
            targets: Vec::new(),
        }
    }

    pub fn set_target(&mut self, body: BodyId, target: Vector3<f64>) {
        match self.targets.iter_mut().find(|(b, _)| *b == body) {
            Some((_, t)) => *t = target,
            None => self.targets.push((body, target)),
        }
    }

    pub fn clear_target(&mut self, body: BodyId) {
        self.targets.retain(|(b, _)| *b != body);
    }

    pub fn target(&self, body: BodyId) -> Option<Vector3<f64>> {
        self.targets.iter().find(|(b, _)| *b == body).map(|(_, t)| *t)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Applies one PD force per tracked body and returns the summed tracking error.
    pub fn per_step_control<D: BodyDynamics + ?Sized>(&self, dynamics: &mut D) -> f64 {
        let mut error = 0.0;
        for (body, target) in &self.targets {
            let pos = dynamics.body_position(*body);
            let vel = dynamics.body_velocity(*body);
            dynamics.apply_force(*body, self.gains.apply(&pos, &vel, target));
            error += (target - pos).norm();
        }
        error
    }
}

/// Free point mass integrated with semi-implicit Euler. It is body `BodyId(0)`.
#[derive(Debug, Clone)]
pub struct PointMass {
    pub mass: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    force: Vector3<f64>,
}

impl PointMass {
    pub fn new(mass: f64, position: Vector3<f64>) -> Self {
        assert!(mass > 0.0);
        Self {
            mass,
            position,
            velocity: Vector3::zeros(),
            force: Vector3::zeros(),
        }
    }

    pub fn step(&mut self, dt: f64) {
        self.velocity += self.force * (dt / self.mass);
        self.position += self.velocity * dt;
        self.force = Vector3::zeros();
    }
}

impl BodyDynamics for PointMass {
    fn body_position(&self, body: BodyId) -> Vector3<f64> {
        assert_eq!(body, BodyId(0));
        self.position
    }

    fn body_velocity(&self, body: BodyId) -> Vector3<f64> {
        assert_eq!(body, BodyId(0));
        self.velocity
    }

    fn apply_force(&mut self, body: BodyId, force: Vector3<f64>) {
        assert_eq!(body, BodyId(0));
        self.force += force;
    }
}

use crate::spacetime::configuration::JointConfiguration;
use crate::spacetime::robot::{BodyId, ForwardKinematics};
use nalgebra::Vector3;

// trait alias equivalent
pub trait ScoreFunction: FnMut(&JointConfiguration) -> f64 {}
impl<F> ScoreFunction for F where F: FnMut(&JointConfiguration) -> f64 {}

/// Distance between `body` and `target` once the oracle is updated to `q`.
///
/// Refreshes the oracle's cached body positions as a side effect.
#[inline]
pub fn score<O: ForwardKinematics + ?Sized>(
    oracle: &mut O,
    q: &JointConfiguration,
    target: &Vector3<f64>,
    body: BodyId,
) -> f64 {
    oracle.recompute(q);
    (oracle.body_position(body) - target).norm()
}

/// Score of one body against one target, as a closure over the oracle.
pub fn body_distance<'a, O: ForwardKinematics + ?Sized>(
    oracle: &'a mut O,
    target: Vector3<f64>,
    body: BodyId,
) -> impl ScoreFunction + 'a {
    move |q: &JointConfiguration| score(&mut *oracle, q, &target, body)
}

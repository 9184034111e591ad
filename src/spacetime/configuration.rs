use nalgebra::{UnitQuaternion, Vector3};
use savefile_derive::Savefile;
use std::ops::{Index, Range};

/// Number of generalized coordinates of the Cassie-like biped model.
pub const DEFAULT_QPOS_SIZE: usize = 35;
/// First coordinate the IK is allowed to move. Everything before it is the
/// floating base pose and unactuated coordinates.
pub const DEFAULT_MUTABLE_START: usize = 15;

/// Index into the actuated range of a [`JointConfiguration`].
///
/// Only a configuration hands these out, so a value always points past the
/// fixed range of the configuration it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActuatedIndex(usize);

impl ActuatedIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Fixed-length vector of generalized coordinates (`qpos`).
///
/// * `[0, mutable_start)` : root pose (`[0..3]` position, `[3..7]` quaternion w x y z)
///   and unactuated coordinates, only written as a block
/// * `[mutable_start, len)` : actuated coordinates, the coordinate descent range
#[derive(Debug, Clone, PartialEq, Savefile)]
pub struct JointConfiguration {
    q: Vec<f64>,
    mutable_start: usize,
}

impl JointConfiguration {
    /// All zero configuration with an identity root orientation.
    pub fn zeros(len: usize, mutable_start: usize) -> Self {
        let mut q = vec![0.0; len];
        if mutable_start >= 7 {
            q[3] = 1.0;
        }
        Self::from_vec(q, mutable_start)
    }

    pub fn from_vec(q: Vec<f64>, mutable_start: usize) -> Self {
        assert!(
            mutable_start >= 3 && mutable_start <= q.len(),
            "mutable range start {} invalid for {} coordinates",
            mutable_start,
            q.len()
        );
        Self { q, mutable_start }
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn mutable_start(&self) -> usize {
        self.mutable_start
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.q
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.q.clone()
    }

    /// Root pose and unactuated coordinates.
    pub fn fixed(&self) -> &[f64] {
        &self.q[..self.mutable_start]
    }

    pub fn actuated(&self) -> &[f64] {
        &self.q[self.mutable_start..]
    }

    pub fn actuated_range(&self) -> Range<usize> {
        self.mutable_start..self.q.len()
    }

    pub fn actuated_indices(&self) -> impl Iterator<Item = ActuatedIndex> {
        self.actuated_range().map(ActuatedIndex)
    }

    /// Checked conversion of a raw coordinate index.
    pub fn actuated_index(&self, i: usize) -> Option<ActuatedIndex> {
        self.actuated_range().contains(&i).then_some(ActuatedIndex(i))
    }

    pub fn get_actuated(&self, i: ActuatedIndex) -> f64 {
        self.q[i.0]
    }

    pub fn set_actuated(&mut self, i: ActuatedIndex, value: f64) {
        assert!(i.0 >= self.mutable_start && i.0 < self.q.len());
        self.q[i.0] = value;
    }

    pub fn nudge(&mut self, i: ActuatedIndex, delta: f64) {
        let v = self.get_actuated(i);
        self.set_actuated(i, v + delta);
    }

    pub fn root_position(&self) -> Vector3<f64> {
        Vector3::new(self.q[0], self.q[1], self.q[2])
    }

    pub fn set_root_position(&mut self, pos: &Vector3<f64>) {
        self.q[..3].copy_from_slice(pos.as_slice());
    }

    /// Root orientation, identity when the fixed range is too short to hold one.
    pub fn root_orientation(&self) -> UnitQuaternion<f64> {
        if self.mutable_start < 7 {
            return UnitQuaternion::identity();
        }
        let quat = nalgebra::Quaternion::new(self.q[3], self.q[4], self.q[5], self.q[6]);
        if quat.norm() == 0.0 {
            UnitQuaternion::identity()
        } else {
            UnitQuaternion::from_quaternion(quat)
        }
    }

    /// Overwrites the whole fixed range.
    pub fn set_fixed(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.mutable_start, "fixed range is assigned as a whole");
        self.q[..self.mutable_start].copy_from_slice(values);
    }

    /// Copies every coordinate of `other` without reallocating.
    pub fn copy_from(&mut self, other: &JointConfiguration) {
        assert_eq!(self.q.len(), other.q.len());
        assert_eq!(self.mutable_start, other.mutable_start);
        self.q.copy_from_slice(&other.q);
    }
}

impl Index<usize> for JointConfiguration {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.q[i]
    }
}

impl Default for JointConfiguration {
    fn default() -> Self {
        Self::zeros(DEFAULT_QPOS_SIZE, DEFAULT_MUTABLE_START)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuated_indices_skip_fixed_range() {
        let q = JointConfiguration::default();
        let idx: Vec<usize> = q.actuated_indices().map(|i| i.get()).collect();
        assert_eq!(idx.first(), Some(&15));
        assert_eq!(idx.last(), Some(&34));
        assert_eq!(idx.len(), 20);
        assert!(q.actuated_index(14).is_none());
        assert!(q.actuated_index(35).is_none());
    }

    #[test]
    fn root_position_is_block_assigned() {
        let mut q = JointConfiguration::default();
        q.set_root_position(&Vector3::new(0.1, -0.2, 1.0));
        assert_eq!(&q.fixed()[..4], &[0.1, -0.2, 1.0, 1.0]);
        assert!(q.actuated().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn nudge_only_moves_one_coordinate() {
        let mut q = JointConfiguration::default();
        let i = q.actuated_index(20).unwrap();
        q.nudge(i, 0.25);
        q.nudge(i, -0.05);
        assert!((q[20] - 0.2).abs() < 1e-12);
        assert_eq!(q.as_slice().iter().filter(|v| **v != 0.0).count(), 2);
    }

    #[test]
    #[should_panic]
    fn partial_fixed_assignment_panics() {
        let mut q = JointConfiguration::default();
        q.set_fixed(&[0.0; 3]);
    }
}

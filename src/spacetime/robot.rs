use crate::spacetime::configuration::JointConfiguration;
use crate::Error;
use nalgebra::{Isometry3, Translation3, Vector3};
use std::path::Path;

/// Opaque body id, as used by the simulator (0 is the world, 1 the pelvis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

/// Forward kinematics oracle: maps a configuration to body world positions.
pub trait ForwardKinematics {
    /// Updates the cached body positions from `q`.
    fn recompute(&mut self, q: &JointConfiguration);

    /// Position of `body` as of the last [`recompute`](Self::recompute).
    fn body_position(&self, body: BodyId) -> Vector3<f64>;

    fn num_bodies(&self) -> usize;
}

/// URDF robot evaluated with `k`.
///
/// The chain root is the floating base: its pose comes from the fixed range of
/// the configuration. Each movable joint of the chain reads the coordinate
/// given by `joint_indices`. Body `i` is the link `body_links[i]`.
pub struct Robot {
    chain: k::Chain<f64>,
    body_names: Vec<String>,
    bodies: Vec<Option<k::Node<f64>>>,
    joint_indices: Vec<usize>,
    joint_positions: Vec<f64>,
    positions: Vec<Vector3<f64>>,
}

impl Robot {
    pub fn from_urdf_file<P: AsRef<Path>>(
        path: P,
        body_links: &[String],
        joint_indices: &[usize],
    ) -> Result<Self, Error> {
        let description = urdf_rs::read_file(path.as_ref())?;
        Self::from_description(description, body_links, joint_indices)
    }

    pub fn from_urdf(
        urdf: &str,
        body_links: &[String],
        joint_indices: &[usize],
    ) -> Result<Self, Error> {
        let description = urdf_rs::read_from_string(urdf)?;
        Self::from_description(description, body_links, joint_indices)
    }

    /// `body_links` may contain `"world"`, which maps to the origin.
    pub fn from_description(
        description: urdf_rs::Robot,
        body_links: &[String],
        joint_indices: &[usize],
    ) -> Result<Self, Error> {
        let chain: k::Chain<f64> = k::Chain::from(description);
        if chain.dof() != joint_indices.len() {
            return Err(Error::DofMismatch {
                chain: chain.dof(),
                mapped: joint_indices.len(),
            });
        }
        let mut bodies = Vec::with_capacity(body_links.len());
        for name in body_links {
            if name == "world" {
                bodies.push(None);
                continue;
            }
            let node = chain
                .find_link(name)
                .ok_or_else(|| Error::UnknownLink(name.clone()))?;
            bodies.push(Some(node.clone()));
        }
        log::debug!(
            "Robot created: {} movable joints, {} tracked bodies",
            chain.dof(),
            bodies.len()
        );
        Ok(Self {
            joint_positions: vec![0.0; chain.dof()],
            positions: vec![Vector3::zeros(); bodies.len()],
            chain,
            body_names: body_links.to_vec(),
            bodies,
            joint_indices: joint_indices.to_vec(),
        })
    }

    pub fn body_id(&self, link: &str) -> Option<BodyId> {
        self.body_names.iter().position(|n| n == link).map(BodyId)
    }

    pub fn body_names(&self) -> &[String] {
        &self.body_names
    }

    pub fn dof(&self) -> usize {
        self.chain.dof()
    }
}

impl ForwardKinematics for Robot {
    fn recompute(&mut self, q: &JointConfiguration) {
        let origin = Isometry3::from_parts(
            Translation3::from(q.root_position()),
            q.root_orientation(),
        );
        self.chain.set_origin(origin);
        for (pos, &idx) in self.joint_positions.iter_mut().zip(&self.joint_indices) {
            *pos = q[idx];
        }
        self.chain.set_joint_positions_unchecked(&self.joint_positions);
        self.chain.update_transforms();
        for (out, body) in self.positions.iter_mut().zip(&self.bodies) {
            *out = match body.as_ref().and_then(|n| n.world_transform()) {
                Some(tf) => tf.translation.vector,
                None => Vector3::zeros(),
            };
        }
    }

    fn body_position(&self, body: BodyId) -> Vector3<f64> {
        assert!(
            body.0 < self.positions.len(),
            "body id {} out of range ({} bodies)",
            body.0,
            self.positions.len()
        );
        self.positions[body.0]
    }

    fn num_bodies(&self) -> usize {
        self.positions.len()
    }
}

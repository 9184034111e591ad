use crate::spacetime::configuration::JointConfiguration;
use crate::spacetime::robot::BodyId;
use crate::Error;
use nalgebra::Vector3;
use savefile_derive::Savefile;
use std::path::Path;

const CHECKPOINT_VERSION: u32 = 0;

/// Anytime bookkeeping of one IK episode.
///
/// `best_score` only ever decreases while the goal stays the same, and
/// `best_configuration` is always the configuration that scored it against the
/// current goal. Moving the goal re-bases both, the initial snapshot is kept
/// for the whole episode.
#[derive(Debug, Clone, PartialEq, Savefile)]
pub struct IkState {
    pub enabled: bool,
    best_score: f64,
    best_configuration: JointConfiguration,
    initial_configuration: JointConfiguration,
    goal_body: usize,
    /// empty until the first goal of the episode
    goal: Vec<f64>,
}

impl IkState {
    /// Disengaged state, no score observed yet.
    pub fn new(q: &JointConfiguration) -> Self {
        Self {
            enabled: false,
            best_score: f64::INFINITY,
            best_configuration: q.clone(),
            initial_configuration: q.clone(),
            goal_body: 0,
            goal: Vec::new(),
        }
    }

    /// Starts a new episode from `q`.
    pub fn reset(&mut self, q: &JointConfiguration) {
        self.enabled = true;
        self.best_score = f64::INFINITY;
        self.best_configuration.clone_from(q);
        self.initial_configuration.clone_from(q);
        self.goal.clear();
    }

    /// Sets the goal the next observations are scored against. A goal
    /// different from the current one drops the best score and restarts the
    /// best configuration from `q`. Returns whether it did.
    pub fn retarget(&mut self, body: BodyId, target: &Vector3<f64>, q: &JointConfiguration) -> bool {
        if self.goal_body == body.0 && self.goal.as_slice() == target.as_slice() {
            return false;
        }
        self.goal_body = body.0;
        self.goal.clear();
        self.goal.extend_from_slice(target.as_slice());
        self.best_score = f64::INFINITY;
        self.best_configuration.clone_from(q);
        true
    }

    /// Body and target of the current goal, if any.
    pub fn goal(&self) -> Option<(BodyId, Vector3<f64>)> {
        (self.goal.len() == 3).then(|| (BodyId(self.goal_body), Vector3::from_column_slice(&self.goal)))
    }

    pub fn disengage(&mut self) {
        self.enabled = false;
    }

    /// Records `q` if `score` is strictly better than anything seen this episode.
    pub fn observe(&mut self, score: f64, q: &JointConfiguration) -> bool {
        if score < self.best_score {
            self.best_score = score;
            self.best_configuration.clone_from(q);
            true
        } else {
            false
        }
    }

    /// `f64::INFINITY` until the first observation of the episode.
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn best_configuration(&self) -> &JointConfiguration {
        &self.best_configuration
    }

    pub fn initial_configuration(&self) -> &JointConfiguration {
        &self.initial_configuration
    }

    pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        savefile::save_file(path.as_ref(), CHECKPOINT_VERSION, self).map_err(|e| Error::Checkpoint {
            path: path.as_ref().to_path_buf(),
            reason: format!("{e:?}"),
        })?;
        log::debug!("IK checkpoint written to {:?} (best {:.5})", path.as_ref(), self.best_score);
        Ok(())
    }

    pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        savefile::load_file(path.as_ref(), CHECKPOINT_VERSION).map_err(|e| Error::Checkpoint {
            path: path.as_ref().to_path_buf(),
            reason: format!("{e:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_strict_improvements_are_kept() {
        let mut q = JointConfiguration::default();
        let mut state = IkState::new(&q);
        state.reset(&q);
        assert!(state.enabled);
        assert_eq!(state.best_score(), f64::INFINITY);

        assert!(state.observe(1.0, &q));
        let i = q.actuated_index(16).unwrap();
        q.set_actuated(i, 0.3);
        assert!(!state.observe(1.0, &q));
        assert!(!state.observe(2.0, &q));
        assert_eq!(state.best_configuration()[16], 0.0);
        assert!(state.observe(0.5, &q));
        assert_eq!(state.best_configuration()[16], 0.3);
        assert_eq!(state.initial_configuration()[16], 0.0);
    }

    #[test]
    fn reset_starts_a_new_episode() {
        let mut q = JointConfiguration::default();
        let mut state = IkState::new(&q);
        state.reset(&q);
        state.observe(0.1, &q);
        let i = q.actuated_index(30).unwrap();
        q.set_actuated(i, -1.0);
        state.reset(&q);
        assert_eq!(state.best_score(), f64::INFINITY);
        assert_eq!(state.initial_configuration(), &q);
        assert_eq!(state.best_configuration(), &q);
        state.disengage();
        assert!(!state.enabled);
    }

    #[test]
    fn new_goal_rebases_best_but_not_initial() {
        let mut q = JointConfiguration::default();
        let start = q.clone();
        let mut state = IkState::new(&q);
        state.reset(&q);
        assert_eq!(state.goal(), None);
        let near = Vector3::new(0.1, 0.0, 0.0);
        assert!(state.retarget(BodyId(1), &near, &q));
        assert!(!state.retarget(BodyId(1), &near, &q));
        state.observe(0.01, &q);

        let i = q.actuated_index(17).unwrap();
        q.set_actuated(i, 0.2);
        let far = Vector3::new(5.0, 5.0, 0.0);
        assert!(state.retarget(BodyId(1), &far, &q));
        assert_eq!(state.goal(), Some((BodyId(1), far)));
        assert_eq!(state.best_score(), f64::INFINITY);
        assert_eq!(state.best_configuration(), &q);
        assert_eq!(state.initial_configuration(), &start);
        assert!(state.observe(3.0, &q));

        // same target, other body
        assert!(state.retarget(BodyId(0), &far, &q));
    }

    #[test]
    fn checkpoint_round_trip() {
        let mut q = JointConfiguration::default();
        let i = q.actuated_index(18).unwrap();
        q.set_actuated(i, 0.42);
        let mut state = IkState::new(&JointConfiguration::default());
        state.reset(&JointConfiguration::default());
        state.retarget(BodyId(1), &Vector3::new(0.1, 0.2, 0.3), &q);
        state.observe(0.25, &q);

        let path = std::env::temp_dir().join(format!("pdik_state_{}.bin", std::process::id()));
        state.save_checkpoint(&path).unwrap();
        let loaded = IkState::load_checkpoint(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_checkpoint_is_an_error() {
        let res = IkState::load_checkpoint("/nonexistent/pdik/state.bin");
        assert!(matches!(res, Err(Error::Checkpoint { .. })));
    }
}

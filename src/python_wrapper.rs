use crate::pdik::{Grab, PdIk, StepOutcome};
use crate::spacetime::robot::BodyId;
use nalgebra::Vector3;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

#[pyclass(unsendable)]
struct PdIkWrapper {
    ik: PdIk,
}

#[pymethods]
impl PdIkWrapper {
    #[new]
    pub fn new(path_to_setting: &str) -> PyResult<Self> {
        let ik = PdIk::new(path_to_setting).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { ik })
    }

    /// One viewer step. Returns the distance of the grabbed body to the
    /// reference, `None` when nothing is grabbed.
    pub fn step(&mut self, active: bool, body: usize, reference: [f64; 3]) -> Option<f64> {
        let grab = Grab {
            active,
            body: BodyId(body),
            reference: Vector3::from(reference),
        };
        match self.ik.per_step_control(&grab) {
            StepOutcome::Optimized { score, .. } | StepOutcome::RootMoved { score } => Some(score),
            StepOutcome::Idle => None,
        }
    }

    pub fn ik(&mut self, target: [f64; 3], body: usize) -> Vec<f64> {
        self.ik.solve(Vector3::from(target), BodyId(body));
        self.ik.qpos.to_vec()
    }

    pub fn best(&self) -> (f64, Vec<f64>) {
        (self.ik.state.best_score(), self.ik.state.best_configuration().to_vec())
    }

    pub fn body_position(&mut self, body: usize) -> Vec<f64> {
        self.ik.body_position(BodyId(body)).as_slice().to_vec()
    }

    pub fn qpos(&self) -> Vec<f64> {
        self.ik.qpos.to_vec()
    }

    pub fn reset_origin(&mut self) {
        self.ik.reset_origin();
    }
}

#[pymodule]
fn pdik_lib(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    m.add_class::<PdIkWrapper>()?;
    Ok(())
}

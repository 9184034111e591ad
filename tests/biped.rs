use approx::assert_relative_eq;
use nalgebra::Vector3;
use pdik_lib::groove::groove::CoordinateDescent;
use pdik_lib::motion::blend::Trajectory;
use pdik_lib::pdik::{Grab, PdIk, StepOutcome};
use pdik_lib::spacetime::robot::{BodyId, ForwardKinematics, Robot};
use pdik_lib::Error;

const SETTINGS: &str = "configs/biped.toml";

fn biped() -> PdIk {
    PdIk::new(SETTINGS).expect("default settings load")
}

#[test]
fn feet_hang_below_the_pelvis() {
    let mut ik = biped();
    let left = ik.oracle.body_id("left_foot").unwrap();
    let right = ik.oracle.body_id("right_foot").unwrap();
    assert_eq!(ik.oracle.dof(), 8);
    assert_relative_eq!(ik.body_position(BodyId(1)), Vector3::new(0.0, 0.0, 0.9), epsilon = 1e-9);
    assert_relative_eq!(ik.body_position(left), Vector3::new(0.0, 0.1, 0.0), epsilon = 1e-9);
    assert_relative_eq!(ik.body_position(right), Vector3::new(0.0, -0.1, 0.0), epsilon = 1e-9);
    assert_relative_eq!(ik.body_position(BodyId(0)), Vector3::zeros());
}

#[test]
fn dragging_a_foot_reduces_its_error() {
    let mut ik = biped();
    let foot = ik.oracle.body_id("left_foot").unwrap();
    let target = ik.body_position(foot) + Vector3::new(0.15, 0.0, 0.1);
    let initial = ik.score(&target, foot);

    let mut last = initial;
    let mut grab = Grab::new(foot, target);
    for _ in 0..5 {
        match ik.per_step_control(&grab) {
            StepOutcome::Optimized { rounds, score } => {
                assert_eq!(rounds, 100);
                assert!(score <= last);
                last = score;
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert!(last < initial);
    assert_relative_eq!(ik.score(&target, foot), last, epsilon = 1e-12);
    assert_eq!(ik.qpos.fixed(), ik.init_q.fixed());

    grab.active = false;
    assert_eq!(ik.per_step_control(&grab), StepOutcome::Idle);
}

#[test]
fn grabbing_the_pelvis_translates_the_robot() {
    let mut ik = biped();
    let foot = ik.oracle.body_id("right_foot").unwrap();
    let before = ik.body_position(foot);
    let reference = Vector3::new(0.2, -0.1, 1.0);
    match ik.per_step_control(&Grab::new(BodyId(1), reference)) {
        StepOutcome::RootMoved { score } => assert_relative_eq!(score, 0.0, epsilon = 1e-9),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(ik.qpos.root_position(), reference);
    assert_eq!(ik.qpos.actuated(), ik.init_q.actuated());
    let delta = reference - Vector3::new(0.0, 0.0, 0.9);
    assert_relative_eq!(ik.oracle.body_position(foot), before + delta, epsilon = 1e-9);
}

#[test]
fn dragged_node_blends_over_neighbouring_frames() {
    let mut ik = biped();
    let foot = ik.oracle.body_id("left_foot").unwrap();
    let frames = (0..12)
        .map(|i| {
            let mut q = ik.init_q.clone();
            q.set_root_position(&Vector3::new(0.03 * i as f64, 0.0, 0.9));
            q
        })
        .collect();
    let mut traj = Trajectory::new(frames);
    let before = traj.clone();
    let mut optimizer = CoordinateDescent::new(ik.config.step);
    let filter = pdik_lib::motion::filter::FrameFilter::new(2.0, 2);
    let grabbed = traj.body_position(&mut ik.oracle, 5, foot) + Vector3::new(0.1, 0.0, 0.05);

    let results = traj.drag_body(&mut ik.oracle, &mut optimizer, &filter, foot, ik.config.root_body, 5, grabbed, 50);

    assert_eq!(results.len(), 5);
    for r in &results {
        let original = (before.body_position(&mut ik.oracle, r.frame, foot) - r.target).norm();
        assert!(r.score < original, "frame {} did not improve", r.frame);
        assert_eq!(traj.frame(r.frame).fixed(), before.frame(r.frame).fixed());
    }
    assert_eq!(traj.frame(2), before.frame(2));
    assert_eq!(traj.frame(8), before.frame(8));
}

#[test]
fn joint_map_must_match_chain() {
    let urdf = std::fs::read_to_string("configs/urdfs/biped.urdf").unwrap();
    let links = vec!["world".to_string(), "pelvis".to_string()];
    let res = Robot::from_urdf(&urdf, &links, &[15, 16]);
    assert!(matches!(res, Err(Error::DofMismatch { chain: 8, mapped: 2 })));
    let res = Robot::from_urdf(&urdf, &["nose".to_string()], &[15, 16, 17, 18, 19, 20, 21, 22]);
    assert!(matches!(res, Err(Error::UnknownLink(name)) if name == "nose"));
}

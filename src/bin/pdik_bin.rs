extern crate pdik_lib;
use nalgebra::Vector3;
use pdik_lib::pdik::{Grab, PdIk, StepOutcome};

fn main() {
    env_logger::init();
    // initialize pdik
    let default_path_to_setting = "configs/biped.toml";
    let mut pdik = match PdIk::new(default_path_to_setting) {
        Ok(ik) => ik,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let foot = pdik
        .oracle
        .body_id("left_foot")
        .expect("left_foot is a tracked body of the default settings");
    let start = pdik.body_position(foot);
    println!("Left foot starts at {:?}", start.as_slice());

    let mut grab = Grab::new(foot, start);
    for _ in 0..10 {
        // gradually drag the foot forward and up
        grab.reference += Vector3::new(0.02, 0.0, 0.01);
        if let StepOutcome::Optimized { score, .. } = pdik.per_step_control(&grab) {
            println!("Distance to drag point: {score:.5}");
        }
        println!("Joint solutions: {:?}", pdik.qpos.actuated());
    }
    pdik.per_step_control(&Grab::released());
}

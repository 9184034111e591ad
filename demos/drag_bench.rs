use clap::Parser;
use indicatif::ProgressBar;
use nalgebra::Vector3;
use pdik_lib::pdik::PdIk;
use serde::Serialize;
use std::{fs, path::PathBuf, time};

/// args
#[derive(Parser)]
struct Cli {
    /// Specify path to the settings file.
    #[arg(
        short,
        long,
        default_value = "configs/biped.toml",
        value_name = "FILE PATH"
    )]
    settings: PathBuf,
    /// Link dragged around
    #[arg(short, long, default_value = "left_foot")]
    link: String,
    /// Half size of the sampled cube around the start position
    #[arg(short, long, default_value_t = 0.15)]
    extent: f64,
    /// Samples per axis
    #[arg(short, long, default_value_t = 5)]
    num: usize,
    /// Specify name of csv save file.
    #[arg(short, long, value_name = "FILE NAME", default_value = "drag_bench_data.csv")]
    file_name: String,
}

#[derive(Debug, Serialize)]
struct Record {
    x: f64,
    y: f64,
    z: f64,
    initial_error: f64,
    final_error: f64,
    rounds_to_half: Option<usize>,
    micros: u64,
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let folder = args.settings.file_stem().unwrap().to_str().unwrap();
    let data_file = PathBuf::from(format!("ex_out/{folder}/data/{}", args.file_name));
    let _ = fs::create_dir_all(data_file.parent().unwrap());

    let mut rik = PdIk::new(args.settings.to_str().unwrap()).unwrap();
    let body = rik
        .oracle
        .body_id(&args.link)
        .unwrap_or_else(|| panic!("link {} is not a tracked body", args.link));
    let start = rik.body_position(body);
    let rounds = rik.config.rounds;

    let n = args.num.max(2);
    let axis = |i: usize| -args.extent + 2.0 * args.extent * i as f64 / (n - 1) as f64;
    let mut writer = csv::Writer::from_path(&data_file).unwrap();
    let bar = ProgressBar::new(n.pow(3) as u64);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let target = start + Vector3::new(axis(i), axis(j), axis(k));
                rik.reset_origin();
                let initial_error = rik.score(&target, body);
                let mut rounds_to_half = None;
                let t1 = time::Instant::now();
                let done = rik.solve_with(target, body, rounds, |report| {
                    if rounds_to_half.is_none() && report.best_score <= initial_error / 2.0 {
                        rounds_to_half = Some(report.round);
                    }
                    true
                });
                let micros = (time::Instant::now() - t1).as_micros() as u64;
                log::trace!("{done} rounds toward {target:?}");
                writer
                    .serialize(Record {
                        x: target.x,
                        y: target.y,
                        z: target.z,
                        initial_error,
                        final_error: rik.score(&target, body),
                        rounds_to_half,
                        micros,
                    })
                    .unwrap();
                bar.inc(1);
            }
        }
    }
    bar.finish();
    writer.flush().unwrap();
    println!("Results written to {data_file:?}");
}

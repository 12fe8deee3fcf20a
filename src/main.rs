//! Headless demo driver
//!
//! Loads a track file (or the built-in demo oval) and optionally a tuning
//! file, registers two vehicles, and runs the fixed-tick loop with scripted
//! throttle input, logging each vehicle's progress once per simulated second.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use log::{error, info};

use trackloop::config::{self, TrackFile};
use trackloop::consts::SIM_DT;
use trackloop::sim::Pose;
use trackloop::{RaceSim, Tuning};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let track_file = match std::env::args().nth(1) {
        Some(path) => TrackFile::load(&PathBuf::from(path))?,
        None => config::demo_loop(),
    };
    let tuning = match std::env::args().nth(2) {
        Some(path) => Tuning::load(&PathBuf::from(path))?,
        None => Tuning::default(),
    };
    info!("running '{}'", track_file.metadata.name);
    let track = track_file.build()?;
    let mut sim = RaceSim::new(track, tuning);

    // Latest pose per vehicle, as a renderer would consume it
    let poses: Rc<RefCell<HashMap<u32, Pose>>> = Rc::default();
    for (id, lane) in [(1, -2.0_f32), (2, 2.0)] {
        let store = Rc::clone(&poses);
        sim.register_vehicle(
            id,
            lane,
            Box::new(move |pose: &Pose| {
                store.borrow_mut().insert(id, *pose);
            }),
        )?;
    }

    // Scripted input: vehicle 1 holds the throttle and double-taps for
    // turbo at 5s; vehicle 2 feathers the throttle every two seconds.
    sim.begin_accelerating(1)?;
    sim.begin_accelerating(2)?;
    let mut feather_on = true;

    let ticks_per_second = (1.0 / SIM_DT).round() as u32;
    for tick in 0..30 * ticks_per_second {
        let t = tick as f32 * SIM_DT;

        if tick == 5 * ticks_per_second {
            sim.stop_accelerating(1)?;
            sim.begin_accelerating(1)?;
            sim.stop_accelerating(1)?;
            sim.begin_accelerating(1)?;
        }
        if tick % (2 * ticks_per_second) == 0 && tick > 0 {
            feather_on = !feather_on;
            if feather_on {
                sim.begin_accelerating(2)?;
            } else {
                sim.stop_accelerating(2)?;
            }
        }

        if tick % ticks_per_second == 0 {
            for id in [1, 2] {
                let turbo = if sim.is_turbo_active(id)? {
                    "turbo"
                } else if sim.is_turbo_ready(id)? {
                    "ready"
                } else {
                    "cooldown"
                };
                let at = poses
                    .borrow()
                    .get(&id)
                    .map(|p| format!("{:.1}", p.position))
                    .unwrap_or_else(|| "-".to_string());
                info!(
                    "t={t:4.1}s vehicle {id}: {:6.2}/{:.2} at {:4.2} u/s [{turbo}] {at}",
                    sim.position(id)?,
                    sim.total_length(id)?,
                    sim.speed(id)?,
                );
            }
        }

        sim.advance_all(SIM_DT);
    }

    Ok(())
}

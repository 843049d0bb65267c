use std::time::Instant;

use crate::error::SimResult;
use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::Rk45;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{NVec3, SimState};

/// Time one relative-acceleration evaluation for each force set
pub fn bench_forces() -> SimResult<()> {
    let evals = 200_000;
    let sets = [
        ("newtonian", AccelSet::newtonian()),
        ("conservative", AccelSet::conservative()),
        ("post_newtonian", AccelSet::post_newtonian()),
    ];

    let pos1 = NVec3::zeros();
    let vel1 = NVec3::zeros();
    let vel2 = NVec3::new(0.0, 6.28, 0.0);

    for (name, set) in &sets {
        // Warm up
        set.relative_acceleration(pos1, NVec3::new(1.0, 0.0, 0.0), vel1, vel2, 1.0, 3.003e-6)?;

        let mut sink = NVec3::zeros();
        let t0 = Instant::now();
        for i in 0..evals {
            // vary the separation so nothing is hoisted out of the loop
            let x = 1.0 + (i as f64) * 1e-9;
            sink += set.relative_acceleration(pos1, NVec3::new(x, 0.0, 0.0), vel1, vel2, 1.0, 3.003e-6)?;
        }
        let ns = t0.elapsed().as_secs_f64() * 1e9 / evals as f64;

        println!("{name:>15}: {ns:8.1} ns/eval (checksum {:.3e})", sink.norm());
    }
    Ok(())
}

/// Integrate one Sun-Earth year at a range of tolerances
/// Paste output directly into a spreadsheet to graph
pub fn bench_rk45_tolerances() -> SimResult<()> {
    println!("rtol,attempts,accepted,rejected,mean_h,ms,return_err");

    let scenario = Scenario::sun_earth();
    let [b1, b2] = scenario.bodies;
    let start = SimState::from_bodies(&b1, &b2);

    for exp in 6..=12 {
        let rtol = 10f64.powi(-exp);
        let mut rk = Rk45::new(rtol * 1e2, rtol, 0.05)?;

        let t0 = Instant::now();
        let report = rk.step(&start, 1.0)?;
        let ms = t0.elapsed().as_secs_f64() * 1000.0;

        let end = SimState { y: report.state, ..start };
        let return_err = (end.pos2() - end.pos1() - (start.pos2() - start.pos1())).norm();

        println!(
            "{:.0e},{},{},{},{:.3e},{:.3},{:.3e}",
            rtol, report.count, report.accepted, report.rejected, report.mean_step, ms, return_err
        );
    }
    Ok(())
}

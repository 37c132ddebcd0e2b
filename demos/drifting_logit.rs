//! A decision boundary that rotates from one year to the next, fitted once with a single global
//! model and once with one coefficient set per year.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use smc_logistic::config::SmcConfig;
use smc_logistic::session::SmcSession;
use std::error::Error;

const YEARS: [i64; 4] = [2020, 2021, 2022, 2023];
const ROWS_PER_YEAR: usize = 250;

/// Labels follow a noiseless hyperplane whose normal turns by 45° per year.
fn make_data(rng: &mut SmallRng) -> (Array2<f64>, Array1<i64>, Vec<i64>) {
    let n = YEARS.len() * ROWS_PER_YEAR;
    let x = Array2::from_shape_fn((n, 2), |_| rng.random_range(-1.0..1.0));
    let t: Vec<i64> = (0..n).map(|i| YEARS[i / ROWS_PER_YEAR]).collect();
    let y = Array1::from_iter(x.axis_iter(Axis(0)).enumerate().map(|(i, row)| {
        let angle = (i / ROWS_PER_YEAR) as f64 * std::f64::consts::FRAC_PI_4;
        i64::from(angle.cos() * row[0] + angle.sin() * row[1] > 0.0)
    }));
    (x, y, t)
}

fn main() -> Result<(), Box<dyn Error>> {
    const SEED: u64 = 11;
    let mut rng = SmallRng::seed_from_u64(SEED);
    let (x, y, t) = make_data(&mut rng);
    let (x_test, y_test, t_test) = make_data(&mut rng);

    let config = SmcConfig::default()
        .particle_count(4_000)
        .proposal_scale(0.05)
        .parallelism(4)
        .progress(true)
        .seed(SEED);

    let mut global = SmcSession::new(config.clone())?;
    global.fit(x.view(), y.view())?;
    let mut indexed = SmcSession::new(config)?;
    indexed.fit_time_indexed(x.view(), y.view(), &t)?;
    let model = indexed.model().ok_or("no model fitted")?;

    println!("{:>6} {:>10} {:>10} {:>16}", "year", "global", "per-year", "coef");
    for &year in &YEARS {
        let rows: Vec<usize> = (0..t_test.len()).filter(|&i| t_test[i] == year).collect();
        let xs = x_test.select(Axis(0), &rows);
        let ys = y_test.select(Axis(0), &rows);
        let keys = vec![year; rows.len()];
        let shared = global.score(xs.view(), ys.view(), None)?;
        let own = indexed.score(xs.view(), ys.view(), Some(keys.as_slice()))?;
        let coef = &model.block(year)?.coef;
        println!(
            "{year:>6} {shared:>10.3} {own:>10.3}    [{:6.2}, {:6.2}]",
            coef[[0, 0]],
            coef[[0, 1]]
        );
    }

    for stats in indexed.history() {
        println!("{stats}");
    }
    Ok(())
}

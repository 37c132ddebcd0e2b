//! Streams batches of a noisy 2D classification problem through an SMC session and reports
//! held-out accuracy after every update.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use smc_logistic::config::SmcConfig;
use smc_logistic::session::SmcSession;
use std::error::Error;

#[cfg(feature = "csv")]
use smc_logistic::io::csv::save_population_csv;

const TRUE_COEF: [f64; 2] = [1.5, -2.0];
const TRUE_INTERCEPT: f64 = 0.5;

/// Points uniform in `[-2, 2]²` with labels drawn from the true logistic model.
fn make_batch(n: usize, rng: &mut SmallRng) -> (Array2<f64>, Array1<i64>) {
    let x = Array2::from_shape_fn((n, 2), |_| rng.random_range(-2.0..2.0));
    let y = x.map_axis(Axis(1), |row| {
        let z = TRUE_COEF[0] * row[0] + TRUE_COEF[1] * row[1] + TRUE_INTERCEPT;
        let p = 1.0 / (1.0 + (-z).exp());
        i64::from(rng.random::<f64>() < p)
    });
    (x, y)
}

fn main() -> Result<(), Box<dyn Error>> {
    const N_BATCHES: usize = 10;
    const BATCH_SIZE: usize = 100;
    const SEED: u64 = 2024;

    let mut rng = SmallRng::seed_from_u64(SEED);
    let (x_test, y_test) = make_batch(1_000, &mut rng);

    let config = SmcConfig::default()
        .particle_count(5_000)
        .proposal_scale(0.02)
        .prior_scale(10.0)
        .parallelism(4)
        .seed(SEED);
    let mut session = SmcSession::new(config)?;
    let handle = session.initialize(&[0, 1], 2)?;
    println!(
        "Initialized {} particles of dimension {}",
        handle.n_particles, handle.dim
    );

    for batch in 0..N_BATCHES {
        let (x, y) = make_batch(BATCH_SIZE, &mut rng);
        session.update(x.view(), y.view())?;
        let accuracy = session.score(x_test.view(), y_test.view(), None)?;
        let stats = &session.history()[batch];
        println!(
            "batch {batch:2}: ESS = {:8.1}, held-out accuracy = {:.3}",
            stats.ess, accuracy
        );
    }

    println!("{}", describe(&session)?);

    #[cfg(feature = "csv")]
    {
        if let (Some(proposals), Some(weights)) = (session.proposals(), session.weights()) {
            save_population_csv(proposals, weights, "/tmp/online_logit_population.csv")?;
            println!("Saved last proposals to /tmp/online_logit_population.csv");
        }
    }

    Ok(())
}

/// Formats the latest coefficients next to the ones the data was drawn from.
fn describe(session: &SmcSession) -> Result<String, Box<dyn Error>> {
    let model = session.model().ok_or("no model fitted")?;
    let coef = model.coef().ok_or("expected a global model")?;
    let intercept = model.intercept().ok_or("expected a global model")?;
    Ok(format!(
        "coef = [{:.2}, {:.2}] (true [{:.2}, {:.2}]), intercept = {:.2} (true {:.2})",
        coef[[0, 0]],
        coef[[0, 1]],
        TRUE_COEF[0],
        TRUE_COEF[1],
        intercept[0],
        TRUE_INTERCEPT
    ))
}

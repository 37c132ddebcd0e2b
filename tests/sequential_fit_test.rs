//! End-to-end checks of the incremental (`initialize` + `update`) particle filter on synthetic
//! linearly separable data.

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2, Axis};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;
    use smc_logistic::config::SmcConfig;
    use smc_logistic::session::SmcSession;

    // Shared constants.
    const SEED: u64 = 42;
    const TRUE_COEF: [f64; 2] = [2.0, -1.5];
    const TRUE_INTERCEPT: f64 = 0.3;
    const MARGIN: f64 = 0.05;
    const BATCH_SIZE: usize = 50;
    const N_BATCHES: usize = 16;

    /// Draws `n` points uniformly from `[-1, 1]²`, dropping points closer than `MARGIN` to the
    /// true hyperplane, and labels them by which side of it they fall on.
    fn separable_data(n: usize, rng: &mut SmallRng) -> (Array2<f64>, Array1<i64>) {
        let norm = (TRUE_COEF[0].powi(2) + TRUE_COEF[1].powi(2)).sqrt();
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        let mut i = 0;
        while i < n {
            let a: f64 = rng.random_range(-1.0..1.0);
            let b: f64 = rng.random_range(-1.0..1.0);
            let z = TRUE_COEF[0] * a + TRUE_COEF[1] * b + TRUE_INTERCEPT;
            if z.abs() / norm < MARGIN {
                continue;
            }
            x[[i, 0]] = a;
            x[[i, 1]] = b;
            y[i] = i64::from(z > 0.0);
            i += 1;
        }
        (x, y)
    }

    fn config(n_particles: usize) -> SmcConfig {
        SmcConfig::default()
            .particle_count(n_particles)
            .proposal_scale(0.05)
            .prior_scale(10.0)
            .seed(SEED)
    }

    /// Runs `N_BATCHES` updates of `BATCH_SIZE` rows each and returns the session.
    fn run_online(config: SmcConfig, x: &Array2<f64>, y: &Array1<i64>) -> SmcSession {
        let mut session = SmcSession::new(config).unwrap();
        session.initialize(&[0, 1], 2).unwrap();
        for batch in 0..N_BATCHES {
            let rows = batch * BATCH_SIZE..(batch + 1) * BATCH_SIZE;
            let xb = x.slice(ndarray::s![rows.clone(), ..]);
            let yb = y.slice(ndarray::s![rows]);
            session.update(xb, yb).unwrap();
        }
        session
    }

    #[test]
    fn learns_separating_hyperplane() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let (x_train, y_train) = separable_data(BATCH_SIZE * N_BATCHES, &mut rng);
        let (x_test, y_test) = separable_data(500, &mut rng);

        let session = run_online(config(2_000), &x_train, &y_train);
        let accuracy = session.score(x_test.view(), y_test.view(), None).unwrap();
        assert!(
            accuracy >= 0.95,
            "held-out accuracy too low: {accuracy}"
        );

        // The learned normal should point the same way as the true one.
        let coef = session.model().unwrap().coef().unwrap().row(0).to_owned();
        let cosine = (coef[0] * TRUE_COEF[0] + coef[1] * TRUE_COEF[1])
            / (coef.dot(&coef).sqrt() * (TRUE_COEF[0].powi(2) + TRUE_COEF[1].powi(2)).sqrt());
        assert!(cosine > 0.95, "coefficient direction is off: cosine = {cosine}");
        assert_eq!(session.history().len(), N_BATCHES);
    }

    #[test]
    fn identical_fits_for_any_parallelism() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let (x, y) = separable_data(BATCH_SIZE * N_BATCHES, &mut rng);

        let sequential = run_online(config(500), &x, &y);
        let parallel = run_online(config(500).parallelism(4), &x, &y);
        let sequential_again = run_online(config(500), &x, &y);

        assert_eq!(sequential.model(), parallel.model());
        assert_eq!(sequential.model(), sequential_again.model());
        assert_eq!(sequential.population(), parallel.population());
        assert_eq!(sequential.weights(), parallel.weights());
    }

    #[test]
    fn different_seeds_give_different_fits() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let (x, y) = separable_data(BATCH_SIZE * N_BATCHES, &mut rng);
        let a = run_online(config(200), &x, &y);
        let b = run_online(config(200).seed(SEED + 1), &x, &y);
        assert_ne!(a.model(), b.model());
    }

    #[test]
    fn binary_and_multinomial_parameterizations_agree() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let (x_train, y_train) = separable_data(BATCH_SIZE * N_BATCHES, &mut rng);
        let (x_test, _) = separable_data(500, &mut rng);

        let collapsed = run_online(config(2_000), &x_train, &y_train);
        let multinomial = run_online(config(2_000).multinomial(true), &x_train, &y_train);

        let m = multinomial.model().unwrap();
        assert_eq!(m.coef().unwrap().dim(), (2, 2));
        assert_eq!(multinomial.predict_proba(x_test.view(), None).unwrap().dim(), (500, 2));

        // In the two-output model only the difference of the rows is identified.
        let c = collapsed.model().unwrap().coef().unwrap().row(0).to_owned();
        let diff = &m.coef().unwrap().row(1) - &m.coef().unwrap().row(0);
        let cosine = c.dot(&diff) / (c.dot(&c).sqrt() * diff.dot(&diff).sqrt());
        assert!(cosine > 0.9, "parameterizations disagree: cosine = {cosine}");

        let a = collapsed.predict(x_test.view(), None).unwrap();
        let b = multinomial.predict(x_test.view(), None).unwrap();
        let agreement = a.iter().zip(b.iter()).filter(|(p, q)| p == q).count() as f64 / 500.0;
        assert!(agreement >= 0.9, "prediction agreement too low: {agreement}");
    }

    #[test]
    fn three_class_blobs() {
        const CENTERS: [[f64; 2]; 3] = [[-2.0, 0.0], [2.0, 0.0], [0.0, 2.5]];
        let mut rng = SmallRng::seed_from_u64(SEED);
        let mut blobs = |n: usize| {
            let mut x = Array2::zeros((n, 2));
            let mut y = Array1::zeros(n);
            for i in 0..n {
                let class = i % 3;
                for d in 0..2 {
                    let noise: f64 = rng.sample(StandardNormal);
                    x[[i, d]] = CENTERS[class][d] + 0.5 * noise;
                }
                y[i] = class as i64;
            }
            (x, y)
        };
        let (x_train, y_train) = blobs(600);
        let (x_test, y_test) = blobs(300);

        let mut session = SmcSession::new(config(2_000)).unwrap();
        session.initialize(&[0, 1, 2], 2).unwrap();
        for (xb, yb) in x_train
            .axis_chunks_iter(Axis(0), 60)
            .zip(y_train.axis_chunks_iter(Axis(0), 60))
        {
            session.update(xb, yb).unwrap();
        }

        let probs = session.predict_proba(x_test.view(), None).unwrap();
        assert_eq!(probs.dim(), (300, 3));
        let accuracy = session.score(x_test.view(), y_test.view(), None).unwrap();
        assert!(accuracy >= 0.85, "three-class accuracy too low: {accuracy}");
    }

    #[test]
    fn fit_is_initialize_plus_update() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let (x, y) = separable_data(200, &mut rng);

        let mut fitted = SmcSession::new(config(300)).unwrap();
        fitted.fit(x.view(), y.view()).unwrap();

        let mut manual = SmcSession::new(config(300)).unwrap();
        manual.initialize(&[0, 1], 2).unwrap();
        manual.update(x.view(), y.view()).unwrap();

        assert_eq!(fitted.model(), manual.model());
    }

    #[test]
    #[ignore = "Slow test: run only when explicitly requested"]
    fn learns_with_default_particle_count() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let (x_train, y_train) = separable_data(BATCH_SIZE * N_BATCHES, &mut rng);
        let (x_test, y_test) = separable_data(2_000, &mut rng);
        let session = run_online(
            SmcConfig::default().proposal_scale(0.05).seed(SEED).parallelism(4),
            &x_train,
            &y_train,
        );
        let accuracy = session.score(x_test.view(), y_test.view(), None).unwrap();
        assert!(accuracy >= 0.97, "held-out accuracy too low: {accuracy}");
    }
}

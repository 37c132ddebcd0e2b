/*!
# Sequential Fit Sessions.

[`SmcSession`] owns everything that changes while a model is being fitted: the particle
population, the most recent proposals and their normalized weights, the RNG, the latest
[`FittedModel`] and per-step diagnostics. Its lifecycle is an explicit [`Phase`]:

```text
Uninitialized --initialize--> Initialized --update--> Updated --update--> Updated ...
                    fit / fit_time_indexed -----------------------------> Fitted
                                                        Fitted --update--> Updated
```

Every step is atomic. It works on a copy of the RNG and on fresh buffers and only commits them
once scoring, reweighting, resampling and aggregation have all succeeded. A failing call leaves
the session exactly as it was.

## Example

```rust
use ndarray::{arr1, arr2};
use smc_logistic::config::SmcConfig;
use smc_logistic::session::SmcSession;

let config = SmcConfig::default().particle_count(500).proposal_scale(0.1).seed(42);
let mut session = SmcSession::new(config).unwrap();
session.initialize(&[0, 1], 1).unwrap();

let x = arr2(&[[-2.0], [-1.0], [1.0], [2.0]]);
let y = arr1(&[0, 0, 1, 1]);
session.update(x.view(), y.view()).unwrap();

let predicted = session.predict(x.view(), None).unwrap();
assert_eq!(predicted.len(), 4);
```
*/

use indicatif::ProgressBar;
use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::aggregate::aggregate;
use crate::config::SmcConfig;
use crate::error::{Result, SmcError};
use crate::likelihood::{LikelihoodScorer, ParticleLayout};
use crate::metrics::LabelSet;
use crate::model::FittedModel;
use crate::parallel::WorkerPool;
use crate::prior::sample_prior;
use crate::progress;
use crate::resample::resample;
use crate::reweight::normalize_log_weights;
use crate::stats::StepStats;

/// Relative ESS below which a step is reported as degenerate.
const LOW_ESS_FRACTION: f64 = 0.01;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Updated,
    Fitted,
}

/// Shape summary of an initialized population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationHandle {
    pub n_particles: usize,
    pub dim: usize,
    pub n_outputs: usize,
    pub n_features: usize,
}

/// Population state that exists once a session has been initialized.
#[derive(Debug, Clone)]
pub(crate) struct FilterState {
    pub(crate) labels: LabelSet,
    pub(crate) layout: ParticleLayout,
    /// Current (resampled) population, one particle per row.
    pub(crate) population: Array2<f64>,
    /// Proposals scored by the most recent step, before resampling.
    pub(crate) proposals: Option<Array2<f64>>,
    /// Normalized weights of `proposals`.
    pub(crate) weights: Option<Array1<f64>>,
}

/// A fit session for SMC logistic regression.
#[derive(Debug, Clone)]
pub struct SmcSession {
    pub(crate) config: SmcConfig,
    pub(crate) pool: WorkerPool,
    pub(crate) rng: SmallRng,
    pub(crate) phase: Phase,
    pub(crate) filter: Option<FilterState>,
    pub(crate) model: Option<FittedModel>,
    pub(crate) history: Vec<StepStats>,
}

impl SmcSession {
    /// Validates `config` and creates an uninitialized session.
    pub fn new(config: SmcConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.parallelism_hint())?;
        let seed = config
            .random_seed
            .unwrap_or_else(|| rand::rng().random::<u64>());
        Ok(Self {
            config,
            pool,
            rng: SmallRng::seed_from_u64(seed),
            phase: Phase::Uninitialized,
            filter: None,
            model: None,
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &SmcConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The latest fitted model, if any step has completed.
    pub fn model(&self) -> Option<&FittedModel> {
        self.model.as_ref()
    }

    /// The current population (rows are particles).
    pub fn population(&self) -> Option<ArrayView2<'_, f64>> {
        self.filter.as_ref().map(|f| f.population.view())
    }

    /// Proposals scored by the most recent step, before resampling.
    pub fn proposals(&self) -> Option<ArrayView2<'_, f64>> {
        self.filter
            .as_ref()
            .and_then(|f| f.proposals.as_ref())
            .map(|p| p.view())
    }

    /// Normalized weights of [`SmcSession::proposals`].
    pub fn weights(&self) -> Option<ArrayView1<'_, f64>> {
        self.filter
            .as_ref()
            .and_then(|f| f.weights.as_ref())
            .map(|w| w.view())
    }

    pub fn labels(&self) -> Option<&LabelSet> {
        self.filter.as_ref().map(|f| &f.labels)
    }

    pub fn layout(&self) -> Option<&ParticleLayout> {
        self.filter.as_ref().map(|f| &f.layout)
    }

    /// Diagnostics of every step since the last (re)initialization.
    pub fn history(&self) -> &[StepStats] {
        &self.history
    }

    /// Draws the prior population for `labels` and `n_features` features.
    ///
    /// Calling this again restarts the session from a fresh prior draw.
    pub fn initialize(&mut self, labels: &[i64], n_features: usize) -> Result<PopulationHandle> {
        let labels = LabelSet::new(labels)?;
        let layout = ParticleLayout::new(
            &labels,
            n_features,
            self.config.fit_intercept,
            self.config.multinomial,
        )?;
        let mut rng = self.rng.clone();
        let population = sample_prior(
            layout.dim(),
            self.config.particle_count,
            self.config.prior_scale,
            &mut rng,
        )?;
        info!(
            "Initialized {} particles of dimension {} for labels {:?}",
            self.config.particle_count,
            layout.dim(),
            labels.as_slice()
        );

        self.rng = rng;
        self.filter = Some(FilterState {
            labels,
            layout,
            population,
            proposals: None,
            weights: None,
        });
        self.model = None;
        self.history.clear();
        self.phase = Phase::Initialized;
        Ok(self.handle(&layout))
    }

    /// One SMC step on the batch `(x, y)`: propagate, score, reweight, resample, aggregate.
    pub fn update(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<&FittedModel> {
        let filter = self.filter.as_ref().ok_or_else(|| {
            SmcError::State("update called before initialize".to_string())
        })?;
        let scorer = LikelihoodScorer::new(
            x,
            y,
            &filter.labels,
            filter.layout,
            self.config.ridge_penalty,
        )?;
        let mut rng = self.rng.clone();
        let pb = progress::bar(
            self.config.particle_count as u64,
            self.config.progress,
            &format!("Step {}", self.history.len()),
        );

        let (proposals, scores) = propagate_and_score(
            filter.population.view(),
            &scorer,
            self.config.proposal_scale,
            &self.pool,
            &mut rng,
            &pb,
        )?;
        let weights = normalize_log_weights(scores.view())?;
        let stats = StepStats::new(self.history.len(), x.nrows(), scores.view(), weights.view());
        let population = resample(weights.view(), proposals.view(), &mut rng)?;
        let coefficients = aggregate(None, population.view(), &filter.layout)?;
        let model = FittedModel::global(filter.labels.clone(), filter.layout, coefficients);
        pb.finish_with_message(format!("ESS≈{:.1}", stats.ess));
        report(&stats, self.config.particle_count);

        self.rng = rng;
        if let Some(filter) = self.filter.as_mut() {
            filter.population = population;
            filter.proposals = Some(proposals);
            filter.weights = Some(weights);
        }
        self.history.push(stats);
        self.phase = Phase::Updated;
        Ok(&*self.model.insert(model))
    }

    /// Initializes with the distinct labels of `y` and runs one update on `(x, y)`.
    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<&FittedModel> {
        let labels = LabelSet::from_targets(y)?;
        let mut next = self.clone();
        next.initialize(labels.as_slice(), x.ncols())?;
        next.update(x, y)?;
        next.phase = Phase::Fitted;
        *self = next;
        self.fitted()
    }

    /// Linear scores of the latest model.
    pub fn decision_function(&self, x: ArrayView2<f64>, t: Option<&[i64]>) -> Result<Array2<f64>> {
        self.fitted()?.decision_function(x, t)
    }

    pub fn predict_proba(&self, x: ArrayView2<f64>, t: Option<&[i64]>) -> Result<Array2<f64>> {
        self.fitted()?.predict_proba(x, t)
    }

    pub fn predict(&self, x: ArrayView2<f64>, t: Option<&[i64]>) -> Result<Array1<i64>> {
        self.fitted()?.predict(x, t)
    }

    /// Mean accuracy of the latest model on `(x, y)`.
    pub fn score(&self, x: ArrayView2<f64>, y: ArrayView1<i64>, t: Option<&[i64]>) -> Result<f64> {
        self.fitted()?.score(x, y, t)
    }

    pub(crate) fn fitted(&self) -> Result<&FittedModel> {
        self.model.as_ref().ok_or_else(|| {
            SmcError::State("no fitted model: call update, fit or fit_time_indexed first".to_string())
        })
    }

    pub(crate) fn handle(&self, layout: &ParticleLayout) -> PopulationHandle {
        PopulationHandle {
            n_particles: self.config.particle_count,
            dim: layout.dim(),
            n_outputs: layout.n_outputs,
            n_features: layout.n_features,
        }
    }
}

/// Logs the outcome of a step.
pub(crate) fn report(stats: &StepStats, n_particles: usize) {
    debug!("{stats}");
    if stats.relative_ess(n_particles) < LOW_ESS_FRACTION {
        warn!(
            "Step {}: effective sample size collapsed to {:.1} of {} particles",
            stats.step, stats.ess, n_particles
        );
    }
}

/// Random-walk proposal and scoring of every particle.
///
/// One sub-seed per particle is drawn from `rng` in particle order before any work is
/// dispatched, so the results do not depend on the number of workers.
pub(crate) fn propagate_and_score(
    population: ArrayView2<f64>,
    scorer: &LikelihoodScorer<'_>,
    proposal_scale: f64,
    pool: &WorkerPool,
    rng: &mut SmallRng,
    pb: &ProgressBar,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let (n, dim) = population.dim();
    let seeds: Vec<u64> = (0..n).map(|_| rng.random::<u64>()).collect();
    let tasks: Vec<(ArrayView1<f64>, u64)> = population.rows().into_iter().zip(seeds).collect();
    let std = proposal_scale.sqrt();

    let results = pool.map(tasks, |(particle, seed)| {
        let mut particle_rng = SmallRng::seed_from_u64(seed);
        let proposal = particle.mapv(|v| {
            let z: f64 = particle_rng.sample(StandardNormal);
            v + std * z
        });
        let score = scorer.score(proposal.view());
        pb.inc(1);
        score.map(|s| (proposal, s))
    });

    let mut proposals = Array2::zeros((n, dim));
    let mut scores = Array1::zeros(n);
    for (i, result) in results.into_iter().enumerate() {
        let (proposal, score) = result?;
        proposals.row_mut(i).assign(&proposal);
        scores[i] = score;
    }
    Ok((proposals, scores))
}

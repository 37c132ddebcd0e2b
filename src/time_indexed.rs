/*!
# Time-Indexed Fits.

Rows are grouped into blocks by an integer time key and blocks are visited in ascending key
order. Each particle is a trajectory: it starts from a fresh prior draw and takes one
random-walk step per block. At block `b` every particle is scored against that block's rows
only, and the block keeps its own particle snapshot and normalized weights. Resampling is
deferred until all blocks are scored; each block is then resampled independently with its own
weights and reduced to one coefficient pair.
*/

use indicatif::ProgressBar;
use log::info;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::aggregate::aggregate;
use crate::error::{Result, SmcError};
use crate::likelihood::{LikelihoodScorer, ParticleLayout};
use crate::metrics::LabelSet;
use crate::model::FittedModel;
use crate::prior::sample_prior;
use crate::progress;
use crate::resample::resample;
use crate::reweight::normalize_log_weights;
use crate::session::{propagate_and_score, report, FilterState, Phase, SmcSession};
use crate::stats::StepStats;

/// Partition of row indices by time key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBlocks {
    keys: Vec<i64>,
    inverse: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl TimeBlocks {
    pub fn new(t: &[i64]) -> Result<Self> {
        if t.is_empty() {
            return Err(SmcError::ShapeMismatch(
                "time-indexed fit needs at least one row".to_string(),
            ));
        }
        let mut keys = t.to_vec();
        keys.sort_unstable();
        keys.dedup();
        let mut members = vec![Vec::new(); keys.len()];
        let inverse: Vec<usize> = t
            .iter()
            .enumerate()
            .map(|(row, key)| {
                // `keys` holds every value of `t`, so the search always succeeds.
                let block = keys.binary_search(key).unwrap_or_default();
                members[block].push(row);
                block
            })
            .collect();
        Ok(Self {
            keys,
            inverse,
            members,
        })
    }

    /// Distinct keys in ascending order.
    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    /// Block position of every original row.
    pub fn inverse(&self) -> &[usize] {
        &self.inverse
    }

    /// Row indices of block `block`, in original order.
    pub fn rows(&self, block: usize) -> &[usize] {
        &self.members[block]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SmcSession {
    /// Fits one coefficient pair per distinct value of `t` in a single call.
    ///
    /// Labels are the distinct values of `y`. The session ends in [`Phase::Fitted`] with the
    /// last block's resampled population as its current population, so later
    /// [`SmcSession::update`] calls continue from the most recent period.
    pub fn fit_time_indexed(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<i64>,
        t: &[i64],
    ) -> Result<&FittedModel> {
        if x.nrows() != y.len() || x.nrows() != t.len() {
            return Err(SmcError::ShapeMismatch(format!(
                "{} feature rows, {} labels and {} time keys",
                x.nrows(),
                y.len(),
                t.len()
            )));
        }
        let labels = LabelSet::from_targets(y)?;
        let layout = ParticleLayout::new(
            &labels,
            x.ncols(),
            self.config.fit_intercept,
            self.config.multinomial,
        )?;
        let blocks = TimeBlocks::new(t)?;
        let n_particles = self.config.particle_count;
        info!(
            "Time-indexed fit: {} particles over {} blocks ({} rows)",
            n_particles,
            blocks.len(),
            x.nrows()
        );

        let mut rng = self.rng.clone();
        let prior = sample_prior(layout.dim(), n_particles, self.config.prior_scale, &mut rng)?;
        let pb = progress::bar(blocks.len() as u64, self.config.progress, "Blocks");
        let hidden = ProgressBar::hidden();

        let mut snapshots: Vec<(Array2<f64>, Array1<f64>)> = Vec::with_capacity(blocks.len());
        let mut history = Vec::with_capacity(blocks.len());
        for block in 0..blocks.len() {
            let rows = blocks.rows(block);
            let xb = x.select(Axis(0), rows);
            let yb = y.select(Axis(0), rows);
            let scorer = LikelihoodScorer::new(
                xb.view(),
                yb.view(),
                &labels,
                layout,
                self.config.ridge_penalty,
            )?;
            let previous = snapshots.last().map_or(prior.view(), |(p, _)| p.view());
            let (proposals, scores) = propagate_and_score(
                previous,
                &scorer,
                self.config.proposal_scale,
                &self.pool,
                &mut rng,
                &hidden,
            )?;
            let weights = normalize_log_weights(scores.view())?;
            let stats = StepStats::new(block, rows.len(), scores.view(), weights.view());
            report(&stats, n_particles);
            pb.set_message(format!("t={} ESS≈{:.1}", blocks.keys()[block], stats.ess));
            pb.inc(1);
            history.push(stats);
            snapshots.push((proposals, weights));
        }

        let mut coefficients = Vec::with_capacity(snapshots.len());
        let mut resampled = None;
        for (particles, weights) in &snapshots {
            let population = resample(weights.view(), particles.view(), &mut rng)?;
            coefficients.push(aggregate(None, population.view(), &layout)?);
            resampled = Some(population);
        }
        let model = FittedModel::time_indexed(labels.clone(), layout, blocks.keys(), coefficients)?;
        let population = resampled.ok_or_else(|| {
            SmcError::ShapeMismatch("time-indexed fit produced no blocks".to_string())
        })?;
        let (proposals, weights) = snapshots
            .pop()
            .map_or((None, None), |(p, w)| (Some(p), Some(w)));
        pb.finish();

        self.rng = rng;
        self.filter = Some(FilterState {
            labels,
            layout,
            population,
            proposals,
            weights,
        });
        self.history = history;
        self.phase = Phase::Fitted;
        Ok(&*self.model.insert(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmcConfig;
    use crate::model::ModelCoefficients;
    use ndarray::{arr1, arr2};

    #[test]
    fn blocks_are_sorted_with_inverse_index() {
        let blocks = TimeBlocks::new(&[2021, 2019, 2021, 2020, 2019]).unwrap();
        assert_eq!(blocks.keys(), &[2019, 2020, 2021]);
        assert_eq!(blocks.inverse(), &[2, 0, 2, 1, 0]);
        assert_eq!(blocks.rows(0), &[1, 4]);
        assert_eq!(blocks.rows(2), &[0, 2]);
        assert!(TimeBlocks::new(&[]).is_err());
    }

    #[test]
    fn one_coefficient_pair_per_block() {
        let x = arr2(&[[-1.0], [1.0], [-1.0], [1.0], [-2.0], [2.0]]);
        let y = arr1(&[0, 1, 1, 0, 0, 1]);
        let t = [3, 3, 1, 1, 2, 2];
        let config = SmcConfig::default().particle_count(300).seed(7);
        let mut session = SmcSession::new(config).unwrap();
        let model = session.fit_time_indexed(x.view(), y.view(), &t).unwrap();
        match model.coefficients() {
            ModelCoefficients::TimeIndexed { blocks, index } => {
                assert_eq!(blocks.len(), 3);
                assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
            }
            ModelCoefficients::Global(_) => panic!("expected a time-indexed model"),
        }
        assert_eq!(session.phase(), Phase::Fitted);
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.population().unwrap().nrows(), 300);
        assert_eq!(session.predict(x.view(), Some(&t[..])).unwrap().len(), 6);
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let x = arr2(&[[0.0], [1.0]]);
        let y = arr1(&[0, 1]);
        let mut session = SmcSession::new(SmcConfig::default().particle_count(10)).unwrap();
        assert!(matches!(
            session.fit_time_indexed(x.view(), y.view(), &[1]),
            Err(SmcError::ShapeMismatch(_))
        ));
        assert_eq!(session.phase(), Phase::Uninitialized);
    }

    #[test]
    fn update_continues_after_time_indexed_fit() {
        let x = arr2(&[[-1.0], [1.0], [-1.0], [1.0]]);
        let y = arr1(&[0, 1, 0, 1]);
        let mut session = SmcSession::new(SmcConfig::default().particle_count(50).seed(1)).unwrap();
        session.fit_time_indexed(x.view(), y.view(), &[0, 0, 1, 1]).unwrap();
        let model = session.update(x.view(), y.view()).unwrap();
        assert!(!model.is_time_indexed());
        assert_eq!(session.phase(), Phase::Updated);
    }
}

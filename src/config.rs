/*!
# Sampler Configuration.

[`SmcConfig`] collects every option recognised by the particle filter. Values are set with
consuming builder methods and checked once by [`SmcConfig::validate`], which every session calls
before it touches the data.

```rust
use smc_logistic::config::SmcConfig;

let config = SmcConfig::default()
    .particle_count(2_000)
    .proposal_scale(0.05)
    .ridge_penalty(1e-3)
    .seed(42);
assert!(config.validate().is_ok());
```
*/

use crate::error::{Result, SmcError};
use crate::parallel::Parallelism;

/// Options for prior sampling, proposals, scoring and execution.
///
/// Both `prior_scale` and `proposal_scale` are variances: the prior is
/// `N(0, prior_scale * I)` and each random-walk step adds `N(0, proposal_scale * I)` noise.
#[derive(Debug, Clone, PartialEq)]
pub struct SmcConfig {
    /// Number of particles `N` in the population.
    pub particle_count: usize,
    /// Variance of the random-walk proposal.
    pub proposal_scale: f64,
    /// Variance of the isotropic Gaussian prior.
    pub prior_scale: f64,
    /// L2 penalty `alpha` applied to the squared norm of each particle.
    pub ridge_penalty: f64,
    /// Whether each output row carries an intercept entry.
    pub fit_intercept: bool,
    /// Seed for the session RNG. `None` draws a seed from OS entropy.
    pub random_seed: Option<u64>,
    /// Number of workers used to score particles.
    pub parallelism: usize,
    /// Use one softmax output per class even for two-class problems.
    pub multinomial: bool,
    /// Show progress bars while fitting.
    pub progress: bool,
}

impl Default for SmcConfig {
    fn default() -> Self {
        Self {
            particle_count: 20_000,
            proposal_scale: 1.0,
            prior_scale: 10.0,
            ridge_penalty: 0.0,
            fit_intercept: true,
            random_seed: None,
            parallelism: 1,
            multinomial: false,
            progress: false,
        }
    }
}

impl SmcConfig {
    pub fn particle_count(mut self, n: usize) -> Self {
        self.particle_count = n;
        self
    }

    pub fn proposal_scale(mut self, scale: f64) -> Self {
        self.proposal_scale = scale;
        self
    }

    pub fn prior_scale(mut self, scale: f64) -> Self {
        self.prior_scale = scale;
        self
    }

    pub fn ridge_penalty(mut self, alpha: f64) -> Self {
        self.ridge_penalty = alpha;
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fixes the session seed so that fits are reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn parallelism(mut self, n_workers: usize) -> Self {
        self.parallelism = n_workers;
        self
    }

    pub fn multinomial(mut self, multinomial: bool) -> Self {
        self.multinomial = multinomial;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Checks every option, returning the first violation as [`SmcError::Configuration`].
    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 {
            return Err(SmcError::Configuration(
                "particle_count must be at least 1".to_string(),
            ));
        }
        check_positive("proposal_scale", self.proposal_scale)?;
        check_positive("prior_scale", self.prior_scale)?;
        if !self.ridge_penalty.is_finite() || self.ridge_penalty < 0.0 {
            return Err(SmcError::Configuration(format!(
                "ridge_penalty must be finite and non-negative, got {}",
                self.ridge_penalty
            )));
        }
        if self.parallelism == 0 {
            return Err(SmcError::Configuration(
                "parallelism must be at least 1 worker".to_string(),
            ));
        }
        Ok(())
    }

    /// Worker strategy derived from [`SmcConfig::parallelism`].
    pub fn parallelism_hint(&self) -> Parallelism {
        Parallelism::from_threads(self.parallelism)
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SmcError::Configuration(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SmcConfig::default();
        assert_eq!(config.particle_count, 20_000);
        assert!(config.fit_intercept);
        assert!(config.random_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_chains() {
        let config = SmcConfig::default()
            .particle_count(10)
            .prior_scale(2.0)
            .proposal_scale(0.5)
            .fit_intercept(false)
            .parallelism(4)
            .seed(7);
        assert_eq!(config.particle_count, 10);
        assert_eq!(config.prior_scale, 2.0);
        assert_eq!(config.proposal_scale, 0.5);
        assert!(!config.fit_intercept);
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.parallelism_hint(), Parallelism::Parallel(4));
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            SmcConfig::default().particle_count(0),
            SmcConfig::default().proposal_scale(0.0),
            SmcConfig::default().prior_scale(-1.0),
            SmcConfig::default().prior_scale(f64::NAN),
            SmcConfig::default().ridge_penalty(-0.1),
            SmcConfig::default().parallelism(0),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(SmcError::Configuration(_))),
                "expected configuration error for {config:?}"
            );
        }
    }
}

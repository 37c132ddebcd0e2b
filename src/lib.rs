//! # SMC Logistic
//!
//! Bayesian logistic regression by **Sequential Monte Carlo (SMC)**. Instead of solving for one
//! maximum-likelihood coefficient vector, the crate keeps a population of candidate coefficient
//! vectors ("particles"), weights each by how well it explains the observed labels, and refines
//! the population as new batches or time-indexed blocks arrive.
//!
//! ## Getting Started
//!
//! ```bash
//! cargo add smc-logistic
//! ```
//!
//! Each SMC step performs:
//! 1. **Propagation**: every particle takes a Gaussian random-walk step ([`session`]).
//! 2. **Scoring**: the penalized log-likelihood of each proposal on the batch ([`likelihood`]).
//! 3. **Reweighting**: a numerically stable softmax of the scores ([`reweight`]).
//! 4. **Resampling**: multinomial resampling of the proposals ([`resample`]).
//! 5. **Aggregation**: the mean particle becomes the point estimate ([`aggregate`], [`model`]).
//!
//! ## Example 1: Online Updates
//!
//! ```rust
//! use ndarray::{arr1, arr2};
//! use smc_logistic::config::SmcConfig;
//! use smc_logistic::session::SmcSession;
//!
//! let config = SmcConfig::default()
//!     .particle_count(1_000)
//!     .proposal_scale(0.05)
//!     .seed(42);
//! let mut session = SmcSession::new(config).unwrap();
//!
//! // Labels and feature count come first; no data is needed yet.
//! session.initialize(&[0, 1], 2).unwrap();
//!
//! // Then one call per batch.
//! let x = arr2(&[[-1.0, -0.5], [-0.5, -1.0], [1.0, 0.5], [0.5, 1.0]]);
//! let y = arr1(&[0, 0, 1, 1]);
//! for _ in 0..3 {
//!     session.update(x.view(), y.view()).unwrap();
//! }
//!
//! let model = session.model().unwrap();
//! println!("coef = {}, intercept = {}", model.coef().unwrap(), model.intercept().unwrap());
//! let probs = session.predict_proba(x.view(), None).unwrap();
//! assert_eq!(probs.dim(), (4, 2));
//! ```
//!
//! ## Example 2: One Coefficient Set per Time Block
//!
//! ```rust
//! use ndarray::{arr1, arr2};
//! use smc_logistic::config::SmcConfig;
//! use smc_logistic::session::SmcSession;
//!
//! let x = arr2(&[[-1.0], [1.0], [-1.0], [1.0]]);
//! let y = arr1(&[0, 1, 1, 0]);
//! let t = [2023, 2023, 2024, 2024];
//!
//! let mut session = SmcSession::new(SmcConfig::default().particle_count(500).seed(3)).unwrap();
//! let model = session.fit_time_indexed(x.view(), y.view(), &t).unwrap();
//! assert_eq!(model.time_keys(), vec![2023, 2024]);
//!
//! let predicted = session.predict(x.view(), Some(&t[..])).unwrap();
//! assert_eq!(predicted.len(), 4);
//! ```
//!
//! ## Features
//! - **Reproducible parallel scoring**: per-particle sub-seeds are drawn before dispatch, so the
//!   fit is the same for any `parallelism`.
//! - **Binary and multi-class** models, with an optional multinomial parameterization for two
//!   classes.
//! - **Diagnostics**: effective sample size and score summaries per step ([`stats`]), logged
//!   through the [`log`] facade, plus optional progress bars.
//! - **Optional I/O**: CSV export of population snapshots (`csv` feature).

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod error;
pub mod io;
pub mod likelihood;
pub mod math;
pub mod metrics;
pub mod model;
pub mod parallel;
pub mod prior;
mod progress;
pub mod resample;
pub mod reweight;
pub mod session;
pub mod stats;
pub mod time_indexed;

pub use classifier::Classifier;
pub use config::SmcConfig;
pub use error::{Result, SmcError};
pub use model::FittedModel;
pub use session::{Phase, SmcSession};

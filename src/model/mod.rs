//! Durability Model
//!
//! The evaluation pipeline for a single configuration:
//!
//! ```text
//! ModelConfig ──► ClusterSizes ──► FailureRates ──► DurabilityResults
//!  (validated)     (topology)       (FIT rates)      (loss, nines)
//! ```
//!
//! Every stage is a pure function of its inputs. Intermediate values are
//! emitted as `debug` tracing events and never influence the results.
//!
//! # Usage
//!
//! ```
//! use cache_durability_model::model::{evaluate, EvaluationParams, ModelConfig};
//!
//! let config = ModelConfig::builder("two nv copies").copies(3).build()?;
//! let evaluation = evaluate(&config, &EvaluationParams::default())?;
//! assert!(evaluation.results.durability > 0.999);
//! # Ok::<(), cache_durability_model::Error>(())
//! ```

pub mod config;
pub mod rates;
pub mod results;
pub mod sizes;
pub mod tier;

pub use config::{
    ArchitectureConfig, FailureRateConfig, FanOutPolicy, HardwareConfig, LoadConfig,
    ModelConfig, ModelConfigBuilder, PerformanceConfig, Redundancy, UtilizationConfig,
};
pub use rates::FailureRates;
pub use results::{count_nines, DurabilityResults, ErrorFits, ExpectedEvents, RecoveryTimes};
pub use sizes::ClusterSizes;
pub use tier::{CacheMedium, NodeRole};

use crate::error::{Error, Result};
use crate::units::{PB, YEAR};
use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Evaluation Parameters
// =============================================================================

/// Parameters shared by every model in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationParams {
    /// Backing-store capacity (bytes)
    pub capacity: f64,
    /// Modeled period (hours)
    pub period: f64,
    /// Component repair time (hours); the model's own when unset
    pub repair: Option<f64>,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            capacity: PB,
            period: YEAR,
            repair: None,
        }
    }
}

impl EvaluationParams {
    /// Validate the run parameters
    pub fn validate(&self) -> Result<()> {
        if !self.capacity.is_finite() || self.capacity < 0.0 {
            return Err(Error::InvalidEvaluation {
                parameter: "capacity".to_string(),
                reason: format!("must be a non-negative number of bytes, got {}", self.capacity),
            });
        }
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(Error::InvalidEvaluation {
                parameter: "period".to_string(),
                reason: format!("must be a positive number of hours, got {}", self.period),
            });
        }
        if let Some(repair) = self.repair {
            if !repair.is_finite() || repair < 0.0 {
                return Err(Error::InvalidEvaluation {
                    parameter: "repair".to_string(),
                    reason: format!("must be a non-negative number of hours, got {}", repair),
                });
            }
        }
        Ok(())
    }

    /// Repair time to use for a model
    pub fn repair_for(&self, model: &ModelConfig) -> f64 {
        self.repair.unwrap_or(model.performance.time_repair)
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Everything derived for one configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub config: ModelConfig,
    pub sizes: ClusterSizes,
    pub rates: FailureRates,
    pub results: DurabilityResults,
}

/// Run the full pipeline for one configuration
pub fn evaluate(model: &ModelConfig, params: &EvaluationParams) -> Result<Evaluation> {
    model.validate()?;
    params.validate()?;

    let sizes = ClusterSizes::compute(model, params.capacity);
    let rates = FailureRates::compute(model, params.repair_for(model));
    let results = DurabilityResults::compute(model, &sizes, &rates, params.period);

    debug!(
        model = %model.description,
        p_loss = results.p_loss,
        durability = results.durability,
        nines = results.nines,
        "Evaluated model"
    );

    Ok(Evaluation {
        config: model.clone(),
        sizes,
        rates,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_evaluate_baseline() {
        let model = ModelConfig::baseline("baseline").unwrap();
        let evaluation = evaluate(&model, &EvaluationParams::default()).unwrap();

        assert_eq!(evaluation.config, model);
        assert!(evaluation.sizes.n_primary > 100.0);
        assert!(evaluation.results.durability > 0.999_999);
        assert!(evaluation.results.durability < 1.0);
        assert!(evaluation.results.nines >= 6);
    }

    #[test]
    fn test_evaluate_rejects_bad_params() {
        let model = ModelConfig::baseline("baseline").unwrap();
        let params = EvaluationParams {
            period: 0.0,
            ..Default::default()
        };
        assert_matches!(
            evaluate(&model, &params),
            Err(Error::InvalidEvaluation { ref parameter, .. }) if parameter == "period"
        );
    }

    #[test]
    fn test_evaluate_revalidates_mutated_model() {
        let mut model = ModelConfig::baseline("mutated").unwrap();
        model.architecture.decluster = 0;
        assert_matches!(
            evaluate(&model, &EvaluationParams::default()),
            Err(Error::InvalidParameter { .. })
        );
    }

    #[test]
    fn test_repair_override() {
        let model = ModelConfig::baseline("repair").unwrap();
        let params = EvaluationParams {
            repair: Some(240.0),
            ..Default::default()
        };
        let slow = evaluate(&model, &params).unwrap();
        let fast = evaluate(&model, &EvaluationParams::default()).unwrap();
        assert!(slow.rates.fits_hardware > fast.rates.fits_hardware);
    }

    #[test]
    fn test_durability_never_drops_with_more_copies() {
        let params = EvaluationParams::default();
        let mut last = 0.0;
        for copies in 0..=4 {
            let model = ModelConfig::builder(format!("copies={}", copies))
                .copies(copies)
                .build()
                .unwrap();
            let d = evaluate(&model, &params).unwrap().results.durability;
            assert!(d >= last, "copies={} durability {} < {}", copies, d, last);
            last = d;
        }
    }

    #[test]
    fn test_durability_never_rises_with_period() {
        let model = ModelConfig::builder("volatile")
            .media(CacheMedium::Volatile, CacheMedium::NonVolatile)
            .copies(2)
            .build()
            .unwrap();
        let mut last = 1.0;
        for years in [0.1, 1.0, 10.0] {
            let params = EvaluationParams {
                period: years * YEAR,
                ..Default::default()
            };
            let d = evaluate(&model, &params).unwrap().results.durability;
            assert!(d <= last);
            last = d;
        }
    }

    #[test]
    fn test_faster_flush_shortens_recovery() {
        let model = ModelConfig::baseline("flush").unwrap();
        let doubled = model
            .to_builder()
            .rate_flush(model.performance.rate_flush * 2.0)
            .build()
            .unwrap();

        let params = EvaluationParams::default();
        let before = evaluate(&model, &params).unwrap().results;
        let after = evaluate(&doubled, &params).unwrap().results;
        assert!(after.t_recov < before.t_recov);
        assert!(after.durability >= before.durability);
    }

    #[test]
    fn test_volatile_primary_without_copies_is_unconditional() {
        let model = ModelConfig::builder("v, no copies")
            .copies(0)
            .media(CacheMedium::Volatile, CacheMedium::Volatile)
            .build()
            .unwrap();
        let evaluation = evaluate(&model, &EvaluationParams::default()).unwrap();
        let r = &evaluation.results;

        let expected = 1.0 - crate::reliability::poisson_pn(r.expected.primary_failures, 0);
        assert!((r.p_loss - expected).abs() < 1e-12);
        assert_eq!(r.bw_pfail, 0.0);
        assert_eq!(evaluation.sizes.fan_out, 0.0);
    }

    #[test]
    fn test_zero_capacity_is_finite() {
        let model = ModelConfig::baseline("empty").unwrap();
        let params = EvaluationParams {
            capacity: 0.0,
            ..Default::default()
        };
        let r = evaluate(&model, &params).unwrap().results;
        assert_eq!(r.p_loss, 0.0);
        assert_eq!(r.durability, 1.0);
        assert!(!r.expected_loss.is_nan());
    }
}

//! Scenario Suites
//!
//! Named sets of what-if configurations, each a variation on the reference
//! model, and the runner that evaluates them with shared run parameters.

pub mod suites;

pub use suites::{default_suite, nvram_ber_suite, NVRAM_BIT_ERROR_RATES};

use crate::error::{Error, Result};
use crate::model::{evaluate, Evaluation, EvaluationParams, ModelConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// A built-in suite of configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suite {
    /// Primary volatility against zero, one and two secondary copies
    #[default]
    Default,
    /// NVRAM read bit-error rate sweep
    NvramBer,
}

impl Suite {
    /// Build the configurations of this suite
    pub fn models(&self) -> Result<Vec<ModelConfig>> {
        match self {
            Suite::Default => default_suite(),
            Suite::NvramBer => nvram_ber_suite(),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suite::Default => write!(f, "default"),
            Suite::NvramBer => write!(f, "nvram-ber"),
        }
    }
}

impl FromStr for Suite {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Suite::Default),
            "nvram-ber" | "nvramber" => Ok(Suite::NvramBer),
            other => Err(Error::UnknownSuite(other.to_string())),
        }
    }
}

/// Evaluate every model with the same run parameters
///
/// Models are independent; the first invalid one aborts the run.
pub fn run_suite(models: &[ModelConfig], params: &EvaluationParams) -> Result<Vec<Evaluation>> {
    params.validate()?;
    info!(
        models = models.len(),
        capacity = params.capacity,
        period = params.period,
        "Evaluating models"
    );

    models
        .iter()
        .map(|model| {
            let evaluation = evaluate(model, params)?;
            info!(
                model = %model.description,
                durability = evaluation.results.durability,
                nines = evaluation.results.nines,
                "Model evaluated"
            );
            Ok(evaluation)
        })
        .collect()
}

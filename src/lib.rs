//! Cache Durability Model
//!
//! Analytic durability estimates for clusters of write-back caches whose
//! dirty data is mirrored from primary nodes to secondary nodes before it
//! is flushed to a backing store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          Durability Evaluation                              │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │  ModelConfig    │  │  ClusterSizes   │  │      FailureRates           │  │
//! │  │  (validated)    │─►│  (topology)     │─►│  (per-role FIT, cache)      │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────┬───────────────┘  │
//! │                                                          │                  │
//! │                    ┌─────────────────────────────────────┘                  │
//! │                    ▼                                                        │
//! │         ┌───────────────────────┐                                           │
//! │         │  DurabilityResults    │  loss probabilities, recovery window,     │
//! │         │  (scenario composer)  │  durability and nines                     │
//! │         └───────────────────────┘                                           │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                      Reliability Primitives                                 │
//! │      FIT rates · Poisson probabilities · union · redundant groups           │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                    Driver (scenario suites, reports)                        │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`model`]: Configuration, topology, rates and the durability composer
//! - [`reliability`]: Probability primitives
//! - [`scenarios`]: Built-in what-if suites and the suite runner
//! - [`report`]: Column-aligned console reports
//! - [`units`]: Size and time units
//! - [`error`]: Error types and handling

pub mod error;
pub mod model;
pub mod reliability;
pub mod report;
pub mod scenarios;
pub mod units;

// Re-export commonly used types
pub use error::{Error, Result};

pub use model::{
    evaluate, CacheMedium, ClusterSizes, DurabilityResults, Evaluation, EvaluationParams,
    FailureRates, FanOutPolicy, ModelConfig, ModelConfigBuilder, NodeRole,
};

pub use report::Verbosity;

pub use scenarios::{run_suite, Suite};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

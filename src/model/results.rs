//! Durability Results
//!
//! Composes node failures, NVRAM bit errors and the recovery window into the
//! probability of losing dirty data over a modeled period.
//!
//! Two classes of initiating failure are modeled:
//!
//! 1. a primary goes down, or suffers an unrecoverable error, and its data
//!    survives only if enough of its secondaries outlive detection and flush
//! 2. a secondary goes down, and its data survives only if the primaries it
//!    mirrors (and then the other secondaries) outlive timeout and catch-up
//!
//! The probability of each is computed independently and combined with the
//! independent-union approximation.

use super::config::ModelConfig;
use super::rates::FailureRates;
use super::sizes::ClusterSizes;
use super::tier::NodeRole;
use crate::reliability::{poisson_p, poisson_pn, prob_at_least, union_approx};
use crate::units::{hours_to_seconds, seconds_to_hours, BILLION, SECOND};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bits per byte times FIT units per second: turns bytes/s × bit-error-rate
/// into an equivalent FIT rate
const BER_TO_FIT: f64 = 8.0 * BILLION / SECOND;

/// Nines beyond the decimal precision of an f64 are noise
const MAX_NINES: u32 = f64::DIGITS + 2;

// =============================================================================
// Recovery Timing
// =============================================================================

/// Detection and recovery timings, in hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryTimes {
    /// Transport retransmit timeout
    pub timeout: f64,
    /// Failure detection delay
    pub detect: f64,
    /// Dirty bytes each secondary must flush (bytes)
    pub bytes_to_flush: f64,
    /// Time for a secondary to flush its share
    pub secondary_flush: f64,
    /// Time for a primary to flush or remirror its data
    pub primary_recovery: f64,
    /// Bandwidth a primary recovers at (bytes/s)
    pub primary_bandwidth: f64,
    /// Bandwidth a secondary flushes at (bytes/s)
    pub secondary_bandwidth: f64,
}

impl RecoveryTimes {
    pub fn compute(model: &ModelConfig) -> Self {
        let perf = &model.performance;
        let arch = &model.architecture;

        let bytes_to_flush = arch.max_dirty / f64::from(arch.decluster);
        let secondary_bandwidth = perf.rate_flush;
        let primary_bandwidth = if arch.remirror && perf.rate_mirror > perf.rate_flush {
            perf.rate_mirror
        } else {
            perf.rate_flush
        };

        Self {
            timeout: seconds_to_hours(perf.time_timeout),
            detect: seconds_to_hours(perf.time_detect),
            bytes_to_flush,
            secondary_flush: seconds_to_hours(bytes_to_flush / secondary_bandwidth),
            primary_recovery: seconds_to_hours(bytes_to_flush / primary_bandwidth),
            primary_bandwidth,
            secondary_bandwidth,
        }
    }

    /// Window in which a primary is exposed after losing a secondary
    pub fn primary_window(&self) -> f64 {
        self.timeout + self.primary_recovery
    }

    /// Window in which secondaries are exposed after losing a primary
    pub fn secondary_window(&self) -> f64 {
        self.detect + self.secondary_flush
    }

    /// Data is safe again once both sides of the recovery have completed
    pub fn vulnerable_window(&self) -> f64 {
        self.primary_window().max(self.secondary_window())
    }

    /// Share of `window` spent reading NVRAM during a secondary flush
    fn flush_share(&self, window: f64) -> f64 {
        if window > 0.0 {
            self.secondary_flush / window
        } else {
            0.0
        }
    }
}

// =============================================================================
// Error-equivalent FIT Rates
// =============================================================================

/// NVRAM bit-error rates expressed as FIT rates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorFits {
    /// Primary, from incoming write traffic
    pub primary: f64,
    /// Secondary, from mirrored write traffic
    pub secondary_write: f64,
    /// Secondary, from reads while flushing
    pub secondary_read: f64,
}

impl ErrorFits {
    pub fn compute(model: &ModelConfig, rates: &FailureRates, fan_out: f64) -> Self {
        if !model.architecture.model_bit_errors {
            return Self::default();
        }

        let f = &model.failure_rates;
        let hw = &model.hardware;
        let scp = f64::from(model.secondary_copies());

        let primary = if hw.medium(NodeRole::Primary).is_volatile() {
            0.0
        } else {
            rates.writes_in * (f.ber_nvm_write + f.ber_nvm_read)
        };
        let (secondary_write, secondary_read) = if hw.medium(NodeRole::Secondary).is_volatile() {
            (0.0, 0.0)
        } else {
            (
                rates.writes_in * scp * f.ber_nvm_write / fan_out.max(1.0),
                model.performance.rate_flush * f.ber_nvm_read,
            )
        };

        Self {
            primary: primary * BER_TO_FIT,
            secondary_write: secondary_write * BER_TO_FIT,
            secondary_read: secondary_read * BER_TO_FIT,
        }
    }
}

// =============================================================================
// Expected Events
// =============================================================================

/// Expected initiating events over the modeled period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedEvents {
    pub primary_failures: f64,
    pub primary_errors: f64,
    pub secondary_failures: f64,
}

// =============================================================================
// Scenario Composition
// =============================================================================

/// Inputs shared by every scenario evaluated for one configuration
struct Scenario<'a> {
    n1: f64,
    n2: f64,
    fan_in: f64,
    fan_out: f64,
    l1: f64,
    l2: f64,
    scp: u32,
    period: f64,
    times: &'a RecoveryTimes,
}

/// Primary- and secondary-initiated loss probabilities
struct ScenarioLoss {
    expected: ExpectedEvents,
    primary: f64,
    secondary: f64,
}

impl Scenario<'_> {
    fn compose(&self, errors: &ErrorFits) -> ScenarioLoss {
        let t = self.times;
        let expected = ExpectedEvents {
            primary_failures: self.l1 * self.n1 * self.period / BILLION,
            primary_errors: errors.primary * self.n1 * self.period / BILLION,
            secondary_failures: self.l2 * self.n2 * self.period / BILLION,
        };
        let e1 = expected.primary_failures + expected.primary_errors;

        // with no copies, losing a primary loses its data
        let primary = if self.fan_out == 0.0 {
            1.0 - poisson_pn(e1, 0)
        } else {
            let window = t.secondary_window();
            let ue2 = errors.secondary_read * t.flush_share(window);
            prob_at_least(
                e1 * self.fan_out * (self.l2 + ue2),
                window,
                self.scp.saturating_sub(1),
            )
        };

        // Primary unrecoverable errors while catching up are already part of
        // the primary-initiated case.
        let p2_primary = 1.0
            - poisson_p(
                expected.secondary_failures * self.fan_in * self.l1,
                t.primary_window(),
                0,
            );

        let secondary = if self.scp > 1 {
            let window = t.primary_window() + t.secondary_window();
            let ue2 = errors.secondary_read * t.flush_share(window);
            let p2_rest = prob_at_least(
                (self.fan_out - 1.0).max(0.0) * (self.l2 + ue2),
                window,
                self.scp - 2,
            );
            p2_primary * p2_rest
        } else {
            p2_primary
        };

        ScenarioLoss {
            expected,
            primary,
            secondary,
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Loss probabilities, recovery estimates and durability for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurabilityResults {
    /// Modeled period (hours)
    pub period: f64,
    /// Expected initiating events over the period
    pub expected: ExpectedEvents,
    /// Error-equivalent FIT rates
    pub error_fits: ErrorFits,
    /// Loss initiated by a primary failure or error
    pub p_primary: f64,
    /// Loss initiated by a secondary failure
    pub p_secondary: f64,
    /// Loss explained by node failures alone
    pub p_loss_node: f64,
    /// Additional loss caused by unrecoverable errors during recovery
    pub p_loss_nre: f64,
    /// Total probability of loss
    pub p_loss: f64,
    /// Expected dirty bytes lost over the period
    pub expected_loss: f64,
    /// Client write bandwidth (bytes/s)
    pub bw_write: f64,
    /// Client read bandwidth reaching the backing store (bytes/s)
    pub bw_read: f64,
    /// Mirroring bandwidth (bytes/s)
    pub bw_mirror: f64,
    /// Steady-state flush bandwidth (bytes/s)
    pub bw_flush: f64,
    /// Recovery bandwidth after a primary failure (bytes/s)
    pub bw_pfail: f64,
    /// Recovery bandwidth after a secondary failure (bytes/s)
    pub bw_sfail: f64,
    /// Peak recovery bandwidth (bytes/s)
    pub bw_recovery: f64,
    /// Maximum detect/recovery time (seconds)
    pub t_recov: f64,
    /// Probability that dirty data survives the period
    pub durability: f64,
    /// Leading nines of the durability
    pub nines: u32,
}

impl DurabilityResults {
    /// Compute the probability of data loss over `period` hours
    pub fn compute(
        model: &ModelConfig,
        sizes: &ClusterSizes,
        rates: &FailureRates,
        period: f64,
    ) -> Self {
        let fo = sizes.effective_fan_out();
        let scp = model.secondary_copies();
        let times = RecoveryTimes::compute(model);
        let error_fits = ErrorFits::compute(model, rates, fo);

        let scenario = Scenario {
            n1: sizes.n_primary,
            n2: sizes.n_secondary,
            fan_in: sizes.effective_fan_in(),
            fan_out: fo,
            l1: rates.fits_1_loss,
            l2: rates.fits_2_loss,
            scp,
            period,
            times: &times,
        };

        let loss = scenario.compose(&error_fits);
        let node_only = scenario.compose(&ErrorFits::default());

        let p_loss = union_approx(&[loss.primary, loss.secondary]);
        let p_loss_node = union_approx(&[node_only.primary, node_only.secondary]);
        let p_loss_nre = if p_loss_node < 1.0 {
            (1.0 - (1.0 - p_loss) / (1.0 - p_loss_node)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        debug!(
            model = %model.description,
            fits_ber_1 = error_fits.primary,
            fits_uer_2r = error_fits.secondary_read,
            fits_ber_2w = error_fits.secondary_write,
            e1_fail = loss.expected.primary_failures,
            e1_nre = loss.expected.primary_errors,
            e2_fail = loss.expected.secondary_failures,
            p1 = loss.primary,
            p2 = loss.secondary,
            "Composed loss scenarios"
        );

        let t_recov = if scp > 0 {
            hours_to_seconds(times.vulnerable_window())
        } else {
            0.0
        };

        // network traffic of normal I/O
        let load = &model.load;
        let bps = load.block_size * load.iops_per_vm * load.vms_per_primary * sizes.n_primary;
        let bw_write = load.write_fraction * bps;
        let bw_read = (1.0 - load.read_hit) * (1.0 - load.write_fraction) * bps;
        let bw_mirror = bw_write * f64::from(scp);
        let bw_flush = bw_write / model.aggregation_factor();

        let bw_pfail = if fo == 0.0 {
            0.0
        } else {
            times.secondary_bandwidth * fo
        };
        let bw_sfail = times.primary_bandwidth * sizes.effective_fan_in();

        let expected_loss = loss.primary * model.architecture.max_dirty
            + loss.secondary * times.bytes_to_flush;

        let durability = 1.0 - p_loss;

        Self {
            period,
            expected: loss.expected,
            error_fits,
            p_primary: loss.primary,
            p_secondary: loss.secondary,
            p_loss_node,
            p_loss_nre,
            p_loss,
            expected_loss,
            bw_write,
            bw_read,
            bw_mirror,
            bw_flush,
            bw_pfail,
            bw_sfail,
            bw_recovery: bw_pfail.max(bw_sfail),
            t_recov,
            durability,
            nines: count_nines(durability),
        }
    }
}

/// Count leading nines by peeling decimal digits off the durability
///
/// This is a display convention rather than `-log10(1 - d)`: floating-point
/// residue means an exact `0.999` peels to two nines.
pub fn count_nines(durability: f64) -> u32 {
    let mut d = durability.clamp(0.0, 1.0);
    let mut nines = 0;
    while d > 0.9 && nines < MAX_NINES {
        nines += 1;
        d -= 0.9;
        d *= 10.0;
    }
    nines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tier::CacheMedium;
    use crate::units::{MIB, PB, YEAR};

    fn sizes(n1: f64, n2: f64, fan_out: f64, fan_in: f64) -> ClusterSizes {
        ClusterSizes {
            total: PB,
            n_primary: n1,
            n_secondary: n2,
            fan_out,
            fan_in,
            cache_tot: 0.05,
            cache_dirty: 0.003,
        }
    }

    fn rates(model: &ModelConfig, l1: f64, l2: f64) -> FailureRates {
        FailureRates {
            fits_1_loss: l1,
            fits_2_loss: l2,
            ..FailureRates::compute(model, 24.0)
        }
    }

    #[test]
    fn test_recovery_times() {
        let model = ModelConfig::baseline("times").unwrap();
        let times = RecoveryTimes::compute(&model);

        assert_eq!(times.bytes_to_flush, 250.0 * MIB);
        assert_eq!(times.primary_bandwidth, 1.0e9);
        assert!((times.secondary_flush / SECOND - 1.31072).abs() < 1e-9);
        assert!((times.primary_recovery / SECOND - 0.262144).abs() < 1e-9);
        assert!((times.vulnerable_window() / SECOND - 31.31072).abs() < 1e-9);
    }

    #[test]
    fn test_remirror_only_when_faster() {
        let mut perf = crate::model::config::PerformanceConfig::default();
        perf.rate_mirror = 1.0e8;
        let model = ModelConfig::builder("slow-mirror").performance(perf).build().unwrap();
        let times = RecoveryTimes::compute(&model);
        assert_eq!(times.primary_bandwidth, model.performance.rate_flush);
    }

    #[test]
    fn test_error_fits() {
        let model = ModelConfig::baseline("ber").unwrap();
        let r = FailureRates::compute(&model, 24.0);
        let fits = ErrorFits::compute(&model, &r, 2.0);

        assert!((fits.primary - 12_288_000.0 * 1.0e-17 * BER_TO_FIT).abs() < 1e-9);
        assert!((fits.secondary_read - 2.0e8 * 1.0e-17 * BER_TO_FIT).abs() < 1e-9);
        assert_eq!(fits.secondary_write, 0.0);

        let volatile = ModelConfig::builder("dram")
            .media(CacheMedium::Volatile, CacheMedium::Volatile)
            .build()
            .unwrap();
        assert_eq!(ErrorFits::compute(&volatile, &r, 2.0), ErrorFits::default());
    }

    #[test]
    fn test_three_copy_scenario() {
        let model = ModelConfig::baseline("three copies").unwrap();
        let results = DurabilityResults::compute(
            &model,
            &sizes(1000.0, 1000.0, 2.0, 2.0),
            &rates(&model, 6000.0, 6000.0),
            YEAR,
        );

        assert!(results.durability > 0.999 && results.durability < 1.0);
        assert!(results.nines >= 2);
        assert!(results.p_loss > 0.0);
    }

    #[test]
    fn test_no_copies_loses_on_any_failure() {
        let model = ModelConfig::builder("no copies")
            .copies(0)
            .media(CacheMedium::Volatile, CacheMedium::Volatile)
            .build()
            .unwrap();
        let results = DurabilityResults::compute(
            &model,
            &sizes(500.0, 0.0, 0.0, 0.0),
            &rates(&model, 6000.0, 6000.0),
            YEAR,
        );

        let expected = 1.0 - poisson_pn(6000.0 * 500.0 * 8766.0 / 1.0e9, 0);
        assert!((results.p_loss - expected).abs() < 1e-6);
        assert!((results.p_primary - results.p_loss).abs() < 1e-15);
        assert_eq!(results.p_secondary, 0.0);
        assert_eq!(results.bw_pfail, 0.0);
        assert_eq!(results.t_recov, 0.0);
    }

    #[test]
    fn test_attribution_unions_to_total() {
        let model = ModelConfig::builder("noisy nvram").ber_nvm_read(1.0e-14).build().unwrap();
        let results = DurabilityResults::compute(
            &model,
            &sizes(1000.0, 200.0, 2.0, 10.0),
            &rates(&model, 6000.0, 6000.0),
            YEAR,
        );

        assert!(results.p_loss_nre > 0.0);
        let union = union_approx(&[results.p_loss_node, results.p_loss_nre]);
        assert!((union - results.p_loss).abs() < 1e-12);
    }

    #[test]
    fn test_bit_errors_disabled() {
        let mut arch = crate::model::config::ArchitectureConfig::default();
        arch.model_bit_errors = false;
        let model = ModelConfig::builder("no ber").architecture(arch).build().unwrap();
        let results = DurabilityResults::compute(
            &model,
            &sizes(1000.0, 200.0, 2.0, 10.0),
            &rates(&model, 6000.0, 6000.0),
            YEAR,
        );
        assert_eq!(results.error_fits, ErrorFits::default());
        assert_eq!(results.p_loss_nre, 0.0);
        assert_eq!(results.p_loss, results.p_loss_node);
    }

    #[test]
    fn test_bandwidth() {
        let model = ModelConfig::baseline("bw").unwrap();
        let results = DurabilityResults::compute(
            &model,
            &sizes(100.0, 20.0, 2.0, 10.0),
            &rates(&model, 6000.0, 6000.0),
            YEAR,
        );

        let bps = 4096.0 * 500.0 * 12.0 * 100.0;
        assert_eq!(results.bw_write, 0.5 * bps);
        assert!((results.bw_read - 0.95 * 0.5 * bps).abs() < 1e-6);
        assert_eq!(results.bw_mirror, bps);
        assert_eq!(results.bw_flush, 0.5 * bps / 4.0);
        assert_eq!(results.bw_pfail, 2.0 * 2.0e8);
        assert_eq!(results.bw_sfail, 10.0 * 1.0e9);
        assert_eq!(results.bw_recovery, results.bw_sfail);
    }

    #[test]
    fn test_longer_period_never_helps() {
        let model = ModelConfig::baseline("period").unwrap();
        let s = sizes(1000.0, 200.0, 2.0, 10.0);
        let r = rates(&model, 6000.0, 6000.0);

        let mut last = 1.0;
        for years in [0.25, 1.0, 5.0, 25.0] {
            let d = DurabilityResults::compute(&model, &s, &r, years * YEAR).durability;
            assert!(d <= last);
            last = d;
        }
    }

    #[test]
    fn test_recovery_time_reported_in_seconds() {
        let model = ModelConfig::baseline("t_recov").unwrap();
        let results = DurabilityResults::compute(
            &model,
            &sizes(1000.0, 200.0, 2.0, 10.0),
            &rates(&model, 6000.0, 6000.0),
            YEAR,
        );
        // detect 30s + flush 250MiB at 200MB/s outlasts timeout + remirror
        assert!((results.t_recov - 31.31072).abs() < 1e-9);
    }

    #[test]
    fn test_count_nines_peeling() {
        assert_eq!(count_nines(0.5), 0);
        assert_eq!(count_nines(0.95), 1);
        assert_eq!(count_nines(0.9995), 3);
        // floating-point residue drops the last nine of an exact value
        assert_eq!(count_nines(0.99), 1);
        assert!(count_nines(1.0) <= MAX_NINES);
    }
}

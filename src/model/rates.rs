//! Failure and Cache Rates
//!
//! Aggregates component FIT rates into an effective data-loss rate per node
//! role and derives how quickly dirty data moves through a primary cache.

use super::config::{ModelConfig, Redundancy};
use super::tier::NodeRole;
use crate::reliability::redundant_group_fit;
use crate::units::{DAY, MIB, SECOND};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Effective loss rates and cache dynamics for a configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRates {
    /// Bottom-up hardware FIT rate of one node
    pub fits_hardware: f64,
    /// FIT rate at which a primary loses its cached data
    pub fits_1_loss: f64,
    /// FIT rate at which a secondary loses its mirrored data
    pub fits_2_loss: f64,
    /// Fraction of the primary cache that may be dirty
    pub fract_dirty: f64,
    /// Incoming write rate per primary (bytes/s)
    pub writes_in: f64,
    /// Write rate left after aggregation (bytes/s)
    pub new_writes_in: f64,
    /// Seconds between flushes of a full dirty set
    pub interval_flush: f64,
    /// Seconds a block stays in the primary cache
    pub cache_life: f64,
    /// Primary cache drive-writes per day
    pub dwpd: f64,
}

impl FailureRates {
    /// Derive rates with the given component repair time (hours)
    pub fn compute(model: &ModelConfig, repair_hours: f64) -> Self {
        let f = &model.failure_rates;
        let hw = &model.hardware;

        // bottom-up node hardware FITs
        let group = |fits: f64, redundancy: Redundancy| {
            redundant_group_fit(fits, redundancy.total, redundancy.required, repair_hours)
        };
        let power_fits = group(f.power, hw.power);
        let fan_fits = group(f.fan, hw.fans);
        let nic_fits = group(f.nic, hw.nics);
        let fits_hardware = f.controller + power_fits + fan_fits + nic_fits;

        let fits_1_loss = role_loss_fits(model, NodeRole::Primary, fits_hardware);
        let fits_2_loss = role_loss_fits(model, NodeRole::Secondary, fits_hardware);

        // Write aggregation is modeled as a constant, independent of the
        // interval between flushes.
        let pcache = model.primary_cache();
        let load = &model.load;
        let max_dirty = model.architecture.max_dirty;
        let fract_dirty = max_dirty / pcache;
        let writes_in =
            load.block_size * load.iops_per_vm * load.write_fraction * load.vms_per_primary;
        let new_writes_in = writes_in / model.aggregation_factor();
        let (interval_flush, cache_life) = if new_writes_in > 0.0 {
            (max_dirty / new_writes_in, pcache / new_writes_in)
        } else {
            (f64::INFINITY, f64::INFINITY)
        };
        let dwpd = writes_in * (DAY / SECOND) / pcache;

        debug!(
            model = %model.description,
            fits_hardware,
            fits_1_loss,
            fits_2_loss,
            writes_in,
            cache_life,
            "Aggregated failure rates"
        );

        Self {
            fits_hardware,
            fits_1_loss,
            fits_2_loss,
            fract_dirty,
            writes_in,
            new_writes_in,
            interval_flush,
            cache_life,
            dwpd,
        }
    }

    /// Loss FIT rate for a role
    pub fn loss_fits(&self, role: NodeRole) -> f64 {
        match role {
            NodeRole::Primary => self.fits_1_loss,
            NodeRole::Secondary => self.fits_2_loss,
        }
    }
}

/// Loss FIT rate of one role: hardware, hard panics, and for volatile
/// caches every panic plus uncorrectable DRAM errors
///
/// NVRAM media errors are characterized as a bit-error rate rather than a
/// FIT rate, so they are accounted for during recovery instead.
fn role_loss_fits(model: &ModelConfig, role: NodeRole, fits_hardware: f64) -> f64 {
    let f = &model.failure_rates;
    let mut fits = fits_hardware + f.software * f.software_hard;
    if model.hardware.medium(role).is_volatile() {
        fits += f.software;
        fits += model.hardware.cache_size(role) / MIB * f.dram_per_mib * f.dram_double_bit;
    }
    fits
}

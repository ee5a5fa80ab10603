//! Cluster Sizing
//!
//! Derives the cluster shape needed to cache the active working set of a
//! backing store: how many primaries and secondaries there are and how
//! mirror traffic fans out between them.

use super::config::ModelConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cluster shape derived from a configuration and a backing-store capacity
///
/// Node counts are kept fractional: they express the population needed
/// per unit of capacity rather than a rounded deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSizes {
    /// Backing-store capacity (bytes)
    pub total: f64,
    /// Primary nodes
    pub n_primary: f64,
    /// Secondary nodes
    pub n_secondary: f64,
    /// Secondaries touched by one primary's recovery
    pub fan_out: f64,
    /// Primaries served by one secondary
    pub fan_in: f64,
    /// Fraction of an active VM's volumes held in primary cache
    pub cache_tot: f64,
    /// Fraction of an active VM's volumes that can be dirty
    pub cache_dirty: f64,
}

impl ClusterSizes {
    /// Size a cluster for `capacity` bytes of backing store
    pub fn compute(model: &ModelConfig, capacity: f64) -> Self {
        let util = &model.utilization;
        let load = &model.load;
        let arch = &model.architecture;

        // active volumes, and the VMs that use them
        let used = capacity * util.fill_fraction * util.dedup_ratio;
        let volumes = used / util.volume_size;
        let active = volumes * util.active_fraction;
        let vms = active / load.volumes_per_vm;
        let n_primary = vms / load.vms_per_primary;

        // Each secondary holds a perfect mirror of (1/decluster of) a
        // primary's cache, not just its dirty pages.
        let pcache = model.primary_cache();
        let n_secondary = if arch.symmetric {
            if arch.copies > 1 {
                n_primary
            } else {
                0.0
            }
        } else if arch.copies > 1 {
            n_primary * pcache * f64::from(model.secondary_copies())
                / model.hardware.cache_secondary
        } else {
            0.0
        };

        let per_vm = load.volumes_per_vm * util.volume_size;
        let cache_tot = pcache / per_vm;
        let cache_dirty = arch.max_dirty / per_vm;

        let (fan_out, fan_in) = if arch.copies < 2 {
            (0.0, 0.0)
        } else {
            let fan_out = f64::from(
                arch.fan_out_policy
                    .fan_out(arch.decluster, model.secondary_copies()),
            );
            let fan_in = if n_secondary > 0.0 {
                fan_out * n_primary / n_secondary
            } else {
                0.0
            };
            (fan_out, fan_in)
        };

        debug!(
            model = %model.description,
            capacity,
            n_primary,
            n_secondary,
            fan_out,
            fan_in,
            "Sized cluster"
        );

        Self {
            total: capacity,
            n_primary,
            n_secondary,
            fan_out,
            fan_in,
            cache_tot,
            cache_dirty,
        }
    }

    /// Primaries a failed secondary can take down, bounded by the population
    pub fn effective_fan_in(&self) -> f64 {
        self.n_primary.min(self.fan_in)
    }

    /// Secondaries a failed primary depends on, bounded by the population
    pub fn effective_fan_out(&self) -> f64 {
        self.n_secondary.min(self.fan_out)
    }
}

//! Model Configuration
//!
//! The immutable input record for a single durability evaluation. A
//! [`ModelConfig`] can only be obtained from [`ModelConfigBuilder::build`],
//! which validates every parameter, so the derivation stages never see a
//! partially initialised or out-of-range configuration.

use super::tier::{CacheMedium, NodeRole};
use crate::error::{Error, Result};
use crate::reliability::fit_rate_per_year;
use crate::units::{GB, GIB, HOUR, MB, MIB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

// =============================================================================
// Redundancy
// =============================================================================

/// A group of identical components of which `required` must keep working
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redundancy {
    /// Components installed per node
    pub total: u32,
    /// Components needed for continued operation
    pub required: u32,
}

impl Redundancy {
    pub const fn new(total: u32, required: u32) -> Self {
        Self { total, required }
    }
}

impl Default for Redundancy {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

// =============================================================================
// Fan-out Policy
// =============================================================================

/// How the declustering factor and the copy count combine into fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanOutPolicy {
    /// `max(decluster, copies - 1)`: declustering spreads every copy further
    #[default]
    Max,
    /// `min(decluster, copies - 1)`: fan-out never exceeds the copy count
    Min,
}

impl FanOutPolicy {
    /// Apply the policy to a declustering factor and secondary copy count
    pub fn fan_out(&self, decluster: u32, secondary_copies: u32) -> u32 {
        match self {
            FanOutPolicy::Max => decluster.max(secondary_copies),
            FanOutPolicy::Min => decluster.min(secondary_copies),
        }
    }
}

// =============================================================================
// Configuration Sections
// =============================================================================

/// Node hardware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareConfig {
    /// Cache size per primary node (bytes)
    pub cache_primary: f64,
    /// Mirror cache size per dedicated secondary node (bytes)
    pub cache_secondary: f64,
    /// Primary cache medium
    pub medium_primary: CacheMedium,
    /// Secondary cache medium
    pub medium_secondary: CacheMedium,
    /// Power supplies per node
    pub power: Redundancy,
    /// Fans per node
    pub fans: Redundancy,
    /// NICs per node
    pub nics: Redundancy,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            cache_primary: 4.0 * GIB,
            cache_secondary: 40.0 * GIB,
            medium_primary: CacheMedium::NonVolatile,
            medium_secondary: CacheMedium::NonVolatile,
            power: Redundancy::new(2, 1),
            fans: Redundancy::new(2, 1),
            nics: Redundancy::new(2, 1),
        }
    }
}

impl HardwareConfig {
    /// Cache medium for a role
    pub fn medium(&self, role: NodeRole) -> CacheMedium {
        match role {
            NodeRole::Primary => self.medium_primary,
            NodeRole::Secondary => self.medium_secondary,
        }
    }

    /// Configured cache size for a role
    pub fn cache_size(&self, role: NodeRole) -> f64 {
        match role {
            NodeRole::Primary => self.cache_primary,
            NodeRole::Secondary => self.cache_secondary,
        }
    }
}

/// Architectural choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchitectureConfig {
    /// Copies of dirty data, primary included
    pub copies: u32,
    /// Secondaries a primary's mirror traffic is spread across
    pub decluster: u32,
    /// Every node is both a primary and a secondary
    pub symmetric: bool,
    /// Re-establish a mirror instead of flushing when that is faster
    pub remirror: bool,
    /// Maximum dirty data held by a primary (bytes)
    pub max_dirty: f64,
    /// Fan-out apportionment
    pub fan_out_policy: FanOutPolicy,
    /// Model NVRAM bit errors as an additional loss source
    pub model_bit_errors: bool,
    /// Apply the write-aggregation factor to flush traffic
    pub write_aggregation: bool,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            copies: 3,
            decluster: 1,
            symmetric: false,
            remirror: true,
            max_dirty: 250.0 * MIB,
            fan_out_policy: FanOutPolicy::Max,
            model_bit_errors: true,
            write_aggregation: true,
        }
    }
}

/// Performance and recovery timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerformanceConfig {
    /// Flush rate to the backing store (bytes/s)
    pub rate_flush: f64,
    /// Remirroring rate (bytes/s)
    pub rate_mirror: f64,
    /// Time to detect a failure and start recovery (seconds)
    pub time_detect: f64,
    /// Transport retransmit timeout (seconds)
    pub time_timeout: f64,
    /// Component repair time (hours)
    pub time_repair: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            rate_flush: 200.0 * MB,
            rate_mirror: 1.0 * GB,
            time_detect: 30.0,
            time_timeout: 5.0,
            time_repair: 24.0 * HOUR,
        }
    }
}

/// Backing-store utilization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UtilizationConfig {
    /// Fraction of the backing store in use
    pub fill_fraction: f64,
    /// Logical-to-physical deduplication ratio
    pub dedup_ratio: f64,
    /// Fraction of provisioned volumes that are active
    pub active_fraction: f64,
    /// Average volume size (bytes)
    pub volume_size: f64,
}

impl Default for UtilizationConfig {
    fn default() -> Self {
        Self {
            fill_fraction: 0.75,
            dedup_ratio: 3.0,
            active_fraction: 0.05,
            volume_size: 50.0 * GIB,
        }
    }
}

/// Client I/O load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// I/O block size (bytes)
    pub block_size: f64,
    /// VMs served by one primary
    pub vms_per_primary: f64,
    /// Volumes per VM
    pub volumes_per_vm: f64,
    /// Average IOPS per VM
    pub iops_per_vm: f64,
    /// Fraction of operations that are writes
    pub write_fraction: f64,
    /// Reduction in flushed bytes from write aggregation
    pub write_aggregation: f64,
    /// Read hit rate in the write-back cache
    pub read_hit: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            block_size: 4096.0,
            vms_per_primary: 12.0,
            volumes_per_vm: 1.5,
            iops_per_vm: 500.0,
            write_fraction: 0.5,
            write_aggregation: 4.0,
            read_hit: 0.05,
        }
    }
}

/// Base failure rates (FIT unless noted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailureRateConfig {
    /// Controller board
    pub controller: f64,
    /// DRAM, per MiB
    pub dram_per_mib: f64,
    /// Per NIC
    pub nic: f64,
    /// Per fan
    pub fan: f64,
    /// Per power supply
    pub power: f64,
    /// NVRAM read bit-error rate (per bit)
    pub ber_nvm_read: f64,
    /// NVRAM write bit-error rate (per bit)
    pub ber_nvm_write: f64,
    /// Software panics
    pub software: f64,
    /// Fraction of DRAM errors that are uncorrectable
    pub dram_double_bit: f64,
    /// Fraction of panics that take the node down without a reboot
    pub software_hard: f64,
}

impl Default for FailureRateConfig {
    fn default() -> Self {
        Self {
            controller: 4000.0,
            dram_per_mib: 6.0,
            nic: 200.0,
            fan: 518.0,
            power: 1642.0,
            ber_nvm_read: 1.0e-17,
            ber_nvm_write: 0.0,
            software: fit_rate_per_year(1.0),
            dram_double_bit: 0.01,
            software_hard: 0.01,
        }
    }
}

// =============================================================================
// Model Configuration
// =============================================================================

/// A validated, immutable model configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct ModelConfig {
    /// Name of the modeled configuration
    pub description: String,
    pub hardware: HardwareConfig,
    pub architecture: ArchitectureConfig,
    pub performance: PerformanceConfig,
    pub utilization: UtilizationConfig,
    pub load: LoadConfig,
    pub failure_rates: FailureRateConfig,
}

impl ModelConfig {
    /// Start building a configuration with reference defaults
    pub fn builder(description: impl Into<String>) -> ModelConfigBuilder {
        ModelConfigBuilder::new(description)
    }

    /// Reference configuration with all defaults
    pub fn baseline(description: impl Into<String>) -> Result<Self> {
        Self::builder(description).build()
    }

    /// Turn this configuration back into a builder for a what-if variant
    pub fn to_builder(&self) -> ModelConfigBuilder {
        ModelConfigBuilder {
            description: self.description.clone(),
            hardware: self.hardware.clone(),
            architecture: self.architecture.clone(),
            performance: self.performance.clone(),
            utilization: self.utilization.clone(),
            load: self.load.clone(),
            failure_rates: self.failure_rates.clone(),
        }
    }

    /// Number of secondary copies (copies beyond the primary)
    pub fn secondary_copies(&self) -> u32 {
        self.architecture.copies.saturating_sub(1)
    }

    /// Cache each primary devotes to its own dirty data
    ///
    /// A symmetric node splits its cache between its own data and the
    /// copies it holds for its peers.
    pub fn primary_cache(&self) -> f64 {
        if self.architecture.symmetric {
            self.hardware.cache_primary / f64::from(self.architecture.copies.max(1))
        } else {
            self.hardware.cache_primary
        }
    }

    /// Effective write-aggregation factor
    pub fn aggregation_factor(&self) -> f64 {
        if self.architecture.write_aggregation {
            self.load.write_aggregation
        } else {
            1.0
        }
    }

    /// Validate every parameter
    pub fn validate(&self) -> Result<()> {
        let name = self.description.as_str();
        if name.trim().is_empty() {
            return Err(Error::Configuration(
                "model description must not be empty".to_string(),
            ));
        }

        let hw = &self.hardware;
        let arch = &self.architecture;
        let perf = &self.performance;
        let util = &self.utilization;
        let load = &self.load;
        let rates = &self.failure_rates;

        let non_negative = [
            ("cache_secondary", hw.cache_secondary),
            ("max_dirty", arch.max_dirty),
            ("rate_mirror", perf.rate_mirror),
            ("time_detect", perf.time_detect),
            ("time_timeout", perf.time_timeout),
            ("time_repair", perf.time_repair),
            ("block_size", load.block_size),
            ("iops_per_vm", load.iops_per_vm),
            ("controller", rates.controller),
            ("dram_per_mib", rates.dram_per_mib),
            ("nic", rates.nic),
            ("fan", rates.fan),
            ("power", rates.power),
            ("software", rates.software),
        ];
        for (parameter, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                let reason = format!("must be a non-negative number, got {}", value);
                return Err(Error::invalid(name, parameter, reason));
            }
        }

        let positive = [
            ("cache_primary", hw.cache_primary),
            ("rate_flush", perf.rate_flush),
            ("dedup_ratio", util.dedup_ratio),
            ("volume_size", util.volume_size),
            ("vms_per_primary", load.vms_per_primary),
            ("volumes_per_vm", load.volumes_per_vm),
            ("write_aggregation", load.write_aggregation),
        ];
        for (parameter, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                let reason = format!("must be positive, got {}", value);
                return Err(Error::invalid(name, parameter, reason));
            }
        }

        let fractions = [
            ("fill_fraction", util.fill_fraction),
            ("active_fraction", util.active_fraction),
            ("write_fraction", load.write_fraction),
            ("read_hit", load.read_hit),
            ("ber_nvm_read", rates.ber_nvm_read),
            ("ber_nvm_write", rates.ber_nvm_write),
            ("dram_double_bit", rates.dram_double_bit),
            ("software_hard", rates.software_hard),
        ];
        for (parameter, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                let reason = format!("must be within [0, 1], got {}", value);
                return Err(Error::invalid(name, parameter, reason));
            }
        }

        if arch.decluster == 0 {
            return Err(Error::invalid(name, "decluster", "must be at least 1"));
        }

        if !arch.symmetric && arch.copies > 1 && hw.cache_secondary <= 0.0 {
            return Err(Error::invalid(
                name,
                "cache_secondary",
                "dedicated secondaries need a mirror cache when copies > 1",
            ));
        }

        for (group, redundancy) in [("power", hw.power), ("fans", hw.fans), ("nics", hw.nics)] {
            if redundancy.total == 0 || redundancy.required > redundancy.total {
                return Err(Error::RedundancyGroup {
                    model: name.to_string(),
                    group: group.to_string(),
                    required: redundancy.required,
                    total: redundancy.total,
                });
            }
        }

        Ok(())
    }

    /// Load one or more configurations from a YAML or JSON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<ModelConfig>> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let contents = std::fs::read_to_string(path)?;

        let parsed: ModelFile = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            Some("json") => serde_json::from_str(&contents)?,
            _ => return Err(Error::UnsupportedFormat { path: shown }),
        };

        let builders = match parsed {
            ModelFile::Many(builders) => builders,
            ModelFile::One(builder) => vec![builder],
        };
        if builders.is_empty() {
            return Err(Error::EmptyModelFile { path: shown });
        }

        debug!(path = %shown, models = builders.len(), "Loaded model file");
        builders.into_iter().map(ModelConfigBuilder::build).collect()
    }
}

/// Contents of a model file
#[derive(Deserialize)]
#[serde(untagged)]
enum ModelFile {
    Many(Vec<ModelConfigBuilder>),
    One(ModelConfigBuilder),
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`ModelConfig`]
///
/// Every section starts from the reference defaults; only the description
/// is mandatory when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfigBuilder {
    pub description: String,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub architecture: ArchitectureConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub utilization: UtilizationConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub failure_rates: FailureRateConfig,
}

impl ModelConfigBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            hardware: HardwareConfig::default(),
            architecture: ArchitectureConfig::default(),
            performance: PerformanceConfig::default(),
            utilization: UtilizationConfig::default(),
            load: LoadConfig::default(),
            failure_rates: FailureRateConfig::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn hardware(mut self, hardware: HardwareConfig) -> Self {
        self.hardware = hardware;
        self
    }

    pub fn architecture(mut self, architecture: ArchitectureConfig) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn performance(mut self, performance: PerformanceConfig) -> Self {
        self.performance = performance;
        self
    }

    pub fn utilization(mut self, utilization: UtilizationConfig) -> Self {
        self.utilization = utilization;
        self
    }

    pub fn load(mut self, load: LoadConfig) -> Self {
        self.load = load;
        self
    }

    pub fn failure_rates(mut self, failure_rates: FailureRateConfig) -> Self {
        self.failure_rates = failure_rates;
        self
    }

    pub fn copies(mut self, copies: u32) -> Self {
        self.architecture.copies = copies;
        self
    }

    pub fn decluster(mut self, decluster: u32) -> Self {
        self.architecture.decluster = decluster;
        self
    }

    pub fn symmetric(mut self, symmetric: bool) -> Self {
        self.architecture.symmetric = symmetric;
        self
    }

    pub fn media(mut self, primary: CacheMedium, secondary: CacheMedium) -> Self {
        self.hardware.medium_primary = primary;
        self.hardware.medium_secondary = secondary;
        self
    }

    pub fn cache_sizes(mut self, primary: f64, secondary: f64) -> Self {
        self.hardware.cache_primary = primary;
        self.hardware.cache_secondary = secondary;
        self
    }

    pub fn rate_flush(mut self, rate: f64) -> Self {
        self.performance.rate_flush = rate;
        self
    }

    pub fn ber_nvm_read(mut self, ber: f64) -> Self {
        self.failure_rates.ber_nvm_read = ber;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<ModelConfig> {
        let config = ModelConfig {
            description: self.description,
            hardware: self.hardware,
            architecture: self.architecture,
            performance: self.performance,
            utilization: self.utilization,
            load: self.load,
            failure_rates: self.failure_rates,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_baseline_is_valid() {
        let config = ModelConfig::baseline("baseline").unwrap();
        assert_eq!(config.architecture.copies, 3);
        assert_eq!(config.secondary_copies(), 2);
        assert_eq!(config.primary_cache(), 4.0 * GIB);
        assert_eq!(config.aggregation_factor(), 4.0);
    }

    #[test]
    fn test_symmetric_primary_cache_share() {
        let config = ModelConfig::builder("sym").symmetric(true).build().unwrap();
        assert!((config.primary_cache() - 4.0 * GIB / 3.0).abs() < 1.0);

        let none = ModelConfig::builder("sym-0")
            .symmetric(true)
            .copies(0)
            .build()
            .unwrap();
        assert_eq!(none.primary_cache(), 4.0 * GIB);
    }

    #[test]
    fn test_fan_out_policy() {
        assert_eq!(FanOutPolicy::Max.fan_out(4, 2), 4);
        assert_eq!(FanOutPolicy::Min.fan_out(4, 2), 2);
    }

    #[test]
    fn test_rejects_empty_description() {
        let err = ModelConfig::builder("  ").build().unwrap_err();
        assert_matches!(err, Error::Configuration(_));
    }

    #[test]
    fn test_rejects_negative_rate() {
        let mut rates = FailureRateConfig::default();
        rates.controller = -1.0;
        let err = ModelConfig::builder("neg").failure_rates(rates).build().unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { ref parameter, .. } if parameter == "controller"
        );
    }

    #[test]
    fn test_rejects_zero_flush_rate() {
        let err = ModelConfig::builder("slow").rate_flush(0.0).build().unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { ref parameter, .. } if parameter == "rate_flush"
        );
    }

    #[test]
    fn test_rejects_fraction_out_of_range() {
        let mut load = LoadConfig::default();
        load.write_fraction = 1.5;
        let err = ModelConfig::builder("load").load(load).build().unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { ref parameter, .. } if parameter == "write_fraction"
        );
    }

    #[test]
    fn test_rejects_impossible_redundancy() {
        let mut hardware = HardwareConfig::default();
        hardware.fans = Redundancy::new(2, 3);
        let err = ModelConfig::builder("fans").hardware(hardware).build().unwrap_err();
        assert_matches!(err, Error::RedundancyGroup { required: 3, total: 2, .. });
    }

    #[test]
    fn test_rejects_missing_secondary_cache() {
        let err = ModelConfig::builder("asym")
            .cache_sizes(4.0 * GIB, 0.0)
            .build()
            .unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { ref parameter, .. } if parameter == "cache_secondary"
        );

        // Without copies there is nothing to mirror
        assert!(ModelConfig::builder("asym")
            .cache_sizes(4.0 * GIB, 0.0)
            .copies(1)
            .build()
            .is_ok());
    }

    #[test]
    fn test_rejects_zero_decluster() {
        let err = ModelConfig::builder("dc").decluster(0).build().unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { ref parameter, .. } if parameter == "decluster"
        );
    }

    #[test]
    fn test_to_builder_round_trip() {
        let config = ModelConfig::builder("variant").copies(2).build().unwrap();
        let again = config.to_builder().build().unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_load_yaml_list() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            concat!(
                "- description: volatile primary\n",
                "  architecture:\n",
                "    copies: 2\n",
                "  hardware:\n",
                "    medium_primary: volatile\n",
                "- description: defaults",
            )
        )
        .unwrap();

        let models = ModelConfig::load_file(file.path()).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].architecture.copies, 2);
        assert!(models[0].hardware.medium_primary.is_volatile());
        assert_eq!(models[0].architecture.decluster, 1);
        assert_eq!(models[1], ModelConfig::baseline("defaults").unwrap());
    }

    #[test]
    fn test_load_json_single() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"description": "json", "performance": {{"rate_flush": 4.0e8}}}}"#
        )
        .unwrap();

        let models = ModelConfig::load_file(file.path()).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].performance.rate_flush, 4.0e8);
    }

    #[test]
    fn test_load_emits_debug_event() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "description: traced").unwrap();

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let models = tracing::subscriber::with_default(subscriber, || {
            ModelConfig::load_file(file.path())
        })
        .unwrap();
        assert_eq!(models[0].description, "traced");
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = ModelConfig::load_file(file.path()).unwrap_err();
        assert_matches!(err, Error::UnsupportedFormat { .. });
    }

    #[test]
    fn test_load_validates_models() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "description: bad\narchitecture:\n  decluster: 0").unwrap();
        let err = ModelConfig::load_file(file.path()).unwrap_err();
        assert!(err.is_config_error());
    }
}

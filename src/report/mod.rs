//! Durability Reports
//!
//! Renders evaluations as a column-aligned console table, optionally with
//! the parameters of each model and a legend for every column.

pub mod columns;

pub use columns::{
    format_durability, format_float, format_probability, format_size, format_time, ColumnFormat,
};

use crate::error::{Error, Result};
use crate::model::{CacheMedium, ClusterSizes, Evaluation, FailureRates, ModelConfig, NodeRole};
use crate::units::{GIB, MB, MIB};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HEADINGS: [&str; 7] = [
    "configuration",
    "<p,s>/PiB",
    "durability",
    "PL(node)",
    "PL(NRE)",
    "BW(recov)",
    "T(recov)",
];

/// Legends ending in `*` are qualified by the modeled period
const LEGENDS: [&str; 7] = [
    "configuration being modeled",
    "<primaries, secondaries> per petabyte",
    "probability of object survival*",
    "probability of loss due to node failures*",
    "probability of loss due to NREs during recovery*",
    "peak recovery bandwidth",
    "max detect/recovery time",
];

// =============================================================================
// Verbosity
// =============================================================================

/// How much of a run to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Shared parameters, legends, headings and results
    #[default]
    Default,
    /// Parameters of every model, headings and results
    Parameters,
    /// Headings and results
    Headings,
    /// Results only
    Data,
    /// Everything, including the diagnostic trace
    All,
    /// Diagnostic trace and results
    Debug,
}

/// Sections of a report enabled by a verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub shared_parameters: bool,
    pub legends: bool,
    pub headings: bool,
    pub model_parameters: bool,
    pub trace: bool,
}

impl Verbosity {
    pub fn sections(&self) -> Sections {
        match self {
            Verbosity::Default => Sections {
                shared_parameters: true,
                legends: true,
                headings: true,
                model_parameters: false,
                trace: false,
            },
            Verbosity::Parameters => Sections {
                shared_parameters: false,
                legends: false,
                headings: true,
                model_parameters: true,
                trace: false,
            },
            Verbosity::Headings => Sections {
                shared_parameters: false,
                legends: false,
                headings: true,
                model_parameters: false,
                trace: false,
            },
            Verbosity::Data => Sections {
                shared_parameters: false,
                legends: false,
                headings: false,
                model_parameters: false,
                trace: false,
            },
            Verbosity::All => Sections {
                shared_parameters: false,
                legends: true,
                headings: true,
                model_parameters: true,
                trace: true,
            },
            Verbosity::Debug => Sections {
                shared_parameters: false,
                legends: false,
                headings: false,
                model_parameters: false,
                trace: true,
            },
        }
    }

    /// Check if the engine's diagnostic trace should be shown
    pub fn wants_trace(&self) -> bool {
        self.sections().trace
    }
}

impl FromStr for Verbosity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Verbosity::Default),
            "parameters" => Ok(Verbosity::Parameters),
            "headings" => Ok(Verbosity::Headings),
            "data" => Ok(Verbosity::Data),
            "all" => Ok(Verbosity::All),
            "debug" => Ok(Verbosity::Debug),
            other => Err(Error::Configuration(format!("unknown verbosity: {}", other))),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Render a run of evaluations over `period` hours
pub fn render(evaluations: &[Evaluation], period: f64, verbosity: Verbosity) -> String {
    let sections = verbosity.sections();
    let max_desc = evaluations
        .iter()
        .map(|e| e.config.description.len())
        .max()
        .unwrap_or(0);
    let format = ColumnFormat::new(&HEADINGS, max_desc);
    let mut out = String::new();

    if sections.shared_parameters {
        if let Some(first) = evaluations.first() {
            out.push_str(&parameters(&first.config, None, None));
        }
    }

    if sections.legends {
        out.push_str("\nColumn legends:\n");
        let per = format_time(period);
        for (i, legend) in LEGENDS.iter().enumerate() {
            let line = match legend.strip_suffix('*') {
                Some(text) => format!("\t{} {} (per {})\n", i + 1, text, per),
                None => format!("\t{} {}\n", i + 1, legend),
            };
            out.push_str(&line);
        }
    }

    if sections.headings {
        out.push('\n');
        out.push_str(&format.headings());
        out.push('\n');
    }

    for evaluation in evaluations {
        if sections.model_parameters {
            out.push_str(&parameters(
                &evaluation.config,
                Some(&evaluation.sizes),
                Some(&evaluation.rates),
            ));
        }
        out.push_str(&row(&format, evaluation));
        out.push('\n');
    }

    out
}

/// One result row
pub fn row(format: &ColumnFormat, evaluation: &Evaluation) -> String {
    let config = &evaluation.config;
    let sizes = &evaluation.sizes;
    let results = &evaluation.results;

    let nodes = if config.architecture.symmetric {
        format!("<{}>", sizes.n_primary as u64)
    } else {
        format!("<{},{}>", sizes.n_primary as u64, sizes.n_secondary as u64)
    };
    let cells = [
        config.description.clone(),
        nodes,
        format_durability(results.durability),
        format_probability(results.p_loss_node),
        format_probability(results.p_loss_nre),
        format!("{}/s", format_size(results.bw_recovery, 1000)),
        format!("{}s", format_float(results.t_recov)),
    ];
    let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
    format.line(&cells)
}

/// Parameter dump for a model and, when available, what was derived from it
pub fn parameters(
    model: &ModelConfig,
    sizes: Option<&ClusterSizes>,
    rates: Option<&FailureRates>,
) -> String {
    ParameterDump {
        model,
        sizes,
        rates,
    }
    .to_string()
}

struct ParameterDump<'a> {
    model: &'a ModelConfig,
    sizes: Option<&'a ClusterSizes>,
    rates: Option<&'a FailureRates>,
}

impl ParameterDump<'_> {
    fn describe(&self, medium: CacheMedium) -> String {
        let f = &self.model.failure_rates;
        if medium.is_volatile() {
            format!(
                "DRAM, {} FITs/MiB ({} uncorrectable)",
                f.dram_per_mib, f.dram_double_bit
            )
        } else {
            format!(
                "NVRAM, R-BER={:e}, W-BER={:e}",
                f.ber_nvm_read, f.ber_nvm_write
            )
        }
    }
}

impl fmt::Display for ParameterDump<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model;
        let hw = &model.hardware;
        let arch = &model.architecture;
        let perf = &model.performance;
        let util = &model.utilization;
        let load = &model.load;
        let f = &model.failure_rates;

        writeln!(out, "\nParameters:")?;
        writeln!(
            out,
            "\tprimary:  \t{}MiB {}",
            (hw.cache_primary / MIB) as u64,
            self.describe(hw.medium_primary)
        )?;
        if !arch.symmetric {
            writeln!(
                out,
                "\tsecondary:\t{}MiB {}",
                (hw.cache_secondary / MIB) as u64,
                self.describe(hw.medium_secondary)
            )?;
        }
        writeln!(
            out,
            "\tcapacity:  \tused={}%, active={}%",
            (util.fill_fraction * 100.0) as u64,
            (util.active_fraction * 100.0) as u64
        )?;
        writeln!(
            out,
            "\tvolumes:   \tsize={}GiB, {:3.1}/VM, {}/primary",
            (util.volume_size / GIB) as u64,
            load.volumes_per_vm,
            (load.volumes_per_vm * load.vms_per_primary) as u64
        )?;
        writeln!(
            out,
            "\tI/O load:  \t{}({}K)IOPS/VM, {}% writes / {} (aggregation)",
            load.iops_per_vm as u64,
            (load.block_size / 1024.0) as u64,
            (load.write_fraction * 100.0) as u64,
            model.aggregation_factor()
        )?;
        writeln!(
            out,
            "\tdetection: \tnodefail={}s, timeout={}s",
            perf.time_detect, perf.time_timeout
        )?;
        write!(
            out,
            "\trecovery:  \tmax_dirty={}MiB, flush={}MB/s",
            (arch.max_dirty / MIB) as u64,
            (perf.rate_flush / MB) as u64
        )?;
        if arch.remirror {
            write!(out, ", remirror={}MB/s", (perf.rate_mirror / MB) as u64)?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "\tsoftware:  \tFITs={}, hard={:6.3}%",
            f.software as u64,
            100.0 * f.software_hard
        )?;

        if let Some(sizes) = self.sizes {
            writeln!(out, "\tcopies:    \t{}, decluster={}", arch.copies, arch.decluster)?;
            if arch.symmetric {
                writeln!(
                    out,
                    "\tcluster:   \tn={}, fan-out={}, fan-in={}",
                    sizes.n_primary as u64,
                    sizes.fan_out,
                    format_float(sizes.fan_in)
                )?;
            } else {
                writeln!(
                    out,
                    "\tcluster:   \tnP={}, nS={}, fan-out={}, fan-in={}",
                    sizes.n_primary as u64,
                    sizes.n_secondary as u64,
                    sizes.fan_out,
                    format_float(sizes.fan_in)
                )?;
            }
            writeln!(
                out,
                "\tcache/vol: \ttotal={:.6}, dirty={:.6}",
                sizes.cache_tot, sizes.cache_dirty
            )?;
        }

        if let Some(rates) = self.rates {
            writeln!(
                out,
                "\tcache/prim:\tdirty={:.6}, lifetime={:.1}s",
                rates.fract_dirty, rates.cache_life
            )?;
            if arch.symmetric {
                writeln!(out, "\tloss:      \tFITs={}", rates.fits_1_loss as u64)?;
            } else {
                for (i, &role) in NodeRole::all().iter().enumerate() {
                    let label = format!("loss({}):", i + 1);
                    writeln!(out, "\t{:<11}\tFITs={}", label, rates.loss_fits(role) as u64)?;
                }
            }
        }

        Ok(())
    }
}

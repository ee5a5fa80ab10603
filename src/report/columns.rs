//! Column Formatting
//!
//! Fixed-width table layout and the value formatters used in report rows.

use crate::model::count_nines;
use crate::units::{DAY, HOUR, MINUTE, SECOND, YEAR};

/// Width of every column after the description
const COLUMN_WIDTH: usize = 14;

/// Column-aligned table writer
#[derive(Debug, Clone)]
pub struct ColumnFormat {
    headings: Vec<String>,
    desc_width: usize,
}

impl ColumnFormat {
    /// Lay out columns for `headings`, the first holding descriptions up to
    /// `max_desc` characters
    pub fn new(headings: &[&str], max_desc: usize) -> Self {
        let first = headings.first().map(|h| h.len()).unwrap_or(0);
        Self {
            headings: headings.iter().map(|h| h.to_string()).collect(),
            desc_width: max_desc.max(first),
        }
    }

    /// Heading line followed by an underline
    pub fn headings(&self) -> String {
        let names: Vec<&str> = self.headings.iter().map(String::as_str).collect();
        let underline: Vec<String> = self.headings.iter().map(|h| "-".repeat(h.len())).collect();
        let underline: Vec<&str> = underline.iter().map(String::as_str).collect();
        format!("{}\n{}", self.line(&names), self.line(&underline))
    }

    /// One row; missing cells are left blank
    pub fn line(&self, cells: &[&str]) -> String {
        let mut out = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i == 0 {
                out.push_str(&format!("{:<width$}", cell, width = self.desc_width));
            } else {
                out.push_str(&format!(" {:>width$}", cell, width = COLUMN_WIDTH));
            }
        }
        out.trim_end().to_string()
    }
}

/// A period of time (hours) in its largest whole unit
pub fn format_time(hours: f64) -> String {
    let units = [
        (YEAR, "year"),
        (DAY, "day"),
        (HOUR, "hour"),
        (MINUTE, "minute"),
    ];
    let (unit, name) = units
        .iter()
        .copied()
        .find(|(unit, _)| hours >= *unit)
        .unwrap_or((SECOND, "second"));

    let value = hours / unit;
    let plural = if value == 1.0 { "" } else { "s" };
    if value.fract() == 0.0 {
        format!("{} {}{}", value, name, plural)
    } else {
        format!("{:.1} {}{}", value, name, plural)
    }
}

/// Durability as a percentage, precise enough to show every leading nine
pub fn format_durability(durability: f64) -> String {
    let decimals = (count_nines(durability).saturating_sub(2) + 1).min(12) as usize;
    format!("{:.*}%", decimals, durability * 100.0)
}

/// A probability in scientific notation
pub fn format_probability(p: f64) -> String {
    if p == 0.0 {
        "0".to_string()
    } else {
        format!("{:.1e}", p)
    }
}

/// A byte count scaled to decimal (`base` 1000) or binary (1024) units
pub fn format_size(bytes: f64, base: u32) -> String {
    let suffixes: [&str; 6] = if base == 1024 {
        ["B", "KiB", "MiB", "GiB", "TiB", "PiB"]
    } else {
        ["B", "KB", "MB", "GB", "TB", "PB"]
    };
    let base = f64::from(base);

    let mut value = bytes;
    let mut index = 0;
    while value >= base && index < suffixes.len() - 1 {
        value /= base;
        index += 1;
    }

    if value >= 10.0 || value.fract() == 0.0 {
        format!("{:.0}{}", value, suffixes[index])
    } else {
        format!("{:.1}{}", value, suffixes[index])
    }
}

/// A plain number with precision appropriate to its magnitude
pub fn format_float(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

//! Cache Tier Definitions
//!
//! Node roles in a mirrored write-back cache cluster and the media their
//! caches are built from.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Node Role
// =============================================================================

/// Role a node plays for a given piece of dirty data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Owns the write-back cache the client writes into
    Primary,
    /// Holds a mirror of (a declustered share of) a primary's dirty data
    Secondary,
}

impl NodeRole {
    /// Get both roles in evaluation order
    pub fn all() -> &'static [NodeRole] {
        &[NodeRole::Primary, NodeRole::Secondary]
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Primary => write!(f, "primary"),
            NodeRole::Secondary => write!(f, "secondary"),
        }
    }
}

// =============================================================================
// Cache Medium
// =============================================================================

/// Memory technology backing a node's cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMedium {
    /// DRAM: contents are lost on reboot and exposed to double-bit errors
    Volatile,
    /// NVRAM: survives reboots, exposed to media bit errors instead
    #[default]
    NonVolatile,
}

impl CacheMedium {
    /// Check if a reboot destroys the cache contents
    pub fn is_volatile(&self) -> bool {
        matches!(self, CacheMedium::Volatile)
    }

    /// Short label used in configuration captions
    pub fn short_label(&self) -> &'static str {
        match self {
            CacheMedium::Volatile => "v",
            CacheMedium::NonVolatile => "nv",
        }
    }
}

impl fmt::Display for CacheMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheMedium::Volatile => write!(f, "DRAM"),
            CacheMedium::NonVolatile => write!(f, "NVRAM"),
        }
    }
}

//! Reliability Module
//!
//! Probability primitives shared by every stage of the durability model.

pub mod probability;

pub use probability::*;

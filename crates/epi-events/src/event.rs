//! Event Types
//!
//! Transmission events emitted by the daily transmission pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Contact layer through which an exposure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactLayer {
    Household,
    Occupation,
    Random,
}

impl ContactLayer {
    /// Returns all layers in evaluation order.
    pub fn all() -> &'static [ContactLayer] {
        &[
            ContactLayer::Household,
            ContactLayer::Occupation,
            ContactLayer::Random,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactLayer::Household => "household",
            ContactLayer::Occupation => "occupation",
            ContactLayer::Random => "random",
        }
    }
}

impl fmt::Display for ContactLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single successful transmission: `source` infected `target` on `day`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionEvent {
    pub day: u32,
    pub source: usize,
    pub target: usize,
    pub layer: ContactLayer,
}

impl TransmissionEvent {
    pub fn new(day: u32, source: usize, target: usize, layer: ContactLayer) -> Self {
        Self {
            day,
            source,
            target,
            layer,
        }
    }
}

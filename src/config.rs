//! Tunable constants for snapping, inference and placement.
//!
//! Every field has a default matching the canvas' stock behaviour; a JSON
//! file may override any subset of them.

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::conflict::DEFAULT_MIN_GAP_MINUTES;
use crate::relationship::DEFAULT_CONTAINMENT_TOLERANCE;
use crate::snap::DEFAULT_SNAP_THRESHOLD;

/// What to do when a free drop overlaps another block without forming a valid
/// parent/child pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Log the conflict and keep the block where it was dropped.
    #[default]
    Advisory,
    /// Leave the block at its position from before the drag.
    Blocking,
}

/// How a dragged block attaches to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapMode {
    /// Child blocks nest inside type-compatible parents at their time offset.
    #[default]
    Containment,
    /// Blocks line up to the right of the target and join its snap group.
    SideBySide,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub snap_mode: SnapMode,
    /// Candidates whose center is at least this far from the pointer are
    /// ignored.
    pub snap_threshold: f64,
    /// Slack, in pixels, on each edge when testing whether a box contains
    /// another.
    pub containment_tolerance: f64,
    /// Two non-overlapping blocks closer than this are in conflict.
    pub min_gap_minutes: f64,
    /// Horizontal gap used by [`SnapMode::SideBySide`].
    pub side_by_side_spacing: f64,
    /// Vertical room reserved for hotels when an activity nests in a flight.
    pub hotel_lane_height: f64,
    /// Free drops of untimed blocks are rounded to this grid. `None` disables.
    pub grid_size: Option<f64>,
    pub placement_policy: PlacementPolicy,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            snap_mode: SnapMode::Containment,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            containment_tolerance: DEFAULT_CONTAINMENT_TOLERANCE,
            min_gap_minutes: DEFAULT_MIN_GAP_MINUTES,
            side_by_side_spacing: 20.0,
            hotel_lane_height: 110.0,
            grid_size: Some(20.0),
            placement_policy: PlacementPolicy::Advisory,
        }
    }
}

impl CanvasConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse config {}", path))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

//! Temporal conflict detection between blocks.
//!
//! Blocks without a date range carry no temporal constraint: every check in
//! this module treats them as conflict-free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::model::{Block, SnapPosition};
use crate::time::{DateRange, duration_hours};

pub const DEFAULT_MIN_GAP_MINUTES: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Overlap,
    InsufficientGap,
    None,
}

impl ConflictKind {
    pub fn is_conflict(self) -> bool {
        self != ConflictKind::None
    }
}

/// A classified pair with a message suitable for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConflict {
    pub kind: ConflictKind,
    pub conflicting_blocks: Vec<String>,
    pub message: String,
}

impl TimingConflict {
    fn none() -> Self {
        Self {
            kind: ConflictKind::None,
            conflicting_blocks: Vec::new(),
            message: "No timing conflicts".to_string(),
        }
    }
}

/// Classify two ranges.
///
/// Overlap uses strict inequalities (`a.start < b.end && a.end > b.start`), so
/// ranges that merely touch do not overlap, and neither do two zero-length
/// ranges at the same instant. The gap check looks at the smaller of the two
/// end-to-start distances and only fires for a positive gap shorter than
/// `min_gap_minutes`.
pub fn classify_ranges(a: &DateRange, b: &DateRange, min_gap_minutes: f64) -> ConflictKind {
    if a.start < b.end && a.end > b.start {
        return ConflictKind::Overlap;
    }
    let gap1 = (a.end - b.start).num_milliseconds().abs();
    let gap2 = (b.end - a.start).num_milliseconds().abs();
    let gap = gap1.min(gap2);
    let min_gap = (min_gap_minutes * 60_000.0).round() as i64;
    if gap > 0 && gap < min_gap {
        ConflictKind::InsufficientGap
    } else {
        ConflictKind::None
    }
}

/// Classify two blocks with the default 30 minute gap. Order-independent.
pub fn classify(a: &Block, b: &Block) -> ConflictKind {
    classify_with_gap(a, b, DEFAULT_MIN_GAP_MINUTES)
}

pub fn classify_with_gap(a: &Block, b: &Block, min_gap_minutes: f64) -> ConflictKind {
    match (a.date_range(), b.date_range()) {
        (Some(ra), Some(rb)) => classify_ranges(ra, rb, min_gap_minutes),
        _ => ConflictKind::None,
    }
}

pub fn check_timing_conflict(a: &Block, b: &Block, config: &CanvasConfig) -> TimingConflict {
    let kind = classify_with_gap(a, b, config.min_gap_minutes);
    let message = match kind {
        ConflictKind::Overlap => format!("{} overlaps with {}", a.title, b.title),
        ConflictKind::InsufficientGap => {
            format!("Insufficient time between {} and {}", a.title, b.title)
        }
        ConflictKind::None => return TimingConflict::none(),
    };
    TimingConflict {
        kind,
        conflicting_blocks: vec![a.id.clone(), b.id.clone()],
        message,
    }
}

/// Whether `child`'s time range lies within `parent`'s. Untimed blocks always
/// fit.
pub fn fits_within(parent: &Block, child: &Block) -> bool {
    match (parent.date_range(), child.date_range()) {
        (Some(p), Some(c)) => p.contains(c),
        _ => true,
    }
}

/// First conflict between `block` and any member of `group`.
pub fn can_add_to_snap_group(block: &Block, group: &[&Block], config: &CanvasConfig) -> TimingConflict {
    group
        .iter()
        .filter(|member| member.id != block.id)
        .map(|member| check_timing_conflict(block, member, config))
        .find(|c| c.kind.is_conflict())
        .unwrap_or_else(TimingConflict::none)
}

/// Where `block` sits among `group` once sorted by start time. Untimed blocks
/// sort before timed ones; ties keep group order with `block` last.
pub fn snap_position(block: &Block, group: &[&Block]) -> SnapPosition {
    let mut members: Vec<&Block> = group.iter().copied().filter(|b| b.id != block.id).collect();
    if members.is_empty() {
        return SnapPosition::Center;
    }
    members.push(block);
    members.sort_by_key(|b| b.date_range().map(|r| r.start));
    let index = members.iter().position(|b| b.id == block.id).unwrap_or(0);
    if index == 0 {
        SnapPosition::Left
    } else if index == members.len() - 1 {
        SnapPosition::Right
    } else {
        SnapPosition::Center
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapGroupMetrics {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub total_hours: f64,
    pub height: f64,
}

/// Time span and tallest member of a snap group.
pub fn snap_group_metrics(group: &[&Block]) -> SnapGroupMetrics {
    let start = group.iter().filter_map(|b| b.date_range()).map(|r| r.start).min();
    let end = group.iter().filter_map(|b| b.date_range()).map(|r| r.end).max();
    let total_hours = match (start, end) {
        (Some(s), Some(e)) => duration_hours(s, e),
        _ => 0.0,
    };
    let height = group.iter().map(|b| b.height).fold(0.0, f64::max);
    SnapGroupMetrics {
        start,
        end,
        total_hours,
        height,
    }
}

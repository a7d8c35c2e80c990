//! Snap target resolution for a block being dragged.
//!
//! [`find_snap_target`] runs on every pointer move, so it only does a linear
//! scan over the candidates plus one relationship inference pass.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{CanvasConfig, SnapMode};
use crate::conflict::{can_add_to_snap_group, fits_within};
use crate::geometry::{Rect, Vec2};
use crate::model::{Block, BlockKind, BlockType};
use crate::propagate::{ChildPosition, propagate};
use crate::relationship::{infer_relationships, relationship_as_parent};

/// Default pointer distance, in pixels, beyond which nothing snaps.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 80.0;

/// How the dragged block relates to the block it snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapDirection {
    /// The dragged block nests inside the target.
    ChildIntoParent,
    /// The dragged block becomes the target's parent.
    ParentOntoChild,
    /// The dragged block lines up next to the target.
    SideBySide,
}

/// Outcome of one snap query.
///
/// When `should_snap` is false, `snap_x`/`snap_y` are the raw pointer
/// coordinates. A non-empty `child_positions` means the dragged block is a
/// parent and its children follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub should_snap: bool,
    pub snap_x: f64,
    pub snap_y: f64,
    pub target_id: Option<String>,
    pub direction: Option<SnapDirection>,
    pub conflict_reason: Option<String>,
    #[serde(default)]
    pub child_positions: Vec<ChildPosition>,
}

impl SnapResult {
    pub fn free(x: f64, y: f64) -> Self {
        Self {
            should_snap: false,
            snap_x: x,
            snap_y: y,
            target_id: None,
            direction: None,
            conflict_reason: None,
            child_positions: Vec::new(),
        }
    }

    fn rejected(x: f64, y: f64, target: &Block, reason: String) -> Self {
        Self {
            target_id: Some(target.id.clone()),
            conflict_reason: Some(reason),
            ..Self::free(x, y)
        }
    }

    fn snapped(x: f64, y: f64, target: &Block, direction: SnapDirection) -> Self {
        Self {
            should_snap: true,
            target_id: Some(target.id.clone()),
            direction: Some(direction),
            ..Self::free(x, y)
        }
    }

    pub fn is_group_move(&self) -> bool {
        !self.child_positions.is_empty()
    }

    pub fn is_rejected(&self) -> bool {
        self.conflict_reason.is_some()
    }
}

/// Which way two blocks may nest, if at all. Forward nesting wins when both
/// directions are allowed.
pub fn nesting_direction(dragged: &Block, target: &Block) -> Option<SnapDirection> {
    if target.block_type().can_parent(dragged.block_type()) {
        Some(SnapDirection::ChildIntoParent)
    } else if dragged.block_type().can_parent(target.block_type()) {
        Some(SnapDirection::ParentOntoChild)
    } else {
        None
    }
}

/// Fraction of the parent's duration elapsed when the child starts. `None`
/// when either block is untimed or the parent has no positive duration.
pub fn relative_position(parent: &Block, child: &Block) -> Option<f64> {
    let p = parent.date_range()?;
    let c = child.date_range()?;
    let parent_hours = p.duration_hours();
    if parent_hours <= 0.0 {
        return None;
    }
    Some(crate::time::duration_hours(p.start, c.start) / parent_hours)
}

/// Vertical offset of a child of type `child` below the parent's top edge.
///
/// Children sit under the parent's chrome. Activities nested in a flight also
/// skip the hotel lane so they stack below any hotel.
pub fn child_offset_y(parent: &Block, child: BlockType, config: &CanvasConfig) -> f64 {
    let chrome = parent.chrome_height();
    match child {
        BlockType::Activity if matches!(parent.kind, BlockKind::Flight(_)) => chrome + config.hotel_lane_height,
        BlockType::Activity | BlockType::Hotel | BlockType::Flight | BlockType::Generic => chrome,
    }
}

/// Where a child lands inside `parent`. Untimed pairs are left-aligned.
pub fn child_snap_point(parent: &Block, child: &Block, config: &CanvasConfig) -> Vec2 {
    let rel = relative_position(parent, child).unwrap_or(0.0);
    Vec2::new(
        parent.x + rel * parent.width,
        parent.y + child_offset_y(parent, child.block_type(), config),
    )
}

/// Where `parent` must go so that the already placed `child` ends up at its
/// relative offset.
pub fn parent_snap_point(parent: &Block, child: &Block, config: &CanvasConfig) -> Vec2 {
    let rel = relative_position(parent, child).unwrap_or(0.0);
    Vec2::new(
        child.x - rel * parent.width,
        child.y - child_offset_y(parent, child.block_type(), config),
    )
}

/// Find the block `dragged` should snap to when the pointer is at
/// (`pointer_x`, `pointer_y`).
///
/// Candidates are compared by the distance from the pointer to their center;
/// a candidate exactly at `config.snap_threshold` is out of range. On equal
/// distances the first candidate in iteration order wins.
pub fn find_snap_target<'a>(
    dragged: &Block,
    all_blocks: impl IntoIterator<Item = &'a Block>,
    pointer_x: f64,
    pointer_y: f64,
    config: &CanvasConfig,
) -> SnapResult {
    let blocks: Vec<&Block> = all_blocks.into_iter().collect();

    let relationships = infer_relationships(blocks.iter().copied(), config.containment_tolerance);
    if let Some(rel) = relationship_as_parent(&relationships, &dragged.id) {
        debug!("{} is a parent; moving {} children with it", dragged.id, rel.children.len());
        return SnapResult {
            child_positions: propagate(dragged, rel, pointer_x, pointer_y),
            ..SnapResult::free(pointer_x, pointer_y)
        };
    }

    let pointer = Vec2::new(pointer_x, pointer_y);
    let mut nearest: Option<(&Block, f64, SnapDirection)> = None;
    for candidate in blocks.iter().copied().filter(|b| b.id != dragged.id) {
        let distance = pointer.distance(candidate.rect().center());
        if distance >= config.snap_threshold {
            continue;
        }
        let direction = match config.snap_mode {
            SnapMode::SideBySide => SnapDirection::SideBySide,
            SnapMode::Containment => match nesting_direction(dragged, candidate) {
                Some(d) => d,
                None => continue,
            },
        };
        if nearest.is_none_or(|(_, best, _)| distance < best) {
            nearest = Some((candidate, distance, direction));
        }
    }

    let Some((target, distance, direction)) = nearest else {
        return SnapResult::free(pointer_x, pointer_y);
    };
    debug!(
        "snap candidate for {}: {} at {:.1}px ({:?})",
        dragged.id, target.id, distance, direction
    );

    match direction {
        SnapDirection::ChildIntoParent => {
            if !fits_within(target, dragged) {
                return SnapResult::rejected(pointer_x, pointer_y, target, outside_reason(dragged, target));
            }
            let p = child_snap_point(target, dragged, config);
            SnapResult::snapped(p.x, p.y, target, direction)
        }
        SnapDirection::ParentOntoChild => {
            if !fits_within(dragged, target) {
                return SnapResult::rejected(pointer_x, pointer_y, target, outside_reason(target, dragged));
            }
            let p = parent_snap_point(dragged, target, config);
            SnapResult::snapped(p.x, p.y, target, direction)
        }
        SnapDirection::SideBySide => {
            let group: Vec<&Block> = blocks
                .iter()
                .copied()
                .filter(|b| {
                    b.id == target.id
                        || (target.snap.snap_group_id.is_some() && b.snap.snap_group_id == target.snap.snap_group_id)
                })
                .collect();
            let conflict = can_add_to_snap_group(dragged, &group, config);
            if conflict.kind.is_conflict() {
                return SnapResult::rejected(pointer_x, pointer_y, target, conflict.message);
            }
            SnapResult::snapped(
                target.x + target.width + config.side_by_side_spacing,
                target.y,
                target,
                direction,
            )
        }
    }
}

fn outside_reason(child: &Block, parent: &Block) -> String {
    format!(
        "{} ({}) does not fit within the time range of {} ({})",
        child.title,
        child.block_type(),
        parent.title,
        parent.block_type()
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementValidation {
    pub is_valid: bool,
    pub message: Option<String>,
    pub conflicting_block_id: Option<String>,
}

impl PlacementValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
            conflicting_block_id: None,
        }
    }
}

/// Check whether `block` may sit at (`x`, `y`) without overlapping another
/// block, unless the two form a valid parent/child pair (tolerant containment,
/// compatible types, and a fitting time range).
pub fn validate_placement<'a>(
    block: &Block,
    x: f64,
    y: f64,
    all_blocks: impl IntoIterator<Item = &'a Block>,
    config: &CanvasConfig,
) -> PlacementValidation {
    let moved = Rect::from_xywh(x, y, block.width, block.height);
    let tol = config.containment_tolerance;
    for other in all_blocks.into_iter().filter(|b| b.id != block.id) {
        let other_rect = other.rect();
        if !moved.intersects(other_rect) {
            continue;
        }
        let nests_in_other = other_rect.contains_rect(moved, tol)
            && other.block_type().can_parent(block.block_type())
            && fits_within(other, block);
        let holds_other = moved.contains_rect(other_rect, tol)
            && block.block_type().can_parent(other.block_type())
            && fits_within(block, other);
        if nests_in_other || holds_other {
            continue;
        }
        return PlacementValidation {
            is_valid: false,
            message: Some(format!(
                "{} overlaps {} without a valid parent/child relationship",
                block.title, other.title
            )),
            conflicting_block_id: Some(other.id.clone()),
        };
    }
    PlacementValidation::valid()
}

/// Round a coordinate to the nearest multiple of `grid`.
pub fn snap_to_grid(value: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

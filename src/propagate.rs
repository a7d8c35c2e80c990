use serde::{Deserialize, Serialize};

use crate::model::Block;
use crate::relationship::Relationship;

/// New top-left corner for one child of a moved parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildPosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Translate every child of `relationship` by the parent's displacement.
///
/// The delta is taken from `parent`'s current position, so callers must pass
/// the parent as it is before the move.
pub fn propagate(parent: &Block, relationship: &Relationship, new_x: f64, new_y: f64) -> Vec<ChildPosition> {
    let dx = new_x - parent.x;
    let dy = new_y - parent.y;
    relationship
        .children
        .iter()
        .map(|child| {
            let moved = child.rect().translate(dx, dy);
            ChildPosition {
                id: child.id.clone(),
                x: moved.min.x,
                y: moved.min.y,
            }
        })
        .collect()
}

//! Parent/child relationships inferred from block geometry.
//!
//! A relationship is never stored: it is recomputed from the current
//! rectangles of all blocks, so identical geometry always yields identical
//! relationships no matter how the blocks got there.

use serde::{Deserialize, Serialize};

use crate::model::{Block, BlockKind, BlockType};

/// Pixels of slack on every edge when deciding containment.
pub const DEFAULT_CONTAINMENT_TOLERANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    FlightHotel,
    HotelActivity,
    FlightActivity,
    None,
}

/// A parent block and every block inside its bounding box, as of the moment
/// of inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub parent: Block,
    pub children: Vec<Block>,
    pub relationship_type: RelationshipType,
}

impl Relationship {
    pub fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|c| c.id == id)
    }

    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.id.as_str())
    }
}

/// Whether `child`'s box lies within `parent`'s box grown by `tolerance`.
pub fn is_contained(child: &Block, parent: &Block, tolerance: f64) -> bool {
    parent.rect().contains_rect(child.rect(), tolerance)
}

/// Classify a parent by the kinds of children it holds.
pub fn relationship_type(parent: &Block, children: &[Block]) -> RelationshipType {
    let has = |t: BlockType| children.iter().any(|c| c.block_type() == t);
    match &parent.kind {
        BlockKind::Flight(_) if has(BlockType::Hotel) => RelationshipType::FlightHotel,
        BlockKind::Flight(_) if has(BlockType::Activity) => RelationshipType::FlightActivity,
        BlockKind::Hotel(_) if has(BlockType::Activity) => RelationshipType::HotelActivity,
        BlockKind::Flight(_) | BlockKind::Hotel(_) | BlockKind::Activity(_) | BlockKind::Generic => {
            RelationshipType::None
        }
    }
}

/// Derive every parent → children grouping from the blocks' rectangles.
///
/// Each block with at least one contained block yields one relationship, in
/// input order. A block inside several boxes appears under each of them; use
/// [`primary_parent_of`] when a single parent is needed. This is O(n²).
pub fn infer_relationships<'a>(blocks: impl IntoIterator<Item = &'a Block>, tolerance: f64) -> Vec<Relationship> {
    let blocks: Vec<&Block> = blocks.into_iter().collect();
    let mut relationships = Vec::new();
    for parent in &blocks {
        let children: Vec<Block> = blocks
            .iter()
            .filter(|other| other.id != parent.id && is_contained(other, parent, tolerance))
            .map(|b| (*b).clone())
            .collect();
        if children.is_empty() {
            continue;
        }
        let relationship_type = relationship_type(parent, &children);
        relationships.push(Relationship {
            parent: (*parent).clone(),
            children,
            relationship_type,
        });
    }
    relationships
}

/// The relationship in which `id` is the parent.
pub fn relationship_as_parent<'r>(relationships: &'r [Relationship], id: &str) -> Option<&'r Relationship> {
    relationships.iter().find(|r| r.parent.id == id)
}

/// The relationship used to label `id`: the one it parents, otherwise the one
/// of its primary parent.
pub fn relationship_for_block<'r>(relationships: &'r [Relationship], id: &str) -> Option<&'r Relationship> {
    relationship_as_parent(relationships, id).or_else(|| primary_parent_of(relationships, id))
}

/// The single parent of `child_id`: the containing block with the smallest
/// area, first in input order on ties.
pub fn primary_parent_of<'r>(relationships: &'r [Relationship], child_id: &str) -> Option<&'r Relationship> {
    let mut best: Option<&Relationship> = None;
    for rel in relationships.iter().filter(|r| r.has_child(child_id)) {
        match best {
            Some(b) if b.parent.rect().area() <= rel.parent.rect().area() => {}
            _ => best = Some(rel),
        }
    }
    best
}

//! The mutable block collection and its derived relationships.
//!
//! [`BlockRegistry`] is the single owner of all placed blocks. Every mutating
//! method finishes by re-running relationship inference, so the list returned
//! (or read back through [`BlockRegistry::relationships`]) always matches the
//! current geometry.

use anyhow::Context;
use camino::Utf8Path;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{CanvasConfig, PlacementPolicy};
use crate::conflict::snap_position;
use crate::model::{Block, BlockPatch, SnapPosition, Timing};
use crate::propagate::propagate;
use crate::relationship::{
    Relationship, infer_relationships, primary_parent_of, relationship_as_parent, relationship_for_block,
};
use crate::snap::{PlacementValidation, SnapResult, find_snap_target, snap_to_grid, validate_placement};
use crate::time::{TimeError, TripTimeline};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("a block with id {0} already exists")]
    DuplicateId(String),
    #[error("no block with id {0}")]
    NotFound(String),
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// What a committed drop did to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    /// The block took its snapped position and joined the target's snap group.
    Snapped { target_id: String, group_id: String },
    /// The block was a parent; it and its children moved together.
    GroupMoved { child_ids: Vec<String> },
    /// Free placement. `advisory` carries a spatial conflict that was allowed
    /// through under [`PlacementPolicy::Advisory`].
    Free { advisory: Option<String> },
    /// The snap was refused for a timing conflict; the block stays where it
    /// was dropped.
    Rejected { reason: String },
    /// A spatial conflict under [`PlacementPolicy::Blocking`]; the block kept
    /// its previous position.
    Blocked { message: String },
}

#[derive(Debug, Clone)]
pub struct BlockRegistry {
    timeline: TripTimeline,
    config: CanvasConfig,
    blocks: IndexMap<String, Block>,
    relationships: Vec<Relationship>,
}

impl BlockRegistry {
    pub fn new(timeline: TripTimeline, config: CanvasConfig) -> Self {
        Self {
            timeline,
            config,
            blocks: IndexMap::new(),
            relationships: Vec::new(),
        }
    }

    /// Build a registry from a list of blocks, rejecting duplicate ids.
    pub fn with_blocks(
        timeline: TripTimeline,
        config: CanvasConfig,
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(timeline, config);
        for mut block in blocks {
            if registry.blocks.contains_key(&block.id) {
                return Err(RegistryError::DuplicateId(block.id));
            }
            block.sync_with_timeline(&registry.timeline);
            registry.blocks.insert(block.id.clone(), block);
        }
        registry.recompute();
        Ok(registry)
    }

    pub fn timeline(&self) -> &TripTimeline {
        &self.timeline
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// All blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationship_for_block(&self, id: &str) -> Option<&Relationship> {
        relationship_for_block(&self.relationships, id)
    }

    /// Members of a snap group in registry order.
    pub fn snap_group(&self, group_id: &str) -> Vec<&Block> {
        self.blocks
            .values()
            .filter(|b| b.snap.snap_group_id.as_deref() == Some(group_id))
            .collect()
    }

    fn recompute(&mut self) -> &[Relationship] {
        self.relationships = infer_relationships(self.blocks.values(), self.config.containment_tolerance);
        &self.relationships
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Block, RegistryError> {
        self.blocks
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    // ────────────────────────────────────────────────────────────────────
    // Mutators
    // ────────────────────────────────────────────────────────────────────

    /// Append a block. Its `start_hour` (and width, for timed flights and
    /// hotels) is derived from the timeline.
    pub fn add_block(&mut self, mut block: Block) -> Result<&[Relationship], RegistryError> {
        if self.blocks.contains_key(&block.id) {
            return Err(RegistryError::DuplicateId(block.id));
        }
        block.sync_with_timeline(&self.timeline);
        debug!("add {} ({})", block.id, block.block_type());
        self.blocks.insert(block.id.clone(), block);
        Ok(self.recompute())
    }

    /// Shallow-merge `patch` into the block. A width in the patch is ignored
    /// for timed flights and hotels, whose width follows their duration.
    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> Result<&[Relationship], RegistryError> {
        let timeline = &self.timeline;
        let block = self
            .blocks
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if let Some(x) = patch.x {
            block.x = x;
        }
        if let Some(y) = patch.y {
            block.y = y;
        }
        if let Some(height) = patch.height {
            block.height = height;
        }
        if let Some(title) = patch.title {
            block.title = title;
        }
        if let Some(color) = patch.color {
            block.color = Some(color);
        }
        if let Some(range) = patch.date_range {
            block.timing = Some(Timing::new(range, timeline.start_date));
        }
        if let Some(snap) = patch.snap {
            block.snap = snap;
        }
        if let Some(width) = patch.width {
            if block.has_derived_width() {
                debug!("ignoring width {} for {}: derived from its duration", width, block.id);
            } else {
                block.width = width;
            }
        }
        block.sync_with_timeline(timeline);
        Ok(self.recompute())
    }

    /// Remove a block. If it belonged to a snap group, every remaining member
    /// of that group is released.
    pub fn remove_block(&mut self, id: &str) -> Result<&[Relationship], RegistryError> {
        let removed = self
            .blocks
            .shift_remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if let Some(group) = removed.snap.snap_group_id.as_deref() {
            self.release_group(group);
        }
        Ok(self.recompute())
    }

    fn release_group(&mut self, group: &str) {
        let mut released = 0;
        for block in self.blocks.values_mut() {
            if block.snap.snap_group_id.as_deref() == Some(group) {
                block.snap.release();
                released += 1;
            }
        }
        info!("released {} blocks from snap group {}", released, group);
    }

    /// Move a block to (`x`, `y`). If it is a parent, its children are moved
    /// by the same delta in the same call.
    pub fn move_block(&mut self, id: &str, x: f64, y: f64) -> Result<&[Relationship], RegistryError> {
        let block = self.get(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let children = relationship_as_parent(&self.relationships, id)
            .map(|rel| propagate(block, rel, x, y))
            .unwrap_or_default();
        for child in children {
            if let Some(b) = self.blocks.get_mut(&child.id) {
                b.x = child.x;
                b.y = child.y;
            }
        }
        let block = self.get_mut(id)?;
        block.x = x;
        block.y = y;
        Ok(self.recompute())
    }

    // ────────────────────────────────────────────────────────────────────
    // Scale
    // ────────────────────────────────────────────────────────────────────

    pub fn set_scale(&mut self, pixels_per_hour: f64) -> Result<&[Relationship], RegistryError> {
        self.timeline.set_scale(pixels_per_hour)?;
        Ok(self.resync())
    }

    pub fn zoom_in(&mut self) -> &[Relationship] {
        self.timeline.zoom_in();
        self.resync()
    }

    pub fn zoom_out(&mut self) -> &[Relationship] {
        self.timeline.zoom_out();
        self.resync()
    }

    pub fn reset_zoom(&mut self) -> &[Relationship] {
        self.timeline.reset_zoom();
        self.resync()
    }

    /// Re-derives timed widths after a scale change and keeps every child at
    /// the same fraction of its primary parent's width, so nesting survives
    /// the zoom. Outer parents are re-anchored before their own children.
    fn resync(&mut self) -> &[Relationship] {
        let mut anchors: Vec<(String, String, f64, f64)> = self
            .blocks
            .keys()
            .filter_map(|id| {
                let rel = primary_parent_of(&self.relationships, id)?;
                let parent = self.blocks.get(&rel.parent.id)?;
                let child = self.blocks.get(id)?;
                let fraction = if parent.width > 0.0 {
                    (child.x - parent.x) / parent.width
                } else {
                    0.0
                };
                Some((id.clone(), parent.id.clone(), fraction, parent.rect().area()))
            })
            .collect();
        anchors.sort_by(|a, b| b.3.total_cmp(&a.3));

        for block in self.blocks.values_mut() {
            block.sync_with_timeline(&self.timeline);
        }

        for (child_id, parent_id, fraction, _) in anchors {
            let Some((parent_x, parent_width)) = self.blocks.get(&parent_id).map(|p| (p.x, p.width)) else {
                continue;
            };
            if let Some(child) = self.blocks.get_mut(&child_id) {
                let mut x = parent_x + fraction * parent_width;
                let parent_right = parent_x + parent_width;
                if child.width <= parent_width && x + child.width > parent_right {
                    x = parent_right - child.width;
                }
                debug!("re-anchored {} at x={:.1} inside {}", child_id, x, parent_id);
                child.x = x;
            }
        }
        self.recompute()
    }

    // ────────────────────────────────────────────────────────────────────
    // Snapping
    // ────────────────────────────────────────────────────────────────────

    /// Snap preview for block `id` with the pointer at (`x`, `y`).
    pub fn find_snap_target(&self, id: &str, x: f64, y: f64) -> Result<SnapResult, RegistryError> {
        let block = self.get(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(find_snap_target(block, self.blocks.values(), x, y, &self.config))
    }

    pub fn validate_placement(&self, id: &str, x: f64, y: f64) -> Result<PlacementValidation, RegistryError> {
        let block = self.get(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(validate_placement(block, x, y, self.blocks.values(), &self.config))
    }

    /// Apply the end of a drag of block `id`, dropped at (`drop_x`, `drop_y`)
    /// with `snap` as the last preview.
    pub fn commit_drop(
        &mut self,
        id: &str,
        drop_x: f64,
        drop_y: f64,
        snap: &SnapResult,
    ) -> Result<DropOutcome, RegistryError> {
        if !self.blocks.contains_key(id) {
            return Err(RegistryError::NotFound(id.to_string()));
        }

        if snap.is_group_move() {
            let child_ids = relationship_as_parent(&self.relationships, id)
                .map(|rel| rel.child_ids().map(str::to_string).collect())
                .unwrap_or_default();
            self.move_block(id, drop_x, drop_y)?;
            return Ok(DropOutcome::GroupMoved { child_ids });
        }

        if snap.should_snap {
            if let Some(target_id) = snap.target_id.as_deref() {
                if self.blocks.contains_key(target_id) {
                    let block = self.get_mut(id)?;
                    block.x = snap.snap_x;
                    block.y = snap.snap_y;
                    let group_id = self.join_group(id, target_id);
                    self.recompute();
                    return Ok(DropOutcome::Snapped {
                        target_id: target_id.to_string(),
                        group_id,
                    });
                }
                warn!("snap target {} vanished before drop; placing {} freely", target_id, id);
            }
        }

        if let Some(reason) = snap.conflict_reason.clone() {
            self.leave_group(id);
            let block = self.get_mut(id)?;
            block.x = drop_x;
            block.y = drop_y;
            self.recompute();
            return Ok(DropOutcome::Rejected { reason });
        }

        self.place_freely(id, drop_x, drop_y)
    }

    fn place_freely(&mut self, id: &str, drop_x: f64, drop_y: f64) -> Result<DropOutcome, RegistryError> {
        let (mut x, mut y) = (drop_x, drop_y);
        let untimed = self.get(id).is_some_and(|b| b.timing.is_none());
        if let (true, Some(grid)) = (untimed, self.config.grid_size) {
            x = snap_to_grid(x, grid);
            y = snap_to_grid(y, grid);
        }

        let validation = self.validate_placement(id, x, y)?;
        let advisory = match (validation.is_valid, self.config.placement_policy) {
            (true, _) => None,
            (false, PlacementPolicy::Advisory) => {
                warn!("{}", validation.message.as_deref().unwrap_or("placement conflict"));
                validation.message
            }
            (false, PlacementPolicy::Blocking) => {
                let message = validation.message.unwrap_or_else(|| "placement conflict".to_string());
                return Ok(DropOutcome::Blocked { message });
            }
        };

        self.leave_group(id);
        let block = self.get_mut(id)?;
        block.x = x;
        block.y = y;
        self.recompute();
        Ok(DropOutcome::Free { advisory })
    }

    /// Put `id` into `target_id`'s snap group, creating the group if needed,
    /// and refresh every member's left/center/right position.
    fn join_group(&mut self, id: &str, target_id: &str) -> String {
        let target_group = self.get(target_id).and_then(|b| b.snap.snap_group_id.clone());
        let own_group = self.get(id).and_then(|b| b.snap.snap_group_id.clone());
        if own_group.is_some() && own_group != target_group {
            self.leave_group(id);
        }
        let group_id = target_group.unwrap_or_else(|| format!("group-{}", Uuid::new_v4()));
        for member in [id, target_id] {
            if let Some(b) = self.blocks.get_mut(member) {
                b.snap.snap_group_id = Some(group_id.clone());
                b.snap.is_snapped = true;
            }
        }
        self.refresh_group_positions(&group_id);
        group_id
    }

    /// Drop `id` from its snap group. A group left with a single member is
    /// dissolved.
    fn leave_group(&mut self, id: &str) {
        let Some(group) = self.get(id).and_then(|b| b.snap.snap_group_id.clone()) else {
            return;
        };
        if let Some(b) = self.blocks.get_mut(id) {
            b.snap.release();
        }
        if self.snap_group(&group).len() < 2 {
            self.release_group(&group);
        } else {
            self.refresh_group_positions(&group);
        }
    }

    fn refresh_group_positions(&mut self, group_id: &str) {
        let positions: Vec<(String, SnapPosition)> = {
            let members = self.snap_group(group_id);
            members
                .iter()
                .map(|m| (m.id.clone(), snap_position(m, &members)))
                .collect()
        };
        for (id, position) in positions {
            if let Some(b) = self.blocks.get_mut(&id) {
                b.snap.snap_position = Some(position);
            }
        }
    }
}

/// A trip as exchanged with the UI layer: the timeline plus its blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDoc {
    pub timeline: TripTimeline,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl TripDoc {
    pub fn load(path: impl AsRef<Utf8Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let doc = serde_json::from_str(&text).with_context(|| format!("Failed to parse trip {}", path))?;
        Ok(doc)
    }

    pub fn into_registry(self, config: CanvasConfig) -> Result<BlockRegistry, RegistryError> {
        BlockRegistry::with_blocks(self.timeline, config, self.blocks)
    }
}

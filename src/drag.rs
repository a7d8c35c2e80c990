//! Per-drag state machine.
//!
//! `Idle → Dragging (preview on every move) → drop → Idle`. Previews never
//! touch the registry; only [`DragSession::drag_end`] commits. Cancelling a
//! drag simply forgets the preview.

use crate::geometry::Vec2;
use crate::registry::{BlockRegistry, DropOutcome, RegistryError};
use crate::snap::SnapResult;

/// What the session is currently doing.
#[derive(Debug, Clone)]
pub enum DragState {
    Idle,
    Dragging {
        block_id: String,
        /// Block position when the drag began.
        origin: Vec2,
        /// Latest snap preview.
        preview: SnapResult,
    },
}

impl Default for DragState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragged_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { block_id, .. } => Some(block_id),
            DragState::Idle => None,
        }
    }

    /// Start dragging block `id`. Any drag already in progress is abandoned.
    pub fn begin(&mut self, registry: &BlockRegistry, id: &str) -> Result<(), RegistryError> {
        let block = registry
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        self.state = DragState::Dragging {
            block_id: block.id.clone(),
            origin: Vec2::new(block.x, block.y),
            preview: SnapResult::free(block.x, block.y),
        };
        Ok(())
    }

    /// Update the preview for a pointer move. Returns `None` when idle.
    pub fn drag_move(&mut self, registry: &BlockRegistry, x: f64, y: f64) -> Result<Option<&SnapResult>, RegistryError> {
        let DragState::Dragging { block_id, preview, .. } = &mut self.state else {
            return Ok(None);
        };
        *preview = registry.find_snap_target(block_id, x, y)?;
        Ok(Some(&*preview))
    }

    /// Finish the drag at (`x`, `y`) and commit it. Returns `None` when idle.
    pub fn drag_end(
        &mut self,
        registry: &mut BlockRegistry,
        x: f64,
        y: f64,
    ) -> Result<Option<DropOutcome>, RegistryError> {
        let DragState::Dragging { block_id, .. } = std::mem::take(&mut self.state) else {
            return Ok(None);
        };
        let snap = registry.find_snap_target(&block_id, x, y)?;
        registry.commit_drop(&block_id, x, y, &snap).map(Some)
    }

    /// Abandon the drag. Returns the id and starting position of the block so
    /// the UI can put it back.
    pub fn cancel(&mut self) -> Option<(String, Vec2)> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { block_id, origin, .. } => Some((block_id, origin)),
            DragState::Idle => None,
        }
    }
}

//! Snapping and relationship engine for a visual trip-planning canvas.
//!
//! Blocks (flights, hotels, activities, generic items) live in a
//! [`registry::BlockRegistry`]. While a block is dragged,
//! [`snap::find_snap_target`] proposes where it should attach; on release the
//! registry commits the move, re-infers parent/child relationships from the
//! block rectangles, and carries children along when a parent moves.
//!
//! The binary `tripcanvas` loads a trip JSON document and prints the inferred
//! relationships or a snap preview.

pub mod builder;
pub mod config;
pub mod conflict;
pub mod drag;
pub mod geometry;
pub mod label;
pub mod model;
pub mod propagate;
pub mod registry;
pub mod relationship;
pub mod snap;
pub mod time;

pub use config::{CanvasConfig, PlacementPolicy, SnapMode};
pub use model::{Block, BlockKind, BlockPatch, BlockType};
pub use registry::{BlockRegistry, DropOutcome, RegistryError, TripDoc};
pub use relationship::{Relationship, RelationshipType};
pub use snap::{SnapResult, find_snap_target, validate_placement};
pub use time::{DateRange, TripTimeline};

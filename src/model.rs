use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::geometry::Rect;
use crate::time::{DateRange, TripTimeline};

// ────────────────────────────────────────────────────────────────────────────
// Block type
// ────────────────────────────────────────────────────────────────────────────

/// Discriminant of [`BlockKind`], used wherever only the kind matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Flight,
    Hotel,
    Activity,
    Generic,
}

impl BlockType {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Flight => "flight",
            BlockType::Hotel => "hotel",
            BlockType::Activity => "activity",
            BlockType::Generic => "generic",
        }
    }

    /// Whether a block of this type may contain a block of type `child`.
    ///
    /// Flights hold hotels and activities, hotels hold activities, and a
    /// generic block may hold anything.
    pub fn can_parent(self, child: BlockType) -> bool {
        match (self, child) {
            (BlockType::Generic, _) => true,
            (BlockType::Flight, BlockType::Hotel | BlockType::Activity) => true,
            (BlockType::Hotel, BlockType::Activity) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Type-specific payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSegment {
    pub id: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    #[serde(default)]
    pub flight_number: Option<String>,
    /// Ground time between two legs rather than a leg in the air.
    #[serde(default)]
    pub is_layover: bool,
}

impl FlightSegment {
    pub fn duration_hours(&self) -> f64 {
        crate::time::duration_hours(self.departure_time, self.arrival_time)
    }

    /// `JFK→LAX`
    pub fn route(&self) -> String {
        format!("{}→{}", self.departure_airport, self.arrival_airport)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightData {
    pub segments: Vec<FlightSegment>,
    pub departure_airport: String,
    pub arrival_airport: String,
    /// Height of the summary bar drawn at the top of the block.
    #[serde(default = "default_context_bar_height")]
    pub context_bar_height: f64,
    /// Height of the lane holding the flight segments, below the context bar.
    #[serde(default = "default_segment_height")]
    pub segment_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelEventKind {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelEvent {
    pub id: String,
    pub kind: HotelEventKind,
    pub at: DateTime<Utc>,
    pub hotel_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelData {
    pub hotel_name: String,
    pub location: String,
    pub events: Vec<HotelEvent>,
    #[serde(default = "default_hotel_context_bar_height")]
    pub context_bar_height: f64,
    /// Height of the check-in/check-out event lane.
    #[serde(default = "default_event_height")]
    pub event_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Sightseeing,
    Dining,
    Entertainment,
    Shopping,
    Transport,
    Business,
    Leisure,
    Sports,
}

impl ActivityCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Sightseeing => "sightseeing",
            ActivityCategory::Dining => "dining",
            ActivityCategory::Entertainment => "entertainment",
            ActivityCategory::Shopping => "shopping",
            ActivityCategory::Transport => "transport",
            ActivityCategory::Business => "business",
            ActivityCategory::Leisure => "leisure",
            ActivityCategory::Sports => "sports",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityData {
    pub category: ActivityCategory,
    pub location: String,
}

fn default_context_bar_height() -> f64 {
    24.0
}

fn default_segment_height() -> f64 {
    80.0
}

fn default_hotel_context_bar_height() -> f64 {
    20.0
}

fn default_event_height() -> f64 {
    28.0
}

/// The per-type payload of a [`Block`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Flight(FlightData),
    Hotel(HotelData),
    Activity(ActivityData),
    Generic,
}

impl BlockKind {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Flight(_) => BlockType::Flight,
            BlockKind::Hotel(_) => BlockType::Hotel,
            BlockKind::Activity(_) => BlockType::Activity,
            BlockKind::Generic => BlockType::Generic,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Timing and snapping metadata
// ────────────────────────────────────────────────────────────────────────────

/// Temporal attributes of a block. `duration_hours` is derived from the
/// range so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Offset of `date_range.start` from the trip start, in hours.
    pub start_hour: f64,
    pub date_range: DateRange,
}

impl Timing {
    pub fn new(date_range: DateRange, trip_start: DateTime<Utc>) -> Self {
        Self {
            start_hour: crate::time::hours_from_trip_start(date_range.start, trip_start),
            date_range,
        }
    }

    pub fn duration_hours(&self) -> f64 {
        self.date_range.duration_hours()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapPosition {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapMeta {
    /// Shared by every block snapped into the same group.
    #[serde(default)]
    pub snap_group_id: Option<String>,
    #[serde(default)]
    pub is_snapped: bool,
    #[serde(default)]
    pub snap_position: Option<SnapPosition>,
}

impl SnapMeta {
    pub fn release(&mut self) {
        self.snap_group_id = None;
        self.is_snapped = false;
        self.snap_position = None;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Block
// ────────────────────────────────────────────────────────────────────────────

/// A placed entity on the canvas.
///
/// `x`/`y` is the top-left corner in world coordinates. For timed flight and
/// hotel blocks, `width` follows `duration × pixels_per_hour` and is kept in
/// sync by [`Block::sync_with_timeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub timing: Option<Timing>,
    #[serde(default)]
    pub snap: SnapMeta,
    pub kind: BlockKind,
}

impl Block {
    /// Create a block with a freshly generated id of the form `<type>-<uuid>`.
    pub fn new(kind: BlockKind, title: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        let id = format!("{}-{}", kind.block_type(), Uuid::new_v4());
        Self::with_id(id, kind, title, x, y, width, height)
    }

    /// Create a block with a caller-chosen id.
    pub fn with_id(
        id: impl Into<String>,
        kind: BlockKind,
        title: impl Into<String>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            title: title.into(),
            color: None,
            timing: None,
            snap: SnapMeta::default(),
            kind,
        }
    }

    pub fn generic(title: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(BlockKind::Generic, title, x, y, width, height)
    }

    /// Attach a date range. `start_hour` is measured from `trip_start`.
    pub fn timed(mut self, date_range: DateRange, trip_start: DateTime<Utc>) -> Self {
        self.timing = Some(Timing::new(date_range, trip_start));
        self
    }

    pub fn colored(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    pub fn rect(&self) -> Rect {
        Rect::from_xywh(self.x, self.y, self.width, self.height)
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.timing.as_ref().map(|t| &t.date_range)
    }

    /// Width of flights and hotels is a function of their duration.
    pub fn has_derived_width(&self) -> bool {
        matches!(self.kind, BlockKind::Flight(_) | BlockKind::Hotel(_)) && self.timing.is_some()
    }

    /// Height of the non-content chrome at the top of the block (context bar
    /// plus the segment/event lane). Children are stacked below it.
    pub fn chrome_height(&self) -> f64 {
        match &self.kind {
            BlockKind::Flight(f) => f.context_bar_height + f.segment_height,
            BlockKind::Hotel(h) => h.context_bar_height + h.event_height,
            BlockKind::Activity(_) | BlockKind::Generic => 0.0,
        }
    }

    /// Re-derive `start_hour` and, for flights and hotels, `width` from the
    /// timeline's start and scale.
    pub fn sync_with_timeline(&mut self, timeline: &TripTimeline) {
        let derived_width = self.has_derived_width();
        if let Some(timing) = self.timing.as_mut() {
            let pos = timeline.position_of(&timing.date_range);
            timing.start_hour = pos.start_hour;
            if derived_width {
                self.width = pos.width;
            }
        }
    }
}

/// Partial update for [`crate::registry::BlockRegistry::update_block`].
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub title: Option<String>,
    pub color: Option<String>,
    pub date_range: Option<DateRange>,
    pub snap: Option<SnapMeta>,
}

impl BlockPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

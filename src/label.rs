//! Label data for blocks and relationship groups.
//!
//! The renderer draws one combined label per relationship; this module only
//! produces the text and date spans it needs, plus the layout of the day
//! indicator strip drawn above multi-day groups.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{ActivityCategory, Block, BlockKind, BlockType, HotelEventKind};
use crate::relationship::{Relationship, RelationshipType};
use crate::time::DateRange;

pub const DAY_INDICATOR_HEIGHT: f64 = 20.0;
/// Gap between the indicator strip and the top of the group.
pub const DAY_INDICATOR_MARGIN: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelDetail {
    Segment {
        flight_number: Option<String>,
        route: String,
        duration_hours: f64,
        is_layover: bool,
    },
    HotelEvent {
        event: HotelEventKind,
        date: NaiveDate,
        hotel_name: String,
    },
    Activity {
        category: ActivityCategory,
        location: String,
        duration_hours: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockLabel {
    pub block_type: BlockType,
    pub title: String,
    pub dates: Option<DateRange>,
    pub details: Vec<LabelDetail>,
}

pub fn block_label(block: &Block) -> BlockLabel {
    let (title, details) = match &block.kind {
        BlockKind::Flight(f) => (
            format!("{} - {} → {}", block.title, f.departure_airport, f.arrival_airport),
            f.segments
                .iter()
                .map(|s| LabelDetail::Segment {
                    flight_number: s.flight_number.clone(),
                    route: s.route(),
                    duration_hours: s.duration_hours(),
                    is_layover: s.is_layover,
                })
                .collect(),
        ),
        BlockKind::Hotel(h) => (
            format!("{} - {}", h.hotel_name, h.location),
            h.events
                .iter()
                .map(|e| LabelDetail::HotelEvent {
                    event: e.kind,
                    date: e.at.date_naive(),
                    hotel_name: e.hotel_name.clone(),
                })
                .collect(),
        ),
        BlockKind::Activity(a) => (
            block.title.clone(),
            vec![LabelDetail::Activity {
                category: a.category,
                location: a.location.clone(),
                duration_hours: block.timing.map(|t| t.duration_hours()),
            }],
        ),
        BlockKind::Generic => (block.title.clone(), Vec::new()),
    };
    BlockLabel {
        block_type: block.block_type(),
        title,
        dates: block.date_range().copied(),
        details,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedLabel {
    pub parent_label: BlockLabel,
    pub children_labels: Vec<BlockLabel>,
    pub relationship_type: RelationshipType,
    pub combined_title: String,
    /// Earliest start to latest end over every timed member.
    pub combined_dates: Option<DateRange>,
    pub combined_details: Vec<LabelDetail>,
}

pub fn combined_label(relationship: &Relationship) -> CombinedLabel {
    let parent_label = block_label(&relationship.parent);
    let children_labels: Vec<BlockLabel> = relationship.children.iter().map(block_label).collect();

    let combined_title = match relationship.relationship_type {
        RelationshipType::FlightHotel => format!("{} + Hotel Stay", parent_label.title),
        RelationshipType::HotelActivity | RelationshipType::FlightActivity => {
            format!("{} + Activities", parent_label.title)
        }
        RelationshipType::None => parent_label.title.clone(),
    };

    let all = std::iter::once(&parent_label).chain(children_labels.iter());
    let dates: Vec<DateRange> = all.clone().filter_map(|l| l.dates).collect();
    let combined_dates = match (
        dates.iter().map(|d| d.start).min(),
        dates.iter().map(|d| d.end).max(),
    ) {
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        _ => None,
    };
    let combined_details = all.flat_map(|l| l.details.iter().cloned()).collect();

    CombinedLabel {
        relationship_type: relationship.relationship_type,
        combined_title,
        combined_dates,
        combined_details,
        parent_label,
        children_labels,
    }
}

/// Sorted calendar days touched by any timed member of the group.
pub fn unique_days(relationship: &Relationship) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = std::iter::once(&relationship.parent)
        .chain(relationship.children.iter())
        .filter_map(|b| b.date_range())
        .flat_map(|r| r.days())
        .collect();
    days.sort();
    days.dedup();
    days
}

/// One cell of the day strip drawn above a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayIndicator {
    pub date: NaiveDate,
    /// `Dec 15`
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

/// Split the span `x .. x + width` evenly between the group's days, with the
/// strip sitting just above `y`. Single-day groups get no strip.
pub fn day_indicators(relationship: &Relationship, x: f64, y: f64, width: f64) -> Vec<DayIndicator> {
    let days = unique_days(relationship);
    if days.len() <= 1 {
        return Vec::new();
    }
    let day_width = width / days.len() as f64;
    let strip_y = y - DAY_INDICATOR_HEIGHT - DAY_INDICATOR_MARGIN;
    days.into_iter()
        .enumerate()
        .map(|(i, date)| DayIndicator {
            label: date.format("%b %-d").to_string(),
            date,
            x: x + i as f64 * day_width,
            y: strip_y,
            width: day_width,
        })
        .collect()
}

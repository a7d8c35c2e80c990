//! Constructors for flight, hotel and activity blocks.
//!
//! Builders take plain configuration values (airports, times, durations) and
//! produce a timed [`Block`] sized for the given timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    ActivityCategory, ActivityData, Block, BlockKind, FlightData, FlightSegment, HotelData, HotelEvent,
    HotelEventKind,
};
use crate::time::{DateRange, TimeError, TripTimeline};

pub const FLIGHT_HEIGHT: f64 = 280.0;
pub const HOTEL_HEIGHT: f64 = 110.0;
pub const ACTIVITY_HEIGHT: f64 = 50.0;

/// Duration assumed for a flight configured without segments.
const FALLBACK_FLIGHT_HOURS: f64 = 6.0;
/// A round trip only gets a layover segment when the stay exceeds this.
const MIN_LAYOVER_GAP_HOURS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("flight has no segments")]
    NoSegments,
    #[error(transparent)]
    Time(#[from] TimeError),
}

// ────────────────────────────────────────────────────────────────────────────
// Flights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlightTripType {
    OneWay,
    RoundTrip,
    MultiCity,
}

impl FlightTripType {
    pub fn title(self) -> &'static str {
        match self {
            FlightTripType::OneWay => "One-Way Flight",
            FlightTripType::RoundTrip => "Round Trip Flight",
            FlightTripType::MultiCity => "Multi-City Flight",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSegmentConfig {
    #[serde(default)]
    pub id: Option<String>,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: DateTime<Utc>,
    pub duration_hours: f64,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub is_layover: bool,
}

impl FlightSegmentConfig {
    pub fn new(
        departure_airport: impl Into<String>,
        arrival_airport: impl Into<String>,
        departure_time: DateTime<Utc>,
        duration_hours: f64,
    ) -> Self {
        Self {
            id: None,
            departure_airport: departure_airport.into(),
            arrival_airport: arrival_airport.into(),
            departure_time,
            duration_hours,
            flight_number: None,
            is_layover: false,
        }
    }

    pub fn layover(mut self) -> Self {
        self.is_layover = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightConfig {
    pub trip_type: FlightTripType,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_date: DateTime<Utc>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub segments: Vec<FlightSegmentConfig>,
}

/// Builds flight blocks placed at `x`/`y` on a given timeline.
#[derive(Debug, Clone)]
pub struct FlightBuilder<'t> {
    timeline: &'t TripTimeline,
    x: f64,
    y: f64,
}

impl<'t> FlightBuilder<'t> {
    pub fn new(timeline: &'t TripTimeline) -> Self {
        Self {
            timeline,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn from_config(&self, config: &FlightConfig) -> Result<Block, BuildError> {
        let segments = build_segments(config)?;
        let (first, last) = match (segments.first(), segments.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(BuildError::NoSegments),
        };
        let range = DateRange::new(first.departure_time, last.arrival_time)?;
        let data = FlightData {
            departure_airport: first.departure_airport.clone(),
            arrival_airport: last.arrival_airport.clone(),
            segments,
            context_bar_height: 24.0,
            segment_height: 80.0,
        };
        let width = range.duration_hours() * self.timeline.scale;
        Ok(Block::new(
            BlockKind::Flight(data),
            config.trip_type.title(),
            self.x,
            self.y,
            width,
            FLIGHT_HEIGHT,
        )
        .timed(range, self.timeline.start_date)
        .colored("#3b82f6"))
    }

    pub fn one_way(
        &self,
        departure_airport: &str,
        arrival_airport: &str,
        departure: DateTime<Utc>,
        duration_hours: f64,
    ) -> Result<Block, BuildError> {
        self.from_config(&FlightConfig {
            trip_type: FlightTripType::OneWay,
            departure_airport: departure_airport.to_string(),
            arrival_airport: arrival_airport.to_string(),
            departure_date: departure,
            return_date: None,
            segments: vec![FlightSegmentConfig::new(
                departure_airport,
                arrival_airport,
                departure,
                duration_hours,
            )],
        })
    }

    /// Outbound and return legs. The stay in between becomes a layover
    /// segment when it is longer than two hours.
    pub fn round_trip(
        &self,
        departure_airport: &str,
        arrival_airport: &str,
        departure: DateTime<Utc>,
        return_departure: DateTime<Utc>,
        outbound_hours: f64,
        return_hours: f64,
    ) -> Result<Block, BuildError> {
        let outbound = FlightSegmentConfig::new(departure_airport, arrival_airport, departure, outbound_hours);
        let outbound_arrival = DateRange::from_start_and_hours(departure, outbound_hours)?.end;
        let gap_hours = crate::time::duration_hours(outbound_arrival, return_departure);

        let mut segments = vec![outbound];
        if gap_hours > MIN_LAYOVER_GAP_HOURS {
            segments.push(
                FlightSegmentConfig::new(arrival_airport, arrival_airport, outbound_arrival, gap_hours).layover(),
            );
        }
        segments.push(FlightSegmentConfig::new(
            arrival_airport,
            departure_airport,
            return_departure,
            return_hours,
        ));

        self.from_config(&FlightConfig {
            trip_type: FlightTripType::RoundTrip,
            departure_airport: departure_airport.to_string(),
            arrival_airport: arrival_airport.to_string(),
            departure_date: departure,
            return_date: Some(return_departure),
            segments,
        })
    }

    pub fn multi_city(&self, segments: Vec<FlightSegmentConfig>) -> Result<Block, BuildError> {
        let (first, last) = match (segments.first(), segments.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(BuildError::NoSegments),
        };
        let config = FlightConfig {
            trip_type: FlightTripType::MultiCity,
            departure_airport: first.departure_airport.clone(),
            arrival_airport: last.arrival_airport.clone(),
            departure_date: first.departure_time,
            return_date: None,
            segments: Vec::new(),
        };
        self.from_config(&FlightConfig { segments, ..config })
    }
}

fn build_segments(config: &FlightConfig) -> Result<Vec<FlightSegment>, BuildError> {
    if config.segments.is_empty() {
        let range = DateRange::from_start_and_hours(config.departure_date, FALLBACK_FLIGHT_HOURS)?;
        return Ok(vec![FlightSegment {
            id: "segment-0".to_string(),
            departure_airport: config.departure_airport.clone(),
            arrival_airport: config.arrival_airport.clone(),
            departure_time: range.start,
            arrival_time: range.end,
            flight_number: None,
            is_layover: false,
        }]);
    }
    config
        .segments
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let range = DateRange::from_start_and_hours(s.departure_time, s.duration_hours)?;
            Ok(FlightSegment {
                id: s.id.clone().unwrap_or_else(|| format!("segment-{}", i)),
                departure_airport: s.departure_airport.clone(),
                arrival_airport: s.arrival_airport.clone(),
                departure_time: range.start,
                arrival_time: range.end,
                flight_number: s.flight_number.clone(),
                is_layover: s.is_layover,
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Hotels
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelConfig {
    pub name: String,
    pub location: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub guests: Option<u32>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl HotelConfig {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            check_in,
            check_out,
            room_type: None,
            guests: None,
            amenities: Vec::new(),
        }
    }

    pub fn build(&self, timeline: &TripTimeline, x: f64, y: f64) -> Result<Block, BuildError> {
        let range = DateRange::new(self.check_in, self.check_out)?;
        let event = |kind: HotelEventKind, at: DateTime<Utc>| HotelEvent {
            id: match kind {
                HotelEventKind::CheckIn => "checkin".to_string(),
                HotelEventKind::CheckOut => "checkout".to_string(),
            },
            kind,
            at,
            hotel_name: self.name.clone(),
        };
        let data = HotelData {
            hotel_name: self.name.clone(),
            location: self.location.clone(),
            events: vec![
                event(HotelEventKind::CheckIn, self.check_in),
                event(HotelEventKind::CheckOut, self.check_out),
            ],
            context_bar_height: 20.0,
            event_height: 28.0,
        };
        let width = range.duration_hours() * timeline.scale;
        Ok(Block::new(BlockKind::Hotel(data), self.name.clone(), x, y, width, HOTEL_HEIGHT)
            .timed(range, timeline.start_date)
            .colored("#10b981"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Activities
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub name: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub category: ActivityCategory,
    #[serde(default)]
    pub description: Option<String>,
}

impl ActivityConfig {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category: ActivityCategory,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            start,
            end,
            category,
            description: None,
        }
    }

    pub fn build(&self, timeline: &TripTimeline, x: f64, y: f64) -> Result<Block, BuildError> {
        let range = DateRange::new(self.start, self.end)?;
        let data = ActivityData {
            category: self.category,
            location: self.location.clone(),
        };
        let width = range.duration_hours() * timeline.scale;
        Ok(Block::new(BlockKind::Activity(data), self.name.clone(), x, y, width, ACTIVITY_HEIGHT)
            .timed(range, timeline.start_date)
            .colored("#f59e0b"))
    }
}

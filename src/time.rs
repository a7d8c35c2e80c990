//! Hour-based time arithmetic.
//!
//! All temporal values on the canvas are measured in hours relative to the
//! trip start. Pixel positions are `hours * pixels_per_hour`; nothing here
//! clamps, so a non-positive duration produces a non-positive width and it is
//! up to the caller to only render meaningful ranges.

use chrono::{DateTime, Days, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixels per hour used when a timeline is created or its zoom is reset.
pub const DEFAULT_PIXELS_PER_HOUR: f64 = 50.0;
/// Multiplier applied by a single zoom step.
pub const ZOOM_FACTOR: f64 = 1.2;

const MILLIS_PER_HOUR: f64 = 3.6e6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeError {
    #[error("invalid date range: end {end} is not after start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("pixels per hour must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("a duration of {0} hours is out of range")]
    DurationOutOfRange(f64),
}

/// Signed number of hours from `start` to `end`.
pub fn duration_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Offset of `date` from the trip start in hours. Negative before the trip.
pub fn hours_from_trip_start(date: DateTime<Utc>, trip_start: DateTime<Utc>) -> f64 {
    duration_hours(trip_start, date)
}

/// Horizontal extent of a timed block on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockPosition {
    pub start_hour: f64,
    pub duration_hours: f64,
    pub x: f64,
    pub width: f64,
}

pub fn position_from_hours(start_hour: f64, duration_hours: f64, pixels_per_hour: f64) -> BlockPosition {
    BlockPosition {
        start_hour,
        duration_hours,
        x: start_hour * pixels_per_hour,
        width: duration_hours * pixels_per_hour,
    }
}

pub fn hours_from_position(x: f64, pixels_per_hour: f64) -> f64 {
    x / pixels_per_hour
}

/// Human-readable duration: `45m`, `2.5h`, `3d`, `3d 4h`.
pub fn format_duration(hours: f64) -> String {
    if hours < 1.0 {
        format!("{}m", (hours * 60.0).round())
    } else if hours < 24.0 {
        format!("{}h", (hours * 10.0).round() / 10.0)
    } else {
        let days = (hours / 24.0).floor();
        let remaining = hours % 24.0;
        if remaining == 0.0 {
            format!("{}d", days)
        } else {
            format!("{}d {}h", days, remaining.round())
        }
    }
}

/// A closed time interval. The duration is always derived from the two
/// endpoints so it can never disagree with them.
///
/// Deserialization goes through the same checks as the constructors: equal
/// endpoints load as an instant, a reversed range is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Build a range, requiring `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeError> {
        if end <= start {
            return Err(TimeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A zero-length range marking a single point in time (check-in,
    /// check-out). Zero-length ranges never overlap a range they only touch.
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// Range starting at `start` and lasting `hours`.
    pub fn from_start_and_hours(start: DateTime<Utc>, hours: f64) -> Result<Self, TimeError> {
        let millis = (hours * MILLIS_PER_HOUR).round();
        // i64::MAX is not exactly representable; stay strictly below 2^63.
        if !millis.is_finite() || millis.abs() >= 9.2e18 {
            return Err(TimeError::DurationOutOfRange(hours));
        }
        let end = TimeDelta::try_milliseconds(millis as i64)
            .and_then(|delta| start.checked_add_signed(delta))
            .ok_or(TimeError::DurationOutOfRange(hours))?;
        Self::new(start, end)
    }

    pub fn duration_hours(&self) -> f64 {
        duration_hours(self.start, self.end)
    }

    pub fn contains(&self, other: &DateRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Calendar days (UTC) touched by this range, in order, both ends included.
    pub fn days(&self) -> Vec<NaiveDate> {
        let last = self.end.date_naive();
        let mut day = self.start.date_naive();
        let mut out = vec![day];
        while day < last {
            match day.checked_add_days(Days::new(1)) {
                Some(next) => {
                    day = next;
                    out.push(day);
                }
                None => break,
            }
        }
        out
    }
}

#[derive(Deserialize)]
struct RawDateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = TimeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        if raw.start == raw.end {
            Ok(DateRange::instant(raw.start))
        } else {
            DateRange::new(raw.start, raw.end)
        }
    }
}

/// The global time-to-pixel mapping for one planning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeline")]
pub struct TripTimeline {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Pixels per hour.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    DEFAULT_PIXELS_PER_HOUR
}

#[derive(Deserialize)]
struct RawTimeline {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    #[serde(default = "default_scale")]
    scale: f64,
}

impl TryFrom<RawTimeline> for TripTimeline {
    type Error = TimeError;

    fn try_from(raw: RawTimeline) -> Result<Self, Self::Error> {
        TripTimeline::new(raw.start_date, raw.end_date)?.with_scale(raw.scale)
    }
}

impl TripTimeline {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<Self, TimeError> {
        if end_date <= start_date {
            return Err(TimeError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            scale: DEFAULT_PIXELS_PER_HOUR,
        })
    }

    pub fn with_scale(mut self, scale: f64) -> Result<Self, TimeError> {
        self.set_scale(scale)?;
        Ok(self)
    }

    pub fn total_hours(&self) -> f64 {
        duration_hours(self.start_date, self.end_date)
    }

    pub fn pixels_per_minute(&self) -> f64 {
        self.scale / 60.0
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<(), TimeError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TimeError::InvalidScale(scale));
        }
        self.scale = scale;
        Ok(())
    }

    pub fn zoom_in(&mut self) {
        self.scale *= ZOOM_FACTOR;
    }

    pub fn zoom_out(&mut self) {
        self.scale /= ZOOM_FACTOR;
    }

    pub fn reset_zoom(&mut self) {
        self.scale = DEFAULT_PIXELS_PER_HOUR;
    }

    pub fn hours_from_start(&self, date: DateTime<Utc>) -> f64 {
        hours_from_trip_start(date, self.start_date)
    }

    /// Canvas extent of `range` at the current scale.
    pub fn position_of(&self, range: &DateRange) -> BlockPosition {
        position_from_hours(
            self.hours_from_start(range.start),
            range.duration_hours(),
            self.scale,
        )
    }
}

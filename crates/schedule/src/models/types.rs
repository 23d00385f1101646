//! Core data types and enums for cleaning schedules.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use geo::Point;
use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Weekday on which a cleaning occurrence recurs.
///
/// The Florence open data publishes Italian two-letter codes (`LU` … `DO`);
/// English three-letter codes are accepted as well so override files can be
/// written either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayCode {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayCode {
    pub const ALL: [DayCode; 7] = [
        DayCode::Mon,
        DayCode::Tue,
        DayCode::Wed,
        DayCode::Thu,
        DayCode::Fri,
        DayCode::Sat,
        DayCode::Sun,
    ];

    pub fn from_source(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "LU" | "MON" => Some(Self::Mon),
            "MA" | "TUE" => Some(Self::Tue),
            "ME" | "WED" => Some(Self::Wed),
            "GI" | "THU" => Some(Self::Thu),
            "VE" | "FRI" => Some(Self::Fri),
            "SA" | "SAT" => Some(Self::Sat),
            "DO" | "SUN" => Some(Self::Sun),
            _ => None,
        }
    }

    /// Code as published in the source dataset
    pub fn source_code(self) -> &'static str {
        match self {
            Self::Mon => "LU",
            Self::Tue => "MA",
            Self::Wed => "ME",
            Self::Thu => "GI",
            Self::Fri => "VE",
            Self::Sat => "SA",
            Self::Sun => "DO",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "MON",
            Self::Tue => "TUE",
            Self::Wed => "WED",
            Self::Thu => "THU",
            Self::Fri => "FRI",
            Self::Sat => "SAT",
            Self::Sun => "SUN",
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Self::Mon => Weekday::Mon,
            Self::Tue => Weekday::Tue,
            Self::Wed => Weekday::Wed,
            Self::Thu => Weekday::Thu,
            Self::Fri => Weekday::Fri,
            Self::Sat => Weekday::Sat,
            Self::Sun => Weekday::Sun,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayCode {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_source(s).ok_or_else(|| ScheduleError::Parse(format!("unknown day code {s:?}")))
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A reported position in WGS84 degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// geo uses x = longitude, y = latitude
    pub fn to_point(self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<Point> for GeoPosition {
    fn from(point: Point) -> Self {
        Self::new(point.y(), point.x())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unreadable schedule payload: {0}")]
    ParseFatal(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

//! Location history loading.
//!
//! A location history export is a JSON object with a `locations` array. Each
//! entry stores its coordinates as E7 integers (degrees × 10^7) and its time
//! either as `timestampMs` (milliseconds since the epoch, string or number) or,
//! in newer exports, as an RFC 3339 `timestamp` string. Other keys (accuracy,
//! activity, ...) are ignored.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A parsed location history export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationHistory {
    /// Records in file order.
    pub locations: Vec<LocationRecord>,
}

/// One recorded location event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct LocationRecord {
    /// Latitude in degrees × 10^7 (`latitudeE7`).
    pub latitude_e7: i64,
    /// Longitude in degrees × 10^7 (`longitudeE7`).
    pub longitude_e7: i64,
    /// When the location was recorded.
    pub timestamp: Timestamp,
}

/// The time of a record as found in the export.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    /// `timestampMs`: milliseconds since the Unix epoch.
    EpochMillis(EpochMillis),
    /// `timestamp`: an RFC 3339 date-time.
    Rfc3339(String),
}

/// Milliseconds since the epoch, stored either as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EpochMillis {
    /// A JSON integer.
    Number(i64),
    /// A JSON number with a fraction or exponent, e.g. `1420070400000.0`.
    Float(f64),
    /// A JSON string holding a number.
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(rename = "latitudeE7")]
    latitude_e7: i64,
    #[serde(rename = "longitudeE7")]
    longitude_e7: i64,
    timestamp_ms: Option<EpochMillis>,
    timestamp: Option<String>,
}

impl TryFrom<RawRecord> for LocationRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, Self::Error> {
        let timestamp = match (raw.timestamp_ms, raw.timestamp) {
            (Some(ms), _) => Timestamp::EpochMillis(ms),
            (None, Some(text)) => Timestamp::Rfc3339(text),
            (None, None) => return Err("missing field `timestampMs`".to_string()),
        };
        Ok(Self {
            latitude_e7: raw.latitude_e7,
            longitude_e7: raw.longitude_e7,
            timestamp,
        })
    }
}

impl Timestamp {
    /// Convert to a UTC instant.
    ///
    /// Returns `None` if the value is not a number or date-time, or lies
    /// outside the representable range.
    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::EpochMillis(ms) => DateTime::from_timestamp_millis(ms.millis()?),
            Self::Rfc3339(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EpochMillis(EpochMillis::Number(ms)) => write!(f, "{ms}"),
            Self::EpochMillis(EpochMillis::Float(ms)) => write!(f, "{ms}"),
            Self::EpochMillis(EpochMillis::Text(text)) | Self::Rfc3339(text) => {
                write!(f, "{text}")
            }
        }
    }
}

impl EpochMillis {
    /// The value in whole milliseconds.
    ///
    /// Fractional values such as `1420070400000.5` or `"1420070400000.5"`
    /// are floored.
    #[must_use]
    pub fn millis(&self) -> Option<i64> {
        match self {
            Self::Number(ms) => Some(*ms),
            Self::Float(ms) => floor_millis(*ms),
            Self::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(floor_millis))
            }
        }
    }
}

fn floor_millis(ms: f64) -> Option<i64> {
    (ms.is_finite() && ms.abs() < 9.0e18).then(|| ms.floor() as i64)
}

impl LocationHistory {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Check if the history holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Load a location history export from `path`.
///
/// # Errors
///
/// Returns [`Error::InputOpen`] if the file cannot be opened and
/// [`Error::InputParse`] if it is not valid JSON, has no `locations` array, or
/// any record lacks a required key. No records are returned on failure.
pub fn load_history(path: impl AsRef<Path>) -> Result<LocationHistory> {
    let path = path.as_ref();
    debug!("Reading location history from {}", path.display());

    let file = File::open(path).map_err(|source| Error::InputOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let history: LocationHistory = serde_json::from_reader(BufReader::new(file)).map_err(
        |source| {
            if source.is_io() {
                Error::InputOpen {
                    path: path.to_path_buf(),
                    source: source.into(),
                }
            } else {
                Error::InputParse {
                    path: path.to_path_buf(),
                    source,
                }
            }
        },
    )?;

    info!("Loaded {} data points", history.len());
    Ok(history)
}

/// Parse a location history export held in memory.
///
/// # Errors
///
/// Returns [`Error::Json`] if the document is not a valid export.
pub fn parse_history(json: &str) -> Result<LocationHistory> {
    Ok(serde_json::from_str(json)?)
}

//! Conversion of raw records into plottable points.

use std::fmt;

use chrono::{Datelike, Local, TimeZone};

use crate::error::{Error, Result};
use crate::history::LocationRecord;

/// Divisor turning E7 integers into degrees.
pub const E7_SCALE: f64 = 10_000_000.0;

/// Format of [`NormalizedPoint::datetime`].
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Last year [`DATETIME_FORMAT`] renders with four digits.
const MAX_YEAR: i32 = 9999;

/// A record converted to degrees and a formatted local time.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Record time as `YYYY-MM-DD HH:MM:SS`.
    pub datetime: String,
}

/// First and last year observed in a set of points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearRange {
    /// Year of the earliest record.
    pub start: String,
    /// Year of the latest record.
    pub end: String,
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl YearRange {
    /// Derive the range from formatted date-times.
    ///
    /// Returns `None` when there are no points.
    #[must_use]
    pub fn from_points(points: &[NormalizedPoint]) -> Option<Self> {
        let min = points.iter().map(|p| p.datetime.as_str()).min()?;
        let max = points.iter().map(|p| p.datetime.as_str()).max()?;
        Some(Self {
            start: year_of(min).to_string(),
            end: year_of(max).to_string(),
        })
    }
}

fn year_of(datetime: &str) -> &str {
    datetime.get(..4).unwrap_or(datetime)
}

/// The output of the normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// One point per input record, in input order.
    pub points: Vec<NormalizedPoint>,
    /// Years spanned by the points; `None` for an empty history.
    pub year_range: Option<YearRange>,
}

impl Normalized {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Normalize records using the system's local time zone.
///
/// # Errors
///
/// Returns [`Error::Timestamp`] for the first record whose timestamp cannot be
/// converted; nothing is returned for the other records.
pub fn normalize(records: &[LocationRecord]) -> Result<Normalized> {
    normalize_in(records, &Local)
}

/// Normalize records, formatting times in `tz`.
///
/// # Errors
///
/// Returns [`Error::Timestamp`] for the first record whose timestamp cannot be
/// converted.
pub fn normalize_in<Tz>(records: &[LocationRecord], tz: &Tz) -> Result<Normalized>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let points = records
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record, tz))
        .collect::<Result<Vec<_>>>()?;

    let year_range = YearRange::from_points(&points);
    Ok(Normalized { points, year_range })
}

fn normalize_record<Tz>(index: usize, record: &LocationRecord, tz: &Tz) -> Result<NormalizedPoint>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let invalid = || Error::Timestamp {
        index,
        value: record.timestamp.to_string(),
    };
    let local = record.timestamp.to_utc().ok_or_else(invalid)?.with_timezone(tz);
    if !(0..=MAX_YEAR).contains(&local.year()) {
        return Err(invalid());
    }

    Ok(NormalizedPoint {
        lat: record.latitude_e7 as f64 / E7_SCALE,
        lon: record.longitude_e7 as f64 / E7_SCALE,
        datetime: local.format(DATETIME_FORMAT).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{EpochMillis, Timestamp};
    use chrono::{FixedOffset, NaiveDateTime, Utc};

    fn record(lat_e7: i64, lon_e7: i64, ms: &str) -> LocationRecord {
        LocationRecord {
            latitude_e7: lat_e7,
            longitude_e7: lon_e7,
            timestamp: Timestamp::EpochMillis(EpochMillis::Text(ms.to_string())),
        }
    }

    #[test]
    fn test_coordinates_divided_by_e7() {
        let records = vec![
            record(522_053_000, 1_218_000, "1420070400000"),
            record(-338_688_000, -1_512_093_000, "1420070400000"),
        ];
        let normalized = normalize_in(&records, &Utc).unwrap();

        for (point, raw) in normalized.points.iter().zip(&records) {
            assert!((point.lat - raw.latitude_e7 as f64 / 1e7).abs() < 1e-12);
            assert!((point.lon - raw.longitude_e7 as f64 / 1e7).abs() < 1e-12);
        }
        assert!((normalized.points[0].lat - 52.2053).abs() < 1e-9);
        assert!((normalized.points[1].lon + 151.2093).abs() < 1e-9);
    }

    #[test]
    fn test_datetime_format_in_utc() {
        let normalized = normalize_in(&[record(0, 0, "1420070400000")], &Utc).unwrap();
        assert_eq!(normalized.points[0].datetime, "2015-01-01 00:00:00");
    }

    #[test]
    fn test_datetime_truncates_milliseconds() {
        let normalized = normalize_in(&[record(0, 0, "1420070401999")], &Utc).unwrap();
        assert_eq!(normalized.points[0].datetime, "2015-01-01 00:00:01");
    }

    #[test]
    fn test_datetime_uses_time_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let normalized = normalize_in(&[record(0, 0, "1420070400000")], &tz).unwrap();
        assert_eq!(normalized.points[0].datetime, "2015-01-01 02:00:00");
    }

    #[test]
    fn test_local_datetime_matches_pattern() {
        let records = vec![
            record(0, 0, "0"),
            record(0, 0, "1420070400000"),
            record(0, 0, "1700000000123"),
        ];
        let normalized = normalize(&records).unwrap();

        for point in &normalized.points {
            assert_eq!(point.datetime.len(), 19);
            assert!(NaiveDateTime::parse_from_str(&point.datetime, DATETIME_FORMAT).is_ok());
        }
    }

    #[test]
    fn test_year_range_spans_min_and_max() {
        let records = vec![
            record(0, 0, "1483228800000"), // 2017-01-01
            record(0, 0, "1420070400000"), // 2015-01-01
            record(0, 0, "1546300800000"), // 2019-01-01
        ];
        let normalized = normalize_in(&records, &Utc).unwrap();
        let range = normalized.year_range.unwrap();

        assert_eq!(range.start, "2015");
        assert_eq!(range.end, "2019");
        assert!(range.start <= range.end);
        assert_eq!(range.to_string(), "2015-2019");
    }

    #[test]
    fn test_year_range_matches_datetime_prefixes() {
        let records = vec![record(0, 0, "1262304000000"), record(0, 0, "1262390400000")];
        let normalized = normalize(&records).unwrap();
        let range = normalized.year_range.clone().unwrap();

        let min = normalized.points.iter().map(|p| &p.datetime).min().unwrap();
        let max = normalized.points.iter().map(|p| &p.datetime).max().unwrap();
        assert_eq!(range.start, min[..4]);
        assert_eq!(range.end, max[..4]);
    }

    #[test]
    fn test_empty_input() {
        let normalized = normalize(&[]).unwrap();
        assert!(normalized.is_empty());
        assert!(normalized.year_range.is_none());
    }

    #[test]
    fn test_invalid_timestamp_aborts() {
        let records = vec![
            record(0, 0, "1420070400000"),
            record(0, 0, "not-a-time"),
            record(0, 0, "1420070400000"),
        ];
        let err = normalize_in(&records, &Utc).unwrap_err();
        match err {
            Error::Timestamp { index, value } => {
                assert_eq!(index, 1);
                assert_eq!(value, "not-a-time");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timestamp_past_year_9999_aborts() {
        // 10000-01-01T00:00:00Z
        let records = vec![record(0, 0, "1420070400000"), record(0, 0, "253402300800000")];
        let err = normalize_in(&records, &Utc).unwrap_err();
        assert!(matches!(err, Error::Timestamp { index: 1, .. }));

        let last = normalize_in(&[record(0, 0, "253402300799000")], &Utc).unwrap();
        assert_eq!(last.points[0].datetime, "9999-12-31 23:59:59");
        assert_eq!(last.year_range.unwrap().to_string(), "9999-9999");
    }

    #[test]
    fn test_timestamp_before_year_zero_aborts() {
        let err = normalize_in(&[record(0, 0, "-62198755200000")], &Utc).unwrap_err();
        assert!(matches!(err, Error::Timestamp { index: 0, .. }));
    }

    #[test]
    fn test_out_of_range_coordinates_pass_through() {
        let normalized = normalize_in(&[record(1_000_000_000, 0, "0")], &Utc).unwrap();
        assert!((normalized.points[0].lat - 100.0).abs() < 1e-12);
    }
}

use std::fmt::{Display, Formatter};

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::catalog::{midnight, Record};
use crate::error::Error;

/// Width of the temporal window given to each layer unless configured otherwise.
pub const DEFAULT_WINDOW_DAYS: u32 = 10;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct TemporalRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TemporalRange {
    /// A window of `days` starting at midnight of the calendar day of `timestamp`. Fails with
    /// [Error::WindowOverflow] if the end falls outside the representable dates.
    pub fn fixed_window(timestamp: NaiveDateTime, days: u32) -> Result<Self> {
        let start = midnight(timestamp.date());
        let end = start
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| Error::WindowOverflow {
                start: start.to_string(),
                days,
            })?;
        Ok(Self { start, end })
    }

    /// [TemporalRange::fixed_window] for the timestamp held in `field` of `record`.
    pub fn for_record(record: &Record, field: &str, days: u32) -> Result<Self> {
        let value = record
            .field(field)
            .filter(|value| !value.is_null())
            .ok_or_else(|| Error::MissingField {
                field: field.to_string(),
                path: record.file_path.clone(),
            })?;
        let timestamp = value.as_datetime().ok_or_else(|| Error::NotATimestamp {
            field: field.to_string(),
            value: value.to_string(),
            path: record.file_path.clone(),
        })?;
        Self::fixed_window(timestamp, days)
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

impl Display for TemporalRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%dT%H:%M:%S"),
            self.end.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::error::Error;
    use crate::temporal::{TemporalRange, DEFAULT_WINDOW_DAYS};
    use crate::test_util::record;

    fn datetime(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn ten_day_window_from_date() -> Result<()> {
        let record = record("a.tif", &[("datetime_1", "2021-06-15")]);
        let range = TemporalRange::for_record(&record, "datetime_1", DEFAULT_WINDOW_DAYS)?;
        assert_eq!(range.start, datetime(2021, 6, 15, 0));
        assert_eq!(range.end, datetime(2021, 6, 25, 0));
        assert_eq!(
            range.to_string(),
            "2021-06-15T00:00:00 .. 2021-06-25T00:00:00"
        );
        Ok(())
    }

    #[test]
    fn start_is_truncated_to_day() -> Result<()> {
        let range = TemporalRange::fixed_window(datetime(2021, 6, 15, 17), 10)?;
        assert_eq!(range.start, datetime(2021, 6, 15, 0));
        assert_eq!(range.end, datetime(2021, 6, 25, 0));
        Ok(())
    }

    #[test]
    fn window_width_is_configurable() -> Result<()> {
        let range = TemporalRange::fixed_window(datetime(2021, 12, 30, 0), 3)?;
        assert_eq!(range.end, datetime(2022, 1, 2, 0));
        Ok(())
    }

    #[test]
    fn half_open() -> Result<()> {
        let range = TemporalRange::fixed_window(datetime(2021, 6, 15, 0), 10)?;
        assert!(range.contains(datetime(2021, 6, 15, 0)));
        assert!(range.contains(datetime(2021, 6, 24, 23)));
        assert!(!range.contains(datetime(2021, 6, 25, 0)));
        Ok(())
    }

    #[test]
    fn oversized_window_errors() {
        let err = TemporalRange::fixed_window(datetime(2021, 6, 15, 0), u32::MAX).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::WindowOverflow {
                start: "2021-06-15 00:00:00".to_string(),
                days: u32::MAX,
            })
        );
        let record = record("a.tif", &[("datetime_1", "2021-06-15")]);
        assert!(TemporalRange::for_record(&record, "datetime_1", u32::MAX).is_err());
    }

    #[test]
    fn missing_or_invalid_field_errors() {
        let record = record("a.tif", &[("datetime_1", "V1M0")]);
        let err = TemporalRange::for_record(&record, "datetime_1", 10).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotATimestamp { .. })
        ));
        let err = TemporalRange::for_record(&record, "datetime_2", 10).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingField { .. })
        ));
    }
}

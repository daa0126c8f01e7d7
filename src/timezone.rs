//! Conversion of caller-supplied calendar dates into absolute UTC instants.

use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, macros::time};
use time_tz::{Offset, TimeZone, timezones};

use crate::Error;

/// Which end of the day a calendar date should resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    /// The first instant of the day, 00:00:00.000 local time.
    Start,
    /// The last instant of the day, 23:59:59.999999 local time.
    End,
}

const END_OF_DAY: Time = time!(23:59:59.999999);

/// Convert a calendar date in the zone named by `timezone` to a UTC instant,
/// anchored to the start or end of that day.
///
/// The zone's offset is resolved at the requested date, so dates on either
/// side of a daylight saving transition convert with the offset in effect
/// on that day rather than the offset in effect now.
///
/// # Errors
/// Returns [Error::InvalidTimezone] if `timezone` is not a canonical IANA
/// timezone name, e.g. "Europe/Sofia".
pub fn date_to_utc(
    date: Date,
    boundary: DayBoundary,
    timezone: &str,
) -> Result<OffsetDateTime, Error> {
    let tz = timezones::get_by_name(timezone)
        .ok_or_else(|| Error::InvalidTimezone(timezone.to_owned()))?;

    let local_time = match boundary {
        DayBoundary::Start => Time::MIDNIGHT,
        DayBoundary::End => END_OF_DAY,
    };
    let naive = PrimitiveDateTime::new(date, local_time);

    // The offset depends on the instant and the instant on the offset, so
    // start from the offset the zone has at the naive date read as UTC and
    // refine once. Transitions happen in the small hours, far enough from
    // both day boundaries that one refinement settles the result.
    let first_guess = tz.get_offset_utc(&naive.assume_utc()).to_utc();
    let refined = tz.get_offset_utc(&naive.assume_offset(first_guess)).to_utc();

    Ok(naive.assume_offset(refined).to_offset(UtcOffset::UTC))
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::{DayBoundary, date_to_utc};
    use crate::Error;

    #[test]
    fn start_of_day_converts_with_positive_offset() {
        // Europe/Sofia is UTC+3 in September (EEST).
        let got = date_to_utc(date!(2024 - 09 - 01), DayBoundary::Start, "Europe/Sofia").unwrap();

        assert_eq!(got, datetime!(2024 - 08 - 31 21:00:00 UTC));
    }

    #[test]
    fn end_of_day_converts_with_positive_offset() {
        let got = date_to_utc(date!(2024 - 09 - 01), DayBoundary::End, "Europe/Sofia").unwrap();

        assert_eq!(got, datetime!(2024 - 09 - 01 20:59:59.999999 UTC));
    }

    #[test]
    fn start_of_day_converts_with_negative_offset() {
        // America/Los_Angeles is UTC-7 in September (PDT).
        let got = date_to_utc(
            date!(2024 - 09 - 01),
            DayBoundary::Start,
            "America/Los_Angeles",
        )
        .unwrap();

        assert_eq!(got, datetime!(2024 - 09 - 01 07:00:00 UTC));
    }

    #[test]
    fn end_of_day_converts_with_negative_offset() {
        let got = date_to_utc(
            date!(2024 - 09 - 01),
            DayBoundary::End,
            "America/Los_Angeles",
        )
        .unwrap();

        assert_eq!(got, datetime!(2024 - 09 - 02 06:59:59.999999 UTC));
    }

    #[test]
    fn offset_follows_daylight_saving_at_the_queried_date() {
        // Sofia is UTC+2 in January (EET), not the +3 it has in summer.
        let got = date_to_utc(date!(2024 - 01 - 15), DayBoundary::Start, "Europe/Sofia").unwrap();

        assert_eq!(got, datetime!(2024 - 01 - 14 22:00:00 UTC));
    }

    #[test]
    fn utc_zone_is_identity() {
        let got = date_to_utc(date!(2024 - 09 - 01), DayBoundary::Start, "Etc/UTC").unwrap();

        assert_eq!(got, datetime!(2024 - 09 - 01 00:00:00 UTC));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let got = date_to_utc(date!(2024 - 09 - 01), DayBoundary::Start, "Mars/Olympus");

        assert_eq!(
            got,
            Err(Error::InvalidTimezone("Mars/Olympus".to_owned()))
        );
    }
}

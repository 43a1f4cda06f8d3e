use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date time in the given canonical timezone, falling back to UTC
/// when the timezone string is not recognised.
pub fn now_local(canonical_timezone: &str) -> OffsetDateTime {
    let offset = get_local_offset(canonical_timezone).unwrap_or(UtcOffset::UTC);

    OffsetDateTime::now_utc().to_offset(offset)
}

#[cfg(test)]
mod timezone_tests {
    use super::{get_local_offset, now_local};

    #[test]
    fn resolves_canonical_timezone() {
        assert!(get_local_offset("Pacific/Auckland").is_some());
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert!(get_local_offset("Not/AZone").is_none());
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let now = now_local("Not/AZone");

        assert!(now.offset().is_utc());
    }
}

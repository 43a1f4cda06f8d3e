//! Reporting periods and date bucketing.
//!
//! Everything in this module is pure: given the same transactions, grain and
//! reference date the output is always the same, and nothing here touches the
//! database.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

use crate::Error;

/// The reporting granularity used to bucket a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grain {
    /// The Sunday through Saturday week containing the reference date.
    Week,
    /// The calendar month containing the reference date.
    Month,
    /// The calendar year containing the reference date.
    Year,
}

/// How often a recurring obligation falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Due every 7 days.
    Weekly,
    /// Due once a calendar month.
    Monthly,
    /// Due once a year.
    Yearly,
}

impl Frequency {
    /// The database representation of the frequency.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parse a frequency from its database representation.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::InvalidFrequency(other.to_owned())),
        }
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// The first day of the range.
    pub start: Date,
    /// The last day of the range.
    pub end: Date,
}

/// The date range covered by `grain` around `reference`.
///
/// Weeks run Sunday through Saturday, months cover the first through the last
/// calendar day, and years cover Jan 1 through Dec 31. Both bounds are
/// inclusive.
pub fn date_range_for_grain(grain: Grain, reference: Date) -> DateRange {
    match grain {
        Grain::Week => {
            let start =
                reference - Duration::days(reference.weekday().number_days_from_sunday() as i64);

            DateRange {
                start,
                end: start + Duration::days(6),
            }
        }
        Grain::Month => {
            let start = reference.replace_day(1).unwrap();

            DateRange {
                start,
                end: start
                    .replace_day(reference.month().length(reference.year()))
                    .unwrap(),
            }
        }
        Grain::Year => DateRange {
            start: Date::from_calendar_date(reference.year(), Month::January, 1).unwrap(),
            end: Date::from_calendar_date(reference.year(), Month::December, 31).unwrap(),
        },
    }
}

/// The range exactly one period before the one containing `reference`.
///
/// The previous period keeps calendar semantics, so the previous month may
/// have more or fewer days than the current one.
pub fn previous_period_range(grain: Grain, reference: Date) -> DateRange {
    let current = date_range_for_grain(grain, reference);

    match grain {
        Grain::Week => DateRange {
            start: current.start - Duration::days(7),
            end: current.start - Duration::days(1),
        },
        Grain::Month => {
            let last_of_previous = current.start - Duration::days(1);

            date_range_for_grain(Grain::Month, last_of_previous)
        }
        Grain::Year => DateRange {
            start: Date::from_calendar_date(reference.year() - 1, Month::January, 1).unwrap(),
            end: Date::from_calendar_date(reference.year() - 1, Month::December, 31).unwrap(),
        },
    }
}

/// Add `months` calendar months to `date`, clamping the day to the length of
/// the target month (e.g. Jan 31 + 1 month = Feb 28).
pub fn add_months(date: Date, months: i32) -> Date {
    let zero_based = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = zero_based.div_euclid(12);
    let month = Month::try_from((zero_based.rem_euclid(12) + 1) as u8).unwrap();
    let day = date.day().min(month.length(year));

    Date::from_calendar_date(year, month, day).unwrap()
}

/// The next time a recurring obligation falls due after `from`.
///
/// Weekly adds 7 days; monthly and yearly are calendar-aware, clamping the
/// day so the schedule never skips a month.
pub fn next_due_date(frequency: Frequency, from: Date) -> Date {
    match frequency {
        Frequency::Weekly => from + Duration::days(7),
        Frequency::Monthly => add_months(from, 1),
        Frequency::Yearly => add_months(from, 12),
    }
}

/// One bucket of aggregated transaction amounts, ready for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// The bucket label, e.g. "2025-03-14", "Week 2" or "Mar".
    pub label: String,
    /// The sum of amounts whose date falls in the bucket.
    pub amount: f64,
}

/// Bucket `(date, amount)` pairs by the given grain and sum each bucket.
///
/// Week buckets by calendar day, month by week-of-month ordinal 1-5, year by
/// calendar month. Buckets are returned in chronological order; buckets with
/// no activity are omitted.
pub fn aggregate_by_grain(points: &[(Date, f64)], grain: Grain) -> Vec<ChartPoint> {
    use std::collections::BTreeMap;

    match grain {
        Grain::Week => {
            let mut totals: BTreeMap<Date, f64> = BTreeMap::new();

            for (date, amount) in points {
                *totals.entry(*date).or_insert(0.0) += amount;
            }

            totals
                .into_iter()
                .map(|(date, amount)| ChartPoint {
                    label: date.to_string(),
                    amount,
                })
                .collect()
        }
        Grain::Month => {
            let mut totals: BTreeMap<u8, f64> = BTreeMap::new();

            for (date, amount) in points {
                let week_of_month = (date.day() + 6) / 7;
                *totals.entry(week_of_month).or_insert(0.0) += amount;
            }

            totals
                .into_iter()
                .map(|(week, amount)| ChartPoint {
                    label: format!("Week {week}"),
                    amount,
                })
                .collect()
        }
        Grain::Year => {
            let mut totals: BTreeMap<u8, f64> = BTreeMap::new();

            for (date, amount) in points {
                *totals.entry(date.month() as u8).or_insert(0.0) += amount;
            }

            totals
                .into_iter()
                .map(|(month, amount)| ChartPoint {
                    label: month_abbreviation(Month::try_from(month).unwrap()).to_owned(),
                    amount,
                })
                .collect()
        }
    }
}

fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod frequency_tests {
    use super::Frequency;
    use crate::Error;

    #[test]
    fn parse_round_trips_the_database_representation() {
        for frequency in [Frequency::Weekly, Frequency::Monthly, Frequency::Yearly] {
            assert_eq!(Frequency::parse(frequency.as_str()), Ok(frequency));
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert_eq!(
            Frequency::parse("fortnightly"),
            Err(Error::InvalidFrequency("fortnightly".to_owned()))
        );
    }
}

//! Release-date conditions
//!
//! A complete date compares directly. A partial date (year, or year and
//! month) names a period: `=` and `!=` match inside or outside the whole
//! period, the other operators compare against whichever end of the period
//! keeps the comparison meaningful (`>` and `<=` use the last day, `<` and `>=`
//! the first).

use chrono::{NaiveDate, TimeZone, Utc};

use crate::query::{CompareOp, Condition, ConditionRef, Prop, Value};

/// Milliseconds since the epoch of UTC midnight on the given day
pub fn date_millis(year: i32, month: u32, day: u32) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    midnight_millis(date)
}

fn midnight_millis(date: NaiveDate) -> Option<i64> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive).timestamp_millis())
}

/// First day of the year or month
pub fn start_of_period(year: i32, month: Option<u32>) -> Option<i64> {
    date_millis(year, month.unwrap_or(1), 1)
}

/// Last day of the year or month
pub fn end_of_period(year: i32, month: Option<u32>) -> Option<i64> {
    match month.unwrap_or(12) {
        12 => date_millis(year, 12, 31),
        m => midnight_millis(NaiveDate::from_ymd_opt(year, m + 1, 1)?.pred_opt()?),
    }
}

/// Build the condition for a (possibly partial) release date.
///
/// `None` when the date is invalid; two-digit years are rejected.
pub fn released_at_condition(
    op: CompareOp,
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
) -> Option<ConditionRef> {
    if year <= 99 {
        return None;
    }

    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return None;
        }
    }

    if let Some(day) = day {
        let value = date_millis(year, month?, day)?;
        return Some(Condition::comparison(op, Prop::ReleasedAt, Value::Date(value)));
    }

    match op {
        CompareOp::Eq | CompareOp::Ne => {
            let range = Condition::range(
                Prop::ReleasedAt,
                Value::Date(start_of_period(year, month)?),
                true,
                Value::Date(end_of_period(year, month)?),
                true,
            );

            if op == CompareOp::Ne {
                Some(Condition::not(range))
            } else {
                Some(range)
            }
        }
        CompareOp::Gt | CompareOp::Le => {
            let value = end_of_period(year, month)?;
            Some(Condition::comparison(op, Prop::ReleasedAt, Value::Date(value)))
        }
        CompareOp::Lt | CompareOp::Ge => {
            let value = start_of_period(year, month)?;
            Some(Condition::comparison(op, Prop::ReleasedAt, Value::Date(value)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    #[test]
    fn test_date_millis() {
        assert_eq!(date_millis(1970, 1, 1), Some(0));
        assert_eq!(date_millis(1970, 1, 2), Some(DAY_MS));
        assert_eq!(date_millis(2003, 2, 29), None);
        assert!(date_millis(2004, 2, 29).is_some());
    }

    #[test]
    fn test_period_bounds() {
        assert_eq!(end_of_period(2004, Some(2)), date_millis(2004, 2, 29));
        assert_eq!(end_of_period(2003, Some(2)), date_millis(2003, 2, 28));
        assert_eq!(end_of_period(2011, None), date_millis(2011, 12, 31));
        assert_eq!(start_of_period(2011, None), date_millis(2011, 1, 1));
        assert_eq!(start_of_period(2003, Some(4)), date_millis(2003, 4, 1));
    }

    #[test]
    fn test_partial_equality_is_inclusive_range() {
        let cond = released_at_condition(CompareOp::Eq, 2011, None, None).unwrap();

        match &*cond {
            Condition::Range {
                start,
                start_inc,
                end,
                end_inc,
                ..
            } => {
                assert_eq!(*start, Value::Date(date_millis(2011, 1, 1).unwrap()));
                assert_eq!(*end, Value::Date(date_millis(2011, 12, 31).unwrap()));
                assert!(*start_inc && *end_inc);
            }
            other => panic!("expected range, got {:?}", other),
        }

        let ne = released_at_condition(CompareOp::Ne, 2011, Some(3), None).unwrap();
        assert!(matches!(&*ne, Condition::Not { .. }));
    }

    #[test]
    fn test_partial_comparison_picks_period_end() {
        let le = released_at_condition(CompareOp::Le, 2003, Some(8), None).unwrap();
        let ge = released_at_condition(CompareOp::Ge, 2003, Some(4), None).unwrap();

        assert_eq!(
            le,
            Condition::comparison(
                CompareOp::Le,
                Prop::ReleasedAt,
                Value::Date(date_millis(2003, 8, 31).unwrap())
            )
        );
        assert_eq!(
            ge,
            Condition::comparison(
                CompareOp::Ge,
                Prop::ReleasedAt,
                Value::Date(date_millis(2003, 4, 1).unwrap())
            )
        );
    }

    #[test]
    fn test_invalid_dates() {
        assert!(released_at_condition(CompareOp::Eq, 99, None, None).is_none());
        assert!(released_at_condition(CompareOp::Eq, 2003, Some(13), None).is_none());
        assert!(released_at_condition(CompareOp::Eq, 2003, Some(0), None).is_none());
        assert!(released_at_condition(CompareOp::Eq, 2003, Some(2), Some(30)).is_none());
    }
}

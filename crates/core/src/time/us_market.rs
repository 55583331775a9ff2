use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

// Fixed EST offset; during daylight time the cutoff lands an hour late, which only
// delays the roll to the new session.
const US_EASTERN_OFFSET_SECS: i32 = -5 * 3600;

// Regular session closes at 16:00 ET.
const CLOSE_CUTOFF_HOUR_ET: u32 = 16;
const CLOSE_CUTOFF_MINUTE_ET: u32 = 0;

/// Explicit date, or the latest session that has closed as of `now_utc`.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
    holidays: &HashSet<NaiveDate>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date: {s}"));
    }

    let et = chrono::FixedOffset::east_opt(US_EASTERN_OFFSET_SECS).context("invalid ET offset")?;
    let now_et = now_utc.with_timezone(&et);

    let cutoff_reached =
        (now_et.hour(), now_et.minute()) >= (CLOSE_CUTOFF_HOUR_ET, CLOSE_CUTOFF_MINUTE_ET);
    let mut date = now_et.date_naive();
    if !cutoff_reached {
        date = date - Duration::days(1);
    }

    while !is_trading_day(date, holidays) {
        date = date - Duration::days(1);
    }

    Ok(date)
}

/// First trading day strictly after `date`; used as a prediction's target date.
pub fn next_trading_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while !is_trading_day(next, holidays) {
        next = next + Duration::days(1);
    }
    next
}

pub fn is_trading_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !is_weekend(date) && !holidays.contains(&date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

/// Fixed-date NYSE holidays on their observed day, plus anything listed in
/// `MARKET_HOLIDAYS="YYYY-MM-DD,..."`.
pub fn configured_holidays() -> HashSet<NaiveDate> {
    let mut out = HashSet::new();
    for y in 2024..=2030 {
        for (m, d) in [(1, 1), (6, 19), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d).and_then(observed) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("MARKET_HOLIDAYS") {
        out.extend(parse_holiday_list(&s));
    }

    out
}

/// Saturday holidays close the Friday before, Sunday holidays the Monday after. A
/// Saturday New Year's Day is not observed: the prior Friday closes a trading year.
fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        chrono::Weekday::Sat if date.month() == 1 && date.day() == 1 => None,
        chrono::Weekday::Sat => Some(date - Duration::days(1)),
        chrono::Weekday::Sun => Some(date + Duration::days(1)),
        _ => Some(date),
    }
}

fn parse_holiday_list(s: &str) -> impl Iterator<Item = NaiveDate> + '_ {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| NaiveDate::parse_from_str(part, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn explicit_date_wins() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let d = resolve_as_of_date(Some("2026-02-27"), now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 2, 27));
        assert!(resolve_as_of_date(Some("02/27/2026"), now, &HashSet::new()).is_err());
    }

    #[test]
    fn uses_previous_session_before_close() {
        // 2026-03-04 (Wed) 18:00 UTC = 13:00 ET.
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 18, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 3, 3));
    }

    #[test]
    fn uses_same_day_after_close() {
        // 2026-03-04 22:00 UTC = 17:00 ET.
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 22, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 3, 4));
    }

    #[test]
    fn rolls_back_over_weekend_and_holiday() {
        // Monday 2026-01-05 10:00 ET: Sunday and Saturday roll back to Friday 01-02.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 15, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 1, 2));

        let holidays = HashSet::from([ymd(2026, 1, 2)]);
        let d = resolve_as_of_date(None, now, &holidays).unwrap();
        assert_eq!(d, ymd(2026, 1, 1));
    }

    #[test]
    fn next_trading_day_skips_weekend_and_holidays() {
        // Friday -> Monday.
        assert_eq!(next_trading_day(ymd(2026, 1, 2), &HashSet::new()), ymd(2026, 1, 5));
        let holidays = HashSet::from([ymd(2026, 1, 5)]);
        assert_eq!(next_trading_day(ymd(2026, 1, 2), &holidays), ymd(2026, 1, 6));
        // Wednesday -> Thursday.
        assert_eq!(next_trading_day(ymd(2026, 3, 4), &HashSet::new()), ymd(2026, 3, 5));
    }

    #[test]
    fn parses_holiday_overrides() {
        let parsed: Vec<_> = parse_holiday_list(" 2026-11-26, ,bogus,2026-12-24").collect();
        assert_eq!(parsed, vec![ymd(2026, 11, 26), ymd(2026, 12, 24)]);
    }

    #[test]
    fn fixed_holidays_are_present() {
        let h = configured_holidays();
        assert!(h.contains(&ymd(2026, 1, 1)));
        assert!(h.contains(&ymd(2026, 12, 25)));
    }

    #[test]
    fn weekend_holidays_close_the_observed_weekday() {
        let holidays = configured_holidays();
        // 2026-07-04 is a Saturday; the market closes Friday 07-03.
        assert!(holidays.contains(&ymd(2026, 7, 3)));
        assert_eq!(next_trading_day(ymd(2026, 7, 2), &holidays), ymd(2026, 7, 6));
        // Saturday 2027-12-25 -> Friday 12-24; Sunday 2027-07-04 -> Monday 07-05.
        assert!(holidays.contains(&ymd(2027, 12, 24)));
        assert!(holidays.contains(&ymd(2027, 7, 5)));
        // 2028-01-01 is a Saturday and is not shifted back into 2027.
        assert!(!holidays.contains(&ymd(2027, 12, 31)));
        assert!(!holidays.contains(&ymd(2028, 1, 1)));
    }
}

//! Tolerant parsing of the timestamp text stored on manifest records.
//!
//! Records reach the board with two date shapes: day-first slash dates typed
//! by operators (`25/12/2024 14:30`) and ISO-like values written by
//! integrations (`2024-12-25T14:30:00Z`). Both are read as local wall-clock
//! time; offsets are discarded, never applied.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Distance from `now` beyond which a standard ISO reading becomes suspicious.
const SWAP_SUSPICION_SECONDS: u64 = 24 * 60 * 60;

/// Parses a stored timestamp, returning `None` for anything unreadable.
///
/// `now` only feeds the day/month swap correction for ISO-like values; see
/// [`prefer_swapped_reading`].
#[must_use]
pub fn parse_flexible_date(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.contains('/') {
        return parse_day_first(value);
    }

    if value.contains('-') {
        return parse_iso_like(value, now).or_else(|| parse_generic(value));
    }

    parse_generic(value)
}

/// Day/month swap policy for ISO-like values.
///
/// One upstream integration writes `YYYY-DD-MM` into columns that should hold
/// `YYYY-MM-DD`. The swapped reading wins only when it is strictly closer to
/// `now` and the standard reading is more than 24 hours away from `now`.
///
/// Legitimately old records entered close to a month boundary can be
/// misread by this rule. It stays as is until the upstream feed is fixed;
/// changing it alters how historical records render.
#[must_use]
pub fn prefer_swapped_reading(
    standard: NaiveDateTime,
    swapped: NaiveDateTime,
    now: NaiveDateTime,
) -> bool {
    let standard_distance = distance_seconds(standard, now);
    let swapped_distance = distance_seconds(swapped, now);

    swapped_distance < standard_distance && standard_distance > SWAP_SUSPICION_SECONDS
}

fn distance_seconds(left: NaiveDateTime, right: NaiveDateTime) -> u64 {
    (left - right).num_seconds().unsigned_abs()
}

fn parse_day_first(value: &str) -> Option<NaiveDateTime> {
    let mut tokens = value.split_whitespace();
    let date_token = tokens.next()?.trim_end_matches(',');
    let time_token = tokens.next();
    if tokens.next().is_some() {
        return None;
    }

    let mut date_parts = date_token.split('/');
    let day = digits(date_parts.next()?)?;
    let month = digits(date_parts.next()?)?;
    let year = year_digits(date_parts.next()?)?;
    if date_parts.next().is_some() {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = match time_token {
        Some(token) => parse_time(token)?,
        None => NaiveTime::MIN,
    };

    Some(date.and_time(time))
}

fn parse_iso_like(value: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (date_token, time_token) = match value.split_once(['T', 't', ' ']) {
        Some((date, time)) => (date, Some(time.trim())),
        None => (value, None),
    };
    let date_token = strip_date_offset(date_token);

    let mut date_parts = date_token.split('-');
    let year = year_digits(date_parts.next()?)?;
    let first = digits(date_parts.next()?)?;
    let second = digits(date_parts.next()?)?;
    if date_parts.next().is_some() {
        return None;
    }

    let time = match time_token {
        Some(token) if !token.is_empty() => parse_time(strip_offset(token))?,
        _ => NaiveTime::MIN,
    };

    let standard = NaiveDate::from_ymd_opt(year, first, second).map(|date| date.and_time(time));
    let swapped = if second <= 12 {
        NaiveDate::from_ymd_opt(year, second, first).map(|date| date.and_time(time))
    } else {
        None
    };

    match (standard, swapped) {
        (Some(standard), Some(swapped)) if prefer_swapped_reading(standard, swapped, now) => {
            Some(swapped)
        }
        (Some(standard), _) => Some(standard),
        (None, swapped) => swapped,
    }
}

fn parse_generic(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|parsed| parsed.naive_local())
        .ok()
}

fn strip_offset(token: &str) -> &str {
    let token = token.trim_end_matches(['Z', 'z']);
    match token.find(['+', '-']) {
        Some(index) => &token[..index],
        None => token,
    }
}

/// Drops a `Z` or `±hh[:mm]` suffix written straight after the day field.
fn strip_date_offset(token: &str) -> &str {
    let token = token.trim_end_matches(['Z', 'z']);
    let Some((day_start, _)) = token.match_indices('-').nth(1) else {
        return token;
    };
    let day_start = day_start + 1;

    match token[day_start..].find(['+', '-']) {
        Some(index) if is_utc_offset(&token[day_start + index + 1..]) => {
            &token[..day_start + index]
        }
        _ => token,
    }
}

fn is_utc_offset(value: &str) -> bool {
    let (hours, minutes) = match value.split_once(':') {
        Some(parts) => parts,
        None if value.len() == 4 => match (value.get(..2), value.get(2..)) {
            (Some(hours), Some(minutes)) => (hours, minutes),
            _ => return false,
        },
        None => (value, "00"),
    };
    hours.len() == 2
        && minutes.len() == 2
        && hours.bytes().chain(minutes.bytes()).all(|byte| byte.is_ascii_digit())
}

fn parse_time(token: &str) -> Option<NaiveTime> {
    let token = token.split('.').next()?;
    let mut parts = token.split(':');
    let hour = digits(parts.next()?)?;
    let minute = parts.next().map(digits).unwrap_or(Some(0))?;
    let second = parts.next().map(digits).unwrap_or(Some(0))?;
    if parts.next().is_some() {
        return None;
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn digits(value: &str) -> Option<u32> {
    if value.is_empty() || value.len() > 2 || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    value.parse().ok()
}

fn year_digits(value: &str) -> Option<i32> {
    if value.len() != 4 || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    use super::{parse_flexible_date, prefer_swapped_reading};

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .unwrap_or_else(|| unreachable!())
    }

    // Earlier than every fixture, so a swapped reading is never the closer one.
    fn far_now() -> NaiveDateTime {
        at(2019, 1, 10, 9, 0, 0)
    }

    #[test]
    fn slash_dates_are_day_first() {
        assert_eq!(
            parse_flexible_date("25/12/2024 14:30", far_now()),
            Some(at(2024, 12, 25, 14, 30, 0))
        );
        assert_eq!(
            parse_flexible_date("05/03/2024", far_now()),
            Some(at(2024, 3, 5, 0, 0, 0))
        );
    }

    #[test]
    fn slash_dates_accept_seconds_and_the_display_comma() {
        assert_eq!(
            parse_flexible_date("25/12/2024, 14:30:15", far_now()),
            Some(at(2024, 12, 25, 14, 30, 15))
        );
    }

    #[test]
    fn iso_dates_drop_zone_designators_without_shifting() {
        let expected = Some(at(2024, 12, 25, 14, 30, 0));
        assert_eq!(parse_flexible_date("2024-12-25T14:30:00", far_now()), expected);
        assert_eq!(parse_flexible_date("2024-12-25T14:30:00Z", far_now()), expected);
        assert_eq!(
            parse_flexible_date("2024-12-25T14:30:00.250-03:00", far_now()),
            expected
        );
        assert_eq!(
            parse_flexible_date("2024-12-25 14:30:00+00", far_now()),
            expected
        );
    }

    #[test]
    fn date_only_iso_values_ignore_a_trailing_offset() {
        let midnight = Some(at(2024, 12, 25, 0, 0, 0));
        assert_eq!(parse_flexible_date("2024-12-25+03:00", far_now()), midnight);
        assert_eq!(parse_flexible_date("2024-12-25-03:00", far_now()), midnight);
        assert_eq!(parse_flexible_date("2024-12-25+0300", far_now()), midnight);
        assert_eq!(parse_flexible_date("2024-12-25-03", far_now()), midnight);
        assert_eq!(parse_flexible_date("2024-12-25-3", far_now()), None);
    }

    #[test]
    fn iso_date_far_from_now_keeps_standard_reading() {
        assert_eq!(
            parse_flexible_date("2024-03-05", far_now()),
            Some(at(2024, 3, 5, 0, 0, 0))
        );
    }

    #[test]
    fn iso_date_prefers_swap_when_standard_is_far_and_swap_is_closer() {
        let now = at(2024, 5, 3, 10, 0, 0);
        assert_eq!(
            parse_flexible_date("2024-03-05T08:15:00", now),
            Some(at(2024, 5, 3, 8, 15, 0))
        );
    }

    #[test]
    fn iso_date_within_a_day_of_now_is_never_swapped() {
        let now = at(2024, 3, 5, 20, 0, 0);
        assert_eq!(
            parse_flexible_date("2024-03-05T08:00:00", now),
            Some(at(2024, 3, 5, 8, 0, 0))
        );
    }

    #[test]
    fn iso_day_above_twelve_cannot_be_swapped() {
        let now = at(2024, 12, 26, 0, 0, 0);
        assert_eq!(
            parse_flexible_date("2024-12-25T14:30:00", now),
            Some(at(2024, 12, 25, 14, 30, 0))
        );
    }

    #[test]
    fn iso_date_with_impossible_month_uses_swapped_reading() {
        assert_eq!(
            parse_flexible_date("2024-25-12", far_now()),
            Some(at(2024, 12, 25, 0, 0, 0))
        );
    }

    #[test]
    fn swap_policy_requires_both_conditions() {
        let now = at(2024, 5, 3, 12, 0, 0);
        let near = at(2024, 5, 3, 0, 0, 0);
        let far = at(2024, 3, 5, 0, 0, 0);

        assert!(prefer_swapped_reading(far, near, now));
        assert!(!prefer_swapped_reading(near, far, now));
        assert!(!prefer_swapped_reading(far, far, now));
    }

    #[test]
    fn rfc2822_values_use_the_generic_fallback() {
        assert_eq!(
            parse_flexible_date("Wed, 25 Dec 2024 14:30:00 +0000", far_now()),
            Some(at(2024, 12, 25, 14, 30, 0))
        );
    }

    #[test]
    fn unreadable_values_are_none() {
        for raw in ["not-a-date", "", "   ", "31/02/2024", "25/12/24", "2024-12-25T25:00", "amanhã"] {
            assert_eq!(parse_flexible_date(raw, far_now()), None, "{raw}");
        }
    }

    proptest! {
        #[test]
        fn parser_never_panics(raw in ".{0,40}") {
            let _ = parse_flexible_date(raw.as_str(), far_now());
        }

        #[test]
        fn valid_slash_dates_parse_to_their_fields(
            day in 1u32..=28,
            month in 1u32..=12,
            year in 2000i32..=2099,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let raw = format!("{day:02}/{month:02}/{year} {hour:02}:{minute:02}");
            prop_assert_eq!(
                parse_flexible_date(raw.as_str(), far_now()),
                Some(at(year, month, day, hour, minute, 0))
            );
        }
    }
}

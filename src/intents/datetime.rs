//! Natural-language date and time extraction.
//!
//! Covers the phrasings people actually type at an assistant: clock times
//! (`at 5pm`, `5:30 p.m.`, `17:00`, `noon`), relative days (`today`,
//! `tomorrow`, `in 2 hours`), weekdays, calendar dates and ordinal days. Every
//! matched phrase is recorded as a byte span so callers can cut it out of the
//! remaining text.

use std::{fmt, ops::Range, sync::LazyLock};

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::{Captures, Regex};

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid datetime pattern")
}

static MERIDIEM_TIME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:at\s+)?(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s?m\b\.?"));
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:at\s+)?(\d{1,2}):(\d{2})\b"));
static NAMED_TIME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:at\s+)?(noon|midday|midnight)\b"));
static BARE_AT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\bat\s+(\d{1,2})(?:\s*o'?clock)?\b"));
static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\bin\s+(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|fifteen|twenty|thirty)\s+(minutes?|mins?|hours?|hrs?|days?|weeks?)\b",
    )
});
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:on\s+)?(\d{4})-(\d{1,2})-(\d{1,2})\b"));
static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)\b(?:on\s+)?({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
});
static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)\b(?:on\s+)?(?:the\s+)?(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b(?:,?\s+(\d{{4}})\b)?"
    ))
});
static ORDINAL_DAY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\bon\s+the\s+(\d{1,2})(?:st|nd|rd|th)\b"));
static DAY_AFTER_TOMORROW: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:the\s+)?day\s+after\s+tomorrow\b"));
static TOMORROW: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\b(?:tomorrow|tmrw)\b"));
static TODAY: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\b(?:today|tonight)\b"));
static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b(?:(next|this|on)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
});
static PART_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:(?:in\s+)?the\s+|this\s+)?(morning|afternoon|evening|night)\b")
});
static RECURRING: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bevery\s*day\b"));

/// Largest `in N <unit>` amount accepted.
const MAX_OFFSET: i64 = 10_000;

/// Hour assigned when only a part of day is mentioned, checked in this order.
const PART_OF_DAY_HOURS: [(&str, u32); 4] =
    [("morning", 7), ("afternoon", 13), ("evening", 19), ("night", 21)];

/// The date/time a piece of text refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDateTime {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// "every day" / "everyday" was mentioned.
    pub recurring: bool,
    /// A date phrase was found (otherwise `date` is today).
    pub has_date: bool,
    /// A time phrase was found (otherwise `time` is midnight or a part-of-day hour).
    pub has_time: bool,
    /// Byte ranges of the matched phrases, in match order.
    pub spans: Vec<Range<usize>>,
}

impl ExtractedDateTime {
    /// `YYYY-MM-DD`
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `hh:mm AM`
    pub fn time_str(&self) -> String {
        self.time.format("%I:%M %p").to_string()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// A date or time phrase that names something impossible (`13pm`, `February 30`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDateTime(pub String);

impl fmt::Display for InvalidDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid date/time: {}", self.0)
    }
}

impl std::error::Error for InvalidDateTime {}

fn whole(c: &Captures<'_>) -> Range<usize> {
    c.get(0).map_or(0..0, |m| m.range())
}

fn group<'t>(c: &Captures<'t>, i: usize) -> Option<&'t str> {
    c.get(i).map(|m| m.as_str())
}

fn number<T: std::str::FromStr>(c: &Captures<'_>, i: usize) -> Result<T, InvalidDateTime> {
    let raw = group(c, i).unwrap_or_default();
    raw.parse()
        .map_err(|_| InvalidDateTime(format!("not a number: {raw}")))
}

/// Extract the date and time mentioned in `input`, relative to `now`.
pub fn extract_datetime(input: &str, now: NaiveDateTime) -> Result<ExtractedDateTime, InvalidDateTime> {
    let today = now.date();
    let mut spans = Vec::new();

    let mut time = find_time(input, &mut spans)?;
    let mut date = None;

    if let Some(c) = RELATIVE.captures(input) {
        let amount = word_amount(group(&c, 1).unwrap_or_default())?;
        let unit = group(&c, 2).unwrap_or_default().to_lowercase();
        spans.push(whole(&c));
        if unit.starts_with("min") || unit.starts_with('h') {
            let offset = if unit.starts_with('h') {
                Duration::hours(amount)
            } else {
                Duration::minutes(amount)
            };
            let target = now + offset;
            date = Some(target.date());
            if time.is_none() {
                time = NaiveTime::from_hms_opt(target.hour(), target.minute(), 0);
            }
        } else {
            let days = if unit.starts_with('w') { amount * 7 } else { amount };
            date = Some(today + Duration::days(days));
        }
    }

    if date.is_none() {
        date = find_date(input, today, &mut spans)?;
    }

    let has_time = time.is_some();
    let mut time = time.unwrap_or_default();
    if !has_time {
        let lower = input.to_lowercase();
        if let Some((_, hour)) = PART_OF_DAY_HOURS.iter().find(|(p, _)| lower.contains(p)) {
            time = NaiveTime::from_hms_opt(*hour, 0, 0).unwrap_or_default();
            if let Some(m) = PART_OF_DAY.find(input) {
                spans.push(m.range());
            }
        }
    }

    let recurring = match RECURRING.find(input) {
        Some(m) => {
            spans.push(m.range());
            true
        }
        None => false,
    };

    Ok(ExtractedDateTime {
        date: date.unwrap_or(today),
        has_date: date.is_some(),
        time,
        has_time,
        recurring,
        spans,
    })
}

fn find_time(input: &str, spans: &mut Vec<Range<usize>>) -> Result<Option<NaiveTime>, InvalidDateTime> {
    if let Some(c) = MERIDIEM_TIME.captures(input) {
        let hour: u32 = number(&c, 1)?;
        let minute: u32 = if c.get(2).is_some() { number(&c, 2)? } else { 0 };
        let pm = group(&c, 3).is_some_and(|m| m.eq_ignore_ascii_case("p"));
        if !(1..=12).contains(&hour) {
            return Err(InvalidDateTime(format!("hour {hour} with am/pm")));
        }
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        spans.push(whole(&c));
        return clock(hour, minute).map(Some);
    }
    if let Some(c) = CLOCK_TIME.captures(input) {
        spans.push(whole(&c));
        return clock(number(&c, 1)?, number(&c, 2)?).map(Some);
    }
    if let Some(c) = NAMED_TIME.captures(input) {
        spans.push(whole(&c));
        let hour = if group(&c, 1).is_some_and(|n| n.eq_ignore_ascii_case("midnight")) {
            0
        } else {
            12
        };
        return clock(hour, 0).map(Some);
    }
    if let Some(c) = BARE_AT.captures(input) {
        spans.push(whole(&c));
        return clock(number(&c, 1)?, 0).map(Some);
    }
    Ok(None)
}

fn clock(hour: u32, minute: u32) -> Result<NaiveTime, InvalidDateTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| InvalidDateTime(format!("{hour}:{minute:02}")))
}

fn find_date(
    input: &str,
    today: NaiveDate,
    spans: &mut Vec<Range<usize>>,
) -> Result<Option<NaiveDate>, InvalidDateTime> {
    if let Some(c) = ISO_DATE.captures(input) {
        spans.push(whole(&c));
        return calendar_date(number(&c, 1)?, number(&c, 2)?, number(&c, 3)?).map(Some);
    }

    let month_day = MONTH_DAY
        .captures(input)
        .map(|c| (c, 1, 2))
        .or_else(|| DAY_MONTH.captures(input).map(|c| (c, 2, 1)));
    if let Some((c, month_group, day_group)) = month_day {
        spans.push(whole(&c));
        let month = month_number(group(&c, month_group).unwrap_or_default())?;
        let day: u32 = number(&c, day_group)?;
        if c.get(3).is_some() {
            return calendar_date(number(&c, 3)?, month, day).map(Some);
        }
        let this_year = calendar_date(today.year(), month, day);
        return match this_year {
            Ok(d) if d >= today => Ok(Some(d)),
            _ => calendar_date(today.year() + 1, month, day).map(Some),
        };
    }

    if let Some(c) = ORDINAL_DAY.captures(input) {
        spans.push(whole(&c));
        let day: u32 = number(&c, 1)?;
        if let Some(d) = today.with_day(day).filter(|d| *d >= today) {
            return Ok(Some(d));
        }
        return today
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .and_then(|next| next.with_day(day))
            .map(Some)
            .ok_or_else(|| InvalidDateTime(format!("day {day} of next month")));
    }

    if let Some(m) = DAY_AFTER_TOMORROW.find(input) {
        spans.push(m.range());
        return Ok(Some(today + Duration::days(2)));
    }
    if let Some(m) = TOMORROW.find(input) {
        spans.push(m.range());
        return Ok(Some(today + Duration::days(1)));
    }
    if let Some(m) = TODAY.find(input) {
        spans.push(m.range());
        return Ok(Some(today));
    }

    if let Some(c) = WEEKDAY.captures(input) {
        spans.push(whole(&c));
        let target = weekday_index(group(&c, 2).unwrap_or_default());
        let current = today.weekday().num_days_from_monday();
        let qualifier = group(&c, 1).map(str::to_lowercase);
        let mut ahead = (target + 7 - current) % 7;
        match qualifier.as_deref() {
            Some("this") => {}
            Some("next") => {
                if ahead == 0 || current + ahead <= 6 {
                    ahead += 7;
                }
            }
            _ => {
                if ahead == 0 {
                    ahead = 7;
                }
            }
        }
        return Ok(Some(today + Duration::days(i64::from(ahead))));
    }

    Ok(None)
}

fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, InvalidDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| InvalidDateTime(format!("{year:04}-{month:02}-{day:02}")))
}

fn month_number(name: &str) -> Result<u32, InvalidDateTime> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return Err(InvalidDateTime(format!("unknown month {name}"))),
    };
    Ok(month)
}

fn weekday_index(name: &str) -> u32 {
    match name.to_lowercase().as_str() {
        "monday" => 0,
        "tuesday" => 1,
        "wednesday" => 2,
        "thursday" => 3,
        "friday" => 4,
        "saturday" => 5,
        _ => 6,
    }
}

fn word_amount(word: &str) -> Result<i64, InvalidDateTime> {
    let n = match word.to_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        digits => digits
            .parse()
            .map_err(|_| InvalidDateTime(format!("amount {word}")))?,
    };
    if n > MAX_OFFSET {
        return Err(InvalidDateTime(format!("offset {n} is too far out")));
    }
    Ok(n)
}

/// Spellings of `time_str` that may remain in the text after extraction:
/// the string itself, a dotted variant (`5:00.p.m.`) and the bare hour.
pub fn generate_time_formats(time_str: &str) -> [String; 3] {
    let meridiem = |s: &str| s.replace("am", "a.m.").replace("pm", "p.m.");
    let base = time_str.trim_start_matches('0').to_lowercase();
    let alternate = meridiem(&base.replace(' ', "."));
    let short = meridiem(base.split(':').next().unwrap_or_default());
    [time_str.to_string(), alternate, short]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sunday 2026-10-18, 10:00.
    fn sunday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    /// Monday 2026-10-19, 09:00.
    fn monday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn at(input: &str, now: NaiveDateTime) -> (String, String) {
        let e = extract_datetime(input, now).unwrap();
        (e.date_str(), e.time_str())
    }

    fn d(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_defaults_to_today_midnight() {
        let e = extract_datetime("call mom", sunday()).unwrap();
        assert_eq!(e.date_str(), "2026-10-18");
        assert_eq!(e.time_str(), "12:00 AM");
        assert!(!e.has_date && !e.has_time && !e.recurring);
        assert!(e.spans.is_empty());
    }

    #[test]
    fn test_meridiem_times() {
        assert_eq!(at("call mom at 5pm", sunday()), (d("2026-10-18"), d("05:00 PM")));
        assert_eq!(at("at 5:30 p.m. tomorrow", sunday()), (d("2026-10-19"), d("05:30 PM")));
        assert_eq!(at("wake up 7 AM", sunday()).1, "07:00 AM");
        assert_eq!(at("at 12am", sunday()).1, "12:00 AM");
        assert_eq!(at("at 12pm", sunday()).1, "12:00 PM");
    }

    #[test]
    fn test_meridiem_span_covers_at() {
        let input = "call mom at 5pm please";
        let e = extract_datetime(input, sunday()).unwrap();
        assert_eq!(&input[e.spans[0].clone()], "at 5pm");
    }

    #[test]
    fn test_clock_and_named_times() {
        assert_eq!(at("meeting at 17:45", sunday()).1, "05:45 PM");
        assert_eq!(at("lunch at noon", sunday()).1, "12:00 PM");
        assert_eq!(at("at 8 in the morning", sunday()).1, "08:00 AM");
    }

    #[test]
    fn test_midnight_is_not_adjusted_to_night() {
        let e = extract_datetime("backup at midnight", sunday()).unwrap();
        assert_eq!(e.time_str(), "12:00 AM");
        assert!(e.has_time);
    }

    #[test]
    fn test_invalid_times() {
        assert!(extract_datetime("at 13pm", sunday()).is_err());
        assert!(extract_datetime("at 25:00", sunday()).is_err());
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(at("tomorrow", sunday()).0, "2026-10-19");
        assert_eq!(at("the day after tomorrow", sunday()).0, "2026-10-20");
        assert_eq!(at("today", sunday()).0, "2026-10-18");
    }

    #[test]
    fn test_in_offsets() {
        assert_eq!(at("in 30 minutes", sunday()), (d("2026-10-18"), d("10:30 AM")));
        assert_eq!(at("in an hour", sunday()).1, "11:00 AM");
        assert_eq!(at("in 2 weeks", sunday()).0, "2026-11-01");
        assert_eq!(at("in three days at 9am", sunday()), (d("2026-10-21"), d("09:00 AM")));
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(at("on friday", monday()).0, "2026-10-23");
        assert_eq!(at("next friday", monday()).0, "2026-10-30");
        assert_eq!(at("monday", monday()).0, "2026-10-26");
        assert_eq!(at("this monday", monday()).0, "2026-10-19");
        // From Sunday, Friday is already in the next week.
        assert_eq!(at("next friday", sunday()).0, "2026-10-23");
    }

    #[test]
    fn test_month_day_dates() {
        assert_eq!(at("on December 25th", sunday()).0, "2026-12-25");
        assert_eq!(at("25 December", sunday()).0, "2026-12-25");
        assert_eq!(at("the 3rd of jan", sunday()).0, "2027-01-03");
        assert_eq!(at("January 3rd", sunday()).0, "2027-01-03");
        assert_eq!(at("March 3, 2030", sunday()).0, "2030-03-03");
        assert!(extract_datetime("February 30", sunday()).is_err());
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(at("due 2026-12-31 at 9am", sunday()), (d("2026-12-31"), d("09:00 AM")));
    }

    #[test]
    fn test_ordinal_day_rolls_forward() {
        assert_eq!(at("on the 20th", sunday()).0, "2026-10-20");
        assert_eq!(at("on the 15th", sunday()).0, "2026-11-15");
        assert_eq!(at("on the 31st", sunday()).0, "2026-10-31");

        let nov = NaiveDate::from_ymd_opt(2026, 11, 5).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(at("on the 31st", nov).0, "2026-12-31");

        let jan = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert!(extract_datetime("on the 30th", jan).is_err());
    }

    #[test]
    fn test_part_of_day() {
        assert_eq!(at("tomorrow morning", sunday()), (d("2026-10-19"), d("07:00 AM")));
        assert_eq!(at("this afternoon", sunday()).1, "01:00 PM");
        assert_eq!(at("in the evening", sunday()).1, "07:00 PM");
        assert_eq!(at("tonight", sunday()).1, "09:00 PM");
        // An explicit time wins.
        assert_eq!(at("tomorrow morning at 9:15", sunday()).1, "09:15 AM");
    }

    #[test]
    fn test_recurring() {
        let e = extract_datetime("every day at 8am", sunday()).unwrap();
        assert!(e.recurring);
        assert_eq!(e.time_str(), "08:00 AM");
        assert!(extract_datetime("everyday", sunday()).unwrap().recurring);
        assert!(!extract_datetime("every week", sunday()).unwrap().recurring);
    }

    #[test]
    fn test_generate_time_formats() {
        assert_eq!(
            generate_time_formats("05:00 PM"),
            [d("05:00 PM"), d("5:00.p.m."), d("5")]
        );
        assert_eq!(
            generate_time_formats("12:30 AM"),
            [d("12:30 AM"), d("12:30.a.m."), d("12")]
        );
    }
}

// ABOUTME: Date/time normalization for event listings: fuzzy, delimiter, at-symbol and range strategies.
// ABOUTME: Produces a month-day plus clock time, keeping "no time given" distinct from genuine midnight.

//! Date and time normalization.
//!
//! Every strategy reduces raw listing text to a [`NormalizedDateTime`]:
//! a month/day (the year is never kept) plus a [`TimeSlot`]. A clock time is
//! only reported when the text spelled one out; a date with no clock text
//! yields [`TimeSlot::Unstated`], never a defaulted midnight.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::extractors::schema::{DateParseMethod, DateSchema};
use crate::record::{NOT_AVAILABLE, TIME_UNAVAILABLE};

/// Leap year used to validate yearless month/day pairs (accepts Feb 29).
const REFERENCE_YEAR: i32 = 2000;

/// Clock times: `7pm`, `7:30 p.m.`, `19:30`, `noon`, `midnight`.
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?P<h>\d{1,2})(?::(?P<m>\d{2}))?\s*(?P<ampm>[ap])\.?m\b\.?|\b(?P<h24>\d{1,2}):(?P<m24>\d{2})(?::\d{2})?\b|\b(?P<word>noon|midnight)\b",
    )
    .unwrap()
});

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static NUMERIC_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/\d{2,4})?\b").unwrap());

/// Words joining the two ends of a time range.
const RANGE_SEPARATORS: &[&str] = &["-", "–", "—", "to", "until", "thru", "through"];

/// Calendar patterns tried on the date half of an `@`-split.
const CALENDAR_PATTERNS: &[&str] = &[
    "%B %d",
    "%b %d",
    "%A, %B %d",
    "%a, %b %d",
    "%A %B %d",
    "%a %b %d",
    "%m/%d",
];

/// Reasons a strategy could not decode the text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("empty date text")]
    Empty,
    #[error("no date found in {0:?}")]
    NoDate(String),
    #[error("conflicting date tokens in {0:?}")]
    Ambiguous(String),
    #[error("missing separator {sep:?} in {text:?}")]
    MissingSeparator { sep: &'static str, text: String },
    #[error("{segment:?} does not match {pattern}")]
    Pattern {
        segment: String,
        pattern: &'static str,
    },
    #[error("no clock time in {0:?}")]
    NoTime(String),
}

/// A yearless calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Returns `None` when the pair is not a real calendar day.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day)?;
        Some(Self { month, day })
    }

    fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    /// `MM-DD`.
    pub fn format(&self) -> String {
        format!("{:02}-{:02}", self.month, self.day)
    }
}

/// The start time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    /// A clock time spelled out in the source text.
    At(NaiveTime),
    /// A date was found but the text gave no time.
    Unstated,
    /// Nothing could be decoded.
    Missing,
}

/// Output of the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDateTime {
    pub date: Option<MonthDay>,
    pub start: TimeSlot,
    pub end: Option<NaiveTime>,
}

impl NormalizedDateTime {
    /// The sentinel pair.
    pub fn unresolved() -> Self {
        Self {
            date: None,
            start: TimeSlot::Missing,
            end: None,
        }
    }

    fn with_clock(date: MonthDay, clock: Option<ClockSpan>) -> Self {
        match clock {
            Some(span) => Self {
                date: Some(date),
                start: TimeSlot::At(span.start),
                end: span.end,
            },
            None => Self {
                date: Some(date),
                start: TimeSlot::Unstated,
                end: None,
            },
        }
    }

    pub fn date_text(&self) -> String {
        self.date
            .map(|d| d.format())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Start time as `hh:mm AM/PM`; `unavailable_label` when no time was given.
    pub fn time_text(&self, unavailable_label: &str) -> String {
        match self.start {
            TimeSlot::At(t) => format_clock(t),
            TimeSlot::Unstated => unavailable_label.to_string(),
            TimeSlot::Missing => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn end_time_text(&self) -> String {
        self.end
            .map(format_clock)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// `(date, time)` with the default time-unavailable label.
    pub fn as_pair(&self) -> (String, String) {
        (self.date_text(), self.time_text(TIME_UNAVAILABLE))
    }
}

/// Formats a clock time as `hh:mm AM/PM`.
pub fn format_clock(t: NaiveTime) -> String {
    t.format("%I:%M %p").to_string()
}

/// A start time plus an optional range end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSpan {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
}

/// Normalizes `text` with the strategy declared by `schema`.
///
/// `item_attribute` reaches this function only when the item carried no
/// usable attribute, so it decodes the node text like `direct_fuzzy_parse`.
pub fn normalize(text: &str, schema: &DateSchema) -> Result<NormalizedDateTime, DateParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DateParseError::Empty);
    }
    match schema.parse_method {
        DateParseMethod::DirectFuzzyParse | DateParseMethod::ItemAttribute => parse_fuzzy(text),
        DateParseMethod::TimeRangeWithFallback => parse_fuzzy(text).or_else(|err| {
            tracing::debug!(error = %err, text, "fuzzy parse failed, splitting on '@'");
            parse_at_fallback(text)
        }),
        DateParseMethod::SplitOnDelimiter => {
            parse_split_on_delimiter(text, schema.time_offset, schema.time_width)
        }
        DateParseMethod::SplitOnAtSymbol => parse_split_on_at(text),
    }
}

/// Fuzzy natural-language parse of a whole date/time expression.
///
/// Unknown words (weekdays, labels, `@`) are skipped. Machine formats
/// (RFC 3339, RFC 2822, ISO dates) are tried first and `dateparser` last.
pub fn parse_fuzzy(text: &str) -> Result<NormalizedDateTime, DateParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DateParseError::Empty);
    }
    if let Some(parsed) = parse_machine(text) {
        return Ok(parsed);
    }

    let clock = find_clock_span(text);
    let stripped = CLOCK_RE.replace_all(text, " ");
    let date = match fuzzy_month_day(&stripped) {
        Ok(date) => date,
        // dateparser fills a missing date with today, so only numeric
        // date text outside the clock times is handed to it.
        Err(DateParseError::NoDate(_)) if stripped.chars().any(|c| c.is_ascii_digit()) => {
            dateparser_month_day(text).ok_or_else(|| DateParseError::NoDate(text.to_string()))?
        }
        Err(err) => return Err(err),
    };
    Ok(NormalizedDateTime::with_clock(date, clock))
}

/// Reads an ISO-8601 date or datetime, e.g. a `data-date` attribute.
pub fn parse_iso(value: &str) -> Result<NormalizedDateTime, DateParseError> {
    parse_machine(value.trim()).ok_or_else(|| DateParseError::Pattern {
        segment: value.to_string(),
        pattern: "ISO-8601",
    })
}

/// Finds the first clock time in `text` and, when the next clock follows a
/// range separator, the range end.
pub fn find_clock_span(text: &str) -> Option<ClockSpan> {
    let mut clocks = CLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            Some((clock_from_captures(&caps)?, m.start(), m.end()))
        });

    let (start, _, start_end) = clocks.next()?;
    let end = clocks.next().and_then(|(end, end_start, _)| {
        let between = text[start_end..end_start].trim().to_lowercase();
        RANGE_SEPARATORS
            .contains(&between.as_str())
            .then_some(end)
    });
    Some(ClockSpan { start, end })
}

/// `split_on_delimiter`: `"<Mon> <day>,<label><clock>"`.
fn parse_split_on_delimiter(
    text: &str,
    offset: usize,
    width: usize,
) -> Result<NormalizedDateTime, DateParseError> {
    let (date_part, time_part) =
        text.split_once(',')
            .ok_or_else(|| DateParseError::MissingSeparator {
                sep: ",",
                text: text.to_string(),
            })?;

    let date = parse_calendar(date_part, &["%b %d"])?;
    let slice: String = time_part.chars().skip(offset).take(width).collect();
    let slice = slice.trim();
    if slice.is_empty() {
        return Ok(NormalizedDateTime::with_clock(date, None));
    }
    let clock = find_clock_span(slice).ok_or_else(|| DateParseError::NoTime(slice.to_string()))?;
    Ok(NormalizedDateTime::with_clock(date, Some(clock)))
}

/// `split_on_at_symbol`: `"<Month> <day> @ <clock>"`.
fn parse_split_on_at(text: &str) -> Result<NormalizedDateTime, DateParseError> {
    let (date_part, time_part) =
        text.split_once(" @ ")
            .ok_or_else(|| DateParseError::MissingSeparator {
                sep: " @ ",
                text: text.to_string(),
            })?;

    let date = parse_calendar(date_part, &["%B %d"])?;
    let clock =
        find_clock_span(time_part).ok_or_else(|| DateParseError::NoTime(time_part.to_string()))?;
    Ok(NormalizedDateTime::with_clock(date, Some(clock)))
}

/// Second stage of `time_range_with_fallback`.
fn parse_at_fallback(text: &str) -> Result<NormalizedDateTime, DateParseError> {
    let (date_part, time_part) =
        text.split_once('@')
            .ok_or_else(|| DateParseError::MissingSeparator {
                sep: "@",
                text: text.to_string(),
            })?;

    let date = parse_calendar(date_part, CALENDAR_PATTERNS)
        .or_else(|_| fuzzy_month_day(date_part))?;
    let clock =
        find_clock_span(time_part).ok_or_else(|| DateParseError::NoTime(time_part.to_string()))?;
    Ok(NormalizedDateTime::with_clock(date, Some(clock)))
}

/// Parses a yearless date segment against explicit chrono patterns.
fn parse_calendar(segment: &str, patterns: &[&'static str]) -> Result<MonthDay, DateParseError> {
    let segment = segment.split_whitespace().collect::<Vec<_>>().join(" ");
    let with_year = format!("{} {}", segment, REFERENCE_YEAR);
    for pattern in patterns {
        let fmt = format!("{} %Y", pattern);
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, &fmt) {
            return Ok(MonthDay::from_date(date));
        }
    }
    Err(DateParseError::Pattern {
        segment,
        pattern: patterns.first().copied().unwrap_or("calendar date"),
    })
}

/// RFC 3339, RFC 2822 and ISO forms, keeping the wall-clock time of the source.
fn parse_machine(text: &str) -> Option<NormalizedDateTime> {
    let explicit = |dt: NaiveDateTime| NormalizedDateTime {
        date: Some(MonthDay::from_date(dt.date())),
        start: TimeSlot::At(dt.time()),
        end: None,
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(explicit(dt.naive_local()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(explicit(dt.naive_local()));
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(explicit(dt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(NormalizedDateTime::with_clock(MonthDay::from_date(date), None));
    }
    None
}

/// Month/day from free text with clock times already removed.
fn fuzzy_month_day(text: &str) -> Result<MonthDay, DateParseError> {
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        return month_day_from_groups(&caps, 2, 3, text);
    }
    if let Some(caps) = NUMERIC_DATE_RE.captures(text) {
        return month_day_from_groups(&caps, 1, 2, text);
    }

    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let adjacent_day = |idx: usize| {
        let after = tokens.get(idx + 1).and_then(|t| day_from_token(t));
        let before = idx
            .checked_sub(1)
            .and_then(|j| tokens.get(j))
            .and_then(|t| day_from_token(t));
        after.or(before)
    };
    // "may" is also a verb; it only names the month next to a day number.
    let months: Vec<(usize, u32)> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| month_from_name(t).map(|m| (i, m)))
        .filter(|(i, _)| !tokens[*i].eq_ignore_ascii_case("may") || adjacent_day(*i).is_some())
        .collect();

    match months.as_slice() {
        [] => Err(DateParseError::NoDate(text.to_string())),
        [(idx, month)] => adjacent_day(*idx)
            .and_then(|day| MonthDay::new(*month, day))
            .ok_or_else(|| DateParseError::NoDate(text.to_string())),
        _ => Err(DateParseError::Ambiguous(text.to_string())),
    }
}

fn month_day_from_groups(
    caps: &Captures<'_>,
    month_group: usize,
    day_group: usize,
    text: &str,
) -> Result<MonthDay, DateParseError> {
    let month = caps.get(month_group).and_then(|m| m.as_str().parse().ok());
    let day = caps.get(day_group).and_then(|m| m.as_str().parse().ok());
    month
        .zip(day)
        .and_then(|(m, d)| MonthDay::new(m, d))
        .ok_or_else(|| DateParseError::NoDate(text.to_string()))
}

/// Last resort for formats the token scan does not know.
fn dateparser_month_day(text: &str) -> Option<MonthDay> {
    let dt: DateTime<Utc> = dateparser::parse_with_timezone(text, &Utc).ok()?;
    Some(MonthDay::from_date(dt.date_naive()))
}

fn month_from_name(token: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lower = token.to_lowercase();
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|name| *name == lower || (lower.len() == 3 && name.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

fn day_from_token(token: &str) -> Option<u32> {
    let lower = token.to_lowercase();
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .unwrap_or(&lower);
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn clock_from_captures(caps: &Captures<'_>) -> Option<NaiveTime> {
    if let Some(word) = caps.name("word") {
        return match word.as_str().to_lowercase().as_str() {
            "noon" => NaiveTime::from_hms_opt(12, 0, 0),
            _ => NaiveTime::from_hms_opt(0, 0, 0),
        };
    }
    if let Some(h) = caps.name("h") {
        let hour: u32 = h.as_str().parse().ok()?;
        let minute: u32 = caps.name("m").map_or(Some(0), |m| m.as_str().parse().ok())?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = caps
            .name("ampm")
            .is_some_and(|a| a.as_str().eq_ignore_ascii_case("p"));
        let hour = match (pm, hour) {
            (false, 12) => 0,
            (false, h) => h,
            (true, 12) => 12,
            (true, h) => h + 12,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    let hour: u32 = caps.name("h24")?.as_str().parse().ok()?;
    let minute: u32 = caps.name("m24")?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

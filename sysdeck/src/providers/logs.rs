//! Log engine: line parsing (syslog and ISO-8601 prefixed), severity
//! classification and query filtering.

use std::fs;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1, take_while1, take_while_m_n};
use nom::character::complete::{alpha1, char, digit1, space0, space1};
use nom::combinator::{map, recognize, rest};
use nom::sequence::tuple;
use nom::IResult;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FetchError;
use crate::ops::LogQuery;
use crate::types::{LogEntry, Severity};

/// Date filter format for `since` and `until`.
pub const FILTER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static SEVERITY_RULES: Lazy<Vec<(Severity, Regex)>> = Lazy::new(|| {
    [
        (
            Severity::Error,
            r"(?i)\b(error|err|fail|failed|failure|fatal|crit|critical|panic)\b",
        ),
        (Severity::Warn, r"(?i)\b(warn|warning)\b"),
        (Severity::Info, r"(?i)\b(info|information|notice)\b"),
        (Severity::Debug, r"(?i)\b(debug|trace)\b"),
    ]
    .into_iter()
    .filter_map(|(sev, pat)| Regex::new(pat).ok().map(|re| (sev, re)))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Syslog,
    Iso,
}

/// A line split into its parts, borrowing from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub format: LineFormat,
    pub timestamp: &'a str,
    pub host: &'a str,
    pub source: &'a str,
    pub message: &'a str,
}

// "May  1 10:00:00"
fn syslog_stamp(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        alpha1,
        space1,
        digit1,
        space1,
        take_while1(|c: char| c.is_ascii_digit() || c == ':'),
    )))(input)
}

// "2024-05-01T10:00:00.123+02:00", a single token
fn iso_stamp(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        take_while_m_n(4, 4, |c: char| c.is_ascii_digit()),
        char('-'),
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        char('-'),
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        tag("T"),
        take_till1(|c: char| c == ' '),
    )))(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c == ' ')(input)
}

// "host tag[123]: message"
fn host_tag_message(input: &str) -> IResult<&str, (&str, &str, &str)> {
    let (input, host) = word(input)?;
    let (input, _) = space1(input)?;
    let (input, source) = take_till1(|c: char| c == ':' || c == ' ')(input)?;
    let (input, _) = char(':')(input)?;
    let (input, _) = space0(input)?;
    let (input, message) = rest(input)?;
    Ok((input, (host, source, message)))
}

// "host message without a tag"
fn host_message(input: &str) -> IResult<&str, (&str, &str, &str)> {
    let (input, host) = word(input)?;
    let (input, _) = space0(input)?;
    let (input, message) = rest(input)?;
    Ok((input, (host, "", message)))
}

fn line(input: &str) -> IResult<&str, ParsedLine<'_>> {
    let (input, (format, timestamp)) = alt((
        map(iso_stamp, |t| (LineFormat::Iso, t)),
        map(syslog_stamp, |t| (LineFormat::Syslog, t)),
    ))(input)?;
    let (input, _) = space1(input)?;
    let (input, (host, source, message)) = alt((host_tag_message, host_message))(input)?;
    Ok((
        input,
        ParsedLine {
            format,
            timestamp,
            host,
            source: strip_pid(source),
            message,
        },
    ))
}

fn strip_pid(raw: &str) -> &str {
    match raw.find('[') {
        Some(i) if raw.ends_with(']') => &raw[..i],
        _ => raw,
    }
}

pub fn parse_line(input: &str) -> Option<ParsedLine<'_>> {
    line(input.trim_end()).ok().map(|(_, parsed)| parsed)
}

/// First matching rule wins, checking the message then the source.
pub fn classify(source: &str, message: &str) -> Severity {
    SEVERITY_RULES
        .iter()
        .find(|(_, re)| re.is_match(message) || re.is_match(source))
        .map(|(sev, _)| *sev)
        .unwrap_or(Severity::Info)
}

/// Entry time for date filtering. Syslog stamps carry no year; `year` fills it.
pub fn entry_time(parsed: &ParsedLine<'_>, year: i32) -> Option<NaiveDateTime> {
    match parsed.format {
        LineFormat::Iso => DateTime::parse_from_rfc3339(parsed.timestamp)
            .map(|dt| dt.naive_utc())
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(parsed.timestamp, "%Y-%m-%dT%H:%M:%S%.f").ok()
            }),
        LineFormat::Syslog => {
            let collapsed = parsed.timestamp.split_whitespace().collect::<Vec<_>>().join(" ");
            let mut it = collapsed.splitn(3, ' ');
            let month = it.next()?;
            let day: u32 = it.next()?.parse().ok()?;
            let time = it.next()?;
            let month = NaiveDate::parse_from_str(&format!("{year} {month} 1"), "%Y %b %d")
                .ok()?
                .month();
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let time = chrono::NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
            Some(date.and_time(time))
        }
    }
}

fn parse_bound(s: Option<&str>) -> Result<Option<NaiveDateTime>, FetchError> {
    s.map(|v| {
        NaiveDateTime::parse_from_str(v, FILTER_FORMAT)
            .map_err(|e| FetchError::Parse(format!("date '{v}': {e}")))
    })
    .transpose()
}

/// Filter already-read log text. Lines in neither format are skipped; entries
/// whose time cannot be determined pass the date filters.
pub fn parse_text(text: &str, query: &LogQuery, year: i32) -> Result<Vec<LogEntry>, FetchError> {
    let pattern = query
        .pattern
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(Regex::new)
        .transpose()
        .map_err(|e| FetchError::Parse(format!("pattern: {e}")))?;
    let since = parse_bound(query.since.as_deref())?;
    let until = parse_bound(query.until.as_deref())?;

    let mut entries: Vec<LogEntry> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(parse_line)
        .filter(|p| {
            pattern
                .as_ref()
                .is_none_or(|re| re.is_match(p.message) || re.is_match(p.source))
        })
        .filter(|p| {
            if since.is_none() && until.is_none() {
                return true;
            }
            match entry_time(p, year) {
                Some(t) => since.is_none_or(|s| t >= s) && until.is_none_or(|u| t <= u),
                None => true,
            }
        })
        .map(|p| LogEntry {
            timestamp: p.timestamp.to_string(),
            severity: classify(p.source, p.message),
            source: p.source.to_string(),
            message: p.message.to_string(),
        })
        .filter(|e| query.severity.is_none_or(|s| e.severity == s))
        .collect();

    if entries.len() > query.max_entries {
        entries.drain(..entries.len() - query.max_entries);
    }
    Ok(entries)
}

pub fn parse(query: &LogQuery) -> Result<Vec<LogEntry>, FetchError> {
    let bytes = fs::read(&query.path)?;
    let text = String::from_utf8_lossy(&bytes);
    parse_text(&text, query, Utc::now().year())
}

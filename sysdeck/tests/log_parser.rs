//! Log engine: line formats, severity rules and query filters.

use std::io::Write;

use sysdeck::error::FetchError;
use sysdeck::ops::LogQuery;
use sysdeck::providers::logs::{classify, entry_time, parse, parse_line, parse_text, LineFormat};
use sysdeck::types::Severity;

const SAMPLE: &str = "\
May  1 10:00:00 box sshd[812]: Accepted publickey for ops
May  1 10:05:00 box kernel: usb 1-1: device descriptor read error
May  1 11:00:00 box systemd[1]: Started Daily apt upgrade.
garbage line without a stamp
2024-05-01T12:00:00+00:00 box app[77]: warning: disk almost full
2024-05-01T13:30:00.250Z box app: debug: cache hit ratio 0.93

May  2 09:00:00 box cron[3]: (root) CMD (run-parts /etc/cron.hourly)
";

fn query() -> LogQuery {
    LogQuery::default()
}

#[test]
fn syslog_line_parts() {
    let p = parse_line("May  1 10:00:00 box sshd[812]: Accepted publickey for ops").unwrap();
    assert_eq!(p.format, LineFormat::Syslog);
    assert_eq!(p.timestamp, "May  1 10:00:00");
    assert_eq!(p.host, "box");
    assert_eq!(p.source, "sshd");
    assert_eq!(p.message, "Accepted publickey for ops");
}

#[test]
fn iso_line_parts() {
    let p = parse_line("2024-05-01T12:00:00+00:00 box app[77]: warning: disk almost full").unwrap();
    assert_eq!(p.format, LineFormat::Iso);
    assert_eq!(p.timestamp, "2024-05-01T12:00:00+00:00");
    assert_eq!(p.source, "app");
    assert_eq!(p.message, "warning: disk almost full");
}

#[test]
fn line_without_tag_keeps_whole_message() {
    let p = parse_line("May 12 01:02:03 box plain text here").unwrap();
    assert_eq!(p.source, "");
    assert_eq!(p.message, "plain text here");
}

#[test]
fn unparseable_lines_are_rejected() {
    assert!(parse_line("garbage line without a stamp").is_none());
    assert!(parse_line("").is_none());
}

#[test]
fn severity_rules_in_priority_order() {
    assert_eq!(classify("kernel", "read error on sda"), Severity::Error);
    assert_eq!(classify("app", "Warning: low memory"), Severity::Warn);
    assert_eq!(classify("app", "notice: rotated"), Severity::Info);
    assert_eq!(classify("app", "DEBUG cache"), Severity::Debug);
    // error beats warn when both appear
    assert_eq!(classify("app", "warning: write failed"), Severity::Error);
    // whole words only
    assert_eq!(classify("app", "terrorist movie night"), Severity::Info);
    assert_eq!(classify("app", "nothing special"), Severity::Info);
}

#[test]
fn source_participates_in_classification() {
    assert_eq!(classify("debug-agent", "started"), Severity::Debug);
}

#[test]
fn syslog_time_uses_supplied_year() {
    let p = parse_line("Feb 29 23:59:59 box x: leap").unwrap();
    let t = entry_time(&p, 2024).unwrap();
    assert_eq!(t.to_string(), "2024-02-29 23:59:59");
    // not a valid date in 2023
    assert!(entry_time(&p, 2023).is_none());
}

#[test]
fn parse_text_skips_noise_and_classifies() {
    let entries = parse_text(SAMPLE, &query(), 2024).unwrap();
    assert_eq!(entries.len(), 6);
    let levels: Vec<Severity> = entries.iter().map(|e| e.severity).collect();
    assert_eq!(
        levels,
        vec![
            Severity::Info,
            Severity::Error,
            Severity::Info,
            Severity::Warn,
            Severity::Debug,
            Severity::Info,
        ]
    );
}

#[test]
fn pattern_matches_message_or_source() {
    let q = LogQuery {
        pattern: Some("^cron$|almost".into()),
        ..query()
    };
    let entries = parse_text(SAMPLE, &q, 2024).unwrap();
    let sources: Vec<&str> = entries.iter().map(|e| e.source.as_str()).collect();
    assert_eq!(sources, vec!["app", "cron"]);
}

#[test]
fn invalid_pattern_is_a_parse_error() {
    let q = LogQuery {
        pattern: Some("(unclosed".into()),
        ..query()
    };
    assert!(matches!(parse_text(SAMPLE, &q, 2024), Err(FetchError::Parse(_))));
}

#[test]
fn date_range_is_inclusive() {
    let q = LogQuery {
        since: Some("2024-05-01 10:05:00".into()),
        until: Some("2024-05-01 12:00:00".into()),
        ..query()
    };
    let entries = parse_text(SAMPLE, &q, 2024).unwrap();
    let stamps: Vec<&str> = entries.iter().map(|e| e.timestamp.as_str()).collect();
    assert_eq!(
        stamps,
        vec![
            "May  1 10:05:00",
            "May  1 11:00:00",
            "2024-05-01T12:00:00+00:00"
        ]
    );
}

#[test]
fn bad_date_bound_is_a_parse_error() {
    let q = LogQuery {
        since: Some("yesterday".into()),
        ..query()
    };
    assert!(matches!(parse_text(SAMPLE, &q, 2024), Err(FetchError::Parse(_))));
}

#[test]
fn severity_filter_and_cap_keep_newest() {
    let q = LogQuery {
        severity: Some(Severity::Info),
        max_entries: 2,
        ..query()
    };
    let entries = parse_text(SAMPLE, &q, 2024).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source, "systemd");
    assert_eq!(entries[1].source, "cron");
}

#[test]
fn parse_reads_file_lossily() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"May  3 08:00:00 box svc: fatal \xff bytes\n").unwrap();
    let q = LogQuery {
        path: f.path().to_path_buf(),
        ..query()
    };
    let entries = parse(&q).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Error);
    assert!(entries[0].message.contains('\u{FFFD}'));
}

#[test]
fn missing_file_is_unreachable() {
    let q = LogQuery {
        path: "/nonexistent/sysdeck/test.log".into(),
        ..query()
    };
    assert!(matches!(parse(&q), Err(FetchError::Unreachable(_))));
}

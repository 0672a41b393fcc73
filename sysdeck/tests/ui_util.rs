//! Cell truncation and size formatting helpers.

use sysdeck::ui::util::{human, truncate, truncate_middle, ELLIPSIS};

#[test]
fn truncate_edges() {
    assert_eq!(truncate("abcd", 0), "");
    assert_eq!(truncate("abcd", 1), "…");
    assert_eq!(truncate("abcd", 3), "ab…");
    // exact fit and spare room are left alone
    assert_eq!(truncate("abcd", 4), "abcd");
    assert_eq!(truncate("abcd", 5), "abcd");
    assert_eq!(truncate("", 0), "");
}

#[test]
fn truncate_counts_chars_not_bytes() {
    let cut = truncate("héllo wörld", 6);
    assert_eq!(cut, "héllo…");
    assert_eq!(cut.chars().count(), 6);
    assert!(cut.ends_with(ELLIPSIS));
}

#[test]
fn truncate_middle_keeps_both_ends() {
    assert_eq!(truncate_middle("/dev/nvme0n1p2", 9), "/dev…n1p2");
    assert_eq!(truncate_middle("/dev/sda1", 9), "/dev/sda1");
    assert_eq!(truncate_middle("/dev/sda1", 1), "…");
    assert_eq!(truncate_middle("/dev/sda1", 0), "");
}

#[test]
fn human_sizes() {
    assert_eq!(human(512), "512B");
    assert_eq!(human(1536), "1.5KB");
    assert_eq!(human(3 << 20), "3.0MB");
}

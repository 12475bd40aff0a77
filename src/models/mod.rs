/// Thread openers and replies.
pub mod post;
/// Posts looked up by ID.
pub mod reference;
/// Search hits.
pub mod search;

pub use post::Post;
pub use reference::Reference;
pub use search::SearchItem;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

/// Offset of the sites' local time (GMT+08:00), in seconds.
const SITE_OFFSET: i32 = 8 * 3600;

/// Parses a site timestamp such as `2015-08-09(日)12:34:56`.
///
/// The parenthesised day of week is dropped and the rest is read as
/// `yyyy-MM-ddHH:mm:ss` in GMT+08:00. Returns `None` if it doesn't parse.
pub fn parse_time(time: &str) -> Option<DateTime<FixedOffset>> {
    let mut stripped = String::with_capacity(time.len());
    let mut in_brackets = false;
    for c in time.chars() {
        match c {
            '(' if !in_brackets => in_brackets = true,
            ')' if in_brackets => in_brackets = false,
            _ if in_brackets => {}
            c => stripped.push(c),
        }
    }

    let naive = NaiveDateTime::parse_from_str(stripped.trim(), "%Y-%m-%d%H:%M:%S").ok()?;
    FixedOffset::east_opt(SITE_OFFSET)?
        .from_local_datetime(&naive)
        .single()
}

/// Treats the wire value `"1"` as `true`, anything else as `false`.
pub(crate) fn flag(value: &str) -> bool {
    value == "1"
}

pub(crate) mod macros {
    macro_rules! non_empty {
        ($x:expr) => {
            Some($x.as_str()).filter(|s| !s.is_empty())
        };
    }

    pub(crate) use non_empty;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_site_time_with_day_of_week() {
        let time = parse_time("2015-08-09(日)12:34:56").unwrap();
        assert_eq!((time.year(), time.month(), time.day()), (2015, 8, 9));
        assert_eq!((time.hour(), time.minute(), time.second()), (12, 34, 56));
        assert_eq!(time.offset().local_minus_utc(), SITE_OFFSET);
        assert_eq!(time.timestamp(), 1_439_094_896);
    }

    #[test]
    fn parses_site_time_without_day_of_week() {
        assert!(parse_time("2015-08-0912:34:56").is_some());
    }

    #[test]
    fn garbage_time_is_none() {
        assert!(parse_time("").is_none());
        assert!(parse_time("yesterday").is_none());
        assert!(parse_time("2015-13-09(日)12:34:56").is_none());
    }
}

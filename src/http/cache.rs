//! HTTP cache validator module
//!
//! Builds `ETag` / `Last-Modified` validators from file metadata and
//! evaluates conditional GET headers against them.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::Metadata;
use std::time::SystemTime;

/// IMF-fixdate, the preferred HTTP date format (RFC 7231 section 7.1.1.1)
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// asctime() format, still accepted from old clients
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Validators for one file, truncated to whole seconds like HTTP dates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

impl Validators {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Self::new(metadata.len(), modified)
    }

    pub fn new(len: u64, modified: SystemTime) -> Self {
        let secs = DateTime::<Utc>::from(modified).timestamp();
        let last_modified = DateTime::from_timestamp(secs, 0).unwrap_or_default();
        Self {
            etag: format!("\"{len:x}-{secs:x}\""),
            last_modified,
        }
    }

    pub fn last_modified_header(&self) -> String {
        format_http_date(&self.last_modified)
    }

    /// Whether a conditional GET can be answered with 304.
    ///
    /// `If-None-Match` wins when present; `If-Modified-Since` is only
    /// consulted without it, and an unparsable date is ignored.
    pub fn is_not_modified(
        &self,
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> bool {
        if if_none_match.is_some() {
            return check_etag_match(if_none_match, &self.etag);
        }

        if_modified_since
            .and_then(parse_http_date)
            .is_some_and(|since| self.last_modified <= since)
    }
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single tag, a comma separated list, the `*` wildcard, and
/// weak tags (`W/"..."`), which compare equal to their strong form.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag
        })
    })
}

pub fn format_http_date(date: &DateTime<Utc>) -> String {
    date.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date in IMF-fixdate (any RFC 2822 form) or asctime format
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, ASCTIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_etag_depends_on_len_and_mtime() {
        let a = Validators::new(10, at(784_111_777));
        assert_eq!(a, Validators::new(10, at(784_111_777)));
        assert_ne!(a.etag, Validators::new(11, at(784_111_777)).etag);
        assert_ne!(a.etag, Validators::new(10, at(784_111_778)).etag);
        assert!(a.etag.starts_with('"') && a.etag.ends_with('"'));
    }

    #[test]
    fn test_subsecond_mtime_truncated() {
        let v = Validators::new(1, at(784_111_777) + Duration::from_millis(900));
        assert_eq!(v.last_modified_header(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_parse_http_date() {
        let expected = DateTime::from_timestamp(784_111_777, 0).unwrap();
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(expected));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_if_modified_since() {
        let v = Validators::new(5, at(784_111_777));
        assert!(v.is_not_modified(None, Some("Sun, 06 Nov 1994 08:49:37 GMT")));
        assert!(v.is_not_modified(None, Some("Mon, 07 Nov 1994 08:49:37 GMT")));
        assert!(!v.is_not_modified(None, Some("Sat, 05 Nov 1994 08:49:37 GMT")));
        assert!(!v.is_not_modified(None, Some("garbage")));
        assert!(!v.is_not_modified(None, None));
    }

    #[test]
    fn test_if_none_match_takes_precedence() {
        let v = Validators::new(5, at(784_111_777));
        let fresh_date = Some("Mon, 07 Nov 1994 08:49:37 GMT");
        assert!(!v.is_not_modified(Some("\"other\""), fresh_date));
        assert!(v.is_not_modified(Some(v.etag.as_str()), None));
    }
}

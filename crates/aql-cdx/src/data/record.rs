use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Which URLs a discovery pattern covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScope {
    /// Only the exact URL.
    #[default]
    Exact,
    /// Every URL under the given path.
    Prefix,
    /// Every URL on the exact host.
    Host,
    /// Every URL on the host and all of its subdomains.
    Domain,
}

impl MatchScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Host => "host",
            Self::Domain => "domain",
        }
    }
}

impl fmt::Display for MatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for MatchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "prefix" => Ok(Self::Prefix),
            "host" => Ok(Self::Host),
            "domain" => Ok(Self::Domain),
            other => Err(format!("unknown match scope '{other}'")),
        }
    }
}

/// Robot-exclusion flags an index may attach to a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RobotFlag {
    #[serde(rename = "P")]
    PasswordProtected,
    #[serde(rename = "F")]
    NoFollow,
    #[serde(rename = "I")]
    NoIndex,
    #[serde(rename = "A")]
    NoArchive,
    #[serde(rename = "X")]
    SoftBlock,
    /// Legacy marker with no documented meaning, kept so it round-trips.
    #[serde(rename = "G")]
    Legacy,
}

impl RobotFlag {
    pub fn from_token(token: char) -> Option<Self> {
        match token {
            'P' => Some(Self::PasswordProtected),
            'F' => Some(Self::NoFollow),
            'I' => Some(Self::NoIndex),
            'A' => Some(Self::NoArchive),
            'X' => Some(Self::SoftBlock),
            'G' => Some(Self::Legacy),
            _ => None,
        }
    }

    pub fn token(self) -> char {
        match self {
            Self::PasswordProtected => 'P',
            Self::NoFollow => 'F',
            Self::NoIndex => 'I',
            Self::NoArchive => 'A',
            Self::SoftBlock => 'X',
            Self::Legacy => 'G',
        }
    }
}

/// One archived snapshot of one URL, as reported by an index.
///
/// The first four fields are always present. Everything else is optional
/// because archives disagree on which columns they publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub url:               String,
    pub url_key:           String,
    pub timestamp:         DateTime<Utc>,
    pub digest:            String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code:       Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type:         Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename:          Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset:            Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length:            Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_policy:     Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url:      Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags:             BTreeSet<RobotFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection:        Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_collection: Option<String>,
}

impl CaptureRecord {
    /// Build a record with only the mandatory fields set.
    pub fn new(
        url: impl Into<String>,
        url_key: impl Into<String>,
        timestamp: DateTime<Utc>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            url_key: url_key.into(),
            timestamp,
            digest: digest.into(),
            status_code: None,
            mime_type: None,
            filename: None,
            offset: None,
            length: None,
            access_policy: None,
            redirect_url: None,
            flags: BTreeSet::new(),
            collection: None,
            source: None,
            source_collection: None,
        }
    }

    /// The capture time in the archive's 14-digit form.
    pub fn timestamp_string(&self) -> String { format_timestamp(&self.timestamp) }

    pub fn has_flag(&self, flag: RobotFlag) -> bool { self.flags.contains(&flag) }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String { timestamp.format(TIMESTAMP_FORMAT).to_string() }

/// Parse a `YYYYMMDDhhmmss` timestamp.
///
/// Shorter all-digit prefixes (at least the year) are completed field by
/// field with the earliest valid value, so `2019` reads as `20190101000000`
/// and `20191` as `20191001000000`. Use it for lower bounds and for
/// timestamps reported by an index.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> { complete_timestamp(value, Bound::Earliest) }

/// Like [`parse_timestamp`], but completes missing fields with the latest
/// valid value: `2019` reads as `20191231235959`, `201902` as
/// `20190228235959`. Use it for upper bounds.
pub fn parse_timestamp_upper(value: &str) -> Option<DateTime<Utc>> { complete_timestamp(value, Bound::Latest) }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Earliest,
    Latest,
}

fn complete_timestamp(value: &str, bound: Bound) -> Option<DateTime<Utc>> {
    if !(4..=14).contains(&value.len()) || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = value[..4].parse().ok()?;
    let rest = &value[4..];
    // Digits of the n-th two-digit field after the year, possibly just one.
    let digits = move |n: usize| {
        rest.get(n * 2..)
            .map(|s| &s[..s.len().min(2)])
            .filter(|s| !s.is_empty())
    };

    let month = complete_field(digits(0), 1, 12, bound)?;
    let day = complete_field(digits(1), 1, days_in_month(year, month)?, bound)?;
    let hour = complete_field(digits(2), 0, 23, bound)?;
    let minute = complete_field(digits(3), 0, 59, bound)?;
    let second = complete_field(digits(4), 0, 59, bound)?;

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, second)
        .map(|naive| naive.and_utc())
}

/// Pick a value in `lo..=hi` matching the given digits.
///
/// A missing field takes the bound itself; a single digit is the tens
/// position and takes the earliest or latest value starting with it.
fn complete_field(digits: Option<&str>, lo: u32, hi: u32, bound: Bound) -> Option<u32> {
    let valid = |v: &u32| (lo..=hi).contains(v);
    match digits {
        None => Some(match bound {
            Bound::Earliest => lo,
            Bound::Latest => hi,
        }),
        Some(d) if d.len() == 2 => d.parse().ok().filter(valid),
        Some(d) => {
            let tens: u32 = d.parse().ok()?;
            let mut candidates = (tens * 10..=tens * 10 + 9).filter(valid);
            match bound {
                Bound::Earliest => candidates.next(),
                Bound::Latest => candidates.next_back(),
            }
        }
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(first.checked_add_months(Months::new(1))?.pred_opt()?.day())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn full_timestamp_round_trips() {
        let parsed = parse_timestamp("20190307123456").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2019, 3, 7, 12, 34, 56).unwrap());
        assert_eq!(format_timestamp(&parsed), "20190307123456");
    }

    #[test]
    fn short_timestamp_pads_to_earliest() {
        assert_eq!(
            parse_timestamp("2019").unwrap(),
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("201906").unwrap(),
            Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn partial_fields_complete_to_earliest() {
        assert_eq!(
            parse_timestamp("20191").unwrap(),
            Utc.with_ymd_and_hms(2019, 10, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2019061").unwrap(),
            Utc.with_ymd_and_hms(2019, 6, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2019063").unwrap(),
            Utc.with_ymd_and_hms(2019, 6, 30, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("20192").is_none());
    }

    #[test]
    fn upper_bound_completes_to_latest() {
        assert_eq!(
            parse_timestamp_upper("2019").unwrap(),
            Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap()
        );
        assert_eq!(
            parse_timestamp_upper("201902").unwrap(),
            Utc.with_ymd_and_hms(2019, 2, 28, 23, 59, 59).unwrap()
        );
        assert_eq!(
            parse_timestamp_upper("202002").unwrap(),
            Utc.with_ymd_and_hms(2020, 2, 29, 23, 59, 59).unwrap()
        );
        assert_eq!(
            parse_timestamp_upper("20190").unwrap(),
            Utc.with_ymd_and_hms(2019, 9, 30, 23, 59, 59).unwrap()
        );
        assert_eq!(
            parse_timestamp_upper("2019063012").unwrap(),
            Utc.with_ymd_and_hms(2019, 6, 30, 12, 59, 59).unwrap()
        );
        assert_eq!(parse_timestamp_upper("20190307123456"), parse_timestamp("20190307123456"));
    }

    #[test]
    fn rejects_invalid_timestamps() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("201").is_none());
        assert!(parse_timestamp("2019-03-07").is_none());
        assert!(parse_timestamp("20191399000000").is_none());
        assert!(parse_timestamp("201903071234567").is_none());
    }

    #[test]
    fn scope_parses_case_insensitively() {
        assert_eq!("Domain".parse::<MatchScope>().unwrap(), MatchScope::Domain);
        assert!("subtree".parse::<MatchScope>().is_err());
    }

    #[test]
    fn flag_tokens() {
        for flag in [
            RobotFlag::PasswordProtected,
            RobotFlag::NoFollow,
            RobotFlag::NoIndex,
            RobotFlag::NoArchive,
            RobotFlag::SoftBlock,
            RobotFlag::Legacy,
        ] {
            assert_eq!(RobotFlag::from_token(flag.token()), Some(flag));
        }
        assert_eq!(RobotFlag::from_token('Z'), None);
    }
}

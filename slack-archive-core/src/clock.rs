use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::model::RawTimestamp;

/// Zone a timestamp is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Named(Tz),
}

/// Named zone of the process, from `$TZ` first and then the system setting.
static SYSTEM_ZONE: Lazy<Option<Tz>> = Lazy::new(|| {
    let from_env = env::var("TZ")
        .ok()
        .and_then(|name| name.trim_start_matches(':').parse::<Tz>().ok());
    let zone = from_env.or_else(|| {
        iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| name.parse::<Tz>().ok())
    });
    debug!(zone = ?zone.map(|tz| tz.name()), "resolved local time zone");
    zone
});

impl DisplayZone {
    pub fn localize(&self, instant: DateTime<Utc>) -> ZonedTime {
        match self {
            Self::Local => localize_local(instant, *SYSTEM_ZONE),
            Self::Named(tz) => localize_named(instant, *tz),
        }
    }

    /// Interprets a wall-clock time in this zone. Ambiguous times pick the earlier instant.
    pub fn to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match (*self, *SYSTEM_ZONE) {
            (Self::Named(tz), _) | (Self::Local, Some(tz)) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            (Self::Local, None) => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

fn localize_named(instant: DateTime<Utc>, tz: Tz) -> ZonedTime {
    let named = instant.with_timezone(&tz);
    ZonedTime {
        abbreviation: named.format("%Z").to_string(),
        at: named.fixed_offset(),
    }
}

/// Without a resolvable zone name the abbreviation is the numeric offset.
fn localize_local(instant: DateTime<Utc>, system: Option<Tz>) -> ZonedTime {
    match system {
        Some(tz) => localize_named(instant, tz),
        None => {
            let local = instant.with_timezone(&Local);
            ZonedTime {
                abbreviation: local.format("%Z").to_string(),
                at: local.fixed_offset(),
            }
        }
    }
}

impl FromStr for DisplayZone {
    type Err = ArchiveError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        trimmed
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ArchiveError::UnknownTimeZone(input.to_string()))
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// A resolved instant together with the abbreviation of the zone it was resolved in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonedTime {
    at: DateTime<FixedOffset>,
    abbreviation: String,
}

impl ZonedTime {
    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    /// `HH:MM ZONE`, shown next to each message.
    pub fn clock(&self) -> String {
        format!("{} {}", self.at.format("%H:%M"), self.abbreviation)
    }

    /// `HH:MM:SS ZONE`, shown in block headers.
    pub fn clock_seconds(&self) -> String {
        format!("{} {}", self.at.format("%H:%M:%S"), self.abbreviation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub zone: DisplayZone,
}

impl TravelWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, zone: DisplayZone) -> Result<Self> {
        if start >= end {
            return Err(ArchiveError::InvalidTravelWindow(format!(
                "start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end, zone })
    }

    /// Builds a window from wall-clock bounds read in `home`.
    pub fn from_naive(
        start: NaiveDateTime,
        end: NaiveDateTime,
        home: DisplayZone,
        zone: DisplayZone,
    ) -> Result<Self> {
        let start_utc = home.to_utc(start).ok_or_else(|| {
            ArchiveError::InvalidTravelWindow(format!("{start} does not exist in {home}"))
        })?;
        let end_utc = home.to_utc(end).ok_or_else(|| {
            ArchiveError::InvalidTravelWindow(format!("{end} does not exist in {home}"))
        })?;
        Self::new(start_utc, end_utc, zone)
    }

    /// Both bounds are exclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start < instant && instant < self.end
    }
}

#[derive(Debug, Clone)]
pub struct TimestampResolver {
    home: DisplayZone,
    travel: Option<TravelWindow>,
}

impl TimestampResolver {
    pub fn new(home: DisplayZone, travel: Option<TravelWindow>) -> Self {
        Self { home, travel }
    }

    pub fn resolve(&self, raw: &RawTimestamp) -> Result<ZonedTime> {
        let instant = parse_instant(raw)?;
        let zone = match &self.travel {
            Some(window) if window.contains(instant) => window.zone,
            _ => self.home,
        };
        Ok(zone.localize(instant))
    }
}

fn parse_instant(raw: &RawTimestamp) -> Result<DateTime<Utc>> {
    let invalid = || ArchiveError::InvalidTimestamp(raw.to_string());
    let seconds = raw.seconds().ok_or_else(invalid)?;
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(invalid());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    #[allow(clippy::cast_possible_truncation)]
    let instant = DateTime::from_timestamp(whole as i64, nanos);
    instant.ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use chrono_tz::Tz;

    use crate::clock::{DisplayZone, TimestampResolver, TravelWindow, localize_local};
    use crate::model::RawTimestamp;

    fn resolver() -> TimestampResolver {
        let home = DisplayZone::Named(Tz::UTC);
        let start = NaiveDate::from_ymd_opt(2024, 3, 17)
            .and_then(|d| d.and_hms_opt(20, 0, 0))
            .expect("start");
        let end = NaiveDate::from_ymd_opt(2024, 4, 2)
            .and_then(|d| d.and_hms_opt(18, 37, 0))
            .expect("end");
        let tokyo = DisplayZone::Named(Tz::Asia__Tokyo);
        let window = TravelWindow::from_naive(start, end, home, tokyo).expect("window");
        TimestampResolver::new(home, Some(window))
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).expect("instant")
    }

    #[test]
    fn lower_bound_uses_home_zone() {
        let resolved = resolver()
            .resolve(&RawTimestamp::from("1710705600"))
            .expect("resolve");
        assert_eq!(resolved.abbreviation(), "UTC");
        assert_eq!(resolved.clock_seconds(), "20:00:00 UTC");
    }

    #[test]
    fn inside_window_uses_travel_zone() {
        let resolved = resolver()
            .resolve(&RawTimestamp::from("1710705601.000200"))
            .expect("resolve");
        assert_eq!(resolved.abbreviation(), "JST");
        assert_eq!(resolved.clock(), "05:00 JST");
        assert_eq!(
            resolved.date(),
            NaiveDate::from_ymd_opt(2024, 3, 18).expect("date")
        );
    }

    #[test]
    fn upper_bound_uses_home_zone() {
        let resolved = resolver()
            .resolve(&RawTimestamp::Number(1_712_083_020.0))
            .expect("resolve");
        assert_eq!(resolved.clock(), "18:37 UTC");
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let err = resolver()
            .resolve(&RawTimestamp::from("soon"))
            .expect_err("must fail");
        assert!(format!("{err}").contains("invalid timestamp: soon"));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let home = DisplayZone::Named(Tz::UTC);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let err = TravelWindow::from_naive(
            day.and_hms_opt(12, 0, 0).expect("time"),
            day.and_hms_opt(11, 0, 0).expect("time"),
            home,
            home,
        )
        .expect_err("must fail");
        assert!(format!("{err}").contains("invalid travel window"));
    }

    #[test]
    fn parses_zone_names() {
        assert_eq!(
            "local".parse::<DisplayZone>().expect("local"),
            DisplayZone::Local
        );
        assert_eq!(
            "Asia/Tokyo".parse::<DisplayZone>().expect("tokyo"),
            DisplayZone::Named(Tz::Asia__Tokyo)
        );
        assert!("Mars/Olympus".parse::<DisplayZone>().is_err());
    }

    #[test]
    fn local_zone_is_shown_by_name() {
        let resolved = localize_local(at(1_710_063_000), Some(Tz::America__New_York));
        assert_eq!(resolved.abbreviation(), "EDT");
        assert_eq!(resolved.clock_seconds(), "05:30:00 EDT");
        assert_eq!(
            resolved.date(),
            NaiveDate::from_ymd_opt(2024, 3, 10).expect("date")
        );
    }

    #[test]
    fn unnamed_local_zone_falls_back_to_offset() {
        let resolved = localize_local(at(1_710_063_000), None);
        assert!(resolved.abbreviation().starts_with(['+', '-']));
    }
}

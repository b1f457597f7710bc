use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::clock::{DisplayZone, TimestampResolver, TravelWindow};
use crate::error::{ArchiveError, Result};

pub const CONFIG_ENV: &str = "SLACK_ARCHIVE_CONFIG";
const DEFAULT_TITLE: &str = "Slack archive for #japan-2024";
const DEFAULT_STYLESHEET: &str = "styles.css";
const DEFAULT_FETCH_SCRIPT: &str = "wget.sh";
const DEFAULT_TRAVEL_ZONE: &str = "Asia/Tokyo";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    title: Option<String>,
    stylesheet: Option<String>,
    fetch_script: Option<PathBuf>,
    timezone: Option<String>,
    travel: Option<FileTravel>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileTravel {
    start: NaiveDateTime,
    end: NaiveDateTime,
    timezone: Option<String>,
}

/// Resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub title: String,
    pub stylesheet: String,
    pub fetch_script: PathBuf,
    pub home_zone: DisplayZone,
    pub travel: Option<TravelWindow>,
}

impl Settings {
    /// Built-in settings: local display zone plus the March 2024 Japan trip window.
    pub fn defaults() -> Result<Self> {
        Self::from_file_settings(FileSettings::default())
    }

    /// Precedence:
    /// 1) explicit path (must exist)
    /// 2) $SLACK_ARCHIVE_CONFIG
    /// 3) <config dir>/slack-archive/config.toml, when present
    /// 4) built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ArchiveError::ConfigNotFound {
                        path: path.to_path_buf(),
                    });
                }
                Some(path.to_path_buf())
            }
            None => env::var_os(CONFIG_ENV)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
                .or_else(|| {
                    dirs::config_dir()
                        .map(|dir| dir.join("slack-archive/config.toml"))
                        .filter(|path| path.exists())
                }),
        };

        match path {
            None => Self::defaults(),
            Some(path) => Self::from_path(&path),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileSettings =
            toml::from_str(&raw).map_err(|source| ArchiveError::InvalidConfig {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "loaded settings");
        Self::from_file_settings(file)
    }

    pub fn resolver(&self) -> TimestampResolver {
        TimestampResolver::new(self.home_zone, self.travel.clone())
    }

    fn from_file_settings(file: FileSettings) -> Result<Self> {
        let home_zone = match file.timezone.as_deref() {
            Some(name) => name.parse::<DisplayZone>()?,
            None => DisplayZone::Local,
        };

        let travel = match file.travel {
            Some(travel) => {
                let zone = travel
                    .timezone
                    .as_deref()
                    .unwrap_or(DEFAULT_TRAVEL_ZONE)
                    .parse::<DisplayZone>()?;
                TravelWindow::from_naive(travel.start, travel.end, home_zone, zone)?
            }
            None => default_travel_window(home_zone)?,
        };

        Ok(Self {
            title: file.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            stylesheet: file
                .stylesheet
                .unwrap_or_else(|| DEFAULT_STYLESHEET.to_string()),
            fetch_script: file
                .fetch_script
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FETCH_SCRIPT)),
            home_zone,
            travel: Some(travel),
        })
    }
}

fn default_travel_window(home: DisplayZone) -> Result<TravelWindow> {
    let takeoff = wall_clock(2024, 3, 17, 20, 0);
    let landing = wall_clock(2024, 4, 2, 18, 37);
    match (takeoff, landing) {
        (Some(start), Some(end)) => {
            let zone = DEFAULT_TRAVEL_ZONE.parse::<DisplayZone>()?;
            TravelWindow::from_naive(start, end, home, zone)
        }
        _ => Err(ArchiveError::InvalidTravelWindow(
            "built-in travel window".to_string(),
        )),
    }
}

fn wall_clock(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|date| date.and_hms_opt(hour, minute, 0))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use chrono_tz::Tz;
    use tempfile::tempdir;

    use crate::clock::DisplayZone;
    use crate::config::Settings;

    #[test]
    fn defaults_match_the_trip_archive() {
        let settings = Settings::defaults().expect("defaults");
        assert_eq!(settings.title, "Slack archive for #japan-2024");
        assert_eq!(settings.stylesheet, "styles.css");
        assert_eq!(settings.fetch_script, PathBuf::from("wget.sh"));
        assert_eq!(settings.home_zone, DisplayZone::Local);
        let travel = settings.travel.expect("travel window");
        assert_eq!(travel.zone, DisplayZone::Named(Tz::Asia__Tokyo));
    }

    #[test]
    fn reads_toml_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
title = "Team archive"
fetch_script = "fetch.sh"
timezone = "UTC"

[travel]
start = "2024-03-17T20:00:00"
end = "2024-04-02T18:37:00"
timezone = "Europe/Paris"
"#,
        )
        .expect("write");

        let settings = Settings::load(Some(&path)).expect("load");
        assert_eq!(settings.title, "Team archive");
        assert_eq!(settings.stylesheet, "styles.css");
        assert_eq!(settings.fetch_script, PathBuf::from("fetch.sh"));
        assert_eq!(settings.home_zone, DisplayZone::Named(Tz::UTC));

        let travel = settings.travel.expect("travel window");
        assert_eq!(travel.start.timestamp(), 1_710_705_600);
        assert_eq!(travel.end.timestamp(), 1_712_083_020);
        assert_eq!(travel.zone, DisplayZone::Named(Tz::Europe__Paris));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err =
            Settings::load(Some(Path::new("/definitely/not/here.toml"))).expect_err("must fail");
        assert!(format!("{err}").contains("config file not found"));
    }

    #[test]
    fn unknown_keys_and_zones_are_rejected() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");

        fs::write(&path, "colour = \"blue\"\n").expect("write");
        let err = Settings::from_path(&path).expect_err("must fail");
        assert!(format!("{err}").contains("invalid config"));

        fs::write(&path, "timezone = \"Atlantis/Capital\"\n").expect("write");
        let err = Settings::from_path(&path).expect_err("must fail");
        assert!(format!("{err}").contains("unknown time zone"));
    }
}

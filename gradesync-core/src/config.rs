//! Run configuration.
//!
//! Loaded once at startup from an optional TOML file layered under
//! `GRADESYNC__*` environment variables, then validated into [`Config`].
//! Nothing touches the network before validation succeeds.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use ::config::{Environment, File, FileFormat};
use serde::Deserialize;

use crate::coursework::TermFilter;
use crate::error::{GradesyncError, GradesyncResult};

const ENV_PREFIX: &str = "GRADESYNC";

/// Configuration exactly as read; every field may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub caldav: RawCaldavConfig,
    #[serde(default)]
    pub gradescope: RawGradescopeConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCaldavConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub calendar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawGradescopeConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub term: Option<String>,
    pub year: Option<i32>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub caldav: CaldavConfig,
    pub gradescope: GradescopeConfig,
}

#[derive(Debug, Clone)]
pub struct CaldavConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Display name of the target calendar; the first calendar when unset.
    pub calendar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GradescopeConfig {
    pub email: String,
    pub password: String,
    pub term: TermFilter,
}

impl Config {
    /// Default config file location (~/.config/gradesync/config.toml).
    pub fn default_path() -> GradesyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| GradesyncError::Config("Could not determine config directory".into()))?
            .join("gradesync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (or the default location) plus the environment.
    pub fn load(path: Option<&Path>) -> GradesyncResult<Self> {
        let path = match path {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()),
            None => Self::default_path()?,
        };

        let raw: RawConfig = ::config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| GradesyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| GradesyncError::Config(e.to_string()))?;

        raw.validate(chrono::Local::now().year())
    }

    /// Write a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> GradesyncResult<()> {
        let contents = "\
# gradesync configuration
# Every key can also be set through the environment,
# e.g. GRADESYNC__CALDAV__PASSWORD.

[caldav]
# url = \"https://caldav.example.com/\"
# username = \"\"
# password = \"\"
# Display name of the calendar to sync into (default: the first calendar)
# calendar = \"School\"

[gradescope]
# email = \"\"
# password = \"\"
# Only courses from this term are synced
# term = \"Fall\"
# year = 2026
";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GradesyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| GradesyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

impl RawConfig {
    /// Check every required field, reporting all missing ones at once.
    pub fn validate(self, current_year: i32) -> GradesyncResult<Config> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &str| -> String {
            match value.filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let url = require(self.caldav.url, "caldav.url");
        let username = require(self.caldav.username, "caldav.username");
        let password = require(self.caldav.password, "caldav.password");
        let email = require(self.gradescope.email, "gradescope.email");
        let gs_password = require(self.gradescope.password, "gradescope.password");
        let season = require(self.gradescope.term, "gradescope.term");

        if !missing.is_empty() {
            return Err(GradesyncError::MissingConfig(missing));
        }

        Ok(Config {
            caldav: CaldavConfig {
                url,
                username,
                password,
                calendar: self.caldav.calendar.filter(|c| !c.is_empty()),
            },
            gradescope: GradescopeConfig {
                email,
                password: gs_password,
                term: TermFilter {
                    season,
                    year: self.gradescope.year.unwrap_or(current_year),
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn complete() -> RawConfig {
        RawConfig {
            caldav: RawCaldavConfig {
                url: Some("https://dav.example.com/".into()),
                username: Some("me".into()),
                password: Some("secret".into()),
                calendar: None,
            },
            gradescope: RawGradescopeConfig {
                email: Some("me@example.edu".into()),
                password: Some("hunter2".into()),
                term: Some("Spring".into()),
                year: None,
            },
        }
    }

    #[test]
    fn complete_config_validates_with_current_year() {
        let config = complete().validate(2026).unwrap();

        assert_eq!(config.caldav.url, "https://dav.example.com/");
        assert_eq!(config.caldav.calendar, None);
        assert_eq!(
            config.gradescope.term,
            TermFilter {
                season: "Spring".into(),
                year: 2026
            }
        );
    }

    #[test]
    fn explicit_year_wins() {
        let mut raw = complete();
        raw.gradescope.year = Some(2024);

        assert_eq!(raw.validate(2026).unwrap().gradescope.term.year, 2024);
    }

    #[test]
    fn all_missing_fields_are_reported_together() {
        let mut raw = complete();
        raw.caldav.password = None;
        raw.gradescope.email = Some("   ".into());

        match raw.validate(2026) {
            Err(GradesyncError::MissingConfig(fields)) => {
                assert_eq!(fields, vec!["caldav.password", "gradescope.email"]);
            }
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn empty_config_reports_every_required_field() {
        let Err(GradesyncError::MissingConfig(fields)) = RawConfig::default().validate(2026) else {
            panic!("expected MissingConfig");
        };

        assert_eq!(fields.len(), 6);
    }

    #[test]
    fn loads_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("gradesync-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[caldav]
url = "https://dav.example.com/"
username = "me"
password = "secret"
calendar = "School"

[gradescope]
email = "me@example.edu"
password = "hunter2"
term = "Fall"
year = 2025
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();

        assert_eq!(config.caldav.calendar.as_deref(), Some("School"));
        assert_eq!(config.gradescope.term.season, "Fall");
        assert_eq!(config.gradescope.term.year, 2025);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn default_config_file_is_all_comments() {
        let dir = std::env::temp_dir().join(format!("gradesync-default-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        Config::create_default_config(&path).unwrap();
        let raw: RawConfig = ::config::Config::builder()
            .add_source(File::from(path.clone()).format(FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(raw.caldav.url.is_none());
        assert!(raw.gradescope.term.is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

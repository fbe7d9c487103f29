//! Configuration manager for the Crowd realm.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Session validation interval, in minutes, sent to the directory client.
pub const SESSION_VALIDATION_INTERVAL: u32 = 5;

/// Connection settings of a realm.
///
/// Nothing is validated here. A realm built from empty settings fails on
/// its first directory call, not at construction.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RealmSettings {
    url: String,
    username: String,
    password: String,
}

impl RealmSettings {
    /// Create a new [`RealmSettings`].
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Crowd server URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Application name registered on the directory.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Application password registered on the directory.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether every field is filled.
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for RealmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Properties handed to a directory client factory.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientProperties {
    pub server_url: String,
    pub application_name: String,
    pub application_password: String,
    /// In minutes.
    pub session_validation_interval: u32,
}

impl ClientProperties {
    /// Derive client properties from realm settings.
    pub fn from_settings(settings: &RealmSettings) -> Self {
        Self {
            server_url: settings.url.clone(),
            application_name: settings.username.clone(),
            application_password: settings.password.clone(),
            session_validation_interval: SESSION_VALIDATION_INTERVAL,
        }
    }
}

impl std::fmt::Debug for ClientProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientProperties")
            .field("server_url", &self.server_url)
            .field("application_name", &self.application_name)
            .field("application_password", &"[REDACTED]")
            .field(
                "session_validation_interval",
                &self.session_validation_interval,
            )
            .finish()
    }
}

/// File configuration, as persisted by the host.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Related to Crowd connection.
    #[serde(skip_serializing)]
    pub crowd: Option<Crowd>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    #[serde(skip)]
    path: PathBuf,
}

/// Crowd configuration section.
#[derive(Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crowd {
    /// Crowd server URL.
    pub url: String,
    /// Application name.
    pub username: String,
    /// Application password.
    pub password: String,
}

impl std::fmt::Debug for Crowd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crowd")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Configuration {
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Self, url::ParseError> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let file = match File::open(&file_path) {
            Ok(file) => file,
            Err(err) => return Ok(self.error(err)),
        };

        let mut config: Configuration = match serde_yaml::from_reader(file) {
            Ok(config) => config,
            Err(err) => return Ok(self.error(err)),
        };
        config.path = file_path;

        if let Some(crowd) = config.crowd.as_mut() {
            // empty URL stays empty: the realm reports it on first use.
            if !crowd.url.is_empty() {
                crowd.url = Self::normalize_url(&crowd.url)?;
            }
        }

        Ok(config)
    }

    /// Realm settings described by this configuration.
    pub fn settings(&self) -> RealmSettings {
        match &self.crowd {
            Some(crowd) => {
                RealmSettings::new(&crowd.url, &crowd.username, &crowd.password)
            },
            None => RealmSettings::default(),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, path = %self.path.display(), "cannot load configuration file");
        Self {
            path: self.path.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_client_properties() {
        let settings =
            RealmSettings::new("https://crowd.example.com", "jenkins", "s3cret");
        let properties = ClientProperties::from_settings(&settings);

        assert_eq!(properties.server_url, "https://crowd.example.com");
        assert_eq!(properties.application_name, "jenkins");
        assert_eq!(properties.application_password, "s3cret");
        assert_eq!(properties.session_validation_interval, 5);
    }

    #[test]
    fn test_password_redacted() {
        let settings = RealmSettings::new("crowd", "jenkins", "s3cret");
        assert!(!format!("{settings:?}").contains("s3cret"));

        let properties = ClientProperties::from_settings(&settings);
        assert!(!format!("{properties:?}").contains("s3cret"));
    }

    #[test]
    fn test_empty_settings_accepted() {
        let settings = RealmSettings::new("", "", "");
        assert!(!settings.is_complete());
        assert!(RealmSettings::new("u", "n", "p").is_complete());
    }

    #[test]
    fn test_read_normalizes_url() {
        let file = write_config(
            "crowd:\n  url: crowd.example.com/crowd\n  username: jenkins\n  password: s3cret\nlog_level: debug\n",
        );

        let config = Configuration::default().path(file.path()).read().unwrap();
        let settings = config.settings();
        assert_eq!(settings.url(), "https://crowd.example.com/crowd");
        assert_eq!(settings.username(), "jenkins");
        assert_eq!(settings.password(), "s3cret");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_read_invalid_yaml_falls_back() {
        let file = write_config("crowd: [unterminated");

        let config = Configuration::default().path(file.path()).read().unwrap();
        assert!(config.crowd.is_none());
        assert_eq!(config.settings(), RealmSettings::default());
    }

    #[test]
    fn test_read_keeps_empty_url() {
        let file = write_config(
            "crowd:\n  url: \"\"\n  username: \"\"\n  password: \"\"\n",
        );

        let config = Configuration::default().path(file.path()).read().unwrap();
        assert_eq!(config.settings().url(), "");
    }

    #[test]
    fn test_password_not_serialized() {
        let config = Configuration {
            crowd: Some(Crowd {
                url: "https://crowd.example.com/".into(),
                username: "jenkins".into(),
                password: "s3cret".into(),
            }),
            ..Default::default()
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("s3cret"));
    }
}

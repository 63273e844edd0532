use crate::error::ConfigError;
use crate::session::User;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "APPER_API_URL";
pub const ENV_PROJECT_ID: &str = "APPER_PROJECT_ID";
pub const ENV_PUBLIC_KEY: &str = "APPER_PUBLIC_KEY";
pub const ENV_LOG_FILE: &str = "EVENTPRO_LOG_FILE";

// Layout of config.toml, every key optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    project_id: Option<String>,
    public_key: Option<String>,
    log_file: Option<PathBuf>,
    user: Option<User>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub project_id: String,
    pub public_key: String,
    pub log_file: Option<PathBuf>,
    pub user: Option<User>,
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("eventpro").join("config.toml"))
}

impl Config {
    /// Reads the config file (when it exists) and lets the process environment override it.
    pub fn load() -> Result<Config, ConfigError> {
        let path = default_path();
        Config::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn load_from<F>(path: Option<&Path>, env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) if path.exists() => read_file(path)?,
            _ => FileConfig::default(),
        };

        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let api_url = lookup(ENV_API_URL)
            .or(file.api_url)
            .ok_or(ConfigError::Missing(ENV_API_URL))?;
        let project_id = lookup(ENV_PROJECT_ID)
            .or(file.project_id)
            .ok_or(ConfigError::Missing(ENV_PROJECT_ID))?;
        let public_key = lookup(ENV_PUBLIC_KEY)
            .or(file.public_key)
            .ok_or(ConfigError::Missing(ENV_PUBLIC_KEY))?;
        let log_file = lookup(ENV_LOG_FILE).map(PathBuf::from).or(file.log_file);

        Ok(Config {
            api_url: api_url.trim_end_matches('/').to_string(),
            project_id,
            public_key,
            log_file,
            user: file.user,
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_environment_only() {
        let env = env_of(&[
            (ENV_API_URL, "https://records.test/api/v1/"),
            (ENV_PROJECT_ID, "proj-1"),
            (ENV_PUBLIC_KEY, "pk-1"),
        ]);
        let config = Config::load_from(None, env).unwrap();
        assert_eq!(config.api_url, "https://records.test/api/v1");
        assert_eq!(config.project_id, "proj-1");
        assert_eq!(config.public_key, "pk-1");
        assert!(config.log_file.is_none());
        assert!(config.user.is_none());
    }

    #[test]
    fn test_missing_public_key() {
        let env = env_of(&[(ENV_API_URL, "https://x"), (ENV_PROJECT_ID, "proj-1")]);
        let err = Config::load_from(None, env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_PUBLIC_KEY)));
    }

    #[test]
    fn test_blank_environment_value_counts_as_unset() {
        let env = env_of(&[
            (ENV_API_URL, "https://x"),
            (ENV_PROJECT_ID, "  "),
            (ENV_PUBLIC_KEY, "pk"),
        ]);
        let err = Config::load_from(None, env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_PROJECT_ID)));
    }

    #[test]
    fn test_file_values_with_environment_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_url = "https://file.test"
project_id = "from-file"
public_key = "file-key"
log_file = "/tmp/eventpro.log"

[user]
first_name = "Ada"
name = "Ada Lovelace"
"#
        )
        .unwrap();

        let env = env_of(&[(ENV_PUBLIC_KEY, "env-key")]);
        let config = Config::load_from(Some(file.path()), env).unwrap();
        assert_eq!(config.api_url, "https://file.test");
        assert_eq!(config.project_id, "from-file");
        assert_eq!(config.public_key, "env-key");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/eventpro.log")));
        let user = config.user.unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_invalid_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = [").unwrap();
        let err = Config::load_from(Some(file.path()), env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let env = env_of(&[
            (ENV_API_URL, "https://x"),
            (ENV_PROJECT_ID, "p"),
            (ENV_PUBLIC_KEY, "k"),
        ]);
        let path = Path::new("/nonexistent/eventpro/config.toml");
        assert!(Config::load_from(Some(path), env).is_ok());
    }
}
